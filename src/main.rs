mod app;
mod data;
mod error;
mod logging;
mod processing;
mod render;
mod state;

use error::AppError;
use std::path::Path;
use std::process::ExitCode;

fn main() -> ExitCode {
    // Initialize logging
    tracing_subscriber::fmt::init();

    let input = match app::resolve_input(std::env::args().nth(1)) {
        Ok(input) => input,
        Err(e) => {
            eprintln!("Cannot read input path: {e}");
            return ExitCode::FAILURE;
        }
    };

    match app::run(&input, Path::new(".")) {
        Ok(_) => ExitCode::SUCCESS,
        Err(AppError::InvalidFileFormat(path)) => {
            println!("Error: unsupported file format: {}", path.display());
            ExitCode::from(1)
        }
        Err(e) => {
            tracing::error!("Run failed: {e}");
            ExitCode::FAILURE
        }
    }
}
