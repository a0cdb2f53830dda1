pub mod loader;
pub mod paths;
pub mod sheets;
