pub mod outliers;
pub mod selection;
pub mod statistics;
