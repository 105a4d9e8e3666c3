pub mod antibiogram;
pub mod config;
pub mod dataset;
pub mod export;
pub mod ingest;
pub mod render;
pub mod surveillance;

pub use config::Config;
pub use dataset::{Dataset, DatasetCache};
