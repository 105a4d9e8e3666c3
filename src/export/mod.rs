pub mod columnar;
pub mod report;

pub use columnar::{read_records_parquet, records_to_batch, write_records_parquet};
pub use report::Report;
