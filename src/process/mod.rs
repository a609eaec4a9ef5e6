// src/process/mod.rs
//
// Web → object store: download each month's CSV, cast it to the service
// schema, encode as Parquet and upload.

pub mod bulk;
pub mod convert;
pub mod month;

pub use bulk::{BulkReport, JobResult, WebToStore};
pub use month::{object_path, process_month, JobStatus, MonthJob, Stage};
