use thiserror::Error;

/// Domain errors a caller may want to match on. They travel inside
/// `anyhow::Error` and can be recovered with `downcast_ref::<EtlError>()`.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum EtlError {
    #[error("Specify the schema for the {0} service")]
    UnknownService(String),

    #[error("month must be in 1..=12, got {0}")]
    InvalidMonth(u32),

    #[error("column `{column}` required by the {service} schema is missing from the source")]
    MissingColumn { service: String, column: String },

    #[error("chunk size must be greater than zero")]
    InvalidChunkSize,

    #[error("invalid table reference `{0}`, expected `dataset.table` or `project.dataset.table`")]
    InvalidTableRef(String),
}
