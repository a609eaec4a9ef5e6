// src/warehouse/mod.rs

pub mod bigquery;

pub use bigquery::BigQueryWarehouse;

use anyhow::{Context, Result};
use arrow::record_batch::RecordBatch;
use async_trait::async_trait;
use std::fmt;
use tracing::{debug, instrument};

use crate::error::EtlError;

/// Fully-qualified destination table.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TableRef {
    pub project: String,
    pub dataset: String,
    pub table: String,
}

impl TableRef {
    /// Accepts `dataset.table` (project taken from `default_project`) or
    /// `project.dataset.table`.
    pub fn parse(default_project: &str, raw: &str) -> Result<Self, EtlError> {
        let parts: Vec<&str> = raw.split('.').collect();
        if parts.iter().any(|p| p.is_empty()) {
            return Err(EtlError::InvalidTableRef(raw.to_string()));
        }
        match parts.as_slice() {
            [dataset, table] if !default_project.is_empty() => Ok(Self {
                project: default_project.to_string(),
                dataset: dataset.to_string(),
                table: table.to_string(),
            }),
            [project, dataset, table] => Ok(Self {
                project: project.to_string(),
                dataset: dataset.to_string(),
                table: table.to_string(),
            }),
            _ => Err(EtlError::InvalidTableRef(raw.to_string())),
        }
    }
}

impl fmt::Display for TableRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.project, self.dataset, self.table)
    }
}

/// Append-only analytical table sink.
#[async_trait]
pub trait Warehouse: Send + Sync {
    /// Append every row of `chunk` to `table`.
    async fn append(&self, table: &TableRef, chunk: &RecordBatch) -> Result<()>;
}

/// Append `batch` in slices of at most `chunk_size` rows and return the row
/// count. Chunks already written stay written if a later one fails.
#[instrument(level = "info", skip(warehouse, batch), fields(table = %table, rows = batch.num_rows()))]
pub async fn write_in_chunks(
    warehouse: &dyn Warehouse,
    table: &TableRef,
    batch: &RecordBatch,
    chunk_size: usize,
) -> Result<usize> {
    if chunk_size == 0 {
        return Err(EtlError::InvalidChunkSize.into());
    }

    let total = batch.num_rows();
    let mut offset = 0;
    while offset < total {
        let len = chunk_size.min(total - offset);
        warehouse
            .append(table, &batch.slice(offset, len))
            .await
            .with_context(|| format!("appending rows {}..{} to {}", offset, offset + len, table))?;
        debug!(offset, len, "chunk appended");
        offset += len;
    }

    Ok(total)
}
