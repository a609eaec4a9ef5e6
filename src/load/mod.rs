// src/load/mod.rs
//
// Object store → warehouse: fetch monthly Parquet files, load them into
// memory and append them to the rides table.

pub mod extract;

pub use extract::{extract_from_store, load_parquet_file, store_path};

use anyhow::{Context, Result};
use std::{path::PathBuf, sync::Arc};
use tracing::{info, instrument};

use crate::config::Settings;
use crate::retry::RetryPolicy;
use crate::schema::Service;
use crate::storage::BlobStore;
use crate::warehouse::{write_in_chunks, TableRef, Warehouse};

/// Sequential extract → load → write driver.
pub struct StoreToWarehouse {
    store: Arc<dyn BlobStore>,
    warehouse: Arc<dyn Warehouse>,
    table: TableRef,
    local_dir: PathBuf,
    chunk_size: usize,
    retry: RetryPolicy,
}

impl StoreToWarehouse {
    pub fn new(
        store: Arc<dyn BlobStore>,
        warehouse: Arc<dyn Warehouse>,
        settings: &Settings,
    ) -> Result<Self> {
        let table = TableRef::parse(&settings.project_id, &settings.destination_table)?;
        Ok(Self {
            store,
            warehouse,
            table,
            local_dir: settings.local_data_dir.clone(),
            chunk_size: settings.chunk_size,
            retry: settings.extract_retry_policy(),
        })
    }

    pub fn table(&self) -> &TableRef {
        &self.table
    }

    /// Load one month; returns the number of rows appended.
    #[instrument(level = "info", skip(self), fields(table = %self.table))]
    pub async fn run_month(&self, color: Service, year: i32, month: u32) -> Result<usize> {
        let path = extract_from_store(
            self.store.as_ref(),
            color,
            year,
            month,
            &self.local_dir,
            self.retry,
        )
        .await?;

        let load_path = path.clone();
        let batch = tokio::task::spawn_blocking(move || load_parquet_file(&load_path))
            .await
            .context("load task aborted")??;

        let rows = write_in_chunks(self.warehouse.as_ref(), &self.table, &batch, self.chunk_size)
            .await
            .with_context(|| format!("writing {} to {}", path.display(), self.table))?;
        info!(rows, "Number of rows processed");
        Ok(rows)
    }

    /// Load every month in order and return the total row count. The first
    /// failing month stops the run.
    #[instrument(level = "info", skip(self), fields(table = %self.table))]
    pub async fn run(&self, color: Service, year: i32, months: &[u32]) -> Result<usize> {
        let mut total = 0;
        for &month in months {
            total += self
                .run_month(color, year, month)
                .await
                .with_context(|| format!("{} {}-{:02}", color, year, month))?;
        }
        info!(%color, year, months = months.len(), total, "all months loaded");
        Ok(total)
    }
}
