// src/load/extract.rs

use anyhow::{Context, Result};
use arrow::record_batch::RecordBatch;
use std::{
    fs::File,
    path::{Path, PathBuf},
};
use tokio::fs;
use tracing::{debug, info, instrument};

use crate::process::convert::read_parquet;
use crate::retry::{with_retries, RetryPolicy};
use crate::schema::{check_month, Service};
use crate::storage::BlobStore;

/// `data/{color}/{color}_tripdata_{year}-{month:02}.parquet`
pub fn store_path(color: Service, year: i32, month: u32) -> String {
    format!(
        "data/{}/{}_tripdata_{}-{:02}.parquet",
        color, color, year, month
    )
}

/// Download one month's Parquet file into `local_dir`, mirroring the store
/// path, and return where it landed. The fetch is retried per `retry`.
#[instrument(level = "info", skip(store, local_dir, retry))]
pub async fn extract_from_store(
    store: &dyn BlobStore,
    color: Service,
    year: i32,
    month: u32,
    local_dir: &Path,
    retry: RetryPolicy,
) -> Result<PathBuf> {
    check_month(month)?;
    let object = store_path(color, year, month);

    let key = object.as_str();
    let data = with_retries(retry, move || store.get(key))
        .await
        .with_context(|| format!("fetching {}/{}", store.location(), object))?;

    let dest = local_dir.join(&object);
    if let Some(parent) = dest.parent() {
        fs::create_dir_all(parent)
            .await
            .with_context(|| format!("creating {}", parent.display()))?;
    }
    fs::write(&dest, &data)
        .await
        .with_context(|| format!("writing {}", dest.display()))?;

    info!(path = %dest.display(), bytes = data.len(), "extracted");
    Ok(dest)
}

/// Read a local Parquet file into one in-memory batch.
pub fn load_parquet_file(path: &Path) -> Result<RecordBatch> {
    let file = File::open(path).with_context(|| format!("opening {}", path.display()))?;
    let batch = read_parquet(file).with_context(|| format!("loading {}", path.display()))?;
    debug!(path = %path.display(), rows = batch.num_rows(), "loaded");
    Ok(batch)
}
