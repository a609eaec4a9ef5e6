// src/process/month.rs

use anyhow::{Context, Result};
use bytes::Bytes;
use std::fmt;
use tracing::{debug, error, info, instrument};

use super::convert::{cast_to_schema, decompress, encode_parquet, read_csv_as_text};
use crate::fetch::{source_url, TripSource};
use crate::schema::Service;
use crate::storage::BlobStore;

/// Where a month job is, or where it stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    Pending,
    Downloading,
    Parsing,
    Casting,
    Encoding,
    Uploading,
    Done,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Stage::Pending => "pending",
            Stage::Downloading => "downloading",
            Stage::Parsing => "parsing",
            Stage::Casting => "casting",
            Stage::Encoding => "encoding",
            Stage::Uploading => "uploading",
            Stage::Done => "done",
        };
        f.write_str(s)
    }
}

/// How a month job ended when it did not hit a fatal error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobStatus {
    Uploaded {
        object: String,
        rows: usize,
        bytes: usize,
    },
    /// Download or upload failed; logged and dropped without retry.
    Abandoned { stage: Stage, reason: String },
}

/// One (service, year, month) unit of work.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MonthJob {
    pub service: Service,
    pub year: i32,
    pub month: u32,
}

impl MonthJob {
    pub fn object_path(&self) -> String {
        object_path(self.service, self.year, self.month)
    }
}

/// `NYC_taxi_trips/{service}/{service}_tripdata_{year}-{month:02}.parquet`
pub fn object_path(service: Service, year: i32, month: u32) -> String {
    format!(
        "NYC_taxi_trips/{}/{}_tripdata_{}-{:02}.parquet",
        service, service, year, month
    )
}

/// Run one month end to end.
///
/// Download and upload failures are caught, logged and reported as
/// `Abandoned`. Anything that goes wrong while parsing, casting or encoding
/// is returned as an error carrying the stage as context.
#[instrument(level = "info", skip(source, store, base_url), fields(service = %job.service, year = job.year, month = job.month))]
pub async fn process_month(
    source: &dyn TripSource,
    store: &dyn BlobStore,
    base_url: &str,
    job: MonthJob,
) -> Result<JobStatus> {
    let url = source_url(base_url, job.service, job.year, job.month);

    debug!(stage = %Stage::Downloading, url = %url);
    let raw = match source.fetch(&url).await {
        Ok(raw) => raw,
        Err(err) => {
            error!("Failed to download {}: {:#}", url, err);
            return Ok(JobStatus::Abandoned {
                stage: Stage::Downloading,
                reason: format!("{:#}", err),
            });
        }
    };

    let service = job.service;
    let (parquet, rows) = tokio::task::spawn_blocking(move || convert_month(raw, service))
        .await
        .context("conversion task aborted")??;
    let bytes = parquet.len();

    let object = job.object_path();
    debug!(stage = %Stage::Uploading, object = %object, bytes);
    if let Err(err) = store.put(&object, parquet).await {
        error!("Failed to upload {} to {}: {:#}", object, store.location(), err);
        return Ok(JobStatus::Abandoned {
            stage: Stage::Uploading,
            reason: format!("{:#}", err),
        });
    }

    info!(object = %object, rows, bytes, stage = %Stage::Done, "uploaded");
    Ok(JobStatus::Uploaded {
        object,
        rows,
        bytes,
    })
}

/// Decompress → parse → cast → encode. CPU bound; runs on the blocking pool.
fn convert_month(raw: Bytes, service: Service) -> Result<(Vec<u8>, usize)> {
    let csv = decompress(&raw).context(Stage::Parsing)?;
    drop(raw);
    let text = read_csv_as_text(&csv).context(Stage::Parsing)?;
    drop(csv);
    let table = cast_to_schema(&text, service).context(Stage::Casting)?;
    let parquet = encode_parquet(&table).context(Stage::Encoding)?;
    Ok((parquet, table.num_rows()))
}
