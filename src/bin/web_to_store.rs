//! Mirror the yearly TLC CSV releases into the data-lake bucket as Parquet.

use anyhow::{bail, Result};
use std::sync::Arc;
use tracing::{error, info};
use tripetl::{
    config::Settings, fetch::HttpSource, process::WebToStore, storage::GcsStore, telemetry,
};

const RUNS: &[(i32, &str)] = &[
    (2019, "yellow"),
    (2020, "yellow"),
    (2019, "green"),
    (2020, "green"),
    (2019, "fhv"),
];

#[tokio::main]
async fn main() -> Result<()> {
    telemetry::init("info");
    let settings = Settings::load()?;
    info!(bucket = %settings.bucket, source = %settings.source_base_url, "startup");

    let store = GcsStore::connect(&settings.bucket, settings.credentials_path.as_deref()).await?;
    let runner = WebToStore::new(
        Arc::new(HttpSource::default()),
        Arc::new(store),
        &settings,
    );

    let mut incomplete = Vec::new();
    for &(year, service) in RUNS {
        let report = runner.run(year, service).await?;
        for (month, stage, reason) in report.abandoned() {
            error!(year, service, month, %stage, reason, "month abandoned");
        }
        for (month, err) in report.failed() {
            error!(year, service, month, "month failed: {:#}", err);
        }
        if !report.is_success() {
            incomplete.push(format!("{} {}", service, year));
        }
    }

    if !incomplete.is_empty() {
        bail!("incomplete runs: {}", incomplete.join(", "));
    }
    info!("all done");
    Ok(())
}
