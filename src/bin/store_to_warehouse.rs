//! Load yellow-taxi Parquet files for February and March 2019 from the
//! data-lake bucket into the BigQuery rides table.

use anyhow::Result;
use std::sync::Arc;
use tracing::info;
use tripetl::{
    config::Settings, load::StoreToWarehouse, schema::Service, storage::GcsStore, telemetry,
    warehouse::BigQueryWarehouse,
};

const COLOR: Service = Service::Yellow;
const YEAR: i32 = 2019;
const MONTHS: [u32; 2] = [2, 3];

#[tokio::main]
async fn main() -> Result<()> {
    telemetry::init("info");
    let settings = Settings::load()?;
    info!(bucket = %settings.bucket, table = %settings.destination_table, "startup");

    let credentials = settings.credentials_path.as_deref();
    let store = GcsStore::connect(&settings.bucket, credentials).await?;
    let warehouse = BigQueryWarehouse::connect(credentials).await?;

    let flow = StoreToWarehouse::new(Arc::new(store), Arc::new(warehouse), &settings)?;
    let total = flow.run(COLOR, YEAR, &MONTHS).await?;

    info!(total, table = %flow.table(), "all done");
    Ok(())
}
