// src/warehouse/bigquery.rs

use anyhow::{bail, Context, Result};
use arrow::{datatypes::Schema, json::ArrayWriter, record_batch::RecordBatch};
use async_trait::async_trait;
use gcp_bigquery_client::{
    error::BQError,
    model::{
        table::Table, table_data_insert_all_request::TableDataInsertAllRequest,
        table_field_schema::TableFieldSchema, table_schema::TableSchema,
    },
    Client,
};
use serde_json::{Map, Value};
use std::{collections::HashSet, ops::Range, path::Path, sync::Arc};
use tokio::sync::Mutex;
use tracing::{debug, info};

use super::{TableRef, Warehouse};
use crate::schema::{column_kind, ColumnKind};

/// Rows per `tabledata.insertAll` request; the API caps request size well
/// below a full 500k-row chunk.
const MAX_ROWS_PER_INSERT: usize = 10_000;

#[derive(Clone)]
pub struct BigQueryWarehouse {
    client: Client,
    /// Tables already known to exist, so the lookup runs once per table.
    ready: Arc<Mutex<HashSet<TableRef>>>,
}

impl BigQueryWarehouse {
    /// Authenticate with the service-account key at `credentials`, or with
    /// application default credentials when none is given.
    pub async fn connect(credentials: Option<&Path>) -> Result<Self> {
        let client = match credentials {
            Some(path) => Client::from_service_account_key_file(&path.display().to_string())
                .await
                .with_context(|| format!("authenticating BigQuery with {}", path.display()))?,
            None => Client::from_application_default_credentials()
                .await
                .context("authenticating BigQuery client")?,
        };
        Ok(Self {
            client,
            ready: Arc::default(),
        })
    }

    /// Create `table` from `schema` when it does not exist yet.
    async fn ensure_table(&self, table: &TableRef, schema: &Schema) -> Result<()> {
        let mut ready = self.ready.lock().await;
        if ready.contains(table) {
            return Ok(());
        }

        let found = self
            .client
            .table()
            .get(&table.project, &table.dataset, &table.table, None)
            .await;
        match found {
            Ok(_) => debug!(table = %table, "destination table exists"),
            Err(BQError::ResponseError { error }) if error.error.code == 404 => {
                let definition = Table::new(
                    &table.project,
                    &table.dataset,
                    &table.table,
                    TableSchema::new(bigquery_fields(schema)?),
                );
                self.client
                    .table()
                    .create(definition)
                    .await
                    .with_context(|| format!("creating {}", table))?;
                info!(table = %table, columns = schema.fields().len(), "created destination table");
            }
            Err(err) => return Err(err).with_context(|| format!("looking up {}", table)),
        }

        ready.insert(table.clone());
        Ok(())
    }
}

#[async_trait]
impl Warehouse for BigQueryWarehouse {
    async fn append(&self, table: &TableRef, chunk: &RecordBatch) -> Result<()> {
        self.ensure_table(table, &chunk.schema()).await?;

        let rows = batch_to_json_rows(chunk)?;
        for page in insert_pages(rows.len()) {
            let page = &rows[page];
            let mut request = TableDataInsertAllRequest::new();
            for row in page {
                request.add_row(None, row).context("serializing insert row")?;
            }

            let response = self
                .client
                .tabledata()
                .insert_all(&table.project, &table.dataset, &table.table, request)
                .await
                .with_context(|| format!("insertAll into {}", table))?;

            if let Some(errors) = response.insert_errors {
                if !errors.is_empty() {
                    bail!("{} of {} rows rejected by {}", errors.len(), page.len(), table);
                }
            }
            debug!(table = %table, rows = page.len(), "insertAll accepted");
        }

        info!(table = %table, rows = rows.len(), "chunk appended");
        Ok(())
    }
}

/// Row ranges for the `insertAll` requests covering `rows` rows.
pub fn insert_pages(rows: usize) -> Vec<Range<usize>> {
    (0..rows)
        .step_by(MAX_ROWS_PER_INSERT)
        .map(|start| start..rows.min(start + MAX_ROWS_PER_INSERT))
        .collect()
}

/// BigQuery column definitions for a trip schema. Every column is NULLABLE.
pub fn bigquery_fields(schema: &Schema) -> Result<Vec<TableFieldSchema>> {
    schema
        .fields()
        .iter()
        .map(|field| {
            let kind = column_kind(field.data_type()).with_context(|| {
                format!("no BigQuery type for `{}` ({})", field.name(), field.data_type())
            })?;
            Ok(match kind {
                ColumnKind::Utf8 => TableFieldSchema::string(field.name()),
                ColumnKind::Timestamp => TableFieldSchema::timestamp(field.name()),
                ColumnKind::Int64 => TableFieldSchema::integer(field.name()),
                ColumnKind::Float64 => TableFieldSchema::float(field.name()),
            })
        })
        .collect()
}

/// Render a batch as JSON objects keyed by column name. Null cells are
/// omitted, which BigQuery reads as NULL.
pub fn batch_to_json_rows(batch: &RecordBatch) -> Result<Vec<Map<String, Value>>> {
    let mut writer = ArrayWriter::new(Vec::new());
    writer.write(batch).context("encoding batch as JSON")?;
    writer.finish().context("finishing JSON array")?;
    let buf = writer.into_inner();
    serde_json::from_slice(&buf).context("re-reading JSON rows")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::process::convert::{cast_to_schema, read_csv_as_text};
    use crate::schema::Service;
    use crate::testing::yellow_csv;

    #[test]
    fn rows_are_keyed_by_column() {
        let text = read_csv_as_text(yellow_csv(2).as_bytes()).unwrap();
        let batch = cast_to_schema(&text, Service::Yellow).unwrap();
        let rows = batch_to_json_rows(&batch).unwrap();

        assert_eq!(rows.len(), 2);
        assert_eq!(rows[1]["PULocationID"], Value::from(152));
        assert_eq!(rows[0]["VendorID"], Value::from("1"));
        let pickup = rows[0]["tpep_pickup_datetime"].as_str().unwrap();
        assert!(pickup.starts_with("2019-01-01T00:46:40"), "{}", pickup);
        assert!(!rows[0].contains_key("congestion_surcharge"));
    }

    #[test]
    fn pages_cap_each_request_at_ten_thousand_rows() {
        assert!(insert_pages(0).is_empty());
        assert_eq!(insert_pages(10_000), vec![0..10_000]);
        assert_eq!(insert_pages(10_001), vec![0..10_000, 10_000..10_001]);
        assert_eq!(insert_pages(500_000).len(), 50);
    }

    #[test]
    fn table_schema_follows_column_kinds() {
        let fields = bigquery_fields(&Service::Fhv.arrow_schema()).unwrap();
        let described: Vec<(String, Value)> = fields
            .iter()
            .map(|f| {
                let json = serde_json::to_value(f).unwrap();
                (f.name.clone(), json["type"].clone())
            })
            .collect();
        assert_eq!(
            described,
            vec![
                ("dispatching_base_num".to_string(), Value::from("STRING")),
                ("pickup_datetime".to_string(), Value::from("TIMESTAMP")),
                ("dropOff_datetime".to_string(), Value::from("TIMESTAMP")),
                ("PUlocationID".to_string(), Value::from("INTEGER")),
                ("DOlocationID".to_string(), Value::from("INTEGER")),
                ("SR_Flag".to_string(), Value::from("INTEGER")),
                ("Affiliated_base_number".to_string(), Value::from("STRING")),
            ]
        );
        let yellow = bigquery_fields(&Service::Yellow.arrow_schema()).unwrap();
        assert_eq!(serde_json::to_value(&yellow[4]).unwrap()["type"], "FLOAT");
    }

    #[test]
    fn unmapped_arrow_type_is_an_error() {
        let schema = Schema::new(vec![arrow::datatypes::Field::new(
            "flag",
            arrow::datatypes::DataType::Boolean,
            true,
        )]);
        let err = bigquery_fields(&schema).unwrap_err();
        assert!(err.to_string().contains("`flag`"), "{}", err);
    }

    #[test]
    fn empty_batch_has_no_rows() {
        let batch = RecordBatch::new_empty(Service::Green.arrow_schema());
        assert!(batch_to_json_rows(&batch).unwrap().is_empty());
    }
}
