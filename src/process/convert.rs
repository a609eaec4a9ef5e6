use anyhow::{bail, Context, Result};
use arrow::{
    array::{Array, ArrayRef, AsArray, StringArray},
    compute::{cast_with_options, concat_batches, CastOptions},
    csv::{reader::Format, ReaderBuilder},
    datatypes::{DataType, Field, Float64Type, Schema},
    record_batch::RecordBatch,
};
use flate2::read::MultiGzDecoder;
use parquet::{
    arrow::{arrow_reader::ParquetRecordBatchReaderBuilder, ArrowWriter},
    basic::Compression,
    file::{properties::WriterProperties, reader::ChunkReader},
};
use std::{
    io::{Cursor, Read},
    sync::Arc,
};
use tracing::{debug, warn};

use crate::error::EtlError;
use crate::schema::Service;

const GZIP_MAGIC: [u8; 2] = [0x1f, 0x8b];
const CSV_BATCH_ROWS: usize = 64 * 1024;

/// Gunzip `raw`, or hand it back untouched when it isn't gzip
/// (some mirrors serve the body already decoded).
pub fn decompress(raw: &[u8]) -> Result<Vec<u8>> {
    if !raw.starts_with(&GZIP_MAGIC) {
        debug!(bytes = raw.len(), "body is not gzip, using as-is");
        return Ok(raw.to_vec());
    }
    let mut out = Vec::with_capacity(raw.len().saturating_mul(4));
    MultiGzDecoder::new(raw)
        .read_to_end(&mut out)
        .context("decompressing gzip body")?;
    Ok(out)
}

/// Parse CSV with a header row, keeping every column as nullable text.
/// Empty fields become nulls.
pub fn read_csv_as_text(data: &[u8]) -> Result<RecordBatch> {
    let (header, _) = Format::default()
        .with_header(true)
        .infer_schema(Cursor::new(data), Some(0))
        .context("reading CSV header")?;

    let fields: Vec<Field> = header
        .fields()
        .iter()
        .map(|f| Field::new(f.name(), DataType::Utf8, true))
        .collect();
    let schema = Arc::new(Schema::new(fields));

    let reader = ReaderBuilder::new(schema.clone())
        .with_header(true)
        .with_batch_size(CSV_BATCH_ROWS)
        .build(Cursor::new(data))
        .context("creating CSV reader")?;
    let batches = reader
        .collect::<Result<Vec<_>, _>>()
        .context("parsing CSV rows")?;

    concat_batches(&schema, &batches).context("concatenating CSV batches")
}

/// Cast a text table onto `service`'s fixed schema, matching columns by
/// name. Values that do not parse are errors, not nulls.
///
/// Integer columns also accept whole numbers written as floats (`264.0`),
/// and a text column made up entirely of such numbers is rendered without
/// the trailing `.0`.
pub fn cast_to_schema(batch: &RecordBatch, service: Service) -> Result<RecordBatch> {
    let target = service.arrow_schema();
    let source = batch.schema();
    let options = CastOptions {
        safe: false,
        ..Default::default()
    };

    if source.fields().len() > target.fields().len() {
        let extra: Vec<&str> = source
            .fields()
            .iter()
            .map(|f| f.name().as_str())
            .filter(|name| target.field_with_name(name).is_err())
            .collect();
        warn!(%service, ?extra, "dropping columns outside the fixed schema");
    }

    let mut columns = Vec::with_capacity(target.fields().len());
    for field in target.fields() {
        let idx = source
            .index_of(field.name())
            .map_err(|_| EtlError::MissingColumn {
                service: service.to_string(),
                column: field.name().clone(),
            })?;
        let col = cast_column(batch.column(idx), field.data_type(), &options)
            .with_context(|| format!("casting `{}` to {}", field.name(), field.data_type()))?;
        columns.push(col);
    }

    RecordBatch::try_new(target, columns).context("assembling cast batch")
}

fn cast_column(col: &ArrayRef, to: &DataType, options: &CastOptions) -> Result<ArrayRef> {
    match to {
        DataType::Int64 => match cast_with_options(col, to, options) {
            Ok(ints) => Ok(ints),
            Err(_) => whole_floats_to_int(col, options),
        },
        DataType::Utf8 => match whole_float_text(col) {
            Some(text) => Ok(text),
            None => Ok(cast_with_options(col, to, options)?),
        },
        _ => Ok(cast_with_options(col, to, options)?),
    }
}

fn is_whole(v: f64) -> bool {
    v.is_finite() && v.fract() == 0.0
}

/// `"264.0"` → 264; `"1.5"` is an error.
fn whole_floats_to_int(col: &ArrayRef, options: &CastOptions) -> Result<ArrayRef> {
    let floats = cast_with_options(col, &DataType::Float64, options)?;
    if let Some(v) = floats
        .as_primitive::<Float64Type>()
        .iter()
        .flatten()
        .find(|v| !is_whole(*v))
    {
        bail!("{} is not a whole number", v);
    }
    Ok(cast_with_options(&floats, &DataType::Int64, options)?)
}

/// Rewrite `"1.0"` as `"1"`, but only when every non-null value is a whole
/// number. Returns `None` when the column should stay as it is.
fn whole_float_text(col: &ArrayRef) -> Option<ArrayRef> {
    let text = col.as_string_opt::<i32>()?;
    let mut out = Vec::with_capacity(text.len());
    for value in text.iter() {
        match value {
            None => out.push(None),
            Some(s) => {
                let v: f64 = s.trim().parse().ok()?;
                if !is_whole(v) {
                    return None;
                }
                out.push(Some((v as i64).to_string()));
            }
        }
    }
    Some(Arc::new(StringArray::from(out)))
}

/// Cast onto the schema named by `service`. Unknown names are a
/// configuration error.
pub fn cast_table(batch: &RecordBatch, service: &str) -> Result<RecordBatch> {
    let service: Service = service.parse()?;
    cast_to_schema(batch, service)
}

/// Encode a batch as an in-memory Parquet file.
pub fn encode_parquet(batch: &RecordBatch) -> Result<Vec<u8>> {
    let mut buffer = Vec::new();
    let props = WriterProperties::builder()
        .set_compression(Compression::SNAPPY)
        .build();

    let mut writer = ArrowWriter::try_new(&mut buffer, batch.schema(), Some(props))
        .context("creating parquet writer")?;
    writer.write(batch).context("writing batch to parquet")?;
    writer.close().context("closing parquet writer")?;

    Ok(buffer)
}

/// Decode a whole Parquet file into one batch. Files without rows keep
/// their schema.
pub fn read_parquet<R: ChunkReader + 'static>(reader: R) -> Result<RecordBatch> {
    let builder =
        ParquetRecordBatchReaderBuilder::try_new(reader).context("reading parquet footer")?;
    let schema = builder.schema().clone();
    let batches = builder
        .build()
        .context("building parquet reader")?
        .collect::<Result<Vec<_>, _>>()
        .context("decoding parquet row groups")?;

    concat_batches(&schema, &batches).context("concatenating parquet batches")
}
