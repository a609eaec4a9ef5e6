// src/schema/arrow.rs

use arrow::datatypes::{DataType, Field as ArrowField, Schema as ArrowSchema, TimeUnit};
use std::sync::Arc;

use super::types::{Column, ColumnKind};

/// Map a column kind into an Arrow DataType.
///
/// - Utf8      → Utf8
/// - Timestamp → Timestamp(s, none)
/// - Int64     → Int64
/// - Float64   → Float64
pub fn map_to_arrow_type(kind: ColumnKind) -> DataType {
    match kind {
        ColumnKind::Utf8 => DataType::Utf8,
        ColumnKind::Timestamp => DataType::Timestamp(TimeUnit::Second, None),
        ColumnKind::Int64 => DataType::Int64,
        ColumnKind::Float64 => DataType::Float64,
    }
}

/// The column kind an Arrow DataType was built from, if any.
pub fn column_kind(data_type: &DataType) -> Option<ColumnKind> {
    match data_type {
        DataType::Utf8 => Some(ColumnKind::Utf8),
        DataType::Timestamp(TimeUnit::Second, None) => Some(ColumnKind::Timestamp),
        DataType::Int64 => Some(ColumnKind::Int64),
        DataType::Float64 => Some(ColumnKind::Float64),
        _ => None,
    }
}

/// Build an ArrowSchema (inside an Arc) from a slice of `Column`s.
/// Every field is nullable; the raw files leave plenty of gaps.
pub fn build_arrow_schema(cols: &[Column]) -> Arc<ArrowSchema> {
    let fields: Vec<ArrowField> = cols
        .iter()
        .map(|col| ArrowField::new(col.name, map_to_arrow_type(col.kind), true))
        .collect();

    Arc::new(ArrowSchema::new(fields))
}
