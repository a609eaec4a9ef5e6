// src/schema/types.rs

/// Logical type of a trip-data column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ColumnKind {
    Utf8,
    /// Second precision, no time zone.
    Timestamp,
    Int64,
    Float64,
}

/// A single column of a fixed trip schema.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Column {
    pub name: &'static str,
    pub kind: ColumnKind,
}

impl Column {
    pub const fn new(name: &'static str, kind: ColumnKind) -> Self {
        Self { name, kind }
    }
}
