// src/schema/mod.rs

pub mod arrow;
pub mod trips;
pub mod types;

pub use self::arrow::{build_arrow_schema, column_kind, map_to_arrow_type};
pub use trips::{FHV_COLUMNS, GREEN_COLUMNS, YELLOW_COLUMNS};
pub use types::{Column, ColumnKind};

use ::arrow::datatypes::SchemaRef;
use std::{fmt, str::FromStr};

use crate::error::EtlError;

/// A TLC trip-record service type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Service {
    Yellow,
    Green,
    Fhv,
}

impl Service {
    pub const ALL: [Service; 3] = [Service::Yellow, Service::Green, Service::Fhv];

    pub fn as_str(&self) -> &'static str {
        match self {
            Service::Yellow => "yellow",
            Service::Green => "green",
            Service::Fhv => "fhv",
        }
    }

    pub fn columns(&self) -> &'static [Column] {
        match self {
            Service::Yellow => YELLOW_COLUMNS,
            Service::Green => GREEN_COLUMNS,
            Service::Fhv => FHV_COLUMNS,
        }
    }

    pub fn arrow_schema(&self) -> SchemaRef {
        build_arrow_schema(self.columns())
    }
}

impl FromStr for Service {
    type Err = EtlError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "yellow" => Ok(Service::Yellow),
            "green" => Ok(Service::Green),
            "fhv" => Ok(Service::Fhv),
            other => Err(EtlError::UnknownService(other.to_string())),
        }
    }
}

impl fmt::Display for Service {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Reject anything outside 1..=12 before touching the network.
pub fn check_month(month: u32) -> Result<u32, EtlError> {
    if (1..=12).contains(&month) {
        Ok(month)
    } else {
        Err(EtlError::InvalidMonth(month))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ::arrow::datatypes::{DataType, TimeUnit};

    #[test]
    fn parses_known_services_only() {
        for s in Service::ALL {
            assert_eq!(s.as_str().parse::<Service>().unwrap(), s);
        }
        assert_eq!(
            "Yellow".parse::<Service>(),
            Err(EtlError::UnknownService("Yellow".into()))
        );
    }

    #[test]
    fn yellow_schema_types() {
        let schema = Service::Yellow.arrow_schema();
        assert_eq!(schema.fields().len(), 18);
        assert_eq!(schema.field(0).data_type(), &DataType::Utf8);
        assert_eq!(
            schema.field_with_name("tpep_pickup_datetime").unwrap().data_type(),
            &DataType::Timestamp(TimeUnit::Second, None)
        );
        assert_eq!(
            schema.field_with_name("fare_amount").unwrap().data_type(),
            &DataType::Float64
        );
    }

    #[test]
    fn green_and_fhv_differ_where_files_differ() {
        let green = Service::Green.arrow_schema();
        assert_eq!(green.fields().len(), 20);
        // green carries RatecodeID as an integer, yellow as text
        assert_eq!(
            green.field_with_name("RatecodeID").unwrap().data_type(),
            &DataType::Int64
        );
        let fhv = Service::Fhv.arrow_schema();
        assert_eq!(fhv.fields().len(), 7);
        assert!(fhv.field_with_name("dropOff_datetime").is_ok());
    }

    #[test]
    fn column_kinds_survive_the_arrow_schema() {
        for service in Service::ALL {
            let kinds: Vec<_> = service
                .arrow_schema()
                .fields()
                .iter()
                .map(|f| column_kind(f.data_type()))
                .collect();
            let expected: Vec<_> = service.columns().iter().map(|c| Some(c.kind)).collect();
            assert_eq!(kinds, expected, "{}", service);
        }
        assert_eq!(column_kind(&DataType::Boolean), None);
        assert_eq!(
            column_kind(&DataType::Timestamp(TimeUnit::Millisecond, None)),
            None
        );
    }

    #[test]
    fn month_bounds() {
        assert_eq!(check_month(1), Ok(1));
        assert_eq!(check_month(12), Ok(12));
        assert_eq!(check_month(0), Err(EtlError::InvalidMonth(0)));
        assert_eq!(check_month(13), Err(EtlError::InvalidMonth(13)));
    }
}
