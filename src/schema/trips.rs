// src/schema/trips.rs
//
// Fixed column layouts of the NYC TLC trip files, in file order.

use super::types::{Column, ColumnKind::*};

pub const YELLOW_COLUMNS: &[Column] = &[
    Column::new("VendorID", Utf8),
    Column::new("tpep_pickup_datetime", Timestamp),
    Column::new("tpep_dropoff_datetime", Timestamp),
    Column::new("passenger_count", Int64),
    Column::new("trip_distance", Float64),
    Column::new("RatecodeID", Utf8),
    Column::new("store_and_fwd_flag", Utf8),
    Column::new("PULocationID", Int64),
    Column::new("DOLocationID", Int64),
    Column::new("payment_type", Int64),
    Column::new("fare_amount", Float64),
    Column::new("extra", Float64),
    Column::new("mta_tax", Float64),
    Column::new("tip_amount", Float64),
    Column::new("tolls_amount", Float64),
    Column::new("improvement_surcharge", Float64),
    Column::new("total_amount", Float64),
    Column::new("congestion_surcharge", Float64),
];

pub const GREEN_COLUMNS: &[Column] = &[
    Column::new("VendorID", Utf8),
    Column::new("lpep_pickup_datetime", Timestamp),
    Column::new("lpep_dropoff_datetime", Timestamp),
    Column::new("store_and_fwd_flag", Utf8),
    Column::new("RatecodeID", Int64),
    Column::new("PULocationID", Int64),
    Column::new("DOLocationID", Int64),
    Column::new("passenger_count", Int64),
    Column::new("trip_distance", Float64),
    Column::new("fare_amount", Float64),
    Column::new("extra", Float64),
    Column::new("mta_tax", Float64),
    Column::new("tip_amount", Float64),
    Column::new("tolls_amount", Float64),
    Column::new("ehail_fee", Float64),
    Column::new("improvement_surcharge", Float64),
    Column::new("total_amount", Float64),
    Column::new("payment_type", Int64),
    Column::new("trip_type", Int64),
    Column::new("congestion_surcharge", Float64),
];

pub const FHV_COLUMNS: &[Column] = &[
    Column::new("dispatching_base_num", Utf8),
    Column::new("pickup_datetime", Timestamp),
    Column::new("dropOff_datetime", Timestamp),
    Column::new("PUlocationID", Int64),
    Column::new("DOlocationID", Int64),
    Column::new("SR_Flag", Int64),
    Column::new("Affiliated_base_number", Utf8),
];
