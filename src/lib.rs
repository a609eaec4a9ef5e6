pub mod config;
pub mod error;
pub mod fetch;
pub mod load;
pub mod process;
pub mod retry;
pub mod schema;
pub mod storage;
pub mod telemetry;
pub mod warehouse;

pub use error::EtlError;

#[cfg(test)]
mod testing;
