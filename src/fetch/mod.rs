// src/fetch/mod.rs

pub mod http;

pub use http::HttpSource;

use anyhow::Result;
use async_trait::async_trait;
use bytes::Bytes;

use crate::schema::Service;

/// Somewhere raw monthly trip files can be fetched from.
#[async_trait]
pub trait TripSource: Send + Sync {
    /// GET `url`; any non-2xx status is an error.
    async fn fetch(&self, url: &str) -> Result<Bytes>;
}

/// `{service}_tripdata_{year}-{month:02}.csv.gz`
pub fn csv_file_name(service: Service, year: i32, month: u32) -> String {
    format!("{}_tripdata_{}-{:02}.csv.gz", service, year, month)
}

/// `{base_url}/{service}/{service}_tripdata_{year}-{month:02}.csv.gz`
pub fn source_url(base_url: &str, service: Service, year: i32, month: u32) -> String {
    format!(
        "{}/{}/{}",
        base_url.trim_end_matches('/'),
        service,
        csv_file_name(service, year, month)
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn url_follows_release_layout() {
        assert_eq!(
            source_url(
                "https://github.com/DataTalksClub/nyc-tlc-data/releases/download/",
                Service::Yellow,
                2019,
                5
            ),
            "https://github.com/DataTalksClub/nyc-tlc-data/releases/download/yellow/yellow_tripdata_2019-05.csv.gz"
        );
        assert_eq!(
            csv_file_name(Service::Fhv, 2020, 11),
            "fhv_tripdata_2020-11.csv.gz"
        );
    }
}
