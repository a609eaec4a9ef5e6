//! Shared fixtures and fakes for unit tests.

use anyhow::{anyhow, Result};
use arrow::record_batch::RecordBatch;
use async_trait::async_trait;
use bytes::Bytes;
use flate2::{write::GzEncoder, Compression};
use std::{
    collections::{HashMap, HashSet},
    io::Write,
    sync::{
        atomic::{AtomicUsize, Ordering},
        Mutex,
    },
    time::Duration,
};

use crate::fetch::TripSource;
use crate::warehouse::{TableRef, Warehouse};

const YELLOW_HEADER: &str = "VendorID,tpep_pickup_datetime,tpep_dropoff_datetime,passenger_count,trip_distance,RatecodeID,store_and_fwd_flag,PULocationID,DOLocationID,payment_type,fare_amount,extra,mta_tax,tip_amount,tolls_amount,improvement_surcharge,total_amount,congestion_surcharge";

/// A yellow-taxi CSV with `rows` trips; PULocationID counts up from 151.
pub fn yellow_csv(rows: usize) -> String {
    let mut out = String::from(YELLOW_HEADER);
    out.push('\n');
    for i in 0..rows {
        out.push_str(&format!(
            "1,2019-01-01 00:46:40,2019-01-01 00:53:20,1,1.5,1,N,{},239,1,7,0.5,0.5,1.65,0,0.3,9.95,\n",
            151 + i
        ));
    }
    out
}

pub fn gzip(data: &[u8]) -> Vec<u8> {
    let mut enc = GzEncoder::new(Vec::new(), Compression::fast());
    enc.write_all(data).unwrap();
    enc.finish().unwrap()
}

/// Serves canned bodies by URL and tracks how many fetches overlap.
#[derive(Default)]
pub struct FakeSource {
    bodies: Mutex<HashMap<String, Bytes>>,
    requested: Mutex<Vec<String>>,
    crashing: Mutex<HashSet<String>>,
    in_flight: AtomicUsize,
    peak: AtomicUsize,
    delay: Duration,
}

impl FakeSource {
    pub fn with_delay(delay: Duration) -> Self {
        Self {
            delay,
            ..Default::default()
        }
    }

    pub fn serve(&self, url: impl Into<String>, body: impl Into<Bytes>) {
        self.bodies.lock().unwrap().insert(url.into(), body.into());
    }

    /// Make fetches of `url` panic instead of returning.
    pub fn crash_on(&self, url: impl Into<String>) {
        self.crashing.lock().unwrap().insert(url.into());
    }

    pub fn requested(&self) -> Vec<String> {
        self.requested.lock().unwrap().clone()
    }

    pub fn peak_concurrency(&self) -> usize {
        self.peak.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl TripSource for FakeSource {
    async fn fetch(&self, url: &str) -> Result<Bytes> {
        self.requested.lock().unwrap().push(url.to_string());
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        let crash = self.crashing.lock().unwrap().contains(url);
        if crash {
            panic!("fetch of {} blew up", url);
        }

        self.bodies
            .lock()
            .unwrap()
            .get(url)
            .cloned()
            .ok_or_else(|| anyhow!("HTTP status client error (404 Not Found) for url ({})", url))
    }
}

/// Records every append; optionally fails on the n-th call (1-based).
#[derive(Default)]
pub struct RecordingWarehouse {
    pub chunks: Mutex<Vec<(String, usize)>>,
    pub fail_on_call: Option<usize>,
    calls: AtomicUsize,
}

impl RecordingWarehouse {
    pub fn failing_on(call: usize) -> Self {
        Self {
            fail_on_call: Some(call),
            ..Default::default()
        }
    }

    pub fn chunk_sizes(&self) -> Vec<usize> {
        self.chunks.lock().unwrap().iter().map(|(_, n)| *n).collect()
    }
}

#[async_trait]
impl Warehouse for RecordingWarehouse {
    async fn append(&self, table: &TableRef, chunk: &RecordBatch) -> Result<()> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        if self.fail_on_call == Some(call) {
            return Err(anyhow!("quota exceeded"));
        }
        self.chunks
            .lock()
            .unwrap()
            .push((table.to_string(), chunk.num_rows()));
        Ok(())
    }
}
