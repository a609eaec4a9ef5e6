// src/fetch/http.rs

use anyhow::{Context, Result};
use async_trait::async_trait;
use bytes::{Bytes, BytesMut};
use futures::StreamExt;
use reqwest::Client;
use tracing::debug;

use super::TripSource;

const PROGRESS_EVERY: usize = 10 * 1024 * 1024;

/// Plain HTTP(S) mirror, e.g. the GitHub release assets.
#[derive(Clone, Default)]
pub struct HttpSource {
    client: Client,
}

impl HttpSource {
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl TripSource for HttpSource {
    async fn fetch(&self, url: &str) -> Result<Bytes> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .with_context(|| format!("GET {}", url))?
            .error_for_status()
            .with_context(|| format!("GET {}", url))?;

        let mut body = BytesMut::new();
        let mut next_report = PROGRESS_EVERY;
        let mut stream = response.bytes_stream();
        while let Some(chunk) = stream.next().await {
            let chunk = chunk.with_context(|| format!("reading body from {}", url))?;
            body.extend_from_slice(&chunk);
            if body.len() >= next_report {
                debug!(url, mb = body.len() / (1024 * 1024), "downloading");
                next_report += PROGRESS_EVERY;
            }
        }

        debug!(url, bytes = body.len(), "download complete");
        Ok(body.freeze())
    }
}
