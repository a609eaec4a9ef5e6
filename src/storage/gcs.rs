// src/storage/gcs.rs

use anyhow::{Context, Result};
use async_trait::async_trait;
use bytes::Bytes;
use google_cloud_storage::{
    client::{google_cloud_auth::credentials::CredentialsFile, Client, ClientConfig},
    http::objects::{
        download::Range,
        get::GetObjectRequest,
        upload::{Media, UploadObjectRequest, UploadType},
    },
};
use std::path::Path;
use tracing::{debug, info};

use super::BlobStore;

/// Google Cloud Storage bucket.
#[derive(Clone)]
pub struct GcsStore {
    client: Client,
    bucket: String,
}

impl GcsStore {
    /// Authenticate with the service-account key at `credentials`, or with
    /// application default credentials when none is given.
    pub async fn connect(bucket: impl Into<String>, credentials: Option<&Path>) -> Result<Self> {
        let bucket = bucket.into();
        let config = match credentials {
            Some(path) => {
                let file = CredentialsFile::new_from_file(path.display().to_string())
                    .await
                    .with_context(|| format!("reading credentials {}", path.display()))?;
                ClientConfig::default()
                    .with_credentials(file)
                    .await
                    .context("authenticating to GCS with key file")?
            }
            None => ClientConfig::default()
                .with_auth()
                .await
                .context("authenticating to GCS")?,
        };
        info!(bucket = %bucket, "GCS client ready");
        Ok(Self {
            client: Client::new(config),
            bucket,
        })
    }
}

#[async_trait]
impl BlobStore for GcsStore {
    async fn get(&self, path: &str) -> Result<Bytes> {
        let req = GetObjectRequest {
            bucket: self.bucket.clone(),
            object: path.to_string(),
            ..Default::default()
        };
        let data = self
            .client
            .download_object(&req, &Range::default())
            .await
            .with_context(|| format!("downloading gs://{}/{}", self.bucket, path))?;
        debug!(object = %path, bytes = data.len(), "downloaded from GCS");
        Ok(Bytes::from(data))
    }

    async fn put(&self, path: &str, data: Vec<u8>) -> Result<()> {
        let len = data.len();
        let mut media = Media::new(path.to_string());
        media.content_length = Some(len as u64);
        let request = UploadObjectRequest {
            bucket: self.bucket.clone(),
            ..Default::default()
        };

        self.client
            .upload_object(&request, data, &UploadType::Simple(media))
            .await
            .with_context(|| format!("uploading {} to GCS bucket {}", path, self.bucket))?;

        info!(object = %path, bytes = len, "uploaded to gs://{}", self.bucket);
        Ok(())
    }

    fn location(&self) -> String {
        format!("gs://{}", self.bucket)
    }
}
