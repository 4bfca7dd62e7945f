//! archive.org client.
//!
//! Implements [`ArchiveStore`] over the archive.org S3-compatible API: one
//! `PUT` per file at `https://s3.us.archive.org/<item>/<path>`, with the
//! item auto-created on first use and its descriptive metadata supplied as
//! `x-archive-meta-*` headers. Credentials come from the `IA_ACCESS_KEY` and
//! `IA_SECRET_KEY` environment variables (an IA-S3 key pair).

use async_trait::async_trait;
use reqwest::Client;
use std::env;
use tracing::{error, info};

use crate::contract::{ArchiveStore, PutRequest, StoreError};

const S3_ENDPOINT: &str = "https://s3.us.archive.org";

pub struct ArchiveOrgClient {
    http: Client,
    access_key: String,
    secret_key: String,
    endpoint: String,
}

impl ArchiveOrgClient {
    pub fn new_from_env() -> Result<Self, StoreError> {
        dotenvy::dotenv().ok(); // loads environment variables from .env if present
        match (env::var("IA_ACCESS_KEY"), env::var("IA_SECRET_KEY")) {
            (Ok(access_key), Ok(secret_key)) => {
                info!(
                    access_key_set = !access_key.is_empty(),
                    "Initialized ArchiveOrgClient from environment"
                );
                Ok(Self {
                    http: Client::new(),
                    access_key,
                    secret_key,
                    endpoint: S3_ENDPOINT.to_string(),
                })
            }
            (Err(e), _) => {
                error!(error = ?e, "IA_ACCESS_KEY missing in environment");
                Err(Box::new(e))
            }
            (_, Err(e)) => {
                error!(error = ?e, "IA_SECRET_KEY missing in environment");
                Err(Box::new(e))
            }
        }
    }

    /// Point the client at a different endpoint, e.g. a local test server.
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }
}

#[async_trait]
impl ArchiveStore for ArchiveOrgClient {
    async fn put_file<'a>(&self, req: PutRequest<'a>) -> Result<(), StoreError> {
        let url = format!("{}/{}/{}", self.endpoint, req.item_id, req.remote_path);
        info!(url = %url, file = %req.remote_path, "Uploading file to archive item");

        let body = tokio::fs::read(req.local_path).await?;
        let meta = req.metadata;
        let response = self
            .http
            .put(&url)
            .header(
                "authorization",
                format!("LOW {}:{}", self.access_key, self.secret_key),
            )
            .header("x-archive-auto-make-bucket", "1")
            .header("x-archive-meta01-collection", &meta.collection)
            .header("x-archive-meta-mediatype", &meta.mediatype)
            .header("x-archive-meta-title", &meta.title)
            .header("x-archive-meta-description", &meta.description)
            .header("x-archive-meta-creator", &meta.creator)
            .header("x-archive-meta-subject", &meta.subject)
            .header("x-archive-meta-licenseurl", &meta.license_url)
            .body(body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let text = response
                .text()
                .await
                .unwrap_or_else(|_| String::from("<failed to decode response body>"));
            error!(status = %status, url = %url, "Archive upload rejected: {text}");
            return Err(format!("archive.org returned {status}: {text}").into());
        }

        info!(status = %status, file = %req.remote_path, "Upload accepted");
        Ok(())
    }
}
