//! Block-blob store over the Azure Storage REST surface.
//!
//! Only the three capability operations are spoken: `Put Block`,
//! `Put Block List` and blob download. Authorization rides on a
//! pre-signed SAS token appended to each request.

use crate::error::{PipelineError, Result};
use crate::storage::store::ObjectStore;
use crate::stream::{self, ByteStream};
use async_trait::async_trait;
use bytes::Bytes;
use futures_util::StreamExt;
use tracing::debug;

/// Object store backed by an Azure-style block-blob account.
pub struct AzureBlobStore {
    client: reqwest::Client,
    account: String,
    sas_token: String,
}

impl AzureBlobStore {
    pub fn new(account: impl Into<String>, sas_token: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            account: account.into(),
            sas_token: sas_token.into(),
        }
    }

    fn endpoint(&self) -> String {
        format!("https://{}.blob.core.windows.net", self.account)
    }

    fn blob_request(
        &self,
        method: reqwest::Method,
        container: &str,
        blob: &str,
    ) -> reqwest::RequestBuilder {
        let mut url = format!("{}/{container}/{blob}", self.endpoint());
        if !self.sas_token.is_empty() {
            url.push('?');
            url.push_str(&self.sas_token);
        }
        self.client.request(method, url)
    }

    async fn check(response: reqwest::Response, action: &str) -> Result<reqwest::Response> {
        let status = response.status();
        if !status.is_success() {
            return Err(PipelineError::Upload {
                message: format!("store rejected {action} with status {status}"),
            });
        }
        Ok(response)
    }
}

#[async_trait]
impl ObjectStore for AzureBlobStore {
    async fn stage_block(
        &self,
        container: &str,
        blob: &str,
        block_id: &str,
        data: Bytes,
    ) -> Result<()> {
        let response = self
            .blob_request(reqwest::Method::PUT, container, blob)
            .query(&[("comp", "block"), ("blockid", block_id)])
            .body(data)
            .send()
            .await
            .map_err(|e| PipelineError::Upload {
                message: format!("stage request failed: {e}"),
            })?;
        Self::check(response, "block stage").await?;
        debug!(container, blob, block_id, "block staged");
        Ok(())
    }

    async fn commit_block_list(
        &self,
        container: &str,
        blob: &str,
        block_ids: &[String],
    ) -> Result<()> {
        let mut body = String::from(r#"<?xml version="1.0" encoding="utf-8"?><BlockList>"#);
        for id in block_ids {
            body.push_str(&format!("<Latest>{id}</Latest>"));
        }
        body.push_str("</BlockList>");

        let response = self
            .blob_request(reqwest::Method::PUT, container, blob)
            .query(&[("comp", "blocklist")])
            .header("Content-Type", "application/xml")
            .body(body)
            .send()
            .await
            .map_err(|e| PipelineError::Upload {
                message: format!("commit request failed: {e}"),
            })?;
        Self::check(response, "block list commit").await?;
        debug!(container, blob, blocks = block_ids.len(), "block list committed");
        Ok(())
    }

    async fn download(&self, container: &str, blob: &str) -> Result<ByteStream> {
        let response = self
            .blob_request(reqwest::Method::GET, container, blob)
            .send()
            .await
            .map_err(|e| PipelineError::Stream {
                message: format!("download request failed: {e}"),
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(PipelineError::Stream {
                message: format!("download of {container}/{blob} returned status {status}"),
            });
        }

        let (tx, rx) = stream::channel();
        tokio::spawn(async move {
            let mut body = response.bytes_stream();
            while let Some(item) = body.next().await {
                let item = item.map_err(|e| PipelineError::Stream {
                    message: format!("download stream failed: {e}"),
                });
                let failed = item.is_err();
                if tx.send(item).await.is_err() || failed {
                    break;
                }
            }
        });
        Ok(rx)
    }

    fn url(&self, container: &str, blob: &str) -> String {
        format!("{}/{container}/{blob}", self.endpoint())
    }
}
