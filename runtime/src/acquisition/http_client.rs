// Copyright 2026 Normas Contributors
// SPDX-License-Identifier: Apache-2.0

//! Plain HTTP access to the portal.
//!
//! Not a browser: used for the direct artifact probe and for sidecar
//! downloads. Retries on 5xx, backs off on 429, and falls back to
//! HTTP/1.1 when the server rejects HTTP/2.

use crate::error::{AcquireError, AcquireResult};
use std::time::Duration;

const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) \
                          AppleWebKit/537.36 (KHTML, like Gecko) \
                          Chrome/131.0.0.0 Safari/537.36";

const MAX_RETRIES: u32 = 2;

/// Status and type of a probed URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeResponse {
    pub url: String,
    pub status: u16,
    pub content_type: Option<String>,
}

impl ProbeResponse {
    /// A 200 response that declares a PDF body.
    pub fn is_pdf(&self) -> bool {
        self.status == 200
            && self
                .content_type
                .as_deref()
                .is_some_and(|ct| ct.to_ascii_lowercase().contains("application/pdf"))
    }
}

/// HTTP client for probes and downloads.
#[derive(Clone)]
pub struct HttpClient {
    client: reqwest::Client,
    /// HTTP/1.1-only fallback for servers that reject HTTP/2.
    h1_client: reqwest::Client,
}

impl HttpClient {
    pub fn new(timeout: Duration) -> Self {
        let builder = || {
            reqwest::Client::builder()
                .timeout(timeout)
                .redirect(reqwest::redirect::Policy::limited(5))
                .user_agent(USER_AGENT)
        };
        let client = builder().build().unwrap_or_default();
        let h1_client = builder().http1_only().build().unwrap_or_default();
        Self { client, h1_client }
    }

    /// Lightweight existence and type check.
    ///
    /// Issues a HEAD request and falls back to GET when the server refuses
    /// HEAD. The body of the GET is never read.
    pub async fn probe(&self, url: &str, timeout: Duration) -> Result<ProbeResponse, reqwest::Error> {
        let resp = self.client.head(url).timeout(timeout).send().await?;
        let resp = if matches!(resp.status().as_u16(), 405 | 501) {
            self.client.get(url).timeout(timeout).send().await?
        } else {
            resp
        };

        Ok(ProbeResponse {
            url: url.to_string(),
            status: resp.status().as_u16(),
            content_type: resp
                .headers()
                .get(reqwest::header::CONTENT_TYPE)
                .and_then(|v| v.to_str().ok())
                .map(|s| s.to_string()),
        })
    }

    /// Download a body as bytes.
    pub async fn download(&self, url: &str, timeout: Duration) -> AcquireResult<Vec<u8>> {
        match self.download_inner(&self.client, url, timeout).await {
            Ok(bytes) => Ok(bytes),
            Err(e) => {
                let msg = e.to_string();
                if msg.contains("http2") || msg.contains("protocol") || msg.contains("connection closed") {
                    self.download_inner(&self.h1_client, url, timeout).await
                } else {
                    Err(e)
                }
            }
        }
    }

    async fn download_inner(
        &self,
        client: &reqwest::Client,
        url: &str,
        timeout: Duration,
    ) -> AcquireResult<Vec<u8>> {
        let failed = |reason: String| AcquireError::SidecarDownload {
            url: url.to_string(),
            reason,
        };
        let mut retries = 0u32;

        loop {
            match client.get(url).timeout(timeout).send().await {
                Ok(r) => {
                    let status = r.status().as_u16();

                    if status >= 500 && retries < MAX_RETRIES {
                        retries += 1;
                        tokio::time::sleep(Duration::from_millis(500 * 2u64.pow(retries - 1))).await;
                        continue;
                    }

                    if status == 429 && retries < MAX_RETRIES {
                        retries += 1;
                        let retry_after = r
                            .headers()
                            .get(reqwest::header::RETRY_AFTER)
                            .and_then(|v| v.to_str().ok())
                            .and_then(|s| s.parse::<u64>().ok())
                            .unwrap_or(2);
                        tokio::time::sleep(Duration::from_secs(retry_after.min(10))).await;
                        continue;
                    }

                    if status != 200 {
                        return Err(failed(format!("HTTP {status}")));
                    }

                    let bytes = r.bytes().await.map_err(|e| failed(e.to_string()))?;
                    return Ok(bytes.to_vec());
                }
                Err(e) => {
                    if retries < MAX_RETRIES && !e.is_timeout() {
                        retries += 1;
                        tokio::time::sleep(Duration::from_millis(500 * 2u64.pow(retries - 1))).await;
                        continue;
                    }
                    return Err(failed(e.to_string()));
                }
            }
        }
    }
}
