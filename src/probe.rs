//! Reachability probe for remote rule-set URLs.
//!
//! One request per URL, bounded by a timeout, no retries. `HEAD` is tried
//! first; servers that refuse it get a plain `GET`.

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use std::time::Duration;
use tracing::debug;

#[cfg(test)]
use mockall::automock;

/// Default probe timeout in seconds
pub const DEFAULT_TIMEOUT_SECS: u64 = 8;

/// Something that can tell whether a URL answers
#[cfg_attr(test, automock)]
#[async_trait]
pub trait Prober: Send + Sync {
    /// `Ok(())` when the URL answered with a success status
    async fn probe(&self, url: &str) -> Result<()>;
}

/// HTTP prober backed by reqwest + rustls
pub struct HttpProber {
    client: Client,
}

impl HttpProber {
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(format!("rulecheck/{}", env!("CARGO_PKG_VERSION")))
            .build()
            .context("Failed to create HTTP client")?;
        Ok(Self { client })
    }
}

fn head_refused(status: StatusCode) -> bool {
    matches!(
        status,
        StatusCode::METHOD_NOT_ALLOWED | StatusCode::FORBIDDEN | StatusCode::NOT_IMPLEMENTED
    )
}

#[async_trait]
impl Prober for HttpProber {
    async fn probe(&self, url: &str) -> Result<()> {
        let start = std::time::Instant::now();
        let mut status = self.client.head(url).send().await?.status();

        if head_refused(status) {
            debug!("HEAD refused with {} for {}, retrying as GET", status, url);
            status = self.client.get(url).send().await?.status();
        }

        debug!("Probed {} -> {} in {}ms", url, status, start.elapsed().as_millis());

        if !status.is_success() {
            bail!("HTTP {}", status);
        }
        Ok(())
    }
}
