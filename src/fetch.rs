use std::time::Duration;

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use serde_json::Value;
use tracing::debug;
use url::Url;

use crate::config::Config;

/// Performs the network side of a dispatched action.
#[async_trait]
pub trait Fetcher: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<Value>;
}

/// GETs catalog urls relative to a base url and parses the body as JSON.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: reqwest::Client,
    base: Url,
    api_key: Option<String>,
}

impl HttpFetcher {
    pub fn new(base: &str, api_key: Option<String>, timeout: Duration) -> Result<Self> {
        // Url::join drops the last path segment unless the base ends with '/'
        let mut base = base.trim().to_string();
        if !base.ends_with('/') { base.push('/'); }
        let base = Url::parse(&base).with_context(|| format!("invalid api base url: {base}"))?;
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .context("building http client")?;
        Ok(Self { client, base, api_key })
    }

    pub fn from_config(cfg: &Config) -> Result<Self> { Self::new(&cfg.api_base, cfg.api_key.clone(), cfg.timeout()) }

    /// Absolute request url for a catalog url, with the api key attached.
    pub fn resolve(&self, url: &str) -> Result<Url> {
        let mut out = self.base.join(url).with_context(|| format!("invalid catalog url: {url}"))?;
        if let Some(key) = &self.api_key {
            out.query_pairs_mut().append_pair("api_key", key);
        }
        Ok(out)
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn fetch(&self, url: &str) -> Result<Value> {
        let target = self.resolve(url)?;
        debug!(path = target.path(), "GET");
        let resp = self.client.get(target).send().await.with_context(|| format!("requesting {url}"))?;
        let status = resp.status();
        if !status.is_success() { bail!("GET {url} returned {status}"); }
        resp.json::<Value>().await.with_context(|| format!("decoding response from {url}"))
    }
}
