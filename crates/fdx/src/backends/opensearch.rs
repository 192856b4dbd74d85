use std::io::Write;
use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use flate2::Compression;
use flate2::write::GzEncoder;
use reqwest::StatusCode;
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, trace};

use crate::backends::SearchEngine;
use crate::loader::BulkResponse;

// KNOWLEDGE GRAPH: config lives co-located with the backend that uses it.
#[derive(Debug, Deserialize, Clone)]
pub struct OpenSearchConfig {
    /// 📡 Where the cluster lives. `[host]`, `host/` and bare `host` are all tidied up.
    pub url: String,
    /// 🔒 Username. The bouncer at the club. Except the club is a database.
    #[serde(default)]
    pub username: Option<String>,
    /// 🔒 Password. "password123" is not a password. It is a confession.
    #[serde(default)]
    pub password: Option<String>,
    /// 🔒 API key — the velvet rope variant of authentication. Wins over basic auth.
    #[serde(default)]
    pub api_key: Option<String>,
    /// 🫁 gzip the bulk bodies. Restaurant JSON squishes nicely.
    #[serde(default)]
    pub http_compress: bool,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_timeout_secs() -> u64 {
    30
}

/// 🧹 `[search.example.com]/` → `https://search.example.com`.
///
/// Surrounding brackets go, trailing slashes go, and a bare host gets `https://`.
pub(crate) fn normalize_url(raw: &str) -> String {
    let trimmed = raw.trim();
    let unbracketed = trimmed
        .strip_prefix('[')
        .and_then(|s| s.strip_suffix(']'))
        .unwrap_or(trimmed);
    let unslashed = unbracketed.trim_end_matches('/');
    if unslashed.contains("://") {
        unslashed.to_string()
    } else {
        format!("https://{unslashed}")
    }
}

/// 📡 The OpenSearch client — pure HTTP, no buffering, no retries.
///
/// Construction never touches the network. The first real request (the index
/// existence check) is the connectivity test.
#[derive(Debug, Clone)]
pub(crate) struct OpenSearchEngine {
    client: reqwest::Client,
    base_url: String,
    engine_config: OpenSearchConfig,
}

impl OpenSearchEngine {
    pub(crate) fn new(engine_config: OpenSearchConfig) -> Result<Self> {
        // 🔧 10 second connect timeout because if the cluster can't handshake in 10
        // seconds, it's not having a good time and neither are we.
        let client = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .timeout(Duration::from_secs(engine_config.timeout_secs))
            .build()
            .context("💀 The HTTP client refused to be born. The TLS stack wept. The architect shrugged.")?;

        Ok(Self {
            client,
            base_url: normalize_url(&engine_config.url),
            engine_config,
        })
    }

    /// 🔒 Auth priority: API key wins over basic auth. This is not a democracy.
    fn authorize(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        if let Some(ref api_key) = self.engine_config.api_key {
            request.header("Authorization", format!("ApiKey {}", api_key))
        } else if let Some(ref username) = self.engine_config.username {
            request.basic_auth(username, self.engine_config.password.as_ref())
        } else {
            request
        }
    }

    fn gzip(body: &[u8]) -> Result<Vec<u8>> {
        let mut encoder = GzEncoder::new(Vec::with_capacity(body.len() / 4), Compression::default());
        encoder
            .write_all(body)
            .context("💀 gzip choked on the bulk body")?;
        encoder.finish().context("💀 gzip could not finish the bulk body")
    }
}

#[async_trait]
impl SearchEngine for OpenSearchEngine {
    async fn index_exists(&self, index: &str) -> Result<bool> {
        let index_url = format!("{}/{}", self.base_url, index);
        let response = self
            .authorize(self.client.head(&index_url))
            .send()
            .await
            .context("💀 Reached out to check if the index exists. Got ghosted. The network is giving us the silent treatment.")?;

        match response.status() {
            status if status.is_success() => Ok(true),
            status if status == StatusCode::NOT_FOUND => Ok(false),
            status => anyhow::bail!(
                "💀 Asked whether '{}' exists and got '{}' instead of a yes or a no",
                index_url,
                status
            ),
        }
    }

    async fn create_index(&self, index: &str, definition: &Value) -> Result<()> {
        let index_url = format!("{}/{}", self.base_url, index);
        let body = serde_json::to_vec(definition).context("💀 The index definition refused to become JSON")?;
        let response = self
            .authorize(self.client.put(&index_url))
            .header("Content-Type", "application/json")
            .body(body)
            .send()
            .await
            .context("💀 The create-index request never reached the cluster")?;

        let status = response.status();
        if status.is_success() {
            debug!("🏗️ created index '{}'", index);
            return Ok(());
        }

        let body = response.text().await.unwrap_or_default();
        // 🏁 somebody else won the race between our HEAD and our PUT. same outcome.
        if status == StatusCode::BAD_REQUEST && body.contains("resource_already_exists_exception") {
            debug!("🏗️ index '{}' appeared while we were creating it", index);
            return Ok(());
        }
        anyhow::bail!(
            "💀 Creating index '{}' failed with '{}'. The cluster said: '{}'",
            index,
            status,
            body
        )
    }

    /// 📡 One `POST /_bulk?refresh=..` with the rendered NDJSON body.
    ///
    /// ⚠️ Content-Type is `application/x-ndjson`, not `application/json`.
    /// 🔄 No retries. A transport failure here fails the run.
    async fn bulk(&self, payload: String, refresh: bool) -> Result<BulkResponse> {
        let bulk_url = format!("{}/_bulk?refresh={}", self.base_url, refresh);
        let payload_len = payload.len();
        let mut request = self
            .authorize(self.client.post(&bulk_url))
            .header("Content-Type", "application/x-ndjson");

        request = if self.engine_config.http_compress {
            let squished = Self::gzip(payload.as_bytes())?;
            trace!("🫁 gzip {} → {} bytes", payload_len, squished.len());
            request.header("Content-Encoding", "gzip").body(squished)
        } else {
            request.body(payload)
        };

        debug!("📡 sending {} bytes to /_bulk (refresh={})", payload_len, refresh);
        let response = request
            .send()
            .await
            .context("💀 The bulk request never made it to the cluster. Check connectivity, check timeouts, and check your feelings.")?;

        let status = response.status();
        let body = response
            .text()
            .await
            .context("💀 The bulk response body evaporated before we could read it")?;
        if !status.is_success() {
            anyhow::bail!(
                "💀 The bulk request arrived, but the cluster said '{}'. The body of the response read: '{}'",
                status,
                body
            );
        }

        serde_json::from_str(&body)
            .context("💀 The bulk response was not the `{errors, items}` shape we were promised")
    }

    async fn search(&self, index: &str, body: &Value) -> Result<Value> {
        let search_url = format!("{}/{}/_search", self.base_url, index);
        let request_body = serde_json::to_vec(body).context("💀 The query body refused to become JSON")?;
        let response = self
            .authorize(self.client.post(&search_url))
            .header("Content-Type", "application/json")
            .body(request_body)
            .send()
            .await
            .context("💀 The search request never reached the cluster")?;

        let status = response.status();
        let text = response
            .text()
            .await
            .context("💀 The search response body evaporated before we could read it")?;
        if !status.is_success() {
            anyhow::bail!("💀 Search on '{}' failed with '{}': '{}'", index, status, text);
        }
        serde_json::from_str(&text).context("💀 The search response was not JSON")
    }
}
