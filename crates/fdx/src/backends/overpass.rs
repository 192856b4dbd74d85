// ai
//! 🗺️ Overpass source — asking OpenStreetMap nicely for every place that sells food 📡
//!
//! 🎬 COLD OPEN — EXT. A PUBLIC OVERPASS INTERPRETER — PEAK HOURS
//!
//! The interpreter is free, shared, rate limited, and running queries for half
//! the planet. We show up with a form-encoded `data=` body describing an area and
//! a list of amenities, and it sends back one big JSON object with an `elements`
//! array. We don't parse the query language. We don't validate it. We pass it
//! along the way a courier passes along a sealed envelope.
//!
//! ## Knowledge Graph 🧠
//! - Request: `POST {url}` with `Content-Type: application/x-www-form-urlencoded`
//!   and body `data=<query>` (encoded with `url::form_urlencoded`)
//! - Response: the raw payload text, handed to the supervisor untouched
//! - [`FETCH_AMENITIES`] is deliberately wider than the indexable set in
//!   `common::Amenity`. The fetch side asks for ice cream, food courts and
//!   takeaway too; the transformer turns those away at the door. 🦆

use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::Deserialize;
use tracing::{debug, info};

use crate::backends::Source;

/// 🍦 What the fetch query asks for. Three more than what gets indexed.
pub const FETCH_AMENITIES: [&str; 8] = [
    "restaurant",
    "cafe",
    "fast_food",
    "bar",
    "pub",
    "ice_cream",
    "food_court",
    "takeaway",
];

const DEFAULT_OVERPASS_URL: &str = "https://overpass-api.de/api/interpreter";

/// 🗺️ Every node, way and relation in San Francisco with a food-ish amenity,
/// with `out center` so ways and relations come back with a midpoint.
pub fn default_query() -> String {
    let amenities = FETCH_AMENITIES.join("|");
    format!(
        "[out:json][timeout:25];\n\
         area[\"name\"=\"San Francisco\"][\"boundary\"=\"administrative\"]->.searchArea;\n\
         (\n\
         \x20 node[\"amenity\"~\"{amenities}\"](area.searchArea);\n\
         \x20 way[\"amenity\"~\"{amenities}\"](area.searchArea);\n\
         \x20 relation[\"amenity\"~\"{amenities}\"](area.searchArea);\n\
         );\n\
         out center;\n"
    )
}

fn default_url() -> String {
    DEFAULT_OVERPASS_URL.to_string()
}

fn default_timeout_secs() -> u64 {
    90
}

#[derive(Debug, Deserialize, Clone)]
pub struct OverpassSourceConfig {
    #[serde(default = "default_url")]
    pub url: String,
    /// 📜 Opaque query text. Sent as-is.
    #[serde(default = "default_query")]
    pub query: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for OverpassSourceConfig {
    fn default() -> Self {
        Self {
            url: default_url(),
            query: default_query(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

#[derive(Debug)]
pub(crate) struct OverpassSource {
    client: reqwest::Client,
    source_config: OverpassSourceConfig,
}

impl OverpassSource {
    pub(crate) fn new(source_config: OverpassSourceConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .timeout(Duration::from_secs(source_config.timeout_secs))
            .build()
            .context("💀 The HTTP client for the Overpass source refused to be born. The TLS stack wept.")?;
        Ok(Self {
            client,
            source_config,
        })
    }
}

#[async_trait]
impl Source for OverpassSource {
    async fn fetch_payload(&mut self) -> Result<String> {
        let the_form_body = url::form_urlencoded::Serializer::new(String::new())
            .append_pair("data", &self.source_config.query)
            .finish();

        info!("🗺️ asking {} for the food map", self.source_config.url);
        let response = self
            .client
            .post(&self.source_config.url)
            .header("Content-Type", "application/x-www-form-urlencoded")
            .body(the_form_body)
            .send()
            .await
            .with_context(|| {
                format!(
                    "💀 The Overpass request to '{}' never came back. The interpreter \
                     might be down, rate limiting us, or simply having a day.",
                    self.source_config.url
                )
            })?;

        let status = response.status();
        let body = response
            .text()
            .await
            .context("💀 Overpass answered, but the body got lost on the way out.")?;
        if !status.is_success() {
            anyhow::bail!(
                "💀 Overpass said '{}' to our query. It also said: '{}'",
                status,
                body
            );
        }

        debug!("📦 Overpass handed over {} bytes of payload", body.len());
        Ok(body)
    }
}
