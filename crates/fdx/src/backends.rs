//! 🔌 Backends — where the real I/O happens.
//!
//! 🚰 Source backends pour the raw payload in. Search engine backends take the
//! bulk bodies, hold the index, and answer queries. And in between, we panic!
//! (kidding, we use anyhow)
//!
//! 🎭 This module is the casting agency. Need the payload from a file on disk?
//! Straight from an Overpass interpreter? From a string some test typed by hand?
//! Need an index on a real OpenSearch cluster, or one that lives in a `BTreeMap`
//! and dies with the process? We've got a backend for that.
//!
//! 🧠 Knowledge graph: trait → concrete impls → enum dispatcher → `from_config`.
//! Configs live next to the backend that reads them; `app_config` only holds the
//! tagged enums that pick one.
//!
//! 🦆 The duck is here because every file must have one. This is law. Do not question the duck.

use anyhow::Result;
use async_trait::async_trait;
use serde_json::Value;

use crate::app_config::{EngineConfig, SourceConfig};
use crate::loader::BulkResponse;

pub(crate) mod file;
pub(crate) mod in_mem;
pub(crate) mod opensearch;
pub(crate) mod overpass;

// 🎯 Re-export backend-specific configs so callers can do `backends::FileSourceConfig`
// instead of spelunking into `backends::file::FileSourceConfig`.
pub use file::FileSourceConfig;
pub use in_mem::InMemorySourceConfig;
pub use opensearch::OpenSearchConfig;
pub use overpass::OverpassSourceConfig;

// ===== Source Trait and Backend Enum =====

/// 🚰 A source that produces the raw payload: one JSON object with an `elements` array.
///
/// # Contract
/// - `fetch_payload` returns the whole payload as text. Parsing is the supervisor's job.
/// - `&mut self` because sources are allowed to have state. Most of them don't.
#[async_trait]
pub(crate) trait Source: std::fmt::Debug {
    async fn fetch_payload(&mut self) -> Result<String>;
}

/// 🎭 The many faces of a Source.
#[derive(Debug)]
pub(crate) enum SourceBackend {
    File(file::FileSource),
    Overpass(overpass::OverpassSource),
    InMemory(in_mem::InMemorySource),
}

impl SourceBackend {
    /// 🏭 Pick the backend the config asked for and stand it up.
    pub(crate) fn from_config(config: &SourceConfig) -> Result<Self> {
        Ok(match config {
            SourceConfig::File(c) => SourceBackend::File(file::FileSource::new(c.clone())?),
            SourceConfig::Overpass(c) => {
                SourceBackend::Overpass(overpass::OverpassSource::new(c.clone())?)
            }
            SourceConfig::InMemory(c) => {
                SourceBackend::InMemory(in_mem::InMemorySource::new(c.payload.clone()))
            }
        })
    }
}

#[async_trait]
impl Source for SourceBackend {
    async fn fetch_payload(&mut self) -> Result<String> {
        match self {
            SourceBackend::File(f) => f.fetch_payload().await,
            SourceBackend::Overpass(o) => o.fetch_payload().await,
            SourceBackend::InMemory(i) => i.fetch_payload().await,
        }
    }
}

// ===== Search Engine Trait and Backend Enum =====

/// 🔎 The search engine, seen from the outside: an opaque service with an index
/// lifecycle, a bulk write endpoint, and a query endpoint.
///
/// # Contract
/// - `index_exists` / `create_index`: the schema is applied once per index lifetime.
///   Creating an index that already exists is not an error.
/// - `bulk`: one NDJSON body, one request, one [`BulkResponse`]. Transport
///   failures are `Err`. Per-document failures live inside the response.
/// - `search`: the query body goes in, the raw engine response comes out, unmodified.
#[async_trait]
pub(crate) trait SearchEngine: std::fmt::Debug {
    async fn index_exists(&self, index: &str) -> Result<bool>;
    async fn create_index(&self, index: &str, definition: &Value) -> Result<()>;
    async fn bulk(&self, payload: String, refresh: bool) -> Result<BulkResponse>;
    async fn search(&self, index: &str, body: &Value) -> Result<Value>;
}

/// 🎭 The many faces of a search engine. One real, one imaginary.
#[derive(Debug, Clone)]
pub(crate) enum EngineBackend {
    OpenSearch(opensearch::OpenSearchEngine),
    InMemory(in_mem::InMemoryEngine),
}

impl EngineBackend {
    pub(crate) fn from_config(config: &EngineConfig) -> Result<Self> {
        Ok(match config {
            EngineConfig::OpenSearch(c) => {
                EngineBackend::OpenSearch(opensearch::OpenSearchEngine::new(c.clone())?)
            }
            EngineConfig::InMemory => EngineBackend::InMemory(in_mem::InMemoryEngine::new()),
        })
    }
}

#[async_trait]
impl SearchEngine for EngineBackend {
    async fn index_exists(&self, index: &str) -> Result<bool> {
        match self {
            EngineBackend::OpenSearch(e) => e.index_exists(index).await,
            EngineBackend::InMemory(e) => e.index_exists(index).await,
        }
    }

    async fn create_index(&self, index: &str, definition: &Value) -> Result<()> {
        match self {
            EngineBackend::OpenSearch(e) => e.create_index(index, definition).await,
            EngineBackend::InMemory(e) => e.create_index(index, definition).await,
        }
    }

    async fn bulk(&self, payload: String, refresh: bool) -> Result<BulkResponse> {
        match self {
            EngineBackend::OpenSearch(e) => e.bulk(payload, refresh).await,
            EngineBackend::InMemory(e) => e.bulk(payload, refresh).await,
        }
    }

    async fn search(&self, index: &str, body: &Value) -> Result<Value> {
        match self {
            EngineBackend::OpenSearch(e) => e.search(index, body).await,
            EngineBackend::InMemory(e) => e.search(index, body).await,
        }
    }
}
