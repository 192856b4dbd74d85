//! 🔧 App Configuration — the sacred TOML-to-struct pipeline.
//!
//! 📡 "Config not found: We looked everywhere. Under the couch. Behind the fridge.
//! In the junk drawer. Nothing." — every developer at 3am 🦆
//!
//! 🏗️ Powered by Figment, because manually parsing env vars is a form of
//! self-harm that even the borrow checker wouldn't approve of.

use anyhow::Context;
use figment::{
    Figment,
    providers::{Env, Format, Toml},
};
use serde::Deserialize;
use std::path::Path;
use tracing::info;

use crate::backends::{FileSourceConfig, InMemorySourceConfig, OpenSearchConfig, OverpassSourceConfig};

/// 📦 The AppConfig: where the payload comes from, where the documents go,
/// and the handful of knobs that shape them on the way.
#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    /// 🚰 Optional here, required for `ingest`. Searching doesn't need a source.
    #[serde(default)]
    pub source_config: Option<SourceConfig>,
    pub engine_config: EngineConfig,
    #[serde(default)]
    pub ingest: IngestConfig,
}

/// 🚰 Where the raw payload comes from. Externally tagged: `[source_config.File]`.
///
/// The lowercase aliases exist because figment lowercases env var keys, so
/// `FDX_SOURCE_CONFIG__FILE__FILE_NAME` arrives as `source_config.file.file_name`.
#[derive(Debug, Deserialize, Clone)]
pub enum SourceConfig {
    #[serde(alias = "file")]
    File(FileSourceConfig),
    #[serde(alias = "overpass")]
    Overpass(OverpassSourceConfig),
    #[serde(alias = "inmemory", alias = "in_memory")]
    InMemory(InMemorySourceConfig),
}

/// 🔎 Which search engine holds the index.
#[derive(Debug, Deserialize, Clone)]
pub enum EngineConfig {
    #[serde(alias = "opensearch")]
    OpenSearch(OpenSearchConfig),
    #[serde(alias = "inmemory", alias = "in_memory")]
    InMemory,
}

/// 🍽️ The ingest knobs. Every one of them has a default.
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct IngestConfig {
    #[serde(default = "default_index_name")]
    pub index_name: String,
    /// 📦 Documents per bulk request. 100 documents = 200 NDJSON lines.
    #[serde(default = "default_max_batch_size_docs")]
    pub max_batch_size_docs: usize,
    /// 🏷️ Name for establishments that never told anyone their name.
    #[serde(default = "default_name")]
    pub default_name: String,
    /// 🏙️ City for addresses that forgot which city they're in.
    #[serde(default = "default_city")]
    pub default_city: String,
}

fn default_index_name() -> String {
    "restaurants".to_string()
}

fn default_max_batch_size_docs() -> usize {
    100
}

fn default_name() -> String {
    "Unknown".to_string()
}

fn default_city() -> String {
    "San Francisco".to_string()
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            index_name: default_index_name(),
            max_batch_size_docs: default_max_batch_size_docs(),
            default_name: default_name(),
            default_city: default_city(),
        }
    }
}

/// 🚀 Load the config — from a file, from env vars, or from the sheer power of hoping.
///
/// 🔧 Merges `FDX_`-prefixed environment variables with an optional TOML file.
/// Nested keys use a double underscore: `FDX_INGEST__INDEX_NAME=eateries`.
///
/// 📐 DESIGN NOTE:
///   - If `config_file_name` is None  → env vars only.
///   - If `config_file_name` is Some  → env vars + TOML file, merged. TOML wins on conflicts.
pub fn load_config(config_file_name: Option<&Path>) -> anyhow::Result<AppConfig> {
    info!(
        "🔧 Loading configuration: {:#?}",
        config_file_name.unwrap_or(Path::new(""))
    );

    let config = Figment::new().merge(Env::prefixed("FDX_").split("__"));

    let config = match config_file_name {
        Some(file_name) => config.merge(Toml::file(file_name)),
        None => config,
    };

    // 💬 a context message that tells you what went wrong. none of that "error: error" energy.
    let context_msg = match config_file_name {
        Some(path) => format!(
            "💀 Failed to parse configuration from file '{}' and environment variables (FDX_*). \
             The file exists in our hearts, but apparently not in a shape serde recognises.",
            path.display()
        ),
        None => "💀 Failed to parse configuration from environment variables (FDX_*). \
                 No file was provided, so this one's all on the environment. Classic."
            .to_string(),
    };

    config.extract().context(context_msg)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_test_config(contents: &str) -> anyhow::Result<tempfile::NamedTempFile> {
        // 🧪 a real file on disk because Figment wants TOML from disk, like it's method acting.
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile()?;
        file.write_all(contents.as_bytes())?;
        Ok(file)
    }

    #[test]
    fn the_one_where_a_file_source_and_a_real_cluster_move_in_together() -> anyhow::Result<()> {
        let config_file = write_test_config(
            r#"
            [source_config.File]
            file_name = "sf_restaurants.json"

            [engine_config.OpenSearch]
            url = "[search.example.com]"
            api_key = "sekrit"
            http_compress = true

            [ingest]
            index_name = "eateries"
            max_batch_size_docs = 250
            "#,
        )?;

        let app_config = load_config(Some(config_file.path()))?;

        match app_config.source_config {
            Some(SourceConfig::File(ref file)) => assert_eq!(file.file_name, "sf_restaurants.json"),
            ref honestly_who_knows => panic!(
                "💀 Expected a File source, but serde took us to {:?}. Plot twist energy.",
                honestly_who_knows
            ),
        }
        match app_config.engine_config {
            EngineConfig::OpenSearch(ref os) => {
                assert_eq!(os.url, "[search.example.com]");
                assert_eq!(os.api_key.as_deref(), Some("sekrit"));
                assert!(os.http_compress);
                assert_eq!(os.timeout_secs, 30);
            }
            ref honestly_who_knows => panic!("💀 Expected OpenSearch, got {:?}", honestly_who_knows),
        }
        assert_eq!(app_config.ingest.index_name, "eateries");
        assert_eq!(app_config.ingest.max_batch_size_docs, 250);
        assert_eq!(app_config.ingest.default_name, "Unknown");
        assert_eq!(app_config.ingest.default_city, "San Francisco");
        Ok(())
    }

    #[test]
    fn the_one_where_the_defaults_show_up_uninvited_but_helpful() -> anyhow::Result<()> {
        let config_file = write_test_config(
            r#"
            [engine_config.OpenSearch]
            url = "http://localhost:9200"
            "#,
        )?;

        let app_config: AppConfig = Figment::new()
            .merge(Toml::file(config_file.path()))
            .extract()?;

        assert!(app_config.source_config.is_none());
        assert_eq!(app_config.ingest, IngestConfig::default());
        assert_eq!(app_config.ingest.max_batch_size_docs, 100);
        Ok(())
    }

    #[test]
    fn the_one_where_overpass_fills_in_its_own_blanks() -> anyhow::Result<()> {
        let config_file = write_test_config(
            r#"
            [source_config.Overpass]

            [engine_config.OpenSearch]
            url = "http://localhost:9200"
            "#,
        )?;

        let app_config: AppConfig = Figment::new()
            .merge(Toml::file(config_file.path()))
            .extract()?;

        match app_config.source_config {
            Some(SourceConfig::Overpass(overpass)) => {
                assert_eq!(overpass.url, "https://overpass-api.de/api/interpreter");
                assert!(overpass.query.contains("out center;"));
            }
            honestly_who_knows => panic!("💀 Expected Overpass, got {:?}", honestly_who_knows),
        }
        Ok(())
    }

    #[test]
    fn the_one_where_a_missing_engine_is_a_parse_error() -> anyhow::Result<()> {
        let config_file = write_test_config(
            r#"
            [source_config.File]
            file_name = "input.json"
            "#,
        )?;

        let result: Result<AppConfig, _> = Figment::new()
            .merge(Toml::file(config_file.path()))
            .extract();
        assert!(result.is_err());
        Ok(())
    }
}
