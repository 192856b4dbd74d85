//! 🍴 fdx — forkdex. OpenStreetMap eateries in, a searchable index out.
//!
//! 🎬 *[narrator voice]* "Two paths diverged in a library crate..."
//! One writes: fetch the payload, turn elements into documents, bulk load them.
//! One reads: build a cuisine + postcode query and hand back what the engine says.
//!
//! The CLI only ever talks to [`run_ingest`], [`run_search`] and [`app_config`].
//! Everything else is the library's private business. 🦆

use anyhow::{Context, Result};
use serde_json::Value;

pub mod app_config;

pub(crate) mod accumulator;
pub(crate) mod backends;
pub(crate) mod common;
pub(crate) mod loader;
pub(crate) mod progress;
pub(crate) mod query;
pub(crate) mod schema;
pub(crate) mod supervisors;
pub(crate) mod transforms;

pub use backends::overpass::FETCH_AMENITIES;
pub use backends::{FileSourceConfig, InMemorySourceConfig, OpenSearchConfig, OverpassSourceConfig};
pub use progress::render_run_summary;
pub use query::QueryError;
pub use supervisors::{RunOutcome, RunReport};

use crate::app_config::AppConfig;
use crate::backends::EngineBackend;
use crate::supervisors::Supervisor;

/// 🚀 One ingestion run: fetch, transform, bulk load, report.
pub async fn run_ingest(app_config: AppConfig) -> Result<RunReport> {
    let engine = EngineBackend::from_config(&app_config.engine_config)
        .context("💀 Could not stand up the search engine client")?;
    let supervisor = Supervisor::new(app_config, engine)?;
    supervisor.run().await
}

/// 🔎 One query: cuisine required, postcode optional, raw engine response back.
pub async fn run_search(
    app_config: AppConfig,
    cuisine: &str,
    postal_code: Option<&str>,
) -> Result<Value> {
    let engine = EngineBackend::from_config(&app_config.engine_config)
        .context("💀 Could not stand up the search engine client")?;
    query::search(&engine, &app_config.ingest.index_name, cuisine, postal_code).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app_config::{EngineConfig, IngestConfig, SourceConfig};

    #[tokio::test]
    async fn the_one_where_the_front_door_runs_an_ingest_end_to_end() -> Result<()> {
        let app_config = AppConfig {
            source_config: Some(SourceConfig::InMemory(InMemorySourceConfig {
                payload: r#"{"elements":[
                    {"id":1,"type":"node","lat":37.76,"lon":-122.42,"tags":{"amenity":"cafe","cuisine":"coffee_shop"}},
                    {"id":2,"type":"way","center":{"lat":37.77,"lon":-122.41},"tags":{"amenity":"ice_cream"}}
                ]}"#
                .to_string(),
            })),
            engine_config: EngineConfig::InMemory,
            ingest: IngestConfig::default(),
        };

        let report = run_ingest(app_config).await?;
        assert_eq!(report.total_elements, 2);
        assert_eq!(report.indexed_count, 1);
        Ok(())
    }

    #[tokio::test]
    async fn the_one_where_searching_an_index_that_was_never_built_fails_loudly() {
        let app_config = AppConfig {
            source_config: None,
            engine_config: EngineConfig::InMemory,
            ingest: IngestConfig::default(),
        };
        assert!(run_search(app_config, "pizza", None).await.is_err());
    }
}
