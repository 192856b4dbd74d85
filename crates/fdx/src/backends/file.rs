//! 📂 File source — the payload, as it was left on disk by whoever fetched it.
//!
//! Stands in for the object-store read: somebody already ran the Overpass query
//! and saved the JSON. We just pick it up. 🦆

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::Deserialize;
use tracing::debug;

use crate::backends::Source;

// KNOWLEDGE GRAPH: config lives co-located with the backend that uses it.
#[derive(Debug, Deserialize, Clone)]
pub struct FileSourceConfig {
    pub file_name: String,
}

/// 📂 FileSource — reads the whole payload file in one go.
///
/// Overpass exports for a city fit comfortably in memory, and the payload has
/// to be parsed as one JSON object anyway. Streaming it line by line would be
/// a lot of ceremony for the same `serde_json::from_str` at the end.
#[derive(Debug)]
pub(crate) struct FileSource {
    source_config: FileSourceConfig,
}

impl FileSource {
    pub(crate) fn new(source_config: FileSourceConfig) -> Result<Self> {
        if source_config.file_name.trim().is_empty() {
            anyhow::bail!(
                "💀 The file source was configured with an empty file_name. \
                 We cannot read a file called nothing. Set source_config.File.file_name."
            );
        }
        Ok(Self { source_config })
    }
}

#[async_trait]
impl Source for FileSource {
    async fn fetch_payload(&mut self) -> Result<String> {
        let the_payload = tokio::fs::read_to_string(&self.source_config.file_name)
            .await
            .with_context(|| {
                format!(
                    "💀 The door to '{}' would not budge. It might not exist, \
                     it might not be readable, or it might not be UTF-8. \
                     The payload remains unread. We remain outside.",
                    self.source_config.file_name
                )
            })?;

        debug!(
            "📂 read {} bytes of payload from '{}'",
            the_payload.len(),
            self.source_config.file_name
        );
        Ok(the_payload)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[tokio::test]
    async fn the_one_where_the_file_is_right_where_we_left_it() -> Result<()> {
        let mut the_stash = tempfile::NamedTempFile::new()?;
        write!(the_stash, r#"{{"elements":[{{"id":1,"type":"node"}}]}}"#)?;

        let mut source = FileSource::new(FileSourceConfig {
            file_name: the_stash.path().display().to_string(),
        })?;
        let payload = source.fetch_payload().await?;

        assert!(payload.contains(r#""elements""#));
        Ok(())
    }

    #[tokio::test]
    async fn the_one_where_the_file_moved_out_without_telling_anyone() -> Result<()> {
        let the_empty_room = tempfile::tempdir()?;
        let mut source = FileSource::new(FileSourceConfig {
            file_name: the_empty_room
                .path()
                .join("sf_restaurants.json")
                .display()
                .to_string(),
        })?;

        let err = source
            .fetch_payload()
            .await
            .expect_err("a missing file should be an error");
        assert!(err.to_string().contains("sf_restaurants.json"));
        Ok(())
    }

    #[test]
    fn the_one_where_an_empty_file_name_is_refused_up_front() {
        let result = FileSource::new(FileSourceConfig {
            file_name: "   ".into(),
        });
        assert!(result.is_err());
    }
}
