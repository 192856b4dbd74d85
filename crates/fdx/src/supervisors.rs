//! 🎬 *[camera pans across a dimly lit loading dock]*
//! 🎬 *[dramatic orchestral music swells]*
//! 🎬 "In a world where restaurants hide inside JSON..."
//! 🎬 "One supervisor dared to index them all."
//! 🎬 *[record scratch]* 🦆
//!
//! 📦 The Supervisor — the ingestion run, start to finish.
//!
//! ```text
//!  fetch payload ─▶ parse ─▶ ensure index ─▶ for each element:
//!                                               transform ─▶ (full? submit, refresh=false) ─▶ add
//!                                            final remainder ─▶ submit, refresh=true
//! ```
//!
//! One payload, one accumulator, one loader, strictly sequential batches.
//! Nothing is shared between runs. Re-runs overwrite by document id, so
//! running twice lands the same count twice.

use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info};

use crate::accumulator::BatchAccumulator;
use crate::app_config::AppConfig;
use crate::backends::{EngineBackend, Source, SourceBackend};
use crate::loader::IndexLoader;
use crate::progress::IngestProgress;
use crate::transforms::{IngestTransform, RestaurantTransform};

/// 📥 The payload envelope. Elements stay as raw `Value`s so one bad element
/// can't spoil the parse of the other thousand.
#[derive(Debug, Deserialize)]
struct RawPayload {
    #[serde(default)]
    elements: Vec<Value>,
}

/// 📊 What happened during one run. The numbers, nothing but the numbers.
#[derive(Debug, Clone, PartialEq)]
pub struct RunReport {
    pub total_elements: usize,
    pub accepted: usize,
    pub rejected: usize,
    pub indexed_count: usize,
    pub batches_submitted: usize,
    pub elapsed: Duration,
}

impl RunReport {
    pub fn message(&self) -> String {
        format!("Successfully processed {} restaurants", self.indexed_count)
    }
}

/// 🧾 The run result, shaped for whoever invoked us: a 200 with counts, or a 500 with a reason.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum RunOutcome {
    Completed {
        #[serde(rename = "statusCode")]
        status_code: u16,
        message: String,
        #[serde(rename = "indexedCount")]
        indexed_count: usize,
        #[serde(rename = "totalElements")]
        total_elements: usize,
    },
    Failed {
        #[serde(rename = "statusCode")]
        status_code: u16,
        error: String,
    },
}

impl RunOutcome {
    pub fn from_result(result: &Result<RunReport>) -> Self {
        match result {
            Ok(report) => RunOutcome::Completed {
                status_code: 200,
                message: report.message(),
                indexed_count: report.indexed_count,
                total_elements: report.total_elements,
            },
            // 🧅 `{:#}` keeps the whole context chain on one line
            Err(err) => RunOutcome::Failed {
                status_code: 500,
                error: format!("{err:#}"),
            },
        }
    }

    pub fn status_code(&self) -> u16 {
        match self {
            RunOutcome::Completed { status_code, .. } | RunOutcome::Failed { status_code, .. } => {
                *status_code
            }
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, RunOutcome::Completed { .. })
    }
}

/// 📦 The Supervisor: config in, report out, and a lot of hovering in between.
pub(crate) struct Supervisor {
    app_config: AppConfig,
    engine: EngineBackend,
}

impl Supervisor {
    /// 🚀 Birth of a Supervisor. Refuses to be born with a batch cap of zero
    /// or an index with no name.
    pub(crate) fn new(app_config: AppConfig, engine: EngineBackend) -> Result<Self> {
        // 🚫 an empty name turns `HEAD /{index}` into `HEAD /`, which every cluster answers with 200
        if app_config.ingest.index_name.trim().is_empty() {
            anyhow::bail!(
                "💀 ingest.index_name is empty. The documents need somewhere to live. \
                 Set it (\"restaurants\" is the default) or leave it out entirely."
            );
        }
        if app_config.ingest.max_batch_size_docs == 0 {
            anyhow::bail!(
                "💀 ingest.max_batch_size_docs is 0. A bulk request that holds nothing \
                 is a very expensive way to hold nothing. Pick a positive number (100 is traditional)."
            );
        }
        Ok(Self { app_config, engine })
    }

    /// 🧵 Fetch from the configured source, then ingest.
    pub(crate) async fn run(&self) -> Result<RunReport> {
        let source_config = self.app_config.source_config.as_ref().context(
            "💀 No source_config was provided. We can't ingest from nowhere. \
             Add a [source_config.File], [source_config.Overpass] or [source_config.InMemory] section.",
        )?;

        let mut source = SourceBackend::from_config(source_config)?;
        let raw_payload = source
            .fetch_payload()
            .await
            .context("💀 Fetching the raw payload failed before a single restaurant was seen")?;

        self.ingest(&raw_payload).await
    }

    /// 🔄 Parse → ensure index → transform → accumulate → submit. In that order. Every time.
    pub(crate) async fn ingest(&self, raw_payload: &str) -> Result<RunReport> {
        let started = Instant::now();
        let ingest = &self.app_config.ingest;

        let payload: RawPayload = serde_json::from_str(raw_payload)
            .context("💀 The payload is not a JSON object with an `elements` array. Nothing was submitted.")?;
        let total_elements = payload.elements.len();
        info!("📦 payload holds {} elements", total_elements);

        let loader = IndexLoader::new(self.engine.clone(), ingest.index_name.clone());
        loader.ensure_index().await?;

        let progress = IngestProgress::new(total_elements as u64);
        let tally = self.load_elements(&payload.elements, &loader, &progress).await;
        match &tally {
            Ok(_) => progress.finish(),
            Err(_) => progress.abandon(),
        }
        let LoadTally {
            accepted,
            indexed_count,
            batches_submitted,
        } = tally?;

        let report = RunReport {
            total_elements,
            accepted,
            rejected: total_elements - accepted,
            indexed_count,
            batches_submitted,
            elapsed: started.elapsed(),
        };
        info!(
            indexed_count = report.indexed_count,
            total_elements = report.total_elements,
            rejected = report.rejected,
            batches = report.batches_submitted,
            "✅ {}",
            report.message()
        );
        Ok(report)
    }

    /// 🔁 Transform every element and ship full batches as they fill. The remainder
    /// goes last, with `refresh=true`.
    async fn load_elements(
        &self,
        elements: &[Value],
        loader: &IndexLoader,
        progress: &IngestProgress,
    ) -> Result<LoadTally> {
        let ingest = &self.app_config.ingest;
        let transformer = RestaurantTransform::from_config(ingest);
        let mut accumulator = BatchAccumulator::new(loader.index_name(), ingest.max_batch_size_docs);
        let mut tally = LoadTally::default();

        for raw in elements {
            progress.inc();
            let Some(doc) = transformer.transform(raw).into_document() else {
                continue;
            };
            tally.accepted += 1;

            // 🚦 flush before add: the basket only ships once we know it isn't the last one
            if accumulator.should_flush() {
                debug!("🚚 basket full at {} documents, shipping", accumulator.len());
                tally.indexed_count += loader.submit(accumulator.drain(), false).await?;
                tally.batches_submitted += 1;
            }
            accumulator.add(doc);
        }

        if !accumulator.is_empty() {
            debug!("🏁 shipping the last {} documents with refresh", accumulator.len());
            tally.indexed_count += loader.submit(accumulator.drain(), true).await?;
            tally.batches_submitted += 1;
        }
        Ok(tally)
    }
}

#[derive(Debug, Default)]
struct LoadTally {
    accepted: usize,
    indexed_count: usize,
    batches_submitted: usize,
}
