// ai
//! 🚚 Index Loader — makes sure the index exists, ships batches, counts what stuck 📦📡
//!
//! 🎬 COLD OPEN — INT. LOADING DOCK — THE TRUCK IS BACKING UP
//!
//! The dock manager has two jobs. First: before the first truck arrives, check
//! that the warehouse exists, and if it doesn't, build it to the floor plan.
//! Second: every time a truck unloads, go through the delivery receipt line by
//! line. Some boxes were refused. Those get written up with the reason and the
//! box number. The rest go on the tally. The manager never trusts the summary
//! at the top of the receipt. The manager counts.
//!
//! ## Knowledge Graph 🧠
//! - `ensure_index`: `index_exists` → `create_index(schema::index_definition())` when absent
//! - `submit(batch, refresh)`: NDJSON body → `SearchEngine::bulk` → [`BulkResponse::reconcile`]
//! - Reconciliation is per item. The top-level `errors` flag is only a hint.
//! - Transport failures propagate (`?`). Per-document failures only lower the count.
//! 🦆

use std::collections::BTreeMap;

use anyhow::{Context, Result};
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, error, info};

use crate::accumulator::BulkBatch;
use crate::backends::{EngineBackend, SearchEngine};
use crate::schema;

/// 🧾 The bulk endpoint's receipt: `{errors, items: [{<action>: outcome}]}`.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub(crate) struct BulkResponse {
    #[serde(default)]
    pub errors: bool,
    #[serde(default)]
    pub items: Vec<BTreeMap<String, BulkItemOutcome>>,
}

/// 📋 One line on the receipt. Only `error` decides whether it counts.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub(crate) struct BulkItemOutcome {
    #[serde(rename = "_id", default)]
    pub id: Option<String>,
    #[serde(default)]
    pub status: u16,
    #[serde(default)]
    pub error: Option<Value>,
}

impl BulkResponse {
    /// 🧮 How many documents actually landed. Errors are logged with reason and id.
    pub(crate) fn reconcile(&self) -> usize {
        if !self.errors {
            // 🤨 the flag says clean; we still count item by item below
            debug!("🧾 bulk receipt reports no errors across {} items", self.items.len());
        }

        let mut landed = 0;
        for item in &self.items {
            for (action, outcome) in item {
                match &outcome.error {
                    Some(err) => {
                        let reason = err
                            .get("reason")
                            .and_then(Value::as_str)
                            .map(str::to_string)
                            .unwrap_or_else(|| err.to_string());
                        let error_type = err.get("type").and_then(Value::as_str).unwrap_or("unknown");
                        error!(
                            document_id = outcome.id.as_deref().unwrap_or("<no id>"),
                            status = outcome.status,
                            "💀 {} of document '{}' was refused ({}): {}",
                            action,
                            outcome.id.as_deref().unwrap_or("<no id>"),
                            error_type,
                            reason
                        );
                    }
                    None => landed += 1,
                }
            }
        }
        landed
    }
}

/// 🚚 IndexLoader — one engine, one index name, no state beyond that.
#[derive(Debug)]
pub(crate) struct IndexLoader {
    engine: EngineBackend,
    index_name: String,
}

impl IndexLoader {
    pub(crate) fn new(engine: EngineBackend, index_name: impl Into<String>) -> Self {
        Self {
            engine,
            index_name: index_name.into(),
        }
    }

    pub(crate) fn index_name(&self) -> &str {
        &self.index_name
    }

    /// 🏗️ Create the index with the fixed schema if it isn't there yet.
    pub(crate) async fn ensure_index(&self) -> Result<()> {
        let exists = self
            .engine
            .index_exists(&self.index_name)
            .await
            .with_context(|| format!("💀 Could not check whether index '{}' exists", self.index_name))?;

        if exists {
            debug!("🏗️ index '{}' already exists, leaving it be", self.index_name);
            return Ok(());
        }

        self.engine
            .create_index(&self.index_name, &schema::index_definition())
            .await
            .with_context(|| format!("💀 Could not create index '{}'", self.index_name))?;
        info!("🏗️ created index '{}'", self.index_name);
        Ok(())
    }

    /// 📡 Ship one batch, return how many documents made it in.
    ///
    /// The batch is consumed. Whatever happens, it is gone after this call.
    pub(crate) async fn submit(&self, batch: BulkBatch, refresh: bool) -> Result<usize> {
        if batch.is_empty() {
            return Ok(0);
        }
        let doc_count = batch.len();
        let payload = batch.to_ndjson()?;
        let response = self
            .engine
            .bulk(payload, refresh)
            .await
            .with_context(|| format!("💀 Bulk submission of {doc_count} documents failed"))?;

        let landed = response.reconcile();
        debug!(
            "🚚 batch of {} documents: {} landed, {} refused (refresh={})",
            doc_count,
            landed,
            doc_count.saturating_sub(landed),
            refresh
        );
        Ok(landed)
    }
}
