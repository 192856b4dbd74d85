//! # Previously, on Forkdex...
//!
//! 🎬 The cluster was down. The laptop was on a plane. The tests still had to
//! run. Someone had to build a search engine so small it fits in a `BTreeMap`
//! and forgets everything the moment you blink.
//!
//! That someone was this module.
//!
//! `in_mem` provides an in-memory [`Source`] (a payload string handed over
//! verbatim) and an in-memory [`SearchEngine`] that understands just enough of
//! the real thing to be useful:
//! - indices with their definition and an id-keyed document store
//! - `_bulk` NDJSON with `index` actions (last write wins, like the real one)
//! - `bool.must` queries built from `match` and `term` clauses on dotted paths
//! - a log of every bulk call (document count + refresh flag) for assertions
//! - test knobs for per-document failures and transport failures
//!
//! 🦆
//!
//! ⚠️ This is NOT for production. Relevance scoring is "1.0 for everybody".
//! Text analysis is "none". It is a search engine the way a cardboard cutout
//! is a celebrity.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{Value, json};
use tracing::trace;

use crate::backends::{SearchEngine, Source};
use crate::loader::{BulkItemOutcome, BulkResponse};

// ===== Source =====

#[derive(Debug, Deserialize, Clone)]
pub struct InMemorySourceConfig {
    pub payload: String,
}

/// 📦 The world's most honest data source: hands back exactly what it was given.
#[derive(Debug)]
pub(crate) struct InMemorySource {
    payload: String,
}

impl InMemorySource {
    pub(crate) fn new(payload: String) -> Self {
        Self { payload }
    }
}

#[async_trait]
impl Source for InMemorySource {
    async fn fetch_payload(&mut self) -> Result<String> {
        Ok(self.payload.clone())
    }
}

// ===== Engine =====

/// 📞 One `_bulk` call, as remembered by the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct BulkCall {
    pub doc_count: usize,
    pub refresh: bool,
}

#[derive(Debug, Default)]
struct StoredIndex {
    #[cfg(test)]
    definition: Value,
    docs: BTreeMap<String, Value>,
}

#[derive(Debug, Default)]
struct EngineState {
    indices: BTreeMap<String, StoredIndex>,
    bulk_calls: Vec<BulkCall>,
    create_calls: usize,
    /// 💣 ids the engine will refuse with a mapping error
    rejected_ids: BTreeSet<String>,
    /// 🔌 pretend the network is down for `_bulk`
    refuse_bulk: bool,
}

/// 🗄️ The search engine that lives in RAM.
///
/// Clone-able because tests need to peek inside after handing a copy to the
/// loader. The `Arc` means every clone shares the same state.
#[derive(Debug, Default, Clone)]
pub(crate) struct InMemoryEngine {
    state: Arc<tokio::sync::Mutex<EngineState>>,
}

impl InMemoryEngine {
    pub(crate) fn new() -> Self {
        Self::default()
    }
}

#[cfg(test)]
impl InMemoryEngine {
    /// 💣 Make every future bulk item with one of these ids fail.
    pub(crate) async fn reject_ids<I, S>(&self, ids: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut state = self.state.lock().await;
        state.rejected_ids.extend(ids.into_iter().map(Into::into));
    }

    /// 🔌 Make every future bulk call fail at the transport level.
    pub(crate) async fn refuse_bulk(&self) {
        self.state.lock().await.refuse_bulk = true;
    }

    pub(crate) async fn bulk_calls(&self) -> Vec<BulkCall> {
        self.state.lock().await.bulk_calls.clone()
    }

    pub(crate) async fn create_calls(&self) -> usize {
        self.state.lock().await.create_calls
    }

    pub(crate) async fn doc_count(&self, index: &str) -> usize {
        self.state
            .lock()
            .await
            .indices
            .get(index)
            .map_or(0, |i| i.docs.len())
    }

    pub(crate) async fn stored_doc(&self, index: &str, id: &str) -> Option<Value> {
        self.state
            .lock()
            .await
            .indices
            .get(index)
            .and_then(|i| i.docs.get(id).cloned())
    }

    pub(crate) async fn definition(&self, index: &str) -> Option<Value> {
        self.state
            .lock()
            .await
            .indices
            .get(index)
            .map(|i| i.definition.clone())
    }

    /// 🌱 Plant documents directly, skipping `_bulk`. For query tests.
    pub(crate) async fn seed(&self, index: &str, docs: Vec<Value>) {
        let mut state = self.state.lock().await;
        let stored = state.indices.entry(index.to_string()).or_default();
        for (i, doc) in docs.into_iter().enumerate() {
            let id = doc
                .get("id")
                .and_then(Value::as_str)
                .map(str::to_string)
                .unwrap_or_else(|| format!("seed-{i}"));
            stored.docs.insert(id, doc);
        }
    }
}

#[async_trait]
impl SearchEngine for InMemoryEngine {
    async fn index_exists(&self, index: &str) -> Result<bool> {
        Ok(self.state.lock().await.indices.contains_key(index))
    }

    async fn create_index(&self, index: &str, definition: &Value) -> Result<()> {
        let mut state = self.state.lock().await;
        state.create_calls += 1;
        trace!(
            "🗄️ in-memory create_index '{}' ({} top-level definition keys)",
            index,
            definition.as_object().map_or(0, |o| o.len())
        );
        // ⚠️ already there → keep the original definition, same as the real engine's 400 we tolerate
        state
            .indices
            .entry(index.to_string())
            .or_insert_with(|| StoredIndex {
                #[cfg(test)]
                definition: definition.clone(),
                docs: BTreeMap::new(),
            });
        Ok(())
    }

    async fn bulk(&self, payload: String, refresh: bool) -> Result<BulkResponse> {
        let mut state = self.state.lock().await;
        if state.refuse_bulk {
            anyhow::bail!("💀 error sending request: connection refused (in-memory engine told to play dead)");
        }

        let lines: Vec<&str> = payload.lines().filter(|l| !l.trim().is_empty()).collect();
        if lines.len() % 2 != 0 {
            anyhow::bail!(
                "💀 bulk body has {} lines; action/source lines must come in pairs",
                lines.len()
            );
        }

        let mut items = Vec::with_capacity(lines.len() / 2);
        let mut any_errors = false;
        for pair in lines.chunks(2) {
            let action: Value =
                serde_json::from_str(pair[0]).context("💀 bulk action line is not JSON")?;
            let source: Value =
                serde_json::from_str(pair[1]).context("💀 bulk source line is not JSON")?;
            let target = action
                .get("index")
                .context("💀 only `index` bulk actions are supported here")?;
            let index = target
                .get("_index")
                .and_then(Value::as_str)
                .context("💀 bulk action is missing `_index`")?
                .to_string();
            let id = target
                .get("_id")
                .and_then(Value::as_str)
                .context("💀 bulk action is missing `_id`")?
                .to_string();

            let outcome = if state.rejected_ids.contains(&id) {
                any_errors = true;
                BulkItemOutcome {
                    id: Some(id.clone()),
                    status: 400,
                    error: Some(json!({
                        "type": "mapper_parsing_exception",
                        "reason": format!("failed to parse document [{id}]")
                    })),
                }
            } else {
                // 🗄️ the real engine auto-creates missing indices on write, so we do too
                let stored = state.indices.entry(index).or_default();
                let existed = stored.docs.insert(id.clone(), source).is_some();
                BulkItemOutcome {
                    id: Some(id),
                    status: if existed { 200 } else { 201 },
                    error: None,
                }
            };
            items.push(BTreeMap::from([("index".to_string(), outcome)]));
        }

        state.bulk_calls.push(BulkCall {
            doc_count: items.len(),
            refresh,
        });
        trace!("🗄️ in-memory bulk stored {} items (refresh={})", items.len(), refresh);

        Ok(BulkResponse {
            errors: any_errors,
            items,
        })
    }

    async fn search(&self, index: &str, body: &Value) -> Result<Value> {
        let state = self.state.lock().await;
        let stored = state.indices.get(index).with_context(|| {
            format!("💀 index_not_found_exception: no such index [{index}]")
        })?;

        let clauses = body
            .pointer("/query/bool/must")
            .and_then(Value::as_array)
            .cloned()
            .unwrap_or_default();

        let hits: Vec<Value> = stored
            .docs
            .iter()
            .filter(|(_, doc)| clauses.iter().all(|clause| clause_matches(clause, doc)))
            .map(|(id, doc)| {
                json!({
                    "_index": index,
                    "_id": id,
                    "_score": 1.0,
                    "_source": doc
                })
            })
            .collect();

        Ok(json!({
            "took": 0,
            "timed_out": false,
            "hits": {
                "total": { "value": hits.len(), "relation": "eq" },
                "max_score": if hits.is_empty() { Value::Null } else { json!(1.0) },
                "hits": hits
            }
        }))
    }
}

/// 🎯 Does one `{"match":{..}}` / `{"term":{..}}` clause hold for this document?
///
/// Both are exact comparisons here, which is how a `match` behaves against a
/// `keyword` field anyway. Array fields match when any element does.
fn clause_matches(clause: &Value, doc: &Value) -> bool {
    let (kind, clause_body) = match clause.as_object().and_then(|o| o.iter().next()) {
        Some(entry) => entry,
        None => return false,
    };
    let Some((field, expected)) = clause_body.as_object().and_then(|o| o.iter().next()) else {
        return false;
    };
    // 🧩 long form: {"match":{"f":{"query":"x"}}} / {"term":{"f":{"value":"x"}}}
    let expected = match (kind.as_str(), expected) {
        ("match", Value::Object(o)) => o.get("query").unwrap_or(expected),
        ("term", Value::Object(o)) => o.get("value").unwrap_or(expected),
        ("match" | "term", _) => expected,
        _ => return false,
    };

    let pointer = format!("/{}", field.replace('.', "/"));
    match doc.pointer(&pointer) {
        Some(Value::Array(values)) => values.iter().any(|v| v == expected),
        Some(value) => value == expected,
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn the_one_where_the_same_id_twice_is_an_overwrite_not_a_duplicate() -> Result<()> {
        let engine = InMemoryEngine::new();
        let body = concat!(
            r#"{"index":{"_index":"restaurants","_id":"1"}}"#, "\n",
            r#"{"id":"1","name":"first"}"#, "\n",
            r#"{"index":{"_index":"restaurants","_id":"1"}}"#, "\n",
            r#"{"id":"1","name":"second"}"#, "\n",
        );

        let response = engine.bulk(body.to_string(), true).await?;

        assert!(!response.errors);
        assert_eq!(response.items.len(), 2);
        assert_eq!(engine.doc_count("restaurants").await, 1);
        assert_eq!(
            engine.stored_doc("restaurants", "1").await,
            Some(json!({"id":"1","name":"second"}))
        );
        assert_eq!(engine.bulk_calls().await, vec![BulkCall { doc_count: 2, refresh: true }]);
        Ok(())
    }

    #[tokio::test]
    async fn the_one_where_rejected_ids_come_back_with_a_reason() -> Result<()> {
        let engine = InMemoryEngine::new();
        engine.reject_ids(["2"]).await;
        let body = concat!(
            r#"{"index":{"_index":"restaurants","_id":"1"}}"#, "\n",
            r#"{"id":"1"}"#, "\n",
            r#"{"index":{"_index":"restaurants","_id":"2"}}"#, "\n",
            r#"{"id":"2"}"#, "\n",
        );

        let response = engine.bulk(body.to_string(), false).await?;

        assert!(response.errors);
        assert!(response.items[0]["index"].error.is_none());
        let the_bad_news = response.items[1]["index"].error.as_ref().expect("error expected");
        assert_eq!(the_bad_news["type"], "mapper_parsing_exception");
        assert_eq!(engine.doc_count("restaurants").await, 1);
        Ok(())
    }

    #[tokio::test]
    async fn the_one_where_a_lonely_action_line_is_refused() {
        let engine = InMemoryEngine::new();
        let result = engine
            .bulk(r#"{"index":{"_index":"r","_id":"1"}}"#.to_string() + "\n", false)
            .await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn the_one_where_create_index_is_idempotent() -> Result<()> {
        let engine = InMemoryEngine::new();
        assert!(!engine.index_exists("restaurants").await?);
        engine.create_index("restaurants", &json!({"v": 1})).await?;
        engine.create_index("restaurants", &json!({"v": 2})).await?;

        assert!(engine.index_exists("restaurants").await?);
        assert_eq!(engine.create_calls().await, 2);
        assert_eq!(engine.definition("restaurants").await, Some(json!({"v": 1})));
        Ok(())
    }

    #[tokio::test]
    async fn the_one_where_must_means_every_clause_holds() -> Result<()> {
        let engine = InMemoryEngine::new();
        engine
            .seed(
                "restaurants",
                vec![
                    json!({"id":"a","cuisine":["pizza","italian"],"address":{"postcode":"94110"}}),
                    json!({"id":"b","cuisine":["pizza"],"address":{"postcode":"94103"}}),
                    json!({"id":"c","cuisine":["thai"],"address":{"postcode":"94110"}}),
                ],
            )
            .await;

        let body = json!({"query":{"bool":{"must":[
            {"match":{"cuisine":"pizza"}},
            {"term":{"address.postcode":"94110"}}
        ]}}});
        let response = engine.search("restaurants", &body).await?;

        assert_eq!(response["hits"]["total"]["value"], 1);
        assert_eq!(response["hits"]["hits"][0]["_id"], "a");
        Ok(())
    }

    #[tokio::test]
    async fn the_one_where_searching_a_missing_index_is_an_error() {
        let engine = InMemoryEngine::new();
        assert!(engine.search("nope", &json!({})).await.is_err());
    }

    #[test]
    fn the_one_where_clauses_speak_both_short_and_long_form() {
        let doc = json!({"cuisine":["pizza"],"address":{"postcode":"94110"}});
        assert!(clause_matches(&json!({"match":{"cuisine":{"query":"pizza"}}}), &doc));
        assert!(clause_matches(&json!({"term":{"address.postcode":{"value":"94110"}}}), &doc));
        assert!(!clause_matches(&json!({"term":{"address.postcode":"94103"}}), &doc));
        assert!(!clause_matches(&json!({"range":{"x":{}}}), &doc));
        assert!(!clause_matches(&json!({"match":{"nope":"pizza"}}), &doc));
    }
}
