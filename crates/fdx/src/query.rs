// ai
//! 🔎 Query Builder — "pizza, near 94110, go" → a bool query the engine understands 🍕📡
//!
//! 🎬 COLD OPEN — INT. SEARCH BAR — SOMEONE IS HUNGRY
//!
//! They want pizza. Maybe they also want it in the Mission. They don't want
//! "pizza OR the Mission", which would hand them every laundromat in 94110.
//! Every clause is a `must`. Cuisine is mandatory. Postcode is optional.
//! That's the whole menu.
//!
//! ## Knowledge Graph 🧠
//! - [`build_query`] → [`SearchPredicate`] (validated, 1 or 2 clauses)
//! - [`SearchPredicate::to_query_body`] → `{"query":{"bool":{"must":[...]}}}`
//! - [`search`] → builds, sends via `SearchEngine::search`, returns the raw response untouched
//! - cuisine → `match` on `cuisine`; postcode → `term` on `address.postcode`
//! 🦆

use anyhow::{Context, Result};
use serde_json::{Value, json};
use thiserror::Error;
use tracing::debug;

use crate::backends::SearchEngine;

/// 🚫 What can go wrong before a query ever leaves the building.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum QueryError {
    #[error("cuisine is required and cannot be empty")]
    EmptyCuisine,
}

/// 🧩 One required condition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Clause {
    Match { field: &'static str, value: String },
    Term { field: &'static str, value: String },
}

impl Clause {
    fn to_json(&self) -> Value {
        match self {
            Clause::Match { field, value } => json!({ "match": { *field: value } }),
            Clause::Term { field, value } => json!({ "term": { *field: value } }),
        }
    }
}

/// 🔎 Cuisine (required) and optionally postcode, ANDed together.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct SearchPredicate {
    must: Vec<Clause>,
}

impl SearchPredicate {
    pub(crate) fn required_clauses(&self) -> &[Clause] {
        &self.must
    }

    pub(crate) fn to_query_body(&self) -> Value {
        let must: Vec<Value> = self.must.iter().map(Clause::to_json).collect();
        json!({ "query": { "bool": { "must": must } } })
    }
}

/// 🏗️ Build the predicate. Inputs are trimmed; an empty postcode means "anywhere".
pub(crate) fn build_query(
    cuisine: &str,
    postal_code: Option<&str>,
) -> Result<SearchPredicate, QueryError> {
    let cuisine = cuisine.trim();
    if cuisine.is_empty() {
        return Err(QueryError::EmptyCuisine);
    }

    let mut must = vec![Clause::Match {
        field: "cuisine",
        value: cuisine.to_string(),
    }];
    if let Some(postal_code) = postal_code.map(str::trim).filter(|p| !p.is_empty()) {
        must.push(Clause::Term {
            field: "address.postcode",
            value: postal_code.to_string(),
        });
    }
    Ok(SearchPredicate { must })
}

/// 📡 Build, send, and hand back whatever the engine said.
pub(crate) async fn search<E: SearchEngine + ?Sized>(
    engine: &E,
    index: &str,
    cuisine: &str,
    postal_code: Option<&str>,
) -> Result<Value> {
    let predicate = build_query(cuisine, postal_code)?;
    let body = predicate.to_query_body();
    debug!(
        clauses = predicate.required_clauses().len(),
        "🔎 searching '{}' with {}", index, body
    );
    engine
        .search(index, &body)
        .await
        .with_context(|| format!("💀 Search for '{}' on index '{}' failed", cuisine.trim(), index))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backends::in_mem::InMemoryEngine;

    #[test]
    fn the_one_where_pizza_alone_is_one_clause() -> Result<()> {
        let predicate = build_query("pizza", None)?;
        assert_eq!(
            predicate.required_clauses(),
            &[Clause::Match { field: "cuisine", value: "pizza".into() }]
        );
        assert_eq!(
            predicate.to_query_body(),
            json!({ "query": { "bool": { "must": [ { "match": { "cuisine": "pizza" } } ] } } })
        );
        Ok(())
    }

    #[test]
    fn the_one_where_a_postcode_makes_it_two() -> Result<()> {
        let predicate = build_query("pizza", Some("94110"))?;
        assert_eq!(predicate.required_clauses().len(), 2);
        assert_eq!(
            predicate.to_query_body(),
            json!({ "query": { "bool": { "must": [
                { "match": { "cuisine": "pizza" } },
                { "term": { "address.postcode": "94110" } }
            ] } } })
        );
        Ok(())
    }

    #[test]
    fn the_one_where_blank_inputs_are_handled_politely() -> Result<()> {
        assert_eq!(build_query("", None), Err(QueryError::EmptyCuisine));
        assert_eq!(build_query("   ", Some("94110")), Err(QueryError::EmptyCuisine));
        assert_eq!(build_query(" pizza ", Some("  ")).map(|p| p.required_clauses().len()), Ok(1));
        assert_eq!(build_query("pizza", Some("")).map(|p| p.required_clauses().len()), Ok(1));
        Ok(())
    }

    #[tokio::test]
    async fn the_one_where_both_clauses_must_hold_on_real_looking_data() -> Result<()> {
        let engine = InMemoryEngine::new();
        engine
            .seed(
                "restaurants",
                vec![
                    json!({ "id": "1", "name": "Flour + Water", "cuisine": ["italian", "pizza"], "address": { "postcode": "94110" } }),
                    json!({ "id": "2", "name": "Tony's", "cuisine": ["pizza"], "address": { "postcode": "94133" } }),
                    json!({ "id": "3", "name": "Farolito", "cuisine": ["mexican"], "address": { "postcode": "94110" } }),
                    json!({ "id": "4", "name": "No Postcode Pies", "cuisine": ["pizza"], "address": { "postcode": null } }),
                ],
            )
            .await;

        let ids = |response: &Value| -> Vec<String> {
            response["hits"]["hits"]
                .as_array()
                .map(|hits| hits.iter().filter_map(|h| h["_id"].as_str().map(str::to_string)).collect())
                .unwrap_or_default()
        };

        let anywhere = search(&engine, "restaurants", "pizza", None).await?;
        assert_eq!(ids(&anywhere), vec!["1", "2", "4"]);

        let in_the_mission = search(&engine, "restaurants", "pizza", Some("94110")).await?;
        assert_eq!(ids(&in_the_mission), vec!["1"]);

        let nowhere = search(&engine, "restaurants", "sushi", Some("94110")).await?;
        assert!(ids(&nowhere).is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn the_one_where_an_empty_cuisine_never_reaches_the_engine() {
        let engine = InMemoryEngine::new();
        let err = search(&engine, "restaurants", " ", None)
            .await
            .expect_err("empty cuisine should be refused");
        assert_eq!(err.downcast_ref::<QueryError>(), Some(&QueryError::EmptyCuisine));
    }
}
