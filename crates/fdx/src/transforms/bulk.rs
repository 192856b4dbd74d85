// ai
//! 📡 OpenSearch Bulk Transform — one pair in, two lines out 🚀🔄
//!
//! 🎬 COLD OPEN — INT. BULK ENDPOINT — THE LINE FOR THE CLUB
//!
//! The bouncer at `/_bulk` has exactly one rule and will not explain it twice:
//! action line, then source line. Action line, then source line. If you show
//! up with a source line first you are not getting in, and your friends are
//! not getting in, and the whole batch goes home in a 400.
//!
//! ## Knowledge Graph 🧠
//! - Implements: `EgressTransform` (`BulkPair` → bulk wire text)
//! - Action line: `{"index":{"_index":"<index>","_id":"<doc id>"}}`. The `index`
//!   action overwrites, which is what makes re-running the loader idempotent
//! - Source line: the `RestaurantDocument` serialized with serde
//! - Trailing newline: NOT added here. `BulkBatch::to_ndjson` owns that.
//! 🦆

use anyhow::{Context, Result};

use super::EgressTransform;
use crate::accumulator::BulkPair;

/// 📡 OpenSearchBulk — the format whisperer for the bulk endpoint.
///
/// ```text
/// {"index":{"_index":"restaurants","_id":"2208764331"}}
/// {"id":"2208764331","name":"Flour + Water",...}
/// ```
pub(crate) struct OpenSearchBulk;

impl EgressTransform for OpenSearchBulk {
    fn transform_pair(pair: &BulkPair) -> Result<String> {
        let the_action_line = serde_json::to_string(&pair.header).context(
            "💀 Failed to serialize the bulk action line. \
             The JSON that describes JSON has failed to become JSON.",
        )?;
        let the_source_line = serde_json::to_string(&pair.document).with_context(|| {
            format!(
                "💀 Failed to serialize document '{}' for the bulk body",
                pair.document.id
            )
        })?;

        // 🎯 the sacred two-line format. do not add a third line. the bouncer is watching.
        Ok(format!("{the_action_line}\n{the_source_line}"))
    }
}
