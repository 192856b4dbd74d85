// ai
//! 🔄 Transforms — the customs desk between the map and the index 🎭🚀
//!
//! 🎬 COLD OPEN — INT. BORDER CROSSING — NIGHT SHIFT
//!
//! Elements line up at the booth. A node with a name and a cuisine. A way with
//! only a `center` and a dream. A relation carrying tags that are... numbers?
//! The officer stamps some passports and waves others back to the map.
//! Nobody is arrested. Nobody is deported mid-batch. Rejections are paperwork,
//! not panics.
//!
//! ## Architecture 📐
//!
//! ```text
//!   Raw payload element        Canonical document           Bulk wire format
//!  ┌──────────────────┐      ┌────────────────────┐      ┌──────────────────┐
//!  │ serde_json::Value│─────▶│ RestaurantDocument │─────▶│ {"index":{...}}  │
//!  │ (untrusted)      │  │   │ (amenity ok,       │      │ {...document...} │
//!  └──────────────────┘  │   │  coordinates ok)   │      └──────────────────┘
//!                        │   └────────────────────┘
//!                        └──▶ Rejected(reason)  — logged, counted, dropped
//!    IngestTransform                                 EgressTransform
//! ```
//!
//! ## Knowledge Graph 🧠
//! - Ingest: [`restaurant::RestaurantTransform`] — raw element → `Transformed`
//! - Egress: [`bulk::OpenSearchBulk`] — `(header, document)` pair → two NDJSON lines
//! - Used by: `supervisors` (ingest) and `accumulator` (egress, when composing a batch)
//! - Pattern: the ingest side returns an outcome type, never an `Err`. One bad
//!   element must not take the whole run down with it.
//!
//! 🦆

use anyhow::Result;
use serde_json::Value;
use thiserror::Error;

use crate::accumulator::BulkPair;
use crate::common::RestaurantDocument;

pub(crate) mod bulk;
pub(crate) mod restaurant;

pub(crate) use bulk::OpenSearchBulk;
pub(crate) use restaurant::RestaurantTransform;

/// 🚦 The verdict on one raw element. Accepted with a document, or rejected with a reason.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Transformed {
    Accepted(RestaurantDocument),
    Rejected(Rejection),
}

impl Transformed {
    /// 🎯 The document, if the element made it through customs.
    pub(crate) fn into_document(self) -> Option<RestaurantDocument> {
        match self {
            Transformed::Accepted(doc) => Some(doc),
            Transformed::Rejected(_) => None,
        }
    }
}

/// 🚫 Why an element was turned away. `Malformed` is logged at `warn!`, the rest at `debug!`.
#[derive(Debug, Clone, PartialEq, Error)]
pub(crate) enum Rejection {
    #[error("element has no amenity tag")]
    MissingAmenity,
    #[error("amenity '{0}' is not an indexable category")]
    UnsupportedAmenity(String),
    #[error("element has neither direct nor center coordinates that are numeric")]
    MissingCoordinates,
    #[error("element is structurally malformed: {0}")]
    Malformed(String),
}

/// 📥 IngestTransform — raw source element in, verdict out.
///
/// # Contract 📜
/// - Input: borrowed `serde_json::Value`, because the payload owns the elements
///   and we only need to peek
/// - Output: [`Transformed`]. Never `Err`, never a panic. Structural garbage is
///   a [`Rejection::Malformed`], logged with the element id
/// - Pure: no I/O, no state, the log line is the only side effect
pub(crate) trait IngestTransform {
    fn transform(&self, raw: &Value) -> Transformed;
}

/// 📤 EgressTransform — one queued pair out to the engine's wire format.
///
/// # Contract 📜
/// - Input: `&BulkPair`, borrowed because the batch still owns it
/// - Output: the exact text the bulk endpoint expects for that pair, without the
///   trailing newline (the batch composer adds those)
pub(crate) trait EgressTransform {
    fn transform_pair(pair: &BulkPair) -> Result<String>;
}
