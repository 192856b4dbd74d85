// ai
//! 🧺 Batch Accumulator — the laundry basket between the transformer and the index 📦🔄
//!
//! 🎬 COLD OPEN — INT. LAUNDROMAT — 11:58 PM
//!
//! The machine takes a hundred items. Not a hundred and one. You stand there
//! holding documents, counting under your breath, and at exactly the cap you
//! stop, hit start, and begin filling the next basket. The final basket is
//! never full. The final basket also gets the special "refresh" cycle, so that
//! everything is searchable by the time you get home.
//!
//! ## Knowledge Graph 🧠
//! - [`BulkPair`]: one queued document plus its `{"index":{...}}` header
//! - [`BulkBatch`]: an ordered run of pairs, renders to NDJSON with a trailing `\n`
//! - [`BatchAccumulator`]: grows the batch, says when it is full, hands it over
//!   and starts fresh. It never talks to the network
//! - Cap is counted in **documents** (pairs). A 100-doc batch is 200 lines
//! - Ownership: `drain` moves the batch out, so a submitted batch can never be
//!   mutated again. The borrow checker holds the door shut for us
//! 🦆

use anyhow::Result;
use serde::Serialize;

use crate::common::RestaurantDocument;
use crate::transforms::{EgressTransform, OpenSearchBulk};

/// 🏷️ The `{"index":{"_index":..,"_id":..}}` action line, as a struct.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub(crate) struct BulkHeader {
    pub index: BulkTarget,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub(crate) struct BulkTarget {
    #[serde(rename = "_index")]
    pub index: String,
    #[serde(rename = "_id")]
    pub id: String,
}

/// 📦 One header + one document. The header's `_id` is the document's `id`,
/// always, because it is built from it and nothing else can touch it.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct BulkPair {
    pub header: BulkHeader,
    pub document: RestaurantDocument,
}

impl BulkPair {
    pub(crate) fn new(index_name: &str, document: RestaurantDocument) -> Self {
        Self {
            header: BulkHeader {
                index: BulkTarget {
                    index: index_name.to_string(),
                    id: document.id.clone(),
                },
            },
            document,
        }
    }
}

/// 🧺 An ordered, owned run of pairs, ready to become one bulk request.
#[derive(Debug, Clone, Default, PartialEq)]
pub(crate) struct BulkBatch {
    pub pairs: Vec<BulkPair>,
}

impl BulkBatch {
    pub(crate) fn len(&self) -> usize {
        self.pairs.len()
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    /// 📡 Render the batch as a bulk request body.
    ///
    /// `action\nsource\naction\nsource\n`. The trailing newline is mandatory.
    /// Ancient proverb: "He who omits the trailing newline, debugs at 3am."
    pub(crate) fn to_ndjson(&self) -> Result<String> {
        // 🧮 vibes-based pre-allocation. restaurant docs are small, headers smaller
        let mut payload = String::with_capacity(self.pairs.len() * 384);
        for pair in &self.pairs {
            payload.push_str(&OpenSearchBulk::transform_pair(pair)?);
            payload.push('\n');
        }
        Ok(payload)
    }
}

/// 🧺 BatchAccumulator — fills baskets to the cap and hands them over.
///
/// The accumulator does not decide *when* to submit. The supervisor asks
/// [`should_flush`](Self::should_flush), and if the answer is yes, it
/// [`drain`](Self::drain)s the basket and ships it.
#[derive(Debug)]
pub(crate) struct BatchAccumulator {
    index_name: String,
    max_batch_size_docs: usize,
    current: BulkBatch,
}

impl BatchAccumulator {
    /// A cap of zero is clamped to one. Config validation rejects zero long
    /// before this point, but an accumulator that can never flush is worse.
    pub(crate) fn new(index_name: impl Into<String>, max_batch_size_docs: usize) -> Self {
        let max_batch_size_docs = max_batch_size_docs.max(1);
        Self {
            index_name: index_name.into(),
            max_batch_size_docs,
            current: BulkBatch {
                pairs: Vec::with_capacity(max_batch_size_docs),
            },
        }
    }

    /// ➕ Queue one document behind its header.
    pub(crate) fn add(&mut self, document: RestaurantDocument) {
        self.current
            .pairs
            .push(BulkPair::new(&self.index_name, document));
    }

    /// 🚦 Full basket? The supervisor checks this before every `add`.
    pub(crate) fn should_flush(&self) -> bool {
        self.current.len() >= self.max_batch_size_docs
    }

    /// 🚚 Hand over everything queued so far and start an empty basket.
    pub(crate) fn drain(&mut self) -> BulkBatch {
        std::mem::replace(
            &mut self.current,
            BulkBatch {
                pairs: Vec::with_capacity(self.max_batch_size_docs),
            },
        )
    }

    pub(crate) fn len(&self) -> usize {
        self.current.len()
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.current.is_empty()
    }
}
