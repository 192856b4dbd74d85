// ai
//! 🗂️ Index Schema — the floor plan of the `restaurants` index 🏗️
//!
//! One shard, zero replicas, one-second refresh. Fine for a demo cluster,
//! a single laptop, or a very confident startup. Production clusters will
//! want more shards and at least one replica; that is a config change away
//! from being someone else's problem.
//!
//! The mapping is applied once, when the index is first created. After that
//! the loader only checks that the index exists. It never diffs, never
//! migrates, never tries to be clever. 🦆

use serde_json::{Value, json};

/// 🏗️ The full `PUT /{index}` body: settings plus mappings.
///
/// - `id`, `amenity`, `cuisine`, `type`, `address.city`, `address.postcode` → `keyword`
/// - `name` → `text` with a `keyword` subfield for exact sorting and aggregations
/// - `address.street` → `text`
/// - `location` → `geo_point`
/// - `timestamp` → `date`
pub(crate) fn index_definition() -> Value {
    json!({
        "settings": {
            "number_of_shards": 1,
            "number_of_replicas": 0,
            "index": {
                "refresh_interval": "1s"
            }
        },
        "mappings": {
            "properties": {
                "id": { "type": "keyword" },
                "name": {
                    "type": "text",
                    "fields": { "keyword": { "type": "keyword" } }
                },
                "amenity": { "type": "keyword" },
                "cuisine": { "type": "keyword" },
                "address": {
                    "type": "object",
                    "properties": {
                        "street": { "type": "text" },
                        "city": { "type": "keyword" },
                        "postcode": { "type": "keyword" }
                    }
                },
                "location": { "type": "geo_point" },
                "timestamp": { "type": "date" },
                "type": { "type": "keyword" }
            }
        }
    })
}
