// ai
//! 📦 Common data structures — the building blocks of forkdex
//!
//! ---
//!
//! 🎬 COLD OPEN — INT. OVERPASS API — SOMEWHERE IN A GERMAN DATA CENTER — 3:47 AM
//!
//! 🌩️  A JSON blob arrives. It claims to describe every taco truck, espresso bar
//! and sad airport sandwich counter in San Francisco. Some of its elements have
//! coordinates. Some have a `center` instead, because they are ways, and ways
//! are polygons, and polygons have feelings about where their middle is.
//! Some have no tags at all. One of them is a parking lot. Nobody knows why.
//!
//! ✅ This module defines the two sides of that story: the [`RawElement`] as it
//! shows up at the door, and the [`RestaurantDocument`] it becomes once the
//! transformer has checked its ID, confiscated its nonsense, and given it a
//! name tag (or `"Unknown"`, if it didn't bring one).
//!
//! 🦆
//!
//! ⚠️  NOTE: a `RestaurantDocument` cannot exist without a `GeoPoint`. That is
//! the whole invariant. No coordinates, no document. No exceptions. Not even
//! for the really good dumpling place.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// 🗺️ The three species of OpenStreetMap element. Nodes are points, ways are
/// lines/polygons, relations are "it's complicated". All three can sell pizza.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub(crate) enum ElementKind {
    Node,
    Way,
    Relation,
}

/// 📍 A coordinate as the source system hands it over.
///
/// Usually a JSON number. Occasionally a numeric string, because somebody's
/// export tool had a long weekend. Both are accepted, as long as they parse to
/// a finite `f64`. Anything else is not a coordinate, it is a cry for help.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub(crate) enum Coordinate {
    Number(f64),
    Text(String),
}

impl Coordinate {
    /// 🔢 The numeric value, if there is one. NaN and infinity need not apply.
    pub(crate) fn as_f64(&self) -> Option<f64> {
        let value = match self {
            Coordinate::Number(n) => *n,
            Coordinate::Text(s) => s.trim().parse::<f64>().ok()?,
        };
        value.is_finite().then_some(value)
    }
}

/// 🎯 The `center` sub-object Overpass attaches to ways and relations when asked
/// for `out center`. Same shape as a point, different life story.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub(crate) struct Center {
    #[serde(default)]
    pub lat: Option<Coordinate>,
    #[serde(default)]
    pub lon: Option<Coordinate>,
}

/// 🚪 One element of the raw payload, exactly as the geographic source sent it.
///
/// Read-only. Never mutated. We look, we judge, we move on.
/// Every field except `id` and `type` is optional because the source system
/// treats the schema as a suggestion.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub(crate) struct RawElement {
    pub id: i64,
    #[serde(rename = "type")]
    pub kind: ElementKind,
    /// 🏷️ `None` when the element showed up tagless, or with `"tags": null`.
    #[serde(default)]
    pub tags: Option<BTreeMap<String, String>>,
    #[serde(default)]
    pub lat: Option<Coordinate>,
    #[serde(default)]
    pub lon: Option<Coordinate>,
    #[serde(default)]
    pub center: Option<Center>,
    /// ⏱️ passed through untouched. If it isn't ISO-8601 that's the index's problem.
    #[serde(default)]
    pub timestamp: Option<String>,
}

impl RawElement {
    /// 🔍 Look up a tag without the `Option<&BTreeMap>` dance at every call site.
    pub(crate) fn tag(&self, key: &str) -> Option<&str> {
        self.tags.as_ref()?.get(key).map(String::as_str)
    }
}

/// 🍽️ The amenities we are willing to put in the index. Five. Exactly five.
///
/// The fetch side asks for more (ice cream, food courts, takeaway) and this
/// set politely declines them at the door. See `backends::overpass::FETCH_AMENITIES`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub(crate) enum Amenity {
    Restaurant,
    Cafe,
    FastFood,
    Bar,
    Pub,
}

impl Amenity {
    pub(crate) const ALL: [Amenity; 5] = [
        Amenity::Restaurant,
        Amenity::Cafe,
        Amenity::FastFood,
        Amenity::Bar,
        Amenity::Pub,
    ];

    /// 🏷️ Map a raw `amenity` tag onto the indexable set. Exact match, case and all.
    pub(crate) fn from_tag(tag: &str) -> Option<Amenity> {
        Self::ALL.into_iter().find(|amenity| amenity.as_str() == tag)
    }

    pub(crate) fn as_str(&self) -> &'static str {
        match self {
            Amenity::Restaurant => "restaurant",
            Amenity::Cafe => "cafe",
            Amenity::FastFood => "fast_food",
            Amenity::Bar => "bar",
            Amenity::Pub => "pub",
        }
    }
}

/// 📍 A resolved, definitely-numeric latitude/longitude pair. Serializes as the
/// `{"lat":..,"lon":..}` object a `geo_point` mapping expects.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub(crate) struct GeoPoint {
    pub lat: f64,
    pub lon: f64,
}

/// 🏠 Where to send the delivery driver. City always has a value; the rest is vibes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub(crate) struct Address {
    pub street: Option<String>,
    pub city: String,
    pub postcode: Option<String>,
}

/// 🍕 The canonical indexed unit. One establishment, one document, one `_id`.
///
/// Only the transformer builds these, and it only builds them when the amenity
/// is indexable and the coordinates are real. Everything downstream gets to
/// assume both.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub(crate) struct RestaurantDocument {
    /// 🔑 the source element id, stringified. Same element, same id, same document.
    pub id: String,
    pub name: String,
    pub amenity: Amenity,
    pub cuisine: Vec<String>,
    #[serde(rename = "type")]
    pub kind: ElementKind,
    pub location: GeoPoint,
    pub address: Address,
    pub timestamp: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Result;
    use serde_json::json;

    #[test]
    fn the_one_where_a_way_shows_up_with_a_center_instead_of_coordinates() -> Result<()> {
        let the_polygon_with_a_middle: RawElement = serde_json::from_value(json!({
            "id": 12345,
            "type": "way",
            "center": { "lat": 37.76, "lon": -122.42 },
            "tags": { "amenity": "cafe", "name": "Ritual" }
        }))?;

        assert_eq!(the_polygon_with_a_middle.kind, ElementKind::Way);
        assert!(the_polygon_with_a_middle.lat.is_none());
        let center = the_polygon_with_a_middle.center.as_ref().expect("center should deserialize");
        assert_eq!(center.lat.as_ref().and_then(|c| c.as_f64()), Some(37.76));
        assert_eq!(the_polygon_with_a_middle.tag("name"), Some("Ritual"));
        Ok(())
    }

    #[test]
    fn the_one_where_null_tags_are_just_no_tags() -> Result<()> {
        let the_tagless_wonder: RawElement = serde_json::from_value(json!({
            "id": 1, "type": "node", "lat": 1.0, "lon": 2.0, "tags": null
        }))?;
        assert!(the_tagless_wonder.tags.is_none());
        assert_eq!(the_tagless_wonder.tag("amenity"), None);
        Ok(())
    }

    #[test]
    fn the_one_where_coordinates_arrive_as_strings_and_we_forgive_them() {
        assert_eq!(Coordinate::Text(" 37.5 ".into()).as_f64(), Some(37.5));
        assert_eq!(Coordinate::Number(-122.0).as_f64(), Some(-122.0));
        assert_eq!(Coordinate::Text("north-ish".into()).as_f64(), None);
        assert_eq!(Coordinate::Text("NaN".into()).as_f64(), None);
    }

    #[test]
    fn the_one_where_amenities_know_their_own_names() {
        for amenity in Amenity::ALL {
            assert_eq!(Amenity::from_tag(amenity.as_str()), Some(amenity));
        }
        assert_eq!(Amenity::from_tag("parking"), None);
        assert_eq!(Amenity::from_tag("Restaurant"), None);
        assert_eq!(serde_json::to_value(Amenity::FastFood).ok(), Some(json!("fast_food")));
    }

    #[test]
    fn the_one_where_a_document_serializes_into_the_index_shape() -> Result<()> {
        let doc = RestaurantDocument {
            id: "42".into(),
            name: "Golden Boy".into(),
            amenity: Amenity::Restaurant,
            cuisine: vec!["pizza".into()],
            kind: ElementKind::Node,
            location: GeoPoint { lat: 37.8, lon: -122.4 },
            address: Address {
                street: Some("Green Street".into()),
                city: "San Francisco".into(),
                postcode: None,
            },
            timestamp: None,
        };

        let the_wire_shape = serde_json::to_value(&doc)?;
        assert_eq!(the_wire_shape["type"], "node");
        assert_eq!(the_wire_shape["location"], json!({ "lat": 37.8, "lon": -122.4 }));
        assert_eq!(the_wire_shape["address"]["postcode"], serde_json::Value::Null);
        Ok(())
    }
}
