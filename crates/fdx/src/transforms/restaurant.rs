// ai
//! 🍝 Restaurant Transform — turning OpenStreetMap elements into menu-ready documents 📦🔄
//!
//! 🎬 COLD OPEN — INT. OVERPASS EXPORT — THE `elements` ARRAY — TIME IS A FLAT CIRCLE
//!
//! Somewhere in the array there is a node. It is a cafe. It has a name, a cuisine
//! tag that says `coffee_shop;breakfast`, and coordinates accurate to seven
//! decimal places. It is perfect. It is also the only one like that.
//!
//! Its neighbours are a way with a `center` instead of a `lat`, a relation with
//! `"tags": null`, a bar whose latitude is the string `"37.77"`, and a parking
//! lot that wandered in because the fetch query was feeling generous.
//!
//! This module takes each of them in turn, checks the amenity against the five
//! categories we index, finds coordinates wherever they were hidden, splits the
//! cuisine tag, fills in the blanks, and hands back a document or a polite no.
//!
//! ## Knowledge Graph 🧠
//! - Implements: `IngestTransform` (raw element → `Transformed`)
//! - Amenity gate: `Amenity::from_tag`, exact match against the five indexable categories
//! - Location: direct `lat`/`lon` pair first, `center.lat`/`center.lon` pair second
//! - Cuisine: split on `;`, segments trimmed, empty segments dropped, absent tag → `[]`
//! - Defaults: `name` → configured placeholder, `address.city` → configured locality
//! - Malformed elements (bad types, unknown `type`, non-string tags) → `Rejected(Malformed)`
//!   with a `warn!` carrying the element id. Never an `Err`. Never a panic. 🦆

use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, warn};

use super::{IngestTransform, Rejection, Transformed};
use crate::app_config::IngestConfig;
use crate::common::{Address, Amenity, GeoPoint, RawElement, RestaurantDocument};

/// 🍝 RestaurantTransform — holds the two defaults and nothing else.
///
/// Cheap to clone, cheap to build, safe to share. It is the least dramatic
/// struct in this crate and it would like to keep it that way.
#[derive(Debug, Clone)]
pub(crate) struct RestaurantTransform {
    default_name: String,
    default_city: String,
}

impl RestaurantTransform {
    pub(crate) fn new(default_name: impl Into<String>, default_city: impl Into<String>) -> Self {
        Self {
            default_name: default_name.into(),
            default_city: default_city.into(),
        }
    }

    pub(crate) fn from_config(config: &IngestConfig) -> Self {
        Self::new(config.default_name.clone(), config.default_city.clone())
    }

    /// 🧾 Build the document from an element that already deserialized cleanly.
    fn transform_element(&self, element: &RawElement) -> Result<RestaurantDocument, Rejection> {
        // 🚦 amenity gate first — cheapest check, most rejections
        let amenity_tag = element.tag("amenity").ok_or(Rejection::MissingAmenity)?;
        let amenity = Amenity::from_tag(amenity_tag)
            .ok_or_else(|| Rejection::UnsupportedAmenity(amenity_tag.to_string()))?;

        let location = resolve_location(element).ok_or(Rejection::MissingCoordinates)?;

        Ok(RestaurantDocument {
            id: element.id.to_string(),
            name: element
                .tag("name")
                .map(str::to_string)
                .unwrap_or_else(|| self.default_name.clone()),
            amenity,
            cuisine: parse_cuisine(element.tag("cuisine")),
            kind: element.kind,
            location,
            address: Address {
                street: element.tag("addr:street").map(str::to_string),
                city: element
                    .tag("addr:city")
                    .map(str::to_string)
                    .unwrap_or_else(|| self.default_city.clone()),
                postcode: element.tag("addr:postcode").map(str::to_string),
            },
            timestamp: element.timestamp.clone(),
        })
    }
}

impl IngestTransform for RestaurantTransform {
    /// 🔄 Judge one raw element.
    ///
    /// The element is deserialized straight out of the borrowed `Value`. If that
    /// fails, the element is malformed: we log it with whatever id we can scrape
    /// off it and move on. The batch carries on without it. The show must go on.
    fn transform(&self, raw: &Value) -> Transformed {
        // 🏷️ best-effort id for the logs, even when the rest of the element is soup
        let element_id = raw
            .get("id")
            .map(Value::to_string)
            .unwrap_or_else(|| "<no id>".to_string());

        let element = match RawElement::deserialize(raw) {
            Ok(element) => element,
            Err(err) => {
                warn!(
                    element_id = %element_id,
                    "⚠️ element {} is malformed and got dropped at the door: {}",
                    element_id,
                    err
                );
                return Transformed::Rejected(Rejection::Malformed(err.to_string()));
            }
        };

        match self.transform_element(&element) {
            Ok(doc) => Transformed::Accepted(doc),
            Err(rejection) => {
                debug!(
                    element_id = %element_id,
                    "🚫 element {} rejected: {}",
                    element_id,
                    rejection
                );
                Transformed::Rejected(rejection)
            }
        }
    }
}

/// 📍 Direct `lat`/`lon` if both are there and numeric, otherwise the `center` pair.
/// Coordinates are taken as a pair from one place. No mixing a direct latitude
/// with a center longitude. We are not building Frankenstein's restaurant.
fn resolve_location(element: &RawElement) -> Option<GeoPoint> {
    fn pair(
        lat: Option<&crate::common::Coordinate>,
        lon: Option<&crate::common::Coordinate>,
    ) -> Option<GeoPoint> {
        Some(GeoPoint {
            lat: lat?.as_f64()?,
            lon: lon?.as_f64()?,
        })
    }

    pair(element.lat.as_ref(), element.lon.as_ref()).or_else(|| {
        let center = element.center.as_ref()?;
        pair(center.lat.as_ref(), center.lon.as_ref())
    })
}

/// 🌮 `"italian;pizza"` → `["italian", "pizza"]`. Absent or empty → `[]`, never `[""]`.
fn parse_cuisine(raw: Option<&str>) -> Vec<String> {
    raw.map(|tag| {
        tag.split(';')
            .map(str::trim)
            .filter(|segment| !segment.is_empty())
            .map(str::to_string)
            .collect()
    })
    .unwrap_or_default()
}
