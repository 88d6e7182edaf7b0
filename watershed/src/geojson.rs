//! GeoJSON conversion for watershed records.
//!
//! A watershed becomes a `Feature` whose geometry is the stored polygon or
//! multipolygon and whose properties are the remaining attributes, including
//! the primary key. The feature `id` member carries the primary key too.
//!
//! # Example
//!
//! ```ignore
//! use watershed::geojson::to_feature;
//!
//! let feature = to_feature(&watershed);
//! assert_eq!(feature.property("huc_12").unwrap(), "160102030405");
//! ```

use geojson::{feature::Id, Feature, FeatureCollection, GeoJson, JsonObject, JsonValue};

use crate::error::{Result, WatershedError};
use crate::model::Watershed;

/// Convert a watershed into a GeoJSON feature.
///
/// Null attributes are kept as JSON `null`, so every feature produced here
/// exposes the same set of property keys.
pub fn to_feature(watershed: &Watershed) -> Feature {
    Feature {
        bbox: None,
        geometry: watershed.geom.clone(),
        id: Some(Id::Number(watershed.id.into())),
        properties: Some(feature_properties(watershed)),
        foreign_members: None,
    }
}

/// Convert a slice of watersheds into features, preserving order.
pub fn to_features(watersheds: &[Watershed]) -> Vec<Feature> {
    watersheds.iter().map(to_feature).collect()
}

/// Wrap a slice of watersheds into a `FeatureCollection`.
pub fn to_feature_collection(watersheds: &[Watershed]) -> FeatureCollection {
    FeatureCollection {
        bbox: None,
        features: to_features(watersheds),
        foreign_members: None,
    }
}

/// Property map of a watershed: every attribute except the geometry.
pub fn feature_properties(watershed: &Watershed) -> JsonObject {
    into_properties(watershed.id, serde_json::to_value(watershed))
}

fn into_properties(id: i64, value: serde_json::Result<JsonValue>) -> JsonObject {
    match value {
        Ok(JsonValue::Object(map)) => map,
        Ok(other) => {
            tracing::error!(id, value = %other, "Watershed did not serialize to an object");
            JsonObject::new()
        }
        Err(e) => {
            tracing::error!(id, error = %e, "Failed to serialize watershed properties");
            JsonObject::new()
        }
    }
}

/// Build a watershed from a GeoJSON feature.
///
/// The primary key is read from the `id` property, falling back to a numeric
/// feature `id`. Unknown properties are ignored.
///
/// # Errors
///
/// Returns [`WatershedError::InvalidFeature`] if no integer id can be found or
/// a property has the wrong type.
pub fn from_feature(feature: Feature) -> Result<Watershed> {
    let mut properties = feature.properties.unwrap_or_default();

    if !properties.get("id").is_some_and(JsonValue::is_i64) {
        let id = match &feature.id {
            Some(Id::Number(n)) if n.is_i64() => n.clone(),
            _ => {
                return Err(WatershedError::InvalidFeature {
                    message: "feature has no integer id".to_string(),
                })
            }
        };
        properties.insert("id".to_string(), JsonValue::Number(id));
    }

    let mut watershed: Watershed = serde_json::from_value(JsonValue::Object(properties))
        .map_err(|e| WatershedError::InvalidFeature {
            message: e.to_string(),
        })?;
    watershed.geom = feature.geometry;

    Ok(watershed)
}

/// Parse a GeoJSON document into watersheds.
///
/// Accepts a `FeatureCollection` or a single `Feature`.
pub fn from_geojson(geojson: GeoJson) -> Result<Vec<Watershed>> {
    match geojson {
        GeoJson::FeatureCollection(fc) => fc.features.into_iter().map(from_feature).collect(),
        GeoJson::Feature(feature) => Ok(vec![from_feature(feature)?]),
        GeoJson::Geometry(_) => Err(WatershedError::InvalidFeature {
            message: "expected a Feature or FeatureCollection, found a bare geometry".to_string(),
        }),
    }
}
