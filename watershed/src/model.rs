//! Watershed record as stored in the external `watersheds` table.

use std::fmt;

use bigdecimal::BigDecimal;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Placeholder used when a watershed has no HUC-12 name.
pub const UNNAMED: &str = "Unnamed";

/// A single watershed polygon and its attributes.
///
/// Rows are owned by an external pipeline; this type is read-only plumbing.
/// Every attribute except `id` is nullable in the source schema.
///
/// `geom` is not part of the serialized attribute set: it becomes the
/// geometry of a GeoJSON feature (see [`crate::geojson::to_feature`]).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Watershed {
    pub id: i64,
    pub objectid1: Option<i32>,
    pub huc_8: Option<String>,
    pub huc_10: Option<String>,
    pub huc_12: Option<String>,
    /// Decimal acreage, serialized as a string to keep every digit.
    pub acres: Option<BigDecimal>,
    pub hu_10_name: Option<String>,
    pub hu_12_name: Option<String>,
    pub basin: Option<String>,
    pub dwq_basin: Option<String>,
    pub population: Option<i32>,
    pub shape_area: Option<f64>,
    pub shape_length: Option<f64>,
    pub pop_2010: Option<i32>,
    pub pop_2000: Option<i32>,
    pub area: Option<BigDecimal>,
    pub pop_chg_10_20: Option<i32>,
    pub pop_chg_00_10: Option<i32>,
    #[serde(skip)]
    pub geom: Option<geojson::Geometry>,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl Watershed {
    /// HUC-12 name, or `"Unnamed"` when the dataset has none.
    pub fn display_name(&self) -> &str {
        self.hu_12_name.as_deref().unwrap_or(UNNAMED)
    }

    /// Returns true if `code` equals any of the three HUC levels.
    pub fn matches_huc(&self, code: &str) -> bool {
        [&self.huc_8, &self.huc_10, &self.huc_12]
            .into_iter()
            .any(|huc| huc.as_deref() == Some(code))
    }
}

impl fmt::Display for Watershed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Watershed {} - {}",
            self.huc_12.as_deref().unwrap_or(""),
            self.display_name()
        )
    }
}
