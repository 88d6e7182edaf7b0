//! # Watershed - HUC watershed query library
//!
//! Read-only access to a table of USGS watershed polygons identified by
//! Hydrologic Unit Codes (HUC-8, HUC-10 and HUC-12).
//!
//! ## Features
//!
//! - **PostGIS backed**: filters, distinct projections and limits run inside
//!   the database, geometries come back as GeoJSON
//! - **Offline**: serve a GeoJSON FeatureCollection from memory, no database
//!   required
//! - **Map ready**: every record converts to a GeoJSON `Feature`
//!
//! ## Quick Start
//!
//! ```ignore
//! use watershed::StoreBuilder;
//!
//! let store = StoreBuilder::postgres("postgres://localhost/gis")
//!     .max_connections(5)
//!     .build()
//!     .await?;
//!
//! if let Some(ws) = store.find_by_any_huc("160102030405").await? {
//!     println!("{}", ws);
//!     let feature = watershed::geojson::to_feature(&ws);
//! }
//!
//! let suggestions = store.distinct_basin_names_containing("bear").await?;
//! println!("{:?} ({} total)", suggestions.names, suggestions.total);
//! ```
//!
//! ## Hydrologic Unit Codes
//!
//! Codes nest by prefix: the first 8 digits of a HUC-12 are its HUC-8 and the
//! first 10 its HUC-10. The nesting is a convention of the source dataset and
//! is not validated here.

pub mod config;
pub mod error;
pub mod geojson;
pub mod model;
pub mod store;

// Re-export main types at crate root for convenience
pub use config::StoreBuilder;
pub use error::{Result, WatershedError};
pub use model::Watershed;
pub use store::{
    MemoryStore, NameField, PostgresStore, Suggestions, WatershedStore, MIN_QUERY_CHARS,
    SUGGESTION_LIMIT,
};
