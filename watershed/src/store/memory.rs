//! In-memory watershed store backed by a GeoJSON FeatureCollection.

use std::collections::BTreeSet;
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use async_trait::async_trait;

use super::{NameField, Suggestions, WatershedStore};
use crate::error::{Result, WatershedError};
use crate::model::Watershed;

/// Watershed store holding every row in memory.
///
/// Intended for fixtures, demos and offline use. Rows are kept sorted by
/// `id`, which gives the same tie-break order as [`super::PostgresStore`].
///
/// # Example
///
/// ```ignore
/// use watershed::MemoryStore;
///
/// let store = MemoryStore::from_geojson_file("watersheds.geojson")?;
/// let hit = store.lookup("16020204");
/// ```
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    rows: Vec<Watershed>,
    source: Option<PathBuf>,
}

impl MemoryStore {
    /// Create a store from a list of watersheds.
    pub fn new(mut rows: Vec<Watershed>) -> Self {
        rows.sort_by_key(|ws| ws.id);
        Self { rows, source: None }
    }

    /// Load a store from a GeoJSON `FeatureCollection` (or single `Feature`).
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, is not valid GeoJSON,
    /// contains a feature without an integer id, or repeats an id.
    pub fn from_geojson_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let reader = BufReader::new(File::open(path)?);
        let geojson = geojson::GeoJson::from_reader(reader)?;
        let rows = crate::geojson::from_geojson(geojson)?;

        tracing::debug!(path = %path.display(), rows = rows.len(), "Loaded watershed fixture");

        let mut store = Self::new(rows);
        if let Some(pair) = store.rows.windows(2).find(|pair| pair[0].id == pair[1].id) {
            return Err(WatershedError::InvalidFeature {
                message: format!("duplicate watershed id {}", pair[0].id),
            });
        }
        store.source = Some(path.to_path_buf());
        Ok(store)
    }

    /// Number of rows in the store.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Returns true if the store holds no rows.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// First row (lowest `id`) matching `code` at any HUC level.
    pub fn lookup(&self, code: &str) -> Option<&Watershed> {
        self.rows.iter().find(|ws| ws.matches_huc(code))
    }

    /// Rows whose `field` contains `substr`, ignoring case.
    pub fn search(&self, field: NameField, substr: &str) -> Vec<&Watershed> {
        let needle = substr.to_lowercase();
        self.rows
            .iter()
            .filter(|ws| field.value(ws).is_some_and(|v| contains_folded(v, &needle)))
            .collect()
    }

    /// Distinct non-empty names of `field` containing `substr`.
    pub fn suggest(&self, field: NameField, substr: &str, limit: usize) -> Suggestions {
        let needle = substr.to_lowercase();
        let matches: BTreeSet<&str> = self
            .rows
            .iter()
            .filter_map(|ws| field.value(ws))
            .filter(|v| !v.is_empty() && contains_folded(v, &needle))
            .collect();

        Suggestions {
            total: matches.len(),
            names: matches.into_iter().take(limit).map(str::to_string).collect(),
        }
    }
}

fn contains_folded(haystack: &str, folded_needle: &str) -> bool {
    haystack.to_lowercase().contains(folded_needle)
}

#[async_trait]
impl WatershedStore for MemoryStore {
    async fn find_by_any_huc(&self, code: &str) -> Result<Option<Watershed>> {
        Ok(self.lookup(code).cloned())
    }

    async fn find_by_name_contains(
        &self,
        field: NameField,
        substr: &str,
    ) -> Result<Vec<Watershed>> {
        Ok(self.search(field, substr).into_iter().cloned().collect())
    }

    async fn distinct_names_containing(
        &self,
        field: NameField,
        substr: &str,
        limit: usize,
    ) -> Result<Suggestions> {
        Ok(self.suggest(field, substr, limit))
    }

    async fn ping(&self) -> Result<()> {
        Ok(())
    }

    fn describe(&self) -> String {
        match &self.source {
            Some(path) => format!("In-memory fixture {} ({} rows)", path.display(), self.len()),
            None => format!("In-memory store ({} rows)", self.len()),
        }
    }
}
