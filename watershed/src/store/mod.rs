//! Data access for the watershed table.
//!
//! [`WatershedStore`] is the seam between the HTTP layer and storage. Two
//! backends implement it:
//!
//! - [`PostgresStore`]: the production backend; every filter, distinct
//!   projection and limit is pushed down into a single SQL statement
//! - [`MemoryStore`]: rows held in memory, loaded from a GeoJSON file
//!
//! Both backends share the same matching rules: substring filters are
//! case-insensitive and treat the query as a literal, HUC lookups return the
//! row with the lowest `id` when several rows match, and name suggestions are
//! distinct, non-empty, sorted ascending and capped at [`SUGGESTION_LIMIT`].

mod memory;
mod postgres;

pub use memory::MemoryStore;
pub use postgres::{PostgresStore, DEFAULT_TABLE};

use async_trait::async_trait;

use crate::error::Result;
use crate::model::Watershed;

/// Maximum number of suggestions returned by the distinct-name queries.
pub const SUGGESTION_LIMIT: usize = 10;

/// Minimum autocomplete query length, in characters.
pub const MIN_QUERY_CHARS: usize = 2;

/// Free-text name column that substring searches run against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NameField {
    /// `dwq_basin`: the basin a watershed is grouped under.
    Basin,
    /// `hu_12_name`: the HUC-12 watershed name.
    Hu12Name,
}

impl NameField {
    /// Column name in the watershed table.
    pub fn column(self) -> &'static str {
        match self {
            NameField::Basin => "dwq_basin",
            NameField::Hu12Name => "hu_12_name",
        }
    }

    /// Value of this field on a record.
    pub fn value(self, watershed: &Watershed) -> Option<&str> {
        match self {
            NameField::Basin => watershed.dwq_basin.as_deref(),
            NameField::Hu12Name => watershed.hu_12_name.as_deref(),
        }
    }
}

/// Autocomplete result for a name query.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Suggestions {
    /// Distinct matching names, sorted ascending, at most [`SUGGESTION_LIMIT`].
    pub names: Vec<String>,
    /// Number of distinct matching names before truncation.
    pub total: usize,
}

/// Read-only access to watershed records.
///
/// Implementations must be cheap to share across requests; any pooling is
/// internal to the implementation.
#[async_trait]
pub trait WatershedStore: Send + Sync {
    /// First record whose `huc_8`, `huc_10` or `huc_12` equals `code`.
    ///
    /// Ties resolve to the lowest `id`.
    async fn find_by_any_huc(&self, code: &str) -> Result<Option<Watershed>>;

    /// All records whose `field` contains `substr`, ignoring case.
    async fn find_by_name_contains(&self, field: NameField, substr: &str)
        -> Result<Vec<Watershed>>;

    /// Distinct non-empty values of `field` containing `substr`, ignoring
    /// case, sorted ascending and truncated to `limit`.
    async fn distinct_names_containing(
        &self,
        field: NameField,
        substr: &str,
        limit: usize,
    ) -> Result<Suggestions>;

    /// Verify the backend is reachable.
    async fn ping(&self) -> Result<()>;

    /// Short description of the backend, free of credentials.
    fn describe(&self) -> String;

    async fn find_by_basin_contains(&self, substr: &str) -> Result<Vec<Watershed>> {
        self.find_by_name_contains(NameField::Basin, substr).await
    }

    async fn find_by_hu12name_contains(&self, substr: &str) -> Result<Vec<Watershed>> {
        self.find_by_name_contains(NameField::Hu12Name, substr).await
    }

    async fn distinct_basin_names_containing(&self, substr: &str) -> Result<Suggestions> {
        self.distinct_names_containing(NameField::Basin, substr, SUGGESTION_LIMIT)
            .await
    }

    async fn distinct_hu12_names_containing(&self, substr: &str) -> Result<Suggestions> {
        self.distinct_names_containing(NameField::Hu12Name, substr, SUGGESTION_LIMIT)
            .await
    }
}
