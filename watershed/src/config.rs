//! Store selection and configuration.
//!
//! [`StoreBuilder`] decides which backend serves watershed data and opens it.
//!
//! ```ignore
//! use watershed::StoreBuilder;
//!
//! // Explicit configuration
//! let store = StoreBuilder::postgres("postgres://localhost/gis")
//!     .table("public.watersheds")
//!     .max_connections(10)
//!     .build()
//!     .await?;
//!
//! // Or from environment variables
//! let store = StoreBuilder::from_env()?.build().await?;
//! ```
//!
//! ## Environment Variables
//!
//! | Variable | Description | Default |
//! |----------|-------------|---------|
//! | `WATERSHED_FIXTURE` | GeoJSON FeatureCollection served from memory (takes precedence) | None |
//! | `DATABASE_URL` | PostgreSQL connection string | Required without fixture |
//! | `WATERSHED_TABLE` | Table holding the watershed polygons | `watersheds` |
//! | `WATERSHED_MAX_CONNECTIONS` | Connection pool size | 5 |
//! | `WATERSHED_OUTPUT_SRID` | Reproject geometries to this SRID | None |

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use crate::error::{Result, WatershedError};
use crate::store::{MemoryStore, PostgresStore, WatershedStore, DEFAULT_TABLE};

/// Default connection pool size.
pub const DEFAULT_MAX_CONNECTIONS: u32 = 5;

/// Default time to wait for a pooled connection.
pub const DEFAULT_ACQUIRE_TIMEOUT: Duration = Duration::from_secs(10);

/// Where watershed rows come from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreSource {
    /// A PostgreSQL/PostGIS database.
    Postgres { database_url: String },
    /// A GeoJSON file loaded into memory.
    Fixture { path: PathBuf },
}

/// Builder for a [`WatershedStore`].
#[derive(Debug, Clone)]
pub struct StoreBuilder {
    source: StoreSource,
    table: String,
    max_connections: u32,
    acquire_timeout: Duration,
    output_srid: Option<i32>,
}

impl StoreBuilder {
    fn with_source(source: StoreSource) -> Self {
        Self {
            source,
            table: DEFAULT_TABLE.to_string(),
            max_connections: DEFAULT_MAX_CONNECTIONS,
            acquire_timeout: DEFAULT_ACQUIRE_TIMEOUT,
            output_srid: None,
        }
    }

    /// Serve watersheds from a PostgreSQL database.
    pub fn postgres(database_url: impl Into<String>) -> Self {
        Self::with_source(StoreSource::Postgres {
            database_url: database_url.into(),
        })
    }

    /// Serve watersheds from a GeoJSON file held in memory.
    pub fn fixture(path: impl Into<PathBuf>) -> Self {
        Self::with_source(StoreSource::Fixture { path: path.into() })
    }

    /// Create a builder from environment variables.
    ///
    /// # Errors
    ///
    /// Returns an error if neither `WATERSHED_FIXTURE` nor `DATABASE_URL` is
    /// set, or if a numeric variable cannot be parsed.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Create a builder from an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let mut builder = match (non_empty("WATERSHED_FIXTURE"), non_empty("DATABASE_URL")) {
            (Some(path), _) => Self::fixture(path),
            (None, Some(url)) => Self::postgres(url),
            (None, None) => {
                return Err(WatershedError::Config {
                    message: "DATABASE_URL environment variable not set".to_string(),
                })
            }
        };

        if let Some(table) = non_empty("WATERSHED_TABLE") {
            builder = builder.table(table);
        }
        if let Some(value) = non_empty("WATERSHED_MAX_CONNECTIONS") {
            builder = builder.max_connections(parse_var("WATERSHED_MAX_CONNECTIONS", &value)?);
        }
        if let Some(value) = non_empty("WATERSHED_OUTPUT_SRID") {
            builder = builder.output_srid(parse_var("WATERSHED_OUTPUT_SRID", &value)?);
        }

        Ok(builder)
    }

    /// Table holding the watershed polygons.
    pub fn table(mut self, table: impl Into<String>) -> Self {
        self.table = table.into();
        self
    }

    /// Maximum connections in the pool.
    pub fn max_connections(mut self, max_connections: u32) -> Self {
        self.max_connections = max_connections.max(1);
        self
    }

    /// How long a request waits for a pooled connection.
    pub fn acquire_timeout(mut self, timeout: Duration) -> Self {
        self.acquire_timeout = timeout;
        self
    }

    /// Reproject geometries to `srid` before returning them.
    pub fn output_srid(mut self, srid: i32) -> Self {
        self.output_srid = Some(srid);
        self
    }

    /// Selected backend.
    pub fn source(&self) -> &StoreSource {
        &self.source
    }

    /// Open the configured store.
    ///
    /// # Errors
    ///
    /// Returns an error if the fixture cannot be loaded or the database
    /// cannot be reached.
    pub async fn build(self) -> Result<Arc<dyn WatershedStore>> {
        match self.source {
            StoreSource::Fixture { path } => {
                if self.output_srid.is_some() {
                    tracing::warn!("WATERSHED_OUTPUT_SRID is ignored for fixture stores");
                }
                Ok(Arc::new(MemoryStore::from_geojson_file(path)?))
            }
            StoreSource::Postgres { database_url } => {
                let store = PostgresStore::connect(
                    &database_url,
                    &self.table,
                    self.max_connections,
                    self.acquire_timeout,
                    self.output_srid,
                )
                .await?;
                Ok(Arc::new(store))
            }
        }
    }
}

fn parse_var<T: std::str::FromStr>(key: &str, value: &str) -> Result<T> {
    value.trim().parse().map_err(|_| WatershedError::Config {
        message: format!("{key} has an invalid value: {value:?}"),
    })
}
