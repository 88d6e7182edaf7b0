//! PostgreSQL/PostGIS implementation of the watershed store.
//!
//! Reads the externally managed `watersheds` table. Every operation is one
//! parameterized statement; geometries are converted to GeoJSON by PostGIS
//! (`ST_AsGeoJSON`) so no geometry decoding happens in Rust.

use std::str::FromStr;
use std::time::Duration;

use async_trait::async_trait;
use bigdecimal::BigDecimal;
use chrono::{DateTime, Utc};
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;

use super::{NameField, Suggestions, WatershedStore};
use crate::error::{Result, WatershedError};
use crate::model::Watershed;

/// Default table holding the watershed polygons.
pub const DEFAULT_TABLE: &str = "watersheds";

/// Row as returned by the select statements below.
#[derive(sqlx::FromRow)]
struct WatershedRow {
    id: i64,
    objectid1: Option<i32>,
    huc_8: Option<String>,
    huc_10: Option<String>,
    huc_12: Option<String>,
    acres: Option<BigDecimal>,
    hu_10_name: Option<String>,
    hu_12_name: Option<String>,
    basin: Option<String>,
    dwq_basin: Option<String>,
    population: Option<i32>,
    shape_area: Option<f64>,
    shape_length: Option<f64>,
    pop_2010: Option<i32>,
    pop_2000: Option<i32>,
    area: Option<BigDecimal>,
    pop_chg_10_20: Option<i32>,
    pop_chg_00_10: Option<i32>,
    geom_json: Option<String>,
    created_at: Option<DateTime<Utc>>,
    updated_at: Option<DateTime<Utc>>,
}

impl TryFrom<WatershedRow> for Watershed {
    type Error = WatershedError;

    fn try_from(row: WatershedRow) -> Result<Self> {
        let geom = row
            .geom_json
            .as_deref()
            .map(geojson::Geometry::from_str)
            .transpose()
            .map_err(|source| WatershedError::InvalidGeometry { id: row.id, source })?;

        Ok(Watershed {
            id: row.id,
            objectid1: row.objectid1,
            huc_8: row.huc_8,
            huc_10: row.huc_10,
            huc_12: row.huc_12,
            acres: row.acres,
            hu_10_name: row.hu_10_name,
            hu_12_name: row.hu_12_name,
            basin: row.basin,
            dwq_basin: row.dwq_basin,
            population: row.population,
            shape_area: row.shape_area,
            shape_length: row.shape_length,
            pop_2010: row.pop_2010,
            pop_2000: row.pop_2000,
            area: row.area,
            pop_chg_10_20: row.pop_chg_10_20,
            pop_chg_00_10: row.pop_chg_00_10,
            geom,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[derive(sqlx::FromRow)]
struct SuggestionRow {
    name: String,
    total: i64,
}

/// SQL text for one table, built once at construction.
#[derive(Debug, Clone)]
struct Statements {
    by_huc: String,
    by_basin: String,
    by_hu12_name: String,
    basin_names: String,
    hu12_names: String,
}

impl Statements {
    fn new(table: &str, output_srid: Option<i32>) -> Self {
        let geom = match output_srid {
            Some(srid) => format!("ST_AsGeoJSON(ST_Transform(geom, {srid}))"),
            None => "ST_AsGeoJSON(geom)".to_string(),
        };
        let select = format!(
            "SELECT id, objectid1, huc_8, huc_10, huc_12, acres, hu_10_name, hu_12_name, \
             basin, dwq_basin, population, shape_area, shape_length, pop_2010, pop_2000, \
             area, pop_chg_10_20, pop_chg_00_10, {geom} AS geom_json, \
             created_at::timestamptz AS created_at, updated_at::timestamptz AS updated_at \
             FROM {table}"
        );

        let contains = |field: NameField| {
            format!("{select} WHERE {} ILIKE $1 ORDER BY id", field.column())
        };
        let names = |field: NameField| {
            let column = field.column();
            format!(
                "SELECT name, COUNT(*) OVER () AS total FROM (\
                 SELECT DISTINCT {column} AS name FROM {table} \
                 WHERE {column} ILIKE $1 AND {column} <> ''\
                 ) AS matches ORDER BY name LIMIT $2"
            )
        };

        Self {
            by_huc: format!(
                "{select} WHERE huc_8 = $1 OR huc_10 = $1 OR huc_12 = $1 ORDER BY id LIMIT 1"
            ),
            by_basin: contains(NameField::Basin),
            by_hu12_name: contains(NameField::Hu12Name),
            basin_names: names(NameField::Basin),
            hu12_names: names(NameField::Hu12Name),
        }
    }

    fn contains(&self, field: NameField) -> &str {
        match field {
            NameField::Basin => &self.by_basin,
            NameField::Hu12Name => &self.by_hu12_name,
        }
    }

    fn names(&self, field: NameField) -> &str {
        match field {
            NameField::Basin => &self.basin_names,
            NameField::Hu12Name => &self.hu12_names,
        }
    }
}

/// PostgreSQL-backed watershed store.
///
/// Holds a connection pool; connections are acquired per statement and
/// returned to the pool on every exit path.
pub struct PostgresStore {
    pool: PgPool,
    table: String,
    statements: Statements,
}

impl PostgresStore {
    /// Connect to PostgreSQL and prepare a store for `table`.
    ///
    /// # Errors
    ///
    /// Returns [`WatershedError::Config`] if `table` is not a plain or
    /// schema-qualified identifier, or [`WatershedError::Database`] if the
    /// pool cannot connect.
    pub async fn connect(
        database_url: &str,
        table: &str,
        max_connections: u32,
        acquire_timeout: Duration,
        output_srid: Option<i32>,
    ) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .acquire_timeout(acquire_timeout)
            .connect(database_url)
            .await?;

        Self::with_pool(pool, table, output_srid)
    }

    /// Create a store over an existing pool.
    pub fn with_pool(pool: PgPool, table: &str, output_srid: Option<i32>) -> Result<Self> {
        validate_table_name(table)?;
        Ok(Self {
            pool,
            table: table.to_string(),
            statements: Statements::new(table, output_srid),
        })
    }
}

#[async_trait]
impl WatershedStore for PostgresStore {
    async fn find_by_any_huc(&self, code: &str) -> Result<Option<Watershed>> {
        let row: Option<WatershedRow> = sqlx::query_as(&self.statements.by_huc)
            .bind(code)
            .fetch_optional(&self.pool)
            .await?;

        row.map(Watershed::try_from).transpose()
    }

    async fn find_by_name_contains(
        &self,
        field: NameField,
        substr: &str,
    ) -> Result<Vec<Watershed>> {
        let rows: Vec<WatershedRow> = sqlx::query_as(self.statements.contains(field))
            .bind(like_pattern(substr))
            .fetch_all(&self.pool)
            .await?;

        rows.into_iter().map(Watershed::try_from).collect()
    }

    async fn distinct_names_containing(
        &self,
        field: NameField,
        substr: &str,
        limit: usize,
    ) -> Result<Suggestions> {
        let rows: Vec<SuggestionRow> = sqlx::query_as(self.statements.names(field))
            .bind(like_pattern(substr))
            .bind(i64::try_from(limit).unwrap_or(i64::MAX))
            .fetch_all(&self.pool)
            .await?;

        let total = rows
            .first()
            .map(|row| usize::try_from(row.total).unwrap_or(0))
            .unwrap_or(0);

        Ok(Suggestions {
            names: rows.into_iter().map(|row| row.name).collect(),
            total,
        })
    }

    async fn ping(&self) -> Result<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    fn describe(&self) -> String {
        format!("PostgreSQL table {}", self.table)
    }
}

/// `ILIKE` pattern matching `substr` anywhere, with `\`, `%` and `_` escaped.
fn like_pattern(substr: &str) -> String {
    let mut pattern = String::with_capacity(substr.len() + 2);
    pattern.push('%');
    for c in substr.chars() {
        if matches!(c, '\\' | '%' | '_') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}

/// Accepts `name` or `schema.name`, each an unquoted SQL identifier.
fn validate_table_name(table: &str) -> Result<()> {
    let valid_ident = |part: &str| {
        let mut chars = part.chars();
        matches!(chars.next(), Some(c) if c.is_ascii_alphabetic() || c == '_')
            && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
    };

    let parts: Vec<&str> = table.split('.').collect();
    if parts.len() <= 2 && parts.iter().all(|part| valid_ident(part)) {
        Ok(())
    } else {
        Err(WatershedError::Config {
            message: format!("invalid table name: {table:?}"),
        })
    }
}
