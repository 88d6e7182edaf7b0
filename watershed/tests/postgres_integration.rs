//! Integration tests for the PostgreSQL watershed store.
//!
//! These tests require a PostgreSQL database with the PostGIS extension
//! available. SQLx test macros create an isolated database per test and
//! apply the migrations in `tests/migrations`.
//!
//! Run with: `DATABASE_URL=postgres://... cargo test --test postgres_integration`

use watershed::{PostgresStore, WatershedError, WatershedStore, SUGGESTION_LIMIT};

/// Inserts one watershed with a small square polygon offset by its id.
async fn insert(
    pool: &sqlx::PgPool,
    id: i64,
    huc_12: &str,
    basin: Option<&str>,
    name: Option<&str>,
) {
    sqlx::query(
        "INSERT INTO watersheds (id, huc_8, huc_10, huc_12, dwq_basin, hu_12_name, geom) \
         VALUES ($1, $2, $3, $4, $5, $6, \
         ST_Multi(ST_MakeEnvelope(-112.0 + $1::float8 * 0.1, 41.0, -111.9 + $1::float8 * 0.1, 41.1, 4326)))",
    )
    .bind(id)
    .bind(&huc_12[..8])
    .bind(&huc_12[..10])
    .bind(huc_12)
    .bind(basin)
    .bind(name)
    .execute(pool)
    .await
    .unwrap();
}

/// Bear River, Bear River East and Jordan River rows, plus unnamed ones.
async fn seed(pool: &sqlx::PgPool) {
    insert(pool, 3, "160101020301", Some("Bear River"), Some("Mill Creek")).await;
    insert(pool, 1, "160101010101", Some("Bear River"), Some("Upper Bear")).await;
    insert(pool, 2, "160101010102", Some("Bear River East"), Some("Mill Creek")).await;
    insert(pool, 4, "160202040301", Some("Jordan River"), None).await;
    insert(pool, 5, "160202040302", None, Some("")).await;
}

fn store(pool: sqlx::PgPool) -> PostgresStore {
    PostgresStore::with_pool(pool, "watersheds", None).unwrap()
}

// ============================================================================
// HUC lookup
// ============================================================================

#[sqlx::test(migrations = "tests/migrations")]
async fn test_find_by_huc_at_each_level(pool: sqlx::PgPool) {
    seed(&pool).await;
    let store = store(pool);

    for code in ["160202040301", "1602020403", "16020204"] {
        let hit = store.find_by_any_huc(code).await.unwrap().unwrap();
        assert_eq!(hit.id, 4, "code {code}");
    }
}

#[sqlx::test(migrations = "tests/migrations")]
async fn test_find_by_huc_tie_returns_lowest_id(pool: sqlx::PgPool) {
    seed(&pool).await;
    let store = store(pool);

    // HUC-8 16010101 is shared by ids 1 and 2, inserted after id 3
    let hit = store.find_by_any_huc("16010101").await.unwrap().unwrap();
    assert_eq!(hit.id, 1);
}

#[sqlx::test(migrations = "tests/migrations")]
async fn test_find_by_huc_missing_or_prefix(pool: sqlx::PgPool) {
    seed(&pool).await;
    let store = store(pool);

    assert!(store.find_by_any_huc("99999999").await.unwrap().is_none());
    assert!(store.find_by_any_huc("1601").await.unwrap().is_none());
}

#[sqlx::test(migrations = "tests/migrations")]
async fn test_row_decoding(pool: sqlx::PgPool) {
    sqlx::query(
        "INSERT INTO watersheds (id, objectid1, huc_12, acres, population, shape_area, \
         area, geom, created_at) VALUES (7, 70, '160202040305', 1234.567891, 12500, 0.0123, \
         0.5, ST_Multi(ST_MakeEnvelope(-112, 41, -111.9, 41.1, 4326)), \
         '2024-03-01T12:00:00Z')",
    )
    .execute(&pool)
    .await
    .unwrap();
    let store = store(pool);

    let ws = store.find_by_any_huc("160202040305").await.unwrap().unwrap();
    assert_eq!(ws.objectid1, Some(70));
    assert_eq!(ws.acres.unwrap().to_string(), "1234.567891");
    assert_eq!(ws.population, Some(12500));
    assert_eq!(ws.shape_area, Some(0.0123));
    assert!(ws.hu_12_name.is_none());
    assert_eq!(
        ws.created_at.unwrap().to_rfc3339(),
        "2024-03-01T12:00:00+00:00"
    );
    assert!(ws.updated_at.is_none());

    match ws.geom.unwrap().value {
        geojson::Value::MultiPolygon(polygons) => {
            assert_eq!(polygons.len(), 1);
            assert_eq!(polygons[0][0].len(), 5);
        }
        other => panic!("expected MultiPolygon, got {other:?}"),
    }
}

#[sqlx::test(migrations = "tests/migrations")]
async fn test_output_srid_reprojects_geometry(pool: sqlx::PgPool) {
    seed(&pool).await;
    let store = PostgresStore::with_pool(pool, "watersheds", Some(3857)).unwrap();

    let ws = store.find_by_any_huc("160202040301").await.unwrap().unwrap();
    let geojson::Value::MultiPolygon(polygons) = ws.geom.unwrap().value else {
        panic!("expected MultiPolygon");
    };
    // Web Mercator eastings are in metres, far outside the degree range
    assert!(polygons[0][0][0][0].abs() > 1_000_000.0);
}

// ============================================================================
// Substring search
// ============================================================================

#[sqlx::test(migrations = "tests/migrations")]
async fn test_basin_search_is_case_insensitive_substring(pool: sqlx::PgPool) {
    seed(&pool).await;
    let store = store(pool);

    for query in ["jordan", "RIVER", "dan riv"] {
        let rows = store.find_by_basin_contains(query).await.unwrap();
        assert!(
            rows.iter().any(|ws| ws.id == 4),
            "query {query:?} should match Jordan River"
        );
    }
}

#[sqlx::test(migrations = "tests/migrations")]
async fn test_bear_river_rows_and_distinct_names(pool: sqlx::PgPool) {
    seed(&pool).await;
    let store = store(pool);

    let rows = store.find_by_basin_contains("Bear River").await.unwrap();
    let ids: Vec<i64> = rows.iter().map(|ws| ws.id).collect();
    assert_eq!(ids, vec![1, 2, 3]);

    let suggestions = store.distinct_basin_names_containing("bear").await.unwrap();
    assert_eq!(suggestions.names, vec!["Bear River", "Bear River East"]);
    assert_eq!(suggestions.total, 2);
}

#[sqlx::test(migrations = "tests/migrations")]
async fn test_hu12name_search(pool: sqlx::PgPool) {
    seed(&pool).await;
    let store = store(pool);

    let rows = store.find_by_hu12name_contains("MILL").await.unwrap();
    assert_eq!(rows.len(), 2);
    assert!(store
        .find_by_hu12name_contains("nowhere")
        .await
        .unwrap()
        .is_empty());
}

#[sqlx::test(migrations = "tests/migrations")]
async fn test_wildcards_match_literally(pool: sqlx::PgPool) {
    seed(&pool).await;
    insert(&pool, 10, "160301010101", Some("100% Wash"), Some("A_B Creek")).await;
    insert(&pool, 11, "160301010102", Some("AxB Wash"), Some("AxB Creek")).await;
    insert(&pool, 12, "160301010103", Some("C:\\ Wash"), None).await;
    let store = store(pool);

    let rows = store.find_by_basin_contains("%").await.unwrap();
    assert_eq!(rows.iter().map(|ws| ws.id).collect::<Vec<_>>(), vec![10]);

    assert!(store.find_by_basin_contains("B_ar").await.unwrap().is_empty());

    let rows = store.find_by_hu12name_contains("a_b").await.unwrap();
    assert_eq!(rows.iter().map(|ws| ws.id).collect::<Vec<_>>(), vec![10]);

    let rows = store.find_by_basin_contains("c:\\").await.unwrap();
    assert_eq!(rows.iter().map(|ws| ws.id).collect::<Vec<_>>(), vec![12]);

    let suggestions = store.distinct_hu12_names_containing("_").await.unwrap();
    assert_eq!(suggestions.names, vec!["A_B Creek"]);
}

// ============================================================================
// Distinct name suggestions
// ============================================================================

#[sqlx::test(migrations = "tests/migrations")]
async fn test_distinct_names_skip_null_and_empty(pool: sqlx::PgPool) {
    seed(&pool).await;
    let store = store(pool);

    let suggestions = store.distinct_hu12_names_containing("e").await.unwrap();
    assert_eq!(suggestions.names, vec!["Mill Creek", "Upper Bear"]);
    assert_eq!(suggestions.total, 2);
}

#[sqlx::test(migrations = "tests/migrations")]
async fn test_distinct_names_capped_with_total(pool: sqlx::PgPool) {
    for i in 0..25 {
        let basin = format!("Basin {:02}", 24 - i);
        insert(&pool, i, "160101010101", Some(&basin), None).await;
    }
    let store = store(pool);

    let suggestions = store.distinct_basin_names_containing("basin").await.unwrap();
    assert_eq!(suggestions.names.len(), SUGGESTION_LIMIT);
    assert_eq!(suggestions.total, 25);
    assert_eq!(suggestions.names[0], "Basin 00");
    assert_eq!(suggestions.names[9], "Basin 09");
}

#[sqlx::test(migrations = "tests/migrations")]
async fn test_distinct_names_no_match(pool: sqlx::PgPool) {
    seed(&pool).await;
    let store = store(pool);

    let suggestions = store.distinct_basin_names_containing("zzz").await.unwrap();
    assert!(suggestions.names.is_empty());
    assert_eq!(suggestions.total, 0);
}

// ============================================================================
// Connection and configuration
// ============================================================================

#[sqlx::test(migrations = "tests/migrations")]
async fn test_ping_and_describe(pool: sqlx::PgPool) {
    let store = store(pool);

    store.ping().await.unwrap();
    assert_eq!(store.describe(), "PostgreSQL table watersheds");
}

#[sqlx::test(migrations = "tests/migrations")]
async fn test_invalid_table_name_rejected(pool: sqlx::PgPool) {
    let result = PostgresStore::with_pool(pool, "watersheds; DROP TABLE x", None);
    assert!(matches!(result, Err(WatershedError::Config { .. })));
}
