//! Watershed Service - HTTP query layer over HUC watershed polygons.
//!
//! Read-only REST API resolving watersheds by HUC code, listing watersheds by
//! basin or HUC-12 name, and suggesting names for autocomplete.
//!
//! ## Environment Variables
//!
//! | Variable | Description | Default |
//! |----------|-------------|---------|
//! | `DATABASE_URL` | PostgreSQL/PostGIS connection string | Required without fixture |
//! | `WATERSHED_FIXTURE` | Serve a GeoJSON FeatureCollection instead of PostgreSQL | None |
//! | `WATERSHED_TABLE` | Table holding the watershed polygons | `watersheds` |
//! | `WATERSHED_MAX_CONNECTIONS` | Connection pool size | 5 |
//! | `WATERSHED_OUTPUT_SRID` | Reproject geometries to this SRID | None |
//! | `WATERSHED_PORT` | HTTP server port | 8000 |
//! | `RUST_LOG` | Log level (e.g., "info", "debug") | "info" |
//!
//! ## Endpoints
//!
//! - `GET /watershed_api/watershed/huc/{huc_code}/` - Watershed by HUC-8/10/12 code
//! - `GET /watershed_api/watersheds/basin/{basin_name}/` - Watersheds in a basin
//! - `GET /watershed_api/watersheds/hu12name/{hu_12_name}/` - Watersheds by HUC-12 name
//! - `GET /watershed_api/autocomplete/basin/?q=` - Basin name suggestions
//! - `GET /watershed_api/autocomplete/hu12name/?q=` - HUC-12 name suggestions
//! - `GET /` - Service metadata
//! - `GET /health` - Health check
//! - `GET /docs` - OpenAPI documentation (Swagger UI)

use std::net::SocketAddr;
use std::sync::Arc;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use watershed::StoreBuilder;
use watershed_service::{router, AppState};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "watershed_service=info,watershed=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load port from environment (service-specific config)
    let port: u16 = std::env::var("WATERSHED_PORT")
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(8000);

    // The library handles: DATABASE_URL, WATERSHED_FIXTURE, WATERSHED_TABLE,
    // WATERSHED_MAX_CONNECTIONS, WATERSHED_OUTPUT_SRID
    let builder = StoreBuilder::from_env().inspect_err(|e| {
        tracing::error!(error = %e, "Set DATABASE_URL or WATERSHED_FIXTURE");
    })?;
    let store = builder.build().await?;

    tracing::info!(
        store = %store.describe(),
        port = port,
        "Starting watershed service"
    );

    let app = router(Arc::new(AppState::new(store)));

    // Start server
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = tokio::net::TcpListener::bind(addr).await?;

    tracing::info!("Listening on http://{}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
