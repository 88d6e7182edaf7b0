//! Watershed Service Library
//!
//! HTTP handlers, router and OpenAPI document for the watershed query service.
//! This library is used by both the watershed-service binary and integration tests.

pub mod handlers;

use std::sync::Arc;

use axum::{
    routing::{get, MethodRouter},
    Router,
};
use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;
use watershed::WatershedStore;

/// Application state shared across handlers.
pub struct AppState {
    /// Store serving the watershed table.
    pub store: Arc<dyn WatershedStore>,
}

impl AppState {
    pub fn new(store: Arc<dyn WatershedStore>) -> Self {
        Self { store }
    }
}

/// OpenAPI documentation for the watershed service.
#[derive(OpenApi)]
#[openapi(
    info(
        title = "Watershed Analysis API",
        description = "Read-only queries over USGS HUC-8/10/12 watershed polygons, returned as GeoJSON.",
        license(name = "MIT", url = "https://opensource.org/licenses/MIT")
    ),
    paths(
        handlers::get_watershed_by_huc,
        handlers::get_watersheds_in_basin,
        handlers::get_watersheds_by_hu12_name,
        handlers::autocomplete_basin_names,
        handlers::autocomplete_hu12_names,
        handlers::api_info,
        handlers::health_check,
    ),
    components(
        schemas(
            handlers::Status,
            handlers::WatershedResponse,
            handlers::WatershedListResponse,
            handlers::SuggestionResponse,
            handlers::ErrorResponse,
            handlers::ApiInfoResponse,
            handlers::HealthResponse,
        )
    ),
    tags(
        (name = "watersheds", description = "Watershed lookup endpoints"),
        (name = "autocomplete", description = "Name suggestion endpoints"),
        (name = "system", description = "System and health endpoints")
    )
)]
pub struct ApiDoc;

/// Build the application router.
///
/// Query routes answer both with and without their trailing slash.
pub fn router(state: Arc<AppState>) -> Router {
    let api = [
        (
            "/watershed_api/watershed/huc/:huc_code",
            get(handlers::get_watershed_by_huc),
        ),
        (
            "/watershed_api/watersheds/basin/:basin_name",
            get(handlers::get_watersheds_in_basin),
        ),
        (
            "/watershed_api/watersheds/hu12name/:hu_12_name",
            get(handlers::get_watersheds_by_hu12_name),
        ),
        (
            "/watershed_api/autocomplete/basin",
            get(handlers::autocomplete_basin_names),
        ),
        (
            "/watershed_api/autocomplete/hu12name",
            get(handlers::autocomplete_hu12_names),
        ),
    ]
    .into_iter()
    .fold(Router::new(), |router, (path, handler)| {
        route_with_slash(router, path, handler)
    });

    api.merge(SwaggerUi::new("/docs").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .route("/", get(handlers::api_info))
        .route("/health", get(handlers::health_check))
        .layer(
            ServiceBuilder::new().layer(TraceLayer::new_for_http()).layer(
                CorsLayer::new()
                    .allow_origin(Any)
                    .allow_methods(Any)
                    .allow_headers(Any),
            ),
        )
        .with_state(state)
}

fn route_with_slash(
    router: Router<Arc<AppState>>,
    path: &str,
    handler: MethodRouter<Arc<AppState>>,
) -> Router<Arc<AppState>> {
    router
        .route(path, handler.clone())
        .route(&format!("{}/", path), handler)
}

// Re-export commonly used types for convenience
pub use handlers::{
    ApiInfoResponse, AutocompleteQuery, ErrorResponse, HealthResponse, Status,
    SuggestionResponse, WatershedListResponse, WatershedResponse,
};
