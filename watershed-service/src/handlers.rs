//! HTTP request handlers for the watershed service.
//!
//! Every query endpoint answers with the same envelope:
//! `{status, data, count?, message}` on success or when nothing matched, and
//! `{error}` with a 500 status when the store fails. Store errors are logged
//! here and never forwarded to the client.

use std::collections::BTreeMap;
use std::sync::Arc;

use axum::{
    extract::{
        rejection::{PathRejection, QueryRejection},
        FromRequestParts, State,
    },
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use geojson::Feature;
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use watershed::geojson::{to_feature, to_features};
use watershed::{NameField, WatershedError, MIN_QUERY_CHARS, SUGGESTION_LIMIT};

use crate::AppState;

/// Outcome reported in the response envelope.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum Status {
    Success,
    NotFound,
}

/// Single watershed lookup response.
#[derive(Debug, Serialize, ToSchema)]
pub struct WatershedResponse {
    pub status: Status,
    /// GeoJSON Feature, or null when no watershed matched.
    #[schema(value_type = Option<Object>)]
    pub data: Option<Feature>,
    pub message: String,
}

/// Watershed listing response.
#[derive(Debug, Serialize, ToSchema)]
pub struct WatershedListResponse {
    pub status: Status,
    /// GeoJSON Features, in primary key order.
    #[schema(value_type = Vec<Object>)]
    pub data: Vec<Feature>,
    /// Number of features in `data`.
    pub count: usize,
    pub message: String,
}

/// Autocomplete response.
#[derive(Debug, Serialize, ToSchema)]
pub struct SuggestionResponse {
    pub status: Status,
    /// Distinct matching names, sorted ascending, at most 10.
    pub data: Vec<String>,
    /// Number of distinct matching names before truncation.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub count: Option<usize>,
    pub message: String,
}

/// Query parameters for the autocomplete endpoints.
#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct AutocompleteQuery {
    /// Search text, matched case-insensitively anywhere in the name.
    /// Shorter than 2 characters (after trimming) yields no suggestions.
    #[serde(default)]
    pub q: String,
}

/// Error response.
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorResponse {
    /// Error message.
    pub error: String,
}

/// Path extractor whose failures are answered with an [`ErrorResponse`].
#[derive(FromRequestParts)]
#[from_request(via(axum::extract::Path), rejection(InvalidRequest))]
pub struct Path<T>(pub T);

/// Query extractor whose failures are answered with an [`ErrorResponse`].
#[derive(FromRequestParts)]
#[from_request(via(axum::extract::Query), rejection(InvalidRequest))]
pub struct Query<T>(pub T);

/// Malformed path segment or query string.
#[derive(Debug)]
pub struct InvalidRequest {
    status: StatusCode,
    message: String,
}

impl From<PathRejection> for InvalidRequest {
    fn from(rejection: PathRejection) -> Self {
        Self {
            status: rejection.status(),
            message: rejection.body_text(),
        }
    }
}

impl From<QueryRejection> for InvalidRequest {
    fn from(rejection: QueryRejection) -> Self {
        Self {
            status: rejection.status(),
            message: rejection.body_text(),
        }
    }
}

impl IntoResponse for InvalidRequest {
    fn into_response(self) -> Response {
        tracing::debug!(status = %self.status, message = %self.message, "Rejected request");
        (self.status, Json(ErrorResponse { error: self.message })).into_response()
    }
}

/// Service metadata response.
#[derive(Debug, Serialize, ToSchema)]
pub struct ApiInfoResponse {
    pub message: String,
    pub version: String,
    pub status: String,
    /// Backend serving the watershed table.
    pub database: String,
    /// Endpoint name to URL template.
    pub endpoints: BTreeMap<String, String>,
}

/// Health check response.
#[derive(Debug, Serialize, ToSchema)]
pub struct HealthResponse {
    /// Service status.
    pub status: String,
    /// Service version.
    pub version: String,
}

/// Get a watershed by HUC code.
///
/// The code is compared for equality against the HUC-8, HUC-10 and HUC-12
/// columns in a single query. When several rows match, the one with the
/// lowest id is returned.
///
/// # Returns
///
/// - `200 OK` with the watershed as a GeoJSON Feature
/// - `404 Not Found` with `data: null` if no watershed has this code
/// - `500 Internal Server Error` on storage failure
#[utoipa::path(
    get,
    path = "/watershed_api/watershed/huc/{huc_code}/",
    tag = "watersheds",
    params(("huc_code" = String, Path, description = "HUC-8, HUC-10 or HUC-12 code")),
    responses(
        (status = 200, description = "Watershed found", body = WatershedResponse),
        (status = 404, description = "No watershed with this code", body = WatershedResponse),
        (status = 500, description = "Storage failure", body = ErrorResponse)
    )
)]
#[axum::debug_handler]
pub async fn get_watershed_by_huc(
    State(state): State<Arc<AppState>>,
    Path(huc_code): Path<String>,
) -> Response {
    tracing::debug!(huc_code = %huc_code, "HUC lookup");

    match state.store.find_by_any_huc(&huc_code).await {
        Ok(Some(watershed)) => {
            tracing::info!(huc_code = %huc_code, id = watershed.id, "Watershed found");
            (
                StatusCode::OK,
                Json(WatershedResponse {
                    status: Status::Success,
                    message: format!("Found watershed: {}", watershed.display_name()),
                    data: Some(to_feature(&watershed)),
                }),
            )
                .into_response()
        }
        Ok(None) => (
            StatusCode::NOT_FOUND,
            Json(WatershedResponse {
                status: Status::NotFound,
                data: None,
                message: format!("No watershed found with HUC code: {}", huc_code),
            }),
        )
            .into_response(),
        Err(e) => internal_error(
            e,
            "Internal server error occurred while finding watershed",
        ),
    }
}

/// Get all watersheds whose basin name contains the given text.
///
/// Matching is case-insensitive against `dwq_basin`.
#[utoipa::path(
    get,
    path = "/watershed_api/watersheds/basin/{basin_name}/",
    tag = "watersheds",
    params(("basin_name" = String, Path, description = "Text contained in the basin name")),
    responses(
        (status = 200, description = "Watersheds found", body = WatershedListResponse),
        (status = 404, description = "No watershed in this basin", body = WatershedListResponse),
        (status = 500, description = "Storage failure", body = ErrorResponse)
    )
)]
pub async fn get_watersheds_in_basin(
    State(state): State<Arc<AppState>>,
    Path(basin_name): Path<String>,
) -> Response {
    tracing::debug!(basin_name = %basin_name, "Basin search");

    match state.store.find_by_basin_contains(&basin_name).await {
        Ok(watersheds) if !watersheds.is_empty() => list_response(
            to_features(&watersheds),
            |count| format!("Found {} watersheds in {} basin", count, basin_name),
        ),
        Ok(_) => list_not_found(format!("No watersheds found in {} basin", basin_name)),
        Err(e) => internal_error(
            e,
            "Internal server error occurred while finding watersheds",
        ),
    }
}

/// Get all watersheds whose HUC-12 name contains the given text.
///
/// Matching is case-insensitive against `hu_12_name`.
#[utoipa::path(
    get,
    path = "/watershed_api/watersheds/hu12name/{hu_12_name}/",
    tag = "watersheds",
    params(("hu_12_name" = String, Path, description = "Text contained in the HUC-12 name")),
    responses(
        (status = 200, description = "Watersheds found", body = WatershedListResponse),
        (status = 404, description = "No watershed with this name", body = WatershedListResponse),
        (status = 500, description = "Storage failure", body = ErrorResponse)
    )
)]
pub async fn get_watersheds_by_hu12_name(
    State(state): State<Arc<AppState>>,
    Path(hu_12_name): Path<String>,
) -> Response {
    tracing::debug!(hu_12_name = %hu_12_name, "HUC-12 name search");

    match state.store.find_by_hu12name_contains(&hu_12_name).await {
        Ok(watersheds) if !watersheds.is_empty() => list_response(
            to_features(&watersheds),
            |count| format!("Found {} watersheds matching HUC-12 name: {}", count, hu_12_name),
        ),
        Ok(_) => list_not_found(format!(
            "No watersheds found matching HUC-12 name: {}",
            hu_12_name
        )),
        Err(e) => internal_error(
            e,
            "Internal server error occurred while finding watersheds by HUC-12 name",
        ),
    }
}

/// Autocomplete basin names.
#[utoipa::path(
    get,
    path = "/watershed_api/autocomplete/basin/",
    tag = "autocomplete",
    params(AutocompleteQuery),
    responses(
        (status = 200, description = "Suggestions (possibly empty)", body = SuggestionResponse),
        (status = 500, description = "Storage failure", body = ErrorResponse)
    )
)]
pub async fn autocomplete_basin_names(
    State(state): State<Arc<AppState>>,
    Query(query): Query<AutocompleteQuery>,
) -> Response {
    autocomplete(
        &state,
        NameField::Basin,
        &query.q,
        "basin names",
        "Internal server error occurred during basin autocomplete",
    )
    .await
}

/// Autocomplete HUC-12 names.
#[utoipa::path(
    get,
    path = "/watershed_api/autocomplete/hu12name/",
    tag = "autocomplete",
    params(AutocompleteQuery),
    responses(
        (status = 200, description = "Suggestions (possibly empty)", body = SuggestionResponse),
        (status = 500, description = "Storage failure", body = ErrorResponse)
    )
)]
pub async fn autocomplete_hu12_names(
    State(state): State<Arc<AppState>>,
    Query(query): Query<AutocompleteQuery>,
) -> Response {
    autocomplete(
        &state,
        NameField::Hu12Name,
        &query.q,
        "HUC-12 names",
        "Internal server error occurred during HUC-12 name autocomplete",
    )
    .await
}

async fn autocomplete(
    state: &AppState,
    field: NameField,
    raw_query: &str,
    label: &str,
    error_message: &str,
) -> Response {
    let query = raw_query.trim();

    if query.chars().count() < MIN_QUERY_CHARS {
        return (
            StatusCode::OK,
            Json(SuggestionResponse {
                status: Status::Success,
                data: Vec::new(),
                count: None,
                message: format!(
                    "Query too short. Enter at least {} characters.",
                    MIN_QUERY_CHARS
                ),
            }),
        )
            .into_response();
    }

    match state
        .store
        .distinct_names_containing(field, query, SUGGESTION_LIMIT)
        .await
    {
        Ok(mut suggestions) => {
            suggestions.names.truncate(SUGGESTION_LIMIT);
            tracing::debug!(
                column = field.column(),
                query = query,
                total = suggestions.total,
                "Autocomplete"
            );
            (
                StatusCode::OK,
                Json(SuggestionResponse {
                    status: Status::Success,
                    message: format!(
                        "Found {} {} matching \"{}\"",
                        suggestions.total, label, query
                    ),
                    count: Some(suggestions.total),
                    data: suggestions.names,
                }),
            )
                .into_response()
        }
        Err(e) => internal_error(e, error_message),
    }
}

fn list_response(features: Vec<Feature>, message: impl FnOnce(usize) -> String) -> Response {
    let count = features.len();
    tracing::info!(count = count, "Watersheds found");
    (
        StatusCode::OK,
        Json(WatershedListResponse {
            status: Status::Success,
            data: features,
            count,
            message: message(count),
        }),
    )
        .into_response()
}

fn list_not_found(message: String) -> Response {
    (
        StatusCode::NOT_FOUND,
        Json(WatershedListResponse {
            status: Status::NotFound,
            data: Vec::new(),
            count: 0,
            message,
        }),
    )
        .into_response()
}

/// Log a store failure and answer with a generic 500.
fn internal_error(e: WatershedError, message: &str) -> Response {
    tracing::error!(error = %e, "{}", message);

    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(ErrorResponse {
            error: message.to_string(),
        }),
    )
        .into_response()
}

/// Service metadata.
///
/// Returns the service name, version, backend description and the URL
/// templates of the query endpoints.
#[utoipa::path(
    get,
    path = "/",
    tag = "system",
    responses((status = 200, description = "Service metadata", body = ApiInfoResponse))
)]
pub async fn api_info(State(state): State<Arc<AppState>>) -> Json<ApiInfoResponse> {
    let endpoints = [
        ("get_by_huc", "/watershed_api/watershed/huc/{huc_code}/"),
        ("get_by_basin", "/watershed_api/watersheds/basin/{basin_name}/"),
        ("get_by_hu12name", "/watershed_api/watersheds/hu12name/{hu12_name}/"),
        ("autocomplete_basin", "/watershed_api/autocomplete/basin/?q={query}"),
        ("autocomplete_hu12name", "/watershed_api/autocomplete/hu12name/?q={query}"),
    ]
    .into_iter()
    .map(|(name, path)| (name.to_string(), path.to_string()))
    .collect();

    Json(ApiInfoResponse {
        message: "Watershed Analysis API".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        status: "running".to_string(),
        database: state.store.describe(),
        endpoints,
    })
}

/// Health check endpoint.
///
/// Returns `200` with service status and version when the store answers,
/// `503` otherwise.
#[utoipa::path(
    get,
    path = "/health",
    tag = "system",
    responses(
        (status = 200, description = "Store reachable", body = HealthResponse),
        (status = 503, description = "Store unreachable", body = ErrorResponse)
    )
)]
pub async fn health_check(State(state): State<Arc<AppState>>) -> Response {
    match state.store.ping().await {
        Ok(()) => Json(HealthResponse {
            status: "healthy".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        })
        .into_response(),
        Err(e) => {
            tracing::warn!(error = %e, "Health check failed");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(ErrorResponse {
                    error: "Watershed store unavailable".to_string(),
                }),
            )
                .into_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_autocomplete_query_deserialize() {
        let query: AutocompleteQuery = serde_json::from_str(r#"{"q": "bear"}"#).unwrap();
        assert_eq!(query.q, "bear");

        let query: AutocompleteQuery = serde_json::from_str("{}").unwrap();
        assert_eq!(query.q, "");
    }

    #[test]
    fn test_status_serialize() {
        assert_eq!(serde_json::to_string(&Status::Success).unwrap(), r#""success""#);
        assert_eq!(serde_json::to_string(&Status::NotFound).unwrap(), r#""not_found""#);
    }

    #[test]
    fn test_not_found_response_has_null_data() {
        let response = WatershedResponse {
            status: Status::NotFound,
            data: None,
            message: "No watershed found with HUC code: 1".to_string(),
        };
        let json = serde_json::to_value(&response).unwrap();
        assert!(json["data"].is_null());
        assert_eq!(json["status"], "not_found");
        assert!(json.get("count").is_none());
    }

    #[test]
    fn test_short_query_response_omits_count() {
        let response = SuggestionResponse {
            status: Status::Success,
            data: Vec::new(),
            count: None,
            message: "Query too short. Enter at least 2 characters.".to_string(),
        };
        let json = serde_json::to_string(&response).unwrap();
        assert!(!json.contains("count"));
        assert!(json.contains(r#""data":[]"#));
    }

    #[test]
    fn test_invalid_request_response() {
        let response = InvalidRequest {
            status: StatusCode::BAD_REQUEST,
            message: "Failed to deserialize query string".to_string(),
        }
        .into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            response.headers()[axum::http::header::CONTENT_TYPE],
            "application/json"
        );
    }

    #[test]
    fn test_error_response_serialize() {
        let response = ErrorResponse {
            error: "Internal server error occurred while finding watershed".to_string(),
        };
        let json = serde_json::to_string(&response).unwrap();
        assert!(json.contains("Internal server error"));
    }
}
