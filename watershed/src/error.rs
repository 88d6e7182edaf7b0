//! Error types for the watershed library.

use thiserror::Error;

/// Errors that can occur when reading watershed data.
#[derive(Error, Debug)]
pub enum WatershedError {
    /// Query or connection failure in the backing database.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// IO error when reading fixture files.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Malformed GeoJSON document.
    #[error("GeoJSON error: {0}")]
    GeoJson(#[from] geojson::Error),

    /// Fixture file is not valid JSON.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Stored geometry could not be parsed as GeoJSON.
    #[error("Invalid geometry for watershed {id}: {source}")]
    InvalidGeometry {
        id: i64,
        #[source]
        source: geojson::Error,
    },

    /// A GeoJSON feature does not describe a watershed.
    #[error("Invalid feature: {message}")]
    InvalidFeature { message: String },

    /// Missing or malformed configuration.
    #[error("Configuration error: {message}")]
    Config { message: String },
}

/// Result type alias using [`WatershedError`].
pub type Result<T> = std::result::Result<T, WatershedError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = WatershedError::InvalidFeature {
            message: "missing id".to_string(),
        };
        assert!(err.to_string().contains("missing id"));

        let err = WatershedError::Config {
            message: "DATABASE_URL not set".to_string(),
        };
        assert!(err.to_string().contains("DATABASE_URL"));

        let err: WatershedError = serde_json::from_str::<serde_json::Value>("{")
            .unwrap_err()
            .into();
        assert!(err.to_string().starts_with("JSON error"));

        let err = WatershedError::Database(sqlx::Error::RowNotFound);
        assert!(err.to_string().starts_with("Database error"));
    }
}
