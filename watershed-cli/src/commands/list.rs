use anyhow::{Context, Result};
use std::path::PathBuf;
use watershed::geojson::to_feature_collection;
use watershed::{NameField, WatershedStore};

use super::write_feature_collection;

pub async fn run(
    store: &dyn WatershedStore,
    field: NameField,
    name: &str,
    output: Option<PathBuf>,
) -> Result<()> {
    let watersheds = store
        .find_by_name_contains(field, name)
        .await
        .context("Failed to query watersheds")?;

    if watersheds.is_empty() {
        eprintln!("No watersheds found with {} matching: {}", field.column(), name);
        return Ok(());
    }

    eprintln!("Found {} watersheds", watersheds.len());
    write_feature_collection(&to_feature_collection(&watersheds), output.as_deref())
}
