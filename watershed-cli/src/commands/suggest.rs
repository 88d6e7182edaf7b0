use anyhow::{bail, Context, Result};
use watershed::{NameField, WatershedStore, MIN_QUERY_CHARS};

pub async fn run(store: &dyn WatershedStore, field: NameField, query: &str) -> Result<()> {
    let query = query.trim();
    if query.chars().count() < MIN_QUERY_CHARS {
        bail!(
            "Query too short. Enter at least {} characters.",
            MIN_QUERY_CHARS
        );
    }

    let suggestions = match field {
        NameField::Basin => store.distinct_basin_names_containing(query).await,
        NameField::Hu12Name => store.distinct_hu12_names_containing(query).await,
    }
    .context("Failed to query suggestions")?;

    for name in &suggestions.names {
        println!("{}", name);
    }

    let hidden = suggestions.total.saturating_sub(suggestions.names.len());
    if hidden > 0 {
        eprintln!("... and {} more", hidden);
    }

    Ok(())
}
