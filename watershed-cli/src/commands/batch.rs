use anyhow::{Context, Result};
use indicatif::{ProgressBar, ProgressStyle};
use std::collections::HashSet;
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use watershed::geojson::to_feature_collection;
use watershed::{Watershed, WatershedStore};

use super::write_feature_collection;

pub async fn run(
    store: &dyn WatershedStore,
    input: PathBuf,
    output: Option<PathBuf>,
    column: &str,
) -> Result<()> {
    let codes = read_codes(&input, column)?;

    let pb = ProgressBar::new(codes.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template(
                "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({eta})",
            )?
            .progress_chars("#>-"),
    );

    let resolution = resolve_codes(store, &codes, || pb.inc(1)).await?;
    pb.finish_with_message("done");

    let output_path = output.unwrap_or_else(|| default_output(&input));
    write_feature_collection(
        &to_feature_collection(&resolution.watersheds),
        Some(&output_path),
    )?;

    println!(
        "Resolved {} of {} codes into {} watersheds",
        codes.len() - resolution.unresolved.len(),
        codes.len(),
        resolution.watersheds.len()
    );
    if !resolution.unresolved.is_empty() {
        eprintln!("Unresolved codes: {}", resolution.unresolved.join(", "));
    }

    Ok(())
}

/// Outcome of resolving a list of HUC codes.
#[derive(Debug, Default)]
pub struct Resolution {
    /// Matched watersheds in input order, each listed once.
    pub watersheds: Vec<Watershed>,
    /// Codes that matched no watershed.
    pub unresolved: Vec<String>,
}

/// Resolve each code, calling `on_progress` after every lookup.
pub async fn resolve_codes(
    store: &dyn WatershedStore,
    codes: &[String],
    mut on_progress: impl FnMut(),
) -> Result<Resolution> {
    let mut seen = HashSet::new();
    let mut resolution = Resolution::default();

    for code in codes {
        let found = store
            .find_by_any_huc(code)
            .await
            .with_context(|| format!("Failed to look up HUC code {}", code))?;

        match found {
            Some(watershed) => {
                if seen.insert(watershed.id) {
                    resolution.watersheds.push(watershed);
                }
            }
            None => resolution.unresolved.push(code.clone()),
        }
        on_progress();
    }

    Ok(resolution)
}

/// Read the non-empty values of `column` from a CSV file.
pub fn read_codes(input: &Path, column: &str) -> Result<Vec<String>> {
    let file = File::open(input).context("Failed to open input file")?;
    let mut reader = csv::Reader::from_reader(BufReader::new(file));

    let headers = reader.headers()?.clone();
    let idx = headers
        .iter()
        .position(|h| h == column)
        .with_context(|| format!("Column '{}' not found in CSV", column))?;

    let mut codes = Vec::new();
    for record in reader.records() {
        let record = record?;
        if let Some(code) = record.get(idx).map(str::trim).filter(|c| !c.is_empty()) {
            codes.push(code.to_string());
        }
    }

    Ok(codes)
}

fn default_output(input: &Path) -> PathBuf {
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "codes".to_string());
    input.with_file_name(format!("{}_watersheds.geojson", stem))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::TempDir;
    use watershed::MemoryStore;

    fn write_csv(dir: &Path, contents: &str) -> PathBuf {
        let path = dir.join("codes.csv");
        let mut file = File::create(&path).unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        path
    }

    #[test]
    fn test_read_codes() {
        let temp_dir = TempDir::new().unwrap();
        let path = write_csv(
            temp_dir.path(),
            "site,huc\nA,160202040301\nB, 16020204 \nC,\n",
        );

        let codes = read_codes(&path, "huc").unwrap();
        assert_eq!(codes, vec!["160202040301", "16020204"]);
    }

    #[test]
    fn test_read_codes_missing_column() {
        let temp_dir = TempDir::new().unwrap();
        let path = write_csv(temp_dir.path(), "site,code\nA,1\n");

        let err = read_codes(&path, "huc").unwrap_err();
        assert!(err.to_string().contains("huc"));
    }

    #[test]
    fn test_default_output() {
        let output = default_output(Path::new("/data/codes.csv"));
        assert_eq!(output, PathBuf::from("/data/codes_watersheds.geojson"));
    }

    #[tokio::test]
    async fn test_resolve_codes_dedupes_and_reports_misses() {
        let store = MemoryStore::new(vec![Watershed {
            id: 4,
            huc_8: Some("16020204".to_string()),
            huc_12: Some("160202040301".to_string()),
            ..Default::default()
        }]);
        let codes: Vec<String> = ["160202040301", "16020204", "99999999"]
            .iter()
            .map(|c| c.to_string())
            .collect();

        let mut calls = 0;
        let resolution = resolve_codes(&store, &codes, || calls += 1).await.unwrap();

        assert_eq!(calls, 3);
        assert_eq!(resolution.watersheds.len(), 1);
        assert_eq!(resolution.unresolved, vec!["99999999"]);
    }
}
