pub mod batch;
pub mod list;
pub mod lookup;
pub mod suggest;

use anyhow::{bail, Context, Result};
use clap::Args;
use geojson::FeatureCollection;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use watershed::{StoreBuilder, WatershedStore};

/// Options selecting the watershed store, shared by every subcommand.
#[derive(Args)]
pub struct StoreArgs {
    /// PostgreSQL connection string
    #[arg(long, env = "DATABASE_URL", global = true, hide_env_values = true)]
    database_url: Option<String>,

    /// GeoJSON FeatureCollection to query instead of PostgreSQL
    #[arg(short, long, env = "WATERSHED_FIXTURE", global = true)]
    fixture: Option<PathBuf>,

    /// Table holding the watershed polygons
    #[arg(
        long,
        env = "WATERSHED_TABLE",
        default_value = "watersheds",
        global = true
    )]
    table: String,

    /// Connection pool size
    #[arg(long, env = "WATERSHED_MAX_CONNECTIONS", default_value = "5", global = true)]
    max_connections: u32,

    /// Reproject geometries to this SRID
    #[arg(long, env = "WATERSHED_OUTPUT_SRID", global = true)]
    output_srid: Option<i32>,
}

impl StoreArgs {
    /// Open the store selected on the command line.
    pub async fn open(&self) -> Result<Arc<dyn WatershedStore>> {
        let mut builder = match (&self.fixture, &self.database_url) {
            (Some(path), _) => StoreBuilder::fixture(path.clone()),
            (None, Some(url)) => StoreBuilder::postgres(url.as_str()),
            (None, None) => bail!(
                "No watershed store configured. Use --database-url / DATABASE_URL or --fixture / WATERSHED_FIXTURE"
            ),
        };

        builder = builder
            .table(self.table.as_str())
            .max_connections(self.max_connections);
        if let Some(srid) = self.output_srid {
            builder = builder.output_srid(srid);
        }

        builder.build().await.context("Failed to open watershed store")
    }
}

/// Write a FeatureCollection to `output`, or to stdout when `None`.
pub fn write_feature_collection(fc: &FeatureCollection, output: Option<&Path>) -> Result<()> {
    match output {
        Some(path) => {
            let file = File::create(path).context("Failed to create output file")?;
            let mut writer = BufWriter::new(file);
            serde_json::to_writer_pretty(&mut writer, fc)?;
            writer.flush()?;
            eprintln!("Output written to: {}", path.display());
        }
        None => {
            let stdout = std::io::stdout();
            let mut writer = stdout.lock();
            serde_json::to_writer_pretty(&mut writer, fc)?;
            writeln!(writer)?;
        }
    }
    Ok(())
}
