use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use watershed::NameField;

mod commands;

use commands::StoreArgs;

/// HUC watershed query CLI tool
#[derive(Parser)]
#[command(name = "watershed")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(flatten)]
    store: StoreArgs,

    #[command(subcommand)]
    command: Commands,
}

/// Name column to search.
#[derive(Clone, Copy, ValueEnum)]
enum NameArg {
    /// Basin name (dwq_basin)
    Basin,
    /// HUC-12 watershed name
    Hu12name,
}

impl From<NameArg> for NameField {
    fn from(arg: NameArg) -> Self {
        match arg {
            NameArg::Basin => NameField::Basin,
            NameArg::Hu12name => NameField::Hu12Name,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Look up a watershed by HUC-8, HUC-10 or HUC-12 code
    Huc {
        /// Hydrologic unit code
        code: String,

        /// Output the watershed as a GeoJSON Feature
        #[arg(short, long)]
        json: bool,
    },

    /// List watersheds whose basin name contains the given text
    Basin {
        /// Text to search for (case-insensitive)
        name: String,

        /// Output file (GeoJSON FeatureCollection); stdout if not specified
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// List watersheds whose HUC-12 name contains the given text
    Hu12name {
        /// Text to search for (case-insensitive)
        name: String,

        /// Output file (GeoJSON FeatureCollection); stdout if not specified
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Suggest basin or HUC-12 names containing the given text
    Suggest {
        /// Column to search
        #[arg(value_enum)]
        field: NameArg,

        /// Text to search for (at least 2 characters)
        query: String,
    },

    /// Resolve a CSV column of HUC codes into a GeoJSON FeatureCollection
    Batch {
        /// Input CSV file
        input: PathBuf,

        /// Output file (defaults to <input>_watersheds.geojson)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Column holding the HUC codes
        #[arg(long, default_value = "huc")]
        column: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let store = cli.store.open().await?;

    match cli.command {
        Commands::Huc { code, json } => commands::lookup::run(store.as_ref(), &code, json).await,
        Commands::Basin { name, output } => {
            commands::list::run(store.as_ref(), NameField::Basin, &name, output).await
        }
        Commands::Hu12name { name, output } => {
            commands::list::run(store.as_ref(), NameField::Hu12Name, &name, output).await
        }
        Commands::Suggest { field, query } => {
            commands::suggest::run(store.as_ref(), field.into(), &query).await
        }
        Commands::Batch {
            input,
            output,
            column,
        } => commands::batch::run(store.as_ref(), input, output, &column).await,
    }
}
