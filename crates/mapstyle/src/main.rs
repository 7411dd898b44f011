//! mapstyle CLI - Main entry point

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commands;

#[derive(Parser)]
#[command(name = "mapstyle")]
#[command(version)]
#[command(about = "Build Mapbox GL styles from layer instructions", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build a style document from a JSON build request
    Build {
        /// Request file (reads stdin when omitted or '-')
        file: Option<String>,

        /// TOML engine configuration
        #[arg(short, long)]
        config: Option<String>,

        /// Write output to FILE instead of stdout
        #[arg(short, long)]
        output: Option<String>,

        /// Emit compact JSON
        #[arg(long)]
        compact: bool,

        /// Print only the style document, without corrections
        #[arg(long)]
        document_only: bool,
    },

    /// List the layer templates of the built-in registry
    Templates {
        /// Emit the registry as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show the attributes of a source layer
    Attributes {
        /// Source layer name (lists all source layers when omitted)
        source_layer: Option<String>,
    },
}

fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "mapstyle=info,mapstyle_core=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Build {
            file,
            config,
            output,
            compact,
            document_only,
        } => commands::build::execute(commands::build::BuildArgs {
            file,
            config,
            output,
            compact,
            document_only,
        }),
        Commands::Templates { json } => commands::templates::execute(json),
        Commands::Attributes { source_layer } => {
            commands::attributes::execute(source_layer.as_deref())
        }
    }
}
