//! sass-bundle CLI - Main entry point

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commands;
mod manifest;

#[derive(Parser)]
#[command(name = "sass-bundle")]
#[command(version)]
#[command(about = "Consolidate SCSS stylesheets into one dependency-ordered file", long_about = None)]
struct Cli {
    /// Show debug output (RUST_LOG takes precedence)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Bundle a stylesheet and everything it imports
    Bundle {
        /// Main SCSS file
        input: PathBuf,

        /// Write output to FILE instead of stdout
        #[arg(short = 'o', long)]
        output: Option<PathBuf>,

        /// Replacement for `~/` in the bundled text
        #[arg(long, default_value = "/")]
        root_uri: String,

        /// Compile the bundle to CSS
        #[arg(long)]
        css: bool,

        /// Produce minified CSS
        #[arg(long, requires = "css")]
        minified: bool,
    },

    /// Print the content hash of the folder holding a stylesheet
    Hash {
        /// Main SCSS file
        input: PathBuf,
    },

    /// Build every bundle listed in a manifest, skipping unchanged ones
    Build {
        /// Manifest listing the bundles to build
        #[arg(short, long, default_value = "sass-bundle.toml")]
        manifest: PathBuf,

        /// Rebuild even when the recorded hash matches
        #[arg(long)]
        force: bool,
    },
}

fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    // Initialize logging
    let default_filter = if cli.verbose {
        "sass_bundle=debug"
    } else {
        "sass_bundle=info"
    };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    match cli.command {
        Commands::Bundle {
            input,
            output,
            root_uri,
            css,
            minified,
        } => commands::bundle::execute(commands::bundle::BundleArgs {
            input,
            output,
            root_uri,
            css,
            minified,
        })
        .map(|()| ExitCode::SUCCESS),
        Commands::Hash { input } => commands::hash::execute(&input),
        Commands::Build { manifest, force } => {
            commands::build::execute(&manifest, force).map(|()| ExitCode::SUCCESS)
        }
    }
}
