use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// CLI for inspecting the catalog and exercising selections
#[derive(Parser)]
#[command(name = "genreview")]
#[command(about = "Resolve route segments and categories to catalog fetches", long_about = None)]
pub struct Cli {
    /// Path to a config.toml
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// List sections and the route segments that reach them
    Sections,
    /// List categories reachable from a route segment
    Categories {
        /// Route segment, e.g. browse, movies, tvseries, popular
        segment: String,
    },
    /// Select a category and dispatch its fetch
    Select {
        segment: String,
        category: String,
        #[arg(short, long, default_value_t = 1)]
        page: u32,
        /// Print the request without fetching it
        #[arg(long)]
        dry_run: bool,
    },
}
