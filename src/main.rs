mod cli;

use std::sync::Arc;

use anyhow::{anyhow, Result};
use clap::Parser;
use serde_json::Value;
use tracing_subscriber::EnvFilter;

use cli::{Cli, Commands};
use genreview::prelude::*;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("genreview=info")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let cfg = Config::resolve(cli.config.as_deref())?;

    match cli.command {
        Commands::Sections => {
            for section in Section::ALL {
                println!("{:<8} {}", section.as_str(), section.segments().join(", "));
            }
        }
        Commands::Categories { segment } => {
            let catalog = cfg.catalog()?;
            let set = catalog
                .set_for_segment(&segment)
                .ok_or_else(|| anyhow!(SelectError::UnknownSection { segment: segment.clone() }))?;
            for entry in set.entries() {
                println!("{:<24} {}", entry.name, entry.url);
            }
        }
        Commands::Select { segment, category, page, dry_run } => {
            if dry_run {
                let mut selector = CategorySelector::new(Arc::new(cfg.catalog()?), PrintDispatch);
                let entry = selector.select(&segment, &category, page)?;
                println!("selected {} ({})", entry.name, entry.action);
                return Ok(());
            }

            let app = Genreview::from_config(&cfg)?;
            let mut selector = app.selector();
            let entry = selector.select(&segment, &category, page)?.clone();
            println!("selected {} ({})", entry.name, entry.action);

            app.settle().await;
            match app.store().latest(entry.action) {
                Some(FetchOutcome { result: Ok(body), .. }) => print_summary(&body),
                Some(FetchOutcome { result: Err(e), .. }) => return Err(anyhow!("fetch failed: {e}")),
                None => println!("no result recorded"),
            }
        }
    }
    Ok(())
}

struct PrintDispatch;

impl Dispatch for PrintDispatch {
    fn dispatch(&self, action: FetchAction) { println!("would fetch {} ({})", action.url, action.id); }
}

fn print_summary(body: &Value) {
    let Some(results) = body.get("results").and_then(Value::as_array) else {
        println!("{body}");
        return;
    };
    let page = body.get("page").and_then(Value::as_u64).unwrap_or_default();
    let total = body.get("total_pages").and_then(Value::as_u64).unwrap_or_default();
    println!("page {page}/{total}, {} results", results.len());
    for item in results {
        let title = item.get("title").or_else(|| item.get("name")).and_then(Value::as_str).unwrap_or("<untitled>");
        println!("  {title}");
    }
}
