use clap::{Parser, Subcommand};
use std::env;
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use menudb_cli::catalog::load_catalog;
use menudb_core::config::{resolve_with_base, Config};
use menudb_core::types::SearchRequest;
use menudb_search::SearchQueryComposer;
use menudb_text::{CatalogIndex, TantivyCatalogSearch};

#[derive(Parser)]
#[command(name = "menudb")]
#[command(about = "Faceted full-text search over a menu catalog")]
#[command(version)]
struct Cli {
    /// Index directory (overrides data.index_dir)
    #[arg(long, global = true)]
    index: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Build a fresh index from catalog JSON files or directories of them
    Index {
        /// Files or directories; defaults to data.catalog_dir
        paths: Vec<PathBuf>,
    },
    /// Search the index
    Search {
        /// Free text; may be empty to browse by tags only
        #[arg(default_value = "")]
        text: String,

        /// Dietary filter: vegan, vegetarian, glutenFree (repeatable)
        #[arg(long = "tag", short = 't')]
        tags: Vec<String>,

        /// Print the composed pipeline before searching
        #[arg(long)]
        explain: bool,

        /// Print results as JSON
        #[arg(long)]
        json: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = Config::load().map_err(|e| { eprintln!("Error loading config: {}", e); e })?;
    let settings = config.settings()?;

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| settings.log.filter.as_str().into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cwd = env::current_dir()?;
    let index_dir = resolve_with_base(&cwd, cli.index.as_deref().unwrap_or(&settings.data.index_dir));

    match cli.command {
        Command::Index { paths } => {
            let paths = if paths.is_empty() { vec![resolve_with_base(&cwd, &settings.data.catalog_dir)] } else { paths };
            let items = load_catalog(&paths)?;
            tracing::info!(index = %index_dir.display(), "building index");
            let index = CatalogIndex::create_in_dir(index_dir.clone())?;
            let count = index.index_items(&items)?;
            println!("Indexed {} of {} items into {}", count, items.len(), index_dir.display());
        }
        Command::Search { text, tags, explain, json } => {
            let backend = TantivyCatalogSearch::open(&index_dir)?;
            let composer = SearchQueryComposer::new(backend).with_max_edits(settings.search.fuzzy_max_edits);
            let request = SearchRequest::new(text, &tags);
            if explain {
                println!("Pipeline:\n{}", composer.compose(&request));
            }
            let results = composer.execute(&request).await?;
            if json {
                println!("{}", serde_json::to_string_pretty(&results)?);
            } else {
                println!("Found {} results", results.len());
                for (i, r) in results.iter().enumerate() {
                    println!("{:>2}. score={:.3} id={} name={} price={:.2}", i + 1, r.score, r.item.id, r.item.name, r.item.price);
                    println!("    {}", r.item.short_desc);
                }
            }
        }
    }
    Ok(())
}
