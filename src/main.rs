use billsearch::application::categorize::Selection;
use billsearch::cli::commands::{Cli, Commands};
use billsearch::config::AppConfig;
use billsearch::domain::entities::bill::BillDocument;
use billsearch::domain::values::metric::Metric;
use billsearch::logging::init_logging;
use billsearch::BillSearch;
use clap::Parser;
use serde::Serialize;
use tracing::error;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    let level = if cli.verbose { Some("debug") } else { cli.log_level.as_deref() };
    if let Err(e) = init_logging(level, cli.no_color) {
        eprintln!("{e}");
    }

    // Search keeps stdout machine-readable even when setup fails.
    let is_search = matches!(cli.command, Commands::Search { .. });

    let mut config = match AppConfig::from_env() {
        Ok(c) => c,
        Err(e) => fail(is_search, format!("Invalid configuration: {e}")),
    };
    if let Commands::Ingest { page_size: Some(n), .. } = &cli.command {
        config.page_size = *n;
    }

    let app = match BillSearch::new(config) {
        Ok(app) => app,
        Err(e) => fail(is_search, format!("Error initializing billsearch: {e}")),
    };

    let result = run_command(&app, cli.command).await;
    app.close();
    if let Err(e) = result {
        fail(is_search, format!("Error: {e}"));
    }
}

fn fail(print_empty: bool, message: String) -> ! {
    error!("{message}");
    if print_empty {
        println!("[]");
        std::process::exit(0);
    }
    std::process::exit(1);
}

fn print_json<T: Serialize>(value: &T) -> Result<(), serde_json::Error> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

async fn run_command(app: &BillSearch, cmd: Commands) -> Result<(), Box<dyn std::error::Error>> {
    match cmd {
        Commands::Setup { clear } => {
            let schema = app.setup(clear)?;
            print_json(&schema)?;
        }
        Commands::Ingest {
            force_recreate,
            classify,
            threshold_std,
            ..
        } => {
            let summary = app
                .ingest_with_categories(force_recreate, classify.then_some(threshold_std))
                .await?;
            print_json(&summary)?;
        }
        Commands::Search { query, top_k, metric } => {
            let metric: Metric = metric.parse().map_err(|e: String| e)?;
            let outcome = app.search(&query, top_k, metric).await;
            print_json(&outcome.results)?;
        }
        Commands::Classify { text, threshold_std } => {
            let classification = app.classify(&text, threshold_std).await?;
            print_json(&classification.labels)?;
        }
        Commands::Categorize {
            threshold_std,
            limit,
            offset,
        } => {
            let selection = match limit {
                Some(limit) => Selection::Page { limit, offset },
                None => Selection::All { offset },
            };
            let report = app.categorize(threshold_std, selection).await?;
            print_json(&report)?;
        }
        Commands::Import { path } => {
            let raw = std::fs::read_to_string(&path)?;
            let bills: Vec<BillDocument> = serde_json::from_str(&raw)?;
            let count = app.import_bills(&bills)?;
            print_json(&serde_json::json!({ "imported": count }))?;
        }
        Commands::Stats => {
            let stats = app.stats()?;
            print_json(&stats)?;
        }
    }
    Ok(())
}
