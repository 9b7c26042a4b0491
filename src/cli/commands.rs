use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "billsearch", about = "Semantic bill search and categorization")]
pub struct Cli {
    /// Log filter (overrides RUST_LOG), e.g. "debug" or "billsearch=trace"
    #[arg(long, global = true, env = "BILLSEARCH_LOG")]
    pub log_level: Option<String>,
    /// Shorthand for --log-level debug
    #[arg(short, long, global = true)]
    pub verbose: bool,
    /// Disable colored log output
    #[arg(long, global = true)]
    pub no_color: bool,
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Create the vector collection if it does not exist
    Setup {
        /// Drop the existing collection first (deletes all vectors)
        #[arg(long)]
        clear: bool,
    },
    /// Embed every stored bill into the vector collection
    Ingest {
        /// Drop and rebuild vectors even if the collection is populated
        #[arg(long)]
        force_recreate: bool,
        /// Bills fetched per page
        #[arg(long)]
        page_size: Option<usize>,
        /// Also assign categories to every bill after ingesting
        #[arg(long)]
        classify: bool,
        /// Standard deviations above the mean for --classify
        #[arg(long, default_value = "0.5")]
        threshold_std: f64,
    },
    /// Semantic search; prints a JSON array of {id, score, distance}
    Search {
        query: String,
        #[arg(long, default_value = "12")]
        top_k: usize,
        /// Similarity metric (cosine, l2, ip)
        #[arg(long, default_value = "cosine")]
        metric: String,
    },
    /// Classify free text into bill categories
    Classify {
        text: String,
        #[arg(long, default_value = "0.5")]
        threshold_std: f64,
    },
    /// Classify stored bills and save their categories
    Categorize {
        #[arg(long, default_value = "0.5")]
        threshold_std: f64,
        /// Only process this many bills
        #[arg(long)]
        limit: Option<usize>,
        #[arg(long, default_value = "0")]
        offset: usize,
    },
    /// Load bills from a JSON array file
    Import {
        path: String,
    },
    /// Show bill count and collection schema
    Stats,
}
