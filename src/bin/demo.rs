//! Demo runner: evaluates representative queries against the synthetic store
//! and prints the results as JSON or CSV.

use clap::Parser;
use tracing_subscriber::EnvFilter;

use netquery::export::{grouped_to_csv, time_series_to_csv};
use netquery::{QueryDescriptor, QueryEvaluator, SyntheticStore};

#[derive(Parser, Debug)]
#[command(name = "netquery-demo", about = "Run ad-hoc telemetry queries against a synthetic store")]
struct Args {
    /// Data source to query
    #[arg(long, default_value = "network-flows")]
    source: String,

    /// Metrics to visualize (repeatable)
    #[arg(long = "metric", default_values_t = vec!["COUNT".to_string(), "AVG(latency)".to_string()])]
    metrics: Vec<String>,

    /// Filter conditions, e.g. 'protocol = "TCP"' (repeatable)
    #[arg(long = "filter")]
    filters: Vec<String>,

    /// Group results by a record field instead of time bucketing
    #[arg(long)]
    group_by: Option<String>,

    /// Sort clause for grouped rows, e.g. "COUNT DESC"
    #[arg(long)]
    order_by: Option<String>,

    /// Maximum grouped rows returned
    #[arg(long, default_value_t = 1000)]
    limit: usize,

    /// Relative time range token
    #[arg(long, default_value = "last_24h")]
    range: String,

    /// Seed for the synthetic store, for reproducible output
    #[arg(long)]
    seed: Option<u64>,

    /// Emit CSV instead of JSON
    #[arg(long)]
    csv: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let args = Args::parse();

    let mut descriptor =
        QueryDescriptor::new(args.source, args.metrics, args.range).with_limit(args.limit);
    descriptor.filters = args.filters;
    descriptor.group_by = args.group_by;
    descriptor.order_by = args.order_by;
    descriptor.validate()?;

    let store = match args.seed {
        Some(seed) => SyntheticStore::with_seed(seed),
        None => SyntheticStore::new(),
    };
    let result = QueryEvaluator::new().evaluate(&descriptor, &store).await?;

    if args.csv {
        if result.grouped_data.is_empty() {
            print!("{}", time_series_to_csv(&result.time_series_data));
        } else {
            print!("{}", grouped_to_csv(&result.grouped_data));
        }
    } else {
        println!("{}", serde_json::to_string_pretty(&result)?);
    }

    Ok(())
}
