mod engine;
mod ingest;
mod models;
mod run;
mod store;
mod workflow;

use anyhow::{Context, Result};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

fn main() -> Result<()> {
    init_tracing();

    let args: Vec<String> = std::env::args().collect();
    let db_path = get_db_path()?;
    let store = store::Store::open(&db_path)?;

    if args.len() < 2 {
        run::print_usage();
        return Ok(());
    }
    run::as_cli(&args, &store)
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn get_db_path() -> Result<std::path::PathBuf> {
    let proj_dirs = directories::ProjectDirs::from("ph", "skcouncil", "SKBudget")
        .ok_or_else(|| anyhow::anyhow!("Could not determine data directory"))?;
    let data_dir = proj_dirs.data_dir();
    std::fs::create_dir_all(data_dir)
        .with_context(|| format!("Failed to create data directory: {}", data_dir.display()))?;
    Ok(data_dir.join("skbudget.db"))
}
