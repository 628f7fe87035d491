//! Settlement simulator entry point: CLI wiring, run, and exports.

mod cli;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;

use coop_sim::io::export::{export_history_csv, export_log};
use coop_sim::runner::run_scenario;

use crate::cli::Args;

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .without_time()
        .compact()
        .init();

    let args = Args::parse();
    let scenario = args.scenario()?;
    let result = run_scenario(&scenario).context("simulation failed")?;

    for step in &result.steps {
        println!("{step}");
    }
    println!();
    println!("{}", result.summary);

    if let Some(path) = &args.log_out {
        export_log(&result.logs, path)
            .with_context(|| format!("failed to write settlement log to {}", path.display()))?;
        info!(path = %path.display(), blocks = result.logs.len(), "settlement log written");
    }
    if let Some(path) = &args.history_out {
        export_history_csv(&result.history, path)
            .with_context(|| format!("failed to write history to {}", path.display()))?;
        info!(path = %path.display(), rows = result.history.len(), "history exported");
    }

    #[cfg(feature = "api")]
    if args.serve {
        use std::net::SocketAddr;
        use std::sync::Arc;

        let state = Arc::new(coop_sim::api::AppState::from(result));
        let addr = SocketAddr::from(([127, 0, 0, 1], args.port));
        let rt = tokio::runtime::Runtime::new().context("failed to create tokio runtime")?;
        rt.block_on(coop_sim::api::serve(state, addr))
            .with_context(|| format!("API server on {addr} failed"))?;
    }

    Ok(())
}
