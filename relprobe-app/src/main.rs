mod app;
mod cli;
mod surface;

use anyhow::{Context, Result};
use clap::Parser;
use relprobe_experiment::SessionPlan;
use tracing_subscriber::EnvFilter;

use app::App;

/// Installs the global subscriber. `LOG_FORMAT=json` switches to JSON lines;
/// the filter comes from `RUST_LOG` and defaults to `info`.
fn init_tracing() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let format = std::env::var("LOG_FORMAT").unwrap_or_default();
    let result = match format.as_str() {
        "json" => tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .with_current_span(true)
            .try_init(),
        _ => tracing_subscriber::fmt().with_env_filter(filter).try_init(),
    };
    result.map_err(|e| anyhow::anyhow!("tracing init failed: {e}"))
}

fn main() -> Result<()> {
    let args = cli::Args::parse();
    init_tracing()?;

    let mut plan = SessionPlan::from_json_file(&args.plan)
        .with_context(|| format!("loading session plan {}", args.plan.display()))?;
    args.apply_overrides(&mut plan.config);
    let trials = plan.trials().context("validating session plan")?;

    let app = App::new(args, plan.config, trials)?;
    app.run()?;

    Ok(())
}
