use anyhow::Result;
use clap::Parser;
use std::io;
use tokio::sync::broadcast;
use tracing::{error, info};

use envoy_dash::runtime::{Pollers, RuntimeConfig, load_and_log_config, spawn_shutdown_handler};
use envoy_dash::{CommonArgs, WatchArgs, Watcher, default_config_toml, init_logging, tui};

#[derive(Parser, Debug)]
#[command(author, version, about = "Live dashboard for an Envoy admin endpoint", long_about = None)]
struct Args {
    #[command(flatten)]
    common: CommonArgs,

    #[command(flatten)]
    watch: WatchArgs,

    /// Print the default configuration as TOML and exit
    #[arg(long)]
    print_config: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();

    if args.print_config {
        print!("{}", default_config_toml()?);
        return Ok(());
    }

    let log_buffer = init_logging(args.watch.headless);

    let rt = RuntimeConfig::from_args(args.common.threads).build_runtime()?;
    rt.block_on(run(args, log_buffer))
}

async fn run(args: Args, log_buffer: Option<tui::LogBuffer>) -> Result<()> {
    let (mut config, _source) = load_and_log_config(args.common.config.as_str())?;
    if args.common.has_overrides() {
        args.common.apply(&mut config);
        info!("Applied command-line overrides");
    }
    config.validate()?;

    let pollers = Pollers::from_config(&config)?;
    let updates = pollers.subscribe();

    let (shutdown_tx, _) = broadcast::channel::<()>(1);
    spawn_shutdown_handler(shutdown_tx.clone());

    let handles = if args.watch.headless {
        let handles = pollers.spawn_stats(&shutdown_tx);
        let watcher = Watcher::new(args.watch.fields, args.watch.prefix, pollers.stats_facade());
        if let Err(e) = watcher.run(updates, shutdown_tx.subscribe(), io::stdout()).await {
            error!("Watcher stopped: {}", e);
        }
        // Stdout closed or the watcher failed; stop polling too
        let _ = shutdown_tx.send(());
        handles
    } else {
        let handles = pollers.spawn_all(&shutdown_tx);
        let mut builder = tui::TuiAppBuilder::new(pollers.stats_facade(), pollers.clusters_facade());
        if let Some(log_buffer) = log_buffer {
            builder = builder.with_log_buffer(log_buffer);
        }
        if let Err(e) = tui::run_tui(
            builder.build(),
            updates,
            shutdown_tx.clone(),
            shutdown_tx.subscribe(),
        )
        .await
        {
            error!("TUI error: {}", e);
            let _ = shutdown_tx.send(());
        }
        info!("TUI exited, initiating shutdown");
        handles
    };

    for handle in handles {
        let _ = handle.await;
    }
    info!("Shutdown complete");

    Ok(())
}
