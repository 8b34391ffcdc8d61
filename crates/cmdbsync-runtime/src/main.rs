//! cmdbsync: CMDB → monitoring-system host inventory sync.
//! Loads snapshots of both systems, runs the reconciliation engine and
//! hands the result to the configured API sink.

use clap::Parser;

mod cli;
mod cmd_check;
mod cmd_plan;
mod cmd_sync;
mod config;
mod context;
mod lock;

fn main() -> anyhow::Result<()> {
    let args = cli::Cli::parse();

    let filter = cli::log_filter(args.debug, args.trace);
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::new(filter))
        .with_writer(std::io::stderr)
        .init();

    match args.command {
        cli::Command::Plan(opts) => cmd_plan::cmd_plan(&opts)?,
        cli::Command::Sync(opts) => cmd_sync::cmd_sync(&opts)?,
        cli::Command::Check(opts) => {
            let exit_code = cmd_check::cmd_check(&opts)?;
            if exit_code != 0 {
                std::process::exit(exit_code);
            }
        }
    }

    Ok(())
}
