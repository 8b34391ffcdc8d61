//! CLI definition using clap derive.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use cmdbsync_core::DEFAULT_GROUP_PREFIX;

#[derive(Parser)]
#[command(
    name = "cmdbsync",
    about = "Keep monitoring-system hosts in sync with the CMDB"
)]
pub struct Cli {
    /// Log at debug level (overrides CMDBSYNC_LOG)
    #[arg(long, global = true)]
    pub debug: bool,

    /// Log at trace level (overrides --debug)
    #[arg(long, global = true)]
    pub trace: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Run one pass and print the plan as JSON
    Plan(PlanOpts),
    /// Create missing groups, then create and update hosts
    Sync(SyncOpts),
    /// Report data-quality warnings and skipped records
    Check(CheckOpts),
}

/// Snapshot inputs and engine settings shared by every command.
#[derive(clap::Args, Debug, Clone)]
pub struct SnapshotArgs {
    /// CMDB snapshot (records + locations)
    #[arg(long, env = "CMDBSYNC_CMDB")]
    pub cmdb: PathBuf,

    /// Monitoring snapshot (hosts, groups, templates, proxies)
    #[arg(long, env = "CMDBSYNC_MONITORING")]
    pub monitoring: PathBuf,

    /// Group id attached to every synced host
    #[arg(long, env = "CMDBSYNC_EXPORT_GROUP")]
    pub export_group: String,

    /// Prefix of category group names
    #[arg(long, env = "CMDBSYNC_GROUP_PREFIX", default_value = DEFAULT_GROUP_PREFIX)]
    pub group_prefix: String,

    /// JSON category policy table
    #[arg(long, env = "CMDBSYNC_POLICY")]
    pub policy: Option<PathBuf>,
}

#[derive(clap::Args)]
pub struct PlanOpts {
    #[command(flatten)]
    pub snapshot: SnapshotArgs,

    /// Pretty-print the plan
    #[arg(long)]
    pub pretty: bool,
}

#[derive(clap::Args)]
pub struct SyncOpts {
    #[command(flatten)]
    pub snapshot: SnapshotArgs,

    /// Log requests instead of exporting them
    #[arg(long)]
    pub dry_run: bool,

    /// Write JSON-RPC requests here, one per line (default: stdout)
    #[arg(long, env = "CMDBSYNC_REQUESTS_OUT")]
    pub requests_out: Option<PathBuf>,

    /// Single-run lock file (default: $XDG_RUNTIME_DIR/cmdbsync.lock)
    #[arg(long, env = "CMDBSYNC_LOCK_FILE")]
    pub lock_file: Option<PathBuf>,
}

#[derive(clap::Args)]
pub struct CheckOpts {
    #[command(flatten)]
    pub snapshot: SnapshotArgs,
}

/// Default lock path using $USER for per-user isolation.
pub fn default_lock_path() -> PathBuf {
    if let Ok(dir) = std::env::var("XDG_RUNTIME_DIR") {
        return PathBuf::from(dir).join("cmdbsync.lock");
    }
    let user = std::env::var("USER").unwrap_or_else(|_| "unknown".to_string());
    PathBuf::from(format!("/tmp/cmdbsync-{user}.lock"))
}

/// Log filter: `--trace`, then `--debug`, then CMDBSYNC_LOG, RUST_LOG, `info`.
pub fn log_filter(debug: bool, trace: bool) -> String {
    if trace {
        return "trace".to_string();
    }
    if debug {
        return "debug".to_string();
    }
    std::env::var("CMDBSYNC_LOG")
        .or_else(|_| std::env::var("RUST_LOG"))
        .unwrap_or_else(|_| "info".to_string())
}
