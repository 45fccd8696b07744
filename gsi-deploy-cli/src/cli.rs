use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Default location of the plan file handed from `extract` to `reconcile`
pub const DEFAULT_PLAN_FILE: &str = "gsi-plan.json";

#[derive(Parser)]
#[command(
    name = "gsi-deploy",
    about = "Deploy DynamoDB global secondary indexes one at a time",
    version
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose output
    #[arg(long, short = 'v', global = true, conflicts_with = "quiet")]
    pub verbose: bool,

    /// Suppress non-essential output
    #[arg(long, short = 'q', global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Disable colored output (also respects NO_COLOR env var)
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Path to config file (defaults to ./gsi-deploy.toml when present)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Remove global secondary indexes from a template and save them as a plan
    Extract {
        /// Resolved JSON template
        template: PathBuf,

        /// Write the reduced template here instead of stdout
        #[arg(long, short = 'o')]
        output: Option<PathBuf>,

        /// Where to write the plan file
        #[arg(long, default_value = DEFAULT_PLAN_FILE)]
        plan: PathBuf,
    },

    /// Show which indexes would be deferred, without writing anything
    Plan {
        /// Resolved JSON template
        template: PathBuf,
    },

    /// Create the deferred indexes on the deployed tables
    Reconcile {
        /// Plan file written by `extract`
        #[arg(long, default_value = DEFAULT_PLAN_FILE)]
        plan: PathBuf,

        #[command(flatten)]
        args: ReconcileArgs,
    },
}

/// Reconcile options that can also come from the config file
#[derive(clap::Args, Debug, Default, Clone)]
pub struct ReconcileArgs {
    /// AWS region of the deployed tables
    #[arg(long)]
    pub region: Option<String>,

    /// Endpoint override (e.g. LocalStack)
    #[arg(long)]
    pub endpoint: Option<String>,

    /// Seconds between index status polls
    #[arg(long, value_name = "SECS")]
    pub poll_interval: Option<u64>,

    /// Polls per index before giving up
    #[arg(long, value_name = "N")]
    pub max_poll_attempts: Option<u32>,

    /// Tables reconciled at the same time
    #[arg(long, value_name = "N")]
    pub concurrency: Option<usize>,

    /// Continue with other tables when one table fails
    #[arg(long)]
    pub keep_going: bool,
}
