//! gsi-deploy CLI library.
//!
//! Types and command handlers behind the `gsi-deploy` binary. The binary
//! parses arguments, installs tracing and calls [`run`].

pub mod cli;
pub mod commands;
pub mod config;
pub mod error;
pub mod output;

use cli::{Cli, Commands};

/// Dispatch a parsed [`Cli`] to the appropriate command handler.
pub async fn run(cli: Cli) -> error::CliResult<()> {
    match cli.command {
        Commands::Extract {
            template,
            output,
            plan,
        } => commands::extract::run(&template, output.as_deref(), &plan, cli.quiet),

        Commands::Plan { template } => commands::plan::run(&template),

        Commands::Reconcile { plan, args } => {
            let file_config = config::load_file_config(cli.config.as_deref())?;
            commands::reconcile::run(&plan, &args, &file_config, cli.quiet).await
        }
    }
}
