pub mod handlers;
mod prompt;

use crate::presentation::cli::{Cli, Commands};
use clap::Parser;
use parprint_core::error::Result;

pub fn run() -> Result<()> {
    let cli = Cli::parse();
    match cli.command {
        Commands::Print(args) => handlers::handle_print(args),
        Commands::Plan(docs) => handlers::handle_plan(docs.local_filepath, docs.printers, docs.files),
        Commands::Queues => handlers::handle_queues(),
    }
}
