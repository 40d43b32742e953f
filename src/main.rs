mod aggregate;
mod cli;
mod error;
mod export;
mod filter;
mod fmt;
mod loader;
mod models;
mod render;
mod session;
mod settings;
mod tui;

use clap::{CommandFactory, Parser};
use tracing_subscriber::EnvFilter;

use cli::{Cli, Commands};

fn init_logging() {
    let filter = EnvFilter::try_from_env("SPENDVIEW_LOG").unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn main() {
    init_logging();
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Report { file, filter, all } => cli::report::run(&file, &filter, all),
        Commands::Export { file, filter, output } => cli::export::run(&file, &filter, output),
        Commands::Categories { file } => cli::categories::list(&file),
        Commands::Dashboard { file } => cli::dashboard::run(&file),
        Commands::Config { set } => cli::config::run(&set),
        Commands::Completions { shell } => {
            clap_complete::generate(shell, &mut Cli::command(), "spendview", &mut std::io::stdout());
            Ok(())
        }
    };

    if let Err(e) = result {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}
