use clap::Parser;
use tracing_subscriber::EnvFilter;

use weft::cli::{Cli, Command};
use weft::{cmd_init, cmd_model};

fn main() {
    init_tracing();

    let cli = Cli::parse();
    match run(cli) {
        // The child's exit status is our exit status, verbatim.
        Ok(code) => std::process::exit(code),
        Err(err) => {
            eprintln!("error: {err:#}");
            std::process::exit(2);
        }
    }
}

fn run(cli: Cli) -> anyhow::Result<i32> {
    match cli.command {
        Command::Model(args) => cmd_model::run(&args, cli.config.as_deref()),
        Command::Init(args) => {
            cmd_init::run(&args)?;
            Ok(0)
        }
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_env("WEFT_LOG").unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
