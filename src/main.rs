use clap::Parser;
use color_eyre::eyre::{Report, Result};
use nexgen::{cli, cli::Cli, session};

#[tokio::main]
async fn main() -> Result<(), Report> {
    // ------------------------------------------------------------------------
    // CLI Setup

    // Parse CLI parameters
    let args = Cli::parse();

    // initialize color_eyre crate for colorized logs
    color_eyre::install()?;

    // Set logging/verbosity level via RUST_LOG
    std::env::set_var("RUST_LOG", args.verbosity.to_string());

    // initialize env_logger crate for logging/verbosity level
    env_logger::init();

    // check which CLI command we're running (generate, replay, options, taxa)
    match args.command {
        cli::Command::Generate(args) => _ = session::generate(&args).await?,
        cli::Command::Replay(args) => _ = cli::replay(&args).await?,
        cli::Command::Options(args) => cli::options(&args),
        cli::Command::Taxa(args) => cli::taxa(&args)?,
    }

    Ok(())
}
