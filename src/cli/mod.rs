//! [Command-line interface](Cli) (CLI) of the main binary.

use crate::encode::InputMode;
use crate::options::{self, CommandKind, CommandName};
use crate::session::{self, GenerateArgs};

use clap::{Args as ClapArgs, Parser, Subcommand, ValueEnum};
use color_eyre::eyre::{Report, Result};
use log::info;
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};
use std::path::PathBuf;
use strum::IntoEnumIterator;

// ----------------------------------------------------------------------------
// CLI Entry Point
// ----------------------------------------------------------------------------

/// The command-line interface (CLI).
/// ---
/// The CLI is intended for parsing user input from the command-line in the main function.
/// ```no_run
/// use clap::Parser;
/// let args = nexgen::Cli::parse();
/// ```
/// Here is a manual example of setting the command-line input:
/// ```rust
/// use clap::Parser;
/// use nexgen::{cli::Command, options::CommandName, Cli};
/// let input = [
///     "nexgen", "generate", "--command", "MCMC_BiMarkers", "--input", "locus1.fasta",
///     "--flag", "cl=100000", "--flag", "-diploid", "--output", "mcmc.nexus",
/// ];
/// let args = Cli::parse_from(input);
/// let Command::Generate(args) = args.command else { panic!("not generate") };
/// assert_eq!(args.command, CommandName::McmcBiMarkers);
/// assert_eq!(args.flags, ["cl=100000", "-diploid"]);
/// serde_json::to_string_pretty(&args)?;
/// # Ok::<(), color_eyre::eyre::Report>(())
/// ```
#[derive(Debug, Deserialize, Parser, Serialize)]
#[clap(name = "nexgen", author, version)]
#[clap(about = "Write validated PhyloNet command documents from sequences and gene trees.")]
pub struct Cli {
    #[clap(subcommand)]
    /// Pass CLI arguments to a particular [Command].
    #[clap(help = "Set the command.")]
    pub command: Command,

    /// Set the output [Verbosity] level.
    #[clap(short = 'v', long)]
    #[clap(value_enum, default_value_t = Verbosity::default())]
    #[clap(hide_possible_values = false)]
    #[clap(global = true)]
    #[clap(help = "Set the output verbosity level.")]
    pub verbosity: Verbosity,
}

/// CLI [commands](#variants).
#[derive(Debug, Deserialize, Serialize, Subcommand)]
pub enum Command {
    #[clap(about = "Write and validate a command document.")]
    Generate(GenerateArgs),
    #[clap(about = "Generate again from saved arguments.")]
    Replay(ReplayArgs),
    #[clap(about = "List the optional flags of PhyloNet commands.")]
    Options(OptionsArgs),
    #[clap(about = "List the taxa of input files, as they reach inference.")]
    Taxa(TaxaArgs),
}

// ----------------------------------------------------------------------------
// Subcommand Args
// ----------------------------------------------------------------------------

/// Generate from arguments saved with `generate --save-args`.
#[derive(Clone, Debug, Deserialize, Serialize, ClapArgs)]
pub struct ReplayArgs {
    /// Saved arguments (JSON).
    #[clap(short = 'a', long, required = true)]
    pub args: PathBuf,

    /// Write to this document instead of the saved output.
    #[clap(short = 'o', long)]
    pub output: Option<PathBuf>,
}

/// List the optional flags of one or all commands.
#[derive(Clone, Debug, Deserialize, Serialize, ClapArgs)]
pub struct OptionsArgs {
    /// PhyloNet command, all commands if not given.
    #[clap(short = 'c', long, value_enum)]
    pub command: Option<CommandName>,
}

/// List taxa of sequence or gene tree files.
#[derive(Clone, Debug, Deserialize, Serialize, ClapArgs)]
pub struct TaxaArgs {
    /// Input files.
    #[clap(short = 'i', long, required = true, num_args = 1..)]
    pub input: Vec<PathBuf>,

    /// Input files are gene trees rather than sequences.
    #[clap(long)]
    pub trees: bool,

    /// How sequences are turned into bi-allelic markers.
    #[clap(short = 'm', long, value_enum, default_value_t = InputMode::default())]
    pub mode: InputMode,
}

// ----------------------------------------------------------------------------
// Subcommand Functions
// ----------------------------------------------------------------------------

/// Re-run `generate` from saved arguments.
pub async fn replay(args: &ReplayArgs) -> Result<PathBuf, Report> {
    info!("Replaying generate arguments: {:?}", args.args);
    let mut generate_args = GenerateArgs::read(&args.args)?;
    if let Some(output) = &args.output {
        generate_args.output = output.clone();
    }
    session::generate(&generate_args).await
}

/// Print flag tables as markdown.
pub fn options(args: &OptionsArgs) {
    let commands = match args.command {
        Some(command) => vec![command],
        None => CommandName::iter().collect(),
    };
    for command in commands {
        println!("## {command}\n\n{}\n", options::table(command));
    }
}

/// Print taxa, one per line.
pub fn taxa(args: &TaxaArgs) -> Result<(), Report> {
    let kind = match args.trees {
        true => CommandKind::GeneTrees,
        false => CommandKind::Markers,
    };
    for taxon in session::list_taxa(&args.input, kind, args.mode)? {
        println!("{taxon}");
    }
    Ok(())
}

// -----------------------------------------------------------------------------
// Verbosity
// -----------------------------------------------------------------------------

/// The output verbosity level.
#[derive(Clone, Debug, Default, Deserialize, Serialize, ValueEnum)]
pub enum Verbosity {
    #[default]
    Info,
    Warn,
    Debug,
    Error,
}

impl Display for Verbosity {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        // Convert to lowercase for RUST_LOG env var compatibility
        let lowercase = format!("{:?}", self).to_lowercase();
        write!(f, "{lowercase}")
    }
}
