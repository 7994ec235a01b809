//! PhyloNet commands and the optional flags each one accepts.
//!
//! The tables here are the only place flags are declared. An [`OptionSet`]
//! holds the user's choices for one command, and renders them in table order.


use crate::error::GenerateError;

#[cfg(feature = "cli")]
use clap::ValueEnum;
use itertools::Itertools;
use log::debug;
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};
use strum::{Display as StrumDisplay, EnumIter, EnumString};
use tabled::{settings::Style, Table, Tabled};

// ----------------------------------------------------------------------------
// Command Name
// ----------------------------------------------------------------------------

/// PhyloNet inference commands that can be generated.
#[derive(
    Copy, Clone, Debug, Deserialize, EnumIter, EnumString, Eq, Hash, PartialEq, Serialize, StrumDisplay,
)]
#[cfg_attr(feature = "cli", derive(ValueEnum))]
pub enum CommandName {
    /// Infer a network from gene tree topologies with maximum parsimony.
    #[strum(serialize = "InferNetwork_MP")]
    #[serde(rename = "InferNetwork_MP")]
    #[cfg_attr(feature = "cli", value(name = "InferNetwork_MP"))]
    InferNetworkMp,
    /// Infer a network from gene trees with maximum likelihood.
    #[strum(serialize = "InferNetwork_ML")]
    #[serde(rename = "InferNetwork_ML")]
    #[cfg_attr(feature = "cli", value(name = "InferNetwork_ML"))]
    InferNetworkMl,
    /// Infer a network from gene trees with maximum pseudo-likelihood.
    #[strum(serialize = "InferNetwork_MPL")]
    #[serde(rename = "InferNetwork_MPL")]
    #[cfg_attr(feature = "cli", value(name = "InferNetwork_MPL"))]
    InferNetworkMpl,
    /// Bayesian network inference from gene trees.
    #[strum(serialize = "MCMC_GT")]
    #[serde(rename = "MCMC_GT")]
    #[cfg_attr(feature = "cli", value(name = "MCMC_GT"))]
    McmcGt,
    /// Bayesian network inference from bi-allelic markers.
    #[strum(serialize = "MCMC_BiMarkers")]
    #[serde(rename = "MCMC_BiMarkers")]
    #[cfg_attr(feature = "cli", value(name = "MCMC_BiMarkers"))]
    McmcBiMarkers,
    /// Maximum (pseudo-)likelihood network inference from bi-allelic markers.
    #[strum(serialize = "MLE_BiMarkers")]
    #[serde(rename = "MLE_BiMarkers")]
    #[cfg_attr(feature = "cli", value(name = "MLE_BiMarkers"))]
    MleBiMarkers,
}

/// Input data a command is built from.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum CommandKind {
    /// Gene trees, written to a TREES block.
    GeneTrees,
    /// Bi-allelic markers, written to a DATA block.
    Markers,
}

impl CommandName {
    pub fn kind(&self) -> CommandKind {
        match self {
            CommandName::InferNetworkMp
            | CommandName::InferNetworkMl
            | CommandName::InferNetworkMpl
            | CommandName::McmcGt => CommandKind::GeneTrees,
            CommandName::McmcBiMarkers | CommandName::MleBiMarkers => CommandKind::Markers,
        }
    }

    /// Whether the command takes the number of reticulations after its gene tree list.
    pub fn needs_reticulations(&self) -> bool {
        matches!(
            self,
            CommandName::InferNetworkMp | CommandName::InferNetworkMl | CommandName::InferNetworkMpl
        )
    }

    /// Flag introducing the taxa map clause.
    pub fn taxa_map_flag(&self) -> &'static str {
        match self.kind() {
            CommandKind::GeneTrees => "-a",
            CommandKind::Markers => "-tm",
        }
    }

    /// Optional flags of the command, in emission order.
    pub fn options(&self) -> &'static [OptionSpec] {
        match self {
            CommandName::InferNetworkMp => &INFER_NETWORK_MP,
            CommandName::InferNetworkMl => &INFER_NETWORK_ML,
            CommandName::InferNetworkMpl => &INFER_NETWORK_MPL,
            CommandName::McmcGt => &MCMC_GT,
            CommandName::McmcBiMarkers => &MCMC_BIMARKERS,
            CommandName::MleBiMarkers => &MLE_BIMARKERS,
        }
    }

    /// Look up a flag, with or without its leading `-`.
    pub fn option(&self, flag: &str) -> Option<&'static OptionSpec> {
        let flag = normalize(flag);
        self.options().iter().find(|spec| spec.flag == flag)
    }
}

/// Add the leading `-` to a flag if it is missing.
fn normalize(flag: &str) -> String {
    let flag = flag.trim();
    match flag.starts_with('-') {
        true => flag.to_string(),
        false => format!("-{flag}"),
    }
}

// ----------------------------------------------------------------------------
// Option Spec
// ----------------------------------------------------------------------------

/// Kind of value a flag takes.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum ValueKind {
    /// Boolean flag, no value.
    Switch,
    Integer,
    Decimal,
    /// Free text, passed through as typed (ex. a network or a list).
    Text,
}

impl Display for ValueKind {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        let description = match self {
            ValueKind::Switch => "no value",
            ValueKind::Integer => "an integer",
            ValueKind::Decimal => "a number",
            ValueKind::Text => "text",
        };
        write!(f, "{description}")
    }
}

impl ValueKind {
    fn accepts(&self, value: &str) -> bool {
        match self {
            ValueKind::Switch => value.is_empty(),
            ValueKind::Integer => value.parse::<i64>().is_ok(),
            ValueKind::Decimal => value.parse::<f64>().is_ok_and(f64::is_finite),
            ValueKind::Text => true,
        }
    }
}

/// One recognized optional flag of a command.
#[derive(Clone, Copy, Debug, Tabled)]
pub struct OptionSpec {
    /// Flag token, with its leading `-` (ex. `-cl`).
    #[tabled(rename = "Flag")]
    pub flag: &'static str,
    /// Human readable description.
    #[tabled(rename = "Description")]
    pub label: &'static str,
    #[tabled(rename = "Value")]
    pub value: ValueKind,
    /// Placeholder shown to users, never emitted.
    #[tabled(rename = "Default")]
    pub default: &'static str,
}

const fn spec(flag: &'static str, label: &'static str, value: ValueKind, default: &'static str) -> OptionSpec {
    OptionSpec { flag, label, value, default }
}

// shared by the gene tree searches
const BOOTSTRAP: OptionSpec = spec("-b", "Gene tree bootstrap threshold", ValueKind::Decimal, "100");
const START_NETWORK: OptionSpec = spec("-s", "Starting network", ValueKind::Text, "");
const RUNS: OptionSpec = spec("-x", "Number of runs", ValueKind::Integer, "10");
const MAX_EXAMINED: OptionSpec = spec("-m", "Maximum examined networks", ValueKind::Integer, "50000");
const RETURNED: OptionSpec = spec("-n", "Number of optimal networks returned", ValueKind::Integer, "1");
const HYBRIDS: OptionSpec = spec("-h", "Candidate hybrid species set", ValueKind::Text, "{s1,s2}");
const FAILURES: OptionSpec = spec("-f", "Maximum consecutive failures", ValueKind::Integer, "100");
const THREADS: OptionSpec = spec("-pl", "Number of threads", ValueKind::Integer, "1");
const DIAMETERS: OptionSpec = spec("-di", "Output Rich Newick with inheritance probabilities", ValueKind::Switch, "");
const OPTIMIZE: OptionSpec = spec("-o", "Optimize branch lengths of returned networks", ValueKind::Switch, "");
const FULL_LIKELIHOOD: OptionSpec = spec("-po", "Optimize returned networks with full likelihood", ValueKind::Switch, "");

// shared by the MCMC samplers
const CHAIN_LENGTH: OptionSpec = spec("-cl", "Chain length", ValueKind::Integer, "10000000");
const BURN_IN: OptionSpec = spec("-bl", "Burn-in length", ValueKind::Integer, "2000000");
const SAMPLE_FREQUENCY: OptionSpec = spec("-sf", "Sample frequency", ValueKind::Integer, "5000");
const SEED: OptionSpec = spec("-sd", "Random seed", ValueKind::Integer, "12345678");
const MAX_RETICULATIONS: OptionSpec = spec("-mr", "Maximum number of reticulations", ValueKind::Integer, "4");
const POISSON: OptionSpec = spec("-pp", "Poisson prior on reticulations", ValueKind::Decimal, "1.0");
const NO_DIAMETER: OptionSpec = spec("-dd", "Disable the diameter prior", ValueKind::Switch, "");
const DIAMETER: OptionSpec = spec("-ee", "Exponential prior on diameters", ValueKind::Decimal, "2.0");
const TEMPERATURES: OptionSpec = spec("-mc3", "Metropolis-coupled chain temperatures", ValueKind::Text, "(2.0,3.0)");
const START_SAMPLE: OptionSpec = spec("-snet", "Starting network", ValueKind::Text, "");

// shared by the marker commands
const DIPLOID: OptionSpec = spec("-diploid", "Markers come from diploid individuals", ValueKind::Switch, "");
const DOMINANT: OptionSpec = spec("-dominant", "Dominant marker", ValueKind::Text, "0");
const OPTIMIZE_PI: OptionSpec = spec("-op", "Estimate allele frequencies", ValueKind::Switch, "");
const VARY_THETA: OptionSpec = spec("-varytheta", "Vary population sizes across branches", ValueKind::Switch, "");
const THETA: OptionSpec = spec("-ptheta", "Fixed population size", ValueKind::Decimal, "0.036");

const INFER_NETWORK_MP: [OptionSpec; 9] =
    [BOOTSTRAP, START_NETWORK, RUNS, MAX_EXAMINED, RETURNED, HYBRIDS, FAILURES, THREADS, DIAMETERS];

const INFER_NETWORK_ML: [OptionSpec; 12] = [
    spec("-bl", "Use gene tree branch lengths", ValueKind::Switch, ""),
    BOOTSTRAP,
    START_NETWORK,
    RUNS,
    MAX_EXAMINED,
    RETURNED,
    HYBRIDS,
    FAILURES,
    THREADS,
    DIAMETERS,
    OPTIMIZE,
    FULL_LIKELIHOOD,
];

const INFER_NETWORK_MPL: [OptionSpec; 11] = [
    BOOTSTRAP,
    START_NETWORK,
    RUNS,
    MAX_EXAMINED,
    RETURNED,
    HYBRIDS,
    FAILURES,
    THREADS,
    DIAMETERS,
    OPTIMIZE,
    FULL_LIKELIHOOD,
];

const MCMC_GT: [OptionSpec; 12] = [
    CHAIN_LENGTH,
    BURN_IN,
    SAMPLE_FREQUENCY,
    SEED,
    THREADS,
    MAX_RETICULATIONS,
    POISSON,
    NO_DIAMETER,
    DIAMETER,
    TEMPERATURES,
    START_SAMPLE,
    spec("-pseudo", "Use pseudo-likelihood", ValueKind::Switch, ""),
];

const MCMC_BIMARKERS: [OptionSpec; 16] = [
    CHAIN_LENGTH,
    BURN_IN,
    SAMPLE_FREQUENCY,
    SEED,
    THREADS,
    MAX_RETICULATIONS,
    POISSON,
    NO_DIAMETER,
    DIAMETER,
    TEMPERATURES,
    START_SAMPLE,
    DIPLOID,
    DOMINANT,
    OPTIMIZE_PI,
    VARY_THETA,
    THETA,
];

const MLE_BIMARKERS: [OptionSpec; 13] = [
    spec("-mnr", "Maximum number of runs", ValueKind::Integer, "50"),
    spec("-mno", "Maximum number of optimizations", ValueKind::Integer, "500"),
    spec("-mec", "Maximum examined candidates", ValueKind::Integer, "50000"),
    MAX_RETICULATIONS,
    THREADS,
    SEED,
    START_SAMPLE,
    DIPLOID,
    DOMINANT,
    OPTIMIZE_PI,
    VARY_THETA,
    THETA,
    spec("-pseudo", "Use pseudo-likelihood", ValueKind::Switch, ""),
];

/// Markdown table of a command's flags.
///
/// ```rust
/// use nexgen::options::{table, CommandName};
/// let table = table(CommandName::MleBiMarkers);
/// assert!(table.starts_with("| Flag "));
/// assert!(table.contains("| -pseudo "));
/// ```
pub fn table(command: CommandName) -> String {
    let mut table = Table::new(command.options().iter().copied());
    table.with(Style::markdown());
    table.to_string()
}

// ----------------------------------------------------------------------------
// Option Entry
// ----------------------------------------------------------------------------

/// The user's choice for one flag.
#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
pub struct OptionEntry {
    pub flag: String,
    pub enabled: bool,
    pub value: Option<String>,
}

impl OptionEntry {
    /// Trimmed value, `None` when absent or blank.
    pub fn value(&self) -> Option<&str> {
        self.value.as_deref().map(str::trim).filter(|v| !v.is_empty())
    }
}

// ----------------------------------------------------------------------------
// Option Set
// ----------------------------------------------------------------------------

/// All flag choices for one command, in the command table's order.
///
/// Renders as the optional part of the command line.
///
/// ## Examples
///
/// ```rust
/// use nexgen::options::{CommandName, OptionSet};
/// let mut options = OptionSet::new(CommandName::McmcBiMarkers);
/// options.set("diploid", None)?;
/// options.set("-cl", Some("500000"))?;
/// options.set("sd", Some("  "))?;
///
/// // table order, blank values are skipped
/// assert_eq!(options.to_string(), " -cl 500000 -diploid");
/// # Ok::<(), nexgen::GenerateError>(())
/// ```
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct OptionSet {
    pub command: CommandName,
    pub entries: Vec<OptionEntry>,
}

impl Display for OptionSet {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        for (spec, value) in self.emitted() {
            match value {
                Some(value) => write!(f, " {} {value}", spec.flag)?,
                None => write!(f, " {}", spec.flag)?,
            }
        }
        Ok(())
    }
}

impl OptionSet {
    /// Every flag of the command, disabled.
    pub fn new(command: CommandName) -> Self {
        let entries = command
            .options()
            .iter()
            .map(|spec| OptionEntry { flag: spec.flag.to_string(), enabled: false, value: None })
            .collect_vec();
        OptionSet { command, entries }
    }

    /// Build from command-line style choices, `flag` or `flag=value`.
    ///
    /// The value is everything after the first `=`.
    pub fn parse<S>(command: CommandName, choices: &[S]) -> Result<Self, GenerateError>
    where
        S: AsRef<str>,
    {
        let mut options = OptionSet::new(command);
        for choice in choices {
            match choice.as_ref().split_once('=') {
                Some((flag, value)) => options.set(flag, Some(value))?,
                None => options.set(choice.as_ref(), None)?,
            }
        }
        Ok(options)
    }

    fn entry_mut(&mut self, flag: &str) -> Result<&mut OptionEntry, GenerateError> {
        let command = self.command;
        let spec = command.option(flag).ok_or_else(|| GenerateError::UnknownFlag {
            command: command.to_string(),
            flag: flag.to_string(),
        })?;
        self.entries.iter_mut().find(|e| e.flag == spec.flag).ok_or_else(|| {
            GenerateError::UnknownFlag { command: command.to_string(), flag: flag.to_string() }
        })
    }

    /// Enable a flag, with its value if it takes one.
    pub fn set(&mut self, flag: &str, value: Option<&str>) -> Result<(), GenerateError> {
        let entry = self.entry_mut(flag)?;
        entry.enabled = true;
        entry.value = value.map(String::from);
        Ok(())
    }

    /// Disable a flag, keeping its value.
    pub fn unset(&mut self, flag: &str) -> Result<(), GenerateError> {
        self.entry_mut(flag)?.enabled = false;
        Ok(())
    }

    /// Check every enabled entry against the command table.
    pub fn validate(&self) -> Result<(), GenerateError> {
        for entry in self.entries.iter().filter(|e| e.enabled) {
            let spec = self.command.option(&entry.flag).ok_or_else(|| GenerateError::UnknownFlag {
                command: self.command.to_string(),
                flag: entry.flag.clone(),
            })?;
            let value = entry.value().unwrap_or_default();
            // blank values are skipped at emission, not rejected
            if spec.value != ValueKind::Switch && value.is_empty() {
                continue;
            }
            if !spec.value.accepts(value) {
                return Err(GenerateError::InvalidOption {
                    flag: spec.flag.to_string(),
                    expected: spec.value.to_string(),
                    value: value.to_string(),
                });
            }
        }
        Ok(())
    }

    /// Flags that will be written, in table order, with their values.
    pub fn emitted(&self) -> impl Iterator<Item = (&'static OptionSpec, Option<&str>)> + '_ {
        self.command.options().iter().filter_map(|spec| {
            let entry = self.entries.iter().find(|e| e.enabled && normalize(&e.flag) == spec.flag)?;
            match (spec.value, entry.value()) {
                (ValueKind::Switch, _) => Some((spec, None)),
                (_, Some(value)) => Some((spec, Some(value))),
                (_, None) => {
                    debug!("Skipping {} of {}, it has no value.", spec.flag, self.command);
                    None
                }
            }
        })
    }
}
