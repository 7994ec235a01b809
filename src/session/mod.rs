//! Uploaded data and user choices, and the generate action that turns them
//! into a validated document.


use crate::document::{Candidate, Data, Document};
use crate::encode::InputMode;
use crate::error::GenerateError;
use crate::options::{CommandKind, CommandName, OptionSet};
use crate::sequence::{self, SequenceMatrix};
use crate::taxa::TaxonSpeciesMap;
use crate::validate::{self, Checker, JavaChecker, Unchecked, Verdict};

#[cfg(feature = "cli")]
use clap::Parser;
use color_eyre::eyre::{eyre, Report, Result, WrapErr};
use color_eyre::Help;
use itertools::Itertools;
use log::{debug, info};
use nexgen_phylo::{read_trees, Locus};
use serde::{Deserialize, Serialize};
use std::fmt::Debug;
use std::path::{Path, PathBuf};

// ----------------------------------------------------------------------------
// Generate Args
// ----------------------------------------------------------------------------

/// Write a PhyloNet command document from sequence or gene tree files.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
#[cfg_attr(feature = "cli", derive(Parser))]
pub struct GenerateArgs {
    /// PhyloNet command.
    #[cfg_attr(feature = "cli", clap(short = 'c', long, value_enum, required = true))]
    pub command: CommandName,

    /// Input files, one per locus.
    ///
    /// Sequence files (FASTA, NEXUS) for marker commands, gene tree files
    /// (Newick, NEXUS) for gene tree commands.
    #[cfg_attr(feature = "cli", clap(short = 'i', long, required = true, num_args = 1..))]
    pub input: Vec<PathBuf>,

    /// How sequences are turned into bi-allelic markers.
    #[cfg_attr(feature = "cli", clap(short = 'm', long, value_enum, default_value_t = InputMode::default()))]
    #[serde(default)]
    pub mode: InputMode,

    /// Taxa to include, all taxa if not given.
    ///
    /// Phased names (ex. `a_0,a_1`) when the mode is unphased. Comma separated.
    #[cfg_attr(feature = "cli", arg(short = 't', long, value_delimiter = ','))]
    pub taxa: Option<Vec<String>>,

    /// Assign taxa to species, as `taxon=species`.
    ///
    /// Comma separated, ex. `--species a=sp1,b=sp1,c=sp2`.
    #[cfg_attr(feature = "cli", arg(short = 's', long, value_delimiter = ','))]
    #[serde(default)]
    pub species: Vec<String>,

    /// Number of reticulations, for the InferNetwork commands.
    #[cfg_attr(feature = "cli", arg(short = 'r', long))]
    pub reticulations: Option<usize>,

    /// Optional command flag, as `flag` or `flag=value`, the value being
    /// everything after the first `=`. Can be repeated.
    ///
    /// ex. `--flag cl=100000 --flag diploid --flag "h={A=x,B}"`
    #[cfg_attr(feature = "cli", arg(short = 'f', long = "flag", allow_hyphen_values = true))]
    #[serde(default)]
    pub flags: Vec<String>,

    /// Output document.
    ///
    /// If the directory does not exist, it will be created.
    #[cfg_attr(feature = "cli", clap(short = 'o', long, required = true))]
    pub output: PathBuf,

    /// Java executable used to run PhyloNet.
    #[cfg_attr(feature = "cli", clap(long, default_value = "java"))]
    #[serde(default = "GenerateArgs::default_java")]
    pub java: PathBuf,

    /// PhyloNet jar used to validate the document.
    ///
    /// Validation is skipped if not given.
    #[cfg_attr(feature = "cli", clap(long))]
    pub jar: Option<PathBuf>,

    /// Encode and write the document in a background task.
    #[cfg_attr(feature = "cli", clap(long))]
    #[serde(default)]
    pub background: bool,

    /// Save these arguments to a JSON file, for use with `replay`.
    #[cfg_attr(feature = "cli", clap(long))]
    #[serde(skip)]
    pub save_args: Option<PathBuf>,
}

impl Default for GenerateArgs {
    fn default() -> Self {
        GenerateArgs {
            command: CommandName::McmcBiMarkers,
            input: Vec::new(),
            mode: InputMode::default(),
            taxa: None,
            species: Vec::new(),
            reticulations: None,
            flags: Vec::new(),
            output: PathBuf::new(),
            java: GenerateArgs::default_java(),
            jar: None,
            background: false,
            save_args: None,
        }
    }
}

impl GenerateArgs {
    fn default_java() -> PathBuf {
        PathBuf::from("java")
    }

    /// Parse the `taxon=species` assignments.
    pub fn species(&self) -> Result<Vec<(&str, &str)>, Report> {
        self.species
            .iter()
            .map(|pair| {
                pair.split_once('=').map(|(t, s)| (t.trim(), s.trim())).ok_or_else(|| {
                    eyre!("Species assignment is not of the form taxon=species: {pair:?}")
                        .suggestion("ex. --species a=sp1,b=sp1")
                })
            })
            .collect()
    }

    /// The validator these arguments ask for.
    pub fn checker(&self) -> Box<dyn Checker> {
        match &self.jar {
            Some(jar) => Box::new(JavaChecker::new(self.java.clone(), jar.clone())),
            None => Box::new(Unchecked),
        }
    }

    /// Read [`GenerateArgs`] from a JSON file.
    pub fn read<P>(path: &P) -> Result<GenerateArgs, Report>
    where
        P: AsRef<Path> + Debug,
    {
        let input = std::fs::read_to_string(path)
            .wrap_err_with(|| format!("Failed to read generate arguments: {path:?}."))?;
        let args = serde_json::from_str(&input)
            .wrap_err_with(|| format!("Failed to deserialize generate arguments: {input}"))?;
        Ok(args)
    }

    /// Write [`GenerateArgs`] to a JSON file.
    pub fn write<P>(&self, path: &P) -> Result<(), Report>
    where
        P: AsRef<Path> + Debug,
    {
        crate::utils::create_parent_dir(path)?;
        let output = serde_json::to_string_pretty(self)
            .wrap_err(format!("Failed to serialize generate arguments: {self:?}"))?;
        std::fs::write(path, output)
            .wrap_err(format!("Failed to write generate arguments: {path:?}"))?;
        Ok(())
    }
}

// ----------------------------------------------------------------------------
// Session
// ----------------------------------------------------------------------------

/// Files uploaded to a session.
#[derive(Clone, Debug)]
pub enum Upload {
    /// One matrix per file, all with the same taxa.
    Sequences(Vec<SequenceMatrix>),
    /// One locus per file.
    Trees(Vec<Locus>),
}

/// State shared by every generate action: uploaded data, input mode and the
/// taxon to species map.
///
/// Encoded matrices and species groups are rebuilt by each generate action,
/// nothing derived is kept between them.
#[derive(Clone, Debug, Default)]
pub struct Session {
    upload: Option<Upload>,
    mode: InputMode,
    map: Option<TaxonSpeciesMap>,
}

impl Session {
    pub fn new() -> Self {
        Session::default()
    }

    /// Replace the uploaded data with sequence files.
    ///
    /// Every file must hold the same taxa.
    pub fn upload_sequences<P>(&mut self, paths: &[P]) -> Result<(), Report>
    where
        P: AsRef<Path> + Debug,
    {
        let matrices = paths.iter().map(sequence::read).collect::<Result<Vec<_>, Report>>()?;
        if let Some((first, other)) = matrices
            .first()
            .and_then(|first| matrices.iter().find(|m| !m.same_taxa(first)).map(|m| (first, m)))
        {
            return Err(eyre!(
                "Sequence files have different taxa: {:?} and {:?}",
                first.taxa(),
                other.taxa()
            ))
            .suggestion("Every uploaded sequence file must contain the same taxa.");
        }
        info!("Uploaded {} sequence files.", matrices.len());
        self.upload = Some(Upload::Sequences(matrices));
        self.refresh_map();
        Ok(())
    }

    /// Replace the uploaded data with gene tree files.
    pub fn upload_trees<P>(&mut self, paths: &[P]) -> Result<(), Report>
    where
        P: AsRef<Path> + Debug,
    {
        let loci = paths.iter().map(read_trees).collect::<Result<Vec<_>, Report>>()?;
        info!(
            "Uploaded {} gene trees from {} files.",
            loci.iter().map(|l| l.trees.len()).sum::<usize>(),
            loci.len()
        );
        self.upload = Some(Upload::Trees(loci));
        self.refresh_map();
        Ok(())
    }

    pub fn upload(&self) -> Option<&Upload> {
        self.upload.as_ref()
    }

    pub fn mode(&self) -> InputMode {
        self.mode
    }

    /// Change how sequences are encoded, which may rename the inference taxa.
    pub fn set_mode(&mut self, mode: InputMode) {
        self.mode = mode;
        self.refresh_map();
    }

    /// Taxa that reach inference, in upload order.
    pub fn taxa(&self) -> Vec<String> {
        self.data().map(|data| data.taxa()).unwrap_or_default()
    }

    /// The taxon to species map, once data has been uploaded.
    pub fn map(&self) -> Option<&TaxonSpeciesMap> {
        self.map.as_ref()
    }

    /// Assign a taxon to a species.
    pub fn assign(&mut self, taxon: &str, species: &str) -> Result<(), GenerateError> {
        match &mut self.map {
            Some(map) => map.assign(taxon, species),
            None => Err(GenerateError::MissingData),
        }
    }

    fn refresh_map(&mut self) {
        let taxa = self.taxa();
        self.map = match taxa.is_empty() {
            true => None,
            false => Some(TaxonSpeciesMap::merge(self.map.as_ref(), &taxa)),
        };
    }

    fn data(&self) -> Option<Data> {
        self.upload.as_ref().map(|upload| match upload {
            Upload::Sequences(matrices) => Data::Sequences { matrices: matrices.clone(), mode: self.mode },
            Upload::Trees(loci) => Data::Trees(loci.clone()),
        })
    }

    /// Build and check everything a generate action needs, without touching disk.
    ///
    /// Sequence uploads are encoded with the session's mode, which must match
    /// `args.mode`.
    pub fn job(&self, args: &GenerateArgs) -> Result<Job, GenerateError> {
        if matches!(self.upload, Some(Upload::Sequences(_))) && args.mode != self.mode {
            return Err(GenerateError::ModeMismatch { session: self.mode, requested: args.mode });
        }
        let mut document = Document::new(args.command);
        document.data = self.data();
        document.taxa = args.taxa.clone().unwrap_or_else(|| self.taxa());
        document.map = self.map.clone().unwrap_or_default();
        document.options = OptionSet::parse(args.command, &args.flags)?;
        document.reticulations = args.reticulations;
        document.check(&args.output)?;

        debug!("Generating {} for taxa: {}", args.command, document.taxa.iter().join(","));
        Ok(Job { document, output: args.output.clone() })
    }

    /// Generate, validate and save a document, blocking until done.
    ///
    /// ## Examples
    ///
    /// ```rust
    /// use nexgen::{session::{GenerateArgs, Session}, validate::Unchecked, GenerateError};
    /// let session = Session::new();
    /// let args = GenerateArgs { output: "out.nexus".into(), ..Default::default() };
    ///
    /// // nothing was uploaded
    /// let result = session.generate(&args, &Unchecked);
    /// assert!(matches!(result, Err(GenerateError::MissingData)));
    /// ```
    pub fn generate(&self, args: &GenerateArgs, checker: &dyn Checker) -> Result<PathBuf, GenerateError> {
        let job = self.job(args)?;
        let candidate = job.write()?;
        Job::finish(candidate, checker)
    }

    /// Generate a document with encoding and writing on a blocking worker.
    ///
    /// Validation runs on the calling task once the worker is done.
    pub async fn generate_background(
        &self,
        args: &GenerateArgs,
        checker: &dyn Checker,
    ) -> Result<PathBuf, GenerateError> {
        let job = self.job(args)?;
        let candidate = tokio::task::spawn_blocking(move || job.write())
            .await
            .map_err(|e| GenerateError::Serialization(format!("Document worker failed: {e}")))??;
        Job::finish(candidate, checker)
    }
}

// ----------------------------------------------------------------------------
// Job
// ----------------------------------------------------------------------------

/// A checked document and where it should end up.
#[derive(Clone, Debug)]
pub struct Job {
    pub document: Document,
    pub output: PathBuf,
}

impl Job {
    /// Encode and write the candidate document.
    pub fn write(&self) -> Result<Candidate, GenerateError> {
        self.document.write(&self.output)
    }

    /// Validate a candidate, and save it only if accepted.
    pub fn finish(candidate: Candidate, checker: &dyn Checker) -> Result<PathBuf, GenerateError> {
        match validate::validate(checker, candidate.path())? {
            Verdict::Accepted => candidate.persist(),
            Verdict::Rejected(message) => Err(GenerateError::ExternalValidation(message)),
        }
    }
}

// ----------------------------------------------------------------------------
// Functions
// ----------------------------------------------------------------------------

/// Upload the input files and generate a document from command-line arguments.
pub async fn generate(args: &GenerateArgs) -> Result<PathBuf, Report> {
    if let Some(path) = &args.save_args {
        info!("Saving generate arguments: {path:?}");
        args.write(path)?;
    }

    let mut session = Session::new();
    session.set_mode(args.mode);
    match args.command.kind() {
        CommandKind::Markers => session.upload_sequences(&args.input)?,
        CommandKind::GeneTrees => session.upload_trees(&args.input)?,
    }
    for (taxon, species) in args.species()? {
        session.assign(taxon, species)?;
    }

    let checker = args.checker();
    let output = match args.background {
        true => session.generate_background(args, checker.as_ref()).await?,
        false => session.generate(args, checker.as_ref())?,
    };
    Ok(output)
}

/// Labels of the taxa in input files, as they will reach inference.
pub fn list_taxa<P>(paths: &[P], kind: CommandKind, mode: InputMode) -> Result<Vec<String>, Report>
where
    P: AsRef<Path> + Debug,
{
    let mut session = Session::new();
    session.set_mode(mode);
    match kind {
        CommandKind::Markers => session.upload_sequences(paths)?,
        CommandKind::GeneTrees => session.upload_trees(paths)?,
    }
    let taxa = session.taxa();
    debug!("Found {} taxa ({mode} mode).", taxa.len());
    Ok(taxa)
}
