//! Assemble the NEXUS command document.
//!
//! A [`Document`] is checked in full before anything touches the disk. It is
//! then written to a [`Candidate`] file beside its destination, which only
//! takes the destination name once it has been accepted.

#[cfg(test)]
mod tests;

use crate::encode::{self, InputMode};
use crate::error::GenerateError;
use crate::options::{CommandKind, CommandName, OptionSet};
use crate::sequence::{Alphabet, SequenceMatrix};
use crate::taxa::TaxonSpeciesMap;

use color_eyre::eyre::{Report, Result, WrapErr};
use indoc::formatdoc;
use itertools::Itertools;
use log::{debug, info};
use nexgen_phylo::{newick::quote_label, Locus, ToNewick};
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

// ----------------------------------------------------------------------------
// Data
// ----------------------------------------------------------------------------

/// Uploaded data a document is built from.
#[derive(Clone, Debug)]
pub enum Data {
    /// One matrix per uploaded file, encoded at render time.
    Sequences { matrices: Vec<SequenceMatrix>, mode: InputMode },
    /// One locus per uploaded file.
    Trees(Vec<Locus>),
}

impl Data {
    /// Taxa that reach inference, in upload order.
    pub fn taxa(&self) -> Vec<String> {
        match self {
            Data::Sequences { matrices, mode } => {
                matrices.first().map(|m| encode::taxa(&m.taxa(), *mode)).unwrap_or_default()
            }
            Data::Trees(loci) => {
                loci.iter().flat_map(|l| l.taxa()).unique().map(String::from).collect_vec()
            }
        }
    }

    fn is_empty(&self) -> bool {
        match self {
            Data::Sequences { matrices, .. } => matrices.iter().all(SequenceMatrix::is_empty),
            Data::Trees(loci) => loci.is_empty(),
        }
    }

    fn kind(&self) -> CommandKind {
        match self {
            Data::Sequences { .. } => CommandKind::Markers,
            Data::Trees(_) => CommandKind::GeneTrees,
        }
    }
}

// ----------------------------------------------------------------------------
// Document
// ----------------------------------------------------------------------------

/// Everything needed to write one PhyloNet command document.
#[derive(Clone, Debug)]
pub struct Document {
    pub command: CommandName,
    pub data: Option<Data>,
    /// Selected inference taxa.
    pub taxa: Vec<String>,
    /// Taxon to species map, may cover more taxa than are selected.
    pub map: TaxonSpeciesMap,
    pub options: OptionSet,
    pub reticulations: Option<usize>,
}

impl Document {
    pub fn new(command: CommandName) -> Self {
        Document {
            command,
            data: None,
            taxa: Vec::new(),
            map: TaxonSpeciesMap::default(),
            options: OptionSet::new(command),
            reticulations: None,
        }
    }

    /// Check every precondition of writing to `destination`.
    ///
    /// Nothing is read from or written to disk.
    pub fn check(&self, destination: &Path) -> Result<(), GenerateError> {
        let data = match &self.data {
            Some(data) if !data.is_empty() && data.kind() == self.command.kind() => data,
            _ => return Err(GenerateError::MissingData),
        };
        if self.taxa.is_empty() {
            return Err(GenerateError::EmptyTaxaSelection);
        }
        if destination.as_os_str().is_empty() {
            return Err(GenerateError::EmptyDestination);
        }
        if let Data::Trees(loci) = data {
            let empty = loci.iter().filter(|l| l.trees.is_empty()).map(|l| l.path.clone()).collect_vec();
            if !empty.is_empty() {
                return Err(GenerateError::NoTreeData(empty));
            }
        }
        if self.command.needs_reticulations() && self.reticulations.is_none() {
            return Err(GenerateError::MissingReticulations(self.command.to_string()));
        }

        let known = data.taxa();
        if let Some(unknown) = self.taxa.iter().find(|t| !known.contains(t)) {
            return Err(GenerateError::UnknownTaxon(unknown.clone()));
        }
        self.map.restrict(&self.taxa)?;
        self.options.validate()
    }

    /// Render the full document text.
    ///
    /// ## Examples
    ///
    /// ```rust
    /// use nexgen::document::{Data, Document};
    /// use nexgen::encode::InputMode;
    /// use nexgen::options::CommandName;
    /// use nexgen::sequence::{Alphabet, SequenceMatrix};
    /// use nexgen::taxa::TaxonSpeciesMap;
    ///
    /// let mut matrix = SequenceMatrix::new(Alphabet::Dna);
    /// matrix.push("taxon1", "ACGT".chars())?;
    /// matrix.push("taxon2", "ACGA".chars())?;
    ///
    /// let mut document = Document::new(CommandName::MleBiMarkers);
    /// document.taxa = vec!["taxon1".to_string(), "taxon2".to_string()];
    /// document.map = TaxonSpeciesMap::initialize(&document.taxa);
    /// document.data = Some(Data::Sequences { matrices: vec![matrix], mode: InputMode::Phased });
    ///
    /// let expected = indoc::indoc! {r#"
    ///     #NEXUS
    ///
    ///     Begin data;
    ///     Dimensions ntax=2 nchar=1;
    ///     Format datatype=dna symbols="01" missing=? gap=-;
    ///     Matrix
    ///     taxon1 1
    ///     taxon2 0
    ///     ;End;
    ///
    ///     BEGIN PHYLONET;
    ///     MLE_BiMarkers -taxa (taxon1,taxon2);
    ///     END;
    /// "#};
    /// assert_eq!(document.render()?, expected);
    /// # Ok::<(), color_eyre::eyre::Report>(())
    /// ```
    pub fn render(&self) -> Result<String, Report> {
        let data = self.data.as_ref().ok_or(GenerateError::MissingData)?;

        let (block, arguments) = match data {
            Data::Sequences { matrices, mode } => {
                let markers = encode::encode_all(matrices, *mode)?;
                debug!("Encoded {} markers for {} taxa.", markers.nchar(), markers.ntax());
                let taxa = self.taxa.iter().map(|t| quote_label(t)).join(",");
                (data_block(&markers), format!("-taxa ({taxa})"))
            }
            Data::Trees(loci) => {
                let mut arguments = tree_arguments(loci);
                if let (true, Some(n)) = (self.command.needs_reticulations(), self.reticulations) {
                    arguments.push_str(&format!(" {n}"));
                }
                (trees_block(loci)?, arguments)
            }
        };

        // the clause is left out when no taxon was remapped
        let map = self.map.restrict(&self.taxa)?;
        let clause = match map.is_identity() {
            true => String::new(),
            false => format!(" {} {}", self.command.taxa_map_flag(), map.invert()),
        };

        let command = self.command;
        let options = &self.options;
        Ok(formatdoc! {"
            #NEXUS

            {block}
            BEGIN PHYLONET;
            {command} {arguments}{options}{clause};
            END;
        "})
    }

    /// Check, render and write the document next to `destination`.
    ///
    /// Nothing is created if a precondition fails, and a failed write leaves
    /// no file behind.
    pub fn write(&self, destination: &Path) -> Result<Candidate, GenerateError> {
        self.check(destination)?;
        let text = self.render().map_err(GenerateError::serialization)?;
        Candidate::create(destination, &text).map_err(GenerateError::serialization)
    }
}

/// DATA block of an encoded matrix.
pub fn data_block(matrix: &SequenceMatrix) -> String {
    let format = match matrix.alphabet {
        Alphabet::Standard => r#"datatype=dna symbols="01" missing=? gap=-"#,
        Alphabet::Dna => "datatype=dna missing=? gap=-",
    };
    let rows = matrix
        .iter()
        .map(|(taxon, sequence)| format!("{} {}\n", quote_label(taxon), sequence.iter().collect::<String>()))
        .join("");
    let (ntax, nchar) = (matrix.ntax(), matrix.nchar());

    formatdoc! {"
        Begin data;
        Dimensions ntax={ntax} nchar={nchar};
        Format {format};
        Matrix
        {rows};End;
    "}
}

/// TREES block naming every tree `gt0`, `gt1`, ... in upload order.
pub fn trees_block(loci: &[Locus]) -> Result<String, Report> {
    let mut block = String::from("BEGIN TREES;\n");
    for (i, tree) in loci.iter().flat_map(|l| l.trees.iter()).enumerate() {
        block.push_str(&format!("Tree gt{i} = {}\n", tree.to_newick()?));
    }
    block.push_str("END;\n");
    Ok(block)
}

/// Gene tree list, with the trees of one file grouped in braces.
///
/// ```rust
/// use nexgen::document::tree_arguments;
/// use nexgen_phylo::{reader::parse_trees, Locus};
/// let single = Locus { trees: parse_trees("(A,(B,C));")?, ..Default::default() };
/// let double = Locus { trees: parse_trees("(A,(B,C));\n((A,B),C);")?, ..Default::default() };
/// assert_eq!(tree_arguments(&[single, double]), "(gt0,{gt1,gt2})");
/// # Ok::<(), color_eyre::eyre::Report>(())
/// ```
pub fn tree_arguments(loci: &[Locus]) -> String {
    let mut next = 0;
    let groups = loci
        .iter()
        .map(|locus| {
            let names = (next..next + locus.trees.len()).map(|i| format!("gt{i}")).collect_vec();
            next += locus.trees.len();
            match names.len() {
                1 => names.join(""),
                _ => format!("{{{}}}", names.join(",")),
            }
        })
        .join(",");
    format!("({groups})")
}

// ----------------------------------------------------------------------------
// Candidate
// ----------------------------------------------------------------------------

/// A written document waiting for validation.
///
/// Dropping a candidate deletes its file.
#[derive(Debug)]
pub struct Candidate {
    file: NamedTempFile,
    destination: PathBuf,
}

impl Candidate {
    fn create(destination: &Path, text: &str) -> Result<Candidate, Report> {
        crate::utils::create_parent_dir(&destination)?;
        let dir = match destination.parent() {
            Some(dir) if !dir.as_os_str().is_empty() => dir,
            _ => Path::new("."),
        };

        let mut file = tempfile::Builder::new()
            .prefix(".nexgen-")
            .suffix(".nexus")
            .tempfile_in(dir)
            .wrap_err_with(|| format!("Failed to create file in: {dir:?}"))?;
        file.write_all(text.as_bytes())
            .and_then(|_| file.flush())
            .wrap_err_with(|| format!("Failed to write file: {:?}", file.path()))?;
        debug!("Wrote candidate document: {:?}", file.path());

        Ok(Candidate { file, destination: destination.to_path_buf() })
    }

    /// Where the candidate currently lives.
    pub fn path(&self) -> &Path {
        self.file.path()
    }

    pub fn destination(&self) -> &Path {
        &self.destination
    }

    /// Move the candidate to its destination, replacing any existing file.
    pub fn persist(self) -> Result<PathBuf, GenerateError> {
        let Candidate { file, destination } = self;
        file.persist(&destination)
            .map_err(|e| GenerateError::Serialization(format!("Failed to save {destination:?}: {}", e.error)))?;
        info!("Wrote document: {destination:?}");
        Ok(destination)
    }
}
