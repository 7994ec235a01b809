//! Aligned [`SequenceMatrix`] and its FASTA / NEXUS readers.

#[cfg(test)]
mod tests;

use color_eyre::eyre::{eyre, ContextCompat, Report, Result, WrapErr};
use color_eyre::Help;
use indexmap::IndexMap;
use itertools::Itertools;
use log::debug;
use nexgen_phylo::newick;
use noodles::fasta;
use serde::{Deserialize, Serialize};
use std::default::Default;
use std::fmt::{Debug, Display, Formatter};
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

/// Gap symbol.
pub const GAP: char = '-';
/// Missing data symbol.
pub const MISSING: char = '?';

// ----------------------------------------------------------------------------
// Alphabet
// ----------------------------------------------------------------------------

/// Symbol alphabet of a [`SequenceMatrix`].
#[derive(Copy, Clone, Debug, Default, Deserialize, Eq, Hash, PartialEq, Serialize)]
pub enum Alphabet {
    /// Nucleotides, IUPAC ambiguity codes, gap and missing.
    #[default]
    Dna,
    /// Binary `0`/`1` states, gap and missing.
    Standard,
}

impl Display for Alphabet {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        let lowercase = format!("{:?}", self).to_lowercase();
        write!(f, "{lowercase}")
    }
}

impl Alphabet {
    /// Guess the alphabet from the symbols of a matrix.
    ///
    /// ```rust
    /// use nexgen::sequence::Alphabet;
    /// assert_eq!(Alphabet::detect("01?-0".chars()), Alphabet::Standard);
    /// assert_eq!(Alphabet::detect("ACGTN".chars()), Alphabet::Dna);
    /// ```
    pub fn detect<I>(symbols: I) -> Alphabet
    where
        I: IntoIterator<Item = char>,
    {
        let mut symbols = symbols.into_iter().peekable();
        if symbols.peek().is_none() {
            return Alphabet::Dna;
        }
        match symbols.all(|c| matches!(c, '0' | '1' | GAP | MISSING)) {
            true => Alphabet::Standard,
            false => Alphabet::Dna,
        }
    }
}

// ----------------------------------------------------------------------------
// Sequence Matrix
// ----------------------------------------------------------------------------

/// Taxon-labelled aligned sequences.
///
/// Rows keep their insertion order. Every row has the same length, fixed by the
/// first row added. Symbols are stored upper-case.
#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
pub struct SequenceMatrix {
    /// Symbol alphabet of the rows.
    pub alphabet: Alphabet,
    rows: Vec<(String, Vec<char>)>,
    nchar: Option<usize>,
}

impl Display for SequenceMatrix {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        for (taxon, sequence) in self.iter() {
            writeln!(f, "{taxon} {}", sequence.iter().collect::<String>())?;
        }
        Ok(())
    }
}

impl SequenceMatrix {
    /// Create an empty matrix.
    pub fn new(alphabet: Alphabet) -> Self {
        SequenceMatrix { alphabet, rows: Vec::new(), nchar: None }
    }

    /// Add a row.
    ///
    /// ## Examples
    ///
    /// ```rust
    /// use nexgen::sequence::{Alphabet, SequenceMatrix};
    /// let mut matrix = SequenceMatrix::new(Alphabet::Dna);
    /// matrix.push("a", "acgt".chars())?;
    /// assert_eq!(matrix.get("a"), Some(&['A', 'C', 'G', 'T'][..]));
    ///
    /// // rows must all be the same length, and labels unique
    /// assert!(matrix.push("b", "ACG".chars()).is_err());
    /// assert!(matrix.push("a", "ACGT".chars()).is_err());
    /// # Ok::<(), color_eyre::eyre::Report>(())
    /// ```
    pub fn push<S, I>(&mut self, taxon: S, sequence: I) -> Result<(), Report>
    where
        S: Into<String>,
        I: IntoIterator<Item = char>,
    {
        let taxon = taxon.into();
        let sequence = sequence.into_iter().map(|c| c.to_ascii_uppercase()).collect_vec();

        if self.get(&taxon).is_some() {
            return Err(eyre!("Duplicate taxon label in matrix: {taxon}"));
        }
        match self.nchar {
            Some(nchar) if nchar != sequence.len() => {
                return Err(eyre!(
                    "Sequence {taxon} has length {} but the matrix has length {nchar}.",
                    sequence.len()
                )
                .suggestion(format!("Are you sure {taxon} is aligned correctly?")));
            }
            Some(_) => (),
            None => self.nchar = Some(sequence.len()),
        }
        self.rows.push((taxon, sequence));
        Ok(())
    }

    /// Number of taxa (rows).
    pub fn ntax(&self) -> usize {
        self.rows.len()
    }

    /// Number of characters (columns).
    pub fn nchar(&self) -> usize {
        self.nchar.unwrap_or_default()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Taxon labels in row order.
    pub fn taxa(&self) -> Vec<&str> {
        self.rows.iter().map(|(taxon, _)| taxon.as_str()).collect_vec()
    }

    /// Sequence of a taxon.
    pub fn get(&self, taxon: &str) -> Option<&[char]> {
        self.rows.iter().find(|(t, _)| t == taxon).map(|(_, s)| s.as_slice())
    }

    /// Iterate over `(taxon, sequence)` rows.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &[char])> {
        self.rows.iter().map(|(t, s)| (t.as_str(), s.as_slice()))
    }

    /// Symbols of one column, in row order.
    pub fn column(&self, i: usize) -> impl Iterator<Item = char> + '_ {
        self.rows.iter().map(move |(_, s)| s[i])
    }

    /// Join matrices column-wise, matching rows by taxon label.
    ///
    /// All matrices must share the same taxon set. Row order follows the first matrix.
    ///
    /// ```rust
    /// use nexgen::sequence::{Alphabet, SequenceMatrix};
    /// let mut m1 = SequenceMatrix::new(Alphabet::Standard);
    /// m1.push("a", "01".chars())?;
    /// m1.push("b", "10".chars())?;
    /// let mut m2 = SequenceMatrix::new(Alphabet::Standard);
    /// m2.push("b", "1".chars())?;
    /// m2.push("a", "0".chars())?;
    ///
    /// let joined = SequenceMatrix::concat(&[m1, m2])?;
    /// assert_eq!(joined.get("a"), Some(&['0', '1', '0'][..]));
    /// assert_eq!(joined.nchar(), 3);
    /// # Ok::<(), color_eyre::eyre::Report>(())
    /// ```
    pub fn concat(matrices: &[SequenceMatrix]) -> Result<SequenceMatrix, Report> {
        let first = matrices.first().context("No matrices to concatenate.")?;
        if let Some(m) = matrices.iter().find(|m| m.ntax() != first.ntax()) {
            return Err(eyre!(
                "Matrices have different taxon counts ({} vs {}).",
                first.ntax(),
                m.ntax()
            ));
        }

        let mut output = SequenceMatrix::new(first.alphabet);

        for taxon in first.taxa() {
            let sequence = matrices
                .iter()
                .map(|m| {
                    m.get(taxon).ok_or_else(|| eyre!("Taxon {taxon} is missing from a matrix."))
                })
                .collect::<Result<Vec<_>, Report>>()?
                .concat();
            output.push(taxon, sequence)?;
        }
        Ok(output)
    }

    /// Check that another matrix has exactly the same taxon set.
    pub fn same_taxa(&self, other: &SequenceMatrix) -> bool {
        self.ntax() == other.ntax() && self.taxa().iter().all(|t| other.get(t).is_some())
    }
}

// ----------------------------------------------------------------------------
// Readers
// ----------------------------------------------------------------------------

/// Sequence file formats understood by [`read`].
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Format {
    Fasta,
    Nexus,
}

impl Format {
    /// Get the format from a file extension, falling back to the file's first symbol.
    pub fn detect<P>(path: &P) -> Result<Format, Report>
    where
        P: AsRef<Path> + Debug,
    {
        let ext = path.as_ref().extension().and_then(|e| e.to_str()).map(|e| e.to_lowercase());
        match ext.as_deref() {
            Some("fasta" | "fa" | "fas" | "fna" | "afa") => Ok(Format::Fasta),
            Some("nexus" | "nex" | "nxs") => Ok(Format::Nexus),
            _ => {
                let text = std::fs::read_to_string(path)
                    .wrap_err_with(|| format!("Failed to read: {path:?}"))?;
                let text = text.trim_start();
                if text.starts_with('>') {
                    Ok(Format::Fasta)
                } else if text.to_ascii_lowercase().starts_with("#nexus") {
                    Ok(Format::Nexus)
                } else {
                    Err(eyre!("Unknown sequence file format: {path:?}")
                        .suggestion("Options: fasta (.fasta, .fa, .fas) or nexus (.nexus, .nex)"))
                }
            }
        }
    }
}

/// Read an aligned sequence file, FASTA or NEXUS.
pub fn read<P>(path: &P) -> Result<SequenceMatrix, Report>
where
    P: AsRef<Path> + Debug,
{
    let matrix = match Format::detect(path)? {
        Format::Fasta => read_fasta(path)?,
        Format::Nexus => read_nexus(path)?,
    };
    debug!(
        "Read {} taxa x {} characters ({}) from {path:?}",
        matrix.ntax(),
        matrix.nchar(),
        matrix.alphabet
    );
    Ok(matrix)
}

/// Read all records of an aligned fasta file.
pub fn read_fasta<P>(path: &P) -> Result<SequenceMatrix, Report>
where
    P: AsRef<Path> + Debug,
{
    // raise error if file doesn't exist
    let mut reader = File::open(path)
        .map(BufReader::new)
        .map(fasta::Reader::new)
        .wrap_err_with(|| format!("Failed to open fasta: {path:?}"))?;

    let mut rows = Vec::new();
    for result in reader.records() {
        let record = result.wrap_err_with(|| format!("Failed to parse fasta record: {path:?}"))?;
        let name = String::from_utf8_lossy(record.name().as_ref()).to_string();
        let sequence = record.sequence().as_ref().iter().map(|b| *b as char).collect_vec();
        rows.push((name, sequence));
    }

    let alphabet = Alphabet::detect(rows.iter().flat_map(|(_, s)| s.iter().copied()));
    let mut matrix = SequenceMatrix::new(alphabet);
    for (name, sequence) in rows {
        matrix.push(name, sequence).wrap_err_with(|| format!("Invalid alignment: {path:?}"))?;
    }
    Ok(matrix)
}

/// Read the matrix of the first DATA or CHARACTERS block of a NEXUS file.
pub fn read_nexus<P>(path: &P) -> Result<SequenceMatrix, Report>
where
    P: AsRef<Path> + Debug,
{
    let text =
        std::fs::read_to_string(path).wrap_err_with(|| format!("Failed to read nexus: {path:?}"))?;
    parse_nexus(&text).wrap_err_with(|| format!("Failed to parse nexus: {path:?}"))
}

/// Parse the matrix of the first DATA or CHARACTERS block of a NEXUS string.
///
/// Interleaved matrices are supported, rows with a repeated label are appended.
///
/// ## Examples
///
/// ```rust
/// use nexgen::sequence::{parse_nexus, Alphabet};
/// let text = "#NEXUS
/// Begin data;
/// Dimensions ntax=2 nchar=4;
/// Format datatype=dna missing=? gap=-;
/// Matrix
/// 'taxon one' ACGT
/// two ACGA
/// ;
/// End;";
/// let matrix = parse_nexus(text)?;
/// assert_eq!(matrix.taxa(), ["taxon one", "two"]);
/// assert_eq!(matrix.alphabet, Alphabet::Dna);
/// assert_eq!(matrix.nchar(), 4);
/// # Ok::<(), color_eyre::eyre::Report>(())
/// ```
pub fn parse_nexus(text: &str) -> Result<SequenceMatrix, Report> {
    let text = newick::strip_comments(text);
    let lower = text.to_ascii_lowercase();

    let start = ["begin data;", "begin characters;"]
        .iter()
        .filter_map(|block| lower.find(block).map(|i| i + block.len()))
        .min()
        .ok_or_else(|| eyre!("No DATA or CHARACTERS block was found."))?;
    let end = lower[start..]
        .find("end;")
        .map(|i| start + i)
        .ok_or_else(|| eyre!("Data block is missing its 'END;'."))?;

    let mut alphabet = None;
    let mut rows: IndexMap<String, String> = IndexMap::new();

    for statement in newick::split_statements(&text[start..end]) {
        let statement_lower = statement.to_ascii_lowercase();
        let keyword = statement_lower.split_whitespace().next().unwrap_or_default();
        match keyword {
            "format" => {
                let datatype = statement_lower.replace(' ', "");
                if datatype.contains("datatype=standard") || datatype.contains("symbols=\"01\"") {
                    alphabet = Some(Alphabet::Standard);
                } else if datatype.contains("datatype=dna") || datatype.contains("datatype=nucleotide") {
                    alphabet = Some(Alphabet::Dna);
                }
            }
            "matrix" => {
                for line in statement["matrix".len()..].lines().map(str::trim) {
                    if line.is_empty() {
                        continue;
                    }
                    let (label, sequence) = split_matrix_line(line)?;
                    rows.entry(label).or_default().push_str(&sequence);
                }
            }
            _ => debug!("Skipping data statement: {keyword}"),
        }
    }

    if rows.is_empty() {
        return Err(eyre!("The data block has no matrix rows."));
    }
    let alphabet = alphabet.unwrap_or_else(|| Alphabet::detect(rows.values().flat_map(|s| s.chars())));
    let mut matrix = SequenceMatrix::new(alphabet);
    for (label, sequence) in rows {
        matrix.push(label, sequence.chars())?;
    }
    Ok(matrix)
}

/// Split a matrix line into a (possibly quoted) label and its whitespace-free sequence.
fn split_matrix_line(line: &str) -> Result<(String, String), Report> {
    let (label, rest) = match line.strip_prefix('\'') {
        Some(quoted) => {
            let close = quoted.find('\'').ok_or_else(|| eyre!("Unclosed quote in matrix row: {line}"))?;
            (&quoted[..close], &quoted[close + 1..])
        }
        None => line
            .split_once(char::is_whitespace)
            .ok_or_else(|| eyre!("Matrix row has no sequence: {line}"))?,
    };
    let sequence: String = rest.chars().filter(|c| !c.is_whitespace()).collect();
    if sequence.is_empty() {
        return Err(eyre!("Matrix row has no sequence: {line}"));
    }
    Ok((label.to_string(), sequence))
}
