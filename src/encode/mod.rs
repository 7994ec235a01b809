//! Phase diploid sequences and encode columns as bi-allelic markers.
//!
//! The encoded [`SequenceMatrix`] is the only place the marker count (`nchar`)
//! is computed, the document writer reads it from there.

#[cfg(test)]
mod tests;

use crate::sequence::{Alphabet, SequenceMatrix, GAP};

#[cfg(feature = "cli")]
use clap::ValueEnum;
use color_eyre::eyre::{Report, Result};
use itertools::Itertools;
use log::debug;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt::{Display, Formatter};

/// Two-way IUPAC ambiguity codes, with the base given to haplotype `_0` first.
pub const AMBIGUITY: [(char, [char; 2]); 6] = [
    ('M', ['A', 'C']),
    ('R', ['A', 'G']),
    ('W', ['A', 'T']),
    ('S', ['C', 'G']),
    ('Y', ['C', 'T']),
    ('K', ['G', 'T']),
];

/// Symbols that drop a whole column when phasing.
pub const DROP: [char; 6] = ['V', 'H', 'D', 'B', 'N', GAP];

// ----------------------------------------------------------------------------
// Input Mode
// ----------------------------------------------------------------------------

/// How uploaded sequences are turned into bi-allelic markers.
#[derive(Copy, Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
#[cfg_attr(feature = "cli", derive(ValueEnum))]
pub enum InputMode {
    /// Haploid sequences, binarize only.
    #[default]
    Phased,
    /// Diploid sequences with ambiguity codes, phase then binarize.
    Unphased,
    /// Sequences already coded as `0`/`1`.
    Biallelic,
}

impl Display for InputMode {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        let lowercase = format!("{:?}", self).to_lowercase();
        write!(f, "{lowercase}")
    }
}

// ----------------------------------------------------------------------------
// Functions
// ----------------------------------------------------------------------------

/// Resolve a two-way ambiguity code into its bases.
pub fn resolve(symbol: char) -> Option<[char; 2]> {
    AMBIGUITY.iter().find(|(code, _)| *code == symbol).map(|(_, bases)| *bases)
}

/// Label of one haplotype of a phased taxon.
pub fn haplotype(taxon: &str, i: usize) -> String {
    format!("{taxon}_{i}")
}

/// Split each diploid sequence into two haplotypes.
///
/// Columns holding any symbol of [`DROP`] are removed from every haplotype.
/// Ambiguity codes give their first base to `_0` and their second to `_1`,
/// other symbols are copied to both.
///
/// ## Examples
///
/// ```rust
/// use nexgen::{encode, sequence::{Alphabet, SequenceMatrix}};
/// let mut matrix = SequenceMatrix::new(Alphabet::Dna);
/// matrix.push("X", "AMN".chars())?;
///
/// let phased = encode::phase(&matrix)?;
/// assert_eq!(phased.taxa(), ["X_0", "X_1"]);
/// assert_eq!(phased.get("X_0"), Some(&['A', 'A'][..]));
/// assert_eq!(phased.get("X_1"), Some(&['A', 'C'][..]));
/// # Ok::<(), color_eyre::eyre::Report>(())
/// ```
pub fn phase(matrix: &SequenceMatrix) -> Result<SequenceMatrix, Report> {
    let retained = (0..matrix.nchar())
        .filter(|&i| !matrix.column(i).any(|c| DROP.contains(&c)))
        .collect_vec();

    let mut phased = SequenceMatrix::new(matrix.alphabet);
    for (taxon, sequence) in matrix.iter() {
        let (first, second): (Vec<char>, Vec<char>) = retained
            .iter()
            .map(|&i| match resolve(sequence[i]) {
                Some([a, b]) => (a, b),
                None => (sequence[i], sequence[i]),
            })
            .unzip();
        phased.push(haplotype(taxon, 0), first)?;
        phased.push(haplotype(taxon, 1), second)?;
    }

    debug!(
        "Phased {} taxa, kept {} of {} columns.",
        matrix.ntax(),
        retained.len(),
        matrix.nchar()
    );
    Ok(phased)
}

/// Encode columns with exactly two distinct, non-gap symbols as `0`/`1`.
///
/// The smaller symbol (by character order) becomes `0`. Every other column is
/// dropped. A matrix without columns encodes to empty rows.
///
/// ## Examples
///
/// ```rust
/// use nexgen::{encode, sequence::{Alphabet, SequenceMatrix}};
/// let mut matrix = SequenceMatrix::new(Alphabet::Dna);
/// matrix.push("taxon1", "ACGT".chars())?;
/// matrix.push("taxon2", "ACGA".chars())?;
///
/// let markers = encode::to_biallelic(&matrix)?;
/// assert_eq!(markers.nchar(), 1);
/// assert_eq!(markers.get("taxon1"), Some(&['1'][..]));
/// assert_eq!(markers.get("taxon2"), Some(&['0'][..]));
/// # Ok::<(), color_eyre::eyre::Report>(())
/// ```
pub fn to_biallelic(matrix: &SequenceMatrix) -> Result<SequenceMatrix, Report> {
    // (column, symbol encoded as 0)
    let columns: Vec<(usize, char)> = (0..matrix.nchar())
        .into_par_iter()
        .filter_map(|i| {
            let symbols: BTreeSet<char> = matrix.column(i).collect();
            match symbols.len() == 2 && !symbols.contains(&GAP) {
                true => symbols.into_iter().next().map(|zero| (i, zero)),
                false => None,
            }
        })
        .collect();

    let mut markers = SequenceMatrix::new(Alphabet::Standard);
    for (taxon, sequence) in matrix.iter() {
        let encoded = columns.iter().map(|&(i, zero)| match sequence[i] == zero {
            true => '0',
            false => '1',
        });
        markers.push(taxon, encoded)?;
    }

    debug!("Encoded {} of {} columns as bi-allelic markers.", columns.len(), matrix.nchar());
    Ok(markers)
}

/// Encode one matrix according to the input mode.
pub fn encode(matrix: &SequenceMatrix, mode: InputMode) -> Result<SequenceMatrix, Report> {
    match mode {
        InputMode::Unphased => to_biallelic(&phase(matrix)?),
        InputMode::Phased | InputMode::Biallelic => to_biallelic(matrix),
    }
}

/// Encode several matrices (one per uploaded file) and join their markers.
pub fn encode_all(matrices: &[SequenceMatrix], mode: InputMode) -> Result<SequenceMatrix, Report> {
    let encoded = matrices.iter().map(|m| encode(m, mode)).collect::<Result<Vec<_>, Report>>()?;
    match encoded.len() {
        1 => Ok(encoded.into_iter().next().unwrap_or_default()),
        _ => SequenceMatrix::concat(&encoded),
    }
}

/// Labels of the taxa that reach inference, doubled when phasing.
///
/// ```rust
/// use nexgen::encode::{taxa, InputMode};
/// assert_eq!(taxa(&["a", "b"], InputMode::Unphased), ["a_0", "a_1", "b_0", "b_1"]);
/// assert_eq!(taxa(&["a", "b"], InputMode::Phased), ["a", "b"]);
/// ```
pub fn taxa(labels: &[&str], mode: InputMode) -> Vec<String> {
    match mode {
        InputMode::Unphased => {
            labels.iter().flat_map(|t| [haplotype(t, 0), haplotype(t, 1)]).collect_vec()
        }
        InputMode::Phased | InputMode::Biallelic => {
            labels.iter().map(|t| t.to_string()).collect_vec()
        }
    }
}
