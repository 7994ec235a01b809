//! Errors surfaced to the user by document generation.

use crate::encode::InputMode;

use std::path::PathBuf;
use thiserror::Error;

/// Why a generate action did not produce a document.
///
/// Everything up to [`GenerateError::ExternalValidation`] is raised before any
/// file is opened. Later failures remove whatever was written.
#[derive(Debug, Error)]
pub enum GenerateError {
    #[error("No sequence or gene tree file has been uploaded.")]
    MissingData,
    #[error("No taxa were selected.")]
    EmptyTaxaSelection,
    #[error("No destination path was given for the document.")]
    EmptyDestination,
    #[error("No gene trees were found in: {0:?}")]
    NoTreeData(Vec<PathBuf>),
    #[error("Selected taxon {0:?} is not in the uploaded data.")]
    UnknownTaxon(String),
    #[error("Flag {flag:?} is not an option of {command}.")]
    UnknownFlag { command: String, flag: String },
    #[error("Flag {flag} expects {expected}, got {value:?}.")]
    InvalidOption { flag: String, expected: String, value: String },
    #[error("Sequences are encoded as {session}, but {requested} was requested.")]
    ModeMismatch { session: InputMode, requested: InputMode },
    #[error("{0} needs the number of reticulations.")]
    MissingReticulations(String),
    #[error("The validator rejected the document:\n{0}")]
    ExternalValidation(String),
    #[error("Failed to write the document: {0}")]
    Serialization(String),
}

impl GenerateError {
    /// Wrap any report raised while encoding or writing.
    pub fn serialization(report: color_eyre::eyre::Report) -> Self {
        GenerateError::Serialization(format!("{report:#}"))
    }
}
