//! Check a written document with PhyloNet, and delete it if rejected.


use crate::error::GenerateError;

use color_eyre::eyre::{eyre, Report, Result, WrapErr};
use color_eyre::Help;
use log::{debug, info, warn};
use regex::Regex;
use std::fmt::Debug;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::process::Command;

/// Position annotations appended to parser messages, ex. ` at [3,14]`.
const POSITION: &str = r" at \[[0-9]+,[0-9]+\]";

/// Outcome of checking a document.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Verdict {
    Accepted,
    /// Rejected, with the checker's cleaned message.
    Rejected(String),
}

// ----------------------------------------------------------------------------
// Checker
// ----------------------------------------------------------------------------

/// Something that can tell whether PhyloNet will accept a document.
pub trait Checker: Debug + Send + Sync {
    /// Check the document at `path`.
    ///
    /// Returns an error only if the check itself could not be run.
    fn check(&self, path: &Path) -> Result<Verdict, Report>;
}

/// Runs `<java> -jar <jar> <document> checkParams`.
///
/// `checkParams` makes PhyloNet parse the document and its command without
/// running the inference.
#[derive(Clone, Debug)]
pub struct JavaChecker {
    /// Java executable.
    pub java: PathBuf,
    /// PhyloNet jar.
    pub jar: PathBuf,
}

impl JavaChecker {
    pub fn new<P>(java: P, jar: P) -> Self
    where
        P: Into<PathBuf>,
    {
        JavaChecker { java: java.into(), jar: jar.into() }
    }
}

impl Checker for JavaChecker {
    fn check(&self, path: &Path) -> Result<Verdict, Report> {
        debug!("Running: {:?} -jar {:?} {path:?} checkParams", self.java, self.jar);
        let output = Command::new(&self.java)
            .arg("-jar")
            .arg(&self.jar)
            .arg(path)
            .arg("checkParams")
            .output()
            .map_err(|e| match e.kind() {
                ErrorKind::NotFound => eyre!("Java executable was not found: {:?}", self.java)
                    .suggestion("Please install Java, or give its location with --java."),
                _ => Report::new(e).wrap_err(format!("Failed to run: {:?}", self.java)),
            })?;

        if output.status.success() {
            return Ok(Verdict::Accepted);
        }
        debug!("Checker exited with: {}", output.status);
        let combined = format!(
            "{}{}",
            String::from_utf8_lossy(&output.stdout),
            String::from_utf8_lossy(&output.stderr)
        );
        Ok(Verdict::Rejected(clean_message(&combined)?))
    }
}

/// Accepts everything, for when no PhyloNet jar is available.
#[derive(Clone, Copy, Debug, Default)]
pub struct Unchecked;

impl Checker for Unchecked {
    fn check(&self, path: &Path) -> Result<Verdict, Report> {
        warn!("No PhyloNet jar was given, {path:?} was not validated.");
        Ok(Verdict::Accepted)
    }
}

// ----------------------------------------------------------------------------
// Functions
// ----------------------------------------------------------------------------

/// Tidy a checker message for display.
///
/// Drops one leading blank line and every ` at [row,col]` annotation.
///
/// ```rust
/// use nexgen::validate::clean_message;
/// let message = "\nUnknown option -zz at [12,40] for MCMC_GT at [12,1]";
/// assert_eq!(clean_message(message)?, "Unknown option -zz for MCMC_GT");
/// # Ok::<(), color_eyre::eyre::Report>(())
/// ```
pub fn clean_message(message: &str) -> Result<String, Report> {
    let message = message
        .strip_prefix("\r\n")
        .or_else(|| message.strip_prefix('\n'))
        .unwrap_or(message);
    let position = Regex::new(POSITION).wrap_err("Failed to compile position pattern.")?;
    Ok(position.replace_all(message, "").to_string())
}

/// Check a written document, deleting it unless it is accepted.
///
/// A checker that cannot run at all is reported as
/// [`GenerateError::ExternalValidation`], and the document is deleted too.
pub fn validate<C>(checker: &C, path: &Path) -> Result<Verdict, GenerateError>
where
    C: Checker + ?Sized,
{
    match checker.check(path) {
        Ok(Verdict::Accepted) => {
            info!("Document passed validation: {path:?}");
            Ok(Verdict::Accepted)
        }
        Ok(Verdict::Rejected(message)) => {
            info!("Document failed validation, deleting: {path:?}");
            remove(path);
            Ok(Verdict::Rejected(message))
        }
        Err(report) => {
            remove(path);
            Err(GenerateError::ExternalValidation(format!("{report:#}")))
        }
    }
}

fn remove(path: &Path) {
    if let Err(e) = std::fs::remove_file(path) {
        if e.kind() != ErrorKind::NotFound {
            warn!("Failed to delete rejected document {path:?}: {e}");
        }
    }
}
