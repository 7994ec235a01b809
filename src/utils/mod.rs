//! Miscellaneous filesystem helpers.

use color_eyre::eyre::{Report, Result, WrapErr};
use log::debug;
use std::fmt::Debug;
use std::path::Path;

/// Create the parent directory of a file path, if it does not exist yet.
///
/// ## Examples
///
/// ```rust
/// use nexgen::utils::create_parent_dir;
/// let dir = tempfile::tempdir()?;
/// let path = dir.path().join("a").join("b").join("args.json");
/// create_parent_dir(&path)?;
/// assert!(dir.path().join("a").join("b").is_dir());
/// # Ok::<(), color_eyre::eyre::Report>(())
/// ```
pub fn create_parent_dir<P>(path: &P) -> Result<(), Report>
where
    P: AsRef<Path> + Debug,
{
    if let Some(dir) = path.as_ref().parent() {
        if !dir.as_os_str().is_empty() && !dir.exists() {
            debug!("Creating directory: {dir:?}");
            std::fs::create_dir_all(dir)
                .wrap_err_with(|| format!("Failed to create directory: {dir:?}"))?;
        }
    }
    Ok(())
}
