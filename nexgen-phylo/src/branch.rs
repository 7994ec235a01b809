use crate::FromNewick;

use color_eyre::eyre::{eyre, Report, Result, WrapErr};
use serde::{Deserialize, Serialize};
use std::default::Default;
use std::fmt::{Display, Formatter};

/// A [`Branch`] leading into a node of a [`GeneTree`](crate::GeneTree).
#[derive(Copy, Clone, Debug, Default, Deserialize, PartialEq, Serialize)]
pub struct Branch {
    /// [`Branch`] length (ex. 1.0), absent when the Newick gave none.
    pub length: Option<f64>,
}

#[rustfmt::skip]
impl Display for Branch {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self.length { Some(length) => write!(f, ":{length}"), None => Ok(()) }
    }
}

impl FromNewick for Branch {
    /// Returns a [`Branch`] created from a [Newick](https://en.wikipedia.org/wiki/Newick_format) node [`str`].
    ///
    /// # Examples
    ///
    /// Just a node name.
    ///
    /// ```rust
    /// use nexgen_phylo::{Branch, FromNewick};
    ///
    /// let branch = Branch::from_newick(&"A")?;
    /// assert_eq!(branch, Branch { length: None });
    /// # Ok::<(), color_eyre::eyre::Report>(())
    /// ```
    ///
    /// A node name with a branch length.
    ///
    /// ```rust
    /// # use nexgen_phylo::{Branch, FromNewick};
    /// let branch = Branch::from_newick(&"A:2.5")?;
    /// assert_eq!(branch, Branch { length: Some(2.5) });
    /// assert_eq!(branch.to_string(), ":2.5");
    /// # Ok::<(), color_eyre::eyre::Report>(())
    /// ```
    fn from_newick(newick: &str) -> Result<Branch, Report> {
        let attributes: Vec<_> = newick.replace(';', "").split(':').map(String::from).collect();
        let length = match attributes.len() >= 2 && !attributes[1].trim().is_empty() {
            true => Some(
                attributes[1]
                    .trim()
                    .parse()
                    .wrap_err_with(|| eyre!("Failed to parse branch length from newick: {newick}"))?,
            ),
            false => None,
        };

        Ok(Branch { length })
    }
}
