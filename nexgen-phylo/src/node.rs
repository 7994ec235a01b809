use crate::FromNewick;
use color_eyre::eyre::{Report, Result};
use serde::{Deserialize, Serialize};
use std::default::Default;
use std::fmt::{Display, Formatter};

/// A [`Node`] in a [`GeneTree`](crate::GeneTree) graph.
#[derive(Clone, Debug, Default, Deserialize, Eq, Hash, PartialEq, Serialize)]
pub struct Node {
    /// [`Node`] label, a taxon name for tips.
    pub label: String,
}

#[rustfmt::skip]
impl Display for Node { fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result { write!(f, "{}", self.label) } }

impl Node {
    pub fn new(label: &str) -> Self {
        Node { label: label.to_string() }
    }
}

impl FromNewick for Node {
    /// Returns a [`Node`] created from a [Newick](https://en.wikipedia.org/wiki/Newick_format) node [`str`].
    ///
    /// Single quotes around the label are removed.
    ///
    /// ## Examples
    ///
    /// Just a node name.
    ///
    /// ```rust
    /// use nexgen_phylo::{Node, FromNewick};
    /// let node = Node::from_newick(&"A;")?;
    /// assert_eq!(node, Node::new("A"));
    /// # Ok::<(), color_eyre::eyre::Report>(())
    /// ```
    ///
    /// A node name and a branch length.
    ///
    /// ```rust
    /// use nexgen_phylo::{Node, FromNewick};
    /// let node = Node::from_newick(&"'Homo sapiens':0.2")?;
    /// assert_eq!(node, Node::new("Homo sapiens"));
    /// # Ok::<(), color_eyre::eyre::Report>(())
    /// ```
    fn from_newick(newick: &str) -> Result<Self, Report> {
        let newick = newick.replace(';', "");
        let label = newick.split(':').next().unwrap_or_default().trim();
        let label = label.trim_matches('\'');
        Ok(Node::new(label))
    }
}
