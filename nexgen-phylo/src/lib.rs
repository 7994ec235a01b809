//! Gene-tree parsing for `nexgen`.
//!
//! Reads rooted gene trees from [Newick](https://en.wikipedia.org/wiki/Newick_format)
//! strings and files (plain Newick or a NEXUS `TREES` block), keeps them as a
//! [`GeneTree`] graph, and writes them back out as Newick.

use color_eyre::eyre::{Report, Result};

mod branch;
pub mod newick;
mod node;
pub mod reader;
mod tree;

#[doc(inline)]
pub use branch::Branch;
#[doc(inline)]
pub use node::Node;
#[doc(inline)]
pub use reader::{read_trees, Locus};
#[doc(inline)]
pub use tree::GeneTree;

// ----------------------------------------------------------------------------
// Traits
// ----------------------------------------------------------------------------

/// Returns an object created from a [Newick](https://en.wikipedia.org/wiki/Newick_format) [`str`].
pub trait FromNewick {
    fn from_newick(newick: &str) -> Result<Self, Report>
    where
        Self: Sized;
}

/// Returns a [Newick](https://en.wikipedia.org/wiki/Newick_format) [`str`] created from an object.
pub trait ToNewick {
    fn to_newick(&self) -> Result<String, Report>;
}
