use crate::{newick, Branch, FromNewick, Node, ToNewick};

use color_eyre::eyre::{eyre, ContextCompat, Report, Result};
use itertools::Itertools;
use petgraph::graph::{Graph, NodeIndex};
use petgraph::visit::EdgeRef;
use petgraph::Direction;
use std::collections::HashMap;
use std::default::Default;

/// A rooted gene tree, as a directed graph of parents and children.
///
/// Internal nodes may have empty labels. Child order follows the order of the
/// source Newick.
#[derive(Clone, Debug)]
pub struct GeneTree {
    /// Directed graph from parent to child, branches are stored on the edge into the child.
    pub graph: Graph<Node, Branch>,
    root: Option<NodeIndex>,
    root_branch: Branch,
}

impl Default for GeneTree {
    fn default() -> Self {
        Self::new()
    }
}

impl GeneTree {
    /// Returns a new empty [`GeneTree`].
    pub fn new() -> Self {
        GeneTree { graph: Graph::new(), root: None, root_branch: Branch::default() }
    }

    /// Returns true if the tree has no nodes.
    pub fn is_empty(&self) -> bool {
        self.graph.node_count() == 0
    }

    /// Returns the tip (taxon) labels, left to right.
    ///
    /// ## Examples
    ///
    /// ```rust
    /// use nexgen_phylo::{FromNewick, GeneTree};
    /// let tree = GeneTree::from_newick("((A:1,B:2)x:0.5,C);")?;
    /// assert_eq!(tree.tips(), ["A", "B", "C"]);
    /// # Ok::<(), color_eyre::eyre::Report>(())
    /// ```
    pub fn tips(&self) -> Vec<&str> {
        self.graph
            .externals(Direction::Outgoing)
            .map(|i| self.graph[i].label.as_str())
            .collect_vec()
    }

    /// Rename node labels using a NEXUS `translate` table.
    ///
    /// Labels missing from the table are left as they are.
    pub fn translate(&mut self, table: &HashMap<String, String>) {
        self.graph.node_weights_mut().for_each(|node| {
            if let Some(label) = table.get(&node.label) {
                node.label = label.clone();
            }
        });
    }

    /// Children of a node in source order.
    fn children(&self, parent: NodeIndex) -> Vec<(NodeIndex, &Branch)> {
        // petgraph yields outgoing edges newest first
        self.graph
            .edges_directed(parent, Direction::Outgoing)
            .sorted_by_key(|e| e.id())
            .map(|e| (e.target(), e.weight()))
            .collect_vec()
    }

    fn parse_subtree(
        &mut self,
        chars: &[char],
        pos: &mut usize,
    ) -> Result<(NodeIndex, Branch), Report> {
        let mut children = Vec::new();

        if chars.get(*pos) == Some(&'(') {
            *pos += 1;
            loop {
                children.push(self.parse_subtree(chars, pos)?);
                match chars.get(*pos) {
                    Some(',') => *pos += 1,
                    Some(')') => {
                        *pos += 1;
                        break;
                    }
                    _ => Err(eyre!("Unbalanced parentheses in newick at position {}.", *pos))?,
                }
            }
        }

        let token = newick::read_token(chars, pos);
        let node = Node::from_newick(&token)?;
        let branch = Branch::from_newick(&token)?;

        if node.label.is_empty() && children.is_empty() {
            Err(eyre!("Found a tip without a label at position {}.", *pos))?;
        }

        let index = self.graph.add_node(node);
        children.into_iter().for_each(|(child, child_branch)| {
            self.graph.add_edge(index, child, child_branch);
        });

        Ok((index, branch))
    }

    fn write_subtree(&self, index: NodeIndex, output: &mut String) {
        let children = self.children(index);
        if !children.is_empty() {
            output.push('(');
            for (i, (child, branch)) in children.into_iter().enumerate() {
                if i > 0 {
                    output.push(',');
                }
                self.write_subtree(child, output);
                output.push_str(&branch.to_string());
            }
            output.push(')');
        }
        output.push_str(&newick::quote_label(&self.graph[index].label));
    }
}

impl FromNewick for GeneTree {
    /// Returns a [`GeneTree`] created from a [Newick](https://en.wikipedia.org/wiki/Newick_format) [`str`].
    ///
    /// ## Examples
    ///
    /// ```rust
    /// use nexgen_phylo::{FromNewick, GeneTree, ToNewick};
    /// let tree = GeneTree::from_newick("[&U] ((A,B),(C,D));")?;
    /// assert_eq!(tree.tips(), ["A", "B", "C", "D"]);
    /// assert_eq!(tree.to_newick()?, "((A,B),(C,D));");
    /// # Ok::<(), color_eyre::eyre::Report>(())
    /// ```
    ///
    /// A tip without a label is an error.
    ///
    /// ```rust
    /// use nexgen_phylo::{FromNewick, GeneTree};
    /// assert!(GeneTree::from_newick("(A,,B);").is_err());
    /// ```
    fn from_newick(newick: &str) -> Result<Self, Report> {
        let cleaned = newick::strip_comments(newick);
        let cleaned = cleaned.trim().trim_end_matches(';').trim();
        if cleaned.is_empty() {
            Err(eyre!("Newick string is empty: {newick:?}"))?;
        }

        let chars = cleaned.chars().collect_vec();
        let mut pos = 0;
        let mut tree = GeneTree::new();
        let (root, root_branch) = tree.parse_subtree(&chars, &mut pos)?;

        if pos != chars.len() {
            Err(eyre!("Unexpected content at position {pos} of newick: {newick}"))?;
        }

        tree.root = Some(root);
        tree.root_branch = root_branch;
        Ok(tree)
    }
}

impl ToNewick for GeneTree {
    /// Returns a [Newick](https://en.wikipedia.org/wiki/Newick_format) [`str`] of the tree, terminated with `;`.
    ///
    /// ```rust
    /// use nexgen_phylo::{FromNewick, GeneTree, ToNewick};
    /// let nwk = "((A:1,'B c':2.5)90:0.5,C):0;";
    /// let tree = GeneTree::from_newick(nwk)?;
    /// assert_eq!(tree.to_newick()?, nwk);
    /// # Ok::<(), color_eyre::eyre::Report>(())
    /// ```
    fn to_newick(&self) -> Result<String, Report> {
        let root = self.root.context("Cannot write newick for an empty tree.")?;
        let mut output = String::new();
        self.write_subtree(root, &mut output);
        output.push_str(&self.root_branch.to_string());
        output.push(';');
        Ok(output)
    }
}
