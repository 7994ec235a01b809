//! Read gene trees from Newick or NEXUS files.

use crate::{newick, FromNewick, GeneTree};

use color_eyre::eyre::{eyre, Report, Result, WrapErr};
use color_eyre::Help;
use itertools::Itertools;
use log::debug;
use std::collections::HashMap;
use std::fmt::Debug;
use std::path::{Path, PathBuf};

/// Gene trees read from one file, treated as one locus.
#[derive(Clone, Debug, Default)]
pub struct Locus {
    /// File the trees were read from.
    pub path: PathBuf,
    /// Trees in file order.
    pub trees: Vec<GeneTree>,
}

impl Locus {
    /// Returns the tip labels of all trees, in first-seen order.
    pub fn taxa(&self) -> Vec<&str> {
        self.trees.iter().flat_map(|tree| tree.tips()).unique().collect_vec()
    }
}

/// Read every tree in a Newick or NEXUS file.
///
/// A file that parses but holds no trees returns an empty [`Locus`], the caller
/// decides whether that is an error.
pub fn read_trees<P>(path: &P) -> Result<Locus, Report>
where
    P: AsRef<Path> + Debug,
{
    let text = std::fs::read_to_string(path)
        .wrap_err_with(|| format!("Failed to read gene tree file: {path:?}"))?;
    let trees = parse_trees(&text)
        .wrap_err_with(|| format!("Failed to parse gene trees: {path:?}"))
        .suggestion("Gene tree files must be Newick (one tree per ';') or NEXUS with a TREES block.")?;
    debug!("Read {} gene trees from {path:?}", trees.len());

    Ok(Locus { path: path.as_ref().to_path_buf(), trees })
}

/// Parse trees from text, detecting NEXUS by its `#NEXUS` header.
///
/// ## Examples
///
/// ```rust
/// use nexgen_phylo::reader::parse_trees;
/// let trees = parse_trees("((A,B),C);\n((A,C),B);")?;
/// assert_eq!(trees.len(), 2);
/// # Ok::<(), color_eyre::eyre::Report>(())
/// ```
pub fn parse_trees(text: &str) -> Result<Vec<GeneTree>, Report> {
    let text = newick::strip_comments(text);
    match text.trim_start().to_ascii_lowercase().starts_with("#nexus") {
        true => parse_nexus_trees(&text),
        false => newick::split_statements(&text)
            .iter()
            .map(|statement| GeneTree::from_newick(statement))
            .collect(),
    }
}

/// Parse the trees of every `TREES` block in a NEXUS string, applying `translate` tables.
fn parse_nexus_trees(text: &str) -> Result<Vec<GeneTree>, Report> {
    let lower = text.to_ascii_lowercase();
    let mut trees = Vec::new();
    let mut offset = 0;

    while let Some(start) = lower[offset..].find("begin trees;") {
        let start = offset + start + "begin trees;".len();
        let end = lower[start..]
            .find("end;")
            .map(|end| start + end)
            .ok_or_else(|| eyre!("TREES block is missing its 'END;'."))?;
        offset = end + "end;".len();

        let mut table = HashMap::new();
        for statement in newick::split_statements(&text[start..end]) {
            let keyword = statement.split_whitespace().next().unwrap_or_default().to_ascii_lowercase();
            match keyword.as_str() {
                "translate" => table = parse_translate(&statement["translate".len()..])?,
                "tree" | "utree" => {
                    let (_, nwk) = statement
                        .split_once('=')
                        .ok_or_else(|| eyre!("Tree statement has no '=': {statement}"))?;
                    let mut tree = GeneTree::from_newick(nwk)?;
                    tree.translate(&table);
                    trees.push(tree);
                }
                _ => debug!("Skipping TREES statement: {statement}"),
            }
        }
    }

    Ok(trees)
}

/// Parse the body of a `translate` statement (`1 A, 2 'B c'`).
fn parse_translate(body: &str) -> Result<HashMap<String, String>, Report> {
    body.split(',')
        .map(str::trim)
        .filter(|pair| !pair.is_empty())
        .map(|pair| {
            let (key, label) = pair
                .split_once(char::is_whitespace)
                .ok_or_else(|| eyre!("Malformed translate entry: {pair}"))?;
            Ok((key.to_string(), label.trim().trim_matches('\'').to_string()))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ToNewick;
    use indoc::indoc;
    use std::io::Write;

    #[test]
    fn nexus_with_translate() -> Result<(), Report> {
        let text = indoc! {"
            #NEXUS
            BEGIN TREES;
              TRANSLATE 1 A, 2 B, 3 'C d';
              TREE gt0 = [&U] ((1,2),3);
              TREE gt1 = ((1,3),2);
            END;
        "};
        let trees = parse_trees(text)?;
        let observed = trees.iter().map(|t| t.to_newick()).collect::<Result<Vec<_>, Report>>()?;
        let expected = vec!["((A,B),'C d');", "((A,'C d'),B);"];
        assert_eq!(expected, observed);
        Ok(())
    }

    #[test]
    fn nexus_without_trees() -> Result<(), Report> {
        let trees = parse_trees("#NEXUS\nBEGIN TAXA;\nDIMENSIONS NTAX=2;\nEND;\n")?;
        assert!(trees.is_empty());
        Ok(())
    }

    #[test]
    fn locus_taxa_first_seen() -> Result<(), Report> {
        let mut file = tempfile::NamedTempFile::new()?;
        writeln!(file, "((A,B),C);")?;
        writeln!(file, "((D,A),C);")?;
        let locus = read_trees(&file.path())?;
        assert_eq!(locus.trees.len(), 2);
        assert_eq!(locus.taxa(), ["A", "B", "C", "D"]);
        Ok(())
    }

    #[test]
    fn malformed_newick() {
        assert!(parse_trees("((A,B),C;").is_err());
    }
}
