//! Associate taxa with species, and group taxa by species.

#[cfg(test)]
mod tests;

use crate::error::GenerateError;

use indexmap::IndexMap;
use itertools::Itertools;
use log::{debug, info};
use nexgen_phylo::newick::quote_label;
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

// ----------------------------------------------------------------------------
// Taxon Species Map
// ----------------------------------------------------------------------------

/// Many-to-one map from taxon label to species label, in taxon insertion order.
#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
pub struct TaxonSpeciesMap(IndexMap<String, String>);

impl TaxonSpeciesMap {
    /// Identity map, every taxon is its own species.
    pub fn initialize<S>(taxa: &[S]) -> Self
    where
        S: AsRef<str>,
    {
        TaxonSpeciesMap(
            taxa.iter().map(|t| (t.as_ref().to_string(), t.as_ref().to_string())).collect(),
        )
    }

    /// Reuse an existing map if it covers every taxon, otherwise start over.
    ///
    /// A taxon missing from `existing` means the uploaded files changed, and
    /// the whole mapping is reset to identity over `taxa`.
    ///
    /// ## Examples
    ///
    /// ```rust
    /// use nexgen::taxa::TaxonSpeciesMap;
    /// let mut map = TaxonSpeciesMap::initialize(&["a", "b"]);
    /// map.assign("b", "sp1")?;
    ///
    /// let kept = TaxonSpeciesMap::merge(Some(&map), &["a", "b"]);
    /// assert_eq!(kept.get("b"), Some("sp1"));
    ///
    /// let reset = TaxonSpeciesMap::merge(Some(&map), &["a", "b", "c"]);
    /// assert_eq!(reset, TaxonSpeciesMap::initialize(&["a", "b", "c"]));
    /// # Ok::<(), color_eyre::eyre::Report>(())
    /// ```
    pub fn merge<S>(existing: Option<&TaxonSpeciesMap>, taxa: &[S]) -> Self
    where
        S: AsRef<str>,
    {
        match existing {
            Some(map) if taxa.iter().all(|t| map.0.contains_key(t.as_ref())) => map.clone(),
            Some(_) => {
                info!("Uploaded taxa changed, resetting the taxon to species map.");
                TaxonSpeciesMap::initialize(taxa)
            }
            None => TaxonSpeciesMap::initialize(taxa),
        }
    }

    /// Assign a taxon to a species.
    pub fn assign(&mut self, taxon: &str, species: &str) -> Result<(), GenerateError> {
        let entry = self
            .0
            .get_mut(taxon)
            .ok_or_else(|| GenerateError::UnknownTaxon(taxon.to_string()))?;
        debug!("Assigning taxon {taxon} to species {species}");
        *entry = species.to_string();
        Ok(())
    }

    /// Species of a taxon.
    pub fn get(&self, taxon: &str) -> Option<&str> {
        self.0.get(taxon).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterate over `(taxon, species)` pairs.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(t, s)| (t.as_str(), s.as_str()))
    }

    /// Returns true if no taxon was assigned to another species.
    pub fn is_identity(&self) -> bool {
        self.0.iter().all(|(t, s)| t == s)
    }

    /// Sub-map over the given taxa, keeping map order.
    ///
    /// Every taxon must be present in the map.
    pub fn restrict<S>(&self, taxa: &[S]) -> Result<TaxonSpeciesMap, GenerateError>
    where
        S: AsRef<str>,
    {
        if let Some(missing) = taxa.iter().find(|t| !self.0.contains_key(t.as_ref())) {
            return Err(GenerateError::UnknownTaxon(missing.as_ref().to_string()));
        }
        Ok(TaxonSpeciesMap(
            self.0
                .iter()
                .filter(|(t, _)| taxa.iter().any(|s| s.as_ref() == t.as_str()))
                .map(|(t, s)| (t.clone(), s.clone()))
                .collect(),
        ))
    }

    /// Group taxa by species.
    ///
    /// Species appear in the order they are first met, as do taxa within a species.
    ///
    /// ## Examples
    ///
    /// ```rust
    /// use nexgen::taxa::TaxonSpeciesMap;
    /// let mut map = TaxonSpeciesMap::initialize(&["a", "b", "c"]);
    /// map.assign("a", "sp1")?;
    /// map.assign("b", "sp1")?;
    /// map.assign("c", "sp2")?;
    ///
    /// let groups = map.invert();
    /// assert_eq!(groups.get("sp1"), Some(&["a".to_string(), "b".to_string()][..]));
    /// assert_eq!(groups.to_string(), "<sp1:a,b; sp2:c>");
    /// # Ok::<(), color_eyre::eyre::Report>(())
    /// ```
    pub fn invert(&self) -> SpeciesGroup {
        let mut groups: IndexMap<String, Vec<String>> = IndexMap::new();
        for (taxon, species) in &self.0 {
            groups.entry(species.clone()).or_default().push(taxon.clone());
        }
        SpeciesGroup(groups)
    }
}

// ----------------------------------------------------------------------------
// Species Group
// ----------------------------------------------------------------------------

/// Species label to ordered taxa, the inverse of a [`TaxonSpeciesMap`].
///
/// Displays as a PhyloNet taxa-map clause, `<sp1:t1,t2; sp2:t3>`.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct SpeciesGroup(IndexMap<String, Vec<String>>);

impl Display for SpeciesGroup {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        let clause = self
            .0
            .iter()
            .map(|(species, taxa)| {
                let taxa = taxa.iter().map(|t| quote_label(t)).join(",");
                format!("{}:{taxa}", quote_label(species))
            })
            .join("; ");
        write!(f, "<{clause}>")
    }
}

impl SpeciesGroup {
    /// Taxa of a species.
    pub fn get(&self, species: &str) -> Option<&[String]> {
        self.0.get(species).map(Vec::as_slice)
    }

    /// Iterate over `(species, taxa)` groups.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.0.iter().map(|(s, t)| (s.as_str(), t.as_slice()))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Back to taxon to species pairs.
    pub fn flatten(&self) -> TaxonSpeciesMap {
        TaxonSpeciesMap(
            self.0
                .iter()
                .flat_map(|(species, taxa)| taxa.iter().map(|t| (t.clone(), species.clone())))
                .collect(),
        )
    }
}
