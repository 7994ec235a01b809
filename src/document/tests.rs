use crate::document::{Data, Document};
use crate::encode::InputMode;
use crate::error::GenerateError;
use crate::options::{CommandName, OptionSet};
use crate::sequence::{Alphabet, SequenceMatrix};
use crate::taxa::TaxonSpeciesMap;

use color_eyre::eyre::{Report, Result};
use indoc::indoc;
use nexgen_phylo::{reader::parse_trees, Locus};
use std::path::{Path, PathBuf};

fn markers_document() -> Result<Document, Report> {
    let mut matrix = SequenceMatrix::new(Alphabet::Dna);
    matrix.push("a", "ACGT".chars())?;
    matrix.push("b", "ACGA".chars())?;
    matrix.push("c", "TCGA".chars())?;

    let mut document = Document::new(CommandName::McmcBiMarkers);
    document.data = Some(Data::Sequences { matrices: vec![matrix], mode: InputMode::Phased });
    document.taxa = vec!["a".to_string(), "b".to_string(), "c".to_string()];
    document.map = TaxonSpeciesMap::initialize(&document.taxa);
    Ok(document)
}

fn trees_document() -> Result<Document, Report> {
    let first = Locus { path: PathBuf::from("locus1.tre"), trees: parse_trees("((A,B),C);")? };
    let second = Locus {
        path: PathBuf::from("locus2.tre"),
        trees: parse_trees("((A:1,C:1):1,B:2);\n(A,(B,C));")?,
    };

    let mut document = Document::new(CommandName::InferNetworkMp);
    document.data = Some(Data::Trees(vec![first, second]));
    document.taxa = vec!["A".to_string(), "B".to_string(), "C".to_string()];
    document.map = TaxonSpeciesMap::initialize(&document.taxa);
    document.reticulations = Some(1);
    Ok(document)
}

#[test]
fn markers_without_options() -> Result<(), Report> {
    let expected = indoc! {r#"
        #NEXUS

        Begin data;
        Dimensions ntax=3 nchar=2;
        Format datatype=dna symbols="01" missing=? gap=-;
        Matrix
        a 01
        b 00
        c 10
        ;End;

        BEGIN PHYLONET;
        MCMC_BiMarkers -taxa (a,b,c);
        END;
    "#};
    assert_eq!(expected, markers_document()?.render()?);
    Ok(())
}

#[test]
fn markers_with_options_and_map() -> Result<(), Report> {
    let mut document = markers_document()?;
    document.map.assign("a", "sp1")?;
    document.map.assign("b", "sp1")?;
    document.map.assign("c", "sp2")?;
    document.options = OptionSet::parse(CommandName::McmcBiMarkers, &["diploid", "cl=1000"])?;

    let observed = document.render()?;
    assert!(observed.contains("MCMC_BiMarkers -taxa (a,b,c) -cl 1000 -diploid -tm <sp1:a,b; sp2:c>;\n"));
    Ok(())
}

#[test]
fn spaced_labels_quoted_everywhere() -> Result<(), Report> {
    let mut matrix = SequenceMatrix::new(Alphabet::Dna);
    matrix.push("taxon one", "AC".chars())?;
    matrix.push("two", "AA".chars())?;

    let mut document = Document::new(CommandName::MleBiMarkers);
    document.data = Some(Data::Sequences { matrices: vec![matrix], mode: InputMode::Phased });
    document.taxa = vec!["taxon one".to_string(), "two".to_string()];
    document.map = TaxonSpeciesMap::initialize(&document.taxa);
    document.map.assign("taxon one", "sp 1")?;

    let observed = document.render()?;
    assert!(observed.contains("'taxon one' 1\n"));
    assert!(observed.contains("MLE_BiMarkers -taxa ('taxon one',two) -tm <'sp 1':'taxon one'; two:two>;\n"));
    Ok(())
}

#[test]
fn map_restricted_to_selection() -> Result<(), Report> {
    let mut document = markers_document()?;
    document.map.assign("a", "sp1")?;
    document.map.assign("b", "sp1")?;
    document.taxa = vec!["a".to_string(), "c".to_string()];

    let observed = document.render()?;
    assert!(observed.contains("MCMC_BiMarkers -taxa (a,c) -tm <sp1:a; c:c>;\n"));

    // only the unselected taxon was remapped
    document.map = TaxonSpeciesMap::initialize(&["a", "b", "c"]);
    document.map.assign("b", "sp1")?;
    assert!(document.render()?.contains("MCMC_BiMarkers -taxa (a,c);\n"));
    Ok(())
}

#[test]
fn unphased_taxa() -> Result<(), Report> {
    let mut matrix = SequenceMatrix::new(Alphabet::Dna);
    matrix.push("X", "AM".chars())?;
    matrix.push("Y", "AA".chars())?;

    let mut document = Document::new(CommandName::MleBiMarkers);
    document.data = Some(Data::Sequences { matrices: vec![matrix], mode: InputMode::Unphased });
    document.taxa = ["X_0", "X_1", "Y_0", "Y_1"].map(String::from).to_vec();
    document.map = TaxonSpeciesMap::initialize(&document.taxa);
    document.map.assign("X_0", "X")?;
    document.map.assign("X_1", "X")?;
    document.check(Path::new("out.nexus"))?;

    let observed = document.render()?;
    assert!(observed.contains("Dimensions ntax=4 nchar=1;"));
    assert!(observed.contains("X_1 1\nY_0 0\n"));
    assert!(observed.contains(" -tm <X:X_0,X_1; Y_0:Y_0; Y_1:Y_1>;"));
    Ok(())
}

#[test]
fn gene_trees() -> Result<(), Report> {
    let expected = indoc! {"
        #NEXUS

        BEGIN TREES;
        Tree gt0 = ((A,B),C);
        Tree gt1 = ((A:1,C:1):1,B:2);
        Tree gt2 = (A,(B,C));
        END;

        BEGIN PHYLONET;
        InferNetwork_MP (gt0,{gt1,gt2}) 1;
        END;
    "};
    assert_eq!(expected, trees_document()?.render()?);
    Ok(())
}

#[test]
fn gene_trees_with_map() -> Result<(), Report> {
    let mut document = trees_document()?;
    document.command = CommandName::McmcGt;
    document.options = OptionSet::parse(CommandName::McmcGt, &["cl=500"])?;
    document.map.assign("A", "S")?;
    document.map.assign("B", "S")?;

    // no reticulation count for the sampler
    let observed = document.render()?;
    assert!(observed.contains("MCMC_GT (gt0,{gt1,gt2}) -cl 500 -a <S:A,B; C:C>;\n"));
    Ok(())
}

#[test]
fn mandatory_arguments_always_written() -> Result<(), Report> {
    for command in [CommandName::McmcBiMarkers, CommandName::MleBiMarkers] {
        let mut document = markers_document()?;
        document.command = command;
        document.options = OptionSet::new(command);
        assert!(document.render()?.contains(&format!("{command} -taxa (a,b,c);")));
    }
    for command in [CommandName::InferNetworkMl, CommandName::InferNetworkMpl] {
        let mut document = trees_document()?;
        document.command = command;
        document.options = OptionSet::new(command);
        assert!(document.render()?.contains(&format!("{command} (gt0,{{gt1,gt2}}) 1;")));
    }
    Ok(())
}

#[test]
fn preconditions() -> Result<(), Report> {
    let destination = Path::new("out.nexus");

    let document = Document::new(CommandName::McmcBiMarkers);
    assert!(matches!(document.check(destination), Err(GenerateError::MissingData)));

    // trees uploaded for a marker command
    let mut document = trees_document()?;
    document.command = CommandName::MleBiMarkers;
    assert!(matches!(document.check(destination), Err(GenerateError::MissingData)));

    let mut document = markers_document()?;
    document.taxa.clear();
    assert!(matches!(document.check(destination), Err(GenerateError::EmptyTaxaSelection)));

    let document = markers_document()?;
    assert!(matches!(document.check(Path::new("")), Err(GenerateError::EmptyDestination)));

    let mut document = markers_document()?;
    document.taxa.push("z".to_string());
    assert!(matches!(document.check(destination), Err(GenerateError::UnknownTaxon(t)) if t == "z"));

    let mut document = trees_document()?;
    document.reticulations = None;
    assert!(matches!(document.check(destination), Err(GenerateError::MissingReticulations(_))));

    let mut document = markers_document()?;
    document.options.set("cl", Some("many"))?;
    assert!(matches!(document.check(destination), Err(GenerateError::InvalidOption { .. })));

    Ok(())
}

#[test]
fn no_tree_data() -> Result<(), Report> {
    let mut document = trees_document()?;
    if let Some(Data::Trees(loci)) = &mut document.data {
        loci.push(Locus { path: PathBuf::from("empty.nex"), trees: Vec::new() });
    }
    let result = document.check(Path::new("out.nexus"));
    assert!(matches!(result, Err(GenerateError::NoTreeData(paths)) if paths == [PathBuf::from("empty.nex")]));
    Ok(())
}

#[test]
fn failed_check_writes_nothing() -> Result<(), Report> {
    let dir = tempfile::tempdir()?;
    let destination = dir.path().join("out.nexus");
    let mut document = markers_document()?;
    document.taxa.clear();

    assert!(document.write(&destination).is_err());
    assert_eq!(std::fs::read_dir(dir.path())?.count(), 0);
    Ok(())
}

#[test]
fn candidate_persist() -> Result<(), Report> {
    let dir = tempfile::tempdir()?;
    let destination = dir.path().join("nested").join("out.nexus");
    let document = markers_document()?;

    let candidate = document.write(&destination)?;
    assert!(candidate.path().exists());
    assert!(!destination.exists());

    let written = std::fs::read_to_string(candidate.path())?;
    assert_eq!(written, document.render()?);
    candidate.persist()?;
    assert_eq!(std::fs::read_to_string(&destination)?, written);
    assert_eq!(std::fs::read_dir(dir.path().join("nested"))?.count(), 1);
    Ok(())
}

#[test]
fn candidate_dropped() -> Result<(), Report> {
    let dir = tempfile::tempdir()?;
    let candidate = markers_document()?.write(&dir.path().join("out.nexus"))?;
    let path = candidate.path().to_path_buf();
    drop(candidate);
    assert!(!path.exists());
    assert_eq!(std::fs::read_dir(dir.path())?.count(), 0);
    Ok(())
}
