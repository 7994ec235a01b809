use crate::error::GenerateError;
use crate::taxa::TaxonSpeciesMap;

use color_eyre::eyre::{Report, Result};
use std::collections::HashSet;

fn example() -> Result<TaxonSpeciesMap, Report> {
    let mut map = TaxonSpeciesMap::initialize(&["a", "b", "c"]);
    map.assign("a", "sp1")?;
    map.assign("b", "sp1")?;
    map.assign("c", "sp2")?;
    Ok(map)
}

/// Maps with interleaved species and singleton groups.
fn maps() -> Result<Vec<TaxonSpeciesMap>, Report> {
    let mut interleaved = TaxonSpeciesMap::initialize(&["t1", "t2", "t3", "t4", "t5"]);
    interleaved.assign("t1", "B")?;
    interleaved.assign("t2", "A")?;
    interleaved.assign("t3", "B")?;
    interleaved.assign("t5", "A")?;
    Ok(vec![example()?, interleaved, TaxonSpeciesMap::initialize(&["x"]), TaxonSpeciesMap::default()])
}

#[test]
fn invert_example() -> Result<(), Report> {
    let groups = example()?.invert();
    let observed: Vec<(&str, Vec<&str>)> =
        groups.iter().map(|(s, t)| (s, t.iter().map(String::as_str).collect())).collect();
    let expected = vec![("sp1", vec!["a", "b"]), ("sp2", vec!["c"])];
    assert_eq!(expected, observed);
    assert_eq!(groups.to_string(), "<sp1:a,b; sp2:c>");
    Ok(())
}

#[test]
fn invert_first_encounter_order() -> Result<(), Report> {
    let groups = maps()?[1].invert();
    assert_eq!(groups.to_string(), "<B:t1,t3; A:t2,t5; t4:t4>");
    Ok(())
}

#[test]
fn invert_partition() -> Result<(), Report> {
    for map in maps()? {
        let groups = map.invert();
        let mut seen = HashSet::new();
        for (_, taxa) in groups.iter() {
            for taxon in taxa {
                // pairwise disjoint
                assert!(seen.insert(taxon.as_str()));
            }
        }
        let domain: HashSet<&str> = map.iter().map(|(t, _)| t).collect();
        assert_eq!(domain, seen);
    }
    Ok(())
}

#[test]
fn invert_round_trip() -> Result<(), Report> {
    for map in maps()? {
        assert_eq!(map, map.invert().flatten());
    }
    Ok(())
}

#[test]
fn identity() -> Result<(), Report> {
    assert!(TaxonSpeciesMap::initialize(&["a", "b"]).is_identity());
    assert!(!example()?.is_identity());
    Ok(())
}

#[test]
fn assign_unknown_taxon() {
    let mut map = TaxonSpeciesMap::initialize(&["a"]);
    let result = map.assign("z", "sp1");
    assert!(matches!(result, Err(GenerateError::UnknownTaxon(t)) if t == "z"));
}

#[test]
fn merge_without_existing() {
    let observed = TaxonSpeciesMap::merge(None, &["a", "b"]);
    assert_eq!(TaxonSpeciesMap::initialize(&["a", "b"]), observed);
}

#[test]
fn restrict_keeps_map_order() -> Result<(), Report> {
    let observed = example()?.restrict(&["c", "a"])?;
    let pairs: Vec<_> = observed.iter().collect();
    assert_eq!(pairs, vec![("a", "sp1"), ("c", "sp2")]);
    assert!(example()?.restrict(&["d"]).is_err());
    Ok(())
}

#[test]
fn clause_quotes_labels() -> Result<(), Report> {
    let mut map = TaxonSpeciesMap::initialize(&["taxon one", "two"]);
    map.assign("taxon one", "sp 1")?;
    assert_eq!(map.invert().to_string(), "<'sp 1':'taxon one'; two:two>");

    let mut map = TaxonSpeciesMap::initialize(&["a,b", "c"]);
    map.assign("c", "sp:1")?;
    assert_eq!(map.invert().to_string(), "<'a,b':'a,b'; 'sp:1':c>");
    Ok(())
}
