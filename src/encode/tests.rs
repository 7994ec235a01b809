use crate::encode::{self, encode_all, phase, to_biallelic, InputMode, DROP};
use crate::sequence::{Alphabet, SequenceMatrix, GAP};

use color_eyre::eyre::{Report, Result};
use std::collections::BTreeSet;

fn matrix(rows: &[(&str, &str)]) -> Result<SequenceMatrix, Report> {
    let mut matrix = SequenceMatrix::new(Alphabet::Dna);
    for (taxon, sequence) in rows {
        matrix.push(*taxon, sequence.chars())?;
    }
    Ok(matrix)
}

/// Small unphased alignments with ambiguity codes, gaps and drop symbols.
fn fixtures() -> Result<Vec<SequenceMatrix>, Report> {
    Ok(vec![
        matrix(&[("X", "AM")])?,
        matrix(&[("a", "ACGTRYKMSW"), ("b", "ACGTACGTAC"), ("c", "NCG-AAGTSW")])?,
        matrix(&[("a", "VHDB"), ("b", "ACGT")])?,
        matrix(&[("a", "RRRR"), ("b", "RRRR"), ("c", "AAAA")])?,
        matrix(&[("a", "A-C?T"), ("b", "G-C?T"), ("c", "A-CAT"), ("d", "GTC?A")])?,
    ])
}

#[test]
fn phase_ambiguity() -> Result<(), Report> {
    let observed = phase(&matrix(&[("X", "AM")])?)?;
    let expected = matrix(&[("X_0", "AA"), ("X_1", "AC")])?;
    assert_eq!(expected, observed);
    Ok(())
}

#[test]
fn phase_every_code() -> Result<(), Report> {
    let observed = phase(&matrix(&[("t", "MRWSYK")])?)?;
    let expected = matrix(&[("t_0", "AAACCG"), ("t_1", "CGTGTT")])?;
    assert_eq!(expected, observed);
    Ok(())
}

#[test]
fn phase_drops_columns_for_all_taxa() -> Result<(), Report> {
    // column 2 has N in a, column 4 has a gap in b
    let observed = phase(&matrix(&[("a", "ANCT"), ("b", "AGC-")])?)?;
    let expected = matrix(&[("a_0", "AC"), ("a_1", "AC"), ("b_0", "AC"), ("b_1", "AC")])?;
    assert_eq!(expected, observed);
    Ok(())
}

#[test]
fn phase_length_invariant() -> Result<(), Report> {
    for m in fixtures()? {
        let retained = (0..m.nchar()).filter(|&i| !m.column(i).any(|c| DROP.contains(&c))).count();
        let phased = phase(&m)?;
        assert_eq!(phased.ntax(), m.ntax() * 2);
        assert!(phased.iter().all(|(_, s)| s.len() == retained));
        assert_eq!(phased.nchar(), retained);
    }
    Ok(())
}

#[test]
fn phase_deterministic() -> Result<(), Report> {
    for m in fixtures()? {
        let first = phase(&m)?.to_string();
        for _ in 0..5 {
            assert_eq!(first, phase(&m)?.to_string());
        }
    }
    Ok(())
}

#[test]
fn biallelic_single_difference() -> Result<(), Report> {
    let observed = to_biallelic(&matrix(&[("taxon1", "ACGT"), ("taxon2", "ACGA")])?)?;
    let mut expected = SequenceMatrix::new(Alphabet::Standard);
    expected.push("taxon1", "1".chars())?;
    expected.push("taxon2", "0".chars())?;
    assert_eq!(expected, observed);
    Ok(())
}

#[test]
fn biallelic_drops_gap_and_multiallelic() -> Result<(), Report> {
    // col 1: {A,G} ok, col 2: {A,-} gap, col 3: {A,C,G} too many, col 4: {T} monomorphic
    let observed = to_biallelic(&matrix(&[("a", "AAAT"), ("b", "G-CT"), ("c", "AAGT")])?)?;
    assert_eq!(observed.nchar(), 1);
    assert_eq!(observed.to_string(), "a 0\nb 1\nc 0\n");
    Ok(())
}

#[test]
fn biallelic_column_count() -> Result<(), Report> {
    for m in fixtures()? {
        let expected = (0..m.nchar())
            .filter(|&i| {
                let symbols: BTreeSet<char> = m.column(i).collect();
                symbols.len() == 2 && !symbols.contains(&GAP)
            })
            .count();
        let markers = to_biallelic(&m)?;
        assert_eq!(markers.nchar(), expected);
        assert!(markers.iter().all(|(_, s)| s.len() == expected));
    }
    Ok(())
}

#[test]
fn biallelic_digit_balance() -> Result<(), Report> {
    for m in fixtures()? {
        let markers = to_biallelic(&m)?;
        for i in 0..markers.nchar() {
            let zeros = markers.column(i).filter(|&c| c == '0').count();
            let ones = markers.column(i).filter(|&c| c == '1').count();
            assert_eq!(zeros + ones, markers.ntax());
            assert!(zeros > 0 && ones > 0);
        }
    }
    Ok(())
}

#[test]
fn biallelic_empty_matrix() -> Result<(), Report> {
    let markers = to_biallelic(&matrix(&[("a", ""), ("b", "")])?)?;
    assert_eq!(markers.nchar(), 0);
    assert_eq!(markers.get("a"), Some(&[][..]));
    Ok(())
}

#[test]
fn biallelic_native_markers_unchanged() -> Result<(), Report> {
    let mut m = SequenceMatrix::new(Alphabet::Standard);
    m.push("a", "0110".chars())?;
    m.push("b", "1000".chars())?;
    let markers = encode::encode(&m, InputMode::Biallelic)?;
    // last column is monomorphic
    assert_eq!(markers.to_string(), "a 011\nb 100\n");
    Ok(())
}

#[test]
fn unphased_then_binarized() -> Result<(), Report> {
    let m = matrix(&[("a", "AR"), ("b", "AG")])?;
    let markers = encode::encode(&m, InputMode::Unphased)?;
    assert_eq!(markers.taxa(), ["a_0", "a_1", "b_0", "b_1"]);
    assert_eq!(markers.to_string(), "a_0 0\na_1 1\nb_0 1\nb_1 1\n");
    Ok(())
}

#[test]
fn encode_all_concatenates_files() -> Result<(), Report> {
    let m1 = matrix(&[("a", "AC"), ("b", "AG")])?;
    let m2 = matrix(&[("b", "TT"), ("a", "CT")])?;
    let markers = encode_all(&[m1, m2], InputMode::Phased)?;
    assert_eq!(markers.to_string(), "a 00\nb 11\n");
    Ok(())
}
