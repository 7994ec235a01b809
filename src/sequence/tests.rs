use crate::sequence::{self, parse_nexus, Alphabet, Format, SequenceMatrix};

use color_eyre::eyre::{Report, Result};
use indoc::indoc;
use std::io::Write;
use tempfile::Builder;

#[test]
fn nexus_interleaved() -> Result<(), Report> {
    let text = indoc! {"
        #NEXUS
        [generated by hand]
        BEGIN DATA;
          DIMENSIONS NTAX=2 NCHAR=8;
          FORMAT DATATYPE=DNA MISSING=? GAP=- INTERLEAVE;
          MATRIX
            a ACGT
            b ACGA

            a RR-N
            b CC?T
          ;
        END;
    "};
    let matrix = parse_nexus(text)?;

    assert_eq!(matrix.alphabet, Alphabet::Dna);
    assert_eq!(matrix.taxa(), ["a", "b"]);
    assert_eq!(matrix.nchar(), 8);
    assert_eq!(matrix.get("a"), Some(&['A', 'C', 'G', 'T', 'R', 'R', '-', 'N'][..]));
    Ok(())
}

#[test]
fn nexus_standard_datatype() -> Result<(), Report> {
    let text = indoc! {"
        #NEXUS
        Begin characters;
        Format datatype=standard symbols=\"01\";
        Matrix
        x 0101
        y 1100
        ;
        End;
    "};
    let matrix = parse_nexus(text)?;
    assert_eq!(matrix.alphabet, Alphabet::Standard);
    assert_eq!(matrix.ntax(), 2);
    Ok(())
}

#[test]
fn nexus_without_data_block() {
    assert!(parse_nexus("#NEXUS\nBEGIN TREES;\nTREE t = (A,B);\nEND;").is_err());
}

#[test]
fn nexus_unaligned() {
    let text = "#NEXUS\nBEGIN DATA;\nMATRIX\na ACGT\nb ACG\n;\nEND;";
    assert!(parse_nexus(text).is_err());
}

#[test]
fn fasta_read() -> Result<(), Report> {
    let mut file = Builder::new().suffix(".fasta").tempfile()?;
    write!(file, ">s1\nacgt\nac\n>s2\nACGTAA\n")?;

    let matrix = sequence::read(&file.path())?;
    let expected: Vec<char> = "ACGTAC".chars().collect();
    assert_eq!(matrix.get("s1"), Some(expected.as_slice()));
    assert_eq!(matrix.taxa(), ["s1", "s2"]);
    assert_eq!(matrix.alphabet, Alphabet::Dna);
    Ok(())
}

#[test]
fn format_sniffed_from_content() -> Result<(), Report> {
    let mut fasta = Builder::new().suffix(".txt").tempfile()?;
    write!(fasta, "\n>s1\nACGT\n")?;
    let mut nexus = Builder::new().suffix(".txt").tempfile()?;
    write!(nexus, "#NEXUS\nBEGIN DATA;\nMATRIX\na 01\n;\nEND;\n")?;
    let mut unknown = Builder::new().suffix(".txt").tempfile()?;
    write!(unknown, "hello")?;

    assert_eq!(Format::detect(&fasta.path())?, Format::Fasta);
    assert_eq!(Format::detect(&nexus.path())?, Format::Nexus);
    assert!(Format::detect(&unknown.path()).is_err());
    Ok(())
}

#[test]
fn concat_rejects_different_taxa() -> Result<(), Report> {
    let mut m1 = SequenceMatrix::new(Alphabet::Dna);
    m1.push("a", "AC".chars())?;
    let mut m2 = SequenceMatrix::new(Alphabet::Dna);
    m2.push("b", "AC".chars())?;

    assert!(!m1.same_taxa(&m2));
    assert!(SequenceMatrix::concat(&[m1, m2]).is_err());
    Ok(())
}
