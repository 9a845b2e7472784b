//! Chromosome coordinates parsed from RefSeq genomic notation.

use std::cmp::Ordering;
use std::collections::HashMap;
use std::fmt;
use std::sync::LazyLock;

use log::warn;
use regex::Regex;

use crate::error::{Error, Result};
use crate::seq::{Nucleotide, Pos};

/// `NC_0000NN.V:g.<locus><ref>><alt>`
static GENOMIC: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^NC_0000(\d{2})\.\d+:g\.(\d+)([ACGTU])>([ACGTU])$").expect("valid genomic notation pattern")
});

/// Chromosomes kept in the final records.
pub fn is_canonical(chrom: &str) -> bool {
    match chrom {
        "X" | "Y" => true,
        _ => matches!(chrom.parse::<u8>(), Ok(1..=22)) && !chrom.starts_with('0'),
    }
}

/// Sort key placing numbered chromosomes first, in numeric order.
pub fn chrom_order(a: &str, b: &str) -> Ordering {
    match (a.parse::<u32>(), b.parse::<u32>()) {
        (Ok(x), Ok(y)) => x.cmp(&y),
        (Ok(_), Err(_)) => Ordering::Less,
        (Err(_), Ok(_)) => Ordering::Greater,
        (Err(_), Err(_)) => a.cmp(b),
    }
}

/// A substitution at a chromosome locus.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct ChromosomeVariant {
    pub chrom: String,
    /// 1-based locus
    pub pos: Pos,
    pub nt_ref: Nucleotide,
    pub nt_alt: Nucleotide,
}

impl fmt::Display for ChromosomeVariant {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}:{}{}>{}", self.chrom, self.pos, self.nt_ref as char, self.nt_alt as char)
    }
}

/// Parses genomic notations, naming chromosomes by their accession numeral.
#[derive(Clone, Debug)]
pub struct CoordinateExtractor {
    /// numeral (without leading zero) -> chromosome label
    labels: HashMap<String, String>,
}

impl Default for CoordinateExtractor {
    fn default() -> CoordinateExtractor {
        let labels = [("23", "X"), ("24", "Y")].iter()
            .map(|&(k, v)| (k.to_owned(), v.to_owned()))
            .collect();
        CoordinateExtractor { labels }
    }
}

impl CoordinateExtractor {
    /// Numerals without a label are used as the chromosome name.
    pub fn new(labels: HashMap<String, String>) -> CoordinateExtractor {
        let labels = labels.into_iter()
            .map(|(k, v)| (k.trim_start_matches('0').to_owned(), v))
            .collect();
        CoordinateExtractor { labels }
    }

    pub fn parse(&self, genomic: &str) -> Result<ChromosomeVariant> {
        let malformed = || Error::MalformedGenomic(genomic.to_owned());
        let caps = GENOMIC.captures(genomic.trim()).ok_or_else(malformed)?;

        let numeral = caps[1].trim_start_matches('0');
        if numeral.is_empty() {
            return Err(malformed());
        }
        let chrom = match self.labels.get(numeral) {
            Some(label) => label.clone(),
            None => numeral.to_owned(),
        };
        let pos: Pos = caps[2].parse().map_err(|_| malformed())?;
        if pos == 0 {
            return Err(malformed());
        }

        Ok(ChromosomeVariant {
            chrom,
            pos,
            nt_ref: caps[3].as_bytes()[0],
            nt_alt: caps[4].as_bytes()[0],
        })
    }

    /// Parse every notation, dropping and logging those that do not parse.
    pub fn extract_all<'a, I>(&self, genomic: I) -> Vec<ChromosomeVariant>
    where
        I: IntoIterator<Item = &'a str>,
    {
        genomic.into_iter()
            .filter_map(|g| match self.parse(g) {
                Ok(x) => Some(x),
                Err(e) => {
                    warn!("dropping variant: {}", e);
                    None
                },
            })
            .collect()
    }
}

/// Keep only variants on chromosomes 1-22, X and Y.
pub fn canonical(variants: Vec<ChromosomeVariant>) -> Vec<ChromosomeVariant> {
    variants.into_iter()
        .filter(|v| {
            let keep = is_canonical(&v.chrom);
            if !keep {
                warn!("dropping variant {} on non-canonical chromosome", v);
            }
            keep
        })
        .collect()
}
