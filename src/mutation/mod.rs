pub mod spectrum;

use std::fmt;
use std::str::FromStr;

use crate::error::{Error, Result};
use crate::seq::{Nucleotide, Pos, Substitution, Triplet};
use crate::utils::split_hgvs;

pub use self::spectrum::FrequencySpectrum;

/// A sampled mutation channel: a context and the substitution of its middle base.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct Event {
    pub triplet: Triplet,
    pub substitution: Substitution,
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}_{}", self.triplet, self.substitution)
    }
}

/// 1-based coding position of the middle base of a triplet.
///
/// `offset` is the 0-based start of the triplet in the transcript sequence;
/// the middle base sits at 0-based `offset + 1`, i.e. 1-based `offset + 2`.
#[inline]
pub fn coding_position(offset: Pos) -> Pos {
    offset + 2
}

/// Substitution in a transcript, written `{transcript}:c.{pos}{ref}>{alt}`.
#[derive(Clone, PartialEq, Eq, Hash, Debug)]
pub struct CodingMutation {
    /// Transcript id without version
    pub transcript: String,
    /// 1-based position of the substituted nucleotide
    pub c_pos: Pos,
    /// Reference nucleotide of the transcript
    pub nt_ref: Nucleotide,
    /// Alternate nucleotide
    pub nt_alt: Nucleotide,
}

impl CodingMutation {
    pub fn new(transcript: &str, c_pos: Pos, substitution: Substitution) -> CodingMutation {
        CodingMutation {
            transcript: transcript.to_owned(),
            c_pos,
            nt_ref: substitution.nt_ref,
            nt_alt: substitution.nt_alt,
        }
    }

    pub fn cdna_change(&self) -> String {
        format!("c.{}{}>{}", self.c_pos, self.nt_ref as char, self.nt_alt as char)
    }
}

impl fmt::Display for CodingMutation {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}:{}", self.transcript, self.cdna_change())
    }
}

impl FromStr for CodingMutation {
    type Err = Error;

    fn from_str(s: &str) -> Result<CodingMutation> {
        let malformed = || Error::MalformedCoding(s.to_owned());
        let (transcript, change) = split_hgvs(s.trim()).ok_or_else(malformed)?;
        let change = change.strip_prefix("c.").ok_or_else(malformed)?;

        // {pos}{ref}>{alt}
        let digits = change.find(|c: char| !c.is_ascii_digit()).ok_or_else(malformed)?;
        let c_pos: Pos = change[..digits].parse().map_err(|_| malformed())?;
        match change[digits..].as_bytes() {
            &[nt_ref, b'>', nt_alt] => {
                let substitution = Substitution::new(nt_ref, nt_alt).ok_or_else(malformed)?;
                Ok(CodingMutation::new(transcript, c_pos, substitution))
            },
            _ => Err(malformed()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::TripletPositionIndex;

    #[test]
    fn test_coding_position() {
        // CGT starts at 0-based offset 1; its middle base G is the 3rd nucleotide
        let seq = b"ACGTA";
        let cgt: Triplet = "CGT".parse().unwrap();
        let offset = TripletPositionIndex::build(seq).positions(&cgt)[0];
        assert_eq!(offset, 1);
        assert_eq!(coding_position(offset), 3);
        assert_eq!(seq[coding_position(offset) as usize - 1], b'G');
    }

    #[test]
    fn test_display() {
        let x = CodingMutation::new("ENST00000169551", 609, "G/A".parse().unwrap());
        assert_eq!(x.to_string(), "ENST00000169551:c.609G>A");
    }

    #[test]
    fn test_parse() {
        let x: CodingMutation = "ENST00000169551.7:c.609G>A".parse().unwrap();
        assert_eq!(x.transcript, "ENST00000169551");
        assert_eq!(x.c_pos, 609);
        assert_eq!(x.nt_ref, b'G');
        assert_eq!(x.nt_alt, b'A');

        for bad in ["ENST00000169551", "ENST00000169551:g.609G>A", "ENST00000169551:c.G>A",
                    "ENST00000169551:c.609GA", "ENST00000169551:c.609G>G", "ENST00000169551:c.609"].iter() {
            assert!(bad.parse::<CodingMutation>().is_err(), "{}", bad);
        }
    }
}
