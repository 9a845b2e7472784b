use std::fmt;
use std::str::{self, FromStr};

use serde::{Deserialize, Serialize};

use crate::constants::*;
use crate::error::{Error, Result};

pub type Nucleotide = u8;

/// Position within a transcript sequence
pub type Pos = u64;

#[inline]
pub fn is_nucleotide(x: Nucleotide) -> bool {
    NUCLEOTIDES.contains(&x)
}

/// Three-nucleotide context, upper-case.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Triplet([Nucleotide; TRIPLET_LEN]);

impl Triplet {
    /// Construct from a window of exactly three nucleotides.
    /// Lower-case input is accepted; anything outside ACGTU is rejected.
    pub fn from_window(window: &[Nucleotide]) -> Option<Triplet> {
        if window.len() != TRIPLET_LEN {
            return None;
        }
        let mut x = [0u8; TRIPLET_LEN];
        for (i, &nt) in window.iter().enumerate() {
            let nt = nt.to_ascii_uppercase();
            if !is_nucleotide(nt) {
                return None;
            }
            x[i] = nt;
        }
        Some(Triplet(x))
    }

    /// Nucleotide that is substituted when this context mutates.
    #[inline]
    pub fn middle(&self) -> Nucleotide {
        self.0[1]
    }
}

impl FromStr for Triplet {
    type Err = Error;

    fn from_str(s: &str) -> Result<Triplet> {
        Triplet::from_window(s.trim().as_bytes()).ok_or_else(|| Error::InvalidTriplet(s.to_owned()))
    }
}

impl fmt::Display for Triplet {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        // bytes are validated ASCII on construction
        for &nt in self.0.iter() {
            write!(f, "{}", nt as char)?;
        }
        Ok(())
    }
}

impl fmt::Debug for Triplet {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "Triplet({})", self)
    }
}

/// Single-nucleotide substitution, written `REF/ALT`.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct Substitution {
    pub nt_ref: Nucleotide,
    pub nt_alt: Nucleotide,
}

impl Substitution {
    pub fn new(nt_ref: Nucleotide, nt_alt: Nucleotide) -> Option<Substitution> {
        let nt_ref = nt_ref.to_ascii_uppercase();
        let nt_alt = nt_alt.to_ascii_uppercase();
        if is_nucleotide(nt_ref) && is_nucleotide(nt_alt) && nt_ref != nt_alt {
            Some(Substitution { nt_ref, nt_alt })
        } else {
            None
        }
    }
}

impl FromStr for Substitution {
    type Err = Error;

    fn from_str(s: &str) -> Result<Substitution> {
        let invalid = || Error::InvalidSubstitution(s.to_owned());
        match s.trim().as_bytes() {
            &[nt_ref, b'/', nt_alt] => Substitution::new(nt_ref, nt_alt).ok_or_else(invalid),
            _ => Err(invalid()),
        }
    }
}

impl fmt::Display for Substitution {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}/{}", self.nt_ref as char, self.nt_alt as char)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_triplet_parse() {
        let t: Triplet = "cga".parse().unwrap();
        assert_eq!(t.to_string(), "CGA");
        assert_eq!(t.middle(), b'G');

        assert!("CGN".parse::<Triplet>().is_err());
        assert!("CG".parse::<Triplet>().is_err());
        assert!("CGAT".parse::<Triplet>().is_err());
        assert!(Triplet::from_window(b"ACU").is_some());
    }

    #[test]
    fn test_substitution_parse() {
        let s: Substitution = "G/A".parse().unwrap();
        assert_eq!(s.nt_ref, b'G');
        assert_eq!(s.nt_alt, b'A');
        assert_eq!(s.to_string(), "G/A");

        assert!("G/G".parse::<Substitution>().is_err());
        assert!("G>A".parse::<Substitution>().is_err());
        assert!("GA".parse::<Substitution>().is_err());
    }
}
