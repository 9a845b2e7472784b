use std::fs;
use std::io;
use std::path::Path;

use csv;
use log::warn;

use crate::error::{Error, Result};
use crate::seq::{Substitution, Triplet};

/// A mutational profile reader.
///
/// Each line holds `triplet<TAB>REF/ALT<TAB>count` without a header.
pub struct Reader<R: io::Read> {
    inner: csv::Reader<R>,
}

impl Reader<fs::File> {
    /// Read from a given file path.
    pub fn from_file<P: AsRef<Path>>(path: P) -> io::Result<Self> {
        fs::File::open(path).map(Reader::new)
    }
}

impl<R: io::Read> Reader<R> {
    /// Read from a given reader.
    pub fn new(reader: R) -> Self {
        Reader {
            inner: csv::ReaderBuilder::new()
                .delimiter(b'\t')
                .comment(Some(b'#'))
                .has_headers(false)
                .flexible(true)
                .trim(csv::Trim::All)
                .from_reader(reader),
        }
    }

    /// Iterate over records.
    pub fn records(&mut self) -> Records<'_, R> {
        Records { inner: self.inner.records() }
    }
}

pub struct Records<'r, R: 'r + io::Read> {
    inner: csv::StringRecordsIter<'r, R>,
}

impl<'r, R: io::Read> Iterator for Records<'r, R> {
    type Item = Result<Record>;

    /// Get next record.
    /// Stop reading as soon as a problematic record is encountered.
    fn next(&mut self) -> Option<Result<Record>> {
        self.inner.next().map(|res| {
            let record = res?;
            let line = record.position().map(|p| p.line()).unwrap_or(0);
            let invalid = |msg: String| Error::Profile { line, msg };

            if record.len() != 3 {
                return Err(invalid(format!("expected 3 fields, found {}", record.len())));
            }

            let triplet: Triplet = record[0].parse().map_err(|e: Error| invalid(e.to_string()))?;
            let substitution: Substitution = record[1].parse().map_err(|e: Error| invalid(e.to_string()))?;
            let count: f64 = record[2].parse()
                .map_err(|_| invalid(format!("count `{}` is not a number", &record[2])))?;

            if !count.is_finite() || count < 0.0 {
                return Err(invalid(format!("count `{}` must be a non-negative number", &record[2])));
            }
            if substitution.nt_ref != triplet.middle() {
                warn!("profile line {}: substitution {} does not mutate the middle base of {}",
                    line, substitution, triplet);
            }

            Ok(Record { triplet, substitution, count })
        })
    }
}

/// A profile record.
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    /// Trinucleotide context
    pub triplet: Triplet,
    /// Substitution of the middle base
    pub substitution: Substitution,
    /// Observed (or scaled) number of mutations
    pub count: f64,
}
