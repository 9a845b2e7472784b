use std::fs;
use std::io;
use std::path::Path;

use bio::io::fasta;

use crate::error::{Error, Result};
use crate::utils::transcript_id;

/// Transcript sequence reader over a FASTA source.
pub struct Reader<R: io::Read> {
    inner: fasta::Reader<io::BufReader<R>>,
}

impl Reader<fs::File> {
    pub fn from_file<P: AsRef<Path>>(path: P) -> io::Result<Self> {
        fs::File::open(path).map(Reader::new)
    }
}

impl<R: io::Read> Reader<R> {
    pub fn new(reader: R) -> Self {
        Reader { inner: fasta::Reader::new(reader) }
    }

    /// Iterate over `(transcript id, upper-case sequence)` pairs.
    ///
    /// The id is taken up to the first `|` or space, without version.
    /// An empty sequence is an error.
    pub fn transcripts(self) -> impl Iterator<Item = Result<(String, Vec<u8>)>> {
        self.inner.records().map(|r| {
            let record = r?;
            let id = transcript_id(record.id()).to_owned();
            if record.seq().is_empty() {
                return Err(Error::EmptySequence(id));
            }
            Ok((id, record.seq().to_ascii_uppercase()))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FASTA_FILE: &'static [u8] = b">ENST00000169551.7|ENSG00000101546.13|OTTHUMG
ACGTAC
GTAC
>ENST00000558353.1 cdna
ttgca
";

    #[test]
    fn test_transcripts() {
        let records: Vec<(String, Vec<u8>)> = Reader::new(FASTA_FILE)
            .transcripts()
            .collect::<Result<_>>()
            .unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].0, "ENST00000169551");
        assert_eq!(records[0].1, b"ACGTACGTAC".to_vec());
        assert_eq!(records[1].0, "ENST00000558353");
        assert_eq!(records[1].1, b"TTGCA".to_vec());
    }

    #[test]
    fn test_empty_sequence() {
        let fasta = b">T1\n>T2\nACGT\n";
        let first = Reader::new(&fasta[..]).transcripts().next();
        match first {
            Some(Err(Error::EmptySequence(id))) => assert_eq!(id, "T1"),
            other => panic!("unexpected {:?}", other),
        }
    }
}
