use std::fmt::Display;
use std::fs;
use std::io::{self, BufRead, Write};
use std::path::Path;

use crate::utils::transcript_id;

fn lines<R: BufRead>(reader: R) -> io::Result<Vec<String>> {
    let mut xs = Vec::new();
    for line in reader.lines() {
        let line = line?;
        let line = line.trim();
        if !line.is_empty() {
            xs.push(line.to_owned());
        }
    }
    Ok(xs)
}

/// Read transcript identifiers, one per line, dropping `|` suffixes and versions.
pub fn read_transcripts<R: BufRead>(reader: R) -> io::Result<Vec<String>> {
    Ok(lines(reader)?.iter().map(|x| transcript_id(x).to_owned()).collect())
}

/// Read HGVS coding descriptors, one per line.
pub fn read_descriptors<R: BufRead>(reader: R) -> io::Result<Vec<String>> {
    lines(reader)
}

pub fn open<P: AsRef<Path>>(path: P) -> io::Result<io::BufReader<fs::File>> {
    fs::File::open(path).map(io::BufReader::new)
}

/// Write one item per line.
pub fn write_lines<W, I>(mut writer: W, xs: I) -> io::Result<()>
where
    W: Write,
    I: IntoIterator,
    I::Item: Display,
{
    for x in xs {
        writeln!(writer, "{}", x)?;
    }
    writer.flush()
}

pub fn create<P: AsRef<Path>>(path: P) -> io::Result<io::BufWriter<fs::File>> {
    fs::File::create(path).map(io::BufWriter::new)
}
