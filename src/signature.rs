//! Conversion of COSMIC SBS signature matrices into mutational profiles.
//!
//! A matrix has a header row naming signatures and one row per channel
//! labelled `A[C>T]G`, with fractional weights in each signature column.

use std::fs;
use std::io;
use std::path::Path;

use log::info;

use crate::error::{Error, Result};
use crate::seq::{Substitution, Triplet};

/// Parse a channel label `5'[REF>ALT]3'` into its context and substitution.
pub fn parse_label(label: &str) -> Result<(Triplet, Substitution)> {
    let invalid = || Error::InvalidChannel(label.to_owned());
    match label.trim().as_bytes() {
        &[five, b'[', nt_ref, b'>', nt_alt, b']', three] => {
            let triplet = Triplet::from_window(&[five, nt_ref, three]).ok_or_else(invalid)?;
            let substitution = Substitution::new(nt_ref, nt_alt)
                .ok_or_else(invalid)?;
            Ok((triplet, substitution))
        },
        _ => Err(invalid()),
    }
}

/// Write the profile of one signature column, scaling weights into counts.
///
/// Returns the number of channels written.
pub fn convert<R: io::Read, W: io::Write>(input: R, column: &str, scale: f64, output: W) -> Result<usize> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(b'\t')
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_reader(input);
    let mut writer = csv::WriterBuilder::new()
        .delimiter(b'\t')
        .terminator(csv::Terminator::Any(b'\n'))
        .has_headers(false)
        .from_writer(output);

    let idx = reader.headers()?
        .iter()
        .position(|x| x == column)
        .ok_or_else(|| Error::MissingColumn(column.to_owned()))?;

    let mut n = 0;
    for r in reader.records() {
        let record = r?;
        let label = record.get(0).unwrap_or("");
        let (triplet, substitution) = parse_label(label)?;
        let weight: f64 = record.get(idx)
            .and_then(|x| x.parse().ok())
            .filter(|x: &f64| x.is_finite() && *x >= 0.0)
            .ok_or_else(|| Error::InvalidChannel(format!("{} has no valid weight in column {}", label, column)))?;
        let count = (weight * scale).round();
        writer.write_record(&[triplet.to_string(), substitution.to_string(), count.to_string()])?;
        n += 1;
    }
    writer.flush()?;

    Ok(n)
}

pub fn convert_file<P: AsRef<Path>, Q: AsRef<Path>>(input: P, column: &str, scale: f64, output: Q) -> Result<usize> {
    let n = convert(fs::File::open(input.as_ref())?, column, scale, io::BufWriter::new(fs::File::create(output.as_ref())?))?;
    info!("wrote {} channels of {} to {}", n, column, output.as_ref().display());
    Ok(n)
}
