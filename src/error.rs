use std::io;
use std::path::PathBuf;
use std::result;

use thiserror::Error;

use crate::seq::Triplet;

/// Errors raised while loading inputs, building indexes or sampling.
///
/// Failures of individual annotation requests are not errors: they are
/// recorded per input by the resolver.
#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Io(#[from] io::Error),

    #[error("could not read tabular input: {0}")]
    Csv(#[from] csv::Error),

    #[error("invalid profile line {line}: {msg}")]
    Profile { line: u64, msg: String },

    #[error("invalid triplet `{0}`")]
    InvalidTriplet(String),

    #[error("invalid substitution `{0}`")]
    InvalidSubstitution(String),

    #[error("invalid spectrum: {0}")]
    InvalidSpectrum(String),

    #[error("sequence `{0}` is empty")]
    EmptySequence(String),

    #[error("triplet {0} does not occur in any catalogued transcript")]
    UnknownTriplet(Triplet),

    #[error("no position index stored for transcript `{0}`")]
    MissingIndex(String),

    #[error("position index of transcript `{transcript}` lists no {triplet} although the catalog does")]
    CatalogMismatch { transcript: String, triplet: Triplet },

    #[error("position index of transcript `{0}` failed its checksum")]
    CorruptIndex(String),

    #[error("could not encode or decode stored data: {0}")]
    Encoding(#[from] bincode::Error),

    #[error("index database error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("could not read configuration {path:?}: {msg}")]
    Config { path: PathBuf, msg: String },

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("malformed coding notation `{0}`")]
    MalformedCoding(String),

    #[error("malformed genomic notation `{0}`")]
    MalformedGenomic(String),

    #[error("signature column `{0}` not found")]
    MissingColumn(String),

    #[error("invalid signature channel `{0}`")]
    InvalidChannel(String),
}

pub type Result<T> = result::Result<T, Error>;
