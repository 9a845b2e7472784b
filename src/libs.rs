//! Simulation of single-nucleotide substitutions drawn from a
//! triplet-context mutational signature, placed on real transcripts and
//! reported at genome coordinates.

pub mod config;
pub mod error;
pub mod index;
pub mod io;
pub mod mutation;
pub mod resolve;
pub mod sample;
pub mod seq;
pub mod signature;
pub mod simulate;
pub mod stats;
pub mod utils;
pub mod variant;

pub mod constants;

pub use crate::error::{Error, Result};
