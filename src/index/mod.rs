//! Triplet position indexes and the cross-transcript count catalog.
//!
//! A [`TripletPositionIndex`] records, for one transcript, where every
//! triplet context starts. A [`TripletCountCatalog`] aggregates how often
//! each triplet occurs in each transcript of a run, so that a transcript can
//! be drawn with probability proportional to its number of occurrences.

pub mod store;

use std::collections::{BTreeMap, HashSet};
use std::fs;
use std::io::{Read, Write};
use std::path::Path;

use log::{debug, info, warn};
use serde::{Deserialize, Serialize};

use crate::constants::*;
use crate::error::{Error, Result};
use crate::seq::{Pos, Triplet};
use self::store::{decode_framed, encode_framed, IndexStore};

/// Start offsets (0-based) of every triplet in one transcript sequence.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TripletPositionIndex {
    positions: BTreeMap<Triplet, Vec<Pos>>,
}

impl TripletPositionIndex {
    /// Index all overlapping triplets of a sequence.
    ///
    /// Windows containing a symbol other than ACGTU (e.g. N) are skipped.
    /// Sequences shorter than a triplet yield an empty index.
    pub fn build(seq: &[u8]) -> TripletPositionIndex {
        let mut positions: BTreeMap<Triplet, Vec<Pos>> = BTreeMap::new();

        // slide a window of 3 nucleotides; offsets are ascending within each bucket
        for (i, window) in seq.windows(TRIPLET_LEN).enumerate() {
            if let Some(triplet) = Triplet::from_window(window) {
                positions.entry(triplet).or_default().push(i as Pos);
            }
        }

        TripletPositionIndex { positions }
    }

    #[inline]
    pub fn positions(&self, triplet: &Triplet) -> &[Pos] {
        self.positions.get(triplet).map(|x| x.as_slice()).unwrap_or(&[])
    }

    #[inline]
    pub fn count(&self, triplet: &Triplet) -> usize {
        self.positions(triplet).len()
    }

    /// Total number of indexed triplet occurrences.
    pub fn total(&self) -> usize {
        self.positions.values().map(|x| x.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Triplet, &[Pos])> {
        self.positions.iter().map(|(t, x)| (t, x.as_slice()))
    }
}

/// Transcripts containing a triplet and their occurrence counts, index-aligned.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CatalogEntry {
    pub transcripts: Vec<String>,
    pub counts: Vec<u64>,
}

/// Per-triplet weighted choice table over the transcripts of a run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TripletCountCatalog {
    entries: BTreeMap<Triplet, CatalogEntry>,
    members: HashSet<String>,
}

impl TripletCountCatalog {
    pub fn new() -> TripletCountCatalog {
        TripletCountCatalog::default()
    }

    /// Accumulate the triplet counts of one transcript.
    ///
    /// Returns false if the transcript was already catalogued; it is then
    /// left untouched so that its weight is not doubled.
    pub fn add(&mut self, transcript: &str, index: &TripletPositionIndex) -> bool {
        if !self.members.insert(transcript.to_owned()) {
            warn!("transcript {} is already catalogued; ignoring repeated entry", transcript);
            return false;
        }

        for (triplet, positions) in index.iter() {
            let entry = self.entries.entry(*triplet).or_default();
            entry.transcripts.push(transcript.to_owned());
            entry.counts.push(positions.len() as u64);
        }

        true
    }

    #[inline]
    pub fn get(&self, triplet: &Triplet) -> Option<&CatalogEntry> {
        self.entries.get(triplet)
    }

    /// Number of catalogued transcripts.
    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    pub fn contains(&self, transcript: &str) -> bool {
        self.members.contains(transcript)
    }

    /// Write the catalog to a file for reuse by later runs.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let bytes = encode_framed(self)?;
        let mut f = fs::File::create(path.as_ref())?;
        f.write_all(&bytes)?;
        Ok(())
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<TripletCountCatalog> {
        let path = path.as_ref();
        let mut bytes = Vec::new();
        fs::File::open(path)?.read_to_end(&mut bytes)?;
        decode_framed(&bytes, &path.display().to_string())
    }
}

/// Index freshly read sequences, persist each index, and catalogue it.
///
/// Returns the number of transcripts processed.
pub fn index_sequences<I, S>(records: I, store: &mut S, catalog: &mut TripletCountCatalog) -> Result<usize>
where
    I: IntoIterator<Item = Result<(String, Vec<u8>)>>,
    S: IndexStore + ?Sized,
{
    let mut n = 0;
    for record in records {
        let (transcript, seq) = record?;
        // the first record of an id wins, in the store as in the catalog
        if catalog.contains(&transcript) {
            warn!("transcript {} occurs again in the sequences; keeping its first record", transcript);
            continue;
        }
        let index = TripletPositionIndex::build(&seq);
        if index.is_empty() {
            debug!("transcript {} has no valid triplet", transcript);
        }
        store.put(&transcript, &index)?;
        catalog.add(&transcript, &index);
        n += 1;
    }
    info!("indexed {} transcripts", n);
    Ok(n)
}

/// Catalogue transcripts whose indexes were persisted by an earlier run.
pub fn catalog_stored<S>(transcripts: &[String], store: &S, catalog: &mut TripletCountCatalog) -> Result<usize>
where
    S: IndexStore + ?Sized,
{
    let mut n = 0;
    for transcript in transcripts {
        let index = store.get(transcript)?
            .ok_or_else(|| Error::MissingIndex(transcript.clone()))?;
        if catalog.add(transcript, &index) {
            n += 1;
        }
    }
    info!("catalogued {} stored transcripts", n);
    Ok(n)
}
