use std::collections::HashMap;

use log::{debug, warn};
use rand::distributions::{Distribution, WeightedIndex};
use rand::seq::SliceRandom;
use rand::Rng;

use crate::error::{Error, Result};
use crate::index::store::{IndexCache, IndexStore};
use crate::index::{TripletCountCatalog, TripletPositionIndex};
use crate::mutation::{coding_position, CodingMutation, Event, FrequencySpectrum};
use crate::seq::{Pos, Triplet};
use crate::stats;

/// Sample n mutation events with replacement.
///
/// Each channel is drawn with probability equal to its frequency. The
/// spectrum must pass validation at the given tolerance.
pub fn sample_events<R: Rng + ?Sized>(spectrum: &FrequencySpectrum, n: usize, tolerance: f64, rng: &mut R) -> Result<Vec<Event>> {
    spectrum.validate(tolerance)?;

    let (events, weights): (Vec<Event>, Vec<f64>) = spectrum.iter()
        .map(|(event, channel)| (event, channel.freq))
        .unzip();
    let dist = WeightedIndex::new(&weights)
        .map_err(|e| Error::InvalidSpectrum(e.to_string()))?;

    Ok((0..n).map(|_| events[dist.sample(rng)]).collect())
}

/// Choose a transcript containing the triplet, weighted by its number of occurrences.
pub fn select_transcript<'a, R: Rng + ?Sized>(catalog: &'a TripletCountCatalog, triplet: &Triplet, rng: &mut R) -> Result<&'a str> {
    let entry = catalog.get(triplet).ok_or(Error::UnknownTriplet(*triplet))?;
    // fails when there are no entries or every count is zero
    let dist = WeightedIndex::new(&entry.counts).map_err(|_| Error::UnknownTriplet(*triplet))?;
    Ok(&entry.transcripts[dist.sample(rng)])
}

/// Choose an occurrence of the triplet uniformly and return the 1-based
/// coding position of its middle base.
pub fn select_position<R: Rng + ?Sized>(index: &TripletPositionIndex, transcript: &str, triplet: &Triplet, rng: &mut R) -> Result<Pos> {
    index.positions(triplet)
        .choose(rng)
        .map(|&offset| coding_position(offset))
        .ok_or_else(|| Error::CatalogMismatch { transcript: transcript.to_owned(), triplet: *triplet })
}

/// Outcome of placing sampled events on transcripts.
#[derive(Debug, Default)]
pub struct Simulation {
    /// Placed mutations, in event order
    pub mutations: Vec<CodingMutation>,
    /// Events whose triplet no catalogued transcript contains
    pub skipped: Vec<Event>,
}

/// Place every event at a transcript position.
///
/// An event whose triplet is absent from the catalog is skipped and
/// reported; any other failure aborts.
pub fn simulate<S, R>(events: &[Event], catalog: &TripletCountCatalog, indexes: &mut IndexCache<S>, rng: &mut R) -> Result<Simulation>
where
    S: IndexStore + ?Sized,
    R: Rng + ?Sized,
{
    let mut sim = Simulation::default();

    for event in events.iter() {
        let transcript = match select_transcript(catalog, &event.triplet, rng) {
            Ok(x) => x,
            Err(Error::UnknownTriplet(triplet)) => {
                warn!("skipping {}: triplet {} is absent from all transcripts", event, triplet);
                sim.skipped.push(*event);
                continue;
            },
            Err(e) => return Err(e),
        };
        let index = indexes.get(transcript)?;
        let c_pos = select_position(index, transcript, &event.triplet, rng)?;
        let mutation = CodingMutation::new(transcript, c_pos, event.substitution);
        debug!("{} -> {}", event, mutation);
        sim.mutations.push(mutation);
    }

    Ok(sim)
}

/// Empirical channel frequencies of sampled events, aligned with `spectrum.iter()`.
pub fn empirical_frequencies(spectrum: &FrequencySpectrum, events: &[Event]) -> Vec<f64> {
    let mut counts: HashMap<Event, usize> = HashMap::new();
    for event in events.iter() {
        *counts.entry(*event).or_insert(0) += 1;
    }
    let n = events.len().max(1) as f64;
    spectrum.iter()
        .map(|(event, _)| counts.get(&event).cloned().unwrap_or(0) as f64 / n)
        .collect()
}

/// Agreement between sampled events and the spectrum.
#[derive(Debug, Clone, Copy)]
pub struct Fidelity {
    /// Jensen-Shannon divergence, bounded in [0, 1]
    pub js_divergence: f64,
    pub cosine_similarity: f64,
}

pub fn fidelity(spectrum: &FrequencySpectrum, events: &[Event]) -> Fidelity {
    let expected: Vec<f64> = spectrum.iter().map(|(_, c)| c.freq).collect();
    let observed = empirical_frequencies(spectrum, events);
    Fidelity {
        js_divergence: stats::js_divergence(&observed, &expected),
        cosine_similarity: stats::cosine_similarity(&observed, &expected),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::store::MemoryStore;
    use crate::seq::Substitution;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn channel(t: &str, s: &str, x: f64) -> (Triplet, Substitution, f64) {
        (t.parse().unwrap(), s.parse().unwrap(), x)
    }

    fn two_channel_spectrum() -> FrequencySpectrum {
        FrequencySpectrum::from_counts(vec![
            channel("CGA", "G/A", 6.0),
            channel("TGC", "C/T", 4.0),
        ]).unwrap()
    }

    #[test]
    fn test_sample_events_count() {
        let mut rng = StdRng::seed_from_u64(1);
        let spectrum = two_channel_spectrum();
        for &n in [0, 1, 17, 1000].iter() {
            assert_eq!(sample_events(&spectrum, n, 1.0e-6, &mut rng).unwrap().len(), n);
        }
    }

    #[test]
    fn test_sample_events_converges() {
        let mut rng = StdRng::seed_from_u64(7);
        let spectrum = FrequencySpectrum::from_counts(vec![
            channel("CGA", "G/A", 50.0),
            channel("TCA", "C/T", 30.0),
            channel("TCT", "C/G", 15.0),
            channel("ACG", "C/A", 5.0),
        ]).unwrap();

        let events = sample_events(&spectrum, 100_000, 1.0e-6, &mut rng).unwrap();
        let observed = empirical_frequencies(&spectrum, &events);
        let expected = [0.5, 0.3, 0.15, 0.05];
        for (o, e) in observed.iter().zip(expected.iter()) {
            // several standard errors at n = 1e5
            assert!((o - e).abs() < 0.01, "{} vs {}", o, e);
        }

        let f = fidelity(&spectrum, &events);
        assert!(f.js_divergence < 1.0e-3);
        assert!(f.cosine_similarity > 0.999);
    }

    #[test]
    fn test_sample_events_reproducible() {
        let spectrum = two_channel_spectrum();
        let a = sample_events(&spectrum, 50, 1.0e-6, &mut StdRng::seed_from_u64(42)).unwrap();
        let b = sample_events(&spectrum, 50, 1.0e-6, &mut StdRng::seed_from_u64(42)).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_sample_events_invalid_spectrum() {
        let mut rng = StdRng::seed_from_u64(1);
        let spectrum = FrequencySpectrum::from_frequencies(vec![
            channel("CGA", "G/A", 0.5),
            channel("TGC", "C/T", 0.2),
        ]);
        match sample_events(&spectrum, 10, 1.0e-6, &mut rng) {
            Err(Error::InvalidSpectrum(_)) => {},
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_select_transcript_weighted() {
        let mut catalog = TripletCountCatalog::new();
        // CGA occurs 3 times in T1 and once in T2
        catalog.add("T1", &TripletPositionIndex::build(b"CGACGACGA"));
        catalog.add("T2", &TripletPositionIndex::build(b"CGA"));

        let mut rng = StdRng::seed_from_u64(3);
        let cga: Triplet = "CGA".parse().unwrap();
        let n = 20_000;
        let t1 = (0..n)
            .filter(|_| select_transcript(&catalog, &cga, &mut rng).unwrap() == "T1")
            .count();
        let p = t1 as f64 / n as f64;
        assert!((p - 0.75).abs() < 0.02, "{}", p);
    }

    #[test]
    fn test_select_transcript_unknown() {
        let mut catalog = TripletCountCatalog::new();
        catalog.add("T1", &TripletPositionIndex::build(b"CGA"));
        let mut rng = StdRng::seed_from_u64(3);
        let aaa: Triplet = "AAA".parse().unwrap();
        match select_transcript(&catalog, &aaa, &mut rng) {
            Err(Error::UnknownTriplet(t)) => assert_eq!(t, aaa),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_select_position() {
        let mut rng = StdRng::seed_from_u64(5);
        let index = TripletPositionIndex::build(b"CGATTCGATT");
        let cga: Triplet = "CGA".parse().unwrap();
        // CGA starts at offsets 0 and 5: middle bases at 1-based 2 and 7
        for _ in 0..50 {
            let pos = select_position(&index, "T1", &cga, &mut rng).unwrap();
            assert!(pos == 2 || pos == 7, "{}", pos);
        }

        let aaa: Triplet = "AAA".parse().unwrap();
        assert!(select_position(&index, "T1", &aaa, &mut rng).is_err());
    }

    #[test]
    fn test_simulate() {
        let mut store = MemoryStore::new();
        let mut catalog = TripletCountCatalog::new();
        let records = vec![
            Ok((String::from("T1"), b"CGATCGATCGA".to_vec())),
            Ok((String::from("T2"), b"ATGCA".to_vec())),
        ];
        crate::index::index_sequences(records, &mut store, &mut catalog).unwrap();

        let events = vec![
            Event { triplet: "CGA".parse().unwrap(), substitution: "G/A".parse().unwrap() },
            Event { triplet: "TGC".parse().unwrap(), substitution: "G/T".parse().unwrap() },
            Event { triplet: "AAA".parse().unwrap(), substitution: "A/C".parse().unwrap() },
        ];

        let mut rng = StdRng::seed_from_u64(11);
        let mut cache = IndexCache::new(&store);
        let sim = simulate(&events, &catalog, &mut cache, &mut rng).unwrap();

        assert_eq!(sim.mutations.len(), 2);
        assert_eq!(sim.skipped, vec![events[2]]);

        let first = &sim.mutations[0];
        assert_eq!(first.transcript, "T1");
        assert!([2, 6, 10].contains(&first.c_pos));
        assert_eq!(sim.mutations[1].to_string(), "T2:c.3G>T");
    }
}
