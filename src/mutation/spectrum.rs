use std::io;
use std::path::Path;

use linked_hash_map::LinkedHashMap;
use log::warn;

use crate::error::{Error, Result};
use crate::io::profile;
use crate::seq::{Substitution, Triplet};
use super::Event;

/// Count and relative frequency of one mutation channel.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Channel {
    pub count: f64,
    pub freq: f64,
}

/// Mutational signature: triplet -> substitution -> (count, frequency).
///
/// Channels keep the order in which they were read.
#[derive(Clone, Debug)]
pub struct FrequencySpectrum {
    inner: LinkedHashMap<Triplet, LinkedHashMap<Substitution, Channel>>,
    total: f64,
}

impl FrequencySpectrum {
    /// Build from channel counts; frequency = count / total count.
    ///
    /// Repeated channels are summed.
    pub fn from_counts<I>(counts: I) -> Result<FrequencySpectrum>
    where
        I: IntoIterator<Item = (Triplet, Substitution, f64)>,
    {
        let mut inner: LinkedHashMap<Triplet, LinkedHashMap<Substitution, Channel>> = LinkedHashMap::new();
        let mut total = 0.0;

        for (triplet, substitution, count) in counts {
            if !count.is_finite() || count < 0.0 {
                return Err(Error::InvalidSpectrum(format!(
                    "count {} of {} {} is not a non-negative number", count, triplet, substitution
                )));
            }
            if !inner.contains_key(&triplet) {
                inner.insert(triplet, LinkedHashMap::new());
            }
            if let Some(changes) = inner.get_mut(&triplet) {
                match changes.get_mut(&substitution) {
                    Some(channel) => {
                        warn!("channel {} {} is listed more than once; counts are summed", triplet, substitution);
                        channel.count += count;
                    },
                    None => {
                        changes.insert(substitution, Channel { count, freq: 0.0 });
                    },
                }
            }
            total += count;
        }

        if total <= 0.0 {
            return Err(Error::InvalidSpectrum(String::from("total count is zero")));
        }

        for (_, changes) in inner.iter_mut() {
            for (_, channel) in changes.iter_mut() {
                channel.freq = channel.count / total;
            }
        }

        Ok(FrequencySpectrum { inner, total })
    }

    /// Build from relative frequencies taken as given, without normalization.
    ///
    /// Call [`validate`](FrequencySpectrum::validate) before sampling.
    pub fn from_frequencies<I>(freqs: I) -> FrequencySpectrum
    where
        I: IntoIterator<Item = (Triplet, Substitution, f64)>,
    {
        let mut inner: LinkedHashMap<Triplet, LinkedHashMap<Substitution, Channel>> = LinkedHashMap::new();
        let mut total = 0.0;
        for (triplet, substitution, freq) in freqs {
            if !inner.contains_key(&triplet) {
                inner.insert(triplet, LinkedHashMap::new());
            }
            if let Some(changes) = inner.get_mut(&triplet) {
                changes.insert(substitution, Channel { count: freq, freq });
            }
            total += freq;
        }
        FrequencySpectrum { inner, total }
    }

    pub fn from_reader<R: io::Read>(reader: R) -> Result<FrequencySpectrum> {
        let mut reader = profile::Reader::new(reader);
        let records = reader.records()
            .map(|r| r.map(|x| (x.triplet, x.substitution, x.count)))
            .collect::<Result<Vec<_>>>()?;
        FrequencySpectrum::from_counts(records)
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<FrequencySpectrum> {
        let mut reader = profile::Reader::from_file(path)?;
        let records = reader.records()
            .map(|r| r.map(|x| (x.triplet, x.substitution, x.count)))
            .collect::<Result<Vec<_>>>()?;
        FrequencySpectrum::from_counts(records)
    }

    /// Check that every frequency lies in [0, 1] and that they sum to 1
    /// within `tolerance`.
    pub fn validate(&self, tolerance: f64) -> Result<()> {
        let mut sum = 0.0;
        for (event, channel) in self.iter() {
            if !(0.0..=1.0).contains(&channel.freq) {
                return Err(Error::InvalidSpectrum(format!(
                    "frequency {} of {} is outside [0, 1]", channel.freq, event
                )));
            }
            sum += channel.freq;
        }
        if (sum - 1.0).abs() > tolerance {
            return Err(Error::InvalidSpectrum(format!(
                "frequencies sum to {} instead of 1", sum
            )));
        }
        Ok(())
    }

    #[inline]
    pub fn get(&self, triplet: &Triplet, substitution: &Substitution) -> Option<&Channel> {
        self.inner.get(triplet).and_then(|x| x.get(substitution))
    }

    /// Iterate over channels in profile order.
    pub fn iter(&self) -> impl Iterator<Item = (Event, &Channel)> {
        self.inner.iter().flat_map(|(&triplet, changes)| {
            changes.iter().map(move |(&substitution, channel)| (Event { triplet, substitution }, channel))
        })
    }

    /// Number of channels.
    pub fn len(&self) -> usize {
        self.inner.iter().map(|(_, x)| x.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Sum of all channel counts.
    pub fn total(&self) -> f64 {
        self.total
    }
}
