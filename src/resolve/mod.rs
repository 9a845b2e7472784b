//! Batched translation of coding notations into genomic notations.

pub mod client;
#[cfg(test)]
pub mod stub;

use std::collections::HashMap;
use std::fmt;
use std::thread;
use std::time::Duration;

use log::{debug, info, warn};
use multimap::MultiMap;

use crate::constants::DEFAULT_BATCH_SIZE;
use crate::error::{Error, Result};
use crate::utils::split_hgvs;
use self::client::{AlleleResolution, AnnotationService, ServiceError};

pub use self::client::EnsemblClient;

/// Why an input did not resolve.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FailureReason {
    /// The request of its batch failed to connect or timed out
    Transport(String),
    /// The service answered its batch with an error status or an undecodable body
    Upstream { status: u16, body: String },
    /// The service reported an error naming this input
    Rejected(String),
    /// The batch succeeded but no returned coding notation matched
    NoMatch,
}

impl FailureReason {
    /// Whether re-requesting the input may succeed.
    pub fn is_transient(&self) -> bool {
        matches!(*self, FailureReason::Transport(_) | FailureReason::Upstream { .. })
    }
}

impl From<ServiceError> for FailureReason {
    fn from(e: ServiceError) -> FailureReason {
        match e {
            ServiceError::Transport(msg) => FailureReason::Transport(msg),
            ServiceError::Upstream { status, body } => FailureReason::Upstream { status, body },
        }
    }
}

impl fmt::Display for FailureReason {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            FailureReason::Transport(ref msg) => write!(f, "transport\t{}", msg),
            FailureReason::Upstream { status, ref body } => write!(f, "upstream\t{} {}", status, body.replace(['\t', '\n'], " ")),
            FailureReason::Rejected(ref detail) => write!(f, "rejected\t{}", detail.replace(['\t', '\n'], " ")),
            FailureReason::NoMatch => write!(f, "no_match\t"),
        }
    }
}

/// Outcome of resolving a list of inputs.
///
/// Both lists follow input order and keep duplicates, so that
/// `resolved.len() + failed.len()` equals the number of inputs.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct GenomicResolution {
    /// (coding notation, genomic notation)
    pub resolved: Vec<(String, String)>,
    pub failed: Vec<(String, FailureReason)>,
}

impl GenomicResolution {
    pub fn len(&self) -> usize {
        self.resolved.len() + self.failed.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn genomic(&self) -> impl Iterator<Item = &str> {
        self.resolved.iter().map(|(_, g)| g.as_str())
    }
}

type Outcome = std::result::Result<String, FailureReason>;

/// Whether a returned coding notation describes the input: same transcript,
/// ignoring versions, and same change text.
fn same_change(input: &str, coding: &str) -> bool {
    match (split_hgvs(input), split_hgvs(coding)) {
        (Some(x), Some(y)) => x == y,
        _ => false,
    }
}

/// Whether an error detail names the input as a whole token, not as the
/// tail of a longer notation (`T1:c.1A>G` inside `ENST1:c.1A>G`).
fn names_input(detail: &str, input: &str) -> bool {
    let is_word = |c: char| c.is_ascii_alphanumeric() || c == '_' || c == '.';
    detail.match_indices(input).any(|(i, _)| {
        let before = detail[..i].chars().next_back();
        let after = detail[i + input.len()..].chars().next();
        !before.map_or(false, is_word) && !after.map_or(false, is_word)
    })
}

/// Resolves coding notations through an annotation service, one batch at a time.
pub struct GenomicResolver<'a, A: AnnotationService + ?Sized> {
    service: &'a A,
    batch_size: usize,
    delay: Duration,
    max_attempts: usize,
}

impl<'a, A: AnnotationService + ?Sized> GenomicResolver<'a, A> {
    pub fn new(service: &'a A, batch_size: usize) -> Result<GenomicResolver<'a, A>> {
        if batch_size == 0 {
            return Err(Error::InvalidConfig(String::from("batch size must be positive")));
        }
        Ok(GenomicResolver { service, batch_size, delay: Duration::from_millis(0), max_attempts: 1 })
    }

    /// Pause between consecutive requests.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Number of times an input failing for a transient reason is requested.
    pub fn with_max_attempts(mut self, max_attempts: usize) -> Self {
        self.max_attempts = max_attempts.max(1);
        self
    }

    pub fn resolve(&self, inputs: &[String]) -> GenomicResolution {
        // distinct input -> its positions among the inputs
        let mut origins: MultiMap<&str, usize> = MultiMap::new();
        let mut unique: Vec<&str> = Vec::new();
        for (i, x) in inputs.iter().enumerate() {
            if !origins.contains_key(x.as_str()) {
                unique.push(x.as_str());
            }
            origins.insert(x.as_str(), i);
        }
        info!("resolving {} inputs ({} unique) in batches of {}", inputs.len(), unique.len(), self.batch_size);

        let mut outcomes: HashMap<&str, Outcome> = HashMap::new();
        let mut pending = unique.clone();
        let mut n_requests = 0;
        for attempt in 1..=self.max_attempts {
            if pending.is_empty() {
                break;
            }
            if attempt > 1 {
                info!("re-requesting {} inputs (attempt {} of {})", pending.len(), attempt, self.max_attempts);
            }
            for batch in pending.chunks(self.batch_size) {
                if n_requests > 0 && !self.delay.is_zero() {
                    thread::sleep(self.delay);
                }
                n_requests += 1;
                outcomes.extend(self.resolve_batch(batch));
            }
            pending = unique.iter()
                .filter(|x| matches!(outcomes.get(*x), Some(Err(r)) if r.is_transient()))
                .cloned()
                .collect();
        }

        // re-inflate duplicates in input order
        let mut slots: Vec<Option<Outcome>> = vec![None; inputs.len()];
        for x in unique.iter() {
            let outcome = outcomes.remove(x).unwrap_or(Err(FailureReason::NoMatch));
            if let Some(positions) = origins.get_vec(x) {
                for &i in positions.iter() {
                    slots[i] = Some(outcome.clone());
                }
            }
        }

        let mut resolution = GenomicResolution::default();
        for (x, slot) in inputs.iter().zip(slots.into_iter()) {
            match slot {
                Some(Ok(g)) => resolution.resolved.push((x.clone(), g)),
                Some(Err(r)) => resolution.failed.push((x.clone(), r)),
                None => resolution.failed.push((x.clone(), FailureReason::NoMatch)),
            }
        }
        info!("resolved {} of {} inputs; {} failed", resolution.resolved.len(), inputs.len(), resolution.failed.len());
        resolution
    }

    fn resolve_batch<'b>(&self, batch: &[&'b str]) -> Vec<(&'b str, Outcome)> {
        let ids: Vec<String> = batch.iter().map(|x| x.to_string()).collect();

        let alleles = match self.service.recode(&ids) {
            Ok(xs) => xs,
            Err(e) => {
                warn!("batch of {} inputs failed: {}", batch.len(), e);
                let reason = FailureReason::from(e);
                return batch.iter().map(|&x| (x, Err(reason.clone()))).collect();
            },
        };

        let mut outcomes: Vec<Option<Outcome>> = vec![None; batch.len()];
        for allele in alleles.iter() {
            match *allele {
                AlleleResolution::Error { ref detail } => {
                    warn!("service error: {}", detail);
                    for (i, x) in batch.iter().enumerate() {
                        if outcomes[i].is_none() && names_input(detail, x) {
                            outcomes[i] = Some(Err(FailureReason::Rejected(detail.clone())));
                        }
                    }
                },
                AlleleResolution::Hit { ref hgvsc, ref hgvsg } => {
                    let genomic = match hgvsg.first() {
                        Some(g) => g,
                        None => continue,
                    };
                    for (i, x) in batch.iter().enumerate() {
                        // each input is claimed at most once
                        if let Some(Ok(_)) = outcomes[i] {
                            continue;
                        }
                        if hgvsc.iter().any(|c| same_change(x, c)) {
                            debug!("{} -> {}", x, genomic);
                            outcomes[i] = Some(Ok(genomic.clone()));
                        }
                    }
                },
            }
        }

        batch.iter()
            .zip(outcomes.into_iter())
            .map(|(&x, outcome)| (x, outcome.unwrap_or(Err(FailureReason::NoMatch))))
            .collect()
    }
}

impl<'a, A: AnnotationService + ?Sized> fmt::Debug for GenomicResolver<'a, A> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("GenomicResolver")
            .field("batch_size", &self.batch_size)
            .field("delay", &self.delay)
            .field("max_attempts", &self.max_attempts)
            .finish()
    }
}

/// Resolver over a service with the default batch size.
pub fn resolver<A: AnnotationService + ?Sized>(service: &A) -> GenomicResolver<'_, A> {
    GenomicResolver { service, batch_size: DEFAULT_BATCH_SIZE, delay: Duration::from_millis(0), max_attempts: 1 }
}

#[cfg(test)]
mod tests {
    use super::*;
    use super::stub::StubService;
    use rstest::rstest;

    fn strings(xs: &[&str]) -> Vec<String> {
        xs.iter().map(|x| x.to_string()).collect()
    }

    fn check_partition(inputs: &[String], res: &GenomicResolution) {
        assert_eq!(res.len(), inputs.len());
        for (x, _) in res.resolved.iter() {
            assert!(inputs.contains(x));
        }
    }

    fn service() -> StubService {
        StubService::new()
            .with("ENST00000169551:c.609G>A", "NC_000018.10:g.74158243G>A")
            .with("ENST00000603986:c.1050C>T", "NC_000023.11:g.49067337G>A")
            .with("ENST00000383070:c.55C>T", "NC_000024.10:g.2787387C>T")
    }

    #[test]
    fn test_duplicates_keep_multiplicity() {
        let svc = service();
        let inputs = strings(&[
            "ENST00000169551:c.609G>A",
            "ENST00000383070:c.55C>T",
            "ENST00000169551:c.609G>A",
            "ENST00000558353:c.323G>A",
            "ENST00000169551:c.609G>A",
        ]);
        let res = resolver(&svc).resolve(&inputs);
        check_partition(&inputs, &res);

        assert_eq!(svc.n_calls(), 1);
        assert_eq!(svc.calls.borrow()[0].len(), 3);

        let genomic: Vec<&str> = res.genomic().collect();
        assert_eq!(genomic, vec![
            "NC_000018.10:g.74158243G>A",
            "NC_000024.10:g.2787387C>T",
            "NC_000018.10:g.74158243G>A",
            "NC_000018.10:g.74158243G>A",
        ]);
        assert_eq!(res.failed, vec![(inputs[3].clone(), FailureReason::NoMatch)]);
    }

    #[rstest]
    #[case(1, vec![1, 1, 1, 1, 1])]
    #[case(2, vec![2, 2, 1])]
    #[case(5, vec![5])]
    #[case(150, vec![5])]
    fn test_batch_sizes(#[case] batch_size: usize, #[case] expected: Vec<usize>) {
        let svc = service();
        let inputs = strings(&["T1:c.1A>G", "T1:c.2A>G", "T1:c.3A>G", "T1:c.4A>G", "T1:c.5A>G", "T1:c.1A>G"]);
        let res = GenomicResolver::new(&svc, batch_size).unwrap().resolve(&inputs);
        check_partition(&inputs, &res);
        let sizes: Vec<usize> = svc.calls.borrow().iter().map(|x| x.len()).collect();
        assert_eq!(sizes, expected);
    }

    #[test]
    fn test_zero_batch_size() {
        let svc = service();
        assert!(GenomicResolver::new(&svc, 0).is_err());
    }

    #[test]
    fn test_transport_failure_skips_batch() {
        let svc = service().failing(vec![
            None,
            Some(ServiceError::Transport(String::from("timed out"))),
        ]);
        let inputs = strings(&[
            "ENST00000169551:c.609G>A",
            "ENST00000603986:c.1050C>T",
            "ENST00000383070:c.55C>T",
        ]);
        let res = GenomicResolver::new(&svc, 2).unwrap().resolve(&inputs);
        check_partition(&inputs, &res);
        assert_eq!(svc.n_calls(), 2);
        assert_eq!(res.resolved.len(), 2);
        assert_eq!(res.failed, vec![
            (inputs[2].clone(), FailureReason::Transport(String::from("timed out"))),
        ]);
    }

    #[test]
    fn test_upstream_failure() {
        let svc = service().failing(vec![
            Some(ServiceError::Upstream { status: 503, body: String::from("busy") }),
        ]);
        let inputs = strings(&["ENST00000169551:c.609G>A", "ENST00000169551:c.609G>A"]);
        let res = resolver(&svc).resolve(&inputs);
        check_partition(&inputs, &res);
        assert!(res.resolved.is_empty());
        for (_, reason) in res.failed.iter() {
            assert_eq!(*reason, FailureReason::Upstream { status: 503, body: String::from("busy") });
        }
    }

    #[test]
    fn test_rejected_input() {
        let svc = service();
        let inputs = strings(&["ENST00000169551:c.609G>A", "ENST_bad:c.1A>G"]);
        let res = resolver(&svc).resolve(&inputs);
        check_partition(&inputs, &res);
        match res.failed[0] {
            (ref x, FailureReason::Rejected(ref detail)) => {
                assert_eq!(x, "ENST_bad:c.1A>G");
                assert!(detail.contains("ENST_bad:c.1A>G"));
            },
            ref other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_rejected_input_is_whole_token() {
        let svc = service();
        let inputs = strings(&["T1:c.1A>G", "badT1:c.1A>G"]);
        let res = resolver(&svc).resolve(&inputs);
        check_partition(&inputs, &res);
        assert_eq!(res.failed[0], (inputs[0].clone(), FailureReason::NoMatch));
        match res.failed[1] {
            (ref x, FailureReason::Rejected(_)) => assert_eq!(x, "badT1:c.1A>G"),
            ref other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_names_input() {
        assert!(names_input("Could not parse 'ENST1:c.1A>G'", "ENST1:c.1A>G"));
        assert!(names_input("ENST1:c.1A>G: no hit", "ENST1:c.1A>G"));
        assert!(!names_input("Could not parse 'ENST1:c.1A>G'", "T1:c.1A>G"));
        assert!(!names_input("Could not parse 'T1.2:c.1A>G'", "2:c.1A>G"));
        assert!(!names_input("Could not parse 'T1:c.1A>GT'", "T1:c.1A>G"));
    }

    #[test]
    fn test_versioned_input_matches() {
        let svc = service();
        let inputs = strings(&["ENST00000169551.7:c.609G>A", "ENST00000169551:c.610G>A"]);
        let res = resolver(&svc).resolve(&inputs);
        assert_eq!(res.resolved, vec![
            (inputs[0].clone(), String::from("NC_000018.10:g.74158243G>A")),
        ]);
        assert_eq!(res.failed, vec![(inputs[1].clone(), FailureReason::NoMatch)]);
    }

    #[test]
    fn test_retry_transient_only() {
        let svc = service().failing(vec![
            Some(ServiceError::Transport(String::from("reset"))),
        ]);
        let inputs = strings(&["ENST00000169551:c.609G>A", "ENST00000558353:c.323G>A"]);
        let res = resolver(&svc).with_max_attempts(3).resolve(&inputs);
        check_partition(&inputs, &res);

        // first call fails, second resolves one and leaves a permanent no-match
        assert_eq!(svc.n_calls(), 2);
        assert_eq!(res.resolved.len(), 1);
        assert_eq!(res.failed, vec![(inputs[1].clone(), FailureReason::NoMatch)]);
    }

    #[test]
    fn test_idempotent() {
        let svc = service();
        let inputs = strings(&[
            "ENST00000169551:c.609G>A",
            "ENST_bad:c.1A>G",
            "ENST00000558353:c.323G>A",
            "ENST00000383070:c.55C>T",
        ]);
        let r = GenomicResolver::new(&svc, 3).unwrap();
        assert_eq!(r.resolve(&inputs), r.resolve(&inputs));
    }

    #[test]
    fn test_empty_input() {
        let svc = service();
        let res = resolver(&svc).resolve(&[]);
        assert!(res.is_empty());
        assert_eq!(svc.n_calls(), 0);
    }

    #[test]
    fn test_failure_display() {
        assert_eq!(FailureReason::NoMatch.to_string(), "no_match\t");
        let r = FailureReason::Upstream { status: 400, body: String::from("bad\trequest") };
        assert_eq!(r.to_string(), "upstream\t400 bad request");
    }
}
