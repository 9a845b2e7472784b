//! In-process annotation service for tests.

use std::cell::RefCell;
use std::collections::HashMap;

use crate::utils::split_hgvs;
use super::client::{AlleleResolution, AnnotationService, ServiceError};

/// Recodes known coding notations; inputs containing `bad` are rejected
/// and anything else is silently left out of the response.
#[derive(Default)]
pub struct StubService {
    known: HashMap<(String, String), String>,
    /// Failures returned by successive calls, `None` for a normal response
    failures: RefCell<Vec<Option<ServiceError>>>,
    pub calls: RefCell<Vec<Vec<String>>>,
}

impl StubService {
    pub fn new() -> StubService {
        StubService::default()
    }

    pub fn with(mut self, coding: &str, genomic: &str) -> StubService {
        if let Some((t, change)) = split_hgvs(coding) {
            self.known.insert((t.to_owned(), change.to_owned()), genomic.to_owned());
        }
        self
    }

    /// Make the next calls fail in order.
    pub fn failing(self, failures: Vec<Option<ServiceError>>) -> StubService {
        *self.failures.borrow_mut() = failures;
        self
    }

    pub fn n_calls(&self) -> usize {
        self.calls.borrow().len()
    }
}

impl AnnotationService for StubService {
    fn recode(&self, ids: &[String]) -> Result<Vec<AlleleResolution>, ServiceError> {
        self.calls.borrow_mut().push(ids.to_vec());

        let failure = {
            let mut failures = self.failures.borrow_mut();
            if failures.is_empty() { None } else { failures.remove(0) }
        };
        if let Some(e) = failure {
            return Err(e);
        }

        let mut xs = Vec::new();
        for id in ids.iter() {
            if id.contains("bad") {
                xs.push(AlleleResolution::Error { detail: format!("Could not parse '{}'", id) });
                continue;
            }
            if let Some((t, change)) = split_hgvs(id) {
                if let Some(g) = self.known.get(&(t.to_owned(), change.to_owned())) {
                    xs.push(AlleleResolution::Hit {
                        hgvsc: vec![format!("ENST99999999999.1:{}", change), format!("{}.4:{}", t, change)],
                        hgvsg: vec![g.clone()],
                    });
                }
            }
        }
        Ok(xs)
    }
}
