//! Annotation service seam and its Ensembl `variant_recoder` implementation.

use std::collections::HashMap;
use std::fmt;
use std::time::Duration;

use log::debug;
use reqwest::blocking::Client;
use reqwest::header::{ACCEPT, CONTENT_TYPE};
use serde::Serialize;
use serde_json::Value;

/// One per-allele entry of a recoder response, decoded once at the boundary.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum AlleleResolution {
    /// The service could not recode an input
    Error { detail: String },
    /// Coding and genomic notations of one allele
    Hit { hgvsc: Vec<String>, hgvsg: Vec<String> },
}

impl AlleleResolution {
    /// Decode a response body: a list of objects keyed by allele.
    ///
    /// A list payload is an error; an object carrying both `hgvsc` and
    /// `hgvsg` lists is a hit; anything else is an error.
    pub fn decode_all(body: &str) -> Result<Vec<AlleleResolution>, serde_json::Error> {
        let entries: Vec<HashMap<String, Value>> = serde_json::from_str(body)?;
        let mut xs = Vec::new();
        for entry in entries.into_iter() {
            // sort keys so that decoding does not depend on map order
            let mut entry: Vec<(String, Value)> = entry.into_iter().collect();
            entry.sort_by(|a, b| a.0.cmp(&b.0));
            for (key, value) in entry.into_iter() {
                xs.push(AlleleResolution::decode(&key, value));
            }
        }
        Ok(xs)
    }

    fn decode(key: &str, value: Value) -> AlleleResolution {
        match value {
            Value::Object(map) => {
                let hgvsc = map.get("hgvsc").and_then(strings);
                let hgvsg = map.get("hgvsg").and_then(strings);
                match (hgvsc, hgvsg) {
                    (Some(hgvsc), Some(hgvsg)) => AlleleResolution::Hit { hgvsc, hgvsg },
                    _ => AlleleResolution::Error {
                        detail: format!("{}: no coding and genomic notations in {}", key, Value::Object(map)),
                    },
                }
            },
            Value::Array(xs) => AlleleResolution::Error { detail: format!("{}: {}", key, join(&xs)) },
            Value::String(x) => AlleleResolution::Error { detail: format!("{}: {}", key, x) },
            other => AlleleResolution::Error { detail: format!("{}: {}", key, other) },
        }
    }
}

fn strings(value: &Value) -> Option<Vec<String>> {
    value.as_array().map(|xs| {
        xs.iter().filter_map(|x| x.as_str().map(|s| s.to_owned())).collect()
    })
}

fn join(xs: &[Value]) -> String {
    xs.iter()
        .map(|x| match x.as_str() {
            Some(s) => s.to_owned(),
            None => x.to_string(),
        })
        .collect::<Vec<_>>()
        .join("; ")
}

/// Failure of a whole batch request.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ServiceError {
    /// Connection failure or timeout
    Transport(String),
    /// Non-success status, or a success body that could not be decoded
    Upstream { status: u16, body: String },
}

impl fmt::Display for ServiceError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            ServiceError::Transport(ref msg) => write!(f, "transport error: {}", msg),
            ServiceError::Upstream { status, ref body } => write!(f, "upstream status {}: {}", status, body),
        }
    }
}

impl std::error::Error for ServiceError {}

/// Batched recoding of coding notations into genomic notations.
pub trait AnnotationService {
    fn recode(&self, ids: &[String]) -> Result<Vec<AlleleResolution>, ServiceError>;
}

#[derive(Serialize)]
struct RecodeRequest<'a> {
    ids: &'a [String],
}

/// Blocking HTTP client of the Ensembl `variant_recoder` endpoint.
pub struct EnsemblClient {
    client: Client,
    url: String,
}

impl EnsemblClient {
    pub fn new(url: &str, timeout: Duration) -> reqwest::Result<EnsemblClient> {
        let client = Client::builder()
            .timeout(timeout)
            .build()?;
        Ok(EnsemblClient { client, url: url.trim_end_matches('/').to_owned() })
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

impl AnnotationService for EnsemblClient {
    fn recode(&self, ids: &[String]) -> Result<Vec<AlleleResolution>, ServiceError> {
        debug!("POST {} with {} ids", self.url, ids.len());
        let response = self.client.post(&self.url)
            .header(CONTENT_TYPE, "application/json")
            .header(ACCEPT, "application/json")
            .json(&RecodeRequest { ids })
            .send()
            .map_err(|e| ServiceError::Transport(e.to_string()))?;

        let status = response.status();
        let body = response.text().map_err(|e| ServiceError::Transport(e.to_string()))?;
        if !status.is_success() {
            return Err(ServiceError::Upstream { status: status.as_u16(), body });
        }

        AlleleResolution::decode_all(&body).map_err(|e| ServiceError::Upstream {
            status: status.as_u16(),
            body: format!("undecodable response: {}", e),
        })
    }
}
