//! Run configuration, read from TOML.

use std::collections::HashMap;
use std::fs;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::constants::*;
use crate::error::{Error, Result};

/// Annotation service settings
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct ServiceConfig {
    /// Endpoint of the recoder (POST)
    pub url: String,
    /// Inputs per request (default: 150)
    pub batch_size: usize,
    pub timeout_secs: u64,
    /// Pause between requests in milliseconds (default: 0)
    pub delay_ms: u64,
    /// Requests made for an input failing transiently (default: 1)
    pub max_attempts: usize,
}

impl Default for ServiceConfig {
    fn default() -> ServiceConfig {
        ServiceConfig {
            url: ENSEMBL_RECODER_URL.to_owned(),
            batch_size: DEFAULT_BATCH_SIZE,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            delay_ms: 0,
            max_attempts: 1,
        }
    }
}

impl ServiceConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn delay(&self) -> Duration {
        Duration::from_millis(self.delay_ms)
    }
}

/// VCF output settings
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct OutputConfig {
    pub source: String,
    pub sample: String,
}

impl Default for OutputConfig {
    fn default() -> OutputConfig {
        OutputConfig { source: VCF_SOURCE.to_owned(), sample: VCF_SAMPLE.to_owned() }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct Config {
    pub service: ServiceConfig,
    pub output: OutputConfig,
    /// Allowed deviation of the spectrum frequencies from a sum of 1
    pub tolerance: f64,
    /// RefSeq chromosome numeral -> chromosome label
    pub chromosomes: HashMap<String, String>,
}

impl Default for Config {
    fn default() -> Config {
        let chromosomes = [("23", "X"), ("24", "Y")].iter()
            .map(|&(k, v)| (k.to_owned(), v.to_owned()))
            .collect();
        Config {
            service: ServiceConfig::default(),
            output: OutputConfig::default(),
            tolerance: DEFAULT_TOLERANCE,
            chromosomes,
        }
    }
}

impl Config {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Config> {
        let path = path.as_ref();
        let text = fs::read_to_string(path)?;
        let config: Config = toml::from_str(&text)
            .map_err(|e| Error::Config { path: path.to_owned(), msg: e.to_string() })?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.service.batch_size == 0 {
            return Err(Error::InvalidConfig(String::from("service.batch_size must be positive")));
        }
        if self.service.max_attempts == 0 {
            return Err(Error::InvalidConfig(String::from("service.max_attempts must be positive")));
        }
        if self.service.timeout_secs == 0 {
            return Err(Error::InvalidConfig(String::from("service.timeout_secs must be positive")));
        }
        if !(self.tolerance > 0.0) {
            return Err(Error::InvalidConfig(format!("tolerance {} must be positive", self.tolerance)));
        }
        Ok(())
    }
}
