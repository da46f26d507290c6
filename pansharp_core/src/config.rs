//! Metric configuration via TOML files.
//!
//! Every key is optional; missing sections fall back to [`MetricConfig::default`].
//!
//! ```toml
//! [d_lambda]
//! p = 1
//! log_path = "logs/d_lambda.jsonl"
//!
//! [d_lambda.window]
//! kernel_size = [11, 11]
//! sigma = [1.5, 1.5]
//! ```

use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::error::MetricError;
use crate::image::d_lambda::validate_p;
use crate::image::uqi::WindowConfig;

/// Settings for the spectral distortion metric.
///
/// # Examples
///
/// ```
/// use pansharp_metrics_core::MetricConfig;
///
/// let config: MetricConfig = "[d_lambda]\np = 3".parse().unwrap();
/// assert_eq!(config.p, 3);
/// assert_eq!(config.window.kernel_size, (11, 11));
/// ```
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetricConfig {
    /// Exponent applied to the band-similarity differences.
    pub p: i64,
    /// Gaussian window of the quality index.
    pub window: WindowConfig,
    /// Optional JSON-lines file receiving one record per evaluation.
    pub log_path: Option<PathBuf>,
}

impl MetricConfig {
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path)?;
        contents.parse()
    }

    pub fn with_p(mut self, p: i64) -> Self {
        self.p = p;
        self
    }

    pub fn with_window(mut self, window: WindowConfig) -> Self {
        self.window = window;
        self
    }

    pub fn with_log_path<P: Into<PathBuf>>(mut self, path: P) -> Self {
        self.log_path = Some(path.into());
        self
    }

    /// Checks `p` and the window settings.
    pub fn validate(&self) -> Result<(), MetricError> {
        validate_p(self.p)?;
        self.window.validate()
    }
}

impl Default for MetricConfig {
    fn default() -> Self {
        Self {
            p: 1,
            window: WindowConfig::default(),
            log_path: None,
        }
    }
}

impl FromStr for MetricConfig {
    type Err = ConfigError;

    fn from_str(toml_str: &str) -> Result<Self, Self::Err> {
        let raw: RawConfig =
            toml::from_str(toml_str).map_err(|err| ConfigError::Parse(err.to_string()))?;
        let section = raw.d_lambda;
        let config = Self {
            p: section.p,
            window: WindowConfig {
                kernel_size: (section.window.kernel_size[0], section.window.kernel_size[1]),
                sigma: (section.window.sigma[0], section.window.sigma[1]),
            },
            log_path: section.log_path,
        };
        config.validate()?;
        Ok(config)
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Parse error: {0}")]
    Parse(String),
    #[error("Invalid configuration: {0}")]
    Invalid(#[from] MetricError),
}

#[derive(Debug, Default, Deserialize)]
struct RawConfig {
    #[serde(default)]
    d_lambda: RawDLambda,
}

#[derive(Debug, Deserialize)]
struct RawDLambda {
    #[serde(default = "default_p")]
    p: i64,
    #[serde(default)]
    window: RawWindow,
    #[serde(default)]
    log_path: Option<PathBuf>,
}

impl Default for RawDLambda {
    fn default() -> Self {
        Self {
            p: default_p(),
            window: RawWindow::default(),
            log_path: None,
        }
    }
}

#[derive(Debug, Deserialize)]
struct RawWindow {
    #[serde(default = "default_kernel_size")]
    kernel_size: [usize; 2],
    #[serde(default = "default_sigma")]
    sigma: [f64; 2],
}

impl Default for RawWindow {
    fn default() -> Self {
        Self {
            kernel_size: default_kernel_size(),
            sigma: default_sigma(),
        }
    }
}

fn default_p() -> i64 {
    1
}

fn default_kernel_size() -> [usize; 2] {
    [11, 11]
}

fn default_sigma() -> [f64; 2] {
    [1.5, 1.5]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_document_yields_defaults() {
        let config: MetricConfig = "".parse().unwrap();
        assert_eq!(config, MetricConfig::default());
    }

    #[test]
    fn window_section_overrides_defaults() {
        let toml = "[d_lambda]\np = 2\nlog_path = \"out/eval.jsonl\"\n\n\
                    [d_lambda.window]\nkernel_size = [7, 9]\n";
        let config: MetricConfig = toml.parse().unwrap();
        assert_eq!(config.p, 2);
        assert_eq!(config.window.kernel_size, (7, 9));
        assert_eq!(config.window.sigma, (1.5, 1.5));
        assert_eq!(config.log_path, Some(PathBuf::from("out/eval.jsonl")));
    }

    #[test]
    fn non_positive_p_is_rejected() {
        let err = "[d_lambda]\np = 0".parse::<MetricConfig>().unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(ref e) if e.is_value_error()));
    }

    #[test]
    fn even_kernel_is_rejected() {
        let err = "[d_lambda.window]\nkernel_size = [10, 11]"
            .parse::<MetricConfig>()
            .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn malformed_toml_is_a_parse_error() {
        let err = "[d_lambda\np = 1".parse::<MetricConfig>().unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let err = MetricConfig::load_from_file("does/not/exist.toml").unwrap_err();
        assert!(matches!(err, ConfigError::Io(_)));
    }
}
