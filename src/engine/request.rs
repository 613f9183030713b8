//! Verification request parameters.

use crate::WaatError;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

fn default_minimum_number_of_packets() -> u32 {
    1
}

/// Parameters for one `verify_web_analytics_data` call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerifyRequest {
    /// Path to the test data file holding the expected tags
    pub test_data_file_name: PathBuf,
    /// Name of the UI action, as keyed in the test data file
    pub action_name: String,
    /// URL snippets used to filter captured packets
    #[serde(default)]
    pub url_patterns: Vec<String>,
    /// Minimum number of filtered packets to wait for
    #[serde(default = "default_minimum_number_of_packets")]
    pub minimum_number_of_packets: u32,
}

impl VerifyRequest {
    pub fn new(test_data_file_name: impl Into<PathBuf>, action_name: impl Into<String>) -> Self {
        VerifyRequest {
            test_data_file_name: test_data_file_name.into(),
            action_name: action_name.into(),
            url_patterns: Vec::new(),
            minimum_number_of_packets: default_minimum_number_of_packets(),
        }
    }

    pub fn with_url_pattern(mut self, pattern: impl Into<String>) -> Self {
        self.url_patterns.push(pattern.into());
        self
    }

    pub fn with_url_patterns<I, S>(mut self, patterns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.url_patterns.extend(patterns.into_iter().map(Into::into));
        self
    }

    pub fn with_minimum_number_of_packets(mut self, minimum: u32) -> Self {
        self.minimum_number_of_packets = minimum;
        self
    }

    /// Reject a request with no action name. Everything else is the
    /// engine's to judge.
    pub fn validate(&self) -> Result<(), WaatError> {
        if self.action_name.is_empty() {
            return Err(WaatError::InvalidRequest {
                reason: "action_name must not be empty".to_string(),
            });
        }
        Ok(())
    }
}
