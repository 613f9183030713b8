//! Verification results.
//!
//! Adapts the engine's raw [`ForeignResult`] into an owned
//! [`VerificationResult`]. Status names outside PASS/FAIL/SKIP are reported
//! as [`WaatError::UnexpectedStatus`] rather than coerced.

use crate::bridge::ForeignResult;
use crate::WaatError;
use serde::Serialize;
use std::fmt;
use std::str::FromStr;

/// Outcome of one verification call
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum VerificationStatus {
    Pass,
    Fail,
    Skip,
}

impl VerificationStatus {
    pub fn name(&self) -> &'static str {
        match self {
            VerificationStatus::Pass => "PASS",
            VerificationStatus::Fail => "FAIL",
            VerificationStatus::Skip => "SKIP",
        }
    }
}

impl FromStr for VerificationStatus {
    type Err = WaatError;

    /// Parses the engine's enumeration name. Exact match only.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "PASS" => Ok(VerificationStatus::Pass),
            "FAIL" => Ok(VerificationStatus::Fail),
            "SKIP" => Ok(VerificationStatus::Skip),
            other => Err(WaatError::UnexpectedStatus {
                value: other.to_string(),
            }),
        }
    }
}

impl fmt::Display for VerificationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Immutable outcome of a verification: status plus the engine's errors in
/// reported order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VerificationResult {
    status: VerificationStatus,
    errors: Vec<String>,
}

impl VerificationResult {
    pub fn new(status: VerificationStatus, errors: Vec<String>) -> Self {
        VerificationResult { status, errors }
    }

    pub fn status(&self) -> VerificationStatus {
        self.status
    }

    /// Error descriptions, in the order the engine reported them
    pub fn errors(&self) -> &[String] {
        &self.errors
    }

    pub fn is_pass(&self) -> bool {
        self.status == VerificationStatus::Pass
    }

    pub fn into_errors(self) -> Vec<String> {
        self.errors
    }
}

impl TryFrom<ForeignResult> for VerificationResult {
    type Error = WaatError;

    fn try_from(foreign: ForeignResult) -> Result<Self, Self::Error> {
        let status = foreign.verification_status.parse()?;
        let errors = foreign
            .list_of_errors
            .iter()
            .map(|e| e.to_string())
            .collect();
        Ok(VerificationResult { status, errors })
    }
}

impl fmt::Display for VerificationResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.status)?;
        if !self.errors.is_empty() {
            write!(f, " ({} errors)", self.errors.len())?;
            for error in &self.errors {
                write!(f, "\n  - {}", error)?;
            }
        }
        Ok(())
    }
}

/// Convert a raw engine result into a [`VerificationResult`].
pub fn adapt(foreign: ForeignResult) -> Result<VerificationResult, WaatError> {
    VerificationResult::try_from(foreign)
}
