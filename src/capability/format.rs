//! Test data formats understood by the engine.

use super::Capability;
use crate::bridge::ForeignEnumeration;
use std::fmt;
use std::str::FromStr;

/// Format of the expected-tags test data file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InputFileType {
    Xml,
}

impl Capability for InputFileType {
    const ENUMERATION: ForeignEnumeration = ForeignEnumeration::InputFileType;

    fn from_canonical(name: &str) -> Option<Self> {
        match name {
            "XML" => Some(InputFileType::Xml),
            _ => None,
        }
    }

    fn canonical_name(&self) -> &'static str {
        match self {
            InputFileType::Xml => "XML",
        }
    }
}

impl FromStr for InputFileType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_canonical(&s.to_uppercase())
            .ok_or_else(|| format!("Unknown input file type: '{}'. Valid types: xml", s))
    }
}

impl fmt::Display for InputFileType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.canonical_name())
    }
}
