//! Foreign call surface.
//!
//! The verification engine lives in another runtime. Everything in this crate
//! talks to it through [`EngineBridge`], which names exactly the foreign
//! operations the facade consumes:
//! - `getInstance` on the engine controller
//! - `enableWebAnalyticsTesting` / `disableWebAnalyticsTesting`
//! - `verifyWebAnalyticsData`
//!
//! [`RuntimeBridge`] implements it on top of a reflective [`ForeignRuntime`].
//! Tests substitute their own bridge.

pub mod runtime;

pub use runtime::{ForeignRef, ForeignRuntime, RuntimeBridge};

use crate::capability::{CapabilityToken, InputFileType, WebAnalyticTool};
use crate::engine::request::VerifyRequest;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use thiserror::Error;

/// Failure reported by the foreign side. The message is kept verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct BridgeError {
    pub message: String,
}

impl BridgeError {
    pub fn new(message: impl Into<String>) -> Self {
        BridgeError {
            message: message.into(),
        }
    }
}

/// The two foreign enumerations the capability resolver reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ForeignEnumeration {
    /// Capture mechanisms (`WebAnalyticTool`)
    WebAnalyticTool,
    /// Test data formats (`InputFileType`)
    InputFileType,
}

impl ForeignEnumeration {
    /// Fully qualified class name on the engine side
    pub fn class_name(&self) -> &'static str {
        match self {
            ForeignEnumeration::WebAnalyticTool => {
                "com.thoughtworks.webanalyticsautomation.plugins.WebAnalyticTool"
            }
            ForeignEnumeration::InputFileType => {
                "com.thoughtworks.webanalyticsautomation.inputdata.InputFileType"
            }
        }
    }
}

impl fmt::Display for ForeignEnumeration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ForeignEnumeration::WebAnalyticTool => write!(f, "WebAnalyticTool"),
            ForeignEnumeration::InputFileType => write!(f, "InputFileType"),
        }
    }
}

/// Opaque handle to a bound engine instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EngineHandle(pub u64);

/// A value crossing the runtime boundary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ForeignValue {
    Null,
    Bool(bool),
    Int(i64),
    Str(String),
    List(Vec<ForeignValue>),
    Object(ForeignRef),
}

impl ForeignValue {
    pub fn as_object(&self) -> Option<&ForeignRef> {
        match self {
            ForeignValue::Object(r) => Some(r),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            ForeignValue::Str(s) => Some(s),
            _ => None,
        }
    }
}

impl From<&str> for ForeignValue {
    fn from(s: &str) -> Self {
        ForeignValue::Str(s.to_string())
    }
}

impl From<String> for ForeignValue {
    fn from(s: String) -> Self {
        ForeignValue::Str(s)
    }
}

impl From<bool> for ForeignValue {
    fn from(b: bool) -> Self {
        ForeignValue::Bool(b)
    }
}

impl From<i64> for ForeignValue {
    fn from(i: i64) -> Self {
        ForeignValue::Int(i)
    }
}

impl From<ForeignRef> for ForeignValue {
    fn from(r: ForeignRef) -> Self {
        ForeignValue::Object(r)
    }
}

/// Textual description, as `toString` would render it on the foreign side.
impl fmt::Display for ForeignValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ForeignValue::Null => write!(f, "null"),
            ForeignValue::Bool(b) => write!(f, "{}", b),
            ForeignValue::Int(i) => write!(f, "{}", i),
            ForeignValue::Str(s) => write!(f, "{}", s),
            ForeignValue::List(items) => {
                write!(f, "[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", item)?;
                }
                write!(f, "]")
            }
            ForeignValue::Object(r) => write!(f, "<foreign object #{}>", r.id),
        }
    }
}

/// Raw result of one `verifyWebAnalyticsData` call, before adaptation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ForeignResult {
    /// Enumeration name of the verification status
    pub verification_status: String,
    /// Errors in the order the engine reported them
    #[serde(default)]
    pub list_of_errors: Vec<ForeignValue>,
}

/// Lists the canonical member names of a foreign enumeration.
pub trait EnumerationSource {
    /// Member names in declaration order
    fn declared_members(
        &mut self,
        enumeration: ForeignEnumeration,
    ) -> Result<Vec<String>, BridgeError>;
}

/// The foreign operations consumed by the engine session.
pub trait EngineBridge: EnumerationSource + Send {
    /// Construct (or fetch) the engine bound to the given capabilities.
    fn get_instance(
        &mut self,
        tool: &CapabilityToken<WebAnalyticTool>,
        format: &CapabilityToken<InputFileType>,
        keep_loaded_file_in_memory: bool,
        aux_config_path: &Path,
    ) -> Result<EngineHandle, BridgeError>;

    /// Start packet capture on all network interfaces.
    fn enable_web_analytics_testing(&mut self, engine: &EngineHandle) -> Result<(), BridgeError>;

    /// Stop packet capture on all network interfaces.
    fn disable_web_analytics_testing(&mut self, engine: &EngineHandle) -> Result<(), BridgeError>;

    fn verify_web_analytics_data(
        &mut self,
        engine: &EngineHandle,
        request: &VerifyRequest,
    ) -> Result<ForeignResult, BridgeError>;
}

impl<T: EnumerationSource + ?Sized> EnumerationSource for Box<T> {
    fn declared_members(
        &mut self,
        enumeration: ForeignEnumeration,
    ) -> Result<Vec<String>, BridgeError> {
        (**self).declared_members(enumeration)
    }
}

impl<T: EngineBridge + ?Sized> EngineBridge for Box<T> {
    fn get_instance(
        &mut self,
        tool: &CapabilityToken<WebAnalyticTool>,
        format: &CapabilityToken<InputFileType>,
        keep_loaded_file_in_memory: bool,
        aux_config_path: &Path,
    ) -> Result<EngineHandle, BridgeError> {
        (**self).get_instance(tool, format, keep_loaded_file_in_memory, aux_config_path)
    }

    fn enable_web_analytics_testing(&mut self, engine: &EngineHandle) -> Result<(), BridgeError> {
        (**self).enable_web_analytics_testing(engine)
    }

    fn disable_web_analytics_testing(&mut self, engine: &EngineHandle) -> Result<(), BridgeError> {
        (**self).disable_web_analytics_testing(engine)
    }

    fn verify_web_analytics_data(
        &mut self,
        engine: &EngineHandle,
        request: &VerifyRequest,
    ) -> Result<ForeignResult, BridgeError> {
        (**self).verify_web_analytics_data(engine, request)
    }
}
