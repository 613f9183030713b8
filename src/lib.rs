//! waat library
//!
//! Web analytics automation testing facade.
//!
//! Test code drives a separately maintained verification engine through this
//! crate without knowing how that engine is invoked:
//! - Capability resolution of the engine's capture mechanisms and data formats
//! - A lazily bound, process-wide engine session
//! - Enabling and disabling packet capture
//! - Verifying captured analytics tags against expected test data
//!
//! The engine itself is reached through an [`EngineBridge`]. Hosts supply
//! one, typically a [`RuntimeBridge`] over their cross-runtime call mechanism.
//!
//! # Example
//!
//! ```no_run
//! use waat::{EngineBridge, VerifyRequest, WaatConfig};
//!
//! fn run(connect: impl FnOnce() -> Box<dyn EngineBridge>) -> waat::Result<()> {
//!     waat::initialize_waat(&WaatConfig::default(), connect)?;
//!     waat::enable_web_analytics_testing()?;
//!
//!     // ... drive the browser ...
//!
//!     let request = VerifyRequest::new("TestData.xml", "OpenWAATArticleOnBlog_HttpSniffer")
//!         .with_url_pattern("GET /ps/ifr?container=friendconnect&mid=0");
//!     let result = waat::verify_web_analytics_data(&request)?;
//!     println!("{}", result);
//!
//!     waat::disable_web_analytics_testing()
//! }
//! ```

pub mod bridge;
pub mod capability;
pub mod engine;
pub mod logging;
pub mod version;

use serde::Deserialize;
use std::path::{Path, PathBuf};
use thiserror::Error;

// Re-exports for public API
pub use bridge::{
    BridgeError, EngineBridge, EngineHandle, EnumerationSource, ForeignEnumeration,
    ForeignResult, ForeignValue, RuntimeBridge,
};
pub use capability::{CapabilityToken, InputFileType, WebAnalyticTool};
pub use engine::request::VerifyRequest;
pub use engine::result::{VerificationResult, VerificationStatus};
pub use engine::session::{CaptureState, EngineSession, SessionCell};

/// Error types for waat operations.
#[derive(Debug, Error)]
pub enum WaatError {
    /// Requested capability is not declared by the engine
    #[error("{enumeration} has no member named '{name}'")]
    CapabilityNotFound { enumeration: String, name: String },

    /// Operation called before the session was initialized
    #[error("{operation} called before initialize_waat")]
    UninitializedSession { operation: &'static str },

    /// The engine reported a failure
    #[error("{operation} failed: {source}")]
    Delegation {
        operation: &'static str,
        #[source]
        source: BridgeError,
    },

    /// Verification status outside PASS/FAIL/SKIP
    #[error("unexpected verification status '{value}'")]
    UnexpectedStatus { value: String },

    /// Request rejected before reaching the engine
    #[error("invalid verification request: {reason}")]
    InvalidRequest { reason: String },

    /// Configuration could not be loaded
    #[error("configuration error in {path}: {message}")]
    Config { path: String, message: String },
}

pub type Result<T> = std::result::Result<T, WaatError>;

fn default_keep_loaded_file_in_memory() -> bool {
    true
}

fn default_log_properties_path() -> PathBuf {
    PathBuf::from("WAAT/resources/log4j.properties")
}

/// Configuration for binding the engine session.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct WaatConfig {
    /// Keep the loaded test data file in memory while tests run
    #[serde(default = "default_keep_loaded_file_in_memory")]
    pub keep_loaded_file_in_memory: bool,
    /// Engine-side logging configuration file
    #[serde(default = "default_log_properties_path")]
    pub log_properties_path: PathBuf,
}

impl Default for WaatConfig {
    fn default() -> Self {
        WaatConfig {
            keep_loaded_file_in_memory: default_keep_loaded_file_in_memory(),
            log_properties_path: default_log_properties_path(),
        }
    }
}

impl WaatConfig {
    /// Configuration with the given retention flag and default paths
    pub fn new(keep_loaded_file_in_memory: bool) -> Self {
        WaatConfig {
            keep_loaded_file_in_memory,
            ..Default::default()
        }
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| WaatError::Config {
            path: "<inline>".to_string(),
            message: e.to_string(),
        })
    }

    /// Load configuration from a TOML file. Missing keys take defaults.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| WaatError::Config {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;
        toml::from_str(&content).map_err(|e| WaatError::Config {
            path: path.display().to_string(),
            message: e.to_string(),
        })
    }
}

/// Initialize the process-wide engine session.
///
/// Only the first successful call binds the engine; `connect` is not invoked
/// afterwards and a different `config` is ignored.
pub fn initialize_waat<B, F>(config: &WaatConfig, connect: F) -> Result<()>
where
    B: EngineBridge + 'static,
    F: FnOnce() -> B,
{
    SessionCell::global().initialize(config, connect)
}

/// Start packet capture for all subsequent verifications.
pub fn enable_web_analytics_testing() -> Result<()> {
    SessionCell::global().enable_web_analytics_testing()
}

/// Stop packet capture.
pub fn disable_web_analytics_testing() -> Result<()> {
    SessionCell::global().disable_web_analytics_testing()
}

/// Verify captured analytics tags against `request`.
pub fn verify_web_analytics_data(request: &VerifyRequest) -> Result<VerificationResult> {
    SessionCell::global().verify_web_analytics_data(request)
}
