//! Engine session lifecycle.
//!
//! A [`SessionCell`] holds at most one [`EngineSession`]. The first successful
//! [`SessionCell::initialize`] binds the engine and fixes its configuration;
//! later calls return immediately without touching the bridge, even when they
//! pass a different `keep_loaded_file_in_memory` value.
//!
//! State machine:
//! - `Uninitialized -> Initialized` on the first successful initialize (one way)
//! - inside `Initialized`: `CaptureDisabled <-> CaptureEnabled`
//!
//! A failed initialization leaves the cell uninitialized. All operations are
//! serialized behind the cell's mutex; a poisoned lock is recovered.

use crate::bridge::{EngineBridge, EngineHandle};
use crate::capability::{CapabilityTable, CapabilityToken, InputFileType, WebAnalyticTool};
use crate::engine::request::VerifyRequest;
use crate::engine::result::VerificationResult;
use crate::version::get_build_info;
use crate::{WaatConfig, WaatError};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};
use tracing::{info, warn};

/// Capture mechanism the facade binds to
pub const CAPTURE_MECHANISM: &str = "http_sniffer";

/// Test data format the facade binds to
pub const INPUT_FORMAT: &str = "xml";

/// Packet capture sub-state of an initialized session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CaptureState {
    #[default]
    Disabled,
    Enabled,
}

/// A bound verification engine.
pub struct EngineSession {
    bridge: Box<dyn EngineBridge>,
    engine: EngineHandle,
    tool: CapabilityToken<WebAnalyticTool>,
    format: CapabilityToken<InputFileType>,
    keep_loaded_file_in_memory: bool,
    aux_config_path: PathBuf,
    capture: CaptureState,
}

impl EngineSession {
    /// Resolve the fixed capabilities and bind a new engine instance.
    ///
    /// Both capabilities are resolved before `getInstance` is attempted, so
    /// an unknown capability never reaches engine construction.
    pub fn open(mut bridge: Box<dyn EngineBridge>, config: &WaatConfig) -> Result<Self, WaatError> {
        let tool = CapabilityTable::<WebAnalyticTool>::load(bridge.as_mut())?
            .resolve(CAPTURE_MECHANISM)?;
        let format = CapabilityTable::<InputFileType>::load(bridge.as_mut())?
            .resolve(INPUT_FORMAT)?;

        let engine = bridge
            .get_instance(
                &tool,
                &format,
                config.keep_loaded_file_in_memory,
                &config.log_properties_path,
            )
            .map_err(|source| WaatError::Delegation {
                operation: "getInstance",
                source,
            })?;

        info!(
            %tool,
            %format,
            keep_loaded_file_in_memory = config.keep_loaded_file_in_memory,
            "engine bound"
        );

        Ok(EngineSession {
            bridge,
            engine,
            tool,
            format,
            keep_loaded_file_in_memory: config.keep_loaded_file_in_memory,
            aux_config_path: config.log_properties_path.clone(),
            capture: CaptureState::Disabled,
        })
    }

    pub fn tool(&self) -> &CapabilityToken<WebAnalyticTool> {
        &self.tool
    }

    pub fn format(&self) -> &CapabilityToken<InputFileType> {
        &self.format
    }

    pub fn keep_loaded_file_in_memory(&self) -> bool {
        self.keep_loaded_file_in_memory
    }

    pub fn aux_config_path(&self) -> &Path {
        &self.aux_config_path
    }

    pub fn capture_state(&self) -> CaptureState {
        self.capture
    }

    /// Start packet capture on all interfaces.
    pub fn enable(&mut self) -> Result<(), WaatError> {
        info!("Enable Web Analytics Testing");
        self.bridge
            .enable_web_analytics_testing(&self.engine)
            .map_err(|source| WaatError::Delegation {
                operation: "enableWebAnalyticsTesting",
                source,
            })?;
        self.capture = CaptureState::Enabled;
        Ok(())
    }

    /// Stop packet capture on all interfaces. Safe when capture was never enabled.
    pub fn disable(&mut self) -> Result<(), WaatError> {
        info!("Disable Web Analytics Testing");
        self.bridge
            .disable_web_analytics_testing(&self.engine)
            .map_err(|source| WaatError::Delegation {
                operation: "disableWebAnalyticsTesting",
                source,
            })?;
        self.capture = CaptureState::Disabled;
        Ok(())
    }

    /// Verify captured analytics traffic against the expectations for
    /// `request.action_name`.
    pub fn verify(&mut self, request: &VerifyRequest) -> Result<VerificationResult, WaatError> {
        request.validate()?;

        info!(
            test_data_file_name = %request.test_data_file_name.display(),
            action_name = %request.action_name,
            url_patterns = request.url_patterns.len(),
            minimum_number_of_packets = request.minimum_number_of_packets,
            "Verify Web Analytics Data"
        );
        if self.capture == CaptureState::Disabled {
            warn!("verifying while packet capture is disabled");
        }

        let foreign = self
            .bridge
            .verify_web_analytics_data(&self.engine, request)
            .map_err(|source| WaatError::Delegation {
                operation: "verifyWebAnalyticsData",
                source,
            })?;

        VerificationResult::try_from(foreign)
    }
}

/// Init-once holder for an [`EngineSession`].
pub struct SessionCell {
    state: Mutex<Option<EngineSession>>,
}

static GLOBAL_SESSION: SessionCell = SessionCell::new();

impl SessionCell {
    pub const fn new() -> Self {
        SessionCell {
            state: Mutex::new(None),
        }
    }

    /// The process-wide session cell
    pub fn global() -> &'static SessionCell {
        &GLOBAL_SESSION
    }

    fn lock(&self) -> MutexGuard<'_, Option<EngineSession>> {
        match self.state.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    /// Bind the engine if no session exists yet.
    ///
    /// `connect` is only invoked when the cell is uninitialized. Once a
    /// session exists this is a no-op and `config` is ignored.
    pub fn initialize<B, F>(&self, config: &WaatConfig, connect: F) -> Result<(), WaatError>
    where
        B: EngineBridge + 'static,
        F: FnOnce() -> B,
    {
        let mut state = self.lock();
        if let Some(existing) = state.as_ref() {
            if existing.keep_loaded_file_in_memory != config.keep_loaded_file_in_memory {
                warn!(
                    bound = existing.keep_loaded_file_in_memory,
                    requested = config.keep_loaded_file_in_memory,
                    "session already initialized, ignoring keep_loaded_file_in_memory"
                );
            }
            return Ok(());
        }

        info!(build = %get_build_info(), "Initializing WAAT");
        let session = EngineSession::open(Box::new(connect()), config)?;
        *state = Some(session);
        Ok(())
    }

    pub fn is_initialized(&self) -> bool {
        self.lock().is_some()
    }

    /// Capture state of the bound session, if any
    pub fn capture_state(&self) -> Option<CaptureState> {
        self.lock().as_ref().map(EngineSession::capture_state)
    }

    /// Retention flag the session was bound with, if any
    pub fn keep_loaded_file_in_memory(&self) -> Option<bool> {
        self.lock().as_ref().map(EngineSession::keep_loaded_file_in_memory)
    }

    fn with_session<T>(
        &self,
        operation: &'static str,
        f: impl FnOnce(&mut EngineSession) -> Result<T, WaatError>,
    ) -> Result<T, WaatError> {
        let mut state = self.lock();
        match state.as_mut() {
            Some(session) => f(session),
            None => Err(WaatError::UninitializedSession { operation }),
        }
    }

    pub fn enable_web_analytics_testing(&self) -> Result<(), WaatError> {
        self.with_session("enable_web_analytics_testing", EngineSession::enable)
    }

    pub fn disable_web_analytics_testing(&self) -> Result<(), WaatError> {
        self.with_session("disable_web_analytics_testing", EngineSession::disable)
    }

    pub fn verify_web_analytics_data(
        &self,
        request: &VerifyRequest,
    ) -> Result<VerificationResult, WaatError> {
        self.with_session("verify_web_analytics_data", |session| session.verify(request))
    }
}

impl Default for SessionCell {
    fn default() -> Self {
        Self::new()
    }
}
