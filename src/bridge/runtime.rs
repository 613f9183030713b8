//! Reflective bridge over a foreign runtime.
//!
//! [`ForeignRuntime`] is the only thing a host has to provide: import a class
//! by name and invoke a named operation on a foreign object. [`RuntimeBridge`]
//! turns that into the typed [`EngineBridge`] surface.
//!
//! Class references are imported on first use and cached for the lifetime of
//! the bridge. Enumeration elements are addressed by the ordinal carried in a
//! [`CapabilityToken`], so the foreign `values` array is the single source of
//! truth for which element gets passed back.

use super::{
    BridgeError, EngineBridge, EngineHandle, EnumerationSource, ForeignEnumeration,
    ForeignResult, ForeignValue,
};
use crate::capability::{Capability, CapabilityToken, InputFileType, WebAnalyticTool};
use crate::engine::request::VerifyRequest;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use tracing::debug;

/// Engine controller class exposing `getInstance`
pub const CONTROLLER_CLASS: &str = "com.thoughtworks.webanalyticsautomation.Controller";

/// Reference to an object living in the foreign runtime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ForeignRef {
    #[serde(rename = "ref")]
    pub id: u64,
}

impl ForeignRef {
    pub fn new(id: u64) -> Self {
        ForeignRef { id }
    }
}

/// Cross-runtime call mechanism.
pub trait ForeignRuntime: Send {
    /// Resolve a class by its fully qualified name.
    fn import(&mut self, class_name: &str) -> Result<ForeignRef, BridgeError>;

    /// Call `operation` on `target` and return whatever came back.
    fn invoke(
        &mut self,
        target: &ForeignRef,
        operation: &str,
        args: Vec<ForeignValue>,
    ) -> Result<ForeignValue, BridgeError>;
}

/// [`EngineBridge`] implementation that performs the foreign calls.
pub struct RuntimeBridge<R: ForeignRuntime> {
    runtime: R,
    classes: HashMap<&'static str, ForeignRef>,
}

impl<R: ForeignRuntime> RuntimeBridge<R> {
    pub fn new(runtime: R) -> Self {
        RuntimeBridge {
            runtime,
            classes: HashMap::new(),
        }
    }

    /// Access the underlying runtime
    pub fn runtime(&self) -> &R {
        &self.runtime
    }

    fn class(&mut self, class_name: &'static str) -> Result<ForeignRef, BridgeError> {
        if let Some(class) = self.classes.get(class_name) {
            return Ok(*class);
        }
        debug!(class = class_name, "importing foreign class");
        let class = self.runtime.import(class_name)?;
        self.classes.insert(class_name, class);
        Ok(class)
    }

    fn call(
        &mut self,
        target: &ForeignRef,
        operation: &str,
        args: Vec<ForeignValue>,
    ) -> Result<ForeignValue, BridgeError> {
        self.runtime.invoke(target, operation, args)
    }

    fn call_object(
        &mut self,
        target: &ForeignRef,
        operation: &str,
        args: Vec<ForeignValue>,
    ) -> Result<ForeignRef, BridgeError> {
        match self.call(target, operation, args)? {
            ForeignValue::Object(r) => Ok(r),
            other => Err(unexpected_shape(operation, "an object", &other)),
        }
    }

    fn call_string(&mut self, target: &ForeignRef, operation: &str) -> Result<String, BridgeError> {
        match self.call(target, operation, Vec::new())? {
            ForeignValue::Str(s) => Ok(s),
            other => Err(unexpected_shape(operation, "a string", &other)),
        }
    }

    fn call_list(
        &mut self,
        target: &ForeignRef,
        operation: &str,
    ) -> Result<Vec<ForeignValue>, BridgeError> {
        match self.call(target, operation, Vec::new())? {
            ForeignValue::List(items) => Ok(items),
            other => Err(unexpected_shape(operation, "a list", &other)),
        }
    }

    fn enum_values(
        &mut self,
        enumeration: ForeignEnumeration,
    ) -> Result<Vec<ForeignRef>, BridgeError> {
        let class = self.class(enumeration.class_name())?;
        self.call_list(&class, "values")?
            .into_iter()
            .map(|value| match value {
                ForeignValue::Object(r) => Ok(r),
                other => Err(unexpected_shape("values", "enumeration elements", &other)),
            })
            .collect()
    }

    fn enum_element<C: Capability>(
        &mut self,
        token: &CapabilityToken<C>,
    ) -> Result<ForeignRef, BridgeError> {
        let values = self.enum_values(C::ENUMERATION)?;
        values.get(token.ordinal()).copied().ok_or_else(|| {
            BridgeError::new(format!(
                "{} has no element at ordinal {} (expected {})",
                C::ENUMERATION,
                token.ordinal(),
                token.name()
            ))
        })
    }

    fn engine_ref(engine: &EngineHandle) -> ForeignRef {
        ForeignRef::new(engine.0)
    }

    /// Textual description of one error element.
    fn describe(&mut self, value: ForeignValue) -> Result<ForeignValue, BridgeError> {
        match value {
            ForeignValue::Object(r) => Ok(ForeignValue::Str(self.call_string(&r, "toString")?)),
            primitive => Ok(primitive),
        }
    }
}

impl<R: ForeignRuntime> EnumerationSource for RuntimeBridge<R> {
    fn declared_members(
        &mut self,
        enumeration: ForeignEnumeration,
    ) -> Result<Vec<String>, BridgeError> {
        let values = self.enum_values(enumeration)?;
        values
            .iter()
            .map(|element| self.call_string(element, "name"))
            .collect()
    }
}

impl<R: ForeignRuntime> EngineBridge for RuntimeBridge<R> {
    fn get_instance(
        &mut self,
        tool: &CapabilityToken<WebAnalyticTool>,
        format: &CapabilityToken<InputFileType>,
        keep_loaded_file_in_memory: bool,
        aux_config_path: &Path,
    ) -> Result<EngineHandle, BridgeError> {
        let tool_ref = self.enum_element(tool)?;
        let format_ref = self.enum_element(format)?;
        let controller = self.class(CONTROLLER_CLASS)?;

        let args = vec![
            ForeignValue::Object(tool_ref),
            ForeignValue::Object(format_ref),
            ForeignValue::Bool(keep_loaded_file_in_memory),
            ForeignValue::Str(aux_config_path.to_string_lossy().into_owned()),
        ];
        let engine = self.call_object(&controller, "getInstance", args)?;
        Ok(EngineHandle(engine.id))
    }

    fn enable_web_analytics_testing(&mut self, engine: &EngineHandle) -> Result<(), BridgeError> {
        self.call(&Self::engine_ref(engine), "enableWebAnalyticsTesting", Vec::new())?;
        Ok(())
    }

    fn disable_web_analytics_testing(&mut self, engine: &EngineHandle) -> Result<(), BridgeError> {
        self.call(&Self::engine_ref(engine), "disableWebAnalyticsTesting", Vec::new())?;
        Ok(())
    }

    fn verify_web_analytics_data(
        &mut self,
        engine: &EngineHandle,
        request: &VerifyRequest,
    ) -> Result<ForeignResult, BridgeError> {
        let patterns = request
            .url_patterns
            .iter()
            .map(|p| ForeignValue::Str(p.clone()))
            .collect();
        let args = vec![
            ForeignValue::Str(request.test_data_file_name.to_string_lossy().into_owned()),
            ForeignValue::Str(request.action_name.clone()),
            ForeignValue::List(patterns),
            ForeignValue::Int(i64::from(request.minimum_number_of_packets)),
        ];
        let result = self.call_object(&Self::engine_ref(engine), "verifyWebAnalyticsData", args)?;

        let status = self.call_object(&result, "getVerificationStatus", Vec::new())?;
        let verification_status = self.call_string(&status, "name")?;

        let errors = self.call_object(&result, "getListOfErrors", Vec::new())?;
        let list_of_errors = self
            .call_list(&errors, "toArray")?
            .into_iter()
            .map(|e| self.describe(e))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(ForeignResult {
            verification_status,
            list_of_errors,
        })
    }
}

fn unexpected_shape(operation: &str, expected: &str, got: &ForeignValue) -> BridgeError {
    BridgeError::new(format!(
        "{} returned {} but {} was expected",
        operation, got, expected
    ))
}
