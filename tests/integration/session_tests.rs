//! Engine session tests.
//!
//! Covers initialization, capture toggling, verification delegation, and
//! error propagation against the mock bridge. Each test uses its own
//! `SessionCell` so tests stay independent of the process-wide session.

use crate::mocks::{BridgeCall, CallLog, MockBridge};
use std::panic::{self, AssertUnwindSafe};
use std::path::PathBuf;
use waat::{
    CaptureState, ForeignEnumeration, SessionCell, VerificationResult, VerificationStatus,
    VerifyRequest, WaatConfig, WaatError,
};

const FRIENDCONNECT: &str = "GET /ps/ifr?container=friendconnect&mid=0";

fn open_article_request() -> VerifyRequest {
    VerifyRequest::new("TestData.xml", "OpenArticle_HttpSniffer")
        .with_url_pattern(FRIENDCONNECT)
        .with_minimum_number_of_packets(1)
}

fn initialized(bridge: MockBridge) -> SessionCell {
    let cell = SessionCell::new();
    cell.initialize(&WaatConfig::default(), || bridge).unwrap();
    cell
}

// Initialization

#[test]
fn test_initialize_binds_http_sniffer_and_xml() {
    let log = CallLog::default();
    let cell = initialized(MockBridge::new(log.clone()));

    assert!(cell.is_initialized());
    assert_eq!(cell.capture_state(), Some(CaptureState::Disabled));
    assert_eq!(
        log.calls(),
        vec![
            BridgeCall::DeclaredMembers(ForeignEnumeration::WebAnalyticTool),
            BridgeCall::DeclaredMembers(ForeignEnumeration::InputFileType),
            BridgeCall::GetInstance {
                tool: "HTTP_SNIFFER".to_string(),
                tool_ordinal: 1,
                format: "XML".to_string(),
                keep_loaded_file_in_memory: true,
                aux_config_path: PathBuf::from("WAAT/resources/log4j.properties"),
            },
        ]
    );
}

#[test]
fn test_initialize_is_idempotent() {
    let log = CallLog::default();
    let cell = SessionCell::new();

    cell.initialize(&WaatConfig::default(), || MockBridge::new(log.clone()))
        .unwrap();
    cell.initialize(&WaatConfig::default(), || MockBridge::new(log.clone()))
        .unwrap();

    assert_eq!(log.get_instance_count(), 1);
}

#[test]
fn test_second_initialize_does_not_connect() {
    let cell = initialized(MockBridge::new(CallLog::default()));
    let mut connected = false;

    cell.initialize(&WaatConfig::default(), || {
        connected = true;
        MockBridge::new(CallLog::default())
    })
    .unwrap();

    assert!(!connected);
}

#[test]
fn test_reinitialize_ignores_changed_retention_flag() {
    let log = CallLog::default();
    let cell = SessionCell::new();

    cell.initialize(&WaatConfig::new(true), || MockBridge::new(log.clone()))
        .unwrap();
    cell.initialize(&WaatConfig::new(false), || MockBridge::new(log.clone()))
        .unwrap();

    assert_eq!(cell.keep_loaded_file_in_memory(), Some(true));
    assert_eq!(log.get_instance_count(), 1);
}

#[test]
fn test_initialize_passes_retention_flag() {
    let log = CallLog::default();
    let cell = SessionCell::new();
    cell.initialize(&WaatConfig::new(false), || MockBridge::new(log.clone()))
        .unwrap();

    let keep = log.calls().into_iter().find_map(|c| match c {
        BridgeCall::GetInstance {
            keep_loaded_file_in_memory,
            ..
        } => Some(keep_loaded_file_in_memory),
        _ => None,
    });
    assert_eq!(keep, Some(false));
}

#[test]
fn test_missing_tool_fails_before_engine_construction() {
    let log = CallLog::default();
    let cell = SessionCell::new();

    let err = cell
        .initialize(&WaatConfig::default(), || {
            MockBridge::new(log.clone()).with_tools(&["OMNITURE_DEBUGGER", "JS_SNIFFER"])
        })
        .unwrap_err();

    assert!(matches!(
        err,
        WaatError::CapabilityNotFound { ref enumeration, ref name }
            if enumeration == "WebAnalyticTool" && name == "http_sniffer"
    ));
    assert_eq!(log.get_instance_count(), 0);
    assert!(!cell.is_initialized());
}

#[test]
fn test_missing_format_fails_before_engine_construction() {
    let log = CallLog::default();
    let cell = SessionCell::new();

    let err = cell
        .initialize(&WaatConfig::default(), || {
            MockBridge::new(log.clone()).with_formats(&["JSON"])
        })
        .unwrap_err();

    assert!(matches!(err, WaatError::CapabilityNotFound { ref name, .. } if name == "xml"));
    assert_eq!(log.get_instance_count(), 0);
}

#[test]
fn test_failed_get_instance_leaves_cell_uninitialized() {
    let cell = SessionCell::new();

    let err = cell
        .initialize(&WaatConfig::default(), || {
            MockBridge::new(CallLog::default()).failing_get_instance("log4j.properties not found")
        })
        .unwrap_err();

    assert!(matches!(err, WaatError::Delegation { operation: "getInstance", .. }));
    assert!(!cell.is_initialized());

    // A later attempt may still bind
    let log = CallLog::default();
    cell.initialize(&WaatConfig::default(), || MockBridge::new(log.clone()))
        .unwrap();
    assert!(cell.is_initialized());
    assert_eq!(log.get_instance_count(), 1);
}

#[test]
fn test_panicking_connect_does_not_wedge_the_cell() {
    let cell = SessionCell::new();

    let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
        cell.initialize(&WaatConfig::default(), || -> MockBridge {
            panic!("engine runtime failed to start")
        })
    }));
    assert!(outcome.is_err());

    // The lock is poisoned now; every operation still answers
    assert!(!cell.is_initialized());
    assert!(matches!(
        cell.verify_web_analytics_data(&open_article_request()),
        Err(WaatError::UninitializedSession { .. })
    ));

    let bridge = MockBridge::new(CallLog::default())
        .with_packet("GET /ps/ifr?container=friendconnect&mid=0")
        .with_result("OpenArticle_HttpSniffer", "PASS", &[]);
    cell.initialize(&WaatConfig::default(), || bridge).unwrap();
    cell.enable_web_analytics_testing().unwrap();

    let result = cell.verify_web_analytics_data(&open_article_request()).unwrap();
    assert_eq!(result.status(), VerificationStatus::Pass);
    assert_eq!(cell.capture_state(), Some(CaptureState::Enabled));
}

// Uninitialized session

#[test]
fn test_verify_before_initialize_is_fatal() {
    let cell = SessionCell::new();
    let err = cell
        .verify_web_analytics_data(&open_article_request())
        .unwrap_err();
    assert!(matches!(
        err,
        WaatError::UninitializedSession {
            operation: "verify_web_analytics_data"
        }
    ));
}

#[test]
fn test_enable_and_disable_before_initialize_are_fatal() {
    let cell = SessionCell::new();
    assert!(matches!(
        cell.enable_web_analytics_testing(),
        Err(WaatError::UninitializedSession { .. })
    ));
    assert!(matches!(
        cell.disable_web_analytics_testing(),
        Err(WaatError::UninitializedSession { .. })
    ));
    assert_eq!(cell.capture_state(), None);
}

// Capture toggling

#[test]
fn test_enable_disable_toggle_capture_state() {
    let log = CallLog::default();
    let cell = initialized(MockBridge::new(log.clone()));

    cell.enable_web_analytics_testing().unwrap();
    assert_eq!(cell.capture_state(), Some(CaptureState::Enabled));

    cell.disable_web_analytics_testing().unwrap();
    assert_eq!(cell.capture_state(), Some(CaptureState::Disabled));

    let calls = log.calls();
    assert_eq!(&calls[calls.len() - 2..], &[BridgeCall::Enable, BridgeCall::Disable]);
}

#[test]
fn test_disable_without_enable_is_safe() {
    let cell = initialized(MockBridge::new(CallLog::default()));
    cell.disable_web_analytics_testing().unwrap();
    assert_eq!(cell.capture_state(), Some(CaptureState::Disabled));
}

#[test]
fn test_enable_failure_keeps_capture_disabled() {
    let bridge = MockBridge::new(CallLog::default())
        .failing_enable("You don't have permission to capture on that device");
    let cell = initialized(bridge);

    let err = cell.enable_web_analytics_testing().unwrap_err();
    assert_eq!(
        err.to_string(),
        "enableWebAnalyticsTesting failed: You don't have permission to capture on that device"
    );
    assert_eq!(cell.capture_state(), Some(CaptureState::Disabled));
}

// Verification

#[test]
fn test_verify_open_article_passes() {
    let bridge = MockBridge::new(CallLog::default())
        .with_packet("GET /ps/ifr?container=friendconnect&mid=0&nocache=1 HTTP/1.1")
        .with_result("OpenArticle_HttpSniffer", "PASS", &[]);
    let cell = initialized(bridge);

    cell.enable_web_analytics_testing().unwrap();
    let result = cell.verify_web_analytics_data(&open_article_request()).unwrap();

    assert_eq!(result, VerificationResult::new(VerificationStatus::Pass, vec![]));
}

#[test]
fn test_verify_failure_preserves_error_order() {
    let bridge = MockBridge::new(CallLog::default())
        .with_packet("GET /ps/ifr?container=friendconnect&mid=0")
        .with_result(
            "OpenArticle_HttpSniffer",
            "FAIL",
            &["mismatch on tag X", "missing param Y"],
        );
    let cell = initialized(bridge);
    cell.enable_web_analytics_testing().unwrap();

    let result = cell.verify_web_analytics_data(&open_article_request()).unwrap();

    assert_eq!(result.status(), VerificationStatus::Fail);
    assert_eq!(result.errors(), ["mismatch on tag X", "missing param Y"]);
}

#[test]
fn test_verify_while_capture_disabled_still_delegates() {
    let log = CallLog::default();
    let bridge = MockBridge::new(log.clone())
        .with_packet("GET /ps/ifr?container=friendconnect&mid=0")
        .with_result("OpenArticle_HttpSniffer", "PASS", &[]);
    let cell = initialized(bridge);

    let result = cell.verify_web_analytics_data(&open_article_request()).unwrap();

    // Nothing captured while disabled, so the engine reports too few packets
    assert_eq!(result.status(), VerificationStatus::Fail);
    assert_eq!(result.errors(), ["Expected at least 1 packets, captured 0"]);
    assert_eq!(log.verify_count(), 1);
}

#[test]
fn test_verify_passes_request_through_unchanged() {
    let log = CallLog::default();
    let bridge = MockBridge::new(log.clone()).with_result("Search", "SKIP", &[]);
    let cell = initialized(bridge);

    let request = VerifyRequest::new("/data/TestData.xml", "Search")
        .with_url_patterns(["GET /b/ss", "GET /__utm.gif"])
        .with_minimum_number_of_packets(0);
    let result = cell.verify_web_analytics_data(&request).unwrap();

    assert_eq!(result.status(), VerificationStatus::Skip);
    assert!(log.calls().contains(&BridgeCall::Verify(request)));
}

#[test]
fn test_verify_delegation_failure_keeps_message() {
    let cell = initialized(
        MockBridge::new(CallLog::default()).failing_verify("Unable to parse TestData.xml"),
    );

    let err = cell
        .verify_web_analytics_data(&open_article_request())
        .unwrap_err();

    match err {
        WaatError::Delegation { operation, source } => {
            assert_eq!(operation, "verifyWebAnalyticsData");
            assert_eq!(source.message, "Unable to parse TestData.xml");
        }
        other => panic!("unexpected error: {:?}", other),
    }
}

#[test]
fn test_verify_unknown_action_is_delegation_failure() {
    let cell = initialized(MockBridge::new(CallLog::default()));
    let request =
        VerifyRequest::new("TestData.xml", "NoSuchAction").with_minimum_number_of_packets(0);

    let err = cell.verify_web_analytics_data(&request).unwrap_err();
    assert!(err.to_string().contains("Action 'NoSuchAction' not found"));
}

#[test]
fn test_verify_unexpected_status_is_error() {
    let bridge = MockBridge::new(CallLog::default()).with_result("Broken", "ERROR", &[]);
    let cell = initialized(bridge);
    let request = VerifyRequest::new("TestData.xml", "Broken").with_minimum_number_of_packets(0);

    let err = cell.verify_web_analytics_data(&request).unwrap_err();
    assert!(matches!(err, WaatError::UnexpectedStatus { ref value } if value == "ERROR"));
}

#[test]
fn test_invalid_request_not_delegated() {
    let log = CallLog::default();
    let cell = initialized(MockBridge::new(log.clone()));

    let err = cell
        .verify_web_analytics_data(&VerifyRequest::new("TestData.xml", ""))
        .unwrap_err();

    assert!(matches!(err, WaatError::InvalidRequest { .. }));
    assert_eq!(log.verify_count(), 0);
}
