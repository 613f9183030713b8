//! Capture mechanisms supported by the engine.

use super::Capability;
use crate::bridge::ForeignEnumeration;
use std::fmt;
use std::str::FromStr;

/// Technique used to observe outbound analytics traffic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WebAnalyticTool {
    /// Reads the Omniture debugger window
    OmnitureDebugger,
    /// Sniffs HTTP packets on every network interface
    HttpSniffer,
    /// Intercepts tag requests from inside the page
    JsSniffer,
}

impl WebAnalyticTool {
    pub const ALL: [WebAnalyticTool; 3] = [
        WebAnalyticTool::OmnitureDebugger,
        WebAnalyticTool::HttpSniffer,
        WebAnalyticTool::JsSniffer,
    ];
}

impl Capability for WebAnalyticTool {
    const ENUMERATION: ForeignEnumeration = ForeignEnumeration::WebAnalyticTool;

    fn from_canonical(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|t| t.canonical_name() == name)
    }

    fn canonical_name(&self) -> &'static str {
        match self {
            WebAnalyticTool::OmnitureDebugger => "OMNITURE_DEBUGGER",
            WebAnalyticTool::HttpSniffer => "HTTP_SNIFFER",
            WebAnalyticTool::JsSniffer => "JS_SNIFFER",
        }
    }
}

impl FromStr for WebAnalyticTool {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_canonical(&s.to_uppercase()).ok_or_else(|| {
            format!(
                "Unknown web analytic tool: '{}'. Valid tools: omniture_debugger, http_sniffer, js_sniffer",
                s
            )
        })
    }
}

impl fmt::Display for WebAnalyticTool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.canonical_name())
    }
}
