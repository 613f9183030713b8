//! Verification engine facade.
//!
//! Provides the engine session, verification requests, and result adaptation.

pub mod request;
pub mod result;
pub mod session;
