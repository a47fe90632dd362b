//! APIHub testing utilities.
//!
//! Provides instrumented fakes for the four platform-service contracts, so
//! gateway behavior can be exercised end-to-end without live credentials,
//! catalogs, accounting backends, or upstream HTTP servers.

pub mod services;

pub use services::{RecordingDirectory, RecordingMeter, RecordingRegistry, ScriptedUpstream};
