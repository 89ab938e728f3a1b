//! Infrastructure layer - external adapters and integrations.
//!
//! This layer provides:
//! - The caller-facing client that wires everything together
//! - The HTTP dispatcher (feature `http`)

pub mod client;

#[cfg(feature = "http")]
pub mod http;

/// Mock implementations for testing.
///
/// This module is only available when the `test-helpers` feature is enabled,
/// or during test builds. It provides controllable test doubles for testing
/// admission behavior.
///
/// To use these mocks in integration tests, add to your `Cargo.toml`:
/// ```toml
/// [dev-dependencies]
/// doc-throttle = { version = "*", features = ["test-helpers"] }
/// ```
#[cfg(any(test, feature = "test-helpers"))]
pub mod mocks;
