//! Mock implementations for testing.
//!
//! This module provides test doubles for infrastructure adapters,
//! enabling controlled testing of admission and drain behavior.

pub mod dispatcher;

pub use dispatcher::RecordingDispatcher;
