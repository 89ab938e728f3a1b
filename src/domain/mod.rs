//! Domain layer - pure types with no runtime dependencies.
//!
//! This layer contains the core concepts and invariants of the limiter:
//! - Window and capacity configuration
//! - The token count for the current window
//! - The overflow queue
//! - The document payload and its wire mapping
//!
//! Nothing here is synchronized or async; the application layer composes
//! these pieces under a single lock.

pub mod config;
pub mod document;
pub mod queue;
pub mod tokens;
