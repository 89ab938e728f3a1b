//! Application layer - orchestration of domain logic.
//!
//! This layer coordinates the domain types and manages the runtime behavior:
//! - Admission gate (token check, queueing, drain)
//! - Refill scheduler (periodic background task)
//! - Metrics
//!
//! ## Ports
//!
//! The application layer defines ports (traits) that infrastructure
//! adapters must implement. This keeps the application layer independent
//! from infrastructure details such as the HTTP client.

pub mod gate;
pub mod metrics;
pub mod ports;
pub mod scheduler;
