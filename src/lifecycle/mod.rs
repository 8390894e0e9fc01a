//! Runtime wiring: tracing setup and the in-memory record system.

pub mod record_system;
pub mod tracing;

pub use self::tracing::setup_tracing;
pub use record_system::RecordSystem;
