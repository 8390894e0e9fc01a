//! # Observability & Tracing
//!
//! The [`setup_tracing`] function initializes structured logging with the
//! `tracing` crate. Every kernel log line carries a `model` field naming the
//! entity type, so output can be filtered per model.
//!
//! ## Configuration
//!
//! The compact format hides the crate/module prefix (`with_target(false)`).
//! Levels come from the `RUST_LOG` environment variable.
//!
//! ## What Gets Traced
//!
//! - **Service Lifecycle** (`info`): startup and shutdown of the memory service
//! - **Relation Loads** (`info`): which relations a record fetches
//! - **Store Writes** (`debug`/`trace`): fills, dropped guarded keys, sets and deletes
//! - **Anomalies** (`warn`): relations missing from a combined response, failed queries
//!
//! ## Usage Examples
//!
//! ```bash
//! # Loads and service lifecycle
//! RUST_LOG=info cargo run
//!
//! # Fills, relation installs and queries sent
//! RUST_LOG=debug cargo run
//!
//! # Every attribute write
//! RUST_LOG=trace cargo run
//!
//! # Only the kernel
//! RUST_LOG=record_kernel::framework=debug cargo run
//! ```
//!
//! With `RUST_LOG=debug`, loading two relations on a user looks like:
//!
//! ```text
//! INFO Loading model="User" relations=["team", "shifts"]
//! DEBUG execute:Sending request endpoint="users/1"
//! DEBUG Execute endpoint="users/1" with=["team", "shifts"]
//! DEBUG Fill model="Team" keys=2
//! DEBUG Relation added model="User" relation="team" count=1
//! DEBUG Relation added model="User" relation="shifts" count=2
//! ```
pub fn setup_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_target(false) // module paths are noise; the model field says what is logging
        .compact()
        .init();
}
