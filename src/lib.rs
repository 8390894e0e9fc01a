#![doc(html_logo_url = "https://www.rust-lang.org/logos/rust-logo-128x128.png")]
#![doc(html_favicon_url = "https://www.rust-lang.org/favicon.ico")]
//! # Record Kernel
//!
//! > **The attribute and relation core of a client-side Active Record.**
//!
//! A [`Record`](framework::Record) holds the attributes of one remote entity,
//! tracks what changed since it was last synced, converts values through
//! per-key casts, protects bulk assignment with a guard policy and resolves
//! related records lazily through a pluggable transport.
//!
//! ## 🏗️ Design Philosophy
//!
//! ### Descriptors + Uniform Records
//!
//! Entity types are described once, by a unit struct implementing
//! [`Model`](framework::Model). Every instance is the same
//! [`Record`](framework::Record) type pointing at its model. This gives:
//! - **One store implementation**: casting, dirty tracking and guarding are written once.
//! - **Explicit relations**: each model lists its [`RelationDef`](framework::RelationDef)s.
//! - **No runtime reflection**: the [`AccessorTable`](framework::AccessorTable) records
//!   which keys a record exposes.
//!
//! ## 🚀 Core Concepts
//!
//! ### Raw vs Cast
//! The store keeps raw JSON values. Reads pass through the cast pipeline and
//! return a [`Field`](framework::Field): a plain value, a collection, a
//! date-time or a loaded relation. Writes are cast before they are stored.
//!
//! ### Sync Points
//! `original` is a snapshot of the attributes taken at the last
//! [`sync_original`](framework::Record::sync_original). Dirty queries compare
//! the two on demand.
//!
//! ### Loading Without Holding the Record
//! [`Record::load`](framework::Record::load) is built from three pieces:
//! a synchronous [`load_request`](framework::Record::load_request), an async
//! [`fetch`](framework::LoadRequest::fetch) against any
//! [`Transport`](clients::Transport), and a synchronous
//! [`install`](framework::Record::install).
//!
//! ## 👩‍💻 Architecture Notes
//!
//! ### 1. Type-Safe Error Handling
//! Every kernel operation returns [`KernelError`](framework::KernelError).
//! Transport failures convert into it through `#[from]`.
//!
//! ### 2. Configuration Is Passed, Not Global
//! A [`Config`](framework::Config) is shared as `Arc<Config>` and inherited by
//! every related record built from an owner.
//!
//! ### 3. Observability
//! `tracing` is used throughout with a `model` field on every kernel event.
//! See the [`lifecycle::tracing`] module for details.
//!
//! ## 🗺️ Module Tour
//!
//! ### 1. The Engine ([`framework`])
//! The attribute store, cast pipeline, guard policy, accessor table and
//! relation resolver.
//! - **Key items**: [`Model`](framework::Model), [`Record`](framework::Record).
//!
//! ### 2. The Interface ([`clients`])
//! Queries and the transports that run them.
//! - **Key items**: [`Query`](clients::Query), [`Transport`](clients::Transport),
//!   [`MockTransport`](clients::mock::MockTransport).
//!
//! ### 3. The Orchestrator ([`lifecycle`])
//! Starts the in-memory service and installs tracing.
//! - **Key items**: [`RecordSystem`](lifecycle::RecordSystem).
//!
//! ### 4. The Implementation ([`model`])
//! Sample models: users, teams, shifts and polymorphic comments.
//!
//! ## 🚀 Quick Start
//!
//! ```bash
//! # Run the demo with info logs
//! RUST_LOG=info cargo run
//!
//! # Run the tests
//! cargo test
//! ```

pub mod clients;
pub mod framework;
pub mod lifecycle;
pub mod model;
