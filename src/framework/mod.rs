//! The attribute and relation kernel.
//!
//! This module provides the building blocks of a client-side record: a typed
//! attribute store with dirty tracking, a cast pipeline, mass-assignment
//! guarding, a uniform accessor surface and a lazy relation resolver.
//!
//! # Main Components
//!
//! - [`Model`] - Trait that resource types implement to describe themselves
//! - [`Record`] - One entity instance: attributes, original snapshot, loaded relations
//! - [`Casts`] - Per-key cast directives applied on read and write
//! - [`GuardPolicy`] - Fillable and guarded key lists
//! - [`AccessorTable`] - The keys a record exposes and what backs them
//! - [`LoadRequest`] - A relation fetch, detached from the record
//! - [`KernelError`] - Common error type
//!
//! # Testing
//!
//! See [`crate::clients::mock`] for a transport that answers from expectations.

pub mod accessor;
pub mod cast;
pub mod config;
pub mod error;
pub mod field;
pub mod guard;
pub mod model;
pub mod record;
pub mod relation;

pub use accessor::{AccessorTable, Slot};
pub use cast::{AttributeCaster, Cast, CastMode, Casts};
pub use config::{Casing, Config, DateTimeConstructor};
pub use error::KernelError;
pub use field::{Collection, Field, Related};
pub use guard::GuardPolicy;
pub use model::{Accessor, Model, Mutator, RelationDef, RelationKind};
pub use record::{Attributes, Record};
pub use relation::{LoadRequest, LoadResponse};
