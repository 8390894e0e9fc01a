//! # Kernel Errors
//!
//! Every fallible record operation returns [`KernelError`]. Nothing here is
//! retried internally: the caller decides whether to retry the surrounding
//! network operation.
//!
//! Guarded keys are **not** an error. [`Record::fill`](crate::framework::Record::fill)
//! drops them silently.

use crate::clients::TransportError;

/// Errors raised by the attribute store, the cast pipeline and the relation resolver.
#[derive(Debug, thiserror::Error)]
pub enum KernelError {
    /// A value could not be represented in the type its cast asks for.
    #[error("Cannot cast '{key}' to {target}: {value}")]
    CastFailure {
        key: String,
        target: &'static str,
        value: String,
    },

    /// The configuration holds a value the kernel cannot use.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// `has_cast` reported a directive that the dispatcher does not know.
    #[error("Cast directive '{directive}' registered for '{key}' has no handler")]
    CastInvariant { key: String, directive: String },

    /// The relation name is not declared on the model.
    #[error("'{relation}' is not a defined relation on {model}")]
    UndefinedRelation { model: String, relation: String },

    /// The relation is declared but has not been loaded yet.
    #[error("Relation '{relation}' on {model} is not loaded")]
    RelationNotLoaded { model: String, relation: String },

    /// A `belongs_to` style relation needs a foreign key value the record does not have.
    #[error("{model} has no value for foreign key '{key}'")]
    MissingForeignKey { model: String, key: String },

    /// Data handed to the kernel is not an object or an array of objects.
    #[error("Unexpected data shape for {context}: expected {expected}")]
    UnexpectedRemoteShape {
        context: String,
        expected: &'static str,
    },

    /// The transport failed while loading relations.
    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),
}

impl KernelError {
    pub(crate) fn undefined_relation(model: &str, relation: &str) -> Self {
        KernelError::UndefinedRelation {
            model: model.to_string(),
            relation: relation.to_string(),
        }
    }

    pub(crate) fn unexpected_shape(context: impl Into<String>, expected: &'static str) -> Self {
        KernelError::UnexpectedRemoteShape {
            context: context.into(),
            expected,
        }
    }
}
