// src/error.rs
//
// Error types shared by the object client, the resolver and the filters.

use thiserror::Error;

use crate::constants::{MISSING_OBJECTS_PREFIX, UNEXPECTED_LOOKUP_ERROR_MSG};

/// Errors reported by an [`ObjectClient`](crate::object_client::ObjectClient).
#[derive(Error, Debug)]
pub enum ClientError {
    /// The remote answered with its not-found status (404, `NoSuchKey`, ...).
    #[error("not found: {resource}")]
    NotFound { resource: String },

    /// Any other error the remote service returned.
    #[error("service error (HTTP {status}) {code}: {message}")]
    Service {
        status: u16,
        code: String,
        message: String,
    },

    /// Network, IO or dispatch failure below the service layer.
    #[error("transport error: {0:#}")]
    Transport(anyhow::Error),
}

impl ClientError {
    pub fn not_found(resource: impl Into<String>) -> Self {
        ClientError::NotFound {
            resource: resource.into(),
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, ClientError::NotFound { .. })
    }
}

/// Cause attached to a failed per-name lookup.
#[derive(Error, Debug)]
pub enum LookupError {
    /// More than one record matched a single name.
    #[error("There are multiple versions of object with name: {name}")]
    AmbiguousMatch { name: String, matches: usize },

    #[error(transparent)]
    Client(#[from] ClientError),

    /// The lookup task panicked or was cancelled by the runtime.
    #[error("lookup of {name} did not complete: {reason}")]
    Aborted { name: String, reason: String },
}

/// Terminating failure of a whole batch lookup.
///
/// Any failed lookup masks missing names: a batch with both reports only
/// [`BatchFailure::Unexpected`].
#[derive(Error, Debug)]
pub enum BatchFailure {
    /// One or more lookups failed. The causes are logged and kept here for
    /// callers, but are not part of the message.
    #[error("{}", UNEXPECTED_LOOKUP_ERROR_MSG)]
    Unexpected { failures: Vec<(String, LookupError)> },

    /// No lookup failed, but some names matched nothing.
    #[error("{}{}", MISSING_OBJECTS_PREFIX, .names.join(", "))]
    Missing { names: Vec<String> },
}

/// Errors raised while parsing detailed-object filter parameters.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum FilterError {
    #[error("Unknown filter parameter: {0}")]
    UnknownParameter(String),

    #[error("Filter parameter must use the form key:value, got '{0}'")]
    Malformed(String),

    #[error("Invalid value '{value}' for filter parameter {key}")]
    InvalidValue { key: String, value: String },

    #[error("Filter parameter {0} given more than once")]
    DuplicateParameter(String),
}
