// Copyright 2022 VMware, Inc.
// SPDX-License-Identifier: MIT
use std::time::Duration;
use thiserror::Error;

use crate::common::ObjectKey;

/// Failures reported by an `ObjectStore`.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("{kind} {key} not found")]
    NotFound { kind: String, key: ObjectKey },
    #[error("{kind} {key} already exists")]
    AlreadyExists { kind: String, key: ObjectKey },
    #[error("{kind} {key} was modified concurrently")]
    Conflict { kind: String, key: ObjectKey },
    #[error("request for {kind} {key} timed out after {timeout:?}")]
    Timeout {
        kind: String,
        key: ObjectKey,
        timeout: Duration,
    },
    #[error("API request failed: {0}")]
    Api(#[source] kube::Error),
    #[error("failed to encode object: {0}")]
    Encode(#[source] serde_json::Error),
}

impl StoreError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, StoreError::NotFound { .. })
    }

    pub fn is_conflict(&self) -> bool {
        matches!(self, StoreError::Conflict { .. })
    }
}

/// Failures while deriving a managed resource from its owner.
#[derive(Debug, Error)]
pub enum BuildError {
    #[error("owner {0} has no name or uid to reference")]
    MissingOwnerReference(ObjectKey),
    #[error("replicas must not be negative, got {0}")]
    NegativeReplicas(i32),
    #[error("{0} must not be empty")]
    EmptyName(&'static str),
    #[error("failed to encode {0}: {1}")]
    Encode(&'static str, #[source] serde_json::Error),
}

#[derive(Debug, Error)]
pub enum Error {
    #[error("Failed to get {kind}: {source}")]
    OwnerGetFailed {
        kind: &'static str,
        #[source]
        source: StoreError,
    },
    #[error("Failed to get {kind}: {source}")]
    ManagedGetFailed {
        kind: &'static str,
        #[source]
        source: StoreError,
    },
    #[error("Failed to create {kind}: {source}")]
    ManagedCreateFailed {
        kind: &'static str,
        #[source]
        source: StoreError,
    },
    #[error("Failed to update {kind}: {source}")]
    ManagedUpdateFailed {
        kind: &'static str,
        #[source]
        source: StoreError,
    },
    #[error("Failed to update status of {kind}: {source}")]
    StatusUpdateFailed {
        kind: &'static str,
        #[source]
        source: StoreError,
    },
    #[error("Failed to build managed resource: {0}")]
    Build(#[from] BuildError),
    #[error("MissingObjectKey: {0}")]
    MissingObjectKey(&'static str),
}

impl Error {
    /// The store failure behind this error, if any.
    pub fn store_error(&self) -> Option<&StoreError> {
        match self {
            Error::OwnerGetFailed { source, .. }
            | Error::ManagedGetFailed { source, .. }
            | Error::ManagedCreateFailed { source, .. }
            | Error::ManagedUpdateFailed { source, .. }
            | Error::StatusUpdateFailed { source, .. } => Some(source),
            Error::Build(_) | Error::MissingObjectKey(_) => None,
        }
    }

    /// Build errors point at a static defect rather than a transient condition.
    pub fn is_build_error(&self) -> bool {
        matches!(self, Error::Build(_))
    }
}
