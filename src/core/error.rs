//! Error types for registry and reactive container operations.

use thiserror::Error;

use crate::core::index::{EntryKind, Index};

/// Errors produced while defining or looking up registry entries.
///
/// All of these are configuration-time contract violations. Scheduling itself
/// never fails; its outcomes are visible only through state.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum RegistryError {
    /// An index was defined twice for the same kind of entry.
    #[error("{kind} index {index} being reused")]
    DuplicateIndex {
        /// Kind of entry being defined.
        kind: EntryKind,
        /// Offending index.
        index: Index,
    },
    /// No entry of this kind exists at the index.
    #[error("no {kind} at index {index}")]
    UnknownIndex {
        /// Kind of entry looked up.
        kind: EntryKind,
        /// Missing index.
        index: Index,
    },
    /// The property at the index holds a different value type.
    #[error("property {index} holds `{actual}`, not `{expected}`")]
    TypeMismatch {
        /// Property index.
        index: Index,
        /// Requested value type.
        expected: &'static str,
        /// Stored value type.
        actual: &'static str,
    },
    /// The unbound sentinel was used where a real index is required.
    #[error("the unbound index cannot be defined or looked up")]
    Unbound,
    /// A resource usage spec violates its contract.
    #[error("invalid resource usage: {0}")]
    InvalidUsage(String),
    /// Machine or catalog configuration failed validation.
    #[error("config invalid: {0}")]
    InvalidConfig(String),
}

/// Errors produced by positional access on observable lists.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum ListError {
    /// Position is outside `0..len`.
    #[error("index {index} out of range for list of length {len}")]
    OutOfRange {
        /// Requested position.
        index: usize,
        /// List length at the time of access.
        len: usize,
    },
}

/// Application-facing result using anyhow for higher-level contexts.
pub type AppResult<T> = Result<T, anyhow::Error>;
