use std::collections::TryReserveError;

use thiserror::Error;

/// Failure to grow a [`ByteArena`](crate::arena::ByteArena).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ArenaError {
    #[error("arena limit exceeded (requested {requested} bytes, limit {limit})")]
    LimitExceeded { requested: usize, limit: usize },
    #[error("could not reserve {requested} bytes")]
    Reserve {
        requested: usize,
        #[source]
        source: TryReserveError,
    },
}

impl ArenaError {
    /// Total arena length that was asked for.
    pub fn requested(&self) -> usize {
        match *self {
            ArenaError::LimitExceeded { requested, .. } => requested,
            ArenaError::Reserve { requested, .. } => requested,
        }
    }
}

/// Errors returned by mutating bucket and table operations.
///
/// Absent keys are not errors; lookups report them as `None`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    #[error("bucket could not grow to {requested} bytes")]
    AllocationFailure {
        requested: usize,
        #[source]
        source: ArenaError,
    },
    #[error("key of {len} bytes exceeds the {max} byte maximum", max = crate::encoding::MAX_KEY_LEN)]
    KeyTooLong { len: usize },
    #[error("empty key")]
    EmptyKey,
}

impl From<ArenaError> for StoreError {
    fn from(source: ArenaError) -> Self {
        StoreError::AllocationFailure {
            requested: source.requested(),
            source,
        }
    }
}

pub type Result<T> = std::result::Result<T, StoreError>;
