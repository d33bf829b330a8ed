//! Error types.

use thiserror::Error;

use crate::value::Key;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ReactivityError {
    /// A computed ref created without a setter was written to.
    #[error("Write operation failed: computed value is readonly")]
    ReadonlyComputed,

    /// The object behind a field ref refused the write.
    #[error("Write to '{0}' was rejected")]
    RejectedWrite(Key),
}

pub type Result<T, E = ReactivityError> = std::result::Result<T, E>;
