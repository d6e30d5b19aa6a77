//! Structural errors that abort a group profile run.
//!
//! Data-quality gaps (missing norms, uncovered scores) are not errors; they
//! degrade the affected record only.

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ProfileError {
    /// The order (test administration) does not exist.
    #[error("order {0} not found")]
    OrderNotFound(u32),

    #[error("test type {0} not found")]
    TestTypeNotFound(u32),

    /// No group profile generator exists for the test type's family.
    #[error("no group profile generator for test type '{0}'")]
    UnsupportedTestType(String),

    #[error("unsupported report file type '{0}'")]
    UnsupportedFileType(String),
}

pub type ProfileResult<T> = Result<T, ProfileError>;
