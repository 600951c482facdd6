#![deny(rust_2018_idioms)]
#![deny(unsafe_op_in_unsafe_fn)]
#![warn(clippy::all)]

//! # dataconv-record
//!
//! Nested record model and dotted-path accessors.
//!
//! A record is an arbitrarily nested tree of ordered maps and sequences with
//! untyped leaves. This crate knows nothing about wildcards: paths handled
//! here are fully concrete, and every numeric segment addressing a sequence
//! is an index.

/// Dotted-path read and write helpers.
pub mod path;
/// Record value tree and ordered map.
pub mod value;

/// Path accessor entry points.
pub use path::{MAX_SEQUENCE_PADDING, PATH_SEPARATOR, clear, get, set};
/// Value primitives for record trees.
pub use value::{Map, Value};

use thiserror::Error;

/// Errors that can occur when writing into a record
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    #[error("Cannot write '{path}': value at '{at}' is a {found}, not a map or sequence")]
    NotAContainer {
        path: String,
        at: String,
        found: &'static str,
    },

    #[error("Cannot write '{path}': '{segment}' is not a sequence index")]
    InvalidIndex { path: String, segment: String },

    #[error("Cannot write '{path}': index {index} would grow a sequence of {len} past {limit} padding slots")]
    IndexTooLarge {
        path: String,
        index: usize,
        len: usize,
        limit: usize,
    },
}

impl Error {
    /// Build a not-a-container error for a scalar found mid-path.
    pub fn not_a_container(path: impl Into<String>, at: impl Into<String>, found: &Value) -> Self {
        Self::NotAContainer {
            path: path.into(),
            at: at.into(),
            found: found.kind(),
        }
    }

    /// Build an invalid-index error for a non-numeric sequence segment.
    pub fn invalid_index(path: impl Into<String>, segment: impl Into<String>) -> Self {
        Self::InvalidIndex {
            path: path.into(),
            segment: segment.into(),
        }
    }
}

/// Crate-local result type for record operations.
pub type Result<T> = std::result::Result<T, Error>;
