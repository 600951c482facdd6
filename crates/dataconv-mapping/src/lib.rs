//! # dataconv-mapping
//!
//! Wildcard path resolution, setting DSL, transforms, and mapping runtime.
//!
//! A mapping is an ordered list of settings, each pairing a path on side A
//! with a path on side B. Empty path segments are wildcards: `lines..sku`
//! addresses the `sku` field of every element of `lines`. Running a mapping
//! copies values from one side to the other, fanning a single value out to
//! every wildcard match or pairing two parallel sequences element by
//! element.

pub mod convert;
pub mod dsl;
pub mod extensions;
mod numeric;
pub mod path;
pub mod resolver;
pub mod runtime;
pub mod setting;
pub mod transforms;

pub use convert::{TransferKind, convert_item, convert_item_in_place};
pub use dsl::{MappingDefinition, MappingDsl, ParseError, SettingDefinition, Transform};
pub use extensions::{Extension, ExtensionRegistry};
pub use path::{SegmentedPath, Subpath, segment};
pub use resolver::{TargetPoint, resolve};
pub use runtime::{MappingFailure, MappingRuntime, SettingFailure};
pub use setting::{Direction, Mapping, Route, Setting, ValueTransform};
pub use transforms::{apply_transform, compile};

use thiserror::Error;

/// Errors that can occur while converting a single setting
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    #[error(
        "Bad setting between '{from}' and '{to}': wildcard counts must match \
         ({from_wildcards} vs {to_wildcards})"
    )]
    ParityViolation {
        from: String,
        to: String,
        from_wildcards: usize,
        to_wildcards: usize,
    },

    #[error("Path '{path}' does not match record: expected {expected} at '{at}', found {found}")]
    ResolutionMismatch {
        path: String,
        at: String,
        expected: &'static str,
        found: &'static str,
    },

    #[error(transparent)]
    Record(#[from] dataconv_record::Error),

    #[error("Transform error: {0}")]
    Transform(String),

    #[error("DSL parse error: {0}")]
    Parse(String),

    #[error("Extension error: {0}")]
    Extension(String),
}

impl Error {
    /// Build a parity error for a source/destination path pair.
    pub fn parity(
        from: impl Into<String>,
        to: impl Into<String>,
        from_wildcards: usize,
        to_wildcards: usize,
    ) -> Self {
        Self::ParityViolation {
            from: from.into(),
            to: to.into(),
            from_wildcards,
            to_wildcards,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
