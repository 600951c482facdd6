//! Target point resolution
//!
//! Expands the wildcards of a segmented path against a record, producing
//! every concrete path the declared path reaches. Sequences fan out over
//! their current length; a missing sequence counts as one placeholder
//! element so that a later write creates it.

use crate::path::{SegmentedPath, Subpath, join};
use crate::{Error, Result};
use dataconv_record::{Value, get};
use std::fmt;
use tracing::trace;

/// A fully indexed path produced by [`resolve`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetPoint {
    path: String,
    indices: Vec<usize>,
}

impl TargetPoint {
    /// Concrete path with every wildcard replaced by an index
    #[must_use]
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Index substituted at each wildcard, left to right
    #[must_use]
    pub fn indices(&self) -> &[usize] {
        &self.indices
    }
}

impl fmt::Display for TargetPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.path)
    }
}

/// Resolve every target point of `path` in `record`
///
/// Points come out in ascending index order at every fan-out level.
///
/// # Errors
///
/// Returns [`Error::ResolutionMismatch`] when a wildcard meets a present
/// value that is not a sequence, or a named subpath meets a sequence.
pub fn resolve(path: &SegmentedPath, record: &Value) -> Result<Vec<TargetPoint>> {
    let mut points = Vec::new();
    if let Some((first, rest)) = path.subpaths().split_first() {
        expand(
            path,
            record,
            first.as_str().to_string(),
            Vec::new(),
            rest,
            &mut points,
        )?;
    }
    Ok(points)
}

fn expand(
    declared: &SegmentedPath,
    record: &Value,
    current: String,
    indices: Vec<usize>,
    rest: &[Subpath],
    points: &mut Vec<TargetPoint>,
) -> Result<()> {
    let Some((next, remaining)) = rest.split_first() else {
        trace!(point = %current, "resolved target point");
        points.push(TargetPoint {
            path: current,
            indices,
        });
        return Ok(());
    };

    match (next, get(record, &current)) {
        (Subpath::Wildcard, None) => expand(
            declared,
            record,
            join(&current, "0"),
            with_index(&indices, 0),
            remaining,
            points,
        ),
        (Subpath::Wildcard, Some(Value::Sequence(items))) => {
            for index in 0..items.len() {
                expand(
                    declared,
                    record,
                    join(&current, &index.to_string()),
                    with_index(&indices, index),
                    remaining,
                    points,
                )?;
            }
            Ok(())
        }
        (Subpath::Wildcard, Some(found)) => Err(mismatch(declared, current, "a sequence", found)),
        (Subpath::Named(_), Some(found)) if found.is_sequence() => {
            Err(mismatch(declared, current, "a map", found))
        }
        (Subpath::Named(name), _) => expand(
            declared,
            record,
            join(&current, name),
            indices,
            remaining,
            points,
        ),
    }
}

fn with_index(indices: &[usize], index: usize) -> Vec<usize> {
    let mut extended = Vec::with_capacity(indices.len() + 1);
    extended.extend_from_slice(indices);
    extended.push(index);
    extended
}

fn mismatch(declared: &SegmentedPath, at: String, expected: &'static str, found: &Value) -> Error {
    Error::ResolutionMismatch {
        path: declared.to_string(),
        at,
        expected,
        found: found.kind(),
    }
}
