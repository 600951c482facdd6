//! Wildcard path segmentation
//!
//! Splits a dotted path into runs of named segments separated by
//! wildcards. `a.b..c` becomes `[a.b, *, c]`; each empty segment is one
//! wildcard, so `a...c` nests two sequence levels under `a`.

use dataconv_record::PATH_SEPARATOR;
use std::fmt;

/// One unit of a segmented path
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Subpath {
    /// Consecutive named segments joined by the separator
    Named(String),

    /// An empty segment: one level of sequence to iterate or create
    Wildcard,
}

impl Subpath {
    /// Text of the subpath; a wildcard renders as the empty segment
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Subpath::Named(name) => name,
            Subpath::Wildcard => "",
        }
    }

    #[must_use]
    pub fn is_wildcard(&self) -> bool {
        matches!(self, Subpath::Wildcard)
    }
}

/// A path split at its wildcards
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SegmentedPath {
    subpaths: Vec<Subpath>,
}

impl SegmentedPath {
    #[must_use]
    pub fn subpaths(&self) -> &[Subpath] {
        &self.subpaths
    }

    /// Number of subpaths
    #[must_use]
    pub fn len(&self) -> usize {
        self.subpaths.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.subpaths.is_empty()
    }

    /// True when the path is a single subpath, i.e. a plain path without wildcards
    #[must_use]
    pub fn is_single(&self) -> bool {
        self.subpaths.len() == 1
    }

    #[must_use]
    pub fn wildcard_count(&self) -> usize {
        self.subpaths.iter().filter(|s| s.is_wildcard()).count()
    }
}

impl fmt::Display for SegmentedPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (position, subpath) in self.subpaths.iter().enumerate() {
            if position > 0 {
                write!(f, "{PATH_SEPARATOR}")?;
            }
            f.write_str(subpath.as_str())?;
        }
        Ok(())
    }
}

/// Split `path` into named runs and wildcards
#[must_use]
pub fn segment(path: &str) -> SegmentedPath {
    let mut subpaths = Vec::new();
    let mut run = String::new();

    for key in path.split(PATH_SEPARATOR) {
        if key.is_empty() {
            if !run.is_empty() {
                subpaths.push(Subpath::Named(std::mem::take(&mut run)));
            }
            subpaths.push(Subpath::Wildcard);
        } else {
            if !run.is_empty() {
                run.push(PATH_SEPARATOR);
            }
            run.push_str(key);
        }
    }
    if !run.is_empty() {
        subpaths.push(Subpath::Named(run));
    }

    SegmentedPath { subpaths }
}

/// Append one segment to a concrete path
pub(crate) fn join(base: &str, segment: &str) -> String {
    format!("{base}{PATH_SEPARATOR}{segment}")
}
