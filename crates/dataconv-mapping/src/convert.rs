//! Single-setting conversion
//!
//! Copies the value(s) addressed by one source path to the location(s)
//! addressed by one destination path.

use crate::path::{SegmentedPath, Subpath, segment};
use crate::resolver::{TargetPoint, resolve};
use crate::setting::ValueTransform;
use crate::{Error, Result};
use dataconv_record::{PATH_SEPARATOR, Value};
use tracing::{debug, trace};

/// How a source path relates to a destination path
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransferKind {
    /// Both paths are plain: one read, one write
    Direct,

    /// Plain source, wildcard destination: one read written to every match
    OneToMany,

    /// Wildcard source: each source match written to the destination
    /// location with the same indices
    OneToOne,
}

impl TransferKind {
    /// Classify a path pair, enforcing wildcard parity
    ///
    /// # Errors
    ///
    /// Returns [`Error::ParityViolation`] when the source has wildcards and
    /// the destination declares a different number of them.
    pub fn classify(from: &SegmentedPath, to: &SegmentedPath) -> Result<Self> {
        if !from.is_single() && from.wildcard_count() != to.wildcard_count() {
            return Err(Error::parity(
                from.to_string(),
                to.to_string(),
                from.wildcard_count(),
                to.wildcard_count(),
            ));
        }

        Ok(match (from.is_single(), to.is_single()) {
            (true, true) => Self::Direct,
            (true, false) => Self::OneToMany,
            (false, _) => Self::OneToOne,
        })
    }
}

/// Copy `from_path` of `from` into `to_path` of `to`
///
/// Parity is checked before either record is read. On error, writes made
/// for earlier target points of the same call stay in place.
///
/// # Errors
///
/// Returns parity, resolution, transform and record write errors.
pub fn convert_item(
    from_path: &str,
    from: &Value,
    to_path: &str,
    to: &mut Value,
    transform: Option<&ValueTransform>,
) -> Result<()> {
    transfer(from_path, to_path, Sides::Pair { from, to }, transform)
}

/// Like [`convert_item`] with one record acting as both source and destination
///
/// Every read happens before the write it feeds, so values written for
/// earlier target points are visible to later reads.
///
/// # Errors
///
/// Same as [`convert_item`].
pub fn convert_item_in_place(
    from_path: &str,
    to_path: &str,
    record: &mut Value,
    transform: Option<&ValueTransform>,
) -> Result<()> {
    transfer(from_path, to_path, Sides::Shared(record), transform)
}

enum Sides<'a> {
    Pair { from: &'a Value, to: &'a mut Value },
    Shared(&'a mut Value),
}

impl Sides<'_> {
    fn source(&self) -> &Value {
        match self {
            Sides::Pair { from, .. } => *from,
            Sides::Shared(record) => &**record,
        }
    }

    fn destination(&self) -> &Value {
        match self {
            Sides::Pair { to, .. } => &**to,
            Sides::Shared(record) => &**record,
        }
    }

    fn destination_mut(&mut self) -> &mut Value {
        match self {
            Sides::Pair { to, .. } => &mut **to,
            Sides::Shared(record) => &mut **record,
        }
    }
}

fn transfer(
    from_path: &str,
    to_path: &str,
    mut sides: Sides<'_>,
    transform: Option<&ValueTransform>,
) -> Result<()> {
    let from = segment(from_path);
    let to = segment(to_path);
    let kind = TransferKind::classify(&from, &to)?;
    debug!(from = from_path, to = to_path, ?kind, "converting item");

    match kind {
        TransferKind::Direct => {
            let value = read(sides.source(), from_path, transform)?;
            write(sides.destination_mut(), to_path, value)
        }
        TransferKind::OneToMany => {
            let points = resolve(&to, sides.destination())?;
            let value = read(sides.source(), from_path, transform)?;
            for point in &points {
                trace!(%point, "fan-out write");
                write(sides.destination_mut(), point.path(), value.clone())?;
            }
            Ok(())
        }
        TransferKind::OneToOne => {
            let points = resolve(&from, sides.source())?;
            if points.is_empty() {
                debug!(from = from_path, "source resolved to no target points");
            }
            for point in &points {
                let destination = paired_path(&from, &to, point)?;
                trace!(%point, %destination, "paired write");
                let value = read(sides.source(), point.path(), transform)?;
                write(sides.destination_mut(), &destination, value)?;
            }
            Ok(())
        }
    }
}

/// Read `path`, applying `transform` to the result even when it is absent
///
/// # Errors
///
/// Returns the transform's error, if any.
pub fn read(
    record: &Value,
    path: &str,
    transform: Option<&ValueTransform>,
) -> Result<Option<Value>> {
    let value = dataconv_record::get(record, path).cloned();
    match transform {
        Some(transform) => transform.apply(value),
        None => Ok(value),
    }
}

fn write(record: &mut Value, path: &str, value: Option<Value>) -> Result<()> {
    match value {
        Some(value) => dataconv_record::set(record, path, value)?,
        None => dataconv_record::clear(record, path)?,
    }
    Ok(())
}

/// Build the destination path for one source point
///
/// Destination wildcards take the source indices in order of appearance:
/// the Nth wildcard expanded on the source side fills the Nth wildcard of
/// the destination path.
fn paired_path(from: &SegmentedPath, to: &SegmentedPath, point: &TargetPoint) -> Result<String> {
    let mut indices = point.indices().iter();
    let mut destination = String::new();
    for (position, subpath) in to.subpaths().iter().enumerate() {
        if position > 0 {
            destination.push(PATH_SEPARATOR);
        }
        match subpath {
            Subpath::Named(name) => destination.push_str(name),
            Subpath::Wildcard => {
                let index = indices.next().ok_or_else(|| {
                    Error::parity(
                        from.to_string(),
                        to.to_string(),
                        point.indices().len(),
                        to.wildcard_count(),
                    )
                })?;
                destination.push_str(&index.to_string());
            }
        }
    }
    Ok(destination)
}
