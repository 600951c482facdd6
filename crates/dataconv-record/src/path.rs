//! Dotted-path accessors
//!
//! Paths handled here are concrete: every segment is either a map key or,
//! when the container is a sequence, a decimal index.

use crate::value::{Map, Value};
use crate::{Error, Result};
use tracing::trace;

/// Separator between path segments
pub const PATH_SEPARATOR: char = '.';

/// Most null slots a single write may append to a sequence
pub const MAX_SEQUENCE_PADDING: usize = 1 << 16;

/// Read the value at `path`
///
/// Resolution stops at the first missing step and yields `None`. Reading
/// never creates anything.
#[must_use]
pub fn get<'a>(record: &'a Value, path: &str) -> Option<&'a Value> {
    path.split(PATH_SEPARATOR)
        .try_fold(record, |current, segment| match current {
            Value::Map(map) => map.get(segment),
            Value::Sequence(items) => parse_index(segment).and_then(|index| items.get(index)),
            _ => None,
        })
}

/// Write `value` at `path`, creating missing intermediates
///
/// A missing intermediate becomes a sequence when the segment after it is
/// literally `0`, and a map otherwise.
///
/// # Errors
///
/// Returns an error when an existing intermediate is a scalar, a sequence
/// is addressed with a segment that is not an index, or an index lies more
/// than [`MAX_SEQUENCE_PADDING`] slots past the end of its sequence.
pub fn set(record: &mut Value, path: &str, value: Value) -> Result<()> {
    write(record, path, Some(value))
}

/// Remove whatever is stored at `path`
///
/// Intermediates are created exactly as [`set`] would create them. A map
/// entry is removed; a sequence slot is reset to null so later indices keep
/// their positions.
///
/// # Errors
///
/// Same conditions as [`set`].
pub fn clear(record: &mut Value, path: &str) -> Result<()> {
    write(record, path, None)
}

fn write(record: &mut Value, path: &str, value: Option<Value>) -> Result<()> {
    let segments: Vec<&str> = path.split(PATH_SEPARATOR).collect();
    let Some((last, parents)) = segments.split_last() else {
        return Ok(());
    };

    if record.is_null() {
        *record = if segments[0] == "0" {
            Value::Sequence(Vec::new())
        } else {
            Value::Map(Map::new())
        };
    }

    let mut current = record;
    for (depth, segment) in parents.iter().enumerate() {
        let next_is_first_index = segments[depth + 1] == "0";
        current = descend(current, segment, next_is_first_index, path, &segments[..depth])?;
    }

    match current {
        Value::Map(map) => {
            match value {
                Some(value) => {
                    map.insert(*last, value);
                }
                None => {
                    map.remove(last);
                }
            }
            Ok(())
        }
        Value::Sequence(items) => {
            let index = parse_index(last).ok_or_else(|| Error::invalid_index(path, *last))?;
            *slot_at(items, index, path)? = value.unwrap_or(Value::Null);
            Ok(())
        }
        other => Err(Error::not_a_container(path, parents.join("."), other)),
    }
}

/// Step into `segment` of `container`, creating the child if it is vacant
///
/// Null counts as vacant: sequences grown past their end are padded with
/// null, and those slots must be fillable later.
fn descend<'a>(
    container: &'a mut Value,
    segment: &str,
    next_is_first_index: bool,
    path: &str,
    walked: &[&str],
) -> Result<&'a mut Value> {
    let slot = match container {
        Value::Map(map) => map.get_or_insert_with(segment, || Value::Null),
        Value::Sequence(items) => {
            let index = parse_index(segment).ok_or_else(|| Error::invalid_index(path, segment))?;
            slot_at(items, index, path)?
        }
        other => return Err(Error::not_a_container(path, walked.join("."), other)),
    };

    if slot.is_null() {
        trace!(path, segment, sequence = next_is_first_index, "creating intermediate");
        *slot = if next_is_first_index {
            Value::Sequence(Vec::new())
        } else {
            Value::Map(Map::new())
        };
    }

    Ok(slot)
}

fn slot_at<'a>(items: &'a mut Vec<Value>, index: usize, path: &str) -> Result<&'a mut Value> {
    let len = items.len();
    if index >= len {
        let too_large = move || Error::IndexTooLarge {
            path: path.to_string(),
            index,
            len,
            limit: MAX_SEQUENCE_PADDING,
        };
        let new_len = index.checked_add(1).ok_or_else(too_large)?;
        let padding = new_len - len;
        if padding > MAX_SEQUENCE_PADDING {
            return Err(too_large());
        }
        items.try_reserve(padding).map_err(|_| too_large())?;
        items.resize(new_len, Value::Null);
    }
    Ok(&mut items[index])
}

/// Parse a canonical decimal index (`0`, `7`, `12`; not `+1` or `01`)
fn parse_index(segment: &str) -> Option<usize> {
    let canonical = !segment.is_empty()
        && segment.bytes().all(|b| b.is_ascii_digit())
        && (segment == "0" || !segment.starts_with('0'));
    if canonical { segment.parse().ok() } else { None }
}
