//! Transform operations
//!
//! Declarative transforms from the mapping DSL, and [`compile`] which turns
//! one into a [`ValueTransform`] a setting can carry.

use crate::dsl::Transform;
use crate::extensions::ExtensionRegistry;
use crate::setting::ValueTransform;
use dataconv_record::Value;

/// Apply a declarative transform to a copied value
///
/// `None` means the source was absent. Only `default` turns an absent value
/// into a present one; every other operation passes it through.
///
/// # Errors
///
/// Returns an error if the operation cannot handle the value, or for an
/// extension call, which needs a registry and has to go through [`compile`].
pub fn apply_transform(value: Option<Value>, transform: &Transform) -> crate::Result<Option<Value>> {
    match transform {
        Transform::Default { value: default } => Ok(transform_default(value, default)),
        Transform::Chain { transforms } => transform_chain(value, transforms),
        Transform::Extension {
            extension,
            function,
            ..
        } => Err(crate::Error::Transform(format!(
            "extension transform {extension}.{function} requires a registry"
        ))),
        Transform::Uppercase => present(value, transform_uppercase),
        Transform::Lowercase => present(value, transform_lowercase),
        Transform::Trim => present(value, transform_trim),
        Transform::Split { delimiter, index } => {
            present(value, |v| transform_split(v, delimiter, *index))
        }
        Transform::Prefix { value: prefix } => present(value, |v| transform_affix(v, prefix, "")),
        Transform::Suffix { value: suffix } => present(value, |v| transform_affix(v, "", suffix)),
    }
}

fn present(
    value: Option<Value>,
    op: impl FnOnce(&Value) -> crate::Result<Value>,
) -> crate::Result<Option<Value>> {
    value.as_ref().map(op).transpose()
}

/// Build a runnable transform, resolving extension functions now
///
/// # Errors
///
/// Returns [`crate::Error::Extension`] if a referenced extension function is
/// not registered.
pub fn compile(transform: &Transform, extensions: &ExtensionRegistry) -> crate::Result<ValueTransform> {
    match transform {
        Transform::Extension {
            extension,
            function,
            args,
        } => {
            let func = extensions.function(extension, function)?;
            let args = args.clone();
            Ok(ValueTransform::new(move |value| {
                value
                    .map(|v| {
                        let mut call_args = Vec::with_capacity(args.len() + 1);
                        call_args.push(v);
                        call_args.extend(args.iter().cloned());
                        func(&call_args)
                    })
                    .transpose()
            }))
        }
        Transform::Chain { transforms } => {
            let steps = transforms
                .iter()
                .map(|step| compile(step, extensions))
                .collect::<crate::Result<Vec<_>>>()?;
            Ok(ValueTransform::new(move |value| {
                steps.iter().try_fold(value, |current, step| step.apply(current))
            }))
        }
        other => {
            let op = other.clone();
            Ok(ValueTransform::new(move |value| apply_transform(value, &op)))
        }
    }
}

fn text(value: &Value, operation: &str) -> crate::Result<String> {
    value.as_string().ok_or_else(|| {
        crate::Error::Transform(format!("Cannot {operation} {} value", value.kind()))
    })
}

/// Convert string to uppercase
///
/// # Errors
///
/// Returns an error if the value cannot be represented as a string.
pub fn transform_uppercase(value: &Value) -> crate::Result<Value> {
    match value {
        Value::Null => Ok(Value::Null),
        _ => Ok(Value::String(text(value, "uppercase")?.to_uppercase())),
    }
}

/// Convert string to lowercase
///
/// # Errors
///
/// Returns an error if the value cannot be represented as a string.
pub fn transform_lowercase(value: &Value) -> crate::Result<Value> {
    match value {
        Value::Null => Ok(Value::Null),
        _ => Ok(Value::String(text(value, "lowercase")?.to_lowercase())),
    }
}

/// Trim whitespace from string
///
/// # Errors
///
/// Returns an error if the value cannot be represented as a string.
pub fn transform_trim(value: &Value) -> crate::Result<Value> {
    match value {
        Value::String(s) => Ok(Value::String(s.trim().to_string())),
        Value::Null => Ok(Value::Null),
        _ => Ok(Value::String(text(value, "trim")?)),
    }
}

/// Split string by delimiter and keep the indexed part
///
/// # Errors
///
/// Returns an error if the value is not a scalar or the index is out of bounds.
pub fn transform_split(value: &Value, delimiter: &str, index: usize) -> crate::Result<Value> {
    if value.is_null() {
        return Ok(Value::Null);
    }
    if delimiter.is_empty() {
        return Err(crate::Error::Transform("Split delimiter is empty".to_string()));
    }

    let input = text(value, "split")?;
    let parts: Vec<&str> = input.split(delimiter).collect();
    parts
        .get(index)
        .map(|part| Value::String((*part).to_string()))
        .ok_or_else(|| {
            crate::Error::Transform(format!(
                "Split index {index} out of bounds ({} parts)",
                parts.len()
            ))
        })
}

/// Wrap a scalar in a prefix and suffix
///
/// # Errors
///
/// Returns an error if the value cannot be represented as a string.
pub fn transform_affix(value: &Value, prefix: &str, suffix: &str) -> crate::Result<Value> {
    match value {
        Value::Null => Ok(Value::Null),
        _ => Ok(Value::String(format!(
            "{prefix}{}{suffix}",
            text(value, "concatenate")?
        ))),
    }
}

/// Substitute `default` for an absent or null value
#[must_use]
pub fn transform_default(value: Option<Value>, default: &Value) -> Option<Value> {
    match value {
        None | Some(Value::Null) => Some(default.clone()),
        present => present,
    }
}

/// Apply transforms left to right
///
/// # Errors
///
/// Returns the first error from any step.
pub fn transform_chain(value: Option<Value>, transforms: &[Transform]) -> crate::Result<Option<Value>> {
    transforms
        .iter()
        .try_fold(value, |current, step| apply_transform(current, step))
}
