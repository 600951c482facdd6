//! Settings and compiled mappings

use crate::convert::TransferKind;
use crate::path::segment;
use crate::runtime::{MappingFailure, SettingFailure};
use dataconv_record::Value;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

type TransformFn = dyn Fn(Option<Value>) -> crate::Result<Option<Value>> + Send + Sync;

/// A one-argument value transform applied while copying
///
/// The argument is `None` when the source location is absent, which lets a
/// transform turn a missing value into a default. Returning `None` clears
/// the destination.
#[derive(Clone)]
pub struct ValueTransform {
    func: Arc<TransformFn>,
}

impl ValueTransform {
    pub fn new(
        func: impl Fn(Option<Value>) -> crate::Result<Option<Value>> + Send + Sync + 'static,
    ) -> Self {
        Self {
            func: Arc::new(func),
        }
    }

    /// Wrap an infallible function of a present value; absent values pass through untouched
    pub fn map(func: impl Fn(Value) -> Value + Send + Sync + 'static) -> Self {
        Self::new(move |value| Ok(value.map(&func)))
    }

    /// Apply the transform
    ///
    /// # Errors
    ///
    /// Returns whatever error the wrapped function reports.
    pub fn apply(&self, value: Option<Value>) -> crate::Result<Option<Value>> {
        (self.func)(value)
    }
}

impl fmt::Debug for ValueTransform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ValueTransform(..)")
    }
}

/// Which side a mapping reads from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    /// Side A is the source, side B the destination
    #[default]
    AToB,

    /// Side B is the source, side A the destination
    BToA,
}

impl Direction {
    #[must_use]
    pub fn from_reverse(reverse: bool) -> Self {
        if reverse { Self::BToA } else { Self::AToB }
    }

    #[must_use]
    pub fn is_reverse(self) -> bool {
        self == Self::BToA
    }

    #[must_use]
    pub fn reversed(self) -> Self {
        match self {
            Self::AToB => Self::BToA,
            Self::BToA => Self::AToB,
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AToB => f.write_str("A => B"),
            Self::BToA => f.write_str("B => A"),
        }
    }
}

/// One declared path pair with optional per-direction transforms
#[derive(Debug, Clone)]
pub struct Setting {
    side_a: String,
    side_b: String,
    a_to_b: Option<ValueTransform>,
    b_to_a: Option<ValueTransform>,
}

/// The source path, destination path and transform of a setting in one direction
#[derive(Debug, Clone, Copy)]
pub struct Route<'a> {
    pub from: &'a str,
    pub to: &'a str,
    pub transform: Option<&'a ValueTransform>,
}

impl Setting {
    pub fn new(side_a: impl Into<String>, side_b: impl Into<String>) -> Self {
        Self {
            side_a: side_a.into(),
            side_b: side_b.into(),
            a_to_b: None,
            b_to_a: None,
        }
    }

    /// Transform applied when copying from side A to side B
    #[must_use]
    pub fn with_a_to_b(mut self, transform: ValueTransform) -> Self {
        self.a_to_b = Some(transform);
        self
    }

    /// Transform applied when copying from side B to side A
    #[must_use]
    pub fn with_b_to_a(mut self, transform: ValueTransform) -> Self {
        self.b_to_a = Some(transform);
        self
    }

    #[must_use]
    pub fn side_a(&self) -> &str {
        &self.side_a
    }

    #[must_use]
    pub fn side_b(&self) -> &str {
        &self.side_b
    }

    #[must_use]
    pub fn route(&self, direction: Direction) -> Route<'_> {
        match direction {
            Direction::AToB => Route {
                from: &self.side_a,
                to: &self.side_b,
                transform: self.a_to_b.as_ref(),
            },
            Direction::BToA => Route {
                from: &self.side_b,
                to: &self.side_a,
                transform: self.b_to_a.as_ref(),
            },
        }
    }

    /// Check wildcard parity for one direction without touching any record
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::ParityViolation`] when the paths cannot be paired.
    pub fn validate(&self, direction: Direction) -> crate::Result<TransferKind> {
        let route = self.route(direction);
        TransferKind::classify(&segment(route.from), &segment(route.to))
    }
}

/// A named, ordered list of settings
#[derive(Debug, Clone, Default)]
pub struct Mapping {
    name: String,
    settings: Vec<Setting>,
}

impl Mapping {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            settings: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_setting(mut self, setting: Setting) -> Self {
        self.settings.push(setting);
        self
    }

    pub fn push(&mut self, setting: Setting) {
        self.settings.push(setting);
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn settings(&self) -> &[Setting] {
        &self.settings
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.settings.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.settings.is_empty()
    }

    /// Check every setting for one direction
    ///
    /// # Errors
    ///
    /// Returns every setting that would fail parity before touching a record.
    pub fn validate(&self, direction: Direction) -> Result<(), MappingFailure> {
        let failures: Vec<SettingFailure> = self
            .settings
            .iter()
            .enumerate()
            .filter_map(|(index, setting)| {
                setting
                    .validate(direction)
                    .err()
                    .map(|error| SettingFailure::new(index, setting.route(direction), error))
            })
            .collect();

        MappingFailure::check(&self.name, direction, failures)
    }
}

impl FromIterator<Setting> for Mapping {
    fn from_iter<I: IntoIterator<Item = Setting>>(iter: I) -> Self {
        Self {
            name: String::new(),
            settings: iter.into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_route_picks_paths_and_transform_by_direction() {
        let setting = Setting::new("a", "B")
            .with_a_to_b(ValueTransform::map(|_| Value::from("forward")));

        let forward = setting.route(Direction::AToB);
        assert_eq!((forward.from, forward.to), ("a", "B"));
        assert!(forward.transform.is_some());

        let backward = setting.route(Direction::BToA);
        assert_eq!((backward.from, backward.to), ("B", "a"));
        assert!(backward.transform.is_none());
    }

    #[test]
    fn test_value_transform_map_skips_absent() {
        let upper = ValueTransform::map(|v| {
            Value::from(v.as_string().unwrap_or_default().to_uppercase())
        });
        assert_eq!(upper.apply(None).unwrap(), None);
        assert_eq!(
            upper.apply(Some(Value::from("x"))).unwrap(),
            Some(Value::from("X"))
        );
    }

    #[test]
    fn test_direction_from_reverse() {
        assert_eq!(Direction::from_reverse(false), Direction::AToB);
        assert_eq!(Direction::from_reverse(true), Direction::BToA);
        assert!(Direction::BToA.is_reverse());
        assert_eq!(Direction::AToB.reversed(), Direction::BToA);
        assert_eq!(Direction::default(), Direction::AToB);
    }

    #[test]
    fn test_validate_reports_parity_per_direction() {
        let mapping = Mapping::new("m")
            .with_setting(Setting::new("x", "y"))
            .with_setting(Setting::new("a..b", "c..d..e"));

        let failure = mapping.validate(Direction::AToB).unwrap_err();
        assert_eq!(failure.failures().len(), 1);
        assert_eq!(failure.failures()[0].index, 1);
        assert!(mapping.validate(Direction::BToA).is_err());
    }

    #[test]
    fn test_validate_one_to_many_only_checks_multi_subpath_sources() {
        let mapping = Mapping::new("fan").with_setting(Setting::new("id", "lines..owner"));
        assert!(mapping.validate(Direction::AToB).is_ok());
        assert!(mapping.validate(Direction::BToA).is_err());
    }
}
