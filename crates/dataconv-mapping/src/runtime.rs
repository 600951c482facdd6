//! Mapping runtime
//!
//! Runs every setting of a mapping in one direction and collects the
//! settings that failed.

use dataconv_record::Value;
use std::fmt;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::convert::{convert_item, convert_item_in_place};
use crate::dsl::MappingDefinition;
use crate::extensions::ExtensionRegistry;
use crate::setting::{Direction, Mapping, Route, Setting};
use crate::transforms::compile;

/// One setting that could not be applied
#[derive(Debug, Clone, PartialEq)]
pub struct SettingFailure {
    /// Position of the setting in its mapping
    pub index: usize,

    /// Source path in the direction that was run
    pub from_path: String,

    /// Destination path in the direction that was run
    pub to_path: String,

    pub error: crate::Error,
}

impl SettingFailure {
    pub(crate) fn new(index: usize, route: Route<'_>, error: crate::Error) -> Self {
        Self {
            index,
            from_path: route.from.to_string(),
            to_path: route.to.to_string(),
            error,
        }
    }
}

impl fmt::Display for SettingFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "setting #{}: {} => {}: {}",
            self.index, self.from_path, self.to_path, self.error
        )
    }
}

/// A mapping run in which at least one setting failed
///
/// Settings that succeeded stay applied to the destination record.
#[derive(Error, Debug, Clone, PartialEq)]
#[error("mapping '{mapping}' ({direction}) failed for {} setting(s)", .failures.len())]
pub struct MappingFailure {
    mapping: String,
    direction: Direction,
    failures: Vec<SettingFailure>,
}

impl MappingFailure {
    pub(crate) fn check(
        mapping: &str,
        direction: Direction,
        failures: Vec<SettingFailure>,
    ) -> Result<(), Self> {
        if failures.is_empty() {
            Ok(())
        } else {
            Err(Self {
                mapping: mapping.to_string(),
                direction,
                failures,
            })
        }
    }

    #[must_use]
    pub fn mapping(&self) -> &str {
        &self.mapping
    }

    #[must_use]
    pub fn direction(&self) -> Direction {
        self.direction
    }

    #[must_use]
    pub fn failures(&self) -> &[SettingFailure] {
        &self.failures
    }
}

/// Runtime for executing mappings
#[derive(Debug, Default)]
pub struct MappingRuntime {
    /// Extension registry for custom transform functions
    extensions: ExtensionRegistry,
}

impl MappingRuntime {
    /// Create a new mapping runtime
    #[must_use]
    pub fn new() -> Self {
        Self {
            extensions: ExtensionRegistry::new(),
        }
    }

    /// Create a runtime with an extension registry
    #[must_use]
    pub fn with_extensions(extensions: ExtensionRegistry) -> Self {
        Self { extensions }
    }

    /// Get extension registry
    #[must_use]
    pub fn extensions(&self) -> &ExtensionRegistry {
        &self.extensions
    }

    /// Compile a parsed definition into a runnable mapping
    ///
    /// Extension transforms are looked up now, so a definition naming an
    /// unknown function fails here rather than halfway through a run.
    ///
    /// # Errors
    ///
    /// Returns an error when a transform references a missing extension function.
    pub fn load(&self, definition: &MappingDefinition) -> crate::Result<Mapping> {
        let mut mapping = Mapping::new(&definition.name);
        for item in &definition.settings {
            let mut setting = Setting::new(&item.side_a, &item.side_b);
            if let Some(transform) = &item.a_to_b {
                setting = setting.with_a_to_b(compile(transform, &self.extensions)?);
            }
            if let Some(transform) = &item.b_to_a {
                setting = setting.with_b_to_a(compile(transform, &self.extensions)?);
            }
            mapping.push(setting);
        }
        debug!(mapping = %definition.name, settings = mapping.len(), "loaded mapping");
        Ok(mapping)
    }

    /// Execute a mapping between two records
    ///
    /// With [`Direction::AToB`] side A is read and side B written; with
    /// [`Direction::BToA`] the roles swap. Every setting is attempted even
    /// after a failure, and nothing is rolled back.
    ///
    /// # Errors
    ///
    /// Returns a [`MappingFailure`] listing each setting that failed.
    pub fn execute(
        &self,
        mapping: &Mapping,
        side_a: &mut Value,
        side_b: &mut Value,
        direction: Direction,
    ) -> Result<(), MappingFailure> {
        let (from, to): (&Value, &mut Value) = match direction {
            Direction::AToB => (&*side_a, side_b),
            Direction::BToA => (&*side_b, side_a),
        };
        run_settings(mapping, direction, |route| {
            convert_item(route.from, from, route.to, to, route.transform)
        })
    }

    /// Execute a mapping whose two sides are the same record
    ///
    /// Later settings observe the writes of earlier ones.
    ///
    /// # Errors
    ///
    /// Returns a [`MappingFailure`] listing each setting that failed.
    pub fn execute_in_place(
        &self,
        mapping: &Mapping,
        record: &mut Value,
        direction: Direction,
    ) -> Result<(), MappingFailure> {
        run_settings(mapping, direction, |route| {
            convert_item_in_place(route.from, route.to, record, route.transform)
        })
    }
}

fn run_settings(
    mapping: &Mapping,
    direction: Direction,
    mut convert: impl FnMut(Route<'_>) -> crate::Result<()>,
) -> Result<(), MappingFailure> {
    let mut failures = Vec::new();

    for (index, setting) in mapping.settings().iter().enumerate() {
        let route = setting.route(direction);
        if let Err(error) = convert(route) {
            warn!(
                mapping = mapping.name(),
                index,
                from = route.from,
                to = route.to,
                %error,
                "setting failed"
            );
            failures.push(SettingFailure::new(index, route, error));
        }
    }

    info!(
        mapping = mapping.name(),
        %direction,
        settings = mapping.len(),
        failed = failures.len(),
        "mapping executed"
    );
    MappingFailure::check(mapping.name(), direction, failures)
}
