//! Mapping DSL
//!
//! Declares settings in YAML:
//!
//! ```yaml
//! name: contacts
//! direction: a_to_b
//! settings:
//!   - side_a: name
//!     side_b: person.full_name
//!     a_to_b: { op: uppercase }
//!   - side_a: id
//!     side_b: lines..owner
//! ```

use dataconv_record::Value;
use serde::{Deserialize, Serialize};

use crate::setting::Direction;

/// A complete mapping definition
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MappingDefinition {
    /// Mapping name
    pub name: String,

    /// Direction used when the caller does not choose one
    #[serde(default)]
    pub direction: Direction,

    /// Path pairs, applied in order
    #[serde(default)]
    pub settings: Vec<SettingDefinition>,
}

/// One declared path pair
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SettingDefinition {
    pub side_a: String,
    pub side_b: String,

    /// Applied to values copied from side A to side B
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub a_to_b: Option<Transform>,

    /// Applied to values copied from side B to side A
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub b_to_a: Option<Transform>,
}

/// Transform operation to apply to a copied value
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Transform {
    /// Convert to uppercase
    Uppercase,

    /// Convert to lowercase
    Lowercase,

    /// Trim whitespace
    Trim,

    /// Substitute a value when the source is absent or null
    Default { value: Value },

    /// Split string and keep one part
    Split { delimiter: String, index: usize },

    /// Prepend text
    Prefix { value: String },

    /// Append text
    Suffix { value: String },

    /// Chain multiple transforms
    Chain { transforms: Vec<Transform> },

    /// Call a function registered in an extension
    Extension {
        extension: String,
        function: String,
        #[serde(default)]
        args: Vec<Value>,
    },
}

/// DSL Parser
pub struct MappingDsl;

/// Parse error type
#[derive(Debug, Clone, PartialEq)]
pub struct ParseError {
    pub message: String,
    pub line: Option<usize>,
    pub column: Option<usize>,
}

impl std::fmt::Display for ParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)?;
        if let (Some(line), Some(col)) = (self.line, self.column) {
            write!(f, " at line {line}, column {col}")?;
        }
        Ok(())
    }
}

impl std::error::Error for ParseError {}

impl From<ParseError> for crate::Error {
    fn from(error: ParseError) -> Self {
        crate::Error::Parse(error.to_string())
    }
}

impl MappingDsl {
    /// Parse a mapping definition from YAML
    ///
    /// # Errors
    ///
    /// Returns an error when YAML parsing fails.
    pub fn parse(yaml: &str) -> Result<MappingDefinition, ParseError> {
        serde_yaml::from_str(yaml).map_err(|e| ParseError {
            message: format!("Failed to parse DSL: {e}"),
            line: e.location().map(|l| l.line()),
            column: e.location().map(|l| l.column()),
        })
    }

    /// Parse a mapping definition from a file
    ///
    /// # Errors
    ///
    /// Returns an error when the file cannot be read or parsed.
    pub fn parse_file(path: &std::path::Path) -> Result<MappingDefinition, ParseError> {
        let content = std::fs::read_to_string(path).map_err(|e| ParseError {
            message: format!("Failed to read file {}: {e}", path.display()),
            line: None,
            column: None,
        })?;
        Self::parse(&content)
    }

    /// Serialize a mapping definition to YAML
    ///
    /// # Errors
    ///
    /// Returns an error when serialization fails.
    pub fn to_yaml(definition: &MappingDefinition) -> Result<String, ParseError> {
        serde_yaml::to_string(definition).map_err(|e| ParseError {
            message: format!("Failed to serialize: {e}"),
            line: None,
            column: None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_simple_mapping() {
        let dsl = r"
name: contacts
settings:
  - side_a: name
    side_b: person.full_name
  - side_a: id
    side_b: lines..owner
";

        let definition = MappingDsl::parse(dsl).unwrap();
        assert_eq!(definition.name, "contacts");
        assert_eq!(definition.direction, Direction::AToB);
        assert_eq!(definition.settings.len(), 2);
        assert_eq!(definition.settings[1].side_b, "lines..owner");
        assert!(definition.settings[0].a_to_b.is_none());
        assert!(definition.settings[0].b_to_a.is_none());
    }

    #[test]
    fn test_parse_direction() {
        let dsl = "name: back\ndirection: b_to_a\nsettings: []\n";
        let definition = MappingDsl::parse(dsl).unwrap();
        assert_eq!(definition.direction, Direction::BToA);
    }

    #[test]
    fn test_parse_transforms_per_direction() {
        let dsl = r#"
name: with_transforms
settings:
  - side_a: b
    side_b: B
    a_to_b: { op: uppercase }
    b_to_a:
      op: chain
      transforms:
        - op: trim
        - op: default
          value: "unknown"
        - op: split
          delimiter: "-"
          index: 0
"#;

        let definition = MappingDsl::parse(dsl).unwrap();
        let setting = &definition.settings[0];
        assert_eq!(setting.a_to_b, Some(Transform::Uppercase));

        match setting.b_to_a.as_ref().unwrap() {
            Transform::Chain { transforms } => {
                assert_eq!(transforms.len(), 3);
                assert_eq!(transforms[0], Transform::Trim);
                assert_eq!(
                    transforms[1],
                    Transform::Default {
                        value: Value::from("unknown")
                    }
                );
                assert_eq!(
                    transforms[2],
                    Transform::Split {
                        delimiter: "-".to_string(),
                        index: 0
                    }
                );
            }
            other => panic!("Expected Chain transform, got {other:?}"),
        }
    }

    #[test]
    fn test_parse_default_keeps_value_type() {
        let dsl = r"
name: defaults
settings:
  - side_a: qty
    side_b: quantity
    a_to_b: { op: default, value: 0 }
";
        let definition = MappingDsl::parse(dsl).unwrap();
        assert_eq!(
            definition.settings[0].a_to_b,
            Some(Transform::Default {
                value: Value::Integer(0)
            })
        );
    }

    #[test]
    fn test_parse_extension_transform() {
        let dsl = r"
name: ext
settings:
  - side_a: a
    side_b: b
    a_to_b:
      op: extension
      extension: math_utils
      function: multiply
      args: [3]
";
        let definition = MappingDsl::parse(dsl).unwrap();
        assert_eq!(
            definition.settings[0].a_to_b,
            Some(Transform::Extension {
                extension: "math_utils".to_string(),
                function: "multiply".to_string(),
                args: vec![Value::Integer(3)],
            })
        );
    }

    #[test]
    fn test_dsl_error_handling() {
        let dsl = "name: broken\nsettings:\n  - side_a: [unclosed\n";
        let err = MappingDsl::parse(dsl).unwrap_err();
        assert!(err.message.starts_with("Failed to parse DSL"));
        assert!(err.line.is_some());
    }

    #[test]
    fn test_dsl_missing_required_field() {
        let dsl = "name: partial\nsettings:\n  - side_a: a\n";
        let err = MappingDsl::parse(dsl).unwrap_err();
        assert!(err.message.contains("side_b"));
    }

    #[test]
    fn test_dsl_unknown_transform() {
        let dsl = "name: x\nsettings:\n  - side_a: a\n    side_b: b\n    a_to_b: { op: explode }\n";
        assert!(MappingDsl::parse(dsl).is_err());
    }

    #[test]
    fn test_serialize_roundtrip() {
        let definition = MappingDefinition {
            name: "roundtrip".to_string(),
            direction: Direction::BToA,
            settings: vec![SettingDefinition {
                side_a: "a..b".to_string(),
                side_b: "c..d".to_string(),
                a_to_b: Some(Transform::Prefix {
                    value: "#".to_string(),
                }),
                b_to_a: None,
            }],
        };

        let yaml = MappingDsl::to_yaml(&definition).unwrap();
        assert!(!yaml.contains("b_to_a:"));
        let parsed = MappingDsl::parse(&yaml).unwrap();
        assert_eq!(parsed, definition);
    }
}
