//! Parameter - Values supplied to a stack at deploy time
//!
//! Constraints are declarative: they travel with the template and the engine
//! enforces them. `Parameter::check` applies the same rules locally so the
//! CLI can reject bad input before calling the engine.

use regex::Regex;
use thiserror::Error;

/// Declared type of a parameter
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParameterType {
    String,
    Number,
    /// Name of an existing EC2 key pair
    KeyPairName,
}

impl ParameterType {
    /// Engine-facing type name
    pub fn type_name(&self) -> &'static str {
        match self {
            ParameterType::String => "String",
            ParameterType::Number => "Number",
            ParameterType::KeyPairName => "AWS::EC2::KeyPair::KeyName",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ParameterError {
    #[error("Parameter '{name}' has no value and no default")]
    Missing { name: String },

    #[error("Parameter '{name}' value '{value}' is not one of: {}", allowed.join(", "))]
    NotAllowed {
        name: String,
        value: String,
        allowed: Vec<String>,
    },

    #[error("Parameter '{name}' value '{value}' does not match pattern {pattern}")]
    PatternMismatch {
        name: String,
        value: String,
        pattern: String,
    },

    #[error("Parameter '{name}' declares an invalid pattern: {message}")]
    InvalidPattern { name: String, message: String },

    #[error("Parameter '{name}' value '{value}' is not a number")]
    NotANumber { name: String, value: String },

    #[error("Unknown parameter '{name}'")]
    Unknown { name: String },
}

/// A declared stack parameter
#[derive(Debug, Clone, PartialEq)]
pub struct Parameter {
    pub name: String,
    pub param_type: ParameterType,
    pub description: Option<String>,
    pub default: Option<String>,
    pub allowed_values: Vec<String>,
    pub allowed_pattern: Option<String>,
    pub constraint_description: Option<String>,
}

impl Parameter {
    pub fn new(name: impl Into<String>, param_type: ParameterType) -> Self {
        Self {
            name: name.into(),
            param_type,
            description: None,
            default: None,
            allowed_values: Vec::new(),
            allowed_pattern: None,
            constraint_description: None,
        }
    }

    pub fn with_description(mut self, desc: impl Into<String>) -> Self {
        self.description = Some(desc.into());
        self
    }

    pub fn with_default(mut self, value: impl Into<String>) -> Self {
        self.default = Some(value.into());
        self
    }

    pub fn with_allowed_values<I, S>(mut self, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.allowed_values = values.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_allowed_pattern(mut self, pattern: impl Into<String>) -> Self {
        self.allowed_pattern = Some(pattern.into());
        self
    }

    pub fn with_constraint_description(mut self, desc: impl Into<String>) -> Self {
        self.constraint_description = Some(desc.into());
        self
    }

    /// Resolve the effective value of this parameter and check its constraints
    ///
    /// The pattern must match the whole value, as the engine requires.
    pub fn check(&self, supplied: Option<&str>) -> Result<String, ParameterError> {
        let value = match supplied.or(self.default.as_deref()) {
            Some(v) => v.to_string(),
            None => {
                return Err(ParameterError::Missing {
                    name: self.name.clone(),
                });
            }
        };

        if self.param_type == ParameterType::Number && !is_finite_number(&value) {
            return Err(ParameterError::NotANumber {
                name: self.name.clone(),
                value,
            });
        }

        if !self.allowed_values.is_empty() && !self.allowed_values.contains(&value) {
            return Err(ParameterError::NotAllowed {
                name: self.name.clone(),
                value,
                allowed: self.allowed_values.clone(),
            });
        }

        if let Some(pattern) = &self.allowed_pattern {
            let anchored = format!("^(?:{})$", pattern);
            let re = Regex::new(&anchored).map_err(|e| ParameterError::InvalidPattern {
                name: self.name.clone(),
                message: e.to_string(),
            })?;
            if !re.is_match(&value) {
                return Err(ParameterError::PatternMismatch {
                    name: self.name.clone(),
                    value,
                    pattern: pattern.clone(),
                });
            }
        }

        Ok(value)
    }
}

/// Decimal literal with an optional exponent that stays finite as `f64`
fn is_finite_number(value: &str) -> bool {
    value
        .chars()
        .all(|c| c.is_ascii_digit() || matches!(c, '+' | '-' | '.' | 'e' | 'E'))
        && value.parse::<f64>().is_ok_and(f64::is_finite)
}

#[cfg(test)]
mod tests {
    use super::*;

    const CIDR_PATTERN: &str = r"^([0-9]{1,3}\.){3}[0-9]{1,3}/[0-9]{1,2}$";

    fn size_class() -> Parameter {
        Parameter::new("InstanceType", ParameterType::String)
            .with_allowed_values(["t2.micro", "t2.small"])
            .with_default("t2.micro")
    }

    #[test]
    fn default_applies_when_value_omitted() {
        assert_eq!(size_class().check(None).unwrap(), "t2.micro");
        assert_eq!(size_class().check(Some("t2.small")).unwrap(), "t2.small");
    }

    #[test]
    fn value_outside_allowed_set_is_rejected() {
        let err = size_class().check(Some("m5.large")).unwrap_err();
        assert!(matches!(err, ParameterError::NotAllowed { .. }));
        assert!(err.to_string().contains("t2.micro, t2.small"));
    }

    #[test]
    fn missing_value_without_default_is_rejected() {
        let key = Parameter::new("KeyPair", ParameterType::KeyPairName);
        assert_eq!(
            key.check(None),
            Err(ParameterError::Missing {
                name: "KeyPair".to_string()
            })
        );
        // Existence of the key pair is the engine's concern
        assert_eq!(key.check(Some("my-key")).unwrap(), "my-key");
    }

    #[test]
    fn pattern_must_match_whole_value() {
        let ip = Parameter::new("YourIp", ParameterType::String).with_allowed_pattern(CIDR_PATTERN);
        assert!(ip.check(Some("203.0.113.5/32")).is_ok());
        assert!(matches!(
            ip.check(Some("203.0.113.5")),
            Err(ParameterError::PatternMismatch { .. })
        ));
        assert!(ip.check(Some("203.0.113.5/32 ")).is_err());

        let unanchored =
            Parameter::new("Digits", ParameterType::String).with_allowed_pattern("[0-9]+");
        assert!(unanchored.check(Some("123")).is_ok());
        assert!(unanchored.check(Some("123abc")).is_err());
    }

    #[test]
    fn invalid_pattern_is_reported() {
        let p = Parameter::new("Broken", ParameterType::String).with_allowed_pattern("([0-9]");
        assert!(matches!(
            p.check(Some("1")),
            Err(ParameterError::InvalidPattern { .. })
        ));
    }

    #[test]
    fn number_parameters_must_parse() {
        let p = Parameter::new("Count", ParameterType::Number);
        assert!(p.check(Some("2")).is_ok());
        assert!(matches!(
            p.check(Some("two")),
            Err(ParameterError::NotANumber { .. })
        ));
    }

    #[test]
    fn number_parameters_must_be_finite_decimals() {
        let p = Parameter::new("Count", ParameterType::Number);
        assert!(p.check(Some("-1.5")).is_ok());
        assert!(p.check(Some("2e3")).is_ok());
        for value in ["NaN", "inf", "-infinity", "1e400", "0x10", ""] {
            assert!(
                matches!(p.check(Some(value)), Err(ParameterError::NotANumber { .. })),
                "{} should be rejected",
                value
            );
        }
    }

    #[test]
    fn type_names_match_engine_types() {
        assert_eq!(ParameterType::String.type_name(), "String");
        assert_eq!(
            ParameterType::KeyPairName.type_name(),
            "AWS::EC2::KeyPair::KeyName"
        );
    }
}
