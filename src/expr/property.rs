//! Property and operator model
//!
//! Typed column references and comparison operators with type-appropriate
//! defaults. Everything here is table-driven and stateless; the normalizer
//! and compiler build on these helpers.

use serde::{Deserialize, Serialize};

/// Data type of a column or builtin token
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PropertyType {
    /// Text column
    #[serde(rename = "string")]
    String,
    /// Numeric column (int, long, real, decimal)
    #[serde(rename = "number")]
    Number,
    /// Boolean column
    #[serde(rename = "boolean")]
    Boolean,
    /// Datetime column
    #[serde(rename = "dateTime")]
    DateTime,
    /// Bucket-width token, e.g. the `$__interval` macro
    #[serde(rename = "interval")]
    Interval,
}

impl PropertyType {
    /// Default comparison value for a freshly selected column of this type
    pub fn default_value(&self) -> OperatorValue {
        match self {
            PropertyType::Number => OperatorValue::Scalar(ScalarValue::Number(0.0)),
            PropertyType::Boolean => OperatorValue::Scalar(ScalarValue::Bool(false)),
            PropertyType::String | PropertyType::DateTime | PropertyType::Interval => {
                OperatorValue::Scalar(ScalarValue::String(String::new()))
            }
        }
    }

    /// Default comparison operator for a freshly selected column of this type
    pub fn default_operator(&self) -> OperatorName {
        OperatorName::Equal
    }
}

/// A typed reference to a column or builtin token
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Property {
    /// Column name, or the token itself for intervals
    pub name: String,
    /// Declared type
    #[serde(rename = "type")]
    pub property_type: PropertyType,
}

impl Property {
    /// Create a new property reference
    pub fn new(name: impl Into<String>, property_type: PropertyType) -> Self {
        Self {
            name: name.into(),
            property_type,
        }
    }

    /// The `$__interval` macro as an interval-typed property
    pub fn interval_macro() -> Self {
        Self::new("$__interval", PropertyType::Interval)
    }
}

impl Default for Property {
    fn default() -> Self {
        Self::new("", PropertyType::String)
    }
}

/// Comparison operators understood by the compiler
///
/// Serialized as the KQL token (`==`, `!contains`, ...) so saved queries
/// round-trip unchanged. Operators from newer plugin versions deserialize
/// as [`OperatorName::Unknown`] and are dropped by sanitization instead of
/// failing the whole document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OperatorName {
    #[serde(rename = "==")]
    Equal,
    #[serde(rename = "!=")]
    NotEqual,
    #[serde(rename = ">")]
    GreaterThan,
    #[serde(rename = "<")]
    LessThan,
    #[serde(rename = ">=")]
    GreaterOrEqual,
    #[serde(rename = "<=")]
    LessOrEqual,
    #[serde(rename = "contains")]
    Contains,
    #[serde(rename = "!contains")]
    NotContains,
    #[serde(rename = "startswith")]
    StartsWith,
    #[serde(rename = "!startswith")]
    NotStartsWith,
    #[serde(rename = "in")]
    In,
    #[serde(rename = "!in")]
    NotIn,
    #[serde(other, rename = "")]
    Unknown,
}

impl OperatorName {
    /// Whether this operator is valid for a column of the given type
    pub fn supports_type(&self, property_type: PropertyType) -> bool {
        use PropertyType::*;
        match self {
            OperatorName::Equal | OperatorName::NotEqual | OperatorName::In | OperatorName::NotIn => true,
            OperatorName::GreaterThan
            | OperatorName::LessThan
            | OperatorName::GreaterOrEqual
            | OperatorName::LessOrEqual => matches!(property_type, Number | DateTime),
            OperatorName::Contains
            | OperatorName::NotContains
            | OperatorName::StartsWith
            | OperatorName::NotStartsWith => matches!(property_type, String),
            OperatorName::Unknown => false,
        }
    }

    /// Whether this operator carries a list of values rather than a scalar
    pub fn is_multi_value(&self) -> bool {
        matches!(self, OperatorName::In | OperatorName::NotIn)
    }

    /// The KQL token for this operator, or `None` for unknown operators
    pub fn as_kql(&self) -> Option<&'static str> {
        Some(match self {
            OperatorName::Equal => "==",
            OperatorName::NotEqual => "!=",
            OperatorName::GreaterThan => ">",
            OperatorName::LessThan => "<",
            OperatorName::GreaterOrEqual => ">=",
            OperatorName::LessOrEqual => "<=",
            OperatorName::Contains => "contains",
            OperatorName::NotContains => "!contains",
            OperatorName::StartsWith => "startswith",
            OperatorName::NotStartsWith => "!startswith",
            OperatorName::In => "in",
            OperatorName::NotIn => "!in",
            OperatorName::Unknown => return None,
        })
    }
}

impl std::fmt::Display for OperatorName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_kql().unwrap_or(""))
    }
}

/// A single comparison value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ScalarValue {
    Bool(bool),
    Number(f64),
    String(String),
}

impl ScalarValue {
    /// Whether this scalar counts as "no value entered"
    pub fn is_empty(&self) -> bool {
        matches!(self, ScalarValue::String(s) if s.is_empty())
    }
}

impl std::fmt::Display for ScalarValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ScalarValue::Bool(b) => write!(f, "{}", b),
            ScalarValue::Number(n) => write!(f, "{}", n),
            ScalarValue::String(s) => write!(f, "{}", s),
        }
    }
}

impl From<&str> for ScalarValue {
    fn from(value: &str) -> Self {
        ScalarValue::String(value.to_string())
    }
}

impl From<f64> for ScalarValue {
    fn from(value: f64) -> Self {
        ScalarValue::Number(value)
    }
}

impl From<bool> for ScalarValue {
    fn from(value: bool) -> Self {
        ScalarValue::Bool(value)
    }
}

/// The right-hand side of a comparison: one scalar, or a list for `in`/`!in`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum OperatorValue {
    Scalar(ScalarValue),
    List(Vec<ScalarValue>),
}

impl OperatorValue {
    /// Whether this value counts as "no value entered"
    ///
    /// Empty strings and empty lists gate a filter out of compilation;
    /// `0` and `false` are real values.
    pub fn is_empty(&self) -> bool {
        match self {
            OperatorValue::Scalar(scalar) => scalar.is_empty(),
            OperatorValue::List(values) => values.is_empty(),
        }
    }
}

impl Default for OperatorValue {
    fn default() -> Self {
        OperatorValue::Scalar(ScalarValue::String(String::new()))
    }
}
