//! Visual query expression tree
//!
//! Defines the tagged-union node types for the visual query representation:
//! property references, comparisons, aggregations, groupings, and boolean
//! containers. The tree is the persisted form of a visual query; it is
//! serialized with a `type` discriminant per node (`property`, `operator`,
//! `reduce`, `groupBy`, `and`, `or`) so saved queries round-trip through
//! the host's storage unchanged.
//!
//! Trees are rebuilt, not mutated: every edit produces a new tree with the
//! changed node replaced and unaffected siblings preserved.

use serde::{Deserialize, Serialize};

use super::property::{OperatorName, OperatorValue, Property, PropertyType, ScalarValue};

/// A comparison operator together with its value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Operator {
    /// Operator token, e.g. `==` or `!contains`
    pub name: OperatorName,
    /// Right-hand side; a list for `in`/`!in`, a scalar otherwise
    #[serde(default)]
    pub value: OperatorValue,
}

impl Operator {
    /// Create an operator with a value
    pub fn new(name: OperatorName, value: OperatorValue) -> Self {
        Self { name, value }
    }
}

impl Default for Operator {
    fn default() -> Self {
        Self {
            name: OperatorName::Equal,
            value: OperatorValue::default(),
        }
    }
}

/// A bare column reference node
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct PropertyExpression {
    pub property: Property,
}

impl PropertyExpression {
    pub fn new(property: Property) -> Self {
        Self { property }
    }
}

/// A single filter condition: `<column> <operator> <value>`
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct OperatorExpression {
    pub property: Property,
    pub operator: Operator,
}

impl OperatorExpression {
    pub fn new(property: Property, operator: Operator) -> Self {
        Self { property, operator }
    }
}

/// Aggregation functions available in the value-column section
///
/// Functions from newer plugin versions deserialize as `Unknown` and are
/// skipped at compile time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReduceFunction {
    Count,
    Sum,
    Avg,
    Min,
    Max,
    Percentile,
    Dcount,
    Stdev,
    #[serde(other, rename = "")]
    Unknown,
}

impl ReduceFunction {
    /// The KQL function name, or `None` for unknown functions
    pub fn as_kql(&self) -> Option<&'static str> {
        Some(match self {
            ReduceFunction::Count => "count",
            ReduceFunction::Sum => "sum",
            ReduceFunction::Avg => "avg",
            ReduceFunction::Min => "min",
            ReduceFunction::Max => "max",
            ReduceFunction::Percentile => "percentile",
            ReduceFunction::Dcount => "dcount",
            ReduceFunction::Stdev => "stdev",
            ReduceFunction::Unknown => return None,
        })
    }
}

impl std::fmt::Display for ReduceFunction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_kql().unwrap_or(""))
    }
}

/// An aggregation over a column, with an optional output alias
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReduceExpression {
    pub property: Property,
    pub reduce: ReduceFunction,
    /// Extra call arguments for parameterized functions (e.g. percentile)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parameters: Option<Vec<ScalarValue>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alias: Option<String>,
}

impl ReduceExpression {
    pub fn new(property: Property, reduce: ReduceFunction) -> Self {
        Self {
            property,
            reduce,
            parameters: None,
            alias: None,
        }
    }

    /// Add function parameters
    pub fn with_parameters(mut self, parameters: Vec<ScalarValue>) -> Self {
        self.parameters = Some(parameters);
        self
    }

    /// Add an output alias
    pub fn with_alias(mut self, alias: impl Into<String>) -> Self {
        self.alias = Some(alias.into());
        self
    }

    /// The output column name: the alias, or `<fn>_<column>`
    pub fn display_alias(&self) -> String {
        match &self.alias {
            Some(alias) if !alias.is_empty() => alias.clone(),
            _ => format!("{}_{}", self.reduce, self.property.name),
        }
    }
}

/// A group key, with a bucket width for datetime keys
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupByExpression {
    pub property: Property,
    /// Present only for datetime group keys; names the bucket width
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub interval: Option<Property>,
}

impl GroupByExpression {
    pub fn new(property: Property) -> Self {
        Self {
            property,
            interval: None,
        }
    }

    /// Add a bucket-width interval
    pub fn with_interval(mut self, interval: Property) -> Self {
        self.interval = Some(interval);
        self
    }
}

/// Boolean combinator for an array of sub-expressions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Combinator {
    And,
    Or,
}

impl std::fmt::Display for Combinator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Combinator::And => write!(f, "and"),
            Combinator::Or => write!(f, "or"),
        }
    }
}

/// An ordered list of sub-expressions joined by one boolean combinator
///
/// There are no per-pair operators; the single combinator applies to the
/// whole list, and insertion order is preserved.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArrayExpression {
    #[serde(rename = "type")]
    pub combinator: Combinator,
    #[serde(default)]
    pub expressions: Vec<Expression>,
}

impl ArrayExpression {
    /// An and-combined list
    pub fn and(expressions: Vec<Expression>) -> Self {
        Self {
            combinator: Combinator::And,
            expressions,
        }
    }

    /// An or-combined list
    pub fn or(expressions: Vec<Expression>) -> Self {
        Self {
            combinator: Combinator::Or,
            expressions,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.expressions.is_empty()
    }
}

impl Default for ArrayExpression {
    fn default() -> Self {
        ArrayExpression::and(Vec::new())
    }
}

/// A node of the visual query tree
///
/// Closed sum type; the compiler dispatches via exhaustive match.
#[derive(Debug, Clone, PartialEq)]
pub enum Expression {
    Property(PropertyExpression),
    Operator(OperatorExpression),
    Reduce(ReduceExpression),
    GroupBy(GroupByExpression),
    Array(ArrayExpression),
}

impl Expression {
    /// The serialized `type` discriminant of this node
    pub fn tag(&self) -> &'static str {
        match self {
            Expression::Property(_) => "property",
            Expression::Operator(_) => "operator",
            Expression::Reduce(_) => "reduce",
            Expression::GroupBy(_) => "groupBy",
            Expression::Array(array) => match array.combinator {
                Combinator::And => "and",
                Combinator::Or => "or",
            },
        }
    }

    pub fn as_operator(&self) -> Option<&OperatorExpression> {
        match self {
            Expression::Operator(expr) => Some(expr),
            _ => None,
        }
    }

    pub fn as_reduce(&self) -> Option<&ReduceExpression> {
        match self {
            Expression::Reduce(expr) => Some(expr),
            _ => None,
        }
    }

    pub fn as_group_by(&self) -> Option<&GroupByExpression> {
        match self {
            Expression::GroupBy(expr) => Some(expr),
            _ => None,
        }
    }
}

// The array combinator doubles as the node's `type` discriminant, so the
// enum cannot use a derived internal tag; (de)serialization goes through a
// Value and dispatches on the tag by hand.
impl Serialize for Expression {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        use serde::ser::Error;

        let payload = match self {
            Expression::Array(array) => serde_json::to_value(array),
            Expression::Property(expr) => serde_json::to_value(expr),
            Expression::Operator(expr) => serde_json::to_value(expr),
            Expression::Reduce(expr) => serde_json::to_value(expr),
            Expression::GroupBy(expr) => serde_json::to_value(expr),
        };
        let mut value = payload.map_err(S::Error::custom)?;

        if !matches!(self, Expression::Array(_)) {
            if let serde_json::Value::Object(map) = &mut value {
                map.insert("type".to_string(), serde_json::Value::from(self.tag()));
            }
        }

        value.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Expression {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        use serde::de::Error;

        let value = serde_json::Value::deserialize(deserializer)?;
        let tag = value
            .get("type")
            .and_then(serde_json::Value::as_str)
            .unwrap_or_default()
            .to_string();

        let expression = match tag.as_str() {
            "property" => Expression::Property(
                PropertyExpression::deserialize(value).map_err(D::Error::custom)?,
            ),
            "operator" => Expression::Operator(
                OperatorExpression::deserialize(value).map_err(D::Error::custom)?,
            ),
            "reduce" => {
                Expression::Reduce(ReduceExpression::deserialize(value).map_err(D::Error::custom)?)
            }
            "groupBy" => Expression::GroupBy(
                GroupByExpression::deserialize(value).map_err(D::Error::custom)?,
            ),
            "and" | "or" => {
                Expression::Array(ArrayExpression::deserialize(value).map_err(D::Error::custom)?)
            }
            other => {
                return Err(D::Error::custom(format!(
                    "unrecognized expression type `{}`",
                    other
                )))
            }
        };

        Ok(expression)
    }
}

/// The root of a visual query
///
/// The three sections are always present; a missing section deserializes
/// to an empty and-combined array.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct QueryExpression {
    /// Source table reference
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub from: Option<PropertyExpression>,
    /// Filter conditions
    #[serde(rename = "where", default)]
    pub where_clause: ArrayExpression,
    /// Aggregations (value columns)
    #[serde(default)]
    pub reduce: ArrayExpression,
    /// Group keys
    #[serde(rename = "groupBy", default)]
    pub group_by: ArrayExpression,
}

impl QueryExpression {
    /// A query expression reading from the given table, with empty sections
    pub fn for_table(table: impl Into<String>) -> Self {
        Self {
            from: Some(PropertyExpression::new(Property::new(
                table,
                PropertyType::String,
            ))),
            ..Default::default()
        }
    }

    /// The source table name, if one is selected
    pub fn table(&self) -> Option<&str> {
        match &self.from {
            Some(from) if !from.property.name.is_empty() => Some(from.property.name.as_str()),
            _ => None,
        }
    }
}

/// How query results should be shaped by the host
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ResultFormat {
    #[serde(rename = "time_series")]
    TimeSeries,
    #[serde(rename = "table")]
    Table,
}

impl Default for ResultFormat {
    fn default() -> Self {
        ResultFormat::TimeSeries
    }
}

/// The host's query object: raw text plus the visual expression
///
/// This is the persisted shape the host round-trips through its storage of
/// a saved query. `query` is a derived projection of
/// `(expression, schema, database, result_format)` and is recomputed by the
/// editing session on every change.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct KustoQuery {
    /// Compiled (or raw-mode hand-written) KQL text
    #[serde(default)]
    pub query: String,
    /// Target database
    #[serde(default)]
    pub database: String,
    /// Optional series naming pattern
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alias: Option<String>,
    #[serde(rename = "resultFormat", default)]
    pub result_format: ResultFormat,
    #[serde(default)]
    pub expression: QueryExpression,
    /// When set, the user edits `query` directly and the compiler is bypassed
    #[serde(rename = "rawMode", default)]
    pub raw_mode: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_filter() -> Expression {
        Expression::Operator(OperatorExpression::new(
            Property::new("State", PropertyType::String),
            Operator::new(
                OperatorName::Equal,
                OperatorValue::Scalar(ScalarValue::from("Texas")),
            ),
        ))
    }

    #[test]
    fn test_sections_default_to_empty_and_arrays() {
        let expression = QueryExpression::default();
        assert_eq!(expression.where_clause.combinator, Combinator::And);
        assert!(expression.where_clause.is_empty());
        assert!(expression.reduce.is_empty());
        assert!(expression.group_by.is_empty());
        assert!(expression.table().is_none());
    }

    #[test]
    fn test_expression_serializes_with_type_tags() {
        let json = serde_json::to_value(sample_filter()).unwrap();
        assert_eq!(json["type"], "operator");
        assert_eq!(json["property"]["name"], "State");
        assert_eq!(json["property"]["type"], "string");
        assert_eq!(json["operator"]["name"], "==");
        assert_eq!(json["operator"]["value"], "Texas");
    }

    #[test]
    fn test_array_expression_serializes_combinator_as_type() {
        let array = ArrayExpression::or(vec![sample_filter()]);
        let json = serde_json::to_value(Expression::Array(array)).unwrap();
        assert_eq!(json["type"], "or");
        assert_eq!(json["expressions"][0]["type"], "operator");
    }

    #[test]
    fn test_persisted_query_round_trips() {
        let query = KustoQuery {
            database: "Samples".to_string(),
            expression: QueryExpression {
                from: Some(PropertyExpression::new(Property::new(
                    "Covid19",
                    PropertyType::String,
                ))),
                where_clause: ArrayExpression::and(vec![
                    sample_filter(),
                    Expression::Array(ArrayExpression::or(vec![sample_filter()])),
                ]),
                reduce: ArrayExpression::and(vec![Expression::Reduce(
                    ReduceExpression::new(
                        Property::new("Deaths", PropertyType::Number),
                        ReduceFunction::Percentile,
                    )
                    .with_parameters(vec![ScalarValue::Number(95.0)]),
                )]),
                group_by: ArrayExpression::and(vec![Expression::GroupBy(
                    GroupByExpression::new(Property::new("Timestamp", PropertyType::DateTime))
                        .with_interval(Property::interval_macro()),
                )]),
            },
            ..Default::default()
        };

        let json = serde_json::to_string(&query).unwrap();
        let restored: KustoQuery = serde_json::from_str(&json).unwrap();
        assert_eq!(restored, query);
    }

    #[test]
    fn test_deserializes_host_shaped_document() {
        let raw = serde_json::json!({
            "query": "",
            "database": "Samples",
            "resultFormat": "time_series",
            "expression": {
                "from": { "type": "property", "property": { "name": "Covid19", "type": "string" } },
                "where": {
                    "type": "and",
                    "expressions": [{
                        "type": "operator",
                        "property": { "name": "State", "type": "string" },
                        "operator": { "name": "in", "value": ["Texas", "Ohio"] }
                    }]
                },
                "reduce": { "type": "and", "expressions": [] },
                "groupBy": { "type": "and", "expressions": [] }
            }
        });

        let query: KustoQuery = serde_json::from_value(raw).unwrap();
        assert_eq!(query.expression.table(), Some("Covid19"));
        let filter = query.expression.where_clause.expressions[0]
            .as_operator()
            .unwrap();
        assert_eq!(filter.operator.name, OperatorName::In);
        assert_eq!(
            filter.operator.value,
            OperatorValue::List(vec![ScalarValue::from("Texas"), ScalarValue::from("Ohio")])
        );
    }

    #[test]
    fn test_missing_sections_deserialize_to_empty_arrays() {
        let raw = serde_json::json!({ "query": "", "database": "db", "expression": {} });
        let query: KustoQuery = serde_json::from_value(raw).unwrap();
        assert!(query.expression.where_clause.is_empty());
        assert!(query.expression.reduce.is_empty());
        assert!(query.expression.group_by.is_empty());
        assert!(!query.raw_mode);
    }

    #[test]
    fn test_display_alias_falls_back_to_fn_and_column() {
        let reduce = ReduceExpression::new(
            Property::new("Deaths", PropertyType::Number),
            ReduceFunction::Sum,
        );
        assert_eq!(reduce.display_alias(), "sum_Deaths");
        assert_eq!(reduce.clone().with_alias("total").display_alias(), "total");
    }
}
