//! Visual expression to KQL compilation
//!
//! Walks the expression tree plus the resolved column schema and emits
//! engine-native query text: the source table, one `| where` stage per
//! surviving filter, and a `| summarize` stage for aggregations and group
//! keys.
//!
//! The compiler is total: malformed or incomplete nodes degrade to omitted
//! clauses, never to an error. Clause order is stable (source, where
//! clauses in declaration order, summarize, group-by), so compiling the
//! same inputs twice yields byte-identical text.

use regex::Regex;
use std::sync::OnceLock;

use crate::expr::{
    sanitize, ArrayExpression, Combinator, Expression, GroupByExpression, OperatorExpression,
    OperatorValue, PropertyType, QueryExpression, ReduceExpression, ScalarValue,
};
use crate::schema::ColumnSchema;

/// The bucket-width macro substituted by the host at execution time
pub const INTERVAL_MACRO: &str = "$__interval";

/// Compile a visual expression into KQL text
///
/// Returns an empty string when no source table is selected. Columns from
/// the resolved schema override the types recorded in the expression, so a
/// stale saved query follows the live schema.
pub fn compile(expression: &QueryExpression, columns: &[ColumnSchema], database: &str) -> String {
    let Some(table) = expression.table() else {
        return String::new();
    };

    let mut stages = vec![table.to_string()];

    for child in &expression.where_clause.expressions {
        if let Some(condition) = render_where_child(child, columns) {
            stages.push(format!("| where {}", condition));
        }
    }

    if let Some(summarize) = render_summarize(expression, columns) {
        stages.push(summarize);
    }

    tracing::debug!(
        database = database,
        table = table,
        stages = stages.len(),
        "compiled visual expression"
    );

    stages.join("\n")
}

/// One child of the where section: a single condition or a boolean group
fn render_where_child(expression: &Expression, columns: &[ColumnSchema]) -> Option<String> {
    match expression {
        Expression::Operator(operator) => render_condition(operator, columns),
        Expression::Array(array) => render_condition_group(array, columns),
        _ => None,
    }
}

/// A nested and/or group rendered as one parenthesized condition
fn render_condition_group(array: &ArrayExpression, columns: &[ColumnSchema]) -> Option<String> {
    let conditions: Vec<String> = array
        .expressions
        .iter()
        .filter_map(|child| render_where_child(child, columns))
        .collect();

    match conditions.len() {
        0 => None,
        1 => Some(conditions.into_iter().next().unwrap_or_default()),
        _ => {
            let joiner = match array.combinator {
                Combinator::And => " and ",
                Combinator::Or => " or ",
            };
            Some(format!("({})", conditions.join(joiner)))
        }
    }
}

fn render_condition(operator: &OperatorExpression, columns: &[ColumnSchema]) -> Option<String> {
    let sanitized = sanitize(operator)?;
    let token = sanitized.operator.name.as_kql()?;
    let property_type = resolve_type(&sanitized.property.name, sanitized.property.property_type, columns);
    let value = render_value(&sanitized.operator.value, property_type);

    Some(format!("{} {} {}", sanitized.property.name, token, value))
}

/// The summarize stage: aggregations, group keys, or both
fn render_summarize(expression: &QueryExpression, columns: &[ColumnSchema]) -> Option<String> {
    let reductions: Vec<String> = expression
        .reduce
        .expressions
        .iter()
        .filter_map(Expression::as_reduce)
        .filter_map(render_reduce)
        .collect();

    let group_keys: Vec<String> = expression
        .group_by
        .expressions
        .iter()
        .filter_map(Expression::as_group_by)
        .filter_map(|group| render_group_key(group, columns))
        .collect();

    if reductions.is_empty() && group_keys.is_empty() {
        return None;
    }

    let mut stage = String::from("| summarize ");
    if !reductions.is_empty() {
        stage.push_str(&reductions.join(", "));
        if !group_keys.is_empty() {
            stage.push(' ');
        }
    }
    if !group_keys.is_empty() {
        stage.push_str("by ");
        stage.push_str(&group_keys.join(", "));
    }

    Some(stage)
}

fn render_reduce(reduce: &ReduceExpression) -> Option<String> {
    if reduce.property.name.is_empty() {
        return None;
    }
    let function = reduce.reduce.as_kql()?;

    let mut arguments = vec![reduce.property.name.clone()];
    if let Some(parameters) = &reduce.parameters {
        arguments.extend(parameters.iter().map(render_bare_scalar));
    }

    Some(format!(
        "{} = {}({})",
        reduce.display_alias(),
        function,
        arguments.join(", ")
    ))
}

fn render_group_key(group: &GroupByExpression, columns: &[ColumnSchema]) -> Option<String> {
    if group.property.name.is_empty() {
        return None;
    }

    let property_type = resolve_type(&group.property.name, group.property.property_type, columns);
    if property_type == PropertyType::DateTime {
        if let Some(interval) = &group.interval {
            return Some(format!(
                "bin({}, {})",
                group.property.name,
                interval_literal(&interval.name)
            ));
        }
    }

    Some(group.property.name.clone())
}

/// Prefer the live schema's type for a column; fall back to the type
/// recorded in the expression when the column is not in the schema
fn resolve_type(name: &str, declared: PropertyType, columns: &[ColumnSchema]) -> PropertyType {
    columns
        .iter()
        .find(|column| column.name == name)
        .map(ColumnSchema::property_type)
        .unwrap_or(declared)
}

fn render_value(value: &OperatorValue, property_type: PropertyType) -> String {
    match value {
        OperatorValue::Scalar(scalar) => render_scalar(scalar, property_type),
        OperatorValue::List(values) => {
            let rendered: Vec<String> = values
                .iter()
                .map(|scalar| render_scalar(scalar, property_type))
                .collect();
            format!("({})", rendered.join(", "))
        }
    }
}

fn render_scalar(scalar: &ScalarValue, property_type: PropertyType) -> String {
    match property_type {
        PropertyType::String | PropertyType::DateTime | PropertyType::Interval => {
            quote(&scalar.to_string())
        }
        PropertyType::Number | PropertyType::Boolean => scalar.to_string(),
    }
}

/// Function parameters render as bare tokens for numbers and booleans,
/// quoted literals for text
fn render_bare_scalar(scalar: &ScalarValue) -> String {
    match scalar {
        ScalarValue::String(text) => quote(text),
        other => other.to_string(),
    }
}

/// Single-quote a literal, doubling internal quotes
fn quote(text: &str) -> String {
    format!("'{}'", text.replace('\'', "''"))
}

/// A bucket width for `bin()`: the `$__interval` macro, or a fixed KQL
/// timespan literal such as `5m` or `1h`. Anything else degrades to the
/// macro so the emitted query stays executable.
fn interval_literal(name: &str) -> &str {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    let pattern = PATTERN
        .get_or_init(|| Regex::new(r"^\d+(?:ms|s|m|h|d)$").expect("interval pattern is valid"));

    if name == INTERVAL_MACRO || pattern.is_match(name) {
        name
    } else {
        INTERVAL_MACRO
    }
}
