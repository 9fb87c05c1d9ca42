//! Filter-node normalization
//!
//! Pure repair functions that keep a partially-edited filter condition
//! well-formed as its column, operator, or value changes. Each function
//! takes the previous node and returns a corrected replacement; callers
//! swap it into the tree without mutating siblings.
//!
//! [`sanitize`] is the validity gate the compiler relies on: incomplete
//! conditions are silently dropped from compilation rather than emitted
//! as invalid query fragments.

use super::ast::{Operator, OperatorExpression};
use super::property::{OperatorName, OperatorValue, Property, PropertyType, ScalarValue};

/// A display label paired with the underlying value, as used by select
/// controls in the host editor
#[derive(Debug, Clone, PartialEq)]
pub struct SelectOption {
    pub label: String,
    pub value: ScalarValue,
}

impl SelectOption {
    pub fn new(label: impl Into<String>, value: ScalarValue) -> Self {
        Self {
            label: label.into(),
            value,
        }
    }
}

/// What the user picked in a single- or multi-select value control
#[derive(Debug, Clone, PartialEq)]
pub enum ValueSelection {
    Single(SelectOption),
    Multi(Vec<SelectOption>),
}

/// Apply a column change to a filter condition
///
/// The operator name survives only if it is valid for the new column type;
/// otherwise it resets to the type's default. The value is preserved when
/// the column type is unchanged, and resets to the type default (an empty
/// list for `in`/`!in`) when it is not.
pub fn with_property(
    expr: &OperatorExpression,
    name: impl Into<String>,
    property_type: PropertyType,
) -> OperatorExpression {
    let operator_name = if expr.operator.name.supports_type(property_type) {
        expr.operator.name
    } else {
        property_type.default_operator()
    };

    // An empty previous column name means the node was never typed.
    let same_type =
        !expr.property.name.is_empty() && expr.property.property_type == property_type;

    let value = if same_type && operator_name == expr.operator.name {
        expr.operator.value.clone()
    } else if operator_name.is_multi_value() {
        OperatorValue::List(Vec::new())
    } else {
        property_type.default_value()
    };

    OperatorExpression::new(
        Property::new(name, property_type),
        Operator::new(operator_name, value),
    )
}

/// Apply an operator change to a filter condition
///
/// The value is preserved but reshaped: switching to `in`/`!in` boxes a
/// scalar into a one-element list (an empty scalar becomes an empty list);
/// switching away unwraps a list to its first element, falling back to the
/// column type's default when the list is empty.
pub fn with_operator(expr: &OperatorExpression, name: OperatorName) -> OperatorExpression {
    let value = match (&expr.operator.value, name.is_multi_value()) {
        (OperatorValue::List(values), true) => OperatorValue::List(values.clone()),
        (OperatorValue::Scalar(scalar), true) => {
            if scalar.is_empty() {
                OperatorValue::List(Vec::new())
            } else {
                OperatorValue::List(vec![scalar.clone()])
            }
        }
        (OperatorValue::List(values), false) => match values.first() {
            Some(first) => OperatorValue::Scalar(first.clone()),
            None => expr.property.property_type.default_value(),
        },
        (OperatorValue::Scalar(scalar), false) => OperatorValue::Scalar(scalar.clone()),
    };

    OperatorExpression::new(expr.property.clone(), Operator::new(name, value))
}

/// Apply a value selection to a filter condition
///
/// A multi-selection becomes a list of the selections' underlying values;
/// a single selection becomes that scalar.
pub fn with_value(expr: &OperatorExpression, selection: ValueSelection) -> OperatorExpression {
    let value = match selection {
        ValueSelection::Single(option) => OperatorValue::Scalar(option.value),
        ValueSelection::Multi(options) => {
            OperatorValue::List(options.into_iter().map(|option| option.value).collect())
        }
    };

    OperatorExpression::new(
        expr.property.clone(),
        Operator::new(expr.operator.name, value),
    )
}

/// Present a stored value as a select option
///
/// A string wrapped in matching single quotes is unquoted for display; the
/// unquoted text is also used as the underlying value.
pub fn to_select_option(value: &ScalarValue) -> SelectOption {
    if let ScalarValue::String(text) = value {
        if text.len() >= 2 && text.starts_with('\'') && text.ends_with('\'') {
            let stripped = text[1..text.len() - 1].to_string();
            return SelectOption::new(stripped.clone(), ScalarValue::String(stripped));
        }
    }

    SelectOption::new(value.to_string(), value.clone())
}

/// Present the current operator value as options for a multi-select control
pub fn to_select_options(value: &OperatorValue) -> Vec<SelectOption> {
    match value {
        OperatorValue::Scalar(scalar) if scalar.is_empty() => Vec::new(),
        OperatorValue::Scalar(scalar) => vec![to_select_option(scalar)],
        OperatorValue::List(values) => values.iter().map(to_select_option).collect(),
    }
}

/// Validity gate for compilation
///
/// Returns `None` (drop this node) when the column name is missing, the
/// operator is missing or unrecognized, or the value is an empty string or
/// empty list. `0` and `false` are real values and pass.
pub fn sanitize(expr: &OperatorExpression) -> Option<OperatorExpression> {
    if expr.property.name.is_empty() {
        return None;
    }
    if expr.operator.name.as_kql().is_none() {
        return None;
    }
    if expr.operator.value.is_empty() {
        return None;
    }

    Some(expr.clone())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn condition(
        name: &str,
        property_type: PropertyType,
        operator: OperatorName,
        value: OperatorValue,
    ) -> OperatorExpression {
        OperatorExpression::new(
            Property::new(name, property_type),
            Operator::new(operator, value),
        )
    }

    #[test]
    fn test_with_property_from_empty_node() {
        let normalized = with_property(
            &OperatorExpression::default(),
            "ActivityName",
            PropertyType::String,
        );

        assert_eq!(normalized.property, Property::new("ActivityName", PropertyType::String));
        assert_eq!(normalized.operator.name, OperatorName::Equal);
        assert_eq!(normalized.operator.value, OperatorValue::Scalar(ScalarValue::from("")));
    }

    #[test]
    fn test_with_property_keeps_supported_operator() {
        let previous = condition(
            "",
            PropertyType::String,
            OperatorName::NotEqual,
            OperatorValue::Scalar(ScalarValue::from("c")),
        );
        let normalized = with_property(&previous, "ActivityName", PropertyType::String);

        assert_eq!(normalized.operator.name, OperatorName::NotEqual);
        // Untyped previous node, so the value resets to the type default.
        assert_eq!(normalized.operator.value, OperatorValue::Scalar(ScalarValue::from("")));
    }

    #[test]
    fn test_with_property_resets_unsupported_operator() {
        let previous = condition(
            "ActivityName",
            PropertyType::String,
            OperatorName::StartsWith,
            OperatorValue::Scalar(ScalarValue::from("c")),
        );
        let normalized = with_property(&previous, "ID", PropertyType::Number);

        assert_eq!(normalized.operator.name, OperatorName::Equal);
        assert_eq!(
            normalized.operator.value,
            OperatorValue::Scalar(ScalarValue::Number(0.0))
        );
    }

    #[test]
    fn test_with_property_resets_every_unsupported_pair() {
        let operators = [
            OperatorName::Equal,
            OperatorName::NotEqual,
            OperatorName::GreaterThan,
            OperatorName::LessThan,
            OperatorName::GreaterOrEqual,
            OperatorName::LessOrEqual,
            OperatorName::Contains,
            OperatorName::NotContains,
            OperatorName::StartsWith,
            OperatorName::NotStartsWith,
            OperatorName::In,
            OperatorName::NotIn,
        ];
        let types = [
            PropertyType::String,
            PropertyType::Number,
            PropertyType::Boolean,
            PropertyType::DateTime,
            PropertyType::Interval,
        ];

        for operator in operators {
            for property_type in types {
                let previous = condition(
                    "Col",
                    PropertyType::String,
                    operator,
                    OperatorValue::Scalar(ScalarValue::from("x")),
                );
                let normalized = with_property(&previous, "Other", property_type);

                if operator.supports_type(property_type) {
                    assert_eq!(normalized.operator.name, operator);
                } else {
                    assert_eq!(normalized.operator.name, property_type.default_operator());
                }
            }
        }
    }

    #[test]
    fn test_with_property_preserves_value_for_same_type() {
        let previous = condition(
            "State",
            PropertyType::String,
            OperatorName::Contains,
            OperatorValue::Scalar(ScalarValue::from("Tex")),
        );
        let normalized = with_property(&previous, "County", PropertyType::String);

        assert_eq!(normalized.operator.name, OperatorName::Contains);
        assert_eq!(
            normalized.operator.value,
            OperatorValue::Scalar(ScalarValue::from("Tex"))
        );
    }

    #[test]
    fn test_with_operator_keeps_scalar_value() {
        let previous = condition(
            "State",
            PropertyType::String,
            OperatorName::Equal,
            OperatorValue::Scalar(ScalarValue::from("foo")),
        );
        let normalized = with_operator(&previous, OperatorName::NotEqual);

        assert_eq!(normalized.operator.name, OperatorName::NotEqual);
        assert_eq!(
            normalized.operator.value,
            OperatorValue::Scalar(ScalarValue::from("foo"))
        );
    }

    #[test]
    fn test_with_operator_boxes_scalar_into_list() {
        let previous = condition(
            "State",
            PropertyType::String,
            OperatorName::Equal,
            OperatorValue::Scalar(ScalarValue::from("foo")),
        );
        let normalized = with_operator(&previous, OperatorName::In);

        assert_eq!(
            normalized.operator.value,
            OperatorValue::List(vec![ScalarValue::from("foo")])
        );
    }

    #[test]
    fn test_with_operator_unwraps_list_to_first_element() {
        let previous = condition(
            "State",
            PropertyType::String,
            OperatorName::In,
            OperatorValue::List(vec![ScalarValue::from("foo"), ScalarValue::from("bar")]),
        );
        let normalized = with_operator(&previous, OperatorName::NotEqual);

        assert_eq!(
            normalized.operator.value,
            OperatorValue::Scalar(ScalarValue::from("foo"))
        );
    }

    #[test]
    fn test_with_operator_round_trip_law() {
        let original = condition(
            "State",
            PropertyType::String,
            OperatorName::Equal,
            OperatorValue::Scalar(ScalarValue::from("v")),
        );
        let boxed = with_operator(&original, OperatorName::In);
        let unboxed = with_operator(&boxed, OperatorName::Equal);

        assert_eq!(unboxed.operator.value, original.operator.value);
    }

    #[test]
    fn test_with_operator_empty_edge_cases() {
        let empty = condition(
            "ID",
            PropertyType::Number,
            OperatorName::Equal,
            OperatorValue::Scalar(ScalarValue::from("")),
        );
        assert_eq!(
            with_operator(&empty, OperatorName::In).operator.value,
            OperatorValue::List(vec![])
        );

        let empty_list = condition(
            "ID",
            PropertyType::Number,
            OperatorName::In,
            OperatorValue::List(vec![]),
        );
        assert_eq!(
            with_operator(&empty_list, OperatorName::Equal).operator.value,
            OperatorValue::Scalar(ScalarValue::Number(0.0))
        );
    }

    #[test]
    fn test_with_value_single_and_multi() {
        let previous = condition(
            "ActivityName",
            PropertyType::String,
            OperatorName::NotEqual,
            OperatorValue::Scalar(ScalarValue::from("bar")),
        );

        let single = with_value(
            &previous,
            ValueSelection::Single(SelectOption::new("foo", ScalarValue::from("foo"))),
        );
        assert_eq!(single.operator.name, OperatorName::NotEqual);
        assert_eq!(
            single.operator.value,
            OperatorValue::Scalar(ScalarValue::from("foo"))
        );

        let multi = with_value(
            &previous,
            ValueSelection::Multi(vec![
                SelectOption::new("foo", ScalarValue::from("foo")),
                SelectOption::new("bar", ScalarValue::from("bar")),
            ]),
        );
        assert_eq!(
            multi.operator.value,
            OperatorValue::List(vec![ScalarValue::from("foo"), ScalarValue::from("bar")])
        );
    }

    #[test]
    fn test_to_select_option_strips_matching_quotes() {
        let quoted = ScalarValue::from("'$foo'");
        assert_eq!(
            to_select_option(&quoted),
            SelectOption::new("$foo", ScalarValue::from("$foo"))
        );

        let plain = ScalarValue::from("foo");
        assert_eq!(
            to_select_option(&plain),
            SelectOption::new("foo", ScalarValue::from("foo"))
        );
    }

    #[test]
    fn test_to_select_options_from_current_value() {
        assert_eq!(
            to_select_options(&OperatorValue::Scalar(ScalarValue::from("foo"))),
            vec![SelectOption::new("foo", ScalarValue::from("foo"))]
        );
        assert_eq!(
            to_select_options(&OperatorValue::List(vec![ScalarValue::from("foo")])),
            vec![SelectOption::new("foo", ScalarValue::from("foo"))]
        );
        assert!(to_select_options(&OperatorValue::default()).is_empty());
    }

    #[test]
    fn test_sanitize_rejects_incomplete_nodes() {
        let missing_property = condition(
            "",
            PropertyType::String,
            OperatorName::Equal,
            OperatorValue::Scalar(ScalarValue::from("foo")),
        );
        assert!(sanitize(&missing_property).is_none());

        let unknown_operator = condition(
            "ID",
            PropertyType::Number,
            OperatorName::Unknown,
            OperatorValue::Scalar(ScalarValue::from("foo")),
        );
        assert!(sanitize(&unknown_operator).is_none());

        let missing_value = condition(
            "ID",
            PropertyType::Number,
            OperatorName::Equal,
            OperatorValue::Scalar(ScalarValue::from("")),
        );
        assert!(sanitize(&missing_value).is_none());

        let empty_list = condition(
            "ID",
            PropertyType::Number,
            OperatorName::In,
            OperatorValue::List(vec![]),
        );
        assert!(sanitize(&empty_list).is_none());
    }

    #[test]
    fn test_sanitize_accepts_zero_and_false() {
        let zero = condition(
            "ID",
            PropertyType::Number,
            OperatorName::Equal,
            OperatorValue::Scalar(ScalarValue::Number(123.0)),
        );
        assert_eq!(sanitize(&zero), Some(zero.clone()));

        let falsy = condition(
            "Active",
            PropertyType::Boolean,
            OperatorName::Equal,
            OperatorValue::Scalar(ScalarValue::Bool(false)),
        );
        assert!(sanitize(&falsy).is_some());
    }

    #[test]
    fn test_sanitize_is_idempotent() {
        let valid = condition(
            "State",
            PropertyType::String,
            OperatorName::In,
            OperatorValue::List(vec![ScalarValue::from("Texas")]),
        );

        let once = sanitize(&valid).unwrap();
        let twice = sanitize(&once).unwrap();
        assert_eq!(once, twice);
    }
}
