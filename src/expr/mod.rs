//! Visual query expression model
//!
//! The structured (non-text) representation of a query built via editor
//! controls, plus the helpers that keep it well-formed:
//!
//! - **Property/operator model**: typed column references and comparison
//!   operators with type-appropriate defaults
//! - **AST**: tagged-union expression nodes and the query root
//! - **Normalizer**: pure repair functions applied on every edit
//!
//! # Example
//!
//! ```rust
//! use kqlforge::expr::{
//!     Expression, Operator, OperatorExpression, OperatorName, OperatorValue,
//!     Property, PropertyType, QueryExpression, ScalarValue,
//! };
//!
//! let mut expression = QueryExpression::for_table("Covid19");
//! expression.where_clause.expressions.push(Expression::Operator(
//!     OperatorExpression::new(
//!         Property::new("State", PropertyType::String),
//!         Operator::new(
//!             OperatorName::Equal,
//!             OperatorValue::Scalar(ScalarValue::from("Texas")),
//!         ),
//!     ),
//! ));
//! ```

mod ast;
mod normalize;
mod property;

pub use ast::{
    ArrayExpression, Combinator, Expression, GroupByExpression, KustoQuery, Operator,
    OperatorExpression, PropertyExpression, QueryExpression, ReduceExpression, ReduceFunction,
    ResultFormat,
};
pub use normalize::{
    sanitize, to_select_option, to_select_options, with_operator, with_property, with_value,
    SelectOption, ValueSelection,
};
pub use property::{OperatorName, OperatorValue, Property, PropertyType, ScalarValue};
