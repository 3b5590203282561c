//! Declarative filter specifications and the expression tree they compile to.
//!
//! A [`FilterSpec`] maps field names to a [`Condition`]: either a literal value
//! (shorthand for equality) or a set of operators that must all hold. Fields are
//! combined with AND semantics. Whether a condition is a literal or an operator set
//! is decided here, at the declarative boundary, and never inferred later.
//!
//! # Building filters
//!
//! ```ignore
//! use mockend::query::{FilterSpec, Operator};
//!
//! let filter = FilterSpec::new()
//!     .literal("completed", true)
//!     .op("number", Operator::Gt, 4)
//!     .op("number", Operator::Lte, 8);
//! ```
//!
//! The same filter can be parsed from JSON:
//!
//! ```ignore
//! let filter = FilterSpec::from_json(json!({
//!     "completed": true,
//!     "number": { "$gt": 4, "$lte": 8 },
//! }))?;
//! ```
//!
//! Backends evaluate the compiled [`Expr`] through a [`QueryVisitor`].

use bson::{Bson, ser::serialize_to_bson};
use serde_json::Value;

use crate::error::{StoreError, StoreResult};

/// Field comparison operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operator {
    /// Equal to.
    Eq,
    /// Not equal to.
    Neq,
    /// Less than.
    Lt,
    /// Less than or equal to.
    Lte,
    /// Greater than.
    Gt,
    /// Greater than or equal to.
    Gte,
}

impl Operator {
    /// Parses the declarative tag (`$eq`, `$neq`, `$lt`, `$lte`, `$gt`, `$gte`).
    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag {
            "$eq" => Some(Operator::Eq),
            "$neq" => Some(Operator::Neq),
            "$lt" => Some(Operator::Lt),
            "$lte" => Some(Operator::Lte),
            "$gt" => Some(Operator::Gt),
            "$gte" => Some(Operator::Gte),
            _ => None,
        }
    }

    /// Returns the declarative tag for this operator.
    pub fn tag(&self) -> &'static str {
        match self {
            Operator::Eq => "$eq",
            Operator::Neq => "$neq",
            Operator::Lt => "$lt",
            Operator::Lte => "$lte",
            Operator::Gt => "$gt",
            Operator::Gte => "$gte",
        }
    }

    /// Returns true for `lt`, `lte`, `gt` and `gte`, which never hold for absent values.
    pub fn is_ordering(&self) -> bool {
        matches!(self, Operator::Lt | Operator::Lte | Operator::Gt | Operator::Gte)
    }
}

/// The condition a single field must satisfy.
#[derive(Debug, Clone, PartialEq)]
pub enum Condition {
    /// The field must equal this value. A `Null` literal places no constraint.
    Literal(Bson),
    /// Every operator in the set must hold.
    Operators(Vec<(Operator, Bson)>),
}

/// A filter expression compiled from a [`FilterSpec`].
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    /// Logical AND of multiple expressions (all must match). An empty list matches everything.
    And(Vec<Expr>),
    /// Field comparison expression.
    Field {
        /// The field name to compare.
        field: String,
        /// The comparison operator.
        op: Operator,
        /// The value to compare against.
        value: Bson,
    },
}

impl Expr {
    /// Creates a field comparison expression.
    pub fn field(field: impl Into<String>, op: Operator, value: impl Into<Bson>) -> Self {
        Expr::Field { field: field.into(), op, value: value.into() }
    }
}

/// A declarative mapping from field name to [`Condition`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FilterSpec {
    fields: Vec<(String, Condition)>,
}

impl FilterSpec {
    /// Creates an empty filter, which matches every record.
    pub fn new() -> Self {
        FilterSpec::default()
    }

    /// Sets the condition for `field`, replacing any previous one.
    pub fn condition(mut self, field: impl Into<String>, condition: Condition) -> Self {
        let field = field.into();

        match self.fields.iter_mut().find(|(name, _)| *name == field) {
            Some((_, existing)) => *existing = condition,
            None => self.fields.push((field, condition)),
        }

        self
    }

    /// Requires `field` to equal `value`.
    pub fn literal(self, field: impl Into<String>, value: impl Into<Bson>) -> Self {
        self.condition(field, Condition::Literal(value.into()))
    }

    /// Adds an operator to the operator set of `field`.
    ///
    /// A literal condition previously set on the same field is replaced.
    pub fn op(mut self, field: impl Into<String>, op: Operator, value: impl Into<Bson>) -> Self {
        let field = field.into();
        let value = value.into();

        match self.fields.iter_mut().find(|(name, _)| *name == field) {
            Some((_, Condition::Operators(ops))) => ops.push((op, value)),
            Some((_, existing)) => *existing = Condition::Operators(vec![(op, value)]),
            None => self.fields.push((field, Condition::Operators(vec![(op, value)]))),
        }

        self
    }

    /// Returns the field conditions in declaration order.
    pub fn fields(&self) -> &[(String, Condition)] {
        &self.fields
    }

    /// Returns true if no field carries a condition.
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Parses a declarative JSON filter.
    ///
    /// The filter must be an object. A field whose value is an object with only
    /// `$`-prefixed keys is an operator set; any other value is a literal. An empty
    /// object is an empty operator set and places no constraint on its field. Unknown
    /// operators are rejected with [`StoreError::InvalidFilter`].
    pub fn from_json(value: Value) -> StoreResult<Self> {
        let Value::Object(map) = value else {
            return Err(StoreError::InvalidFilter(format!("expected an object, got {value}")));
        };

        let mut spec = FilterSpec::new();

        for (field, raw) in map {
            let condition = match raw {
                Value::Object(ops) if ops.keys().all(|key| key.starts_with('$')) => {
                    let mut parsed = Vec::with_capacity(ops.len());

                    for (tag, operand) in ops {
                        let op = Operator::from_tag(&tag).ok_or_else(|| {
                            StoreError::InvalidFilter(format!("unknown operator {tag} on field {field}"))
                        })?;
                        parsed.push((op, serialize_to_bson(&operand)?));
                    }

                    Condition::Operators(parsed)
                }
                other => Condition::Literal(serialize_to_bson(&other)?),
            };

            spec = spec.condition(field, condition);
        }

        Ok(spec)
    }

    /// Compiles this filter into an expression tree.
    ///
    /// Literal `null` conditions are dropped; every other condition becomes one
    /// [`Expr::Field`] per operator.
    pub fn to_expr(&self) -> Expr {
        let mut exprs = Vec::new();

        for (field, condition) in &self.fields {
            match condition {
                Condition::Literal(Bson::Null) => {}
                Condition::Literal(value) => {
                    exprs.push(Expr::field(field.clone(), Operator::Eq, value.clone()))
                }
                Condition::Operators(ops) => exprs.extend(
                    ops.iter()
                        .map(|(op, value)| Expr::field(field.clone(), *op, value.clone())),
                ),
            }
        }

        Expr::And(exprs)
    }
}

/// Walks an [`Expr`] tree.
///
/// Backends implement this to evaluate or translate a compiled filter.
pub trait QueryVisitor {
    /// The result produced for each visited node.
    type Output;
    /// The error raised while visiting.
    type Error: Into<StoreError>;

    /// Visits a conjunction.
    fn visit_and(&mut self, exprs: &[Expr]) -> Result<Self::Output, Self::Error>;
    /// Visits a single field comparison.
    fn visit_field(
        &mut self,
        field: &str,
        op: Operator,
        value: &Bson,
    ) -> Result<Self::Output, Self::Error>;

    /// Dispatches to the visit method for the node's variant.
    fn visit_expr(&mut self, expr: &Expr) -> Result<Self::Output, Self::Error> {
        match expr {
            Expr::And(exprs) => self.visit_and(exprs),
            Expr::Field { field, op, value } => self.visit_field(field, *op, value),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn json_objects_with_tags_become_operator_sets() {
        let spec = FilterSpec::from_json(json!({
            "completed": true,
            "number": { "$gt": 4, "$lte": 8 },
        }))
        .unwrap();

        assert_eq!(
            spec,
            FilterSpec::new()
                .literal("completed", true)
                .op("number", Operator::Gt, 4i64)
                .op("number", Operator::Lte, 8i64)
        );
    }

    #[test]
    fn unknown_operators_are_rejected() {
        let err = FilterSpec::from_json(json!({ "number": { "$in": [1, 2] } })).unwrap_err();
        assert!(matches!(err, StoreError::InvalidFilter(_)));

        let err = FilterSpec::from_json(json!([1, 2])).unwrap_err();
        assert!(matches!(err, StoreError::InvalidFilter(_)));
    }

    #[test]
    fn empty_objects_place_no_constraint() {
        let spec = FilterSpec::from_json(json!({ "completed": {} })).unwrap();

        assert_eq!(spec.fields(), &[("completed".to_string(), Condition::Operators(vec![]))]);
        assert_eq!(spec.to_expr(), Expr::And(vec![]));
    }

    #[test]
    fn objects_with_plain_keys_are_literals() {
        let spec = FilterSpec::from_json(json!({ "meta": { "$eq": 1, "owner": "me" } })).unwrap();

        assert!(matches!(spec.fields()[0].1, Condition::Literal(Bson::Document(_))));
    }

    #[test]
    fn null_literals_are_ignored() {
        let spec = FilterSpec::new()
            .literal("dueDate", Bson::Null)
            .op("completedAt", Operator::Eq, Bson::Null);

        assert_eq!(
            spec.to_expr(),
            Expr::And(vec![Expr::field("completedAt", Operator::Eq, Bson::Null)])
        );
    }
}
