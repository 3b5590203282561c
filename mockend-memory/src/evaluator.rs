//! Filter evaluation for in-memory record filtering.
//!
//! A [`FilterSpec`] is compiled once into a [`Predicate`], which is then applied to
//! the BSON form of each resolved record. Evaluation borrows the record and the
//! predicate immutably, so the same inputs always give the same answer.

use std::{cmp::Ordering, collections::HashMap};

use bson::{Bson, datetime::DateTime};

use mockend_core::{
    error::{StoreError, StoreResult},
    query::{Expr, FilterSpec, Operator, QueryVisitor},
    record::{Record, RecordExt},
    timestamp::parse_instant,
};

/// Type-erased, comparable representation of BSON values.
///
/// Normalizes numeric types to f64 so that integers of any width and doubles compare
/// numerically.
#[derive(Debug)]
pub(crate) enum Comparable<'a> {
    /// Null or missing value
    Null,
    /// Boolean value
    Bool(bool),
    /// Numeric value (all integers and floats normalized to f64)
    Number(f64),
    /// DateTime value
    DateTime(DateTime),
    /// String value
    String(&'a str),
    /// Array of comparable values
    Array(Vec<Comparable<'a>>),
    /// Map/Object of comparable values
    Map(HashMap<&'a str, Comparable<'a>>),
}

impl<'a> From<&'a Bson> for Comparable<'a> {
    fn from(bson: &'a Bson) -> Self {
        match bson {
            Bson::Null => Comparable::Null,
            Bson::Boolean(value) => Comparable::Bool(*value),
            Bson::Int32(value) => Comparable::Number(*value as f64),
            Bson::Int64(value) => Comparable::Number(*value as f64),
            Bson::Double(value) => Comparable::Number(*value),
            Bson::DateTime(value) => Comparable::DateTime(*value),
            Bson::String(value) => Comparable::String(value),
            Bson::Array(arr) => Comparable::Array(arr.iter().map(Comparable::from).collect()),
            Bson::Document(doc) => Comparable::Map(
                doc.iter()
                    .map(|(k, v)| (k.as_str(), Comparable::from(v)))
                    .collect(),
            ),
            _ => Comparable::Null, // Other types are not comparable
        }
    }
}

impl<'a> Comparable<'a> {
    /// Coerces this value to an instant in milliseconds since the epoch.
    ///
    /// Date-times coerce directly, strings coerce when they parse as a timestamp.
    fn instant(&self) -> Option<i64> {
        match self {
            Comparable::DateTime(value) => Some(value.timestamp_millis()),
            Comparable::String(value) => parse_instant(value).map(|dt| dt.timestamp_millis()),
            _ => None,
        }
    }

    fn is_timestamp_string(&self) -> bool {
        matches!(self, Comparable::String(value) if parse_instant(value).is_some())
    }
}

impl<'a> PartialEq for Comparable<'a> {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Comparable::Null, Comparable::Null) => true,
            (Comparable::Bool(a), Comparable::Bool(b)) => a == b,
            (Comparable::Number(a), Comparable::Number(b)) => a == b,
            (Comparable::DateTime(a), Comparable::DateTime(b)) => a == b,
            (Comparable::String(a), Comparable::String(b)) => a == b,
            (Comparable::Array(a), Comparable::Array(b)) => a == b,
            (Comparable::Map(a), Comparable::Map(b)) => a == b,
            _ => false,
        }
    }
}

impl<'a> PartialOrd for Comparable<'a> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        match (self, other) {
            (Comparable::Bool(a), Comparable::Bool(b)) => a.partial_cmp(b),
            (Comparable::Number(a), Comparable::Number(b)) => a.partial_cmp(b),
            (Comparable::DateTime(a), Comparable::DateTime(b)) => a.partial_cmp(b),
            (Comparable::String(a), Comparable::String(b)) => a.partial_cmp(b),
            _ => None,
        }
    }
}

/// Applies `op` to an ordering, or to `None` when the sides are not comparable.
fn apply(op: Operator, ordering: Option<Ordering>) -> bool {
    match (op, ordering) {
        (Operator::Eq, ordering) => ordering == Some(Ordering::Equal),
        (Operator::Neq, ordering) => ordering != Some(Ordering::Equal),
        (_, None) => false,
        (Operator::Lt, Some(ordering)) => ordering == Ordering::Less,
        (Operator::Lte, Some(ordering)) => ordering != Ordering::Greater,
        (Operator::Gt, Some(ordering)) => ordering == Ordering::Greater,
        (Operator::Gte, Some(ordering)) => ordering != Ordering::Less,
    }
}

pub(crate) struct DocumentEvaluator<'a> {
    document: &'a Bson,
}

impl<'a> DocumentEvaluator<'a> {
    pub fn new(document: &'a Bson) -> Self {
        Self { document }
    }

    pub fn evaluate(&mut self, expr: &Expr) -> StoreResult<bool> {
        self.visit_expr(expr)
    }

    fn field(&self, name: &str) -> Option<&'a Bson> {
        self.document.as_document().and_then(|doc| doc.get(name))
    }
}

impl<'a> QueryVisitor for DocumentEvaluator<'a> {
    type Output = bool;
    type Error = StoreError;

    fn visit_and(&mut self, exprs: &[Expr]) -> Result<Self::Output, Self::Error> {
        for expr in exprs {
            if !self.visit_expr(expr)? {
                return Ok(false);
            }
        }

        Ok(true)
    }

    fn visit_field(&mut self, field: &str, op: Operator, value: &Bson) -> Result<Self::Output, Self::Error> {
        let left = self.field(field).map(Comparable::from).unwrap_or(Comparable::Null);
        let right = Comparable::from(value);

        if op.is_ordering() && left == Comparable::Null {
            return Ok(false);
        }

        if matches!(right, Comparable::DateTime(_)) || left.is_timestamp_string() {
            let ordering = match (left.instant(), right.instant()) {
                (Some(a), Some(b)) => Some(a.cmp(&b)),
                _ => None,
            };

            return Ok(apply(op, ordering));
        }

        let ordering = match op {
            Operator::Eq | Operator::Neq => (left == right).then_some(Ordering::Equal),
            _ => left.partial_cmp(&right),
        };

        Ok(apply(op, ordering))
    }
}

/// A compiled filter.
///
/// Holds only the immutable expression tree; every call evaluates from scratch.
#[derive(Debug, Clone, PartialEq)]
pub struct Predicate {
    expr: Expr,
}

impl Predicate {
    /// Compiles a filter specification into a predicate.
    pub fn compile(spec: &FilterSpec) -> Self {
        Predicate { expr: spec.to_expr() }
    }

    /// Returns true if the BSON document satisfies every condition.
    ///
    /// Values that are not documents have no fields, so only equality against
    /// `null` can hold for them.
    pub fn matches(&self, document: &Bson) -> bool {
        DocumentEvaluator::new(document)
            .evaluate(&self.expr)
            .unwrap_or(false)
    }

    /// Returns true if the record's BSON form satisfies every condition.
    pub fn matches_record<R: Record>(&self, record: &R) -> StoreResult<bool> {
        Ok(self.matches(&record.to_bson()?))
    }

    /// Keeps the records that satisfy the predicate, preserving their order.
    pub fn filter_records<R: Record>(&self, records: Vec<R>) -> StoreResult<Vec<R>> {
        let mut kept = Vec::with_capacity(records.len());

        for record in records {
            if self.matches_record(&record)? {
                kept.push(record);
            }
        }

        Ok(kept)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bson::{Document, doc};
    use chrono::{TimeZone, Utc};

    fn instant(value: &str) -> Bson {
        let dt = parse_instant(value).unwrap();
        Bson::DateTime(DateTime::from_millis(dt.timestamp_millis()))
    }

    fn apply_filter(filter: &FilterSpec, docs: Vec<Document>) -> Vec<Document> {
        let predicate = Predicate::compile(filter);

        docs.into_iter()
            .filter(|doc| predicate.matches(&Bson::Document(doc.clone())))
            .collect()
    }

    #[test]
    fn filters_by_property() {
        let filter = FilterSpec::new().op("completed", Operator::Eq, true);

        assert_eq!(
            apply_filter(&filter, vec![doc! { "completed": false }, doc! { "completed": true }]),
            vec![doc! { "completed": true }]
        );
    }

    #[test]
    fn literal_is_shorthand_for_equality() {
        let filter = FilterSpec::new().literal("title", "Bug");

        assert_eq!(
            apply_filter(&filter, vec![doc! { "title": "Bug" }, doc! { "title": "Feature" }]),
            vec![doc! { "title": "Bug" }]
        );
    }

    #[test]
    fn mismatched_types_never_match() {
        let filter = FilterSpec::new().op("completed", Operator::Eq, "string");

        assert!(apply_filter(&filter, vec![doc! { "completed": false }, doc! { "completed": true }]).is_empty());
    }

    #[test]
    fn compares_dates_chronologically() {
        let filter = FilterSpec::new().op("completedAt", Operator::Gt, instant("2019-02-05T12:50:00.000Z"));

        assert_eq!(
            apply_filter(
                &filter,
                vec![
                    doc! { "completedAt": "2019-02-05T10:50:00.000Z" },
                    doc! { "completedAt": "2019-02-07T12:50:00.000Z" },
                ]
            ),
            vec![doc! { "completedAt": "2019-02-07T12:50:00.000Z" }]
        );
    }

    #[test]
    fn timestamp_strings_are_coerced_against_string_operands() {
        // Lexicographically "2019-02-05T23:00:00+05:00" > "2019-02-05T20:00:00Z", chronologically it is earlier.
        let filter = FilterSpec::new().op("dueDate", Operator::Lt, "2019-02-05T20:00:00Z");

        assert_eq!(
            apply_filter(&filter, vec![doc! { "dueDate": "2019-02-05T23:00:00+05:00" }]),
            vec![doc! { "dueDate": "2019-02-05T23:00:00+05:00" }]
        );
    }

    #[test]
    fn equality_coerces_dates() {
        let at = Utc.with_ymd_and_hms(2019, 2, 5, 12, 50, 0).unwrap();
        let filter = FilterSpec::new().op("completedAt", Operator::Eq, Bson::DateTime(DateTime::from_millis(at.timestamp_millis())));

        assert_eq!(
            apply_filter(&filter, vec![doc! { "completedAt": "2019-02-05T12:50:00.000Z" }, doc! { "completedAt": Bson::Null }]),
            vec![doc! { "completedAt": "2019-02-05T12:50:00.000Z" }]
        );
    }

    #[test]
    fn absent_values_fail_ordering_operators() {
        let filter = FilterSpec::new().op("completedAt", Operator::Lt, instant("2019-02-05T12:50:00.000Z"));

        assert_eq!(
            apply_filter(
                &filter,
                vec![
                    doc! { "completedAt": Bson::Null },
                    doc! {},
                    doc! { "completedAt": "2019-02-05T10:50:00.000Z" },
                    doc! { "completedAt": "2019-02-07T12:50:00.000Z" },
                ]
            ),
            vec![doc! { "completedAt": "2019-02-05T10:50:00.000Z" }]
        );

        for op in [Operator::Lt, Operator::Lte, Operator::Gt, Operator::Gte] {
            let predicate = Predicate::compile(&FilterSpec::new().op("number", op, Bson::Null));
            assert!(!predicate.matches(&Bson::Document(doc! {})));
        }
    }

    #[test]
    fn absence_is_a_valid_equality_operand() {
        let eq_null = Predicate::compile(&FilterSpec::new().op("color", Operator::Eq, Bson::Null));
        let neq_null = Predicate::compile(&FilterSpec::new().op("color", Operator::Neq, Bson::Null));

        assert!(eq_null.matches(&Bson::Document(doc! { "color": Bson::Null })));
        assert!(eq_null.matches(&Bson::Document(doc! {})));
        assert!(!eq_null.matches(&Bson::Document(doc! { "color": "red" })));
        assert!(neq_null.matches(&Bson::Document(doc! { "color": "red" })));
    }

    #[test]
    fn filters_by_multiple_properties() {
        let filter = FilterSpec::new()
            .op("completed", Operator::Eq, true)
            .op("number", Operator::Lte, 4);

        assert_eq!(
            apply_filter(
                &filter,
                vec![
                    doc! { "completed": false, "number": 4 },
                    doc! { "completed": true, "number": 2 },
                    doc! { "completed": true, "number": 7 },
                ]
            ),
            vec![doc! { "completed": true, "number": 2 }]
        );
    }

    #[test]
    fn operator_sets_are_conjunctions() {
        let filter = FilterSpec::new()
            .op("number", Operator::Gt, 4)
            .op("number", Operator::Lte, 8);

        let docs = [4, 8, 7, 10, 1, 15].map(|n| doc! { "number": n }).to_vec();

        assert_eq!(apply_filter(&filter, docs), vec![doc! { "number": 8 }, doc! { "number": 7 }]);
    }

    #[test]
    fn each_operator_selects_the_matching_value() {
        let cases = [
            (Operator::Eq, 4, 5),
            (Operator::Neq, 5, 4),
            (Operator::Lt, 3, 5),
            (Operator::Lte, 4, 5),
            (Operator::Gt, 7, 2),
            (Operator::Gte, 4, 2),
        ];

        for (op, matching, not_matching) in cases {
            let filter = FilterSpec::new().op("foo", op, 4);

            assert_eq!(
                apply_filter(&filter, vec![doc! { "foo": not_matching }, doc! { "foo": matching }]),
                vec![doc! { "foo": matching }],
                "operator {}",
                op.tag()
            );
        }
    }

    #[test]
    fn numbers_compare_across_widths() {
        let predicate = Predicate::compile(&FilterSpec::new().op("n", Operator::Eq, 2.0));
        assert!(predicate.matches(&Bson::Document(doc! { "n": 2i64 })));
    }

    #[test]
    fn predicates_are_pure() {
        let predicate = Predicate::compile(&FilterSpec::new().op("number", Operator::Gte, 3));
        let record = Bson::Document(doc! { "number": 3 });

        let first = predicate.matches(&record);
        let second = predicate.matches(&record);

        assert!(first);
        assert_eq!(first, second);
    }
}
