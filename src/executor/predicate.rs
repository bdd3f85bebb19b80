use std::{cmp::Ordering, fmt, str::FromStr};

use crate::types::{error::DatabaseError, row::Row, value::Value};

/// Anything that can accept or reject a decoded row.
///
/// Implemented by [`Predicate`] and by any `Fn(&Row) -> bool`, so generated
/// and caller-supplied filters share one scan path.
pub trait RowPredicate {
    fn evaluate(&self, row: &Row) -> bool;
}

impl<F> RowPredicate for F
where
    F: Fn(&Row) -> bool,
{
    fn evaluate(&self, row: &Row) -> bool {
        self(row)
    }
}

/// Comparison operators for predicates
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ComparisonOp {
    Equal,
    NotEqual,
    LessThan,
    LessThanOrEqual,
    GreaterThan,
    GreaterThanOrEqual,
    Like,
}

impl FromStr for ComparisonOp {
    type Err = DatabaseError;

    fn from_str(op: &str) -> Result<Self, Self::Err> {
        match op {
            "=" | "==" => Ok(ComparisonOp::Equal),
            "!=" | "<>" => Ok(ComparisonOp::NotEqual),
            "<" => Ok(ComparisonOp::LessThan),
            "<=" => Ok(ComparisonOp::LessThanOrEqual),
            ">" => Ok(ComparisonOp::GreaterThan),
            ">=" => Ok(ComparisonOp::GreaterThanOrEqual),
            "LIKE" => Ok(ComparisonOp::Like),
            _ => Err(DatabaseError::UnsupportedOperator { op: op.to_string() }),
        }
    }
}

impl fmt::Display for ComparisonOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let op = match self {
            ComparisonOp::Equal => "=",
            ComparisonOp::NotEqual => "!=",
            ComparisonOp::LessThan => "<",
            ComparisonOp::LessThanOrEqual => "<=",
            ComparisonOp::GreaterThan => ">",
            ComparisonOp::GreaterThanOrEqual => ">=",
            ComparisonOp::Like => "LIKE",
        };
        f.write_str(op)
    }
}

/// A predicate expression for filtering rows
#[derive(Debug, Clone, PartialEq)]
pub enum Predicate {
    /// Column comparison: column_name op value
    Comparison {
        column_name: String,
        op: ComparisonOp,
        value: Value,
    },
    IsNull(String),
    IsNotNull(String),
    And(Box<Predicate>, Box<Predicate>),
    Or(Box<Predicate>, Box<Predicate>),
    Not(Box<Predicate>),
    /// Always true predicate
    True,
}

impl Predicate {
    pub fn compare(column_name: impl Into<String>, op: ComparisonOp, value: impl Into<Value>) -> Self {
        Self::Comparison {
            column_name: column_name.into(),
            op,
            value: value.into(),
        }
    }

    pub fn eq(column_name: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::compare(column_name, ComparisonOp::Equal, value)
    }

    pub fn ne(column_name: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::compare(column_name, ComparisonOp::NotEqual, value)
    }

    pub fn lt(column_name: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::compare(column_name, ComparisonOp::LessThan, value)
    }

    pub fn le(column_name: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::compare(column_name, ComparisonOp::LessThanOrEqual, value)
    }

    pub fn gt(column_name: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::compare(column_name, ComparisonOp::GreaterThan, value)
    }

    pub fn ge(column_name: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::compare(column_name, ComparisonOp::GreaterThanOrEqual, value)
    }

    pub fn like(column_name: impl Into<String>, pattern: impl Into<String>) -> Self {
        Self::compare(column_name, ComparisonOp::Like, Value::Text(pattern.into()))
    }

    pub fn is_null(column_name: impl Into<String>) -> Self {
        Self::IsNull(column_name.into())
    }

    pub fn is_not_null(column_name: impl Into<String>) -> Self {
        Self::IsNotNull(column_name.into())
    }

    pub fn and(left: Predicate, right: Predicate) -> Self {
        Self::And(Box::new(left), Box::new(right))
    }

    pub fn or(left: Predicate, right: Predicate) -> Self {
        Self::Or(Box::new(left), Box::new(right))
    }

    #[allow(clippy::should_implement_trait)]
    pub fn not(predicate: Predicate) -> Self {
        Self::Not(Box::new(predicate))
    }

    /// Build a comparison from an operator string such as `">="` or `"LIKE"`.
    pub fn from_parts(column_name: &str, op: &str, value: Value) -> Result<Self, DatabaseError> {
        let op: ComparisonOp = op.parse()?;
        Ok(Self::compare(column_name, op, value))
    }
}

impl RowPredicate for Predicate {
    fn evaluate(&self, row: &Row) -> bool {
        match self {
            Predicate::Comparison {
                column_name,
                op,
                value,
            } => match row.get(column_name) {
                // missing or null values never match a comparison
                None => false,
                Some(row_value) => compare_with(row_value, *op, value),
            },
            Predicate::IsNull(column_name) => row.get(column_name).is_none(),
            Predicate::IsNotNull(column_name) => row.get(column_name).is_some(),
            Predicate::And(left, right) => left.evaluate(row) && right.evaluate(row),
            Predicate::Or(left, right) => left.evaluate(row) || right.evaluate(row),
            Predicate::Not(inner) => !inner.evaluate(row),
            Predicate::True => true,
        }
    }
}

fn compare_with(left: &Value, op: ComparisonOp, right: &Value) -> bool {
    match op {
        ComparisonOp::Equal => compare_values(left, right) == Ordering::Equal,
        ComparisonOp::NotEqual => compare_values(left, right) != Ordering::Equal,
        ComparisonOp::LessThan => compare_values(left, right) == Ordering::Less,
        ComparisonOp::LessThanOrEqual => compare_values(left, right) != Ordering::Greater,
        ComparisonOp::GreaterThan => compare_values(left, right) == Ordering::Greater,
        ComparisonOp::GreaterThanOrEqual => compare_values(left, right) != Ordering::Less,
        ComparisonOp::Like => match (left, right) {
            (Value::Text(text), Value::Text(pattern)) => like_match(text, pattern),
            _ => false,
        },
    }
}

/// Total comparison used for filtering.
///
/// Null sorts before everything; numbers compare as f64 whatever their
/// kind; text compares bytewise; `false < true`. Values of incompatible
/// kinds (and NaN) compare as `Equal`.
pub fn compare_values(a: &Value, b: &Value) -> Ordering {
    a.partial_cmp(b).unwrap_or(Ordering::Equal)
}

/// `%`-only LIKE matching.
///
/// Supported shapes: `%`, `%suffix`, `prefix%`, `%middle%` and exact text.
/// `_`, escapes and inner `%` are not interpreted: such patterns fall into
/// the nearest shape above. `%%` matches nothing.
pub fn like_match(text: &str, pattern: &str) -> bool {
    if pattern == "%" {
        return true;
    }

    if let Some(rest) = pattern.strip_prefix('%') {
        if let Some(middle) = rest.strip_suffix('%') {
            return !middle.is_empty() && text.contains(middle);
        }
        return text.ends_with(rest);
    }

    if let Some(prefix) = pattern.strip_suffix('%') {
        return text.starts_with(prefix);
    }

    text == pattern
}
