use std::fmt;

use crate::column::Column;
use crate::error::{Error, Result};
use crate::row::Row;
use crate::value::Value;

/// Comparison operators allowed in a leaf condition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareOp {
    Eq,
    /// `!=` and `<>`.
    NotEq,
    Lt,
    Gt,
    LtEq,
    GtEq,
}

impl CompareOp {
    pub fn from_symbol(symbol: &str) -> Option<Self> {
        match symbol {
            "=" => Some(Self::Eq),
            "!=" | "<>" => Some(Self::NotEq),
            "<" => Some(Self::Lt),
            ">" => Some(Self::Gt),
            "<=" => Some(Self::LtEq),
            ">=" => Some(Self::GtEq),
            _ => None,
        }
    }

    /// Applies the operator. Any NULL operand yields `false`.
    pub fn apply(&self, left: &Value, right: &Value) -> bool {
        match self {
            Self::Eq => left.sql_eq(right),
            Self::NotEq => left.sql_ne(right),
            Self::Lt => left.sql_lt(right),
            Self::Gt => left.sql_gt(right),
            Self::LtEq => left.sql_lt(right) || left.sql_eq(right),
            Self::GtEq => left.sql_gt(right) || left.sql_eq(right),
        }
    }
}

impl fmt::Display for CompareOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let symbol = match self {
            Self::Eq => "=",
            Self::NotEq => "!=",
            Self::Lt => "<",
            Self::Gt => ">",
            Self::LtEq => "<=",
            Self::GtEq => ">=",
        };
        f.write_str(symbol)
    }
}

/// A WHERE predicate.
///
/// `All` is what a statement without a WHERE clause carries: it matches
/// every row.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Condition {
    #[default]
    All,
    Leaf {
        column: String,
        op: CompareOp,
        value: Value,
    },
    And(Box<Condition>, Box<Condition>),
    Or(Box<Condition>, Box<Condition>),
}

impl Condition {
    pub fn leaf(column: impl Into<String>, op: CompareOp, value: Value) -> Self {
        Self::Leaf {
            column: column.into(),
            op,
            value,
        }
    }

    pub fn and(left: Condition, right: Condition) -> Self {
        Self::And(Box::new(left), Box::new(right))
    }

    pub fn or(left: Condition, right: Condition) -> Self {
        Self::Or(Box::new(left), Box::new(right))
    }

    pub fn is_all(&self) -> bool {
        matches!(self, Self::All)
    }

    /// Evaluates the predicate against `row`, resolving column names through
    /// `columns`.
    ///
    /// Column lookup is by bare name only. A column that is not in the schema,
    /// or whose index is past the end of the row, makes the leaf `false`.
    /// Both sides of AND/OR are always evaluated.
    pub fn evaluate(&self, row: &Row, columns: &[Column]) -> bool {
        match self {
            Self::All => true,
            Self::Leaf { column, op, value } => {
                let Some(idx) = columns.iter().position(|c| &c.name == column) else {
                    return false;
                };
                let Some(row_value) = row.get(idx) else {
                    return false;
                };
                op.apply(row_value, value)
            }
            Self::And(left, right) => {
                let l = left.evaluate(row, columns);
                let r = right.evaluate(row, columns);
                l && r
            }
            Self::Or(left, right) => {
                let l = left.evaluate(row, columns);
                let r = right.evaluate(row, columns);
                l || r
            }
        }
    }

    /// Every column name referenced by a leaf, in left-to-right order.
    pub fn columns(&self) -> Vec<&str> {
        let mut out = Vec::new();
        self.collect_columns(&mut out);
        out
    }

    fn collect_columns<'a>(&'a self, out: &mut Vec<&'a str>) {
        match self {
            Self::All => {}
            Self::Leaf { column, .. } => out.push(column),
            Self::And(left, right) | Self::Or(left, right) => {
                left.collect_columns(out);
                right.collect_columns(out);
            }
        }
    }

    /// Rewrites every `qualifier.column` reference to the bare `column`.
    ///
    /// Only the names in `qualifiers` (a table name and its alias) may be
    /// stripped; any other qualifier points at a column this statement cannot
    /// see and is reported as not found.
    pub fn strip_qualifiers(&mut self, qualifiers: &[&str]) -> Result<()> {
        match self {
            Self::All => Ok(()),
            Self::Leaf { column, .. } => {
                if let Some((qualifier, bare)) = column.split_once('.') {
                    if !qualifiers.contains(&qualifier) {
                        return Err(Error::ColumnNotFound(column.clone()));
                    }
                    *column = bare.to_string();
                }
                Ok(())
            }
            Self::And(left, right) | Self::Or(left, right) => {
                left.strip_qualifiers(qualifiers)?;
                right.strip_qualifiers(qualifiers)
            }
        }
    }
}
