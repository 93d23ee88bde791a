use std::collections::HashMap;
use std::fmt;

use crate::{Column, Condition, Value};

#[derive(Debug, Clone, PartialEq)]
pub enum Query {
    Select(Select),
    InsertInto(InsertInto),
    Update(Update),
    Delete(Delete),
    CreateTable(CreateTable),
    DropTable(DropTable),
}

impl Query {
    /// Statements that add or remove tables.
    pub fn changes_schema(&self) -> bool {
        matches!(self, Query::CreateTable(_) | Query::DropTable(_))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AggregateKind {
    Count,
    Sum,
    Avg,
    Min,
    Max,
}

impl AggregateKind {
    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_uppercase().as_str() {
            "COUNT" => Some(Self::Count),
            "SUM" => Some(Self::Sum),
            "AVG" => Some(Self::Avg),
            "MIN" => Some(Self::Min),
            "MAX" => Some(Self::Max),
            _ => None,
        }
    }
}

impl fmt::Display for AggregateKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Count => "COUNT",
            Self::Sum => "SUM",
            Self::Avg => "AVG",
            Self::Min => "MIN",
            Self::Max => "MAX",
        };
        f.write_str(name)
    }
}

/// `COUNT(*)`, `SUM(salary)`, ...
#[derive(Debug, Clone, PartialEq)]
pub struct AggregateFunction {
    pub function: AggregateKind,
    /// Argument column, possibly qualified, or `*`.
    pub column: String,
    /// The expression as written; used as the result column name.
    pub alias: String,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SelectItem {
    /// `*`
    Star,
    /// `alias.*` or `table.*`
    QualifiedStar(String),
    /// A column name, possibly `qualifier.column`.
    Column(String),
    Aggregate(AggregateFunction),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinType {
    Inner,
    Left,
    Right,
}

#[derive(Debug, Clone, PartialEq)]
pub struct JoinClause {
    pub join_type: JoinType,
    pub table: String,
    pub alias: Option<String>,
    /// Bare column name of the left side of `ON`.
    pub left_column: String,
    /// Bare column name of the right side of `ON`.
    pub right_column: String,
    /// Qualifiers written on each side of `ON`, if any.
    pub left_qualifier: Option<String>,
    pub right_qualifier: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

#[derive(Debug, Clone, PartialEq)]
pub struct OrderByClause {
    pub column: String,
    pub direction: SortDirection,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Select {
    pub items: Vec<SelectItem>,
    pub table: String,
    pub alias: Option<String>,
    /// Alias -> real table name, for the FROM table and every join.
    pub aliases: HashMap<String, String>,
    pub joins: Vec<JoinClause>,
    pub where_clause: Condition,
    pub group_by: Vec<String>,
    pub order_by: Vec<OrderByClause>,
}

impl Select {
    /// Non-aggregate items as written (`*`, `u.*`, `name`, `u.name`).
    pub fn columns(&self) -> Vec<String> {
        self.items
            .iter()
            .filter_map(|item| match item {
                SelectItem::Star => Some("*".to_string()),
                SelectItem::QualifiedStar(q) => Some(format!("{q}.*")),
                SelectItem::Column(c) => Some(c.clone()),
                SelectItem::Aggregate(_) => None,
            })
            .collect()
    }

    pub fn aggregates(&self) -> Vec<&AggregateFunction> {
        self.items
            .iter()
            .filter_map(|item| match item {
                SelectItem::Aggregate(agg) => Some(agg),
                _ => None,
            })
            .collect()
    }

    pub fn has_aggregates(&self) -> bool {
        self.items
            .iter()
            .any(|item| matches!(item, SelectItem::Aggregate(_)))
    }

    /// `true` for a plain `SELECT *`.
    pub fn is_star(&self) -> bool {
        matches!(self.items.as_slice(), [SelectItem::Star])
    }

    /// Names a `WHERE` column may be qualified with: the FROM table and its alias.
    pub fn qualifiers(&self) -> Vec<&str> {
        std::iter::once(self.table.as_str())
            .chain(self.alias.as_deref())
            .collect()
    }

    /// Resolves a qualifier through the alias map. Unknown qualifiers are
    /// taken to be table names.
    pub fn resolve_table<'a>(&'a self, qualifier: &'a str) -> &'a str {
        self.aliases
            .get(qualifier)
            .map(String::as_str)
            .unwrap_or(qualifier)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct InsertInto {
    pub table: String,
    /// Target columns of the partial-column form.
    pub columns: Option<Vec<String>>,
    pub values: Vec<Value>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Update {
    pub table: String,
    pub alias: Option<String>,
    /// `SET` assignments in the order written.
    pub assignments: Vec<(String, Value)>,
    pub where_clause: Condition,
}

impl Update {
    pub fn qualifiers(&self) -> Vec<&str> {
        std::iter::once(self.table.as_str())
            .chain(self.alias.as_deref())
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Delete {
    pub table: String,
    pub alias: Option<String>,
    pub where_clause: Condition,
}

impl Delete {
    pub fn qualifiers(&self) -> Vec<&str> {
        std::iter::once(self.table.as_str())
            .chain(self.alias.as_deref())
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CreateTable {
    pub name: String,
    pub columns: Vec<Column>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DropTable {
    pub names: Vec<String>,
    pub if_exists: bool,
}
