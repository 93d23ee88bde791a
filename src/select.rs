//! The SELECT pipeline.
//!
//! Stages run in a fixed order: filter the base table, apply every join,
//! group and aggregate, sort, then project.

use std::collections::HashMap;

use bitvec::prelude::*;
use tracing::debug;

use crate::ast::{
    AggregateFunction, AggregateKind, JoinClause, JoinType, Select, SelectItem, SortDirection,
};
use crate::column::Column;
use crate::data_type::DataType;
use crate::database::Database;
use crate::error::{Error, Result};
use crate::row::Row;
use crate::value::Value;

/// Key of the single implicit group of an aggregate query without `GROUP BY`.
const ALL_ROWS_GROUP: &str = "ALL";

/// Columns and rows produced by a SELECT.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResultSet {
    pub columns: Vec<Column>,
    pub rows: Vec<Row>,
}

impl ResultSet {
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }
}

/// Intermediate rows, with the table every column came from.
struct Relation {
    columns: Vec<Column>,
    /// Real table name per column; empty for computed columns.
    sources: Vec<String>,
    rows: Vec<Row>,
}

impl Relation {
    /// Finds `name`, which may be `qualifier.column`. A qualified name prefers
    /// the column of that table and falls back to the bare name.
    fn index_of(&self, select: &Select, name: &str) -> Option<usize> {
        match name.split_once('.') {
            Some((qualifier, column)) => {
                let table = select.resolve_table(qualifier);
                self.columns
                    .iter()
                    .zip(&self.sources)
                    .position(|(c, source)| c.name == column && source == table)
                    .or_else(|| self.bare_index(column))
            }
            None => self.bare_index(name),
        }
    }

    fn bare_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c.name == name)
    }

    fn require(&self, select: &Select, name: &str) -> Result<usize> {
        self.index_of(select, name)
            .ok_or_else(|| Error::ColumnNotFound(name.to_string()))
    }
}

/// Runs `select` against `db`.
pub fn execute_select(select: &Select, db: &Database) -> Result<ResultSet> {
    let base = db
        .get_table(&select.table)
        .ok_or_else(|| Error::TableNotFound(select.table.clone()))?;

    let mut filter = select.where_clause.clone();
    filter.strip_qualifiers(&select.qualifiers())?;
    if let Some(missing) = filter
        .columns()
        .into_iter()
        .find(|c| base.column_index(c).is_none())
    {
        return Err(Error::ColumnNotFound(missing.to_string()));
    }

    let mut relation = Relation {
        columns: base.columns().to_vec(),
        sources: vec![base.name().to_string(); base.columns().len()],
        rows: base.select_rows(&filter),
    };

    for join in &select.joins {
        relation = apply_join(select, relation, join, db)?;
    }

    let grouped = !select.group_by.is_empty() || select.has_aggregates();
    if grouped {
        relation = group(select, relation)?;
    }

    sort(select, &mut relation)?;

    let result = if grouped || select.is_star() {
        ResultSet {
            columns: relation.columns,
            rows: relation.rows,
        }
    } else {
        project(select, relation)?
    };

    debug!(
        table = %select.table,
        columns = result.columns.len(),
        rows = result.rows.len(),
        "select finished"
    );
    Ok(result)
}

// ─────────────────────────── joins ───────────────────────────

fn apply_join(
    select: &Select,
    left: Relation,
    join: &JoinClause,
    db: &Database,
) -> Result<Relation> {
    let right = db
        .get_table(&join.table)
        .ok_or_else(|| Error::TableNotFound(join.table.clone()))?;

    let names_joined = |qualifier: &Option<String>| {
        qualifier
            .as_deref()
            .is_some_and(|q| select.resolve_table(q) == join.table)
    };
    let mut outer = (join.left_qualifier.as_deref(), join.left_column.as_str());
    let mut inner = join.right_column.as_str();
    if names_joined(&join.left_qualifier) && !names_joined(&join.right_qualifier) {
        outer = (join.right_qualifier.as_deref(), join.right_column.as_str());
        inner = join.left_column.as_str();
    }

    let outer_name = match outer.0 {
        Some(q) => format!("{q}.{}", outer.1),
        None => outer.1.to_string(),
    };
    let left_idx = left.require(select, &outer_name)?;
    let right_idx = right
        .column_index(inner)
        .ok_or_else(|| Error::ColumnNotFound(format!("{}.{inner}", join.table)))?;

    let matches = |l: &Row, r: &Row| match (l.get(left_idx), r.get(right_idx)) {
        (Some(a), Some(b)) => !a.is_null() && !b.is_null() && a.data == b.data,
        _ => false,
    };

    let mut rows = Vec::new();
    match join.join_type {
        JoinType::Inner => {
            for l in &left.rows {
                for r in right.rows() {
                    if matches(l, r) {
                        rows.push(l.concat(r));
                    }
                }
            }
        }
        JoinType::Left => {
            let padding = Row::nulls(right.columns());
            for l in &left.rows {
                let before = rows.len();
                for r in right.rows() {
                    if matches(l, r) {
                        rows.push(l.concat(r));
                    }
                }
                if rows.len() == before {
                    rows.push(l.concat(&padding));
                }
            }
        }
        JoinType::Right => {
            let padding = Row::nulls(&left.columns);
            let mut matched = bitvec![0; right.row_count()];
            for l in &left.rows {
                for (j, r) in right.rows().iter().enumerate() {
                    if matches(l, r) {
                        rows.push(l.concat(r));
                        matched.set(j, true);
                    }
                }
            }
            for j in matched.iter_zeros() {
                rows.push(padding.concat(&right.rows()[j]));
            }
        }
    }

    let mut columns = left.columns;
    let mut sources = left.sources;
    columns.extend(right.columns().iter().cloned());
    sources.extend(std::iter::repeat_n(join.table.clone(), right.columns().len()));

    Ok(Relation {
        columns,
        sources,
        rows,
    })
}

// ─────────────────────────── grouping ───────────────────────────

enum Output<'a> {
    Column(usize),
    Aggregate(&'a AggregateFunction, Option<usize>),
}

fn group(select: &Select, relation: Relation) -> Result<Relation> {
    let keys = select
        .group_by
        .iter()
        .map(|name| relation.require(select, name))
        .collect::<Result<Vec<_>>>()?;

    let resolve_aggregate = |agg: &AggregateFunction| -> Result<Option<usize>> {
        if agg.column == "*" {
            Ok(None)
        } else {
            relation.require(select, &agg.column).map(Some)
        }
    };

    let lists_columns = select
        .items
        .iter()
        .any(|item| matches!(item, SelectItem::Column(_)));
    let mut outputs = Vec::new();
    if lists_columns {
        for item in &select.items {
            match item {
                SelectItem::Column(name) => {
                    outputs.push(Output::Column(relation.require(select, name)?));
                }
                SelectItem::Aggregate(agg) => {
                    outputs.push(Output::Aggregate(agg, resolve_aggregate(agg)?));
                }
                SelectItem::Star | SelectItem::QualifiedStar(_) => {}
            }
        }
    } else {
        outputs.extend(keys.iter().map(|&idx| Output::Column(idx)));
        for agg in select.aggregates() {
            outputs.push(Output::Aggregate(agg, resolve_aggregate(agg)?));
        }
    }

    // Groups in order of first appearance.
    let mut groups: Vec<Vec<&Row>> = Vec::new();
    let mut group_index: HashMap<String, usize> = HashMap::new();
    if keys.is_empty() {
        group_index.insert(ALL_ROWS_GROUP.to_string(), 0);
        groups.push(relation.rows.iter().collect());
    } else {
        for row in &relation.rows {
            let key = keys
                .iter()
                .map(|&idx| row[idx].to_string())
                .collect::<Vec<_>>()
                .join("|");
            let slot = *group_index.entry(key).or_insert_with(|| {
                groups.push(Vec::new());
                groups.len() - 1
            });
            groups[slot].push(row);
        }
    }

    let mut columns = Vec::with_capacity(outputs.len());
    let mut sources = Vec::with_capacity(outputs.len());
    for output in &outputs {
        match output {
            Output::Column(idx) => {
                columns.push(relation.columns[*idx].clone());
                sources.push(relation.sources[*idx].clone());
            }
            Output::Aggregate(agg, _) => {
                columns.push(Column::new(agg.alias.clone(), DataType::Float));
                sources.push(String::new());
            }
        }
    }

    let rows = groups
        .iter()
        .map(|members| {
            let values = outputs
                .iter()
                .map(|output| match output {
                    Output::Column(idx) => members.first().map_or_else(
                        || Value::null(relation.columns[*idx].data_type),
                        |first| first[*idx].clone(),
                    ),
                    Output::Aggregate(agg, idx) => aggregate(agg.function, *idx, members),
                })
                .collect();
            Row::new(values)
        })
        .collect();

    Ok(Relation {
        columns,
        sources,
        rows,
    })
}

/// Computes one aggregate over a group. `column` is `None` for `COUNT(*)`.
///
/// Every other aggregate, `COUNT(column)` included, reads the values as
/// numbers and skips NULLs and values that do not parse. With nothing to read
/// `COUNT` is 0 and the others are NULL.
fn aggregate(function: AggregateKind, column: Option<usize>, rows: &[&Row]) -> Value {
    let Some(idx) = column else {
        return Value::float(rows.len() as f64);
    };
    let numbers: Vec<f64> = rows
        .iter()
        .filter_map(|row| row.get(idx))
        .filter_map(Value::as_f64)
        .collect();

    if function == AggregateKind::Count {
        return Value::float(numbers.len() as f64);
    }
    if numbers.is_empty() {
        return Value::null(DataType::Float);
    }
    let result = match function {
        AggregateKind::Sum => numbers.iter().sum(),
        AggregateKind::Avg => numbers.iter().sum::<f64>() / numbers.len() as f64,
        AggregateKind::Min => numbers.iter().copied().fold(f64::INFINITY, f64::min),
        AggregateKind::Max => numbers.iter().copied().fold(f64::NEG_INFINITY, f64::max),
        AggregateKind::Count => numbers.len() as f64,
    };
    Value::float(result)
}

// ─────────────────────────── ordering & projection ───────────────────────────

fn sort(select: &Select, relation: &mut Relation) -> Result<()> {
    if select.order_by.is_empty() {
        return Ok(());
    }
    let rules = select
        .order_by
        .iter()
        .map(|rule| Ok((relation.require(select, &rule.column)?, rule.direction)))
        .collect::<Result<Vec<_>>>()?;

    relation.rows.sort_by(|a, b| {
        rules
            .iter()
            .map(|&(idx, direction)| {
                let (left, right) = (&a[idx], &b[idx]);
                let ordering = left.sort_cmp(right);
                // NULLs stay last whichever the direction
                match direction {
                    SortDirection::Desc if !left.is_null() && !right.is_null() => {
                        ordering.reverse()
                    }
                    _ => ordering,
                }
            })
            .find(|ordering| ordering.is_ne())
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    Ok(())
}

fn project(select: &Select, relation: Relation) -> Result<ResultSet> {
    let mut picked = Vec::new();
    for item in &select.items {
        match item {
            SelectItem::Star => picked.extend(0..relation.columns.len()),
            SelectItem::QualifiedStar(qualifier) => {
                let table = select.resolve_table(qualifier);
                let before = picked.len();
                picked.extend(
                    relation
                        .sources
                        .iter()
                        .enumerate()
                        .filter(|(_, source)| *source == table)
                        .map(|(i, _)| i),
                );
                if picked.len() == before {
                    return Err(Error::ColumnNotFound(format!("{qualifier}.*")));
                }
            }
            SelectItem::Column(name) => picked.push(relation.require(select, name)?),
            // Aggregate queries are answered by `group`.
            SelectItem::Aggregate(_) => {}
        }
    }

    let columns = picked
        .iter()
        .map(|&i| relation.columns[i].clone())
        .collect();
    let rows = relation
        .rows
        .iter()
        .map(|row| Row::new(picked.iter().map(|&i| row[i].clone()).collect()))
        .collect();
    Ok(ResultSet { columns, rows })
}
