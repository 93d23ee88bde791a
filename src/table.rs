use std::collections::HashMap;

use allocative::Allocative;
use bitvec::prelude::*;

use crate::column::Column;
use crate::condition::Condition;
use crate::database::Database;
use crate::error::{Error, Result};
use crate::row::Row;
use crate::value::{NULL_TOKEN, Value};

/// A named, schema-bound row store.
///
/// `name_to_index` always mirrors `columns`, and every stored row has exactly
/// one value per column.
#[derive(Debug, Clone, Allocative)]
pub struct Table {
    name: String,
    columns: Vec<Column>,
    rows: Vec<Row>,
    name_to_index: HashMap<String, usize>,
}

/// Rows an UPDATE would write, as `(row index, new row)` pairs.
pub type UpdatePlan = Vec<(usize, Row)>;

impl Table {
    pub fn new(name: impl Into<String>, columns: Vec<Column>) -> Self {
        let mut table = Self {
            name: name.into(),
            columns,
            rows: Vec::new(),
            name_to_index: HashMap::new(),
        };
        table.rebuild_index();
        table
    }

    fn rebuild_index(&mut self) {
        self.name_to_index = self
            .columns
            .iter()
            .enumerate()
            .map(|(i, c)| (c.name.clone(), i))
            .collect();
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.name_to_index.get(name).copied()
    }

    pub fn get_col(&self, name: &str) -> Option<&Column> {
        self.column_index(name).map(|i| &self.columns[i])
    }

    /// Unique heap bytes held by this table (schema, rows and index).
    pub fn memory_footprint(&self) -> usize {
        allocative::size_of_unique_allocated_data(self)
    }

    /// Appends rows read back from storage, skipping constraint checks.
    pub(crate) fn push_unchecked(&mut self, row: Row) {
        self.rows.push(row);
    }

    // ─────────────────────────── validation ───────────────────────────

    /// Checks `row` against the table's constraints as if it were stored at
    /// `position` (`None` for a new row).
    ///
    /// `others` is the full set of rows the candidate must not collide with;
    /// the entry at `position` is ignored. Foreign keys are only checked when
    /// a database is supplied.
    fn check_row(
        &self,
        row: &Row,
        position: Option<usize>,
        others: &[Row],
        db: Option<&Database>,
    ) -> Result<()> {
        if row.len() != self.columns.len() {
            return Err(Error::ColumnCountMismatch {
                expected: self.columns.len(),
                found: row.len(),
            });
        }

        for (i, column) in self.columns.iter().enumerate() {
            if !column.is_primary_key && !column.is_unique {
                continue;
            }
            let value = &row[i];
            // unique allows any number of NULLs; primary keys compare the payload
            // text even for NULL
            if !column.is_primary_key && value.is_null() {
                continue;
            }
            let key = key_text(value);
            let duplicate = others
                .iter()
                .enumerate()
                .filter(|(j, _)| Some(*j) != position)
                .any(|(_, other)| other.get(i).is_some_and(|v| key_text(v) == key));
            if duplicate {
                let column = column.name.clone();
                let value = key.to_string();
                return Err(if self.columns[i].is_primary_key {
                    Error::PrimaryKeyViolation { column, value }
                } else {
                    Error::UniqueViolation { column, value }
                });
            }
        }

        if let Some(db) = db {
            self.check_foreign_keys(row, db)?;
        }
        Ok(())
    }

    fn check_foreign_keys(&self, row: &Row, db: &Database) -> Result<()> {
        for (i, column) in self.columns.iter().enumerate() {
            if !column.is_foreign_key {
                continue;
            }
            let value = &row[i];
            if value.is_null() || value.data.is_empty() {
                continue;
            }

            let found = db
                .get_table(&column.foreign_table)
                .and_then(|t| t.column_index(&column.foreign_column).map(|idx| (t, idx)))
                .is_some_and(|(t, idx)| {
                    t.rows
                        .iter()
                        .any(|r| r.get(idx).is_some_and(|v| !v.is_null() && v.data == value.data))
                });
            if !found {
                return Err(Error::ForeignKeyViolation {
                    column: column.name.clone(),
                    value: value.data.clone(),
                    table: column.foreign_table.clone(),
                    foreign_column: column.foreign_column.clone(),
                });
            }
        }
        Ok(())
    }

    /// Validates a row for insertion without storing it.
    pub fn validate_insert(&self, row: &Row, db: Option<&Database>) -> Result<()> {
        self.check_row(row, None, &self.rows, db)
    }

    // ─────────────────────────── insert ───────────────────────────

    /// Appends `row` after checking width, primary key, unique and foreign key
    /// constraints. Nothing is stored on failure.
    ///
    /// Foreign keys are only checked when `db` is given.
    pub fn insert_row(&mut self, row: Row, db: Option<&Database>) -> Result<()> {
        self.validate_insert(&row, db)?;
        self.rows.push(row);
        Ok(())
    }

    /// Builds a full-width row of typed NULLs and fills the positions named in
    /// `column_names` from `values`. Unknown names are ignored.
    pub fn build_partial_row(&self, column_names: &[String], values: &[Value]) -> Row {
        let mut row = Row::nulls(&self.columns);
        for (name, value) in column_names.iter().zip(values) {
            if let Some(idx) = self.column_index(name) {
                row[idx] = value.clone();
            }
        }
        row
    }

    pub fn insert_partial_row(
        &mut self,
        column_names: &[String],
        values: &[Value],
        db: Option<&Database>,
    ) -> Result<()> {
        let row = self.build_partial_row(column_names, values);
        self.insert_row(row, db)
    }

    // ─────────────────────────── select / delete ───────────────────────────

    /// Full scan, in storage order.
    pub fn select_rows(&self, condition: &Condition) -> Vec<Row> {
        self.rows
            .iter()
            .filter(|row| condition.evaluate(row, &self.columns))
            .cloned()
            .collect()
    }

    /// Removes every row matching `condition` and returns how many went.
    /// Referencing rows in other tables are not checked.
    pub fn delete_rows(&mut self, condition: &Condition) -> usize {
        let doomed: BitVec = self
            .rows
            .iter()
            .map(|row| condition.evaluate(row, &self.columns))
            .collect();
        let removed = doomed.count_ones();

        let mut idx = 0;
        self.rows.retain(|_| {
            let keep = !doomed[idx];
            idx += 1;
            keep
        });
        removed
    }

    // ─────────────────────────── update ───────────────────────────

    /// First phase of an UPDATE: computes the new version of every matching
    /// row and validates all of them, without touching storage.
    ///
    /// Each candidate is checked against the table as it would look after the
    /// whole batch is applied, so two updated rows cannot end up sharing a key.
    pub fn plan_update(
        &self,
        condition: &Condition,
        new_values: &[(String, Value)],
        db: Option<&Database>,
    ) -> Result<UpdatePlan> {
        let mut plan = Vec::new();
        for (idx, row) in self.rows.iter().enumerate() {
            if !condition.evaluate(row, &self.columns) {
                continue;
            }
            let mut updated = row.clone();
            for (name, value) in new_values {
                if let Some(col) = self.column_index(name) {
                    updated[col] = value.clone();
                }
            }
            plan.push((idx, updated));
        }

        if plan.is_empty() {
            return Ok(plan);
        }

        let mut after = self.rows.clone();
        for (idx, row) in &plan {
            after[*idx] = row.clone();
        }
        for (idx, row) in &plan {
            self.check_row(row, Some(*idx), &after, db)?;
        }
        Ok(plan)
    }

    /// Second phase of an UPDATE: writes a validated plan.
    pub fn apply_update(&mut self, plan: UpdatePlan) -> usize {
        let count = plan.len();
        for (idx, row) in plan {
            self.rows[idx] = row;
        }
        count
    }

    /// All-or-nothing update: either every matching row is rewritten or, if any
    /// of them would break a constraint, none is.
    pub fn update_rows(
        &mut self,
        condition: &Condition,
        new_values: &[(String, Value)],
        db: Option<&Database>,
    ) -> Result<usize> {
        let plan = self.plan_update(condition, new_values, db)?;
        Ok(self.apply_update(plan))
    }
}

fn key_text(value: &Value) -> &str {
    if value.is_null() {
        NULL_TOKEN
    } else {
        &value.data
    }
}
