use tracing::{debug, warn};

use crate::ast::{CreateTable, Delete, DropTable, InsertInto, Query, Update};
use crate::column::Column;
use crate::database::Database;
use crate::error::{Error, Result};
use crate::parser::Parser;
use crate::row::Row;
use crate::select::execute_select;
use crate::table::Table;
use crate::value::Value;

type TextCallback = Box<dyn FnMut(&str)>;
type ResultTableCallback = Box<dyn FnMut(&[Column], &[Row])>;
type NotifyCallback = Box<dyn FnMut()>;

/// What a successfully executed statement produced.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExecutionOutcome {
    /// Human readable summary, e.g. `2 row(s) updated`.
    pub message: String,
    /// Result columns; only set for `SELECT`.
    pub columns: Option<Vec<Column>>,
    /// Result rows; only set for `SELECT`.
    pub rows: Option<Vec<Row>>,
    /// `true` when tables were created or dropped.
    pub schema_changed: bool,
}

impl ExecutionOutcome {
    fn message(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            ..Self::default()
        }
    }
}

/// Runs parsed statements against a [Database].
///
/// Every statement either fully succeeds or leaves the database unchanged.
/// Results are returned as an [ExecutionOutcome] and also pushed to the
/// callbacks, which all default to no-ops:
///
/// * `output`: the success message of each statement.
/// * `error`: the text of each failure.
/// * `result_table`: the columns and rows of each `SELECT`.
/// * `schema_changed`: fired after `CREATE TABLE` and `DROP TABLE`.
///
/// Tables touched by a successful write are saved to their file right away,
/// unless autosave is turned off. A failed save is logged and does not fail
/// the statement.
///
/// # Example
/// ```
/// use flatdb::{Database, QueryExecutor};
///
/// let mut db = Database::in_memory();
/// let mut executor = QueryExecutor::new();
/// executor.run("CREATE TABLE users (id INT PRIMARY KEY, name VARCHAR)", &mut db).unwrap();
/// executor.run("INSERT INTO users VALUES (1, 'Alice')", &mut db).unwrap();
///
/// let outcome = executor.run("SELECT name FROM users WHERE id = 1", &mut db).unwrap();
/// let rows = outcome.rows.unwrap();
/// assert_eq!(rows[0][0].data, "Alice");
/// assert_eq!(outcome.message, "(1 row(s) selected)");
/// ```
pub struct QueryExecutor {
    output: TextCallback,
    error: TextCallback,
    result_table: ResultTableCallback,
    schema_changed: NotifyCallback,
    autosave: bool,
}

impl Default for QueryExecutor {
    fn default() -> Self {
        Self::new()
    }
}

impl QueryExecutor {
    pub fn new() -> Self {
        Self {
            output: Box::new(|_| {}),
            error: Box::new(|_| {}),
            result_table: Box::new(|_, _| {}),
            schema_changed: Box::new(|| {}),
            autosave: true,
        }
    }

    pub fn on_output(mut self, callback: impl FnMut(&str) + 'static) -> Self {
        self.output = Box::new(callback);
        self
    }

    pub fn on_error(mut self, callback: impl FnMut(&str) + 'static) -> Self {
        self.error = Box::new(callback);
        self
    }

    pub fn on_result_table(mut self, callback: impl FnMut(&[Column], &[Row]) + 'static) -> Self {
        self.result_table = Box::new(callback);
        self
    }

    pub fn on_schema_changed(mut self, callback: impl FnMut() + 'static) -> Self {
        self.schema_changed = Box::new(callback);
        self
    }

    /// Turns per-statement saving on or off.
    pub fn with_autosave(mut self, autosave: bool) -> Self {
        self.autosave = autosave;
        self
    }

    /// Parses and executes one statement. A parse failure is reported like
    /// any other error.
    pub fn run(&mut self, sql: &str, db: &mut Database) -> Result<ExecutionOutcome> {
        match Parser::parse_sql(sql) {
            Ok(query) => self.execute(&query, db),
            Err(e) => {
                (self.error)(&e.to_string());
                Err(e)
            }
        }
    }

    /// Executes one parsed statement.
    ///
    /// # Errors
    /// Unknown tables or columns, type mismatches and constraint violations
    /// are returned, and passed to the error callback, without touching the
    /// database.
    pub fn execute(&mut self, query: &Query, db: &mut Database) -> Result<ExecutionOutcome> {
        debug!(?query, "executing statement");

        let result = match query {
            Query::Select(select) => execute_select(select, db).map(|result| {
                (self.result_table)(&result.columns, &result.rows);
                ExecutionOutcome {
                    message: format!("({} row(s) selected)", result.row_count()),
                    columns: Some(result.columns),
                    rows: Some(result.rows),
                    schema_changed: false,
                }
            }),
            Query::InsertInto(insert) => self.insert(insert, db),
            Query::Update(update) => self.update(update, db),
            Query::Delete(delete) => self.delete(delete, db),
            Query::CreateTable(create) => self.create_table(create, db),
            Query::DropTable(drop) => Self::drop_tables(drop, db),
        };

        match result {
            Ok(outcome) => {
                (self.output)(&outcome.message);
                if outcome.schema_changed {
                    (self.schema_changed)();
                }
                Ok(outcome)
            }
            Err(e) => {
                debug!(error = %e, "statement failed");
                (self.error)(&e.to_string());
                Err(e)
            }
        }
    }

    /// Inserts one row.
    ///
    /// 1. Resolves the target columns: every column of the table, or the
    ///    listed ones in the partial form (the rest become NULL).
    /// 2. Checks the number of values and the type of each value.
    /// 3. Hands the row to the table, which checks keys.
    fn insert(&self, insert: &InsertInto, db: &mut Database) -> Result<ExecutionOutcome> {
        let table = lookup(db, &insert.table)?;

        let row = match &insert.columns {
            Some(names) => {
                if names.len() != insert.values.len() {
                    return Err(Error::ColumnCountMismatch {
                        expected: names.len(),
                        found: insert.values.len(),
                    });
                }
                let values = names
                    .iter()
                    .zip(&insert.values)
                    .map(|(name, value)| {
                        let column = table
                            .get_col(name)
                            .ok_or_else(|| Error::ColumnNotFound(name.clone()))?;
                        coerce(column, value)
                    })
                    .collect::<Result<Vec<_>>>()?;
                table.build_partial_row(names, &values)
            }
            None => {
                if insert.values.len() != table.columns().len() {
                    return Err(Error::ColumnCountMismatch {
                        expected: table.columns().len(),
                        found: insert.values.len(),
                    });
                }
                let values = table
                    .columns()
                    .iter()
                    .zip(&insert.values)
                    .map(|(column, value)| coerce(column, value))
                    .collect::<Result<Vec<_>>>()?;
                Row::new(values)
            }
        };

        db.insert_row(&insert.table, row)?;
        self.persist(db, &insert.table);
        Ok(ExecutionOutcome::message("1 row inserted"))
    }

    /// Updates every matching row, or none of them if any updated row would
    /// break a constraint.
    fn update(&self, update: &Update, db: &mut Database) -> Result<ExecutionOutcome> {
        let table = lookup(db, &update.table)?;

        let qualifiers = update.qualifiers();
        let mut filter = update.where_clause.clone();
        filter.strip_qualifiers(&qualifiers)?;
        check_columns(table, filter.columns())?;

        let assignments = update
            .assignments
            .iter()
            .map(|(name, value)| {
                let name = unqualify(name, &qualifiers)?;
                let column = table
                    .get_col(name)
                    .ok_or_else(|| Error::ColumnNotFound(name.to_string()))?;
                Ok((name.to_string(), coerce(column, value)?))
            })
            .collect::<Result<Vec<_>>>()?;

        let count = db.update_rows(&update.table, &filter, &assignments)?;
        self.persist(db, &update.table);
        Ok(ExecutionOutcome::message(format!("{count} row(s) updated")))
    }

    fn delete(&self, delete: &Delete, db: &mut Database) -> Result<ExecutionOutcome> {
        let table = lookup(db, &delete.table)?;

        let mut filter = delete.where_clause.clone();
        filter.strip_qualifiers(&delete.qualifiers())?;
        check_columns(table, filter.columns())?;

        let count = db.delete_rows(&delete.table, &filter)?;
        self.persist(db, &delete.table);
        Ok(ExecutionOutcome::message(format!("{count} row(s) deleted")))
    }

    fn create_table(&self, create: &CreateTable, db: &mut Database) -> Result<ExecutionOutcome> {
        db.create_table(&create.name, create.columns.clone())?;
        self.persist(db, &create.name);
        Ok(ExecutionOutcome {
            message: format!("Table '{}' created", create.name),
            schema_changed: true,
            ..ExecutionOutcome::default()
        })
    }

    /// Drops the listed tables. Without `IF EXISTS` a missing table fails the
    /// whole statement before anything is dropped; with it, missing tables are
    /// skipped.
    fn drop_tables(drop: &DropTable, db: &mut Database) -> Result<ExecutionOutcome> {
        if !drop.if_exists {
            if let Some(missing) = drop.names.iter().find(|name| !db.has_table(name)) {
                return Err(Error::TableNotFound(missing.clone()));
            }
        }

        let mut dropped = 0;
        for name in &drop.names {
            if db.has_table(name) {
                db.drop_table(name)?;
                dropped += 1;
            }
        }

        let message = if dropped == 0 {
            "No tables dropped".to_string()
        } else {
            format!("{dropped} table(s) dropped")
        };
        Ok(ExecutionOutcome {
            message,
            schema_changed: dropped > 0,
            ..ExecutionOutcome::default()
        })
    }

    fn persist(&self, db: &Database, table: &str) {
        if !self.autosave {
            return;
        }
        if let Err(e) = db.save_table(table) {
            warn!(table, error = %e, "failed to save table");
        }
    }
}

fn lookup<'a>(db: &'a Database, name: &str) -> Result<&'a Table> {
    db.get_table(name)
        .ok_or_else(|| Error::TableNotFound(name.to_string()))
}

fn check_columns(table: &Table, names: Vec<&str>) -> Result<()> {
    match names.into_iter().find(|name| table.column_index(name).is_none()) {
        Some(missing) => Err(Error::ColumnNotFound(missing.to_string())),
        None => Ok(()),
    }
}

/// `alias.column` -> `column`, provided the qualifier is one of `qualifiers`.
fn unqualify<'a>(name: &'a str, qualifiers: &[&str]) -> Result<&'a str> {
    match name.split_once('.') {
        None => Ok(name),
        Some((qualifier, column)) if qualifiers.contains(&qualifier) => Ok(column),
        Some(_) => Err(Error::ColumnNotFound(name.to_string())),
    }
}

/// Checks that `value` fits `column` and returns it typed as the column.
fn coerce(column: &Column, value: &Value) -> Result<Value> {
    if !value.is_valid_for_type(column.data_type) {
        return Err(Error::TypeMismatch {
            column: column.name.clone(),
            value: value.to_string(),
            expected: column.data_type.to_string(),
        });
    }
    Ok(value.clone().with_type(column.data_type))
}
