//! Flat-file codec for tables.
//!
//! One file per table, one record per line, fields separated by commas with
//! no quoting or escaping:
//!
//! 1. column names
//! 2. type tokens (`INT`, `VARCHAR`, `FLOAT`, `BOOL`, `DATE`, anything else is `STRING`)
//! 3. primary-key flags (`1`/`0`)
//! 4. foreign-key flags (`1`/`0`)
//! 5. referenced table names (empty when none)
//! 6. referenced column names (empty when none)
//! 7. and on: one row per line, `null` for NULL values
//!
//! A value containing a comma or a newline cannot be represented.

use std::fs;
use std::path::Path;

use tracing::warn;

use crate::column::Column;
use crate::data_type::DataType;
use crate::error::Result;
use crate::row::Row;
use crate::table::Table;
use crate::value::Value;

const NULL_FIELD: &str = "null";

/// Serializes `table` into the flat-file layout.
pub fn encode(table: &Table) -> String {
    let columns = table.columns();
    let flag = |b: bool| (if b { "1" } else { "0" }).to_string();

    let mut out = String::new();
    for line in [
        header_line(columns, |c| c.name.clone()),
        header_line(columns, |c| c.data_type.file_token().to_string()),
        header_line(columns, |c| flag(c.is_primary_key)),
        header_line(columns, |c| flag(c.is_foreign_key)),
        header_line(columns, |c| c.foreign_table.clone()),
        header_line(columns, |c| c.foreign_column.clone()),
    ] {
        out.push_str(&line);
        out.push('\n');
    }

    for row in table.rows() {
        let fields: Vec<&str> = row
            .values
            .iter()
            .map(|v| if v.is_null() { NULL_FIELD } else { v.data.as_str() })
            .collect();
        out.push_str(&fields.join(","));
        out.push('\n');
    }
    out
}

fn header_line(columns: &[Column], field: impl Fn(&Column) -> String) -> String {
    columns.iter().map(field).collect::<Vec<_>>().join(",")
}

fn read_header(line: Option<&str>, columns: &mut [Column], apply: impl Fn(&mut Column, &str)) {
    if let Some(line) = line {
        for (column, field) in columns.iter_mut().zip(line.split(',')) {
            apply(column, field);
        }
    }
}

/// Rebuilds a table named `name` from the flat-file layout.
///
/// Malformed input never fails: missing header lines leave the schema
/// partially filled, and rows with fewer fields than columns are skipped.
/// Fields beyond the last column are dropped. An empty line is a row with a
/// single empty field.
pub fn decode(name: &str, text: &str) -> Table {
    // only the piece after the final newline is not a line
    let body = text.strip_suffix('\n').unwrap_or(text);
    let mut lines = body
        .split('\n')
        .map(|line| line.strip_suffix('\r').unwrap_or(line));

    let mut columns: Vec<Column> = match lines.next() {
        Some(line) if !line.is_empty() => line
            .split(',')
            .map(|n| Column::new(n, DataType::String))
            .collect(),
        _ => Vec::new(),
    };

    read_header(lines.next(), &mut columns, |c, f| {
        c.data_type = DataType::from_file_token(f)
    });
    read_header(lines.next(), &mut columns, |c, f| c.is_primary_key = f == "1");
    read_header(lines.next(), &mut columns, |c, f| c.is_foreign_key = f == "1");
    read_header(lines.next(), &mut columns, |c, f| c.foreign_table = f.to_string());
    read_header(lines.next(), &mut columns, |c, f| c.foreign_column = f.to_string());

    let mut table = Table::new(name, columns);
    let mut skipped = 0;
    for line in lines {
        let fields: Vec<&str> = line.split(',').collect();
        if fields.len() < table.columns().len() {
            skipped += 1;
            continue;
        }
        let values = table
            .columns()
            .iter()
            .zip(fields)
            .map(|(column, field)| {
                if field.eq_ignore_ascii_case(NULL_FIELD) {
                    Value::null(column.data_type)
                } else {
                    Value::new(column.data_type, field)
                }
            })
            .collect();
        table.push_unchecked(Row::new(values));
    }
    if skipped > 0 {
        warn!(table = name, skipped, "skipped short rows while decoding table");
    }
    table
}

impl Table {
    /// Replaces this table's schema and rows with the content of `path`.
    pub fn load_from_csv(&mut self, path: impl AsRef<Path>) -> Result<()> {
        let text = fs::read_to_string(path)?;
        let table = decode(self.name(), &text);
        *self = table;
        Ok(())
    }

    /// Writes the table to `path`, replacing any previous content.
    pub fn save_to_csv(&self, path: impl AsRef<Path>) -> Result<()> {
        fs::write(path, encode(self))?;
        Ok(())
    }
}
