use std::collections::HashMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use tracing::{info, warn};

use crate::column::Column;
use crate::condition::Condition;
use crate::error::{Error, Result};
use crate::row::Row;
use crate::table::Table;
use crate::value::Value;

/// Storage directory used by [Database::default].
pub const DEFAULT_STORAGE_PATH: &str = "data";

/// Extension of table files in the storage directory.
pub const TABLE_FILE_EXTENSION: &str = "csv";

/// The registry of tables.
///
/// It owns every [Table] and knows where their files live. A database built
/// with [Database::in_memory] has no storage directory and every persistence
/// call is a no-op.
pub struct Database {
    /// A map of table names to their respective [Table] structures.
    tables: HashMap<String, Table>,
    storage_path: Option<PathBuf>,
}

impl Default for Database {
    fn default() -> Self {
        Self::new(DEFAULT_STORAGE_PATH)
    }
}

impl Database {
    /// Creates an empty database persisting to `storage_path`. Nothing is read
    /// until [Database::load_all_tables] is called.
    pub fn new(storage_path: impl Into<PathBuf>) -> Self {
        Self {
            tables: HashMap::new(),
            storage_path: Some(storage_path.into()),
        }
    }

    /// Creates an empty database without backing files.
    pub fn in_memory() -> Self {
        Self {
            tables: HashMap::new(),
            storage_path: None,
        }
    }

    pub fn storage_path(&self) -> Option<&Path> {
        self.storage_path.as_deref()
    }

    /// File backing the table `name`, if the database has storage.
    pub fn table_path(&self, name: &str) -> Option<PathBuf> {
        self.storage_path
            .as_ref()
            .map(|dir| dir.join(format!("{name}.{TABLE_FILE_EXTENSION}")))
    }

    /// Creates a new, empty table.
    ///
    /// # Errors
    /// Returns an error if a table with the same name already exists.
    pub fn create_table(&mut self, name: &str, columns: Vec<Column>) -> Result<()> {
        if self.tables.contains_key(name) {
            return Err(Error::TableExists(name.to_string()));
        }
        self.tables
            .insert(name.to_string(), Table::new(name, columns));
        Ok(())
    }

    /// Removes a table from the registry and deletes its file.
    ///
    /// # Errors
    /// Returns an error if the table does not exist. A file that cannot be
    /// deleted is logged, not reported.
    pub fn drop_table(&mut self, name: &str) -> Result<()> {
        if self.tables.remove(name).is_none() {
            return Err(Error::TableNotFound(name.to_string()));
        }
        if let Some(path) = self.table_path(name) {
            match fs::remove_file(&path) {
                Ok(()) => {}
                Err(e) if e.kind() == ErrorKind::NotFound => {}
                Err(e) => warn!(table = name, path = %path.display(), error = %e, "failed to delete table file"),
            }
        }
        Ok(())
    }

    /// Retrieves a reference to a table by name.
    pub fn get_table(&self, name: &str) -> Option<&Table> {
        self.tables.get(name)
    }

    /// Retrieves a mutable reference to a table by name.
    pub fn get_table_mut(&mut self, name: &str) -> Option<&mut Table> {
        self.tables.get_mut(name)
    }

    pub fn has_table(&self, name: &str) -> bool {
        self.tables.contains_key(name)
    }

    /// Returns the names of all tables, sorted.
    pub fn table_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.tables.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    fn table(&self, name: &str) -> Result<&Table> {
        self.get_table(name)
            .ok_or_else(|| Error::TableNotFound(name.to_string()))
    }

    fn table_mut(&mut self, name: &str) -> Result<&mut Table> {
        self.get_table_mut(name)
            .ok_or_else(|| Error::TableNotFound(name.to_string()))
    }

    // ─────────────────────────── row operations ───────────────────────────
    //
    // These validate against `&self` first, so foreign keys resolve through
    // this database, and only then borrow the table mutably.

    /// Inserts a full row into `table`, checking every constraint including
    /// foreign keys.
    pub fn insert_row(&mut self, table: &str, row: Row) -> Result<()> {
        self.table(table)?.validate_insert(&row, Some(self))?;
        self.table_mut(table)?.push_unchecked(row);
        Ok(())
    }

    /// Inserts a row built from the named columns; the others are NULL.
    pub fn insert_partial_row(
        &mut self,
        table: &str,
        column_names: &[String],
        values: &[Value],
    ) -> Result<()> {
        let row = self.table(table)?.build_partial_row(column_names, values);
        self.insert_row(table, row)
    }

    /// All-or-nothing update of the rows of `table` matching `condition`.
    pub fn update_rows(
        &mut self,
        table: &str,
        condition: &Condition,
        new_values: &[(String, Value)],
    ) -> Result<usize> {
        let plan = self
            .table(table)?
            .plan_update(condition, new_values, Some(self))?;
        Ok(self.table_mut(table)?.apply_update(plan))
    }

    pub fn delete_rows(&mut self, table: &str, condition: &Condition) -> Result<usize> {
        Ok(self.table_mut(table)?.delete_rows(condition))
    }

    // ─────────────────────────── persistence ───────────────────────────

    /// Reads every table file of the storage directory, replacing tables of
    /// the same name. Returns how many tables were loaded.
    ///
    /// A missing directory loads nothing. A file that cannot be read is logged
    /// and skipped; a malformed one loads as far as it can be decoded.
    pub fn load_all_tables(&mut self) -> Result<usize> {
        let Some(dir) = self.storage_path.clone() else {
            return Ok(0);
        };
        let entries = match fs::read_dir(&dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(0),
            Err(e) => return Err(e.into()),
        };

        let mut loaded = 0;
        for entry in entries {
            let path = entry?.path();
            if !path.is_file()
                || path.extension().and_then(|e| e.to_str()) != Some(TABLE_FILE_EXTENSION)
            {
                continue;
            }
            let Some(name) = path.file_stem().and_then(|s| s.to_str()) else {
                continue;
            };

            let mut table = Table::new(name, Vec::new());
            if let Err(e) = table.load_from_csv(&path) {
                warn!(table = name, path = %path.display(), error = %e, "failed to load table");
                continue;
            }
            self.tables.insert(name.to_string(), table);
            loaded += 1;
        }
        info!(dir = %dir.display(), tables = loaded, "loaded tables");
        Ok(loaded)
    }

    /// Writes every table to the storage directory, creating it if needed.
    pub fn save_all_tables(&self) -> Result<()> {
        let Some(dir) = &self.storage_path else {
            return Ok(());
        };
        fs::create_dir_all(dir)?;
        for name in self.table_names() {
            self.save_table(name)?;
        }
        info!(dir = %dir.display(), tables = self.tables.len(), "saved tables");
        Ok(())
    }

    /// Writes one table to its file.
    pub fn save_table(&self, name: &str) -> Result<()> {
        let table = self.table(name)?;
        let (Some(dir), Some(path)) = (&self.storage_path, self.table_path(name)) else {
            return Ok(());
        };
        fs::create_dir_all(dir)?;
        table.save_to_csv(path)
    }

    /// Unique heap bytes held by all tables.
    pub fn memory_footprint(&self) -> usize {
        self.tables.values().map(Table::memory_footprint).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::condition::CompareOp;
    use crate::data_type::DataType;
    use tempfile::tempdir;

    fn simple_schema() -> Vec<Column> {
        vec![
            Column::new("id", DataType::Integer).primary_key(),
            Column::new("name", DataType::Varchar),
        ]
    }

    fn user(id: i64, name: &str) -> Row {
        Row::new(vec![Value::integer(id), Value::new(DataType::Varchar, name)])
    }

    #[test]
    fn test_create_and_drop_table() {
        let mut db = Database::in_memory();

        assert!(db.create_table("users", simple_schema()).is_ok());
        assert!(db.get_table("users").is_some());

        assert!(db.drop_table("users").is_ok());
        assert!(db.get_table("users").is_none());
    }

    #[test]
    fn test_duplicate_table_error() {
        let mut db = Database::in_memory();

        db.create_table("users", simple_schema()).unwrap();
        let err = db.create_table("users", simple_schema()).unwrap_err();

        assert!(matches!(err, Error::TableExists(_)));
    }

    #[test]
    fn test_drop_nonexistent_table() {
        let mut db = Database::in_memory();

        let err = db.drop_table("unknown").unwrap_err();
        assert!(matches!(err, Error::TableNotFound(_)));
    }

    #[test]
    fn test_table_names() {
        let mut db = Database::in_memory();

        db.create_table("users", simple_schema()).unwrap();
        db.create_table("posts", simple_schema()).unwrap();

        assert_eq!(db.table_names(), vec!["posts", "users"]);
    }

    #[test]
    fn test_row_operations_through_registry() {
        let mut db = Database::in_memory();
        db.create_table("users", simple_schema()).unwrap();

        db.insert_row("users", user(1, "alice")).unwrap();
        db.insert_partial_row("users", &["id".to_string()], &[Value::integer(2)])
            .unwrap();
        assert!(db.insert_row("users", user(1, "dup")).is_err());
        assert!(matches!(
            db.insert_row("nope", user(3, "x")),
            Err(Error::TableNotFound(_))
        ));

        let by_id = Condition::leaf("id", CompareOp::Eq, Value::integer(2));
        let updated = db
            .update_rows("users", &by_id, &[("name".to_string(), Value::text("bob"))])
            .unwrap();
        assert_eq!(updated, 1);

        assert_eq!(db.delete_rows("users", &by_id).unwrap(), 1);
        assert_eq!(db.get_table("users").unwrap().row_count(), 1);
    }

    #[test]
    fn test_self_referencing_foreign_key() {
        let mut db = Database::in_memory();
        db.create_table(
            "nodes",
            vec![
                Column::new("id", DataType::Integer).primary_key(),
                Column::new("parent", DataType::Integer).references("nodes", "id"),
            ],
        )
        .unwrap();

        db.insert_row("nodes", Row::new(vec![Value::integer(1), Value::null(DataType::Integer)]))
            .unwrap();
        db.insert_row("nodes", Row::new(vec![Value::integer(2), Value::integer(1)]))
            .unwrap();
        let err = db
            .insert_row("nodes", Row::new(vec![Value::integer(3), Value::integer(9)]))
            .unwrap_err();
        assert!(matches!(err, Error::ForeignKeyViolation { .. }));
    }

    #[test]
    fn test_save_and_load_all_tables() {
        let dir = tempdir().unwrap();
        let storage = dir.path().join("store");

        let mut db = Database::new(&storage);
        db.create_table("users", simple_schema()).unwrap();
        db.insert_row("users", user(1, "alice")).unwrap();
        db.create_table("posts", simple_schema()).unwrap();
        db.save_all_tables().unwrap();

        assert!(storage.join("users.csv").is_file());
        assert!(storage.join("posts.csv").is_file());

        let mut reloaded = Database::new(&storage);
        assert_eq!(reloaded.load_all_tables().unwrap(), 2);
        assert_eq!(reloaded.table_names(), vec!["posts", "users"]);
        let users = reloaded.get_table("users").unwrap();
        assert_eq!(users.rows(), &[user(1, "alice")]);
        assert!(users.columns()[0].is_primary_key);
    }

    #[test]
    fn test_load_ignores_other_files_and_missing_dir() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("notes.txt"), "not a table").unwrap();

        let mut db = Database::new(dir.path());
        assert_eq!(db.load_all_tables().unwrap(), 0);

        let mut db = Database::new(dir.path().join("missing"));
        assert_eq!(db.load_all_tables().unwrap(), 0);
    }

    #[test]
    fn test_drop_table_deletes_file() {
        let dir = tempdir().unwrap();
        let mut db = Database::new(dir.path());
        db.create_table("users", simple_schema()).unwrap();
        db.save_table("users").unwrap();

        let path = db.table_path("users").unwrap();
        assert!(path.is_file());

        db.drop_table("users").unwrap();
        assert!(!path.exists());
    }

    #[test]
    fn test_in_memory_persistence_is_noop() {
        let mut db = Database::in_memory();
        db.create_table("users", simple_schema()).unwrap();
        assert!(db.table_path("users").is_none());
        db.save_table("users").unwrap();
        db.save_all_tables().unwrap();
        assert_eq!(db.load_all_tables().unwrap(), 0);
    }
}
