use allocative::Allocative;

use crate::data_type::DataType;

/// Schema descriptor for one column of a table.
///
/// Column order in a table defines the positional alignment with row values.
#[derive(Debug, Clone, PartialEq, Eq, Default, Allocative)]
pub struct Column {
    /// The name of the column.
    pub name: String,
    /// The declared data type of the column.
    pub data_type: DataType,
    pub is_primary_key: bool,
    pub is_unique: bool,
    pub is_foreign_key: bool,
    /// Referenced table, empty unless `is_foreign_key`.
    pub foreign_table: String,
    /// Referenced column, empty unless `is_foreign_key`.
    pub foreign_column: String,
}

impl Column {
    /// Creates a plain column with no constraints.
    pub fn new(name: impl Into<String>, data_type: DataType) -> Self {
        Self {
            name: name.into(),
            data_type,
            ..Default::default()
        }
    }

    /// Marks the column as the primary key.
    pub fn primary_key(mut self) -> Self {
        self.is_primary_key = true;
        self
    }

    /// Marks the column as unique.
    pub fn unique(mut self) -> Self {
        self.is_unique = true;
        self
    }

    /// Makes the column a foreign key to `table(column)`.
    pub fn references(mut self, table: impl Into<String>, column: impl Into<String>) -> Self {
        self.is_foreign_key = true;
        self.foreign_table = table.into();
        self.foreign_column = column.into();
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_column_new() {
        let col = Column::new("age", DataType::Integer);

        assert_eq!(col.name, "age");
        assert_eq!(col.data_type, DataType::Integer);
        assert!(!col.is_primary_key);
        assert!(!col.is_unique);
        assert!(!col.is_foreign_key);
        assert!(col.foreign_table.is_empty());
    }

    #[test]
    fn test_column_builders() {
        let col = Column::new("dept_id", DataType::Integer)
            .unique()
            .references("depts", "id");

        assert!(col.is_unique);
        assert!(col.is_foreign_key);
        assert_eq!(col.foreign_table, "depts");
        assert_eq!(col.foreign_column, "id");

        assert!(Column::new("id", DataType::Integer).primary_key().is_primary_key);
    }
}
