//! Error types for the engine.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    // Parser errors
    #[error("Syntax error: {0}")]
    Syntax(String),

    // Schema errors
    #[error("Table not found: {0}")]
    TableNotFound(String),

    #[error("Table already exists: {0}")]
    TableExists(String),

    #[error("Column not found: {0}")]
    ColumnNotFound(String),

    // Constraint errors
    #[error("Column count mismatch: expected {expected} values, found {found}")]
    ColumnCountMismatch { expected: usize, found: usize },

    #[error("Type mismatch: value '{value}' is not a valid {expected} for column {column}")]
    TypeMismatch {
        column: String,
        value: String,
        expected: String,
    },

    #[error("Primary key violation: duplicate value '{value}' for column {column}")]
    PrimaryKeyViolation { column: String, value: String },

    #[error("Unique constraint violation: duplicate value '{value}' for column {column}")]
    UniqueViolation { column: String, value: String },

    #[error("Foreign key violation: value '{value}' of column {column} not found in {table}({foreign_column})")]
    ForeignKeyViolation {
        column: String,
        value: String,
        table: String,
        foreign_column: String,
    },

    // Storage errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Returns `true` for errors raised by schema lookups (unknown table or column,
    /// duplicate table).
    pub fn is_schema_error(&self) -> bool {
        matches!(
            self,
            Self::TableNotFound(_) | Self::TableExists(_) | Self::ColumnNotFound(_)
        )
    }

    /// Returns `true` for errors raised by constraint checks on row data.
    pub fn is_constraint_error(&self) -> bool {
        matches!(
            self,
            Self::ColumnCountMismatch { .. }
                | Self::TypeMismatch { .. }
                | Self::PrimaryKeyViolation { .. }
                | Self::UniqueViolation { .. }
                | Self::ForeignKeyViolation { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let e = Error::Syntax("unexpected token".into());
        assert_eq!(e.to_string(), "Syntax error: unexpected token");

        let e = Error::TableNotFound("users".into());
        assert_eq!(e.to_string(), "Table not found: users");
    }

    #[test]
    fn test_error_classification() {
        assert!(Error::ColumnNotFound("x".into()).is_schema_error());
        assert!(!Error::ColumnNotFound("x".into()).is_constraint_error());

        let pk = Error::PrimaryKeyViolation {
            column: "id".into(),
            value: "1".into(),
        };
        assert!(pk.is_constraint_error());
        assert!(!pk.is_schema_error());
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: Error = io_err.into();
        assert!(matches!(err, Error::Io(_)));
        assert!(err.to_string().contains("file not found"));
    }
}
