use std::fmt;

use allocative::Allocative;

/// Represents the supported data types in the database schema.
/// Values are always stored as text; the type only drives validation and the
/// type token written to the table file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Allocative)]
pub enum DataType {
    /// Free-form text.
    String,
    /// Free-form text declared as `VARCHAR`.
    Varchar,
    /// A signed integer.
    Integer,
    /// A floating-point number.
    Float,
    /// A boolean (`TRUE`, `FALSE`, `1` or `0`).
    Boolean,
    /// A calendar date, kept as text.
    Date,
    /// Type not known (e.g. a bare `NULL` literal).
    #[default]
    Unknown,
}

impl DataType {
    /// Parses a type name as written in `CREATE TABLE`. Returns `None` for
    /// unrecognized names.
    pub fn from_sql_name(name: &str) -> Option<Self> {
        match name.to_uppercase().as_str() {
            "INT" | "INTEGER" | "BIGINT" | "SMALLINT" => Some(Self::Integer),
            "VARCHAR" | "CHAR" => Some(Self::Varchar),
            "STRING" | "TEXT" => Some(Self::String),
            "FLOAT" | "DOUBLE" | "REAL" | "DECIMAL" => Some(Self::Float),
            "BOOL" | "BOOLEAN" => Some(Self::Boolean),
            "DATE" => Some(Self::Date),
            _ => None,
        }
    }

    /// The token used for this type in the second header line of a table file.
    pub fn file_token(&self) -> &'static str {
        match self {
            Self::Integer => "INT",
            Self::Varchar => "VARCHAR",
            Self::Float => "FLOAT",
            Self::Boolean => "BOOL",
            Self::Date => "DATE",
            Self::String | Self::Unknown => "STRING",
        }
    }

    /// Reads a type token from a table file. Anything unknown is `String`.
    pub fn from_file_token(token: &str) -> Self {
        match token.trim() {
            "INT" => Self::Integer,
            "VARCHAR" => Self::Varchar,
            "FLOAT" => Self::Float,
            "BOOL" => Self::Boolean,
            "DATE" => Self::Date,
            _ => Self::String,
        }
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::String => "STRING",
            Self::Varchar => "VARCHAR",
            Self::Integer => "INTEGER",
            Self::Float => "FLOAT",
            Self::Boolean => "BOOLEAN",
            Self::Date => "DATE",
            Self::Unknown => "UNKNOWN",
        };
        f.write_str(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_sql_name() {
        assert_eq!(DataType::from_sql_name("int"), Some(DataType::Integer));
        assert_eq!(DataType::from_sql_name("Varchar"), Some(DataType::Varchar));
        assert_eq!(DataType::from_sql_name("DOUBLE"), Some(DataType::Float));
        assert_eq!(DataType::from_sql_name("boolean"), Some(DataType::Boolean));
        assert_eq!(DataType::from_sql_name("date"), Some(DataType::Date));
        assert_eq!(DataType::from_sql_name("blob"), None);
    }

    #[test]
    fn test_file_tokens() {
        for ty in [
            DataType::Integer,
            DataType::Varchar,
            DataType::Float,
            DataType::Boolean,
            DataType::Date,
            DataType::String,
        ] {
            assert_eq!(DataType::from_file_token(ty.file_token()), ty);
        }
        assert_eq!(DataType::Unknown.file_token(), "STRING");
        assert_eq!(DataType::from_file_token("WHATEVER"), DataType::String);
    }
}
