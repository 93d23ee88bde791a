pub mod ast;
pub mod column;
pub mod condition;
pub mod csv;
pub mod data_type;
pub mod database;
pub mod error;
pub mod executor;
pub mod parser;
pub mod row;
pub mod select;
pub mod table;
pub mod tokenizer;
pub mod value;

pub use ast::Query;
pub use column::Column;
pub use condition::{CompareOp, Condition};
pub use data_type::DataType;
pub use database::Database;
pub use error::{Error, Result};
pub use executor::{ExecutionOutcome, QueryExecutor};
pub use parser::parse;
pub use row::Row;
pub use select::ResultSet;
pub use table::Table;
pub use value::Value;
