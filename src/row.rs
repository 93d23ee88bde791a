use std::ops::{Index, IndexMut};

use allocative::Allocative;

use crate::column::Column;
use crate::value::Value;

/// An ordered tuple of values, aligned positionally with a table's columns.
#[derive(Debug, Clone, PartialEq, Eq, Default, Allocative)]
pub struct Row {
    pub values: Vec<Value>,
}

impl Row {
    pub fn new(values: Vec<Value>) -> Self {
        Self { values }
    }

    /// A row of typed NULLs, one per column.
    pub fn nulls(columns: &[Column]) -> Self {
        Self {
            values: columns.iter().map(|c| Value::null(c.data_type)).collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn get(&self, idx: usize) -> Option<&Value> {
        self.values.get(idx)
    }

    /// Concatenates two rows, left values first.
    pub fn concat(&self, other: &Row) -> Row {
        let mut values = Vec::with_capacity(self.len() + other.len());
        values.extend_from_slice(&self.values);
        values.extend_from_slice(&other.values);
        Row { values }
    }
}

impl From<Vec<Value>> for Row {
    fn from(values: Vec<Value>) -> Self {
        Self { values }
    }
}

impl Index<usize> for Row {
    type Output = Value;

    fn index(&self, idx: usize) -> &Value {
        &self.values[idx]
    }
}

impl IndexMut<usize> for Row {
    fn index_mut(&mut self, idx: usize) -> &mut Value {
        &mut self.values[idx]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data_type::DataType;

    #[test]
    fn test_nulls_are_typed() {
        let columns = vec![
            Column::new("id", DataType::Integer),
            Column::new("name", DataType::Varchar),
        ];
        let row = Row::nulls(&columns);

        assert_eq!(row.len(), 2);
        assert!(row[0].is_null() && row[1].is_null());
        assert_eq!(row[0].data_type, DataType::Integer);
        assert_eq!(row[1].data_type, DataType::Varchar);
    }

    #[test]
    fn test_concat() {
        let left = Row::new(vec![Value::integer(1)]);
        let right = Row::new(vec![Value::text("a"), Value::text("b")]);
        let joined = left.concat(&right);

        assert_eq!(joined.len(), 3);
        assert_eq!(joined[0], Value::integer(1));
        assert_eq!(joined[2], Value::text("b"));
        assert!(joined.get(3).is_none());
    }
}
