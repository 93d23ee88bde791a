use std::cmp::Ordering;
use std::fmt;

use allocative::Allocative;

use crate::data_type::DataType;

/// Payload used for NULL values, both in memory and in table files.
pub const NULL_TOKEN: &str = "NULL";

const BOOLEAN_LITERALS: [&str; 4] = ["TRUE", "FALSE", "1", "0"];

/// Represents a single data value stored in the database.
///
/// The payload is always kept as text. The declared [DataType] is only used for
/// validation and persistence; comparisons work on the payload. A value is
/// NULL when its payload is the `null` sentinel (any case) or when it was built
/// with [Value::null].
///
/// The derived `PartialEq` is structural. SQL comparisons, where NULL never
/// equals anything, go through [Value::sql_cmp] and the `sql_*` helpers.
#[derive(Debug, Clone, PartialEq, Eq, Allocative)]
pub struct Value {
    pub data_type: DataType,
    pub data: String,
    pub is_null: bool,
}

impl Value {
    /// Creates a value of the given type from its text payload.
    pub fn new(data_type: DataType, data: impl Into<String>) -> Self {
        let data = data.into();
        let is_null = data.eq_ignore_ascii_case("null");
        Self {
            data_type,
            data,
            is_null,
        }
    }

    /// Creates a typed NULL.
    pub fn null(data_type: DataType) -> Self {
        Self {
            data_type,
            data: NULL_TOKEN.to_string(),
            is_null: true,
        }
    }

    pub fn text(data: impl Into<String>) -> Self {
        Self::new(DataType::String, data)
    }

    pub fn integer(i: i64) -> Self {
        Self::new(DataType::Integer, i.to_string())
    }

    pub fn float(f: f64) -> Self {
        Self::new(DataType::Float, f.to_string())
    }

    pub fn boolean(b: bool) -> Self {
        Self::new(DataType::Boolean, if b { "TRUE" } else { "FALSE" })
    }

    /// Returns `true` if the value is NULL.
    pub fn is_null(&self) -> bool {
        self.is_null
    }

    /// Returns the same payload under another declared type.
    pub fn with_type(mut self, data_type: DataType) -> Self {
        self.data_type = data_type;
        self
    }

    /// Parses the payload as a number, or returns `None` if it is not numeric.
    ///
    /// Words such as `nan` or `inf` are not accepted even though `f64` would
    /// parse them.
    pub fn as_f64(&self) -> Option<f64> {
        if self.is_null {
            return None;
        }
        parse_number(&self.data)
    }

    /// Checks whether the payload can be converted into `data_type`.
    ///
    /// NULL is valid for any type; `Integer` and `Float` require the whole
    /// payload to parse; `Boolean` accepts `TRUE`, `FALSE`, `1` and `0` in any
    /// case; the text-like types accept anything.
    pub fn is_valid_for_type(&self, data_type: DataType) -> bool {
        if self.is_null {
            return true;
        }
        let data = self.data.trim();
        match data_type {
            DataType::Integer => data.parse::<i64>().is_ok(),
            DataType::Float => parse_number(data).is_some(),
            DataType::Boolean => BOOLEAN_LITERALS
                .iter()
                .any(|lit| data.eq_ignore_ascii_case(lit)),
            DataType::String | DataType::Varchar | DataType::Date | DataType::Unknown => true,
        }
    }

    /// Compares two values with SQL semantics.
    ///
    /// Returns `None` when either side is NULL. Otherwise both payloads are
    /// compared numerically when they both parse as numbers, and as text
    /// when they don't.
    pub fn sql_cmp(&self, other: &Value) -> Option<Ordering> {
        if self.is_null || other.is_null {
            return None;
        }
        match (self.as_f64(), other.as_f64()) {
            (Some(l), Some(r)) => l
                .partial_cmp(&r)
                .or_else(|| Some(self.data.cmp(&other.data))),
            _ => Some(self.data.cmp(&other.data)),
        }
    }

    pub fn sql_eq(&self, other: &Value) -> bool {
        self.sql_cmp(other) == Some(Ordering::Equal)
    }

    pub fn sql_ne(&self, other: &Value) -> bool {
        matches!(self.sql_cmp(other), Some(ord) if ord != Ordering::Equal)
    }

    pub fn sql_lt(&self, other: &Value) -> bool {
        self.sql_cmp(other) == Some(Ordering::Less)
    }

    pub fn sql_gt(&self, other: &Value) -> bool {
        self.sql_cmp(other) == Some(Ordering::Greater)
    }

    /// Total order used for sorting.
    ///
    /// Numbers come first, in numeric order, then other text in byte order,
    /// then NULLs, which are all equal to each other.
    pub fn sort_cmp(&self, other: &Value) -> Ordering {
        match (self.is_null, other.is_null) {
            (true, true) => return Ordering::Equal,
            (true, false) => return Ordering::Greater,
            (false, true) => return Ordering::Less,
            (false, false) => {}
        }
        match (self.as_f64(), other.as_f64()) {
            (Some(l), Some(r)) => l.total_cmp(&r).then_with(|| self.data.cmp(&other.data)),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => self.data.cmp(&other.data),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_null {
            f.pad(NULL_TOKEN)
        } else {
            f.pad(&self.data)
        }
    }
}

/// Full-string numeric parse that refuses the textual special values of `f64`.
pub(crate) fn parse_number(text: &str) -> Option<f64> {
    let text = text.trim();
    let first = text.chars().next()?;
    if !(first.is_ascii_digit() || first == '-' || first == '+' || first == '.') {
        return None;
    }
    let number = text.parse::<f64>().ok()?;
    number.is_finite().then_some(number)
}

#[cfg(test)]
mod tests {
    use super::*;

    // ─────────────────────────────────────────────────────────────
    // Test 1 : NULL detection
    // ─────────────────────────────────────────────────────────────
    #[test]
    fn test_is_null() {
        assert!(Value::null(DataType::Integer).is_null());
        assert!(Value::new(DataType::String, "null").is_null());
        assert!(Value::new(DataType::String, "NuLl").is_null());
        assert!(!Value::text("nullable").is_null());
        assert!(!Value::integer(0).is_null());
    }

    // ─────────────────────────────────────────────────────────────
    // Test 2 : NULL never compares
    // ─────────────────────────────────────────────────────────────
    #[test]
    fn test_null_comparisons_are_false() {
        let null = Value::null(DataType::Integer);
        let one = Value::integer(1);

        for (l, r) in [(&null, &one), (&one, &null), (&null, &null)] {
            assert!(!l.sql_eq(r));
            assert!(!l.sql_ne(r));
            assert!(!l.sql_lt(r));
            assert!(!l.sql_gt(r));
            assert_eq!(l.sql_cmp(r), None);
        }
    }

    // ─────────────────────────────────────────────────────────────
    // Test 3 : numeric first, text fallback
    // ─────────────────────────────────────────────────────────────
    #[test]
    fn test_numeric_then_text_ordering() {
        assert!(Value::integer(9).sql_lt(&Value::integer(10)));
        assert!(Value::text("10").sql_gt(&Value::text("9")));
        assert!(Value::integer(1).sql_eq(&Value::float(1.0)));
        assert!(Value::text("1.50").sql_eq(&Value::text("1.5")));

        // text comparison as soon as one side is not numeric
        assert!(Value::text("apple").sql_lt(&Value::text("banana")));
        assert!(Value::text("10").sql_lt(&Value::text("9a")));
        assert!(Value::text("abc").sql_ne(&Value::text("abd")));
    }

    #[test]
    fn test_special_float_words_are_text() {
        assert_eq!(Value::text("nan").as_f64(), None);
        assert_eq!(Value::text("inf").as_f64(), None);
        assert_eq!(Value::text("-2.5").as_f64(), Some(-2.5));
    }

    // ─────────────────────────────────────────────────────────────
    // Test 4 : type validity
    // ─────────────────────────────────────────────────────────────
    #[test]
    fn test_is_valid_for_type() {
        assert!(Value::text("42").is_valid_for_type(DataType::Integer));
        assert!(!Value::text("4.2").is_valid_for_type(DataType::Integer));
        assert!(!Value::text("42abc").is_valid_for_type(DataType::Integer));

        assert!(Value::text("4.2").is_valid_for_type(DataType::Float));
        assert!(Value::text("42").is_valid_for_type(DataType::Float));
        assert!(!Value::text("four").is_valid_for_type(DataType::Float));

        assert!(Value::text("true").is_valid_for_type(DataType::Boolean));
        assert!(Value::text("FALSE").is_valid_for_type(DataType::Boolean));
        assert!(Value::text("1").is_valid_for_type(DataType::Boolean));
        assert!(!Value::text("yes").is_valid_for_type(DataType::Boolean));

        assert!(Value::text("anything").is_valid_for_type(DataType::Varchar));
        assert!(Value::text("2024-01-01").is_valid_for_type(DataType::Date));

        for ty in [DataType::Integer, DataType::Float, DataType::Boolean] {
            assert!(Value::null(DataType::Unknown).is_valid_for_type(ty));
        }
    }

    #[test]
    fn test_sort_cmp_puts_null_last() {
        let null = Value::null(DataType::Integer);
        assert_eq!(null.sort_cmp(&Value::integer(3)), Ordering::Greater);
        assert_eq!(Value::integer(3).sort_cmp(&null), Ordering::Less);
        assert_eq!(null.sort_cmp(&Value::null(DataType::String)), Ordering::Equal);
        assert_eq!(Value::integer(2).sort_cmp(&Value::integer(3)), Ordering::Less);
    }

    #[test]
    fn test_sort_cmp_is_total_on_mixed_payloads() {
        // numeric "9" < "10", textual "10" < "1a" < "9": numbers must come first
        let mut values = vec![
            Value::text("1a"),
            Value::integer(10),
            Value::null(DataType::String),
            Value::integer(9),
            Value::text("abc"),
        ];
        values.sort_by(Value::sort_cmp);
        let texts: Vec<String> = values.iter().map(|v| v.to_string()).collect();
        assert_eq!(texts, vec!["9", "10", "1a", "abc", "NULL"]);
    }

    #[test]
    fn test_display() {
        assert_eq!(Value::null(DataType::String).to_string(), "NULL");
        assert_eq!(Value::float(300.0).to_string(), "300");
        assert_eq!(Value::boolean(true).to_string(), "TRUE");
    }
}
