//! Value Types
//!
//! 드라이버 중립 값 타입

use std::fmt;

// ============================================================================
// Value - 값
// ============================================================================

/// 드라이버 중립 값
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Value {
    /// NULL
    #[default]
    Null,
    /// 불리언
    Boolean(bool),
    /// 정수
    Integer(i64),
    /// 부동소수점
    Float(f64),
    /// 문자열
    Text(String),
    /// 바이트 배열
    Bytes(Vec<u8>),
}

impl Value {
    /// NULL 여부
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// 문자열 참조 (Text인 경우)
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }

    /// 정수 값 (Integer인 경우)
    pub fn as_integer(&self) -> Option<i64> {
        match self {
            Self::Integer(i) => Some(*i),
            _ => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => write!(f, "NULL"),
            Self::Boolean(b) => write!(f, "{}", b),
            Self::Integer(i) => write!(f, "{}", i),
            Self::Float(v) => write!(f, "{}", v),
            Self::Text(s) => write!(f, "{}", s),
            Self::Bytes(b) => write!(f, "<{} bytes>", b.len()),
        }
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Self::Boolean(v)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Self::Integer(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Self::Integer(v as i64)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Self::Float(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Self::Text(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Self::Text(v)
    }
}

impl From<Vec<u8>> for Value {
    fn from(v: Vec<u8>) -> Self {
        Self::Bytes(v)
    }
}

// ============================================================================
// Row - 결과 행
// ============================================================================

/// 결과 행
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Row {
    /// 컬럼 이름 목록
    columns: Vec<String>,
    /// 값 목록 (columns와 같은 순서)
    values: Vec<Value>,
}

impl Row {
    /// 새 행 생성
    pub fn new(columns: Vec<String>, values: Vec<Value>) -> Self {
        Self { columns, values }
    }

    /// 컬럼 이름 목록
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// 값 목록
    pub fn values(&self) -> &[Value] {
        &self.values
    }

    /// 컬럼 이름으로 값 조회
    pub fn get(&self, column: &str) -> Option<&Value> {
        self.columns
            .iter()
            .position(|c| c == column)
            .and_then(|i| self.values.get(i))
    }

    /// 인덱스로 값 조회
    pub fn get_index(&self, index: usize) -> Option<&Value> {
        self.values.get(index)
    }

    /// 컬럼 수
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// 빈 행 여부
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_value_conversions() {
        assert_eq!(Value::from(true), Value::Boolean(true));
        assert_eq!(Value::from(42i64), Value::Integer(42));
        assert_eq!(Value::from(42i32), Value::Integer(42));
        assert_eq!(Value::from("hello"), Value::Text("hello".to_string()));
        assert_eq!(Value::from(3.5), Value::Float(3.5));
    }

    #[test]
    fn test_value_accessors() {
        assert!(Value::Null.is_null());
        assert!(!Value::Integer(1).is_null());

        assert_eq!(Value::Text("a".into()).as_text(), Some("a"));
        assert_eq!(Value::Integer(7).as_text(), None);
        assert_eq!(Value::Integer(7).as_integer(), Some(7));
    }

    #[test]
    fn test_value_display() {
        assert_eq!(Value::Null.to_string(), "NULL");
        assert_eq!(Value::Integer(3).to_string(), "3");
        assert_eq!(Value::Bytes(vec![1, 2, 3]).to_string(), "<3 bytes>");
    }

    #[test]
    fn test_row_get() {
        let row = Row::new(
            vec!["id".to_string(), "name".to_string()],
            vec![Value::Integer(1), Value::Text("alice".to_string())],
        );

        assert_eq!(row.len(), 2);
        assert_eq!(row.get("id"), Some(&Value::Integer(1)));
        assert_eq!(row.get("name"), Some(&Value::Text("alice".to_string())));
        assert_eq!(row.get("missing"), None);
        assert_eq!(row.get_index(1), Some(&Value::Text("alice".to_string())));
    }

    #[test]
    fn test_row_empty() {
        let row = Row::default();
        assert!(row.is_empty());
        assert_eq!(row.get("any"), None);
    }
}
