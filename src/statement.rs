//! Statement & Routing Table
//!
//! 스테이트먼트와 오퍼레이션별 정적 라우팅 테이블

use std::fmt;
use std::fmt::Write as _;

use crate::types::{Row, Value};

// ============================================================================
// RoutingClass - 라우팅 클래스
// ============================================================================

/// 라우팅 클래스
///
/// 오퍼레이션 이름마다 고정된 라우팅 규칙을 가집니다. 런타임 리플렉션 대신
/// 정적으로 선언된 테이블을 사용하여 라우팅 규칙을 감사/테스트 가능하게
/// 유지합니다.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RoutingClass {
    /// 읽기 전용 - 읽기 엔드포인트로 라우팅
    Read,
    /// 변경 - primary로 라우팅, 디스패치 전 쿼리 캐시 무효화
    Write,
    /// primary 전용 - 스키마 조회 등 읽기 엔드포인트가 지원하지 않는 작업
    PrimaryOnly,
}

/// 읽기 전용 오퍼레이션
const READ_OPERATIONS: &[&str] = &[
    "select",
    "select_rows",
    "exec_query",
    "execute",
    "tables",
    "columns",
];

/// 변경 오퍼레이션 (쿼리 캐시 무효화 대상)
const WRITE_OPERATIONS: &[&str] = &["insert", "update", "delete"];

/// 오퍼레이션 이름에 대한 라우팅 클래스 조회
///
/// 테이블에 없는 오퍼레이션은 모두 primary 전용으로 취급합니다.
pub fn routing_class(operation: &str) -> RoutingClass {
    if READ_OPERATIONS.contains(&operation) {
        RoutingClass::Read
    } else if WRITE_OPERATIONS.contains(&operation) {
        RoutingClass::Write
    } else {
        RoutingClass::PrimaryOnly
    }
}

// ============================================================================
// Statement - 스테이트먼트
// ============================================================================

/// 디스패치 대상 스테이트먼트
#[derive(Debug, Clone)]
pub struct Statement {
    /// 오퍼레이션 이름 (라우팅 테이블의 키)
    op: String,
    /// SQL 텍스트
    sql: String,
    /// 바인드 파라미터
    params: Vec<Value>,
}

impl Statement {
    /// 새 스테이트먼트 생성
    pub fn new(op: impl Into<String>, sql: impl Into<String>) -> Self {
        Self {
            op: op.into(),
            sql: sql.into(),
            params: Vec::new(),
        }
    }

    /// 파라미터 설정
    pub fn with_params(mut self, params: Vec<Value>) -> Self {
        self.params = params;
        self
    }

    /// 오퍼레이션 이름
    pub fn op(&self) -> &str {
        &self.op
    }

    /// SQL 텍스트
    pub fn sql(&self) -> &str {
        &self.sql
    }

    /// 바인드 파라미터
    pub fn params(&self) -> &[Value] {
        &self.params
    }

    /// 이 스테이트먼트의 라우팅 클래스
    pub fn routing_class(&self) -> RoutingClass {
        routing_class(&self.op)
    }

    /// 쿼리 캐시 키
    pub fn cache_key(&self) -> String {
        let mut key = format!("{}:{}", self.op, self.sql);
        for param in &self.params {
            let _ = write!(key, ":{}", param);
        }
        key
    }
}

impl fmt::Display for Statement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} [{}]", self.sql, self.op)
    }
}

// ============================================================================
// StatementResult - 실행 결과
// ============================================================================

/// 스테이트먼트 실행 결과
#[derive(Debug, Clone, PartialEq)]
pub enum StatementResult {
    /// 결과 행 목록
    Rows(Vec<Row>),
    /// 영향받은 행 수
    Count(u64),
    /// 이름 목록 (tables, columns 결과)
    Names(Vec<String>),
    /// 결과 없음
    Unit,
}

impl StatementResult {
    /// 행 목록 (Rows인 경우)
    pub fn rows(&self) -> Option<&[Row]> {
        match self {
            Self::Rows(rows) => Some(rows),
            _ => None,
        }
    }

    /// 영향받은 행 수 (Count인 경우)
    pub fn count(&self) -> Option<u64> {
        match self {
            Self::Count(n) => Some(*n),
            _ => None,
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_routing_table_read_operations() {
        for op in ["select", "select_rows", "exec_query", "execute", "tables", "columns"] {
            assert_eq!(routing_class(op), RoutingClass::Read, "op: {}", op);
        }
    }

    #[test]
    fn test_routing_table_write_operations() {
        for op in ["insert", "update", "delete"] {
            assert_eq!(routing_class(op), RoutingClass::Write, "op: {}", op);
        }
    }

    #[test]
    fn test_routing_table_primary_only_fallback() {
        // 테이블에 없는 오퍼레이션은 primary 전용
        assert_eq!(routing_class("begin_db_transaction"), RoutingClass::PrimaryOnly);
        assert_eq!(routing_class("commit_db_transaction"), RoutingClass::PrimaryOnly);
        assert_eq!(routing_class("create_table"), RoutingClass::PrimaryOnly);
        assert_eq!(routing_class("unknown_op"), RoutingClass::PrimaryOnly);
    }

    #[test]
    fn test_statement_routing_class() {
        assert_eq!(
            Statement::new("select", "SELECT 1").routing_class(),
            RoutingClass::Read
        );
        assert_eq!(
            Statement::new("insert", "INSERT INTO t VALUES (1)").routing_class(),
            RoutingClass::Write
        );
    }

    #[test]
    fn test_statement_cache_key() {
        let a = Statement::new("select", "SELECT * FROM t WHERE id = ?")
            .with_params(vec![Value::Integer(1)]);
        let b = Statement::new("select", "SELECT * FROM t WHERE id = ?")
            .with_params(vec![Value::Integer(2)]);
        let c = Statement::new("select", "SELECT * FROM t WHERE id = ?")
            .with_params(vec![Value::Integer(1)]);

        assert_ne!(a.cache_key(), b.cache_key());
        assert_eq!(a.cache_key(), c.cache_key());
    }

    #[test]
    fn test_statement_display() {
        let stmt = Statement::new("select", "SELECT 1");
        assert_eq!(stmt.to_string(), "SELECT 1 [select]");
    }

    #[test]
    fn test_statement_result_accessors() {
        let rows = StatementResult::Rows(vec![Row::default()]);
        assert_eq!(rows.rows().map(|r| r.len()), Some(1));
        assert_eq!(rows.count(), None);

        let count = StatementResult::Count(3);
        assert_eq!(count.count(), Some(3));
        assert!(count.rows().is_none());
    }
}
