//! SQL extraction from raw completions.
//!
//! Models wrap their SQL in prose or markdown fences. The extractors here
//! isolate the first `SELECT ... FROM ... ;` statement and hand it on
//! byte-identical, or fail with `ChatError::Extraction`.

use std::fmt;

use regex::Regex;
use sqlparser::ast::{Query, SetExpr, Statement};
use sqlparser::dialect::{Dialect, GenericDialect, MySqlDialect, PostgreSqlDialect, SQLiteDialect};
use sqlparser::parser::Parser;
use tracing::debug;

use crate::config::{ExtractorKind, PipelineConfig};
use crate::db::DatabaseBackend;
use crate::error::{ChatError, Result};

/// Line-bound pattern: both runs are lazy and `.` stops at newlines.
const SINGLE_LINE_PATTERN: &str = r"(?i)SELECT .*? FROM .*?;";

/// Pattern that tolerates any whitespace around the keywords and spans lines.
const MULTILINE_PATTERN: &str = r"(?is)SELECT\s.*?\sFROM\s.*?;";

/// A SQL statement isolated from a completion.
///
/// Never empty: absence is reported as `ChatError::Extraction` instead.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedSql(String);

impl ExtractedSql {
    /// Returns the statement text.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consumes the wrapper, returning the statement text.
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Display for ExtractedSql {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Finds the SQL statement inside a raw completion.
pub trait SqlExtractor: Send + Sync {
    /// Returns the first statement found in `raw`.
    fn extract(&self, raw: &str) -> Result<ExtractedSql>;
}

/// Pattern-based extractor.
#[derive(Debug, Clone)]
pub struct RegexExtractor {
    pattern: Regex,
}

impl RegexExtractor {
    /// Creates an extractor. With `multiline` the statement may span lines.
    pub fn new(multiline: bool) -> Result<Self> {
        let source = if multiline {
            MULTILINE_PATTERN
        } else {
            SINGLE_LINE_PATTERN
        };
        let pattern = Regex::new(source)
            .map_err(|e| ChatError::internal(format!("Invalid extraction pattern: {}", e)))?;
        Ok(Self { pattern })
    }
}

impl SqlExtractor for RegexExtractor {
    fn extract(&self, raw: &str) -> Result<ExtractedSql> {
        self.pattern
            .find(raw)
            .map(|m| ExtractedSql(m.as_str().to_string()))
            .ok_or(ChatError::Extraction)
    }
}

/// Extractor that also requires the candidate to parse as one query.
///
/// Rejects anything that is not a single read-only `Statement::Query`, such
/// as a `SELECT ... FROM ...;` fragment embedded in an `INSERT`.
#[derive(Debug, Clone)]
pub struct StrictExtractor {
    inner: RegexExtractor,
    backend: DatabaseBackend,
}

impl StrictExtractor {
    /// Creates a strict extractor parsing with the dialect of `backend`.
    pub fn new(multiline: bool, backend: DatabaseBackend) -> Result<Self> {
        Ok(Self {
            inner: RegexExtractor::new(multiline)?,
            backend,
        })
    }

    fn dialect(&self) -> Box<dyn Dialect> {
        match self.backend {
            DatabaseBackend::MySql => Box::new(MySqlDialect {}),
            DatabaseBackend::Postgres => Box::new(PostgreSqlDialect {}),
            DatabaseBackend::Sqlite => Box::new(SQLiteDialect {}),
        }
    }

    fn check(&self, sql: &str) -> std::result::Result<(), String> {
        let dialect = self.dialect();
        let statements = Parser::parse_sql(dialect.as_ref(), sql)
            .or_else(|_| Parser::parse_sql(&GenericDialect {}, sql))
            .map_err(|e| format!("parse error: {}", e))?;

        match statements.as_slice() {
            [Statement::Query(query)] if is_plain_read(query) => Ok(()),
            [Statement::Query(_)] => Err("query writes into a table or takes row locks".to_string()),
            [_] => Err("statement is not a query".to_string()),
            _ => Err(format!("expected 1 statement, found {}", statements.len())),
        }
    }
}

/// True when the query only reads: no `SELECT ... INTO`, no locking clause
/// and no data-modifying CTE, at any nesting level.
fn is_plain_read(query: &Query) -> bool {
    let ctes_read = query
        .with
        .as_ref()
        .map_or(true, |with| with.cte_tables.iter().all(|cte| is_plain_read(&cte.query)));

    ctes_read && query.locks.is_empty() && body_is_plain_read(&query.body)
}

fn body_is_plain_read(body: &SetExpr) -> bool {
    match body {
        SetExpr::Select(select) => select.into.is_none(),
        SetExpr::Query(query) => is_plain_read(query),
        SetExpr::SetOperation { left, right, .. } => {
            body_is_plain_read(left) && body_is_plain_read(right)
        }
        SetExpr::Insert(_) | SetExpr::Update(_) => false,
        _ => true,
    }
}

impl SqlExtractor for StrictExtractor {
    fn extract(&self, raw: &str) -> Result<ExtractedSql> {
        let candidate = self.inner.extract(raw)?;

        if let Err(reason) = self.check(candidate.as_str()) {
            debug!("Rejected candidate SQL ({}): {}", reason, candidate);
            return Err(ChatError::Extraction);
        }

        Ok(candidate)
    }
}

/// Builds the extractor selected in the `[pipeline]` configuration.
pub fn create_extractor(
    config: &PipelineConfig,
    backend: DatabaseBackend,
) -> Result<Box<dyn SqlExtractor>> {
    Ok(match config.extractor {
        ExtractorKind::Regex => Box::new(RegexExtractor::new(config.multiline)?),
        ExtractorKind::Strict => Box::new(StrictExtractor::new(config.multiline, backend)?),
    })
}
