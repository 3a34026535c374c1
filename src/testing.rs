//! In-memory [`StatementExecutor`] for exercising the deploy and verify flows
//! without a Postgres server.

use sqlx::error::{DatabaseError, ErrorKind};
use std::borrow::Cow;
use std::collections::HashMap;
use std::fmt;
use std::time::Duration;

use crate::db::StatementExecutor;
use crate::db::schema::count_query;

/// Records every statement it is handed and fails the ones it was told to.
#[derive(Debug, Default)]
pub struct RecordingExecutor {
    attempted: Vec<String>,
    executed: Vec<String>,
    failures: Vec<(String, FailWith)>,
    counts: HashMap<String, i64>,
    tables: Vec<String>,
    delay: Option<Duration>,
    fail_list_tables: bool,
}

#[derive(Debug, Clone)]
enum FailWith {
    Protocol(String),
    Sqlstate(&'static str, String),
}

impl RecordingExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail any statement containing `needle` with a non-database error.
    pub fn fail_on(mut self, needle: impl Into<String>, message: impl Into<String>) -> Self {
        self.failures
            .push((needle.into(), FailWith::Protocol(message.into())));
        self
    }

    /// Fail any statement containing `needle` with a database error carrying `sqlstate`.
    pub fn fail_with_sqlstate(
        mut self,
        needle: impl Into<String>,
        sqlstate: &'static str,
        message: impl Into<String>,
    ) -> Self {
        self.failures
            .push((needle.into(), FailWith::Sqlstate(sqlstate, message.into())));
        self
    }

    /// Register a table that exists with `rows` rows.
    pub fn with_table(mut self, table: &str, rows: i64) -> Self {
        self.tables.push(table.to_string());
        if let Some(sql) = count_query(table) {
            self.counts.insert(sql, rows);
        }
        self
    }

    /// Answer `sql` with `count` when fetched through [`StatementExecutor::fetch_count`].
    pub fn with_count(mut self, sql: impl Into<String>, count: i64) -> Self {
        self.counts.insert(sql.into(), count);
        self
    }

    /// Sleep this long before answering any call.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn failing_list_tables(mut self) -> Self {
        self.fail_list_tables = true;
        self
    }

    /// Statements handed to `execute`, in order, whether or not they failed.
    pub fn attempted(&self) -> &[String] {
        &self.attempted
    }

    /// Statements that `execute` accepted, in order.
    pub fn executed(&self) -> &[String] {
        &self.executed
    }

    async fn pause(&self) {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
    }

    fn failure_for(&self, sql: &str) -> Option<sqlx::Error> {
        self.failures
            .iter()
            .find(|(needle, _)| sql.contains(needle.as_str()))
            .map(|(_, fail)| match fail {
                FailWith::Protocol(message) => sqlx::Error::Protocol(message.clone()),
                FailWith::Sqlstate(code, message) => sqlx::Error::Database(Box::new(FakeDbError {
                    code,
                    message: message.clone(),
                })),
            })
    }
}

impl StatementExecutor for RecordingExecutor {
    async fn execute(&mut self, sql: &str) -> Result<u64, sqlx::Error> {
        self.pause().await;
        self.attempted.push(sql.to_string());
        if let Some(err) = self.failure_for(sql) {
            return Err(err);
        }
        self.executed.push(sql.to_string());
        Ok(1)
    }

    async fn fetch_count(&mut self, sql: &str) -> Result<i64, sqlx::Error> {
        self.pause().await;
        if let Some(err) = self.failure_for(sql) {
            return Err(err);
        }
        self.counts
            .get(sql)
            .copied()
            .ok_or_else(|| sqlx::Error::Protocol(format!("no canned count for `{sql}`")))
    }

    async fn list_tables(&mut self) -> Result<Vec<String>, sqlx::Error> {
        self.pause().await;
        if self.fail_list_tables {
            return Err(sqlx::Error::PoolTimedOut);
        }
        let mut tables = self.tables.clone();
        tables.sort();
        Ok(tables)
    }
}

#[derive(Debug)]
struct FakeDbError {
    code: &'static str,
    message: String,
}

impl fmt::Display for FakeDbError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (SQLSTATE {})", self.message, self.code)
    }
}

impl std::error::Error for FakeDbError {}

impl DatabaseError for FakeDbError {
    fn message(&self) -> &str {
        &self.message
    }

    fn code(&self) -> Option<Cow<'_, str>> {
        Some(Cow::Borrowed(self.code))
    }

    fn as_error(&self) -> &(dyn std::error::Error + Send + Sync + 'static) {
        self
    }

    fn as_error_mut(&mut self) -> &mut (dyn std::error::Error + Send + Sync + 'static) {
        self
    }

    fn into_error(self: Box<Self>) -> Box<dyn std::error::Error + Send + Sync + 'static> {
        self
    }

    fn kind(&self) -> ErrorKind {
        match self.code {
            "23505" => ErrorKind::UniqueViolation,
            _ => ErrorKind::Other,
        }
    }
}
