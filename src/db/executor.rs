use sqlx::PgConnection;
use std::future::Future;

/// The statement-level operations the deploy and verify scripts need.
///
/// Implemented for a single [`PgConnection`]; statements run strictly in call order.
pub trait StatementExecutor {
    /// Run one statement, returning rows affected.
    fn execute(&mut self, sql: &str) -> impl Future<Output = Result<u64, sqlx::Error>> + Send;

    /// Run a query whose first column of the first row is a `BIGINT` count.
    fn fetch_count(&mut self, sql: &str) -> impl Future<Output = Result<i64, sqlx::Error>> + Send;

    /// Base tables in the `public` schema, sorted by name.
    fn list_tables(&mut self) -> impl Future<Output = Result<Vec<String>, sqlx::Error>> + Send;
}

impl StatementExecutor for PgConnection {
    async fn execute(&mut self, sql: &str) -> Result<u64, sqlx::Error> {
        // raw_sql skips the prepare step, so DDL and plpgsql bodies go through as written
        let done = sqlx::Executor::execute(&mut *self, sqlx::raw_sql(sql)).await?;
        Ok(done.rows_affected())
    }

    async fn fetch_count(&mut self, sql: &str) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar::<_, i64>(sql).fetch_one(&mut *self).await
    }

    async fn list_tables(&mut self) -> Result<Vec<String>, sqlx::Error> {
        sqlx::query_scalar::<_, String>(
            r#"SELECT table_name::text
               FROM information_schema.tables
               WHERE table_schema = 'public' AND table_type = 'BASE TABLE'
               ORDER BY table_name"#,
        )
        .fetch_all(&mut *self)
        .await
    }
}
