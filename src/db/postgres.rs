use crate::config::Config;
use crate::db::models::{DbUser, JobListing};
use crate::error::PortalError;
use crate::types::filters::{JobFilters, PageParams, SortBy};
use crate::types::user::Role;
use sqlx::postgres::PgPoolOptions;
use sqlx::{Postgres, QueryBuilder};
use std::time::Duration;

pub type PgPool = sqlx::PgPool;

const USER_COLUMNS: &str =
    "id, name, email, password_hash, role, phone, location, created_at";

const LISTING_SELECT: &str = r#"
    SELECT j.id, j.company_id, c.name AS company_name, j.title, j.description,
           j.location, j.job_type, j.experience_level, j.salary_min, j.salary_max,
           j.is_remote, j.status, j.posted_at
    FROM jobs j
    JOIN companies c ON c.id = j.company_id
"#;

/// Pooled queries behind the REST API.
#[derive(Clone)]
pub struct PortalStorage {
    pool: PgPool,
}

impl PortalStorage {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Open a pool and make sure the server answers.
    pub async fn connect(cfg: &Config) -> Result<Self, PortalError> {
        let pool = PgPoolOptions::new()
            .max_connections(10)
            .acquire_timeout(Duration::from_secs(10))
            .connect_with(cfg.pg_connect_options()?)
            .await?;
        Ok(Self::new(pool))
    }

    /// A pool that connects on first use.
    pub fn connect_lazy(cfg: &Config) -> Result<Self, PortalError> {
        let pool = PgPoolOptions::new()
            .max_connections(10)
            .acquire_timeout(Duration::from_secs(10))
            .connect_lazy_with(cfg.pg_connect_options()?);
        Ok(Self::new(pool))
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    pub async fn find_user_by_email(&self, email: &str) -> Result<Option<DbUser>, PortalError> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE lower(email) = lower($1)");
        let user = sqlx::query_as::<_, DbUser>(&sql)
            .bind(email)
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }

    pub async fn find_user_by_id(&self, id: i64) -> Result<Option<DbUser>, PortalError> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1");
        let user = sqlx::query_as::<_, DbUser>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }

    /// Insert a new user. A taken email maps to `Conflict`.
    pub async fn insert_user(
        &self,
        name: &str,
        email: &str,
        password_hash: &str,
        role: Role,
        phone: Option<&str>,
    ) -> Result<DbUser, PortalError> {
        let sql = format!(
            "INSERT INTO users (name, email, password_hash, role, phone) \
             VALUES ($1, $2, $3, $4, $5) RETURNING {USER_COLUMNS}"
        );
        sqlx::query_as::<_, DbUser>(&sql)
            .bind(name)
            .bind(email)
            .bind(password_hash)
            .bind(role.as_str())
            .bind(phone)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| match &e {
                sqlx::Error::Database(db) if db.is_unique_violation() => {
                    PortalError::Conflict("An account with this email already exists.".to_string())
                }
                _ => PortalError::from(e),
            })
    }

    /// One page of open jobs matching `filters`, plus the total match count.
    pub async fn list_jobs(
        &self,
        filters: &JobFilters,
        params: PageParams,
    ) -> Result<(Vec<JobListing>, i64), PortalError> {
        let params = params.normalized();

        let mut count = QueryBuilder::<Postgres>::new(
            "SELECT COUNT(*) FROM jobs j JOIN companies c ON c.id = j.company_id",
        );
        push_filters(&mut count, filters);
        let total = count.build_query_scalar::<i64>().fetch_one(&self.pool).await?;

        let mut page = QueryBuilder::<Postgres>::new(LISTING_SELECT);
        push_filters(&mut page, filters);
        page.push(order_clause(params.sort_by));
        page.push(" LIMIT ").push_bind(i64::from(params.limit));
        page.push(" OFFSET ").push_bind(params.offset());
        let jobs = page
            .build_query_as::<JobListing>()
            .fetch_all(&self.pool)
            .await?;

        Ok((jobs, total))
    }

    pub async fn get_job(&self, id: i64) -> Result<Option<JobListing>, PortalError> {
        let sql = format!("{LISTING_SELECT} WHERE j.id = $1");
        let job = sqlx::query_as::<_, JobListing>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(job)
    }
}

fn push_filters(qb: &mut QueryBuilder<'_, Postgres>, filters: &JobFilters) {
    qb.push(" WHERE j.status = 'open'");

    let search = filters.search.trim();
    if !search.is_empty() {
        let pattern = like_pattern(search);
        qb.push(" AND (j.title ILIKE ")
            .push_bind(pattern.clone())
            .push(" OR j.description ILIKE ")
            .push_bind(pattern.clone())
            .push(" OR c.name ILIKE ")
            .push_bind(pattern)
            .push(")");
    }
    let location = filters.location.trim();
    if !location.is_empty() {
        qb.push(" AND j.location ILIKE ")
            .push_bind(like_pattern(location));
    }
    let job_type = filters.job_type.trim();
    if !job_type.is_empty() {
        qb.push(" AND j.job_type = ").push_bind(job_type.to_string());
    }
    let level = filters.experience_level.trim();
    if !level.is_empty() {
        qb.push(" AND j.experience_level = ")
            .push_bind(level.to_string());
    }
    // ranges overlap: a job qualifies if any part of its band meets the bound
    if let Some(min) = filters.salary_min {
        qb.push(" AND COALESCE(j.salary_max, j.salary_min) >= ")
            .push_bind(min);
    }
    if let Some(max) = filters.salary_max {
        qb.push(" AND COALESCE(j.salary_min, j.salary_max) <= ")
            .push_bind(max);
    }
    if filters.remote {
        qb.push(" AND j.is_remote");
    }
}

fn like_pattern(term: &str) -> String {
    let escaped = term
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    format!("%{escaped}%")
}

/// ORDER BY for a sort choice; ties broken by id so paging is stable.
pub(crate) fn order_clause(sort_by: SortBy) -> &'static str {
    match sort_by {
        SortBy::Newest => " ORDER BY j.posted_at DESC, j.id DESC",
        SortBy::SalaryHigh => " ORDER BY j.salary_max DESC NULLS LAST, j.id DESC",
        SortBy::SalaryLow => " ORDER BY j.salary_min ASC NULLS LAST, j.id ASC",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn like_pattern_escapes_wildcards() {
        assert_eq!(like_pattern("rust"), "%rust%");
        assert_eq!(like_pattern("100%_x"), "%100\\%\\_x%");
    }

    #[test]
    fn filters_render_in_a_fixed_order() {
        let filters = JobFilters {
            search: "rust".to_string(),
            job_type: "full_time".to_string(),
            salary_min: Some(120_000),
            remote: true,
            ..JobFilters::default()
        };
        let mut qb = QueryBuilder::<Postgres>::new("SELECT 1 FROM jobs j");
        push_filters(&mut qb, &filters);
        assert_eq!(
            qb.sql(),
            "SELECT 1 FROM jobs j WHERE j.status = 'open' \
             AND (j.title ILIKE $1 OR j.description ILIKE $2 OR c.name ILIKE $3) \
             AND j.job_type = $4 \
             AND COALESCE(j.salary_max, j.salary_min) >= $5 \
             AND j.is_remote"
        );
    }

    #[test]
    fn empty_filters_only_restrict_status() {
        let mut qb = QueryBuilder::<Postgres>::new("SELECT 1 FROM jobs j");
        push_filters(&mut qb, &JobFilters::default());
        assert_eq!(qb.sql(), "SELECT 1 FROM jobs j WHERE j.status = 'open'");
    }

    #[test]
    fn sort_orders() {
        assert!(order_clause(SortBy::Newest).contains("posted_at DESC"));
        assert!(order_clause(SortBy::SalaryHigh).contains("salary_max DESC"));
        assert!(order_clause(SortBy::SalaryLow).contains("salary_min ASC"));
    }
}
