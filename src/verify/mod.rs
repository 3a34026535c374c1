//! Post-deploy sanity checks.
//!
//! A fixed battery of row-count and join queries, each compared against a
//! hard-coded minimum. The outcome is advisory: a failing check is reported,
//! never escalated, and never stops the checks after it.

use serde::Serialize;
use std::fmt;
use std::future::Future;
use std::time::Duration;
use tracing::{info, warn};

use crate::db::StatementExecutor;
use crate::db::schema::count_query;
use crate::deploy::{ERROR_PREVIEW_CHARS, truncate};
use crate::error::PortalError;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Check {
    pub name: String,
    pub sql: String,
    pub minimum: i64,
}

impl Check {
    /// Row count of a table from the schema inventory; `None` for any other name.
    pub fn count(table: &str, minimum: i64) -> Option<Self> {
        count_query(table).map(|sql| Self {
            name: format!("{table} rows"),
            sql,
            minimum,
        })
    }

    pub fn join(name: impl Into<String>, sql: impl Into<String>, minimum: i64) -> Self {
        Self {
            name: name.into(),
            sql: sql.into(),
            minimum,
        }
    }
}

/// Expected minimum row counts after the bundled seed files have been applied.
const TABLE_MINIMUMS: &[(&str, i64)] = &[
    ("users", 5),
    ("companies", 3),
    ("jobs", 5),
    ("skills", 8),
    ("resume_templates", 3),
    ("resumes", 3),
    ("resume_skills", 5),
    ("job_skills", 8),
    ("applications", 3),
    ("referrals", 1),
    ("payments", 1),
];

pub fn default_checks() -> Vec<Check> {
    let mut checks: Vec<Check> = TABLE_MINIMUMS
        .iter()
        .filter_map(|&(table, minimum)| Check::count(table, minimum))
        .collect();

    checks.extend([
        Check::join(
            "jobs joined to companies",
            "SELECT COUNT(*) FROM jobs j JOIN companies c ON c.id = j.company_id",
            5,
        ),
        Check::join(
            "applications joined to users and jobs",
            "SELECT COUNT(*) FROM applications a \
             JOIN users u ON u.id = a.user_id \
             JOIN jobs j ON j.id = a.job_id",
            3,
        ),
        Check::join(
            "resume skills joined to resumes and skills",
            "SELECT COUNT(*) FROM resume_skills rs \
             JOIN resumes r ON r.id = rs.resume_id \
             JOIN skills s ON s.id = rs.skill_id",
            5,
        ),
        Check::join(
            "job skills joined to jobs and skills",
            "SELECT COUNT(*) FROM job_skills js \
             JOIN jobs j ON j.id = js.job_id \
             JOIN skills s ON s.id = js.skill_id",
            8,
        ),
        Check::join(
            "referrals joined to referrers",
            "SELECT COUNT(*) FROM referrals r JOIN users u ON u.id = r.referrer_id",
            1,
        ),
    ]);
    checks
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "result", rename_all = "snake_case")]
pub enum CheckOutcome {
    Pass { count: i64 },
    BelowMinimum { count: i64, minimum: i64 },
    Error { message: String },
}

impl CheckOutcome {
    pub fn passed(&self) -> bool {
        matches!(self, Self::Pass { .. })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CheckResult {
    pub name: String,
    pub outcome: CheckOutcome,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct VerificationReport {
    pub results: Vec<CheckResult>,
}

impl VerificationReport {
    pub fn passed(&self) -> usize {
        self.results.iter().filter(|r| r.outcome.passed()).count()
    }

    pub fn failed(&self) -> usize {
        self.results.len() - self.passed()
    }

    pub fn all_passed(&self) -> bool {
        self.failed() == 0
    }
}

impl fmt::Display for VerificationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for result in &self.results {
            match &result.outcome {
                CheckOutcome::Pass { count } => {
                    writeln!(f, "PASS  {}: {count}", result.name)?
                }
                CheckOutcome::BelowMinimum { count, minimum } => {
                    writeln!(f, "FAIL  {}: {count} (expected at least {minimum})", result.name)?
                }
                CheckOutcome::Error { message } => {
                    writeln!(f, "FAIL  {}: {message}", result.name)?
                }
            }
        }
        write!(
            f,
            "{}/{} checks passed{}",
            self.passed(),
            self.results.len(),
            if self.all_passed() {
                ""
            } else {
                " (advisory; deployment not failed)"
            }
        )
    }
}

/// Run every check in order against one executor.
pub async fn run_checks<E: StatementExecutor>(exec: &mut E, checks: &[Check]) -> VerificationReport {
    let mut report = VerificationReport::default();

    for check in checks {
        let outcome = match exec.fetch_count(&check.sql).await {
            Ok(count) if count >= check.minimum => {
                info!(check = %check.name, count, "check passed");
                CheckOutcome::Pass { count }
            }
            Ok(count) => {
                warn!(check = %check.name, count, minimum = check.minimum, "check below minimum");
                CheckOutcome::BelowMinimum {
                    count,
                    minimum: check.minimum,
                }
            }
            Err(e) => {
                let message = truncate(&e.to_string(), ERROR_PREVIEW_CHARS);
                warn!(check = %check.name, error = %message, "check query failed");
                CheckOutcome::Error { message }
            }
        };
        report.results.push(CheckResult {
            name: check.name.clone(),
            outcome,
        });
    }

    report
}

/// Bound `work` by `limit`. On expiry the work is dropped and `Timeout` returned;
/// the caller decides whether that ends the process.
pub async fn with_watchdog<F: Future>(limit: Duration, work: F) -> Result<F::Output, PortalError> {
    tokio::time::timeout(limit, work)
        .await
        .map_err(|_| PortalError::Timeout(limit))
}
