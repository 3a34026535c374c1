use serde::Serialize;
use std::fmt;
use tracing::warn;

use super::{ERROR_PREVIEW_CHARS, truncate};
use crate::db::StatementExecutor;
use crate::db::schema::{KNOWN_TABLES, count_query};
use crate::error::PortalError;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TableCount {
    pub table: String,
    /// `None` when the table is missing or could not be counted.
    pub rows: Option<i64>,
}

/// Post-deploy snapshot of the `public` schema.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeploymentSummary {
    pub public_tables: Vec<String>,
    pub counts: Vec<TableCount>,
}

impl DeploymentSummary {
    pub fn missing_tables(&self) -> Vec<&str> {
        self.counts
            .iter()
            .filter(|c| c.rows.is_none())
            .map(|c| c.table.as_str())
            .collect()
    }

    pub fn total_rows(&self) -> i64 {
        self.counts.iter().filter_map(|c| c.rows).sum()
    }
}

impl fmt::Display for DeploymentSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Tables in public schema: {}", self.public_tables.len())?;
        for count in &self.counts {
            match count.rows {
                Some(rows) => writeln!(f, "  {:<18} {rows:>8} rows", count.table)?,
                None => writeln!(f, "  {:<18} {:>8}", count.table, "missing")?,
            }
        }
        write!(f, "Total rows across known tables: {}", self.total_rows())
    }
}

/// List public tables, then count rows in every known table that exists.
///
/// Failing to list tables is fatal; a failing count is logged and reported as missing.
pub async fn deployment_summary<E: StatementExecutor>(
    exec: &mut E,
) -> Result<DeploymentSummary, PortalError> {
    let public_tables = exec.list_tables().await?;
    let mut counts = Vec::with_capacity(KNOWN_TABLES.len());

    for &table in KNOWN_TABLES {
        let rows = match count_query(table) {
            Some(sql) if public_tables.iter().any(|t| t == table) => {
                match exec.fetch_count(&sql).await {
                    Ok(n) => Some(n),
                    Err(e) => {
                        warn!(
                            table,
                            error = %truncate(&e.to_string(), ERROR_PREVIEW_CHARS),
                            "row count failed"
                        );
                        None
                    }
                }
            }
            _ => None,
        };
        counts.push(TableCount {
            table: table.to_string(),
            rows,
        });
    }

    Ok(DeploymentSummary {
        public_tables,
        counts,
    })
}
