//! Best-effort SQL deployment.
//!
//! Files are applied in order over one connection. A missing file is skipped
//! with a warning; a failing statement is logged, recorded in the report and
//! the next statement runs. Nothing is rolled back.

pub mod splitter;
pub mod summary;

pub use splitter::split_statements;
pub use summary::{DeploymentSummary, TableCount, deployment_summary};

use serde::Serialize;
use std::borrow::Cow;
use std::fmt;
use std::path::{Path, PathBuf};
use tracing::{debug, error, info, warn};

use crate::config::Config;
use crate::db::StatementExecutor;
use crate::error::{PortalError, is_already_exists};

/// Error messages are cut to this many characters in logs and reports.
pub const ERROR_PREVIEW_CHARS: usize = 120;
const STATEMENT_PREVIEW_CHARS: usize = 60;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// The object or row was already present; expected on re-deploys.
    AlreadyExists,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatementFailure {
    pub file: PathBuf,
    /// 1-based position of the statement within its file.
    pub index: usize,
    pub preview: String,
    pub message: String,
    pub kind: FailureKind,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum FileOutcome {
    Skipped,
    Unreadable,
    Applied { total: usize, succeeded: usize },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileReport {
    pub path: PathBuf,
    pub outcome: FileOutcome,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DeployReport {
    pub files: Vec<FileReport>,
    pub failures: Vec<StatementFailure>,
}

impl DeployReport {
    pub fn statements_succeeded(&self) -> usize {
        self.files
            .iter()
            .map(|f| match f.outcome {
                FileOutcome::Applied { succeeded, .. } => succeeded,
                FileOutcome::Skipped | FileOutcome::Unreadable => 0,
            })
            .sum()
    }

    pub fn files_skipped(&self) -> usize {
        self.files
            .iter()
            .filter(|f| matches!(f.outcome, FileOutcome::Skipped | FileOutcome::Unreadable))
            .count()
    }

    pub fn already_exists_count(&self) -> usize {
        self.count_kind(FailureKind::AlreadyExists)
    }

    pub fn error_count(&self) -> usize {
        self.count_kind(FailureKind::Error)
    }

    /// No failures other than "already exists".
    pub fn is_clean(&self) -> bool {
        self.error_count() == 0
    }

    /// Whether the deploy binary should exit non-zero. Best-effort runs never
    /// fail on statement errors; strict runs fail on any that is not "already exists".
    pub fn fails_run(&self, strict: bool) -> bool {
        strict && !self.is_clean()
    }

    fn count_kind(&self, kind: FailureKind) -> usize {
        self.failures.iter().filter(|f| f.kind == kind).count()
    }
}

impl fmt::Display for DeployReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "SQL files:")?;
        for file in &self.files {
            match file.outcome {
                FileOutcome::Skipped => {
                    writeln!(f, "  SKIP  {} (not found)", file.path.display())?
                }
                FileOutcome::Unreadable => {
                    writeln!(f, "  SKIP  {} (unreadable)", file.path.display())?
                }
                FileOutcome::Applied { total, succeeded } => writeln!(
                    f,
                    "  {}  {} ({succeeded}/{total} statements)",
                    if succeeded == total { "OK  " } else { "PART" },
                    file.path.display()
                )?,
            }
        }
        writeln!(
            f,
            "Statements: {} succeeded, {} already existed, {} failed",
            self.statements_succeeded(),
            self.already_exists_count(),
            self.error_count()
        )?;
        for failure in self
            .failures
            .iter()
            .filter(|x| x.kind == FailureKind::Error)
        {
            writeln!(
                f,
                "  {}#{}: {} -> {}",
                failure.file.display(),
                failure.index,
                failure.preview,
                failure.message
            )?;
        }
        Ok(())
    }
}

/// Applies an ordered list of SQL files.
#[derive(Debug, Clone)]
pub struct DeployRunner {
    files: Vec<PathBuf>,
}

impl DeployRunner {
    pub fn new(files: Vec<PathBuf>) -> Self {
        Self { files }
    }

    pub fn from_config(cfg: &Config) -> Self {
        Self::new(cfg.deploy_files())
    }

    /// Apply every file in order. A file that is missing or cannot be read is
    /// recorded and the run moves on to the next one.
    pub async fn run<E: StatementExecutor>(&self, exec: &mut E) -> Result<DeployReport, PortalError> {
        let mut report = DeployReport::default();

        for path in &self.files {
            let bytes = match tokio::fs::read(path).await {
                Ok(bytes) => bytes,
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                    warn!(path = %path.display(), "SQL file not found; skipping");
                    report.files.push(FileReport {
                        path: path.clone(),
                        outcome: FileOutcome::Skipped,
                    });
                    continue;
                }
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "SQL file unreadable; skipping");
                    report.files.push(FileReport {
                        path: path.clone(),
                        outcome: FileOutcome::Unreadable,
                    });
                    continue;
                }
            };

            let sql = String::from_utf8_lossy(&bytes);
            if matches!(sql, Cow::Owned(_)) {
                warn!(path = %path.display(), "SQL file is not valid UTF-8; invalid bytes replaced");
            }
            let statements = split_statements(&sql);
            info!(path = %path.display(), statements = statements.len(), "applying SQL file");

            let (outcome, failures) = execute_statements(exec, path, &statements).await;
            report.files.push(FileReport {
                path: path.clone(),
                outcome,
            });
            report.failures.extend(failures);
        }

        Ok(report)
    }
}

/// Run `statements` one after another; a failure never stops the ones after it.
pub async fn execute_statements<E: StatementExecutor>(
    exec: &mut E,
    file: &Path,
    statements: &[String],
) -> (FileOutcome, Vec<StatementFailure>) {
    let mut succeeded = 0;
    let mut failures = Vec::new();

    for (idx, stmt) in statements.iter().enumerate() {
        let index = idx + 1;
        match exec.execute(stmt).await {
            Ok(rows) => {
                succeeded += 1;
                debug!(path = %file.display(), index, rows, "statement applied");
            }
            Err(e) => {
                let failure = StatementFailure {
                    file: file.to_path_buf(),
                    index,
                    preview: truncate(&one_line(stmt), STATEMENT_PREVIEW_CHARS),
                    message: truncate(&e.to_string(), ERROR_PREVIEW_CHARS),
                    kind: if is_already_exists(&e) {
                        FailureKind::AlreadyExists
                    } else {
                        FailureKind::Error
                    },
                };
                match failure.kind {
                    FailureKind::AlreadyExists => warn!(
                        path = %file.display(),
                        index,
                        statement = %failure.preview,
                        error = %failure.message,
                        "statement skipped; object already exists"
                    ),
                    FailureKind::Error => error!(
                        path = %file.display(),
                        index,
                        statement = %failure.preview,
                        error = %failure.message,
                        "statement failed; continuing"
                    ),
                }
                failures.push(failure);
            }
        }
    }

    let outcome = FileOutcome::Applied {
        total: statements.len(),
        succeeded,
    };
    (outcome, failures)
}

fn one_line(sql: &str) -> String {
    sql.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// First `max` characters, with `...` appended when anything was cut.
pub fn truncate(s: &str, max: usize) -> String {
    match s.char_indices().nth(max) {
        Some((cut, _)) => format!("{}...", &s[..cut]),
        None => s.to_string(),
    }
}
