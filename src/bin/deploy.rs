//! Apply the bundled SQL files to the configured database and print a summary.

use jobportal::deploy::{DeployRunner, deployment_summary};
use jobportal::error::error_chain;
use jobportal::{Config, PortalError, logging};
use mimalloc::MiMalloc;
use sqlx::{Connection, PgConnection};
use std::process::ExitCode;
use tracing::{error, info, warn};

#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

#[tokio::main]
async fn main() -> ExitCode {
    let cfg = match Config::load() {
        Ok(cfg) => cfg,
        Err(e) => {
            logging::init("info");
            error!(error = %e, chain = ?error_chain(&e), "failed to load configuration");
            return ExitCode::FAILURE;
        }
    };
    logging::init(&cfg.loglevel);

    match run(&cfg).await {
        Ok(code) => code,
        Err(e) => {
            error!(error = %e, chain = ?error_chain(&e), "deployment aborted");
            ExitCode::FAILURE
        }
    }
}

async fn run(cfg: &Config) -> Result<ExitCode, PortalError> {
    info!(database = %cfg.db_target(), "connecting");
    let mut conn = PgConnection::connect_with(&cfg.pg_connect_options()?).await?;

    let runner = DeployRunner::from_config(cfg);
    let report = runner.run(&mut conn).await?;
    println!("{report}");

    let summary = deployment_summary(&mut conn).await?;
    println!("{summary}");

    conn.close().await?;

    if report.fails_run(cfg.deploy_strict) {
        warn!(errors = report.error_count(), "strict mode: statements failed");
        return Ok(ExitCode::FAILURE);
    }
    info!(
        succeeded = report.statements_succeeded(),
        already_existed = report.already_exists_count(),
        failed = report.error_count(),
        "deployment finished"
    );
    Ok(ExitCode::SUCCESS)
}
