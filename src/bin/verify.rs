//! Run the post-deploy sanity checks. Failed checks are reported, not fatal;
//! a connection failure or the watchdog firing exits with status 1.

use jobportal::verify::{VerificationReport, default_checks, run_checks, with_watchdog};
use jobportal::error::error_chain;
use jobportal::{Config, PortalError, logging};
use mimalloc::MiMalloc;
use sqlx::{Connection, PgConnection};
use std::process::ExitCode;
use tracing::{error, info};

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

    let limit = cfg.verify_timeout();
    match with_watchdog(limit, verify(&cfg)).await {
        Ok(Ok(report)) => {
            println!("{report}");
            info!(passed = report.passed(), failed = report.failed(), "verification finished");
            ExitCode::SUCCESS
        }
        Ok(Err(e)) => {
            error!(error = %e, chain = ?error_chain(&e), "verification aborted");
            ExitCode::FAILURE
        }
        Err(e) => {
            error!(error = %e, "verification watchdog fired");
            ExitCode::FAILURE
        }
    }
}

async fn verify(cfg: &Config) -> Result<VerificationReport, PortalError> {
    info!(database = %cfg.db_target(), "connecting");
    let mut conn = PgConnection::connect_with(&cfg.pg_connect_options()?).await?;
    let report = run_checks(&mut conn, &default_checks()).await;
    conn.close().await?;
    Ok(report)
}
