use jobportal::deploy::{DeployRunner, FailureKind, FileOutcome, deployment_summary};
use jobportal::testing::RecordingExecutor;
use jobportal::verify::{CheckOutcome, default_checks, run_checks, with_watchdog};
use std::fs;
use std::path::PathBuf;
use std::time::Duration;

#[tokio::test]
async fn missing_file_is_skipped_and_failures_do_not_stop_the_run() {
    let dir = tempfile::tempdir().expect("failed to create temp dir");
    let first = dir.path().join("schema.sql");
    let missing = dir.path().join("seed_data.sql");
    let last = dir.path().join("sample_jobs.sql");

    fs::write(
        &first,
        "-- tables\nCREATE TABLE x (id INT);\nINSERT INTO x VALUES (1);\n",
    )
    .expect("failed to write schema");
    fs::write(
        &last,
        "INSERT INTO x VALUES (2);\nINVALID SQL;\nINSERT INTO x VALUES ('a;b');",
    )
    .expect("failed to write sample data");

    let runner = DeployRunner::new(vec![first.clone(), missing.clone(), last.clone()]);
    let mut exec = RecordingExecutor::new()
        .fail_with_sqlstate("CREATE TABLE x", "42P07", "relation \"x\" already exists")
        .fail_on("INVALID", "syntax error at or near \"INVALID\"");

    let report = runner.run(&mut exec).await.expect("deploy run failed");

    assert_eq!(report.files.len(), 3);
    assert_eq!(
        report.files[0].outcome,
        FileOutcome::Applied {
            total: 2,
            succeeded: 1
        }
    );
    assert_eq!(report.files[1].path, missing);
    assert_eq!(report.files[1].outcome, FileOutcome::Skipped);
    assert_eq!(
        report.files[2].outcome,
        FileOutcome::Applied {
            total: 3,
            succeeded: 2
        }
    );

    assert_eq!(
        exec.executed(),
        &[
            "INSERT INTO x VALUES (1)",
            "INSERT INTO x VALUES (2)",
            "INSERT INTO x VALUES ('a;b')",
        ]
    );
    assert_eq!(report.already_exists_count(), 1);
    assert_eq!(report.error_count(), 1);
    let failed = report
        .failures
        .iter()
        .find(|f| f.kind == FailureKind::Error)
        .expect("one hard failure");
    assert_eq!(failed.file, last);
    assert_eq!(failed.index, 2);
    assert!(!report.is_clean());
}

#[tokio::test]
async fn bundled_sql_files_apply_in_order() {
    let sql_dir = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("sql");
    let runner = DeployRunner::new(
        ["schema.sql", "seed_data.sql", "sample_jobs.sql"]
            .iter()
            .map(|f| sql_dir.join(f))
            .collect(),
    );
    let mut exec = RecordingExecutor::new();

    let report = runner.run(&mut exec).await.expect("deploy run failed");

    assert_eq!(report.files_skipped(), 0);
    assert!(report.is_clean());

    // 18 schema statements, 4 seed inserts, 7 sample inserts
    let executed = exec.executed();
    assert_eq!(executed.len(), 29);
    assert_eq!(report.statements_succeeded(), 29);
    assert!(executed[0].starts_with("CREATE TABLE IF NOT EXISTS users"));
    assert!(executed[18].starts_with("INSERT INTO users"));
    assert!(executed[22].starts_with("INSERT INTO jobs"));
    assert!(executed[28].starts_with("INSERT INTO payments"));
}

#[tokio::test]
async fn summary_and_checks_after_a_seeded_deploy() {
    let mut exec = RecordingExecutor::new()
        .with_table("users", 6)
        .with_table("companies", 3)
        .with_table("jobs", 5)
        .with_table("skills", 8);

    let summary = deployment_summary(&mut exec).await.expect("summary failed");
    assert_eq!(summary.total_rows(), 22);
    assert!(summary.missing_tables().contains(&"payments"));

    let report = with_watchdog(Duration::from_secs(5), run_checks(&mut exec, &default_checks()))
        .await
        .expect("checks timed out");
    assert_eq!(report.results.len(), default_checks().len());
    assert_eq!(report.passed(), 4);
    assert!(matches!(
        report.results.last().map(|r| &r.outcome),
        Some(CheckOutcome::Error { .. })
    ));
}

#[tokio::test]
async fn slow_verification_is_cut_off() {
    let mut exec = RecordingExecutor::new()
        .with_table("users", 6)
        .with_delay(Duration::from_millis(200));

    let result = with_watchdog(
        Duration::from_millis(50),
        run_checks(&mut exec, &default_checks()),
    )
    .await;
    assert!(result.is_err());
}

#[tokio::test]
async fn unreadable_and_non_utf8_files_do_not_stop_the_run() {
    let dir = tempfile::tempdir().expect("failed to create temp dir");
    let first = dir.path().join("schema.sql");
    let latin1 = dir.path().join("seed_data.sql");
    let not_a_file = dir.path().join("sample_jobs.sql");
    let last = dir.path().join("extra.sql");

    fs::write(&first, "CREATE TABLE x (name TEXT);").expect("failed to write schema");
    fs::write(&latin1, b"INSERT INTO x VALUES ('caf\xe9');".as_slice())
        .expect("failed to write seed data");
    fs::create_dir(&not_a_file).expect("failed to create directory");
    fs::write(&last, "INSERT INTO x VALUES ('done');").expect("failed to write extra");

    let runner = DeployRunner::new(vec![
        first.clone(),
        latin1.clone(),
        not_a_file.clone(),
        last.clone(),
    ]);
    let mut exec = RecordingExecutor::new();

    let report = runner.run(&mut exec).await.expect("deploy run failed");

    assert_eq!(report.files.len(), 4);
    assert_eq!(
        report.files[1].outcome,
        FileOutcome::Applied {
            total: 1,
            succeeded: 1
        }
    );
    assert_eq!(report.files[2].path, not_a_file);
    assert_eq!(report.files[2].outcome, FileOutcome::Unreadable);
    assert_eq!(report.files_skipped(), 1);
    assert_eq!(
        exec.executed(),
        &[
            "CREATE TABLE x (name TEXT)",
            "INSERT INTO x VALUES ('caf\u{FFFD}')",
            "INSERT INTO x VALUES ('done')",
        ]
    );
    assert!(report.is_clean());
}
