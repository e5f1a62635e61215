//! Tests for a whole profiling run

use super::*;
use async_trait::async_trait;
use parking_lot::Mutex;
use pgprof_core::{ColumnMeta, PgprofError, Result, ResultSet, Row, StatementResult, Value};
use pretty_assertions::assert_eq;
use serde_json::json;
use std::path::Path;

/// Answers every EXPLAIN with a one-node plan, failing queries that contain `fail_on`
#[derive(Default)]
struct ScriptedConnection {
    fail_on: Option<&'static str>,
    log: Mutex<Vec<String>>,
}

impl ScriptedConnection {
    fn failing_on(pattern: &'static str) -> Self {
        Self {
            fail_on: Some(pattern),
            ..Self::default()
        }
    }

    fn log(&self) -> Vec<String> {
        self.log.lock().clone()
    }
}

#[async_trait]
impl Connection for ScriptedConnection {
    async fn execute(&self, sql: &str) -> Result<StatementResult> {
        self.log.lock().push(sql.to_string());
        Ok(StatementResult::default())
    }

    async fn query(&self, sql: &str) -> Result<ResultSet> {
        self.log.lock().push(sql.to_string());
        if let Some(pattern) = self.fail_on
            && sql.contains(pattern)
        {
            return Err(PgprofError::Query(format!("relation \"{pattern}\" does not exist")));
        }
        let plan = json!([{
            "Plan": {"Node Type": "Result", "Actual Rows": 1},
            "Planning Time": 0.01,
            "Execution Time": 0.02
        }]);
        Ok(ResultSet::new(
            vec![ColumnMeta::new("QUERY PLAN", "json")],
            vec![Row::new(vec![Value::Json(plan)])],
        ))
    }

    async fn close(&self) -> Result<()> {
        Ok(())
    }

    fn is_closed(&self) -> bool {
        false
    }
}

fn config_for(dir: &Path, sql: &str, strict: bool) -> ProfileConfig {
    let sql_file = dir.join("script.sql");
    std::fs::write(&sql_file, sql).expect("write script");
    ProfileConfig {
        dsn: "host=localhost".into(),
        sql_file,
        out_dir: dir.join("runs"),
        statement_timeout_ms: None,
        run_id: "run-1".into(),
        strict,
        log_filter: "info".into(),
        json_log: false,
        ssl_root_cert: None,
    }
}

#[tokio::test]
async fn test_successful_run_writes_plans_and_summary() {
    let temp = tempfile::tempdir().expect("tempdir");
    let config = config_for(temp.path(), "SELECT 1; SELECT 2;", false);
    let conn = ScriptedConnection::default();

    let report = run_profile(&config, &conn).await.expect("run succeeds");

    assert_eq!(report.plans, 2);
    assert_eq!(report.run_dir, temp.path().join("runs/run-1"));
    assert_eq!(report.summary_path, report.run_dir.join("run-1_summary.jsonl"));
    assert!(report.run_dir.join("query_002_plan.json").exists());

    let summary = std::fs::read_to_string(&report.summary_path).expect("read summary");
    assert_eq!(summary.lines().count(), 2);
}

#[tokio::test]
async fn test_failed_statement_leaves_plans_but_no_summary() {
    let temp = tempfile::tempdir().expect("tempdir");
    let config = config_for(
        temp.path(),
        "SELECT 1;\nSELECT * FROM missing_table;\nSELECT 3;",
        false,
    );
    let conn = ScriptedConnection::failing_on("missing_table");

    let err = run_profile(&config, &conn).await.unwrap_err();

    assert!(matches!(
        err.downcast_ref::<PgprofError>(),
        Some(PgprofError::Statement { index: 2, .. })
    ));
    let run_dir = temp.path().join("runs/run-1");
    assert!(run_dir.join("query_001_plan.json").exists());
    assert!(!run_dir.join("query_002_plan.json").exists());
    assert!(!run_dir.join("run-1_summary.jsonl").exists());
    assert_eq!(conn.log().len(), 2);
}

#[tokio::test]
async fn test_strict_mode_rejects_unterminated_quote_before_querying() {
    let temp = tempfile::tempdir().expect("tempdir");
    let config = config_for(temp.path(), "SELECT 1;\nSELECT 'unclosed;", true);
    let conn = ScriptedConnection::default();

    let err = run_profile(&config, &conn).await.unwrap_err();

    assert!(matches!(
        err.downcast_ref::<PgprofError>(),
        Some(PgprofError::Lexical(_))
    ));
    assert!(conn.log().is_empty());
    assert!(!temp.path().join("runs/run-1").exists());
}

#[tokio::test]
async fn test_lenient_mode_runs_unterminated_tail_as_last_statement() {
    let temp = tempfile::tempdir().expect("tempdir");
    let config = config_for(temp.path(), "SELECT 1;\nSELECT 'unclosed;", false);
    let conn = ScriptedConnection::default();

    let report = run_profile(&config, &conn).await.expect("run succeeds");

    assert_eq!(report.plans, 2);
    assert!(conn.log()[1].ends_with("SELECT 'unclosed;"));
}

#[tokio::test]
async fn test_zero_timeout_is_sent_to_the_session() {
    let temp = tempfile::tempdir().expect("tempdir");
    let config = ProfileConfig {
        statement_timeout_ms: Some(0),
        ..config_for(temp.path(), "SELECT 1;", false)
    };
    let conn = ScriptedConnection::default();

    run_profile(&config, &conn).await.expect("run succeeds");

    assert_eq!(conn.log()[0], "SET statement_timeout TO 0");
}

#[test]
fn test_missing_sql_file_is_reported_with_its_path() {
    let temp = tempfile::tempdir().expect("tempdir");
    let config = ProfileConfig {
        sql_file: temp.path().join("absent.sql"),
        ..config_for(temp.path(), "", false)
    };

    let err = load_script(&config).unwrap_err();

    assert!(err.to_string().contains("absent.sql"));
}
