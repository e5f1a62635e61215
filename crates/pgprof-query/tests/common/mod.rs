//! Common test utilities and mocks

use async_trait::async_trait;
use pgprof_core::{
    ColumnMeta, Connection, PgprofError, Result, ResultSet, Row, StatementResult, Value,
};
use serde_json::json;
use std::sync::Arc;

/// Mock connection for driving the runner without a real database.
///
/// Every `EXPLAIN` gets a single-node plan whose `Actual Rows` is taken from
/// the registered responses (matched by SQL substring) or defaults to 1.
pub struct MockConnection {
    /// Queries containing this pattern fail with a query error
    pub fail_on: Option<String>,
    /// SQL-pattern-based plan responses
    pub plan_responses: Vec<(String, serde_json::Value)>,
    /// Log of all SQL sent through `execute` and `query`
    pub query_log: Arc<parking_lot::Mutex<Vec<String>>>,
}

impl MockConnection {
    pub fn new() -> Self {
        Self {
            fail_on: None,
            plan_responses: vec![],
            query_log: Arc::new(parking_lot::Mutex::new(Vec::new())),
        }
    }

    pub fn with_failure_on(mut self, sql_contains: impl Into<String>) -> Self {
        self.fail_on = Some(sql_contains.into());
        self
    }

    /// Register a raw EXPLAIN document for queries containing the given SQL pattern.
    pub fn with_plan_response(
        mut self,
        sql_contains: impl Into<String>,
        plan: serde_json::Value,
    ) -> Self {
        self.plan_responses.push((sql_contains.into(), plan));
        self
    }

    pub fn query_log(&self) -> Vec<String> {
        self.query_log.lock().clone()
    }
}

/// Minimal EXPLAIN (FORMAT JSON) output for a single scan node
pub fn scan_plan(relation: &str, actual_rows: u64) -> serde_json::Value {
    json!([{
        "Plan": {
            "Node Type": "Seq Scan",
            "Relation Name": relation,
            "Alias": relation,
            "Actual Rows": actual_rows,
            "Actual Loops": 1,
            "Plan Rows": actual_rows,
            "Shared Hit Blocks": 4
        },
        "Planning Time": 0.05,
        "Triggers": [],
        "Execution Time": 0.4
    }])
}

#[async_trait]
impl Connection for MockConnection {
    async fn execute(&self, sql: &str) -> Result<StatementResult> {
        self.query_log.lock().push(sql.to_string());
        Ok(StatementResult::default())
    }

    async fn query(&self, sql: &str) -> Result<ResultSet> {
        self.query_log.lock().push(sql.to_string());

        if let Some(pattern) = &self.fail_on
            && sql.contains(pattern.as_str())
        {
            return Err(PgprofError::Query(format!(
                "relation \"{}\" does not exist",
                pattern
            )));
        }

        let plan = self
            .plan_responses
            .iter()
            .find(|(pattern, _)| sql.contains(pattern.as_str()))
            .map(|(_, plan)| plan.clone())
            .unwrap_or_else(|| scan_plan("t", 1));

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
