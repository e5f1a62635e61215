//! Plan distillation
//!
//! Flattens a plan tree into the record written to `query_<NNN>_plan.json`:
//! top-level timings plus one sparse entry per node in preorder.

use crate::explain::plan::{ExplainDocument, PlanNode, Result};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Number, Value};

/// Node attributes copied into distilled output, as (EXPLAIN key, output key).
///
/// Output entries follow this order after `node_type` and `depth`.
pub const PLAN_FIELDS: &[(&str, &str)] = &[
    ("Relation Name", "relation"),
    ("Index Name", "index"),
    ("Actual Rows", "actual_rows"),
    ("Actual Loops", "actual_loops"),
    ("Actual Total Time", "actual_total_time_ms"),
    ("Plan Rows", "plan_rows"),
    ("Plan Width", "plan_width"),
    ("Total Cost", "plan_total_cost"),
    ("Filter", "filter"),
    ("Index Cond", "index_cond"),
    ("Recheck Cond", "recheck_cond"),
    ("Hash Cond", "hash_cond"),
    ("Merge Cond", "merge_cond"),
    ("Join Filter", "join_filter"),
    ("Sort Key", "sort_key"),
    ("Group Key", "group_key"),
    ("Shared Hit Blocks", "shared_hit_blocks"),
    ("Shared Read Blocks", "shared_read_blocks"),
    ("Shared Dirtied Blocks", "shared_dirtied_blocks"),
    ("Shared Written Blocks", "shared_written_blocks"),
    ("Temp Read Blocks", "temp_read_blocks"),
    ("Temp Written Blocks", "temp_written_blocks"),
];

/// Flattened plan telemetry for one statement
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DistilledPlan {
    pub planning_time_ms: Option<f64>,
    pub execution_time_ms: Option<f64>,
    /// `Actual Rows` of the root node, exactly as reported
    pub top_actual_rows: Option<Number>,
    /// Preorder projection of every node
    pub plan_nodes: Vec<DistilledNode>,
}

/// Projection of a single plan node
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DistilledNode {
    pub node_type: Option<String>,
    pub depth: usize,
    /// Only the `PLAN_FIELDS` present in the source node
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

impl DistilledNode {
    fn project(node: &PlanNode, depth: usize) -> Self {
        let fields = PLAN_FIELDS
            .iter()
            .filter_map(|(source, output)| {
                node.attribute(source)
                    .map(|value| (output.to_string(), value.clone()))
            })
            .collect();

        Self {
            node_type: node.node_type.clone(),
            depth,
            fields,
        }
    }

    /// Looks up a distilled field by its output name
    pub fn field(&self, name: &str) -> Option<&Value> {
        self.fields.get(name)
    }
}

impl DistilledPlan {
    /// Total nodes in the flattened plan
    pub fn node_count(&self) -> usize {
        self.plan_nodes.len()
    }
}

/// Distills a parsed EXPLAIN document
pub fn distill(document: &ExplainDocument) -> DistilledPlan {
    let (top_actual_rows, plan_nodes) = match &document.root {
        Some(root) => (
            root.actual_rows().cloned(),
            root.iter_with_depth()
                .map(|(node, depth)| DistilledNode::project(node, depth))
                .collect(),
        ),
        None => (None, Vec::new()),
    };

    DistilledPlan {
        planning_time_ms: document.planning_time_ms,
        execution_time_ms: document.execution_time_ms,
        top_actual_rows,
        plan_nodes,
    }
}

/// Parses and distills raw EXPLAIN JSON in one step
pub fn distill_json(value: &Value) -> Result<DistilledPlan> {
    ExplainDocument::from_json(value).map(|document| distill(&document))
}
