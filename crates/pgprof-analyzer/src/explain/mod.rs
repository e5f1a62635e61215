//! Query EXPLAIN Module
//!
//! - `plan`: the nested plan tree exactly as PostgreSQL reports it
//! - `distill`: the flattened, sparse projection written to plan artifacts
//!
//! # Example
//!
//! ```
//! use pgprof_analyzer::explain::{ExplainDocument, distill};
//!
//! let json = r#"[{
//!     "Plan": {
//!         "Node Type": "Seq Scan",
//!         "Relation Name": "users",
//!         "Actual Rows": 3,
//!         "Plans": []
//!     },
//!     "Planning Time": 0.05,
//!     "Execution Time": 0.12
//! }]"#;
//!
//! let document = ExplainDocument::parse(json).unwrap();
//! let distilled = distill(&document);
//! assert_eq!(distilled.plan_nodes.len(), 1);
//! assert_eq!(distilled.plan_nodes[0].depth, 0);
//! assert_eq!(distilled.execution_time_ms, Some(0.12));
//! ```

pub mod distill;
pub mod plan;

pub use distill::{DistilledNode, DistilledPlan, PLAN_FIELDS, distill, distill_json};
pub use plan::{ExplainDocument, ExplainError, PlanNode, PlanNodeIterator};
