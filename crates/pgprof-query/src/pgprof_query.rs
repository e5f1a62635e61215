//! Statement splitting, EXPLAIN execution and run artifacts
//!
//! The pipeline for one run: [`splitter`] turns a SQL script into statements,
//! [`runner`] profiles each one against a [`pgprof_core::Connection`] and
//! writes its plan artifact, and [`summary`] records the run as JSON lines.

pub mod artifacts;
pub mod runner;
pub mod splitter;
pub mod summary;

pub use artifacts::{ArtifactStore, plan_file_name, summary_file_name};
pub use runner::{ExplainRunner, QueryResult, RunOptions, explain_sql};
pub use splitter::{
    RegionKind, Statement, StatementSplitter, UnterminatedRegion, number_statements,
    split_statements, split_statements_strict, statements,
};
pub use summary::write_summary;
