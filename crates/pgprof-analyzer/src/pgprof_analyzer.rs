//! pgprof Analyzer - EXPLAIN plan parsing and distillation
//!
//! This crate provides functionality for:
//! - Parsing PostgreSQL `EXPLAIN (ANALYZE, FORMAT JSON)` output into a plan tree
//! - Flattening the tree into a depth-annotated telemetry record

pub mod explain;

pub use explain::*;
