//! Query Plan Model - the nested plan tree from `EXPLAIN (FORMAT JSON)`
//!
//! PostgreSQL reports a different attribute set per operator and per EXPLAIN
//! option (ANALYZE, BUFFERS, VERBOSE), so nodes keep their attributes as an
//! open JSON map instead of a fixed struct.

use pgprof_core::PgprofError;
use serde_json::{Map, Number, Value};
use thiserror::Error;

/// Errors that can occur when reading EXPLAIN output
#[derive(Debug, Error)]
pub enum ExplainError {
    #[error("Invalid JSON: {0}")]
    InvalidJson(#[from] serde_json::Error),

    #[error("EXPLAIN output is an empty array")]
    EmptyOutput,

    #[error("Invalid plan structure: {0}")]
    InvalidStructure(String),
}

impl From<ExplainError> for PgprofError {
    fn from(err: ExplainError) -> Self {
        PgprofError::Plan(err.to_string())
    }
}

/// Result type for EXPLAIN parsing
pub type Result<T> = std::result::Result<T, ExplainError>;

/// The top-level object of an `EXPLAIN (ANALYZE, FORMAT JSON)` result
#[derive(Debug, Clone, PartialEq)]
pub struct ExplainDocument {
    /// `Planning Time` in milliseconds
    pub planning_time_ms: Option<f64>,
    /// `Execution Time` in milliseconds
    pub execution_time_ms: Option<f64>,
    /// The `Plan` tree, if the document carried one
    pub root: Option<PlanNode>,
}

impl ExplainDocument {
    /// Parses EXPLAIN JSON text
    pub fn parse(json: &str) -> Result<Self> {
        let value: Value = serde_json::from_str(json.trim())?;
        Self::from_json(&value)
    }

    /// Builds a document from an already decoded JSON value.
    ///
    /// Accepts the array PostgreSQL returns (`[{"Plan": ...}]`) or the bare
    /// root object.
    pub fn from_json(value: &Value) -> Result<Self> {
        let root_obj = match value {
            Value::Array(items) => items.first().ok_or(ExplainError::EmptyOutput)?,
            Value::Object(_) => value,
            other => {
                return Err(ExplainError::InvalidStructure(format!(
                    "expected a JSON array or object, got {}",
                    json_kind(other)
                )));
            }
        };

        let Some(obj) = root_obj.as_object() else {
            return Err(ExplainError::InvalidStructure(format!(
                "expected the first element to be an object, got {}",
                json_kind(root_obj)
            )));
        };

        Ok(Self {
            planning_time_ms: obj.get("Planning Time").and_then(Value::as_f64),
            execution_time_ms: obj.get("Execution Time").and_then(Value::as_f64),
            root: obj.get("Plan").and_then(PlanNode::from_json),
        })
    }
}

/// A single operator in the plan tree
#[derive(Debug, Clone, PartialEq)]
pub struct PlanNode {
    /// `Node Type` (e.g. "Seq Scan", "Hash Join")
    pub node_type: Option<String>,
    /// Every other attribute reported for this node, except `Plans`
    pub attributes: Map<String, Value>,
    /// Child nodes in source order
    pub children: Vec<PlanNode>,
}

impl PlanNode {
    /// Creates a node with no attributes and no children
    pub fn new(node_type: impl Into<String>) -> Self {
        Self {
            node_type: Some(node_type.into()),
            attributes: Map::new(),
            children: Vec::new(),
        }
    }

    /// Builds a node (and its subtree) from a JSON object.
    ///
    /// Returns `None` for non-objects. Non-object entries of `Plans` are skipped.
    pub fn from_json(value: &Value) -> Option<Self> {
        let obj = value.as_object()?;

        let mut node = Self {
            node_type: obj
                .get("Node Type")
                .and_then(Value::as_str)
                .map(str::to_string),
            attributes: Map::new(),
            children: Vec::new(),
        };

        for (key, val) in obj {
            match key.as_str() {
                "Node Type" => {}
                "Plans" => {
                    if let Some(plans) = val.as_array() {
                        node.children = plans.iter().filter_map(PlanNode::from_json).collect();
                    }
                }
                _ => {
                    node.attributes.insert(key.clone(), val.clone());
                }
            }
        }

        Some(node)
    }

    /// Sets an attribute
    pub fn with_attribute(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.attributes.insert(key.into(), value.into());
        self
    }

    /// Adds a child node
    pub fn with_child(mut self, child: PlanNode) -> Self {
        self.children.push(child);
        self
    }

    /// Looks up an attribute, treating JSON `null` as absent
    pub fn attribute(&self, key: &str) -> Option<&Value> {
        self.attributes.get(key).filter(|v| !v.is_null())
    }

    /// `Actual Rows` as reported by EXPLAIN ANALYZE
    pub fn actual_rows(&self) -> Option<&Number> {
        self.attribute("Actual Rows").and_then(|v| match v {
            Value::Number(n) => Some(n),
            _ => None,
        })
    }

    /// Preorder traversal yielding each node with its depth (root = 0)
    pub fn iter_with_depth(&self) -> PlanNodeIterator<'_> {
        PlanNodeIterator::new(self)
    }
}

/// Iterator for traversing plan nodes depth-first, parent before children
pub struct PlanNodeIterator<'a> {
    stack: Vec<(&'a PlanNode, usize)>,
}

impl<'a> PlanNodeIterator<'a> {
    fn new(root: &'a PlanNode) -> Self {
        Self {
            stack: vec![(root, 0)],
        }
    }
}

impl<'a> Iterator for PlanNodeIterator<'a> {
    type Item = (&'a PlanNode, usize);

    fn next(&mut self) -> Option<Self::Item> {
        let (node, depth) = self.stack.pop()?;
        // Push children in reverse order so we visit them in order
        for child in node.children.iter().rev() {
            self.stack.push((child, depth + 1));
        }
        Some((node, depth))
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
