//! Resource node declarations

use crate::expr::{Expr, OutputRef};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One declared infrastructure object
///
/// A node's topology is fixed at declaration time: inputs may reference other
/// nodes' outputs, and `depends_on` forces ordering beyond those data edges
/// (e.g., a service that must not start before its listener exists even
/// though it reads none of the listener's outputs).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResourceNode {
    /// Logical name, unique within a graph
    pub name: String,

    /// Resource type tag (e.g., "network", "load-balancer", "bucket")
    pub resource_type: String,

    /// Input properties, literal or derived from other nodes' outputs
    pub inputs: BTreeMap<String, Expr>,

    /// Explicit predecessors beyond the data dependencies
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub depends_on: Vec<String>,
}

impl ResourceNode {
    pub fn new(resource_type: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            resource_type: resource_type.into(),
            inputs: BTreeMap::new(),
            depends_on: Vec::new(),
        }
    }

    pub fn with_input(mut self, key: impl Into<String>, value: impl Into<Expr>) -> Self {
        self.inputs.insert(key.into(), value.into());
        self
    }

    pub fn with_depends_on(mut self, node: impl Into<String>) -> Self {
        self.depends_on.push(node.into());
        self
    }

    /// All output references appearing in this node's inputs
    pub fn references(&self) -> Vec<&OutputRef> {
        self.inputs
            .values()
            .flat_map(|expr| expr.references())
            .collect()
    }
}
