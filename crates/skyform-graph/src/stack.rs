//! Stack: an ordered set of resource declarations plus named exports

use crate::expr::Expr;
use crate::node::ResourceNode;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A named collection of resource nodes and the outputs it exports
///
/// Declaration order is preserved; it breaks ties when the scheduler orders
/// independent nodes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Stack {
    /// Stack name (also used as the provider project name)
    pub name: String,

    /// Resource declarations, in declaration order
    pub nodes: Vec<ResourceNode>,

    /// Exported values, resolved after apply completes
    pub exports: BTreeMap<String, Expr>,
}

impl Stack {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            nodes: Vec::new(),
            exports: BTreeMap::new(),
        }
    }

    pub fn add_resource(&mut self, node: ResourceNode) {
        self.nodes.push(node);
    }

    pub fn export(&mut self, name: impl Into<String>, value: impl Into<Expr>) {
        self.exports.insert(name.into(), value.into());
    }

    pub fn get(&self, name: &str) -> Option<&ResourceNode> {
        self.nodes.iter().find(|n| n.name == name)
    }
}
