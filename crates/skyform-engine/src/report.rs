//! Apply and destroy reports

use crate::provider::Outputs;
use serde::Serialize;

/// Terminal-or-pending state of one node during apply
///
/// `Applied`, `Failed`, and `Skipped` are terminal. There are no retries at
/// this layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeStatus {
    /// Waiting for predecessors
    Pending,
    /// Provider call in flight
    Applying,
    /// Provider call succeeded, outputs recorded
    Applied,
    /// Provider call (or input resolution) failed
    Failed,
    /// Not attempted because an ancestor failed
    Skipped,
}

impl NodeStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            NodeStatus::Applied | NodeStatus::Failed | NodeStatus::Skipped
        )
    }
}

impl std::fmt::Display for NodeStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            NodeStatus::Pending => write!(f, "pending"),
            NodeStatus::Applying => write!(f, "applying"),
            NodeStatus::Applied => write!(f, "applied"),
            NodeStatus::Failed => write!(f, "failed"),
            NodeStatus::Skipped => write!(f, "skipped"),
        }
    }
}

/// Outcome of one node
#[derive(Debug, Clone, Serialize)]
pub struct NodeReport {
    pub name: String,
    pub resource_type: String,
    pub status: NodeStatus,

    /// Resolved output attributes; present only when `Applied`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub outputs: Option<Outputs>,

    /// Error message; present only when `Failed`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,

    /// Name of the failed ancestor; present only when `Skipped`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub blocked_on: Option<String>,
}

/// Aggregated result of one apply pass, in apply order
#[derive(Debug, Clone, Serialize)]
pub struct ApplyReport {
    pub nodes: Vec<NodeReport>,
    pub duration_ms: u64,
}

impl ApplyReport {
    pub fn is_success(&self) -> bool {
        self.nodes
            .iter()
            .all(|n| n.status == NodeStatus::Applied)
    }

    pub fn node(&self, name: &str) -> Option<&NodeReport> {
        self.nodes.iter().find(|n| n.name == name)
    }

    pub fn status(&self, name: &str) -> Option<NodeStatus> {
        self.node(name).map(|n| n.status)
    }

    /// Applied outputs of a node, if it reached `Applied`
    pub fn outputs(&self, name: &str) -> Option<&Outputs> {
        self.node(name).and_then(|n| n.outputs.as_ref())
    }

    pub fn applied(&self) -> impl Iterator<Item = &NodeReport> {
        self.by_status(NodeStatus::Applied)
    }

    pub fn failed(&self) -> impl Iterator<Item = &NodeReport> {
        self.by_status(NodeStatus::Failed)
    }

    pub fn skipped(&self) -> impl Iterator<Item = &NodeReport> {
        self.by_status(NodeStatus::Skipped)
    }

    fn by_status(&self, status: NodeStatus) -> impl Iterator<Item = &NodeReport> {
        self.nodes.iter().filter(move |n| n.status == status)
    }
}

/// A delete that failed during a destroy pass
#[derive(Debug, Clone, Serialize)]
pub struct DestroyFailure {
    pub name: String,
    pub error: String,
}

/// Aggregated result of one destroy pass
#[derive(Debug, Clone, Serialize)]
pub struct DestroyReport {
    /// Successfully deleted nodes, in deletion (reverse apply) order
    pub deleted: Vec<String>,

    /// Deletes that failed; independent deletions still proceed
    pub failed: Vec<DestroyFailure>,

    pub duration_ms: u64,
}

impl DestroyReport {
    pub fn is_success(&self) -> bool {
        self.failed.is_empty()
    }
}
