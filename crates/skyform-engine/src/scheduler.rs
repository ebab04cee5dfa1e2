//! Apply scheduler
//!
//! Walks a dependency graph in topological order, resolving each node's
//! inputs from already-recorded apply results before handing the node to the
//! resource provider. A node is dispatched only once every predecessor has
//! applied, so each apply result is written exactly once by exactly one
//! worker.
//!
//! Failure of a node skips its transitive dependents; independent branches
//! keep applying. Already-applied resources are never rolled back here;
//! rollback is an explicit destroy pass.

use crate::provider::{Outputs, ProviderContext, ResourceProvider};
use crate::report::{ApplyReport, DestroyFailure, DestroyReport, NodeReport, NodeStatus};
use skyform_graph::{Graph, OutputRef, ResourceNode};
use std::sync::Arc;
use std::time::Instant;
use tokio::task::JoinSet;

/// Scheduling options for one apply pass
#[derive(Debug, Clone)]
pub struct ApplyOptions {
    /// Maximum number of provider calls in flight; 1 means sequential,
    /// deterministic apply order
    pub parallelism: usize,

    /// Stop dispatching new nodes after the first failure; in-flight applies
    /// run to completion and everything not yet started is skipped
    pub stop_on_failure: bool,
}

impl Default for ApplyOptions {
    fn default() -> Self {
        Self {
            parallelism: 1,
            stop_on_failure: false,
        }
    }
}

/// Walks the graph, invoking the provider per node
pub struct Scheduler {
    options: ApplyOptions,
}

impl Scheduler {
    pub fn new(options: ApplyOptions) -> Self {
        Self { options }
    }

    /// Apply every node in the graph
    ///
    /// Per-node failures are reported, not returned: the pass itself always
    /// completes and the report carries each node's terminal status.
    pub async fn apply(
        &self,
        graph: &Graph,
        provider: Arc<dyn ResourceProvider>,
        ctx: &ProviderContext,
    ) -> ApplyReport {
        let started = Instant::now();
        let n = graph.len();
        let parallelism = self.options.parallelism.max(1);

        let mut statuses = vec![NodeStatus::Pending; n];
        let mut outputs: Vec<Option<Outputs>> = (0..n).map(|_| None).collect();
        let mut errors: Vec<Option<String>> = vec![None; n];
        let mut blocked_on: Vec<Option<String>> = vec![None; n];
        let mut first_failure: Option<String> = None;

        let mut in_flight: JoinSet<(usize, crate::error::Result<Outputs>)> = JoinSet::new();

        loop {
            cascade_skips(graph, &mut statuses, &mut blocked_on);

            if self.options.stop_on_failure && first_failure.is_some() {
                // Stop dispatching; everything not yet started is skipped.
                for &i in graph.order() {
                    if statuses[i] == NodeStatus::Pending {
                        statuses[i] = NodeStatus::Skipped;
                        blocked_on[i] = first_failure.clone();
                    }
                }
            } else {
                for &i in graph.order() {
                    if in_flight.len() >= parallelism {
                        break;
                    }
                    if statuses[i] != NodeStatus::Pending {
                        continue;
                    }
                    let preds = graph.predecessors_of(i);
                    if !preds.iter().all(|&p| statuses[p] == NodeStatus::Applied) {
                        continue;
                    }

                    let node = graph.node(i);
                    let resolved = match resolve_inputs(node, graph, &outputs) {
                        Ok(resolved) => resolved,
                        Err(message) => {
                            tracing::warn!(node = %node.name, %message, "input resolution failed");
                            statuses[i] = NodeStatus::Failed;
                            errors[i] = Some(message);
                            if first_failure.is_none() {
                                first_failure = Some(node.name.clone());
                            }
                            if self.options.stop_on_failure {
                                break;
                            }
                            continue;
                        }
                    };

                    statuses[i] = NodeStatus::Applying;
                    tracing::info!(
                        node = %node.name,
                        resource_type = %node.resource_type,
                        "applying"
                    );

                    let provider = Arc::clone(&provider);
                    let ctx = ctx.clone();
                    let resource_type = node.resource_type.clone();
                    let name = node.name.clone();
                    in_flight.spawn(async move {
                        let result = provider
                            .create_or_update(&ctx, &resource_type, &name, &resolved)
                            .await;
                        (i, result)
                    });
                }
            }

            if in_flight.is_empty() {
                cascade_skips(graph, &mut statuses, &mut blocked_on);
                if statuses.iter().all(|s| s.is_terminal()) {
                    break;
                }
                continue;
            }

            match in_flight.join_next().await {
                Some(Ok((i, Ok(applied)))) => {
                    tracing::info!(node = %graph.node(i).name, "applied");
                    statuses[i] = NodeStatus::Applied;
                    outputs[i] = Some(applied);
                }
                Some(Ok((i, Err(error)))) => {
                    let name = graph.node(i).name.clone();
                    tracing::warn!(node = %name, %error, "apply failed");
                    statuses[i] = NodeStatus::Failed;
                    errors[i] = Some(error.to_string());
                    if first_failure.is_none() {
                        first_failure = Some(name);
                    }
                }
                Some(Err(join_error)) => {
                    tracing::error!(%join_error, "apply task aborted");
                    for (i, status) in statuses.iter_mut().enumerate() {
                        if *status == NodeStatus::Applying {
                            *status = NodeStatus::Failed;
                            errors[i] = Some(format!("apply task aborted: {join_error}"));
                            if first_failure.is_none() {
                                first_failure = Some(graph.node(i).name.clone());
                            }
                        }
                    }
                }
                None => {}
            }
        }

        let nodes = graph
            .order()
            .iter()
            .map(|&i| {
                let node = graph.node(i);
                NodeReport {
                    name: node.name.clone(),
                    resource_type: node.resource_type.clone(),
                    status: statuses[i],
                    outputs: outputs[i].take(),
                    error: errors[i].take(),
                    blocked_on: blocked_on[i].take(),
                }
            })
            .collect();

        ApplyReport {
            nodes,
            duration_ms: started.elapsed().as_millis() as u64,
        }
    }

    /// Delete every node in reverse apply order
    ///
    /// Failures are recorded and deletion continues; a dependent that was
    /// already deleted never blocks its predecessor's delete.
    pub async fn destroy(
        &self,
        graph: &Graph,
        provider: Arc<dyn ResourceProvider>,
        ctx: &ProviderContext,
    ) -> DestroyReport {
        let started = Instant::now();
        let mut deleted = Vec::new();
        let mut failed = Vec::new();

        for &i in graph.order().iter().rev() {
            let node = graph.node(i);
            tracing::info!(node = %node.name, resource_type = %node.resource_type, "deleting");
            match provider.delete(ctx, &node.resource_type, &node.name).await {
                Ok(()) => deleted.push(node.name.clone()),
                Err(error) => {
                    tracing::warn!(node = %node.name, %error, "delete failed");
                    failed.push(DestroyFailure {
                        name: node.name.clone(),
                        error: error.to_string(),
                    });
                }
            }
        }

        DestroyReport {
            deleted,
            failed,
            duration_ms: started.elapsed().as_millis() as u64,
        }
    }
}

/// Mark every pending node below a failure as skipped, attributing it to the
/// nearest failed ancestor. One pass in topological order converges.
fn cascade_skips(graph: &Graph, statuses: &mut [NodeStatus], blocked_on: &mut [Option<String>]) {
    for &i in graph.order() {
        if statuses[i] != NodeStatus::Pending {
            continue;
        }
        for &p in graph.predecessors_of(i) {
            match statuses[p] {
                NodeStatus::Failed => {
                    statuses[i] = NodeStatus::Skipped;
                    blocked_on[i] = Some(graph.node(p).name.clone());
                    break;
                }
                NodeStatus::Skipped => {
                    statuses[i] = NodeStatus::Skipped;
                    blocked_on[i] = blocked_on[p].clone();
                    break;
                }
                _ => {}
            }
        }
    }
}

/// Resolve a node's input expressions against recorded apply results.
/// Guaranteed to find every referenced node applied; a missing attribute on
/// an applied node is an input error on the referencing node.
fn resolve_inputs(
    node: &ResourceNode,
    graph: &Graph,
    outputs: &[Option<Outputs>],
) -> std::result::Result<Outputs, String> {
    let lookup = |r: &OutputRef| -> Option<serde_json::Value> {
        let idx = graph.index_of(&r.node)?;
        outputs[idx].as_ref()?.get(&r.attribute).cloned()
    };

    let mut resolved = Outputs::new();
    for (key, expr) in &node.inputs {
        let value = expr
            .resolve(&lookup)
            .map_err(|e| format!("input '{key}': {e}"))?;
        resolved.insert(key.clone(), value);
    }
    Ok(resolved)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ProviderError;
    use async_trait::async_trait;
    use serde_json::json;
    use skyform_graph::Expr;
    use std::collections::{HashMap, HashSet};
    use std::sync::Mutex;

    /// Test double: synthesizes an `id` per resource and records every call
    struct RecordingProvider {
        fail: HashSet<String>,
        calls: Mutex<Vec<(String, Outputs)>>,
        /// Extra attributes per node name, merged into the outputs
        extra: HashMap<String, Outputs>,
    }

    impl RecordingProvider {
        fn new() -> Self {
            Self {
                fail: HashSet::new(),
                calls: Mutex::new(Vec::new()),
                extra: HashMap::new(),
            }
        }

        fn failing_on(mut self, name: &str) -> Self {
            self.fail.insert(name.to_string());
            self
        }

        fn with_extra(mut self, name: &str, key: &str, value: serde_json::Value) -> Self {
            self.extra
                .entry(name.to_string())
                .or_default()
                .insert(key.to_string(), value);
            self
        }

        fn calls_for(&self, name: &str) -> Vec<Outputs> {
            self.calls
                .lock()
                .unwrap()
                .iter()
                .filter(|(n, _)| n == name)
                .map(|(_, inputs)| inputs.clone())
                .collect()
        }
    }

    #[async_trait]
    impl ResourceProvider for RecordingProvider {
        fn name(&self) -> &str {
            "recording"
        }

        async fn create_or_update(
            &self,
            _ctx: &ProviderContext,
            resource_type: &str,
            name: &str,
            inputs: &Outputs,
        ) -> crate::error::Result<Outputs> {
            self.calls
                .lock()
                .unwrap()
                .push((name.to_string(), inputs.clone()));
            if self.fail.contains(name) {
                return Err(ProviderError::Platform(format!("refused to create {name}")));
            }
            let mut outputs = Outputs::new();
            outputs.insert("id".into(), json!(format!("{resource_type}-{name}")));
            if let Some(extra) = self.extra.get(name) {
                outputs.extend(extra.clone());
            }
            Ok(outputs)
        }

        async fn read(
            &self,
            _ctx: &ProviderContext,
            _resource_type: &str,
            name: &str,
        ) -> crate::error::Result<Outputs> {
            Err(ProviderError::NotFound(name.to_string()))
        }

        async fn delete(
            &self,
            _ctx: &ProviderContext,
            _resource_type: &str,
            name: &str,
        ) -> crate::error::Result<()> {
            if self.fail.contains(name) {
                return Err(ProviderError::Platform(format!("refused to delete {name}")));
            }
            Ok(())
        }
    }

    fn graph(nodes: Vec<ResourceNode>) -> Graph {
        Graph::build(nodes).unwrap()
    }

    fn ctx() -> ProviderContext {
        ProviderContext::new("test")
    }

    #[tokio::test]
    async fn test_dependent_sees_predecessor_outputs() {
        let graph = graph(vec![
            ResourceNode::new("network", "net"),
            ResourceNode::new("container-service", "svc")
                .with_input("network_id", Expr::output("net", "id")),
        ]);
        let provider = Arc::new(RecordingProvider::new());
        let scheduler = Scheduler::new(ApplyOptions::default());

        let report = scheduler.apply(&graph, provider.clone(), &ctx()).await;

        assert!(report.is_success());
        let svc_calls = provider.calls_for("svc");
        assert_eq!(svc_calls.len(), 1);
        assert_eq!(svc_calls[0].get("network_id"), Some(&json!("network-net")));
    }

    #[tokio::test]
    async fn test_failure_skips_dependents_but_not_independents() {
        let graph = graph(vec![
            ResourceNode::new("network", "a"),
            ResourceNode::new("cluster", "b").with_input("net", Expr::output("a", "id")),
            ResourceNode::new("bucket", "c"),
        ]);
        let provider = Arc::new(RecordingProvider::new().failing_on("a"));
        let scheduler = Scheduler::new(ApplyOptions::default());

        let report = scheduler.apply(&graph, provider.clone(), &ctx()).await;

        assert!(!report.is_success());
        assert_eq!(report.status("a"), Some(NodeStatus::Failed));
        assert_eq!(report.status("b"), Some(NodeStatus::Skipped));
        assert_eq!(report.status("c"), Some(NodeStatus::Applied));
        assert_eq!(report.node("b").unwrap().blocked_on.as_deref(), Some("a"));
        // b was never attempted
        assert!(provider.calls_for("b").is_empty());
    }

    #[tokio::test]
    async fn test_skip_cascade_names_the_originating_failure() {
        let graph = graph(vec![
            ResourceNode::new("network", "a"),
            ResourceNode::new("cluster", "b").with_input("net", Expr::output("a", "id")),
            ResourceNode::new("container-service", "c")
                .with_input("cluster", Expr::output("b", "id")),
        ]);
        let provider = Arc::new(RecordingProvider::new().failing_on("a"));
        let scheduler = Scheduler::new(ApplyOptions::default());

        let report = scheduler.apply(&graph, provider, &ctx()).await;

        assert_eq!(report.status("c"), Some(NodeStatus::Skipped));
        // c inherits the root failure, not its immediate (skipped) predecessor
        assert_eq!(report.node("c").unwrap().blocked_on.as_deref(), Some("a"));
    }

    #[tokio::test]
    async fn test_stop_on_failure_skips_independent_branches() {
        let graph = graph(vec![
            ResourceNode::new("network", "a"),
            ResourceNode::new("cluster", "b").with_input("net", Expr::output("a", "id")),
            ResourceNode::new("bucket", "c"),
        ]);
        let provider = Arc::new(RecordingProvider::new().failing_on("a"));
        let scheduler = Scheduler::new(ApplyOptions {
            parallelism: 1,
            stop_on_failure: true,
        });

        let report = scheduler.apply(&graph, provider.clone(), &ctx()).await;

        assert_eq!(report.status("a"), Some(NodeStatus::Failed));
        assert_eq!(report.status("b"), Some(NodeStatus::Skipped));
        assert_eq!(report.status("c"), Some(NodeStatus::Skipped));
        assert!(provider.calls_for("c").is_empty());
    }

    #[tokio::test]
    async fn test_missing_attribute_fails_the_referencing_node() {
        let graph = graph(vec![
            ResourceNode::new("network", "net"),
            ResourceNode::new("container-service", "svc")
                .with_input("subnet", Expr::output("net", "subnet_id")),
        ]);
        // "net" applies but only ever produces "id"
        let provider = Arc::new(RecordingProvider::new());
        let scheduler = Scheduler::new(ApplyOptions::default());

        let report = scheduler.apply(&graph, provider.clone(), &ctx()).await;

        assert_eq!(report.status("net"), Some(NodeStatus::Applied));
        assert_eq!(report.status("svc"), Some(NodeStatus::Failed));
        let error = report.node("svc").unwrap().error.clone().unwrap();
        assert!(error.contains("net.subnet_id"), "error was: {error}");
        // never reached the provider
        assert!(provider.calls_for("svc").is_empty());
    }

    #[tokio::test]
    async fn test_concat_input_resolves_across_outputs() {
        let graph = graph(vec![
            ResourceNode::new("bucket", "site"),
            ResourceNode::new("policy", "site-policy").with_input(
                "document",
                Expr::concat([
                    Expr::lit("{\"Resource\":\""),
                    Expr::output("site", "arn"),
                    Expr::lit("/*\"}"),
                ]),
            ),
        ]);
        let provider = Arc::new(RecordingProvider::new().with_extra(
            "site",
            "arn",
            json!("arn:sim:storage:::site-1234"),
        ));
        let scheduler = Scheduler::new(ApplyOptions::default());

        let report = scheduler.apply(&graph, provider.clone(), &ctx()).await;

        assert!(report.is_success());
        let policy_calls = provider.calls_for("site-policy");
        assert_eq!(
            policy_calls[0].get("document"),
            Some(&json!("{\"Resource\":\"arn:sim:storage:::site-1234/*\"}"))
        );
    }

    #[tokio::test]
    async fn test_parallel_apply_preserves_gating() {
        // Diamond: a -> {b, c} -> d
        let graph = graph(vec![
            ResourceNode::new("network", "a"),
            ResourceNode::new("cluster", "b").with_input("net", Expr::output("a", "id")),
            ResourceNode::new("load-balancer", "c").with_input("net", Expr::output("a", "id")),
            ResourceNode::new("container-service", "d")
                .with_input("cluster", Expr::output("b", "id"))
                .with_input("lb", Expr::output("c", "id")),
        ]);
        let provider = Arc::new(RecordingProvider::new());
        let scheduler = Scheduler::new(ApplyOptions {
            parallelism: 2,
            stop_on_failure: false,
        });

        let report = scheduler.apply(&graph, provider.clone(), &ctx()).await;

        assert!(report.is_success());
        let d_calls = provider.calls_for("d");
        assert_eq!(d_calls[0].get("cluster"), Some(&json!("cluster-b")));
        assert_eq!(d_calls[0].get("lb"), Some(&json!("load-balancer-c")));
    }

    #[tokio::test]
    async fn test_destroy_runs_in_reverse_order_and_aggregates_failures() {
        let graph = graph(vec![
            ResourceNode::new("network", "net"),
            ResourceNode::new("cluster", "cl").with_input("net", Expr::output("net", "id")),
        ]);
        let provider = Arc::new(RecordingProvider::new().failing_on("net"));
        let scheduler = Scheduler::new(ApplyOptions::default());

        let report = scheduler.destroy(&graph, provider, &ctx()).await;

        assert_eq!(report.deleted, vec!["cl".to_string()]);
        assert_eq!(report.failed.len(), 1);
        assert_eq!(report.failed[0].name, "net");
        assert!(!report.is_success());
    }

    #[tokio::test]
    async fn test_empty_graph_applies_trivially() {
        let graph = graph(Vec::new());
        let provider = Arc::new(RecordingProvider::new());
        let scheduler = Scheduler::new(ApplyOptions::default());

        let report = scheduler.apply(&graph, provider, &ctx()).await;
        assert!(report.is_success());
        assert!(report.nodes.is_empty());
    }
}
