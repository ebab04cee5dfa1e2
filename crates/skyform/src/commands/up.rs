use colored::Colorize;
use skyform_engine::{ApplyOptions, NodeStatus, ProviderContext, Scheduler, resolve_exports};
use skyform_graph::{Graph, Stack};
use skyform_provider_sim::SimProvider;
use std::path::Path;
use std::sync::Arc;

pub async fn handle(
    stack: Stack,
    project_root: &Path,
    parallel: usize,
    stop_on_failure: bool,
) -> anyhow::Result<()> {
    println!("Stack: {}", stack.name.cyan());

    let ctx = ProviderContext::new(&stack.name);
    let exports = stack.exports;
    let graph = Graph::build(stack.nodes)?;
    println!("{}", format!("Resources ({}):", graph.len()).bold());

    let provider: Arc<SimProvider> = Arc::new(SimProvider::with_store(project_root));
    let scheduler = Scheduler::new(ApplyOptions {
        parallelism: parallel,
        stop_on_failure,
    });

    tracing::info!(stack = %ctx.project, resources = graph.len(), "starting apply");
    let report = scheduler.apply(&graph, provider, &ctx).await;
    if report.is_success() {
        tracing::info!(stack = %ctx.project, duration_ms = report.duration_ms, "apply complete");
    } else {
        tracing::warn!(
            stack = %ctx.project,
            failed = report.failed().count(),
            skipped = report.skipped().count(),
            "apply finished with failures"
        );
    }

    for node in &report.nodes {
        match node.status {
            NodeStatus::Applied => {
                println!("  {} {} ({})", "✓".green(), node.name, node.resource_type);
            }
            NodeStatus::Failed => {
                println!(
                    "  {} {} ({}): {}",
                    "✗".red(),
                    node.name,
                    node.resource_type,
                    node.error.as_deref().unwrap_or("unknown error").red()
                );
            }
            NodeStatus::Skipped => {
                println!(
                    "  {} {} ({}): skipped, blocked on {}",
                    "-".yellow(),
                    node.name,
                    node.resource_type,
                    node.blocked_on.as_deref().unwrap_or("?").yellow()
                );
            }
            _ => {}
        }
    }

    println!();
    println!(
        "{} applied, {} failed, {} skipped in {}ms",
        report.applied().count(),
        report.failed().count(),
        report.skipped().count(),
        report.duration_ms
    );

    if !report.is_success() {
        anyhow::bail!("apply finished with failures");
    }

    let resolved = resolve_exports(&exports, &report)?;
    if !resolved.is_empty() {
        println!();
        println!("{}", "Outputs:".bold());
        for (name, value) in &resolved {
            let shown = match value {
                serde_json::Value::String(s) => s.clone(),
                other => other.to_string(),
            };
            println!("  {}: {}", name, shown.cyan());
        }
    }

    Ok(())
}
