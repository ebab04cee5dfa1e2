use colored::Colorize;
use skyform_engine::{ApplyOptions, ProviderContext, Scheduler};
use skyform_graph::{Graph, Stack};
use skyform_provider_sim::SimProvider;
use std::path::Path;
use std::sync::Arc;

pub async fn handle(stack: Stack, project_root: &Path) -> anyhow::Result<()> {
    println!("Stack: {}", stack.name.cyan());

    let ctx = ProviderContext::new(&stack.name);
    let graph = Graph::build(stack.nodes)?;
    let provider = Arc::new(SimProvider::with_store(project_root));
    let scheduler = Scheduler::new(ApplyOptions::default());

    tracing::info!(stack = %ctx.project, resources = graph.len(), "starting destroy");
    let report = scheduler.destroy(&graph, provider, &ctx).await;
    tracing::info!(
        stack = %ctx.project,
        deleted = report.deleted.len(),
        failed = report.failed.len(),
        "destroy complete"
    );

    for name in &report.deleted {
        println!("  {} {} deleted", "✓".green(), name);
    }
    for failure in &report.failed {
        // A resource that was never created surfaces as not-found here
        println!("  {} {}: {}", "⚠".yellow(), failure.name, failure.error.yellow());
    }

    println!();
    println!(
        "{} deleted, {} failed in {}ms",
        report.deleted.len(),
        report.failed.len(),
        report.duration_ms
    );
    Ok(())
}
