use colored::Colorize;
use skyform_engine::{ProviderContext, ResourceProvider};
use skyform_graph::{Graph, Stack};
use skyform_provider_sim::SimProvider;
use std::path::Path;

pub async fn handle(stack: Stack, project_root: &Path) -> anyhow::Result<()> {
    println!("Stack: {}", stack.name.cyan());

    let ctx = ProviderContext::new(&stack.name);
    let graph = Graph::build(stack.nodes)?;
    let provider = SimProvider::with_store(project_root);

    let mut to_create = 0usize;
    let mut unchanged = 0usize;

    println!("{}", "Planned actions (apply order):".bold());
    for node in graph.ordered_nodes() {
        let exists = provider
            .read(&ctx, &node.resource_type, &node.name)
            .await
            .is_ok();
        if exists {
            unchanged += 1;
            println!("  {} {} ({})", "·".dimmed(), node.name, node.resource_type);
        } else {
            to_create += 1;
            println!(
                "  {} {} ({})",
                "+".green(),
                node.name.green(),
                node.resource_type
            );
        }
    }

    println!();
    println!("{} to create, {} unchanged", to_create, unchanged);
    Ok(())
}
