pub mod down;
pub mod preview;
pub mod up;

use skyform_graph::Stack;
use std::path::Path;

/// Look up a stack definition by name
pub fn load_stack(name: &str, content_dir: &Path) -> anyhow::Result<Stack> {
    match name {
        "web-service" => Ok(skyform_stacks::web_service::stack()),
        "static-site" => {
            skyform_stacks::static_site::stack(content_dir).map_err(|e| {
                anyhow::anyhow!(
                    "failed to read content directory '{}': {}",
                    content_dir.display(),
                    e
                )
            })
        }
        other => anyhow::bail!("unknown stack '{other}'. Available: web-service, static-site"),
    }
}
