//! Static website bucket with public read access
//!
//! A website-enabled bucket, one object per file in the content directory,
//! and a public-read policy whose document splices in the bucket's handle.
//! The handle is not known until the bucket applies, so the document is a
//! concatenation resolved at apply time.

use skyform_graph::{Expr, ResourceNode, Stack};
use std::path::Path;

const POLICY_PREFIX: &str = r#"{"Version":"2012-10-17","Statement":[{"Effect":"Allow","Principal":"*","Action":["storage:GetObject"],"Resource":[""#;
const POLICY_SUFFIX: &str = r#"/*"]}]}"#;

/// Build the static-site stack from a directory of content files
///
/// Files are declared in name order so the graph is identical across runs.
pub fn stack(content_dir: &Path) -> std::io::Result<Stack> {
    let mut stack = Stack::new("static-site");

    stack.add_resource(
        ResourceNode::new("bucket", "website-bucket").with_input(
            "website",
            Expr::map([("index_document", Expr::lit("index.html"))]),
        ),
    );

    let mut files: Vec<_> = std::fs::read_dir(content_dir)?
        .collect::<std::io::Result<Vec<_>>>()?
        .into_iter()
        .filter(|entry| entry.path().is_file())
        .collect();
    files.sort_by_key(|entry| entry.file_name());

    for entry in files {
        let path = entry.path();
        let name = entry.file_name().to_string_lossy().into_owned();
        stack.add_resource(
            ResourceNode::new("bucket-object", &name)
                .with_input("bucket", Expr::output("website-bucket", "id"))
                .with_input("source", Expr::lit(path.to_string_lossy().into_owned()))
                .with_input("content_type", Expr::lit(content_type(&path))),
        );
    }

    stack.add_resource(
        ResourceNode::new("policy", "website-bucket-policy")
            .with_input("bucket", Expr::output("website-bucket", "id"))
            .with_input(
                "policy",
                Expr::concat([
                    Expr::lit(POLICY_PREFIX),
                    Expr::output("website-bucket", "arn"),
                    Expr::lit(POLICY_SUFFIX),
                ]),
            ),
    );

    stack.export("bucket_name", Expr::output("website-bucket", "bucket"));
    stack.export(
        "website_url",
        Expr::concat([
            Expr::lit("http://"),
            Expr::output("website-bucket", "website_endpoint"),
        ]),
    );

    Ok(stack)
}

/// Content type by file extension
fn content_type(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .map(|e| e.to_string_lossy().to_lowercase())
        .unwrap_or_default();
    match ext.as_str() {
        "html" | "htm" => "text/html",
        "css" => "text/css",
        "js" => "text/javascript",
        "json" => "application/json",
        "txt" => "text/plain",
        "svg" => "image/svg+xml",
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "ico" => "image/x-icon",
        "pdf" => "application/pdf",
        _ => "application/octet-stream",
    }
}
