//! Output exporter
//!
//! Resolves a stack's named exports against a completed apply report. An
//! export whose reference never reached `Applied` is an error, never a null.

use crate::error::ExportError;
use crate::report::ApplyReport;
use skyform_graph::Expr;
use std::collections::BTreeMap;

/// Resolve every export to a flat name → value mapping
pub fn resolve_exports(
    exports: &BTreeMap<String, Expr>,
    report: &ApplyReport,
) -> Result<BTreeMap<String, serde_json::Value>, ExportError> {
    let lookup = |r: &skyform_graph::OutputRef| -> Option<serde_json::Value> {
        report.outputs(&r.node)?.get(&r.attribute).cloned()
    };

    let mut resolved = BTreeMap::new();
    for (name, expr) in exports {
        let value = expr.resolve(&lookup).map_err(|e| ExportError::Unresolved {
            export: name.clone(),
            reference: e.reference,
        })?;
        resolved.insert(name.clone(), value);
    }
    Ok(resolved)
}
