//! Input and export expressions
//!
//! Resource inputs and stack exports are `Expr` values: literals, references
//! to another node's output attribute, string concatenations, and lists or
//! maps whose elements may themselves contain references. References are the
//! data edges of the dependency graph; they are resolved strictly after the
//! referenced node has applied.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;

/// Reference to a not-yet-known output attribute of another node
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutputRef {
    /// Logical name of the referenced node
    pub node: String,

    /// Output attribute name on that node
    pub attribute: String,
}

impl OutputRef {
    pub fn new(node: impl Into<String>, attribute: impl Into<String>) -> Self {
        Self {
            node: node.into(),
            attribute: attribute.into(),
        }
    }
}

impl std::fmt::Display for OutputRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.{}", self.node, self.attribute)
    }
}

/// Expression used for resource inputs and stack exports
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Expr {
    /// A literal JSON value, known at declaration time
    Literal(serde_json::Value),

    /// Another node's output attribute, known only after that node applies
    Ref(OutputRef),

    /// String concatenation of sub-expressions, evaluated after all
    /// referenced parts have resolved
    Concat(Vec<Expr>),

    /// A list whose elements may themselves contain references
    List(Vec<Expr>),

    /// An object whose values may themselves contain references
    Map(BTreeMap<String, Expr>),
}

impl Expr {
    pub fn lit(value: impl Into<serde_json::Value>) -> Self {
        Expr::Literal(value.into())
    }

    pub fn output(node: impl Into<String>, attribute: impl Into<String>) -> Self {
        Expr::Ref(OutputRef::new(node, attribute))
    }

    pub fn concat(parts: impl IntoIterator<Item = Expr>) -> Self {
        Expr::Concat(parts.into_iter().collect())
    }

    pub fn list(items: impl IntoIterator<Item = Expr>) -> Self {
        Expr::List(items.into_iter().collect())
    }

    pub fn map<K: Into<String>>(entries: impl IntoIterator<Item = (K, Expr)>) -> Self {
        Expr::Map(entries.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }

    /// Collect every output reference in this expression tree
    pub fn references(&self) -> Vec<&OutputRef> {
        let mut refs = Vec::new();
        self.collect_references(&mut refs);
        refs
    }

    fn collect_references<'a>(&'a self, refs: &mut Vec<&'a OutputRef>) {
        match self {
            Expr::Literal(_) => {}
            Expr::Ref(r) => refs.push(r),
            Expr::Concat(parts) | Expr::List(parts) => {
                for part in parts {
                    part.collect_references(refs);
                }
            }
            Expr::Map(entries) => {
                for value in entries.values() {
                    value.collect_references(refs);
                }
            }
        }
    }

    /// Evaluate against already-resolved outputs
    ///
    /// `lookup` maps a reference to its applied value; returning `None` means
    /// the referenced node never produced that attribute. Concatenation
    /// stringifies each part: strings verbatim, everything else as compact
    /// JSON.
    pub fn resolve<F>(&self, lookup: &F) -> std::result::Result<serde_json::Value, ResolveError>
    where
        F: Fn(&OutputRef) -> Option<serde_json::Value>,
    {
        match self {
            Expr::Literal(value) => Ok(value.clone()),
            Expr::Ref(r) => lookup(r).ok_or_else(|| ResolveError {
                reference: r.clone(),
            }),
            Expr::Concat(parts) => {
                let mut out = String::new();
                for part in parts {
                    match part.resolve(lookup)? {
                        serde_json::Value::String(s) => out.push_str(&s),
                        other => out.push_str(&other.to_string()),
                    }
                }
                Ok(serde_json::Value::String(out))
            }
            Expr::List(items) => {
                let mut out = Vec::with_capacity(items.len());
                for item in items {
                    out.push(item.resolve(lookup)?);
                }
                Ok(serde_json::Value::Array(out))
            }
            Expr::Map(entries) => {
                let mut out = serde_json::Map::new();
                for (key, value) in entries {
                    out.insert(key.clone(), value.resolve(lookup)?);
                }
                Ok(serde_json::Value::Object(out))
            }
        }
    }
}

impl From<serde_json::Value> for Expr {
    fn from(value: serde_json::Value) -> Self {
        Expr::Literal(value)
    }
}

impl From<&str> for Expr {
    fn from(value: &str) -> Self {
        Expr::Literal(serde_json::Value::String(value.to_string()))
    }
}

impl From<OutputRef> for Expr {
    fn from(reference: OutputRef) -> Self {
        Expr::Ref(reference)
    }
}

/// An expression referenced an output that was never produced
#[derive(Error, Debug, Clone)]
#[error("unresolved reference to {reference}")]
pub struct ResolveError {
    pub reference: OutputRef,
}
