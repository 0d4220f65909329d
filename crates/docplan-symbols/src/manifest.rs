//! JSON description of a namespace, loaded into a [`SymbolGraph`].
//!
//! ```json
//! {
//!   "name": "pkg",
//!   "members": [
//!     {"kind": "function", "name": "load", "source": "def load(path): ..."},
//!     {"kind": "class", "name": "Frame", "members": [
//!       {"kind": "function", "name": "describe", "source": "def describe(self): ..."}
//!     ]},
//!     {"kind": "module", "name": "io", "members": []},
//!     {"kind": "alias", "name": "np", "target": "numpy"},
//!     {"kind": "opaque", "name": "broken", "reason": "getattr raised"}
//!   ]
//! }
//! ```
//!
//! Alias targets name a module by qualified name; targets not described in
//! the manifest become empty external modules.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::ManifestError;
use crate::graph::{SymbolGraph, SymbolId};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SymbolManifest {
    /// Root namespace name; also the root path prefix.
    pub name: String,
    #[serde(default)]
    pub members: Vec<ManifestEntry>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum ManifestEntry {
    Module {
        name: String,
        #[serde(default)]
        members: Vec<ManifestEntry>,
    },
    Class {
        name: String,
        #[serde(default)]
        members: Vec<ManifestEntry>,
    },
    Function {
        name: String,
        #[serde(default)]
        source: Option<String>,
    },
    Alias {
        name: String,
        target: String,
    },
    Opaque {
        name: String,
        reason: String,
    },
}

impl ManifestEntry {
    pub fn name(&self) -> &str {
        match self {
            ManifestEntry::Module { name, .. }
            | ManifestEntry::Class { name, .. }
            | ManifestEntry::Function { name, .. }
            | ManifestEntry::Alias { name, .. }
            | ManifestEntry::Opaque { name, .. } => name,
        }
    }
}

impl SymbolManifest {
    pub fn from_json(text: &str) -> Result<Self, ManifestError> {
        Ok(serde_json::from_str(text)?)
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ManifestError> {
        let path = path.as_ref();
        let raw = fs::read_to_string(path).map_err(|source| ManifestError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&raw)
    }

    /// Build the namespace graph. Returns the graph and the root module.
    pub fn into_graph(&self) -> Result<(SymbolGraph, SymbolId), ManifestError> {
        if self.name.trim().is_empty() {
            return Err(ManifestError::EmptyRootName);
        }

        let mut graph = SymbolGraph::new();
        let root = graph.add_module(self.name.clone());
        let mut aliases = Vec::new();
        populate(&mut graph, root, &self.name, &self.members, &mut aliases)?;

        // Aliases are bound last so they can point at any module in the manifest.
        for (parent, name, target) in aliases {
            let module = graph.add_module(target);
            graph.add_member(parent, name, module);
        }

        Ok((graph, root))
    }
}

fn populate(
    graph: &mut SymbolGraph,
    parent: SymbolId,
    parent_path: &str,
    entries: &[ManifestEntry],
    aliases: &mut Vec<(SymbolId, String, String)>,
) -> Result<(), ManifestError> {
    for entry in entries {
        let name = entry.name();
        if name.trim().is_empty() {
            return Err(ManifestError::EmptyMemberName {
                parent: parent_path.to_string(),
            });
        }
        let path = format!("{parent_path}.{name}");

        match entry {
            ManifestEntry::Module { members, .. } => {
                let module = graph.add_module(path.clone());
                graph.add_member(parent, name, module);
                populate(graph, module, &path, members, aliases)?;
            }
            ManifestEntry::Class { members, .. } => {
                let class = graph.define_class(parent, name);
                populate(graph, class, &path, members, aliases)?;
            }
            ManifestEntry::Function { source, .. } => {
                let callable = match source {
                    Some(source) => graph.add_callable(name, source.clone()),
                    None => graph.add_sourceless_callable(name),
                };
                graph.add_member(parent, name, callable);
            }
            ManifestEntry::Alias { target, .. } => {
                aliases.push((parent, name.to_string(), target.clone()));
            }
            ManifestEntry::Opaque { reason, .. } => {
                let opaque = graph.add_opaque(name, reason.clone());
                graph.add_member(parent, name, opaque);
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::SymbolKind;

    #[test]
    fn builds_modules_with_qualified_names_and_binds_aliases() {
        let manifest = SymbolManifest::from_json(
            r#"{
                "name": "pkg",
                "members": [
                    {"kind": "module", "name": "io", "members": [
                        {"kind": "function", "name": "read", "source": "def read(): ..."}
                    ]},
                    {"kind": "alias", "name": "np", "target": "numpy"},
                    {"kind": "alias", "name": "reader", "target": "pkg.io"}
                ]
            }"#,
        )
        .unwrap();
        let (graph, root) = manifest.into_graph().unwrap();

        let io = graph.module("pkg.io").unwrap();
        let members = graph.members(root);
        assert!(members.contains(&("reader", io)));

        let numpy = graph.module("numpy").unwrap();
        assert!(members.contains(&("np", numpy)));
        assert_eq!(
            graph.node(numpy).unwrap().kind,
            SymbolKind::Module {
                qualified_name: "numpy".into()
            }
        );
    }

    #[test]
    fn rejects_empty_names() {
        let manifest = SymbolManifest {
            name: " ".into(),
            members: vec![],
        };
        assert!(matches!(manifest.into_graph(), Err(ManifestError::EmptyRootName)));

        let manifest = SymbolManifest {
            name: "pkg".into(),
            members: vec![ManifestEntry::Function {
                name: String::new(),
                source: None,
            }],
        };
        assert!(matches!(
            manifest.into_graph(),
            Err(ManifestError::EmptyMemberName { .. })
        ));
    }

    #[test]
    fn unknown_kind_is_a_json_error() {
        let err = SymbolManifest::from_json(r#"{"name":"pkg","members":[{"kind":"macro","name":"m"}]}"#)
            .unwrap_err();
        assert!(matches!(err, ManifestError::Json(_)));
    }
}
