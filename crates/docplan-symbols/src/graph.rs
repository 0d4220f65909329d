//! Registration API for inspectable namespaces.

use std::collections::HashMap;
use std::fmt;

use petgraph::stable_graph::{NodeIndex, StableDiGraph};
use petgraph::visit::EdgeRef;
use petgraph::Direction;
use thiserror::Error;

/// Handle to a node inside a [`SymbolGraph`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SymbolId(NodeIndex);

/// What a registered node represents.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SymbolKind {
    /// Importable namespace, identified by its canonical dotted name.
    Module { qualified_name: String },
    /// Composite type definition whose members are walked like a module's.
    Class,
    /// Function or method. `source` is `None` when the text could not be
    /// retrieved.
    Callable { source: Option<String> },
    /// A member that could not be introspected.
    Opaque { reason: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SymbolNode {
    pub name: String,
    pub kind: SymbolKind,
}

/// Module resolution facility: load a module by dotted path.
pub trait ModuleResolver {
    fn resolve(&self, dotted_path: &str) -> Result<SymbolId, ModuleNotFound>;
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("no module named {0}")]
pub struct ModuleNotFound(pub String);

/// Namespace graph: nodes are modules, classes and callables; edges are
/// named members (`parent --name--> child`).
#[derive(Default)]
pub struct SymbolGraph {
    graph: StableDiGraph<SymbolNode, String>,
    modules: HashMap<String, NodeIndex>,
}

impl SymbolGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a module by canonical dotted name. Registering the same name
    /// twice returns the existing node.
    pub fn add_module(&mut self, qualified_name: impl Into<String>) -> SymbolId {
        let qualified_name = qualified_name.into();
        if let Some(&idx) = self.modules.get(&qualified_name) {
            return SymbolId(idx);
        }
        let name = qualified_name
            .rsplit('.')
            .next()
            .unwrap_or(&qualified_name)
            .to_string();
        let idx = self.graph.add_node(SymbolNode {
            name,
            kind: SymbolKind::Module {
                qualified_name: qualified_name.clone(),
            },
        });
        self.modules.insert(qualified_name, idx);
        SymbolId(idx)
    }

    pub fn add_class(&mut self, name: impl Into<String>) -> SymbolId {
        self.add_node(name.into(), SymbolKind::Class)
    }

    pub fn add_callable(&mut self, name: impl Into<String>, source: impl Into<String>) -> SymbolId {
        self.add_node(
            name.into(),
            SymbolKind::Callable {
                source: Some(source.into()),
            },
        )
    }

    /// Callable whose source text is unavailable (e.g. a native builtin).
    pub fn add_sourceless_callable(&mut self, name: impl Into<String>) -> SymbolId {
        self.add_node(name.into(), SymbolKind::Callable { source: None })
    }

    pub fn add_opaque(&mut self, name: impl Into<String>, reason: impl Into<String>) -> SymbolId {
        self.add_node(
            name.into(),
            SymbolKind::Opaque {
                reason: reason.into(),
            },
        )
    }

    /// Expose `child` as member `name` of `parent`. Re-binding an existing
    /// member name replaces the previous target.
    pub fn add_member(&mut self, parent: SymbolId, name: impl Into<String>, child: SymbolId) {
        let name = name.into();
        let existing = self
            .graph
            .edges_directed(parent.0, Direction::Outgoing)
            .find(|edge| edge.weight() == &name)
            .map(|edge| edge.id());
        if let Some(edge) = existing {
            self.graph.remove_edge(edge);
        }
        self.graph.add_edge(parent.0, child.0, name);
    }

    /// Convenience: register a callable and attach it to `parent` in one step.
    pub fn define_callable(
        &mut self,
        parent: SymbolId,
        name: &str,
        source: impl Into<String>,
    ) -> SymbolId {
        let child = self.add_callable(name, source);
        self.add_member(parent, name, child);
        child
    }

    /// Convenience: register a submodule `parent_qualified.name` and attach it.
    pub fn define_submodule(&mut self, parent: SymbolId, name: &str) -> SymbolId {
        let qualified = match &self.graph[parent.0].kind {
            SymbolKind::Module { qualified_name } => format!("{qualified_name}.{name}"),
            _ => name.to_string(),
        };
        let child = self.add_module(qualified);
        self.add_member(parent, name, child);
        child
    }

    /// Convenience: register a class and attach it to `parent`.
    pub fn define_class(&mut self, parent: SymbolId, name: &str) -> SymbolId {
        let child = self.add_class(name);
        self.add_member(parent, name, child);
        child
    }

    pub fn node(&self, id: SymbolId) -> Option<&SymbolNode> {
        self.graph.node_weight(id.0)
    }

    /// Members of `id` sorted by name.
    pub fn members(&self, id: SymbolId) -> Vec<(&str, SymbolId)> {
        let mut members: Vec<(&str, SymbolId)> = self
            .graph
            .edges_directed(id.0, Direction::Outgoing)
            .map(|edge| (edge.weight().as_str(), SymbolId(edge.target())))
            .collect();
        members.sort_by(|a, b| a.0.cmp(b.0));
        members
    }

    pub fn module(&self, qualified_name: &str) -> Option<SymbolId> {
        self.modules.get(qualified_name).copied().map(SymbolId)
    }

    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn member_count(&self) -> usize {
        self.graph.edge_count()
    }

    fn add_node(&mut self, name: String, kind: SymbolKind) -> SymbolId {
        SymbolId(self.graph.add_node(SymbolNode { name, kind }))
    }
}

impl ModuleResolver for SymbolGraph {
    fn resolve(&self, dotted_path: &str) -> Result<SymbolId, ModuleNotFound> {
        self.module(dotted_path)
            .ok_or_else(|| ModuleNotFound(dotted_path.to_string()))
    }
}

impl fmt::Debug for SymbolGraph {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SymbolGraph")
            .field("node_count", &self.graph.node_count())
            .field("member_count", &self.graph.edge_count())
            .field("modules", &self.modules.keys().collect::<Vec<_>>())
            .finish()
    }
}
