//! Depth-first extraction of callable source text from a [`SymbolGraph`].
//!
//! Walk rules for each public member of the current node:
//!
//! - module: resolve `prefix.name` through the [`ModuleResolver`]. When
//!   resolution fails the member is an alias, and it is skipped if its
//!   canonical module was already visited in this call or lies outside the
//!   root namespace. Modules are tracked by full dotted name, so a short
//!   member name reused in unrelated branches never hides a module.
//! - class: recurse unless it is already on the current walk stack.
//! - callable: record its source under the dotted path.
//!
//! Failures on a single node are logged and that subtree is skipped; the walk
//! always continues over siblings. The visited set lives for one call only.

use std::collections::{BTreeMap, HashSet};

use docplan_core::SymbolPath;
use tracing::{debug, warn};

use crate::graph::{ModuleResolver, SymbolGraph, SymbolId, SymbolKind};

pub const DEFAULT_MAX_DEPTH: usize = 32;
pub const DEFAULT_PRIVATE_PREFIX: &str = "_";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractOptions {
    /// Maximum number of nested namespaces below the root.
    pub max_depth: usize,
    /// Member names starting with this prefix are non-public and ignored.
    /// An empty prefix marks nothing as non-public.
    pub private_prefix: String,
}

impl ExtractOptions {
    fn is_private(&self, name: &str) -> bool {
        !self.private_prefix.is_empty() && name.starts_with(self.private_prefix.as_str())
    }
}

impl Default for ExtractOptions {
    fn default() -> Self {
        Self {
            max_depth: DEFAULT_MAX_DEPTH,
            private_prefix: DEFAULT_PRIVATE_PREFIX.to_string(),
        }
    }
}

/// Why a member was left out of the extraction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    /// Alias to a module visited earlier in this walk.
    AlreadyVisited { module: String },
    /// Alias to a module outside the root namespace.
    ExternalNamespace { module: String },
    /// Class already being walked further up the stack.
    Cycle,
    DepthLimit,
    SourceUnavailable,
    Introspection { reason: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedSymbol {
    pub path: SymbolPath,
    pub reason: SkipReason,
}

/// Result of one extraction call.
#[derive(Debug, Clone, Default)]
pub struct Extraction {
    pub sources: BTreeMap<SymbolPath, String>,
    pub skipped: Vec<SkippedSymbol>,
}

impl Extraction {
    pub fn len(&self) -> usize {
        self.sources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }
}

/// Extract every public callable reachable from `root` using default options.
pub fn extract(graph: &SymbolGraph, root: SymbolId, root_name: &str) -> BTreeMap<SymbolPath, String> {
    SymbolExtractor::new(graph).extract(root, root_name).sources
}

/// Extract with explicit options.
pub fn extract_with(
    graph: &SymbolGraph,
    root: SymbolId,
    root_name: &str,
    options: &ExtractOptions,
) -> BTreeMap<SymbolPath, String> {
    SymbolExtractor::new(graph)
        .with_options(options.clone())
        .extract(root, root_name)
        .sources
}

pub struct SymbolExtractor<'g, R: ModuleResolver = SymbolGraph> {
    graph: &'g SymbolGraph,
    resolver: &'g R,
    options: ExtractOptions,
}

impl<'g> SymbolExtractor<'g, SymbolGraph> {
    /// Extractor that resolves modules against the graph itself.
    pub fn new(graph: &'g SymbolGraph) -> Self {
        Self {
            graph,
            resolver: graph,
            options: ExtractOptions::default(),
        }
    }
}

impl<'g, R: ModuleResolver> SymbolExtractor<'g, R> {
    pub fn with_resolver(graph: &'g SymbolGraph, resolver: &'g R) -> Self {
        Self {
            graph,
            resolver,
            options: ExtractOptions::default(),
        }
    }

    pub fn with_options(mut self, options: ExtractOptions) -> Self {
        self.options = options;
        self
    }

    pub fn extract(&self, root: SymbolId, root_name: &str) -> Extraction {
        debug!(root = %root_name, "symbol_extraction_start");
        let mut walk = Walk {
            root_name,
            visited_modules: HashSet::new(),
            stack: Vec::new(),
            out: Extraction::default(),
        };

        if let Some(SymbolKind::Module { qualified_name }) = self.graph.node(root).map(|n| &n.kind) {
            walk.visited_modules.insert(qualified_name.clone());
        }
        walk.visited_modules.insert(root_name.to_string());

        self.walk(root, &SymbolPath::root(root_name), 0, &mut walk);

        debug!(
            root = %root_name,
            extracted = walk.out.sources.len(),
            skipped = walk.out.skipped.len(),
            "symbol_extraction_complete"
        );
        walk.out
    }

    fn walk(&self, node: SymbolId, path: &SymbolPath, depth: usize, walk: &mut Walk<'_>) {
        match self.graph.node(node).map(|n| &n.kind) {
            None => {
                walk.skip(path.clone(), SkipReason::Introspection {
                    reason: "dangling symbol handle".to_string(),
                });
                return;
            }
            Some(SymbolKind::Opaque { reason }) => {
                walk.skip(path.clone(), SkipReason::Introspection {
                    reason: reason.clone(),
                });
                return;
            }
            Some(_) => {}
        }

        walk.stack.push(node);

        for (name, child) in self.graph.members(node) {
            if self.options.is_private(name) {
                continue;
            }
            let complete_path = path.child(name);

            let Some(member) = self.graph.node(child) else {
                walk.skip(complete_path, SkipReason::Introspection {
                    reason: "dangling symbol handle".to_string(),
                });
                continue;
            };

            match &member.kind {
                SymbolKind::Module { qualified_name } => {
                    if self.resolver.resolve(complete_path.as_str()).is_err() {
                        if walk.visited_modules.contains(qualified_name) {
                            walk.skip(complete_path, SkipReason::AlreadyVisited {
                                module: qualified_name.clone(),
                            });
                            continue;
                        }
                        if !SymbolPath::from(qualified_name.as_str()).is_nested_under(walk.root_name) {
                            walk.skip(complete_path, SkipReason::ExternalNamespace {
                                module: qualified_name.clone(),
                            });
                            continue;
                        }
                    }
                    walk.visited_modules.insert(qualified_name.clone());
                    self.descend(child, &complete_path, depth, walk);
                }
                SymbolKind::Class => {
                    if walk.stack.contains(&child) {
                        walk.skip(complete_path, SkipReason::Cycle);
                        continue;
                    }
                    self.descend(child, &complete_path, depth, walk);
                }
                SymbolKind::Callable { source: Some(source) } => {
                    walk.out.sources.insert(complete_path, source.clone());
                }
                SymbolKind::Callable { source: None } => {
                    walk.skip(complete_path, SkipReason::SourceUnavailable);
                }
                SymbolKind::Opaque { reason } => {
                    walk.skip(complete_path, SkipReason::Introspection {
                        reason: reason.clone(),
                    });
                }
            }
        }

        walk.stack.pop();
    }

    fn descend(&self, child: SymbolId, path: &SymbolPath, depth: usize, walk: &mut Walk<'_>) {
        if depth + 1 > self.options.max_depth {
            walk.skip(path.clone(), SkipReason::DepthLimit);
            return;
        }
        self.walk(child, path, depth + 1, walk);
    }
}

struct Walk<'a> {
    root_name: &'a str,
    visited_modules: HashSet<String>,
    stack: Vec<SymbolId>,
    out: Extraction,
}

impl Walk<'_> {
    fn skip(&mut self, path: SymbolPath, reason: SkipReason) {
        match &reason {
            SkipReason::Introspection { reason } => {
                warn!(path = %path, %reason, "unable to extract code, skipping subtree");
            }
            SkipReason::SourceUnavailable => {
                warn!(path = %path, "source text unavailable, skipping");
            }
            SkipReason::DepthLimit => {
                warn!(path = %path, "depth limit reached, skipping subtree");
            }
            other => debug!(path = %path, reason = ?other, "symbol_skipped"),
        }
        self.out.skipped.push(SkippedSymbol { path, reason });
    }
}
