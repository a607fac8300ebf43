use std::collections::HashMap;

use petgraph::graph::{DiGraph, EdgeIndex, NodeIndex};
use petgraph::visit::EdgeRef;
use petgraph::Direction;
use serde::ser::SerializeSeq;
use serde::{Deserialize, Serialize, Serializer};

use crate::source::SourceUnit;
use crate::types::Layer;

/// Extensions tried when resolving an extension-less specifier.
const SOURCE_EXTENSIONS: &[&str] = &["ts", "tsx", "js", "jsx", "mts", "cts", "mjs", "cjs"];

/// Node in the dependency graph
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GraphNode {
    pub path: String,
    pub layer: Option<Layer>,
}

/// Summary numbers about the graph shape. Reporting only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphMetrics {
    pub file_count: usize,
    pub edge_count: usize,
    pub avg_out_degree: f64,
    pub max_out_degree: usize,
}

/// Directed graph of source files keyed by relative path.
///
/// Edges mean "imports". Each (from, to) pair is stored once. Dependencies
/// and dependents are both reachable from a node index without scanning the
/// edge list.
#[derive(Debug, Clone, Default)]
pub struct DependencyGraph {
    graph: DiGraph<GraphNode, ()>,
    index: HashMap<String, NodeIndex>,
}

impl DependencyGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register every unit, then resolve and add every import edge.
    /// The returned graph is not modified afterwards.
    pub fn build(units: &[SourceUnit]) -> Self {
        let mut graph = Self::new();
        for unit in units {
            graph.add_node(unit);
        }
        for unit in units {
            for import in &unit.imports {
                if let Some(target) = graph.resolve(&unit.path, &import.specifier) {
                    graph.add_edge(&unit.path, &target);
                }
            }
        }
        tracing::debug!(
            nodes = graph.node_count(),
            edges = graph.edge_count(),
            "built dependency graph"
        );
        graph
    }

    /// Register a unit as a node. Idempotent by path.
    pub fn add_node(&mut self, unit: &SourceUnit) -> NodeIndex {
        self.ensure_node(&unit.path, unit.layer)
    }

    /// Register a bare path as a node. Idempotent by path.
    pub fn ensure_node(&mut self, path: &str, layer: Option<Layer>) -> NodeIndex {
        if let Some(&idx) = self.index.get(path) {
            return idx;
        }
        let idx = self.graph.add_node(GraphNode {
            path: path.to_string(),
            layer,
        });
        self.index.insert(path.to_string(), idx);
        idx
    }

    /// Add `from -> to`. Does nothing when either path is not a node, so
    /// imports of external packages simply drop out. Duplicate pairs are
    /// stored once.
    pub fn add_edge(&mut self, from: &str, to: &str) -> bool {
        let (Some(&a), Some(&b)) = (self.index.get(from), self.index.get(to)) else {
            return false;
        };
        if self.graph.find_edge(a, b).is_some() {
            return false;
        }
        self.graph.add_edge(a, b, ());
        true
    }

    pub fn contains(&self, path: &str) -> bool {
        self.index.contains_key(path)
    }

    pub fn node(&self, path: &str) -> Option<&GraphNode> {
        self.index.get(path).map(|&idx| &self.graph[idx])
    }

    /// All nodes in registration order.
    pub fn nodes(&self) -> Vec<&GraphNode> {
        self.graph.node_weights().collect()
    }

    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    /// Paths `path` imports, in the order the edges were added.
    pub fn dependencies(&self, path: &str) -> Vec<&str> {
        self.neighbors(path, Direction::Outgoing)
    }

    /// Paths importing `path`, in the order the edges were added.
    pub fn dependents(&self, path: &str) -> Vec<&str> {
        self.neighbors(path, Direction::Incoming)
    }

    fn neighbors(&self, path: &str, dir: Direction) -> Vec<&str> {
        let Some(&idx) = self.index.get(path) else {
            return Vec::new();
        };
        self.neighbor_indices(idx, dir)
            .into_iter()
            .map(|n| self.graph[n].path.as_str())
            .collect()
    }

    /// Neighbor indices ordered by edge insertion.
    fn neighbor_indices(&self, idx: NodeIndex, dir: Direction) -> Vec<NodeIndex> {
        let mut edges: Vec<(EdgeIndex, NodeIndex)> = self
            .graph
            .edges_directed(idx, dir)
            .map(|e| {
                let other = match dir {
                    Direction::Outgoing => e.target(),
                    Direction::Incoming => e.source(),
                };
                (e.id(), other)
            })
            .collect();
        edges.sort_by_key(|(id, _)| *id);
        edges.into_iter().map(|(_, n)| n).collect()
    }

    /// All edges as (from, to) path pairs in insertion order.
    pub fn edges(&self) -> Vec<(&str, &str)> {
        self.graph
            .edge_references()
            .map(|e| {
                (
                    self.graph[e.source()].path.as_str(),
                    self.graph[e.target()].path.as_str(),
                )
            })
            .collect()
    }

    /// Resolve an import specifier written in `from_path` to a registered node.
    ///
    /// Relative specifiers are joined to the importing file's directory;
    /// anything else is tried as a root-relative path. The candidate is then
    /// matched as-is, with each source extension, and as a directory index.
    pub fn resolve(&self, from_path: &str, specifier: &str) -> Option<String> {
        let base = if specifier.starts_with('.') {
            let dir = from_path.rsplit_once('/').map(|(d, _)| d).unwrap_or("");
            join_relative(dir, specifier)?
        } else {
            normalize(specifier)?
        };
        if base.is_empty() {
            return None;
        }

        if self.contains(&base) {
            return Some(base);
        }
        for ext in SOURCE_EXTENSIONS {
            let candidate = format!("{base}.{ext}");
            if self.contains(&candidate) {
                return Some(candidate);
            }
        }
        for ext in SOURCE_EXTENSIONS {
            let candidate = format!("{base}/index.{ext}");
            if self.contains(&candidate) {
                return Some(candidate);
            }
        }
        None
    }

    /// Enumerate cycles with a depth-first walk.
    ///
    /// Roots are taken in registration order and dependencies in edge
    /// order. Reaching a node that is on the active path reports the path
    /// slice from that node to the current one. Finished nodes are never
    /// re-entered, so a strongly connected component with several cycles
    /// reports only the ones found through back edges on this walk.
    pub fn find_cycles(&self) -> Vec<Vec<String>> {
        let n = self.graph.node_count();
        let mut visited = vec![false; n];
        let mut on_stack = vec![false; n];
        let mut path: Vec<NodeIndex> = Vec::new();
        let mut cycles = Vec::new();

        for root in self.graph.node_indices() {
            if visited[root.index()] {
                continue;
            }

            // (node, its dependencies, next dependency to look at)
            let mut work: Vec<(NodeIndex, Vec<NodeIndex>, usize)> = Vec::new();
            visited[root.index()] = true;
            on_stack[root.index()] = true;
            path.push(root);
            work.push((root, self.neighbor_indices(root, Direction::Outgoing), 0));

            while let Some((node, deps, next)) = work.last_mut() {
                if let Some(&dep) = deps.get(*next) {
                    *next += 1;
                    if on_stack[dep.index()] {
                        let start = path.iter().position(|&p| p == dep).unwrap_or(0);
                        cycles.push(
                            path[start..]
                                .iter()
                                .map(|&p| self.graph[p].path.clone())
                                .collect(),
                        );
                    } else if !visited[dep.index()] {
                        visited[dep.index()] = true;
                        on_stack[dep.index()] = true;
                        path.push(dep);
                        let dep_deps = self.neighbor_indices(dep, Direction::Outgoing);
                        work.push((dep, dep_deps, 0));
                    }
                } else {
                    on_stack[node.index()] = false;
                    path.pop();
                    work.pop();
                }
            }
        }

        cycles
    }

    pub fn metrics(&self) -> GraphMetrics {
        let file_count = self.graph.node_count();
        let edge_count = self.graph.edge_count();
        let max_out_degree = self
            .graph
            .node_indices()
            .map(|idx| self.graph.edges_directed(idx, Direction::Outgoing).count())
            .max()
            .unwrap_or(0);
        let avg_out_degree = if file_count == 0 {
            0.0
        } else {
            edge_count as f64 / file_count as f64
        };
        GraphMetrics {
            file_count,
            edge_count,
            avg_out_degree,
            max_out_degree,
        }
    }
}

/// Serialized as a list of nodes with their outgoing edges.
impl Serialize for DependencyGraph {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        #[derive(Serialize)]
        struct NodeView<'a> {
            path: &'a str,
            layer: Option<Layer>,
            dependencies: Vec<&'a str>,
        }

        let mut seq = serializer.serialize_seq(Some(self.graph.node_count()))?;
        for node in self.graph.node_weights() {
            seq.serialize_element(&NodeView {
                path: &node.path,
                layer: node.layer,
                dependencies: self.dependencies(&node.path),
            })?;
        }
        seq.end()
    }
}

/// Join a relative specifier to a directory, collapsing `.` and `..`.
/// Returns `None` when `..` climbs above the project root.
pub(crate) fn join_relative(dir: &str, specifier: &str) -> Option<String> {
    let mut parts: Vec<&str> = dir.split('/').filter(|s| !s.is_empty()).collect();
    for seg in specifier.split('/') {
        match seg {
            "" | "." => {}
            ".." => {
                parts.pop()?;
            }
            s => parts.push(s),
        }
    }
    Some(parts.join("/"))
}

fn normalize(specifier: &str) -> Option<String> {
    join_relative("", specifier)
}
