use std::collections::{BTreeMap, HashSet};

use strata_core::report::Report;
use strata_core::types::{Layer, ViolationKind};

const LAYER_STYLES: [(Layer, &str); 4] = [
    (Layer::Domain, "#e8f5e9"),
    (Layer::Application, "#e3f2fd"),
    (Layer::Infrastructure, "#fff3e0"),
    (Layer::Shared, "#f3e5f5"),
];

/// Edges that take part in a reported violation: cycle links and imports
/// flagged by the layer-direction rule.
fn violating_edges(report: &Report) -> HashSet<(String, String)> {
    let mut edges = HashSet::new();
    for v in report.all_violations() {
        match &v.kind {
            ViolationKind::CircularDependency { cycle } => {
                for (i, from) in cycle.iter().enumerate() {
                    let to = &cycle[(i + 1) % cycle.len()];
                    edges.insert((from.clone(), to.clone()));
                }
            }
            ViolationKind::LayerDirection { import, .. } => {
                if let Some(target) = report.graph.resolve(&v.location.file, import) {
                    edges.insert((v.location.file.clone(), target));
                }
            }
            _ => {}
        }
    }
    edges
}

/// GraphViz DOT diagram of the file graph, one cluster per layer.
/// Edges involved in a cycle or a layer violation are drawn red and dashed.
pub fn generate_file_graph(report: &Report) -> String {
    let mut out = String::new();
    out.push_str("digraph strata {\n");
    out.push_str("  rankdir=TB;\n");
    out.push_str("  node [shape=box, style=filled];\n\n");

    let nodes = report.graph.nodes();

    for (layer, color) in &LAYER_STYLES {
        let members: Vec<_> = nodes.iter().filter(|n| n.layer == Some(*layer)).collect();
        if members.is_empty() {
            continue;
        }
        out.push_str(&format!("  subgraph cluster_{layer} {{\n"));
        out.push_str(&format!("    label=\"{layer}\";\n"));
        out.push_str("    style=filled;\n");
        out.push_str(&format!("    color=\"{color}\";\n"));
        out.push_str("    node [fillcolor=white];\n");
        for node in members {
            out.push_str(&format!(
                "    {} [label=\"{}\"];\n",
                sanitize_dot_id(&node.path),
                file_label(&node.path)
            ));
        }
        out.push_str("  }\n\n");
    }

    let unclassified: Vec<_> = nodes.iter().filter(|n| n.layer.is_none()).collect();
    if !unclassified.is_empty() {
        out.push_str("  subgraph cluster_unclassified {\n");
        out.push_str("    label=\"unclassified\";\n");
        out.push_str("    style=dashed;\n");
        out.push_str("    node [fillcolor=white];\n");
        for node in unclassified {
            out.push_str(&format!(
                "    {} [label=\"{}\"];\n",
                sanitize_dot_id(&node.path),
                file_label(&node.path)
            ));
        }
        out.push_str("  }\n\n");
    }

    let flagged = violating_edges(report);
    for (from, to) in report.graph.edges() {
        let a = sanitize_dot_id(from);
        let b = sanitize_dot_id(to);
        if flagged.contains(&(from.to_string(), to.to_string())) {
            out.push_str(&format!("  {a} -> {b} [color=red, style=dashed];\n"));
        } else {
            out.push_str(&format!("  {a} -> {b};\n"));
        }
    }

    out.push_str("}\n");
    out
}

/// Layer-to-layer edge counts, one node per layer.
pub fn generate_layer_flow(report: &Report) -> String {
    let mut out = String::new();
    out.push_str("digraph layer_flow {\n");
    out.push_str("  rankdir=LR;\n");
    out.push_str("  node [shape=box, style=filled];\n\n");

    let layer_name = |path: &str| {
        report
            .graph
            .node(path)
            .and_then(|n| n.layer)
            .map(|l| l.as_str())
            .unwrap_or("unclassified")
    };

    let flagged = violating_edges(report);
    // (from, to) -> (edges, flagged edges)
    let mut flows: BTreeMap<(&str, &str), (usize, usize)> = BTreeMap::new();
    for (from, to) in report.graph.edges() {
        let entry = flows
            .entry((layer_name(from), layer_name(to)))
            .or_insert((0, 0));
        entry.0 += 1;
        if flagged.contains(&(from.to_string(), to.to_string())) {
            entry.1 += 1;
        }
    }

    for (layer, count) in &report.metrics.files_by_layer {
        if *count == 0 {
            continue;
        }
        let name = if layer == "none" { "unclassified" } else { layer };
        let color = LAYER_STYLES
            .iter()
            .find(|(l, _)| l.as_str() == name)
            .map(|(_, c)| *c)
            .unwrap_or("#f5f5f5");
        out.push_str(&format!(
            "  {name} [label=\"{name} ({count})\", fillcolor=\"{color}\"];\n"
        ));
    }
    out.push('\n');

    for ((from, to), (total, violations)) in &flows {
        if *violations > 0 {
            out.push_str(&format!(
                "  {from} -> {to} [color=red, style=dashed, label=\"{total} imports ({violations} flagged)\"];\n"
            ));
        } else {
            out.push_str(&format!("  {from} -> {to} [label=\"{total} imports\"];\n"));
        }
    }

    out.push_str("}\n");
    out
}

fn file_label(path: &str) -> &str {
    path.rsplit('/').next().unwrap_or(path)
}

/// Sanitize a string to be a valid DOT node ID.
fn sanitize_dot_id(s: &str) -> String {
    let cleaned: String = s
        .chars()
        .map(|c| {
            if c.is_alphanumeric() || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect();
    // DOT IDs must start with a letter or underscore
    if cleaned.starts_with(|c: char| c.is_ascii_digit()) {
        format!("n_{cleaned}")
    } else {
        cleaned
    }
}
