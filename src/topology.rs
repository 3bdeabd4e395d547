use crate::osm_types::OsmNodeId;
use crate::road_graph::RoadGraph;
use tracing::debug;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CleanReport {
    pub nodes_without_coordinates: usize,
    pub isolated_nodes: usize,
    pub self_loops: usize,
    /// Nodes left isolated by self-loop removal.
    pub isolated_after_loops: usize,
}

impl CleanReport {
    pub fn is_noop(&self) -> bool {
        *self == CleanReport::default()
    }
}

fn isolated_nodes(graph: &RoadGraph) -> Vec<OsmNodeId> {
    graph
        .nodes()
        .filter(|node| graph.degree(node.id) == 0)
        .map(|node| node.id)
        .collect()
}

/// Remove structurally invalid parts of the graph, in this order:
/// 1. nodes without coordinates (with their edges)
/// 2. nodes left with no edges
/// 3. self-loop edges, then any node those loops were the only edge of
///
/// Each removal set is computed before anything is removed. Running `clean`
/// on its own output changes nothing.
pub fn clean(graph: &mut RoadGraph) -> CleanReport {
    let mut report = CleanReport::default();

    let without_coordinates: Vec<OsmNodeId> = graph
        .nodes()
        .filter(|node| node.position().is_none())
        .map(|node| node.id)
        .collect();
    report.nodes_without_coordinates = graph.remove_nodes(without_coordinates);

    report.isolated_nodes = graph.remove_nodes(isolated_nodes(graph));

    let loops: Vec<OsmNodeId> = graph
        .edges()
        .filter(|edge| edge.is_self_loop())
        .map(|edge| edge.from)
        .collect();
    for node in &loops {
        if graph.remove_edge(*node, *node).is_some() {
            report.self_loops += 1;
        }
    }

    let orphaned: Vec<OsmNodeId> = loops
        .into_iter()
        .filter(|node| graph.degree(*node) == 0)
        .collect();
    report.isolated_after_loops = graph.remove_nodes(orphaned);

    debug!(?report, "clean finished");
    report
}
