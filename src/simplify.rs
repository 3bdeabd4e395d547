// ===========================================================================
// Degree-2 chain contraction
// ===========================================================================
//
// A node with exactly two incident edges of the same road level is removed
// and its two edges are replaced by one direct edge between its neighbors.
// This is Douglas-Peucker with an infinite tolerance, restricted to runs of
// one road level.
//
// One pass visits nodes in ascending id order and looks at each node's degree
// as it is *now*, so a contraction earlier in the pass is visible to nodes
// visited later. A pass is not repeated automatically; use
// `simplify_to_fixpoint` for that.
// ===========================================================================

use crate::osm_types::OsmNodeId;
use crate::road_graph::RoadGraph;
use tracing::debug;

/// Contract `id` if it is an eligible chain node. Returns whether it was.
fn contract_node(graph: &mut RoadGraph, id: OsmNodeId) -> bool {
    if graph.degree(id) != 2 {
        return false;
    }

    let neighbors: Vec<OsmNodeId> = graph.neighbors(id).collect();
    let [n1, n2] = neighbors[..] else {
        return false;
    };

    // a self-loop shows up as the node being its own neighbor
    if n1 == id || n2 == id {
        return false;
    }

    // contracting would create a second edge between n1 and n2
    if graph.has_edge(n1, n2) {
        return false;
    }

    let (Some(first), Some(second)) = (graph.edge(id, n1), graph.edge(id, n2)) else {
        return false;
    };

    if first.attrs.level != second.attrs.level {
        return false;
    }

    let length_m = match (first.length_m, second.length_m) {
        (Some(a), Some(b)) => Some(a + b),
        _ => None,
    };

    // keep the travel direction of the first edge
    let (from, to) = if first.from == n1 { (n1, n2) } else { (n2, n1) };
    let way = first.way;
    let attrs = first.attrs.clone();

    graph.remove_node(id);
    graph.upsert_edge(from, to, way, attrs, length_m);

    true
}

/// One ascending-id contraction pass. Returns the number of nodes contracted.
pub fn simplify_chains(graph: &mut RoadGraph) -> usize {
    let mut contracted = 0;

    for id in graph.node_ids() {
        if graph.contains_node(id) && contract_node(graph, id) {
            contracted += 1;
        }
    }

    debug!("simplify pass contracted {} nodes", contracted);
    contracted
}

/// Repeat [`simplify_chains`] until a pass contracts nothing.
/// Returns `(passes, contractions)`, the last pass being the empty one.
pub fn simplify_to_fixpoint(graph: &mut RoadGraph) -> (usize, usize) {
    let mut passes = 0;
    let mut total = 0;

    loop {
        passes += 1;
        let contracted = simplify_chains(graph);
        total += contracted;
        if contracted == 0 {
            break;
        }
    }

    (passes, total)
}
