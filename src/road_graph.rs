// Undirected, attributed simple graph of the road network.
//
// At most one edge exists per unordered node pair. Inserting a second edge on
// the same pair overwrites the first (last write wins). Removing a node always
// removes its incident edges, so edge endpoints never dangle.

use crate::osm_types::{OsmNodeId, OsmWayId};
use ahash::{AHashMap, AHashSet};
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

/// Road level as assigned by the level table.
pub type RoadLevel = i32;

/// A graph vertex. Coordinates are WGS84 degrees and may be missing when a way
/// references a node whose coordinate record never arrived.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RoadNode {
    pub id: OsmNodeId,
    pub lon: Option<f64>,
    pub lat: Option<f64>,
}

impl RoadNode {
    /// `(lon, lat)` if both are known.
    pub fn position(&self) -> Option<(f64, f64)> {
        match (self.lon, self.lat) {
            (Some(lon), Some(lat)) => Some((lon, lat)),
            _ => None,
        }
    }
}

/// Typed road attributes, produced once per way by the tag classifier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RoadAttributes {
    pub highway: String,
    pub level: RoadLevel,
    pub lanes: u32,
    pub oneway: bool,
    pub bicycle: bool,
    pub pedestrian: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RoadEdge {
    /// Endpoint order of the last insertion. Only meaningful for `oneway`.
    pub from: OsmNodeId,
    pub to: OsmNodeId,
    pub way: OsmWayId,
    pub attrs: RoadAttributes,
    /// Length in meters, absent until the projector has run.
    pub length_m: Option<f64>,
}

impl RoadEdge {
    pub fn key(&self) -> EdgeKey {
        EdgeKey::new(self.from, self.to)
    }

    pub fn is_self_loop(&self) -> bool {
        self.from == self.to
    }

    /// Get the other endpoint given one endpoint
    pub fn other_end(&self, node: OsmNodeId) -> Option<OsmNodeId> {
        if self.from == node {
            Some(self.to)
        } else if self.to == node {
            Some(self.from)
        } else {
            None
        }
    }
}

/// Orientation-free edge key, always stored as `(min, max)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EdgeKey(OsmNodeId, OsmNodeId);

impl EdgeKey {
    pub fn new(a: OsmNodeId, b: OsmNodeId) -> Self {
        if a <= b { Self(a, b) } else { Self(b, a) }
    }

    pub fn endpoints(&self) -> (OsmNodeId, OsmNodeId) {
        (self.0, self.1)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GraphSummary {
    pub nodes: usize,
    pub edges: usize,
}

impl fmt::Display for GraphSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "nodes: {}, edges: {}", self.nodes, self.edges)
    }
}

#[derive(Debug, Clone, Default)]
pub struct RoadGraph {
    nodes: BTreeMap<OsmNodeId, RoadNode>,
    edges: BTreeMap<EdgeKey, RoadEdge>,
    /// node -> distinct neighbors. A self-loop lists the node itself.
    adjacency: AHashMap<OsmNodeId, BTreeSet<OsmNodeId>>,
}

impl RoadGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a node or overwrite the coordinates of an existing one.
    pub fn upsert_node(&mut self, id: OsmNodeId, lon: f64, lat: f64) {
        let node = self.nodes.entry(id).or_insert(RoadNode {
            id,
            lon: None,
            lat: None,
        });
        node.lon = Some(lon);
        node.lat = Some(lat);
    }

    /// Make sure `id` exists, without touching coordinates it may already have.
    pub fn ensure_node(&mut self, id: OsmNodeId) {
        self.nodes.entry(id).or_insert(RoadNode {
            id,
            lon: None,
            lat: None,
        });
    }

    /// Insert an edge, creating coordinate-less endpoints as needed. Returns the
    /// edge that was overwritten, if the pair was already connected.
    pub fn upsert_edge(
        &mut self,
        from: OsmNodeId,
        to: OsmNodeId,
        way: OsmWayId,
        attrs: RoadAttributes,
        length_m: Option<f64>,
    ) -> Option<RoadEdge> {
        self.ensure_node(from);
        self.ensure_node(to);

        self.adjacency.entry(from).or_default().insert(to);
        self.adjacency.entry(to).or_default().insert(from);

        self.edges.insert(
            EdgeKey::new(from, to),
            RoadEdge {
                from,
                to,
                way,
                attrs,
                length_m,
            },
        )
    }

    /// Remove a node and every edge touching it. No-op for unknown nodes.
    pub fn remove_node(&mut self, id: OsmNodeId) -> Option<RoadNode> {
        let removed = self.nodes.remove(&id)?;

        if let Some(neighbors) = self.adjacency.remove(&id) {
            for neighbor in neighbors {
                self.edges.remove(&EdgeKey::new(id, neighbor));
                if neighbor != id {
                    if let Some(adj) = self.adjacency.get_mut(&neighbor) {
                        adj.remove(&id);
                    }
                }
            }
        }

        Some(removed)
    }

    pub fn remove_nodes<I: IntoIterator<Item = OsmNodeId>>(&mut self, ids: I) -> usize {
        ids.into_iter()
            .filter(|id| self.remove_node(*id).is_some())
            .count()
    }

    /// Remove the edge between `a` and `b`, in either orientation. Endpoints stay.
    pub fn remove_edge(&mut self, a: OsmNodeId, b: OsmNodeId) -> Option<RoadEdge> {
        let removed = self.edges.remove(&EdgeKey::new(a, b))?;

        if let Some(adj) = self.adjacency.get_mut(&a) {
            adj.remove(&b);
        }
        if let Some(adj) = self.adjacency.get_mut(&b) {
            adj.remove(&a);
        }

        Some(removed)
    }

    /// Number of distinct incident edges. A self-loop counts once.
    pub fn degree(&self, id: OsmNodeId) -> usize {
        self.adjacency.get(&id).map_or(0, BTreeSet::len)
    }

    /// Neighbors of `id` in ascending identifier order.
    pub fn neighbors(&self, id: OsmNodeId) -> impl Iterator<Item = OsmNodeId> + '_ {
        self.adjacency.get(&id).into_iter().flatten().copied()
    }

    pub fn has_edge(&self, a: OsmNodeId, b: OsmNodeId) -> bool {
        self.edges.contains_key(&EdgeKey::new(a, b))
    }

    pub fn edge(&self, a: OsmNodeId, b: OsmNodeId) -> Option<&RoadEdge> {
        self.edges.get(&EdgeKey::new(a, b))
    }

    pub fn contains_node(&self, id: OsmNodeId) -> bool {
        self.nodes.contains_key(&id)
    }

    pub fn node(&self, id: OsmNodeId) -> Option<&RoadNode> {
        self.nodes.get(&id)
    }

    /// Nodes in ascending identifier order.
    pub fn nodes(&self) -> impl Iterator<Item = &RoadNode> + '_ {
        self.nodes.values()
    }

    pub fn node_ids(&self) -> Vec<OsmNodeId> {
        self.nodes.keys().copied().collect()
    }

    /// Edges in ascending key order.
    pub fn edges(&self) -> impl Iterator<Item = &RoadEdge> + '_ {
        self.edges.values()
    }

    /// Mutable edges together with their endpoint nodes.
    pub fn edges_with_endpoints_mut(
        &mut self,
    ) -> impl Iterator<Item = (&mut RoadEdge, Option<&RoadNode>, Option<&RoadNode>)> + '_ {
        let nodes = &self.nodes;
        self.edges.values_mut().map(move |edge| {
            let from = nodes.get(&edge.from);
            let to = nodes.get(&edge.to);
            (edge, from, to)
        })
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    pub fn summary(&self) -> GraphSummary {
        GraphSummary {
            nodes: self.node_count(),
            edges: self.edge_count(),
        }
    }

    /// Edge endpoints that are missing from the node set. Empty for a sound graph.
    pub fn check_integrity(&self) -> Vec<(EdgeKey, OsmNodeId)> {
        let mut dangling = Vec::new();
        let mut seen: AHashSet<(EdgeKey, OsmNodeId)> = AHashSet::new();

        for (key, edge) in &self.edges {
            for endpoint in [edge.from, edge.to] {
                if !self.nodes.contains_key(&endpoint) && seen.insert((*key, endpoint)) {
                    dangling.push((*key, endpoint));
                }
            }
        }

        dangling
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;

    pub fn attrs(highway: &str, level: RoadLevel) -> RoadAttributes {
        RoadAttributes {
            highway: highway.to_string(),
            level,
            lanes: 1,
            oneway: false,
            bicycle: false,
            pedestrian: false,
        }
    }

    pub fn n(id: i64) -> OsmNodeId {
        OsmNodeId(id)
    }
}

#[cfg(test)]
mod tests {
    use super::test_support::{attrs, n};
    use super::*;

    #[test]
    fn test_second_insert_overwrites_pair() {
        let mut g = RoadGraph::new();
        g.upsert_edge(n(1), n(2), OsmWayId(10), attrs("residential", 5), None);
        let previous = g.upsert_edge(n(2), n(1), OsmWayId(11), attrs("primary", 2), None);

        assert_eq!(previous.map(|e| e.way), Some(OsmWayId(10)));
        assert_eq!(g.edge_count(), 1);
        let edge = g.edge(n(1), n(2)).unwrap();
        assert_eq!(edge.way, OsmWayId(11));
        assert_eq!(edge.attrs.highway, "primary");
        assert_eq!((edge.from, edge.to), (n(2), n(1)));
    }

    #[test]
    fn test_edge_creates_coordinate_less_nodes() {
        let mut g = RoadGraph::new();
        g.upsert_edge(n(1), n(2), OsmWayId(1), attrs("service", 5), None);
        assert_eq!(g.node(n(1)).unwrap().position(), None);

        g.upsert_node(n(1), 2.35, 48.85);
        assert_eq!(g.node(n(1)).unwrap().position(), Some((2.35, 48.85)));
        // coordinates arriving later must not drop adjacency
        assert_eq!(g.degree(n(1)), 1);
    }

    #[test]
    fn test_remove_node_cascades() {
        let mut g = RoadGraph::new();
        g.upsert_edge(n(1), n(2), OsmWayId(1), attrs("service", 5), None);
        g.upsert_edge(n(2), n(3), OsmWayId(1), attrs("service", 5), None);
        g.upsert_edge(n(2), n(2), OsmWayId(2), attrs("service", 5), None);

        assert_eq!(g.degree(n(2)), 3);
        assert!(g.remove_node(n(2)).is_some());
        assert_eq!(g.edge_count(), 0);
        assert_eq!(g.degree(n(1)), 0);
        assert_eq!(g.degree(n(3)), 0);
        assert!(g.check_integrity().is_empty());

        // removing again is a no-op
        assert!(g.remove_node(n(2)).is_none());
        assert!(g.remove_edge(n(1), n(2)).is_none());
    }

    #[test]
    fn test_self_loop_counts_once() {
        let mut g = RoadGraph::new();
        g.upsert_edge(n(5), n(5), OsmWayId(1), attrs("service", 5), None);
        assert_eq!(g.degree(n(5)), 1);
        assert_eq!(g.neighbors(n(5)).collect::<Vec<_>>(), vec![n(5)]);
        g.remove_edge(n(5), n(5));
        assert_eq!(g.degree(n(5)), 0);
        assert!(g.contains_node(n(5)));
    }

    #[test]
    fn test_neighbors_sorted() {
        let mut g = RoadGraph::new();
        for other in [9, 3, 7] {
            g.upsert_edge(n(5), n(other), OsmWayId(1), attrs("service", 5), None);
        }
        assert_eq!(g.neighbors(n(5)).collect::<Vec<_>>(), vec![n(3), n(7), n(9)]);
        assert_eq!(g.summary(), GraphSummary { nodes: 4, edges: 3 });
    }
}
