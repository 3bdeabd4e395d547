use crate::osm_types::{NodeRecord, OsmRecord, WayRecord};
use crate::road_graph::RoadGraph;
use crate::tag_classifier::{LevelTable, classify, is_road};
use crossbeam::channel::Receiver;
use tracing::{debug, warn};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BuildStats {
    pub nodes: usize,
    pub ways_seen: usize,
    pub ways_kept: usize,
    /// Ways without a `highway` tag.
    pub ways_not_roads: usize,
    /// Road ways referencing fewer than two nodes.
    pub ways_too_short: usize,
    pub segments: usize,
    pub diagnostics: usize,
}

/// Populates a [`RoadGraph`] from node and way records.
///
/// Not meant to be shared between threads: concurrent producers hand their
/// records to one builder, see [`build_from_channel`].
pub struct GraphBuilder<'a> {
    graph: RoadGraph,
    table: &'a LevelTable,
    stats: BuildStats,
}

impl<'a> GraphBuilder<'a> {
    pub fn new(table: &'a LevelTable) -> Self {
        Self {
            graph: RoadGraph::new(),
            table,
            stats: BuildStats::default(),
        }
    }

    pub fn add_record(&mut self, record: OsmRecord) {
        match record {
            OsmRecord::Node(node) => self.add_node(&node),
            OsmRecord::Way(way) => self.add_way(&way),
        }
    }

    pub fn add_node(&mut self, node: &NodeRecord) {
        self.stats.nodes += 1;
        self.graph.upsert_node(node.id, node.lon, node.lat);
    }

    pub fn add_way(&mut self, way: &WayRecord) {
        self.stats.ways_seen += 1;

        if !is_road(&way.tags) {
            self.stats.ways_not_roads += 1;
            return;
        }

        if way.refs.len() < 2 {
            debug!("{} has {} node refs, skipped", way.id, way.refs.len());
            self.stats.ways_too_short += 1;
            return;
        }

        let Some(classification) = classify(&way.tags, self.table) else {
            self.stats.ways_not_roads += 1;
            return;
        };

        for diagnostic in &classification.diagnostics {
            warn!("{}: {}", way.id, diagnostic);
        }
        self.stats.diagnostics += classification.diagnostics.len();

        for pair in way.refs.windows(2) {
            self.graph
                .upsert_edge(pair[0], pair[1], way.id, classification.attrs.clone(), None);
            self.stats.segments += 1;
        }
        self.stats.ways_kept += 1;
    }

    pub fn stats(&self) -> BuildStats {
        self.stats
    }

    pub fn finish(self) -> (RoadGraph, BuildStats) {
        (self.graph, self.stats)
    }
}

/// Drain `rx` into a fresh graph. The calling thread is the only writer; any
/// number of producers may hold senders. Returns once every sender is dropped.
pub fn build_from_channel(rx: Receiver<OsmRecord>, table: &LevelTable) -> (RoadGraph, BuildStats) {
    let mut builder = GraphBuilder::new(table);
    for record in rx {
        builder.add_record(record);
    }
    builder.finish()
}
