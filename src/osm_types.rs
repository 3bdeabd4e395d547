use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Typed wrapper for OSM node IDs
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct OsmNodeId(pub i64);

impl fmt::Display for OsmNodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "n{}", self.0)
    }
}

/// Typed wrapper for OSM way IDs
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct OsmWayId(pub i64);

impl fmt::Display for OsmWayId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "w{}", self.0)
    }
}

/// Raw way tags, key -> value.
pub type WayTags = BTreeMap<String, String>;

/// Coordinate record as delivered by the extract reader
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NodeRecord {
    pub id: OsmNodeId,
    pub lon: f64,
    pub lat: f64,
}

/// Way record: tags plus the ordered node reference sequence
#[derive(Debug, Clone, PartialEq)]
pub struct WayRecord {
    pub id: OsmWayId,
    pub tags: WayTags,
    pub refs: Vec<OsmNodeId>,
}

impl WayRecord {
    pub fn new<K, V>(id: i64, tags: impl IntoIterator<Item = (K, V)>, refs: &[i64]) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            id: OsmWayId(id),
            tags: tags
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
            refs: refs.iter().copied().map(OsmNodeId).collect(),
        }
    }
}

/// Everything that can travel from an extract producer to the graph writer.
#[derive(Debug, Clone, PartialEq)]
pub enum OsmRecord {
    Node(NodeRecord),
    Way(WayRecord),
}

impl From<NodeRecord> for OsmRecord {
    fn from(node: NodeRecord) -> Self {
        OsmRecord::Node(node)
    }
}

impl From<WayRecord> for OsmRecord {
    fn from(way: WayRecord) -> Self {
        OsmRecord::Way(way)
    }
}
