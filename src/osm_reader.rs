use crate::error::ExtractError;
use crate::graph_builder::{BuildStats, build_from_channel};
use crate::osm_types::{NodeRecord, OsmNodeId, OsmRecord, OsmWayId, WayRecord, WayTags};
use crate::road_graph::RoadGraph;
use crate::tag_classifier::LevelTable;
use crossbeam::channel::{self, Sender};
use osmpbfreader::{NodeId, OsmObj, OsmPbfReader};
use std::fmt::Display;
use std::fs::File;
use std::io::{BufReader, Read, Seek};
use std::path::Path;
use std::thread;
use tracing::info;

const CHANNEL_CAPACITY: usize = 4096;

fn copy_tags<K: Display, V: Display>(tags: impl IntoIterator<Item = (K, V)>) -> WayTags {
    tags.into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

fn node_refs(nodes: &[NodeId]) -> Vec<OsmNodeId> {
    nodes.iter().map(|n| OsmNodeId(n.0)).collect()
}

fn to_record(obj: OsmObj) -> Option<OsmRecord> {
    match obj {
        OsmObj::Node(node) => Some(OsmRecord::Node(NodeRecord {
            id: OsmNodeId(node.id.0),
            lon: node.lon(),
            lat: node.lat(),
        })),
        OsmObj::Way(way) => Some(OsmRecord::Way(WayRecord {
            id: OsmWayId(way.id.0),
            tags: copy_tags(way.tags.iter()),
            refs: node_refs(&way.nodes),
        })),
        OsmObj::Relation(_) => None,
    }
}

/// Decode every node and way of a PBF stream into `tx`. Stops at the first
/// decode error or when the receiving side is gone.
fn stream_records<R: Read + Seek>(
    reader: R,
    tx: Sender<OsmRecord>,
) -> Result<usize, osmpbfreader::Error> {
    let mut pbf = OsmPbfReader::new(reader);
    let mut sent = 0;

    for obj in pbf.iter() {
        if let Some(record) = to_record(obj?) {
            if tx.send(record).is_err() {
                break;
            }
            sent += 1;
        }
    }

    Ok(sent)
}

/// Build a graph from any PBF byte stream. Decoding runs on its own thread;
/// the calling thread is the single graph writer.
pub fn read_records<R>(
    reader: R,
    table: &LevelTable,
    source: &Path,
) -> Result<(RoadGraph, BuildStats), ExtractError>
where
    R: Read + Seek + Send,
{
    let (tx, rx) = channel::bounded(CHANNEL_CAPACITY);

    thread::scope(|s| {
        let producer = s.spawn(move || stream_records(reader, tx));
        let built = build_from_channel(rx, table);

        let sent = producer
            .join()
            .map_err(|_| ExtractError::ProducerPanicked)?
            .map_err(|err| ExtractError::Decode {
                path: source.to_path_buf(),
                source: err,
            })?;
        info!("{} records read from {}", sent, source.display());

        Ok(built)
    })
}

/// Open an `.osm.pbf` extract and build the raw road graph from it.
pub fn read_extract(path: &Path, table: &LevelTable) -> Result<(RoadGraph, BuildStats), ExtractError> {
    let file = File::open(path).map_err(|source| ExtractError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    read_records(BufReader::new(file), table, path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn test_missing_file_is_io_error() {
        let table = LevelTable::default();
        let err = read_extract(Path::new("/definitely/not/here.osm.pbf"), &table).unwrap_err();
        assert!(matches!(err, ExtractError::Io { .. }));
        assert!(err.to_string().contains("here.osm.pbf"));
    }

    #[test]
    fn test_way_conversion() {
        let tags = copy_tags([("highway", "residential"), ("lanes", "2")]);
        assert_eq!(tags.get("highway").map(String::as_str), Some("residential"));
        assert_eq!(tags.len(), 2);

        let refs = node_refs(&[NodeId(5), NodeId(-3), NodeId(5)]);
        assert_eq!(refs, vec![OsmNodeId(5), OsmNodeId(-3), OsmNodeId(5)]);

        let way = osmpbfreader::Way {
            id: osmpbfreader::WayId(12),
            tags: osmpbfreader::Tags::new(),
            nodes: vec![NodeId(1), NodeId(2)],
        };
        let Some(OsmRecord::Way(record)) = to_record(OsmObj::Way(way)) else {
            panic!("expected a way record");
        };
        assert_eq!(record.id, OsmWayId(12));
        assert!(record.tags.is_empty());
        assert_eq!(record.refs, vec![OsmNodeId(1), OsmNodeId(2)]);
    }

    #[test]
    fn test_node_conversion() {
        let node = osmpbfreader::Node {
            id: NodeId(42),
            tags: osmpbfreader::Tags::new(),
            decimicro_lat: 488_566_000,
            decimicro_lon: 23_522_000,
        };
        let Some(OsmRecord::Node(record)) = to_record(OsmObj::Node(node)) else {
            panic!("expected a node record");
        };
        assert_eq!(record.id, OsmNodeId(42));
        assert!((record.lat - 48.8566).abs() < 1e-9);
        assert!((record.lon - 2.3522).abs() < 1e-9);

        let relation = osmpbfreader::Relation {
            id: osmpbfreader::RelationId(1),
            tags: osmpbfreader::Tags::new(),
            refs: Vec::new(),
        };
        assert!(to_record(OsmObj::Relation(relation)).is_none());
    }

    #[test]
    fn test_garbage_stream_is_decode_error() {
        let table = LevelTable::default();
        let bytes = vec![0, 0, 0, 8, 1, 2, 3, 4, 5, 6, 7, 8];
        let err = read_records(Cursor::new(bytes), &table, Path::new("bad.pbf")).unwrap_err();
        assert!(matches!(err, ExtractError::Decode { .. }));
        assert!(std::error::Error::source(&err).is_some());
    }

    #[test]
    fn test_empty_stream_builds_empty_graph() {
        let table = LevelTable::default();
        let (graph, stats) =
            read_records(Cursor::new(Vec::<u8>::new()), &table, Path::new("empty.pbf")).unwrap();
        assert_eq!(graph.node_count(), 0);
        assert_eq!(stats, BuildStats::default());
    }
}
