use crate::error::ExportError;
use crate::road_graph::{RoadEdge, RoadGraph, RoadNode};
use geo_types::LineString;
use geojson::{Feature, FeatureCollection, GeoJson, Geometry, Value};
use quick_xml::Writer;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use serde::Serialize;
use std::fmt;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    /// node-link JSON document
    #[default]
    Json,
    GeoJson,
    Csv,
    GraphMl,
    Gexf,
}

impl OutputFormat {
    /// Guess from the file extension, `None` when it is not one we write.
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?;
        ext.parse().ok()
    }
}

impl FromStr for OutputFormat {
    type Err = ExportError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "json" => Ok(OutputFormat::Json),
            "geojson" => Ok(OutputFormat::GeoJson),
            "csv" => Ok(OutputFormat::Csv),
            "graphml" => Ok(OutputFormat::GraphMl),
            "gexf" => Ok(OutputFormat::Gexf),
            _ => Err(ExportError::UnknownFormat(s.to_string())),
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            OutputFormat::Json => "json",
            OutputFormat::GeoJson => "geojson",
            OutputFormat::Csv => "csv",
            OutputFormat::GraphMl => "graphml",
            OutputFormat::Gexf => "gexf",
        };
        f.write_str(name)
    }
}

#[derive(Serialize)]
pub struct ExportNode {
    pub id: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub longitude: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub latitude: Option<f64>,
}

impl From<&RoadNode> for ExportNode {
    fn from(node: &RoadNode) -> Self {
        Self {
            id: node.id.0,
            longitude: node.lon,
            latitude: node.lat,
        }
    }
}

/// Edge attributes as written to every format.
#[derive(Serialize)]
pub struct ExportEdge {
    pub source: i64,
    pub target: i64,
    pub osmid: i64,
    pub highway: String,
    pub level: i32,
    pub lanes: u32,
    pub oneway: bool,
    pub bicycle: bool,
    pub foot: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub length: Option<f64>,
}

impl From<&RoadEdge> for ExportEdge {
    fn from(edge: &RoadEdge) -> Self {
        Self {
            source: edge.from.0,
            target: edge.to.0,
            osmid: edge.way.0,
            highway: edge.attrs.highway.clone(),
            level: edge.attrs.level,
            lanes: edge.attrs.lanes,
            oneway: edge.attrs.oneway,
            bicycle: edge.attrs.bicycle,
            foot: edge.attrs.pedestrian,
            length: edge.length_m,
        }
    }
}

#[derive(Serialize)]
struct NodeLinkGraph {
    directed: bool,
    multigraph: bool,
    graph: serde_json::Map<String, serde_json::Value>,
    nodes: Vec<ExportNode>,
    links: Vec<ExportEdge>,
}

#[derive(Serialize)]
struct CsvRow {
    source: i64,
    target: i64,
    source_lon: Option<f64>,
    source_lat: Option<f64>,
    target_lon: Option<f64>,
    target_lat: Option<f64>,
    osmid: i64,
    highway: String,
    level: i32,
    lanes: u32,
    oneway: bool,
    bicycle: bool,
    foot: bool,
    length: Option<f64>,
}

pub fn write_json<W: Write>(graph: &RoadGraph, writer: W) -> Result<(), ExportError> {
    let doc = NodeLinkGraph {
        directed: false,
        multigraph: false,
        graph: serde_json::Map::new(),
        nodes: graph.nodes().map(ExportNode::from).collect(),
        links: graph.edges().map(ExportEdge::from).collect(),
    };
    serde_json::to_writer(writer, &doc)?;
    Ok(())
}

/// One LineString feature per edge. Edges with a coordinate-less endpoint
/// have no geometry to draw and are left out.
pub fn to_geojson(graph: &RoadGraph) -> Result<GeoJson, ExportError> {
    let mut features = Vec::with_capacity(graph.edge_count());

    for edge in graph.edges() {
        let from = graph.node(edge.from).and_then(RoadNode::position);
        let to = graph.node(edge.to).and_then(RoadNode::position);
        let (Some((lon_a, lat_a)), Some((lon_b, lat_b))) = (from, to) else {
            continue;
        };

        let line = LineString::from(vec![(lon_a, lat_a), (lon_b, lat_b)]);
        let properties = match serde_json::to_value(ExportEdge::from(edge))? {
            serde_json::Value::Object(map) => Some(map),
            _ => None,
        };

        features.push(Feature {
            bbox: None,
            geometry: Some(Geometry::new(Value::from(&line))),
            id: None,
            properties,
            foreign_members: None,
        });
    }

    Ok(GeoJson::FeatureCollection(FeatureCollection {
        bbox: None,
        features,
        foreign_members: None,
    }))
}

pub fn write_geojson<W: Write>(graph: &RoadGraph, writer: W) -> Result<(), ExportError> {
    serde_json::to_writer(writer, &to_geojson(graph)?)?;
    Ok(())
}

pub fn write_csv<W: Write>(graph: &RoadGraph, writer: W) -> Result<(), ExportError> {
    let mut csv_writer = csv::Writer::from_writer(writer);

    for edge in graph.edges() {
        let from = graph.node(edge.from);
        let to = graph.node(edge.to);
        let e = ExportEdge::from(edge);
        csv_writer.serialize(CsvRow {
            source: e.source,
            target: e.target,
            source_lon: from.and_then(|n| n.lon),
            source_lat: from.and_then(|n| n.lat),
            target_lon: to.and_then(|n| n.lon),
            target_lat: to.and_then(|n| n.lat),
            osmid: e.osmid,
            highway: e.highway,
            level: e.level,
            lanes: e.lanes,
            oneway: e.oneway,
            bicycle: e.bicycle,
            foot: e.foot,
            length: e.length,
        })?;
    }

    csv_writer.flush().map_err(csv::Error::from)?;
    Ok(())
}

const GRAPHML_NS: &str = "http://graphml.graphdrawing.org/xmlns";
const GEXF_NS: &str = "http://www.gexf.net/1.2draft";

/// Attribute columns of the XML formats: (name, GraphML type, GEXF type).
const NODE_COLUMNS: [(&str, &str, &str); 2] = [
    ("longitude", "double", "double"),
    ("latitude", "double", "double"),
];
const EDGE_COLUMNS: [(&str, &str, &str); 8] = [
    ("osmid", "long", "long"),
    ("highway", "string", "string"),
    ("level", "int", "integer"),
    ("lanes", "int", "integer"),
    ("oneway", "boolean", "boolean"),
    ("bicycle", "boolean", "boolean"),
    ("foot", "boolean", "boolean"),
    ("length", "double", "double"),
];

fn node_values(node: &RoadNode) -> [Option<String>; 2] {
    [node.lon.map(|v| v.to_string()), node.lat.map(|v| v.to_string())]
}

/// Same order as `EDGE_COLUMNS`. Absent values are not written.
fn edge_values(edge: &ExportEdge) -> [Option<String>; 8] {
    [
        Some(edge.osmid.to_string()),
        Some(edge.highway.clone()),
        Some(edge.level.to_string()),
        Some(edge.lanes.to_string()),
        Some(edge.oneway.to_string()),
        Some(edge.bicycle.to_string()),
        Some(edge.foot.to_string()),
        edge.length.map(|v| v.to_string()),
    ]
}

fn emit<W: Write>(xml: &mut Writer<W>, event: Event<'_>) -> Result<(), ExportError> {
    xml.write_event(event).map_err(|e| ExportError::Xml(e.into()))
}

fn start<W: Write>(xml: &mut Writer<W>, name: &str, attrs: &[(&str, &str)]) -> Result<(), ExportError> {
    emit(xml, Event::Start(BytesStart::new(name).with_attributes(attrs.iter().copied())))
}

fn empty<W: Write>(xml: &mut Writer<W>, name: &str, attrs: &[(&str, &str)]) -> Result<(), ExportError> {
    emit(xml, Event::Empty(BytesStart::new(name).with_attributes(attrs.iter().copied())))
}

fn end<W: Write>(xml: &mut Writer<W>, name: &str) -> Result<(), ExportError> {
    emit(xml, Event::End(BytesEnd::new(name)))
}

fn graphml_data<W: Write>(
    xml: &mut Writer<W>,
    prefix: char,
    values: &[Option<String>],
) -> Result<(), ExportError> {
    for (i, value) in values.iter().enumerate() {
        let Some(value) = value else {
            continue;
        };
        let key = format!("{prefix}{i}");
        start(xml, "data", &[("key", key.as_str())])?;
        emit(xml, Event::Text(BytesText::new(value)))?;
        end(xml, "data")?;
    }
    Ok(())
}

/// GraphML with one `<key>` per attribute. Node keys are `n0..`, edge keys `e0..`.
pub fn write_graphml<W: Write>(graph: &RoadGraph, writer: W) -> Result<(), ExportError> {
    let mut xml = Writer::new_with_indent(writer, b' ', 2);
    emit(&mut xml, Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))?;
    start(&mut xml, "graphml", &[("xmlns", GRAPHML_NS)])?;

    let key_sets = [('n', "node", &NODE_COLUMNS[..]), ('e', "edge", &EDGE_COLUMNS[..])];
    for (prefix, domain, columns) in key_sets {
        for (i, (name, kind, _)) in columns.iter().enumerate() {
            let id = format!("{prefix}{i}");
            empty(
                &mut xml,
                "key",
                &[
                    ("id", id.as_str()),
                    ("for", domain),
                    ("attr.name", *name),
                    ("attr.type", *kind),
                ],
            )?;
        }
    }

    start(&mut xml, "graph", &[("id", "G"), ("edgedefault", "undirected")])?;

    for node in graph.nodes() {
        let id = node.id.0.to_string();
        start(&mut xml, "node", &[("id", id.as_str())])?;
        graphml_data(&mut xml, 'n', &node_values(node))?;
        end(&mut xml, "node")?;
    }

    for edge in graph.edges() {
        let edge = ExportEdge::from(edge);
        let (source, target) = (edge.source.to_string(), edge.target.to_string());
        start(&mut xml, "edge", &[("source", source.as_str()), ("target", target.as_str())])?;
        graphml_data(&mut xml, 'e', &edge_values(&edge))?;
        end(&mut xml, "edge")?;
    }

    end(&mut xml, "graph")?;
    end(&mut xml, "graphml")
}

fn gexf_attvalues<W: Write>(xml: &mut Writer<W>, values: &[Option<String>]) -> Result<(), ExportError> {
    start(xml, "attvalues", &[])?;
    for (i, value) in values.iter().enumerate() {
        if let Some(value) = value {
            let column = i.to_string();
            empty(xml, "attvalue", &[("for", column.as_str()), ("value", value.as_str())])?;
        }
    }
    end(xml, "attvalues")
}

/// GEXF 1.2 static undirected graph. Edge ids are their position in key order.
pub fn write_gexf<W: Write>(graph: &RoadGraph, writer: W) -> Result<(), ExportError> {
    let mut xml = Writer::new_with_indent(writer, b' ', 2);
    emit(&mut xml, Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))?;
    start(&mut xml, "gexf", &[("xmlns", GEXF_NS), ("version", "1.2")])?;
    start(&mut xml, "graph", &[("defaultedgetype", "undirected"), ("mode", "static")])?;

    for (class, columns) in [("node", &NODE_COLUMNS[..]), ("edge", &EDGE_COLUMNS[..])] {
        start(&mut xml, "attributes", &[("class", class)])?;
        for (i, (name, _, kind)) in columns.iter().enumerate() {
            let id = i.to_string();
            empty(
                &mut xml,
                "attribute",
                &[("id", id.as_str()), ("title", *name), ("type", *kind)],
            )?;
        }
        end(&mut xml, "attributes")?;
    }

    start(&mut xml, "nodes", &[])?;
    for node in graph.nodes() {
        let id = node.id.0.to_string();
        start(&mut xml, "node", &[("id", id.as_str()), ("label", id.as_str())])?;
        gexf_attvalues(&mut xml, &node_values(node))?;
        end(&mut xml, "node")?;
    }
    end(&mut xml, "nodes")?;

    start(&mut xml, "edges", &[])?;
    for (i, edge) in graph.edges().enumerate() {
        let edge = ExportEdge::from(edge);
        let (id, source, target) = (i.to_string(), edge.source.to_string(), edge.target.to_string());
        start(
            &mut xml,
            "edge",
            &[("id", id.as_str()), ("source", source.as_str()), ("target", target.as_str())],
        )?;
        gexf_attvalues(&mut xml, &edge_values(&edge))?;
        end(&mut xml, "edge")?;
    }
    end(&mut xml, "edges")?;

    end(&mut xml, "graph")?;
    end(&mut xml, "gexf")
}

pub fn write_graph(graph: &RoadGraph, path: &Path, format: OutputFormat) -> Result<(), ExportError> {
    let io_err = |source| ExportError::Io {
        path: path.to_path_buf(),
        source,
    };

    let file = File::create(path).map_err(io_err)?;
    let mut writer = BufWriter::new(file);

    match format {
        OutputFormat::Json => write_json(graph, &mut writer)?,
        OutputFormat::GeoJson => write_geojson(graph, &mut writer)?,
        OutputFormat::Csv => write_csv(graph, &mut writer)?,
        OutputFormat::GraphMl => write_graphml(graph, &mut writer)?,
        OutputFormat::Gexf => write_gexf(graph, &mut writer)?,
    }

    writer.flush().map_err(io_err)
}
