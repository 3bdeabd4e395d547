use crate::error::BoundingBoxError;
use crate::osm_types::OsmNodeId;
use crate::road_graph::RoadGraph;
use std::fmt;
use std::str::FromStr;

/// Axis-aligned lon/lat rectangle. Always stored with `min <= max`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    pub min_lon: f64,
    pub min_lat: f64,
    pub max_lon: f64,
    pub max_lat: f64,
}

impl BoundingBox {
    /// Build from any two opposite corners.
    pub fn new(lon_a: f64, lat_a: f64, lon_b: f64, lat_b: f64) -> Self {
        Self {
            min_lon: lon_a.min(lon_b),
            min_lat: lat_a.min(lat_b),
            max_lon: lon_a.max(lon_b),
            max_lat: lat_a.max(lat_b),
        }
    }

    /// Closed range test, points on the border are inside.
    pub fn contains(&self, lon: f64, lat: f64) -> bool {
        (self.min_lon..=self.max_lon).contains(&lon) && (self.min_lat..=self.max_lat).contains(&lat)
    }
}

impl FromStr for BoundingBox {
    type Err = BoundingBoxError;

    /// `"lon,lat,lon,lat"`; commas, whitespace or both may separate values.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let values = s
            .split(|c: char| c == ',' || c.is_whitespace())
            .filter(|part| !part.is_empty())
            .map(|part| {
                let value: f64 = part
                    .parse()
                    .map_err(|_| BoundingBoxError::NotANumber(part.to_string()))?;
                if value.is_finite() {
                    Ok(value)
                } else {
                    Err(BoundingBoxError::NotFinite(value))
                }
            })
            .collect::<Result<Vec<f64>, _>>()?;

        match values.as_slice() {
            [lon_a, lat_a, lon_b, lat_b] => Ok(Self::new(*lon_a, *lat_a, *lon_b, *lat_b)),
            other => Err(BoundingBoxError::WrongCount(other.len())),
        }
    }
}

impl fmt::Display for BoundingBox {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{},{},{},{}",
            self.min_lon, self.min_lat, self.max_lon, self.max_lat
        )
    }
}

/// Remove every node outside `bbox` or without coordinates, with its edges.
/// Returns the number of nodes removed.
pub fn filter_to_bbox(graph: &mut RoadGraph, bbox: &BoundingBox) -> usize {
    let outside: Vec<OsmNodeId> = graph
        .nodes()
        .filter(|node| match node.position() {
            Some((lon, lat)) => !bbox.contains(lon, lat),
            None => true,
        })
        .map(|node| node.id)
        .collect();

    graph.remove_nodes(outside)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::osm_types::OsmWayId;
    use crate::road_graph::test_support::{attrs, n};

    fn grid() -> RoadGraph {
        let mut g = RoadGraph::new();
        let mut id = 0;
        for lon in 0..5 {
            for lat in 0..5 {
                id += 1;
                g.upsert_node(n(id), lon as f64, lat as f64);
                if id > 1 {
                    g.upsert_edge(n(id - 1), n(id), OsmWayId(1), attrs("service", 5), None);
                }
            }
        }
        // coordinate-less node hanging off node 13 (2, 2)
        g.upsert_edge(n(13), n(100), OsmWayId(2), attrs("service", 5), None);
        g
    }

    #[test]
    fn test_parse() {
        let bbox: BoundingBox = "121.434, 31.4542, 122.453, 27.554".parse().unwrap();
        assert_eq!(bbox, BoundingBox::new(121.434, 27.554, 122.453, 31.4542));

        let spaced: BoundingBox = "121.434 31.4542 122.453 27.554".parse().unwrap();
        assert_eq!(spaced, bbox);

        assert_eq!(
            "1,2,3".parse::<BoundingBox>(),
            Err(BoundingBoxError::WrongCount(3))
        );
        assert_eq!(
            "1,2,3,4,5".parse::<BoundingBox>(),
            Err(BoundingBoxError::WrongCount(5))
        );
        assert_eq!(
            "1,north,3,4".parse::<BoundingBox>(),
            Err(BoundingBoxError::NotANumber("north".to_string()))
        );
        assert!(matches!(
            "1,inf,3,4".parse::<BoundingBox>(),
            Err(BoundingBoxError::NotFinite(_))
        ));
    }

    #[test]
    fn test_filter_keeps_boundary() {
        let mut g = grid();
        let bbox = BoundingBox::new(1.0, 1.0, 3.0, 3.0);
        filter_to_bbox(&mut g, &bbox);

        assert_eq!(g.node_count(), 9);
        for node in g.nodes() {
            let (lon, lat) = node.position().unwrap();
            assert!(bbox.contains(lon, lat));
        }
        assert!(!g.contains_node(n(100)));
        assert!(g.check_integrity().is_empty());
    }

    #[test]
    fn test_reversed_corners_filter_identically() {
        let mut a = grid();
        let mut b = grid();
        filter_to_bbox(&mut a, &"0.5,3.5,2.5,0.5".parse().unwrap());
        filter_to_bbox(&mut b, &"2.5,0.5,0.5,3.5".parse().unwrap());

        assert_eq!(a.node_ids(), b.node_ids());
        assert_eq!(
            a.edges().cloned().collect::<Vec<_>>(),
            b.edges().cloned().collect::<Vec<_>>()
        );
    }
}
