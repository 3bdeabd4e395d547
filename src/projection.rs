// ===========================================================================
// Edge length computation
// ===========================================================================
//
// Lengths are measured in the target spatial reference:
// - EPSG:4326: geodesic distance on the WGS84 ellipsoid
// - EPSG:3857: Euclidean distance in Web Mercator meters
// - EPSG:326xx / 327xx: Euclidean distance in UTM zone xx (north / south)
// ===========================================================================

use crate::error::ProjectionError;
use crate::road_graph::RoadGraph;
use geo::{Distance, Geodesic, Point};
use tracing::debug;

pub const EARTH_RADIUS: f64 = 6378137.0;
const WGS84_FLATTENING: f64 = 1.0 / 298.257223563;
const UTM_SCALE: f64 = 0.9996;
const UTM_FALSE_EASTING: f64 = 500_000.0;
const UTM_FALSE_NORTHING_SOUTH: f64 = 10_000_000.0;

pub const DEFAULT_EPSG: u32 = 3857;

/// Something that can measure the distance between two WGS84 points.
/// Points are `(x = lon, y = lat)` in degrees.
pub trait DistanceProjection {
    fn distance_m(&self, a: Point<f64>, b: Point<f64>) -> f64;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SpatialReference {
    Wgs84Geodesic,
    #[default]
    WebMercator,
    Utm { zone: u8, north: bool },
}

impl SpatialReference {
    pub fn from_epsg(code: u32) -> Result<Self, ProjectionError> {
        match code {
            4326 => Ok(SpatialReference::Wgs84Geodesic),
            3857 | 900913 => Ok(SpatialReference::WebMercator),
            32601..=32660 => Ok(SpatialReference::Utm {
                zone: (code - 32600) as u8,
                north: true,
            }),
            32701..=32760 => Ok(SpatialReference::Utm {
                zone: (code - 32700) as u8,
                north: false,
            }),
            _ => Err(ProjectionError::UnsupportedEpsg(code)),
        }
    }

    pub fn epsg(&self) -> u32 {
        match self {
            SpatialReference::Wgs84Geodesic => 4326,
            SpatialReference::WebMercator => 3857,
            SpatialReference::Utm { zone, north: true } => 32600 + *zone as u32,
            SpatialReference::Utm { zone, north: false } => 32700 + *zone as u32,
        }
    }

    /// Projected `(x, y)` in meters. `None` for the geographic reference.
    pub fn project(&self, p: Point<f64>) -> Option<(f64, f64)> {
        match self {
            SpatialReference::Wgs84Geodesic => None,
            SpatialReference::WebMercator => Some(lat_lng_to_web_merc(p.x(), p.y())),
            SpatialReference::Utm { zone, north } => {
                Some(lat_lng_to_utm(p.x(), p.y(), *zone, *north))
            }
        }
    }
}

impl DistanceProjection for SpatialReference {
    fn distance_m(&self, a: Point<f64>, b: Point<f64>) -> f64 {
        match (self.project(a), self.project(b)) {
            (Some((ax, ay)), Some((bx, by))) => (bx - ax).hypot(by - ay),
            _ => Geodesic.distance(a, b),
        }
    }
}

/// Convert lat/lng (EPSG:4326) to Web Mercator (EPSG:3857)
/// Input: (longitude, latitude) in degrees
/// Output: (x, y) in meters
pub fn lat_lng_to_web_merc(lon: f64, lat: f64) -> (f64, f64) {
    let x = EARTH_RADIUS * lon.to_radians();
    let y = EARTH_RADIUS * ((std::f64::consts::FRAC_PI_4 + lat.to_radians() / 2.0).tan()).ln();
    (x, y)
}

/// Transverse Mercator forward projection onto a UTM zone (Krüger series, third
/// order, sub-millimeter inside the zone).
pub fn lat_lng_to_utm(lon: f64, lat: f64, zone: u8, north: bool) -> (f64, f64) {
    let f = WGS84_FLATTENING;
    let n = f / (2.0 - f);
    let n2 = n * n;
    let n3 = n2 * n;
    let big_a = EARTH_RADIUS / (1.0 + n) * (1.0 + n2 / 4.0 + n2 * n2 / 64.0);
    let alpha = [
        n / 2.0 - 2.0 * n2 / 3.0 + 5.0 * n3 / 16.0,
        13.0 * n2 / 48.0 - 3.0 * n3 / 5.0,
        61.0 * n3 / 240.0,
    ];

    let central_meridian = (zone as f64 * 6.0 - 183.0).to_radians();
    let phi = lat.to_radians();
    let lambda = lon.to_radians() - central_meridian;

    let k = 2.0 * n.sqrt() / (1.0 + n);
    let t = (phi.sin().atanh() - k * (k * phi.sin()).atanh()).sinh();
    let xi = t.atan2(lambda.cos());
    let eta = (lambda.sin() / (1.0 + t * t).sqrt()).atanh();

    let mut easting = eta;
    let mut northing = xi;
    for (j, a) in alpha.iter().enumerate() {
        let m = 2.0 * (j as f64 + 1.0);
        easting += a * (m * xi).cos() * (m * eta).sinh();
        northing += a * (m * xi).sin() * (m * eta).cosh();
    }

    let false_northing = if north { 0.0 } else { UTM_FALSE_NORTHING_SOUTH };
    (
        UTM_FALSE_EASTING + UTM_SCALE * big_a * easting,
        false_northing + UTM_SCALE * big_a * northing,
    )
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LengthStats {
    pub measured: usize,
    /// Edges with a coordinate-less endpoint, or a non-finite projected length.
    pub skipped: usize,
}

/// Set `length_m` on every edge whose endpoints both have coordinates. Other
/// edges keep whatever length they had.
pub fn assign_lengths<P: DistanceProjection + ?Sized>(graph: &mut RoadGraph, proj: &P) -> LengthStats {
    let mut stats = LengthStats::default();

    for (edge, from, to) in graph.edges_with_endpoints_mut() {
        let endpoints = from
            .and_then(|n| n.position())
            .zip(to.and_then(|n| n.position()));

        let Some(((lon_a, lat_a), (lon_b, lat_b))) = endpoints else {
            stats.skipped += 1;
            continue;
        };

        let length = proj.distance_m(Point::new(lon_a, lat_a), Point::new(lon_b, lat_b));
        if !length.is_finite() {
            debug!("{}-{}: non-finite length, skipped", edge.from, edge.to);
            stats.skipped += 1;
            continue;
        }

        edge.length_m = Some(length.abs());
        stats.measured += 1;
    }

    if stats.skipped > 0 {
        debug!("{} edges left without length", stats.skipped);
    }

    stats
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::osm_types::{OsmNodeId, OsmWayId};
    use crate::road_graph::test_support::{attrs, n};

    fn approx(a: f64, b: f64, tol: f64) -> bool {
        (a - b).abs() <= tol
    }

    #[test]
    fn test_from_epsg() {
        assert_eq!(SpatialReference::from_epsg(4326), Ok(SpatialReference::Wgs84Geodesic));
        assert_eq!(SpatialReference::from_epsg(3857), Ok(SpatialReference::WebMercator));
        assert_eq!(
            SpatialReference::from_epsg(32651),
            Ok(SpatialReference::Utm { zone: 51, north: true })
        );
        assert_eq!(
            SpatialReference::from_epsg(32733),
            Ok(SpatialReference::Utm { zone: 33, north: false })
        );
        assert_eq!(
            SpatialReference::from_epsg(2154),
            Err(ProjectionError::UnsupportedEpsg(2154))
        );
        assert_eq!(
            SpatialReference::from_epsg(32661),
            Err(ProjectionError::UnsupportedEpsg(32661))
        );
        for code in [4326, 3857, 32601, 32760] {
            assert_eq!(SpatialReference::from_epsg(code).unwrap().epsg(), code);
        }
    }

    #[test]
    fn test_web_merc_origin() {
        let (x, y) = lat_lng_to_web_merc(0.0, 0.0);
        assert!(approx(x, 0.0, 1e-9));
        assert!(approx(y, 0.0, 1e-9));
    }

    #[test]
    fn test_utm_central_meridian() {
        // On the central meridian easting is exactly the false easting.
        let (e, _) = lat_lng_to_utm(3.0, 45.0, 31, true);
        assert!(approx(e, 500_000.0, 1e-6));

        // Known value: lon 3, lat 45 lies ~4_982_950 m north in zone 31N.
        let (_, north) = lat_lng_to_utm(3.0, 45.0, 31, true);
        assert!(approx(north, 4_982_950.4, 1.0), "{north}");

        let (_, south) = lat_lng_to_utm(3.0, -45.0, 31, false);
        assert!(approx(south, 10_000_000.0 - 4_982_950.4, 1.0), "{south}");
    }

    #[test]
    fn test_distances_agree_near_equator() {
        let a = Point::new(0.0, 0.0);
        let b = Point::new(0.001, 0.0);
        let geodesic = SpatialReference::Wgs84Geodesic.distance_m(a, b);
        let merc = SpatialReference::WebMercator.distance_m(a, b);
        assert!(approx(geodesic, 111.32, 0.01), "{geodesic}");
        assert!(approx(merc, 111.32, 0.01), "{merc}");
    }

    #[test]
    fn test_assign_lengths_skips_missing_coordinates() {
        let mut g = RoadGraph::new();
        g.upsert_node(n(1), 0.0, 0.0);
        g.upsert_node(n(2), 0.001, 0.0);
        g.upsert_edge(n(1), n(2), OsmWayId(1), attrs("primary", 2), None);
        g.upsert_edge(n(2), n(3), OsmWayId(1), attrs("primary", 2), None);

        let stats = assign_lengths(&mut g, &SpatialReference::WebMercator);
        assert_eq!(stats, LengthStats { measured: 1, skipped: 1 });

        let measured = g.edge(n(1), n(2)).unwrap().length_m.unwrap();
        assert!(approx(measured, 111.32, 0.01));
        assert_eq!(g.edge(OsmNodeId(2), OsmNodeId(3)).unwrap().length_m, None);
    }

    struct Fixed(f64);

    impl DistanceProjection for Fixed {
        fn distance_m(&self, _: Point<f64>, _: Point<f64>) -> f64 {
            self.0
        }
    }

    #[test]
    fn test_non_finite_lengths_are_skipped() {
        let mut g = RoadGraph::new();
        g.upsert_node(n(1), 0.0, 0.0);
        g.upsert_node(n(2), 0.0, 1.0);
        g.upsert_edge(n(1), n(2), OsmWayId(1), attrs("primary", 2), None);

        let stats = assign_lengths(&mut g, &Fixed(f64::INFINITY));
        assert_eq!(stats.skipped, 1);
        assert_eq!(g.edge(n(1), n(2)).unwrap().length_m, None);

        assign_lengths(&mut g, &Fixed(-5.0));
        assert_eq!(g.edge(n(1), n(2)).unwrap().length_m, Some(5.0));
    }
}
