//! Geometry primitives
//!
//! All coordinates are WGS84 degrees. Polygon tests treat longitude/latitude
//! as planar x/y, which is adequate at the scale of a protection contour or a
//! venue footprint. Distances use the haversine great-circle formula.

use serde::{Deserialize, Serialize};

/// Mean Earth radius in metres (IUGG)
pub const EARTH_RADIUS_M: f64 = 6_371_008.8;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeoPoint {
    pub latitude: f64,
    pub longitude: f64,
}

impl GeoPoint {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self { latitude, longitude }
    }

    pub fn is_valid(&self) -> bool {
        self.latitude.is_finite()
            && self.longitude.is_finite()
            && (-90.0..=90.0).contains(&self.latitude)
            && (-180.0..=180.0).contains(&self.longitude)
    }

    /// Great-circle distance in metres
    pub fn distance_m(&self, other: &GeoPoint) -> f64 {
        let lat1 = self.latitude.to_radians();
        let lat2 = other.latitude.to_radians();
        let dlat = lat2 - lat1;
        let dlon = (other.longitude - self.longitude).to_radians();

        let a = (dlat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (dlon / 2.0).sin().powi(2);
        2.0 * EARTH_RADIUS_M * a.sqrt().atan2((1.0 - a).sqrt())
    }
}

/// Point location with an uncertainty ellipse, as PAWS reports it
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Ellipse {
    pub center: GeoPoint,
    #[serde(default)]
    pub semi_major_axis: f64,
    #[serde(default)]
    pub semi_minor_axis: f64,
    #[serde(default)]
    pub orientation: f64,
}

impl Ellipse {
    pub fn at(center: GeoPoint) -> Self {
        Self {
            center,
            semi_major_axis: 0.0,
            semi_minor_axis: 0.0,
            orientation: 0.0,
        }
    }

    /// Combined location uncertainty in metres
    pub fn uncertainty_m(&self) -> f64 {
        (self.semi_major_axis.powi(2) + self.semi_minor_axis.powi(2)).sqrt()
    }
}

/// Simple polygon given by its exterior ring (closing vertex optional)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Polygon {
    pub exterior: Vec<GeoPoint>,
}

impl Polygon {
    pub fn new(exterior: Vec<GeoPoint>) -> Self {
        Self { exterior }
    }

    /// Ray-casting containment test. Points on an edge may fall either way.
    pub fn contains(&self, point: &GeoPoint) -> bool {
        let ring = &self.exterior;
        if ring.len() < 3 {
            return false;
        }

        let (x, y) = (point.longitude, point.latitude);
        let mut inside = false;
        let mut j = ring.len() - 1;
        for i in 0..ring.len() {
            let (xi, yi) = (ring[i].longitude, ring[i].latitude);
            let (xj, yj) = (ring[j].longitude, ring[j].latitude);
            if (yi > y) != (yj > y) && x < (xj - xi) * (y - yi) / (yj - yi) + xi {
                inside = !inside;
            }
            j = i;
        }
        inside
    }

    /// Edges as vertex pairs, closing the ring
    pub fn edges(&self) -> impl Iterator<Item = (&GeoPoint, &GeoPoint)> {
        let n = self.exterior.len();
        (0..n).map(move |i| (&self.exterior[i], &self.exterior[(i + 1) % n]))
    }

    pub fn intersects(&self, other: &Polygon) -> bool {
        if self.exterior.iter().any(|p| other.contains(p))
            || other.exterior.iter().any(|p| self.contains(p))
        {
            return true;
        }
        self.edges()
            .any(|(a, b)| other.edges().any(|(c, d)| segments_intersect(a, b, c, d)))
    }

    /// Vertex average; good enough as a representative point for convex shapes
    pub fn centroid(&self) -> Option<GeoPoint> {
        if self.exterior.is_empty() {
            return None;
        }
        let n = self.exterior.len() as f64;
        let (lat, lon) = self
            .exterior
            .iter()
            .fold((0.0, 0.0), |(lat, lon), p| (lat + p.latitude, lon + p.longitude));
        Some(GeoPoint::new(lat / n, lon / n))
    }
}

fn orientation(a: &GeoPoint, b: &GeoPoint, c: &GeoPoint) -> f64 {
    (b.longitude - a.longitude) * (c.latitude - a.latitude)
        - (b.latitude - a.latitude) * (c.longitude - a.longitude)
}

fn on_segment(a: &GeoPoint, b: &GeoPoint, p: &GeoPoint) -> bool {
    p.longitude >= a.longitude.min(b.longitude)
        && p.longitude <= a.longitude.max(b.longitude)
        && p.latitude >= a.latitude.min(b.latitude)
        && p.latitude <= a.latitude.max(b.latitude)
}

fn segments_intersect(a: &GeoPoint, b: &GeoPoint, c: &GeoPoint, d: &GeoPoint) -> bool {
    let o1 = orientation(a, b, c);
    let o2 = orientation(a, b, d);
    let o3 = orientation(c, d, a);
    let o4 = orientation(c, d, b);

    if (o1 > 0.0) != (o2 > 0.0) && (o3 > 0.0) != (o4 > 0.0) && o1 != 0.0 && o2 != 0.0 {
        return true;
    }

    (o1 == 0.0 && on_segment(a, b, c))
        || (o2 == 0.0 && on_segment(a, b, d))
        || (o3 == 0.0 && on_segment(c, d, a))
        || (o4 == 0.0 && on_segment(c, d, b))
}

/// PAWS geolocation: a point with uncertainty or a polygon region
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum GeoLocation {
    Point(Ellipse),
    Region(Polygon),
}

impl GeoLocation {
    pub fn point(latitude: f64, longitude: f64) -> Self {
        GeoLocation::Point(Ellipse::at(GeoPoint::new(latitude, longitude)))
    }

    /// Representative point used for propagation and distance checks
    pub fn center(&self) -> Option<GeoPoint> {
        match self {
            GeoLocation::Point(ellipse) => Some(ellipse.center),
            GeoLocation::Region(polygon) => polygon.centroid(),
        }
    }

    pub fn uncertainty_m(&self) -> f64 {
        match self {
            GeoLocation::Point(ellipse) => ellipse.uncertainty_m(),
            GeoLocation::Region(_) => 0.0,
        }
    }
}

/// Area occupied by an incumbent or an exclusion zone
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Shape {
    Point(GeoPoint),
    MultiPoint(Vec<GeoPoint>),
    Polygon(Polygon),
}

impl Shape {
    pub fn points(&self) -> &[GeoPoint] {
        match self {
            Shape::Point(p) => std::slice::from_ref(p),
            Shape::MultiPoint(points) => points,
            Shape::Polygon(polygon) => &polygon.exterior,
        }
    }

    /// Geometric overlap: point-set membership or polygon intersection
    pub fn intersects(&self, other: &Shape) -> bool {
        match (self, other) {
            (Shape::Polygon(a), Shape::Polygon(b)) => a.intersects(b),
            (Shape::Polygon(poly), points) | (points, Shape::Polygon(poly)) => {
                points.points().iter().any(|p| poly.contains(p))
            }
            (a, b) => a.points().iter().any(|p| b.points().contains(p)),
        }
    }
}

/// Latitude/longitude rectangle used for coarse store queries
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BoundingBox {
    pub min_latitude: f64,
    pub min_longitude: f64,
    pub max_latitude: f64,
    pub max_longitude: f64,
}

impl BoundingBox {
    /// Smallest box containing the circle of `radius_m` around `center`
    pub fn around(center: &GeoPoint, radius_m: f64) -> Self {
        let dlat = (radius_m / EARTH_RADIUS_M).to_degrees();
        let cos_lat = center.latitude.to_radians().cos().abs().max(1e-6);
        let dlon = (dlat / cos_lat).min(180.0);
        Self {
            min_latitude: (center.latitude - dlat).max(-90.0),
            min_longitude: center.longitude - dlon,
            max_latitude: (center.latitude + dlat).min(90.0),
            max_longitude: center.longitude + dlon,
        }
    }

    pub fn contains(&self, point: &GeoPoint) -> bool {
        (self.min_latitude..=self.max_latitude).contains(&point.latitude)
            && (self.min_longitude..=self.max_longitude).contains(&point.longitude)
    }
}

/// National grid reference in metres
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GridRef {
    pub easting: f64,
    pub northing: f64,
}

impl GridRef {
    /// Snap to the south-west corner of a `cell_m` grid square
    pub fn bucket(&self, cell_m: u32) -> (i64, i64) {
        let cell = f64::from(cell_m.max(1));
        (
            ((self.easting / cell).floor() * cell) as i64,
            ((self.northing / cell).floor() * cell) as i64,
        )
    }
}

// Airy 1830 ellipsoid and national grid true origin
const AIRY_A: f64 = 6_377_563.396;
const AIRY_B: f64 = 6_356_256.909;
const GRID_F0: f64 = 0.999_601_271_7;
const GRID_LAT0_DEG: f64 = 49.0;
const GRID_LON0_DEG: f64 = -2.0;
const GRID_E0: f64 = 400_000.0;
const GRID_N0: f64 = -100_000.0;

/// Transverse Mercator projection onto the national grid.
///
/// No datum shift is applied; the WGS84/OSGB36 offset (~100 m) is below the
/// resolution of the clutter raster.
pub fn to_national_grid(point: &GeoPoint) -> GridRef {
    let phi = point.latitude.to_radians();
    let lambda = point.longitude.to_radians();
    let phi0 = GRID_LAT0_DEG.to_radians();
    let lambda0 = GRID_LON0_DEG.to_radians();

    let (a, b, f0) = (AIRY_A, AIRY_B, GRID_F0);
    let e2 = 1.0 - (b * b) / (a * a);
    let n = (a - b) / (a + b);
    let (n2, n3) = (n * n, n * n * n);

    let sin_phi = phi.sin();
    let cos_phi = phi.cos();
    let tan_phi = phi.tan();
    let tan2 = tan_phi * tan_phi;
    let tan4 = tan2 * tan2;

    let nu = a * f0 / (1.0 - e2 * sin_phi * sin_phi).sqrt();
    let rho = a * f0 * (1.0 - e2) / (1.0 - e2 * sin_phi * sin_phi).powf(1.5);
    let eta2 = nu / rho - 1.0;

    let dphi = phi - phi0;
    let sphi = phi + phi0;
    let m = b
        * f0
        * ((1.0 + n + 1.25 * n2 + 1.25 * n3) * dphi
            - (3.0 * n + 3.0 * n2 + 2.625 * n3) * dphi.sin() * sphi.cos()
            + (1.875 * n2 + 1.875 * n3) * (2.0 * dphi).sin() * (2.0 * sphi).cos()
            - (35.0 / 24.0) * n3 * (3.0 * dphi).sin() * (3.0 * sphi).cos());

    let i = m + GRID_N0;
    let ii = nu / 2.0 * sin_phi * cos_phi;
    let iii = nu / 24.0 * sin_phi * cos_phi.powi(3) * (5.0 - tan2 + 9.0 * eta2);
    let iiia = nu / 720.0 * sin_phi * cos_phi.powi(5) * (61.0 - 58.0 * tan2 + tan4);
    let iv = nu * cos_phi;
    let v = nu / 6.0 * cos_phi.powi(3) * (nu / rho - tan2);
    let vi = nu / 120.0
        * cos_phi.powi(5)
        * (5.0 - 18.0 * tan2 + tan4 + 14.0 * eta2 - 58.0 * tan2 * eta2);

    let dl = lambda - lambda0;
    GridRef {
        northing: i + ii * dl.powi(2) + iii * dl.powi(4) + iiia * dl.powi(6),
        easting: GRID_E0 + iv * dl + v * dl.powi(3) + vi * dl.powi(5),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn square(lat: f64, lon: f64, size: f64) -> Polygon {
        Polygon::new(vec![
            GeoPoint::new(lat, lon),
            GeoPoint::new(lat, lon + size),
            GeoPoint::new(lat + size, lon + size),
            GeoPoint::new(lat + size, lon),
        ])
    }

    #[test]
    fn test_distance_one_degree_latitude() {
        let a = GeoPoint::new(51.0, -1.0);
        let b = GeoPoint::new(52.0, -1.0);
        let d = a.distance_m(&b);
        assert!((d - 111_195.0).abs() < 100.0, "got {d}");
    }

    #[test]
    fn test_polygon_contains() {
        let poly = square(51.0, -1.0, 1.0);
        assert!(poly.contains(&GeoPoint::new(51.5, -0.5)));
        assert!(!poly.contains(&GeoPoint::new(52.5, -0.5)));
        assert!(!Polygon::new(vec![]).contains(&GeoPoint::new(0.0, 0.0)));
    }

    #[test]
    fn test_polygon_intersection() {
        let a = square(51.0, -1.0, 1.0);
        let overlapping = square(51.5, -0.5, 1.0);
        let disjoint = square(53.0, 1.0, 1.0);
        // Crossing bars: no vertex of either lies inside the other
        let bar_a = Polygon::new(vec![
            GeoPoint::new(0.0, 2.0),
            GeoPoint::new(0.0, 3.0),
            GeoPoint::new(5.0, 3.0),
            GeoPoint::new(5.0, 2.0),
        ]);
        let bar_b = Polygon::new(vec![
            GeoPoint::new(2.0, 0.0),
            GeoPoint::new(2.0, 5.0),
            GeoPoint::new(3.0, 5.0),
            GeoPoint::new(3.0, 0.0),
        ]);

        assert!(a.intersects(&overlapping));
        assert!(!a.intersects(&disjoint));
        assert!(bar_a.intersects(&bar_b));
    }

    #[test]
    fn test_shape_intersection_points_against_polygon() {
        let zone = Shape::Polygon(square(51.0, -1.0, 1.0));
        let inside = Shape::MultiPoint(vec![GeoPoint::new(60.0, 0.0), GeoPoint::new(51.2, -0.8)]);
        let outside = Shape::Point(GeoPoint::new(40.0, 0.0));

        assert!(zone.intersects(&inside));
        assert!(inside.intersects(&zone));
        assert!(!zone.intersects(&outside));
    }

    #[test]
    fn test_bounding_box_covers_circle() {
        let center = GeoPoint::new(51.5, -0.1);
        let bbox = BoundingBox::around(&center, 10_000.0);
        let north = GeoPoint::new(51.5 + 0.089, -0.1);
        let east = GeoPoint::new(51.5, -0.1 + 0.14);

        assert!(bbox.contains(&north));
        assert!(bbox.contains(&east));
        assert!(!bbox.contains(&GeoPoint::new(51.7, -0.1)));
    }

    #[test]
    fn test_national_grid_london() {
        // Charing Cross is about TQ 30030 80350 (530030, 180350)
        let grid = to_national_grid(&GeoPoint::new(51.5074, -0.1278));
        assert!((grid.easting - 530_000.0).abs() < 2_000.0, "easting {}", grid.easting);
        assert!((grid.northing - 180_400.0).abs() < 2_000.0, "northing {}", grid.northing);
    }

    #[test]
    fn test_grid_bucket() {
        let grid = GridRef {
            easting: 530_049.9,
            northing: 180_399.0,
        };
        assert_eq!(grid.bucket(100), (530_000, 180_300));
    }

    #[test]
    fn test_uncertainty() {
        let ellipse = Ellipse {
            center: GeoPoint::new(0.0, 0.0),
            semi_major_axis: 30.0,
            semi_minor_axis: 40.0,
            orientation: 0.0,
        };
        assert_eq!(ellipse.uncertainty_m(), 50.0);
    }
}
