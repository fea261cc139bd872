//! Spherical geometry primitives
//!
//! Coordinates are `geo::Coord<f64>` with `x` = longitude and `y` = latitude, both in
//! degrees. All angle math happens in radians internally; every public function takes and
//! returns degrees. Distances are great-circle distances on a sphere of
//! [`EARTH_RADIUS_M`] unless stated otherwise.

use crate::{Error, Result};
use geo::{BoundingRect, Coord, LineString, Polygon};
use std::f64::consts::{FRAC_PI_2, FRAC_PI_4, PI};
use std::fmt;
use std::str::FromStr;

/// Mean Earth radius in meters used by every spherical computation
pub const EARTH_RADIUS_M: f64 = 6_371_008.8;

/// Denominators below this magnitude are treated as parallel / degenerate
pub const PARALLEL_EPSILON: f64 = 1e-12;

/// Latitude limit for accepted coordinates (poles excluded for rhumb-line math)
pub const MAX_LATITUDE: f64 = 80.0;

/// Longitude limit for accepted coordinates
pub const MAX_LONGITUDE: f64 = 180.0;

/// Distance units accepted at the API boundary
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum Units {
    Meters,
    #[default]
    Kilometers,
    Miles,
    NauticalMiles,
    Feet,
    Radians,
    Degrees,
}

impl Units {
    /// Length of one unit in meters
    pub fn meters_per_unit(self) -> f64 {
        match self {
            Units::Meters => 1.0,
            Units::Kilometers => 1000.0,
            Units::Miles => 1609.344,
            Units::NauticalMiles => 1852.0,
            Units::Feet => 0.3048,
            Units::Radians => EARTH_RADIUS_M,
            Units::Degrees => EARTH_RADIUS_M * PI / 180.0,
        }
    }

    /// Convert a length in meters into this unit
    #[inline]
    pub fn from_meters(self, meters: f64) -> f64 {
        meters / self.meters_per_unit()
    }

    /// Convert a length in this unit into meters
    #[inline]
    pub fn to_meters(self, value: f64) -> f64 {
        value * self.meters_per_unit()
    }

    /// Short label for display
    pub fn as_str(self) -> &'static str {
        match self {
            Units::Meters => "m",
            Units::Kilometers => "km",
            Units::Miles => "mi",
            Units::NauticalMiles => "nmi",
            Units::Feet => "ft",
            Units::Radians => "rad",
            Units::Degrees => "deg",
        }
    }
}

impl fmt::Display for Units {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Units {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "m" | "meter" | "meters" | "metre" | "metres" => Ok(Units::Meters),
            "km" | "kilometer" | "kilometers" | "kilometre" | "kilometres" => {
                Ok(Units::Kilometers)
            }
            "mi" | "mile" | "miles" => Ok(Units::Miles),
            "nmi" | "nauticalmiles" | "nautical-miles" => Ok(Units::NauticalMiles),
            "ft" | "foot" | "feet" => Ok(Units::Feet),
            "rad" | "radian" | "radians" => Ok(Units::Radians),
            "deg" | "degree" | "degrees" => Ok(Units::Degrees),
            _ => Err(Error::UnknownUnit(s.to_string())),
        }
    }
}

/// Result of projecting a point onto a polyline
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NearestPoint {
    /// Closest point on the polyline
    pub point: Coord<f64>,
    /// Great-circle distance along the polyline from its first vertex to `point`, in meters
    pub location: f64,
    /// Great-circle distance from the query point to `point`, in meters
    pub distance: f64,
    /// Index of the segment (`coords[i]..coords[i + 1]`) holding `point`
    pub segment_index: usize,
}

/// Check that a coordinate is finite and within the accepted latitude/longitude range
#[inline]
pub fn is_valid_coord(coord: Coord<f64>) -> bool {
    coord.x.is_finite()
        && coord.y.is_finite()
        && coord.x.abs() <= MAX_LONGITUDE
        && coord.y.abs() <= MAX_LATITUDE
}

/// Wrap a longitude into [-180, 180)
#[inline]
pub fn normalize_longitude(lon: f64) -> f64 {
    (lon + 180.0).rem_euclid(360.0) - 180.0
}

/// Central angle between two coordinates in radians (haversine formula)
#[inline]
fn central_angle(a: Coord<f64>, b: Coord<f64>) -> f64 {
    let lat1 = a.y.to_radians();
    let lat2 = b.y.to_radians();
    let delta_lat = (b.y - a.y).to_radians();
    let delta_lon = (b.x - a.x).to_radians();

    let h = (delta_lat / 2.0).sin().powi(2)
        + lat1.cos() * lat2.cos() * (delta_lon / 2.0).sin().powi(2);
    2.0 * h.sqrt().atan2((1.0 - h).sqrt())
}

/// Great-circle distance between two coordinates in meters
#[inline]
pub fn distance(a: Coord<f64>, b: Coord<f64>) -> f64 {
    central_angle(a, b) * EARTH_RADIUS_M
}

/// Great-circle distance between two coordinates expressed in `units`
#[inline]
pub fn distance_in(a: Coord<f64>, b: Coord<f64>, units: Units) -> f64 {
    units.from_meters(distance(a, b))
}

/// Cumulative great-circle distance at every vertex of a polyline
///
/// The first entry is always 0; the vector has the same length as the polyline.
pub fn cumulative_distances(line: &LineString<f64>) -> Vec<f64> {
    let mut cumulative = Vec::with_capacity(line.0.len());
    let mut total = 0.0;
    let mut prev: Option<Coord<f64>> = None;
    for &coord in &line.0 {
        if let Some(prev) = prev {
            total += distance(prev, coord);
        }
        cumulative.push(total);
        prev = Some(coord);
    }
    cumulative
}

/// Shortest signed longitude difference, taking the short way across the anti-meridian
#[inline]
fn wrap_longitude_delta(delta_lon: f64) -> f64 {
    if delta_lon > 180.0 {
        delta_lon - 360.0
    } else if delta_lon < -180.0 {
        delta_lon + 360.0
    } else {
        delta_lon
    }
}

/// Mercator-stretched latitude used by the rhumb-line formulas
#[inline]
fn stretched_latitude(phi: f64) -> f64 {
    (phi / 2.0 + FRAC_PI_4).tan().ln()
}

/// Constant-bearing (rhumb line) heading from `from` to `to`, in degrees [0, 360)
pub fn rhumb_bearing(from: Coord<f64>, to: Coord<f64>) -> f64 {
    let phi1 = from.y.to_radians();
    let phi2 = to.y.to_radians();

    let delta_lon = wrap_longitude_delta(to.x - from.x);
    let delta_psi = stretched_latitude(phi2) - stretched_latitude(phi1);
    let theta = delta_lon.to_radians().atan2(delta_psi);

    (theta.to_degrees() + 360.0) % 360.0
}

/// Point reached by travelling `distance_m` meters from `origin` along a rhumb line
/// with constant heading `bearing` (degrees)
pub fn rhumb_destination(origin: Coord<f64>, distance_m: f64, bearing: f64) -> Coord<f64> {
    let delta = distance_m / EARTH_RADIUS_M;
    let lambda1 = origin.x.to_radians();
    let phi1 = origin.y.to_radians();
    let theta = bearing.to_radians();

    let delta_phi = delta * theta.cos();
    let mut phi2 = phi1 + delta_phi;
    // Going past a pole reflects back
    if phi2.abs() > FRAC_PI_2 {
        phi2 = if phi2 > 0.0 { PI - phi2 } else { -PI - phi2 };
    }

    let delta_psi = stretched_latitude(phi2) - stretched_latitude(phi1);
    // E-W course: the stretched ratio is ill-conditioned
    let q = if delta_psi.abs() > 1e-11 {
        delta_phi / delta_psi
    } else {
        phi1.cos()
    };

    let delta_lambda = delta * theta.sin() / q;
    let lambda2 = lambda1 + delta_lambda;

    Coord {
        x: normalize_longitude(lambda2.to_degrees()),
        y: phi2.to_degrees(),
    }
}

/// Undirected angular difference between two bearings, in degrees [0, 90]
///
/// Opposite headings fold onto each other, so a way drawn against the direction of
/// travel still counts as parallel.
#[inline]
pub fn bearing_difference(b1: f64, b2: f64) -> f64 {
    let mut diff = (b1 - b2).abs() % 360.0;
    if diff > 180.0 {
        diff = 360.0 - diff;
    }
    if diff > 90.0 {
        diff = (180.0 - diff).abs();
    }
    diff
}

/// Orthogonal projection of `point` onto segment `a..b`, clamped to the segment
///
/// The projection is done in a local equirectangular frame centred on `point` so that
/// longitude degrees are scaled to the same length as latitude degrees.
fn project_onto_segment(point: Coord<f64>, a: Coord<f64>, b: Coord<f64>) -> Coord<f64> {
    let kx = point.y.to_radians().cos();
    let delta_lon = wrap_longitude_delta(b.x - a.x);
    let dx = delta_lon * kx;
    let dy = b.y - a.y;
    let len2 = dx * dx + dy * dy;
    if len2 <= 0.0 {
        return a;
    }

    let px = wrap_longitude_delta(point.x - a.x) * kx;
    let t = ((px * dx + (point.y - a.y) * dy) / len2).clamp(0.0, 1.0);

    let mut x = a.x + t * delta_lon;
    if x.abs() > MAX_LONGITUDE {
        x = normalize_longitude(x);
    }
    Coord {
        x,
        y: a.y + t * (b.y - a.y),
    }
}

/// Find the point on `line` closest to `point`
///
/// Every segment is tested; the first minimum in traversal order wins on exact ties.
/// Returns `None` for an empty polyline. A single-vertex polyline yields that vertex.
pub fn nearest_point_on_polyline(line: &LineString<f64>, point: Coord<f64>) -> Option<NearestPoint> {
    let coords = &line.0;
    let first = *coords.first()?;

    if coords.len() == 1 {
        return Some(NearestPoint {
            point: first,
            location: 0.0,
            distance: distance(point, first),
            segment_index: 0,
        });
    }

    let mut best: Option<NearestPoint> = None;
    let mut travelled = 0.0;

    for (index, pair) in coords.windows(2).enumerate() {
        let (a, b) = (pair[0], pair[1]);
        let projected = project_onto_segment(point, a, b);
        let dist = distance(point, projected);

        if best.is_none_or(|current| dist < current.distance) {
            best = Some(NearestPoint {
                point: projected,
                location: travelled + distance(a, projected),
                distance: dist,
                segment_index: index,
            });
        }

        travelled += distance(a, b);
    }

    best
}

/// Check whether `point` lies on segment `a..b` (planar, degree space)
fn on_segment(point: Coord<f64>, a: Coord<f64>, b: Coord<f64>) -> bool {
    let cross = (b.x - a.x) * (point.y - a.y) - (b.y - a.y) * (point.x - a.x);
    if cross.abs() > PARALLEL_EPSILON {
        return false;
    }
    point.x >= a.x.min(b.x)
        && point.x <= a.x.max(b.x)
        && point.y >= a.y.min(b.y)
        && point.y <= a.y.max(b.y)
}

fn on_ring_boundary(ring: &LineString<f64>, point: Coord<f64>) -> bool {
    ring.lines().any(|line| on_segment(point, line.start, line.end))
}

/// Even-odd ray casting against a closed ring
fn ring_contains(ring: &LineString<f64>, point: Coord<f64>) -> bool {
    let mut inside = false;
    for line in ring.lines() {
        let (a, b) = (line.start, line.end);
        if (a.y > point.y) != (b.y > point.y) {
            let crossing_x = (b.x - a.x) * (point.y - a.y) / (b.y - a.y) + a.x;
            if point.x < crossing_x {
                inside = !inside;
            }
        }
    }
    inside
}

/// Point-in-polygon test by ray casting
///
/// Points on the exterior boundary count as inside; points inside a hole or on a hole's
/// boundary count as outside.
pub fn point_in_polygon(point: Coord<f64>, polygon: &Polygon<f64>) -> bool {
    let Some(bbox) = polygon.bounding_rect() else {
        return false;
    };
    if point.x < bbox.min().x
        || point.x > bbox.max().x
        || point.y < bbox.min().y
        || point.y > bbox.max().y
    {
        return false;
    }

    let exterior = polygon.exterior();
    if !on_ring_boundary(exterior, point) && !ring_contains(exterior, point) {
        return false;
    }

    !polygon
        .interiors()
        .iter()
        .any(|hole| on_ring_boundary(hole, point) || ring_contains(hole, point))
}

/// Intersection point of segments `p1..p2` and `p3..p4`
///
/// Returns `None` for parallel segments (|denominator| < [`PARALLEL_EPSILON`]) or when the
/// crossing lies outside either segment.
pub fn segment_intersect(
    p1: Coord<f64>,
    p2: Coord<f64>,
    p3: Coord<f64>,
    p4: Coord<f64>,
) -> Option<Coord<f64>> {
    let denom = (p4.y - p3.y) * (p2.x - p1.x) - (p4.x - p3.x) * (p2.y - p1.y);
    if denom.abs() < PARALLEL_EPSILON {
        return None;
    }

    let ua = ((p4.x - p3.x) * (p1.y - p3.y) - (p4.y - p3.y) * (p1.x - p3.x)) / denom;
    let ub = ((p2.x - p1.x) * (p1.y - p3.y) - (p2.y - p1.y) * (p1.x - p3.x)) / denom;
    if !(0.0..=1.0).contains(&ua) || !(0.0..=1.0).contains(&ub) {
        return None;
    }

    Some(Coord {
        x: p1.x + ua * (p2.x - p1.x),
        y: p1.y + ua * (p2.y - p1.y),
    })
}
