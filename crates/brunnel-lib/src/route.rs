//! Route storage module
//!
//! This module provides the `Route` struct holding the rider's trackpoints together with
//! the reference distances supplied by whatever produced the route, plus geometry derived
//! once during construction.

use crate::{Error, Result, geometry};
use geo::{Coord, Distance, Geodesic, LineString, Point, Rect};
use std::ops::Range;

/// A single route point with its externally supplied cumulative distance
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TrackPoint {
    /// Longitude (`x`) and latitude (`y`) in degrees
    pub coord: Coord<f64>,
    /// Elevation in meters, carried through but not used for matching
    pub elevation: Option<f64>,
    /// Cumulative distance from the route start in meters (reference metric)
    pub distance: f64,
}

impl TrackPoint {
    /// Create a trackpoint from the `[lat, lon, ele, distance]` order used by route sources
    pub fn new(lat: f64, lon: f64, elevation: Option<f64>, distance: f64) -> Self {
        Self {
            coord: Coord { x: lon, y: lat },
            elevation,
            distance,
        }
    }
}

/// Represents the rider's route with reference distances and precomputed geometry
#[derive(Clone, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Route {
    /// Trackpoints in travel order
    points: Vec<TrackPoint>,
    /// Polyline through all trackpoints
    polyline: LineString<f64>,
    /// Cumulative great-circle distance at each trackpoint (engine metric)
    arc_lengths: Vec<f64>,
    /// Bounding box in degrees
    bounding_box: Rect<f64>,
}

#[cfg_attr(feature = "profiling", profiling::all_functions)]
impl Route {
    /// Create a new Route from trackpoints
    ///
    /// Points with coordinates outside the accepted range are skipped with a warning.
    /// Reference distances are expected to be non-decreasing; this is not verified.
    ///
    /// # Returns
    /// The route, or [`Error::RouteTooShort`] if fewer than 2 valid points remain
    pub fn new(points: Vec<TrackPoint>) -> Result<Self> {
        #[cfg(feature = "profiling")]
        profiling::scope!("route::new");

        let total = points.len();
        let points: Vec<TrackPoint> = points
            .into_iter()
            .filter(|p| {
                let valid = geometry::is_valid_coord(p.coord) && p.distance.is_finite();
                if !valid {
                    tracing::warn!(
                        "Skipping invalid route point: ({}, {}) at {} m",
                        p.coord.y,
                        p.coord.x,
                        p.distance
                    );
                }
                valid
            })
            .collect();

        if points.len() < 2 {
            return Err(Error::RouteTooShort(points.len()));
        }
        if points.len() < total {
            tracing::debug!("Kept {} of {} route points", points.len(), total);
        }

        let polyline: LineString<f64> = points.iter().map(|p| p.coord).collect();
        let arc_lengths = geometry::cumulative_distances(&polyline);
        let bounding_box = Self::compute_bounding_box(&points);

        Ok(Route {
            points,
            polyline,
            arc_lengths,
            bounding_box,
        })
    }

    /// Create a Route from GPX data
    ///
    /// All track segments are concatenated in order. Reference distances are accumulated
    /// on the WGS84 ellipsoid, which is the metric GPX-consuming tools usually report.
    pub fn from_gpx(gpx_data: &gpx::Gpx) -> Result<Self> {
        let mut points = Vec::new();
        let mut cumulative = 0.0;
        let mut prev: Option<Point<f64>> = None;

        for track in &gpx_data.tracks {
            for segment in &track.segments {
                for waypoint in &segment.points {
                    let point = waypoint.point();
                    if !geometry::is_valid_coord(point.0) {
                        tracing::warn!(
                            "Skipping GPX point outside accepted bounds: ({}, {})",
                            point.y(),
                            point.x()
                        );
                        continue;
                    }
                    if let Some(prev) = prev {
                        cumulative += Geodesic.distance(prev, point);
                    }
                    points.push(TrackPoint::new(
                        point.y(),
                        point.x(),
                        waypoint.elevation,
                        cumulative,
                    ));
                    prev = Some(point);
                }
            }
        }

        Self::new(points)
    }

    /// Parse GPX from a reader and build a Route from it
    pub fn read_gpx<R: std::io::Read>(reader: R) -> Result<Self> {
        let gpx_data = gpx::read(reader)?;
        Self::from_gpx(&gpx_data)
    }

    fn compute_bounding_box(points: &[TrackPoint]) -> Rect<f64> {
        let mut min_x = f64::INFINITY;
        let mut min_y = f64::INFINITY;
        let mut max_x = f64::NEG_INFINITY;
        let mut max_y = f64::NEG_INFINITY;

        for p in points {
            min_x = min_x.min(p.coord.x);
            min_y = min_y.min(p.coord.y);
            max_x = max_x.max(p.coord.x);
            max_y = max_y.max(p.coord.y);
        }

        Rect::new(Coord { x: min_x, y: min_y }, Coord { x: max_x, y: max_y })
    }

    /// All trackpoints in travel order
    #[inline]
    pub fn points(&self) -> &[TrackPoint] {
        &self.points
    }

    /// Number of trackpoints
    #[inline]
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Always false for a constructed route; present for API symmetry with `len`
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Polyline through all trackpoints
    #[inline]
    pub fn polyline(&self) -> &LineString<f64> {
        &self.polyline
    }

    /// Cumulative great-circle distance at each trackpoint in meters
    #[inline]
    pub fn arc_lengths(&self) -> &[f64] {
        &self.arc_lengths
    }

    /// Reference distance of trackpoint `index` in meters
    #[inline]
    pub fn reference_distance(&self, index: usize) -> Option<f64> {
        self.points.get(index).map(|p| p.distance)
    }

    /// Total route length in the reference metric (last trackpoint's distance)
    #[inline]
    pub fn total_distance(&self) -> f64 {
        self.points.last().map_or(0.0, |p| p.distance)
    }

    /// Total route length along the polyline in great-circle meters
    #[inline]
    pub fn great_circle_length(&self) -> f64 {
        self.arc_lengths.last().copied().unwrap_or(0.0)
    }

    /// Bounding box in degrees (`x` = longitude, `y` = latitude)
    #[inline]
    pub fn bounding_box(&self) -> Rect<f64> {
        self.bounding_box
    }

    /// Bounding box grown by `buffer_m` meters on every side
    ///
    /// Longitude padding uses the latitude furthest from the equator so the buffer is never
    /// undersized. Latitudes are clamped to the accepted range.
    pub fn bounding_box_with_buffer(&self, buffer_m: f64) -> Rect<f64> {
        let bbox = self.bounding_box;
        let delta_lat = geometry::Units::Degrees.from_meters(buffer_m);
        let extreme_lat = bbox.min().y.abs().max(bbox.max().y.abs());
        let delta_lon = delta_lat / extreme_lat.to_radians().cos();

        Rect::new(
            Coord {
                x: (bbox.min().x - delta_lon).max(-geometry::MAX_LONGITUDE),
                y: (bbox.min().y - delta_lat).max(-geometry::MAX_LATITUDE),
            },
            Coord {
                x: (bbox.max().x + delta_lon).min(geometry::MAX_LONGITUDE),
                y: (bbox.max().y + delta_lat).min(geometry::MAX_LATITUDE),
            },
        )
    }

    /// Trackpoint index range whose reference distances fall within `[start_m, end_m]`
    ///
    /// Found by linear scan. A single trackpoint inside is widened by one neighbour on
    /// each side. With none inside, the window becomes the trackpoints bracketing the
    /// interval. At least one route segment is always returned.
    pub fn window(&self, start_m: f64, end_m: f64) -> Range<usize> {
        let n = self.points.len();
        let first = self.points.iter().position(|p| p.distance >= start_m);
        let last = self.points.iter().rposition(|p| p.distance <= end_m);

        match (first, last) {
            (Some(first), Some(last)) if last > first => return first..last + 1,
            (Some(first), Some(last)) if last == first => {
                return first.saturating_sub(1)..(first + 1).min(n - 1) + 1;
            }
            _ => {}
        }

        let lo = self
            .points
            .iter()
            .rposition(|p| p.distance <= start_m)
            .unwrap_or(0);
        let hi = self
            .points
            .iter()
            .position(|p| p.distance >= end_m)
            .unwrap_or(n - 1);

        let hi = hi.max(lo + 1).min(n - 1);
        let lo = lo.min(hi - 1);
        lo..hi + 1
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gpx::{Gpx, Track, TrackSegment, Waypoint};

    /// Straight northbound route with evenly spaced reference distances
    fn create_test_route() -> Route {
        let points = (0..5)
            .map(|i| TrackPoint::new(51.5 + i as f64 * 0.001, -0.1, None, i as f64 * 100.0))
            .collect();
        Route::new(points).unwrap()
    }

    fn create_test_waypoint(lat: f64, lon: f64) -> Waypoint {
        Waypoint::new(geo::Point::new(lon, lat))
    }

    #[test]
    fn test_route_creation() {
        let route = create_test_route();
        assert_eq!(route.len(), 5);
        assert_eq!(route.polyline().0.len(), 5);
        assert_eq!(route.arc_lengths().len(), 5);
        assert_eq!(route.total_distance(), 400.0);
    }

    #[test]
    fn test_short_route_fails() {
        let result = Route::new(vec![TrackPoint::new(51.5, -0.1, None, 0.0)]);
        assert!(matches!(result, Err(Error::RouteTooShort(1))));
        assert!(Route::new(Vec::new()).is_err());
    }

    #[test]
    fn test_invalid_points_are_skipped() {
        let points = vec![
            TrackPoint::new(51.5, -0.1, None, 0.0),
            TrackPoint::new(89.0, -0.1, None, 50.0),
            TrackPoint::new(51.501, -0.1, None, 100.0),
        ];
        let route = Route::new(points).unwrap();
        assert_eq!(route.len(), 2);
        assert_eq!(route.reference_distance(1), Some(100.0));
    }

    #[test]
    fn test_great_circle_length() {
        let route = create_test_route();
        // 0.004 degrees of latitude
        let expected = geometry::Units::Degrees.to_meters(0.004);
        assert!((route.great_circle_length() - expected).abs() < 1e-6);
    }

    #[test]
    fn test_window_inside() {
        let route = create_test_route();
        assert_eq!(route.window(100.0, 300.0), 1..4);
        assert_eq!(route.window(50.0, 350.0), 1..4);
    }

    #[test]
    fn test_window_expands_when_too_small() {
        let route = create_test_route();
        // Between two trackpoints: bracketing pair
        assert_eq!(route.window(120.0, 180.0), 1..3);
        // A single trackpoint inside: one neighbour on each side
        assert_eq!(route.window(150.0, 250.0), 1..4);
        // Also when that trackpoint sits exactly on a window bound
        assert_eq!(route.window(200.0, 250.0), 1..4);
        assert_eq!(route.window(150.0, 200.0), 1..4);
        assert_eq!(route.window(200.0, 200.0), 1..4);
        // At the route ends only one neighbour exists
        assert_eq!(route.window(0.0, 50.0), 0..2);
        assert_eq!(route.window(350.0, 400.0), 3..5);
        // Before the start and past the end
        assert_eq!(route.window(-10.0, -5.0), 0..2);
        assert_eq!(route.window(500.0, 600.0), 3..5);
    }

    #[test]
    fn test_bounding_box_with_buffer() {
        let route = create_test_route();
        let bbox = route.bounding_box();
        let padded = route.bounding_box_with_buffer(100.0);
        assert!(padded.min().y < bbox.min().y);
        assert!(padded.max().x > bbox.max().x);
        let lat_pad = bbox.min().y - padded.min().y;
        assert!((geometry::Units::Degrees.to_meters(lat_pad) - 100.0).abs() < 1e-6);
    }

    #[test]
    fn test_from_gpx_uses_ellipsoidal_reference() {
        let mut gpx = Gpx::default();
        let mut track = Track::default();
        let mut segment = TrackSegment::default();
        segment.points.push(create_test_waypoint(51.5074, -0.1278));
        segment.points.push(create_test_waypoint(51.5084, -0.1278));
        segment.points.push(create_test_waypoint(51.5094, -0.1278));
        track.segments.push(segment);
        gpx.tracks.push(track);

        let route = Route::from_gpx(&gpx).unwrap();
        assert_eq!(route.len(), 3);
        assert_eq!(route.reference_distance(0), Some(0.0));

        // Ellipsoidal and spherical lengths are close but not identical
        let reference = route.total_distance();
        let spherical = route.great_circle_length();
        assert!(reference > 0.0);
        assert!((reference - spherical).abs() < 2.0);
        assert!((reference - spherical).abs() > 1e-6);
    }

    #[test]
    fn test_empty_gpx_fails() {
        let gpx = Gpx::default();
        assert!(matches!(Route::from_gpx(&gpx), Err(Error::RouteTooShort(0))));
    }
}
