//! Containment filter: is a candidate close enough to the route to be on it?
//!
//! Two policies are available behind [`ContainmentStrategy`]:
//!
//! - [`DistanceThreshold`] measures every vertex against the route line directly. This is
//!   the default.
//! - [`BufferPolygon`] builds an offset polygon around the route from rhumb-line
//!   destinations (bevelled at turns) and tests polygon containment plus boundary
//!   crossings. It is numerically fragile at sharp turns, where the offset ring can fold
//!   over itself, and is kept as an alternative policy.

use crate::geometry::{self, nearest_point_on_polyline, point_in_polygon, segment_intersect};
use crate::{Assessment, Brunnel, Error, ExclusionReason, Result, Route, Status};
use geo::{Coord, LineString, Polygon};
use std::fmt;
use std::str::FromStr;

/// Decides whether a brunnel lies within the route buffer
pub trait ContainmentStrategy {
    /// Short name used in logs
    fn name(&self) -> &'static str;

    /// Whether `brunnel` is contained in the buffer around `route`
    fn contains(&self, route: &Route, brunnel: &Brunnel) -> bool;
}

/// Every vertex must be within `buffer_m` meters of the route line
#[derive(Clone, Copy, Debug)]
pub struct DistanceThreshold {
    pub buffer_m: f64,
}

impl DistanceThreshold {
    pub fn new(buffer_m: f64) -> Self {
        Self { buffer_m }
    }
}

impl ContainmentStrategy for DistanceThreshold {
    fn name(&self) -> &'static str {
        "distance"
    }

    fn contains(&self, route: &Route, brunnel: &Brunnel) -> bool {
        brunnel.vertices().iter().all(|&vertex| {
            nearest_point_on_polyline(route.polyline(), vertex)
                .is_some_and(|nearest| nearest.distance <= self.buffer_m)
        })
    }
}

/// Offset polygon around the route, built once per route
#[derive(Clone, Debug)]
pub struct BufferPolygon {
    polygon: Polygon<f64>,
}

impl BufferPolygon {
    /// Build the buffer polygon for `route`
    ///
    /// The left side is walked forward and the right side backward; interior vertices get
    /// one offset per adjacent segment (a bevel). Ends are cut flat.
    pub fn new(route: &Route, buffer_m: f64) -> Self {
        let mut coords: Vec<Coord<f64>> = Vec::with_capacity(route.len());
        for &coord in &route.polyline().0 {
            if coords.last() != Some(&coord) {
                coords.push(coord);
            }
        }

        if coords.len() < 2 {
            return Self {
                polygon: Polygon::new(LineString::new(Vec::new()), Vec::new()),
            };
        }

        let bearings: Vec<f64> = coords
            .windows(2)
            .map(|pair| geometry::rhumb_bearing(pair[0], pair[1]))
            .collect();

        let mut left = Vec::with_capacity(coords.len() * 2);
        let mut right = Vec::with_capacity(coords.len() * 2);
        let last = coords.len() - 1;

        for (i, &coord) in coords.iter().enumerate() {
            let adjacent: &[f64] = if i == 0 {
                &bearings[..1]
            } else if i == last {
                &bearings[last - 1..]
            } else {
                &bearings[i - 1..=i]
            };
            for &bearing in adjacent {
                left.push(geometry::rhumb_destination(coord, buffer_m, bearing - 90.0));
                right.push(geometry::rhumb_destination(coord, buffer_m, bearing + 90.0));
            }
        }

        left.extend(right.into_iter().rev());
        Self {
            polygon: Polygon::new(LineString::new(left), Vec::new()),
        }
    }

    /// The buffer polygon
    #[inline]
    pub fn polygon(&self) -> &Polygon<f64> {
        &self.polygon
    }

    fn crosses_boundary(&self, brunnel: &Brunnel) -> bool {
        brunnel.vertices().windows(2).any(|segment| {
            self.polygon.exterior().lines().any(|edge| {
                segment_intersect(segment[0], segment[1], edge.start, edge.end).is_some()
            })
        })
    }
}

impl ContainmentStrategy for BufferPolygon {
    fn name(&self) -> &'static str {
        "polygon"
    }

    fn contains(&self, _route: &Route, brunnel: &Brunnel) -> bool {
        brunnel
            .vertices()
            .iter()
            .all(|&vertex| point_in_polygon(vertex, &self.polygon))
            && !self.crosses_boundary(brunnel)
    }
}

/// Containment policy selector, as found in configuration
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum Strategy {
    #[default]
    Distance,
    Polygon,
}

impl Strategy {
    /// Instantiate the policy for a route and buffer
    pub fn build(self, route: &Route, buffer_m: f64) -> Box<dyn ContainmentStrategy> {
        match self {
            Strategy::Distance => Box::new(DistanceThreshold::new(buffer_m)),
            Strategy::Polygon => Box::new(BufferPolygon::new(route, buffer_m)),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Strategy::Distance => "distance",
            Strategy::Polygon => "polygon",
        }
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Strategy {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "distance" => Ok(Strategy::Distance),
            "polygon" => Ok(Strategy::Polygon),
            _ => Err(Error::UnknownStrategy(s.to_string())),
        }
    }
}

/// Exclude pending candidates that are not contained, with reason `outlier`
///
/// Candidates in any other state pass through untouched.
pub fn apply<'a>(
    assessments: Vec<Assessment<'a>>,
    route: &Route,
    strategy: &dyn ContainmentStrategy,
) -> Vec<Assessment<'a>> {
    #[cfg(feature = "profiling")]
    profiling::scope!("containment::apply");

    assessments
        .into_iter()
        .map(|assessment| match assessment.status {
            Status::Pending if !strategy.contains(route, assessment.brunnel) => {
                tracing::debug!(
                    "{} {} ({}) leaves the route buffer [{}]",
                    assessment.brunnel.kind(),
                    assessment.brunnel.id(),
                    assessment.brunnel.name(),
                    strategy.name()
                );
                assessment.exclude(ExclusionReason::Outlier)
            }
            _ => assessment,
        })
        .collect()
}
