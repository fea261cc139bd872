//! Route-span projection
//!
//! Positions found by projecting onto the route polyline are great-circle distances, but
//! the route's own distances come from whatever produced the route (an ellipsoidal model,
//! map-matched lengths, ...). Spans must be expressed in the route's reference metric so
//! they line up with every other consumer of those distances. The conversion locates the
//! bracketing segment in the great-circle metric and interpolates the same fraction of
//! that segment in the reference metric.

use crate::geometry::nearest_point_on_polyline;
use crate::{Assessment, Brunnel, Route, RouteSpan, Status};
use geo::Coord;

/// Convert a great-circle location along the route polyline into a reference distance
///
/// The bracketing segment is the first one whose cumulative great-circle end reaches
/// `location`, or the last segment if none does. Zero-length segments interpolate at
/// their start.
pub fn to_reference_distance(route: &Route, location: f64) -> f64 {
    let arcs = route.arc_lengths();
    let points = route.points();
    let last_segment = arcs.len().saturating_sub(2);

    let segment = (0..arcs.len().saturating_sub(1))
        .find(|&i| arcs[i + 1] >= location)
        .unwrap_or(last_segment);

    let segment_length = arcs[segment + 1] - arcs[segment];
    let t = if segment_length > 0.0 {
        ((location - arcs[segment]) / segment_length).clamp(0.0, 1.0)
    } else {
        0.0
    };

    let start = points[segment].distance;
    let end = points[segment + 1].distance;
    start + t * (end - start)
}

/// Reference distance of the route position nearest to `coord`
pub fn locate(route: &Route, coord: Coord<f64>) -> Option<f64> {
    let nearest = nearest_point_on_polyline(route.polyline(), coord)?;
    Some(to_reference_distance(route, nearest.location))
}

/// Project a brunnel's first and last vertex onto the route
///
/// Returns `None` when the brunnel has no vertices.
pub fn project_span(route: &Route, brunnel: &Brunnel) -> Option<RouteSpan> {
    let (first, last) = brunnel.endpoints()?;
    let start = locate(route, first)?;
    let end = locate(route, last)?;
    Some(RouteSpan::new(start, end))
}

/// Place every pending candidate on the route
///
/// Candidates that cannot be projected stay pending and therefore never count as included.
pub fn apply<'a>(assessments: Vec<Assessment<'a>>, route: &Route) -> Vec<Assessment<'a>> {
    #[cfg(feature = "profiling")]
    profiling::scope!("projection::apply");

    assessments
        .into_iter()
        .map(|assessment| {
            if assessment.status != Status::Pending {
                return assessment;
            }
            match project_span(route, assessment.brunnel) {
                Some(span) => {
                    tracing::debug!(
                        "{} {} spans {:.1}-{:.1} m",
                        assessment.brunnel.kind(),
                        assessment.brunnel.id(),
                        span.start,
                        span.end
                    );
                    assessment.include(span)
                }
                None => {
                    tracing::warn!(
                        "{} {} could not be projected onto the route",
                        assessment.brunnel.kind(),
                        assessment.brunnel.id()
                    );
                    assessment
                }
            }
        })
        .collect()
}
