//! Alignment filter: a brunnel on the route must run roughly parallel to it
//!
//! Ways that pass the containment buffer but cross the route (a bridge the rider passes
//! under, say) are rejected here by comparing rhumb-line bearings of the brunnel's segments
//! with those of the route segments inside its span.

use crate::geometry::{bearing_difference, rhumb_bearing};
use crate::{Assessment, Brunnel, ExclusionReason, Route, RouteSpan, Status};
use geo::Coord;

/// Rhumb bearings of all non-degenerate segments
fn segment_bearings(coords: &[Coord<f64>]) -> Vec<f64> {
    coords
        .windows(2)
        .filter(|pair| pair[0] != pair[1])
        .map(|pair| rhumb_bearing(pair[0], pair[1]))
        .collect()
}

/// Smallest undirected bearing difference between any brunnel segment and any route
/// segment within `span`
///
/// Returns `None` when either side has no usable segment.
pub fn min_bearing_difference(route: &Route, brunnel: &Brunnel, span: RouteSpan) -> Option<f64> {
    let window: Vec<Coord<f64>> = route.points()[route.window(span.start, span.end)]
        .iter()
        .map(|p| p.coord)
        .collect();

    let route_bearings = segment_bearings(&window);
    let brunnel_bearings = segment_bearings(brunnel.vertices());

    brunnel_bearings
        .iter()
        .flat_map(|&b1| route_bearings.iter().map(move |&b2| bearing_difference(b1, b2)))
        .min_by(f64::total_cmp)
}

/// Whether any brunnel segment runs within `tolerance_deg` of a route segment in its span
///
/// Without at least one segment on each side there is nothing to compare and the brunnel
/// counts as aligned.
pub fn is_aligned(route: &Route, brunnel: &Brunnel, span: RouteSpan, tolerance_deg: f64) -> bool {
    min_bearing_difference(route, brunnel, span).is_none_or(|diff| diff <= tolerance_deg)
}

/// Exclude included candidates that are not aligned, with reason `misaligned`
pub fn apply<'a>(
    assessments: Vec<Assessment<'a>>,
    route: &Route,
    tolerance_deg: f64,
) -> Vec<Assessment<'a>> {
    #[cfg(feature = "profiling")]
    profiling::scope!("alignment::apply");

    assessments
        .into_iter()
        .map(|assessment| match assessment.status {
            Status::Included(span) if !is_aligned(route, assessment.brunnel, span, tolerance_deg) => {
                tracing::debug!(
                    "{} {} ({}) is misaligned with the route (best {:.1}° > {:.1}°)",
                    assessment.brunnel.kind(),
                    assessment.brunnel.id(),
                    assessment.brunnel.name(),
                    min_bearing_difference(route, assessment.brunnel, span).unwrap_or_default(),
                    tolerance_deg
                );
                assessment.exclude(ExclusionReason::Misaligned)
            }
            _ => assessment,
        })
        .collect()
}
