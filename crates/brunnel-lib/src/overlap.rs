//! Overlap resolution
//!
//! OSM often carries several ways for one physical crossing (both carriageways of a bridge,
//! a railway bridge next to the road bridge, ...). When the spans of included candidates
//! overlap, only the one hugging the route most closely survives; the rest are excluded as
//! `alternative`.

use crate::geometry::nearest_point_on_polyline;
use crate::{Assessment, Brunnel, ExclusionReason, Route, RouteSpan, Status};

/// Mean distance in meters from the brunnel's vertices to their nearest route positions
pub fn average_distance(route: &Route, brunnel: &Brunnel) -> f64 {
    let distances: Vec<f64> = brunnel
        .vertices()
        .iter()
        .filter_map(|&vertex| nearest_point_on_polyline(route.polyline(), vertex))
        .map(|nearest| nearest.distance)
        .collect();

    if distances.is_empty() {
        return f64::INFINITY;
    }
    distances.iter().sum::<f64>() / distances.len() as f64
}

/// Cluster spans into overlap groups
///
/// Spans are visited in order of their start; each joins the first group holding a member
/// it overlaps, otherwise it opens a new group. Returned groups hold indices into `spans`.
pub fn group_overlapping(spans: &[RouteSpan]) -> Vec<Vec<usize>> {
    let mut order: Vec<usize> = (0..spans.len()).collect();
    order.sort_by(|&a, &b| spans[a].start.total_cmp(&spans[b].start));

    let mut groups: Vec<Vec<usize>> = Vec::new();
    for index in order {
        let span = &spans[index];
        match groups
            .iter_mut()
            .find(|group| group.iter().any(|&member| spans[member].overlaps(span)))
        {
            Some(group) => group.push(index),
            None => groups.push(vec![index]),
        }
    }
    groups
}

/// Keep only the closest candidate of every overlap group
pub fn apply<'a>(mut assessments: Vec<Assessment<'a>>, route: &Route) -> Vec<Assessment<'a>> {
    #[cfg(feature = "profiling")]
    profiling::scope!("overlap::apply");

    let (positions, spans): (Vec<usize>, Vec<RouteSpan>) = assessments
        .iter()
        .enumerate()
        .filter_map(|(position, assessment)| match assessment.status {
            Status::Included(span) => Some((position, span)),
            _ => None,
        })
        .unzip();

    for group in group_overlapping(&spans) {
        if group.len() < 2 {
            continue;
        }

        let distances: Vec<f64> = group
            .iter()
            .map(|&member| average_distance(route, assessments[positions[member]].brunnel))
            .collect();

        // First minimum in group order wins
        let mut keep = 0;
        for (i, &distance) in distances.iter().enumerate() {
            if distance < distances[keep] {
                keep = i;
            }
        }

        let kept = assessments[positions[group[keep]]].brunnel;
        tracing::debug!(
            "Overlap group of {}: keeping {} {} ({:.1} m from route)",
            group.len(),
            kept.kind(),
            kept.id(),
            distances[keep]
        );

        for (i, &member) in group.iter().enumerate() {
            if i != keep {
                let position = positions[member];
                assessments[position] = assessments[position].exclude(ExclusionReason::Alternative);
            }
        }
    }

    assessments
}
