//! BrunnelMatcher - Top-level entry point running every matching stage
//!
//! This module provides the high-level API: configure a matcher once, then run it against
//! a route and a freshly loaded candidate list. Each run is independent and deterministic.

use crate::merge::{self, AcceptedBrunnel};
use crate::{
    Assessment, Brunnel, BrunnelKind, ExclusionReason, Route, Strategy, alignment, containment,
    overlap, projection,
};
use std::fmt;

/// Configuration for a matching run
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct Config {
    /// Maximum distance in meters between any brunnel vertex and the route.
    /// Default: 3.0
    pub containment_buffer_m: f64,
    /// Maximum bearing difference in degrees for a brunnel to count as running along the
    /// route. Default: 20.0
    pub bearing_tolerance_deg: f64,
    /// Padding in meters around the route bounding box when querying candidates. Only used
    /// by whoever fetches candidates; the matcher itself ignores it. Default: 10.0
    pub query_buffer_m: f64,
    /// Largest gap in meters between same-type spans that are merged. Default: 1.0
    pub merge_gap_m: f64,
    /// Containment policy. Default: distance threshold
    pub containment: Strategy,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            containment_buffer_m: 3.0,
            bearing_tolerance_deg: 20.0,
            query_buffer_m: 10.0,
            merge_gap_m: merge::DEFAULT_MERGE_GAP_M,
            containment: Strategy::Distance,
        }
    }
}

/// Counts of candidates per outcome
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct MatchSummary {
    /// Number of candidates considered
    pub candidates: usize,
    pub outliers: usize,
    pub misaligned: usize,
    pub alternatives: usize,
    /// Candidates still included after all filters
    pub included: usize,
    /// Final entries after merging
    pub accepted_bridges: usize,
    pub accepted_tunnels: usize,
}

impl fmt::Display for MatchSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} candidates: {} included ({} bridges, {} tunnels after merging), \
             {} outliers, {} misaligned, {} alternatives",
            self.candidates,
            self.included,
            self.accepted_bridges,
            self.accepted_tunnels,
            self.outliers,
            self.misaligned,
            self.alternatives
        )
    }
}

/// Outcome of a matching run
#[derive(Debug, Clone)]
pub struct MatchReport<'a> {
    /// Final status of every candidate, in input order
    pub assessments: Vec<Assessment<'a>>,
    /// Accepted (merged) brunnels ordered by span start
    pub accepted: Vec<AcceptedBrunnel>,
}

impl<'a> MatchReport<'a> {
    /// Count candidates per outcome
    pub fn summary(&self) -> MatchSummary {
        let count = |reason: ExclusionReason| {
            self.assessments
                .iter()
                .filter(|a| a.exclusion() == Some(reason))
                .count()
        };
        let accepted = |kind: BrunnelKind| self.accepted.iter().filter(|a| a.kind == kind).count();

        MatchSummary {
            candidates: self.assessments.len(),
            outliers: count(ExclusionReason::Outlier),
            misaligned: count(ExclusionReason::Misaligned),
            alternatives: count(ExclusionReason::Alternative),
            included: self.assessments.iter().filter(|a| a.is_included()).count(),
            accepted_bridges: accepted(BrunnelKind::Bridge),
            accepted_tunnels: accepted(BrunnelKind::Tunnel),
        }
    }

    /// Candidates excluded for `reason`
    pub fn excluded(&self, reason: ExclusionReason) -> impl Iterator<Item = &Assessment<'a>> {
        self.assessments
            .iter()
            .filter(move |a| a.exclusion() == Some(reason))
    }
}

/// Runs containment, projection, alignment, overlap resolution and merging in order
#[derive(Debug, Clone, Default)]
pub struct BrunnelMatcher {
    config: Config,
}

#[cfg_attr(feature = "profiling", profiling::all_functions)]
impl BrunnelMatcher {
    /// Create a new matcher with the given configuration
    pub fn new(config: Config) -> Self {
        Self { config }
    }

    /// Get a reference to the configuration
    #[inline]
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Match `brunnels` against `route`
    pub fn run<'a>(&self, route: &Route, brunnels: &'a [Brunnel]) -> MatchReport<'a> {
        #[cfg(feature = "profiling")]
        profiling::scope!("matcher::run");

        let strategy = self
            .config
            .containment
            .build(route, self.config.containment_buffer_m);

        let assessments: Vec<Assessment<'a>> = brunnels.iter().map(Assessment::pending).collect();

        let assessments = containment::apply(assessments, route, strategy.as_ref());
        tracing::debug!(
            "Containment ({}, {} m): {} of {} candidates within buffer",
            strategy.name(),
            self.config.containment_buffer_m,
            assessments
                .iter()
                .filter(|a| a.exclusion().is_none())
                .count(),
            brunnels.len()
        );

        let assessments = projection::apply(assessments, route);
        let assessments = alignment::apply(assessments, route, self.config.bearing_tolerance_deg);
        let assessments = overlap::apply(assessments, route);
        let accepted = merge::merge_adjacent(&assessments, self.config.merge_gap_m);

        let report = MatchReport {
            assessments,
            accepted,
        };
        tracing::info!("{}", report.summary());
        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{RouteSpan, TrackPoint, geometry};
    use geo::Coord;
    use std::collections::BTreeMap;

    const M_PER_DEG: f64 = geometry::EARTH_RADIUS_M * std::f64::consts::PI / 180.0;

    /// Straight 1 km eastbound route with reference distances every 250 m
    fn create_test_route() -> Route {
        let references = [0.0, 250.0, 500.0, 750.0, 1000.0];
        let points = references
            .iter()
            .enumerate()
            .map(|(i, &reference)| {
                TrackPoint::new(0.0, i as f64 * 250.0 / M_PER_DEG, None, reference)
            })
            .collect();
        Route::new(points).unwrap()
    }

    /// Brunnel from `(east, north)` meter offsets relative to the route start
    fn create_test_brunnel(id: i64, kind: BrunnelKind, name: &str, offsets: &[(f64, f64)]) -> Brunnel {
        let tags = BTreeMap::from([("name".to_string(), name.to_string())]);
        let vertices = offsets
            .iter()
            .map(|&(east, north)| Coord {
                x: east / M_PER_DEG,
                y: north / M_PER_DEG,
            })
            .collect();
        Brunnel::new(id, kind, tags, vertices).unwrap()
    }

    #[test]
    fn test_single_bridge_at_midpoint() {
        let route = create_test_route();
        // 40 m bridge centred on the midpoint, ~1.4° off the route bearing
        let brunnels = vec![create_test_brunnel(
            1,
            BrunnelKind::Bridge,
            "Mid Bridge",
            &[(480.0, 0.5), (520.0, -0.5)],
        )];

        let matcher = BrunnelMatcher::new(Config::default());
        let report = matcher.run(&route, &brunnels);

        assert_eq!(report.accepted.len(), 1);
        let bridge = &report.accepted[0];
        assert_eq!(bridge.kind, BrunnelKind::Bridge);
        assert_eq!(bridge.name, "Mid Bridge");
        let centre = (bridge.span.start + bridge.span.end) / 2.0;
        assert!((centre - 500.0).abs() < 0.5);
        assert!((bridge.span.length() - 40.0).abs() < 0.5);
    }

    #[test]
    fn test_full_pipeline_outcomes() {
        let route = create_test_route();
        let brunnels = vec![
            // Kept
            create_test_brunnel(1, BrunnelKind::Bridge, "Close", &[(100.0, 1.0), (150.0, 1.0)]),
            // Same crossing, further away
            create_test_brunnel(2, BrunnelKind::Bridge, "Far", &[(105.0, 2.5), (145.0, 2.5)]),
            // Beyond the buffer
            create_test_brunnel(3, BrunnelKind::Tunnel, "Off", &[(300.0, 1.0), (350.0, 40.0)]),
            // Crosses the route
            create_test_brunnel(4, BrunnelKind::Bridge, "Over", &[(600.0, -2.0), (600.5, 2.0)]),
            // Two halves of one tunnel
            create_test_brunnel(5, BrunnelKind::Tunnel, "Tube", &[(800.0, 0.0), (850.0, 0.0)]),
            create_test_brunnel(6, BrunnelKind::Tunnel, "Tube", &[(850.0, 0.0), (900.0, 0.0)]),
        ];

        let report = BrunnelMatcher::new(Config::default()).run(&route, &brunnels);
        let status: Vec<Option<ExclusionReason>> =
            report.assessments.iter().map(|a| a.exclusion()).collect();
        assert_eq!(
            status,
            vec![
                None,
                Some(ExclusionReason::Alternative),
                Some(ExclusionReason::Outlier),
                Some(ExclusionReason::Misaligned),
                None,
                None,
            ]
        );

        assert_eq!(report.accepted.len(), 2);
        assert_eq!(report.accepted[0].id, 1);
        assert_eq!(report.accepted[1].member_ids, vec![5, 6]);
        assert_eq!(report.accepted[1].name, "Tube");
        assert!((report.accepted[1].span.start - 800.0).abs() < 0.01);
        assert!((report.accepted[1].span.end - 900.0).abs() < 0.01);

        let summary = report.summary();
        assert_eq!(
            summary,
            MatchSummary {
                candidates: 6,
                outliers: 1,
                misaligned: 1,
                alternatives: 1,
                included: 3,
                accepted_bridges: 1,
                accepted_tunnels: 1,
            }
        );
        assert_eq!(report.excluded(ExclusionReason::Outlier).count(), 1);
    }

    #[test]
    fn test_polygon_strategy_matches_distance_on_simple_route() {
        let route = create_test_route();
        let brunnels = vec![
            create_test_brunnel(1, BrunnelKind::Bridge, "Close", &[(100.0, 1.0), (150.0, 1.0)]),
            create_test_brunnel(2, BrunnelKind::Tunnel, "Off", &[(300.0, 1.0), (350.0, 40.0)]),
        ];

        let config = Config {
            containment: Strategy::Polygon,
            ..Config::default()
        };
        let report = BrunnelMatcher::new(config).run(&route, &brunnels);
        assert!(report.assessments[0].is_included());
        assert_eq!(
            report.assessments[1].exclusion(),
            Some(ExclusionReason::Outlier)
        );
    }

    #[test]
    fn test_runs_are_deterministic() {
        let route = create_test_route();
        let brunnels = vec![
            create_test_brunnel(1, BrunnelKind::Bridge, "A", &[(100.0, 1.0), (150.0, 1.0)]),
            create_test_brunnel(2, BrunnelKind::Bridge, "B", &[(105.0, 1.0), (145.0, 1.0)]),
        ];
        let matcher = BrunnelMatcher::new(Config::default());
        let first = matcher.run(&route, &brunnels);
        let second = matcher.run(&route, &brunnels);
        assert_eq!(first.accepted, second.accepted);
    }

    #[test]
    fn test_empty_candidates() {
        let route = create_test_route();
        let report = BrunnelMatcher::default().run(&route, &[]);
        assert!(report.accepted.is_empty());
        assert_eq!(report.summary(), MatchSummary::default());
    }

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.containment, Strategy::Distance);
        assert_eq!(config.merge_gap_m, 1.0);
        let span = RouteSpan::new(0.0, 1.0);
        assert!(span.length() > 0.0);
    }
}
