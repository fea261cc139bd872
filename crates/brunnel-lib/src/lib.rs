//! Brunnel Library - Matching Bridges and Tunnels Against a Route
//!
//! This library takes a GPS route with externally supplied cumulative distances and a set of
//! candidate bridge/tunnel ways ("brunnels"), and works out where along the route each
//! brunnel is actually crossed. Candidates that stray from the route, run across it, or
//! duplicate a closer candidate are excluded; split ways are merged back together.
//!
//! # Architecture
//!
//! - **[`geometry`]**: Spherical primitives (haversine, rhumb lines, projections, polygons)
//! - **[`Route`]**: Trackpoints with reference distances and a cached polyline
//! - **[`Brunnel`]**: One candidate way with cached geometry
//! - **[`BrunnelMatcher`]**: Runs the stages in order and produces a [`MatchReport`]
//!
//! # Pipeline
//!
//! 1. [`containment`]: drop candidates that leave the route buffer (`outlier`)
//! 2. [`projection`]: map each candidate onto the route's reference distances
//! 3. [`alignment`]: drop candidates crossing the route at an angle (`misaligned`)
//! 4. [`overlap`]: keep the closest of overlapping candidates (`alternative`)
//! 5. [`merge`]: join adjacent same-type candidates into one span
//!
//! Every stage is a pure function over the previous stage's [`Assessment`]s.

pub mod alignment;
mod assessment;
mod brunnel;
pub mod containment;
pub mod geometry;
mod matcher;
pub mod merge;
pub mod overlap;
pub mod projection;
mod route;

// Public API exports
pub use assessment::{Assessment, ExclusionReason, RouteSpan, Status};
pub use brunnel::{Brunnel, BrunnelKind};
pub use containment::{BufferPolygon, ContainmentStrategy, DistanceThreshold, Strategy};
pub use geometry::Units;
pub use matcher::{BrunnelMatcher, Config, MatchReport, MatchSummary};
pub use merge::AcceptedBrunnel;
pub use route::{Route, TrackPoint};

/// Error types for the brunnel library
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("GPX parsing error: {0}")]
    GpxParse(#[from] gpx::errors::GpxError),

    #[error("Route needs at least 2 valid points, got {0}")]
    RouteTooShort(usize),

    #[error("Brunnel {id} needs at least 2 valid vertices, got {count}")]
    BrunnelTooShort { id: i64, count: usize },

    #[error("Unknown distance unit: {0}")]
    UnknownUnit(String),

    #[error("Unknown containment strategy: {0}")]
    UnknownStrategy(String),
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_public_exports() {
        // Verify that all public types are accessible
        let _: fn(Config) -> BrunnelMatcher = BrunnelMatcher::new;
        let _: fn() -> Config = Config::default;
    }

    #[test]
    fn test_error_messages() {
        let err = Error::BrunnelTooShort { id: 42, count: 1 };
        assert_eq!(
            err.to_string(),
            "Brunnel 42 needs at least 2 valid vertices, got 1"
        );
        assert_eq!(
            Error::UnknownUnit("parsecs".into()).to_string(),
            "Unknown distance unit: parsecs"
        );
    }
}
