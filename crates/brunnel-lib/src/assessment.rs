//! Per-candidate outcome threaded through the matching stages

use crate::Brunnel;
use std::fmt;

/// Position of a brunnel along the route, in reference-distance meters
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RouteSpan {
    pub start: f64,
    pub end: f64,
}

impl RouteSpan {
    /// Create a span from two distances in either order
    #[inline]
    pub fn new(a: f64, b: f64) -> Self {
        Self {
            start: a.min(b),
            end: a.max(b),
        }
    }

    /// Create a span from kilometers
    #[inline]
    pub fn from_km(start_km: f64, end_km: f64) -> Self {
        Self::new(start_km * 1000.0, end_km * 1000.0)
    }

    #[inline]
    pub fn length(&self) -> f64 {
        self.end - self.start
    }

    #[inline]
    pub fn start_km(&self) -> f64 {
        self.start / 1000.0
    }

    #[inline]
    pub fn end_km(&self) -> f64 {
        self.end / 1000.0
    }

    /// Open-interval overlap: spans that merely touch do not overlap
    #[inline]
    pub fn overlaps(&self, other: &RouteSpan) -> bool {
        !(self.end <= other.start || other.end <= self.start)
    }

    /// Smallest span covering both
    #[inline]
    pub fn union(&self, other: &RouteSpan) -> RouteSpan {
        RouteSpan {
            start: self.start.min(other.start),
            end: self.end.max(other.end),
        }
    }
}

/// Why a candidate was dropped
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum ExclusionReason {
    /// Some vertex lies outside the route buffer
    Outlier,
    /// No segment runs parallel to the route within tolerance
    Misaligned,
    /// Overlaps a candidate that lies closer to the route
    Alternative,
}

impl ExclusionReason {
    pub fn as_str(self) -> &'static str {
        match self {
            ExclusionReason::Outlier => "outlier",
            ExclusionReason::Misaligned => "misaligned",
            ExclusionReason::Alternative => "alternative",
        }
    }
}

impl fmt::Display for ExclusionReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Stage outcome for one candidate
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Status {
    /// Not yet placed on the route
    Pending,
    /// Placed on the route and still in the running
    Included(RouteSpan),
    /// Dropped by a stage; the span is kept when it was already known
    Excluded {
        reason: ExclusionReason,
        span: Option<RouteSpan>,
    },
}

/// A candidate together with its current stage outcome
#[derive(Clone, Copy, Debug)]
pub struct Assessment<'a> {
    pub brunnel: &'a Brunnel,
    pub status: Status,
}

impl<'a> Assessment<'a> {
    pub fn pending(brunnel: &'a Brunnel) -> Self {
        Self {
            brunnel,
            status: Status::Pending,
        }
    }

    #[inline]
    pub fn is_included(&self) -> bool {
        matches!(self.status, Status::Included(_))
    }

    #[inline]
    pub fn span(&self) -> Option<RouteSpan> {
        match self.status {
            Status::Pending => None,
            Status::Included(span) => Some(span),
            Status::Excluded { span, .. } => span,
        }
    }

    #[inline]
    pub fn exclusion(&self) -> Option<ExclusionReason> {
        match self.status {
            Status::Excluded { reason, .. } => Some(reason),
            _ => None,
        }
    }

    /// Same candidate, placed at `span`
    pub fn include(self, span: RouteSpan) -> Self {
        Self {
            status: Status::Included(span),
            ..self
        }
    }

    /// Same candidate, dropped for `reason`, keeping any known span
    pub fn exclude(self, reason: ExclusionReason) -> Self {
        Self {
            status: Status::Excluded {
                reason,
                span: self.span(),
            },
            ..self
        }
    }
}
