//! Adjacency merge
//!
//! OSM ways are routinely split at arbitrary nodes, so one physical bridge can arrive as
//! several consecutive candidates. Same-type candidates whose spans touch (within a small
//! gap) are folded into a single accepted brunnel.

use crate::{Assessment, Brunnel, BrunnelKind, RouteSpan};

/// Default largest gap in meters between spans that are still considered adjacent
pub const DEFAULT_MERGE_GAP_M: f64 = 1.0;

/// Final result entry: one or more merged candidates occupying one span
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct AcceptedBrunnel {
    /// Id of the first member along the route
    pub id: i64,
    pub kind: BrunnelKind,
    /// Distinct member names joined with `"; "`
    pub name: String,
    pub span: RouteSpan,
    /// Ids of all merged members in route order
    pub member_ids: Vec<i64>,
}

impl AcceptedBrunnel {
    /// Whether this entry was built from more than one candidate
    #[inline]
    pub fn is_merged(&self) -> bool {
        self.member_ids.len() > 1
    }
}

/// A run of adjacent candidates still open for merging
struct Group {
    id: i64,
    kind: BrunnelKind,
    span: RouteSpan,
    member_ids: Vec<i64>,
    /// Distinct member names in route order
    names: Vec<String>,
}

impl Group {
    fn start(brunnel: &Brunnel, span: RouteSpan) -> Self {
        Self {
            id: brunnel.id(),
            kind: brunnel.kind(),
            span,
            member_ids: vec![brunnel.id()],
            names: vec![brunnel.name().to_string()],
        }
    }

    fn absorb(&mut self, brunnel: &Brunnel, span: RouteSpan) {
        self.span = self.span.union(&span);
        self.member_ids.push(brunnel.id());
        if !self.names.iter().any(|name| name == brunnel.name()) {
            self.names.push(brunnel.name().to_string());
        }
    }

    fn finish(self) -> AcceptedBrunnel {
        AcceptedBrunnel {
            id: self.id,
            kind: self.kind,
            name: self.names.join("; "),
            span: self.span,
            member_ids: self.member_ids,
        }
    }
}

/// Merge adjacent included candidates per type
///
/// Candidates of different types never merge. The result is ordered by span start.
pub fn merge_adjacent(assessments: &[Assessment<'_>], max_gap_m: f64) -> Vec<AcceptedBrunnel> {
    #[cfg(feature = "profiling")]
    profiling::scope!("merge::merge_adjacent");

    let mut accepted = Vec::new();

    for kind in [BrunnelKind::Bridge, BrunnelKind::Tunnel] {
        let mut included: Vec<(&Brunnel, RouteSpan)> = assessments
            .iter()
            .filter(|a| a.is_included() && a.brunnel.kind() == kind)
            .filter_map(|a| Some((a.brunnel, a.span()?)))
            .collect();
        included.sort_by(|a, b| a.1.start.total_cmp(&b.1.start));

        let mut current: Option<Group> = None;
        for (brunnel, span) in included {
            match current.as_mut() {
                Some(group) if span.start - group.span.end <= max_gap_m => {
                    group.absorb(brunnel, span);
                }
                _ => {
                    if let Some(done) = current.replace(Group::start(brunnel, span)) {
                        accepted.push(done.finish());
                    }
                }
            }
        }
        accepted.extend(current.map(Group::finish));
    }

    accepted.sort_by(|a, b| a.span.start.total_cmp(&b.span.start));

    let merged = accepted.iter().filter(|a| a.is_merged()).count();
    if merged > 0 {
        tracing::debug!("Merged adjacent candidates into {} spans", merged);
    }

    accepted
}
