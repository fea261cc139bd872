//! Candidate bridge/tunnel ways

use crate::{Error, Result, geometry};
use geo::{Coord, LineString, Point};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Whether a way is a bridge or a tunnel
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum BrunnelKind {
    Bridge,
    Tunnel,
}

impl BrunnelKind {
    /// Classify a way from its OSM tags
    ///
    /// A `bridge` tag with any value other than `no` wins over a `tunnel` tag.
    pub fn from_tags(tags: &BTreeMap<String, String>) -> Option<Self> {
        let is_set = |key: &str| tags.get(key).is_some_and(|v| v != "no");
        if is_set("bridge") {
            Some(BrunnelKind::Bridge)
        } else if is_set("tunnel") {
            Some(BrunnelKind::Tunnel)
        } else {
            None
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            BrunnelKind::Bridge => "bridge",
            BrunnelKind::Tunnel => "tunnel",
        }
    }
}

impl fmt::Display for BrunnelKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

impl FromStr for BrunnelKind {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "bridge" => Ok(BrunnelKind::Bridge),
            "tunnel" => Ok(BrunnelKind::Tunnel),
            other => Err(format!("unknown brunnel type: {other}")),
        }
    }
}

/// A candidate bridge or tunnel way with geometry cached at construction
#[derive(Clone, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Brunnel {
    id: i64,
    kind: BrunnelKind,
    name: String,
    tags: BTreeMap<String, String>,
    polyline: LineString<f64>,
    points: Vec<Point<f64>>,
}

#[cfg_attr(feature = "profiling", profiling::all_functions)]
impl Brunnel {
    /// Create a brunnel from its vertices
    ///
    /// Vertices outside the accepted coordinate range are dropped. The display name is
    /// taken from the `name` tag, then `ref`, and falls back to "Unnamed bridge/tunnel".
    ///
    /// # Returns
    /// The brunnel, or [`Error::BrunnelTooShort`] if fewer than 2 valid vertices remain
    pub fn new(
        id: i64,
        kind: BrunnelKind,
        tags: BTreeMap<String, String>,
        vertices: Vec<Coord<f64>>,
    ) -> Result<Self> {
        let total = vertices.len();
        let vertices: Vec<Coord<f64>> = vertices
            .into_iter()
            .filter(|&c| geometry::is_valid_coord(c))
            .collect();

        if vertices.len() < 2 {
            return Err(Error::BrunnelTooShort {
                id,
                count: vertices.len(),
            });
        }
        if vertices.len() < total {
            tracing::debug!(
                "Brunnel {}: dropped {} invalid vertices",
                id,
                total - vertices.len()
            );
        }

        let name = tags
            .get("name")
            .or_else(|| tags.get("ref"))
            .cloned()
            .unwrap_or_else(|| format!("Unnamed {kind}"));

        let points = vertices.iter().map(|&c| Point(c)).collect();

        Ok(Self {
            id,
            kind,
            name,
            tags,
            polyline: LineString::new(vertices),
            points,
        })
    }

    /// Replace the display name
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    #[inline]
    pub fn id(&self) -> i64 {
        self.id
    }

    #[inline]
    pub fn kind(&self) -> BrunnelKind {
        self.kind
    }

    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    pub fn tags(&self) -> &BTreeMap<String, String> {
        &self.tags
    }

    /// Vertices in way order
    #[inline]
    pub fn vertices(&self) -> &[Coord<f64>] {
        &self.polyline.0
    }

    #[inline]
    pub fn polyline(&self) -> &LineString<f64> {
        &self.polyline
    }

    /// Per-vertex point set
    #[inline]
    pub fn points(&self) -> &[Point<f64>] {
        &self.points
    }

    /// First and last vertex
    #[inline]
    pub fn endpoints(&self) -> Option<(Coord<f64>, Coord<f64>)> {
        Some((*self.polyline.0.first()?, *self.polyline.0.last()?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tags(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    fn c(lon: f64, lat: f64) -> Coord<f64> {
        Coord { x: lon, y: lat }
    }

    #[test]
    fn test_kind_from_tags() {
        assert_eq!(
            BrunnelKind::from_tags(&tags(&[("bridge", "yes")])),
            Some(BrunnelKind::Bridge)
        );
        assert_eq!(
            BrunnelKind::from_tags(&tags(&[("bridge", "viaduct"), ("tunnel", "yes")])),
            Some(BrunnelKind::Bridge)
        );
        assert_eq!(
            BrunnelKind::from_tags(&tags(&[("bridge", "no"), ("tunnel", "culvert")])),
            Some(BrunnelKind::Tunnel)
        );
        assert_eq!(BrunnelKind::from_tags(&tags(&[("highway", "primary")])), None);
    }

    #[test]
    fn test_kind_round_trip_through_strings() {
        assert_eq!("Tunnel".parse::<BrunnelKind>(), Ok(BrunnelKind::Tunnel));
        assert!("ford".parse::<BrunnelKind>().is_err());
        assert_eq!(BrunnelKind::Bridge.to_string(), "bridge");
    }

    #[test]
    fn test_brunnel_creation() {
        let brunnel = Brunnel::new(
            7,
            BrunnelKind::Bridge,
            tags(&[("name", "Tower Bridge")]),
            vec![c(-0.0754, 51.5055), c(-0.0753, 51.5045)],
        )
        .unwrap();

        assert_eq!(brunnel.id(), 7);
        assert_eq!(brunnel.name(), "Tower Bridge");
        assert_eq!(brunnel.vertices().len(), 2);
        assert_eq!(brunnel.points().len(), 2);
        assert_eq!(brunnel.points()[1].x(), -0.0753);
        let (first, last) = brunnel.endpoints().unwrap();
        assert_eq!(first, c(-0.0754, 51.5055));
        assert_eq!(last, c(-0.0753, 51.5045));
    }

    #[test]
    fn test_name_fallbacks() {
        let by_ref = Brunnel::new(
            1,
            BrunnelKind::Tunnel,
            tags(&[("ref", "T4")]),
            vec![c(0.0, 0.0), c(0.0, 0.001)],
        )
        .unwrap();
        assert_eq!(by_ref.name(), "T4");

        let unnamed = Brunnel::new(2, BrunnelKind::Tunnel, tags(&[]), vec![c(0.0, 0.0), c(0.0, 0.001)])
            .unwrap()
            .with_name("Renamed");
        assert_eq!(unnamed.name(), "Renamed");

        let plain = Brunnel::new(3, BrunnelKind::Bridge, tags(&[]), vec![c(0.0, 0.0), c(0.0, 0.001)])
            .unwrap();
        assert_eq!(plain.name(), "Unnamed bridge");
    }

    #[test]
    fn test_too_few_valid_vertices() {
        let result = Brunnel::new(
            9,
            BrunnelKind::Bridge,
            tags(&[]),
            vec![c(0.0, 0.0), c(0.0, 85.0), c(200.0, 0.0)],
        );
        assert!(matches!(
            result,
            Err(Error::BrunnelTooShort { id: 9, count: 1 })
        ));
    }
}
