//! Input adapters
//!
//! Loads the route (GPX or JSON tuples) and the candidate ways (Overpass JSON), and builds
//! the Overpass QL query a caller would send to fetch those candidates.

use brunnel_lib::{Brunnel, BrunnelKind, Route, TrackPoint};
use geo::Coord;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

/// Errors raised while reading input files
#[derive(Debug, thiserror::Error)]
pub enum InputError {
    #[error(transparent)]
    Brunnel(#[from] brunnel_lib::Error),

    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Unsupported route format: {0} (expected .gpx or .json)")]
    UnsupportedFormat(String),
}

pub type Result<T> = std::result::Result<T, InputError>;

/// Load a route, picking the parser from the file extension
pub fn load_route(path: &Path) -> Result<Route> {
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase)
        .unwrap_or_default();

    let reader = || -> Result<BufReader<File>> { Ok(BufReader::new(File::open(path)?)) };
    let route = match extension.as_str() {
        "gpx" => Route::read_gpx(reader()?)?,
        "json" => read_route_json(reader()?)?,
        _ => return Err(InputError::UnsupportedFormat(path.display().to_string())),
    };

    tracing::info!(
        "Loaded route {} with {} points ({:.2} km)",
        path.display(),
        route.len(),
        route.total_distance() / 1000.0
    );
    Ok(route)
}

/// Parse a route from a JSON array of `[lat, lon, elevation, cumulativeMeters]` tuples
///
/// Elevation may be `null`.
pub fn read_route_json<R: Read>(reader: R) -> Result<Route> {
    let tuples: Vec<(f64, f64, Option<f64>, f64)> = serde_json::from_reader(reader)?;
    let points = tuples
        .into_iter()
        .map(|(lat, lon, ele, distance)| TrackPoint::new(lat, lon, ele, distance))
        .collect();
    Ok(Route::new(points)?)
}

#[derive(Debug, Deserialize)]
struct OverpassResponse {
    #[serde(default)]
    elements: Vec<OverpassElement>,
}

#[derive(Debug, Deserialize)]
struct OverpassElement {
    #[serde(rename = "type")]
    element_type: String,
    id: i64,
    #[serde(default)]
    tags: BTreeMap<String, String>,
    #[serde(default)]
    geometry: Vec<Option<OverpassNode>>,
}

#[derive(Debug, Deserialize)]
struct OverpassNode {
    lat: f64,
    lon: f64,
}

/// Load candidate brunnels from an Overpass JSON file
pub fn load_candidates(path: &Path) -> Result<Vec<Brunnel>> {
    let brunnels = read_candidates(BufReader::new(File::open(path)?))?;
    tracing::info!("Loaded {} candidates from {}", brunnels.len(), path.display());
    Ok(brunnels)
}

/// Parse candidate brunnels from an Overpass JSON response
///
/// Non-way elements and ways tagged as neither bridge nor tunnel are skipped. Ways left
/// with fewer than 2 valid vertices are discarded with a warning.
pub fn read_candidates<R: Read>(reader: R) -> Result<Vec<Brunnel>> {
    let response: OverpassResponse = serde_json::from_reader(reader)?;

    let mut brunnels = Vec::with_capacity(response.elements.len());
    for element in response.elements {
        if element.element_type != "way" {
            tracing::debug!("Skipping {} {}: not a way", element.element_type, element.id);
            continue;
        }
        let Some(kind) = BrunnelKind::from_tags(&element.tags) else {
            tracing::debug!("Skipping way {}: neither bridge nor tunnel", element.id);
            continue;
        };

        // Overpass emits null for nodes outside the query area
        let vertices = element
            .geometry
            .into_iter()
            .flatten()
            .map(|node| Coord {
                x: node.lon,
                y: node.lat,
            })
            .collect();

        match Brunnel::new(element.id, kind, element.tags, vertices) {
            Ok(brunnel) => brunnels.push(brunnel),
            Err(e) => tracing::warn!("Discarding candidate: {}", e),
        }
    }

    Ok(brunnels)
}

/// Overpass QL query fetching every bridge and tunnel way around the route
///
/// The area is the route bounding box padded by `buffer_m` meters.
pub fn overpass_query(route: &Route, buffer_m: f64) -> String {
    let bbox = route.bounding_box_with_buffer(buffer_m);
    let area = format!(
        "{:.6},{:.6},{:.6},{:.6}",
        bbox.min().y,
        bbox.min().x,
        bbox.max().y,
        bbox.max().x
    );

    format!(
        "[out:json][timeout:60];\n\
         (\n  \
         way[\"bridge\"][\"bridge\"!=\"no\"]({area});\n  \
         way[\"tunnel\"][\"tunnel\"!=\"no\"]({area});\n\
         );\n\
         out geom qt;\n"
    )
}
