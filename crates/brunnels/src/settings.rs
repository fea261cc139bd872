use brunnel_lib::{Config, Strategy, Units};
use clap::{Parser, ValueEnum};
use std::path::PathBuf;

/// How accepted brunnels are written to stdout
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// One aligned line per brunnel
    #[default]
    Text,
    /// JSON array of records
    Json,
}

#[derive(Parser, Debug, Clone)]
#[clap(author, version, about, long_about = None)]
/// Brunnels - Find the bridges and tunnels a GPS route actually crosses
pub struct Settings {
    /// Route file: GPX, or JSON array of [lat, lon, elevation, cumulativeMeters]
    #[clap(value_name = "ROUTE")]
    pub route: PathBuf,

    /// Overpass JSON response holding the candidate ways (`out geom`)
    #[clap(short, long, value_name = "FILE", required_unless_present = "print_query")]
    pub candidates: Option<PathBuf>,

    /// Maximum distance in meters between a brunnel and the route
    #[clap(long, default_value = "3.0")]
    pub containment_buffer: f64,

    /// Maximum bearing difference in degrees between a brunnel and the route
    #[clap(long, default_value = "20.0")]
    pub bearing_tolerance: f64,

    /// Padding in meters around the route bounding box for the candidate query
    #[clap(long, default_value = "10.0")]
    pub query_buffer: f64,

    /// Largest gap in meters between same-type brunnels that are merged
    #[clap(long, default_value = "1.0")]
    pub merge_gap: f64,

    /// Containment policy (distance, polygon)
    #[clap(long, default_value = "distance", value_parser = parse_strategy)]
    pub containment: Strategy,

    /// Units for printed distances (m, km, mi, nmi, ft)
    #[clap(short, long, default_value = "km", value_parser = parse_units)]
    pub units: Units,

    /// Output format
    #[clap(short, long, value_enum, default_value = "text")]
    pub format: OutputFormat,

    /// Print the Overpass QL query for the route area and exit
    #[clap(long, default_value = "false")]
    pub print_query: bool,

    /// Log every per-candidate decision
    #[clap(short, long, default_value = "false")]
    pub verbose: bool,
}

fn parse_strategy(s: &str) -> Result<Strategy, String> {
    s.parse().map_err(|e: brunnel_lib::Error| e.to_string())
}

fn parse_units(s: &str) -> Result<Units, String> {
    s.parse().map_err(|e: brunnel_lib::Error| e.to_string())
}

impl Settings {
    /// Matcher configuration for these settings
    pub fn config(&self) -> Config {
        Config {
            containment_buffer_m: self.containment_buffer,
            bearing_tolerance_deg: self.bearing_tolerance,
            query_buffer_m: self.query_buffer,
            merge_gap_m: self.merge_gap,
            containment: self.containment,
        }
    }
}
