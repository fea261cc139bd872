//! Brunnels - Command-line application
//!
//! Loads a route and a set of candidate ways, runs the matcher from `brunnel-lib` and
//! prints the bridges and tunnels the route actually crosses.

pub mod input;
pub mod logging;
pub mod report;
pub mod settings;

use brunnel_lib::{BrunnelMatcher, ExclusionReason};
use settings::{OutputFormat, Settings};
use std::io::Write;

/// Run the application, writing the report to `out`
#[cfg_attr(feature = "profiling", profiling::function)]
pub fn run<W: Write>(settings: &Settings, mut out: W) -> input::Result<()> {
    let config = settings.config();
    let route = input::load_route(&settings.route)?;

    if settings.print_query {
        write!(out, "{}", input::overpass_query(&route, config.query_buffer_m))?;
        return Ok(());
    }

    // Clap only allows a missing candidates file together with --print-query
    let Some(candidates_path) = settings.candidates.as_deref() else {
        return Ok(());
    };
    let brunnels = input::load_candidates(candidates_path)?;

    let matcher = BrunnelMatcher::new(config);
    let match_report = matcher.run(&route, &brunnels);

    for reason in [
        ExclusionReason::Outlier,
        ExclusionReason::Misaligned,
        ExclusionReason::Alternative,
    ] {
        let excluded = match_report.excluded(reason).count();
        if excluded > 0 {
            tracing::info!("Excluded {} candidates as {}", excluded, reason);
        }
    }

    let records = report::records(&match_report);
    match settings.format {
        OutputFormat::Text => report::write_text(&mut out, &records, settings.units)?,
        OutputFormat::Json => report::write_json(&mut out, &records)?,
    }
    Ok(())
}
