//! Report rendering for accepted brunnels

use brunnel_lib::{AcceptedBrunnel, BrunnelKind, MatchReport, Units};
use serde::Serialize;
use std::io::Write;

/// One output record per accepted (possibly merged) brunnel
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Record {
    pub id: i64,
    #[serde(rename = "type")]
    pub kind: BrunnelKind,
    pub name: String,
    pub start_distance_km: f64,
    pub end_distance_km: f64,
    /// Only present for merged entries
    #[serde(skip_serializing_if = "Option::is_none")]
    pub member_ids: Option<Vec<i64>>,
}

impl From<&AcceptedBrunnel> for Record {
    fn from(accepted: &AcceptedBrunnel) -> Self {
        Self {
            id: accepted.id,
            kind: accepted.kind,
            name: accepted.name.clone(),
            start_distance_km: accepted.span.start_km(),
            end_distance_km: accepted.span.end_km(),
            member_ids: accepted.is_merged().then(|| accepted.member_ids.clone()),
        }
    }
}

/// Records for all accepted brunnels, in route order
pub fn records(report: &MatchReport<'_>) -> Vec<Record> {
    report.accepted.iter().map(Record::from).collect()
}

/// Write the records as pretty-printed JSON
pub fn write_json<W: Write>(mut out: W, records: &[Record]) -> std::io::Result<()> {
    serde_json::to_writer_pretty(&mut out, records)?;
    writeln!(out)
}

/// Write one aligned line per record with distances in `units`
pub fn write_text<W: Write>(mut out: W, records: &[Record], units: Units) -> std::io::Result<()> {
    if records.is_empty() {
        return writeln!(out, "No bridges or tunnels found along the route");
    }

    for record in records {
        let start = units.from_meters(record.start_distance_km * 1000.0);
        let end = units.from_meters(record.end_distance_km * 1000.0);
        write!(
            out,
            "{:>9.3}-{:<9.3} {} {:<6} {} ({})",
            start,
            end,
            units,
            record.kind,
            record.name,
            record.id
        )?;
        if let Some(members) = &record.member_ids {
            let members: Vec<String> = members.iter().map(i64::to_string).collect();
            write!(out, " [merged: {}]", members.join(", "))?;
        }
        writeln!(out)?;
    }
    Ok(())
}
