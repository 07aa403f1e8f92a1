use std::io::Write;

use anyhow::{Context, Result};
use serde::Serialize;

use crate::parsing::section::TextSubsection;
use crate::parsing::xbrl::Fact;

#[derive(Serialize)]
struct FactRow<'a> {
    concept: &'a str,
    value: String,
    unit: Option<&'a str>,
    period_start: Option<String>,
    period_end: Option<String>,
    context_id: &'a str,
}

/// Render extracted facts as CSV, one row per fact, in extraction order.
pub fn write_facts_csv<W: Write>(writer: W, facts: &[Fact]) -> Result<()> {
    let mut csv_writer = csv::Writer::from_writer(writer);
    for fact in facts {
        csv_writer
            .serialize(FactRow {
                concept: &fact.concept,
                value: fact.value.to_string(),
                unit: fact.unit.as_deref(),
                period_start: fact.period_start.map(|d| d.to_string()),
                period_end: fact.period_end.map(|d| d.to_string()),
                context_id: &fact.context_id,
            })
            .context("writing fact row")?;
    }
    csv_writer.flush().context("flushing facts csv")?;
    Ok(())
}

/// Render text subsections as pretty-printed JSON.
pub fn write_subsections_json<W: Write>(writer: W, subsections: &[TextSubsection]) -> Result<()> {
    serde_json::to_writer_pretty(writer, subsections).context("writing subsections json")?;
    Ok(())
}
