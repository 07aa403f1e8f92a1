use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use strum::Display;

use crate::filing::Filing;
use crate::parsing::section::TextSubsection;
use crate::parsing::xbrl::{Fact, FactValue};

/// Whether a retrieval record came from a structured fact or a text chunk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    Fact,
    Text,
}

/// Metadata attached to every stored record; all search filters resolve
/// against these fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordMetadata {
    pub ticker: String,
    pub cik: String,
    pub year: i32,
    pub accession_number: String,
    pub source_kind: SourceKind,
    pub concept_or_section: String,
}

/// A retrieval record candidate: text and identity fixed, embedding not
/// yet computed.
#[derive(Debug, Clone)]
pub struct RecordCandidate {
    pub record_id: String,
    pub text: String,
    pub metadata: RecordMetadata,
}

/// Deterministic record identity: re-running extraction over the same
/// filing reproduces the same ids, so re-ingestion overwrites.
fn record_id(accession: &str, kind: SourceKind, key: &str, ordinal: usize) -> String {
    format!("{}:{}:{}:{}", accession, kind, key, ordinal)
}

/// Render each fact as one canonical sentence so structurally identical
/// data presents a uniform linguistic surface to the embedding model.
pub fn build_fact_records(filing: &Filing, facts: &[Fact]) -> Vec<RecordCandidate> {
    let mut per_concept: HashMap<String, usize> = HashMap::new();
    facts
        .iter()
        .map(|fact| {
            let ordinal = per_concept.entry(fact.concept.clone()).or_insert(0);
            let candidate = RecordCandidate {
                record_id: record_id(
                    &filing.accession_number,
                    SourceKind::Fact,
                    &fact.concept,
                    *ordinal,
                ),
                text: fact_sentence(fact),
                metadata: RecordMetadata {
                    ticker: filing.ticker.clone(),
                    cik: filing.cik.clone(),
                    year: filing.year,
                    accession_number: filing.accession_number.clone(),
                    source_kind: SourceKind::Fact,
                    concept_or_section: fact.concept.clone(),
                },
            };
            *ordinal += 1;
            candidate
        })
        .collect()
}

fn fact_sentence(fact: &Fact) -> String {
    let mut sentence = format!(
        "For a financial record, the metric is '{}', its value is {}",
        fact.concept, fact.value
    );
    if let (FactValue::Numeric(_), Some(unit)) = (&fact.value, &fact.unit) {
        sentence.push_str(&format!(", with unit '{}'", unit));
    }
    if let Some(end) = fact.period_end {
        sentence.push_str(&format!(", as of {}", end));
    }
    sentence.push('.');
    sentence
}

/// Chunk text subsections under the character budget. Splits prefer
/// paragraph boundaries, then sentence boundaries; a hard split only
/// happens for a single unbroken run longer than the whole budget.
pub fn build_text_records(
    filing: &Filing,
    subsections: &[TextSubsection],
    max_chunk_chars: usize,
) -> Vec<RecordCandidate> {
    let mut per_section: HashMap<String, usize> = HashMap::new();
    let mut out = Vec::new();
    for subsection in subsections {
        let section = subsection.section.to_string();
        for chunk in chunk_text(&subsection.text, max_chunk_chars) {
            let ordinal = per_section.entry(section.clone()).or_insert(0);
            out.push(RecordCandidate {
                record_id: record_id(
                    &filing.accession_number,
                    SourceKind::Text,
                    &section,
                    *ordinal,
                ),
                text: chunk,
                metadata: RecordMetadata {
                    ticker: filing.ticker.clone(),
                    cik: filing.cik.clone(),
                    year: filing.year,
                    accession_number: filing.accession_number.clone(),
                    source_kind: SourceKind::Text,
                    concept_or_section: section.clone(),
                },
            });
            *ordinal += 1;
        }
    }
    out
}

fn chunk_text(text: &str, max_chars: usize) -> Vec<String> {
    if text.len() <= max_chars {
        return vec![text.to_string()];
    }
    let mut chunks = Vec::new();
    let mut current = String::new();
    for paragraph in split_units(text, max_chars) {
        if !current.is_empty() && current.len() + paragraph.len() + 1 > max_chars {
            chunks.push(std::mem::take(&mut current));
        }
        if !current.is_empty() {
            current.push('\n');
        }
        current.push_str(&paragraph);
    }
    if !current.is_empty() {
        chunks.push(current);
    }
    chunks
}

/// Paragraphs (blank-line separated, falling back to lines), with any
/// oversized paragraph pre-split at sentence boundaries.
fn split_units(text: &str, max_chars: usize) -> Vec<String> {
    let mut units = Vec::new();
    for paragraph in text.split("\n\n").flat_map(|p| p.split('\n')) {
        let paragraph = paragraph.trim();
        if paragraph.is_empty() {
            continue;
        }
        if paragraph.len() <= max_chars {
            units.push(paragraph.to_string());
            continue;
        }
        let mut piece = String::new();
        for sentence in paragraph.split_inclusive(". ") {
            if !piece.is_empty() && piece.len() + sentence.len() > max_chars {
                units.push(std::mem::take(&mut piece));
            }
            if sentence.len() > max_chars {
                // Unbroken run: hard split as a last resort.
                let mut rest = sentence;
                while rest.len() > max_chars {
                    let cut = floor_char_boundary(rest, max_chars);
                    units.push(rest[..cut].to_string());
                    rest = &rest[cut..];
                }
                piece.push_str(rest);
            } else {
                piece.push_str(sentence);
            }
        }
        if !piece.is_empty() {
            units.push(piece);
        }
    }
    units
}

fn floor_char_boundary(s: &str, mut idx: usize) -> usize {
    while idx > 0 && !s.is_char_boundary(idx) {
        idx -= 1;
    }
    idx.max(1)
}
