use std::collections::HashMap;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter};

use crate::errors::{PipelineError, Result};
use crate::filing::Filing;
use crate::parsing::text::{normalize_whitespace, token_count};

/// Closed taxonomy of financial-statement subsections. Everything a
/// heading pattern fails to claim lands in `Other`, so downstream match
/// arms stay exhaustive.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumIter,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum SectionName {
    Operations,
    ComprehensiveIncome,
    BalanceSheet,
    ShareholdersEquity,
    CashFlows,
    Notes,
    Other,
}

/// One named span of the Item 8 section, in document order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TextSubsection {
    pub section: SectionName,
    pub ordinal: usize,
    pub text: String,
}

static ITEM_8_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^\s*item\s*8\b[\s\-–—.:]*financial\s+statements").unwrap()
});
static ITEM_NEXT_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^\s*item\s*(9|1[0-6])[abc]?\b(?:[\s\-–—.:]|$)").unwrap());
static PAGE_NUMBER_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^(F-)?\d{1,4}$").unwrap());

static SUBSECTION_PATTERNS: Lazy<Vec<(Regex, SectionName)>> = Lazy::new(|| {
    vec![
        (
            Regex::new(r"(?i)consolidated\s+statements?\s+of\s+operations").unwrap(),
            SectionName::Operations,
        ),
        (
            Regex::new(r"(?i)consolidated\s+statements?\s+of\s+comprehensive\s+income").unwrap(),
            SectionName::ComprehensiveIncome,
        ),
        (
            Regex::new(r"(?i)consolidated\s+balance\s+sheets?").unwrap(),
            SectionName::BalanceSheet,
        ),
        (
            Regex::new(r"(?i)consolidated\s+statements?\s+of\s+shareholders.{0,3}\s*equity")
                .unwrap(),
            SectionName::ShareholdersEquity,
        ),
        (
            Regex::new(r"(?i)consolidated\s+statements?\s+of\s+cash\s+flows").unwrap(),
            SectionName::CashFlows,
        ),
        (
            Regex::new(r"(?i)notes\s+to\s+consolidated\s+financial\s+statements").unwrap(),
            SectionName::Notes,
        ),
    ]
});

/// Lines this short that repeat verbatim across subsections are treated as
/// running headers or page furniture and dropped.
const BOILERPLATE_MAX_TOKENS: usize = 4;

/// Extract the Item 8 span from normalized plain text and split it into
/// named subsections. The input is expected to already be markup-free
/// (see `parsing::text::strip_markup`); whitespace is normalized here.
pub fn extract_sections(filing: &Filing, body: &str) -> Result<Vec<TextSubsection>> {
    let body = normalize_whitespace(body);
    let lines: Vec<&str> = body.lines().collect();

    let span = find_item8_span(&lines).ok_or_else(|| PipelineError::SectionNotFound {
        accession: filing.accession_number.clone(),
    })?;
    let section_lines = &lines[span.0..span.1];

    let mut subsections = split_subsections(section_lines);
    drop_boilerplate(&mut subsections);

    // Re-normalize and drop anything that emptied out, then assign final
    // document-order ordinals.
    let mut out = Vec::new();
    for (section, text) in subsections {
        let text = normalize_whitespace(&text);
        if text.is_empty() {
            continue;
        }
        out.push(TextSubsection {
            section,
            ordinal: out.len(),
            text,
        });
    }
    log::debug!(
        "filing {}: extracted {} subsections from Item 8",
        filing.accession_number,
        out.len()
    );
    Ok(out)
}

/// Start at the Item 8 heading, end at the next top-level Item heading or
/// end of document. Returns half-open line indices.
fn find_item8_span(lines: &[&str]) -> Option<(usize, usize)> {
    let mut start = None;
    for (i, line) in lines.iter().enumerate() {
        match start {
            None => {
                if ITEM_8_RE.is_match(line) {
                    start = Some(i);
                }
            }
            Some(s) => {
                if ITEM_NEXT_RE.is_match(line) {
                    return Some((s, i));
                }
            }
        }
    }
    start.map(|s| (s, lines.len()))
}

/// Split the Item 8 span at statement-heading lines. The leading span
/// before the first recognized heading, and any heading that matches no
/// pattern, get `SectionName::Other`.
fn split_subsections(lines: &[&str]) -> Vec<(SectionName, String)> {
    let mut boundaries: Vec<(usize, SectionName)> = Vec::new();
    let mut seen: Vec<SectionName> = Vec::new();
    for (i, line) in lines.iter().enumerate() {
        for (re, section) in SUBSECTION_PATTERNS.iter() {
            // First occurrence of each heading wins; statements repeat
            // their own titles in continuation pages.
            if !seen.contains(section) && re.is_match(line) {
                boundaries.push((i, *section));
                seen.push(*section);
                break;
            }
        }
    }

    let mut spans = Vec::new();
    let first_boundary = boundaries.first().map(|(i, _)| *i).unwrap_or(lines.len());
    if first_boundary > 0 {
        spans.push((SectionName::Other, lines[..first_boundary].join("\n")));
    }
    for (idx, (start, section)) in boundaries.iter().enumerate() {
        let end = boundaries
            .get(idx + 1)
            .map(|(i, _)| *i)
            .unwrap_or(lines.len());
        spans.push((*section, lines[*start..end].join("\n")));
    }
    spans
}

/// Remove short lines that repeat verbatim in more than one subsection
/// (running headers, company names) and bare page numbers.
fn drop_boilerplate(subsections: &mut [(SectionName, String)]) {
    let mut line_sections: HashMap<&str, usize> = HashMap::new();
    for (_, text) in subsections.iter() {
        let mut seen_here = std::collections::HashSet::new();
        for line in text.lines() {
            if token_count(line) <= BOILERPLATE_MAX_TOKENS && seen_here.insert(line) {
                *line_sections.entry(line).or_insert(0) += 1;
            }
        }
    }
    let repeated: std::collections::HashSet<String> = line_sections
        .into_iter()
        .filter(|(_, count)| *count > 1)
        .map(|(line, _)| line.to_string())
        .collect();

    for (_, text) in subsections.iter_mut() {
        let kept: Vec<&str> = text
            .lines()
            .filter(|line| !PAGE_NUMBER_RE.is_match(line.trim()))
            .filter(|line| !repeated.contains(*line))
            .collect();
        *text = kept.join("\n");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filing::FormType;

    fn filing() -> Filing {
        Filing::new("AAPL", "320193", "0000320193-23-000106", 2023, FormType::Form10K)
    }

    const BODY: &str = "\
Item 7. Management's Discussion and Analysis
Revenue grew this year.
ITEM 8. FINANCIAL STATEMENTS AND SUPPLEMENTARY DATA
Index to financial statements follows.
CONSOLIDATED STATEMENTS OF OPERATIONS
Net sales | 383,285
Cost of sales | 214,137
CONSOLIDATED BALANCE SHEETS
Cash and cash equivalents | 29,965
Accounts payable | 62,611
CONSOLIDATED STATEMENTS OF CASH FLOWS
Cash generated by operating activities | 110,543
Notes to Consolidated Financial Statements
Note 1 - Summary of Significant Accounting Policies describes the basis.
ITEM 9. CHANGES IN AND DISAGREEMENTS WITH ACCOUNTANTS
Nothing to report.";

    #[test]
    fn test_extracts_ordered_subsections() {
        let sections = extract_sections(&filing(), BODY).unwrap();
        let names: Vec<SectionName> = sections.iter().map(|s| s.section).collect();
        assert_eq!(
            names,
            vec![
                SectionName::Other,
                SectionName::Operations,
                SectionName::BalanceSheet,
                SectionName::CashFlows,
                SectionName::Notes,
            ]
        );
        // Ordinals follow document order.
        for (i, s) in sections.iter().enumerate() {
            assert_eq!(s.ordinal, i);
        }
        // Item 9 content is outside the span.
        assert!(!sections.iter().any(|s| s.text.contains("Nothing to report")));
    }

    #[test]
    fn test_missing_item8_is_recoverable_error() {
        let err = extract_sections(&filing(), "Item 1. Business\nWe sell phones.").unwrap_err();
        assert!(matches!(err, PipelineError::SectionNotFound { .. }));
    }

    #[test]
    fn test_subsection_content_lands_in_right_bucket() {
        let sections = extract_sections(&filing(), BODY).unwrap();
        let balance = sections
            .iter()
            .find(|s| s.section == SectionName::BalanceSheet)
            .unwrap();
        assert!(balance.text.contains("Accounts payable"));
        assert!(!balance.text.contains("Net sales"));
    }

    #[test]
    fn test_page_numbers_dropped() {
        let body = "ITEM 8. FINANCIAL STATEMENTS\nCONSOLIDATED BALANCE SHEETS\n42\nF-12\nTotal assets | 352,755\nITEM 9. OTHER\nx";
        let sections = extract_sections(&filing(), body).unwrap();
        let balance = sections
            .iter()
            .find(|s| s.section == SectionName::BalanceSheet)
            .unwrap();
        assert!(!balance.text.contains("F-12"));
        assert!(balance.text.contains("Total assets"));
    }

    #[test]
    fn test_bare_item_nine_heading_ends_span() {
        let body = "\
ITEM 8. FINANCIAL STATEMENTS
CONSOLIDATED BALANCE SHEETS
Total assets | 352,755
ITEM 9
Auditor disagreement details here.";
        let sections = extract_sections(&filing(), body).unwrap();
        assert!(!sections
            .iter()
            .any(|s| s.text.contains("Auditor disagreement")));
        let balance = sections
            .iter()
            .find(|s| s.section == SectionName::BalanceSheet)
            .unwrap();
        assert!(balance.text.contains("Total assets"));
    }

    #[test]
    fn test_repeated_short_lines_dropped() {
        let body = "\
ITEM 8. FINANCIAL STATEMENTS
CONSOLIDATED STATEMENTS OF OPERATIONS
Apple Inc.
Net sales | 383,285
CONSOLIDATED BALANCE SHEETS
Apple Inc.
Total assets | 352,755";
        let sections = extract_sections(&filing(), body).unwrap();
        for s in &sections {
            assert!(!s.text.contains("Apple Inc."), "header should be dropped");
        }
    }
}
