use std::collections::HashMap;

use chrono::NaiveDate;
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use serde::{Deserialize, Serialize};

use crate::errors::{PipelineError, Result};
use crate::filing::{FactSource, Filing};

/// Value of an XBRL fact. Numeric facts always carry a unit; textual facts
/// (policy notes, dei strings) never do.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FactValue {
    Numeric(f64),
    Text(String),
}

impl std::fmt::Display for FactValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FactValue::Numeric(n) if n.fract() == 0.0 && n.abs() < 1e15 => {
                write!(f, "{}", *n as i64)
            }
            FactValue::Numeric(n) => write!(f, "{}", n),
            FactValue::Text(s) => write!(f, "{}", s),
        }
    }
}

/// One structured fact resolved against its reporting context and unit.
/// Instant facts have `period_start == period_end`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Fact {
    pub concept: String,
    pub value: FactValue,
    pub unit: Option<String>,
    pub period_start: Option<NaiveDate>,
    pub period_end: Option<NaiveDate>,
    pub context_id: String,
}

/// Extraction result for one filing. `dropped` counts facts discarded for
/// unresolvable unit/context/scale references; callers decide whether to
/// surface it (the batch driver logs it as a warning).
#[derive(Debug, Default)]
pub struct FactExtraction {
    pub facts: Vec<Fact>,
    pub dropped: usize,
}

#[derive(Debug, Clone, Copy, Default)]
struct Period {
    start: Option<NaiveDate>,
    end: Option<NaiveDate>,
}

/// Extract facts from the classified structured source.
pub fn extract_facts(filing: &Filing, content: &str, source: FactSource) -> Result<FactExtraction> {
    let extraction = match source {
        FactSource::Instance => parse_instance(filing, content)?,
        FactSource::InlineHtml => parse_inline(filing, content)?,
    };
    if extraction.facts.is_empty() {
        return Err(PipelineError::EmptyExtraction {
            accession: filing.accession_number.clone(),
        });
    }
    if extraction.dropped > 0 {
        log::warn!(
            "filing {}: dropped {} facts with unresolvable references",
            filing.accession_number,
            extraction.dropped
        );
    }
    Ok(extraction)
}

/// Strict-XML path for standalone instance documents.
fn parse_instance(filing: &Filing, content: &str) -> Result<FactExtraction> {
    let doc = match roxmltree::Document::parse(content) {
        Ok(doc) => doc,
        Err(e) => {
            log::warn!(
                "filing {}: instance document is not well-formed XML: {}",
                filing.accession_number,
                e
            );
            return Err(PipelineError::EmptyExtraction {
                accession: filing.accession_number.clone(),
            });
        }
    };
    let root = doc.root_element();

    // Unit declarations: simple measures and numerator/denominator ratios.
    let mut units: HashMap<String, String> = HashMap::new();
    for unit in root.descendants().filter(|n| n.tag_name().name() == "unit") {
        let Some(id) = unit.attribute("id") else {
            continue;
        };
        if let Some(divide) = unit.children().find(|n| n.tag_name().name() == "divide") {
            let numerator = measure_in(&divide, "unitNumerator");
            let denominator = measure_in(&divide, "unitDenominator");
            if let (Some(n), Some(d)) = (numerator, denominator) {
                units.insert(id.to_string(), format!("{}/{}", n, d));
            }
        } else {
            let measures: Vec<String> = unit
                .descendants()
                .filter(|n| n.tag_name().name() == "measure")
                .filter_map(|n| n.text())
                .map(local_measure)
                .collect();
            if !measures.is_empty() {
                units.insert(id.to_string(), measures.join(" "));
            }
        }
    }

    // Reporting contexts: id -> period.
    let mut contexts: HashMap<String, Period> = HashMap::new();
    for context in root.descendants().filter(|n| n.tag_name().name() == "context") {
        let Some(id) = context.attribute("id") else {
            continue;
        };
        let mut period = Period::default();
        if let Some(period_elem) = context.descendants().find(|n| n.tag_name().name() == "period") {
            for child in period_elem.children() {
                let date = child.text().and_then(parse_date);
                match child.tag_name().name() {
                    "instant" => {
                        period.start = date;
                        period.end = date;
                    }
                    "startDate" => period.start = date,
                    "endDate" => period.end = date,
                    _ => {}
                }
            }
        }
        contexts.insert(id.to_string(), period);
    }

    const STRUCTURAL: &[&str] = &[
        "xbrl",
        "context",
        "unit",
        "measure",
        "divide",
        "unitNumerator",
        "unitDenominator",
        "period",
        "instant",
        "startDate",
        "endDate",
        "entity",
        "identifier",
        "segment",
        "scenario",
        "explicitMember",
        "schemaRef",
        "loc",
        "footnote",
        "footnoteArc",
        "footnoteLink",
    ];

    let mut extraction = FactExtraction::default();
    let mut seen: HashMap<(String, String), usize> = HashMap::new();
    for node in root.descendants().filter(|n| {
        n.is_element()
            && n.tag_name().namespace().is_some()
            && !STRUCTURAL.contains(&n.tag_name().name())
    }) {
        let Some(context_ref) = node.attribute("contextRef") else {
            continue;
        };
        let raw_value = node.text().map(str::trim).unwrap_or_default();
        if raw_value.is_empty() {
            continue;
        }
        let concept = node.tag_name().name().to_string();

        let Some(&period) = contexts.get(context_ref) else {
            extraction.dropped += 1;
            log::debug!("dropping {}: unknown context {}", concept, context_ref);
            continue;
        };

        let unit = match node.attribute("unitRef") {
            Some(unit_ref) => match units.get(unit_ref) {
                Some(u) => Some(u.clone()),
                None => {
                    extraction.dropped += 1;
                    log::debug!("dropping {}: unknown unit {}", concept, unit_ref);
                    continue;
                }
            },
            None => None,
        };

        let resolved =
            resolve_value(&concept, raw_value, unit.is_some(), node.attribute("scale"), false);
        let value = match resolved {
            Ok(v) => v,
            Err(e) => {
                extraction.dropped += 1;
                log::debug!("dropping {}: {}", concept, e);
                continue;
            }
        };
        // Numeric facts must have a unit; dimensionless figures get "pure".
        let unit = match &value {
            FactValue::Numeric(_) => Some(unit.unwrap_or_else(|| "pure".to_string())),
            FactValue::Text(_) => unit,
        };

        push_fact(
            &mut extraction.facts,
            &mut seen,
            Fact {
                concept,
                value,
                unit,
                period_start: period.start,
                period_end: period.end,
                context_id: context_ref.to_string(),
            },
        );
    }
    Ok(extraction)
}

fn measure_in(divide: &roxmltree::Node, part: &str) -> Option<String> {
    divide
        .children()
        .find(|n| n.tag_name().name() == part)
        .and_then(|n| {
            n.descendants()
                .find(|m| m.tag_name().name() == "measure")
                .and_then(|m| m.text())
        })
        .map(local_measure)
}

/// "iso4217:USD" -> "USD", "xbrli:pure" -> "pure".
fn local_measure(measure: &str) -> String {
    measure
        .rsplit(':')
        .next()
        .unwrap_or(measure)
        .trim()
        .to_string()
}

/// Lenient streaming path for inline XBRL embedded in the HTML rendition.
/// Two passes: one for context/unit declarations in the hidden header, one
/// for `ix:nonFraction` / `ix:nonNumeric` facts scattered through the body.
fn parse_inline(filing: &Filing, content: &str) -> Result<FactExtraction> {
    let (contexts, units) = scan_inline_declarations(content);
    if contexts.is_empty() {
        log::warn!(
            "filing {}: no XBRL contexts found in inline document",
            filing.accession_number
        );
    }

    let mut reader = lenient_reader(content);
    let mut extraction = FactExtraction::default();
    let mut seen: HashMap<(String, String), usize> = HashMap::new();
    let mut pending: Option<PendingFact> = None;

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => {
                let local = local_name(&e);
                if let Some(p) = pending.as_mut() {
                    p.depth += 1;
                } else if local.eq_ignore_ascii_case("nonFraction")
                    || local.eq_ignore_ascii_case("nonNumeric")
                {
                    let numeric = local.eq_ignore_ascii_case("nonFraction");
                    let name = attr(&e, "name").unwrap_or_default();
                    let context_ref = attr(&e, "contextRef").unwrap_or_default();
                    if name.is_empty() || context_ref.is_empty() {
                        extraction.dropped += 1;
                        continue;
                    }
                    pending = Some(PendingFact {
                        concept: strip_prefix(&name),
                        context_ref,
                        unit_ref: attr(&e, "unitRef"),
                        scale: attr(&e, "scale"),
                        negated: attr(&e, "sign").as_deref() == Some("-"),
                        numeric,
                        text: String::new(),
                        depth: 1,
                    });
                }
            }
            Ok(Event::Text(t)) => {
                if let Some(p) = pending.as_mut() {
                    if let Ok(text) = t.unescape() {
                        p.text.push_str(&text);
                    }
                }
            }
            Ok(Event::End(_)) => {
                let finished = match pending.as_mut() {
                    Some(p) => {
                        p.depth -= 1;
                        p.depth == 0
                    }
                    None => false,
                };
                if finished {
                    if let Some(p) = pending.take() {
                        resolve_inline_fact(p, &contexts, &units, &mut extraction, &mut seen);
                    }
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => {
                // Real-world iXBRL is rarely clean; keep what we got.
                log::debug!(
                    "filing {}: stopping inline scan on malformed markup: {}",
                    filing.accession_number,
                    e
                );
                break;
            }
            _ => {}
        }
    }
    Ok(extraction)
}

/// In-flight inline fact element: attributes plus nesting depth, since
/// display markup (spans, denomination wrappers) nests inside fact tags.
struct PendingFact {
    concept: String,
    context_ref: String,
    unit_ref: Option<String>,
    scale: Option<String>,
    negated: bool,
    numeric: bool,
    text: String,
    depth: usize,
}

fn resolve_inline_fact(
    p: PendingFact,
    contexts: &HashMap<String, Period>,
    units: &HashMap<String, String>,
    extraction: &mut FactExtraction,
    seen: &mut HashMap<(String, String), usize>,
) {
    let Some(&period) = contexts.get(&p.context_ref) else {
        extraction.dropped += 1;
        log::debug!("dropping {}: unknown context {}", p.concept, p.context_ref);
        return;
    };
    let unit = match &p.unit_ref {
        Some(unit_ref) => match units.get(unit_ref) {
            Some(u) => Some(u.clone()),
            None => {
                extraction.dropped += 1;
                log::debug!("dropping {}: unknown unit {}", p.concept, unit_ref);
                return;
            }
        },
        None => None,
    };
    let raw = p.text.trim();
    if raw.is_empty() {
        return;
    }
    let value = match resolve_value(&p.concept, raw, p.numeric, p.scale.as_deref(), p.negated) {
        Ok(v) => v,
        Err(e) => {
            extraction.dropped += 1;
            log::debug!("dropping {}: {}", p.concept, e);
            return;
        }
    };
    let unit = match &value {
        FactValue::Numeric(_) => Some(unit.unwrap_or_else(|| "pure".to_string())),
        FactValue::Text(_) => unit,
    };
    push_fact(
        &mut extraction.facts,
        seen,
        Fact {
            concept: p.concept,
            value,
            unit,
            period_start: period.start,
            period_end: period.end,
            context_id: p.context_ref,
        },
    );
}

/// First pass over inline markup: collect context periods and unit strings.
fn scan_inline_declarations(
    content: &str,
) -> (HashMap<String, Period>, HashMap<String, String>) {
    let mut contexts: HashMap<String, Period> = HashMap::new();
    let mut units: HashMap<String, String> = HashMap::new();

    let mut reader = lenient_reader(content);
    let mut context_id: Option<String> = None;
    let mut unit_id: Option<String> = None;
    // Which period/unit child we are inside, so the next text event knows
    // where to land.
    let mut date_field: Option<&'static str> = None;
    let mut in_measure = false;
    let mut in_denominator = false;
    let mut measures: Vec<String> = Vec::new();
    let mut denominator: Option<String> = None;

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => {
                let local = local_name(&e);
                if local.eq_ignore_ascii_case("context") {
                    context_id = attr(&e, "id");
                } else if local.eq_ignore_ascii_case("unit") {
                    unit_id = attr(&e, "id");
                    measures.clear();
                    denominator = None;
                    in_denominator = false;
                } else if context_id.is_some() {
                    date_field = match local.as_str() {
                        l if l.eq_ignore_ascii_case("instant") => Some("instant"),
                        l if l.eq_ignore_ascii_case("startDate") => Some("start"),
                        l if l.eq_ignore_ascii_case("endDate") => Some("end"),
                        _ => None,
                    };
                } else if unit_id.is_some() {
                    if local.eq_ignore_ascii_case("measure") {
                        in_measure = true;
                    } else if local.eq_ignore_ascii_case("unitDenominator") {
                        in_denominator = true;
                    }
                }
            }
            Ok(Event::Text(t)) => {
                let Ok(text) = t.unescape() else { continue };
                let text = text.trim().to_string();
                if text.is_empty() {
                    continue;
                }
                if let (Some(id), Some(field)) = (&context_id, date_field) {
                    let entry = contexts.entry(id.clone()).or_default();
                    let date = parse_date(&text);
                    match field {
                        "instant" => {
                            entry.start = date;
                            entry.end = date;
                        }
                        "start" => entry.start = date,
                        _ => entry.end = date,
                    }
                } else if unit_id.is_some() && in_measure {
                    if in_denominator {
                        denominator = Some(local_measure(&text));
                    } else {
                        measures.push(local_measure(&text));
                    }
                }
            }
            Ok(Event::End(e)) => {
                let local = local_name_end(&e);
                if local.eq_ignore_ascii_case("context") {
                    context_id = None;
                    date_field = None;
                } else if local.eq_ignore_ascii_case("unit") {
                    if let Some(id) = unit_id.take() {
                        let unit = match (&measures[..], &denominator) {
                            ([n], Some(d)) => Some(format!("{}/{}", n, d)),
                            ([], _) => None,
                            (ms, _) => Some(ms.join(" ")),
                        };
                        if let Some(unit) = unit {
                            units.insert(id, unit);
                        }
                    }
                    in_denominator = false;
                } else if local.eq_ignore_ascii_case("measure") {
                    in_measure = false;
                } else if local.eq_ignore_ascii_case("unitDenominator") {
                    in_denominator = false;
                } else if context_id.is_some() {
                    date_field = None;
                }
            }
            Ok(Event::Eof) => break,
            Err(_) => break,
            _ => {}
        }
    }
    (contexts, units)
}

fn lenient_reader(content: &str) -> Reader<&[u8]> {
    let mut reader = Reader::from_str(content);
    reader.config_mut().check_end_names = false;
    reader
}

fn local_name(e: &BytesStart) -> String {
    String::from_utf8_lossy(e.local_name().as_ref()).into_owned()
}

fn local_name_end(e: &quick_xml::events::BytesEnd) -> String {
    String::from_utf8_lossy(e.local_name().as_ref()).into_owned()
}

fn attr(e: &BytesStart, name: &str) -> Option<String> {
    e.attributes().flatten().find_map(|a| {
        if a.key.as_ref() == name.as_bytes() {
            a.unescape_value().ok().map(|v| v.into_owned())
        } else {
            None
        }
    })
}

fn strip_prefix(name: &str) -> String {
    name.rsplit(':').next().unwrap_or(name).to_string()
}

fn parse_date(text: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(text.trim(), "%Y-%m-%d").ok()
}

/// Turn raw fact text into a typed value, applying the declared
/// decimal-scale exactly: a scale of `k` multiplies the parsed figure by
/// 10^k. Getting this wrong corrupts magnitudes silently, so an
/// unparsable scale drops the fact rather than guessing.
fn resolve_value(
    concept: &str,
    raw: &str,
    numeric: bool,
    scale: Option<&str>,
    negated: bool,
) -> Result<FactValue> {
    if !numeric {
        return Ok(FactValue::Text(raw.to_string()));
    }
    let cleaned: String = raw
        .chars()
        .filter(|c| *c != ',' && !c.is_whitespace())
        .collect();
    let mut value: f64 = cleaned
        .parse()
        .map_err(|_| PipelineError::ScaleResolution {
            concept: concept.to_string(),
            scale: format!("non-numeric value {:?}", raw),
        })?;
    if let Some(scale) = scale {
        let exponent: i32 =
            scale
                .trim()
                .parse()
                .map_err(|_| PipelineError::ScaleResolution {
                    concept: concept.to_string(),
                    scale: scale.to_string(),
                })?;
        value *= 10f64.powi(exponent);
    }
    if negated {
        value = -value;
    }
    Ok(FactValue::Numeric(value))
}

/// Facts are keyed by (concept, context_id); a restated fact replaces the
/// earlier one in place, keeping first-seen document order.
fn push_fact(facts: &mut Vec<Fact>, seen: &mut HashMap<(String, String), usize>, fact: Fact) {
    let key = (fact.concept.clone(), fact.context_id.clone());
    match seen.get(&key) {
        Some(&idx) => facts[idx] = fact,
        None => {
            seen.insert(key, facts.len());
            facts.push(fact);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filing::FormType;

    fn filing() -> Filing {
        Filing::new("AAPL", "320193", "0000320193-23-000106", 2023, FormType::Form10K)
    }

    const INSTANCE: &str = r#"<?xml version="1.0" encoding="utf-8"?>
<xbrl xmlns="http://www.xbrl.org/2003/instance"
      xmlns:us-gaap="http://fasb.org/us-gaap/2023"
      xmlns:dei="http://xbrl.sec.gov/dei/2023"
      xmlns:iso4217="http://www.xbrl.org/2003/iso4217">
  <context id="FY2023">
    <entity><identifier scheme="http://www.sec.gov/CIK">0000320193</identifier></entity>
    <period><startDate>2022-10-01</startDate><endDate>2023-09-30</endDate></period>
  </context>
  <context id="AsOf2023">
    <entity><identifier scheme="http://www.sec.gov/CIK">0000320193</identifier></entity>
    <period><instant>2023-09-30</instant></period>
  </context>
  <unit id="usd"><measure>iso4217:USD</measure></unit>
  <unit id="usdPerShare">
    <divide>
      <unitNumerator><measure>iso4217:USD</measure></unitNumerator>
      <unitDenominator><measure>shares</measure></unitDenominator>
    </divide>
  </unit>
  <us-gaap:RevenueFromContractWithCustomerExcludingAssessedTax contextRef="FY2023" unitRef="usd" decimals="-6">383285000000</us-gaap:RevenueFromContractWithCustomerExcludingAssessedTax>
  <us-gaap:AccountsPayableCurrent contextRef="AsOf2023" unitRef="usd" decimals="-6">62611000000</us-gaap:AccountsPayableCurrent>
  <us-gaap:EarningsPerShareBasic contextRef="FY2023" unitRef="usdPerShare" decimals="2">6.16</us-gaap:EarningsPerShareBasic>
  <dei:EntityRegistrantName contextRef="FY2023">Apple Inc.</dei:EntityRegistrantName>
  <us-gaap:AccountsPayableCurrent contextRef="AsOf2023" unitRef="usd" decimals="-6">62611000001</us-gaap:AccountsPayableCurrent>
  <us-gaap:Orphan contextRef="NoSuchContext" unitRef="usd">5</us-gaap:Orphan>
  <us-gaap:Orphan2 contextRef="FY2023" unitRef="noSuchUnit">5</us-gaap:Orphan2>
</xbrl>"#;

    #[test]
    fn test_instance_facts_resolve_units_and_periods() {
        let extraction = extract_facts(&filing(), INSTANCE, FactSource::Instance).unwrap();
        let revenue = extraction
            .facts
            .iter()
            .find(|f| f.concept == "RevenueFromContractWithCustomerExcludingAssessedTax")
            .unwrap();
        assert_eq!(revenue.value, FactValue::Numeric(383_285_000_000.0));
        assert_eq!(revenue.unit.as_deref(), Some("USD"));
        assert_eq!(revenue.period_start, NaiveDate::from_ymd_opt(2022, 10, 1));
        assert_eq!(revenue.period_end, NaiveDate::from_ymd_opt(2023, 9, 30));

        let eps = extraction
            .facts
            .iter()
            .find(|f| f.concept == "EarningsPerShareBasic")
            .unwrap();
        assert_eq!(eps.unit.as_deref(), Some("USD/shares"));
    }

    #[test]
    fn test_instant_period_has_equal_bounds() {
        let extraction = extract_facts(&filing(), INSTANCE, FactSource::Instance).unwrap();
        let payable = extraction
            .facts
            .iter()
            .find(|f| f.concept == "AccountsPayableCurrent")
            .unwrap();
        assert_eq!(payable.period_start, payable.period_end);
        assert_eq!(payable.period_end, NaiveDate::from_ymd_opt(2023, 9, 30));
    }

    #[test]
    fn test_duplicate_fact_last_occurrence_wins() {
        let extraction = extract_facts(&filing(), INSTANCE, FactSource::Instance).unwrap();
        let payables: Vec<_> = extraction
            .facts
            .iter()
            .filter(|f| f.concept == "AccountsPayableCurrent")
            .collect();
        assert_eq!(payables.len(), 1);
        assert_eq!(payables[0].value, FactValue::Numeric(62_611_000_001.0));
    }

    #[test]
    fn test_concept_context_pairs_unique() {
        let extraction = extract_facts(&filing(), INSTANCE, FactSource::Instance).unwrap();
        let mut keys: Vec<(String, String)> = extraction
            .facts
            .iter()
            .map(|f| (f.concept.clone(), f.context_id.clone()))
            .collect();
        let total = keys.len();
        keys.sort();
        keys.dedup();
        assert_eq!(keys.len(), total);
    }

    #[test]
    fn test_unresolvable_references_dropped_and_counted() {
        let extraction = extract_facts(&filing(), INSTANCE, FactSource::Instance).unwrap();
        assert_eq!(extraction.dropped, 2);
        assert!(!extraction.facts.iter().any(|f| f.concept.starts_with("Orphan")));
    }

    #[test]
    fn test_text_fact_carries_no_unit() {
        let extraction = extract_facts(&filing(), INSTANCE, FactSource::Instance).unwrap();
        let name = extraction
            .facts
            .iter()
            .find(|f| f.concept == "EntityRegistrantName")
            .unwrap();
        assert_eq!(name.value, FactValue::Text("Apple Inc.".to_string()));
        assert_eq!(name.unit, None);
    }

    #[test]
    fn test_empty_extraction_is_an_error() {
        let xml = r#"<xbrl xmlns="http://www.xbrl.org/2003/instance"><context id="c"><period><instant>2023-01-01</instant></period></context></xbrl>"#;
        assert!(matches!(
            extract_facts(&filing(), xml, FactSource::Instance),
            Err(PipelineError::EmptyExtraction { .. })
        ));
    }

    const INLINE: &str = r#"<html xmlns:ix="http://www.xbrl.org/2013/inlineXBRL">
<head><title>10-K</title></head>
<body>
<div style="display:none">
  <ix:header>
    <ix:resources>
      <xbrli:context id="AsOf2023">
        <xbrli:period><xbrli:instant>2023-09-30</xbrli:instant></xbrli:period>
      </xbrli:context>
      <xbrli:context id="FY2023">
        <xbrli:period><xbrli:startDate>2022-10-01</xbrli:startDate><xbrli:endDate>2023-09-30</xbrli:endDate></xbrli:period>
      </xbrli:context>
      <xbrli:unit id="usd"><xbrli:measure>iso4217:USD</xbrli:measure></xbrli:unit>
    </ix:resources>
  </ix:header>
</div>
<p>Accounts payable of
<ix:nonFraction name="us-gaap:AccountsPayableCurrent" contextRef="AsOf2023" unitRef="usd" scale="6" decimals="-6"><span>62,611</span></ix:nonFraction>
as of year end. Operating lease liabilities decreased by
<ix:nonFraction name="us-gaap:OperatingLeaseLiability" contextRef="AsOf2023" unitRef="usd" scale="3" sign="-">1,234</ix:nonFraction>
this year.</p>
<ix:nonNumeric name="dei:EntityRegistrantName" contextRef="FY2023">Apple Inc.</ix:nonNumeric>
</body>
</html>"#;

    #[test]
    fn test_inline_scale_applied_exactly() {
        let extraction = extract_facts(&filing(), INLINE, FactSource::InlineHtml).unwrap();
        let payable = extraction
            .facts
            .iter()
            .find(|f| f.concept == "AccountsPayableCurrent")
            .unwrap();
        assert_eq!(payable.value, FactValue::Numeric(62_611_000_000.0));
        assert_eq!(payable.unit.as_deref(), Some("USD"));
        assert_eq!(payable.period_end, NaiveDate::from_ymd_opt(2023, 9, 30));
    }

    #[test]
    fn test_inline_sign_attribute_negates() {
        let extraction = extract_facts(&filing(), INLINE, FactSource::InlineHtml).unwrap();
        let lease = extraction
            .facts
            .iter()
            .find(|f| f.concept == "OperatingLeaseLiability")
            .unwrap();
        assert_eq!(lease.value, FactValue::Numeric(-1_234_000.0));
    }

    #[test]
    fn test_inline_non_numeric_fact() {
        let extraction = extract_facts(&filing(), INLINE, FactSource::InlineHtml).unwrap();
        let name = extraction
            .facts
            .iter()
            .find(|f| f.concept == "EntityRegistrantName")
            .unwrap();
        assert_eq!(name.value, FactValue::Text("Apple Inc.".to_string()));
    }

    #[test]
    fn test_bad_scale_drops_fact() {
        let html = r#"<html xmlns:ix="http://www.xbrl.org/2013/inlineXBRL">
<xbrli:context id="c"><xbrli:period><xbrli:instant>2023-09-30</xbrli:instant></xbrli:period></xbrli:context>
<xbrli:unit id="usd"><xbrli:measure>iso4217:USD</xbrli:measure></xbrli:unit>
<ix:nonFraction name="us-gaap:Assets" contextRef="c" unitRef="usd" scale="???">100</ix:nonFraction>
<ix:nonFraction name="us-gaap:Liabilities" contextRef="c" unitRef="usd">50</ix:nonFraction>
</html>"#;
        let extraction = extract_facts(&filing(), html, FactSource::InlineHtml).unwrap();
        assert_eq!(extraction.dropped, 1);
        assert_eq!(extraction.facts.len(), 1);
        assert_eq!(extraction.facts[0].concept, "Liabilities");
    }

    #[test]
    fn test_dimensionless_numeric_defaults_to_pure() {
        let html = r#"<html xmlns:ix="http://www.xbrl.org/2013/inlineXBRL">
<xbrli:context id="c"><xbrli:period><xbrli:instant>2023-09-30</xbrli:instant></xbrli:period></xbrli:context>
<ix:nonFraction name="us-gaap:DebtInstrumentInterestRate" contextRef="c">0.045</ix:nonFraction>
</html>"#;
        let extraction = extract_facts(&filing(), html, FactSource::InlineHtml).unwrap();
        assert_eq!(extraction.facts[0].unit.as_deref(), Some("pure"));
    }
}
