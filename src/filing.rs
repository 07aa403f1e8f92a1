use core::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::errors::{PipelineError, Result};

/// SEC form types we handle. Anything else is carried through verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String")]
pub enum FormType {
    Form10K,
    Form10Q,
    Form8K,
    Form20F,
    Other(String),
}

impl fmt::Display for FormType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FormType::Form10K => write!(f, "10-K"),
            FormType::Form10Q => write!(f, "10-Q"),
            FormType::Form8K => write!(f, "8-K"),
            FormType::Form20F => write!(f, "20-F"),
            FormType::Other(s) => write!(f, "{}", s),
        }
    }
}

impl FromStr for FormType {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<FormType, String> {
        match s.to_uppercase().as_str() {
            "10-K" => Ok(FormType::Form10K),
            "10-Q" => Ok(FormType::Form10Q),
            "8-K" => Ok(FormType::Form8K),
            "20-F" => Ok(FormType::Form20F),
            _ => Ok(FormType::Other(s.to_string())),
        }
    }
}

impl TryFrom<String> for FormType {
    type Error = String;

    fn try_from(s: String) -> std::result::Result<Self, String> {
        FormType::from_str(&s)
    }
}

/// One regulatory document set, identified by accession number.
/// Read-only input to the pipeline; nothing mutates it after construction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Filing {
    pub ticker: String,
    pub cik: String,
    pub accession_number: String,
    pub year: i32,
    pub form_type: FormType,
}

impl Filing {
    pub fn new(
        ticker: impl Into<String>,
        cik: impl Into<String>,
        accession_number: impl Into<String>,
        year: i32,
        form_type: FormType,
    ) -> Self {
        Filing {
            ticker: ticker.into().to_uppercase(),
            cik: normalize_cik(&cik.into()),
            accession_number: accession_number.into(),
            year,
            form_type,
        }
    }
}

/// CIKs are 10-digit, zero-padded strings everywhere downstream.
pub fn normalize_cik(cik: &str) -> String {
    let digits: String = cik.chars().filter(|c| c.is_ascii_digit()).collect();
    format!("{:0>10}", digits)
}

/// The locally available files for one filing, as reported by the file
/// provider. Older filings routinely lack one or more representations;
/// absence is normal, not an error.
#[derive(Debug, Clone, Default)]
pub struct FilingFiles {
    /// Plain-text filing body (complete submission text).
    pub plain_text: Option<String>,
    /// Primary HTML rendition, possibly carrying inline XBRL.
    pub html: Option<String>,
    /// Standalone XBRL instance document (the `*_htm.xml` companion).
    pub xbrl_instance: Option<String>,
}

/// Preferred source for structured fact extraction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FactSource {
    /// Standalone instance document: machine-readable, parsed as strict XML.
    Instance,
    /// Inline XBRL embedded in the main HTML rendition.
    InlineHtml,
}

/// Preferred source for textual section extraction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextSource {
    PlainText,
    Html,
}

/// Pure selection: prefer the standalone instance document, fall back to
/// inline XBRL in the HTML body. Neither present means fact extraction
/// cannot proceed for this filing.
pub fn select_fact_source(filing: &Filing, files: &FilingFiles) -> Result<FactSource> {
    if files.xbrl_instance.is_some() {
        Ok(FactSource::Instance)
    } else if files.html.is_some() {
        Ok(FactSource::InlineHtml)
    } else {
        Err(PipelineError::NoStructuredData {
            accession: filing.accession_number.clone(),
        })
    }
}

/// Pure selection: the plain-text body is simpler and more uniform across
/// years, so it wins over the HTML rendition when both exist.
pub fn select_text_source(filing: &Filing, files: &FilingFiles) -> Result<TextSource> {
    if files.plain_text.is_some() {
        Ok(TextSource::PlainText)
    } else if files.html.is_some() {
        Ok(TextSource::Html)
    } else {
        Err(PipelineError::SectionNotFound {
            accession: filing.accession_number.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn filing() -> Filing {
        Filing::new("aapl", "320193", "0000320193-23-000106", 2023, FormType::Form10K)
    }

    #[test]
    fn test_cik_zero_padding() {
        let f = filing();
        assert_eq!(f.cik, "0000320193");
        assert_eq!(f.ticker, "AAPL");
        assert_eq!(normalize_cik("0000320193"), "0000320193");
    }

    #[test]
    fn test_fact_source_prefers_instance() {
        let files = FilingFiles {
            plain_text: None,
            html: Some("<html/>".into()),
            xbrl_instance: Some("<xbrl/>".into()),
        };
        assert_eq!(
            select_fact_source(&filing(), &files).unwrap(),
            FactSource::Instance
        );
    }

    #[test]
    fn test_fact_source_falls_back_to_inline() {
        let files = FilingFiles {
            html: Some("<html/>".into()),
            ..Default::default()
        };
        assert_eq!(
            select_fact_source(&filing(), &files).unwrap(),
            FactSource::InlineHtml
        );
    }

    #[test]
    fn test_no_structured_source_is_an_error() {
        let files = FilingFiles {
            plain_text: Some("text".into()),
            ..Default::default()
        };
        assert!(matches!(
            select_fact_source(&filing(), &files),
            Err(PipelineError::NoStructuredData { .. })
        ));
    }

    #[test]
    fn test_text_source_prefers_plain_text() {
        let files = FilingFiles {
            plain_text: Some("text".into()),
            html: Some("<html/>".into()),
            ..Default::default()
        };
        assert_eq!(
            select_text_source(&filing(), &files).unwrap(),
            TextSource::PlainText
        );
    }

    #[test]
    fn test_form_type_round_trip() {
        assert_eq!("10-K".parse::<FormType>().unwrap(), FormType::Form10K);
        assert_eq!(FormType::Form10K.to_string(), "10-K");
        assert_eq!(
            "S-1".parse::<FormType>().unwrap(),
            FormType::Other("S-1".to_string())
        );
    }
}
