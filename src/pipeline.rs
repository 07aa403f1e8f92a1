use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::config::PipelineConfig;
use crate::embedding::EmbeddingProvider;
use crate::errors::Result;
use crate::filing::{select_fact_source, select_text_source, FactSource, Filing, FilingFiles, TextSource};
use crate::ingest::{IngestReport, IngestionEngine};
use crate::parsing::section::{extract_sections, TextSubsection};
use crate::parsing::text::strip_markup;
use crate::parsing::xbrl::{extract_facts, Fact};
use crate::records::{build_fact_records, build_text_records, RecordCandidate};
use crate::retrieval::RetrievalEngine;
use crate::store::{ScoredRecord, SearchFilter, VectorStore};

/// Per-filing extraction result. The fact and text paths are independent:
/// one can fail while the other succeeds, and the batch driver classifies
/// the filing accordingly.
#[derive(Debug)]
pub struct Extraction {
    pub facts: Result<Vec<Fact>>,
    pub subsections: Result<Vec<TextSubsection>>,
    /// Facts discarded for unresolvable unit/context/scale references.
    pub dropped_facts: usize,
}

impl Extraction {
    pub fn status(&self) -> FilingStatus {
        match (&self.facts, &self.subsections) {
            (Ok(_), Ok(_)) => FilingStatus::Succeeded,
            (Err(_), Err(_)) => FilingStatus::Failed,
            _ => FilingStatus::Partial,
        }
    }
}

/// Batch-level classification of one filing's processing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FilingStatus {
    Succeeded,
    Partial,
    Failed,
}

/// Summary of a batch run over many filings.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct BatchReport {
    pub succeeded: Vec<String>,
    pub partial: Vec<String>,
    pub failed: Vec<String>,
    pub ingest: IngestReport,
}

/// Facade over the whole pipeline: classification, extraction, record
/// building, ingestion and retrieval, sharing one embedder and one store.
pub struct Pipeline {
    config: PipelineConfig,
    ingestion: IngestionEngine,
    retrieval: RetrievalEngine,
}

impl Pipeline {
    pub fn new(
        config: PipelineConfig,
        embedder: Arc<dyn EmbeddingProvider>,
        store: Arc<dyn VectorStore>,
    ) -> Self {
        Pipeline {
            ingestion: IngestionEngine::new(embedder.clone(), store.clone(), config.clone()),
            retrieval: RetrievalEngine::new(embedder, store),
            config,
        }
    }

    /// Run both extraction paths over one filing's files. Recoverable
    /// per-path errors are captured in the result, not propagated, so a
    /// filing without an Item 8 section can still contribute facts.
    pub fn extract(&self, filing: &Filing, files: &FilingFiles) -> Extraction {
        let mut dropped = 0;
        let facts = select_fact_source(filing, files).and_then(|source| {
            let content = match source {
                FactSource::Instance => files.xbrl_instance.as_deref(),
                FactSource::InlineHtml => files.html.as_deref(),
            }
            .unwrap_or_default();
            extract_facts(filing, content, source).map(|extraction| {
                dropped = extraction.dropped;
                extraction.facts
            })
        });

        let subsections = select_text_source(filing, files).and_then(|source| {
            let body = match source {
                TextSource::PlainText => files.plain_text.clone().unwrap_or_default(),
                TextSource::Html => strip_markup(files.html.as_deref().unwrap_or_default()),
            };
            extract_sections(filing, &body)
        });

        if let Err(e) = &facts {
            log::warn!("filing {}: fact extraction failed: {}", filing.accession_number, e);
        }
        if let Err(e) = &subsections {
            log::warn!("filing {}: text extraction failed: {}", filing.accession_number, e);
        }

        Extraction {
            facts,
            subsections,
            dropped_facts: dropped,
        }
    }

    /// Build retrieval candidates from an extraction. Failed paths simply
    /// contribute no candidates.
    pub fn build_candidates(&self, filing: &Filing, extraction: &Extraction) -> Vec<RecordCandidate> {
        let mut candidates = Vec::new();
        if let Ok(facts) = &extraction.facts {
            candidates.extend(build_fact_records(filing, facts));
        }
        if let Ok(subsections) = &extraction.subsections {
            candidates.extend(build_text_records(
                filing,
                subsections,
                self.config.max_chunk_chars,
            ));
        }
        candidates
    }

    /// Embed and upsert one filing's candidates.
    pub async fn ingest(&self, candidates: Vec<RecordCandidate>) -> Result<IngestReport> {
        self.ingestion.ingest(candidates).await
    }

    /// Extract and ingest a batch of filings. Per-filing failures are
    /// isolated: they are classified in the report and never abort the
    /// siblings.
    pub async fn process_batch(&self, filings: &[(Filing, FilingFiles)]) -> BatchReport {
        let mut report = BatchReport::default();
        for (filing, files) in filings {
            let extraction = self.extract(filing, files);
            let bucket = match extraction.status() {
                FilingStatus::Succeeded => &mut report.succeeded,
                FilingStatus::Partial => &mut report.partial,
                FilingStatus::Failed => &mut report.failed,
            };
            bucket.push(filing.accession_number.clone());

            let candidates = self.build_candidates(filing, &extraction);
            if candidates.is_empty() {
                continue;
            }
            match self.ingestion.ingest(candidates).await {
                Ok(ingest) => {
                    // Ingestion outcomes count toward classification too: a
                    // filing whose records never landed did not succeed.
                    if ingest.failed > 0 {
                        let landed = ingest.inserted + ingest.updated;
                        let demoted = if landed == 0 {
                            FilingStatus::Failed
                        } else {
                            FilingStatus::Partial
                        };
                        reclassify(&mut report, &filing.accession_number, demoted);
                    }
                    report.ingest.inserted += ingest.inserted;
                    report.ingest.updated += ingest.updated;
                    report.ingest.failed += ingest.failed;
                    report.ingest.failed_ids.extend(ingest.failed_ids);
                }
                Err(e) => {
                    // Contract violations (dimension drift) are not a
                    // per-filing condition; surface them in the log and
                    // classify the filing as failed.
                    log::error!(
                        "filing {}: ingestion aborted: {}",
                        filing.accession_number,
                        e
                    );
                    reclassify(&mut report, &filing.accession_number, FilingStatus::Failed);
                }
            }
        }
        log::info!(
            "batch complete: {} succeeded, {} partial, {} failed",
            report.succeeded.len(),
            report.partial.len(),
            report.failed.len()
        );
        report
    }

    /// Similarity search over everything ingested so far.
    pub async fn search(
        &self,
        query_text: &str,
        filter: &SearchFilter,
        top_k: usize,
    ) -> Result<Vec<ScoredRecord>> {
        self.retrieval.search(query_text, filter, top_k).await
    }
}

fn reclassify(report: &mut BatchReport, accession: &str, status: FilingStatus) {
    report.succeeded.retain(|a| a != accession);
    report.partial.retain(|a| a != accession);
    report.failed.retain(|a| a != accession);
    let bucket = match status {
        FilingStatus::Succeeded => &mut report.succeeded,
        FilingStatus::Partial => &mut report.partial,
        FilingStatus::Failed => &mut report.failed,
    };
    bucket.push(accession.to_string());
}

impl Extraction {
    /// Convenience for callers that only need the happy path.
    pub fn into_parts(self) -> (Vec<Fact>, Vec<TextSubsection>) {
        (
            self.facts.unwrap_or_default(),
            self.subsections.unwrap_or_default(),
        )
    }
}
