// Analysis pipeline: collect, extract, score, persist.
use crate::llm::LlmClient;
use crate::pdf_text::{extract_corpus, UploadedDocument};
use crate::schemas::{demo_report, IntelligenceReport, ReportProvenance};
use crate::scoring::{display_confidence, risk_score};
use crate::storage::StorageBackend;
use serde::Serialize;
use std::fmt;
use std::sync::Arc;
use tracing::{info, warn};

/// Inputs of one user-triggered run. Built per request; replaces the
/// process-wide UI state the dashboard used to mutate.
#[derive(Debug, Default)]
pub struct RunContext {
    pub pasted_text: String,
    pub documents: Vec<UploadedDocument>,
    pub api_key: Option<String>,
}

/// Everything a run produced, echoed back to the caller after persisting.
#[derive(Debug, Clone, Serialize)]
pub struct AnalysisOutcome {
    pub id: i64,
    #[serde(flatten)]
    pub report: IntelligenceReport,
    pub risk_score: i64,
    pub confidence: i64,
    pub provenance: ReportProvenance,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fallback_reason: Option<String>,
    pub created_at: String,
}

#[derive(Debug)]
pub enum RunError {
    /// Nothing to analyze: no pasted text and no readable document text.
    EmptyCorpus,
    /// Persistence failed; fatal to the run, nothing was produced.
    Storage(anyhow::Error),
}

impl fmt::Display for RunError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RunError::EmptyCorpus => {
                write!(f, "paste some text or upload at least one readable PDF")
            }
            RunError::Storage(err) => write!(f, "report storage failed: {err}"),
        }
    }
}

impl std::error::Error for RunError {}

pub struct Orchestrator {
    llm: LlmClient,
    storage: Arc<dyn StorageBackend>,
}

impl Orchestrator {
    pub fn new(llm: LlmClient, storage: Arc<dyn StorageBackend>) -> Self {
        Self { llm, storage }
    }

    /// Runs the full pipeline synchronously. An extraction failure of any
    /// kind substitutes the fixed demo report and is reported through the
    /// outcome's provenance rather than as an error.
    pub async fn run(&self, ctx: RunContext) -> Result<AnalysisOutcome, RunError> {
        let corpus = collect_corpus(&ctx);
        if corpus.trim().is_empty() {
            return Err(RunError::EmptyCorpus);
        }

        let (report, provenance, fallback_reason) = match self
            .llm
            .extract_report(&corpus, ctx.api_key.as_deref())
            .await
        {
            Ok(report) => (report, ReportProvenance::Model, None),
            Err(err) => {
                warn!("extraction unavailable, substituting demo report: {err}");
                (demo_report(), ReportProvenance::Fallback, Some(err.to_string()))
            }
        };

        let risk_score = risk_score(&report.risks);
        let confidence = display_confidence();

        let id = self
            .storage
            .save_report(
                &report.summary,
                &report.risks,
                &report.key_findings,
                &report.strategic_recommendation,
                risk_score,
                confidence,
            )
            .map_err(RunError::Storage)?;
        let created_at = self
            .storage
            .fetch_report(id)
            .map_err(RunError::Storage)?
            .map(|record| record.created_at)
            .unwrap_or_default();

        info!(report_id = id, risk_score, ?provenance, "analysis run complete");
        Ok(AnalysisOutcome {
            id,
            report,
            risk_score,
            confidence,
            provenance,
            fallback_reason,
            created_at,
        })
    }
}

/// Gathers pasted text and PDF-extracted text into one corpus, in that
/// order, newline separated.
fn collect_corpus(ctx: &RunContext) -> String {
    let mut corpus = String::new();
    let pasted = ctx.pasted_text.trim();
    if !pasted.is_empty() {
        corpus.push_str(pasted);
        corpus.push('\n');
    }
    corpus.push_str(&extract_corpus(&ctx.documents));
    corpus
}
