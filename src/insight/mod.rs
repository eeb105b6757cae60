//! Insight requests: one text-completion call per upload.
//!
//! The full canonical set is rendered as a text table, embedded in a fixed
//! analyst prompt, and sent once to a `CompletionService`. Whatever happens,
//! the caller gets an `AnalysisResult`; failures never propagate past
//! `request_analysis`.

use serde::Serialize;
use tracing::{info, warn};

use crate::domain::{AnalysisResult, CanonicalRecordSet, InsightConfig};
use crate::error::PipelineError;
use crate::report::format_records_text;

pub mod writer;

pub use writer::WriterClient;

/// Prefix of every failed-analysis message.
pub const ANALYSIS_ERROR_PREFIX: &str = "Error generating stock analysis";

/// Body of a completion call.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CompletionRequest {
    pub model: String,
    pub prompt: String,
    pub temperature: f64,
    pub max_tokens: u32,
}

/// A remote text-completion backend.
pub trait CompletionService {
    /// Issue exactly one completion call and return the raw generated text.
    fn complete(&self, request: &CompletionRequest) -> Result<String, PipelineError>;
}

/// Request an analysis of `set`.
///
/// Never fails: every error is folded into `AnalysisResult::Failed`.
pub fn request_analysis(
    set: Option<&CanonicalRecordSet>,
    service: &dyn CompletionService,
    config: &InsightConfig,
) -> AnalysisResult {
    match try_request(set, service, config) {
        Ok(text) => {
            info!(chars = text.len(), "insight received");
            AnalysisResult::Insight(text)
        }
        Err(err) => {
            let message = format!("{ANALYSIS_ERROR_PREFIX}: {err}");
            warn!("{message}");
            AnalysisResult::Failed(message)
        }
    }
}

fn try_request(
    set: Option<&CanonicalRecordSet>,
    service: &dyn CompletionService,
    config: &InsightConfig,
) -> Result<String, PipelineError> {
    let set = set.filter(|s| !s.is_empty()).ok_or(PipelineError::NoData)?;
    let request = CompletionRequest {
        model: config.model.clone(),
        prompt: build_prompt(set, &config.symbol),
        temperature: config.temperature,
        max_tokens: config.max_tokens,
    };
    let text = service.complete(&request)?;
    Ok(text.trim().to_string())
}

/// Build the analyst prompt around the full dataset.
pub fn build_prompt(set: &CanonicalRecordSet, symbol: &str) -> String {
    let data = format_records_text(set);
    format!(
        "You are a stock market analyst. Review the {symbol} daily price data below and \
write a concise analysis. Keep the whole response under 250 words.

<stock_data>
{data}</stock_data>

Cover the following, keeping each section short. Give every section a bold title \
(trends, analysis, recommendation):

1. Trends, inside <trends> tags:
- Notable price movements (1 sentence)
- Volume patterns (1 sentence)

2. Analysis, inside <analysis> tags:
- Recent performance summary (2 sentences)
- Key observations (1-2 sentences)

3. REQUIRED: Recommendation, inside <recommendation> tags:
- One clear buy/hold/sell call with a brief rationale
- Must start with \"Recommendation: BUY/HOLD/SELL\" followed by the explanation

4. Separate the sections with a newline.

Base the analysis only on the data provided. If it is not enough to judge, say so.
"
    )
}
