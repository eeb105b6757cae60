//! Application state controller.
//!
//! `Session` owns everything a front-end displays: the canonical set, the
//! selected view and its chart, the latest insight, and a status line. Each
//! action computes new values first and swaps them in only on success, so a
//! failed upload or view build leaves the previous good state on screen.

use tracing::{info, warn};

use crate::chart;
use crate::domain::{AnalysisResult, CanonicalRecordSet, ChartSeries, DisplayView, InsightConfig, SessionConfig, ViewKind};
use crate::error::PipelineError;
use crate::insight::{self, CompletionService};
use crate::io::ingest::{self, Upload};
use crate::view;

pub const INITIAL_STATUS: &str = "Upload a CSV file to begin analysis.";
pub const INITIAL_ANALYSIS: &str = "Insights will be generated here.";

pub struct Session {
    config: SessionConfig,
    insight: InsightConfig,
    records: Option<CanonicalRecordSet>,
    file_name: Option<String>,
    mode: ViewKind,
    table_visible: bool,
    view: Option<DisplayView>,
    /// File the current view was built from; differs from `file_name` after a
    /// failed rebuild kept the previous view.
    view_file: Option<String>,
    chart: Option<ChartSeries>,
    analysis: Option<AnalysisResult>,
    /// Last view/chart failure, cleared by a successful rebuild.
    view_error: Option<String>,
    status: String,
}

impl Session {
    pub fn new(config: SessionConfig, insight: InsightConfig) -> Self {
        Self {
            config,
            insight,
            records: None,
            file_name: None,
            mode: ViewKind::All,
            table_visible: false,
            view: None,
            view_file: None,
            chart: None,
            analysis: None,
            view_error: None,
            status: INITIAL_STATUS.to_string(),
        }
    }

    /// Parse an upload and make it the current record set.
    ///
    /// On failure the previous set (if any) stays in place and only the status
    /// changes.
    pub fn ingest(&mut self, upload: &Upload) -> Result<(), PipelineError> {
        let set = match ingest::parse(&upload.bytes) {
            Ok(set) => set,
            Err(err) => {
                warn!(file = %upload.name, "upload rejected: {err}");
                self.status = format!("Error processing file: {err}");
                return Err(err);
            }
        };

        info!(file = %upload.name, rows = set.len(), "upload accepted");
        self.records = Some(set);
        self.file_name = Some(upload.name.clone());
        self.analysis = None;
        self.status = format!("File '{}' uploaded and processed successfully!", upload.name);
        if self.table_visible {
            // A view error is reported in the status line; the upload itself stands.
            let _ = self.rebuild_view();
        } else {
            self.view = None;
            self.view_file = None;
            self.chart = None;
            self.view_error = None;
        }
        Ok(())
    }

    /// Run the one insight request for the current set.
    pub fn analyze(&mut self, service: Option<&dyn CompletionService>) {
        let result = match service {
            Some(service) if self.config.insight_enabled => {
                insight::request_analysis(self.records.as_ref(), service, &self.insight)
            }
            _ => AnalysisResult::Failed("Insight disabled for this session.".to_string()),
        };
        self.analysis = Some(result);
        if let Some(name) = &self.file_name {
            // A view failure from the same upload stays visible.
            self.status = match &self.view_error {
                Some(err) => format!("Analysis complete for '{name}'. {err}"),
                None => format!("Analysis complete for '{name}'."),
            };
        }
    }

    /// Ingest then analyze. Returns the final status line.
    pub fn upload(
        &mut self,
        upload: &Upload,
        service: Option<&dyn CompletionService>,
    ) -> Result<&str, PipelineError> {
        self.ingest(upload)?;
        self.analyze(service);
        Ok(&self.status)
    }

    pub fn show_all(&mut self) -> Result<(), PipelineError> {
        self.show(ViewKind::All)
    }

    pub fn show_last_seven(&mut self) -> Result<(), PipelineError> {
        self.show(ViewKind::LastSeven)
    }

    pub fn show(&mut self, kind: ViewKind) -> Result<(), PipelineError> {
        self.mode = kind;
        self.table_visible = true;
        self.rebuild_view()
    }

    /// Rebuild view and chart for the current mode.
    ///
    /// A view error keeps the previous view and chart; a chart error keeps the
    /// new view but the previous chart.
    fn rebuild_view(&mut self) -> Result<(), PipelineError> {
        let built = match view::build(self.mode, self.records.as_ref(), self.config.tail_policy) {
            Ok(v) => v,
            Err(err) => {
                warn!(mode = ?self.mode, "view build failed: {err}");
                let mut message = format!("Error displaying {}: {err}", self.mode.display_name());
                if let Some(prev) = self.stale_view_file() {
                    message.push_str(&format!(" (still showing '{prev}')"));
                }
                self.view_error = Some(message.clone());
                self.status = message;
                return Err(err);
            }
        };

        let Some(new_view) = built else {
            self.table_visible = false;
            self.view = None;
            self.view_file = None;
            self.chart = None;
            self.view_error = None;
            return Ok(());
        };

        let projected = chart::project(Some(&new_view));
        self.view = Some(new_view);
        self.view_file = self.file_name.clone();
        match projected {
            Ok(series) => {
                self.chart = Some(series);
                self.view_error = None;
                Ok(())
            }
            Err(err) => {
                warn!("chart projection failed: {err}");
                let message = format!("Error updating chart: {err}");
                self.view_error = Some(message.clone());
                self.status = message;
                Err(err)
            }
        }
    }

    /// Name of the file behind a visible view that no longer matches the upload.
    fn stale_view_file(&self) -> Option<&str> {
        self.view.as_ref().filter(|_| self.table_visible)?;
        let from = self.view_file.as_deref()?;
        (Some(from) != self.file_name.as_deref()).then_some(from)
    }

    pub fn records(&self) -> Option<&CanonicalRecordSet> {
        self.records.as_ref()
    }

    pub fn file_name(&self) -> Option<&str> {
        self.file_name.as_deref()
    }

    pub fn mode(&self) -> ViewKind {
        self.mode
    }

    /// The view to display, or `None` when the table is hidden.
    pub fn view(&self) -> Option<&DisplayView> {
        self.view.as_ref().filter(|_| self.table_visible)
    }

    /// File the displayed view was built from.
    pub fn view_file_name(&self) -> Option<&str> {
        self.view().and(self.view_file.as_deref())
    }

    pub fn chart(&self) -> Option<&ChartSeries> {
        self.chart.as_ref().filter(|c| self.table_visible && !c.is_empty())
    }

    pub fn analysis(&self) -> Option<&AnalysisResult> {
        self.analysis.as_ref()
    }

    pub fn analysis_text(&self) -> &str {
        self.analysis.as_ref().map(AnalysisResult::text).unwrap_or(INITIAL_ANALYSIS)
    }

    pub fn status(&self) -> &str {
        &self.status
    }

    pub fn symbol(&self) -> &str {
        &self.insight.symbol
    }
}
