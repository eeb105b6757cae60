//! Command-line parsing for the stock insight tool.
//!
//! The goal of this module is to keep **argument parsing** and **command dispatch**
//! separate from the pipeline code.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::domain::{
    DEFAULT_MAX_TOKENS, DEFAULT_MODEL, DEFAULT_SYMBOL, DEFAULT_TEMPERATURE, DEFAULT_TIMEOUT_SECS, TailPolicy,
    ViewKind,
};

pub mod picker;

/// Top-level CLI.
#[derive(Debug, Parser)]
#[command(name = "stocks", version, about = "Daily stock price viewer with AI-generated insights")]
pub struct Cli {
    /// Append logs to this file (the TUI logs nowhere without it).
    #[arg(long, global = true, value_name = "PATH")]
    pub log_file: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

/// CLI subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Load a CSV, print the selected view, a chart, and the insight.
    Report(ReportArgs),
    /// Launch the interactive TUI.
    Tui(TuiArgs),
    /// Plot a previously exported chart series.
    Plot(PlotArgs),
}

/// Options shared by every command that uploads a file.
#[derive(Debug, Args, Clone)]
pub struct SessionArgs {
    /// Ticker symbol named in the prompt and the title.
    #[arg(long, default_value = DEFAULT_SYMBOL)]
    pub symbol: String,

    /// How the "last seven" window is cut from the newest-first record set.
    #[arg(long, value_enum, default_value_t = TailPolicy::CanonicalTail)]
    pub tail_policy: TailPolicy,

    /// Skip the completion call entirely.
    #[arg(long)]
    pub no_insight: bool,

    /// Completion model identifier.
    #[arg(long, default_value = DEFAULT_MODEL)]
    pub model: String,

    /// Sampling temperature.
    #[arg(long, default_value_t = DEFAULT_TEMPERATURE)]
    pub temperature: f64,

    /// Maximum output tokens.
    #[arg(long, default_value_t = DEFAULT_MAX_TOKENS)]
    pub max_tokens: u32,

    /// Request timeout (seconds) for the completion call.
    #[arg(long, default_value_t = DEFAULT_TIMEOUT_SECS)]
    pub timeout_secs: u64,
}

#[derive(Debug, Args, Clone)]
pub struct ReportArgs {
    /// Input CSV (`timestamp,open,high,low,close,volume`).
    #[arg(value_name = "CSV")]
    pub csv: PathBuf,

    /// Which view to print.
    #[arg(long, value_enum, default_value_t = ViewKind::All)]
    pub view: ViewKind,

    #[command(flatten)]
    pub session: SessionArgs,

    /// Disable the terminal chart.
    #[arg(long)]
    pub no_plot: bool,

    /// Chart width (columns).
    #[arg(long, default_value_t = 80)]
    pub width: usize,

    /// Chart height (rows).
    #[arg(long, default_value_t = 20)]
    pub height: usize,

    /// Export the printed view to CSV.
    #[arg(long = "export-view", value_name = "CSV")]
    pub export_view: Option<PathBuf>,

    /// Export the chart series to JSON.
    #[arg(long = "export-chart", value_name = "JSON")]
    pub export_chart: Option<PathBuf>,
}

#[derive(Debug, Args, Clone)]
pub struct TuiArgs {
    /// CSV to load on start (press `o` in the TUI to open another).
    #[arg(value_name = "CSV")]
    pub csv: Option<PathBuf>,

    #[command(flatten)]
    pub session: SessionArgs,
}

/// Options for plotting a saved series.
#[derive(Debug, Parser)]
pub struct PlotArgs {
    /// Series JSON file produced by `stocks report --export-chart`.
    #[arg(long, value_name = "JSON")]
    pub series: PathBuf,

    /// Plot width (columns).
    #[arg(long, default_value_t = 80)]
    pub width: usize,

    /// Plot height (rows).
    #[arg(long, default_value_t = 20)]
    pub height: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn report_defaults() {
        let cli = Cli::parse_from(["stocks", "report", "ibm.csv"]);
        let Command::Report(args) = cli.command else {
            panic!("expected report");
        };
        assert_eq!(args.view, ViewKind::All);
        assert_eq!(args.session.tail_policy, TailPolicy::CanonicalTail);
        assert_eq!(args.session.model, "palmyra-fin-32k");
        assert_eq!(args.session.max_tokens, 250);
        assert!(!args.session.no_insight);
    }

    #[test]
    fn view_and_policy_flags() {
        let cli = Cli::parse_from([
            "stocks",
            "report",
            "ibm.csv",
            "--view",
            "last-seven",
            "--tail-policy",
            "most-recent",
            "--no-insight",
        ]);
        let Command::Report(args) = cli.command else {
            panic!("expected report");
        };
        assert_eq!(args.view, ViewKind::LastSeven);
        assert_eq!(args.session.tail_policy, TailPolicy::MostRecent);
        assert!(args.session.no_insight);
    }
}
