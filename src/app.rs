//! Top-level application orchestration.
//!
//! `src/main.rs` is intentionally tiny; this module is the "real main" that:
//! - parses CLI arguments and sets up logging
//! - builds the session and completion client from config
//! - runs the one-shot report, the TUI, or a saved-series plot

use std::io::Write;

use clap::Parser;
use tracing::{info, warn};

use crate::cli::{Command, PlotArgs, ReportArgs, SessionArgs, TuiArgs};
use crate::domain::{InsightConfig, SessionConfig};
use crate::error::AppError;
use crate::insight::{CompletionService, WriterClient};
use crate::io::Upload;

pub mod state;

pub use state::Session;

/// Entry point for the `stocks` binary.
pub fn run() -> Result<(), AppError> {
    // `stocks` and `stocks prices.csv` should behave like `stocks tui ...`.
    //
    // Clap requires a subcommand name, so we do a small, explicit rewrite of the
    // argv list before parsing.
    let argv = rewrite_args(std::env::args().collect());
    let cli = crate::cli::Cli::parse_from(argv);

    let is_tui = matches!(cli.command, Command::Tui(_));
    crate::logging::init(cli.log_file.as_deref(), !is_tui)?;

    match cli.command {
        Command::Report(args) => handle_report(args),
        Command::Tui(args) => handle_tui(args),
        Command::Plot(args) => handle_plot(args),
    }
}

fn handle_report(args: ReportArgs) -> Result<(), AppError> {
    let (session_config, insight_config) = configs_from_args(&args.session);
    let service = completion_service(&args.session, &insight_config)?;

    let mut session = Session::new(session_config, insight_config);
    let upload = Upload::from_path(&args.csv)?;
    session.ingest(&upload)?;

    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    write_report(
        &mut out,
        &mut session,
        &args,
        service.as_ref().map(|s| s as &dyn CompletionService),
    )
}

/// Analyze an ingested session and print the report.
///
/// A view error skips the table, chart and exports but the analysis and status
/// are still printed; the error is returned only after all output is written.
fn write_report<W: Write>(
    out: &mut W,
    session: &mut Session,
    args: &ReportArgs,
    service: Option<&dyn CompletionService>,
) -> Result<(), AppError> {
    let io_err = |e: std::io::Error| AppError::new(2, format!("Failed to write report: {e}"));

    writeln!(out, "{}", session.status()).map_err(io_err)?;
    session.analyze(service);

    let shown = session.show(args.view);
    match &shown {
        Ok(()) => write_view_section(out, session, args).map_err(io_err)?,
        Err(_) => writeln!(out, "{}\n", session.status()).map_err(io_err)?,
    }
    if shown.is_ok() {
        run_exports(session, args)?;
    } else if args.export_view.is_some() || args.export_chart.is_some() {
        warn!("view failed; skipping exports");
    }

    if let Some(result) = session.analysis() {
        writeln!(out, "{}", crate::report::format_analysis(result)).map_err(io_err)?;
    }
    writeln!(out, "{}", session.status()).map_err(io_err)?;
    out.flush().map_err(io_err)?;

    shown.map_err(AppError::from)
}

fn write_view_section<W: Write>(out: &mut W, session: &Session, args: &ReportArgs) -> std::io::Result<()> {
    match session.view() {
        Some(view) => writeln!(out, "{}", crate::report::format_view_table(view))?,
        None => writeln!(out, "No records to display.\n")?,
    }

    if let Some(series) = session.chart() {
        writeln!(out, "{}", crate::report::format_series_summary(series))?;
        if !args.no_plot {
            writeln!(out, "{}", crate::plot::render_ascii_plot(series, args.width, args.height))?;
        }
    }
    Ok(())
}

fn run_exports(session: &Session, args: &ReportArgs) -> Result<(), AppError> {
    if let Some(path) = &args.export_view {
        match session.view() {
            Some(view) => {
                crate::io::export::write_view_csv(path, view)?;
                info!(path = %path.display(), "view exported");
            }
            None => warn!("no view to export; skipping {}", path.display()),
        }
    }
    if let Some(path) = &args.export_chart {
        match session.chart() {
            Some(series) => {
                crate::io::series::write_series_json(path, session.symbol(), session.mode(), series)?;
                info!(path = %path.display(), "chart series exported");
            }
            None => warn!("no chart to export; skipping {}", path.display()),
        }
    }
    Ok(())
}

fn handle_tui(args: TuiArgs) -> Result<(), AppError> {
    let (session_config, insight_config) = configs_from_args(&args.session);
    let service = completion_service(&args.session, &insight_config)?;
    let session = Session::new(session_config, insight_config);
    crate::tui::run(session, service, args.csv)
}

fn handle_plot(args: PlotArgs) -> Result<(), AppError> {
    let doc = crate::io::series::read_series_json(&args.series)?;
    println!("{} ({})", doc.symbol, doc.view.display_name());
    println!("{}", crate::plot::render_ascii_plot(&doc.series, args.width, args.height));
    Ok(())
}

pub fn configs_from_args(args: &SessionArgs) -> (SessionConfig, InsightConfig) {
    let session = SessionConfig {
        tail_policy: args.tail_policy,
        insight_enabled: !args.no_insight,
    };
    let insight = InsightConfig {
        symbol: args.symbol.clone(),
        model: args.model.clone(),
        temperature: args.temperature,
        max_tokens: args.max_tokens,
        timeout: std::time::Duration::from_secs(args.timeout_secs),
    };
    (session, insight)
}

/// The completion client, or `None` when insight is switched off.
fn completion_service(args: &SessionArgs, insight: &InsightConfig) -> Result<Option<WriterClient>, AppError> {
    if args.no_insight {
        return Ok(None);
    }
    WriterClient::from_env(insight.timeout).map(Some)
}

const SUBCOMMANDS: [&str; 3] = ["report", "tui", "plot"];

/// Rewrite argv so `stocks` defaults to `stocks tui`.
///
/// Rules:
/// - `stocks`                       -> `stocks tui`
/// - `stocks prices.csv ...`        -> `stocks tui prices.csv ...`
/// - `stocks --no-insight ...`      -> `stocks tui --no-insight ...`
/// - `stocks --help/--version/-h`   -> unchanged (show top-level help/version)
/// - any argv naming a subcommand   -> unchanged
fn rewrite_args(mut argv: Vec<String>) -> Vec<String> {
    let Some(arg1) = argv.get(1).cloned() else {
        argv.push("tui".to_string());
        return argv;
    };

    let is_top_level_help_or_version = matches!(
        arg1.as_str(),
        "-h" | "--help" | "-V" | "--version" | "help"
    );
    if is_top_level_help_or_version {
        return argv;
    }

    let has_subcommand = argv[1..].iter().any(|a| SUBCOMMANDS.contains(&a.as_str()));
    if has_subcommand {
        return argv;
    }

    argv.insert(1, "tui".to_string());
    argv
}
