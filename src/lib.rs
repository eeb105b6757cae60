//! `stock-insight` library crate.
//!
//! The binary (`stocks`) is a thin wrapper around this library so that:
//!
//! - the ingest → view → chart → insight pipeline is testable without a terminal
//! - the report command and the TUI share one session controller

pub mod app;
pub mod chart;
pub mod cli;
pub mod domain;
pub mod error;
pub mod insight;
pub mod io;
pub mod logging;
pub mod plot;
pub mod report;
pub mod tui;
pub mod view;
