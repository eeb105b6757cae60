//! Reporting utilities: terminal tables, summaries, and the prompt dataset text.

pub mod format;

pub use format::*;
