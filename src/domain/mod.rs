//! Domain types used throughout the pipeline.
//!
//! This module defines:
//!
//! - parsed stock rows and the canonical record set
//! - display views and chart series derived from it
//! - insight results and run configuration

pub mod types;

pub use types::*;
