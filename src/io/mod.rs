//! Input/output helpers.
//!
//! - CSV ingest into the canonical record set (`ingest`)
//! - display view CSV export (`export`)
//! - chart series JSON read/write (`series`)

pub mod export;
pub mod ingest;
pub mod series;

pub use export::*;
pub use ingest::*;
pub use series::*;
