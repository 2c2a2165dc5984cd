//! FILENAME: core/report-engine/src/lib.rs
//! Report subsystem: presentation of grouped results.
//!
//! Depends on `group-engine` for result rows and ordering.
//!
//! Layers:
//! - `definition`: Header labels and layout options (what the report IS)
//! - `engine`: Hierarchical shaping with rollups (HOW groups nest)
//! - `view`: Export grid with styles and merges (WHAT we write)

pub mod definition;
pub mod engine;
pub mod view;

pub use definition::*;
pub use crate::engine::{shape, ReportGroup, ReportTree};
pub use view::*;
