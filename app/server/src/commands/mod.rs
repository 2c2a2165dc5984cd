//! FILENAME: app/server/src/commands/mod.rs
// PURPOSE: HTTP handlers, grouped by concern.

pub mod analysis;
pub mod groups;
pub mod rows;
pub mod upload;
pub mod utils;

// Re-export handlers so they are accessible via crate::commands::*
pub use analysis::*;
pub use groups::*;
pub use rows::*;
pub use upload::*;
