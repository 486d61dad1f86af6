//! Shared building blocks for the sakibox terminal toolbox.
//!
//! Holds the process and viewport models exchanged between the data, UI and
//! runtime crates, the common error type, and the CLI / persisted settings.

pub mod error;
pub mod models;
pub mod settings;
