//! # planner-core
//!
//! Core types, traits, configuration, and error handling for Planner,
//! plus the engine that turns raw spreadsheet rows into notifications:
//! date normalization, task classification, routine grid parsing,
//! change detection, and plain-text composition.

pub mod change;
pub mod compose;
pub mod config;
pub mod context;
pub mod dates;
pub mod error;
pub mod message;
pub mod routine;
pub mod tasks;
pub mod traits;

pub use config::shellexpand;
