//! Presentation layer for SentinelChat.
//!
//! Renders scanned sessions either as colored terminal text (header, summary
//! panel and one card per message, built on [`colored`]) or as JSON.

pub mod components;
pub mod json;
pub mod report;
pub mod themes;

pub use sentinel_core as core;
