//! Shared building blocks for SentinelChat.
//!
//! Holds the message and verdict data model, the error type, CLI settings
//! with persisted last-used values, and text formatting helpers.

pub mod error;
pub mod formatting;
pub mod models;
pub mod settings;
