//! Runtime layer for SentinelChat.
//!
//! Holds the classification seam, the Gemini client behind it, per-transcript
//! scan sessions and the orchestrator that drives them.

pub mod classifier;
pub mod gemini;
pub mod orchestrator;
pub mod response;
pub mod session;

pub use sentinel_core as core;
pub use sentinel_data as data;
