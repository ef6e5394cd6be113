//! Data ingestion layer for SentinelChat.
//!
//! Reads chat transcript exports from disk, reconstructs them into ordered
//! message records and aggregates classifier verdicts into summary counts.

pub mod aggregator;
pub mod parser;
pub mod reader;

pub use sentinel_core as core;
