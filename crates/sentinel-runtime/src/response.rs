//! Validation and decoding of classifier replies.
//!
//! The classifier is asked for a JSON array of verdict objects, but nothing
//! guarantees the reply honours that shape. Every element is checked field by
//! field before it becomes a [`ClassificationResult`]; what happens to a batch
//! containing bad elements is decided by [`SchemaPolicy`].

use sentinel_core::models::{ClassificationResult, ThreatLevel};
use sentinel_core::settings::SchemaPolicy;
use serde_json::Value;
use tracing::{debug, warn};

/// Decode the classifier's reply text into verdicts.
///
/// Text that is not a JSON array yields an empty result. Elements that fail
/// [`validate_result`] either empty the whole batch ([`SchemaPolicy::Strict`])
/// or are dropped individually ([`SchemaPolicy::Lenient`]).
pub fn decode_results(text: &str, policy: SchemaPolicy) -> Vec<ClassificationResult> {
    let value: Value = match serde_json::from_str(text.trim()) {
        Ok(v) => v,
        Err(e) => {
            warn!(error = %e, "classifier reply is not valid JSON");
            return Vec::new();
        }
    };

    let Some(entries) = value.as_array() else {
        warn!("classifier reply is not a JSON array");
        return Vec::new();
    };

    let mut results = Vec::with_capacity(entries.len());
    let mut rejected = 0usize;

    for (idx, entry) in entries.iter().enumerate() {
        let errors = validate_result(idx, entry);
        if !errors.is_empty() {
            for error in &errors {
                warn!("{}", error);
            }
            rejected += 1;
            continue;
        }
        if let Some(result) = to_result(entry) {
            results.push(result);
        }
    }

    if rejected > 0 && policy == SchemaPolicy::Strict {
        warn!(
            rejected,
            total = entries.len(),
            "discarding classifier batch with invalid entries"
        );
        return Vec::new();
    }

    debug!(
        accepted = results.len(),
        rejected,
        "decoded classifier reply"
    );
    results
}

/// Check one reply element against the expected verdict shape.
///
/// Returns every problem found, each prefixed with the element index. An
/// empty list means the element is usable.
pub fn validate_result(idx: usize, entry: &Value) -> Vec<String> {
    let mut errors = Vec::new();

    if !entry.is_object() {
        errors.push(format!("result[{idx}]: must be a JSON object"));
        return errors;
    }

    for field in ["messageId", "threatType", "explanation"] {
        match entry.get(field) {
            None => errors.push(format!("result[{idx}]: missing required field '{field}'")),
            Some(v) if !v.is_string() => {
                errors.push(format!("result[{idx}]: '{field}' must be a string"))
            }
            _ => {}
        }
    }

    match entry.get("isThreat") {
        None => errors.push(format!("result[{idx}]: missing required field 'isThreat'")),
        Some(v) if !v.is_boolean() => {
            errors.push(format!("result[{idx}]: 'isThreat' must be a boolean"))
        }
        _ => {}
    }

    match entry.get("threatLevel") {
        None => errors.push(format!("result[{idx}]: missing required field 'threatLevel'")),
        Some(Value::String(s)) if ThreatLevel::parse(s).is_some() => {}
        Some(Value::String(s)) => {
            errors.push(format!("result[{idx}]: unknown threatLevel '{s}'"))
        }
        Some(_) => errors.push(format!("result[{idx}]: 'threatLevel' must be a string")),
    }

    errors
}

/// Build a verdict from an element that already passed validation.
fn to_result(entry: &Value) -> Option<ClassificationResult> {
    Some(ClassificationResult {
        message_id: entry["messageId"].as_str()?.to_string(),
        is_threat: entry["isThreat"].as_bool()?,
        threat_level: ThreatLevel::parse(entry["threatLevel"].as_str()?)?,
        threat_type: entry["threatType"].as_str()?.to_string(),
        explanation: entry["explanation"].as_str()?.to_string(),
    })
}

// ── Tests ─────────────────────────────────────────────────────────────────────
