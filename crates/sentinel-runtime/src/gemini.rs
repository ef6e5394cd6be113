//! Gemini-backed [`ThreatClassifier`].
//!
//! Sends each batch to the `generateContent` REST endpoint with a system
//! instruction describing the analyst's task and a response schema, then
//! decodes the JSON array it returns with [`decode_results`].

use std::time::Duration;

use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{debug, info, warn};

use sentinel_core::error::{Result, SentinelError};
use sentinel_core::models::{ClassificationItem, ClassificationResult, MessageRecord, ThreatLevel};
use sentinel_core::settings::{SchemaPolicy, Settings};

use crate::classifier::ThreatClassifier;
use crate::response::decode_results;

/// Attempts per batch before the classifier gives up.
const MAX_RETRY_ATTEMPTS: u32 = 3;

/// Back-off step between attempts (0 ms, 100 ms, 200 ms).
const RETRY_STEP: Duration = Duration::from_millis(100);

/// Upper bound for a single request.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

const SYSTEM_INSTRUCTION: &str = "You are a world-class Cybersecurity Analyst and NLP specialist. \
Your task is to identify fraudulent or threatening messages in a chat history.
High-risk indicators:
- Requests for passwords, OTPs, or banking details.
- Suspicious external links (especially shortened ones).
- Extreme urgency or fear-based tactics.
- \"Too good to be true\" offers or lottery wins.
- Impersonation of officials or support.

Respond ONLY with a JSON array of result objects matching the schema.";

const TASK_PREAMBLE: &str = "Analyze these chat messages for cyber threats (phishing, financial fraud, \
social engineering, identity theft, malicious links, urgency tactics).";

// ── Wire types ────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<Content>,
}

#[derive(Debug, Deserialize)]
struct Content {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Deserialize)]
struct Part {
    text: Option<String>,
}

impl GenerateContentResponse {
    /// Concatenated text of the first candidate's parts.
    fn into_text(self) -> Option<String> {
        let content = self.candidates.into_iter().next()?.content?;
        let text: String = content.parts.into_iter().filter_map(|p| p.text).collect();
        if text.is_empty() {
            None
        } else {
            Some(text)
        }
    }
}

/// Outcome of one failed HTTP attempt.
enum AttemptError {
    /// Worth trying again (transport failure, 429, 5xx).
    Retryable(String),
    /// Trying again will not help (other 4xx, unreadable body).
    Fatal(String),
}

// ── GeminiClassifier ──────────────────────────────────────────────────────────

/// Classifier that calls the Gemini `generateContent` API.
///
/// # Example
/// ```no_run
/// use sentinel_runtime::gemini::GeminiClassifier;
/// use sentinel_core::settings::{SchemaPolicy, DEFAULT_ENDPOINT, DEFAULT_MODEL};
///
/// let classifier = GeminiClassifier::new(
///     Some("my-key"),
///     DEFAULT_MODEL,
///     DEFAULT_ENDPOINT,
///     SchemaPolicy::Strict,
/// )
/// .unwrap();
/// assert_eq!(classifier.model(), DEFAULT_MODEL);
/// ```
#[derive(Clone)]
pub struct GeminiClassifier {
    client: reqwest::Client,
    api_key: String,
    model: String,
    endpoint: String,
    schema_policy: SchemaPolicy,
    retry_step: Duration,
}

impl GeminiClassifier {
    /// Build a classifier. Fails with [`SentinelError::MissingApiKey`] when no
    /// usable key is given, before any request is made.
    pub fn new(
        api_key: Option<&str>,
        model: &str,
        endpoint: &str,
        schema_policy: SchemaPolicy,
    ) -> Result<Self> {
        let api_key = api_key
            .map(str::trim)
            .filter(|k| !k.is_empty())
            .ok_or(SentinelError::MissingApiKey)?;

        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| SentinelError::Http(e.to_string()))?;

        info!("Gemini classifier initialized (model: {})", model);

        Ok(Self {
            client,
            api_key: api_key.to_string(),
            model: model.to_string(),
            endpoint: endpoint.trim_end_matches('/').to_string(),
            schema_policy,
            retry_step: RETRY_STEP,
        })
    }

    /// Build a classifier from CLI settings.
    pub fn from_settings(settings: &Settings) -> Result<Self> {
        Self::new(
            settings.api_key.as_deref(),
            &settings.model,
            &settings.endpoint,
            settings.schema_policy,
        )
    }

    /// Override the back-off step between attempts.
    pub fn with_retry_step(mut self, step: Duration) -> Self {
        self.retry_step = step;
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn url(&self) -> String {
        format!(
            "{}/models/{}:generateContent?key={}",
            self.endpoint, self.model, self.api_key
        )
    }

    /// Request body for one batch.
    pub fn build_request(batch: &[MessageRecord]) -> Value {
        let items: Vec<ClassificationItem> = batch.iter().map(ClassificationItem::from).collect();
        let messages = serde_json::to_string(&items).unwrap_or_else(|_| "[]".to_string());
        let levels: Vec<&str> = ThreatLevel::ALL.iter().map(|l| l.as_str()).collect();

        json!({
            "systemInstruction": { "parts": [{ "text": SYSTEM_INSTRUCTION }] },
            "contents": [{
                "role": "user",
                "parts": [{ "text": format!("{TASK_PREAMBLE}\nMessages: {messages}") }]
            }],
            "generationConfig": {
                "responseMimeType": "application/json",
                "responseSchema": {
                    "type": "ARRAY",
                    "items": {
                        "type": "OBJECT",
                        "properties": {
                            "messageId": { "type": "STRING", "description": "The ID of the message being analyzed" },
                            "isThreat": { "type": "BOOLEAN", "description": "True if any threat is detected" },
                            "threatLevel": { "type": "STRING", "enum": levels, "description": "The severity of the threat" },
                            "threatType": { "type": "STRING", "description": "Short label like 'Phishing', 'Social Engineering', etc." },
                            "explanation": { "type": "STRING", "description": "Concise explanation of why this is a threat" }
                        },
                        "required": ["messageId", "isThreat", "threatLevel", "threatType", "explanation"]
                    }
                }
            }
        })
    }

    /// POST `body` up to [`MAX_RETRY_ATTEMPTS`] times and return the reply text.
    async fn generate_with_retry(&self, body: &Value) -> Result<String> {
        let mut last_err = String::new();

        for attempt in 0..MAX_RETRY_ATTEMPTS {
            if attempt > 0 {
                let delay = self.retry_step * attempt;
                let delay_ms = delay.as_millis() as u64;
                debug!(attempt, delay_ms, "retrying classification after back-off");
                tokio::time::sleep(delay).await;
            }

            match self.generate_once(body).await {
                Ok(text) => return Ok(text),
                Err(AttemptError::Retryable(e)) => {
                    warn!(attempt, error = %e, "classification attempt failed");
                    last_err = e;
                }
                Err(AttemptError::Fatal(e)) => {
                    warn!(attempt, error = %e, "classification request rejected");
                    return Err(SentinelError::Classification(e));
                }
            }
        }

        Err(SentinelError::Classification(last_err))
    }

    async fn generate_once(&self, body: &Value) -> std::result::Result<String, AttemptError> {
        let resp = self
            .client
            .post(self.url())
            .json(body)
            .send()
            .await
            .map_err(|e| AttemptError::Retryable(e.without_url().to_string()))?;

        let status = resp.status();
        if !status.is_success() {
            let detail = resp.text().await.unwrap_or_default();
            let message = format!("Gemini API error: {} {}", status, detail.trim());
            return if status.is_client_error() && status.as_u16() != 429 {
                Err(AttemptError::Fatal(message))
            } else {
                Err(AttemptError::Retryable(message))
            };
        }

        let data: GenerateContentResponse = resp
            .json()
            .await
            .map_err(|e| AttemptError::Retryable(e.without_url().to_string()))?;

        data.into_text()
            .ok_or_else(|| AttemptError::Fatal("Gemini reply has no candidate text".to_string()))
    }
}

impl std::fmt::Debug for GeminiClassifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeminiClassifier")
            .field("api_key", &"<redacted>")
            .field("model", &self.model)
            .field("endpoint", &self.endpoint)
            .field("schema_policy", &self.schema_policy)
            .finish()
    }
}

impl ThreatClassifier for GeminiClassifier {
    async fn classify(&self, batch: &[MessageRecord]) -> Result<Vec<ClassificationResult>> {
        if batch.is_empty() {
            return Ok(Vec::new());
        }

        let body = Self::build_request(batch);
        let text = self.generate_with_retry(&body).await?;
        let results = decode_results(&text, self.schema_policy);

        debug!(
            submitted = batch.len(),
            returned = results.len(),
            "classified batch"
        );
        Ok(results)
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use sentinel_core::settings::DEFAULT_MODEL;
    use wiremock::matchers::{body_partial_json, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const GENERATE_PATH: &str = "/models/gemini-3-flash-preview:generateContent";

    fn batch() -> Vec<MessageRecord> {
        vec![
            MessageRecord::new("msg-0", "1/2/24, 09:00", "Mum", "Lunch at 1?"),
            MessageRecord::new("msg-1", "1/2/24, 09:05", "Bank", "Send your OTP to unblock"),
        ]
    }

    fn reply(text: &str) -> Value {
        json!({
            "candidates": [{
                "content": { "role": "model", "parts": [{ "text": text }] }
            }]
        })
    }

    fn verdicts() -> String {
        json!([
            { "messageId": "msg-0", "isThreat": false, "threatLevel": "SAFE", "threatType": "None", "explanation": "Family chat" },
            { "messageId": "msg-1", "isThreat": true, "threatLevel": "CRITICAL", "threatType": "Phishing", "explanation": "Requests an OTP" }
        ])
        .to_string()
    }

    fn classifier(server: &MockServer) -> GeminiClassifier {
        GeminiClassifier::new(Some("test-key"), DEFAULT_MODEL, &server.uri(), SchemaPolicy::Strict)
            .unwrap()
            .with_retry_step(Duration::ZERO)
    }

    #[test]
    fn test_missing_api_key() {
        let err = GeminiClassifier::new(None, DEFAULT_MODEL, "http://x", SchemaPolicy::Strict).unwrap_err();
        assert!(matches!(err, SentinelError::MissingApiKey));

        let err = GeminiClassifier::new(Some("  "), DEFAULT_MODEL, "http://x", SchemaPolicy::Strict).unwrap_err();
        assert!(matches!(err, SentinelError::MissingApiKey));
    }

    #[test]
    fn test_debug_output_hides_api_key() {
        let c = GeminiClassifier::new(Some("secret-123"), DEFAULT_MODEL, "http://x", SchemaPolicy::Strict).unwrap();
        let out = format!("{:?}", c);
        assert!(!out.contains("secret-123"));
        assert!(out.contains("<redacted>"));
    }

    #[test]
    fn test_build_request_embeds_messages_and_schema() {
        let body = GeminiClassifier::build_request(&batch());
        let prompt = body["contents"][0]["parts"][0]["text"].as_str().unwrap();
        assert!(prompt.contains(r#"{"id":"msg-1","sender":"Bank","text":"Send your OTP to unblock"}"#));
        assert_eq!(body["generationConfig"]["responseMimeType"], "application/json");
        let levels = &body["generationConfig"]["responseSchema"]["items"]["properties"]["threatLevel"]["enum"];
        assert_eq!(levels, &json!(["SAFE", "LOW", "MEDIUM", "HIGH", "CRITICAL"]));
        assert!(body["systemInstruction"]["parts"][0]["text"]
            .as_str()
            .unwrap()
            .contains("Cybersecurity Analyst"));
    }

    #[test]
    fn test_reply_text_concatenates_parts() {
        let data: GenerateContentResponse = serde_json::from_value(json!({
            "candidates": [{ "content": { "parts": [{ "text": "[{\"a\":" }, { "text": "1}]" }] } }]
        }))
        .unwrap();
        assert_eq!(data.into_text().as_deref(), Some("[{\"a\":1}]"));
    }

    #[tokio::test]
    async fn test_classify_success() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(GENERATE_PATH))
            .and(query_param("key", "test-key"))
            .and(body_partial_json(json!({
                "generationConfig": { "responseMimeType": "application/json" }
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(reply(&verdicts())))
            .expect(1)
            .mount(&server)
            .await;

        let results = classifier(&server).classify(&batch()).await.unwrap();
        assert_eq!(results.len(), 2);
        assert_eq!(results[1].threat_level, ThreatLevel::Critical);
        assert_eq!(results[1].threat_type, "Phishing");
    }

    #[tokio::test]
    async fn test_classify_retries_server_errors() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(GENERATE_PATH))
            .respond_with(ResponseTemplate::new(503))
            .up_to_n_times(2)
            .expect(2)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path(GENERATE_PATH))
            .respond_with(ResponseTemplate::new(200).set_body_json(reply(&verdicts())))
            .expect(1)
            .mount(&server)
            .await;

        let results = classifier(&server).classify(&batch()).await.unwrap();
        assert_eq!(results.len(), 2);
    }

    #[tokio::test]
    async fn test_classify_gives_up_after_three_attempts() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(500).set_body_string("internal"))
            .expect(3)
            .mount(&server)
            .await;

        let err = classifier(&server).classify(&batch()).await.unwrap_err();
        match err {
            SentinelError::Classification(msg) => assert!(msg.contains("500")),
            e => panic!("Expected Classification error, got: {e}"),
        }
    }

    #[tokio::test]
    async fn test_classify_does_not_retry_bad_request() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(400).set_body_string("API key not valid"))
            .expect(1)
            .mount(&server)
            .await;

        let err = classifier(&server).classify(&batch()).await.unwrap_err();
        assert!(err.to_string().contains("API key not valid"));
    }

    #[tokio::test]
    async fn test_classify_retries_rate_limit() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(429))
            .up_to_n_times(1)
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(reply(&verdicts())))
            .mount(&server)
            .await;

        assert_eq!(classifier(&server).classify(&batch()).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_classify_unparseable_text_is_empty_result() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(reply("not json at all")))
            .mount(&server)
            .await;

        let results = classifier(&server).classify(&batch()).await.unwrap();
        assert!(results.is_empty());
    }

    #[tokio::test]
    async fn test_classify_missing_candidate_is_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "candidates": [] })))
            .expect(1)
            .mount(&server)
            .await;

        let err = classifier(&server).classify(&batch()).await.unwrap_err();
        assert!(matches!(err, SentinelError::Classification(_)));
    }

    #[tokio::test]
    async fn test_classify_empty_batch_makes_no_request() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(500))
            .expect(0)
            .mount(&server)
            .await;

        assert!(classifier(&server).classify(&[]).await.unwrap().is_empty());
    }
}
