// LLM adapter: OpenAI-compatible chat-completions call for report extraction.
use crate::config::LlmConfig;
use crate::schemas::IntelligenceReport;
use reqwest::Client;
use serde::Serialize;
use serde_json::{json, Value};
use std::fmt;
use std::time::Duration;

const EXTRACTION_INSTRUCTION: &str = "You are an intelligence analyst. Extract a structured \
intelligence report from the user's text. Respond with a single JSON object and nothing else, \
using exactly these keys: \"summary\" (string, 2-3 sentences), \"key_findings\" (array of \
strings), \"risks\" (array of strings), \"strategic_recommendation\" (string).";

#[derive(Debug, Clone, Serialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

/// Why an extraction call produced no report. The orchestrator decides what
/// to do with each case; this client never substitutes data on its own.
#[derive(Debug)]
pub enum ExtractError {
    /// No credential in the request override or the configuration.
    MissingCredential,
    /// Transport failure or a non-success status from the API.
    Request(String),
    /// The reply could not be parsed into the report shape.
    Malformed(String),
}

impl fmt::Display for ExtractError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExtractError::MissingCredential => write!(f, "no API credential configured"),
            ExtractError::Request(detail) => write!(f, "extraction request failed: {detail}"),
            ExtractError::Malformed(detail) => write!(f, "model reply not usable: {detail}"),
        }
    }
}

impl std::error::Error for ExtractError {}

#[derive(Clone)]
pub struct LlmClient {
    http: Client,
    config: LlmConfig,
}

impl LlmClient {
    pub fn new(http: Client, config: LlmConfig) -> Self {
        Self { http, config }
    }

    /// Runs the structured-extraction call over the corpus. The credential is
    /// the per-request override when present, the configured key otherwise.
    pub async fn extract_report(
        &self,
        corpus: &str,
        api_key_override: Option<&str>,
    ) -> Result<IntelligenceReport, ExtractError> {
        let api_key = api_key_override
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .map(str::to_string)
            .or_else(|| self.config.api_key())
            .ok_or(ExtractError::MissingCredential)?;

        let messages = [
            ChatMessage {
                role: "system".to_string(),
                content: EXTRACTION_INSTRUCTION.to_string(),
            },
            ChatMessage {
                role: "user".to_string(),
                content: corpus.to_string(),
            },
        ];

        let mut request = self
            .http
            .post(self.endpoint())
            .bearer_auth(&api_key)
            .json(&self.build_payload(&messages));
        if let Some(timeout_s) = self.config.timeout_s {
            request = request.timeout(Duration::from_secs(timeout_s));
        }

        let response = request
            .send()
            .await
            .map_err(|err| ExtractError::Request(err.to_string()))?;
        let status = response.status();
        let body: Value = response.json().await.unwrap_or(Value::Null);
        if !status.is_success() {
            return Err(ExtractError::Request(format!("{status} {body}")));
        }

        let content = body
            .get("choices")
            .and_then(|value| value.get(0))
            .and_then(|value| value.get("message"))
            .and_then(|value| value.get("content"))
            .and_then(Value::as_str)
            .unwrap_or("");
        parse_report(content)
    }

    fn endpoint(&self) -> String {
        let base = self
            .config
            .base_url
            .clone()
            .unwrap_or_else(|| "https://api.openai.com".to_string());
        let base = base.trim_end_matches('/');
        if base.ends_with("/v1") {
            format!("{base}/chat/completions")
        } else {
            format!("{base}/v1/chat/completions")
        }
    }

    fn build_payload(&self, messages: &[ChatMessage]) -> Value {
        json!({
            "model": self.config.model.clone().unwrap_or_else(|| "gpt-4o".to_string()),
            "messages": messages,
            "temperature": self.config.temperature.unwrap_or(0.2),
        })
    }
}

/// Parses a model reply into the report shape, tolerating a fenced code
/// block around the JSON. An empty reply or one that deserializes to a
/// report with no content counts as malformed.
fn parse_report(content: &str) -> Result<IntelligenceReport, ExtractError> {
    let stripped = strip_code_fence(content);
    if stripped.is_empty() {
        return Err(ExtractError::Malformed("empty reply".to_string()));
    }
    let report: IntelligenceReport = serde_json::from_str(stripped)
        .map_err(|err| ExtractError::Malformed(err.to_string()))?;
    if report.is_empty() {
        return Err(ExtractError::Malformed(
            "reply carried no report fields".to_string(),
        ));
    }
    Ok(report)
}

fn strip_code_fence(content: &str) -> &str {
    let trimmed = content.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let rest = rest.strip_prefix("json").unwrap_or(rest);
    let rest = rest.strip_suffix("```").unwrap_or(rest);
    rest.trim()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn missing_credential_fails_before_any_request() {
        let client = LlmClient::new(Client::new(), LlmConfig::default());
        let result = client.extract_report("some corpus", None).await;
        assert!(matches!(result, Err(ExtractError::MissingCredential)));
    }

    #[test]
    fn endpoint_handles_bases_with_and_without_version() {
        let mut config = LlmConfig::default();
        config.base_url = Some("https://example.test/v1".to_string());
        let client = LlmClient::new(Client::new(), config.clone());
        assert_eq!(client.endpoint(), "https://example.test/v1/chat/completions");

        config.base_url = Some("https://example.test/".to_string());
        let client = LlmClient::new(Client::new(), config);
        assert_eq!(client.endpoint(), "https://example.test/v1/chat/completions");
    }

    #[test]
    fn parse_report_accepts_fenced_json() {
        let reply = "```json\n{\"summary\":\"s\",\"key_findings\":[\"f\"],\"risks\":[\"r\"],\
                     \"strategic_recommendation\":\"go\"}\n```";
        let report = parse_report(reply).expect("parse fenced reply");
        assert_eq!(report.summary, "s");
        assert_eq!(report.risks, vec!["r".to_string()]);
    }

    #[test]
    fn parse_report_rejects_prose_and_empty_objects() {
        assert!(matches!(
            parse_report("Sure! Here is the report you asked for."),
            Err(ExtractError::Malformed(_))
        ));
        assert!(matches!(
            parse_report("{}"),
            Err(ExtractError::Malformed(_))
        ));
        assert!(matches!(
            parse_report(""),
            Err(ExtractError::Malformed(_))
        ));
    }

    #[test]
    fn payload_carries_model_and_temperature_defaults() {
        let client = LlmClient::new(Client::new(), LlmConfig::default());
        let payload = client.build_payload(&[]);
        assert_eq!(payload["model"], json!("gpt-4o"));
        assert_eq!(payload["temperature"], json!(0.2));
    }
}
