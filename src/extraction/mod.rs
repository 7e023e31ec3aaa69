//! LLMExtractor (§4.2) — invokes the LLM, parses JSON into `ExtractedCase`, coerces enums.

pub mod prompt;

use crate::config::LlmConfig;
use crate::errors::{IngestError, Result};
use crate::models::{ExtractedCase, IssueOutcome};
use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;

/// The wire contract the engine depends on: prompt + case text -> raw JSON response
/// (§6 "LLM wire contract"). The engine is tested against this trait, not a concrete
/// vendor SDK.
#[async_trait]
pub trait LlmClient: Send + Sync {
    async fn complete(&self, prompt: &str) -> Result<String>;
}

#[derive(Debug, Deserialize)]
struct LlmResponse {
    #[serde(alias = "content", alias = "output")]
    response: serde_json::Value,
}

/// Default HTTP adapter built on `reqwest`.
pub struct HttpLlmClient {
    client: reqwest::Client,
    base_url: String,
    model: String,
}

impl HttpLlmClient {
    pub fn new(config: &LlmConfig) -> Result<Self> {
        let mut builder = reqwest::Client::builder().timeout(Duration::from_secs(config.timeout_seconds));
        if let Some(key) = &config.api_key {
            let mut headers = reqwest::header::HeaderMap::new();
            let value = reqwest::header::HeaderValue::from_str(&format!("Bearer {}", key))
                .map_err(|e| IngestError::Config {
                    message: format!("invalid LLM api key: {}", e),
                })?;
            headers.insert(reqwest::header::AUTHORIZATION, value);
            builder = builder.default_headers(headers);
        }
        let client = builder.build()?;
        Ok(Self {
            client,
            base_url: config.base_url.clone(),
            model: config.model.clone(),
        })
    }
}

#[async_trait]
impl LlmClient for HttpLlmClient {
    async fn complete(&self, prompt: &str) -> Result<String> {
        let url = format!("{}/extract", self.base_url.trim_end_matches('/'));
        let response = self
            .client
            .post(&url)
            .json(&serde_json::json!({
                "model": self.model,
                "prompt": prompt,
                "response_format": "json",
            }))
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(IngestError::NetworkError {
                service: url,
                details: format!("HTTP status {}", response.status()),
            });
        }

        let body: LlmResponse = response.json().await?;
        Ok(body.response.to_string())
    }
}

/// Parses and validates the LLM's raw JSON response into `ExtractedCase`, retrying once
/// with a stricter prompt on parse failure (§4.2 "Failure").
pub struct LlmExtractor<C: LlmClient> {
    client: C,
    truncation_cap_chars: usize,
}

impl<C: LlmClient> LlmExtractor<C> {
    pub fn new(client: C, truncation_cap_chars: usize) -> Self {
        Self {
            client,
            truncation_cap_chars,
        }
    }

    pub async fn extract(&self, case_file_id: &str, case_text: &str) -> Result<ExtractedCase> {
        let first_prompt = prompt::build_prompt(case_text, self.truncation_cap_chars, false);
        match self.try_extract_once(&first_prompt).await {
            Ok(extracted) => Ok(extracted),
            Err(first_err) => {
                tracing::warn!(case_file_id, error = %first_err, "LLM extraction failed, retrying once");
                let retry_prompt = prompt::build_prompt(case_text, self.truncation_cap_chars, true);
                self.try_extract_once(&retry_prompt).await.map_err(|second_err| {
                    IngestError::ExtractionFailed {
                        case_file_id: case_file_id.to_string(),
                        details: format!("first attempt: {}; retry: {}", first_err, second_err),
                    }
                })
            }
        }
    }

    async fn try_extract_once(&self, prompt: &str) -> Result<ExtractedCase> {
        let raw = self.client.complete(prompt).await?;
        let value: serde_json::Value = serde_json::from_str(&raw)?;
        parse_and_coerce(value)
    }
}

/// Validates enum membership and coerces out-of-range values to a neutral default where
/// permissible (e.g. `issue_outcome = Mixed`), rejecting where no neutral default exists.
///
/// `IssueOutcome` only deserializes its exact snake_case wire form, but the prompt asks
/// the model for Title-case values, so a known value is normalized to lowercase here
/// rather than passed through as-is.
fn parse_and_coerce(mut value: serde_json::Value) -> Result<ExtractedCase> {
    if let Some(issues) = value.get_mut("issues").and_then(|v| v.as_array_mut()) {
        for issue in issues.iter_mut() {
            if let Some(outcome) = issue.get("issue_outcome").and_then(|v| v.as_str()) {
                let normalized = if is_known_issue_outcome(outcome) {
                    outcome.to_lowercase()
                } else {
                    "mixed".to_string()
                };
                issue["issue_outcome"] = serde_json::json!(normalized);
            }
        }
    }

    serde_json::from_value(value).map_err(IngestError::from)
}

fn is_known_issue_outcome(s: &str) -> bool {
    matches!(
        s.to_lowercase().as_str(),
        "affirmed" | "dismissed" | "reversed" | "remanded" | "mixed"
    )
}

/// Neutral default used when an outcome cannot be determined.
pub const DEFAULT_ISSUE_OUTCOME: IssueOutcome = IssueOutcome::Mixed;

#[cfg(test)]
mod tests {
    use super::*;

    struct FixedClient(String);

    #[async_trait]
    impl LlmClient for FixedClient {
        async fn complete(&self, _prompt: &str) -> Result<String> {
            Ok(self.0.clone())
        }
    }

    #[tokio::test]
    async fn unknown_outcome_coerced_to_mixed() {
        let body = serde_json::json!({
            "title": null,
            "docket_number": null,
            "case_type": null,
            "stage_type": null,
            "appeal_outcome": null,
            "winner_legal_role": null,
            "winner_personal_role": null,
            "opinion_type": null,
            "parties": [],
            "attorneys": [],
            "judges": [],
            "issues": [{
                "issue_summary": "whether X",
                "decision_summary": null,
                "issue_outcome": "partially_affirmed",
                "winner_legal_role": null,
                "case_type_label": "Family Law",
                "category_label": "Custody",
                "subcategory_label": "Relocation",
                "arguments": [],
                "rcw_codes": []
            }],
            "citations": []
        })
        .to_string();

        let extractor = LlmExtractor::new(FixedClient(body), 25_000);
        let extracted = extractor.extract("694235", "some case text").await.unwrap();
        assert_eq!(extracted.issues.len(), 1);
        assert_eq!(extracted.issues[0].issue_outcome, Some(IssueOutcome::Mixed));
    }

    #[tokio::test]
    async fn title_case_known_outcome_is_normalized_to_snake_case() {
        let body = serde_json::json!({
            "title": null,
            "docket_number": null,
            "case_type": null,
            "stage_type": null,
            "appeal_outcome": null,
            "winner_legal_role": null,
            "winner_personal_role": null,
            "opinion_type": null,
            "parties": [],
            "attorneys": [],
            "judges": [],
            "issues": [{
                "issue_summary": "whether X",
                "decision_summary": null,
                "issue_outcome": "Affirmed",
                "winner_legal_role": null,
                "case_type_label": "Family Law",
                "category_label": "Custody",
                "subcategory_label": "Relocation",
                "arguments": [],
                "rcw_codes": []
            }],
            "citations": []
        })
        .to_string();

        let extractor = LlmExtractor::new(FixedClient(body), 25_000);
        let extracted = extractor.extract("694235", "some case text").await.unwrap();
        assert_eq!(extracted.issues[0].issue_outcome, Some(IssueOutcome::Affirmed));
    }

    #[tokio::test]
    async fn malformed_json_fails_after_retry() {
        let extractor = LlmExtractor::new(FixedClient("not json".to_string()), 25_000);
        let result = extractor.extract("694235", "some case text").await;
        assert!(result.is_err());
    }
}
