//! Groq chat-completion client for insight generation.
//!
//! Speaks the OpenAI-compatible chat protocol so any service exposing it
//! (Groq, a local gateway, a proxy) works by pointing `GROQ_API_URL`
//! elsewhere.

use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::prompt::{
    build_chart_prompt, build_summary_prompt, parse_insight_lines, INSIGHT_SYSTEM_PROMPT,
    SUMMARY_SYSTEM_PROMPT,
};
use super::types::InsightGenerator;
use super::InsightError;
use crate::pipeline::types::ChartRecord;

/// Default chat-completions endpoint.
const DEFAULT_API_URL: &str = "https://api.groq.com/openai/v1/chat/completions";

/// Default model when `GROQ_MODEL` is not set.
const DEFAULT_MODEL: &str = "llama3-70b-8192";

/// Request timeout. Insight calls are short generations; anything slower
/// than this indicates a stuck upstream.
const REQUEST_TIMEOUT_SECS: u64 = 120;

/// Language service configuration, sourced from the environment.
#[derive(Debug, Clone)]
pub struct GroqConfig {
    pub api_url: String,
    pub api_key: String,
    pub model: String,
}

impl GroqConfig {
    /// Read `GROQ_API_KEY` / `GROQ_API_URL` / `GROQ_MODEL`.
    ///
    /// Only the key is mandatory; url and model fall back to defaults.
    pub fn from_env() -> Result<Self, InsightError> {
        let api_key = std::env::var("GROQ_API_KEY").map_err(|_| InsightError::MissingApiKey)?;
        let api_url =
            std::env::var("GROQ_API_URL").unwrap_or_else(|_| DEFAULT_API_URL.to_string());
        let model = std::env::var("GROQ_MODEL").unwrap_or_else(|_| DEFAULT_MODEL.to_string());
        Ok(Self {
            api_url,
            api_key,
            model,
        })
    }
}

/// Async HTTP client for the remote language service.
pub struct GroqInsightClient {
    api_url: String,
    api_key: String,
    model: String,
    client: reqwest::Client,
}

impl GroqInsightClient {
    pub fn new(config: GroqConfig) -> Self {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .expect("Failed to create HTTP client");

        Self {
            api_url: config.api_url.trim_end_matches('/').to_string(),
            api_key: config.api_key,
            model: config.model,
            client,
        }
    }

    /// One chat-completion round trip: system + user message in, text out.
    async fn complete(&self, system: &str, user: &str) -> Result<String, InsightError> {
        let body = ChatRequest {
            model: &self.model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: system,
                },
                ChatMessage {
                    role: "user",
                    content: user,
                },
            ],
            temperature: 0.3,
        };

        let response = self
            .client
            .post(&self.api_url)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                if e.is_connect() {
                    InsightError::Connection(self.api_url.clone())
                } else if e.is_timeout() {
                    InsightError::HttpClient(format!(
                        "Request timed out after {REQUEST_TIMEOUT_SECS}s"
                    ))
                } else {
                    InsightError::HttpClient(e.to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(InsightError::ServiceError {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: ChatResponse = response
            .json()
            .await
            .map_err(|e| InsightError::ResponseParsing(e.to_string()))?;

        parsed
            .choices
            .into_iter()
            .next()
            .map(|choice| choice.message.content)
            .ok_or(InsightError::EmptyResponse)
    }
}

#[async_trait]
impl InsightGenerator for GroqInsightClient {
    async fn chart_insights(
        &self,
        chart_type: &str,
        data: &Value,
        reference: Option<&Value>,
    ) -> Result<Vec<String>, InsightError> {
        let user = build_chart_prompt(chart_type, data, reference);
        let reply = self.complete(INSIGHT_SYSTEM_PROMPT, &user).await?;
        Ok(parse_insight_lines(&reply))
    }

    async fn summarize(
        &self,
        charts: &[ChartRecord],
        reference: Option<&Value>,
    ) -> Result<String, InsightError> {
        let user = build_summary_prompt(charts, reference);
        let reply = self.complete(SUMMARY_SYSTEM_PROMPT, &user).await?;
        Ok(reply.trim().to_string())
    }
}

/// Request body for the chat-completions endpoint.
#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

/// Response body from the chat-completions endpoint.
#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatReplyMessage,
}

#[derive(Deserialize)]
struct ChatReplyMessage {
    content: String,
}

// ── Mock for testing ──────────────────────────────────────

/// Mock insight generator with configurable replies and call counters.
///
/// The counters back the pipeline's call-count assertions: rejected
/// regions must never reach insight generation, and the summary must run
/// exactly once per invocation with accepted charts.
pub struct MockInsightGenerator {
    insights: Vec<String>,
    summary: String,
    chart_calls: AtomicUsize,
    summary_calls: AtomicUsize,
    fail_chart_on_call: Option<usize>,
    fail_summary: bool,
}

impl MockInsightGenerator {
    pub fn new(insights: Vec<&str>, summary: &str) -> Self {
        Self {
            insights: insights.into_iter().map(str::to_string).collect(),
            summary: summary.to_string(),
            chart_calls: AtomicUsize::new(0),
            summary_calls: AtomicUsize::new(0),
            fail_chart_on_call: None,
            fail_summary: false,
        }
    }

    /// Fail chart-insight generation on the `n`-th call (0-indexed).
    pub fn with_chart_failure_on_call(mut self, n: usize) -> Self {
        self.fail_chart_on_call = Some(n);
        self
    }

    /// Fail every summary call.
    pub fn with_summary_failure(mut self) -> Self {
        self.fail_summary = true;
        self
    }

    pub fn chart_call_count(&self) -> usize {
        self.chart_calls.load(Ordering::SeqCst)
    }

    pub fn summary_call_count(&self) -> usize {
        self.summary_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl InsightGenerator for MockInsightGenerator {
    async fn chart_insights(
        &self,
        _chart_type: &str,
        _data: &Value,
        _reference: Option<&Value>,
    ) -> Result<Vec<String>, InsightError> {
        let call = self.chart_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_chart_on_call == Some(call) {
            return Err(InsightError::HttpClient(format!(
                "mock: insight generation broke on call {call}"
            )));
        }
        Ok(self.insights.clone())
    }

    async fn summarize(
        &self,
        _charts: &[ChartRecord],
        _reference: Option<&Value>,
    ) -> Result<String, InsightError> {
        self.summary_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_summary {
            return Err(InsightError::HttpClient(
                "mock: summary generation unavailable".into(),
            ));
        }
        Ok(self.summary.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn client_trims_trailing_slash() {
        let client = GroqInsightClient::new(GroqConfig {
            api_url: "https://api.groq.com/openai/v1/chat/completions/".into(),
            api_key: "key".into(),
            model: "llama3-70b-8192".into(),
        });
        assert_eq!(
            client.api_url,
            "https://api.groq.com/openai/v1/chat/completions"
        );
    }

    #[test]
    fn chat_request_serializes_messages_in_order() {
        let body = ChatRequest {
            model: "llama3-70b-8192",
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: "sys",
                },
                ChatMessage {
                    role: "user",
                    content: "usr",
                },
            ],
            temperature: 0.3,
        };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["messages"][0]["role"], "system");
        assert_eq!(json["messages"][1]["content"], "usr");
    }

    #[test]
    fn chat_response_parses_first_choice() {
        let raw = r#"{"choices": [{"message": {"role": "assistant", "content": "- A point."}}]}"#;
        let parsed: ChatResponse = serde_json::from_str(raw).unwrap();
        assert_eq!(parsed.choices[0].message.content, "- A point.");
    }

    #[tokio::test]
    async fn mock_counts_chart_and_summary_calls() {
        let generator = MockInsightGenerator::new(vec!["An insight."], "A summary.");
        let data = json!({});

        let insights = generator
            .chart_insights("bar_chart", &data, None)
            .await
            .unwrap();
        assert_eq!(insights, vec!["An insight."]);
        assert_eq!(generator.chart_call_count(), 1);
        assert_eq!(generator.summary_call_count(), 0);

        let summary = generator.summarize(&[], None).await.unwrap();
        assert_eq!(summary, "A summary.");
        assert_eq!(generator.summary_call_count(), 1);
    }

    #[tokio::test]
    async fn mock_chart_failure_is_targeted() {
        let generator =
            MockInsightGenerator::new(vec![], "s").with_chart_failure_on_call(1);
        let data = json!({});
        assert!(generator.chart_insights("b", &data, None).await.is_ok());
        assert!(generator.chart_insights("b", &data, None).await.is_err());
        assert!(generator.chart_insights("b", &data, None).await.is_ok());
    }
}
