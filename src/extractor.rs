// 🤖 Aspect Extractor - structured aspect sentiment from an OpenAI-compatible chat API
//
// One review in, one {overall_sentiment, aspect_data} object out.
// The batch runner calls the extractor once per review, sequentially,
// pausing after each call and backing off after failures. A review whose
// every attempt fails is skipped; it never aborts the batch.

use crate::config::ExtractorConfig;
use crate::db::{AspectAnalysisRow, Review};
use anyhow::{anyhow, bail, Context, Result};
use reqwest::blocking::Client;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::thread;
use std::time::Duration;

pub const TOOL_NAME: &str = "extract_aspect_sentiment";

const SYSTEM_PROMPT: &str = "You are an expert sentiment analyst specializing in product feedback. \
Your task is to analyze customer reviews for a product. You must extract the overall sentiment \
(Positive, Negative, or Neutral) and identify key product aspects mentioned, along with the \
customer's sentiment toward each aspect. Respond ONLY with a single JSON object that strictly \
adheres to the provided schema.";

/// What the model returns for one review
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractionResult {
    #[serde(default)]
    pub overall_sentiment: Option<String>,

    /// Kept as raw JSON; the aggregator decides what is usable
    #[serde(default = "empty_list")]
    pub aspect_data: Value,
}

fn empty_list() -> Value {
    Value::Array(Vec::new())
}

impl ExtractionResult {
    pub fn into_row(self, review_id: i64) -> AspectAnalysisRow {
        AspectAnalysisRow {
            review_id,
            overall_sentiment: self.overall_sentiment,
            aspect_data_json: self.aspect_data.to_string(),
        }
    }
}

/// Anything that can turn review text into an extraction result
pub trait AspectExtractor {
    fn extract(&self, review_text: &str) -> Result<ExtractionResult>;
}

/// JSON schema handed to the model as the tool's parameters
pub fn extraction_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "overall_sentiment": {
                "type": "string",
                "enum": ["Positive", "Negative", "Neutral"],
                "description": "The overall sentiment of the review, strictly categorized as Positive, Negative, or Neutral."
            },
            "aspect_data": {
                "type": "array",
                "description": "A list of specific aspects/themes mentioned in the review and the customer's sentiment towards them.",
                "items": {
                    "type": "object",
                    "properties": {
                        "aspect": {
                            "type": "string",
                            "description": "The specific product feature or theme (e.g., 'Comfort', 'Display', 'Price')."
                        },
                        "sentiment": {
                            "type": "string",
                            "description": "The sentiment towards this aspect (Positive, Negative, or Neutral)."
                        }
                    },
                    "required": ["aspect", "sentiment"]
                }
            }
        },
        "required": ["overall_sentiment", "aspect_data"]
    })
}

// ============================================================================
// OPENAI CLIENT
// ============================================================================

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    tool_calls: Vec<ToolCall>,
}

#[derive(Debug, Deserialize)]
struct ToolCall {
    function: FunctionCall,
}

#[derive(Debug, Deserialize)]
struct FunctionCall {
    arguments: String,
}

/// Pull the forced tool call's arguments out of a chat completion body
pub fn parse_tool_call_response(body: &str) -> Result<ExtractionResult> {
    let response: ChatResponse =
        serde_json::from_str(body).context("Failed to parse chat completion response")?;

    let choice = response
        .choices
        .first()
        .ok_or_else(|| anyhow!("Response has no choices"))?;

    let call = choice
        .message
        .tool_calls
        .first()
        .ok_or_else(|| anyhow!("Response has no tool call"))?;

    let args: Value = serde_json::from_str(&call.function.arguments)
        .context("Tool call arguments are not valid JSON")?;

    if args.get("overall_sentiment").is_none() && args.get("aspect_data").is_none() {
        bail!("Tool call arguments carry no analysis");
    }

    serde_json::from_value(args).context("Tool call arguments do not match the extraction schema")
}

pub struct OpenAiExtractor {
    client: Client,
    model: String,
    endpoint: String,
    api_key: String,
    temperature: f32,
}

impl OpenAiExtractor {
    pub fn new(config: &ExtractorConfig) -> Result<Self> {
        let api_key = match &config.api_key {
            Some(key) => key.clone(),
            None => bail!("No API key configured. Set OPENAI_API_KEY in the environment or .env"),
        };

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .context("Failed to build HTTP client")?;

        Ok(OpenAiExtractor {
            client,
            model: config.model.clone(),
            endpoint: format!("{}/chat/completions", config.api_base.trim_end_matches('/')),
            api_key,
            temperature: config.temperature,
        })
    }

    pub fn request_body(&self, review_text: &str) -> Value {
        json!({
            "model": self.model,
            "messages": [
                {"role": "system", "content": SYSTEM_PROMPT},
                {"role": "user", "content": format!("Review to analyze: {}", review_text)}
            ],
            "response_format": {"type": "json_object"},
            "tools": [{
                "type": "function",
                "function": {
                    "name": TOOL_NAME,
                    "description": "Extract the overall sentiment and a list of specific aspects and their sentiments from a review.",
                    "parameters": extraction_schema()
                }
            }],
            "tool_choice": {"type": "function", "function": {"name": TOOL_NAME}},
            "temperature": self.temperature
        })
    }
}

impl AspectExtractor for OpenAiExtractor {
    fn extract(&self, review_text: &str) -> Result<ExtractionResult> {
        log::debug!("Sending review to {}", self.endpoint);

        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&self.request_body(review_text))
            .send()
            .context("Failed to send request to model API")?;

        let status = response.status();
        let body = response.text().context("Failed to read model API response")?;

        if !status.is_success() {
            bail!("Model API error {}: {}", status, body);
        }

        parse_tool_call_response(&body)
    }
}

// ============================================================================
// BATCH RUNNER
// ============================================================================

#[derive(Debug, Clone, Default, PartialEq)]
pub struct BatchOutcome {
    pub rows: Vec<AspectAnalysisRow>,

    /// Reviews skipped after every attempt failed
    pub failed: Vec<i64>,

    pub attempts: usize,
}

impl BatchOutcome {
    pub fn summary(&self) -> String {
        format!(
            "{} analyzed, {} failed, {} API calls",
            self.rows.len(),
            self.failed.len(),
            self.attempts
        )
    }
}

/// Pause before retry `attempt` (1-based): base, 2x base, 4x base, ...
pub fn backoff_delay(base_ms: u64, attempt: u32) -> Duration {
    let factor = 1u64 << attempt.saturating_sub(1).min(16);
    Duration::from_millis(base_ms.saturating_mul(factor))
}

/// Run the extractor over every review, one at a time
pub fn extract_batch<E: AspectExtractor + ?Sized>(
    extractor: &E,
    reviews: &[Review],
    config: &ExtractorConfig,
) -> BatchOutcome {
    let mut outcome = BatchOutcome::default();

    for (i, review) in reviews.iter().enumerate() {
        let mut attempt = 0;

        let result = loop {
            attempt += 1;
            outcome.attempts += 1;

            match extractor.extract(&review.text) {
                Ok(result) => break Some(result),
                Err(e) => {
                    log::warn!(
                        "API error processing review {} (attempt {}/{}): {:#}",
                        review.id,
                        attempt,
                        config.max_attempts,
                        e
                    );
                    thread::sleep(backoff_delay(config.failure_pause_ms, attempt));
                    if attempt >= config.max_attempts {
                        break None;
                    }
                }
            }
        };

        match result {
            Some(result) => outcome.rows.push(result.into_row(review.id)),
            None => outcome.failed.push(review.id),
        }

        if (i + 1) % 25 == 0 {
            log::info!("Processed {}/{} reviews", i + 1, reviews.len());
        }

        thread::sleep(Duration::from_millis(config.request_delay_ms));
    }

    outcome
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::collections::HashMap;

    /// Scripted extractor: per-text queue of outcomes
    struct StubExtractor {
        script: RefCell<HashMap<String, Vec<Result<ExtractionResult, String>>>>,
        calls: RefCell<usize>,
    }

    impl StubExtractor {
        fn new(entries: Vec<(&str, Vec<Result<ExtractionResult, String>>)>) -> Self {
            StubExtractor {
                script: RefCell::new(
                    entries
                        .into_iter()
                        .map(|(k, v)| (k.to_string(), v))
                        .collect(),
                ),
                calls: RefCell::new(0),
            }
        }
    }

    impl AspectExtractor for StubExtractor {
        fn extract(&self, review_text: &str) -> Result<ExtractionResult> {
            *self.calls.borrow_mut() += 1;
            let mut script = self.script.borrow_mut();
            let queue = script
                .get_mut(review_text)
                .ok_or_else(|| anyhow!("unscripted review"))?;
            if queue.is_empty() {
                bail!("script exhausted");
            }
            queue.remove(0).map_err(|e| anyhow!(e))
        }
    }

    fn fast_config(max_attempts: u32) -> ExtractorConfig {
        ExtractorConfig {
            request_delay_ms: 0,
            failure_pause_ms: 0,
            max_attempts,
            ..ExtractorConfig::default()
        }
    }

    fn review(id: i64, text: &str) -> Review {
        Review {
            id,
            text: text.to_string(),
        }
    }

    fn ok(overall: &str, aspects: Value) -> Result<ExtractionResult, String> {
        Ok(ExtractionResult {
            overall_sentiment: Some(overall.to_string()),
            aspect_data: aspects,
        })
    }

    #[test]
    fn test_parse_tool_call_response() {
        let body = json!({
            "choices": [{
                "message": {
                    "content": null,
                    "tool_calls": [{
                        "id": "call_1",
                        "type": "function",
                        "function": {
                            "name": TOOL_NAME,
                            "arguments": "{\"overall_sentiment\":\"Positive\",\"aspect_data\":[{\"aspect\":\"Display\",\"sentiment\":\"Positive\"}]}"
                        }
                    }]
                }
            }]
        })
        .to_string();

        let result = parse_tool_call_response(&body).unwrap();

        assert_eq!(result.overall_sentiment.as_deref(), Some("Positive"));
        assert_eq!(result.aspect_data[0]["aspect"], "Display");
    }

    #[test]
    fn test_parse_rejects_missing_tool_call() {
        let body = json!({"choices": [{"message": {"content": "hello"}}]}).to_string();
        assert!(parse_tool_call_response(&body).is_err());

        let empty = json!({"choices": []}).to_string();
        assert!(parse_tool_call_response(&empty).is_err());
    }

    #[test]
    fn test_parse_rejects_empty_arguments() {
        for arguments in ["{}", "[]", "null"] {
            let body = json!({
                "choices": [{
                    "message": {
                        "tool_calls": [{
                            "function": {"name": TOOL_NAME, "arguments": arguments}
                        }]
                    }
                }]
            })
            .to_string();

            assert!(parse_tool_call_response(&body).is_err(), "accepted {}", arguments);
        }
    }

    #[test]
    fn test_missing_aspect_data_defaults_to_empty_list() {
        let result: ExtractionResult =
            serde_json::from_str(r#"{"overall_sentiment":"Neutral"}"#).unwrap();

        let row = result.into_row(3);

        assert_eq!(row.aspect_data_json, "[]");
        assert_eq!(row.overall_sentiment.as_deref(), Some("Neutral"));
    }

    #[test]
    fn test_request_body_forces_tool() {
        let config = ExtractorConfig {
            api_key: Some("sk-test".to_string()),
            ..ExtractorConfig::default()
        };
        let extractor = OpenAiExtractor::new(&config).unwrap();

        let body = extractor.request_body("Great display");

        assert_eq!(body["model"], "gpt-3.5-turbo-1106");
        assert_eq!(body["tool_choice"]["function"]["name"], TOOL_NAME);
        assert_eq!(body["tools"][0]["function"]["parameters"]["required"][1], "aspect_data");
        assert_eq!(body["messages"][1]["content"], "Review to analyze: Great display");
    }

    #[test]
    fn test_new_requires_api_key() {
        let config = ExtractorConfig::default();
        assert!(OpenAiExtractor::new(&config).is_err());
    }

    #[test]
    fn test_batch_skips_failures_and_continues() {
        let extractor = StubExtractor::new(vec![
            ("good", vec![ok("Positive", json!([{"aspect": "Display", "sentiment": "Positive"}]))]),
            ("bad", vec![Err("rate limited".to_string())]),
            ("meh", vec![ok("Neutral", json!([]))]),
        ]);
        let reviews = vec![review(1, "good"), review(2, "bad"), review(3, "meh")];

        let outcome = extract_batch(&extractor, &reviews, &fast_config(1));

        assert_eq!(outcome.rows.len(), 2);
        assert_eq!(outcome.rows[0].review_id, 1);
        assert_eq!(outcome.rows[1].review_id, 3);
        assert_eq!(outcome.failed, vec![2]);
        assert_eq!(outcome.attempts, 3);
    }

    #[test]
    fn test_batch_retries_up_to_max_attempts() {
        let extractor = StubExtractor::new(vec![(
            "flaky",
            vec![Err("timeout".to_string()), ok("Negative", json!([]))],
        )]);
        let reviews = vec![review(7, "flaky")];

        let outcome = extract_batch(&extractor, &reviews, &fast_config(3));

        assert_eq!(outcome.rows.len(), 1);
        assert!(outcome.failed.is_empty());
        assert_eq!(*extractor.calls.borrow(), 2);
    }

    #[test]
    fn test_backoff_doubles() {
        assert_eq!(backoff_delay(2000, 1), Duration::from_millis(2000));
        assert_eq!(backoff_delay(2000, 2), Duration::from_millis(4000));
        assert_eq!(backoff_delay(2000, 3), Duration::from_millis(8000));
        assert_eq!(backoff_delay(0, 5), Duration::ZERO);
    }
}
