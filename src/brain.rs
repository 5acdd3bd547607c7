// src/brain.rs
// GENERATION BRIDGE
// Connects the discussion engine to an OpenAI-compatible chat completion endpoint.
// Every call is a blocking request/response with bounded retries.

use crate::config::GenerationConfig;
use crate::error::GenerationError;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::thread;
use std::time::Duration;
use tracing::{debug, warn};

/// The capability every engine component consumes. Callers must check
/// `enabled()` before calling; a disabled service fails fast.
pub trait GenerationService: Send + Sync {
    fn enabled(&self) -> bool;

    fn generate_text(
        &self,
        system_prompt: &str,
        user_prompt: &str,
        temperature: Option<f32>,
        max_tokens: Option<u32>,
    ) -> Result<String, GenerationError>;

    /// Returns an untyped document. Extra prose around the payload is
    /// tolerated; a response with no parseable object comes back as
    /// `{"content": <raw text>}`.
    fn generate_structured(
        &self,
        system_prompt: &str,
        user_prompt: &str,
        schema_hint: Option<&str>,
    ) -> Result<Value, GenerationError>;
}

/// Stand-in used when no backend is configured.
#[derive(Debug, Default, Clone, Copy)]
pub struct DisabledBrain;

impl GenerationService for DisabledBrain {
    fn enabled(&self) -> bool {
        false
    }

    fn generate_text(
        &self,
        _system_prompt: &str,
        _user_prompt: &str,
        _temperature: Option<f32>,
        _max_tokens: Option<u32>,
    ) -> Result<String, GenerationError> {
        Err(GenerationError::Disabled)
    }

    fn generate_structured(
        &self,
        _system_prompt: &str,
        _user_prompt: &str,
        _schema_hint: Option<&str>,
    ) -> Result<Value, GenerationError> {
        Err(GenerationError::Disabled)
    }
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_format: Option<Value>,
}

#[derive(Deserialize, Debug)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize, Debug)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Deserialize, Debug)]
struct ChatChoiceMessage {
    content: Option<String>,
}

pub struct OpenAiBrain {
    client: reqwest::blocking::Client,
    config: GenerationConfig,
}

impl OpenAiBrain {
    pub fn new(config: GenerationConfig) -> Result<Self, GenerationError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(config.timeout())
            .build()?;
        Ok(Self { client, config })
    }

    fn chat_completion(
        &self,
        system_prompt: &str,
        user_prompt: &str,
        temperature: f32,
        max_tokens: Option<u32>,
        response_format: Option<Value>,
    ) -> Result<String, GenerationError> {
        let request = ChatRequest {
            model: &self.config.model,
            messages: vec![
                ChatMessage { role: "system", content: system_prompt },
                ChatMessage { role: "user", content: user_prompt },
            ],
            temperature,
            max_tokens,
            response_format,
        };
        let url = format!("{}/chat/completions", self.config.base_url.trim_end_matches('/'));
        let attempts = self.config.max_retries.max(1);

        let mut last_err = GenerationError::EmptyResponse;
        for attempt in 1..=attempts {
            match self.send_once(&url, &request) {
                Ok(text) => return Ok(text),
                Err(e) => {
                    warn!(attempt, attempts, error = %e, "generation attempt failed");
                    last_err = e;
                    if attempt < attempts {
                        thread::sleep(backoff_delay(attempt));
                    }
                }
            }
        }
        Err(last_err)
    }

    fn send_once(&self, url: &str, request: &ChatRequest<'_>) -> Result<String, GenerationError> {
        let mut builder = self.client.post(url).json(request);
        if let Some(key) = &self.config.api_key {
            builder = builder.bearer_auth(key);
        }
        let resp = builder.send()?;
        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().unwrap_or_default();
            return Err(GenerationError::Status {
                status: status.as_u16(),
                body,
            });
        }
        let parsed: ChatResponse = resp
            .json()
            .map_err(|e| GenerationError::Decode(e.to_string()))?;
        Ok(parsed
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .unwrap_or_default())
    }
}

impl GenerationService for OpenAiBrain {
    fn enabled(&self) -> bool {
        self.config.enabled()
    }

    fn generate_text(
        &self,
        system_prompt: &str,
        user_prompt: &str,
        temperature: Option<f32>,
        max_tokens: Option<u32>,
    ) -> Result<String, GenerationError> {
        if !self.enabled() {
            return Err(GenerationError::Disabled);
        }
        self.chat_completion(
            system_prompt,
            user_prompt,
            temperature.unwrap_or(self.config.temperature),
            max_tokens,
            None,
        )
    }

    fn generate_structured(
        &self,
        system_prompt: &str,
        user_prompt: &str,
        schema_hint: Option<&str>,
    ) -> Result<Value, GenerationError> {
        if !self.enabled() {
            return Err(GenerationError::Disabled);
        }
        let raw = self.chat_completion(
            system_prompt,
            &with_json_instructions(user_prompt, schema_hint),
            self.config.temperature,
            None,
            Some(json!({ "type": "json_object" })),
        )?;
        debug!(chars = raw.len(), "structured response received");
        Ok(parse_structured(&raw))
    }
}

/// min(2^attempt, 5) seconds.
pub fn backoff_delay(attempt: u32) -> Duration {
    let secs = 2u64.saturating_pow(attempt).min(5);
    Duration::from_secs(secs)
}

pub fn with_json_instructions(prompt: &str, schema_hint: Option<&str>) -> String {
    let mut instructions = String::from(
        "Return a STRICT JSON object with double-quoted keys and values. \
         Do not include any surrounding text.",
    );
    if let Some(hint) = schema_hint {
        instructions.push_str(&format!("\nSchema hint: {}", hint));
    }
    format!("{}\n\n{}", prompt, instructions)
}

/// Parse a raw completion into a document: whole text first, then the
/// outermost `{...}` substring, then `{"content": raw}`.
pub fn parse_structured(raw: &str) -> Value {
    if let Ok(value) = serde_json::from_str::<Value>(raw.trim()) {
        return value;
    }
    if let (Some(start), Some(end)) = (raw.find('{'), raw.rfind('}')) {
        if end > start {
            if let Ok(value) = serde_json::from_str::<Value>(&raw[start..=end]) {
                return value;
            }
        }
    }
    json!({ "content": raw })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_structured_accepts_clean_json() {
        let v = parse_structured(r#"{"action": "end"}"#);
        assert_eq!(v["action"], "end");
    }

    #[test]
    fn parse_structured_strips_surrounding_prose() {
        let raw = "Sure! Here is the plan:\n```json\n{\"opening\": [\"Hi?\"]}\n```\nHope it helps.";
        let v = parse_structured(raw);
        assert_eq!(v["opening"][0], "Hi?");
    }

    #[test]
    fn parse_structured_wraps_unparseable_text() {
        let v = parse_structured("no json here {broken");
        assert_eq!(v["content"], "no json here {broken");
    }

    #[test]
    fn backoff_is_capped_at_five_seconds() {
        assert_eq!(backoff_delay(1), Duration::from_secs(2));
        assert_eq!(backoff_delay(2), Duration::from_secs(4));
        assert_eq!(backoff_delay(3), Duration::from_secs(5));
        assert_eq!(backoff_delay(10), Duration::from_secs(5));
    }

    #[test]
    fn json_instructions_carry_schema_hint() {
        let p = with_json_instructions("Topic: tea", Some("{phase: string[]}"));
        assert!(p.starts_with("Topic: tea"));
        assert!(p.contains("Schema hint: {phase: string[]}"));
    }

    #[test]
    fn disabled_brain_fails_fast() {
        let brain = DisabledBrain;
        assert!(!brain.enabled());
        assert!(matches!(
            brain.generate_text("s", "u", None, None),
            Err(GenerationError::Disabled)
        ));
    }
}
