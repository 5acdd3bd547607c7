// src/config.rs
// Explicit configuration objects. Only the binary reads the environment;
// every engine component receives these structs at construction.

use serde::{Deserialize, Serialize};
use std::env;
use std::time::Duration;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationConfig {
    pub provider: String,
    pub model: String,
    #[serde(skip_serializing)]
    pub api_key: Option<String>,
    pub base_url: String,
    pub max_retries: u32,
    pub temperature: f32,
    pub timeout_secs: u64,
    /// Turns every heuristic fallback in the orchestrator, framework
    /// generation and Q&A into a hard failure.
    pub llm_only: bool,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            provider: "openai".to_string(),
            model: "gpt-4o-mini".to_string(),
            api_key: None,
            base_url: "https://api.openai.com/v1".to_string(),
            max_retries: 3,
            temperature: 0.7,
            timeout_secs: 60,
            llm_only: false,
        }
    }
}

impl GenerationConfig {
    pub fn enabled(&self) -> bool {
        self.provider == "openai" && self.api_key.as_deref().is_some_and(|k| !k.trim().is_empty())
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum DiscussionMode {
    /// Agentic loop when the generation service is enabled, phase flow otherwise.
    #[default]
    Auto,
    PhaseFlow,
    Agentic,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiscussionConfig {
    pub interaction_probability: f64,
    pub follow_up_probability: f64,
    pub max_agentic_turns: usize,
    pub transcript_window: usize,
    /// Pacing hint between participant responses. Zero disables it.
    #[serde(with = "millis")]
    pub response_pause: Duration,
    pub mode: DiscussionMode,
}

impl Default for DiscussionConfig {
    fn default() -> Self {
        Self {
            interaction_probability: 0.4,
            follow_up_probability: 0.3,
            max_agentic_turns: 30,
            transcript_window: 12,
            response_pause: Duration::from_millis(100),
            mode: DiscussionMode::Auto,
        }
    }
}

impl DiscussionConfig {
    /// Same constants, no pacing pause. Used by tests and batch runs.
    pub fn unpaced() -> Self {
        Self {
            response_pause: Duration::ZERO,
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub bind: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: "127.0.0.1".to_string(),
            port: 8080,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    pub generation: GenerationConfig,
    pub discussion: DiscussionConfig,
    pub server: ServerConfig,
}

impl AppConfig {
    pub fn from_env() -> Self {
        let defaults = GenerationConfig::default();
        let model = env::var("OPENAI_MODEL")
            .or_else(|_| env::var("LLM_MODEL"))
            .unwrap_or(defaults.model);

        let generation = GenerationConfig {
            provider: env::var("LLM_PROVIDER")
                .map(|p| p.to_lowercase())
                .unwrap_or(defaults.provider),
            model,
            api_key: env::var("OPENAI_API_KEY").ok(),
            base_url: env::var("OPENAI_BASE_URL").unwrap_or(defaults.base_url),
            max_retries: parse_env("LLM_MAX_RETRIES", defaults.max_retries),
            temperature: parse_env("LLM_TEMPERATURE", defaults.temperature),
            timeout_secs: parse_env("LLM_TIMEOUT_SECONDS", defaults.timeout_secs),
            llm_only: env::var("LLM_ONLY").map(|v| parse_flag(&v)).unwrap_or(false),
        };

        let server_defaults = ServerConfig::default();
        let server = ServerConfig {
            bind: env::var("AGORA_BIND").unwrap_or(server_defaults.bind),
            port: parse_env("AGORA_PORT", server_defaults.port),
        };

        Self {
            generation,
            discussion: DiscussionConfig::default(),
            server,
        }
    }
}

pub fn parse_flag(value: &str) -> bool {
    matches!(
        value.trim().to_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}

fn parse_env<T: std::str::FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(default)
}

mod millis {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_u64(d.as_millis() as u64)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
        Ok(Duration::from_millis(u64::deserialize(d)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn llm_only_flag_accepts_common_truthy_values() {
        for v in ["1", "true", "YES", " on "] {
            assert!(parse_flag(v), "{v}");
        }
        for v in ["0", "false", "", "nope"] {
            assert!(!parse_flag(v), "{v}");
        }
    }

    #[test]
    fn generation_is_disabled_without_api_key() {
        let mut cfg = GenerationConfig::default();
        assert!(!cfg.enabled());
        cfg.api_key = Some("sk-test".to_string());
        assert!(cfg.enabled());
        cfg.provider = "local".to_string();
        assert!(!cfg.enabled());
    }

    #[test]
    fn discussion_defaults_keep_source_constants() {
        let cfg = DiscussionConfig::default();
        assert_eq!(cfg.interaction_probability, 0.4);
        assert_eq!(cfg.follow_up_probability, 0.3);
        assert_eq!(cfg.max_agentic_turns, 30);
        assert_eq!(cfg.transcript_window, 12);
        assert_eq!(DiscussionConfig::unpaced().response_pause, Duration::ZERO);
    }
}
