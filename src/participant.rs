// src/participant.rs
// Participant records, the agents that speak for them, and the engines
// that decide what an agent says.

use crate::brain::GenerationService;
use crate::error::{FocusGroupError, Result};
use crate::memory::ConversationMemory;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, warn};

fn default_age() -> u32 {
    25
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Participant {
    pub name: String,
    #[serde(default = "default_age")]
    pub age: u32,
    #[serde(default)]
    pub occupation: String,
    #[serde(default)]
    pub location: String,
    #[serde(default)]
    pub income_range: String,
    #[serde(default)]
    pub monthly_budget: String,
    #[serde(default)]
    pub personality_type: String,
    #[serde(default)]
    pub traits: Vec<String>,
    #[serde(default)]
    pub background: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
}

impl Participant {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            age: default_age(),
            occupation: String::new(),
            location: String::new(),
            income_range: String::new(),
            monthly_budget: String::new(),
            personality_type: String::new(),
            traits: Vec::new(),
            background: String::new(),
            created_at: None,
        }
    }

    pub fn personality_label(&self) -> &str {
        non_empty_or(&self.personality_type, "unknown")
    }

    pub fn occupation_label(&self) -> &str {
        non_empty_or(&self.occupation, "professional")
    }

    pub fn budget_label(&self) -> &str {
        non_empty_or(&self.monthly_budget, "moderate budget")
    }
}

fn non_empty_or<'a>(value: &'a str, fallback: &'a str) -> &'a str {
    if value.trim().is_empty() {
        fallback
    } else {
        value
    }
}

/// Decides what a participant says next, given everything they have heard.
pub trait PersonaEngine: Send + Sync {
    fn reply(&self, participant: &Participant, memory: &ConversationMemory) -> Result<String>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Temperament {
    Enthusiastic,
    Skeptical,
    BudgetMinded,
    Balanced,
}

impl Temperament {
    fn of(participant: &Participant) -> Self {
        let profile = format!(
            "{} {} {}",
            participant.background,
            participant.personality_type,
            participant.traits.join(" ")
        )
        .to_lowercase();

        if profile.contains("enthusiastic") {
            Temperament::Enthusiastic
        } else if profile.contains("skeptical") || profile.contains("analytical") {
            Temperament::Skeptical
        } else if profile.contains("budget") {
            Temperament::BudgetMinded
        } else {
            Temperament::Balanced
        }
    }

    fn lines(&self, participant: &Participant) -> [String; 3] {
        let occupation = participant.occupation_label();
        match self {
            Temperament::Enthusiastic => [
                format!("Oh my god, yes! As a {}, I totally relate to this!", occupation),
                "This is so interesting! I've actually experienced something similar...".to_string(),
                "Wait, can I share something? This reminds me of when I...".to_string(),
            ],
            Temperament::Skeptical => [
                format!("I'm not sure about that. As someone who works in {}, I think...", occupation),
                "That sounds expensive. How much does that actually cost?".to_string(),
                "I need to understand the practical side of this...".to_string(),
            ],
            Temperament::BudgetMinded => [
                "That's way over my budget! I usually spend around...".to_string(),
                "I track all my expenses, and I found a cheaper alternative...".to_string(),
                "Let me calculate the cost per use on that...".to_string(),
            ],
            Temperament::Balanced => [
                format!(
                    "Interesting perspective. As a {}-year-old {}, I think...",
                    participant.age, occupation
                ),
                "I've had some experience with this topic...".to_string(),
                "Let me share my thoughts on this...".to_string(),
            ],
        }
    }
}

/// Deterministic template picker. The template cycles with the number
/// of replies the participant has already given.
#[derive(Debug, Default, Clone, Copy)]
pub struct LocalPersonaEngine;

impl PersonaEngine for LocalPersonaEngine {
    fn reply(&self, participant: &Participant, memory: &ConversationMemory) -> Result<String> {
        if memory.is_empty() {
            return Ok(format!("Hi, I'm {}!", participant.name));
        }
        let lines = Temperament::of(participant).lines(participant);
        let idx = memory.reply_count() % lines.len();
        Ok(lines[idx].clone())
    }
}

/// Delegates to the generation service; falls back to the local picker
/// unless running LLM-only.
pub struct GenerativePersonaEngine {
    brain: Arc<dyn GenerationService>,
    local: LocalPersonaEngine,
    llm_only: bool,
}

impl GenerativePersonaEngine {
    pub fn new(brain: Arc<dyn GenerationService>, llm_only: bool) -> Self {
        Self {
            brain,
            local: LocalPersonaEngine,
            llm_only,
        }
    }

    fn system_prompt(participant: &Participant) -> String {
        let mut prompt = if participant.background.trim().is_empty() {
            format!(
                "You are {}, a {}-year-old {}.",
                participant.name,
                participant.age,
                participant.occupation_label()
            )
        } else {
            participant.background.clone()
        };
        prompt.push_str(
            "\nYou are a participant in a market research focus group. \
             Reply in first person, 2-4 sentences, conversational, no lists.",
        );
        prompt
    }

    fn user_prompt(memory: &ConversationMemory) -> String {
        let prompt = memory.last_prompt().unwrap_or_default();
        let earlier: Vec<String> = memory
            .recall(prompt, 2)
            .into_iter()
            .map(|e| format!("- {}", e.content))
            .collect();
        if earlier.is_empty() {
            prompt.to_string()
        } else {
            format!("{}\n\nThings you said earlier:\n{}", prompt, earlier.join("\n"))
        }
    }
}

impl PersonaEngine for GenerativePersonaEngine {
    fn reply(&self, participant: &Participant, memory: &ConversationMemory) -> Result<String> {
        if !self.brain.enabled() {
            if self.llm_only {
                return Err(FocusGroupError::ServiceUnavailable(
                    "persona replies require a generation service".to_string(),
                ));
            }
            debug!(participant = %participant.name, "generation disabled, using local persona engine");
            return self.local.reply(participant, memory);
        }

        let result = self.brain.generate_text(
            &Self::system_prompt(participant),
            &Self::user_prompt(memory),
            None,
            Some(220),
        );
        match result {
            Ok(text) if !text.trim().is_empty() => Ok(text.trim().to_string()),
            Ok(_) if self.llm_only => Err(FocusGroupError::MalformedResponse(format!(
                "empty reply for {}",
                participant.name
            ))),
            Err(e) if self.llm_only => Err(e.into()),
            other => {
                if let Err(e) = other {
                    warn!(participant = %participant.name, error = %e, "persona reply failed, using local engine");
                }
                self.local.reply(participant, memory)
            }
        }
    }
}

/// Picks the engine once, at construction time.
pub fn persona_engine_for(brain: Arc<dyn GenerationService>, llm_only: bool) -> Arc<dyn PersonaEngine> {
    if brain.enabled() || llm_only {
        Arc::new(GenerativePersonaEngine::new(brain, llm_only))
    } else {
        Arc::new(LocalPersonaEngine)
    }
}

/// A participant plus the conversation history they accumulate while
/// the discussion runs.
#[derive(Debug, Clone)]
pub struct ParticipantAgent {
    pub participant: Participant,
    pub memory: ConversationMemory,
}

impl ParticipantAgent {
    pub fn new(participant: Participant) -> Self {
        Self {
            participant,
            memory: ConversationMemory::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.participant.name
    }

    pub fn listen(&mut self, prompt: impl Into<String>) {
        self.memory.listen(prompt);
    }

    pub fn act(&mut self, engine: &dyn PersonaEngine) -> Result<String> {
        let reply = engine.reply(&self.participant, &self.memory)?;
        self.memory.act(reply.clone());
        Ok(reply)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::brain::DisabledBrain;

    fn analyst() -> Participant {
        Participant {
            occupation: "Data Analyst".to_string(),
            personality_type: "analytical".to_string(),
            ..Participant::named("Rahul")
        }
    }

    #[test]
    fn deserializes_with_only_a_name() {
        let p: Participant = serde_json::from_str(r#"{"name": "Aditi"}"#).unwrap();
        assert_eq!(p.age, 25);
        assert_eq!(p.personality_label(), "unknown");
        assert!(p.traits.is_empty());
    }

    #[test]
    fn local_engine_greets_before_any_prompt() {
        let agent = ParticipantAgent::new(Participant::named("Priya"));
        let reply = LocalPersonaEngine.reply(&agent.participant, &agent.memory).unwrap();
        assert_eq!(reply, "Hi, I'm Priya!");
    }

    #[test]
    fn local_engine_cycles_templates_by_reply_count() {
        let mut agent = ParticipantAgent::new(analyst());
        let mut replies = Vec::new();
        for _ in 0..4 {
            agent.listen("Question: what do you think?");
            replies.push(agent.act(&LocalPersonaEngine).unwrap());
        }
        assert_eq!(
            replies[0],
            "I'm not sure about that. As someone who works in Data Analyst, I think..."
        );
        assert_eq!(replies[1], "That sounds expensive. How much does that actually cost?");
        assert_eq!(replies[3], replies[0]);
        assert_eq!(agent.memory.reply_count(), 4);
    }

    #[test]
    fn budget_background_selects_budget_lines() {
        let p = Participant {
            background: "You are extremely budget-conscious and track every expense.".to_string(),
            ..Participant::named("Yash")
        };
        let mut agent = ParticipantAgent::new(p);
        agent.listen("How much do you spend?");
        let reply = agent.act(&LocalPersonaEngine).unwrap();
        assert!(reply.contains("budget"));
    }

    #[test]
    fn generative_engine_degrades_to_local_when_disabled() {
        let engine = GenerativePersonaEngine::new(Arc::new(DisabledBrain), false);
        let mut agent = ParticipantAgent::new(analyst());
        agent.listen("Question: anything?");
        assert!(agent.act(&engine).is_ok());
    }

    #[test]
    fn generative_engine_is_fatal_when_llm_only() {
        let engine = GenerativePersonaEngine::new(Arc::new(DisabledBrain), true);
        let mut agent = ParticipantAgent::new(analyst());
        agent.listen("Question: anything?");
        assert!(matches!(
            agent.act(&engine),
            Err(FocusGroupError::ServiceUnavailable(_))
        ));
    }
}
