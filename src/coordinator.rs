// src/coordinator.rs
// Turn-by-turn decision function for the agentic discussion loop.

use crate::brain::GenerationService;
use crate::error::Result;
use crate::participant::Participant;
use crate::transcript::TranscriptEntry;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::warn;

const COORDINATOR_SYSTEM_PROMPT: &str = "You are a senior discussion coordinator. Decide the next step of a focus group. \
Keep a balanced pacing: questions, responses, occasional interrupts, and follow-ups. \
Return a STRICT JSON object with keys: action, moderator_question (optional), speaker (optional), notes, reason.";

const BRIEF_LIMIT: usize = 3000;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    AskQuestion,
    ParticipantTurn,
    Interrupt,
    WrapUp,
    End,
    /// Missing or unrecognised action.
    Other,
}

impl Action {
    pub fn parse(raw: &str) -> Self {
        match raw.trim().to_lowercase().as_str() {
            "ask_question" => Action::AskQuestion,
            "participant_turn" => Action::ParticipantTurn,
            "interrupt" => Action::Interrupt,
            "wrap_up" => Action::WrapUp,
            "end" => Action::End,
            _ => Action::Other,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Directive {
    pub action: Action,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub moderator_question: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub speaker: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

impl Directive {
    pub fn new(action: Action) -> Self {
        Self {
            action,
            moderator_question: None,
            speaker: None,
            notes: None,
            reason: None,
        }
    }

    pub fn ask(question: impl Into<String>) -> Self {
        Self {
            moderator_question: Some(question.into()),
            ..Self::new(Action::AskQuestion)
        }
    }

    pub fn turn(speaker: impl Into<String>) -> Self {
        Self {
            speaker: Some(speaker.into()),
            ..Self::new(Action::ParticipantTurn)
        }
    }

    pub fn interrupt(speaker: impl Into<String>) -> Self {
        Self {
            speaker: Some(speaker.into()),
            ..Self::new(Action::Interrupt)
        }
    }

    /// Used whenever the service hands back something other than an object.
    pub fn soft_wrap_up() -> Self {
        Self {
            notes: Some("fallback".to_string()),
            reason: Some("invalid response".to_string()),
            ..Self::new(Action::WrapUp)
        }
    }

    /// Coerces an untyped service document. Fields of the wrong type are
    /// treated as absent; blank strings count as absent too.
    pub fn from_document(doc: &Value) -> Self {
        let Some(map) = doc.as_object() else {
            return Self::soft_wrap_up();
        };
        let field = |key: &str| {
            map.get(key)
                .and_then(Value::as_str)
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(String::from)
        };
        Self {
            action: field("action")
                .map(|a| Action::parse(&a))
                .unwrap_or(Action::Other),
            moderator_question: field("moderator_question"),
            speaker: field("speaker"),
            notes: field("notes"),
            reason: field("reason"),
        }
    }
}

pub trait Coordinator: Send + Sync {
    /// Carries no state between calls; everything it knows comes from
    /// the arguments.
    fn propose_next_action(
        &self,
        topic: &str,
        participants: &[Participant],
        recent: &[TranscriptEntry],
        plan_text: Option<&str>,
    ) -> Result<Directive>;
}

pub struct LlmCoordinator {
    brain: Arc<dyn GenerationService>,
    window: usize,
}

impl LlmCoordinator {
    pub fn new(brain: Arc<dyn GenerationService>, window: usize) -> Self {
        Self { brain, window }
    }

    pub fn build_prompt(
        &self,
        topic: &str,
        participants: &[Participant],
        recent: &[TranscriptEntry],
        plan_text: Option<&str>,
    ) -> String {
        let brief: Vec<Value> = participants
            .iter()
            .map(|p| {
                json!({
                    "name": p.name,
                    "age": p.age,
                    "occupation": p.occupation,
                    "personality_type": p.personality_type,
                    "monthly_budget": p.monthly_budget,
                })
            })
            .collect();
        let brief = Value::Array(brief).to_string();
        let brief: String = brief.chars().take(BRIEF_LIMIT).collect();

        let start = recent.len().saturating_sub(self.window);
        let lines: Vec<String> = recent[start..]
            .iter()
            .map(|e| format!("[{}|{}] {}", e.entry_type, e.speaker, e.content))
            .collect();

        let plan_section = match plan_text {
            Some(plan) if !plan.trim().is_empty() => format!("Plan (optional):\n{}\n\n", plan),
            _ => String::new(),
        };

        format!(
            "Topic: {}\n\n\
             Participants (brief JSON): {}\n\n\
             {}\
             Recent transcript (truncated):\n{}\n\n\
             Choose next action among: ask_question, participant_turn, interrupt, wrap_up, end.\n\
             - ask_question: Provide 'moderator_question'\n\
             - participant_turn: Provide 'speaker'\n\
             - interrupt: Provide 'speaker' who reacts briefly\n\
             - wrap_up: brief moderator closing\n\
             - end: finish the session\n",
            topic,
            brief,
            plan_section,
            lines.join("\n")
        )
    }
}

impl Coordinator for LlmCoordinator {
    fn propose_next_action(
        &self,
        topic: &str,
        participants: &[Participant],
        recent: &[TranscriptEntry],
        plan_text: Option<&str>,
    ) -> Result<Directive> {
        let prompt = self.build_prompt(topic, participants, recent, plan_text);
        let doc = self
            .brain
            .generate_structured(COORDINATOR_SYSTEM_PROMPT, &prompt, Some("{action: string}"))?;
        if !doc.is_object() {
            warn!("coordinator returned a non-object, wrapping up");
        }
        Ok(Directive::from_document(&doc))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::brain::DisabledBrain;
    use crate::transcript::{EntryType, MODERATOR};

    #[test]
    fn non_object_becomes_soft_wrap_up() {
        let d = Directive::from_document(&json!(["ask_question"]));
        assert_eq!(d.action, Action::WrapUp);
        assert_eq!(d.notes.as_deref(), Some("fallback"));
        assert_eq!(d.reason.as_deref(), Some("invalid response"));
    }

    #[test]
    fn object_fields_are_coerced() {
        let d = Directive::from_document(&json!({
            "action": "Participant_Turn",
            "speaker": "Rahul",
            "moderator_question": 12,
            "notes": "  "
        }));
        assert_eq!(d.action, Action::ParticipantTurn);
        assert_eq!(d.speaker.as_deref(), Some("Rahul"));
        assert!(d.moderator_question.is_none());
        assert!(d.notes.is_none());
    }

    #[test]
    fn missing_or_unknown_action_is_other() {
        assert_eq!(Directive::from_document(&json!({})).action, Action::Other);
        assert_eq!(
            Directive::from_document(&json!({"action": "dance"})).action,
            Action::Other
        );
    }

    #[test]
    fn prompt_uses_only_the_configured_window() {
        let coordinator = LlmCoordinator::new(Arc::new(DisabledBrain), 2);
        let recent: Vec<TranscriptEntry> = (0..5)
            .map(|i| TranscriptEntry::new(EntryType::Question, MODERATOR, format!("q{}", i)))
            .collect();
        let prompt = coordinator.build_prompt("tea", &[Participant::named("Aditi")], &recent, None);
        assert!(prompt.contains("[question|Moderator] q4"));
        assert!(prompt.contains("[question|Moderator] q3"));
        assert!(!prompt.contains("q2"));
        assert!(prompt.contains("\"name\":\"Aditi\""));
        assert!(!prompt.contains("Plan (optional)"));
    }

    #[test]
    fn disabled_service_surfaces_as_error() {
        let coordinator = LlmCoordinator::new(Arc::new(DisabledBrain), 12);
        assert!(coordinator.propose_next_action("tea", &[], &[], None).is_err());
    }
}
