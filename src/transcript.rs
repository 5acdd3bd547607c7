// src/transcript.rs
// The event log every other component reads: append-only, ordered, typed.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::fmt;

pub const MODERATOR: &str = "Moderator";
pub const SYSTEM: &str = "System";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntryType {
    Setup,
    Question,
    Response,
    Interaction,
    PhaseStart,
    WrapUp,
    Casual,
    Conclusion,
    ModeratorFollowUp,
    Transition,
}

impl EntryType {
    pub fn as_str(&self) -> &'static str {
        match self {
            EntryType::Setup => "setup",
            EntryType::Question => "question",
            EntryType::Response => "response",
            EntryType::Interaction => "interaction",
            EntryType::PhaseStart => "phase_start",
            EntryType::WrapUp => "wrap_up",
            EntryType::Casual => "casual",
            EntryType::Conclusion => "conclusion",
            EntryType::ModeratorFollowUp => "moderator_follow_up",
            EntryType::Transition => "transition",
        }
    }
}

impl fmt::Display for EntryType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InteractionType {
    Agreement,
    Disagreement,
    Curiosity,
    Clarification,
}

impl InteractionType {
    pub const ALL: [InteractionType; 4] = [
        InteractionType::Agreement,
        InteractionType::Disagreement,
        InteractionType::Curiosity,
        InteractionType::Clarification,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            InteractionType::Agreement => "agreement",
            InteractionType::Disagreement => "disagreement",
            InteractionType::Curiosity => "curiosity",
            InteractionType::Clarification => "clarification",
        }
    }

    /// Canned line spoken to `target`.
    pub fn line(&self, target: &str) -> String {
        match self {
            InteractionType::Agreement => {
                format!("Yes, exactly! I completely agree with {}.", target)
            }
            InteractionType::Disagreement => {
                format!("I have to respectfully disagree with {} on this.", target)
            }
            InteractionType::Curiosity => {
                format!("That's interesting, {}. Can you tell me more about that?", target)
            }
            InteractionType::Clarification => {
                format!("Sorry {}, could you clarify what you meant by that?", target)
            }
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TranscriptEntry {
    #[serde(rename = "type")]
    pub entry_type: EntryType,
    pub speaker: String,
    pub content: String,
    pub timestamp: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phase: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub interaction_type: Option<InteractionType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub speaking_order: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub personality_type: Option<String>,
    /// Only set on the opening setup entry.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub participants: Option<Vec<String>>,
}

impl TranscriptEntry {
    pub fn new(entry_type: EntryType, speaker: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            entry_type,
            speaker: speaker.into(),
            content: content.into(),
            timestamp: Utc::now().to_rfc3339(),
            phase: None,
            interaction_type: None,
            target: None,
            speaking_order: None,
            personality_type: None,
            participants: None,
        }
    }

    pub fn with_phase(mut self, phase: impl Into<String>) -> Self {
        self.phase = Some(phase.into());
        self
    }

    pub fn with_speaking_order(mut self, order: usize) -> Self {
        self.speaking_order = Some(order);
        self
    }

    pub fn with_personality(mut self, personality_type: impl Into<String>) -> Self {
        self.personality_type = Some(personality_type.into());
        self
    }

    pub fn with_interaction(mut self, kind: InteractionType, target: impl Into<String>) -> Self {
        self.interaction_type = Some(kind);
        self.target = Some(target.into());
        self
    }

    pub fn with_participants(mut self, names: Vec<String>) -> Self {
        self.participants = Some(names);
        self
    }

    /// Moderator and System lines are not participant speech.
    pub fn is_participant_speech(&self) -> bool {
        self.speaker != MODERATOR && self.speaker != SYSTEM
    }
}

/// Append-only sequence of entries. Nothing hands out mutable access to
/// an entry once it is pushed.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(transparent)]
pub struct Transcript {
    entries: Vec<TranscriptEntry>,
}

impl Transcript {
    pub fn new() -> Self {
        Self { entries: Vec::new() }
    }

    pub fn push(&mut self, entry: TranscriptEntry) {
        self.entries.push(entry);
    }

    pub fn entries(&self) -> &[TranscriptEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn first(&self) -> Option<&TranscriptEntry> {
        self.entries.first()
    }

    pub fn last(&self) -> Option<&TranscriptEntry> {
        self.entries.last()
    }

    /// The last `n` entries, oldest first.
    pub fn window(&self, n: usize) -> &[TranscriptEntry] {
        let start = self.entries.len().saturating_sub(n);
        &self.entries[start..]
    }

    pub fn iter(&self) -> std::slice::Iter<'_, TranscriptEntry> {
        self.entries.iter()
    }

    pub fn count_of(&self, entry_type: EntryType) -> usize {
        self.entries.iter().filter(|e| e.entry_type == entry_type).count()
    }

    /// First `limit` entries as `[speaker|type] content` lines, for prompts.
    pub fn excerpt(&self, limit: usize) -> String {
        self.entries
            .iter()
            .take(limit)
            .map(|e| format!("[{}|{}] {}", e.speaker, e.entry_type, e.content))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

impl From<Vec<TranscriptEntry>> for Transcript {
    fn from(entries: Vec<TranscriptEntry>) -> Self {
        Self { entries }
    }
}

impl<'a> IntoIterator for &'a Transcript {
    type Item = &'a TranscriptEntry;
    type IntoIter = std::slice::Iter<'a, TranscriptEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn entry_serializes_with_snake_case_type_and_no_empty_options() {
        let e = TranscriptEntry::new(EntryType::PhaseStart, MODERATOR, "Let's move into opening questions.")
            .with_phase("opening_questions");
        let v = serde_json::to_value(&e).unwrap();
        assert_eq!(v["type"], "phase_start");
        assert_eq!(v["phase"], "opening_questions");
        assert!(v.get("target").is_none());
    }

    #[test]
    fn interaction_lines_name_the_target() {
        for kind in InteractionType::ALL {
            assert!(kind.line("Priya").contains("Priya"), "{}", kind.as_str());
        }
    }

    #[test]
    fn window_returns_tail() {
        let mut t = Transcript::new();
        for i in 0..5 {
            t.push(TranscriptEntry::new(EntryType::Casual, "A", i.to_string()));
        }
        let w = t.window(2);
        assert_eq!(w.len(), 2);
        assert_eq!(w[0].content, "3");
        assert_eq!(t.window(50).len(), 5);
    }

    #[test]
    fn transcript_roundtrips_as_plain_array() {
        let t: Transcript = vec![TranscriptEntry::new(EntryType::Setup, SYSTEM, "Focus Group Discussion: tea")].into();
        let json = serde_json::to_string(&t).unwrap();
        assert!(json.starts_with('['));
        let back: Transcript = serde_json::from_str(&json).unwrap();
        assert_eq!(back, t);
    }
}
