// src/organizer.rs
// Single pass over a transcript that buckets entries for the analysts.
// Recomputed on demand, never stored.

use crate::transcript::{EntryType, Transcript, TranscriptEntry};
use serde::Serialize;
use std::collections::HashMap;

pub const TOPIC_MARKER: &str = "Focus Group Discussion:";
pub const DEFAULT_TOPIC: &str = "the discussed topic";

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ResponseRecord {
    pub speaker: String,
    pub content: String,
    pub phase: Option<String>,
    pub word_count: usize,
    pub timestamp: String,
    /// Index into `OrganizedData::questions` of the question open when
    /// this response was given.
    pub question: Option<usize>,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct InteractionRecord {
    pub speaker: String,
    pub content: String,
    pub kind: String,
    pub target: Option<String>,
    pub timestamp: String,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct QuestionRecord {
    pub question: String,
    pub phase: Option<String>,
    /// Indices into `OrganizedData::responses`.
    pub responses: Vec<usize>,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ParticipantRecord {
    pub name: String,
    pub personality_type: String,
    pub responses: Vec<usize>,
    pub interactions: Vec<usize>,
    pub speaking_count: usize,
    pub total_words: usize,
}

impl ParticipantRecord {
    fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            personality_type: "unknown".to_string(),
            responses: Vec::new(),
            interactions: Vec::new(),
            speaking_count: 0,
            total_words: 0,
        }
    }

    pub fn avg_words_per_response(&self) -> f64 {
        self.total_words as f64 / self.speaking_count.max(1) as f64
    }
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct PhaseBucket {
    pub name: String,
    pub questions: Vec<usize>,
    pub response_count: usize,
    pub interaction_count: usize,
}

#[derive(Debug, Clone, Serialize, Default)]
pub struct OrganizedData {
    pub topic: String,
    /// In order of first appearance.
    pub participants: Vec<ParticipantRecord>,
    pub responses: Vec<ResponseRecord>,
    pub interactions: Vec<InteractionRecord>,
    pub questions: Vec<QuestionRecord>,
    pub phases: Vec<PhaseBucket>,
    pub setup_entries: usize,
    pub total_exchanges: usize,
    pub transcript_length: usize,
    /// All participant responses joined by single spaces.
    pub all_content: String,
    #[serde(skip)]
    index: HashMap<String, usize>,
}

impl OrganizedData {
    pub fn participant(&self, name: &str) -> Option<&ParticipantRecord> {
        self.index.get(name).map(|&i| &self.participants[i])
    }

    pub fn participant_names(&self) -> Vec<String> {
        self.participants.iter().map(|p| p.name.clone()).collect()
    }

    pub fn phase_names(&self) -> Vec<String> {
        self.phases.iter().map(|p| p.name.clone()).collect()
    }

    pub fn responses_by<'a>(&'a self, name: &str) -> impl Iterator<Item = &'a ResponseRecord> + 'a {
        let indices = self
            .participant(name)
            .map(|p| p.responses.clone())
            .unwrap_or_default();
        indices.into_iter().map(move |i| &self.responses[i])
    }

    pub fn content_lower(&self) -> String {
        self.all_content.to_lowercase()
    }

    fn register(&mut self, name: &str) -> usize {
        if let Some(&i) = self.index.get(name) {
            return i;
        }
        self.participants.push(ParticipantRecord::new(name));
        let i = self.participants.len() - 1;
        self.index.insert(name.to_string(), i);
        i
    }

    fn phase_bucket(&mut self, name: &str) -> &mut PhaseBucket {
        let pos = match self.phases.iter().position(|p| p.name == name) {
            Some(pos) => pos,
            None => {
                self.phases.push(PhaseBucket {
                    name: name.to_string(),
                    questions: Vec::new(),
                    response_count: 0,
                    interaction_count: 0,
                });
                self.phases.len() - 1
            }
        };
        &mut self.phases[pos]
    }
}

pub fn organize(transcript: &Transcript) -> OrganizedData {
    organize_entries(transcript.entries())
}

pub fn organize_entries(entries: &[TranscriptEntry]) -> OrganizedData {
    let mut data = OrganizedData {
        topic: DEFAULT_TOPIC.to_string(),
        transcript_length: entries.len(),
        ..OrganizedData::default()
    };
    let mut current_phase: Option<String> = None;
    let mut contents: Vec<&str> = Vec::new();

    for entry in entries {
        if entry.entry_type == EntryType::Setup {
            data.setup_entries += 1;
            if let Some(rest) = entry.content.split_once(TOPIC_MARKER).map(|(_, rest)| rest.trim()) {
                if !rest.is_empty() {
                    data.topic = rest.to_string();
                }
            }
        }

        let participant = if entry.is_participant_speech() {
            let i = data.register(&entry.speaker);
            if let Some(pt) = entry.personality_type.as_deref() {
                let record = &mut data.participants[i];
                if record.personality_type == "unknown" {
                    record.personality_type = pt.to_string();
                }
            }
            Some(i)
        } else {
            None
        };

        match entry.entry_type {
            EntryType::Question => {
                let phase = entry.phase.clone().or_else(|| current_phase.clone());
                data.questions.push(QuestionRecord {
                    question: entry.content.clone(),
                    phase: phase.clone(),
                    responses: Vec::new(),
                });
                let q = data.questions.len() - 1;
                if let Some(name) = &phase {
                    data.phase_bucket(name).questions.push(q);
                }
                current_phase = phase;
            }
            EntryType::Response => {
                let Some(p) = participant else { continue };
                let phase = entry.phase.clone().or_else(|| current_phase.clone());
                let question = data.questions.len().checked_sub(1);
                let record = ResponseRecord {
                    speaker: entry.speaker.clone(),
                    content: entry.content.clone(),
                    phase: phase.clone(),
                    word_count: entry.content.split_whitespace().count(),
                    timestamp: entry.timestamp.clone(),
                    question,
                };
                let words = record.word_count;
                data.responses.push(record);
                let r = data.responses.len() - 1;

                let bucket = &mut data.participants[p];
                bucket.responses.push(r);
                bucket.speaking_count += 1;
                bucket.total_words += words;

                if let Some(q) = question {
                    data.questions[q].responses.push(r);
                }
                if let Some(name) = &phase {
                    data.phase_bucket(name).response_count += 1;
                }
                data.total_exchanges += 1;
                contents.push(&entry.content);
            }
            EntryType::Interaction => {
                data.interactions.push(InteractionRecord {
                    speaker: entry.speaker.clone(),
                    content: entry.content.clone(),
                    kind: entry
                        .interaction_type
                        .map(|k| k.as_str().to_string())
                        .unwrap_or_else(|| "general".to_string()),
                    target: entry.target.clone(),
                    timestamp: entry.timestamp.clone(),
                });
                let n = data.interactions.len() - 1;
                if let Some(p) = participant {
                    data.participants[p].interactions.push(n);
                }
                let phase = entry.phase.clone().or_else(|| current_phase.clone());
                if let Some(name) = &phase {
                    data.phase_bucket(name).interaction_count += 1;
                }
            }
            _ => {}
        }
    }

    data.all_content = contents.join(" ");
    data
}
