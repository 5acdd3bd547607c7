// src/memory.rs
// Per-participant conversation history: what they heard and what they said.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum MemoryKind {
    Listen,
    Act,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemoryEntry {
    pub kind: MemoryKind,
    pub content: String,
    pub timestamp: DateTime<Utc>,
}

impl MemoryEntry {
    pub fn new(kind: MemoryKind, content: impl Into<String>) -> Self {
        Self {
            kind,
            content: content.into(),
            timestamp: Utc::now(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ConversationMemory {
    pub entries: Vec<MemoryEntry>,
}

impl ConversationMemory {
    pub fn new() -> Self {
        Self { entries: Vec::new() }
    }

    pub fn listen(&mut self, prompt: impl Into<String>) {
        self.entries.push(MemoryEntry::new(MemoryKind::Listen, prompt));
    }

    pub fn act(&mut self, reply: impl Into<String>) {
        self.entries.push(MemoryEntry::new(MemoryKind::Act, reply));
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Content of the newest entry, if any.
    pub fn last_content(&self) -> Option<&str> {
        self.entries.last().map(|e| e.content.as_str())
    }

    pub fn last_prompt(&self) -> Option<&str> {
        self.entries
            .iter()
            .rev()
            .find(|e| e.kind == MemoryKind::Listen)
            .map(|e| e.content.as_str())
    }

    pub fn reply_count(&self) -> usize {
        self.entries.iter().filter(|e| e.kind == MemoryKind::Act).count()
    }

    /// Most recent `limit` entries, oldest first.
    pub fn recent(&self, limit: usize) -> &[MemoryEntry] {
        let start = self.entries.len().saturating_sub(limit);
        &self.entries[start..]
    }

    /// Earlier replies that share a word with `query`, best matches first.
    /// Ties keep the newer reply ahead.
    pub fn recall(&self, query: &str, limit: usize) -> Vec<&MemoryEntry> {
        let words: Vec<String> = query
            .split_whitespace()
            .filter(|w| w.len() > 3)
            .map(|w| w.to_lowercase())
            .collect();

        let mut scored: Vec<(usize, usize)> = self
            .entries
            .iter()
            .enumerate()
            .filter(|(_, e)| e.kind == MemoryKind::Act)
            .map(|(i, e)| {
                let lower = e.content.to_lowercase();
                let hits = words.iter().filter(|w| lower.contains(w.as_str())).count();
                (i, hits)
            })
            .filter(|(_, hits)| *hits > 0)
            .collect();

        scored.sort_by(|a, b| match b.1.cmp(&a.1) {
            Ordering::Equal => b.0.cmp(&a.0),
            other => other,
        });

        scored
            .into_iter()
            .take(limit)
            .map(|(i, _)| &self.entries[i])
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tracks_prompts_and_replies_separately() {
        let mut mem = ConversationMemory::new();
        assert!(mem.is_empty());
        mem.listen("Question: what do you buy?");
        mem.act("Mostly sunscreen.");
        mem.listen("Question: how often?");

        assert_eq!(mem.reply_count(), 1);
        assert_eq!(mem.last_prompt(), Some("Question: how often?"));
        assert_eq!(mem.recent(2).len(), 2);
        assert_eq!(mem.recent(10).len(), 3);
    }

    #[test]
    fn recall_prefers_more_overlap_then_newer() {
        let mut mem = ConversationMemory::new();
        mem.act("I check the price of every serum.");
        mem.act("Weather was nice today.");
        mem.act("Price and brand both matter for serum.");

        let hits = mem.recall("serum price brand", 5);
        assert_eq!(hits.len(), 2);
        assert!(hits[0].content.starts_with("Price and brand"));
    }
}
