// src/qa.rs
// Q&A ASSISTANT: answers free-form questions about a finished discussion.
// Keyword retrieval over transcript + summary, one generation attempt,
// then category-specific answer builders.

use crate::analyst::string_list;
use crate::brain::GenerationService;
use crate::error::{FocusGroupError, Result};
use crate::heuristics::{
    brand_loyalty, engagement_level, innovation_openness, price_sensitivity, tally_sentiment,
    title_case, truncate_chars,
};
use crate::organizer::{organize, OrganizedData};
use crate::participant::Participant;
use crate::transcript::{EntryType, Transcript, TranscriptEntry};
use chrono::Utc;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use std::collections::BTreeMap;
use std::fmt::Write as _;
use std::sync::{Arc, Mutex};
use tracing::{debug, info, warn};

const EXCERPT_ENTRIES: usize = 600;
const SUMMARY_CHARS: usize = 4000;
const ANSWER_TEMPERATURE: f32 = 0.4;
const ANSWER_MAX_TOKENS: u32 = 220;

const STOP_WORDS: [&str; 13] = [
    "what", "how", "who", "when", "where", "why", "is", "are", "was", "were", "the", "a", "an",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuestionCategory {
    ParticipantSpecific,
    ThemeAnalysis,
    BehavioralInsights,
    DemographicAnalysis,
    SentimentAnalysis,
    ComparativeAnalysis,
    ActionableInsights,
    General,
}

impl QuestionCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            QuestionCategory::ParticipantSpecific => "participant_specific",
            QuestionCategory::ThemeAnalysis => "theme_analysis",
            QuestionCategory::BehavioralInsights => "behavioral_insights",
            QuestionCategory::DemographicAnalysis => "demographic_analysis",
            QuestionCategory::SentimentAnalysis => "sentiment_analysis",
            QuestionCategory::ComparativeAnalysis => "comparative_analysis",
            QuestionCategory::ActionableInsights => "actionable_insights",
            QuestionCategory::General => "general",
        }
    }
}

/// First row with a matching substring wins.
const CATEGORY_TABLE: [(&[&str], QuestionCategory); 7] = [
    (&["who", "which participant", "what did", "how did"], QuestionCategory::ParticipantSpecific),
    (&["theme", "topic", "discuss", "main", "primary"], QuestionCategory::ThemeAnalysis),
    (
        &["buy", "purchase", "decision", "behavior", "drive", "motivate"],
        QuestionCategory::BehavioralInsights,
    ),
    (&["age", "demographic", "personality", "type", "group"], QuestionCategory::DemographicAnalysis),
    (
        &["sentiment", "feel", "opinion", "positive", "negative", "reaction"],
        QuestionCategory::SentimentAnalysis,
    ),
    (&["compare", "difference", "versus", "vs", "contrast"], QuestionCategory::ComparativeAnalysis),
    (
        &["recommend", "suggest", "opportunity", "action", "next step"],
        QuestionCategory::ActionableInsights,
    ),
];

pub fn categorize(question: &str) -> QuestionCategory {
    let lower = question.to_lowercase();
    CATEGORY_TABLE
        .iter()
        .find(|(words, _)| words.iter().any(|w| lower.contains(w)))
        .map(|(_, c)| *c)
        .unwrap_or(QuestionCategory::General)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Confidence {
    High,
    Medium,
    Low,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceType {
    Llm,
    ParticipantSpecific,
    MultipleParticipants,
    ThematicAnalysis,
    BehavioralAnalysis,
    DemographicAnalysis,
    SentimentAnalysis,
    ComparativeAnalysis,
    ActionableInsights,
    GeneralAnalysis,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Answer {
    pub answer: String,
    pub category: QuestionCategory,
    pub confidence: Confidence,
    pub source_type: SourceType,
    /// Builder-specific counters such as `response_count`.
    #[serde(flatten)]
    pub details: Map<String, Value>,
}

impl Answer {
    fn new(category: QuestionCategory, source_type: SourceType, confidence: Confidence, answer: String) -> Self {
        Self {
            answer,
            category,
            confidence,
            source_type,
            details: Map::new(),
        }
    }

    fn with(mut self, key: &str, value: Value) -> Self {
        self.details.insert(key.to_string(), value);
        self
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct HistoryEntry {
    pub question: String,
    pub answer: String,
    pub category: QuestionCategory,
    pub timestamp: String,
}

// =========================================================================
// CONTEXT RETRIEVAL
// =========================================================================

/// Lower-cased question words minus stop words and anything of two
/// characters or fewer. Edge punctuation is trimmed first.
pub fn keywords(question: &str) -> Vec<String> {
    question
        .to_lowercase()
        .split_whitespace()
        .map(|w| w.trim_matches(|c: char| !c.is_alphanumeric()))
        .filter(|w| w.chars().count() > 2 && !STOP_WORDS.contains(w))
        .map(String::from)
        .collect()
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct RetrievedContext {
    pub keywords: Vec<String>,
    pub responses: Vec<TranscriptEntry>,
    pub interactions: Vec<TranscriptEntry>,
    pub participants: Vec<String>,
    pub summary_sections: Vec<String>,
}

fn mentions_any(text: &str, keywords: &[String]) -> bool {
    let lower = text.to_lowercase();
    keywords.iter().any(|k| lower.contains(k.as_str()))
}

pub fn extract_context(
    question: &str,
    transcript: &Transcript,
    summary: &Value,
    participants: &[Participant],
) -> RetrievedContext {
    let keywords = keywords(question);
    let mut ctx = RetrievedContext::default();

    for entry in transcript {
        if !mentions_any(&entry.content, &keywords) {
            continue;
        }
        match entry.entry_type {
            EntryType::Response => ctx.responses.push(entry.clone()),
            EntryType::Interaction => ctx.interactions.push(entry.clone()),
            _ => {}
        }
    }

    ctx.participants = participants
        .iter()
        .filter(|p| mentions_any(&format!("{} {}", p.name, p.background), &keywords))
        .map(|p| p.name.clone())
        .collect();

    if let Some(sections) = summary.as_object() {
        ctx.summary_sections = sections
            .iter()
            .filter(|(name, _)| name.as_str() != "metadata")
            .filter(|(_, value)| mentions_any(&value.to_string(), &keywords))
            .map(|(name, _)| name.clone())
            .collect();
    }

    ctx.keywords = keywords;
    ctx
}

// =========================================================================
// ASSISTANT
// =========================================================================

pub struct QaAssistant {
    brain: Arc<dyn GenerationService>,
    llm_only: bool,
    history: Mutex<Vec<HistoryEntry>>,
}

impl QaAssistant {
    pub fn new(brain: Arc<dyn GenerationService>, llm_only: bool) -> Self {
        Self {
            brain,
            llm_only,
            history: Mutex::new(Vec::new()),
        }
    }

    pub fn answer(
        &self,
        question: &str,
        transcript: &Transcript,
        summary: &Value,
        participants: &[Participant],
    ) -> Result<Answer> {
        let category = categorize(question);
        debug!(category = category.as_str(), "answering question");

        let answer = match self.try_generate(question, category, transcript, summary)? {
            Some(answer) => answer,
            None => {
                let ctx = extract_context(question, transcript, summary, participants);
                let data = organize(transcript);
                let inputs = Inputs {
                    question,
                    lower: question.to_lowercase(),
                    category,
                    ctx: &ctx,
                    transcript,
                    summary,
                    participants,
                    data: &data,
                };
                build_answer(&inputs)
            }
        };

        self.remember(question, &answer);
        Ok(answer)
    }

    /// `Ok(None)` means use the deterministic builders.
    fn try_generate(
        &self,
        question: &str,
        category: QuestionCategory,
        transcript: &Transcript,
        summary: &Value,
    ) -> Result<Option<Answer>> {
        if !self.brain.enabled() {
            if self.llm_only {
                return Err(FocusGroupError::ServiceUnavailable(
                    "question answering requires the generation service".into(),
                ));
            }
            return Ok(None);
        }

        let system = "You are a Q&A assistant over a focus group transcript and its summary. \
                      Answer succinctly (2-6 bullet points or short paragraph), cite participants by name, and stay grounded.";
        let summary_text: String = summary.to_string().chars().take(SUMMARY_CHARS).collect();
        let user = format!(
            "Question: {}\nCategory: {}\n\nTranscript excerpt (truncated):\n{}\n\nSummary (truncated JSON):\n{}\n\nRespond clearly.",
            question,
            category.as_str(),
            transcript.excerpt(EXCERPT_ENTRIES),
            summary_text
        );

        match self
            .brain
            .generate_text(system, &user, Some(ANSWER_TEMPERATURE), Some(ANSWER_MAX_TOKENS))
        {
            Ok(text) if !text.trim().is_empty() => {
                info!(category = category.as_str(), "question answered by service");
                Ok(Some(Answer::new(category, SourceType::Llm, Confidence::High, text)))
            }
            Ok(_) if self.llm_only => Err(FocusGroupError::MalformedResponse("empty answer".into())),
            Err(e) if self.llm_only => Err(e.into()),
            Ok(_) => {
                warn!("empty answer from service, using heuristics");
                Ok(None)
            }
            Err(e) => {
                warn!(error = %e, "answer generation failed, using heuristics");
                Ok(None)
            }
        }
    }

    fn remember(&self, question: &str, answer: &Answer) {
        let entry = HistoryEntry {
            question: question.to_string(),
            answer: answer.answer.clone(),
            category: answer.category,
            timestamp: Utc::now().to_rfc3339(),
        };
        let mut history = self.history.lock().unwrap_or_else(|e| e.into_inner());
        match history.iter_mut().find(|h| h.question == question) {
            Some(existing) => *existing = entry,
            None => history.push(entry),
        }
    }

    /// Asked questions in first-asked order. Re-asking replaces the answer.
    pub fn history(&self) -> Vec<HistoryEntry> {
        self.history.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    pub fn clear_history(&self) {
        self.history.lock().unwrap_or_else(|e| e.into_inner()).clear();
    }
}

pub fn suggest_follow_ups(answer: &Answer) -> Vec<&'static str> {
    match answer.source_type {
        SourceType::ParticipantSpecific => vec![
            "How did other participants react to this viewpoint?",
            "What personality type was this participant?",
            "Did this participant influence others in the discussion?",
        ],
        SourceType::ThematicAnalysis => vec![
            "Which theme generated the most discussion?",
            "How did themes evolve throughout the discussion?",
            "What themes were unique to specific participant types?",
        ],
        SourceType::BehavioralAnalysis => vec![
            "What specific barriers were mentioned most frequently?",
            "How do these behaviors vary by demographic?",
            "What would change these behavioral patterns?",
        ],
        SourceType::SentimentAnalysis => vec![
            "What caused the most positive reactions?",
            "Which participants had the strongest negative sentiment?",
            "How did sentiment change throughout the discussion?",
        ],
        _ => vec![
            "What were the most surprising insights from this discussion?",
            "How do these findings compare to industry standards?",
            "What should be the next steps based on these insights?",
        ],
    }
}

// =========================================================================
// ANSWER BUILDERS
// =========================================================================

struct Inputs<'a> {
    question: &'a str,
    lower: String,
    category: QuestionCategory,
    ctx: &'a RetrievedContext,
    transcript: &'a Transcript,
    summary: &'a Value,
    participants: &'a [Participant],
    data: &'a OrganizedData,
}

impl<'a> Inputs<'a> {
    fn asks_about(&self, words: &[&str]) -> bool {
        words.iter().any(|w| self.lower.contains(w))
    }

    fn summary_list(&self, key: &str) -> Vec<String> {
        self.summary.get(key).and_then(string_list).unwrap_or_default()
    }

    /// `(speaker, quote)` pairs from `supporting_quotes`.
    fn summary_quotes(&self) -> Vec<(String, String)> {
        self.summary
            .get("supporting_quotes")
            .and_then(Value::as_array)
            .map(|quotes| {
                quotes
                    .iter()
                    .map(|q| {
                        (
                            q.get("speaker").and_then(Value::as_str).unwrap_or("Participant").to_string(),
                            q.get("quote").and_then(Value::as_str).unwrap_or_default().to_string(),
                        )
                    })
                    .collect()
            })
            .unwrap_or_default()
    }

    fn responses_from(&self, name: &str) -> Vec<&'a TranscriptEntry> {
        self.transcript
            .iter()
            .filter(|e| e.entry_type == EntryType::Response && e.speaker == name)
            .collect()
    }
}

fn build_answer(inputs: &Inputs<'_>) -> Answer {
    match inputs.category {
        QuestionCategory::ParticipantSpecific => participant_answer(inputs),
        QuestionCategory::ThemeAnalysis => theme_answer(inputs),
        QuestionCategory::BehavioralInsights => behavioral_answer(inputs),
        QuestionCategory::DemographicAnalysis => demographic_answer(inputs),
        QuestionCategory::SentimentAnalysis => sentiment_answer(inputs),
        QuestionCategory::ComparativeAnalysis => comparative_answer(inputs),
        QuestionCategory::ActionableInsights => actionable_answer(inputs),
        QuestionCategory::General => general_answer(inputs),
    }
}

fn or_default<'a>(value: &'a str, fallback: &'a str) -> &'a str {
    if value.trim().is_empty() {
        fallback
    } else {
        value
    }
}

fn participant_answer(inputs: &Inputs<'_>) -> Answer {
    let named = inputs
        .participants
        .iter()
        .find(|p| inputs.lower.contains(&p.name.to_lowercase()));

    let Some(person) = named else {
        return group_answer(inputs);
    };

    let responses = inputs.responses_from(&person.name);
    let mut text = format!(
        "**{}** shared several important perspectives during the discussion:\n\n",
        person.name
    );
    if responses.is_empty() {
        let _ = write!(
            text,
            "{} did not provide specific responses to the main discussion questions, but was present as a participant.\n\n",
            person.name
        );
    } else {
        for (i, r) in responses.iter().take(4).enumerate() {
            let _ = write!(text, "**Response {}:** {}\n\n", i + 1, truncate_chars(&r.content, 300));
        }
        if responses.len() > 4 {
            let _ = write!(
                text,
                "*({} made {} total contributions throughout the discussion)*\n\n",
                person.name,
                responses.len()
            );
        }
    }

    text.push_str("**Participant Profile:**\n");
    let _ = writeln!(text, "• **Age:** {} years old", person.age);
    let _ = writeln!(text, "• **Occupation:** {}", or_default(&person.occupation, "Professional"));
    let _ = writeln!(text, "• **Location:** {}", or_default(&person.location, "Not specified"));
    let _ = writeln!(
        text,
        "• **Personality Type:** {}",
        title_case(or_default(&person.personality_type, "balanced"))
    );
    let _ = writeln!(text, "• **Monthly Budget:** {}", or_default(&person.monthly_budget, "Not specified"));
    if !person.background.trim().is_empty() {
        let _ = writeln!(text, "• **Background:** {}", truncate_chars(&person.background, 200));
    }

    let confidence = if responses.is_empty() { Confidence::Medium } else { Confidence::High };
    Answer::new(inputs.category, SourceType::ParticipantSpecific, confidence, text)
        .with("participant", json!(person.name))
        .with("response_count", json!(responses.len()))
}

fn group_answer(inputs: &Inputs<'_>) -> Answer {
    let relevant: Vec<&TranscriptEntry> = inputs.ctx.responses.iter().take(6).collect();
    let text = if relevant.is_empty() {
        let mut text = String::from("Here's an overview of the participants and their contributions:\n\n");
        for p in inputs.participants.iter().take(5) {
            let _ = writeln!(
                text,
                "**{}** ({}): {} contributions",
                p.name,
                title_case(or_default(&p.personality_type, "balanced")),
                inputs.responses_from(&p.name).len()
            );
        }
        text
    } else {
        let mut text = String::from("Based on participant responses related to your question:\n\n");
        for r in &relevant {
            let _ = write!(text, "**{}:** {}\n\n", r.speaker, truncate_chars(&r.content, 250));
        }
        text
    };
    let confidence = if relevant.is_empty() { Confidence::Low } else { Confidence::Medium };
    Answer::new(inputs.category, SourceType::MultipleParticipants, confidence, text)
        .with("response_count", json!(relevant.len()))
}

fn theme_answer(inputs: &Inputs<'_>) -> Answer {
    let insights = inputs.summary_list("key_insights");
    let quotes = inputs.summary_quotes();
    let mut text = String::from("Based on the thematic analysis of the discussion:\n\n");

    if !insights.is_empty() {
        text.push_str("**Main Themes Identified:**\n");
        for (i, insight) in insights.iter().enumerate() {
            let _ = writeln!(text, "{}. {}", i + 1, insight);
        }
        text.push('\n');
    }
    if !quotes.is_empty() {
        text.push_str("**Supporting Evidence:**\n");
        for (speaker, quote) in quotes.iter().take(2) {
            let _ = writeln!(text, "• {} - *{}*", quote, speaker);
        }
        text.push('\n');
    }
    if inputs.asks_about(&["most discussed", "popular"]) {
        text.push_str("**Most Discussed Topics:**\nBased on participant engagement, the themes that generated the most discussion were those related to practical decision-making factors and personal experiences.\n\n");
    }
    if inputs.asks_about(&["consensus", "agreement"]) {
        text.push_str("**Areas of Consensus:**\nParticipants generally agreed on the importance of authentic experiences and value-driven decisions, though specific preferences varied by personality type.\n\n");
    }
    if inputs.asks_about(&["different", "disagree"]) {
        text.push_str("**Divergent Viewpoints:**\nThe main differences emerged around price sensitivity, risk tolerance, and preferred information sources, reflecting the diverse personality types in the group.\n");
    }

    let confidence = if insights.is_empty() { Confidence::Medium } else { Confidence::High };
    Answer::new(inputs.category, SourceType::ThematicAnalysis, confidence, text)
        .with("themes_identified", json!(insights.len()))
}

/// Insights mentioning any of `words`, or the canned bullets when none do.
fn insight_bullets(text: &mut String, insights: &[String], words: &[&str], limit: usize, canned: &[&str]) {
    let matching: Vec<&String> = insights
        .iter()
        .filter(|i| {
            let lower = i.to_lowercase();
            words.iter().any(|w| lower.contains(w))
        })
        .take(limit)
        .collect();
    if matching.is_empty() {
        for line in canned {
            let _ = writeln!(text, "• {}", line);
        }
    } else {
        for insight in matching {
            let _ = writeln!(text, "• {}", insight);
        }
    }
    text.push('\n');
}

fn behavioral_answer(inputs: &Inputs<'_>) -> Answer {
    let insights = inputs.summary_list("key_insights");
    let mut text = String::from("Based on the behavioral analysis from the discussion:\n\n");

    if inputs.asks_about(&["decision", "choose", "buy", "purchase"]) {
        text.push_str("**Decision-Making Behavior:**\n");
        insight_bullets(
            &mut text,
            &insights,
            &["decision", "choice", "prefer", "select"],
            3,
            &[
                "Participants showed varied decision-making patterns based on their personality types",
                "Price, quality, and peer recommendations were key decision factors",
                "Research behavior varied from extensive comparison to impulse decisions",
            ],
        );
    }
    if inputs.asks_about(&["drive", "motivate", "influence", "factor"]) {
        text.push_str("**Key Purchase Drivers:**\n");
        insight_bullets(
            &mut text,
            &insights,
            &["drive", "factor", "important", "key"],
            usize::MAX,
            &[
                "Quality and reliability are primary motivators",
                "Value for money considerations",
                "Social proof and peer recommendations",
                "Brand trust and reputation",
            ],
        );
    }
    if inputs.asks_about(&["barrier", "concern", "problem", "issue", "prevent"]) {
        text.push_str("**Main Barriers & Concerns:**\n");
        insight_bullets(
            &mut text,
            &insights,
            &["barrier", "concern", "problem", "difficult"],
            usize::MAX,
            &[
                "Price sensitivity and budget constraints",
                "Trust and credibility concerns",
                "Information overload and confusion",
                "Previous negative experiences",
            ],
        );
    }

    let quotes = inputs.summary_quotes();
    if !quotes.is_empty() {
        text.push_str("**Participant Perspectives:**\n");
        for (speaker, quote) in quotes.iter().take(2) {
            let _ = writeln!(text, "• *\"{}\"* - {}", quote.replace('"', ""), speaker);
        }
        text.push('\n');
    }
    if inputs.asks_about(&["research", "information", "learn", "find out"]) {
        text.push_str("**Research Behavior:**\n");
        text.push_str("• Participants showed diverse information-seeking patterns\n");
        text.push_str("• Online reviews and peer recommendations are highly valued\n");
        text.push_str("• Social media and influencer content influence research\n");
        text.push_str("• Traditional advertising has limited impact on this demographic\n");
    }

    let confidence = if insights.is_empty() { Confidence::Medium } else { Confidence::High };
    Answer::new(inputs.category, SourceType::BehavioralAnalysis, confidence, text)
        .with("insights_count", json!(insights.len()))
}

fn demographic_answer(inputs: &Inputs<'_>) -> Answer {
    let mut text = String::from("Based on the demographic analysis:\n\n");

    let mut distribution: BTreeMap<&str, usize> = BTreeMap::new();
    for p in inputs.participants {
        *distribution.entry(p.personality_label()).or_insert(0) += 1;
    }
    text.push_str("**Participant Overview:**\n");
    let _ = writeln!(text, "• Total participants: {}", inputs.participants.len());
    if !distribution.is_empty() {
        text.push_str("• Personality distribution:\n");
        for (personality, count) in &distribution {
            let _ = writeln!(text, "  - {}: {}", title_case(personality), count);
        }
    }
    text.push('\n');

    let data = inputs.data;
    if !data.participants.is_empty() {
        let most_active = data
            .participants
            .iter()
            .fold(None::<&crate::organizer::ParticipantRecord>, |best, p| match best {
                Some(b) if b.speaking_count >= p.speaking_count => Some(b),
                _ => Some(p),
            })
            .map(|p| p.name.as_str())
            .unwrap_or("N/A");
        let average = data.total_exchanges as f64 / data.participants.len() as f64;
        text.push_str("**Engagement Patterns:**\n");
        let _ = writeln!(text, "• Most active: {}", most_active);
        let _ = writeln!(text, "• Average responses per participant: {:.1}", average);
        let _ = writeln!(text, "• Engagement level: {}\n", engagement_level(data));
    }

    text.push_str("**Participant Profiles:**\n");
    for p in inputs.participants.iter().take(3) {
        let _ = writeln!(
            text,
            "• {}: {} years old, {}, {} personality",
            p.name,
            p.age,
            or_default(&p.occupation, "N/A"),
            or_default(&p.personality_type, "balanced")
        );
    }

    Answer::new(inputs.category, SourceType::DemographicAnalysis, Confidence::High, text)
        .with("participant_count", json!(inputs.participants.len()))
}

fn sentiment_answer(inputs: &Inputs<'_>) -> Answer {
    let tally = tally_sentiment(&inputs.data.responses);
    let mut text = String::from("Based on the sentiment analysis:\n\n");

    text.push_str("**Overall Sentiment Distribution:**\n");
    let _ = writeln!(text, "• Positive responses: {}", tally.positive);
    let _ = writeln!(text, "• Negative responses: {}", tally.negative);
    let _ = writeln!(text, "• Neutral responses: {}", tally.neutral);
    let _ = writeln!(text, "• Dominant sentiment: {}\n", title_case(tally.dominant.as_str()));

    if !tally.by_participant.is_empty() {
        text.push_str("**Participant Sentiment:**\n");
        for (name, sentiment) in tally.by_participant.iter().take(4) {
            let _ = writeln!(text, "• {}: {}", name, title_case(sentiment.as_str()));
        }
    }

    let confidence = if inputs.data.responses.is_empty() {
        Confidence::Medium
    } else {
        Confidence::High
    };
    Answer::new(inputs.category, SourceType::SentimentAnalysis, confidence, text)
        .with("dominant_sentiment", json!(tally.dominant.as_str()))
}

const COMPARISON_INDICATORS: [&str; 5] = ["vs", "versus", "compared to", "difference between", "contrast"];
/// Indicators matched as whole words, so "vs" never splits "canvas".
static INDICATOR_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    COMPARISON_INDICATORS
        .iter()
        .map(|i| Regex::new(&format!(r"\b{}\b", regex::escape(i))).expect("comparison indicator pattern"))
        .collect()
});
const COMMON_COMPARISONS: [[&str; 2]; 6] = [
    ["online", "offline"],
    ["digital", "physical"],
    ["premium", "budget"],
    ["young", "old"],
    ["male", "female"],
    ["urban", "rural"],
];

/// Up to two words either side of the first comparison indicator, or the
/// first stock pair fully present in the question.
pub fn comparison_terms(question: &str) -> Vec<String> {
    let lower = question.to_lowercase();
    for pattern in INDICATOR_PATTERNS.iter() {
        let parts: Vec<&str> = pattern.split(&lower).collect();
        if parts.len() == 2 {
            let before: Vec<&str> = parts[0].split_whitespace().collect();
            let after: Vec<&str> = parts[1].split_whitespace().take(2).collect();
            let left = before[before.len().saturating_sub(2)..].join(" ");
            return vec![left, after.join(" ")];
        }
    }
    COMMON_COMPARISONS
        .iter()
        .find(|pair| pair.iter().all(|t| lower.contains(t)))
        .map(|pair| pair.iter().map(|t| t.to_string()).collect())
        .unwrap_or_default()
}

fn comparative_answer(inputs: &Inputs<'_>) -> Answer {
    let terms = comparison_terms(inputs.question);
    let mut text = String::from("Based on the comparative analysis:\n\n");

    if !terms.is_empty() {
        let _ = write!(text, "**Comparing {}:**\n\n", terms.join(" vs "));
        for term in terms.iter().filter(|t| !t.is_empty()) {
            let hits: Vec<&TranscriptEntry> = inputs
                .transcript
                .iter()
                .filter(|e| e.entry_type == EntryType::Response && e.content.to_lowercase().contains(term.as_str()))
                .take(2)
                .collect();
            if hits.is_empty() {
                continue;
            }
            let _ = writeln!(text, "**{} perspective:**", title_case(term));
            for e in hits {
                let _ = writeln!(text, "• {}: {}", e.speaker, truncate_chars(&e.content, 150));
            }
            text.push('\n');
        }
    }

    let responses = &inputs.data.responses;
    text.push_str("**Key Behavioral Patterns:**\n");
    let _ = writeln!(text, "• Price Sensitivity: {}", price_sensitivity(responses));
    let _ = writeln!(text, "• Brand Loyalty: {}", brand_loyalty(responses));
    let _ = writeln!(text, "• Innovation Openness: {}", innovation_openness(responses));

    let confidence = if terms.is_empty() { Confidence::Low } else { Confidence::Medium };
    Answer::new(inputs.category, SourceType::ComparativeAnalysis, confidence, text)
        .with("comparison_terms", json!(terms))
}

fn actionable_answer(inputs: &Inputs<'_>) -> Answer {
    let recs = inputs.summary_list("opportunities_recommendations");
    let steps = inputs.summary_list("next_steps");
    let insights = inputs.summary_list("key_insights");
    let mut text = String::from("Based on the discussion, here are the key actionable insights:\n\n");

    if !recs.is_empty() && inputs.asks_about(&["recommend", "suggest", "should", "action"]) {
        text.push_str("**Strategic Recommendations:**\n");
        for (i, r) in recs.iter().enumerate() {
            let _ = writeln!(text, "{}. {}", i + 1, r);
        }
        text.push('\n');
    }
    if !steps.is_empty() && inputs.asks_about(&["next", "follow", "step", "future", "plan"]) {
        text.push_str("**Immediate Next Steps:**\n");
        for (i, s) in steps.iter().enumerate() {
            let _ = writeln!(text, "{}. {}", i + 1, s);
        }
        text.push('\n');
    }
    if inputs.asks_about(&["opportunity", "potential", "chance", "possibility"]) {
        text.push_str("**Key Opportunities Identified:**\n");
        let matching: Vec<&String> = insights
            .iter()
            .filter(|i| {
                let lower = i.to_lowercase();
                ["opportunity", "potential", "could", "should"].iter().any(|w| lower.contains(w))
            })
            .collect();
        let lines: Vec<&String> = if matching.is_empty() {
            recs.iter().take(3).collect()
        } else {
            matching
        };
        for line in lines {
            let _ = writeln!(text, "• {}", line);
        }
        text.push('\n');
    }
    if inputs.asks_about(&["priority", "important", "first", "urgent"]) {
        text.push_str("**Implementation Priorities:**\n");
        if let Some(first) = recs.first() {
            let _ = write!(text, "**High Priority:** {}\n\n", first);
        }
        if let Some(second) = recs.get(1) {
            let _ = write!(text, "**Medium Priority:** {}\n\n", second);
        }
        if recs.len() > 2 {
            text.push_str("**Additional Considerations:**\n");
            for r in recs.iter().skip(2).take(2) {
                let _ = writeln!(text, "• {}", r);
            }
        }
        text.push('\n');
    }
    if inputs.asks_about(&["risk", "concern", "avoid", "prevent"]) {
        text.push_str("**Risk Mitigation Strategies:**\n");
        text.push_str("• Address price sensitivity through clear value communication\n");
        text.push_str("• Build trust through transparent processes and social proof\n");
        text.push_str("• Ensure mobile-optimized experiences for digital-native users\n");
        text.push_str("• Provide educational content to reduce confusion and uncertainty\n");
    }
    if !inputs.asks_about(&["recommend", "next", "opportunity", "priority", "risk"]) {
        if !recs.is_empty() {
            text.push_str("**Key Recommendations:**\n");
            for r in recs.iter().take(4) {
                let _ = writeln!(text, "• {}", r);
            }
            text.push('\n');
        }
        if !steps.is_empty() {
            text.push_str("**Next Steps:**\n");
            for s in steps.iter().take(3) {
                let _ = writeln!(text, "• {}", s);
            }
        }
    }

    let confidence = if recs.is_empty() && steps.is_empty() {
        Confidence::Medium
    } else {
        Confidence::High
    };
    Answer::new(inputs.category, SourceType::ActionableInsights, confidence, text)
        .with("recommendations_count", json!(recs.len()))
        .with("next_steps_count", json!(steps.len()))
}

fn general_answer(inputs: &Inputs<'_>) -> Answer {
    let relevant: Vec<&TranscriptEntry> = inputs.ctx.responses.iter().take(3).collect();
    let sections = &inputs.ctx.summary_sections;
    let mut text = String::from("Based on the discussion data:\n\n");

    if !relevant.is_empty() {
        text.push_str("**Relevant Participant Responses:**\n");
        for r in &relevant {
            let _ = writeln!(text, "• {}: {}", r.speaker, truncate_chars(&r.content, 200));
        }
        text.push('\n');
    }
    if !sections.is_empty() {
        text.push_str("**Summary Insights:**\n");
        for name in sections {
            let _ = writeln!(text, "• {}: Key findings available", title_case(name));
        }
        text.push('\n');
    }

    let mut phases: Vec<&str> = inputs.transcript.iter().filter_map(|e| e.phase.as_deref()).collect();
    phases.sort_unstable();
    phases.dedup();
    text.push_str("**Discussion Overview:**\n");
    let _ = writeln!(text, "• Total participants: {}", inputs.participants.len());
    let _ = writeln!(
        text,
        "• Total responses analyzed: {}",
        inputs.transcript.count_of(EntryType::Response)
    );
    let _ = writeln!(text, "• Discussion phases covered: {}", phases.len());

    let confidence = if relevant.is_empty() && sections.is_empty() {
        Confidence::Low
    } else {
        Confidence::Medium
    };
    Answer::new(inputs.category, SourceType::GeneralAnalysis, confidence, text)
}
