// src/analyst.rs
// SUMMARY GENERATOR: turns a finished transcript into the fixed six-section
// report. One generation-service attempt first, keyword heuristics after.

use crate::brain::GenerationService;
use crate::error::Result;
use crate::heuristics::{
    brand_loyalty, distinct_personalities, engagement_level, extract_themes, fired_rules,
    has_opinion, innovation_openness, price_sensitivity, tally_sentiment, KeywordRule, Level,
    Quote,
};
use crate::organizer::{organize, OrganizedData};
use crate::transcript::Transcript;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{debug, info, warn};

pub const SCHEMA_VERSION: &str = "2.0";
pub const SECTION_KEYS: [&str; 6] = [
    "objective",
    "participants",
    "key_insights",
    "supporting_quotes",
    "opportunities_recommendations",
    "next_steps",
];

const QUOTE_MAX_CHARS: usize = 150;
const EXCERPT_ENTRIES: usize = 800;

const INSIGHT_RULES: [KeywordRule; 3] = [
    KeywordRule {
        triggers: &["trust", "review", "experience"],
        text: "Peer recommendations and authentic reviews significantly influence purchase decisions more than traditional advertising.",
    },
    KeywordRule {
        triggers: &["online", "app", "website"],
        text: "Digital-first experiences are preferred, with mobile accessibility being a key requirement.",
    },
    KeywordRule {
        triggers: &["brand", "quality"],
        text: "Brand reputation and proven quality are essential for building consumer confidence and loyalty.",
    },
];

const INSIGHT_FILLERS: [&str; 3] = [
    "Participants demonstrate strong preference for authentic, relatable experiences over polished marketing.",
    "Word-of-mouth and social proof play crucial roles in decision-making processes.",
    "Convenience and accessibility are increasingly important factors in consumer choices.",
];

const RECOMMENDATION_RULES: [KeywordRule; 3] = [
    KeywordRule {
        triggers: &["expensive", "cheap"],
        text: "Implement transparent pricing strategy with clear value proposition to address price sensitivity concerns.",
    },
    KeywordRule {
        triggers: &["online", "website"],
        text: "Optimize mobile-first user experience to match participant preferences for digital interactions.",
    },
    KeywordRule {
        triggers: &["trust", "review"],
        text: "Develop comprehensive review and testimonial system to build credibility and social proof.",
    },
];

const EDUCATION_RULE: KeywordRule = KeywordRule {
    triggers: &["confus", "understand"],
    text: "Develop educational content and clear explanations to address knowledge gaps and confusion.",
};

const RECOMMENDATION_FILLERS: [&str; 3] = [
    "Launch targeted pilot program to test key concepts with similar demographic groups.",
    "Implement feedback collection system to continuously improve based on user input.",
    "Develop community-building features to leverage peer influence and recommendations.",
];

pub const NEXT_STEPS: [&str; 4] = [
    "Conduct quantitative survey with larger sample to validate key findings from this qualitative research.",
    "Develop prototype or concept based on identified opportunities and test with similar user groups.",
    "Create user journey maps incorporating insights from different personality types identified in discussion.",
    "Prioritize recommendations based on implementation complexity and potential impact for roadmap planning.",
];

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(default)]
pub struct Demographics {
    pub personality_distribution: BTreeMap<String, usize>,
    pub engagement_diversity: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(default)]
pub struct ParticipantProfile {
    pub name: String,
    pub personality_type: String,
    pub responses: usize,
    pub total_words: usize,
    pub avg_words_per_response: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(default)]
pub struct ParticipantsSection {
    pub count: usize,
    pub description: String,
    pub demographics: Demographics,
    pub selection_criteria: Vec<String>,
    pub participant_names: Vec<String>,
    pub profiles: Vec<ParticipantProfile>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Summary {
    pub metadata: Map<String, Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub objective: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub participants: Option<ParticipantsSection>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key_insights: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub supporting_quotes: Option<Vec<Quote>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub opportunities_recommendations: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_steps: Option<Vec<String>>,
    pub generated_at: String,
}

pub struct SummaryGenerator {
    brain: Arc<dyn GenerationService>,
}

impl SummaryGenerator {
    pub fn new(brain: Arc<dyn GenerationService>) -> Self {
        Self { brain }
    }

    /// Never fails on a service problem; the heuristic report is always
    /// available.
    pub fn generate_summary(&self, transcript: &Transcript) -> Result<Summary> {
        let data = organize(transcript);
        let fallback = heuristic_summary(&data);

        if !self.brain.enabled() {
            debug!("generation disabled, using heuristic summary");
            return Ok(fallback);
        }

        let (system, user) = summary_prompts(&data, transcript);
        match self.brain.generate_structured(&system, &user, Some("six-section summary object")) {
            Ok(doc) => match merge_generated(&doc, &fallback) {
                Some(summary) => {
                    info!(participants = data.participants.len(), "summary generated by service");
                    Ok(summary)
                }
                None => {
                    warn!("generated summary had no usable section, using heuristics");
                    Ok(fallback)
                }
            },
            Err(e) => {
                warn!(error = %e, "summary generation failed, using heuristics");
                Ok(fallback)
            }
        }
    }
}

fn summary_prompts(data: &OrganizedData, transcript: &Transcript) -> (String, String) {
    let system = "You are an insights analyst. Summarize the focus group as a JSON object with keys: \
                  objective (1-2 sentences), participants (object with count, description, demographics, \
                  selection_criteria), key_insights (3-5 strings), supporting_quotes (2-3 objects with \
                  speaker, quote, context), opportunities_recommendations (3-5 strings), next_steps (strings)."
        .to_string();
    let user = format!(
        "Topic: {}\nParticipants: {}\n\nTranscript excerpt (truncated):\n{}\n\nReturn STRICT JSON only.",
        data.topic,
        data.participant_names().join(", "),
        transcript.excerpt(EXCERPT_ENTRIES)
    );
    (system, user)
}

/// Coerces each section of a service document independently. Sections
/// that fail validation are taken from `fallback`. `None` when no section
/// validated at all.
pub fn merge_generated(doc: &Value, fallback: &Summary) -> Option<Summary> {
    let map = doc.as_object()?;

    let objective = map
        .get("objective")
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from);
    let participants = map
        .get("participants")
        .filter(|v| v.is_object())
        .and_then(|v| serde_json::from_value::<ParticipantsSection>(v.clone()).ok());
    let key_insights = map.get("key_insights").and_then(string_list).map(|mut v| {
        v.truncate(5);
        v
    });
    let supporting_quotes = map.get("supporting_quotes").and_then(quote_list);
    let recommendations = map
        .get("opportunities_recommendations")
        .and_then(string_list)
        .map(|mut v| {
            v.truncate(5);
            v
        });
    let next_steps = map.get("next_steps").and_then(string_list);

    let validated = [
        objective.is_some(),
        participants.is_some(),
        key_insights.is_some(),
        supporting_quotes.is_some(),
        recommendations.is_some(),
        next_steps.is_some(),
    ];
    if !validated.iter().any(|v| *v) {
        return None;
    }

    let mut metadata = map
        .get("metadata")
        .and_then(Value::as_object)
        .cloned()
        .unwrap_or_default();
    for (k, v) in &fallback.metadata {
        metadata.entry(k.clone()).or_insert_with(|| v.clone());
    }
    metadata.insert("generation".to_string(), json!("llm"));

    Some(Summary {
        metadata,
        objective: objective.or_else(|| fallback.objective.clone()),
        participants: participants.or_else(|| fallback.participants.clone()),
        key_insights: key_insights.or_else(|| fallback.key_insights.clone()),
        supporting_quotes: supporting_quotes.or_else(|| fallback.supporting_quotes.clone()),
        opportunities_recommendations: recommendations
            .or_else(|| fallback.opportunities_recommendations.clone()),
        next_steps: next_steps.or_else(|| fallback.next_steps.clone()),
        generated_at: Utc::now().to_rfc3339(),
    })
}

/// Non-empty list of strings; other elements are dropped.
pub fn string_list(value: &Value) -> Option<Vec<String>> {
    let items: Vec<String> = value
        .as_array()?
        .iter()
        .filter_map(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect();
    if items.is_empty() {
        None
    } else {
        Some(items)
    }
}

fn quote_list(value: &Value) -> Option<Vec<Quote>> {
    let mut quotes: Vec<Quote> = Vec::new();
    for item in value.as_array()? {
        let (Some(speaker), Some(quote)) = (
            item.get("speaker").and_then(Value::as_str),
            item.get("quote").and_then(Value::as_str),
        ) else {
            continue;
        };
        if quotes.iter().any(|q| q.speaker == speaker) || quotes.len() >= 3 {
            continue;
        }
        quotes.push(Quote {
            speaker: speaker.to_string(),
            quote: quote.to_string(),
            context: item
                .get("context")
                .and_then(Value::as_str)
                .unwrap_or(crate::heuristics::QUOTE_CONTEXT)
                .to_string(),
        });
    }
    if quotes.is_empty() {
        None
    } else {
        Some(quotes)
    }
}

// =========================================================================
// HEURISTIC SECTIONS
// =========================================================================

pub fn heuristic_summary(data: &OrganizedData) -> Summary {
    let mut metadata = metadata(data);
    metadata.insert("generation".to_string(), json!("heuristic"));
    Summary {
        metadata,
        objective: Some(objective(&data.topic, data.participants.len())),
        participants: Some(participants_section(data)),
        key_insights: Some(key_insights(data)),
        supporting_quotes: Some(supporting_quotes(data)),
        opportunities_recommendations: Some(recommendations(data)),
        next_steps: Some(NEXT_STEPS.iter().map(|s| s.to_string()).collect()),
        generated_at: Utc::now().to_rfc3339(),
    }
}

fn metadata(data: &OrganizedData) -> Map<String, Value> {
    let sentiment = tally_sentiment(&data.responses);
    let mut m = Map::new();
    m.insert("total_participants".into(), json!(data.participants.len()));
    m.insert("total_exchanges".into(), json!(data.total_exchanges));
    m.insert("total_questions".into(), json!(data.questions.len()));
    m.insert("total_interactions".into(), json!(data.interactions.len()));
    m.insert("discussion_phases".into(), json!(data.phase_names()));
    m.insert("participant_names".into(), json!(data.participant_names()));
    m.insert("discussion_topic".into(), json!(data.topic));
    m.insert("transcript_length".into(), json!(data.transcript_length));
    m.insert(
        "analysis".into(),
        json!({
            "themes": extract_themes(&data.all_content, 5),
            "dominant_sentiment": sentiment.dominant.as_str(),
            "price_sensitivity": price_sensitivity(&data.responses).as_str(),
            "brand_loyalty": brand_loyalty(&data.responses).as_str(),
            "innovation_openness": innovation_openness(&data.responses).as_str(),
            "engagement_level": engagement_level(data).as_str(),
        }),
    );
    m.insert("summary_schema_version".into(), json!(SCHEMA_VERSION));
    m
}

/// One of three canned sentences chosen by topic keywords.
pub fn objective(topic: &str, participant_count: usize) -> String {
    let lower = topic.to_lowercase();
    if lower.contains("beauty") || lower.contains("cosmetic") {
        format!(
            "To understand consumer perceptions and behaviors regarding {}, identify key decision drivers in beauty purchasing, and uncover barriers to adoption among {} diverse participants.",
            topic, participant_count
        )
    } else if lower.contains("tech") || lower.contains("app") {
        format!(
            "To explore user experiences and preferences related to {}, identify adoption drivers, and understand usage barriers among {} target users.",
            topic, participant_count
        )
    } else {
        format!(
            "To gain deep insights into consumer attitudes and behaviors regarding {}, identify key decision factors, and uncover potential barriers among {} representative participants.",
            topic, participant_count
        )
    }
}

fn participants_section(data: &OrganizedData) -> ParticipantsSection {
    let count = data.participants.len();
    let mut distribution = BTreeMap::new();
    for p in &data.participants {
        *distribution.entry(p.personality_type.clone()).or_insert(0) += 1;
    }

    let mut criteria = Vec::new();
    if distinct_personalities(data) >= 4 {
        criteria.push("Diverse personality types to ensure varied perspectives".to_string());
    }
    if count >= 5 {
        criteria.push("Sufficient group size for dynamic discussions".to_string());
    }
    criteria.push("Representative of target demographic with authentic backgrounds".to_string());

    ParticipantsSection {
        count,
        description: format!("{} participants with diverse backgrounds and perspectives", count),
        demographics: Demographics {
            personality_distribution: distribution,
            engagement_diversity: if count >= 5 { Level::High } else { Level::Medium }.to_string(),
        },
        selection_criteria: criteria,
        participant_names: data.participant_names(),
        profiles: data
            .participants
            .iter()
            .take(5)
            .map(|p| ParticipantProfile {
                name: p.name.clone(),
                personality_type: p.personality_type.clone(),
                responses: p.speaking_count,
                total_words: p.total_words,
                avg_words_per_response: p.avg_words_per_response(),
            })
            .collect(),
    }
}

/// Keyword-gated insights plus up to three theme sentences, padded to at
/// least three and capped at five.
pub fn key_insights(data: &OrganizedData) -> Vec<String> {
    let content = data.content_lower();
    let mut insights = Vec::new();

    if ["price", "budget", "cost"].iter().any(|w| content.contains(w)) {
        insights.push(match price_sensitivity(&data.responses) {
            Level::High => "Price transparency and value demonstration are critical decision factors for this demographic.",
            _ => "Quality and features are prioritized over price considerations by most participants.",
        }
        .to_string());
    }
    insights.extend(fired_rules(&INSIGHT_RULES, &content));
    if distinct_personalities(data) >= 4 {
        insights.push(
            "Diverse personality types require tailored approaches - one-size-fits-all strategies show limited effectiveness."
                .to_string(),
        );
    }
    for theme in extract_themes(&data.all_content, 3) {
        insights.push(format!(
            "Participants consistently discussed {} as a key factor in their decision-making process.",
            theme
        ));
    }

    if insights.len() < 3 {
        insights.extend(INSIGHT_FILLERS.iter().map(|s| s.to_string()));
    }
    insights.truncate(5);
    insights
}

/// Up to three opinionated quotes, at most one per speaker. Falls back to
/// the last two responses when fewer than two qualify.
pub fn supporting_quotes(data: &OrganizedData) -> Vec<Quote> {
    let candidates = data.responses.iter().filter(|r| has_opinion(&r.content));
    let mut quotes = crate::heuristics::select_quotes(candidates, 3, QUOTE_MAX_CHARS);

    if quotes.len() < 2 {
        let tail = data.responses.len().saturating_sub(2);
        for r in &data.responses[tail..] {
            if quotes.len() >= 3 {
                break;
            }
            if quotes.iter().any(|q| q.speaker == r.speaker) {
                continue;
            }
            quotes.push(Quote::new(&r.speaker, &r.content, QUOTE_MAX_CHARS));
        }
    }
    quotes
}

pub fn recommendations(data: &OrganizedData) -> Vec<String> {
    let content = data.content_lower();
    let mut recs = fired_rules(&RECOMMENDATION_RULES, &content);
    if distinct_personalities(data) >= 4 {
        recs.push(
            "Create personalized user journeys tailored to different personality types and preferences."
                .to_string(),
        );
    }
    if EDUCATION_RULE.fires(&content) {
        recs.push(EDUCATION_RULE.text.to_string());
    }
    if recs.len() < 3 {
        recs.extend(RECOMMENDATION_FILLERS.iter().map(|s| s.to_string()));
    }
    recs.truncate(5);
    recs
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::brain::DisabledBrain;
    use crate::error::GenerationError;
    use crate::transcript::{EntryType, TranscriptEntry, MODERATOR, SYSTEM};
    use std::collections::HashSet;

    struct CannedBrain(Value);

    impl GenerationService for CannedBrain {
        fn enabled(&self) -> bool {
            true
        }
        fn generate_text(&self, _: &str, _: &str, _: Option<f32>, _: Option<u32>) -> std::result::Result<String, GenerationError> {
            Ok(self.0.to_string())
        }
        fn generate_structured(&self, _: &str, _: &str, _: Option<&str>) -> std::result::Result<Value, GenerationError> {
            Ok(self.0.clone())
        }
    }

    fn transcript(lines: &[(&str, &str)]) -> Transcript {
        let mut t = Transcript::new();
        t.push(TranscriptEntry::new(EntryType::Setup, SYSTEM, "Focus Group Discussion: skincare routines"));
        t.push(TranscriptEntry::new(EntryType::Question, MODERATOR, "What do you use?"));
        for (speaker, content) in lines {
            t.push(TranscriptEntry::new(EntryType::Response, *speaker, *content));
        }
        t
    }

    #[test]
    fn heuristic_summary_has_all_sections_and_metadata() {
        let t = transcript(&[("Aditi", "I love my serum"), ("Rahul", "The price is too high"), ("Priya", "okay")]);
        let s = SummaryGenerator::new(Arc::new(DisabledBrain)).generate_summary(&t).unwrap();

        assert_eq!(s.participants.as_ref().unwrap().count, 3);
        assert_eq!(s.metadata["summary_schema_version"], "2.0");
        assert_eq!(s.metadata["total_participants"], 3);
        assert_eq!(s.next_steps.as_ref().unwrap().len(), 4);
        let value = serde_json::to_value(&s).unwrap();
        for key in SECTION_KEYS {
            assert!(value.get(key).is_some(), "{key}");
        }
    }

    #[test]
    fn key_insights_are_padded_and_capped() {
        let sparse = organize(&transcript(&[("A", "hmm")]));
        let insights = key_insights(&sparse);
        assert_eq!(insights.len(), 3);

        let rich = organize(&transcript(&[
            ("A", "price price price brand brand brand quality quality quality trust online"),
            ("B", "review of the app and the website, what a cost"),
        ]));
        let insights = key_insights(&rich);
        assert_eq!(insights.len(), 5);
    }

    #[test]
    fn objective_template_follows_topic_keywords() {
        assert!(objective("beauty products", 4).contains("beauty purchasing"));
        assert!(objective("food delivery app", 2).contains("2 target users"));
        assert!(objective("tea", 3).contains("3 representative participants"));
    }

    #[test]
    fn quotes_fall_back_to_last_responses_without_duplicate_speakers() {
        let data = organize(&transcript(&[("A", "first"), ("B", "second"), ("B", "third")]));
        let quotes = supporting_quotes(&data);
        assert_eq!(quotes.len(), 1);
        assert_eq!(quotes[0].quote, "\"second\"");

        let data = organize(&transcript(&[
            ("A", "I think the price is fine"),
            ("B", "no opinion"),
            ("C", "also nothing"),
        ]));
        let quotes = supporting_quotes(&data);
        let speakers: HashSet<_> = quotes.iter().map(|q| q.speaker.clone()).collect();
        assert_eq!(speakers.len(), quotes.len());
        assert_eq!(quotes.len(), 3);
    }

    #[test]
    fn recommendations_fill_to_three() {
        let data = organize(&transcript(&[("A", "too expensive honestly")]));
        let recs = recommendations(&data);
        assert_eq!(recs.len(), 4);
        assert!(recs[0].starts_with("Implement transparent pricing"));
    }

    #[test]
    fn generated_sections_are_coerced_and_gaps_filled() {
        let doc = json!({
            "objective": "Understand routines.",
            "key_insights": ["One", 2, "Two"],
            "supporting_quotes": [{"speaker": "A", "quote": "\"x\""}, {"speaker": "A", "quote": "dup"}],
            "next_steps": "not a list",
            "metadata": {"summary_schema_version": "custom"}
        });
        let t = transcript(&[("Aditi", "I love it")]);
        let s = SummaryGenerator::new(Arc::new(CannedBrain(doc))).generate_summary(&t).unwrap();

        assert_eq!(s.objective.as_deref(), Some("Understand routines."));
        assert_eq!(s.key_insights.unwrap(), vec!["One".to_string(), "Two".to_string()]);
        assert_eq!(s.supporting_quotes.unwrap().len(), 1);
        assert_eq!(s.next_steps.unwrap().len(), 4);
        assert_eq!(s.metadata["summary_schema_version"], "custom");
        assert_eq!(s.metadata["total_participants"], 1);
        assert_eq!(s.metadata["generation"], "llm");
    }

    #[test]
    fn unusable_generated_document_falls_back() {
        let t = transcript(&[("Aditi", "I love it")]);
        let s = SummaryGenerator::new(Arc::new(CannedBrain(json!({"content": "sorry"}))))
            .generate_summary(&t)
            .unwrap();
        assert_eq!(s.metadata["generation"], "heuristic");
    }
}
