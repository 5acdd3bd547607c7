// src/custom_summary.rs
// CUSTOM SUMMARY: one report key per line of a user-written outline.
// Outline lines are routed through a keyword table to section builders.

use crate::analyst::{objective, NEXT_STEPS};
use crate::brain::GenerationService;
use crate::error::Result;
use crate::heuristics::{extract_themes, fired_rules, select_quotes, title_case, KeywordRule, Quote};
use crate::organizer::{organize, OrganizedData};
use crate::participant::Participant;
use crate::transcript::Transcript;
use chrono::Utc;
use once_cell::sync::Lazy;
use rayon::prelude::*;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;
use tracing::{debug, info, warn};

static NUMBERED_LINE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(\d+)\.\s*(.+?)(?:\s*-\s*(.+))?$").expect("outline line pattern"));
static NON_WORD: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^\w]").expect("non-word pattern"));

const QUOTE_MAX_CHARS: usize = 200;
const EXCERPT_ENTRIES: usize = 800;

// =========================================================================
// OUTLINE PARSING
// =========================================================================

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct OutlineSection {
    pub number: String,
    pub title: String,
    pub description: String,
    pub key: String,
    pub original_line: String,
}

/// Lower-cased, spaces to underscores, `&` to "and", every other non-word
/// character removed. Falls back to `section_{number}` when nothing is left.
pub fn section_key(title: &str, number: &str) -> String {
    let key = title.to_lowercase().replace(' ', "_").replace('&', "and");
    let key = NON_WORD.replace_all(&key, "").into_owned();
    match key.as_str() {
        "" => format!("section_{}", number),
        "metadata" => "metadata_section".to_string(),
        _ => key,
    }
}

/// `N. Title [- Description]` lines and `-`/`•` bullets become sections;
/// anything else is ignored.
pub fn parse_outline(outline: &str) -> Vec<OutlineSection> {
    let mut sections = Vec::new();
    for raw in outline.lines() {
        let line = raw.trim();
        if line.is_empty() {
            continue;
        }

        if let Some(caps) = NUMBERED_LINE.captures(line) {
            let number = caps[1].to_string();
            let title = caps[2].trim().to_string();
            let description = caps.get(3).map(|m| m.as_str().trim().to_string()).unwrap_or_default();
            sections.push(OutlineSection {
                key: section_key(&title, &number),
                number,
                title,
                description,
                original_line: line.to_string(),
            });
        } else if let Some(rest) = line.strip_prefix('-').or_else(|| line.strip_prefix('•')) {
            let number = (sections.len() + 1).to_string();
            let title = rest.trim().to_string();
            sections.push(OutlineSection {
                key: section_key(&title, &number),
                number,
                title,
                description: String::new(),
                original_line: line.to_string(),
            });
        }
    }
    sections
}

// =========================================================================
// ROUTING
// =========================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SectionKind {
    Objective,
    Participants,
    Insights,
    Quotes,
    Recommendations,
    NextSteps,
    Behavioral,
    Brand,
    Marketing,
    Pricing,
    General,
}

/// Evaluated top to bottom; the first group with a keyword in the title
/// wins. Descriptions never affect routing. Unmatched sections are `General`.
const ROUTES: [(&[&str], SectionKind); 10] = [
    (&["objective", "purpose", "goal"], SectionKind::Objective),
    (&["participant", "demographic", "sample"], SectionKind::Participants),
    (&["insight", "finding", "theme", "key"], SectionKind::Insights),
    (&["quote", "verbatim", "statement"], SectionKind::Quotes),
    (&["recommend", "opportunity", "suggestion"], SectionKind::Recommendations),
    (&["next", "future", "follow"], SectionKind::NextSteps),
    (&["behavior", "purchase", "decision", "buying"], SectionKind::Behavioral),
    (&["brand", "competitive", "competitor"], SectionKind::Brand),
    (&["marketing", "message", "campaign", "communication"], SectionKind::Marketing),
    (&["price", "cost", "budget", "pricing"], SectionKind::Pricing),
];

pub fn route(section: &OutlineSection) -> SectionKind {
    let title = section.title.to_lowercase();
    ROUTES
        .iter()
        .find(|(words, _)| words.iter().any(|w| title.contains(w)))
        .map(|(_, kind)| *kind)
        .unwrap_or(SectionKind::General)
}

// =========================================================================
// SECTION CONTENT
// =========================================================================

#[derive(Debug, Serialize)]
struct ParticipantDemographics {
    age_range: String,
    locations: Vec<String>,
    personality_distribution: BTreeMap<String, usize>,
}

#[derive(Debug, Serialize)]
struct ProfileSnapshot {
    name: String,
    age: u32,
    occupation: String,
    location: String,
    personality_type: String,
    budget: String,
}

#[derive(Debug, Serialize)]
struct ParticipantContent {
    total_count: usize,
    demographics: ParticipantDemographics,
    selection_criteria: Vec<&'static str>,
    participant_profiles: Vec<ProfileSnapshot>,
}

#[derive(Debug, Serialize)]
struct BrandContent {
    mentioned_brands: Vec<&'static str>,
    brand_preferences: &'static str,
    competitive_insights: &'static str,
    positioning_opportunities: &'static str,
}

#[derive(Debug, Serialize)]
struct PricingContent {
    price_sensitivity: &'static str,
    budget_ranges: Vec<String>,
    value_perception: [&'static str; 3],
    pricing_recommendations: [&'static str; 3],
}

const KNOWN_BRANDS: [&str; 8] = ["Apple", "Google", "Amazon", "Samsung", "Nike", "Adidas", "Zara", "H&M"];

const SELECTION_CRITERIA: [&str; 4] = [
    "Diverse personality types to ensure varied perspectives",
    "Representative age range of target demographic",
    "Geographic diversity across different market segments",
    "Authentic backgrounds with real spending patterns",
];

const INSIGHT_RULES: [KeywordRule; 4] = [
    KeywordRule {
        triggers: &["price", "budget", "cost"],
        text: "Price transparency and value demonstration are critical decision factors for this demographic",
    },
    KeywordRule {
        triggers: &["trust", "review", "experience"],
        text: "Peer recommendations and authentic reviews significantly influence decisions more than traditional advertising",
    },
    KeywordRule {
        triggers: &["online", "app", "website"],
        text: "Digital-first experiences are preferred, with mobile accessibility being a key requirement",
    },
    KeywordRule {
        triggers: &["brand", "quality"],
        text: "Brand reputation and proven quality are essential for building consumer confidence and loyalty",
    },
];

const INSIGHT_FILLERS: [&str; 3] = [
    "Participants demonstrate strong preference for authentic, relatable experiences over polished marketing",
    "Word-of-mouth and social proof play crucial roles in decision-making processes",
    "Convenience and accessibility are increasingly important factors in consumer choices",
];

const RECOMMENDATION_RULES: [KeywordRule; 4] = [
    KeywordRule {
        triggers: &["expensive", "price"],
        text: "Implement transparent pricing strategy with clear value proposition to address price sensitivity concerns",
    },
    KeywordRule {
        triggers: &["online", "website"],
        text: "Optimize mobile-first user experience to match participant preferences for digital interactions",
    },
    KeywordRule {
        triggers: &["trust", "review"],
        text: "Develop comprehensive review and testimonial system to build credibility and social proof",
    },
    KeywordRule {
        triggers: &["confus", "understand"],
        text: "Develop educational content and clear explanations to address knowledge gaps and confusion",
    },
];

const RECOMMENDATION_FILLERS: [&str; 3] = [
    "Launch targeted pilot program to test key concepts with similar demographic groups",
    "Implement feedback collection system to continuously improve based on user input",
    "Develop community-building features to leverage peer influence and recommendations",
];

/// Everything a section builder may read. Shared across rayon workers.
struct SectionInputs<'a> {
    data: &'a OrganizedData,
    participants: &'a [Participant],
    topic: &'a str,
    content_lower: String,
}

fn build_section(section: &OutlineSection, inputs: &SectionInputs<'_>) -> Result<Value> {
    let kind = route(section);
    debug!(key = %section.key, ?kind, "building custom section");
    let value = match kind {
        SectionKind::Objective => json!(objective(inputs.topic, inputs.participants.len())),
        SectionKind::Participants => serde_json::to_value(participant_content(inputs.participants))?,
        SectionKind::Insights => json!(insights(inputs)),
        SectionKind::Quotes => serde_json::to_value(quotes(inputs.data))?,
        SectionKind::Recommendations => json!(recommendations(&inputs.content_lower)),
        SectionKind::NextSteps => json!(NEXT_STEPS.iter().map(|s| s.trim_end_matches('.')).collect::<Vec<_>>()),
        SectionKind::Behavioral => behavioral_content(),
        SectionKind::Brand => serde_json::to_value(brand_content(&inputs.content_lower))?,
        SectionKind::Marketing => marketing_content(),
        SectionKind::Pricing => serde_json::to_value(pricing_content(inputs.participants))?,
        SectionKind::General => json!(format!(
            "Based on the discussion analysis for '{}', participants provided diverse perspectives that highlight the complexity of consumer decision-making in this space. The insights gathered provide valuable direction for strategic planning and implementation.",
            section.title
        )),
    };
    Ok(value)
}

fn or_na(value: &str) -> String {
    if value.trim().is_empty() {
        "N/A".to_string()
    } else {
        value.to_string()
    }
}

fn participant_content(participants: &[Participant]) -> ParticipantContent {
    let ages: Vec<u32> = participants.iter().map(|p| p.age).filter(|a| *a > 0).collect();
    let age_range = match (ages.iter().min(), ages.iter().max()) {
        (Some(lo), Some(hi)) => format!("{}-{} years", lo, hi),
        _ => "Not specified".to_string(),
    };
    let locations: BTreeSet<String> = participants
        .iter()
        .map(|p| if p.location.is_empty() { "Unknown".to_string() } else { p.location.clone() })
        .collect();
    let mut distribution = BTreeMap::new();
    for p in participants {
        *distribution.entry(p.personality_label().to_string()).or_insert(0) += 1;
    }

    ParticipantContent {
        total_count: participants.len(),
        demographics: ParticipantDemographics {
            age_range,
            locations: locations.into_iter().collect(),
            personality_distribution: distribution,
        },
        selection_criteria: SELECTION_CRITERIA.to_vec(),
        participant_profiles: participants
            .iter()
            .take(5)
            .map(|p| ProfileSnapshot {
                name: p.name.clone(),
                age: p.age,
                occupation: or_na(&p.occupation),
                location: or_na(&p.location),
                personality_type: title_case(if p.personality_type.is_empty() {
                    "balanced"
                } else {
                    &p.personality_type
                }),
                budget: or_na(&p.monthly_budget),
            })
            .collect(),
    }
}

fn insights(inputs: &SectionInputs<'_>) -> Vec<String> {
    let mut out = fired_rules(&INSIGHT_RULES, &inputs.content_lower);
    for theme in extract_themes(&inputs.data.all_content, 3) {
        out.push(format!(
            "Participants consistently discussed {} as a key factor in their decision-making process",
            theme
        ));
    }
    if out.len() < 3 {
        out.extend(INSIGHT_FILLERS.iter().map(|s| s.to_string()));
    }
    out.truncate(5);
    out
}

/// Candidates are responses strictly between 50 and 300 characters.
fn quotes(data: &OrganizedData) -> Vec<Quote> {
    let candidates = data.responses.iter().filter(|r| {
        let len = r.content.chars().count();
        len > 50 && len < 300
    });
    select_quotes(candidates, 3, QUOTE_MAX_CHARS)
}

fn recommendations(content_lower: &str) -> Vec<String> {
    let mut out = fired_rules(&RECOMMENDATION_RULES, content_lower);
    if out.len() < 3 {
        out.extend(RECOMMENDATION_FILLERS.iter().map(|s| s.to_string()));
    }
    out.truncate(5);
    out
}

fn behavioral_content() -> Value {
    json!({
        "decision_drivers": [
            "Quality and reliability as primary motivators",
            "Value for money considerations",
            "Social proof and peer recommendations",
            "Brand trust and reputation"
        ],
        "barriers": [
            "Price sensitivity and budget constraints",
            "Trust and credibility concerns",
            "Information overload and confusion",
            "Previous negative experiences"
        ],
        "research_behavior": [
            "Online reviews and peer recommendations highly valued",
            "Social media and influencer content influence research",
            "Traditional advertising has limited impact on this demographic"
        ]
    })
}

fn brand_content(content_lower: &str) -> BrandContent {
    BrandContent {
        mentioned_brands: KNOWN_BRANDS
            .iter()
            .copied()
            .filter(|b| content_lower.contains(&b.to_lowercase()))
            .collect(),
        brand_preferences: "Participants showed preference for established, trusted brands with strong reputation",
        competitive_insights: "Brand loyalty varies by personality type, with some preferring innovation and others stability",
        positioning_opportunities: "Focus on authenticity and value proposition to differentiate from competitors",
    }
}

fn marketing_content() -> Value {
    json!({
        "message_resonance": [
            "Authentic, relatable messaging performs better than polished corporate communication",
            "Value proposition clarity is more important than promotional offers",
            "Personal stories and testimonials create stronger emotional connection"
        ],
        "channel_preferences": [
            "Social media platforms for discovery and research",
            "Peer recommendations through word-of-mouth",
            "Online reviews and comparison sites for validation"
        ],
        "creative_insights": [
            "Visual content should reflect diversity and authenticity",
            "User-generated content more trusted than branded content",
            "Educational content valued over purely promotional material"
        ]
    })
}

fn pricing_content(participants: &[Participant]) -> PricingContent {
    PricingContent {
        price_sensitivity: "High sensitivity to price with strong focus on value for money",
        budget_ranges: participants
            .iter()
            .filter(|p| !p.monthly_budget.is_empty())
            .map(|p| p.monthly_budget.clone())
            .collect(),
        value_perception: [
            "Quality and durability justify higher prices",
            "Transparent pricing builds trust and confidence",
            "Bundled offers and packages show better value perception",
        ],
        pricing_recommendations: [
            "Implement tiered pricing to accommodate different budget levels",
            "Provide clear value comparison against competitors",
            "Consider subscription or payment plan options for higher-priced items",
        ],
    }
}

// =========================================================================
// GENERATOR
// =========================================================================

/// Report keyed by outline section, in outline order, plus `metadata`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(transparent)]
pub struct CustomSummary(Map<String, Value>);

impl CustomSummary {
    pub fn keys(&self) -> Vec<&str> {
        self.0.keys().map(String::as_str).collect()
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn metadata(&self) -> Option<&Map<String, Value>> {
        self.0.get("metadata").and_then(Value::as_object)
    }

    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }
}

pub struct CustomSummaryGenerator {
    brain: Arc<dyn GenerationService>,
}

impl CustomSummaryGenerator {
    pub fn new(brain: Arc<dyn GenerationService>) -> Self {
        Self { brain }
    }

    pub fn generate_custom_summary(
        &self,
        transcript: &Transcript,
        participants: &[Participant],
        outline: &str,
        topic: &str,
    ) -> Result<CustomSummary> {
        let sections = parse_outline(outline);
        let metadata = metadata(outline, participants.len(), topic);

        if self.brain.enabled() && !sections.is_empty() {
            if let Some(summary) = self.try_generate(transcript, participants, &sections, topic, &metadata) {
                return Ok(summary);
            }
        }

        let mut data = organize(transcript);
        data.topic = topic.to_string();
        let inputs = SectionInputs {
            content_lower: data.content_lower(),
            data: &data,
            participants,
            topic,
        };

        let built: Vec<(String, Value)> = sections
            .par_iter()
            .map(|s| build_section(s, &inputs).map(|v| (s.key.clone(), v)))
            .collect::<Result<Vec<_>>>()?;

        let mut map = Map::new();
        map.insert("metadata".to_string(), Value::Object(metadata));
        for (key, value) in built {
            map.insert(key, value);
        }
        info!(sections = sections.len(), "custom summary assembled from heuristics");
        Ok(CustomSummary(map))
    }

    fn try_generate(
        &self,
        transcript: &Transcript,
        participants: &[Participant],
        sections: &[OutlineSection],
        topic: &str,
        metadata: &Map<String, Value>,
    ) -> Option<CustomSummary> {
        let system = "You are an insights analyst. Given a transcript, personas, and a user-defined outline, \
                      produce a JSON object whose keys are derived from the outline entries (underscored).";
        let outline_lines = sections
            .iter()
            .map(|s| s.original_line.as_str())
            .collect::<Vec<_>>()
            .join("\n");
        let user = format!(
            "Outline lines (keep order):\n{}\n\nPersonas count: {}\nTopic: {}\n\nTranscript excerpt (truncated):\n{}\n\nReturn STRICT JSON only.",
            outline_lines,
            participants.len(),
            topic,
            transcript.excerpt(EXCERPT_ENTRIES)
        );

        let doc = match self.brain.generate_structured(system, &user, Some("arbitrary keyed object")) {
            Ok(doc) => doc,
            Err(e) => {
                warn!(error = %e, "custom summary generation failed, using heuristics");
                return None;
            }
        };
        let Value::Object(mut map) = doc else {
            warn!("custom summary response was not an object, using heuristics");
            return None;
        };
        if map.is_empty() {
            return None;
        }

        match map.get_mut("metadata") {
            Some(Value::Object(existing)) => {
                for (k, v) in metadata {
                    existing.entry(k.clone()).or_insert_with(|| v.clone());
                }
            }
            Some(_) => {}
            None => {
                map.insert("metadata".to_string(), Value::Object(metadata.clone()));
            }
        }
        info!(keys = map.len(), "custom summary generated by service");
        Some(CustomSummary(map))
    }
}

fn metadata(outline: &str, participant_count: usize, topic: &str) -> Map<String, Value> {
    let mut m = Map::new();
    m.insert("summary_type".into(), json!("custom"));
    m.insert("user_schema".into(), json!(outline));
    m.insert("generated_at".into(), json!(Utc::now().to_rfc3339()));
    m.insert("total_participants".into(), json!(participant_count));
    m.insert("discussion_topic".into(), json!(topic));
    m
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::brain::DisabledBrain;
    use crate::error::GenerationError;
    use crate::transcript::{EntryType, TranscriptEntry, MODERATOR, SYSTEM};

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

    fn roster() -> Vec<Participant> {
        let mut aditi = Participant::named("Aditi");
        aditi.age = 24;
        aditi.location = "Mumbai".into();
        aditi.personality_type = "enthusiastic".into();
        aditi.monthly_budget = "₹3,000".into();
        let mut rahul = Participant::named("Rahul");
        rahul.age = 31;
        rahul.location = "Pune".into();
        rahul.personality_type = "budget_conscious".into();
        vec![aditi, rahul]
    }

    fn transcript() -> Transcript {
        vec![
            TranscriptEntry::new(EntryType::Setup, SYSTEM, "Focus Group Discussion: skincare routines"),
            TranscriptEntry::new(EntryType::Question, MODERATOR, "What do you buy?"),
            TranscriptEntry::new(
                EntryType::Response,
                "Aditi",
                "I love the Nike store experience and I tried their new range of products last week.",
            ),
            TranscriptEntry::new(EntryType::Response, "Rahul", "Too short."),
        ]
        .into()
    }

    #[test]
    fn numbered_lines_split_title_and_description() {
        let sections = parse_outline("1. Key Insights\n2. Budget Analysis - spending patterns\nnoise line");
        assert_eq!(sections.len(), 2);
        assert_eq!(sections[0].key, "key_insights");
        assert_eq!(sections[1].title, "Budget Analysis");
        assert_eq!(sections[1].description, "spending patterns");
        assert_eq!(sections[1].key, "budget_analysis");
    }

    #[test]
    fn bullets_are_numbered_by_position() {
        let sections = parse_outline("- Pricing & Value!\n• Brand Landscape");
        assert_eq!(sections[0].number, "1");
        assert_eq!(sections[0].key, "pricing_and_value");
        assert_eq!(sections[1].number, "2");
        assert_eq!(sections[1].key, "brand_landscape");
    }

    #[test]
    fn keys_are_deterministic_and_clean() {
        let line = "3. What's Next? (Q3 / Q4)";
        let a = parse_outline(line);
        let b = parse_outline(line);
        assert_eq!(a[0].key, b[0].key);
        assert!(a[0].key.chars().all(|c| c.is_alphanumeric() || c == '_'));
        assert_eq!(section_key("!!!", "7"), "section_7");
        assert_eq!(section_key("Metadata", "1"), "metadata_section");
    }

    #[test]
    fn routing_is_first_match_wins() {
        let kinds: Vec<SectionKind> = parse_outline(
            "1. Research Goal\n2. Key Insights\n3. Budget Analysis\n4. Brand Landscape\n5. Misc\n6. Follow-up Plans",
        )
        .iter()
        .map(route)
        .collect();
        assert_eq!(
            kinds,
            vec![
                SectionKind::Objective,
                SectionKind::Insights,
                SectionKind::Pricing,
                SectionKind::Brand,
                SectionKind::General,
                SectionKind::NextSteps,
            ]
        );
    }

    #[test]
    fn description_keywords_do_not_change_the_route() {
        let sections = parse_outline("1. Overview - next steps for the team\n2. Spending - brand and price");
        assert_eq!(sections[0].description, "next steps for the team");
        assert_eq!(route(&sections[0]), SectionKind::General);
        assert_eq!(route(&sections[1]), SectionKind::General);
    }

    #[test]
    fn fallback_summary_has_exactly_outline_keys_plus_metadata() {
        let generator = CustomSummaryGenerator::new(Arc::new(DisabledBrain));
        let summary = generator
            .generate_custom_summary(
                &transcript(),
                &roster(),
                "1. Key Insights\n2. Budget Analysis - spending patterns",
                "skincare routines",
            )
            .unwrap();
        assert_eq!(summary.keys(), vec!["metadata", "key_insights", "budget_analysis"]);
        assert_eq!(summary.metadata().unwrap()["summary_type"], "custom");
        assert_eq!(summary.get("budget_analysis").unwrap()["budget_ranges"], json!(["₹3,000"]));
    }

    #[test]
    fn participant_and_brand_sections_read_roster_and_content() {
        let generator = CustomSummaryGenerator::new(Arc::new(DisabledBrain));
        let summary = generator
            .generate_custom_summary(&transcript(), &roster(), "1. Participants\n2. Competitor Brands", "skincare")
            .unwrap();
        let p = summary.get("participants").unwrap();
        assert_eq!(p["total_count"], 2);
        assert_eq!(p["demographics"]["age_range"], "24-31 years");
        assert_eq!(p["participant_profiles"][1]["personality_type"], "Budget Conscious");
        assert_eq!(summary.get("competitor_brands").unwrap()["mentioned_brands"], json!(["Nike"]));
    }

    #[test]
    fn quotes_only_use_mid_length_responses() {
        let generator = CustomSummaryGenerator::new(Arc::new(DisabledBrain));
        let summary = generator
            .generate_custom_summary(&transcript(), &roster(), "1. Verbatim Quotes", "skincare")
            .unwrap();
        let quotes = summary.get("verbatim_quotes").unwrap().as_array().unwrap();
        assert_eq!(quotes.len(), 1);
        assert_eq!(quotes[0]["speaker"], "Aditi");
    }

    #[test]
    fn generated_document_keeps_its_keys_and_gains_metadata() {
        let brain = CannedBrain(json!({"key_insights": ["one"], "metadata": {"summary_type": "llm"}}));
        let summary = CustomSummaryGenerator::new(Arc::new(brain))
            .generate_custom_summary(&transcript(), &roster(), "1. Key Insights", "skincare")
            .unwrap();
        let meta = summary.metadata().unwrap();
        assert_eq!(meta["summary_type"], "llm");
        assert_eq!(meta["total_participants"], 2);
        assert_eq!(summary.get("key_insights").unwrap(), &json!(["one"]));
    }

    #[test]
    fn empty_generated_document_falls_back() {
        let summary = CustomSummaryGenerator::new(Arc::new(CannedBrain(json!({}))))
            .generate_custom_summary(&transcript(), &roster(), "1. Key Insights", "skincare")
            .unwrap();
        assert_eq!(summary.keys(), vec!["metadata", "key_insights"]);
        // one keyword rule fires, then the three fillers
        assert_eq!(summary.get("key_insights").unwrap().as_array().unwrap().len(), 4);
    }
}
