// src/heuristics.rs
// Keyword scorers shared by the summary, custom summary and Q&A paths.
// Everything here is a pure function over strings or response records.

use crate::organizer::{OrganizedData, ResponseRecord};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

pub const THEME_VOCABULARY: [&str; 11] = [
    "price", "quality", "brand", "experience", "value", "service", "product", "online", "trust",
    "recommend", "store",
];

const EMOTIONAL_WORDS: [&str; 8] = [
    "love", "hate", "amazing", "terrible", "perfect", "awful", "excited", "disappointed",
];
const DETAIL_INDICATORS: [&str; 6] = ["₹", "rupees", "cost", "price", "brand", "product"];
const PERSONAL_PHRASES: [&str; 5] = ["my experience", "i found", "i tried", "i bought", "i use"];
const OPINION_INDICATORS: [&str; 12] = [
    "i love", "i hate", "i wish", "i need", "i want", "i think", "i believe", "my experience",
    "i found", "i noticed", "i prefer", "i avoid",
];

const POSITIVE_WORDS: [&str; 6] = ["love", "great", "amazing", "excellent", "perfect", "wonderful"];
const NEGATIVE_WORDS: [&str; 6] = ["hate", "terrible", "awful", "worst", "horrible", "disappointing"];
const NEUTRAL_WORDS: [&str; 5] = ["okay", "fine", "decent", "average", "normal"];

const INNOVATION_WORDS: [&str; 5] = ["new", "innovative", "latest", "modern", "advanced"];

pub const QUOTE_CONTEXT: &str = "During focus group discussion";

fn contains_any(haystack: &str, needles: &[&str]) -> bool {
    needles.iter().any(|n| haystack.contains(n))
}

fn count_present(haystack: &str, needles: &[&str]) -> usize {
    needles.iter().filter(|n| haystack.contains(*n)).count()
}

// =========================================================================
// THEMES
// =========================================================================

/// Vocabulary words mentioned more than twice, most frequent first.
/// Equal counts keep vocabulary order.
pub fn extract_themes(content: &str, limit: usize) -> Vec<String> {
    let lower = content.to_lowercase();
    let mut counts: HashMap<&str, usize> = HashMap::new();
    for word in lower.split_whitespace() {
        *counts.entry(word).or_insert(0) += 1;
    }
    let mut themes: Vec<(&str, usize)> = THEME_VOCABULARY
        .iter()
        .map(|w| (*w, counts.get(w).copied().unwrap_or(0)))
        .filter(|(_, c)| *c > 2)
        .collect();
    themes.sort_by(|a, b| b.1.cmp(&a.1));
    themes.into_iter().take(limit).map(|(w, _)| w.to_string()).collect()
}

// =========================================================================
// QUOTES
// =========================================================================

pub fn quote_impact(content: &str) -> i32 {
    let lower = content.to_lowercase();
    let mut score = 2 * count_present(&lower, &EMOTIONAL_WORDS) as i32;
    if contains_any(&lower, &DETAIL_INDICATORS) {
        score += 3;
    }
    score += 2 * count_present(&lower, &PERSONAL_PHRASES) as i32;

    let len = content.chars().count();
    if (50..=200).contains(&len) {
        score += 2;
    } else if len > 200 {
        score -= 1;
    }
    score
}

pub fn has_opinion(content: &str) -> bool {
    contains_any(&content.to_lowercase(), &OPINION_INDICATORS)
}

/// Keeps at most `max_chars` characters, ending in "..." when cut.
pub fn truncate_chars(content: &str, max_chars: usize) -> String {
    if content.chars().count() <= max_chars {
        return content.to_string();
    }
    let kept: String = content.chars().take(max_chars.saturating_sub(3)).collect();
    format!("{}...", kept)
}

/// `budget_conscious` -> `Budget Conscious`.
pub fn title_case(raw: &str) -> String {
    raw.split(|c: char| c == '_' || c.is_whitespace())
        .filter(|w| !w.is_empty())
        .map(|w| {
            let mut chars = w.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<String>>()
        .join(" ")
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Quote {
    pub speaker: String,
    pub quote: String,
    pub context: String,
}

impl Quote {
    pub fn new(speaker: &str, content: &str, max_chars: usize) -> Self {
        Self {
            speaker: speaker.to_string(),
            quote: format!("\"{}\"", truncate_chars(content, max_chars)),
            context: QUOTE_CONTEXT.to_string(),
        }
    }
}

/// Ranks candidates by impact (stable, so ties keep transcript order) and
/// takes at most one per speaker until `cap` is reached.
pub fn select_quotes<'a>(
    candidates: impl IntoIterator<Item = &'a ResponseRecord>,
    cap: usize,
    max_chars: usize,
) -> Vec<Quote> {
    let mut ranked: Vec<(&ResponseRecord, i32)> = candidates
        .into_iter()
        .map(|r| (r, quote_impact(&r.content)))
        .collect();
    ranked.sort_by(|a, b| b.1.cmp(&a.1));

    let mut quotes: Vec<Quote> = Vec::new();
    for (record, _) in ranked {
        if quotes.len() >= cap {
            break;
        }
        if quotes.iter().any(|q| q.speaker == record.speaker) {
            continue;
        }
        quotes.push(Quote::new(&record.speaker, &record.content, max_chars));
    }
    quotes
}

// =========================================================================
// SENTIMENT
// =========================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sentiment {
    Positive,
    Negative,
    Neutral,
}

impl Sentiment {
    pub fn as_str(&self) -> &'static str {
        match self {
            Sentiment::Positive => "positive",
            Sentiment::Negative => "negative",
            Sentiment::Neutral => "neutral",
        }
    }
}

impl fmt::Display for Sentiment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The list with the strictly highest count wins; anything else is neutral.
pub fn classify_sentiment(content: &str) -> Sentiment {
    let lower = content.to_lowercase();
    let pos = count_present(&lower, &POSITIVE_WORDS);
    let neg = count_present(&lower, &NEGATIVE_WORDS);
    let neu = count_present(&lower, &NEUTRAL_WORDS);
    if pos > neg && pos > neu {
        Sentiment::Positive
    } else if neg > pos && neg > neu {
        Sentiment::Negative
    } else {
        Sentiment::Neutral
    }
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct SentimentTally {
    pub positive: usize,
    pub negative: usize,
    pub neutral: usize,
    pub dominant: Sentiment,
    /// Most frequent label per speaker, first-seen label on ties.
    pub by_participant: Vec<(String, Sentiment)>,
}

pub fn tally_sentiment(responses: &[ResponseRecord]) -> SentimentTally {
    let (mut positive, mut negative, mut neutral) = (0, 0, 0);
    let mut per_speaker: Vec<(String, Vec<Sentiment>)> = Vec::new();

    for r in responses {
        let s = classify_sentiment(&r.content);
        match s {
            Sentiment::Positive => positive += 1,
            Sentiment::Negative => negative += 1,
            Sentiment::Neutral => neutral += 1,
        }
        match per_speaker.iter_mut().find(|(name, _)| *name == r.speaker) {
            Some((_, labels)) => labels.push(s),
            None => per_speaker.push((r.speaker.clone(), vec![s])),
        }
    }

    let dominant = [
        (Sentiment::Positive, positive),
        (Sentiment::Negative, negative),
        (Sentiment::Neutral, neutral),
    ]
    .into_iter()
    .fold((Sentiment::Positive, 0usize), |best, cur| if cur.1 > best.1 { cur } else { best })
    .0;

    let by_participant = per_speaker
        .into_iter()
        .map(|(name, labels)| (name, most_common(&labels)))
        .collect();

    SentimentTally {
        positive,
        negative,
        neutral,
        dominant,
        by_participant,
    }
}

fn most_common(labels: &[Sentiment]) -> Sentiment {
    let mut best = (Sentiment::Neutral, 0usize);
    for (i, s) in labels.iter().enumerate() {
        if labels[..i].contains(s) {
            continue;
        }
        let n = labels.iter().filter(|x| *x == s).count();
        if n > best.1 {
            best = (*s, n);
        }
    }
    best.0
}

// =========================================================================
// PATTERN FLAGS
// =========================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Level {
    High,
    Medium,
    Low,
}

impl Level {
    pub fn as_str(&self) -> &'static str {
        match self {
            Level::High => "High",
            Level::Medium => "Medium",
            Level::Low => "Low",
        }
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

fn share_mentioning(responses: &[ResponseRecord], words: &[&str]) -> f64 {
    let hits = responses
        .iter()
        .filter(|r| contains_any(&r.content.to_lowercase(), words))
        .count();
    hits as f64 / responses.len().max(1) as f64
}

/// High when more than 30% of responses mention price or cost.
pub fn price_sensitivity(responses: &[ResponseRecord]) -> Level {
    if !responses.is_empty() && share_mentioning(responses, &["price", "cost"]) > 0.3 {
        Level::High
    } else {
        Level::Medium
    }
}

pub fn brand_loyalty(responses: &[ResponseRecord]) -> Level {
    if !responses.is_empty() && share_mentioning(responses, &["brand"]) > 0.2 {
        Level::Medium
    } else {
        Level::Low
    }
}

pub fn innovation_openness(responses: &[ResponseRecord]) -> Level {
    if !responses.is_empty() && share_mentioning(responses, &INNOVATION_WORDS) > 0.2 {
        Level::High
    } else {
        Level::Medium
    }
}

/// Average responses per participant: above 8 is high, above 5 medium.
pub fn engagement_level(data: &OrganizedData) -> Level {
    let people = data.participants.len();
    let avg = if people == 0 {
        0.0
    } else {
        data.total_exchanges as f64 / people as f64
    };
    if avg > 8.0 {
        Level::High
    } else if avg > 5.0 {
        Level::Medium
    } else {
        Level::Low
    }
}

pub fn distinct_personalities(data: &OrganizedData) -> usize {
    let mut seen: Vec<&str> = Vec::new();
    for p in &data.participants {
        if !seen.contains(&p.personality_type.as_str()) {
            seen.push(&p.personality_type);
        }
    }
    seen.len()
}

/// One rule of a canned-text table: fires when any trigger appears in the
/// lower-cased aggregate content.
pub struct KeywordRule {
    pub triggers: &'static [&'static str],
    pub text: &'static str,
}

impl KeywordRule {
    pub fn fires(&self, content_lower: &str) -> bool {
        contains_any(content_lower, self.triggers)
    }
}

/// Texts of every rule that fires, in table order.
pub fn fired_rules(rules: &[KeywordRule], content_lower: &str) -> Vec<String> {
    rules
        .iter()
        .filter(|r| r.fires(content_lower))
        .map(|r| r.text.to_string())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn response(speaker: &str, content: &str) -> ResponseRecord {
        ResponseRecord {
            speaker: speaker.to_string(),
            content: content.to_string(),
            phase: None,
            word_count: content.split_whitespace().count(),
            timestamp: String::new(),
            question: None,
        }
    }

    #[test]
    fn themes_need_more_than_two_mentions_and_sort_by_frequency() {
        let text = "price price price brand brand brand brand quality quality trust";
        assert_eq!(extract_themes(text, 5), vec!["brand", "price"]);
        assert!(extract_themes("", 5).is_empty());
    }

    #[test]
    fn quote_impact_is_monotonic_in_emotion_and_length() {
        let base = "The serum I picked up last month was fine for daily use";
        let with_emotion = format!("{} and I love it", base);
        assert!(quote_impact(&with_emotion) >= quote_impact(base));

        let sixty: String = "abcdefghij".repeat(6);
        let ten: String = sixty.chars().take(10).collect();
        assert!(quote_impact(&sixty) >= quote_impact(&ten));
    }

    #[test]
    fn quote_impact_scores_each_component() {
        assert_eq!(quote_impact("short"), 0);
        assert_eq!(quote_impact("love"), 2);
        assert_eq!(quote_impact("price"), 3);
        assert_eq!(quote_impact("I tried it"), 2);
        assert_eq!(quote_impact(&"x".repeat(201)), -1);
    }

    #[test]
    fn truncation_is_character_based() {
        let long = "₹".repeat(160);
        let cut = truncate_chars(&long, 150);
        assert_eq!(cut.chars().count(), 150);
        assert!(cut.ends_with("..."));
        assert_eq!(truncate_chars("short", 150), "short");
    }

    #[test]
    fn title_case_splits_on_underscores() {
        assert_eq!(title_case("budget_conscious"), "Budget Conscious");
        assert_eq!(title_case("ANALYTICAL"), "Analytical");
        assert_eq!(title_case(""), "");
    }

    #[test]
    fn select_quotes_dedupes_speakers_and_caps() {
        let rs = vec![
            response("A", "I love this brand, the price is perfect for me honestly and I tried it."),
            response("A", "I hate everything about it, it is awful and terrible and disappointing."),
            response("B", "ok"),
            response("C", "I found it at the store for 300 rupees which felt fair enough."),
            response("D", "meh"),
        ];
        let quotes = select_quotes(&rs, 3, 150);
        let speakers: Vec<_> = quotes.iter().map(|q| q.speaker.as_str()).collect();
        assert_eq!(speakers.len(), 3);
        assert_eq!(speakers[0], "A");
        assert!(speakers.contains(&"C"));
        assert!(quotes[0].quote.starts_with('"') && quotes[0].quote.ends_with('"'));
    }

    #[test]
    fn sentiment_ties_resolve_to_neutral() {
        assert_eq!(classify_sentiment("I love it, amazing"), Sentiment::Positive);
        assert_eq!(classify_sentiment("terrible"), Sentiment::Negative);
        assert_eq!(classify_sentiment("love but terrible"), Sentiment::Neutral);
        assert_eq!(classify_sentiment("nothing here"), Sentiment::Neutral);
    }

    #[test]
    fn dominant_sentiment_prefers_first_maximum() {
        let rs = vec![response("A", "love it"), response("B", "hate it")];
        let tally = tally_sentiment(&rs);
        assert_eq!((tally.positive, tally.negative, tally.neutral), (1, 1, 0));
        assert_eq!(tally.dominant, Sentiment::Positive);
        assert_eq!(tally.by_participant[1], ("B".to_string(), Sentiment::Negative));
    }

    #[test]
    fn price_sensitivity_threshold_is_thirty_percent() {
        let mut rs = vec![response("A", "the price!"), response("B", "x"), response("C", "y")];
        assert_eq!(price_sensitivity(&rs), Level::High);
        rs.push(response("D", "z"));
        assert_eq!(price_sensitivity(&rs), Level::Medium);
        assert_eq!(price_sensitivity(&[]), Level::Medium);
    }

    #[test]
    fn rule_table_keeps_order() {
        const RULES: [KeywordRule; 2] = [
            KeywordRule { triggers: &["price"], text: "first" },
            KeywordRule { triggers: &["brand"], text: "second" },
        ];
        assert_eq!(fired_rules(&RULES, "brand and price"), vec!["first", "second"]);
        assert!(fired_rules(&RULES, "nothing").is_empty());
    }
}
