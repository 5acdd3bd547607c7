// src/persona_generator.rs
// PERSONA SYNTHESIS
// Generation-first persona roster with a template-driven fallback.

use crate::brain::GenerationService;
use crate::error::{FocusGroupError, Result};
use crate::participant::Participant;
use chrono::Utc;
use rand::seq::SliceRandom;
use rand::Rng;
use serde::Serialize;
use serde_json::Value;
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{info, warn};

const NAME_POOL: [&str; 24] = [
    "Aditi", "Rahul", "Priya", "Arjun", "Sneha", "Vikram", "Meera", "Rohan", "Zoya", "Karan",
    "Neha", "Aarav", "Kavya", "Ishaan", "Riya", "Aryan", "Ananya", "Sidharth", "Pooja", "Harsh",
    "Tara", "Dev", "Naina", "Yash",
];

const OCCUPATIONS: [&[&str]; 5] = [
    &["College Student", "University Student", "Graduate Student", "MBA Student"],
    &["Software Developer", "Data Analyst", "UX Designer", "Product Manager"],
    &["Graphic Designer", "Content Creator", "Marketing Executive", "Social Media Manager"],
    &["Teacher", "Nurse", "Accountant", "HR Executive", "Sales Executive"],
    &["Retail Associate", "Customer Service Rep", "Restaurant Manager", "Freelancer"],
];

const LOCATIONS: [&[&str]; 3] = [
    &["Mumbai", "Delhi", "Bangalore", "Chennai", "Kolkata", "Hyderabad"],
    &["Pune", "Jaipur", "Ahmedabad", "Kochi", "Indore", "Bhopal"],
    &["Nagpur", "Vadodara", "Coimbatore", "Madurai", "Chandigarh"],
];

const PERSONALITIES: [(&str, &[&str]); 6] = [
    ("enthusiastic", &["energetic", "talkative", "optimistic", "social", "expressive"]),
    ("analytical", &["logical", "questioning", "detail-oriented", "practical", "skeptical"]),
    ("trendy", &["fashion-forward", "social-media-savvy", "influencer-following", "brand-conscious"]),
    ("cautious", &["risk-averse", "traditional", "careful", "budget-conscious", "research-oriented"]),
    ("expert", &["knowledgeable", "experienced", "confident", "industry-insider", "influential"]),
    ("budget-focused", &["price-sensitive", "deal-hunter", "value-conscious", "comparison-shopper"]),
];

/// (income range, monthly budget for the topic)
const INCOME_BRACKETS: [(&str, &str); 5] = [
    ("₹15,000-25,000", "₹500-1,500"),
    ("₹25,000-40,000", "₹1,500-3,000"),
    ("₹40,000-70,000", "₹3,000-6,000"),
    ("₹70,000-1,50,000", "₹6,000-15,000"),
    ("₹1,50,000+", "₹15,000+"),
];

const PERSONA_SYSTEM_PROMPT: &str = "You are generating realistic participant personas for a focus group. \
Return a JSON object {\"personas\": [...]} where each persona has keys: name, age, occupation, location, \
income_range, monthly_budget, personality_type, traits (string[]), background.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Demographic {
    GenZ,
    Millennial,
    GenX,
}

impl Demographic {
    fn ages(&self) -> std::ops::RangeInclusive<u32> {
        match self {
            Demographic::GenZ => 18..=25,
            Demographic::Millennial => 26..=35,
            Demographic::GenX => 36..=45,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TopicAffinity {
    Beauty,
    Tech,
    Food,
    General,
}

#[derive(Debug, Clone, Copy)]
struct ContextAnalysis {
    demographic: Demographic,
    affinity: TopicAffinity,
}

fn analyze_context(context_prompt: &str, topic: &str) -> ContextAnalysis {
    let context = context_prompt.to_lowercase();
    let topic = topic.to_lowercase();
    let any_of = |text: &str, terms: &[&str]| terms.iter().any(|t| text.contains(t));

    let demographic = if any_of(&context, &["gen z", "generation z", "young adult", "18-25"]) {
        Demographic::GenZ
    } else if any_of(&context, &["millennial", "25-35", "young professional"]) {
        Demographic::Millennial
    } else if any_of(&context, &["gen x", "35-45", "experienced"]) {
        Demographic::GenX
    } else {
        Demographic::GenZ
    };

    let affinity = if any_of(&topic, &["beauty", "cosmetics", "skincare", "makeup"]) {
        TopicAffinity::Beauty
    } else if any_of(&topic, &["tech", "technology", "app", "software"]) {
        TopicAffinity::Tech
    } else if any_of(&topic, &["food", "restaurant", "dining"]) {
        TopicAffinity::Food
    } else {
        TopicAffinity::General
    };

    ContextAnalysis { demographic, affinity }
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct PersonaValidation {
    pub total_personas: usize,
    pub age_diversity: usize,
    pub occupation_diversity: usize,
    pub personality_diversity: usize,
    pub location_diversity: usize,
    pub income_diversity: usize,
    pub issues: Vec<String>,
    pub is_valid: bool,
}

pub struct PersonaGenerator {
    brain: Arc<dyn GenerationService>,
}

impl PersonaGenerator {
    pub fn new(brain: Arc<dyn GenerationService>) -> Self {
        Self { brain }
    }

    pub fn generate_personas<R: Rng>(
        &self,
        context_prompt: &str,
        topic: &str,
        count: usize,
        rng: &mut R,
    ) -> Result<Vec<Participant>> {
        if count == 0 {
            return Err(FocusGroupError::InvalidInput(
                "persona count must be at least 1".to_string(),
            ));
        }

        if self.brain.enabled() {
            match self.from_service(context_prompt, topic, count) {
                Ok(personas) if !personas.is_empty() => {
                    info!(count = personas.len(), "personas generated by service");
                    return Ok(personas);
                }
                Ok(_) => warn!("service returned no usable personas, using templates"),
                Err(e) => warn!(error = %e, "persona generation failed, using templates"),
            }
        }

        Ok(template_personas(context_prompt, topic, count, rng))
    }

    fn from_service(&self, context_prompt: &str, topic: &str, count: usize) -> Result<Vec<Participant>> {
        let user_prompt = format!(
            "Context prompt: {}\nTopic: {}\nCount: {}\n\
             Ensure diversity in age, occupation, location, income and personality_type.",
            context_prompt, topic, count
        );
        let doc = self
            .brain
            .generate_structured(PERSONA_SYSTEM_PROMPT, &user_prompt, Some("{personas: Persona[]}"))?;
        Ok(coerce_personas(&doc, count))
    }
}

/// Accepts `{"personas": [...]}` or a bare array. Entries that are not
/// objects are dropped; duplicate names get a positional suffix.
pub fn coerce_personas(doc: &Value, limit: usize) -> Vec<Participant> {
    let items = match doc {
        Value::Array(items) => items.as_slice(),
        Value::Object(map) => match map.get("personas") {
            Some(Value::Array(items)) => items.as_slice(),
            _ => &[],
        },
        _ => &[],
    };

    let mut used = HashSet::new();
    let mut out: Vec<Participant> = Vec::new();
    for item in items.iter().filter(|i| i.is_object()) {
        if out.len() >= limit {
            break;
        }
        let mut name = item["name"]
            .as_str()
            .map(str::trim)
            .filter(|n| !n.is_empty())
            .map(String::from)
            .unwrap_or_else(|| format!("Person_{}", out.len() + 1));
        if used.contains(&name) {
            let base = name.clone();
            let mut suffix = out.len() + 1;
            while used.contains(&name) {
                name = format!("{}_{}", base, suffix);
                suffix += 1;
            }
        }
        used.insert(name.clone());

        let age = item["age"]
            .as_u64()
            .or_else(|| item["age"].as_str().and_then(|s| s.trim().parse().ok()))
            .and_then(|a| u32::try_from(a).ok())
            .unwrap_or(25);
        let text = |key: &str| match &item[key] {
            Value::String(s) => s.clone(),
            Value::Number(n) => n.to_string(),
            _ => String::new(),
        };
        let traits = item["traits"]
            .as_array()
            .map(|a| a.iter().filter_map(|t| t.as_str().map(String::from)).collect())
            .unwrap_or_default();

        out.push(Participant {
            name,
            age,
            occupation: text("occupation"),
            location: text("location"),
            income_range: text("income_range"),
            monthly_budget: text("monthly_budget"),
            personality_type: text("personality_type"),
            traits,
            background: text("background"),
            created_at: Some(Utc::now().to_rfc3339()),
        });
    }
    out
}

pub fn template_personas<R: Rng>(
    context_prompt: &str,
    topic: &str,
    count: usize,
    rng: &mut R,
) -> Vec<Participant> {
    let analysis = analyze_context(context_prompt, topic);
    let mut used: HashSet<String> = HashSet::new();
    let mut personas = Vec::with_capacity(count);
    for _ in 0..count {
        let persona = template_persona(analysis, &used, rng);
        used.insert(persona.name.clone());
        personas.push(persona);
    }
    personas
}

fn template_persona<R: Rng>(
    analysis: ContextAnalysis,
    used: &HashSet<String>,
    rng: &mut R,
) -> Participant {
    let available: Vec<&str> = NAME_POOL.iter().copied().filter(|n| !used.contains(*n)).collect();
    let name = available
        .choose(rng)
        .map(|n| n.to_string())
        .unwrap_or_else(|| format!("Person_{}", used.len() + 1));

    let age = rng.gen_range(analysis.demographic.ages());
    let category = OCCUPATIONS.choose(rng).copied().unwrap_or(&[]);
    let occupation = pick(rng, category, "Freelancer");
    let tier = LOCATIONS.choose(rng).copied().unwrap_or(&[]);
    let location = pick(rng, tier, "Mumbai");
    let (income_range, monthly_budget) = INCOME_BRACKETS
        .choose(rng)
        .copied()
        .unwrap_or(INCOME_BRACKETS[2]);
    let (personality, traits) = PERSONALITIES.choose(rng).copied().unwrap_or(PERSONALITIES[0]);

    let background = compose_background(
        &name,
        age,
        &occupation,
        &location,
        income_range,
        monthly_budget,
        personality,
        analysis.affinity,
    );

    Participant {
        name,
        age,
        occupation,
        location,
        income_range: income_range.to_string(),
        monthly_budget: monthly_budget.to_string(),
        personality_type: personality.to_string(),
        traits: traits.iter().map(|t| t.to_string()).collect(),
        background,
        created_at: Some(Utc::now().to_rfc3339()),
    }
}

fn pick<R: Rng>(rng: &mut R, options: &[&str], fallback: &str) -> String {
    options.choose(rng).copied().unwrap_or(fallback).to_string()
}

#[allow(clippy::too_many_arguments)]
fn compose_background(
    name: &str,
    age: u32,
    occupation: &str,
    location: &str,
    income_range: &str,
    monthly_budget: &str,
    personality: &str,
    affinity: TopicAffinity,
) -> String {
    let mut parts = vec![
        format!("You are {}, a {}-year-old {} from {}.", name, age, occupation, location),
        format!(
            "Your monthly income is in the {} range, and you typically budget {} for the discussion topic.",
            income_range, monthly_budget
        ),
    ];

    let voice = match personality {
        "enthusiastic" => Some(
            "You are highly enthusiastic and love sharing your experiences. \
             You often interrupt with excitement, use phrases like 'OMG same!' and \
             share very specific details about your purchases and experiences.",
        ),
        "analytical" => Some(
            "You approach everything logically and always question prices and value. \
             You ask practical questions like 'Why would anyone pay that much?' and \
             often pause conversations to understand the reasoning behind decisions.",
        ),
        "trendy" => Some(
            "You are highly trend-conscious and follow influencers religiously. \
             You speak fast, use current slang, and constantly reference what's trending. \
             You get animated when discussing new trends and often finish others' sentences.",
        ),
        "cautious" => Some(
            "You are risk-averse and prefer traditional, tested options. \
             You speak softly, often start with 'Sorry to interrupt, but...' and \
             share detailed cautionary tales about bad experiences you've had.",
        ),
        "expert" => Some(
            "You have insider knowledge and extensive experience in this area. \
             You speak confidently, often educate others, and casually drop \
             industry insights and behind-the-scenes information.",
        ),
        "budget-focused" => Some(
            "You are extremely budget-conscious and track every expense. \
             You interrupt with specific price comparisons, mention exact discounts you found, \
             and always calculate cost-per-use for purchases.",
        ),
        _ => None,
    };
    if let Some(v) = voice {
        parts.push(v.to_string());
    }

    let topic_context = match (affinity, personality) {
        (TopicAffinity::Beauty, "enthusiastic") => {
            Some("You love trying new beauty products and follow Korean skincare trends religiously.")
        }
        (TopicAffinity::Beauty, "budget-focused") => {
            Some("You research ingredients extensively and always look for dupes of expensive products.")
        }
        (TopicAffinity::Beauty, "trendy") => {
            Some("You follow beauty influencers and always know about the latest launches and trends.")
        }
        (TopicAffinity::Beauty, "cautious") => {
            Some("You prefer buying from physical stores where you can test products first.")
        }
        (TopicAffinity::Tech, "expert") => {
            Some("You work in tech and understand the technical aspects of digital products.")
        }
        (TopicAffinity::Tech, "analytical") => {
            Some("You evaluate tech products based on specifications and practical utility.")
        }
        _ => None,
    };
    if let Some(t) = topic_context {
        parts.push(t.to_string());
    }

    let mut habits = Vec::new();
    habits.push(if age <= 23 {
        "You live in a PG or shared accommodation."
    } else if age <= 28 {
        "You're establishing your career and managing student loans."
    } else {
        "You have more disposable income and established preferences."
    });
    habits.push(if matches!(location, "Mumbai" | "Delhi" | "Bangalore") {
        "You shop online frequently and have access to premium brands."
    } else {
        "You rely more on local stores and are selective about online purchases."
    });
    match personality {
        "trendy" => habits.push("You make impulse purchases based on social media recommendations."),
        "budget-focused" => habits.push("You maintain detailed expense tracking and wait for sales."),
        "cautious" => habits.push("You read reviews extensively and prefer established brands."),
        _ => {}
    }
    parts.push(habits.join(" "));

    parts.join(" ")
}

pub fn validate_personas(personas: &[Participant]) -> PersonaValidation {
    fn distinct<'a>(values: impl Iterator<Item = &'a str>) -> usize {
        values.collect::<HashSet<_>>().len()
    }

    let ages: HashSet<u32> = personas.iter().map(|p| p.age).collect();
    let personality_diversity = distinct(personas.iter().map(|p| p.personality_type.as_str()));
    let income_diversity = distinct(personas.iter().map(|p| p.income_range.as_str()));
    let names = distinct(personas.iter().map(|p| p.name.as_str()));

    let mut issues = Vec::new();
    if personality_diversity < 4 {
        issues.push("Insufficient personality diversity".to_string());
    }
    if income_diversity < 3 {
        issues.push("Insufficient income diversity".to_string());
    }
    if names != personas.len() {
        issues.push("Duplicate names found".to_string());
    }

    PersonaValidation {
        total_personas: personas.len(),
        age_diversity: ages.len(),
        occupation_diversity: distinct(personas.iter().map(|p| p.occupation.as_str())),
        personality_diversity,
        location_diversity: distinct(personas.iter().map(|p| p.location.as_str())),
        income_diversity,
        is_valid: issues.is_empty(),
        issues,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::brain::DisabledBrain;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use serde_json::json;

    #[test]
    fn template_personas_have_unique_names_and_filled_fields() {
        let mut rng = StdRng::seed_from_u64(7);
        let personas = template_personas("millennial shoppers", "skincare routines", 8, &mut rng);
        assert_eq!(personas.len(), 8);
        let names: HashSet<_> = personas.iter().map(|p| p.name.clone()).collect();
        assert_eq!(names.len(), 8);
        for p in &personas {
            assert!((26..=35).contains(&p.age));
            assert!(!p.background.is_empty());
            assert!(p.background.starts_with(&format!("You are {},", p.name)));
        }
    }

    #[test]
    fn name_pool_exhaustion_falls_back_to_numbered_names() {
        let mut rng = StdRng::seed_from_u64(1);
        let personas = template_personas("", "tea", 26, &mut rng);
        assert_eq!(personas[24].name, "Person_25");
        assert_eq!(personas[25].name, "Person_26");
    }

    #[test]
    fn disabled_service_uses_templates() {
        let gen = PersonaGenerator::new(Arc::new(DisabledBrain));
        let mut rng = StdRng::seed_from_u64(3);
        let personas = gen.generate_personas("gen z", "snacks", 3, &mut rng).unwrap();
        assert_eq!(personas.len(), 3);
        assert!(gen.generate_personas("", "snacks", 0, &mut rng).is_err());
    }

    #[test]
    fn coerce_personas_dedupes_and_defaults() {
        let doc = json!({"personas": [
            {"name": "Aditi", "age": "29", "traits": ["curious", 3]},
            "not a persona",
            {"name": "Aditi"},
            {"age": 40}
        ]});
        let personas = coerce_personas(&doc, 10);
        assert_eq!(personas.len(), 3);
        assert_eq!(personas[0].age, 29);
        assert_eq!(personas[0].traits, vec!["curious".to_string()]);
        assert_eq!(personas[1].name, "Aditi_2");
        assert_eq!(personas[2].name, "Person_3");
    }

    #[test]
    fn suffixed_names_never_collide_with_existing_ones() {
        let doc = json!([{"name": "A_3"}, {"name": "A"}, {"name": "A"}, {"name": "B", "age": 5_000_000_000u64}]);
        let personas = coerce_personas(&doc, 10);
        let names: Vec<&str> = personas.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["A_3", "A", "A_4", "B"]);
        assert_eq!(personas[3].age, 25);
    }

    #[test]
    fn validation_flags_duplicates_and_low_diversity() {
        let personas = vec![Participant::named("A"), Participant::named("A")];
        let v = validate_personas(&personas);
        assert!(!v.is_valid);
        assert!(v.issues.contains(&"Duplicate names found".to_string()));
        assert!(v.issues.contains(&"Insufficient personality diversity".to_string()));
    }
}
