// src/discussion_plan.rs
// DISCUSSION FLOW: ordered phases of moderator questions, plus the fixed
// moderator vocabulary used between them.

use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Phase {
    pub name: String,
    pub questions: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct DiscussionFlow {
    pub phases: Vec<Phase>,
}

// =========================================================================
// FIXED SIX-PHASE TEMPLATE
// =========================================================================
const TEMPLATE: [(&str, &[&str]); 6] = [
    (
        "opening_questions",
        &[
            "Let's start by getting to know each other. Please introduce yourself and share what initially drew you to this topic.",
            "Before we dive deep, I'd love to hear about your current relationship with {topic}. What's your experience been like?",
            "To break the ice, could you each share one word that comes to mind when you think about {topic}?",
        ],
    ),
    (
        "exploration_questions",
        &[
            "Tell me about your most recent experience with {topic}. Walk me through it from start to finish.",
            "What influences your decisions when it comes to {topic}? I'd love to hear different perspectives.",
            "Let's talk about challenges. What frustrates you most about {topic}?",
            "How do you typically research or learn about {topic}? What sources do you trust?",
        ],
    ),
    (
        "deep_dive_questions",
        &[
            "I'm hearing some interesting viewpoints. Let's explore the money aspect - how do budget considerations affect your choices?",
            "What would make you completely change your current approach to {topic}?",
            "If you had to convince a friend about {topic}, what would be your main arguments?",
            "What's one thing about {topic} that you wish more people understood?",
        ],
    ),
    (
        "comparison_questions",
        &[
            "I'm noticing some different approaches here. Let's compare - online vs offline experiences with {topic}.",
            "How important is brand reputation vs price when it comes to {topic}?",
            "What role do recommendations from friends vs influencers vs experts play in your decisions?",
            "Traditional vs modern approaches to {topic} - where do you stand?",
        ],
    ),
    (
        "future_focused_questions",
        &[
            "Looking ahead, how do you see your relationship with {topic} evolving?",
            "What innovations or changes would excite you most in the {topic} space?",
            "If you could design the perfect {topic} experience, what would it look like?",
            "What advice would you give to someone just starting with {topic}?",
        ],
    ),
    (
        "wrap_up_questions",
        &[
            "Before we conclude, what's the most important insight you're taking away from today's discussion?",
            "Is there anything about {topic} that we haven't discussed that you feel is important?",
            "Any final thoughts or questions for the group?",
        ],
    ),
];

pub const PHASE_NAMES: [&str; 6] = [
    "opening_questions",
    "exploration_questions",
    "deep_dive_questions",
    "comparison_questions",
    "future_focused_questions",
    "wrap_up_questions",
];

pub const MODERATOR_PHRASES: [&str; 5] = [
    "That's fascinating, tell me more about that.",
    "I'm seeing some head nods - what do others think?",
    "Let's pause there and hear from someone who hasn't spoken yet.",
    "I notice some different reactions - let's explore that.",
    "Before we move on, does anyone want to build on what was shared?",
];

pub const FLOW_SCHEMA_HINT: &str = "{phase: string[]}";

/// Transition line spoken after a named template phase finishes.
pub fn transition_for(phase: &str) -> Option<&'static str> {
    match phase {
        "opening_questions" => Some("Great introductions everyone. Now let's dive deeper."),
        "exploration_questions" => {
            Some("I'm hearing some fascinating experiences. Let's explore this further.")
        }
        "deep_dive_questions" => {
            Some("These insights are really valuable. Let's compare different approaches.")
        }
        "comparison_questions" => Some("Excellent perspectives. Let's think about the future."),
        "future_focused_questions" => {
            Some("Wonderful forward-thinking ideas. Let's start wrapping up.")
        }
        _ => None,
    }
}

fn with_topic(question: &str, topic: &str) -> String {
    question.replace("{topic}", topic)
}

impl DiscussionFlow {
    pub fn template(topic: &str) -> Self {
        let phases = TEMPLATE
            .iter()
            .map(|(name, questions)| Phase {
                name: name.to_string(),
                questions: questions.iter().map(|q| with_topic(q, topic)).collect(),
            })
            .collect();
        Self { phases }
    }

    /// Validates a service-produced `{phase: [question, ...]}` document.
    /// Non-list entries and non-string questions are dropped, as are phases
    /// left with no questions. `None` when nothing valid remains.
    pub fn from_document(doc: &Value, topic: &str) -> Option<Self> {
        let map = doc.as_object()?;
        let phases: Vec<Phase> = map
            .iter()
            .filter_map(|(name, questions)| {
                let questions: Vec<String> = questions
                    .as_array()?
                    .iter()
                    .filter_map(Value::as_str)
                    .map(|q| with_topic(q, topic))
                    .collect();
                if questions.is_empty() {
                    None
                } else {
                    Some(Phase {
                        name: name.clone(),
                        questions,
                    })
                }
            })
            .collect();

        if phases.is_empty() {
            None
        } else {
            Some(Self { phases })
        }
    }

    pub fn question_count(&self) -> usize {
        self.phases.iter().map(|p| p.questions.len()).sum()
    }
}

/// Prompts that ask the service for a flow. With a plan the plan is
/// converted; without one the six template phase keys are requested.
pub fn flow_prompts(topic: &str, plan_text: Option<&str>) -> (String, String) {
    match plan_text.filter(|p| !p.trim().is_empty()) {
        Some(plan) => (
            "You are a focus group moderator. Convert the following plan into a JSON object \
             with keys (phase slugs) -> list of 2-4 open-ended questions."
                .to_string(),
            format!("Plan:\n{}\n\nTopic: {}", plan, topic),
        ),
        None => (
            "You are an expert focus group moderator. Given a topic, generate a structured \
             set of phases with 3-4 open-ended, non-leading questions per phase."
                .to_string(),
            format!(
                "Topic: {}\nPhases: {}.\nReturn JSON with those exact keys and list of strings as values.",
                topic,
                PHASE_NAMES.join(", ")
            ),
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn template_has_six_phases_with_topic_substituted() {
        let flow = DiscussionFlow::template("skincare routines");
        let names: Vec<&str> = flow.phases.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, PHASE_NAMES.to_vec());
        for phase in &flow.phases {
            assert!((3..=4).contains(&phase.questions.len()));
            assert!(phase.questions.iter().all(|q| !q.contains("{topic}")));
        }
        assert_eq!(flow.question_count(), 22);
        assert!(flow.phases[1].questions[0].contains("skincare routines"));
    }

    #[test]
    fn document_validation_drops_bad_entries() {
        let doc = json!({
            "warm_up": ["How do you feel about {topic}?", 42, null],
            "notes": "not a list",
            "empty": [1, 2],
            "pricing": ["What do you pay?"]
        });
        let flow = DiscussionFlow::from_document(&doc, "tea").unwrap();
        assert_eq!(flow.phases.len(), 2);
        assert_eq!(flow.phases[0].name, "warm_up");
        assert_eq!(flow.phases[0].questions, vec!["How do you feel about tea?".to_string()]);
        assert_eq!(flow.phases[1].name, "pricing");
    }

    #[test]
    fn document_without_valid_phase_is_rejected() {
        assert!(DiscussionFlow::from_document(&json!({"content": "sorry"}), "tea").is_none());
        assert!(DiscussionFlow::from_document(&json!(["a"]), "tea").is_none());
    }

    #[test]
    fn only_first_five_phases_have_transitions() {
        assert!(transition_for("opening_questions").is_some());
        assert!(transition_for("future_focused_questions").is_some());
        assert!(transition_for("wrap_up_questions").is_none());
        assert!(transition_for("agentic_flow").is_none());
    }

    #[test]
    fn plan_prompt_embeds_plan_text() {
        let (_, user) = flow_prompts("tea", Some("1. Warm up\n2. Prices"));
        assert!(user.starts_with("Plan:\n1. Warm up"));
        let (_, user) = flow_prompts("tea", Some("   "));
        assert!(user.contains("opening_questions"));
    }
}
