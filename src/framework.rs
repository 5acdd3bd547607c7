// src/framework.rs
// DISCUSSION FRAMEWORK: research plan generation, refinement and review.
// The accepted framework is rendered to plan text for the moderator.

use crate::brain::GenerationService;
use crate::error::{FocusGroupError, Result};
use chrono::Utc;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt::Write as _;
use std::sync::Arc;
use tracing::{info, warn};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(default)]
pub struct FrameworkPhase {
    pub name: String,
    pub objective: String,
    pub questions: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(default)]
pub struct ParticipantCriteria {
    pub demographics: Vec<String>,
    pub behaviors: Vec<String>,
    pub experiences: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(default)]
pub struct DiscussionFramework {
    pub research_objectives: Vec<String>,
    pub discussion_phases: Vec<FrameworkPhase>,
    pub key_questions: Vec<String>,
    pub participant_criteria: ParticipantCriteria,
    pub business_context: String,
    pub expected_insights: Vec<String>,
    pub success_metrics: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub generated_at: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub refined_at: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub notes: Vec<String>,
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

fn phase(name: &str, objective: &str, questions: &[&str]) -> FrameworkPhase {
    FrameworkPhase {
        name: name.to_string(),
        objective: objective.to_string(),
        questions: strings(questions),
    }
}

impl DiscussionFramework {
    /// Four-phase framework used without a generation service.
    pub fn heuristic(topic_brief: &str, business_context: Option<&str>) -> Self {
        Self {
            research_objectives: strings(&[
                "Understand current behaviors and decision drivers",
                "Identify pain points and unmet needs",
                "Evaluate trust and credibility factors",
            ]),
            discussion_phases: vec![
                phase(
                    "Opening & Context",
                    "Warm-up and establish context",
                    &[
                        "Please introduce yourself and your relationship with the topic.",
                        "What comes to mind first when you think about this topic?",
                    ],
                ),
                phase(
                    "Experiences",
                    "Recent experiences and workflows",
                    &[
                        "Walk me through your most recent relevant experience.",
                        "What worked well and what didn't?",
                    ],
                ),
                phase(
                    "Deep Dive",
                    "Pain points and trade-offs",
                    &[
                        "What are the biggest challenges you face?",
                        "How do you weigh price, quality, and convenience?",
                    ],
                ),
                phase(
                    "Wrap-up",
                    "Synthesis and next steps",
                    &[
                        "What advice would you give others considering this?",
                        "What change would have the biggest impact?",
                    ],
                ),
            ],
            key_questions: strings(&[
                "What drives your decisions?",
                "Where do you find trustworthy information?",
                "What trade-offs do you commonly make?",
            ]),
            participant_criteria: ParticipantCriteria {
                demographics: strings(&["18-45", "Urban/Semi-urban"]),
                behaviors: strings(&["Recent relevant purchase/usage", "Online research"]),
                experiences: strings(&["At least one recent journey in last 60 days"]),
            },
            business_context: business_context
                .filter(|c| !c.trim().is_empty())
                .unwrap_or(topic_brief)
                .to_string(),
            expected_insights: strings(&["Decision drivers", "Barriers", "Trust signals"]),
            success_metrics: strings(&["Rich stories", "Clear themes", "Actionable opportunities"]),
            generated_at: Some(Utc::now().to_rfc3339()),
            refined_at: None,
            notes: Vec::new(),
        }
    }

    /// Drops phases without questions. `None` if nothing usable remains.
    fn coerced(mut self) -> Option<Self> {
        for p in &mut self.discussion_phases {
            p.questions.retain(|q| !q.trim().is_empty());
        }
        self.discussion_phases
            .retain(|p| !p.name.trim().is_empty() && !p.questions.is_empty());
        if self.discussion_phases.is_empty() {
            None
        } else {
            Some(self)
        }
    }

    /// Markdown plan handed to the moderator and coordinator.
    pub fn plan_text(&self) -> String {
        let mut out = String::from("# Discussion Plan\n");
        if !self.business_context.is_empty() {
            let _ = writeln!(out, "\nContext: {}", self.business_context);
        }
        if !self.research_objectives.is_empty() {
            out.push_str("\n## Objectives\n");
            for o in &self.research_objectives {
                let _ = writeln!(out, "- {}", o);
            }
        }
        for (i, p) in self.discussion_phases.iter().enumerate() {
            let _ = writeln!(out, "\n## Phase {}: {}", i + 1, p.name);
            if !p.objective.is_empty() {
                let _ = writeln!(out, "Goal: {}", p.objective);
            }
            for q in &p.questions {
                let _ = writeln!(out, "- {}", q);
            }
        }
        if !self.key_questions.is_empty() {
            out.push_str("\n## Key Questions\n");
            for q in &self.key_questions {
                let _ = writeln!(out, "- {}", q);
            }
        }
        out
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FrameworkValidation {
    pub score: u8,
    #[serde(default)]
    pub strengths: Vec<String>,
    #[serde(default)]
    pub risks: Vec<String>,
    #[serde(default)]
    pub recommendations: Vec<String>,
}

impl FrameworkValidation {
    fn heuristic() -> Self {
        Self {
            score: 70,
            strengths: strings(&["Clear phases", "Action-oriented questions"]),
            risks: strings(&["Might need more participant diversity"]),
            recommendations: strings(&["Add success metrics tied to business goals"]),
        }
    }

    fn from_document(doc: &Value) -> Option<Self> {
        let score = doc.get("score")?.as_f64()?.clamp(0.0, 100.0).round() as u8;
        let list = |key: &str| -> Vec<String> {
            doc.get(key)
                .and_then(|v| serde_json::from_value::<Vec<String>>(v.clone()).ok())
                .unwrap_or_default()
        };
        Some(Self {
            score,
            strengths: list("strengths"),
            risks: list("risks"),
            recommendations: list("recommendations"),
        })
    }
}

pub struct FrameworkAgent {
    brain: Arc<dyn GenerationService>,
    llm_only: bool,
}

impl FrameworkAgent {
    pub fn new(brain: Arc<dyn GenerationService>, llm_only: bool) -> Self {
        Self { brain, llm_only }
    }

    pub fn generate_framework(
        &self,
        topic_brief: &str,
        business_context: Option<&str>,
        research_goals: Option<&str>,
    ) -> Result<DiscussionFramework> {
        if topic_brief.trim().is_empty() {
            return Err(FocusGroupError::InvalidInput("topic brief is empty".into()));
        }
        let system = "You are a research strategist. Create a comprehensive focus group framework. \
                      Return STRICT JSON with keys: research_objectives (string[]), discussion_phases ({name, objective, questions[]}[]), \
                      key_questions (string[]), participant_criteria ({demographics: string[], behaviors: string[], experiences: string[]}), \
                      business_context (string), expected_insights (string[]), success_metrics (string[]).";
        let user = format!(
            "Topic brief: {}\nBusiness context (optional): {}\nResearch goals (optional): {}\n\
             Constraints: 3-5 objectives, 4-6 phases (each with 2-3 questions), 8-12 key questions total.",
            topic_brief,
            business_context.unwrap_or_default(),
            research_goals.unwrap_or_default()
        );

        let generated = self.structured::<DiscussionFramework>(system, &user, "framework object", "framework")?;
        match generated.and_then(DiscussionFramework::coerced) {
            Some(mut framework) => {
                framework.generated_at = Some(Utc::now().to_rfc3339());
                info!(phases = framework.discussion_phases.len(), "framework generated by service");
                Ok(framework)
            }
            None => self.fallback("framework", || DiscussionFramework::heuristic(topic_brief, business_context)),
        }
    }

    pub fn refine_framework(&self, framework: DiscussionFramework, instructions: &str) -> Result<DiscussionFramework> {
        let system = "Refine the given framework JSON according to the instructions. \
                      Return STRICT JSON preserving the original schema keys.";
        let user = format!(
            "Framework JSON:\n{}\n\nInstructions:\n{}",
            serde_json::to_string_pretty(&framework)?,
            instructions
        );

        let generated = self.structured::<DiscussionFramework>(system, &user, "framework object", "refinement")?;
        match generated.and_then(DiscussionFramework::coerced) {
            Some(mut refined) => {
                refined.generated_at = refined.generated_at.or(framework.generated_at);
                refined.refined_at = Some(Utc::now().to_rfc3339());
                Ok(refined)
            }
            None => self.fallback("refinement", move || {
                let mut manual = framework;
                manual.refined_at = Some(Utc::now().to_rfc3339());
                manual.notes.push(format!("Manual refinement requested: {}", instructions));
                manual
            }),
        }
    }

    pub fn validate_framework(&self, framework: &DiscussionFramework) -> Result<FrameworkValidation> {
        let system = "Evaluate the quality of a focus group framework. Return STRICT JSON with: \
                      score (0-100), strengths (string[]), risks (string[]), recommendations (string[]).";
        let user = format!("Framework JSON to evaluate:\n{}", serde_json::to_string_pretty(framework)?);

        let doc = self.structured::<Value>(system, &user, "{score:number}", "validation")?;
        match doc.as_ref().and_then(FrameworkValidation::from_document) {
            Some(v) => Ok(v),
            None => self.fallback("validation", FrameworkValidation::heuristic),
        }
    }

    /// `Ok(None)` when the service is off, failed or returned the wrong
    /// shape and a heuristic may stand in. LLM-only mode turns service
    /// failures into errors here.
    fn structured<T: DeserializeOwned>(
        &self,
        system: &str,
        user: &str,
        hint: &str,
        what: &str,
    ) -> Result<Option<T>> {
        if !self.brain.enabled() {
            return Ok(None);
        }
        match self.brain.generate_structured(system, user, Some(hint)) {
            Ok(doc) => match serde_json::from_value::<T>(doc) {
                Ok(parsed) => Ok(Some(parsed)),
                Err(e) => {
                    warn!(error = %e, what, "structured response did not match");
                    Ok(None)
                }
            },
            Err(e) if self.llm_only => Err(e.into()),
            Err(e) => {
                warn!(error = %e, what, "generation failed, using heuristic");
                Ok(None)
            }
        }
    }

    fn fallback<T>(&self, what: &str, build: impl FnOnce() -> T) -> Result<T> {
        if self.llm_only {
            return Err(if self.brain.enabled() {
                FocusGroupError::MalformedResponse(format!("unusable {} response", what))
            } else {
                FocusGroupError::ServiceUnavailable(format!("{} requires the generation service", what))
            });
        }
        Ok(build())
    }
}
