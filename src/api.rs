// src/api.rs
// HTTP SURFACE: session store plus thin handlers over the engine.
// Every engine call is blocking, so handlers hand it to `web::block`.

use crate::analyst::{Summary, SummaryGenerator};
use crate::brain::GenerationService;
use crate::config::AppConfig;
use crate::custom_summary::{CustomSummary, CustomSummaryGenerator};
use crate::error::{FocusGroupError, Result};
use crate::focus_group::DiscussionModerator;
use crate::framework::{DiscussionFramework, FrameworkAgent};
use crate::participant::Participant;
use crate::persona_generator::PersonaGenerator;
use crate::qa::{suggest_follow_ups, Answer, HistoryEntry, QaAssistant};
use crate::reporter::Reporter;
use crate::transcript::Transcript;
use actix_web::error::BlockingError;
use actix_web::http::StatusCode;
use actix_web::{web, HttpResponse, ResponseError};
use chrono::Utc;
use dashmap::DashMap;
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::collections::HashSet;
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

// =========================================================================
// STATE
// =========================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    Created,
    PersonasEdited,
    Framed,
    PlanAccepted,
    Discussed,
    Summarized,
}

#[derive(Clone)]
pub struct Session {
    pub id: String,
    pub topic: String,
    pub participants: Vec<Participant>,
    pub framework: Option<DiscussionFramework>,
    pub plan_text: Option<String>,
    pub transcript: Transcript,
    pub summary: Option<Summary>,
    pub custom_summary: Option<CustomSummary>,
    pub qa: Arc<QaAssistant>,
    pub status: SessionStatus,
    pub created_at: String,
}

impl Session {
    fn view(&self) -> SessionView<'_> {
        SessionView {
            id: &self.id,
            topic: &self.topic,
            status: self.status,
            participants: &self.participants,
            framework: self.framework.as_ref(),
            plan_text: self.plan_text.as_deref(),
            transcript: &self.transcript,
            summary: self.summary.as_ref(),
            custom_summary: self.custom_summary.as_ref(),
            qa_history: self.qa.history(),
            created_at: &self.created_at,
        }
    }

    /// Q&A grounds on the default summary, then the custom one.
    fn summary_document(&self) -> Result<Value> {
        let doc = match (&self.summary, &self.custom_summary) {
            (Some(summary), _) => serde_json::to_value(summary)?,
            (None, Some(custom)) => serde_json::to_value(custom)?,
            (None, None) => json!({}),
        };
        Ok(doc)
    }

    fn require_transcript(&self) -> Result<()> {
        if self.transcript.is_empty() {
            return Err(FocusGroupError::InvalidInput(format!(
                "session '{}' has no discussion yet",
                self.id
            )));
        }
        Ok(())
    }
}

#[derive(Serialize)]
pub struct SessionView<'a> {
    pub id: &'a str,
    pub topic: &'a str,
    pub status: SessionStatus,
    pub participants: &'a [Participant],
    pub framework: Option<&'a DiscussionFramework>,
    pub plan_text: Option<&'a str>,
    pub transcript: &'a Transcript,
    pub summary: Option<&'a Summary>,
    pub custom_summary: Option<&'a CustomSummary>,
    pub qa_history: Vec<HistoryEntry>,
    pub created_at: &'a str,
}

pub struct AppState {
    pub brain: Arc<dyn GenerationService>,
    pub config: AppConfig,
    pub sessions: Arc<DashMap<String, Session>>,
}

impl AppState {
    pub fn new(brain: Arc<dyn GenerationService>, config: AppConfig) -> Self {
        Self {
            brain,
            config,
            sessions: Arc::new(DashMap::new()),
        }
    }

    fn llm_only(&self) -> bool {
        self.config.generation.llm_only
    }

    fn snapshot(&self, id: &str) -> Result<Session> {
        self.sessions
            .get(id)
            .map(|s| s.clone())
            .ok_or_else(|| FocusGroupError::not_found("session", id))
    }

    /// Applies `f` to a stored session and renders the result.
    fn update(&self, id: &str, f: impl FnOnce(&mut Session)) -> Result<HttpResponse> {
        let mut session = self
            .sessions
            .get_mut(id)
            .ok_or_else(|| FocusGroupError::not_found("session", id))?;
        f(&mut session);
        Ok(HttpResponse::Ok().json(session.view()))
    }
}

// =========================================================================
// ERRORS
// =========================================================================

impl ResponseError for FocusGroupError {
    fn status_code(&self) -> StatusCode {
        match self {
            FocusGroupError::NotFound { .. } => StatusCode::NOT_FOUND,
            FocusGroupError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            FocusGroupError::ServiceUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            FocusGroupError::Generation(_) | FocusGroupError::MalformedResponse(_) => StatusCode::BAD_GATEWAY,
            FocusGroupError::Export(_) | FocusGroupError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code()).json(json!({ "error": self.to_string() }))
    }
}

impl From<BlockingError> for FocusGroupError {
    fn from(err: BlockingError) -> Self {
        FocusGroupError::Internal(err.to_string())
    }
}

// =========================================================================
// PAYLOADS
// =========================================================================

/// Upper bound on personas per session, generated or edited.
pub const MAX_PERSONAS: usize = 12;

fn default_count() -> usize {
    5
}

#[derive(Deserialize)]
pub struct PersonaRequest {
    pub topic: String,
    #[serde(default)]
    pub context: String,
    #[serde(default = "default_count")]
    pub count: usize,
}

#[derive(Deserialize)]
pub struct UpdatePersonasRequest {
    pub participants: Vec<Participant>,
    pub topic: Option<String>,
}

#[derive(Deserialize)]
pub struct AcceptPlanRequest {
    pub plan_text: String,
    pub topic: Option<String>,
}

#[derive(Deserialize, Default)]
pub struct FrameworkRequest {
    pub topic_brief: Option<String>,
    pub business_context: Option<String>,
    pub research_goals: Option<String>,
}

#[derive(Deserialize, Default)]
pub struct DiscussionRequest {
    pub topic: Option<String>,
    pub plan_text: Option<String>,
}

#[derive(Deserialize)]
pub struct CustomSummaryRequest {
    pub outline: String,
}

#[derive(Deserialize)]
pub struct QuestionRequest {
    pub question: String,
}

#[derive(Serialize)]
pub struct QaResponse {
    #[serde(flatten)]
    pub answer: Answer,
    pub follow_ups: Vec<&'static str>,
}

// =========================================================================
// HANDLERS
// =========================================================================

// POST /api/personas
pub async fn create_session(
    data: web::Data<AppState>,
    req: web::Json<PersonaRequest>,
) -> Result<HttpResponse> {
    let PersonaRequest { topic, context, count } = req.into_inner();
    if topic.trim().is_empty() {
        return Err(FocusGroupError::InvalidInput("topic is empty".into()));
    }
    if count > MAX_PERSONAS {
        return Err(FocusGroupError::InvalidInput(format!(
            "at most {} personas per session",
            MAX_PERSONAS
        )));
    }

    let generator = PersonaGenerator::new(data.brain.clone());
    let (topic, participants) = web::block(move || {
        let mut rng = StdRng::from_entropy();
        let participants = generator.generate_personas(&context, &topic, count, &mut rng)?;
        Ok::<_, FocusGroupError>((topic, participants))
    })
    .await??;

    let session = Session {
        id: Uuid::new_v4().to_string(),
        topic,
        participants,
        framework: None,
        plan_text: None,
        transcript: Transcript::new(),
        summary: None,
        custom_summary: None,
        qa: Arc::new(QaAssistant::new(data.brain.clone(), data.llm_only())),
        status: SessionStatus::Created,
        created_at: Utc::now().to_rfc3339(),
    };
    info!(session = %session.id, participants = session.participants.len(), "session created");

    let body = HttpResponse::Created().json(session.view());
    data.sessions.insert(session.id.clone(), session);
    Ok(body)
}

// GET /api/health
pub async fn health() -> HttpResponse {
    HttpResponse::Ok().json(json!({ "status": "healthy", "timestamp": Utc::now().to_rfc3339() }))
}

// GET /api/sessions/{id}
pub async fn get_session(data: web::Data<AppState>, path: web::Path<String>) -> Result<HttpResponse> {
    let id = path.into_inner();
    let session = data
        .sessions
        .get(&id)
        .ok_or_else(|| FocusGroupError::not_found("session", &id))?;
    Ok(HttpResponse::Ok().json(session.view()))
}

/// Non-empty roster of at most `MAX_PERSONAS`, names trimmed and unique.
pub fn check_roster(participants: &mut [Participant]) -> Result<()> {
    if participants.is_empty() || participants.len() > MAX_PERSONAS {
        return Err(FocusGroupError::InvalidInput(format!(
            "a session needs between 1 and {} personas",
            MAX_PERSONAS
        )));
    }
    let mut seen = HashSet::new();
    for p in participants.iter_mut() {
        p.name = p.name.trim().to_string();
        if p.name.is_empty() {
            return Err(FocusGroupError::InvalidInput("persona name is empty".into()));
        }
        if !seen.insert(p.name.clone()) {
            return Err(FocusGroupError::InvalidInput(format!("duplicate persona name '{}'", p.name)));
        }
    }
    Ok(())
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

// PUT /api/sessions/{id}/personas
pub async fn update_personas(
    data: web::Data<AppState>,
    path: web::Path<String>,
    req: web::Json<UpdatePersonasRequest>,
) -> Result<HttpResponse> {
    let id = path.into_inner();
    let UpdatePersonasRequest { mut participants, topic } = req.into_inner();
    check_roster(&mut participants)?;
    let topic = non_blank(topic);

    info!(session = %id, participants = participants.len(), "personas edited");
    data.update(&id, |s| {
        s.participants = participants;
        if let Some(topic) = topic {
            s.topic = topic;
        }
        s.status = SessionStatus::PersonasEdited;
    })
}

// PUT /api/sessions/{id}/plan
pub async fn accept_plan(
    data: web::Data<AppState>,
    path: web::Path<String>,
    req: web::Json<AcceptPlanRequest>,
) -> Result<HttpResponse> {
    let id = path.into_inner();
    let AcceptPlanRequest { plan_text, topic } = req.into_inner();
    if plan_text.trim().is_empty() {
        return Err(FocusGroupError::InvalidInput("plan text is empty".into()));
    }
    let topic = non_blank(topic);

    data.update(&id, |s| {
        s.plan_text = Some(plan_text);
        if let Some(topic) = topic {
            s.topic = topic;
        }
        s.status = SessionStatus::PlanAccepted;
    })
}

// POST /api/sessions/{id}/framework
pub async fn generate_framework(
    data: web::Data<AppState>,
    path: web::Path<String>,
    req: web::Json<FrameworkRequest>,
) -> Result<HttpResponse> {
    let id = path.into_inner();
    let session = data.snapshot(&id)?;
    let req = req.into_inner();
    let brief = req.topic_brief.unwrap_or(session.topic);

    let agent = FrameworkAgent::new(data.brain.clone(), data.llm_only());
    let framework = web::block(move || {
        agent.generate_framework(&brief, req.business_context.as_deref(), req.research_goals.as_deref())
    })
    .await??;

    data.update(&id, |s| {
        s.plan_text = Some(framework.plan_text());
        s.framework = Some(framework);
        s.status = SessionStatus::Framed;
    })
}

// POST /api/sessions/{id}/discussion
pub async fn run_discussion(
    data: web::Data<AppState>,
    path: web::Path<String>,
    req: web::Json<DiscussionRequest>,
) -> Result<HttpResponse> {
    let id = path.into_inner();
    let session = data.snapshot(&id)?;
    let req = req.into_inner();
    let topic = req.topic.unwrap_or(session.topic);
    let plan_text = req.plan_text.or(session.plan_text);
    let participants = session.participants;

    let moderator = DiscussionModerator::new(data.brain.clone(), data.config.discussion.clone(), data.llm_only());
    let (topic, transcript) = web::block(move || {
        let mut rng = StdRng::from_entropy();
        let transcript = moderator.run_discussion(&participants, &topic, plan_text.as_deref(), &mut rng)?;
        Reporter::log_overview(&transcript);
        Ok::<_, FocusGroupError>((topic, transcript))
    })
    .await??;

    data.update(&id, |s| {
        s.topic = topic;
        s.transcript = transcript;
        s.summary = None;
        s.custom_summary = None;
        s.qa.clear_history();
        s.status = SessionStatus::Discussed;
    })
}

// POST /api/sessions/{id}/summary
pub async fn generate_summary(data: web::Data<AppState>, path: web::Path<String>) -> Result<HttpResponse> {
    let id = path.into_inner();
    let session = data.snapshot(&id)?;
    session.require_transcript()?;

    let generator = SummaryGenerator::new(data.brain.clone());
    let transcript = session.transcript;
    let summary = web::block(move || generator.generate_summary(&transcript)).await??;

    data.update(&id, |s| {
        s.summary = Some(summary);
        s.status = SessionStatus::Summarized;
    })
}

// POST /api/sessions/{id}/custom-summary
pub async fn generate_custom_summary(
    data: web::Data<AppState>,
    path: web::Path<String>,
    req: web::Json<CustomSummaryRequest>,
) -> Result<HttpResponse> {
    let id = path.into_inner();
    let session = data.snapshot(&id)?;
    session.require_transcript()?;

    let generator = CustomSummaryGenerator::new(data.brain.clone());
    let outline = req.into_inner().outline;
    let custom = web::block(move || {
        generator.generate_custom_summary(&session.transcript, &session.participants, &outline, &session.topic)
    })
    .await??;

    let body = HttpResponse::Ok().json(&custom);
    data.update(&id, |s| {
        s.custom_summary = Some(custom);
        s.status = SessionStatus::Summarized;
    })?;
    Ok(body)
}

// POST /api/sessions/{id}/qa
pub async fn ask_question(
    data: web::Data<AppState>,
    path: web::Path<String>,
    req: web::Json<QuestionRequest>,
) -> Result<HttpResponse> {
    let id = path.into_inner();
    let session = data.snapshot(&id)?;
    session.require_transcript()?;

    let question = req.into_inner().question;
    if question.trim().is_empty() {
        return Err(FocusGroupError::InvalidInput("question is empty".into()));
    }

    let summary = session.summary_document()?;
    let answer = web::block(move || {
        session
            .qa
            .answer(&question, &session.transcript, &summary, &session.participants)
    })
    .await??;

    let follow_ups = suggest_follow_ups(&answer);
    Ok(HttpResponse::Ok().json(QaResponse { answer, follow_ups }))
}

// DELETE /api/sessions/{id}/qa
pub async fn clear_questions(data: web::Data<AppState>, path: web::Path<String>) -> Result<HttpResponse> {
    let id = path.into_inner();
    data.update(&id, |s| s.qa.clear_history())
}

// GET /api/sessions/{id}/transcript.csv
pub async fn transcript_csv(data: web::Data<AppState>, path: web::Path<String>) -> Result<HttpResponse> {
    let id = path.into_inner();
    let csv = {
        let session = data
            .sessions
            .get(&id)
            .ok_or_else(|| FocusGroupError::not_found("session", &id))?;
        Reporter::transcript_csv(&session.transcript)?
    };
    Ok(HttpResponse::Ok().content_type("text/csv; charset=utf-8").body(csv))
}

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api")
            .route("/health", web::get().to(health))
            .route("/personas", web::post().to(create_session))
            .route("/sessions/{id}", web::get().to(get_session))
            .route("/sessions/{id}/personas", web::put().to(update_personas))
            .route("/sessions/{id}/plan", web::put().to(accept_plan))
            .route("/sessions/{id}/framework", web::post().to(generate_framework))
            .route("/sessions/{id}/discussion", web::post().to(run_discussion))
            .route("/sessions/{id}/summary", web::post().to(generate_summary))
            .route("/sessions/{id}/custom-summary", web::post().to(generate_custom_summary))
            .route("/sessions/{id}/qa", web::post().to(ask_question))
            .route("/sessions/{id}/qa", web::delete().to(clear_questions))
            .route("/sessions/{id}/transcript.csv", web::get().to(transcript_csv)),
    );
}
