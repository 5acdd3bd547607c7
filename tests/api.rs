// tests/api.rs
// HTTP surface against an in-memory session store, heuristics only.

use actix_web::http::StatusCode;
use actix_web::{test, web, App};
use agora_core::api::{self, AppState};
use agora_core::brain::{DisabledBrain, GenerationService};
use agora_core::config::{AppConfig, DiscussionConfig, DiscussionMode};
use agora_core::GenerationError;
use serde_json::{json, Value};
use std::sync::Arc;

fn state() -> web::Data<AppState> {
    let config = AppConfig {
        discussion: DiscussionConfig::unpaced(),
        ..AppConfig::default()
    };
    web::Data::new(AppState::new(Arc::new(DisabledBrain), config))
}

/// Turns an accepted plan into a one-question flow; anything else fails
/// so the engine falls back to templates.
struct PlanBrain;

impl GenerationService for PlanBrain {
    fn enabled(&self) -> bool {
        true
    }
    fn generate_text(&self, _: &str, _: &str, _: Option<f32>, _: Option<u32>) -> Result<String, GenerationError> {
        Ok("I would keep it simple.".to_string())
    }
    fn generate_structured(&self, _: &str, user: &str, _: Option<&str>) -> Result<Value, GenerationError> {
        if user.contains("brewing habits") {
            Ok(json!({ "accepted_phase": ["Which tea do you brew first?"] }))
        } else {
            Err(GenerationError::EmptyResponse)
        }
    }
}

fn plan_state() -> web::Data<AppState> {
    let config = AppConfig {
        discussion: DiscussionConfig {
            mode: DiscussionMode::PhaseFlow,
            ..DiscussionConfig::unpaced()
        },
        ..AppConfig::default()
    };
    web::Data::new(AppState::new(Arc::new(PlanBrain), config))
}

macro_rules! app {
    () => {
        app!(state())
    };
    ($state:expr) => {
        test::init_service(App::new().app_data($state).configure(api::configure)).await
    };
}

macro_rules! put {
    ($app:expr, $uri:expr, $body:expr) => {
        test::call_service(&$app, test::TestRequest::put().uri($uri).set_json($body).to_request()).await
    };
}

macro_rules! post {
    ($app:expr, $uri:expr, $body:expr) => {
        test::call_service(&$app, test::TestRequest::post().uri($uri).set_json($body).to_request()).await
    };
}

#[actix_web::test]
async fn session_lifecycle() {
    let app = app!();

    let resp = post!(
        app,
        "/api/personas",
        json!({ "topic": "skincare routines", "context": "urban professionals", "count": 3 })
    );
    assert_eq!(resp.status(), StatusCode::CREATED);
    let session: Value = test::read_body_json(resp).await;
    let id = session["id"].as_str().unwrap().to_string();
    assert_eq!(session["participants"].as_array().unwrap().len(), 3);
    assert_eq!(session["status"], "created");

    let resp = post!(app, &format!("/api/sessions/{id}/summary"), json!({}));
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let resp = post!(app, &format!("/api/sessions/{id}/framework"), json!({}));
    assert_eq!(resp.status(), StatusCode::OK);
    let framed: Value = test::read_body_json(resp).await;
    assert_eq!(framed["status"], "framed");
    assert!(framed["plan_text"].as_str().unwrap().starts_with("# Discussion Plan"));

    let resp = post!(app, &format!("/api/sessions/{id}/discussion"), json!({}));
    assert_eq!(resp.status(), StatusCode::OK);
    let discussed: Value = test::read_body_json(resp).await;
    let entries = discussed["transcript"].as_array().unwrap();
    assert_eq!(entries.first().unwrap()["type"], "setup");
    assert_eq!(entries.last().unwrap()["type"], "conclusion");

    let resp = post!(app, &format!("/api/sessions/{id}/summary"), json!({}));
    assert_eq!(resp.status(), StatusCode::OK);
    let summarized: Value = test::read_body_json(resp).await;
    assert_eq!(summarized["summary"]["participants"]["count"], 3);

    let resp = post!(
        app,
        &format!("/api/sessions/{id}/custom-summary"),
        json!({ "outline": "1. Key Insights\n2. Budget Analysis - spending patterns" })
    );
    assert_eq!(resp.status(), StatusCode::OK);
    let custom: Value = test::read_body_json(resp).await;
    let keys: Vec<&str> = custom.as_object().unwrap().keys().map(String::as_str).collect();
    assert_eq!(keys, vec!["metadata", "key_insights", "budget_analysis"]);

    let resp = post!(
        app,
        &format!("/api/sessions/{id}/qa"),
        json!({ "question": "What are the main themes?" })
    );
    assert_eq!(resp.status(), StatusCode::OK);
    let answer: Value = test::read_body_json(resp).await;
    assert_eq!(answer["category"], "theme_analysis");
    assert!(!answer["follow_ups"].as_array().unwrap().is_empty());

    let req = test::TestRequest::get().uri(&format!("/api/sessions/{id}")).to_request();
    let stored: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(stored["qa_history"].as_array().unwrap().len(), 1);

    let req = test::TestRequest::delete().uri(&format!("/api/sessions/{id}/qa")).to_request();
    let cleared: Value = test::call_and_read_body_json(&app, req).await;
    assert!(cleared["qa_history"].as_array().unwrap().is_empty());
}

#[actix_web::test]
async fn transcript_downloads_as_csv() {
    let app = app!();
    let resp = post!(app, "/api/personas", json!({ "topic": "tea", "count": 2 }));
    let session: Value = test::read_body_json(resp).await;
    let id = session["id"].as_str().unwrap().to_string();
    post!(app, &format!("/api/sessions/{id}/discussion"), json!({ "topic": "green tea" }));

    let req = test::TestRequest::get()
        .uri(&format!("/api/sessions/{id}/transcript.csv"))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(
        resp.headers().get("content-type").unwrap().to_str().unwrap(),
        "text/csv; charset=utf-8"
    );
    let body = test::read_body(resp).await;
    let text = std::str::from_utf8(&body).unwrap();
    assert!(text.starts_with("type,speaker,content,timestamp,phase"));
    assert!(text.contains("Focus Group Discussion: green tea"));
}

#[actix_web::test]
async fn errors_are_json_with_status() {
    let app = app!();

    let req = test::TestRequest::get().uri("/api/sessions/missing").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["error"], "session 'missing' not found");

    let resp = post!(app, "/api/personas", json!({ "topic": "  " }));
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let resp = post!(app, "/api/personas", json!({ "topic": "tea", "count": 0 }));
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let resp = post!(app, "/api/personas", json!({ "topic": "tea", "count": 1_000_000_000_000u64 }));
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["error"], "invalid input: at most 12 personas per session");
}

#[actix_web::test]
async fn health_reports_healthy() {
    let app = app!();
    let req = test::TestRequest::get().uri("/api/health").to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["status"], "healthy");
    assert!(body["timestamp"].is_string());
}

#[actix_web::test]
async fn edited_personas_replace_roster_and_topic() {
    let app = app!();
    let resp = post!(app, "/api/personas", json!({ "topic": "tea", "count": 3 }));
    let session: Value = test::read_body_json(resp).await;
    let id = session["id"].as_str().unwrap().to_string();
    let uri = format!("/api/sessions/{id}/personas");

    let resp = put!(
        app,
        &uri,
        json!({ "participants": [{ "name": "Aditi" }, { "name": " Aditi " }], "topic": "coffee" })
    );
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["error"], "invalid input: duplicate persona name 'Aditi'");

    let resp = put!(app, &uri, json!({ "participants": [] }));
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let resp = put!(
        app,
        &uri,
        json!({
            "participants": [
                { "name": "Aditi", "age": 24, "personality_type": "enthusiastic" },
                { "name": "Rahul", "monthly_budget": "₹2,000" }
            ],
            "topic": "filter coffee"
        })
    );
    assert_eq!(resp.status(), StatusCode::OK);
    let edited: Value = test::read_body_json(resp).await;
    assert_eq!(edited["status"], "personas_edited");
    assert_eq!(edited["topic"], "filter coffee");
    assert_eq!(edited["participants"][1]["age"], 25);

    let resp = post!(app, &format!("/api/sessions/{id}/discussion"), json!({}));
    let discussed: Value = test::read_body_json(resp).await;
    let setup = &discussed["transcript"][0];
    assert_eq!(setup["content"], "Focus Group Discussion: filter coffee");
    assert_eq!(setup["participants"], json!(["Aditi", "Rahul"]));

    let resp = put!(app, "/api/sessions/missing/personas", json!({ "participants": [{ "name": "A" }] }));
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[actix_web::test]
async fn accepted_plan_drives_later_discussions() {
    let app = app!(plan_state());
    let resp = post!(app, "/api/personas", json!({ "topic": "tea", "count": 2 }));
    let session: Value = test::read_body_json(resp).await;
    let id = session["id"].as_str().unwrap().to_string();

    let resp = put!(app, &format!("/api/sessions/{id}/plan"), json!({ "plan_text": "   " }));
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let resp = put!(
        app,
        &format!("/api/sessions/{id}/plan"),
        json!({ "plan_text": "Open with brewing habits, then talk about price.", "topic": "loose leaf tea" })
    );
    assert_eq!(resp.status(), StatusCode::OK);
    let accepted: Value = test::read_body_json(resp).await;
    assert_eq!(accepted["status"], "plan_accepted");
    assert_eq!(accepted["topic"], "loose leaf tea");

    for _ in 0..2 {
        let resp = post!(app, &format!("/api/sessions/{id}/discussion"), json!({}));
        assert_eq!(resp.status(), StatusCode::OK);
        let discussed: Value = test::read_body_json(resp).await;
        let questions: Vec<&Value> = discussed["transcript"]
            .as_array()
            .unwrap()
            .iter()
            .filter(|e| e["type"] == "question")
            .map(|e| &e["content"])
            .collect();
        assert_eq!(questions, vec![&json!("Which tea do you brew first?")]);
    }
}
