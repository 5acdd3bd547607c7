// src/main.rs
// AGORA CORE - API SERVER
// Serves the focus group engine via REST API (Actix-Web)

use actix_cors::Cors;
use actix_web::{web, App, HttpServer};
use agora_core::api::{self, AppState};
use agora_core::brain::{DisabledBrain, GenerationService, OpenAiBrain};
use agora_core::config::AppConfig;
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

fn main() -> std::io::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("agora_core=info,actix_web=info")),
        )
        .init();

    let config = AppConfig::from_env();

    // The blocking HTTP client has to be built outside the async runtime.
    let brain: Arc<dyn GenerationService> = if config.generation.enabled() {
        match OpenAiBrain::new(config.generation.clone()) {
            Ok(brain) => {
                info!(model = %config.generation.model, "generation service enabled");
                Arc::new(brain)
            }
            Err(e) => {
                warn!(error = %e, "could not build generation client, running heuristics only");
                Arc::new(DisabledBrain)
            }
        }
    } else {
        info!("no generation service configured, running heuristics only");
        Arc::new(DisabledBrain)
    };

    let bind = (config.server.bind.clone(), config.server.port);
    let app_state = web::Data::new(AppState::new(brain, config));

    info!(address = %bind.0, port = bind.1, "agora API server starting");

    actix_web::rt::System::new().block_on(async move {
        HttpServer::new(move || {
            App::new()
                .wrap(Cors::permissive())
                .app_data(app_state.clone())
                .configure(api::configure)
        })
        .bind(bind)?
        .run()
        .await
    })
}
