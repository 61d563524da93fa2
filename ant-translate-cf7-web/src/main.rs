use axum::{
    Json, Router,
    extract::{State, rejection::JsonRejection},
    http::StatusCode,
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

use ant_translate_cf7::{
    Collaborators, Hook, HostRequest, HtmlTranslator, PlainTranslator, RequestPipeline, Settings,
    StaticLanguages, TextNodeTranslator,
};

#[derive(Debug, Serialize, Deserialize)]
pub struct Stage {
    pub hook: Hook,
    pub payload: Value,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct PipelineRequest {
    #[serde(default)]
    pub request: HostRequest,
    /// Language of the page; unknown when absent
    #[serde(default)]
    pub current_language: Option<String>,
    pub stages: Vec<Stage>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct PipelineResponse {
    pub translate: bool,
    pub results: Vec<Value>,
}

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
}

#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

#[derive(Clone)]
pub struct AppState {
    pub settings: Arc<Settings>,
    pub plain: Option<Arc<dyn PlainTranslator>>,
    pub html: Option<Arc<dyn HtmlTranslator>>,
}

impl AppState {
    pub fn new(settings: Settings, plain: Option<Arc<dyn PlainTranslator>>) -> Self {
        let html = plain
            .clone()
            .map(|p| Arc::new(TextNodeTranslator::new(p)) as Arc<dyn HtmlTranslator>);
        AppState {
            settings: Arc::new(settings),
            plain,
            html,
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive("info".parse()?),
        )
        .init();

    let settings = Settings::from_env()
        .map_err(|e| format!("Failed to load settings: {}", e))?;
    let plain = settings
        .load_dictionary()?
        .map(|d| Arc::new(d) as Arc<dyn PlainTranslator>);
    let bind = settings.bind.clone();

    info!(
        target_language = %settings.target_language,
        translator = plain.as_ref().map(|p| p.provider_name()).unwrap_or("none"),
        "Starting ANT Translate CF7 host"
    );

    let app = app(AppState::new(settings, plain));

    let listener = tokio::net::TcpListener::bind(&bind).await?;
    info!("Listening on http://{}", bind);

    axum::serve(listener, app).await?;

    Ok(())
}

fn app(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/api/pipeline", post(run_pipeline))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: ant_translate_cf7::VERSION,
    })
}

async fn run_pipeline(
    State(state): State<AppState>,
    body: Result<Json<PipelineRequest>, JsonRejection>,
) -> Result<Json<PipelineResponse>, (StatusCode, Json<ErrorResponse>)> {
    let Json(body) = body.map_err(|e| {
        (
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse {
                error: format!("Invalid pipeline request: {}", e.body_text()),
            }),
        )
    })?;

    let target = &state.settings.target_language;
    let current = body.current_language.as_deref().unwrap_or_default();
    let languages = StaticLanguages::new(current, target);

    // One pipeline per HTTP request; nothing survives into the next call
    let mut pipeline = RequestPipeline::new(
        &body.request,
        Collaborators {
            plain: state.plain.as_deref(),
            html: state.html.as_deref(),
            languages: Some(&languages),
        },
    );

    let translate = pipeline.is_enabled();
    let results: Vec<Value> = body
        .stages
        .into_iter()
        .map(|stage| pipeline.apply(stage.hook, stage.payload))
        .collect();

    info!(
        translate,
        stages = results.len(),
        reason = ?ant_translate_cf7::classify(pipeline.context()),
        "pipeline run"
    );

    Ok(Json(PipelineResponse { translate, results }))
}
