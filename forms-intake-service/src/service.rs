use axum::{
    Router,
    extract::{Path as AxumPath, State},
    http::{StatusCode, header},
    response::{IntoResponse, Json, Response},
    routing::{get, post},
};
use intake_flow::{ExecutionStatus, FlowRunner, SessionStorage};
use serde_json::{Value, json};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{error, info};

use crate::{
    classify,
    extract::TextExtractor,
    fields,
    models::{
        ChatRequest, ChatResponse, CollectorState, FieldSet, FormKind, SessionStatusResponse,
        ValidateRequest, ValidationReport,
    },
    reconcile,
    schema::{FormSchemas, form_info},
    tasks::session_keys,
    workflow::{create_chat_session, create_flow_runner},
};

type ApiResult<T> = Result<Json<T>, (StatusCode, Json<Value>)>;
type ApiError = (StatusCode, Json<Value>);

fn bad_request_error(message: &str) -> ApiError {
    (StatusCode::BAD_REQUEST, Json(json!({ "error": message })))
}

fn not_found_error(message: &str, id: &str) -> ApiError {
    (
        StatusCode::NOT_FOUND,
        Json(json!({
            "error": message,
            "id": id
        })),
    )
}

fn internal_error(message: &str, details: &str) -> ApiError {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(json!({
            "error": message,
            "details": details
        })),
    )
}

#[derive(Clone)]
pub struct AppState {
    pub session_storage: Arc<dyn SessionStorage>,
    pub flow_runner: FlowRunner,
    pub extractor: Arc<TextExtractor>,
    pub output_dir: String,
}

pub fn create_app(
    schemas: Arc<FormSchemas>,
    session_storage: Arc<dyn SessionStorage>,
    extractor: Arc<TextExtractor>,
    output_dir: String,
) -> Router {
    let flow_runner = create_flow_runner(schemas, session_storage.clone());
    let app_state = AppState {
        session_storage,
        flow_runner,
        extractor,
        output_dir,
    };
    build_router(app_state)
}

fn build_router(app_state: AppState) -> Router {
    Router::new()
        .route("/", get(root))
        .route("/health", get(health_check))
        .route("/intake/validate", post(validate_documents))
        .route("/chat", post(chat))
        .route("/chat/{session_id}", get(get_chat_session))
        .route("/chat/{session_id}/document", get(download_document))
        .route("/forms/{kind}", get(get_form_info))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(app_state)
}

async fn root() -> Json<Value> {
    Json(json!({
        "service": "Regulatory Form Intake Service",
        "version": "0.1.0",
        "description": "Classifies uploaded regulatory forms, cross-checks them against supporting files, and fills forms conversationally",
        "endpoints": {
            "POST /intake/validate": "Classify a form, extract fields from it and its supporting files, and reconcile them",
            "POST /chat": "One turn of the conversational form-filling flow",
            "GET /chat/{session_id}": "Collector session status and transcript",
            "GET /chat/{session_id}/document": "Download the generated filled form",
            "GET /forms/{kind}": "Discovery metadata for a form kind",
            "GET /health": "Health check"
        }
    }))
}

async fn health_check() -> Json<Value> {
    Json(json!({
        "status": "healthy",
        "timestamp": chrono::Utc::now().to_rfc3339()
    }))
}

async fn validate_documents(
    State(state): State<AppState>,
    Json(request): Json<ValidateRequest>,
) -> ApiResult<ValidationReport> {
    if request.form_path.trim().is_empty() {
        return Err(bad_request_error("form_path is required"));
    }

    info!(
        form_path = %request.form_path,
        support_files = request.support_paths.len(),
        "starting intake validation"
    );

    // Extraction handles its own OCR fallback and never fails; empty text
    // simply classifies as unknown.
    let raw_text = state
        .extractor
        .extract(Path::new(&request.form_path))
        .await;

    let normalized = classify::normalize(&raw_text);
    let detected = classify::classify(&normalized);

    let form_fields = fields::extract_form_fields(&raw_text);

    let support_paths: Vec<PathBuf> = request.support_paths.iter().map(PathBuf::from).collect();
    let (support_fields, support_files) =
        tokio::task::spawn_blocking(move || fields::extract_support_fields(&support_paths))
            .await
            .map_err(|e| internal_error("support file scan failed", &e.to_string()))?;

    let mismatches = reconcile::reconcile(&form_fields, &support_fields);

    // Seed a collector session with the form-side extraction so a follow-up
    // chat can skip already-known fields.
    let session = create_chat_session(&state.output_dir, Some(form_fields.clone())).await;
    let session_id = session.id.clone();
    state.session_storage.save(session).await.map_err(|e| {
        error!("failed to create session: {}", e);
        internal_error("failed to create intake session", &e.to_string())
    })?;

    let report = ValidationReport {
        session_id,
        detected_form: detected
            .map(|kind| kind.label().to_string())
            .unwrap_or_else(|| "unknown".to_string()),
        form_fields,
        support_fields,
        support_files,
        consistent: mismatches.is_empty(),
        mismatches,
    };

    info!(
        detected_form = %report.detected_form,
        mismatches = report.mismatches.len(),
        "intake validation finished"
    );

    Ok(Json(report))
}

async fn chat(
    State(state): State<AppState>,
    Json(request): Json<ChatRequest>,
) -> ApiResult<ChatResponse> {
    if request.content.trim().is_empty() {
        return Err(bad_request_error("content cannot be empty"));
    }

    let session = match &request.session_id {
        Some(id) => match state.session_storage.get(id).await {
            Ok(Some(session)) => session,
            Ok(None) => {
                return Err(not_found_error("session not found", id));
            }
            Err(e) => {
                error!(session_id = %id, "failed to load session: {}", e);
                return Err(internal_error("failed to load session", &e.to_string()));
            }
        },
        None => {
            let session = create_chat_session(&state.output_dir, None).await;
            info!(session_id = %session.id, "created new chat session");
            session
        }
    };
    let session_id = session.id.clone();

    session
        .context
        .set(session_keys::USER_INPUT, request.content)
        .await;
    session
        .context
        .set(session_keys::SESSION_ID, session_id.clone())
        .await;

    // Persist the input so the runner's load sees it, even for storage
    // implementations that do not share context between clones.
    if let Err(e) = state.session_storage.save(session).await {
        error!("failed to save session: {}", e);
        return Err(internal_error("failed to save session", &e.to_string()));
    }

    let result = match state.flow_runner.run(&session_id).await {
        Ok(result) => result,
        Err(e) => {
            error!(session_id = %session_id, "failed to execute chat turn: {}", e);
            return Err(internal_error("failed to execute chat turn", &e.to_string()));
        }
    };

    let status = match result.status {
        ExecutionStatus::WaitingForInput => "waiting_for_input",
        ExecutionStatus::Completed => "completed",
    };

    Ok(Json(ChatResponse {
        session_id,
        response: result.response,
        status: status.to_string(),
    }))
}

async fn get_chat_session(
    State(state): State<AppState>,
    AxumPath(session_id): AxumPath<String>,
) -> ApiResult<SessionStatusResponse> {
    let session = match state.session_storage.get(&session_id).await {
        Ok(Some(session)) => session,
        Ok(None) => return Err(not_found_error("session not found", &session_id)),
        Err(e) => {
            error!(session_id = %session_id, "failed to load session: {}", e);
            return Err(internal_error("failed to load session", &e.to_string()));
        }
    };

    let collector_state: CollectorState = session
        .context
        .get(session_keys::COLLECTOR_STATE)
        .await
        .unwrap_or(CollectorState::NoFormSelected);
    let form_kind: Option<FormKind> = session.context.get(session_keys::FORM_KIND).await;
    let answers: Vec<(String, String)> = session
        .context
        .get(session_keys::ANSWERS)
        .await
        .unwrap_or_default();
    let artifact_ready: bool = session
        .context
        .get(session_keys::ARTIFACT_READY)
        .await
        .unwrap_or(false);

    let mut context_map = std::collections::HashMap::new();
    if let Some(auto) = session
        .context
        .get::<FieldSet>(session_keys::AUTO_EXTRACTED)
        .await
    {
        context_map.insert(
            "auto_extracted".to_string(),
            serde_json::to_value(&auto).unwrap_or(Value::Null),
        );
    }

    Ok(Json(SessionStatusResponse {
        session_id: session.id.clone(),
        collector_state,
        form_kind: form_kind.map(|kind| kind.label().to_string()),
        answers,
        transcript: session.context.history(),
        artifact_ready,
        status_message: session.status_message.clone(),
        context: context_map,
    }))
}

async fn download_document(
    State(state): State<AppState>,
    AxumPath(session_id): AxumPath<String>,
) -> Result<Response, ApiError> {
    let session = match state.session_storage.get(&session_id).await {
        Ok(Some(session)) => session,
        Ok(None) => return Err(not_found_error("session not found", &session_id)),
        Err(e) => {
            error!(session_id = %session_id, "failed to load session: {}", e);
            return Err(internal_error("failed to load session", &e.to_string()));
        }
    };

    let artifact_ready: bool = session
        .context
        .get(session_keys::ARTIFACT_READY)
        .await
        .unwrap_or(false);
    let artifact_path: Option<String> = session.context.get(session_keys::ARTIFACT_PATH).await;

    let (Some(path), true) = (artifact_path, artifact_ready) else {
        return Err(not_found_error(
            "generated document not found",
            &session_id,
        ));
    };

    let bytes = match tokio::fs::read(&path).await {
        Ok(bytes) => bytes,
        Err(e) => {
            error!(session_id = %session_id, path = %path, "artifact file missing: {}", e);
            return Err(not_found_error(
                "generated document not found",
                &session_id,
            ));
        }
    };

    let kind: Option<FormKind> = session.context.get(session_keys::FORM_KIND).await;
    let filename = kind
        .map(|k| format!("{}_filled.pdf", k.slug()))
        .unwrap_or_else(|| "form_filled.pdf".to_string());

    let headers = [
        (header::CONTENT_TYPE, "application/pdf".to_string()),
        (
            header::CONTENT_DISPOSITION,
            format!("attachment; filename=\"{}\"", filename),
        ),
    ];

    Ok((headers, bytes).into_response())
}

async fn get_form_info(AxumPath(kind): AxumPath<String>) -> ApiResult<Value> {
    match FormKind::parse(&kind) {
        Some(kind) => Ok(Json(json!({
            "form": kind.label(),
            "info": form_info(kind),
        }))),
        None => Err(not_found_error("unknown form kind", &kind)),
    }
}
