use axum::{
    Router,
    extract::{Path, State},
    http::{StatusCode, header},
    middleware::from_fn,
    response::{IntoResponse, Json, Response},
    routing::{get, post},
};
use dashmap::DashMap;
use interview_flow::{
    Action, FlowError, FlowRunner, InMemorySessionStorage, InterviewArchive, LoadedInterviews,
    SessionStorage, StepOutcome,
};
use serde::Serialize;
use serde_json::{Value, json};
use std::sync::Arc;
use tokio::sync::RwLock;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{error, info, warn};

use crate::{
    config::Config,
    deliverables::{Deliverable, DeliverableBuilder, DeliverableKind},
    governance::{GovernanceAssessment, GovernanceValidator, SUMMARY_FILE_NAME},
    llm::CompletionService,
    spreadsheet::{XLSX_MIME, table_to_xlsx},
    telemetry::correlation_id_middleware,
    validation::LlmAnswerValidator,
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

fn conflict_error(message: &str) -> ApiError {
    (StatusCode::CONFLICT, Json(json!({ "error": message })))
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

fn flow_error(e: FlowError) -> ApiError {
    match e {
        FlowError::SessionNotFound(id) => not_found_error("Session not found", &id),
        e @ FlowError::InvalidTransition { .. } => conflict_error(&e.to_string()),
        other => {
            error!(error = %other, "interview flow failed");
            internal_error("Interview flow failed", &other.to_string())
        }
    }
}

#[derive(Clone)]
pub struct AppState {
    pub session_storage: Arc<dyn SessionStorage>,
    pub flow_runner: FlowRunner,
    pub archive: Arc<InterviewArchive>,
    pub deliverables: Arc<DeliverableBuilder>,
    pub governance: Arc<GovernanceValidator>,
    /// Last generated deliverable per kind, for spreadsheet download
    pub generated: Arc<DashMap<DeliverableKind, Deliverable>>,
    pub last_assessment: Arc<RwLock<Option<Value>>>,
}

impl AppState {
    pub fn new(config: &Config, service: Arc<dyn CompletionService>) -> Self {
        let session_storage: Arc<dyn SessionStorage> = Arc::new(InMemorySessionStorage::new());
        let archive = Arc::new(InterviewArchive::new(&config.catalogue_dir));
        let validator = Arc::new(LlmAnswerValidator::new(
            service.clone(),
            &config.validation_model,
        ));
        let flow_runner = FlowRunner::new(session_storage.clone(), validator, archive.clone());

        Self {
            session_storage,
            flow_runner,
            archive,
            deliverables: Arc::new(DeliverableBuilder::new(
                service.clone(),
                &config.deliverable_model,
            )),
            governance: Arc::new(GovernanceValidator::new(service, &config.governance_model)),
            generated: Arc::new(DashMap::new()),
            last_assessment: Arc::new(RwLock::new(None)),
        }
    }
}

pub fn create_app(config: &Config, service: Arc<dyn CompletionService>) -> Router {
    build_router(AppState::new(config, service))
}

pub fn build_router(app_state: AppState) -> Router {
    Router::new()
        .route("/", get(root))
        .route("/health", get(health_check))
        .route("/interviews", post(start_interview))
        .route("/interviews/{id}", get(get_interview))
        .route("/interviews/{id}/actions", post(apply_action))
        .route("/deliverables/{kind}", post(build_deliverable))
        .route("/deliverables/{kind}/spreadsheet", get(download_spreadsheet))
        .route("/governance", post(assess_governance))
        .route("/governance/summary", get(download_governance_summary))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .layer(from_fn(correlation_id_middleware))
        .with_state(app_state)
}

async fn root() -> Json<Value> {
    Json(json!({
        "service": "EA Interview Service",
        "version": env!("CARGO_PKG_VERSION"),
        "description": "Stakeholder interviews and enterprise-architecture deliverables",
        "endpoints": {
            "POST /interviews": "Start an interview session",
            "GET /interviews/{id}": "Get session state and transcript",
            "POST /interviews/{id}/actions": "Apply one interview action",
            "POST /deliverables/{kind}": "Build a deliverable from the archived interviews",
            "GET /deliverables/{kind}/spreadsheet": "Download the last deliverable table as xlsx",
            "POST /governance": "Run the governance assessment",
            "GET /governance/summary": "Download the last governance assessment",
            "GET /health": "Health check"
        },
        "deliverables": DeliverableKind::ALL.iter().map(|k| k.as_str()).collect::<Vec<_>>()
    }))
}

async fn health_check() -> Json<Value> {
    Json(json!({
        "status": "healthy",
        "timestamp": chrono::Utc::now().to_rfc3339()
    }))
}

async fn start_interview(State(state): State<AppState>) -> ApiResult<StepOutcome> {
    let outcome = state.flow_runner.start().await.map_err(flow_error)?;
    info!(session_id = %outcome.session_id, "interview started");
    Ok(Json(outcome))
}

async fn get_interview(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<interview_flow::Session> {
    match state.session_storage.get(&id).await {
        Ok(Some(session)) => Ok(Json(session)),
        Ok(None) => Err(not_found_error("Session not found", &id)),
        Err(e) => Err(flow_error(e)),
    }
}

fn validate_action(action: &Action) -> Result<(), ApiError> {
    match action {
        Action::SubmitName { name } if name.trim().is_empty() => {
            Err(bad_request_error("Name is required"))
        }
        Action::Answer { content } if content.trim().is_empty() => {
            Err(bad_request_error("Answer is required"))
        }
        _ => Ok(()),
    }
}

async fn apply_action(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(action): Json<Action>,
) -> ApiResult<StepOutcome> {
    validate_action(&action)?;
    info!(session_id = %id, action = ?action, "applying interview action");
    let outcome = state.flow_runner.run(&id, action).await.map_err(flow_error)?;
    Ok(Json(outcome))
}

fn parse_kind(slug: &str) -> Result<DeliverableKind, ApiError> {
    DeliverableKind::from_slug(slug)
        .ok_or_else(|| bad_request_error(&format!("Unknown deliverable kind: {}", slug)))
}

async fn load_interviews(state: &AppState) -> Result<LoadedInterviews, ApiError> {
    state.archive.load_all().await.map_err(|e| {
        error!(dir = %state.archive.dir().display(), error = %e, "failed to read interview archive");
        internal_error("Failed to read interview archive", &e.to_string())
    })
}

#[derive(Serialize)]
struct DeliverableResponse {
    #[serde(flatten)]
    deliverable: Deliverable,
    markdown: String,
}

async fn build_deliverable(
    State(state): State<AppState>,
    Path(kind): Path<String>,
) -> ApiResult<DeliverableResponse> {
    let kind = parse_kind(&kind)?;
    let loaded = load_interviews(&state).await?;
    let deliverable = state.deliverables.build(kind, &loaded).await;

    if deliverable.table().is_some() {
        state.generated.insert(kind, deliverable.clone());
    }
    Ok(Json(DeliverableResponse {
        markdown: deliverable.to_markdown(),
        deliverable,
    }))
}

fn attachment(content_type: &str, file_name: &str, body: Vec<u8>) -> Response {
    (
        [
            (header::CONTENT_TYPE, content_type.to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", file_name),
            ),
        ],
        body,
    )
        .into_response()
}

async fn download_spreadsheet(
    State(state): State<AppState>,
    Path(kind): Path<String>,
) -> Result<Response, ApiError> {
    let kind = parse_kind(&kind)?;
    let table = state
        .generated
        .get(&kind)
        .and_then(|deliverable| deliverable.table())
        .ok_or_else(|| not_found_error("No table generated for this deliverable yet", kind.as_str()))?;

    let bytes = table_to_xlsx(&table, kind.sheet_name()).map_err(|e| {
        error!(kind = %kind, error = %e, "spreadsheet export failed");
        internal_error("Spreadsheet export failed", &e.to_string())
    })?;
    info!(kind = %kind, rows = table.len(), "spreadsheet exported");
    Ok(attachment(XLSX_MIME, kind.spreadsheet_file_name(), bytes))
}

#[derive(Serialize)]
struct GovernanceResponse {
    #[serde(flatten)]
    assessment: GovernanceAssessment,
    markdown: String,
}

async fn assess_governance(State(state): State<AppState>) -> ApiResult<GovernanceResponse> {
    let loaded = load_interviews(&state).await?;
    let assessment = state.governance.assess(&loaded).await;

    if let Some(raw) = &assessment.raw {
        *state.last_assessment.write().await = Some(raw.clone());
    } else if let Some(error) = &assessment.error {
        warn!(error = %error, "governance assessment produced no scores");
    }
    Ok(Json(GovernanceResponse {
        markdown: assessment.to_markdown(),
        assessment,
    }))
}

async fn download_governance_summary(State(state): State<AppState>) -> Result<Response, ApiError> {
    let guard = state.last_assessment.read().await;
    let raw = guard
        .as_ref()
        .ok_or_else(|| not_found_error("No governance assessment yet", "governance"))?;
    let body = serde_json::to_vec_pretty(raw)
        .map_err(|e| internal_error("Failed to encode assessment", &e.to_string()))?;
    Ok(attachment("application/json", SUMMARY_FILE_NAME, body))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::{LlmError, testing::ScriptedCompletions};
    use axum::body::Body;
    use axum::http::Request;
    use clap::Parser;
    use tempfile::TempDir;
    use tower::ServiceExt;

    struct Harness {
        router: Router,
        service: Arc<ScriptedCompletions>,
        dir: TempDir,
    }

    fn harness(replies: Vec<Result<String, LlmError>>) -> Harness {
        let dir = TempDir::new().unwrap();
        let config = Config::try_parse_from([
            "ea-interview-service",
            "--catalogue-dir",
            dir.path().to_str().unwrap(),
        ])
        .unwrap();
        let service = Arc::new(ScriptedCompletions::replying(replies));
        let router = create_app(&config, service.clone());
        Harness {
            router,
            service,
            dir,
        }
    }

    async fn send(router: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Vec<u8>) {
        let builder = Request::builder().method(method).uri(uri);
        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };
        let response = router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, bytes.to_vec())
    }

    async fn send_json(router: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let (status, bytes) = send(router, method, uri, body).await;
        (status, serde_json::from_slice(&bytes).unwrap_or(Value::Null))
    }

    async fn start(router: &Router) -> String {
        let (status, body) = send_json(router, "POST", "/interviews", None).await;
        assert_eq!(status, StatusCode::OK);
        body["session_id"].as_str().unwrap().to_string()
    }

    #[tokio::test]
    async fn health_reports_healthy() {
        let h = harness(vec![]);
        let (status, body) = send_json(&h.router, "GET", "/health", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "healthy");
    }

    #[tokio::test]
    async fn requests_carry_a_correlation_id() {
        let h = harness(vec![]);
        let request = Request::builder().uri("/health").body(Body::empty()).unwrap();
        let response = h.router.clone().oneshot(request).await.unwrap();
        assert!(response.headers().contains_key("x-correlation-id"));
    }

    #[tokio::test]
    async fn new_session_starts_with_the_greeting() {
        let h = harness(vec![]);
        let (_, body) = send_json(&h.router, "POST", "/interviews", None).await;
        assert_eq!(body["stage"]["stage"], "awaiting_name");
        assert_eq!(body["messages"].as_array().unwrap().len(), 1);

        let id = body["session_id"].as_str().unwrap();
        let (status, session) = send_json(&h.router, "GET", &format!("/interviews/{}", id), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(session["id"], id);
    }

    #[tokio::test]
    async fn unknown_sessions_are_not_found() {
        let h = harness(vec![]);
        let (status, _) = send_json(&h.router, "GET", "/interviews/nope", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, _) = send_json(
            &h.router,
            "POST",
            "/interviews/nope/actions",
            Some(json!({ "type": "restart" })),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn blank_input_is_rejected() {
        let h = harness(vec![]);
        let id = start(&h.router).await;
        let uri = format!("/interviews/{}/actions", id);

        let (status, body) = send_json(
            &h.router,
            "POST",
            &uri,
            Some(json!({ "type": "submit_name", "name": "  " })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "Name is required");
    }

    #[tokio::test]
    async fn out_of_order_actions_conflict() {
        let h = harness(vec![]);
        let id = start(&h.router).await;
        let (status, _) = send_json(
            &h.router,
            "POST",
            &format!("/interviews/{}/actions", id),
            Some(json!({ "type": "finish_integrations" })),
        )
        .await;
        assert_eq!(status, StatusCode::CONFLICT);
    }

    #[tokio::test]
    async fn business_interview_to_heatmap_spreadsheet() {
        let h = harness((0..5).map(|_| Ok("✅".to_string())).collect());
        let id = start(&h.router).await;
        let uri = format!("/interviews/{}/actions", id);

        let (_, body) = send_json(
            &h.router,
            "POST",
            &uri,
            Some(json!({ "type": "submit_name", "name": "Omar" })),
        )
        .await;
        assert_eq!(body["role"], "Business Owner");

        let answers = [
            "Retail Banking",
            "- Lending\n- Payments",
            "Manual reconciliation",
            "Loan turnaround time",
            "Core banking",
        ];
        let mut last = Value::Null;
        for answer in answers {
            let (status, body) = send_json(
                &h.router,
                "POST",
                &uri,
                Some(json!({ "type": "answer", "content": answer })),
            )
            .await;
            assert_eq!(status, StatusCode::OK);
            last = body;
        }
        assert_eq!(last["complete"], true);
        assert!(last["saved_to"].is_string());
        assert_eq!(h.service.calls(), 5);
        assert_eq!(std::fs::read_dir(h.dir.path()).unwrap().count(), 1);

        let (status, _) = send(&h.router, "GET", "/deliverables/business_heatmap/spreadsheet", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, report) = send_json(&h.router, "POST", "/deliverables/business_heatmap", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(report["body"]["type"], "heatmap");
        assert_eq!(report["body"]["heatmap"]["rows"], json!(["Retail Banking"]));
        assert!(report["markdown"].as_str().unwrap().contains("Payments"));

        let (status, bytes) = send(&h.router, "GET", "/deliverables/business_heatmap/spreadsheet", None).await;
        assert_eq!(status, StatusCode::OK);
        assert!(bytes.starts_with(b"PK"));
    }

    #[tokio::test]
    async fn unknown_deliverable_kind_is_a_bad_request() {
        let h = harness(vec![]);
        let (status, _) = send_json(&h.router, "POST", "/deliverables/org_chart", None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn empty_archive_yields_warnings_only() {
        let h = harness(vec![]);
        let (status, report) = send_json(&h.router, "POST", "/deliverables/gap_analysis", None).await;
        assert_eq!(status, StatusCode::OK);
        assert!(report["body"].is_null());
        assert_eq!(report["warnings"][0], "No interview files found in the archive.");

        let (status, assessment) = send_json(&h.router, "POST", "/governance", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(assessment["warnings"][0], "No valid files found.");
        assert_eq!(h.service.calls(), 0);
    }

    #[tokio::test]
    async fn governance_summary_is_downloadable() {
        let h = harness(vec![Ok(
            "{\"TOGAF Compliance\": 80, \"Justification\": \"- Solid\"}".to_string()
        )]);
        std::fs::write(
            h.dir.path().join("ApplicationOwner_Hub_20250101_120000.json"),
            r#"{"application_name": "Hub", "stakeholder_role": "Application Owner"}"#,
        )
        .unwrap();

        let (status, _) = send(&h.router, "GET", "/governance/summary", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, assessment) = send_json(&h.router, "POST", "/governance", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(assessment["scores"][0]["band"], "Green");
        assert_eq!(assessment["bullets"], json!(["- Solid"]));

        let (status, summary) = send_json(&h.router, "GET", "/governance/summary", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(summary["TOGAF Compliance"], 80);
    }
}
