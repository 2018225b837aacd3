use std::net::SocketAddr;
use std::path::PathBuf;

use anyhow::Result;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use tower_http::cors::{Any, CorsLayer};
use tracing::info;

use crate::config::Config;
use crate::deals::{Deal, DealStatus, TalentProfile, ValueParser};
use crate::outreach::{
    draft_outreach, follow_up_tasks, FollowUpTask, OutreachDraft, OutreachTemplate, TemplateKind,
    TEMPLATES,
};
use crate::output::{render_export, ExportFormat};
use crate::pipeline::{pipeline_analytics, PipelineAnalytics, StatusChange};
use crate::query::{
    filter_deals, query_with, summarize, AnalyticsSummary, FilterSpec, QueryOptions, QueryResult,
};
use crate::source::resolve_source;
use crate::store::DealStore;

const DEFAULT_ACTIVITY_LIMIT: usize = 50;

#[derive(Clone)]
pub struct ApiState {
    config: Config,
    db_path: PathBuf,
}

impl ApiState {
    pub fn new(config: Config) -> Self {
        Self {
            db_path: config.resolved_db_path(),
            config,
        }
    }
}

#[derive(Debug, Serialize)]
struct ApiResponse<T: Serialize> {
    ok: bool,
    data: T,
}

#[derive(Debug, Serialize)]
struct ApiErrorBody {
    ok: bool,
    error: String,
}

#[derive(Debug)]
struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    fn bad_request(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: message.into(),
        }
    }

    fn not_found(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::NOT_FOUND,
            message: message.into(),
        }
    }

    fn internal(error: impl std::fmt::Display) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: error.to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = Json(ApiErrorBody {
            ok: false,
            error: self.message,
        });
        (self.status, body).into_response()
    }
}

type ApiResult<T> = std::result::Result<Json<ApiResponse<T>>, ApiError>;

/// Where a request's deals come from: inline, a named source, or the
/// configured default.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DealSetRequest {
    deals: Option<Vec<Deal>>,
    source: Option<String>,
    value_parsing: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
struct QueryRequest {
    #[serde(flatten)]
    set: DealSetRequest,
    filters: Option<serde_json::Value>,
}

#[derive(Debug, Clone, Default, Deserialize)]
struct ExportRequest {
    #[serde(flatten)]
    set: DealSetRequest,
    filters: Option<serde_json::Value>,
    format: Option<String>,
    talent: Option<TalentProfile>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct OutreachRequest {
    #[serde(flatten)]
    set: DealSetRequest,
    deal_id: String,
    template: Option<String>,
    talent: Option<TalentProfile>,
}

#[derive(Debug, Clone, Deserialize)]
struct StatusUpdateRequest {
    status: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
struct ActivityQuery {
    deal: Option<String>,
    limit: Option<usize>,
}

#[derive(Debug, Serialize)]
struct HealthResponse {
    status: &'static str,
}

#[derive(Debug, Serialize)]
struct ExportResponse {
    format: ExportFormat,
    content: String,
}

#[derive(Debug, Serialize)]
struct TemplateSummary {
    #[serde(flatten)]
    template: &'static OutreachTemplate,
    variables: Vec<&'static str>,
}

#[derive(Debug, Serialize)]
struct StatusUpdateResponse {
    deal: Deal,
    change: StatusChange,
}

#[derive(Debug, Serialize)]
struct ActivityResponse {
    changes: Vec<StatusChange>,
}

pub fn build_router(state: ApiState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health))
        .route("/v1/config", get(show_config))
        .route("/v1/query", post(query))
        .route("/v1/analytics", post(analytics))
        .route("/v1/pipeline", post(pipeline))
        .route("/v1/export", post(export))
        .route("/v1/outreach", post(outreach))
        .route("/v1/outreach/templates", get(outreach_templates))
        .route("/v1/followups", post(followups))
        .route("/v1/deals/:id/status", post(update_status))
        .route("/v1/activity", get(activity))
        .layer(cors)
        .with_state(state)
}

pub async fn run_server(config: Config, bind: SocketAddr) -> Result<()> {
    let app = build_router(ApiState::new(config));
    let listener = tokio::net::TcpListener::bind(bind).await?;
    info!("REST API listening on http://{bind}");
    axum::serve(listener, app).await?;
    Ok(())
}

async fn health() -> Json<ApiResponse<HealthResponse>> {
    ok(HealthResponse { status: "ok" })
}

async fn show_config(State(state): State<ApiState>) -> Json<ApiResponse<Config>> {
    ok(state.config)
}

async fn query(
    State(state): State<ApiState>,
    Json(request): Json<QueryRequest>,
) -> ApiResult<QueryResult> {
    let spec = parse_filters(&state, request.filters)?;
    let options = resolve_options(&state, &request.set)?;
    let deals = load_deal_set(&state, request.set).await?;
    Ok(ok(query_with(&deals, &spec, options)))
}

async fn analytics(
    State(state): State<ApiState>,
    Json(request): Json<DealSetRequest>,
) -> ApiResult<AnalyticsSummary> {
    let options = resolve_options(&state, &request)?;
    let deals = load_deal_set(&state, request).await?;
    Ok(ok(summarize(&deals, options.parser)))
}

async fn pipeline(
    State(state): State<ApiState>,
    Json(request): Json<DealSetRequest>,
) -> ApiResult<PipelineAnalytics> {
    let options = resolve_options(&state, &request)?;
    let deals = load_deal_set(&state, request).await?;
    Ok(ok(pipeline_analytics(&deals, options.parser)))
}

async fn export(
    State(state): State<ApiState>,
    Json(request): Json<ExportRequest>,
) -> ApiResult<ExportResponse> {
    let format = match request.format.as_deref() {
        Some(raw) => raw
            .parse::<ExportFormat>()
            .map_err(|error| ApiError::bad_request(error.to_string()))?,
        None => ExportFormat::default(),
    };
    let has_filters = request.filters.is_some();
    let spec = parse_filters(&state, request.filters)?;
    let options = resolve_options(&state, &request.set)?;
    let talent = request
        .talent
        .unwrap_or_else(|| state.config.talent.clone());
    let deals = load_deal_set(&state, request.set).await?;

    // Without filters the export keeps the caller's order.
    let selected = if has_filters {
        query_with(&deals, &spec, options).results
    } else {
        filter_deals(&deals, &spec, options.parser)
    };
    let content = render_export(format, &talent, &selected, options.parser, Utc::now())
        .map_err(ApiError::internal)?;
    Ok(ok(ExportResponse { format, content }))
}

async fn outreach(
    State(state): State<ApiState>,
    Json(request): Json<OutreachRequest>,
) -> ApiResult<OutreachDraft> {
    let kind = match request.template.as_deref() {
        Some(raw) => raw
            .parse::<TemplateKind>()
            .map_err(|error| ApiError::bad_request(error.to_string()))?,
        None => state.config.outreach.template,
    };
    let talent = request
        .talent
        .unwrap_or_else(|| state.config.talent.clone());
    let deal_id = request.deal_id;
    let deals = load_deal_set(&state, request.set).await?;
    let Some(deal) = deals.iter().find(|deal| deal.id == deal_id) else {
        return Err(ApiError::not_found(format!("deal not found: {deal_id}")));
    };
    let sender = state.config.outreach.sender();
    Ok(ok(draft_outreach(deal, &talent, kind, &sender)))
}

async fn outreach_templates() -> Json<ApiResponse<Vec<TemplateSummary>>> {
    let templates = TEMPLATES
        .iter()
        .map(|template| TemplateSummary {
            template,
            variables: template.variables(),
        })
        .collect();
    ok(templates)
}

async fn followups(
    State(state): State<ApiState>,
    Json(request): Json<DealSetRequest>,
) -> ApiResult<Vec<FollowUpTask>> {
    let deals = load_deal_set(&state, request).await?;
    Ok(ok(follow_up_tasks(&deals, Utc::now().date_naive())))
}

async fn update_status(
    State(state): State<ApiState>,
    Path(deal_id): Path<String>,
    Json(request): Json<StatusUpdateRequest>,
) -> ApiResult<StatusUpdateResponse> {
    let status = request
        .status
        .parse::<DealStatus>()
        .map_err(|error| ApiError::bad_request(error.to_string()))?;
    let store = open_store(&state)?;
    let Some((deal, change)) = store
        .update_status(&deal_id, status, Utc::now())
        .map_err(ApiError::internal)?
    else {
        return Err(ApiError::not_found(format!("deal not found: {deal_id}")));
    };
    info!(deal = %deal_id, from = %change.from, to = %change.to, "deal status updated");
    Ok(ok(StatusUpdateResponse { deal, change }))
}

async fn activity(
    State(state): State<ApiState>,
    Query(params): Query<ActivityQuery>,
) -> ApiResult<ActivityResponse> {
    let store = open_store(&state)?;
    let changes = store
        .load_activity(
            params.deal.as_deref(),
            params.limit.unwrap_or(DEFAULT_ACTIVITY_LIMIT),
        )
        .map_err(ApiError::internal)?;
    Ok(ok(ActivityResponse { changes }))
}

fn ok<T: Serialize>(data: T) -> Json<ApiResponse<T>> {
    Json(ApiResponse { ok: true, data })
}

fn open_store(state: &ApiState) -> std::result::Result<DealStore, ApiError> {
    DealStore::open(&state.db_path).map_err(ApiError::internal)
}

/// Missing filters fall back to the configured sort with no restrictions.
fn parse_filters(
    state: &ApiState,
    filters: Option<serde_json::Value>,
) -> std::result::Result<FilterSpec, ApiError> {
    let mut spec = FilterSpec {
        sort_by: state.config.query.sort_by,
        sort_order: state.config.query.sort_order,
        ..FilterSpec::default()
    };
    let Some(raw) = filters else {
        return Ok(spec);
    };
    let has_sort_by = raw.get("sortBy").is_some();
    let has_sort_order = raw.get("sortOrder").is_some();
    let parsed: FilterSpec = serde_json::from_value(raw)
        .map_err(|error| ApiError::bad_request(format!("invalid filters: {error}")))?;
    let configured = (spec.sort_by, spec.sort_order);
    spec = parsed;
    if !has_sort_by {
        spec.sort_by = configured.0;
    }
    if !has_sort_order {
        spec.sort_order = configured.1;
    }
    Ok(spec)
}

fn resolve_options(
    state: &ApiState,
    request: &DealSetRequest,
) -> std::result::Result<QueryOptions, ApiError> {
    let parser = match request.value_parsing.as_deref() {
        Some(raw) => raw
            .parse::<ValueParser>()
            .map_err(|error| ApiError::bad_request(error.to_string()))?,
        None => state.config.query.value_parsing,
    };
    Ok(QueryOptions { parser })
}

async fn load_deal_set(
    state: &ApiState,
    request: DealSetRequest,
) -> std::result::Result<Vec<Deal>, ApiError> {
    if let Some(deals) = request.deals {
        return Ok(deals);
    }
    let locator = request
        .source
        .unwrap_or_else(|| state.config.source.default.clone());
    let source = resolve_source(&locator, &state.config)
        .map_err(|error| ApiError::bad_request(error.to_string()))?;
    source.fetch_deals().await.map_err(ApiError::internal)
}
