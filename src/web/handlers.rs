//! HTTP request handlers

use super::state::AppState;
use crate::error::SearchError;
use crate::results::{csv_filename, to_csv, NormalizedTable, SearchOutcome};
use axum::{
    extract::{Query, State},
    http::{header, StatusCode},
    response::{Html, IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use tera::Context;

/// Query parameters for search
#[derive(Debug, Deserialize)]
pub struct SearchParams {
    /// Domain to search for
    pub domain: Option<String>,
    /// Output format (html, json, csv)
    pub format: Option<String>,
}

/// Search results response for JSON format
#[derive(Debug, Serialize)]
pub struct SearchResponse {
    pub search_id: String,
    pub domain: String,
    pub searched_at: String,
    pub elapsed_ms: u64,
    pub partitions_searched: usize,
    pub number_of_results: usize,
    pub columns: Vec<String>,
    pub rows: Vec<Vec<String>>,
    pub faults: Vec<crate::error::PartitionFault>,
}

impl SearchResponse {
    fn new(outcome: &SearchOutcome, table: NormalizedTable) -> Self {
        Self {
            search_id: outcome.search_id.to_string(),
            domain: outcome.query.clone(),
            searched_at: outcome.searched_at.to_rfc3339(),
            elapsed_ms: outcome.elapsed_ms,
            partitions_searched: outcome.partitions_searched,
            number_of_results: table.len(),
            columns: table.columns().to_vec(),
            rows: table.rows().to_vec(),
            faults: outcome.faults().to_vec(),
        }
    }
}

/// HTTP status for a search that did not produce an outcome
fn error_status(err: &SearchError) -> StatusCode {
    match err {
        SearchError::InvalidInput { .. } => StatusCode::BAD_REQUEST,
        SearchError::Catalog(_) => StatusCode::BAD_GATEWAY,
        SearchError::Infrastructure(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

/// User-facing text for a search error
fn error_message(err: &SearchError) -> String {
    match err {
        SearchError::InvalidInput { reason, .. } => reason.clone(),
        other => other.to_string(),
    }
}

fn base_context(state: &AppState) -> Context {
    let mut ctx = Context::new();
    ctx.insert("instance_name", state.instance_name());
    ctx.insert("page_title", &state.settings.general.page_title);
    ctx
}

fn render(state: &AppState, template: &str, ctx: &Context, status: StatusCode) -> Response {
    match state.templates.render_with_context(template, ctx) {
        Ok(html) => (status, Html(html)).into_response(),
        Err(e) => {
            tracing::error!("Template error: {}", e);
            (StatusCode::INTERNAL_SERVER_ERROR, "Template error").into_response()
        }
    }
}

/// Home page handler
pub async fn index(State(state): State<AppState>) -> Response {
    let ctx = base_context(&state);
    render(&state, "index.html", &ctx, StatusCode::OK)
}

/// Search handler
pub async fn search(
    State(state): State<AppState>,
    Query(params): Query<SearchParams>,
) -> Response {
    let raw = params.domain.unwrap_or_default();
    let result = state.search.search_domain(&raw).await;

    match params.format.as_deref() {
        Some("json") => json_response(&state, result),
        Some("csv") => csv_response(&state, result),
        _ => html_response(&state, raw.trim(), result),
    }
}

fn json_response(state: &AppState, result: Result<SearchOutcome, SearchError>) -> Response {
    match result {
        Ok(outcome) => {
            let table = outcome.normalize(state.column_order());
            Json(SearchResponse::new(&outcome, table)).into_response()
        }
        Err(e) => (
            error_status(&e),
            Json(serde_json::json!({ "error": error_message(&e) })),
        )
            .into_response(),
    }
}

fn csv_response(state: &AppState, result: Result<SearchOutcome, SearchError>) -> Response {
    match result {
        Ok(outcome) => {
            let table = outcome.normalize(state.column_order());
            let filename = csv_filename(&outcome.query, &state.settings.search.export_suffix);
            (
                [
                    (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
                    (
                        header::CONTENT_DISPOSITION,
                        format!("attachment; filename=\"{}\"", filename),
                    ),
                ],
                to_csv(&table),
            )
                .into_response()
        }
        Err(e) => (error_status(&e), error_message(&e)).into_response(),
    }
}

fn html_response(
    state: &AppState,
    domain: &str,
    result: Result<SearchOutcome, SearchError>,
) -> Response {
    let mut ctx = base_context(state);
    ctx.insert("domain", domain);

    let status = match result {
        Ok(outcome) => {
            let table = outcome.normalize(state.column_order());
            let faults: Vec<String> = outcome.faults().iter().map(|f| f.to_string()).collect();

            ctx.insert("state", if table.is_empty() { "empty" } else { "results" });
            ctx.insert("count", &table.len());
            ctx.insert("columns", table.columns());
            ctx.insert("rows", table.rows());
            ctx.insert("faults", &faults);
            ctx.insert(
                "csv_url",
                &format!(
                    "/search?domain={}&format=csv",
                    urlencoding::encode(&outcome.query)
                ),
            );
            StatusCode::OK
        }
        Err(e @ SearchError::InvalidInput { .. }) => {
            ctx.insert("state", "warning");
            ctx.insert("message", &error_message(&e));
            StatusCode::OK
        }
        Err(e) => {
            ctx.insert("state", "error");
            ctx.insert("message", &error_message(&e));
            error_status(&e)
        }
    };

    render(state, "search.html", &ctx, status)
}

/// About page handler
pub async fn about(State(state): State<AppState>) -> Response {
    let mut ctx = base_context(&state);
    ctx.insert("version", crate::VERSION);
    ctx.insert("database", &state.settings.store.database);
    ctx.insert("max_workers", &state.search.max_workers());
    render(&state, "about.html", &ctx, StatusCode::OK)
}

/// Stats page handler
pub async fn stats(State(state): State<AppState>) -> Response {
    let mut ctx = base_context(&state);
    ctx.insert("total_searches", &state.metrics.get_total_searches());
    ctx.insert("partitions", &state.metrics.get_all_stats());
    render(&state, "stats.html", &ctx, StatusCode::OK)
}

/// Health check handler
pub async fn health() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ok",
        "version": crate::VERSION
    }))
}

/// Robots.txt handler
pub async fn robots_txt() -> impl IntoResponse {
    (
        [(header::CONTENT_TYPE, "text/plain")],
        "User-agent: *\nDisallow: /\n",
    )
}

/// Favicon handler
pub async fn favicon() -> impl IntoResponse {
    StatusCode::NO_CONTENT
}
