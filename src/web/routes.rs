use axum::{
    extract::{
        rejection::{FormRejection, QueryRejection},
        Query, State,
    },
    http::StatusCode,
    response::{Html, IntoResponse, Response},
    Form,
};
use serde::Deserialize;
use std::sync::Arc;
use tracing::{debug, warn};

use super::AppState;
use crate::pipeline;
use crate::report::html;

/// Form fields posted by the landing page.
#[derive(Debug, Deserialize)]
pub struct AnalyzeForm {
    pub repo_url: String,
    pub issue_number: u64,
}

/// Query string of pagination and issue links.
#[derive(Debug, Deserialize)]
pub struct AnalyzeQuery {
    pub repo_url: String,
    pub issue_number: u64,
    #[serde(default = "first_page")]
    pub page: u32,
}

fn first_page() -> u32 {
    1
}

/// Handler: GET /
pub async fn index() -> Html<String> {
    Html(html::render_index(None))
}

/// Handler: POST /analyze. Always starts at page 1.
pub async fn analyze_form(
    State(state): State<Arc<AppState>>,
    form: Result<Form<AnalyzeForm>, FormRejection>,
) -> Response {
    match form {
        Ok(Form(form)) => render(&state, &form.repo_url, form.issue_number, 1).await,
        Err(rejection) => bad_request(&rejection.body_text()),
    }
}

/// Handler: GET /analyze?repo_url=..&issue_number=..&page=..
pub async fn analyze_query(
    State(state): State<Arc<AppState>>,
    query: Result<Query<AnalyzeQuery>, QueryRejection>,
) -> Response {
    match query {
        Ok(Query(query)) => render(&state, &query.repo_url, query.issue_number, query.page).await,
        Err(rejection) => bad_request(&rejection.body_text()),
    }
}

async fn render(state: &AppState, repo_url: &str, issue_number: u64, page: u32) -> Response {
    match pipeline::run(&state.github, &state.analyzer, repo_url, issue_number, page).await {
        Ok(dashboard) => Html(html::render_dashboard(&dashboard)).into_response(),
        Err(view) => Html(html::render_error(&view)).into_response(),
    }
}

fn bad_request(reason: &str) -> Response {
    warn!(reason, "rejected analyze request");
    debug!("re-rendering index with error");
    (
        StatusCode::BAD_REQUEST,
        Html(html::render_index(Some(&format!("Invalid request: {reason}")))),
    )
        .into_response()
}
