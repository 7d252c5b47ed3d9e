//! HTTP request handlers.

use axum::{
    extract::{
        rejection::{FormRejection, JsonRejection},
        State,
    },
    http::StatusCode,
    response::{Html, IntoResponse, Redirect, Response},
    routing::{get, post},
    Form, Json, Router,
};
use serde::{Deserialize, Deserializer};
use tracing::warn;

use super::{render, AppState};
use crate::domain::{PipelineFailure, PipelineOutcome, PipelineRequest};

/// Build all routes
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(index))
        .route("/submit-log", post(submit_log))
        .route("/integrate", post(integrate))
        .route("/health", get(health_check))
}

/// Form body of `/submit-log`
#[derive(Debug, Deserialize)]
pub struct SubmitLogForm {
    #[serde(default)]
    pub log: Option<String>,
}

/// JSON body of `/integrate`
#[derive(Debug, Deserialize)]
pub struct IntegrateBody {
    #[serde(default)]
    pub text: Option<String>,
    /// `None` when the field is absent, `Some(None)` for an explicit null
    #[serde(default, deserialize_with = "present")]
    pub entities: Option<Option<Vec<String>>>,
    #[serde(default)]
    pub language: Option<String>,
}

/// Marks a field as present even when its value is null
fn present<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    T::deserialize(deserializer).map(Some)
}

async fn index() -> Html<String> {
    Html(render::page(None))
}

async fn submit_log(
    State(state): State<AppState>,
    form: Result<Form<SubmitLogForm>, FormRejection>,
) -> Response {
    let Some(log) = form
        .ok()
        .and_then(|Form(form)| form.log)
        .filter(|log| !log.is_empty())
    else {
        return Redirect::to("/").into_response();
    };

    let request = PipelineRequest::new(log).with_language(state.default_language());
    let outcome = state.orchestrator.run(&request).await;

    (
        status_of(&outcome),
        Html(render::page(Some((request.text.as_str(), &outcome)))),
    )
        .into_response()
}

async fn integrate(
    State(state): State<AppState>,
    body: Result<Json<IntegrateBody>, JsonRejection>,
) -> Response {
    let body = match body {
        Ok(Json(body)) => body,
        Err(rejection) => {
            warn!(error = %rejection.body_text(), "Rejected /integrate body");
            return invalid_body(rejection.body_text());
        }
    };

    let entities = match body.entities {
        Some(None) => {
            warn!("Rejected /integrate body with null entities");
            return invalid_body("entities must be a list of entity types, not null");
        }
        Some(Some(entities)) => Some(entities),
        None => None,
    };

    let request = PipelineRequest::from_parts(
        body.text,
        entities,
        body.language,
        state.default_language(),
    );
    let outcome = state.orchestrator.run(&request).await;

    (status_of(&outcome), Json(outcome)).into_response()
}

async fn health_check() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

fn invalid_body(details: impl Into<String>) -> Response {
    let failure = PipelineFailure::invalid_body(details);
    (StatusCode::BAD_REQUEST, Json(failure)).into_response()
}

fn status_of(outcome: &PipelineOutcome) -> StatusCode {
    StatusCode::from_u16(outcome.http_status()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
}
