// Report routes: analyze, history, analytics, PDF export.
use crate::analytics::summarize;
use crate::api::errors::{error_response, error_response_with_code};
use crate::export::render_report_pdf;
use crate::orchestrator::{RunContext, RunError};
use crate::pdf_text::UploadedDocument;
use crate::state::AppState;
use axum::extract::{DefaultBodyLimit, Multipart, Path, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::{json, Value};
use std::sync::Arc;

const MAX_ANALYZE_UPLOAD_BYTES: usize = 50 * 1024 * 1024;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route(
            "/synapse/analyze",
            post(analyze).layer(DefaultBodyLimit::max(MAX_ANALYZE_UPLOAD_BYTES)),
        )
        .route("/synapse/reports", get(list_reports))
        .route("/synapse/reports/{id}/export", get(export_report))
        .route("/synapse/analytics", get(analytics_view))
}

/// One synchronous analysis run over the multipart form: optional `text`
/// part, any number of PDF `file` parts, optional `api_key` override.
async fn analyze(
    State(state): State<Arc<AppState>>,
    mut multipart: Multipart,
) -> Result<Json<Value>, Response> {
    let ctx = read_run_context(&mut multipart).await?;
    match state.orchestrator.run(ctx).await {
        Ok(outcome) => Ok(Json(json!({ "ok": true, "report": outcome }))),
        Err(err @ RunError::EmptyCorpus) => Err(error_response_with_code(
            StatusCode::BAD_REQUEST,
            Some("EMPTY_CORPUS"),
            err.to_string(),
        )),
        Err(err) => Err(error_response(
            StatusCode::INTERNAL_SERVER_ERROR,
            err.to_string(),
        )),
    }
}

async fn read_run_context(multipart: &mut Multipart) -> Result<RunContext, Response> {
    let mut ctx = RunContext::default();
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|err| error_response(StatusCode::BAD_REQUEST, err.to_string()))?
    {
        let name = field.name().unwrap_or("").to_string();
        if field.file_name().is_some() || name == "file" {
            let file_name = field.file_name().unwrap_or("upload.pdf").to_string();
            let data = field
                .bytes()
                .await
                .map_err(|err| error_response(StatusCode::BAD_REQUEST, err.to_string()))?;
            ctx.documents.push(UploadedDocument {
                name: file_name,
                data: data.to_vec(),
            });
        } else if name == "text" {
            ctx.pasted_text = field
                .text()
                .await
                .map_err(|err| error_response(StatusCode::BAD_REQUEST, err.to_string()))?;
        } else if name == "api_key" {
            let value = field
                .text()
                .await
                .map_err(|err| error_response(StatusCode::BAD_REQUEST, err.to_string()))?;
            let value = value.trim().to_string();
            if !value.is_empty() {
                ctx.api_key = Some(value);
            }
        }
    }
    Ok(ctx)
}

async fn list_reports(State(state): State<Arc<AppState>>) -> Result<Json<Value>, Response> {
    let reports = state
        .storage
        .fetch_reports()
        .map_err(|err| error_response(StatusCode::INTERNAL_SERVER_ERROR, err.to_string()))?;
    Ok(Json(json!({ "ok": true, "reports": reports })))
}

async fn export_report(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<Response, Response> {
    let record = state
        .storage
        .fetch_report(id)
        .map_err(|err| error_response(StatusCode::INTERNAL_SERVER_ERROR, err.to_string()))?
        .ok_or_else(|| {
            error_response_with_code(
                StatusCode::NOT_FOUND,
                Some("REPORT_NOT_FOUND"),
                format!("no stored report with id {id}"),
            )
        })?;
    let bytes = render_report_pdf(&record);
    let headers = [
        (header::CONTENT_TYPE, "application/pdf".to_string()),
        (
            header::CONTENT_DISPOSITION,
            format!("attachment; filename=\"synapse-report-{id}.pdf\""),
        ),
    ];
    Ok((headers, bytes).into_response())
}

async fn analytics_view(State(state): State<Arc<AppState>>) -> Result<Json<Value>, Response> {
    let reports = state
        .storage
        .fetch_reports()
        .map_err(|err| error_response(StatusCode::INTERNAL_SERVER_ERROR, err.to_string()))?;
    Ok(Json(json!({ "ok": true, "analytics": summarize(&reports) })))
}
