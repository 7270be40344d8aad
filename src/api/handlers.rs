use axum::body::Bytes;
use axum::http::{HeaderMap, header};
use axum::{Json, extract::State};
use std::time::Instant;

use crate::data_models::SearchRequest;
use crate::report;
use crate::search::search;

use super::AppState;
use super::error::ApiError;
use super::models::{
    EchoResponse, HealthResponse, KeywordResults, SearchKeywordRequest, SearchKeywordResponse,
    StatusResponse,
};

pub async fn search_keyword_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<SearchKeywordResponse>, ApiError> {
    let start = Instant::now();
    let request = parse_search_body(&headers, &body)?;

    let keyword = match request.custom_keyword() {
        Some(custom) => custom.to_string(),
        None => state.sheet.read_keyword().await?.ok_or(ApiError::NoKeyword)?,
    };

    let urls = state.sheet.read_urls().await?;
    if urls.is_empty() {
        return Err(ApiError::NoUrls);
    }

    let request = SearchRequest::new(keyword, urls).map_err(|_| ApiError::NoKeyword)?;
    let result = search(&request, &state.search).await?;

    // only after the whole batch is in
    state.sheet.write_matches(&result.matches).await?;

    let message = report::summarize(&result);
    tracing::info!(
        elapsed_ms = start.elapsed().as_millis() as u64,
        "{message}"
    );

    Ok(Json(SearchKeywordResponse {
        status: "success",
        message,
        results: KeywordResults::from(&result),
    }))
}

/// An empty body means "use the sheet keyword". Anything else must be a valid
/// JSON request, so a broken body never reaches the sheet.
fn parse_search_body(headers: &HeaderMap, body: &[u8]) -> Result<SearchKeywordRequest, ApiError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(SearchKeywordRequest::default());
    }

    let is_json = headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(';').next())
        .map(|mime| {
            let mime = mime.trim().to_ascii_lowercase();
            mime == "application/json" || mime.ends_with("+json")
        })
        .unwrap_or(false);
    if !is_json {
        return Err(ApiError::InvalidBody(
            "expected `Content-Type: application/json`".to_string(),
        ));
    }

    Json::<SearchKeywordRequest>::from_bytes(body)
        .map(|Json(request)| request)
        .map_err(|rejection| ApiError::InvalidBody(rejection.body_text()))
}

pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        message: "Keyword search service is running",
        timestamp: chrono::Utc::now().timestamp_millis() as f64 / 1000.0,
    })
}

pub async fn hello_handler() -> Json<StatusResponse> {
    Json(StatusResponse::success("Hello from the keyword search API!"))
}

pub async fn echo_handler(Json(received): Json<serde_json::Value>) -> Json<EchoResponse> {
    Json(EchoResponse {
        received,
        status: "success",
    })
}
