use serde::{Deserialize, Serialize};

use crate::data_models::SearchResult;

#[derive(Debug, Default, Deserialize)]
pub struct SearchKeywordRequest {
    #[serde(default)]
    pub keyword: Option<String>,
    #[serde(default)]
    pub use_custom: bool,
}

impl SearchKeywordRequest {
    /// The custom keyword, if the caller asked for it and it is not blank.
    pub fn custom_keyword(&self) -> Option<&str> {
        if !self.use_custom {
            return None;
        }
        self.keyword
            .as_deref()
            .map(str::trim)
            .filter(|k| !k.is_empty())
    }
}

#[derive(Debug, Serialize)]
pub struct SearchKeywordResponse {
    pub status: &'static str,
    pub message: String,
    pub results: KeywordResults,
}

#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct KeywordResults {
    pub keyword: String,
    pub total_urls: usize,
    pub matches_found: usize,
    pub success_rate: f64,
    pub urls_with_keyword: Vec<String>,
    pub failed_checks: usize,
    pub failed_urls: Vec<String>,
}

impl From<&SearchResult> for KeywordResults {
    fn from(result: &SearchResult) -> Self {
        KeywordResults {
            keyword: result.keyword.clone(),
            total_urls: result.total_urls,
            matches_found: result.matches_found(),
            success_rate: result.success_rate,
            urls_with_keyword: result.matches.clone(),
            failed_checks: result.failed_checks,
            failed_urls: result.failures.iter().map(|f| f.url.clone()).collect(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct StatusResponse {
    pub status: &'static str,
    pub message: String,
}

impl StatusResponse {
    pub fn success(message: impl Into<String>) -> Self {
        StatusResponse {
            status: "success",
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        StatusResponse {
            status: "error",
            message: message.into(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub message: &'static str,
    pub timestamp: f64,
}

#[derive(Debug, Serialize)]
pub struct EchoResponse {
    pub received: serde_json::Value,
    pub status: &'static str,
}
