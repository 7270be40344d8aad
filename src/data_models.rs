use std::collections::BTreeMap;

use serde::Serialize;
use thiserror::Error;

use crate::report;

/// A keyword plus the URLs to look for it in. Duplicate URLs are kept.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchRequest {
    keyword: String,
    urls: Vec<String>,
}

#[derive(Debug, Error, PartialEq)]
#[error("keyword must not be empty")]
pub struct EmptyKeyword;

impl SearchRequest {
    pub fn new(keyword: impl Into<String>, urls: Vec<String>) -> Result<SearchRequest, EmptyKeyword> {
        let keyword = keyword.into().trim().to_string();
        if keyword.is_empty() {
            return Err(EmptyKeyword);
        }
        Ok(SearchRequest { keyword, urls })
    }

    pub fn keyword(&self) -> &str {
        &self.keyword
    }

    pub fn urls(&self) -> &[String] {
        &self.urls
    }
}

/// Why a single URL check did not produce a verdict.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum FetchFailure {
    #[error("connection error: {0}")]
    Connect(String),
    #[error("request timed out")]
    Timeout,
    #[error("HTTP status {0}")]
    HttpStatus(u16),
    #[error("failed to read response body: {0}")]
    Body(String),
    #[error("request error: {0}")]
    Request(String),
    #[error("worker failed: {0}")]
    Worker(String),
}

impl FetchFailure {
    /// Short label used as a diagnostics counter key.
    pub fn kind(&self) -> &'static str {
        match self {
            FetchFailure::Connect(_) => "connect",
            FetchFailure::Timeout => "timeout",
            FetchFailure::HttpStatus(_) => "http_status",
            FetchFailure::Body(_) => "body",
            FetchFailure::Request(_) => "request",
            FetchFailure::Worker(_) => "worker",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum FetchOutcome {
    Matched(String),
    NotMatched,
    Failed(FetchFailure),
}

/// A URL whose check failed, kept for diagnostics.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FailedCheck {
    pub url: String,
    pub kind: &'static str,
    pub reason: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchResult {
    pub keyword: String,
    pub total_urls: usize,
    /// Completion order of the workers, not input order.
    pub matches: Vec<String>,
    pub success_rate: f64,
    pub failed_checks: usize,
    pub failure_reasons: BTreeMap<String, usize>,
    /// Completion order, like `matches`.
    pub failures: Vec<FailedCheck>,
}

impl SearchResult {
    pub fn empty(keyword: impl Into<String>) -> SearchResult {
        SearchResult {
            keyword: keyword.into(),
            total_urls: 0,
            matches: Vec::new(),
            success_rate: 0.0,
            failed_checks: 0,
            failure_reasons: BTreeMap::new(),
            failures: Vec::new(),
        }
    }

    /// Fold `(url, outcome)` pairs into a result. `total_urls` is the number of URLs submitted.
    pub fn from_outcomes<I>(keyword: impl Into<String>, total_urls: usize, outcomes: I) -> SearchResult
    where
        I: IntoIterator<Item = (String, FetchOutcome)>,
    {
        let mut result = SearchResult::empty(keyword);
        result.total_urls = total_urls;
        for (url, outcome) in outcomes {
            match outcome {
                FetchOutcome::Matched(matched) => result.matches.push(matched),
                FetchOutcome::NotMatched => {}
                FetchOutcome::Failed(reason) => {
                    result.failed_checks += 1;
                    *result
                        .failure_reasons
                        .entry(reason.kind().to_string())
                        .or_insert(0) += 1;
                    result.failures.push(FailedCheck {
                        url,
                        kind: reason.kind(),
                        reason: reason.to_string(),
                    });
                }
            }
        }
        result.success_rate = report::success_rate(result.matches.len(), total_urls);
        result
    }

    pub fn matches_found(&self) -> usize {
        self.matches.len()
    }
}
