use std::sync::Arc;

use anyhow::Result;
use nanoid::nanoid;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{Instrument, debug, error, info, info_span};

use crate::checker::check_url;
use crate::config::SearchConfig;
use crate::data_models::{FetchFailure, FetchOutcome, SearchRequest, SearchResult};
use crate::fetcher::FetchClient;

/// Check every URL of `request` for its keyword with at most `max_workers` checks in flight.
///
/// Results are gathered in completion order once the whole batch is done, so
/// `matches` must be compared as a set. Per-URL failures never fail the batch;
/// the only error is failing to build the HTTP client.
pub async fn search(request: &SearchRequest, config: &SearchConfig) -> Result<SearchResult> {
    let total = request.urls().len();
    if total == 0 {
        return Ok(SearchResult::empty(request.keyword()));
    }

    let search_id = nanoid!(10);
    let span = info_span!("search", %search_id, keyword = request.keyword());
    run_batch(request, config).instrument(span).await
}

async fn run_batch(request: &SearchRequest, config: &SearchConfig) -> Result<SearchResult> {
    let total = request.urls().len();
    let workers = config.max_workers.max(1);
    info!(total, workers, "starting keyword search");

    let client = Arc::new(FetchClient::new(&config.client)?);
    let keyword: Arc<str> = Arc::from(request.keyword());
    let permits = Arc::new(Semaphore::new(workers));
    let checker = config.checker;

    let mut tasks = JoinSet::new();
    for url in request.urls().iter().cloned() {
        let client = client.clone();
        let keyword = keyword.clone();
        let permits = permits.clone();
        tasks.spawn(
            async move {
                let _permit = match permits.acquire_owned().await {
                    Ok(permit) => permit,
                    Err(e) => return (url, FetchOutcome::Failed(FetchFailure::Worker(e.to_string()))),
                };
                // run the check as its own task so a panic still reports which url it was
                let check = {
                    let url = url.clone();
                    tokio::spawn(
                        async move { check_url(&url, &keyword, &client, &checker).await }
                            .in_current_span(),
                    )
                };
                let outcome = match check.await {
                    Ok(outcome) => outcome,
                    Err(e) => {
                        error!(%url, error = %e, "url check panicked");
                        FetchOutcome::Failed(FetchFailure::Worker(e.to_string()))
                    }
                };
                (url, outcome)
            }
            .in_current_span(),
        );
    }

    let mut outcomes = Vec::with_capacity(total);
    while let Some(joined) = tasks.join_next().await {
        match joined {
            Ok(pair) => outcomes.push(pair),
            Err(e) => {
                error!(error = %e, "url check task did not complete");
                outcomes.push((
                    "unknown".to_string(),
                    FetchOutcome::Failed(FetchFailure::Worker(e.to_string())),
                ));
            }
        }
        let done = outcomes.len();
        debug!(
            "progress: {}/{} ({:.1}%)",
            done,
            total,
            100.0 * done as f64 / total as f64
        );
    }

    debug!("releasing http client");
    drop(client);

    let result = SearchResult::from_outcomes(request.keyword(), total, outcomes);
    info!(
        matches = result.matches_found(),
        failed = result.failed_checks,
        success_rate = result.success_rate,
        "keyword search finished"
    );
    for failure in &result.failures {
        debug!(url = %failure.url, kind = failure.kind, "check failed: {}", failure.reason);
    }
    Ok(result)
}
