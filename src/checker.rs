use std::time::Duration;

use rand::Rng;

use crate::config::CheckerConfig;
use crate::data_models::{FetchFailure, FetchOutcome};
use crate::extractor::extract_text;
use crate::fetcher::{FetchClient, classify};

/// Fetch `url` and report whether `keyword` appears in its visible text.
///
/// Sleeps a random politeness delay first. Every error is folded into
/// `FetchOutcome::Failed`; nothing propagates to the caller.
pub async fn check_url(
    url: &str,
    keyword: &str,
    client: &FetchClient,
    config: &CheckerConfig,
) -> FetchOutcome {
    let delay = random_delay(config.min_delay, config.max_delay);
    if !delay.is_zero() {
        tokio::time::sleep(delay).await;
    }

    let outcome = match fetch_text(url, client, config.timeout).await {
        Ok(text) if text.contains(&keyword.to_lowercase()) => FetchOutcome::Matched(url.to_string()),
        Ok(_) => FetchOutcome::NotMatched,
        Err(failure) => FetchOutcome::Failed(failure),
    };

    match &outcome {
        FetchOutcome::Matched(_) => log::info!("keyword \"{keyword}\" found in: {url}"),
        FetchOutcome::NotMatched => log::info!("keyword \"{keyword}\" not found in: {url}"),
        FetchOutcome::Failed(failure) => log_failure(url, failure),
    }
    outcome
}

async fn fetch_text(url: &str, client: &FetchClient, timeout: Duration) -> Result<String, FetchFailure> {
    let response = client.get(url, timeout).await?;
    let status = response.status();
    if status.is_client_error() || status.is_server_error() {
        return Err(FetchFailure::HttpStatus(status.as_u16()));
    }
    // decoded using the Content-Type charset, UTF-8 otherwise
    let body = response.text().await.map_err(|e| match classify(&e) {
        FetchFailure::Timeout => FetchFailure::Timeout,
        _ => FetchFailure::Body(e.to_string()),
    })?;
    Ok(extract_text(body.as_bytes()))
}

fn random_delay(min: Duration, max: Duration) -> Duration {
    if max <= min {
        return min;
    }
    rand::thread_rng().gen_range(min..=max)
}

fn log_failure(url: &str, failure: &FetchFailure) {
    match failure {
        FetchFailure::Connect(e) => log::warn!("connection error for {url}: {}", truncate(e)),
        FetchFailure::Timeout => log::warn!("timeout error for {url}"),
        FetchFailure::HttpStatus(403) => log::warn!("access forbidden (403) for {url}"),
        FetchFailure::HttpStatus(404) => log::warn!("page not found (404) for {url}"),
        FetchFailure::HttpStatus(code) => log::warn!("HTTP error {code} for {url}"),
        FetchFailure::Body(e) | FetchFailure::Request(e) => {
            log::warn!("request error for {url}: {}", truncate(e))
        }
        FetchFailure::Worker(e) => log::error!("unexpected error for {url}: {}", truncate(e)),
    }
}

fn truncate(message: &str) -> &str {
    match message.char_indices().nth(100) {
        Some((idx, _)) => &message[..idx],
        None => message,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_random_delay_within_bounds() {
        let min = Duration::from_millis(10);
        let max = Duration::from_millis(20);
        for _ in 0..100 {
            let d = random_delay(min, max);
            assert!(d >= min && d <= max);
        }
    }

    #[test]
    fn test_random_delay_degenerate_range() {
        assert_eq!(random_delay(Duration::ZERO, Duration::ZERO), Duration::ZERO);
        let d = Duration::from_millis(5);
        assert_eq!(random_delay(d, d), d);
    }

    #[test]
    fn test_truncate_long_messages() {
        let long = "x".repeat(250);
        assert_eq!(truncate(&long).len(), 100);
        assert_eq!(truncate("short"), "short");
    }
}
