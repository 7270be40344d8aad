use crate::data_models::SearchResult;

/// Percentage of URLs that matched, rounded to one decimal. Zero when nothing was checked.
pub fn success_rate(matches: usize, total_urls: usize) -> f64 {
    if total_urls == 0 {
        return 0.0;
    }
    let rate = 100.0 * matches as f64 / total_urls as f64;
    (rate * 10.0).round() / 10.0
}

pub fn summarize(result: &SearchResult) -> String {
    if result.matches_found() > 0 {
        format!(
            "Search completed successfully! Found keyword \"{}\" in {} out of {} URLs ({:.1}% match rate).",
            result.keyword,
            result.matches_found(),
            result.total_urls,
            result.success_rate
        )
    } else {
        format!(
            "Search completed. Keyword \"{}\" was not found in any of the {} URLs checked.",
            result.keyword, result.total_urls
        )
    }
}
