use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::RwLock;

use crate::config::SheetConfig;

/// Column holding the input URLs (row 1 is a header).
pub const URL_RANGE: &str = "A:A";
/// Cell holding the default keyword.
pub const KEYWORD_CELL: &str = "D1";
/// Results column, written from row 2 down.
pub const RESULTS_RANGE: &str = "C2:C";

#[derive(Debug, Error)]
pub enum SheetError {
    #[error("Google Sheets credentials not configured: {0}")]
    MissingCredentials(&'static str),
    #[error("Google Sheets API returned {status}: {body}")]
    Api { status: StatusCode, body: String },
    #[error("Google Sheets request failed: {0}")]
    Http(#[from] reqwest::Error),
}

/// Row store providing the URLs and keyword, and receiving the matches.
#[async_trait]
pub trait SheetStore: Send + Sync {
    async fn read_keyword(&self) -> Result<Option<String>, SheetError>;

    /// URLs from the URL column: header skipped, blanks dropped, order and duplicates kept.
    async fn read_urls(&self) -> Result<Vec<String>, SheetError>;

    /// Clear the results column, then write `urls` into it.
    async fn write_matches(&self, urls: &[String]) -> Result<(), SheetError>;
}

fn clean_urls<I>(column: I) -> Vec<String>
where
    I: IntoIterator<Item = String>,
{
    column
        .into_iter()
        .skip(1)
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .collect()
}

#[derive(Debug, Default, Deserialize)]
struct ValueRange {
    #[serde(default)]
    values: Vec<Vec<String>>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ValueRangeBody<'a> {
    range: &'a str,
    major_dimension: &'a str,
    values: Vec<[&'a str; 1]>,
}

/// Google Sheets v4 values API client, first sheet of one spreadsheet.
pub struct GoogleSheet {
    http: Client,
    api_base: String,
    spreadsheet_id: Option<String>,
    access_token: Option<String>,
}

impl GoogleSheet {
    pub fn new(config: &SheetConfig) -> GoogleSheet {
        GoogleSheet {
            http: Client::new(),
            api_base: config.api_base.trim_end_matches('/').to_string(),
            spreadsheet_id: config.spreadsheet_id.clone(),
            access_token: config.access_token.clone(),
        }
    }

    fn credentials(&self) -> Result<(&str, &str), SheetError> {
        let id = self
            .spreadsheet_id
            .as_deref()
            .ok_or(SheetError::MissingCredentials("SPREADSHEET_ID is not set"))?;
        let token = self
            .access_token
            .as_deref()
            .ok_or(SheetError::MissingCredentials("GOOGLE_SHEETS_ACCESS_TOKEN is not set"))?;
        Ok((id, token))
    }

    fn values_url(&self, id: &str, range: &str) -> String {
        format!("{}/v4/spreadsheets/{}/values/{}", self.api_base, id, range)
    }

    async fn check(response: reqwest::Response) -> Result<reqwest::Response, SheetError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        Err(SheetError::Api { status, body })
    }

    async fn get_values(&self, range: &str) -> Result<Vec<Vec<String>>, SheetError> {
        let (id, token) = self.credentials()?;
        let response = self
            .http
            .get(self.values_url(id, range))
            .bearer_auth(token)
            .send()
            .await?;
        let values: ValueRange = Self::check(response).await?.json().await?;
        Ok(values.values)
    }
}

#[async_trait]
impl SheetStore for GoogleSheet {
    async fn read_keyword(&self) -> Result<Option<String>, SheetError> {
        let values = self.get_values(KEYWORD_CELL).await?;
        Ok(values
            .into_iter()
            .next()
            .and_then(|row| row.into_iter().next())
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty()))
    }

    async fn read_urls(&self) -> Result<Vec<String>, SheetError> {
        let values = self.get_values(URL_RANGE).await?;
        Ok(clean_urls(
            values.into_iter().map(|row| row.into_iter().next().unwrap_or_default()),
        ))
    }

    async fn write_matches(&self, urls: &[String]) -> Result<(), SheetError> {
        let (id, token) = self.credentials()?;

        let clear_url = format!("{}:clear", self.values_url(id, RESULTS_RANGE));
        let response = self
            .http
            .post(clear_url)
            .bearer_auth(token)
            .json(&serde_json::json!({}))
            .send()
            .await?;
        Self::check(response).await?;

        if urls.is_empty() {
            return Ok(());
        }

        let range = format!("C2:C{}", urls.len() + 1);
        let body = ValueRangeBody {
            range: &range,
            major_dimension: "ROWS",
            values: urls.iter().map(|u| [u.as_str()]).collect(),
        };
        let response = self
            .http
            .put(format!("{}?valueInputOption=RAW", self.values_url(id, &range)))
            .bearer_auth(token)
            .json(&body)
            .send()
            .await?;
        Self::check(response).await?;
        log::info!("wrote {} matching urls to the spreadsheet", urls.len());
        Ok(())
    }
}

/// In-process sheet: URL column, keyword cell and results column kept in memory.
#[derive(Debug, Default)]
pub struct MemorySheet {
    keyword: RwLock<Option<String>>,
    url_column: RwLock<Vec<String>>,
    results: RwLock<Vec<String>>,
}

impl MemorySheet {
    /// `url_column` includes the header row, like the real column A.
    pub fn new(keyword: Option<&str>, url_column: Vec<String>) -> MemorySheet {
        MemorySheet {
            keyword: RwLock::new(keyword.map(str::to_string)),
            url_column: RwLock::new(url_column),
            results: RwLock::new(Vec::new()),
        }
    }

    pub async fn results(&self) -> Vec<String> {
        self.results.read().await.clone()
    }

    pub async fn set_results(&self, results: Vec<String>) {
        *self.results.write().await = results;
    }
}

#[async_trait]
impl SheetStore for MemorySheet {
    async fn read_keyword(&self) -> Result<Option<String>, SheetError> {
        Ok(self
            .keyword
            .read()
            .await
            .as_deref()
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .map(str::to_string))
    }

    async fn read_urls(&self) -> Result<Vec<String>, SheetError> {
        Ok(clean_urls(self.url_column.read().await.iter().cloned()))
    }

    async fn write_matches(&self, urls: &[String]) -> Result<(), SheetError> {
        let mut results = self.results.write().await;
        results.clear();
        results.extend_from_slice(urls);
        Ok(())
    }
}
