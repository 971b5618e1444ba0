//! Airtable REST client (blocking).

use reqwest::blocking::{Client, RequestBuilder, Response};
use reqwest::{StatusCode, Url};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::error::{BotError, Result};

/// Airtable client configuration.
#[derive(Debug, Clone)]
pub struct AirtableConfig {
    pub api_base: String,
    pub token: String,
    pub base_id: String,
    pub timeout: Duration,
    /// Retries for 429 / 5xx / transport failures.
    pub max_retries: u8,
}

impl AirtableConfig {
    pub fn new(token: impl Into<String>, base_id: impl Into<String>) -> Self {
        Self {
            api_base: "https://api.airtable.com/v0".to_string(),
            token: token.into(),
            base_id: base_id.into(),
            timeout: Duration::from_secs(30),
            max_retries: 3,
        }
    }
}

/// One Airtable record with typed fields.
#[derive(Debug, Deserialize)]
pub struct Record<T> {
    pub id: String,
    #[serde(rename = "createdTime", default)]
    pub created_time: Option<String>,
    pub fields: T,
}

#[derive(Debug, Deserialize)]
struct ListPage<T> {
    records: Vec<Record<T>>,
    #[serde(default)]
    offset: Option<String>,
}

#[derive(Debug, Serialize)]
struct WriteBody<'a, T> {
    fields: &'a T,
    typecast: bool,
}

/// Error payload: either `{"error": {"type", "message"}}` or `{"error": "NOT_FOUND"}`.
#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ErrorBody {
    Detailed {
        #[serde(rename = "type", default)]
        kind: Option<String>,
        #[serde(default)]
        message: Option<String>,
    },
    Code(String),
}

impl ErrorBody {
    fn describe(self) -> String {
        match self {
            ErrorBody::Detailed { kind, message } => match (kind, message) {
                (Some(k), Some(m)) => format!("{}: {}", k, m),
                (Some(k), None) => k,
                (None, Some(m)) => m,
                (None, None) => "unknown error".to_string(),
            },
            ErrorBody::Code(code) => code,
        }
    }
}

/// HTTP client for one Airtable base.
pub struct AirtableClient {
    client: Client,
    config: AirtableConfig,
}

impl AirtableClient {
    pub fn new(config: AirtableConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.timeout)
            .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self { client, config })
    }

    /// `{api_base}/{base_id}/{table}[/{id}]` with path segments percent-encoded.
    pub fn table_url(&self, table: &str, id: Option<&str>) -> Result<Url> {
        let mut url = Url::parse(&self.config.api_base)
            .map_err(|e| BotError::Config(format!("Invalid Airtable API base: {}", e)))?;
        {
            let mut segments = url
                .path_segments_mut()
                .map_err(|_| BotError::Config("Airtable API base cannot be a base URL".to_string()))?;
            segments.pop_if_empty().push(&self.config.base_id).push(table);
            if let Some(id) = id {
                segments.push(id);
            }
        }
        Ok(url)
    }

    /// Fetch every record of a table, following pagination.
    pub fn list_records<T: DeserializeOwned>(&self, table: &str) -> Result<Vec<Record<T>>> {
        let url = self.table_url(table, None)?;
        let mut records = Vec::new();
        let mut offset: Option<String> = None;

        loop {
            let mut query: Vec<(&str, String)> = vec![("pageSize", "100".to_string())];
            if let Some(ref o) = offset {
                query.push(("offset", o.clone()));
            }
            let page: ListPage<T> =
                self.execute(|| self.client.get(url.clone()).query(&query))?.json()?;
            records.extend(page.records);
            match page.offset {
                Some(next) => offset = Some(next),
                None => break,
            }
        }

        tracing::debug!(table, count = records.len(), "listed Airtable records");
        Ok(records)
    }

    /// Fetch one record; `None` when Airtable answers 404.
    pub fn get_record<T: DeserializeOwned>(&self, table: &str, id: &str) -> Result<Option<Record<T>>> {
        let url = self.table_url(table, Some(id))?;
        match self.execute(|| self.client.get(url.clone())) {
            Ok(resp) => Ok(Some(resp.json()?)),
            Err(BotError::AirtableApi { status: 404, .. }) => Ok(None),
            Err(e) => Err(e),
        }
    }

    pub fn create_record<T: Serialize + DeserializeOwned>(&self, table: &str, fields: &T) -> Result<Record<T>> {
        let url = self.table_url(table, None)?;
        let body = WriteBody { fields, typecast: true };
        Ok(self.execute(|| self.client.post(url.clone()).json(&body))?.json()?)
    }

    /// PATCH the given fields; `null` values clear cells.
    pub fn update_record<T: Serialize + DeserializeOwned>(&self, table: &str, id: &str, fields: &T) -> Result<Record<T>> {
        let url = self.table_url(table, Some(id))?;
        let body = WriteBody { fields, typecast: true };
        Ok(self.execute(|| self.client.patch(url.clone()).json(&body))?.json()?)
    }

    pub fn delete_record(&self, table: &str, id: &str) -> Result<()> {
        let url = self.table_url(table, Some(id))?;
        self.execute(|| self.client.delete(url.clone()))?;
        Ok(())
    }

    /// Send with auth, retrying transient failures with exponential backoff.
    fn execute<F>(&self, build: F) -> Result<Response>
    where
        F: Fn() -> RequestBuilder,
    {
        let mut last_error = None;

        for attempt in 0..=self.config.max_retries {
            if attempt > 0 {
                // 1s, 2s, 4s, ...
                let delay = Duration::from_secs(1 << (attempt - 1));
                tracing::debug!("Airtable retry {} after {:?}", attempt, delay);
                std::thread::sleep(delay);
            }

            let result = build()
                .bearer_auth(&self.config.token)
                .send()
                .map_err(BotError::from)
                .and_then(check_status);

            match result {
                Ok(resp) => return Ok(resp),
                Err(e) if e.is_transient() => {
                    tracing::warn!("Airtable request attempt {} failed: {}", attempt + 1, e);
                    last_error = Some(e);
                }
                Err(e) => return Err(e),
            }
        }

        Err(last_error.unwrap_or_else(|| BotError::AirtableApi {
            status: 0,
            message: "request failed".to_string(),
        }))
    }
}

/// Map non-success responses to `BotError::AirtableApi`.
fn check_status(resp: Response) -> Result<Response> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }
    let body = resp.text().unwrap_or_default();
    Err(api_error(status, &body))
}

fn api_error(status: StatusCode, body: &str) -> BotError {
    let message = serde_json::from_str::<ErrorEnvelope>(body)
        .map(|env| env.error.describe())
        .unwrap_or_else(|_| {
            status
                .canonical_reason()
                .unwrap_or("unexpected status")
                .to_string()
        });
    BotError::AirtableApi {
        status: status.as_u16(),
        message,
    }
}
