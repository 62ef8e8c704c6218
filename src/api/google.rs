//! Implements the `SheetStore` trait using the `sheets::Client` to interact with the
//! Google sheet.
//!
//! Reads and bulk writes go through the `sheets` crate the way its API exposes them.
//! Row append, row deletion and tab creation are not covered by the crate's values
//! surface, so those go through the REST endpoints directly with `reqwest`, the same
//! escape hatch used for the Drive copy call this store was adapted from.

use crate::api::{SheetStore, TokenProvider};
use crate::error::StoreError;
use crate::model::HEADER;
use crate::{Config, Result};
use anyhow::Context;
use serde_json::json;
use sheets::types::{
    BatchClearValuesRequest, BatchUpdateValuesRequest, DateTimeRenderOption, Dimension,
    ValueInputOption, ValueRange, ValueRenderOption,
};
use sheets::ClientError;
use std::collections::HashMap;
use tracing::{debug, trace};

const SHEETS_API: &str = "https://sheets.googleapis.com/v4/spreadsheets";

/// The column span of an expense sheet: Date, Time, VND, Note, Category.
const COLUMNS: &str = "A:E";

/// Implements the `SheetStore` trait against Google Sheets. It takes a
/// `TokenProvider`, on which it calls refresh to keep the token up-to-date.
pub(crate) struct GoogleStore {
    config: Config,
    token_provider: TokenProvider,
    client: sheets::Client,
    http: reqwest::Client,
    /// Numeric tab ids by sheet title, fetched lazily for deleteDimension calls.
    tab_ids: HashMap<String, i64>,
}

impl GoogleStore {
    pub(crate) async fn new(config: Config, mut token_provider: TokenProvider) -> Result<Self> {
        let client = create_sheets_client(&mut token_provider).await?;
        Ok(Self {
            config,
            token_provider,
            client,
            http: reqwest::Client::new(),
            tab_ids: HashMap::new(),
        })
    }

    /// Refreshes the sheets client with a new access token if needed.
    async fn refresh_client(&mut self) -> Result<()> {
        self.client = create_sheets_client(&mut self.token_provider).await?;
        Ok(())
    }

    /// POSTs `body` to `{spreadsheet}/{path_suffix}` with a fresh bearer token.
    async fn post_json(&mut self, path_suffix: &str, body: serde_json::Value) -> Result<serde_json::Value> {
        let url = format!(
            "{SHEETS_API}/{}{path_suffix}",
            self.config.spreadsheet_id()
        );
        let token = self.token_provider.token_with_refresh().await?.to_string();
        let response = self
            .http
            .post(&url)
            .bearer_auth(token)
            .json(&body)
            .send()
            .await
            .context("Failed to send request to the Sheets API")?;

        let status = response.status();
        let text = response
            .text()
            .await
            .unwrap_or_else(|_| "Unable to read response body".to_string());
        if !status.is_success() {
            anyhow::bail!("Sheets API call failed with status {status}: {text}");
        }
        serde_json::from_str(&text).context("Failed to parse Sheets API response")
    }

    /// Appends rows after the last row with data in the sheet.
    async fn append_values(&mut self, sheet_id: &str, rows: &[Vec<String>]) -> Result<()> {
        // The range goes in the URL path and sheet titles contain a slash.
        let range = format!("{sheet_id}!{COLUMNS}").replace('/', "%2F");
        let suffix = format!(
            "/values/{range}:append?valueInputOption=RAW&insertDataOption=INSERT_ROWS"
        );
        self.post_json(&suffix, json!({ "values": rows })).await?;
        Ok(())
    }

    /// Creates a new tab named `sheet_id` and writes the header row into it.
    async fn add_sheet(&mut self, sheet_id: &str) -> Result<()> {
        debug!("Creating sheet tab '{sheet_id}'");
        let body = json!({
            "requests": [
                { "addSheet": { "properties": { "title": sheet_id } } }
            ]
        });
        let response = self.post_json(":batchUpdate", body).await?;
        if let Some(tab_id) = response
            .pointer("/replies/0/addSheet/properties/sheetId")
            .and_then(|v| v.as_i64())
        {
            self.tab_ids.insert(sheet_id.to_string(), tab_id);
        }
        let header: Vec<String> = HEADER.iter().map(|s| s.to_string()).collect();
        self.append_values(sheet_id, &[header]).await
    }

    /// Looks up the numeric tab id for a sheet title, fetching spreadsheet metadata on
    /// the first call and caching the result.
    async fn tab_id(&mut self, sheet_id: &str) -> Result<i64> {
        if let Some(id) = self.tab_ids.get(sheet_id) {
            return Ok(*id);
        }

        let url = format!(
            "{SHEETS_API}/{}?fields=sheets.properties",
            self.config.spreadsheet_id()
        );
        let token = self.token_provider.token_with_refresh().await?.to_string();
        let response = self
            .http
            .get(&url)
            .bearer_auth(token)
            .send()
            .await
            .context("Failed to fetch spreadsheet metadata")?;
        if !response.status().is_success() {
            anyhow::bail!(
                "Spreadsheet metadata fetch failed with status {}",
                response.status()
            );
        }
        let metadata: serde_json::Value = response
            .json()
            .await
            .context("Failed to parse spreadsheet metadata")?;

        if let Some(tabs) = metadata.get("sheets").and_then(|v| v.as_array()) {
            for tab in tabs {
                let properties = &tab["properties"];
                if let (Some(title), Some(id)) = (
                    properties["title"].as_str(),
                    properties["sheetId"].as_i64(),
                ) {
                    self.tab_ids.insert(title.to_string(), id);
                }
            }
        }

        self.tab_ids
            .get(sheet_id)
            .copied()
            .context(StoreError::NotFound(sheet_id.to_string()))
    }
}

#[async_trait::async_trait]
impl SheetStore for GoogleStore {
    async fn read_rows(&mut self, sheet_id: &str) -> Result<Vec<Vec<String>>> {
        trace!("read_rows for {sheet_id}");
        self.refresh_client().await?;
        let range = format!("{sheet_id}!{COLUMNS}");
        let response = self
            .client
            .spreadsheets()
            .values_get(
                self.config.spreadsheet_id(),
                &range,
                DateTimeRenderOption::FormattedString,
                Dimension::Rows,
                ValueRenderOption::FormattedValue,
            )
            .await
            .map_err(|e| {
                if is_missing_sheet(&e) {
                    map_client_error(e).context(StoreError::NotFound(sheet_id.to_string()))
                } else {
                    map_client_error(e).context(StoreError::Read(sheet_id.to_string()))
                }
            })
            .with_context(|| format!("Failed to fetch {sheet_id} sheet data"))?;
        Ok(response.body.values)
    }

    async fn append_row(&mut self, sheet_id: &str, row: &[String]) -> Result<()> {
        trace!("append_row for {sheet_id}");
        let rows = vec![row.to_vec()];
        match self.append_values(sheet_id, &rows).await {
            Ok(()) => Ok(()),
            // A missing tab surfaces as a range-parse failure; create it and retry once.
            Err(e) if e.to_string().contains("Unable to parse range") => {
                self.add_sheet(sheet_id)
                    .await
                    .context(StoreError::Write(sheet_id.to_string()))?;
                self.append_values(sheet_id, &rows)
                    .await
                    .context(StoreError::Write(sheet_id.to_string()))
            }
            Err(e) => Err(e.context(StoreError::Write(sheet_id.to_string()))),
        }
    }

    async fn delete_row(&mut self, sheet_id: &str, position: usize) -> Result<()> {
        trace!("delete_row {position} for {sheet_id}");
        let tab_id = self.tab_id(sheet_id).await?;
        let body = json!({
            "requests": [
                {
                    "deleteDimension": {
                        "range": {
                            "sheetId": tab_id,
                            "dimension": "ROWS",
                            "startIndex": position,
                            "endIndex": position + 1,
                        }
                    }
                }
            ]
        });
        self.post_json(":batchUpdate", body)
            .await
            .context(StoreError::Write(sheet_id.to_string()))?;
        Ok(())
    }

    async fn overwrite_rows(&mut self, sheet_id: &str, rows: &[Vec<String>]) -> Result<()> {
        trace!("overwrite_rows for {sheet_id} ({} rows)", rows.len());
        self.refresh_client().await?;

        let clear_request = BatchClearValuesRequest {
            ranges: vec![format!("{sheet_id}!{COLUMNS}")],
        };
        self.client
            .spreadsheets()
            .values_batch_clear(self.config.spreadsheet_id(), &clear_request)
            .await
            .map_err(map_client_error)
            .context(StoreError::Write(sheet_id.to_string()))
            .with_context(|| format!("Failed to clear {sheet_id} before overwrite"))?;

        let write_request = BatchUpdateValuesRequest {
            data: vec![ValueRange {
                major_dimension: Some(Dimension::Rows),
                range: format!("{sheet_id}!A1"),
                values: rows.to_vec(),
            }],
            include_values_in_response: Some(false),
            response_date_time_render_option: None,
            response_value_render_option: None,
            value_input_option: Some(ValueInputOption::Raw),
        };
        self.client
            .spreadsheets()
            .values_batch_update(self.config.spreadsheet_id(), &write_request)
            .await
            .map_err(map_client_error)
            .context(StoreError::Write(sheet_id.to_string()))
            .with_context(|| format!("Failed to write sorted rows to {sheet_id}"))?;
        Ok(())
    }
}

/// Creates a new sheets client with a refreshed access token.
async fn create_sheets_client(token_provider: &mut TokenProvider) -> Result<sheets::Client> {
    // Get the access token (will refresh if needed)
    let access_token = token_provider.token_with_refresh().await?;

    // Create sheets client
    // Note: The sheets crate requires client_id, client_secret, and redirect_uri,
    // but we don't need them for API calls, only the access token
    Ok(sheets::Client::new(
        String::new(), // client_id (not needed for API calls with access token)
        String::new(), // client_secret (not needed for API calls with access token)
        String::new(), // redirect_uri (not needed for API calls with access token)
        access_token.to_string(),
        String::new(), // refresh_token (not needed, we handle refresh ourselves)
    ))
}

/// The values API reports a nonexistent tab as a range-parse failure.
fn is_missing_sheet(e: &ClientError) -> bool {
    format!("{e:?}").contains("Unable to parse range")
}

fn map_client_error(e: ClientError) -> anyhow::Error {
    let error_name = match &e {
        ClientError::EmptyRefreshToken => "EmptyRefreshToken".to_string(),
        ClientError::FromUtf8Error(inner) => format!("FromUtf8Error {inner}"),
        ClientError::UrlParserError(inner) => format!("UrlParserError {inner}"),
        ClientError::SerdeJsonError(inner) => format!("SerdeJsonError {inner}"),
        ClientError::ReqwestError(inner) => format!("ReqwestError {inner}"),
        ClientError::InvalidHeaderValue(inner) => format!("InvalidHeaderValue {inner}"),
        ClientError::ReqwestMiddleWareError(inner) => format!("ReqwestMiddleWareError {inner}"),
        ClientError::HttpError { .. } => "HttpError".to_string(),
        ClientError::Other(_) => "Other".to_string(),
    };
    Err::<(), ClientError>(e).context(error_name).err().unwrap()
}
