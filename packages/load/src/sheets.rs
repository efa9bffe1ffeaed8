//! Google Sheets sink.
//!
//! Authenticates as a service account (signed RS256 JWT exchanged for an
//! OAuth access token), clears the target range and writes the header row
//! followed by every data row with `valueInputOption=RAW`.

use std::path::{Path, PathBuf};

use fashion_etl_catalog_models::{COLUMNS, CleanTable};
use jsonwebtoken::{Algorithm, EncodingKey, Header};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use crate::{LoadError, LoadOutcome};

const SHEETS_SCOPE: &str = "https://www.googleapis.com/auth/spreadsheets";
const DEFAULT_TOKEN_URI: &str = "https://oauth2.googleapis.com/token";
const DEFAULT_API_BASE: &str = "https://sheets.googleapis.com/v4/spreadsheets";
const JWT_BEARER_GRANT: &str = "urn:ietf:params:oauth:grant-type:jwt-bearer";
const TOKEN_LIFETIME_SECS: i64 = 3600;

/// Where and how to write the table in Google Sheets.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct SheetsSettings {
    /// Service-account key file (JSON).
    pub credentials_path: PathBuf,
    /// Target spreadsheet. Empty or `<...>` means not configured.
    pub spreadsheet_id: String,
    /// Range cleared before writing.
    pub clear_range: String,
    /// Top-left anchor of the written values.
    pub write_range: String,
    pub api_base: String,
}

impl Default for SheetsSettings {
    fn default() -> Self {
        Self {
            credentials_path: PathBuf::from("google-sheets-api.json"),
            spreadsheet_id: String::new(),
            clear_range: "Sheet1".to_owned(),
            write_range: "Sheet1!A1".to_owned(),
            api_base: DEFAULT_API_BASE.to_owned(),
        }
    }
}

impl SheetsSettings {
    /// Returns `true` if a real spreadsheet id has been filled in.
    #[must_use]
    pub fn has_spreadsheet_id(&self) -> bool {
        let id = self.spreadsheet_id.trim();
        !id.is_empty() && !(id.starts_with('<') && id.ends_with('>'))
    }
}

#[derive(Debug, Deserialize)]
struct ServiceAccountKey {
    client_email: String,
    private_key: String,
    #[serde(default = "default_token_uri")]
    token_uri: String,
}

fn default_token_uri() -> String {
    DEFAULT_TOKEN_URI.to_owned()
}

#[derive(Debug, Serialize)]
struct Claims<'a> {
    iss: &'a str,
    scope: &'a str,
    aud: &'a str,
    iat: i64,
    exp: i64,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
}

/// Replaces the contents of the configured sheet with `table`.
///
/// Skips with a warning when the spreadsheet id is unset or the
/// credentials file does not exist. Any other failure is logged and
/// reported as [`LoadOutcome::Failed`].
pub async fn load_to_sheets(table: &CleanTable, settings: &SheetsSettings) -> LoadOutcome {
    if !settings.has_spreadsheet_id() {
        log::warn!("Google Sheets: spreadsheet id not set, skipping");
        return LoadOutcome::Skipped;
    }
    if !settings.credentials_path.exists() {
        log::warn!(
            "Google Sheets: credentials file '{}' not found, skipping",
            settings.credentials_path.display()
        );
        return LoadOutcome::Skipped;
    }

    LoadOutcome::from_result("Google Sheets", write_sheet(table, settings).await)
}

async fn write_sheet(table: &CleanTable, settings: &SheetsSettings) -> Result<usize, LoadError> {
    let key = read_key(&settings.credentials_path)?;
    let client = reqwest::Client::new();

    let token = fetch_access_token(&client, &key).await?;
    log::info!("Google Sheets: authenticated as {}", key.client_email);

    let base = format!(
        "{}/{}/values",
        settings.api_base.trim_end_matches('/'),
        settings.spreadsheet_id.trim()
    );

    log::info!("Google Sheets: clearing '{}'", settings.clear_range);
    let response = client
        .post(format!("{base}/{}:clear", settings.clear_range))
        .bearer_auth(&token)
        .json(&json!({}))
        .send()
        .await?;
    check_status(response).await?;

    let values = value_matrix(table);
    log::info!(
        "Google Sheets: writing {} rows to '{}'",
        values.len(),
        settings.write_range
    );
    let response = client
        .put(format!("{base}/{}", settings.write_range))
        .query(&[("valueInputOption", "RAW")])
        .bearer_auth(&token)
        .json(&json!({
            "range": settings.write_range,
            "majorDimension": "ROWS",
            "values": values,
        }))
        .send()
        .await?;
    check_status(response).await?;

    Ok(table.len())
}

fn read_key(path: &Path) -> Result<ServiceAccountKey, LoadError> {
    let contents = std::fs::read_to_string(path)?;
    Ok(serde_json::from_str(&contents)?)
}

fn sign_assertion(key: &ServiceAccountKey, issued_at: i64) -> Result<String, LoadError> {
    let claims = Claims {
        iss: &key.client_email,
        scope: SHEETS_SCOPE,
        aud: &key.token_uri,
        iat: issued_at,
        exp: issued_at + TOKEN_LIFETIME_SECS,
    };
    let encoding_key = EncodingKey::from_rsa_pem(key.private_key.as_bytes())?;
    Ok(jsonwebtoken::encode(
        &Header::new(Algorithm::RS256),
        &claims,
        &encoding_key,
    )?)
}

async fn fetch_access_token(
    client: &reqwest::Client,
    key: &ServiceAccountKey,
) -> Result<String, LoadError> {
    let assertion = sign_assertion(key, chrono::Utc::now().timestamp())?;
    let response = client
        .post(&key.token_uri)
        .form(&[("grant_type", JWT_BEARER_GRANT), ("assertion", assertion.as_str())])
        .send()
        .await?;
    let body = check_status(response).await?;
    let token: TokenResponse = serde_json::from_str(&body)?;
    Ok(token.access_token)
}

async fn check_status(response: reqwest::Response) -> Result<String, LoadError> {
    let status = response.status();
    let body = response.text().await?;
    if !status.is_success() {
        return Err(LoadError::Api {
            status: status.as_u16(),
            message: body,
        });
    }
    Ok(body)
}

/// Header row followed by one row per record, in column order.
fn value_matrix(table: &CleanTable) -> Vec<Vec<Value>> {
    let header: Vec<Value> = COLUMNS.iter().map(|c| Value::from(*c)).collect();
    std::iter::once(header)
        .chain(table.iter().map(|row| {
            vec![
                Value::from(row.title.as_str()),
                Value::from(row.price),
                Value::from(row.rating),
                Value::from(row.colors),
                Value::from(row.size.as_str()),
                Value::from(row.gender.as_str()),
                Value::from(row.scraped_at.as_str()),
            ]
        }))
        .collect()
}
