//! Snowflake backend over the session HTTP API.
//!
//! A session is opened once with `login-request`; every statement is then
//! sent to `query-request` with the session token. Results come back as
//! JSON: `rowtype` describes the columns and `rowset` holds string-encoded
//! cells. Large results are split into chunks that are fetched separately.
//! An expired session token is renewed with the master token returned at
//! login, and the statement is sent again on the renewed session.

use std::cell::RefCell;
use std::collections::HashMap;
use std::time::Duration;

use reqwest::blocking::Client;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, ACCEPT, AUTHORIZATION, CONTENT_TYPE};
use serde::Deserialize;
use serde_json::json;

use crate::error::{DashboardError, DashboardResult};

use super::models::{Column, ColumnKind, Table, Value};
use super::warehouse::Warehouse;

const CLIENT_APP_ID: &str = "sales-dashboard";

/// Codes returned while a statement is still executing
const QUERY_IN_PROGRESS: &str = "333333";
const QUERY_IN_PROGRESS_ASYNC: &str = "333334";

const SESSION_EXPIRED: &str = "390112";

/// Connection parameters for a Snowflake account
#[derive(Debug, Clone)]
pub struct SnowflakeConfig {
    pub user: String,
    pub password: String,
    pub account: String,
    pub warehouse: String,
    pub database: String,
    pub schema: String,
    pub role: String,
    pub timeout_secs: u64,
    /// Overrides `https://<account>.snowflakecomputing.com`
    pub base_url: Option<String>,
}

impl SnowflakeConfig {
    pub fn base_url(&self) -> String {
        self.base_url
            .clone()
            .unwrap_or_else(|| format!("https://{}.snowflakecomputing.com", self.account))
            .trim_end_matches('/')
            .to_string()
    }

    /// Account locator sent at login, without the region or cloud suffix
    pub fn account_name(&self) -> &str {
        self.account.split('.').next().unwrap_or(&self.account)
    }
}

/// Envelope shared by every session API response
#[derive(Debug, Deserialize)]
struct Envelope<T> {
    data: Option<T>,
    code: Option<String>,
    message: Option<String>,
    #[serde(default)]
    success: bool,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LoginData {
    #[serde(default)]
    token: Option<String>,
    #[serde(default)]
    master_token: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RenewData {
    #[serde(default)]
    session_token: Option<String>,
    #[serde(default)]
    master_token: Option<String>,
}

/// Tokens of the open session
#[derive(Debug)]
struct Session {
    token: String,
    master_token: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct QueryData {
    #[serde(default)]
    rowtype: Vec<RowType>,
    #[serde(default)]
    rowset: Vec<Vec<Option<String>>>,
    #[serde(default)]
    chunks: Vec<Chunk>,
    #[serde(default)]
    chunk_headers: Option<HashMap<String, String>>,
    #[serde(default)]
    qrmk: Option<String>,
    #[serde(default)]
    get_result_url: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RowType {
    name: String,
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    scale: Option<i64>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Chunk {
    url: String,
    #[serde(default)]
    row_count: usize,
}

/// An authenticated Snowflake session
pub struct SnowflakeWarehouse {
    client: Client,
    base_url: String,
    session: RefCell<Session>,
    label: String,
}

impl SnowflakeWarehouse {
    /// Open a session; fails with a connection error if the handshake fails
    pub fn connect(config: &SnowflakeConfig) -> DashboardResult<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| DashboardError::Connection(format!("failed to build HTTP client: {e}")))?;
        let base_url = config.base_url();

        let body = json!({
            "data": {
                "CLIENT_APP_ID": CLIENT_APP_ID,
                "CLIENT_APP_VERSION": env!("CARGO_PKG_VERSION"),
                "ACCOUNT_NAME": config.account_name(),
                "LOGIN_NAME": config.user,
                "PASSWORD": config.password,
                "SESSION_PARAMETERS": { "QUERY_RESULT_FORMAT": "JSON" },
            }
        });

        let request_id = uuid::Uuid::new_v4().to_string();
        tracing::info!(account = %config.account, user = %config.user, "opening Snowflake session");
        let response = client
            .post(format!("{base_url}/session/v1/login-request"))
            .query(&[
                ("warehouse", config.warehouse.as_str()),
                ("databaseName", config.database.as_str()),
                ("schemaName", config.schema.as_str()),
                ("roleName", config.role.as_str()),
                ("request_id", request_id.as_str()),
            ])
            .header(ACCEPT, "application/json")
            .json(&body)
            .send()
            .map_err(|e| DashboardError::Connection(format!("login request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().unwrap_or_default();
            return Err(DashboardError::Connection(format!("login HTTP {status}: {text}")));
        }

        let envelope: Envelope<LoginData> = response
            .json()
            .map_err(|e| DashboardError::Connection(format!("malformed login response: {e}")))?;
        let session = match envelope {
            Envelope {
                success: true,
                data:
                    Some(LoginData {
                        token: Some(token),
                        master_token,
                    }),
                ..
            } => Session {
                token,
                master_token,
            },
            other => {
                return Err(DashboardError::Connection(format!(
                    "login rejected: {}",
                    failure_message(other.code.as_deref(), other.message.as_deref())
                )))
            }
        };

        Ok(SnowflakeWarehouse {
            client,
            base_url,
            session: RefCell::new(session),
            label: format!("Snowflake {} | {} Layer", config.database, config.schema),
        })
    }

    fn session_headers(&self) -> DashboardResult<HeaderMap> {
        let token = self.session.borrow().token.clone();
        token_headers(&token)
    }

    /// Exchange the master token for a fresh session token
    fn renew_session(&self) -> DashboardResult<()> {
        let (old_token, master_token) = {
            let session = self.session.borrow();
            (session.token.clone(), session.master_token.clone())
        };
        let master_token = master_token.ok_or_else(|| {
            DashboardError::Connection("session expired and cannot be renewed".to_string())
        })?;
        let request_id = uuid::Uuid::new_v4().to_string();
        tracing::info!("renewing expired Snowflake session");

        let envelope: Envelope<RenewData> = self
            .client
            .post(format!("{}/session/token-request", self.base_url))
            .query(&[("requestId", request_id.as_str())])
            .headers(token_headers(&master_token)?)
            .json(&json!({ "oldSessionToken": old_token, "requestType": "RENEW" }))
            .send()
            .and_then(|r| r.error_for_status())
            .map_err(|e| DashboardError::Connection(format!("session renewal failed: {e}")))?
            .json()
            .map_err(|e| DashboardError::Connection(format!("malformed renewal response: {e}")))?;

        match envelope {
            Envelope {
                success: true,
                data:
                    Some(RenewData {
                        session_token: Some(token),
                        master_token: renewed_master,
                    }),
                ..
            } => {
                let mut session = self.session.borrow_mut();
                session.token = token;
                if renewed_master.is_some() {
                    session.master_token = renewed_master;
                }
                Ok(())
            }
            other => Err(DashboardError::Connection(format!(
                "session renewal rejected: {}",
                failure_message(other.code.as_deref(), other.message.as_deref())
            ))),
        }
    }

    /// Submit a statement, renewing the session once if its token expired
    fn execute(&self, sql: &str) -> DashboardResult<QueryData> {
        let mut envelope = self.submit(sql)?;
        if envelope.code.as_deref() == Some(SESSION_EXPIRED) {
            self.renew_session()?;
            envelope = self.submit(sql)?;
        }

        match envelope {
            Envelope {
                success: true,
                data: Some(data),
                ..
            } => Ok(data),
            other => Err(DashboardError::query(
                sql,
                failure_message(other.code.as_deref(), other.message.as_deref()),
            )),
        }
    }

    /// Send a statement and wait until its first result page is available
    fn submit(&self, sql: &str) -> DashboardResult<Envelope<QueryData>> {
        let headers = self.session_headers()?;
        let body = json!({
            "sqlText": sql,
            "asyncExec": false,
            "sequenceId": 1,
            "querySubmissionTime": chrono::Utc::now().timestamp_millis(),
        });
        let request_id = uuid::Uuid::new_v4().to_string();

        let mut envelope: Envelope<QueryData> = self
            .client
            .post(format!("{}/queries/v1/query-request", self.base_url))
            .query(&[("requestId", request_id.as_str())])
            .headers(headers.clone())
            .json(&body)
            .send()
            .and_then(|r| r.error_for_status())
            .map_err(|e| DashboardError::Connection(format!("query request failed: {e}")))?
            .json()
            .map_err(|e| DashboardError::query(sql, format!("malformed result: {e}")))?;

        // Long statements hand back a result URL to poll
        while matches!(
            envelope.code.as_deref(),
            Some(QUERY_IN_PROGRESS) | Some(QUERY_IN_PROGRESS_ASYNC)
        ) {
            let path = envelope
                .data
                .as_ref()
                .and_then(|d| d.get_result_url.clone())
                .ok_or_else(|| DashboardError::query(sql, "query in progress without a result URL"))?;
            tracing::debug!(path = %path, "waiting for query result");
            envelope = self
                .client
                .get(format!("{}{}", self.base_url, path))
                .headers(headers.clone())
                .send()
                .and_then(|r| r.error_for_status())
                .map_err(|e| DashboardError::Connection(format!("result poll failed: {e}")))?
                .json()
                .map_err(|e| DashboardError::query(sql, format!("malformed result: {e}")))?;
        }
        Ok(envelope)
    }

    /// Download the remaining result chunks in order
    fn fetch_chunks(&self, sql: &str, data: &QueryData) -> DashboardResult<Vec<Vec<Option<String>>>> {
        let headers = chunk_headers(data)?;
        let mut rows = Vec::new();
        for (idx, chunk) in data.chunks.iter().enumerate() {
            tracing::debug!(chunk = idx, rows = chunk.row_count, "downloading result chunk");
            let text = self
                .client
                .get(&chunk.url)
                .headers(headers.clone())
                .send()
                .and_then(|r| r.error_for_status())
                .and_then(|r| r.text())
                .map_err(|e| DashboardError::Connection(format!("chunk download failed: {e}")))?;
            rows.extend(parse_chunk(&text).map_err(|e| DashboardError::query(sql, e))?);
        }
        Ok(rows)
    }
}

impl Warehouse for SnowflakeWarehouse {
    fn query(&self, sql: &str) -> DashboardResult<Table> {
        let mut data = self.execute(sql)?;
        if !data.chunks.is_empty() {
            let extra = self.fetch_chunks(sql, &data)?;
            data.rowset.extend(extra);
        }
        build_table(&data).map_err(|e| DashboardError::query(sql, e))
    }

    fn source_label(&self) -> String {
        self.label.clone()
    }
}

fn token_headers(token: &str) -> DashboardResult<HeaderMap> {
    let mut headers = HeaderMap::new();
    let auth = HeaderValue::from_str(&format!("Snowflake Token=\"{token}\""))
        .map_err(|e| DashboardError::Connection(format!("invalid session token: {e}")))?;
    headers.insert(AUTHORIZATION, auth);
    headers.insert(ACCEPT, HeaderValue::from_static("application/snowflake"));
    headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    Ok(headers)
}

fn failure_message(code: Option<&str>, message: Option<&str>) -> String {
    match (code, message) {
        (Some(code), Some(message)) => format!("{message} (code {code})"),
        (None, Some(message)) => message.to_string(),
        (Some(code), None) => format!("code {code}"),
        (None, None) => "no message".to_string(),
    }
}

/// Headers for chunk downloads: explicit chunk headers win over the result key
fn chunk_headers(data: &QueryData) -> DashboardResult<HeaderMap> {
    let mut headers = HeaderMap::new();
    let invalid = |e: String| DashboardError::Connection(format!("invalid chunk header: {e}"));
    if let Some(given) = &data.chunk_headers {
        for (name, value) in given {
            let name = HeaderName::from_bytes(name.as_bytes()).map_err(|e| invalid(e.to_string()))?;
            let value = HeaderValue::from_str(value).map_err(|e| invalid(e.to_string()))?;
            headers.insert(name, value);
        }
    } else if let Some(qrmk) = &data.qrmk {
        headers.insert(
            "x-amz-server-side-encryption-customer-algorithm",
            HeaderValue::from_static("AES256"),
        );
        headers.insert(
            "x-amz-server-side-encryption-customer-key",
            HeaderValue::from_str(qrmk).map_err(|e| invalid(e.to_string()))?,
        );
    }
    Ok(headers)
}

/// Chunk bodies are a comma-separated run of JSON arrays without enclosing brackets
fn parse_chunk(text: &str) -> Result<Vec<Vec<Option<String>>>, String> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Ok(Vec::new());
    }
    let wrapped = if trimmed.starts_with("[[") {
        trimmed.to_string()
    } else {
        format!("[{trimmed}]")
    };
    serde_json::from_str(&wrapped).map_err(|e| format!("malformed result chunk: {e}"))
}

fn column_kind(row_type: &RowType) -> ColumnKind {
    match row_type.kind.to_ascii_lowercase().as_str() {
        "fixed" if row_type.scale.unwrap_or(0) == 0 => ColumnKind::Integer,
        "fixed" | "real" => ColumnKind::Float,
        _ => ColumnKind::Text,
    }
}

fn parse_cell(raw: Option<&str>, kind: ColumnKind) -> Result<Value, String> {
    let Some(raw) = raw else {
        return Ok(Value::Null);
    };
    match kind {
        ColumnKind::Integer => raw
            .parse::<i64>()
            .map(Value::Int)
            .or_else(|_| raw.parse::<f64>().map(Value::Float))
            .map_err(|_| format!("invalid integer cell: {raw}")),
        ColumnKind::Float => raw
            .parse::<f64>()
            .map(Value::Float)
            .map_err(|_| format!("invalid numeric cell: {raw}")),
        ColumnKind::Text => Ok(Value::Text(raw.to_string())),
    }
}

fn build_table(data: &QueryData) -> Result<Table, String> {
    let columns: Vec<Column> = data
        .rowtype
        .iter()
        .map(|rt| Column::new(rt.name.clone(), column_kind(rt)))
        .collect();

    let mut table = Table::new(columns);
    for raw_row in &data.rowset {
        if raw_row.len() != table.columns.len() {
            return Err(format!(
                "row has {} cells but the result has {} columns",
                raw_row.len(),
                table.columns.len()
            ));
        }
        let row = raw_row
            .iter()
            .zip(&table.columns)
            .map(|(cell, column)| parse_cell(cell.as_deref(), column.kind))
            .collect::<Result<Vec<_>, _>>()?;
        table.rows.push(row);
    }
    Ok(table)
}
