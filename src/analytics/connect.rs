//! REST query client for a CData Connect Cloud style endpoint.
//!
//! The endpoint accepts `POST` with a JSON body carrying the SQL text and its
//! named parameters, and answers with one or more result sets of row tuples.
//! Authentication is selected by a connection string such as
//! `AuthScheme=OAuth;`.

use super::{AnalyticsQuery, AnalyticsSource, decode_row};
use crate::config::DashboardConfig;
use crate::error::DashboardError;
use crate::models::AnalyticsRow;
use crate::utils::truncate_for_log;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;
use std::time::Instant;
use tracing::{debug, info, instrument, warn};

/// Connect Cloud's type code for string parameters.
const STRING_DATA_TYPE: u8 = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthScheme {
    /// Bearer access token.
    OAuth,
    /// User name plus personal access token.
    Basic,
}

/// Parsed `Key=Value;` connection string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionSettings {
    pub auth_scheme: AuthScheme,
}

impl ConnectionSettings {
    pub fn parse(connection_string: &str) -> Result<Self, DashboardError> {
        let mut auth_scheme = None;

        for part in connection_string.split(';').map(str::trim).filter(|p| !p.is_empty()) {
            let (key, value) = part.split_once('=').ok_or_else(|| {
                DashboardError::Config(format!("malformed connection string segment `{part}`"))
            })?;
            if key.trim().eq_ignore_ascii_case("AuthScheme") {
                auth_scheme = Some(match value.trim().to_ascii_lowercase().as_str() {
                    "oauth" => AuthScheme::OAuth,
                    "basic" => AuthScheme::Basic,
                    other => {
                        return Err(DashboardError::Config(format!(
                            "unsupported AuthScheme `{other}`"
                        )));
                    }
                });
            }
        }

        Ok(Self {
            auth_scheme: auth_scheme.ok_or_else(|| {
                DashboardError::Config("connection string has no AuthScheme".to_string())
            })?,
        })
    }
}

/// Credentials supplied on the command line or through the environment.
#[derive(Clone, Default)]
pub struct ConnectCredentials {
    pub user: Option<String>,
    pub token: Option<String>,
}

impl fmt::Debug for ConnectCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectCredentials")
            .field("user", &self.user)
            .field("token", &self.token.as_ref().map(|_| "***set***"))
            .finish()
    }
}

#[derive(Debug, Clone)]
pub struct ConnectClient {
    http: reqwest::Client,
    endpoint: String,
    settings: ConnectionSettings,
    credentials: ConnectCredentials,
}

impl ConnectClient {
    pub fn new(
        config: &DashboardConfig,
        credentials: ConnectCredentials,
    ) -> Result<Self, DashboardError> {
        let settings = ConnectionSettings::parse(&config.connection_string)?;
        let http = reqwest::Client::builder()
            .build()
            .map_err(|e| DashboardError::Config(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            http,
            endpoint: config.connect_url.clone(),
            settings,
            credentials,
        })
    }

    fn authorize(
        &self,
        request: reqwest::RequestBuilder,
    ) -> Result<reqwest::RequestBuilder, DashboardError> {
        let token = self.credentials.token.as_deref().ok_or_else(|| {
            DashboardError::Connection("no access token configured".to_string())
        })?;

        match self.settings.auth_scheme {
            AuthScheme::OAuth => Ok(request.bearer_auth(token)),
            AuthScheme::Basic => {
                let user = self.credentials.user.as_deref().ok_or_else(|| {
                    DashboardError::Connection("Basic auth requires a user".to_string())
                })?;
                Ok(request.basic_auth(user, Some(token)))
            }
        }
    }
}

#[derive(Debug, Serialize)]
struct QueryRequest<'a> {
    query: &'a str,
    parameters: BTreeMap<&'a str, ParameterValue<'a>>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ParameterValue<'a> {
    data_type: u8,
    value: &'a str,
}

impl<'a> From<&'a AnalyticsQuery> for QueryRequest<'a> {
    fn from(query: &'a AnalyticsQuery) -> Self {
        Self {
            query: &query.sql,
            parameters: query
                .params
                .iter()
                .map(|p| {
                    (
                        p.name.as_str(),
                        ParameterValue {
                            data_type: STRING_DATA_TYPE,
                            value: &p.value,
                        },
                    )
                })
                .collect(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct QueryResponse {
    #[serde(default)]
    results: Vec<ResultSet>,
    #[serde(default)]
    error: Option<ApiError>,
}

#[derive(Debug, Deserialize)]
struct ResultSet {
    #[serde(default)]
    rows: Vec<Vec<Value>>,
}

#[derive(Debug, Deserialize)]
struct ApiError {
    #[serde(default)]
    code: Option<String>,
    message: String,
}

/// Decode a query response body into analytics rows.
pub fn decode_response(body: &str) -> Result<Vec<AnalyticsRow>, DashboardError> {
    let response: QueryResponse = serde_json::from_str(body).map_err(|e| {
        DashboardError::Connection(format!(
            "unreadable query response ({e}): {}",
            truncate_for_log(body, 200)
        ))
    })?;

    if let Some(error) = response.error {
        return Err(DashboardError::Connection(match error.code {
            Some(code) => format!("query failed [{code}]: {}", error.message),
            None => format!("query failed: {}", error.message),
        }));
    }

    response
        .results
        .iter()
        .flat_map(|set| set.rows.iter())
        .map(|row| decode_row(row))
        .collect()
}

impl AnalyticsSource for ConnectClient {
    #[instrument(level = "info", skip_all, fields(endpoint = %self.endpoint))]
    async fn execute(&self, query: &AnalyticsQuery) -> Result<Vec<AnalyticsRow>, DashboardError> {
        let t0 = Instant::now();
        debug!(sql = %query.sql, "Executing analytics query");

        let request = self
            .authorize(self.http.post(&self.endpoint))?
            .json(&QueryRequest::from(query));

        let response = request
            .send()
            .await
            .map_err(|e| DashboardError::Connection(e.to_string()))?;
        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| DashboardError::Connection(e.to_string()))?;

        if !status.is_success() {
            warn!(%status, body = %truncate_for_log(&body, 300), "Analytics query rejected");
            return Err(DashboardError::Connection(format!(
                "query endpoint returned HTTP {status}"
            )));
        }

        let rows = decode_response(&body)?;
        info!(
            rows = rows.len(),
            elapsed_ms = t0.elapsed().as_millis() as u64,
            "Analytics query completed"
        );
        Ok(rows)
    }
}
