use crate::config::RestApiConfig;
use crate::constants::API_PREFIX;
use crate::error::AppError;
use crate::session::session::Session;
use crate::transport::headers::{default_headers, session_headers};
use reqwest::{header, Client, Method, StatusCode};
use serde::de::DeserializeOwned;
use std::fmt;
use std::time::Duration;
use tracing::{debug, error, instrument};

/// A request relative to the configured base URL.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiRequest {
    pub method: Method,
    pub path: String,
    pub query: Vec<(String, String)>,
    pub form: Vec<(String, String)>,
}

impl ApiRequest {
    pub fn get(path: &str) -> Self {
        Self {
            method: Method::GET,
            path: path.to_string(),
            query: Vec::new(),
            form: Vec::new(),
        }
    }

    pub fn post(path: &str) -> Self {
        Self {
            method: Method::POST,
            ..Self::get(path)
        }
    }

    /// Path under `/api/v1/`.
    pub fn api(method: Method, path: &str) -> Self {
        Self {
            method,
            ..Self::get(&format!("{}{}", API_PREFIX, path.trim_start_matches('/')))
        }
    }

    pub fn query(mut self, key: &str, value: impl Into<String>) -> Self {
        self.query.push((key.to_string(), value.into()));
        self
    }

    pub fn form(mut self, key: &str, value: impl Into<String>) -> Self {
        self.form.push((key.to_string(), value.into()));
        self
    }
}

/// Status, cookies and body of an upstream response, read in full.
#[derive(Debug, Clone)]
pub struct RawResponse {
    pub status: StatusCode,
    pub set_cookies: Vec<String>,
    pub body: String,
}

impl RawResponse {
    pub fn json<T: DeserializeOwned>(&self) -> Result<T, AppError> {
        serde_json::from_str(&self.body).map_err(|e| {
            error!("Failed to deserialize response body: {}", e);
            AppError::from(e)
        })
    }

    pub fn is_unauthorized(&self) -> bool {
        matches!(self.status, StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN)
    }
}

/// One persistent connection pool carrying the fixed Instagram headers.
#[derive(Debug, Clone)]
pub struct IgHttpClient {
    client: Client,
    base_url: String,
}

impl IgHttpClient {
    /// Creates a new instance of the IgHttpClient.
    ///
    /// # Arguments
    ///
    /// * `config` - Base URL and per-call timeout in seconds.
    ///
    /// # Returns
    ///
    /// A Result containing the IgHttpClient instance or an error.
    pub fn new(config: &RestApiConfig) -> Result<Self, AppError> {
        let client = Client::builder()
            .default_headers(default_headers())
            .timeout(Duration::from_secs(config.timeout))
            .build()?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    /// Sends the request with the session's cookies attached. Never inspects the status.
    #[instrument(
        skip(self, request, session),
        fields(method = %request.method, path = %request.path)
    )]
    pub async fn send(
        &self,
        request: &ApiRequest,
        session: Option<&Session>,
    ) -> Result<RawResponse, AppError> {
        let url = self.url(&request.path);
        debug!("Sending {} request to {}", request.method, url);

        let mut builder = self.client.request(request.method.clone(), &url);
        if !request.query.is_empty() {
            builder = builder.query(&request.query);
        }
        if !request.form.is_empty() {
            builder = builder.form(&request.form);
        }
        if let Some(session) = session {
            let state_changing = request.method != Method::GET;
            builder = builder.headers(session_headers(session, state_changing, &self.base_url));
        }

        let response = builder.send().await.map_err(|e| {
            error!("Failed to send {} request: {:?}", request.method, e);
            AppError::from(e)
        })?;

        let status = response.status();
        let set_cookies = response
            .headers()
            .get_all(header::SET_COOKIE)
            .iter()
            .filter_map(|v| v.to_str().ok())
            .map(String::from)
            .collect();
        let body = response.text().await?;

        debug!("Response Status: {}", status);
        Ok(RawResponse {
            status,
            set_cookies,
            body,
        })
    }
}

impl fmt::Display for IgHttpClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{\"base_url\":\"{}\"}}", self.base_url)
    }
}
