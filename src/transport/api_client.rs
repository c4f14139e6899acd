use crate::error::AppError;
use crate::session::manager::SessionManager;
use crate::transport::http_client::{ApiRequest, IgHttpClient, RawResponse};
use reqwest::{Method, StatusCode};
use serde::de::DeserializeOwned;
use std::sync::Arc;
use tracing::{debug, error, info, instrument, warn};

/// Authenticated access to the upstream API.
///
/// Every call survives one session expiry: a 401/403 triggers a single
/// refresh and, when that succeeds, a single reissue of the call.
#[derive(Clone)]
pub struct ApiClient {
    http: IgHttpClient,
    sessions: Arc<SessionManager>,
}

impl ApiClient {
    pub fn new(http: IgHttpClient, sessions: Arc<SessionManager>) -> Self {
        Self { http, sessions }
    }

    pub fn sessions(&self) -> &Arc<SessionManager> {
        &self.sessions
    }

    /// Sends `request` under the refresh-and-retry-once policy and returns the
    /// final response without judging its status.
    #[instrument(skip(self, request), fields(path = %request.path))]
    pub async fn execute(&self, request: &ApiRequest) -> Result<RawResponse, AppError> {
        let (session, mut generation) = self
            .sessions
            .snapshot()
            .await
            .ok_or(AppError::SessionMissing)?;
        let mut response = self.http.send(request, Some(&session)).await?;

        if response.is_unauthorized() {
            warn!("Upstream rejected the session ({})", response.status);
            if self.sessions.refresh(generation).await {
                if let Some((session, fresh)) = self.sessions.snapshot().await {
                    info!("Retrying {} once after session refresh", request.path);
                    response = self.http.send(request, Some(&session)).await?;
                    generation = fresh;
                }
            } else {
                error!("Session refresh failed, surfacing {}", response.status);
            }
        }

        self.sessions
            .absorb_cookies(generation, &response.set_cookies)
            .await;
        Ok(response)
    }

    /// GET `/api/v1/<path>` and decode the JSON body.
    pub async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        params: &[(&str, &str)],
    ) -> Result<T, AppError> {
        let request = params
            .iter()
            .fold(ApiRequest::api(Method::GET, path), |r, (k, v)| r.query(k, *v));
        let response = self.execute(&request).await?;
        expect_ok(response)?.json()
    }

    /// POST a form to `/api/v1/<path>` and decode the JSON body.
    pub async fn post_form<T: DeserializeOwned>(
        &self,
        path: &str,
        form: &[(&str, &str)],
    ) -> Result<T, AppError> {
        let request = form
            .iter()
            .fold(ApiRequest::api(Method::POST, path), |r, (k, v)| r.form(k, *v));
        let response = self.execute(&request).await?;
        expect_ok(response)?.json()
    }
}

/// Maps a final response onto the error taxonomy: 429 is rate limiting,
/// everything else that is not 200 is an upstream error.
pub fn expect_ok(response: RawResponse) -> Result<RawResponse, AppError> {
    match response.status {
        StatusCode::OK => Ok(response),
        StatusCode::TOO_MANY_REQUESTS => {
            warn!("Upstream rate limit reached");
            Err(AppError::RateLimited)
        }
        status => {
            debug!("Upstream error body: {}", response.body);
            Err(AppError::Upstream(status))
        }
    }
}
