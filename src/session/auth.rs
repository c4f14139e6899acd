use crate::config::Credentials;
use crate::error::AuthError;
use crate::session::interface::Authenticator;
use crate::session::session::Session;
use crate::transport::http_client::{ApiRequest, IgHttpClient};
use async_trait::async_trait;
use chrono::Utc;
use reqwest::StatusCode;
use serde::Deserialize;
use tracing::{debug, error, info, instrument, warn};

const LOGIN_PAGE: &str = "/accounts/login/";
const LOGIN_ENDPOINT: &str = "/accounts/login/ajax/";

#[derive(Debug, Default, Deserialize)]
struct LoginResponse {
    #[serde(default)]
    authenticated: Option<bool>,
    #[serde(default)]
    user: Option<bool>,
    #[serde(default)]
    two_factor_required: bool,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    checkpoint_url: Option<String>,
}

impl LoginResponse {
    fn is_challenge(&self) -> bool {
        self.checkpoint_url.is_some()
            || self.message.as_deref().is_some_and(|m| {
                m.contains("checkpoint_required") || m.contains("challenge_required")
            })
    }
}

/// Username/password login against the web login form.
pub struct WebAuthenticator {
    client: IgHttpClient,
}

impl WebAuthenticator {
    pub fn new(client: IgHttpClient) -> Self {
        Self { client }
    }

    fn encode_password(password: &str) -> String {
        format!("#PWD_INSTAGRAM_BROWSER:0:{}:{}", Utc::now().timestamp(), password)
    }
}

#[async_trait]
impl Authenticator for WebAuthenticator {
    #[instrument(skip(self, credentials), fields(username = %credentials.username))]
    async fn login(&self, credentials: &Credentials) -> Result<Session, AuthError> {
        info!("Attempting credential login for {}", credentials.username);
        let mut session = Session::new(&credentials.username);

        let landing = self.client.send(&ApiRequest::get(LOGIN_PAGE), None).await?;
        session.absorb_set_cookies(landing.set_cookies.iter().map(String::as_str));
        if session.csrf_token().is_none() {
            error!("Login page did not issue a csrftoken cookie");
            return Err(AuthError::Other("no csrf token issued".to_string()));
        }

        let request = ApiRequest::post(LOGIN_ENDPOINT)
            .form("username", credentials.username.as_str())
            .form("enc_password", Self::encode_password(&credentials.password))
            .form("queryParams", "{}")
            .form("optIntoOneTap", "false");
        let response = self.client.send(&request, Some(&session)).await?;
        session.absorb_set_cookies(response.set_cookies.iter().map(String::as_str));
        debug!("Login response status: {}", response.status);

        if response.status == StatusCode::TOO_MANY_REQUESTS {
            warn!("Login rate limited");
            return Err(AuthError::Unexpected(response.status));
        }
        let body: LoginResponse = match serde_json::from_str(&response.body) {
            Ok(body) => body,
            Err(e) if response.status.is_success() => return Err(AuthError::Json(e)),
            Err(_) => return Err(AuthError::Unexpected(response.status)),
        };

        if body.two_factor_required {
            error!("Login failed: two-factor authentication required");
            return Err(AuthError::TwoFactorRequired);
        }
        if body.is_challenge() {
            warn!("Login blocked: challenge required");
            return Err(AuthError::ChallengeRequired);
        }
        if !response.status.is_success() {
            return Err(AuthError::Unexpected(response.status));
        }
        match body.authenticated {
            Some(true) if session.has_sessionid() => {
                info!("Credential login successful for {}", credentials.username);
                Ok(session)
            }
            Some(true) => Err(AuthError::Other(
                "login accepted but no sessionid cookie was set".to_string(),
            )),
            _ => {
                debug!("Login rejected, user known: {:?}", body.user);
                Err(AuthError::BadCredentials)
            }
        }
    }
}
