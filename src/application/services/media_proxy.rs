use crate::constants::{ALLOWED_MEDIA_DOMAINS, MAX_MEDIA_REDIRECTS, MEDIA_PROXY_TIMEOUT};
use crate::error::AppError;
use crate::transport::headers::default_headers;
use reqwest::{header, redirect, Client};
use std::time::Duration;
use tracing::{debug, error, instrument, warn};
use url::Url;

/// Media bytes fetched from the CDN.
#[derive(Debug, Clone, PartialEq)]
pub struct ProxiedMedia {
    pub content_type: String,
    pub bytes: Vec<u8>,
}

/// True when `host` is one of the CDN domains or a subdomain of one.
pub fn is_allowed_media_host(host: &str) -> bool {
    let host = host.trim_end_matches('.').to_ascii_lowercase();
    ALLOWED_MEDIA_DOMAINS.iter().any(|domain| {
        host == *domain
            || host
                .strip_suffix(domain)
                .is_some_and(|prefix| prefix.ends_with('.'))
    })
}

/// Accepts only `https` URLs on Instagram CDN hosts.
pub fn validate_media_url(raw: &str) -> Result<Url, AppError> {
    let url = Url::parse(raw).map_err(|e| AppError::InvalidMediaUrl(e.to_string()))?;
    if url.scheme() != "https" {
        return Err(AppError::InvalidMediaUrl("only https is allowed".to_string()));
    }
    let host = url.host_str().unwrap_or_default();
    if !is_allowed_media_host(host) {
        return Err(AppError::InvalidMediaUrl(format!("{host} is not an Instagram CDN host")));
    }
    Ok(url)
}

/// Every redirect hop must pass the same check as the requested URL.
fn redirect_policy() -> redirect::Policy {
    redirect::Policy::custom(|attempt| {
        if attempt.previous().len() >= MAX_MEDIA_REDIRECTS {
            return attempt.error("too many redirects");
        }
        match validate_media_url(attempt.url().as_str()) {
            Ok(_) => attempt.follow(),
            Err(e) => {
                warn!("Refusing media redirect: {}", e);
                attempt.error(e)
            }
        }
    })
}

pub struct MediaProxy {
    client: Client,
}

impl MediaProxy {
    pub fn new() -> Result<Self, AppError> {
        Self::with_timeout(Duration::from_secs(MEDIA_PROXY_TIMEOUT))
    }

    pub fn with_timeout(timeout: Duration) -> Result<Self, AppError> {
        let client = Client::builder()
            .default_headers(default_headers())
            .redirect(redirect_policy())
            .timeout(timeout)
            .build()?;
        Ok(Self { client })
    }

    /// Validates `raw` and downloads it, following only CDN redirects.
    #[instrument(skip(self))]
    pub async fn fetch(&self, raw: &str) -> Result<ProxiedMedia, AppError> {
        let url = validate_media_url(raw)?;
        self.fetch_unchecked(url).await
    }

    async fn fetch_unchecked(&self, url: Url) -> Result<ProxiedMedia, AppError> {
        let response = self.client.get(url).send().await.map_err(|e| {
            if e.is_redirect() {
                AppError::InvalidMediaUrl(format!("redirect refused: {e}"))
            } else {
                AppError::from(e)
            }
        })?;
        let status = response.status();
        if !status.is_success() {
            error!("Media fetch failed with status {}", status);
            return Err(AppError::Upstream(status));
        }

        let content_type = response
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("application/octet-stream")
            .to_string();
        let bytes = response.bytes().await?.to_vec();
        debug!("Fetched {} bytes of {}", bytes.len(), content_type);
        Ok(ProxiedMedia {
            content_type,
            bytes,
        })
    }
}

#[cfg(test)]
mod tests_media_proxy {
    use super::*;
    use mockito::Server;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_accepts_cdn_hosts() {
        for raw in [
            "https://scontent-lhr8-1.cdninstagram.com/v/t51/a.jpg?x=1",
            "https://instagram.fmad3-1.fna.fbcdn.net/v/b.mp4",
            "https://www.instagram.com/p/abc/",
            "https://instagram.com/a.jpg",
            "https://SCONTENT.CDNINSTAGRAM.COM/a.jpg",
        ] {
            assert!(validate_media_url(raw).is_ok(), "{raw} should be accepted");
        }
    }

    #[test]
    fn test_rejects_other_urls() {
        for raw in [
            "http://scontent.cdninstagram.com/a.jpg",
            "https://example.com/a.jpg",
            "ftp://fbcdn.net/a.jpg",
            "not a url",
            "https://instagram.attacker.example/x",
            "https://notfbcdn.evil.net/x",
            "https://myscontent.internal.corp/admin",
            "https://evilinstagram.com/a.jpg",
            "https://cdninstagram.com.evil.net/a.jpg",
        ] {
            assert!(
                matches!(validate_media_url(raw), Err(AppError::InvalidMediaUrl(_))),
                "{raw} should be rejected"
            );
        }
    }

    #[tokio::test]
    async fn test_fetch_passes_content_through() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("GET", "/media.jpg")
            .with_status(200)
            .with_header("content-type", "image/jpeg")
            .with_body(vec![0xFF, 0xD8, 0xFF])
            .create_async()
            .await;

        let proxy = MediaProxy::new().unwrap();
        let url = Url::parse(&format!("{}/media.jpg", server.url())).unwrap();
        let media = proxy.fetch_unchecked(url).await.unwrap();

        assert_eq!(media.content_type, "image/jpeg");
        assert_eq!(media.bytes, vec![0xFF, 0xD8, 0xFF]);
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_redirect_off_cdn_is_refused() {
        let mut server = Server::new_async().await;
        let hop = server
            .mock("GET", "/hop.jpg")
            .with_status(302)
            .with_header("location", "https://instagram.attacker.example/steal")
            .expect(1)
            .create_async()
            .await;

        let proxy = MediaProxy::new().unwrap();
        let url = Url::parse(&format!("{}/hop.jpg", server.url())).unwrap();

        assert!(matches!(
            proxy.fetch_unchecked(url).await,
            Err(AppError::InvalidMediaUrl(_))
        ));
        hop.assert_async().await;
    }

    #[tokio::test]
    async fn test_fetch_failure_is_upstream() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("GET", "/gone.jpg")
            .with_status(404)
            .create_async()
            .await;

        let proxy = MediaProxy::new().unwrap();
        let url = Url::parse(&format!("{}/gone.jpg", server.url())).unwrap();
        assert!(matches!(
            proxy.fetch_unchecked(url).await,
            Err(AppError::Upstream(reqwest::StatusCode::NOT_FOUND))
        ));
    }
}
