use crate::common::{
    seed_session, started_service, test_config, CountingAuthenticator, PROFILE_BODY,
};
use base64::{engine::general_purpose, Engine};
use ig_media_client::application::services::instagram_service::InstagramService;
use ig_media_client::error::AppError;
use ig_media_client::session::keepalive::keepalive_once;
use ig_media_client::storage::session_store::SessionStore;
use ig_media_client::utils::logger::setup_logger;
use mockito::{Matcher, Server};
use pretty_assertions::assert_eq;
use reqwest::StatusCode;
use serde_json::Value;
use std::fs;
use tempfile::TempDir;

#[tokio::test]
async fn test_empty_session_dir_reports_missing_session() {
    setup_logger();
    let mut server = Server::new_async().await;
    let dir = TempDir::new().unwrap();
    let any = server.mock("GET", Matcher::Any).expect(0).create_async().await;
    let authenticator = CountingAuthenticator::failing();

    let service = InstagramService::with_authenticator(
        test_config(&server.url(), dir.path(), false),
        authenticator.clone(),
    )
    .unwrap();

    assert!(!service.start().await);
    let status = service.session_status().await;
    assert!(!status.logged_in);
    assert_eq!(status.username, None);
    assert!(matches!(
        service.get_posts("natgeo", Some(10)).await,
        Err(AppError::SessionMissing)
    ));
    assert_eq!(authenticator.count(), 0);
    any.assert_async().await;
}

#[tokio::test]
async fn test_expired_session_refreshes_once_and_retries_once() {
    setup_logger();
    let mut server = Server::new_async().await;
    let dir = TempDir::new().unwrap();
    let config = test_config(&server.url(), dir.path(), true);
    seed_session(&config, "sessionid=old");

    let stale = server
        .mock("GET", "/api/v1/users/web_profile_info/")
        .match_query(Matcher::Any)
        .match_header("cookie", Matcher::Regex("sessionid=old".into()))
        .with_status(401)
        .expect(1)
        .create_async()
        .await;
    let fresh = server
        .mock("GET", "/api/v1/users/web_profile_info/")
        .match_query(Matcher::Any)
        .match_header("cookie", Matcher::Regex("sessionid=new".into()))
        .with_status(200)
        .with_body(PROFILE_BODY)
        .expect(1)
        .create_async()
        .await;
    let reels = server
        .mock("POST", "/api/v1/feed/reels_media/")
        .match_header("cookie", Matcher::Regex("sessionid=new".into()))
        .with_status(200)
        .with_body(r#"{"reels": {}}"#)
        .expect(1)
        .create_async()
        .await;

    let authenticator = CountingAuthenticator::issuing("sessionid=new; csrftoken=t");
    let service = started_service(config, authenticator.clone()).await;
    let response = service.get_stories("natgeo").await.unwrap();

    assert_eq!(response.user.username, "natgeo");
    assert_eq!(response.count, 0);
    assert_eq!(authenticator.count(), 1);
    stale.assert_async().await;
    fresh.assert_async().await;
    reels.assert_async().await;

    let stored = service.sessions().store().load("viewer").unwrap();
    assert_eq!(stored.cookie("sessionid"), Some("new"));
}

#[tokio::test]
async fn test_concurrent_failures_share_one_refresh() {
    let mut server = Server::new_async().await;
    let dir = TempDir::new().unwrap();
    let config = test_config(&server.url(), dir.path(), true);
    seed_session(&config, "sessionid=old");

    let _stale = server
        .mock("GET", "/api/v1/ping/")
        .match_header("cookie", Matcher::Regex("sessionid=old".into()))
        .with_status(403)
        .expect_at_least(1)
        .create_async()
        .await;
    let fresh = server
        .mock("GET", "/api/v1/ping/")
        .match_header("cookie", Matcher::Regex("sessionid=new".into()))
        .with_status(200)
        .with_body("{}")
        .expect(4)
        .create_async()
        .await;

    let authenticator = CountingAuthenticator::issuing("sessionid=new");
    let service = started_service(config, authenticator.clone()).await;
    let api = service.api().clone();

    let calls = (0..4).map(|_| {
        let api = api.clone();
        tokio::spawn(async move { api.get_json::<Value>("ping/", &[]).await })
    });
    for call in calls.collect::<Vec<_>>() {
        assert!(call.await.unwrap().is_ok());
    }

    assert_eq!(authenticator.count(), 1);
    fresh.assert_async().await;
}

#[tokio::test]
async fn test_failed_refresh_surfaces_unauthorized() {
    let mut server = Server::new_async().await;
    let dir = TempDir::new().unwrap();
    let config = test_config(&server.url(), dir.path(), true);
    seed_session(&config, "sessionid=old");

    let rejected = server
        .mock("GET", "/api/v1/ping/")
        .with_status(401)
        .expect(1)
        .create_async()
        .await;

    let authenticator = CountingAuthenticator::failing();
    let service = started_service(config, authenticator.clone()).await;
    fs::remove_file(dir.path().join("session-viewer")).unwrap();

    let result = service.api().get_json::<Value>("ping/", &[]).await;
    assert!(matches!(
        result,
        Err(AppError::Upstream(StatusCode::UNAUTHORIZED))
    ));
    assert_eq!(authenticator.count(), 1);

    let status = service.session_status().await;
    assert!(!status.logged_in);
    assert!(status.needs_manual_refresh);

    let next = service.api().get_json::<Value>("ping/", &[]).await;
    assert!(matches!(next, Err(AppError::SessionMissing)));
    rejected.assert_async().await;
}

#[tokio::test]
async fn test_rate_limit_is_not_retried_and_skips_refresh() {
    let mut server = Server::new_async().await;
    let dir = TempDir::new().unwrap();
    let config = test_config(&server.url(), dir.path(), true);
    seed_session(&config, "sessionid=old");

    let limited = server
        .mock("GET", "/api/v1/ping/")
        .with_status(429)
        .expect(1)
        .create_async()
        .await;

    let authenticator = CountingAuthenticator::issuing("sessionid=new");
    let service = started_service(config, authenticator.clone()).await;
    let result = service.api().get_json::<Value>("ping/", &[]).await;

    assert!(matches!(result, Err(AppError::RateLimited)));
    assert_eq!(authenticator.count(), 0);
    limited.assert_async().await;
}

#[tokio::test]
async fn test_keepalive_refreshes_expired_session() {
    let mut server = Server::new_async().await;
    let dir = TempDir::new().unwrap();
    let config = test_config(&server.url(), dir.path(), true);
    seed_session(&config, "sessionid=old");

    let _stale = server
        .mock("GET", "/api/v1/accounts/current_user/")
        .match_header("cookie", Matcher::Regex("sessionid=old".into()))
        .with_status(401)
        .create_async()
        .await;
    let _fresh = server
        .mock("GET", "/api/v1/accounts/current_user/")
        .match_header("cookie", Matcher::Regex("sessionid=new".into()))
        .with_status(200)
        .with_body(r#"{"user": {}}"#)
        .create_async()
        .await;

    let authenticator = CountingAuthenticator::issuing("sessionid=new");
    let service = started_service(config, authenticator.clone()).await;

    assert!(keepalive_once(service.api()).await);
    assert_eq!(authenticator.count(), 1);
    let status = service.session_status().await;
    assert!(status.logged_in);
    assert!(!status.needs_manual_refresh);
}

#[tokio::test]
async fn test_encrypted_session_files() {
    let server = Server::new_async().await;
    let dir = TempDir::new().unwrap();
    let mut config = test_config(&server.url(), dir.path(), false);
    config.storage.encryption_key = Some(general_purpose::STANDARD.encode([7u8; 32]));
    seed_session(&config, "sessionid=secret-cookie");

    let on_disk = fs::read_to_string(dir.path().join("session-viewer")).unwrap();
    assert!(!on_disk.contains("secret-cookie"));

    let service = started_service(config.clone(), CountingAuthenticator::failing()).await;
    let status = service.session_status().await;
    assert_eq!(status.username.as_deref(), Some("viewer"));
    assert!(status.has_sessionid);

    config.storage.encryption_key = None;
    let plain = SessionStore::new(&config.storage).unwrap();
    assert!(plain.load("viewer").is_err());
}
