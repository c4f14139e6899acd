use crate::common::{
    seed_session, started_service, test_config, CountingAuthenticator, PROFILE_BODY,
};
use ig_media_client::application::models::media::MediaKind;
use ig_media_client::application::services::instagram_service::InstagramService;
use ig_media_client::config::PrivateAccountPolicy;
use ig_media_client::error::AppError;
use ig_media_client::presentation::response::ErrorBody;
use mockito::{Matcher, Server};
use pretty_assertions::assert_eq;
use serde_json::json;
use tempfile::TempDir;

#[tokio::test]
async fn test_profile_not_found_stops_resolution() {
    let mut server = Server::new_async().await;
    let dir = TempDir::new().unwrap();
    let config = test_config(&server.url(), dir.path(), false);
    seed_session(&config, "sessionid=abc");

    let profile = server
        .mock("GET", "/api/v1/users/web_profile_info/")
        .match_query(Matcher::UrlEncoded("username".into(), "ghost".into()))
        .with_status(404)
        .expect(1)
        .create_async()
        .await;
    let search = server
        .mock("GET", "/api/v1/web/search/topsearch/")
        .match_query(Matcher::Any)
        .expect(0)
        .create_async()
        .await;
    let page = server.mock("GET", "/ghost/").expect(0).create_async().await;

    let service = started_service(config, CountingAuthenticator::failing()).await;
    let error = service.get_stories("ghost").await.unwrap_err();

    assert!(matches!(&error, AppError::NotFound(u) if u == "ghost"));
    assert_eq!(ErrorBody::from(&error).status, 404);
    profile.assert_async().await;
    search.assert_async().await;
    page.assert_async().await;
}

#[tokio::test]
async fn test_page_scrape_fallback_with_enrichment() {
    let mut server = Server::new_async().await;
    let dir = TempDir::new().unwrap();
    let config = test_config(&server.url(), dir.path(), false);
    seed_session(&config, "sessionid=abc; csrftoken=tok");

    let _profile = server
        .mock("GET", "/api/v1/users/web_profile_info/")
        .match_query(Matcher::Any)
        .with_status(500)
        .create_async()
        .await;
    let _search = server
        .mock("GET", "/api/v1/web/search/topsearch/")
        .match_query(Matcher::Any)
        .with_status(200)
        .with_body(r#"{"users": []}"#)
        .create_async()
        .await;
    let _page = server
        .mock("GET", "/quiet.one/")
        .with_status(200)
        .with_body(
            r#"<meta property="og:title" content="Quiet One (&#064;quiet.one)" /><script>"profilePage_777"</script>"#,
        )
        .create_async()
        .await;
    let info = server
        .mock("GET", "/api/v1/users/777/info/")
        .with_status(200)
        .with_body(
            json!({"user": {
                "follower_count": 31,
                "media_count": 2,
                "profile_pic_url": "https://scontent/q.jpg"
            }})
            .to_string(),
        )
        .expect(1)
        .create_async()
        .await;
    let _reels = server
        .mock("POST", "/api/v1/feed/reels_media/")
        .match_body(Matcher::Regex("reel_ids=%5B%22777%22%5D".into()))
        .with_status(200)
        .with_body(
            json!({"reels": {"777": {"items": [
                {"pk": "5", "taken_at": 1700000000,
                 "video_versions": [{"url": "https://scontent/v.mp4"}],
                 "image_versions2": {"candidates": [{"url": "https://scontent/v.jpg"}]}}
            ]}}})
            .to_string(),
        )
        .create_async()
        .await;

    let service = started_service(config, CountingAuthenticator::failing()).await;
    let response = service.get_stories("quiet.one").await.unwrap();

    assert_eq!(response.user.full_name, "Quiet One");
    assert_eq!(response.user.followers, 31);
    assert_eq!(response.user.profile_pic_url, "https://scontent/q.jpg");
    assert_eq!(response.count, 1);
    assert_eq!(response.stories[0].media_type, MediaKind::Video);
    assert_eq!(response.stories[0].thumbnail_url.as_deref(), Some("https://scontent/v.jpg"));
    info.assert_async().await;
}

#[tokio::test]
async fn test_private_account_rejected_before_media_calls() {
    let mut server = Server::new_async().await;
    let dir = TempDir::new().unwrap();
    let config = test_config(&server.url(), dir.path(), false);
    seed_session(&config, "sessionid=abc");

    let _profile = server
        .mock("GET", "/api/v1/users/web_profile_info/")
        .match_query(Matcher::Any)
        .with_status(200)
        .with_body(PROFILE_BODY.replace("\"is_private\": false", "\"is_private\": true"))
        .create_async()
        .await;
    let reels = server
        .mock("POST", "/api/v1/feed/reels_media/")
        .expect(0)
        .create_async()
        .await;
    let feed = server
        .mock("GET", "/api/v1/feed/user/42/")
        .match_query(Matcher::Any)
        .expect(0)
        .create_async()
        .await;

    let service = started_service(config, CountingAuthenticator::failing()).await;

    assert!(matches!(
        service.get_stories("natgeo").await,
        Err(AppError::PrivateAccount(_))
    ));
    assert!(matches!(
        service.get_posts("natgeo", Some(5)).await,
        Err(AppError::PrivateAccount(_))
    ));
    reels.assert_async().await;
    feed.assert_async().await;
}

#[tokio::test]
async fn test_followed_private_account_with_allow_followed_policy() {
    let mut server = Server::new_async().await;
    let dir = TempDir::new().unwrap();
    let mut config = test_config(&server.url(), dir.path(), false);
    config.fetch.private_policy = PrivateAccountPolicy::AllowFollowed;
    seed_session(&config, "sessionid=abc");

    let body = PROFILE_BODY
        .replace("\"is_private\": false", "\"is_private\": true")
        .replace("\"followed_by_viewer\": false", "\"followed_by_viewer\": true");
    let _profile = server
        .mock("GET", "/api/v1/users/web_profile_info/")
        .match_query(Matcher::Any)
        .with_status(200)
        .with_body(body)
        .create_async()
        .await;
    let feed = server
        .mock("GET", "/api/v1/feed/user/42/")
        .match_query(Matcher::Any)
        .with_status(200)
        .with_body(r#"{"items": [], "more_available": false}"#)
        .expect(1)
        .create_async()
        .await;

    let service = started_service(config, CountingAuthenticator::failing()).await;
    let response = service.get_posts("natgeo", Some(5)).await.unwrap();

    assert!(response.user.is_private);
    assert_eq!(response.count, 0);
    feed.assert_async().await;
}

#[tokio::test]
async fn test_posts_are_bounded_by_pages_and_count() {
    let mut server = Server::new_async().await;
    let dir = TempDir::new().unwrap();
    let mut config = test_config(&server.url(), dir.path(), false);
    config.fetch.page_size = 3;
    config.fetch.page_delay_ms = 1;
    seed_session(&config, "sessionid=abc");

    let _profile = server
        .mock("GET", "/api/v1/users/web_profile_info/")
        .match_query(Matcher::Any)
        .with_status(200)
        .with_body(PROFILE_BODY)
        .create_async()
        .await;
    // Each page carries one carousel of two slides and always offers more.
    let page = json!({
        "items": [{
            "pk": 10, "media_type": 8, "taken_at": 1700000000,
            "carousel_media": [
                {"image_versions2": {"candidates": [{"url": "https://scontent/a.jpg"}]}},
                {"image_versions2": {"candidates": [{"url": "https://scontent/b.jpg"}]}}
            ]
        }],
        "more_available": true,
        "next_max_id": "next"
    });
    let feed = server
        .mock("GET", "/api/v1/feed/user/42/")
        .match_query(Matcher::UrlEncoded("count".into(), "3".into()))
        .with_status(200)
        .with_body(page.to_string())
        .expect(2)
        .create_async()
        .await;

    let service = started_service(config, CountingAuthenticator::failing()).await;
    let response = service.get_posts("natgeo", Some(5)).await.unwrap();

    assert_eq!(response.count, 4);
    assert!(response
        .posts
        .iter()
        .all(|p| p.post_id.as_deref() == Some("10") && p.carousel_total == Some(2)));
    feed.assert_async().await;
}

#[tokio::test]
async fn test_invalid_username_never_reaches_network() {
    let mut server = Server::new_async().await;
    let dir = TempDir::new().unwrap();
    let config = test_config(&server.url(), dir.path(), false);
    seed_session(&config, "sessionid=abc");
    let any = server.mock("GET", Matcher::Any).expect(0).create_async().await;

    let service = started_service(config, CountingAuthenticator::failing()).await;
    for bad in ["", "../etc", "has space", "x".repeat(31).as_str()] {
        assert!(matches!(
            service.get_posts(bad, None).await,
            Err(AppError::InvalidUsername(_))
        ));
    }
    any.assert_async().await;
}

#[tokio::test]
async fn test_media_proxy_rejects_foreign_hosts() {
    let server = Server::new_async().await;
    let dir = TempDir::new().unwrap();
    let service = InstagramService::with_authenticator(
        test_config(&server.url(), dir.path(), false),
        CountingAuthenticator::failing(),
    )
    .unwrap();

    assert!(matches!(
        service.proxy_media("https://evil.example.com/a.jpg").await,
        Err(AppError::InvalidMediaUrl(_))
    ));
    assert!(matches!(
        service.proxy_media("http://scontent.cdninstagram.com/a.jpg").await,
        Err(AppError::InvalidMediaUrl(_))
    ));
}
