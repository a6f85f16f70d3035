use pulse_social::{CommunityApi, TweetSource};
use serde_json::json;
use wiremock::matchers::{header, method, path, query_param, query_param_is_missing};
use wiremock::{Mock, MockServer, ResponseTemplate};

const COMMUNITY: &str = "1951903018464772103";

fn api(server: &MockServer) -> CommunityApi {
    CommunityApi::new(&server.uri(), "test-key".into(), COMMUNITY.into())
        .unwrap()
        .with_page_size(50)
}

#[tokio::test]
async fn first_page_has_no_cursor() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(format!("/twitter/community/{COMMUNITY}/tweets")))
        .and(header("authorization", "Bearer test-key"))
        .and(query_param("type", "Latest"))
        .and(query_param("limit", "50"))
        .and(query_param_is_missing("cursor"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "tweets": [
                { "id_str": "1", "created_at": "2024-01-01T00:00:00Z", "user": { "screen_name": "a" } }
            ],
            "next_cursor": "abc"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let page = api(&server).fetch_page(None).await.unwrap();
    assert_eq!(page.cursor(), Some("abc"));
    let (tweets, _) = page.into_parts();
    assert_eq!(tweets.len(), 1);
    assert_eq!(tweets[0].screen_name(), Some("a"));
}

#[tokio::test]
async fn cursor_is_forwarded() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(query_param("cursor", "abc"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "tweets": [],
            "next_cursor": null
        })))
        .expect(1)
        .mount(&server)
        .await;

    let page = api(&server).fetch_page(Some("abc")).await.unwrap();
    assert_eq!(page.cursor(), None);
}

#[tokio::test]
async fn unauthorized_is_an_error_with_context() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(
            ResponseTemplate::new(401).set_body_json(json!({
                "status": "error",
                "message": "Unauthorized"
            })),
        )
        .expect(1)
        .mount(&server)
        .await;

    let err = api(&server).fetch_page(None).await.unwrap_err();
    let chain = format!("{err:#}");
    assert!(chain.contains(COMMUNITY));
    assert!(chain.contains("Unauthorized"));
}

#[test]
fn page_size_is_clamped() {
    let api = CommunityApi::new("https://api.socialdata.tools", "k".into(), "1".into())
        .unwrap()
        .with_page_size(0);
    assert_eq!(api.page_size(), 1);
    let api = api.with_page_size(1_000);
    assert_eq!(api.page_size(), 100);
}
