//! Integration tests for label management, including the reserved-name
//! guards and the in-use conflict check.

use github_issue_blog::blog::BlogService;
use github_issue_blog::config::Config;
use github_issue_blog::error::Error;
use github_issue_blog::github::GitHubClient;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn test_service(api_url: &str) -> BlogService {
    let config = Config {
        github_api_url: api_url.to_string(),
        ..Config::for_testing()
    };
    BlogService::new(GitHubClient::from_config(&config).expect("Failed to create client"))
}

fn issue_json(number: u64, title: &str) -> serde_json::Value {
    serde_json::json!({
        "number": number,
        "title": title,
        "body": "Body",
        "created_at": "2024-01-01T00:00:00Z",
        "updated_at": "2024-01-01T00:00:00Z",
        "html_url": format!("https://github.com/test-owner/test-repo/issues/{number}"),
        "comments": 0,
        "state": "open",
        "labels": [],
        "user": null
    })
}

async fn assert_no_requests(server: &MockServer) {
    let requests = server
        .received_requests()
        .await
        .expect("request recording disabled");
    assert!(
        requests.is_empty(),
        "expected no remote calls, got {}",
        requests.len()
    );
}

#[tokio::test]
async fn test_create_label_rejects_reserved_name_in_any_case() {
    let mock_server = MockServer::start().await;
    let service = test_service(&mock_server.uri());

    for name in ["pinned", "PINNED", "Pinned"] {
        let err = service
            .create_label(name, "ff0000", None)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Validation(_)), "name {name}: {err:?}");
        assert!(err.to_string().contains("reserved"));
    }
    assert_no_requests(&mock_server).await;
}

#[tokio::test]
async fn test_create_label_requires_name_and_color() {
    let mock_server = MockServer::start().await;
    let service = test_service(&mock_server.uri());

    assert!(matches!(
        service.create_label("", "ff0000", None).await.unwrap_err(),
        Error::Validation(_)
    ));
    assert!(matches!(
        service.create_label("news", "", None).await.unwrap_err(),
        Error::Validation(_)
    ));
    assert_no_requests(&mock_server).await;
}

#[tokio::test]
async fn test_delete_label_rejects_exact_reserved_name_only() {
    let mock_server = MockServer::start().await;
    let service = test_service(&mock_server.uri());

    let err = service.delete_label("pinned").await.unwrap_err();
    assert!(matches!(err, Error::Validation(_)));
    assert_no_requests(&mock_server).await;
}

#[tokio::test]
async fn test_delete_label_distinct_case_variant_is_deletable() {
    let mock_server = MockServer::start().await;

    // "Pinned" is a distinct, non-reserved label under the tracker's
    // case-sensitive naming; deletion only guards the exact name "pinned".
    Mock::given(method("GET"))
        .and(path("/repos/test-owner/test-repo/issues"))
        .and(query_param("labels", "Pinned"))
        .and(query_param("state", "all"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([])))
        .expect(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("DELETE"))
        .and(path("/repos/test-owner/test-repo/labels/Pinned"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&mock_server)
        .await;

    let service = test_service(&mock_server.uri());
    service
        .delete_label("Pinned")
        .await
        .expect("delete_label failed");
}

#[tokio::test]
async fn test_delete_label_in_use_reports_blocking_posts() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/repos/test-owner/test-repo/issues"))
        .and(query_param("labels", "news"))
        .and(query_param("state", "all"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([
            issue_json(3, "First post"),
            issue_json(7, "Second post"),
        ])))
        .expect(1)
        .mount(&mock_server)
        .await;

    let service = test_service(&mock_server.uri());
    let err = service.delete_label("news").await.unwrap_err();

    match err {
        Error::Conflict { message, posts } => {
            assert!(message.contains("2 post(s)"), "message: {message}");
            let numbers: Vec<_> = posts.iter().map(|p| p.number).collect();
            assert_eq!(numbers, vec![3, 7]);
            assert_eq!(posts[0].title, "First post");
        }
        other => panic!("expected Conflict, got {other:?}"),
    }

    // Only the cross-reference query ran; no DELETE was attempted.
    let requests = mock_server.received_requests().await.unwrap();
    assert_eq!(requests.len(), 1);
}

#[tokio::test]
async fn test_delete_unused_label_succeeds() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/repos/test-owner/test-repo/issues"))
        .and(query_param("labels", "stale"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([])))
        .expect(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("DELETE"))
        .and(path("/repos/test-owner/test-repo/labels/stale"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&mock_server)
        .await;

    let service = test_service(&mock_server.uri());
    service
        .delete_label("stale")
        .await
        .expect("delete_label failed");
}

#[tokio::test]
async fn test_list_labels_displays_color_with_hash() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/repos/test-owner/test-repo/labels"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([{
            "id": 1,
            "name": "news",
            "color": "0075ca",
            "description": "News posts",
            "default": false
        }])))
        .mount(&mock_server)
        .await;

    let service = test_service(&mock_server.uri());
    let labels = service.list_labels().await.expect("list_labels failed");

    assert_eq!(labels.len(), 1);
    assert_eq!(labels[0].color, "#0075ca");
}
