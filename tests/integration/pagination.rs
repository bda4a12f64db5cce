//! Link-header pagination against a mock server

use futures::TryStreamExt;
use serde_json::json;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use gitspoke::fetcher::Paginator;

use super::support;

fn next_link(server: &MockServer, page: u32) -> String {
    format!(
        "<{}{}?page={page}>; rel=\"next\", <{}{}?page=3>; rel=\"last\"",
        server.uri(),
        support::api_path("issues"),
        server.uri(),
        support::api_path("issues"),
    )
}

async fn mount_three_pages(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path(support::api_path("issues")))
        .and(query_param("per_page", "100"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("link", next_link(server, 2).as_str())
                .set_body_json(json!([{"number": 1}, {"number": 2}])),
        )
        .mount(server)
        .await;

    Mock::given(method("GET"))
        .and(path(support::api_path("issues")))
        .and(query_param("page", "2"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("link", next_link(server, 3).as_str())
                .set_body_json(json!([{"number": 3}, {"number": 4}])),
        )
        .mount(server)
        .await;

    Mock::given(method("GET"))
        .and(path(support::api_path("issues")))
        .and(query_param("page", "3"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{"number": 5}])))
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_collects_every_page_in_order() {
    let server = MockServer::start().await;
    mount_three_pages(&server).await;

    let paginator = Paginator::new(support::client(&server));
    let items = paginator
        .collect(&support::api_path("issues"), None)
        .await
        .unwrap();

    let numbers: Vec<i64> = items.iter().map(|i| i["number"].as_i64().unwrap()).collect();
    assert_eq!(numbers, vec![1, 2, 3, 4, 5]);

    let requests = server.received_requests().await.unwrap();
    assert_eq!(requests.len(), 3);
    // Only the first request carries per_page; cursors are followed verbatim
    assert!(requests[0].url.query().unwrap_or("").contains("per_page=100"));
    assert!(!requests[1].url.query().unwrap_or("").contains("per_page"));
    assert!(!requests[2].url.query().unwrap_or("").contains("per_page"));
}

#[tokio::test]
async fn test_stream_is_lazy_and_restartable() {
    let server = MockServer::start().await;
    mount_three_pages(&server).await;

    let paginator = Paginator::new(support::client(&server));
    let mut stream = paginator.paginate(&support::api_path("issues"), None);
    let first = stream.try_next().await.unwrap().unwrap();
    assert_eq!(first["number"], json!(1));
    drop(stream);
    assert_eq!(server.received_requests().await.unwrap().len(), 1);

    let all = paginator.collect(&support::api_path("issues"), None).await.unwrap();
    assert_eq!(all.len(), 5);
}

#[tokio::test]
async fn test_pagination_limit_truncates_with_items_kept() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(support::api_path("issues")))
        .and(query_param("per_page", "100"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("link", next_link(&server, 2).as_str())
                .set_body_json(json!([{"number": 1}])),
        )
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(support::api_path("issues")))
        .and(query_param("page", "2"))
        .respond_with(ResponseTemplate::new(422).set_body_json(json!({
            "message": "In order to keep the API fast for everyone, pagination is limited for this resource.",
        })))
        .mount(&server)
        .await;

    let paginator = Paginator::new(support::client(&server));
    let items = paginator
        .collect(&support::api_path("issues"), None)
        .await
        .unwrap();

    assert_eq!(items, vec![json!({"number": 1})]);
}

#[tokio::test]
async fn test_other_422_is_an_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(support::api_path("issues")))
        .respond_with(ResponseTemplate::new(422).set_body_json(json!({"message": "Validation Failed"})))
        .mount(&server)
        .await;

    let paginator = Paginator::new(support::client(&server));
    let err = paginator
        .collect(&support::api_path("issues"), None)
        .await
        .unwrap_err();

    assert_eq!(err.status(), Some(422));
}

#[tokio::test]
async fn test_non_array_page_is_parse_error() {
    let server = MockServer::start().await;
    support::mount_json(&server, "issues", json!({"message": "not a list"})).await;

    let paginator = Paginator::new(support::client(&server));
    let err = paginator
        .collect(&support::api_path("issues"), None)
        .await
        .unwrap_err();

    assert!(matches!(err, gitspoke::fetcher::FetcherError::Parse(_)));
}
