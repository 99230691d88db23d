use std::sync::Arc;

use axum::Router;
use axum::body::Body;
use axum::http::{Method, Request, StatusCode};
use http_body_util::BodyExt;
use movies_service::MovieService;
use movies_store::SeedDataset;
use moviesd::{api, open_store};
use serde_json::Value;
use tempfile::TempDir;
use tower::ServiceExt;

fn seeded_app() -> (TempDir, Router) {
    let temp = tempfile::tempdir().expect("tempdir");
    let store = open_store(temp.path(), None).expect("open store");
    store
        .seed(&SeedDataset::classic().expect("classic dataset"))
        .expect("seed");
    let app = api::router(Arc::new(MovieService::new(store)));
    (temp, app)
}

async fn send(app: &Router, method: Method, uri: &str) -> (StatusCode, Value) {
    let request = Request::builder()
        .method(method)
        .uri(uri)
        .body(Body::empty())
        .expect("request");
    let response = app.clone().oneshot(request).await.expect("response");
    let status = response.status();
    let bytes = response
        .into_body()
        .collect()
        .await
        .expect("body")
        .to_bytes();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).expect("json body")
    };
    (status, body)
}

#[tokio::test]
async fn details_route_returns_cast_and_404_for_unknown_title() {
    let (_temp, app) = seeded_app();

    let (status, body) = send(&app, Method::GET, "/movie/The%20Matrix").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["title"], "The Matrix");
    assert!(
        body["cast"]
            .as_array()
            .expect("cast array")
            .iter()
            .any(|member| member["name"] == "Keanu Reeves" && member["role"] == "Neo")
    );

    let (status, body) = send(&app, Method::GET, "/movie/Nope").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "not_found");
}

#[tokio::test]
async fn vote_route_returns_applied_count() {
    let (_temp, app) = seeded_app();

    let (status, body) = send(&app, Method::POST, "/movie/Top%20Gun/vote").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, Value::from(1));

    let (status, body) = send(&app, Method::POST, "/movie/Unknown/vote").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, Value::from(0));
}

#[tokio::test]
async fn page_route_serializes_camel_case_metadata() {
    let (_temp, app) = seeded_app();

    let (status, body) = send(
        &app,
        Method::GET,
        "/movie/examplePage?title=The&sorter=movie.released&pageSize=2&currentPage=0",
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["content"].as_array().expect("content").len(), 2);
    assert_eq!(body["content"][0]["movie"]["title"], "The Devil's Advocate");
    assert_eq!(body["totalElements"], 5);
    assert_eq!(body["totalPages"], 3);
    assert_eq!(body["size"], 2);
    assert_eq!(body["number"], 0);
}

#[tokio::test]
async fn page_route_rejects_bad_sort_and_missing_size() {
    let (_temp, app) = seeded_app();

    let (status, body) = send(
        &app,
        Method::GET,
        "/movie/examplePage?title=The&sorter=rank&pageSize=2&currentPage=0",
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "validation");

    let (status, _) = send(&app, Method::GET, "/movie/examplePage?title=The").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn released_route_validates_then_updates() {
    let (_temp, app) = seeded_app();

    let (status, body) = send(&app, Method::GET, "/movie/released?title=Top%20Gun").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "validation");

    let (status, _) = send(&app, Method::GET, "/movie/released?released=1990").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = send(
        &app,
        Method::GET,
        "/movie/released?title=Missing&released=1990",
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "not_found");

    let (status, _) = send(
        &app,
        Method::GET,
        "/movie/released?title=Top%20Gun&released=1987",
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (_, body) = send(&app, Method::GET, "/search?q=Top%20Gun").await;
    assert_eq!(body[0]["movie"]["released"], 1987);
}

#[tokio::test]
async fn delete_routes_remove_movie_once() {
    let (_temp, app) = seeded_app();

    let (status, _) = send(&app, Method::DELETE, "/movie/Speed%20Racer").await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = send(&app, Method::DELETE, "/movie/Speed%20Racer").await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (_, hits) = send(&app, Method::GET, "/search?q=Cloud").await;
    let id = hits[0]["movie"]["id"].as_i64().expect("movie id");
    let (status, _) = send(&app, Method::DELETE, &format!("/movie/id/{id}")).await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = send(&app, Method::GET, "/movie/Cloud%20Atlas").await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = send(&app, Method::DELETE, "/movie/id/not-a-number").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn search_route_strips_wildcards() {
    let (_temp, app) = seeded_app();

    let (status, body) = send(&app, Method::GET, "/search?q=*Matrix*").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().expect("results").len(), 3);

    let (status, body) = send(&app, Method::GET, "/search?q=*").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, Value::Array(Vec::new()));
}

#[tokio::test]
async fn store_failure_maps_to_500_query_error() {
    let (temp, app) = seeded_app();
    for suffix in ["", "-wal", "-shm"] {
        let path = temp.path().join(format!("movies.sqlite{suffix}"));
        if path.exists() {
            std::fs::remove_file(&path).expect("remove database file");
        }
    }

    let (status, body) = send(&app, Method::GET, "/graph").await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error"], "query");
    assert!(
        body["message"]
            .as_str()
            .expect("message")
            .contains("does not exist")
    );
}

#[tokio::test]
async fn graph_route_returns_nodes_and_links() {
    let (_temp, app) = seeded_app();

    let (status, body) = send(&app, Method::GET, "/graph").await;
    assert_eq!(status, StatusCode::OK);

    let nodes = body["nodes"].as_array().expect("nodes");
    let links = body["links"].as_array().expect("links");
    assert_eq!(nodes[0]["label"], "movie");
    assert!(!links.is_empty());
    for link in links {
        let source = link["source"].as_u64().expect("source") as usize;
        let target = link["target"].as_u64().expect("target") as usize;
        assert_eq!(nodes[source]["label"], "actor");
        assert_eq!(nodes[target]["label"], "movie");
    }
}
