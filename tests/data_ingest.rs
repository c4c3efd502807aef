//! Record ingestion and table rendering over real HTTP.

use axum::body::Body;
use axum::http::Request;
use reqwest::{header, StatusCode};
use serde_json::{json, Value};
use tower::ServiceExt;

mod common;

use common::{browser, spawn_app, test_config, API_TOKEN, PASSWORD, USERNAME};
use data_ingest::lifecycle::startup::build_state;
use data_ingest::HttpServer;

async fn login(client: &reqwest::Client, app: &common::TestApp) {
    let res = client
        .post(app.url("/login"))
        .json(&json!({ "username": USERNAME, "password": PASSWORD }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_ingest_then_render_table() {
    let app = spawn_app().await;
    let client = browser();

    let res = client
        .post(app.url("/data"))
        .bearer_auth(API_TOKEN)
        .json(&json!([{ "name": "Ana", "age": 25 }]))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body, json!({ "message": "data replaced", "total": 1 }));

    login(&client, &app).await;
    let page = client.get(app.url("/")).send().await.unwrap().text().await.unwrap();
    assert!(page.contains(r#"<th><a href="/?sort=name&amp;dir=asc">name</a></th><th><a href="/?sort=age&amp;dir=asc">age</a></th>"#));
    assert!(page.contains("<tr><td>Ana</td><td>25</td></tr>"));
}

#[tokio::test]
async fn test_ingest_replaces_previous_batch() {
    let app = spawn_app().await;
    let client = browser();

    for batch in [
        json!([{ "city": "Recife" }, { "city": "Natal" }]),
        json!([{ "name": "João", "active": true }]),
    ] {
        let res = client
            .post(app.url("/data"))
            .bearer_auth(API_TOKEN)
            .json(&batch)
            .send()
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::OK);
    }

    login(&client, &app).await;
    let page = client.get(app.url("/")).send().await.unwrap().text().await.unwrap();
    assert!(!page.contains("Recife"));
    assert!(page.contains("<tr><td>João</td><td>true</td></tr>"));

    let status: Value = client
        .get(app.url("/admin/status"))
        .bearer_auth(API_TOKEN)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(status["records"], 1);
    assert_eq!(status["active_sessions"], 1);
}

#[tokio::test]
async fn test_table_search_filter_and_sort() {
    let app = spawn_app().await;
    let client = browser();

    let res = client
        .post(app.url("/data"))
        .bearer_auth(API_TOKEN)
        .json(&json!([
            { "name": "Ana", "age": 25, "city": "Recife" },
            { "name": "Bia", "age": 9, "city": "Natal" },
            { "name": "Caio", "age": 40, "city": "Recife" }
        ]))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    login(&client, &app).await;

    let page = client
        .get(app.url("/?q=RECIFE&sort=age&dir=desc"))
        .send()
        .await
        .unwrap()
        .text()
        .await
        .unwrap();
    assert!(page.contains("2 of 3 records"));
    assert!(!page.contains("<td>Bia</td>"));
    let caio = page.find("<td>Caio</td>").unwrap();
    let ana = page.find("<td>Ana</td>").unwrap();
    assert!(caio < ana);

    let page = client
        .get(app.url("/?f.city=Natal"))
        .send()
        .await
        .unwrap()
        .text()
        .await
        .unwrap();
    assert!(page.contains("<tr><td>Bia</td><td>9</td><td>Natal</td></tr>"));
    assert!(page.contains("1 of 3 records"));

    let page = client
        .get(app.url("/?sort=age"))
        .send()
        .await
        .unwrap()
        .text()
        .await
        .unwrap();
    let order: Vec<usize> = ["<td>Bia</td>", "<td>Ana</td>", "<td>Caio</td>"]
        .iter()
        .map(|cell| page.find(cell).unwrap())
        .collect();
    assert!(order.windows(2).all(|w| w[0] < w[1]));
}

#[tokio::test]
async fn test_token_errors() {
    let app = spawn_app().await;
    let client = browser();
    let payload = json!([{ "a": 1 }]);

    let res = client.post(app.url("/data")).json(&payload).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(res.json::<Value>().await.unwrap()["error"], "missing token");

    let res = client
        .post(app.url("/data"))
        .bearer_auth("not-the-token")
        .json(&payload)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::FORBIDDEN);
    assert_eq!(res.json::<Value>().await.unwrap()["error"], "invalid token");

    let res = client
        .post(app.url("/data"))
        .header(header::AUTHORIZATION, format!("bearer {}", API_TOKEN))
        .json(&payload)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);

    // a session cookie does not stand in for the token
    login(&client, &app).await;
    let res = client.post(app.url("/data")).json(&payload).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_bad_payloads_leave_store_untouched() {
    let app = spawn_app().await;
    let client = browser();

    let res = client
        .post(app.url("/data"))
        .bearer_auth(API_TOKEN)
        .json(&json!([{ "keep": "me" }]))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    for body in [r#"{"name":"Ana"}"#, "[1, 2]", r#"[{"a":1}, "x"]"#, "[{"] {
        let res = client
            .post(app.url("/data"))
            .bearer_auth(API_TOKEN)
            .header(header::CONTENT_TYPE, "application/json")
            .body(body)
            .send()
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::BAD_REQUEST, "body {body}");
        assert!(res.json::<Value>().await.unwrap()["error"].is_string());
    }

    let res = client
        .post(app.url("/data"))
        .bearer_auth(API_TOKEN)
        .header(header::CONTENT_TYPE, "text/plain")
        .body("[]")
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    login(&client, &app).await;
    let page = client.get(app.url("/")).send().await.unwrap().text().await.unwrap();
    assert!(page.contains("<td>me</td>"));
}

#[tokio::test]
async fn test_empty_store_and_empty_batch() {
    let app = spawn_app().await;
    let client = browser();
    login(&client, &app).await;

    let page = client.get(app.url("/")).send().await.unwrap().text().await.unwrap();
    assert!(page.contains("No data available"));

    let res = client
        .post(app.url("/data"))
        .bearer_auth(API_TOKEN)
        .json(&json!([]))
        .send()
        .await
        .unwrap();
    assert_eq!(res.json::<Value>().await.unwrap()["total"], 0);

    let page = client.get(app.url("/")).send().await.unwrap().text().await.unwrap();
    assert!(page.contains("No data available"));
}

#[tokio::test]
async fn test_health_and_request_id() {
    let app = spawn_app().await;
    let client = browser();

    let res = client.get(app.url("/health")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    assert!(res.headers().contains_key("x-request-id"));
    assert_eq!(res.text().await.unwrap(), "OK");

    let res = client
        .get(app.url("/health"))
        .header("x-request-id", "trace-me-123")
        .send()
        .await
        .unwrap();
    assert_eq!(res.headers()["x-request-id"], "trace-me-123");
}

#[tokio::test]
async fn test_router_without_listener() {
    let state = build_state(test_config()).unwrap();
    let router = HttpServer::new(state).router();

    let res = router
        .clone()
        .oneshot(Request::get("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    let res = router
        .oneshot(
            Request::get("/admin/status")
                .header("authorization", format!("Bearer {}", API_TOKEN))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
}
