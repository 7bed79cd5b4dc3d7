//! End-to-end tests over a real socket.

mod common;

use std::time::Duration;

use endpoint_bridge::ServerConfig;

use common::{demo_app, spawn_server};

#[tokio::test]
async fn test_serves_and_shuts_down() {
    let (server, logger) = demo_app(ServerConfig::default());
    let running = spawn_server(server).await;
    let base = format!("http://{}", running.addr);
    let client = reqwest::Client::new();

    let response = client.get(format!("{base}/health")).send().await.unwrap();
    assert_eq!(response.status(), 200);
    assert!(response.headers().contains_key("x-request-id"));
    assert_eq!(response.text().await.unwrap(), "ok");

    let response = client.get(format!("{base}/users/9?id=3")).send().await.unwrap();
    assert_eq!(response.text().await.unwrap(), "user 3");

    let echo: serde_json::Value = client
        .put(format!("{base}/echo"))
        .body("over the wire")
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(echo["method"], "PUT");
    assert_eq!(echo["body"], "over the wire");
    assert!(!echo["request_id"].as_str().unwrap().is_empty());
    assert_eq!(logger.contents(), "[INFO] PUT /echo -> 200\n");

    running.shutdown.trigger();
    tokio::time::timeout(Duration::from_secs(5), running.handle)
        .await
        .expect("server did not stop")
        .unwrap()
        .unwrap();
}

#[tokio::test]
async fn test_panic_does_not_take_down_server() {
    let (server, _) = demo_app(ServerConfig::default());
    let running = spawn_server(server).await;
    let base = format!("http://{}", running.addr);

    for _ in 0..3 {
        let response = reqwest::get(format!("{base}/panic?message=again")).await.unwrap();
        assert_eq!(response.status(), 500);
        assert_eq!(response.text().await.unwrap(), "again");
    }

    let response = reqwest::get(format!("{base}/health")).await.unwrap();
    assert_eq!(response.status(), 200);

    running.shutdown.trigger();
}
