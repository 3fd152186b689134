#![allow(clippy::unwrap_used, clippy::panic, missing_debug_implementations, unreachable_pub)]
mod common;

use common::{FakePushProvider, FakeTokenStore, TestApp};
use reqwest::StatusCode;
use std::sync::atomic::Ordering;

#[tokio::test]
async fn test_livez() {
    let app = TestApp::spawn(FakeTokenStore::default(), FakePushProvider::default()).await;

    let resp = app.client.get(format!("{}/livez", app.mgmt_url)).send().await.unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_readyz_happy_path() {
    let app = TestApp::spawn(FakeTokenStore::default(), FakePushProvider::default()).await;

    let resp = app.client.get(format!("{}/readyz", app.mgmt_url)).send().await.unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    let body: serde_json::Value = resp.json().await.unwrap();
    assert_eq!(body["status"], "ok");
    assert_eq!(body["database"], "ok");
}

#[tokio::test]
async fn test_readyz_database_error() {
    let store = FakeTokenStore::default();
    store.fail_ping.store(true, Ordering::SeqCst);
    let app = TestApp::spawn(store, FakePushProvider::default()).await;

    let resp = app.client.get(format!("{}/readyz", app.mgmt_url)).send().await.unwrap();

    assert_eq!(resp.status(), StatusCode::SERVICE_UNAVAILABLE);
    let body: serde_json::Value = resp.json().await.unwrap();
    assert_eq!(body["status"], "error");
    assert_eq!(body["database"], "error");
}

#[tokio::test]
async fn test_health_routes_are_not_on_api_listener() {
    let app = TestApp::spawn(FakeTokenStore::default(), FakePushProvider::default()).await;

    let resp = app.client.get(format!("{}/livez", app.server_url)).send().await.unwrap();

    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}
