//! Integration tests for the transactional upload path: compensating
//! deletes when the record write fails, and staged-file cleanup when
//! the upload itself fails.

mod common;

use axum::http::StatusCode;
use common::{bytes_request, FlakyIdentityStore, FlakyMediaStore, TestServer};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

#[tokio::test]
async fn test_record_write_failure_compensates_upload() {
    let fail_writes = Arc::new(AtomicBool::new(false));
    let deletes = Arc::new(Mutex::new(Vec::new()));

    let fw = Arc::clone(&fail_writes);
    let fu = Arc::new(AtomicBool::new(false));
    let d = Arc::clone(&deletes);
    let server = TestServer::with_stores(
        move |inner| Arc::new(FlakyIdentityStore::new(inner, fw)),
        move |inner| Arc::new(FlakyMediaStore::new(inner, fu, d)),
    )
    .await;

    let (access, _) = server.register_and_login("ada", "s3cret!").await;
    fail_writes.store(true, Ordering::SeqCst);

    let (status, _) = bytes_request(
        &server.router,
        "PUT",
        "/v1/identity/avatar",
        vec![1, 2, 3],
        "image/png",
        Some(access.as_str()),
    )
    .await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);

    // The uploaded asset was compensated away and nothing references it
    assert_eq!(deletes.lock().unwrap().len(), 1);
    assert_eq!(TestServer::file_count(&server.media_root), 0);
    assert_eq!(TestServer::file_count(&server.staging_dir), 0);

    let row = server
        .state
        .identities
        .find_by_identifier("ada")
        .await
        .unwrap()
        .unwrap();
    assert!(row.avatar_id.is_none());
    assert!(row.avatar_url.is_none());
}

#[tokio::test]
async fn test_upload_failure_is_bad_gateway() {
    let fail_uploads = Arc::new(AtomicBool::new(false));
    let deletes = Arc::new(Mutex::new(Vec::new()));

    let fu = Arc::clone(&fail_uploads);
    let d = Arc::clone(&deletes);
    let server = TestServer::with_stores(
        |inner| inner,
        move |inner| Arc::new(FlakyMediaStore::new(inner, fu, d)),
    )
    .await;

    let (access, _) = server.register_and_login("ada", "s3cret!").await;
    fail_uploads.store(true, Ordering::SeqCst);

    let (status, body) = bytes_request(
        &server.router,
        "PUT",
        "/v1/identity/avatar",
        vec![1, 2, 3],
        "image/png",
        Some(access.as_str()),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(body["code"], "upload_failed");

    // Nothing was stored, nothing to compensate, staging is clean
    assert!(deletes.lock().unwrap().is_empty());
    assert_eq!(TestServer::file_count(&server.media_root), 0);
    assert_eq!(TestServer::file_count(&server.staging_dir), 0);

    let row = server
        .state
        .identities
        .find_by_identifier("ada")
        .await
        .unwrap()
        .unwrap();
    assert!(row.avatar_id.is_none());
}

#[tokio::test]
async fn test_recovery_after_transient_write_failure() {
    let fail_writes = Arc::new(AtomicBool::new(false));
    let deletes = Arc::new(Mutex::new(Vec::new()));

    let fw = Arc::clone(&fail_writes);
    let fu = Arc::new(AtomicBool::new(false));
    let d = Arc::clone(&deletes);
    let server = TestServer::with_stores(
        move |inner| Arc::new(FlakyIdentityStore::new(inner, fw)),
        move |inner| Arc::new(FlakyMediaStore::new(inner, fu, d)),
    )
    .await;

    let (access, _) = server.register_and_login("ada", "s3cret!").await;

    fail_writes.store(true, Ordering::SeqCst);
    let (status, _) = bytes_request(
        &server.router,
        "PUT",
        "/v1/identity/avatar",
        vec![1, 2, 3],
        "image/png",
        Some(access.as_str()),
    )
    .await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);

    // The failed attempt left no state behind; a retry succeeds cleanly
    fail_writes.store(false, Ordering::SeqCst);
    let (status, body) = bytes_request(
        &server.router,
        "PUT",
        "/v1/identity/avatar",
        vec![1, 2, 3],
        "image/png",
        Some(access.as_str()),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["avatar_url"].as_str().is_some());
    assert_eq!(TestServer::file_count(&server.media_root), 1);
    assert_eq!(TestServer::file_count(&server.staging_dir), 0);
}
