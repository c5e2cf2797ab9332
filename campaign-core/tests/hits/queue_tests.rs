// SPDX-FileCopyrightText: 2026 Mattia Egloff <mattia.egloff@pm.me>
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Durable hit queue behaviour

use std::sync::Arc;
use std::time::Duration;

use tempfile::TempDir;

use campaign_core::network::TransportError;
use campaign_core::{
    DurableHitQueue, HitProcessor, HitRecord, HttpMethod, HttpResponse, MockTransport,
    PrivacyStatus, RegistrationLedger, SharedStorage, Storage,
};

use super::common::{init_tracing, wait_until};

const RETRY: Duration = Duration::from_secs(30);
const TRACK_A: &str = "https://camp.test/r/?id=b1,d1,1&mcId=ecid";
const TRACK_B: &str = "https://camp.test/r/?id=b2,d2,2&mcId=ecid";
const REGISTER: &str = "https://camp.test/rest/head/mobileAppV5/pkey/subscriptions/ecid";

fn start(storage: SharedStorage, transport: &Arc<MockTransport>) -> (DurableHitQueue, RegistrationLedger) {
    init_tracing();
    let ledger = RegistrationLedger::new(Arc::clone(&storage));
    let processor = HitProcessor::new(transport.clone(), ledger.clone());
    (DurableHitQueue::start(storage, processor, RETRY), ledger)
}

fn memory() -> SharedStorage {
    Storage::in_memory().unwrap().into_shared()
}

fn ok_transport() -> Arc<MockTransport> {
    let transport = Arc::new(MockTransport::new());
    transport.set_fallback(HttpResponse::new(200, Vec::new()));
    transport
}

#[tokio::test(start_paused = true)]
async fn test_retry_keeps_head_in_place() {
    let transport = ok_transport();
    transport.respond_status(TRACK_A, 503);
    transport.respond_status(TRACK_A, 200);
    let (queue, _) = start(memory(), &transport);

    assert!(queue.enqueue(HitRecord::tracking(TRACK_A, 5)));
    assert!(queue.enqueue(HitRecord::tracking(TRACK_B, 5)));
    queue.handle_privacy_change(PrivacyStatus::OptIn);

    assert!(wait_until(Duration::from_secs(120), || queue.is_empty()).await);
    assert_eq!(
        transport.requested_urls(),
        vec![TRACK_A.to_string(), TRACK_A.to_string(), TRACK_B.to_string()]
    );
}

#[tokio::test(start_paused = true)]
async fn test_retry_waits_for_interval() {
    let transport = ok_transport();
    transport.fail(TRACK_A, TransportError::Timeout);
    let (queue, _) = start(memory(), &transport);

    queue.enqueue(HitRecord::tracking(TRACK_A, 5));
    queue.handle_privacy_change(PrivacyStatus::OptIn);

    assert!(wait_until(Duration::from_secs(1), || transport.request_count() == 1).await);
    tokio::time::sleep(RETRY / 2).await;
    assert_eq!(transport.request_count(), 1);

    tokio::time::sleep(RETRY).await;
    assert!(transport.request_count() >= 2);
    assert_eq!(queue.len(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_privacy_flip_keeps_full_backoff() {
    let transport = ok_transport();
    transport.respond_status(TRACK_A, 503);
    transport.respond_status(TRACK_A, 200);
    let (queue, _) = start(memory(), &transport);

    queue.enqueue(HitRecord::tracking(TRACK_A, 5));
    queue.handle_privacy_change(PrivacyStatus::OptIn);
    assert!(wait_until(Duration::from_secs(1), || transport.request_count() == 1).await);

    // Unknown and back to OptIn while the worker is backing off
    tokio::time::sleep(Duration::from_secs(10)).await;
    queue.handle_privacy_change(PrivacyStatus::Unknown);
    tokio::task::yield_now().await;
    queue.handle_privacy_change(PrivacyStatus::OptIn);
    tokio::time::sleep(Duration::from_secs(1)).await;
    assert_eq!(transport.request_count(), 1);

    assert!(wait_until(RETRY, || queue.is_empty()).await);
    assert_eq!(
        transport.requested_urls(),
        vec![TRACK_A.to_string(), TRACK_A.to_string()]
    );
}

#[tokio::test(start_paused = true)]
async fn test_permanent_failure_is_discarded() {
    let transport = ok_transport();
    transport.respond_status(TRACK_A, 404);
    let (queue, _) = start(memory(), &transport);

    queue.enqueue(HitRecord::tracking(TRACK_A, 5));
    queue.enqueue(HitRecord::tracking(TRACK_B, 5));
    queue.handle_privacy_change(PrivacyStatus::OptIn);

    assert!(wait_until(Duration::from_secs(5), || queue.is_empty()).await);
    assert_eq!(transport.requests_to(TRACK_A).len(), 1);
    assert_eq!(transport.requests_to(TRACK_B).len(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_unknown_privacy_holds_hits() {
    let transport = ok_transport();
    let (queue, _) = start(memory(), &transport);

    queue.enqueue(HitRecord::tracking(TRACK_A, 5));
    tokio::time::sleep(Duration::from_secs(300)).await;

    assert_eq!(transport.request_count(), 0);
    assert_eq!(queue.len(), 1);
    assert_eq!(queue.privacy(), PrivacyStatus::Unknown);
}

#[tokio::test(start_paused = true)]
async fn test_opt_out_mid_backoff_purges_queue() {
    let transport = ok_transport();
    transport.respond_status(TRACK_A, 503);
    let (queue, _) = start(memory(), &transport);

    queue.enqueue(HitRecord::tracking(TRACK_A, 5));
    queue.enqueue(HitRecord::tracking(TRACK_B, 5));
    queue.handle_privacy_change(PrivacyStatus::OptIn);
    assert!(wait_until(Duration::from_secs(1), || transport.request_count() == 1).await);

    queue.handle_privacy_change(PrivacyStatus::OptOut);

    assert!(queue.is_empty());
    assert!(!queue.enqueue(HitRecord::tracking(TRACK_B, 5)));
    tokio::time::sleep(RETRY * 4).await;
    assert_eq!(transport.request_count(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_opt_in_after_unknown_resumes_delivery() {
    let transport = ok_transport();
    let (queue, _) = start(memory(), &transport);

    queue.enqueue(HitRecord::tracking(TRACK_A, 5));
    queue.handle_privacy_change(PrivacyStatus::Unknown);
    tokio::time::sleep(Duration::from_secs(10)).await;
    assert_eq!(transport.request_count(), 0);

    queue.handle_privacy_change(PrivacyStatus::OptIn);

    assert!(wait_until(Duration::from_secs(1), || queue.is_empty()).await);
    assert_eq!(transport.request_count(), 1);
}

#[tokio::test]
async fn test_hits_survive_restart() {
    let dir = TempDir::new().unwrap();
    let db = dir.path().join("campaign.db");
    let transport = ok_transport();

    let (first, _) = start(Storage::open(&db).unwrap().into_shared(), &transport);
    first.enqueue(HitRecord::tracking(TRACK_A, 5));
    first.enqueue(HitRecord::tracking(TRACK_B, 5));
    first.shutdown().await;
    drop(first);
    assert_eq!(transport.request_count(), 0);

    let (second, _) = start(Storage::open(&db).unwrap().into_shared(), &transport);
    assert_eq!(second.len(), 2);
    second.handle_privacy_change(PrivacyStatus::OptIn);

    assert!(wait_until(Duration::from_secs(5), || second.is_empty()).await);
    assert_eq!(
        transport.requested_urls(),
        vec![TRACK_A.to_string(), TRACK_B.to_string()]
    );
}

#[tokio::test(start_paused = true)]
async fn test_registration_success_records_timestamp() {
    let transport = ok_transport();
    let (queue, ledger) = start(memory(), &transport);

    queue.enqueue(HitRecord::tracking(TRACK_A, 5));
    queue.handle_privacy_change(PrivacyStatus::OptIn);
    assert!(wait_until(Duration::from_secs(1), || queue.is_empty()).await);
    assert_eq!(ledger.last_registration_timestamp().unwrap(), -1);

    queue.enqueue(HitRecord::new(REGISTER, r#"{"pushPlatform":"gcm"}"#, 5));
    assert!(wait_until(Duration::from_secs(1), || queue.is_empty()).await);

    assert!(ledger.last_registration_timestamp().unwrap() > 0);
    let request = &transport.requests_to(REGISTER)[0];
    assert_eq!(request.method, HttpMethod::Post);
    assert_eq!(request.header("Content-Type"), Some("application/json"));
    assert_eq!(request.header("Connection"), Some("close"));
    assert_eq!(request.header("Accept"), Some("*/*"));
}

#[tokio::test(start_paused = true)]
async fn test_failed_registration_keeps_timestamp() {
    let transport = ok_transport();
    transport.respond_status(REGISTER, 400);
    let (queue, ledger) = start(memory(), &transport);

    queue.enqueue(HitRecord::new(REGISTER, "{}", 5));
    queue.handle_privacy_change(PrivacyStatus::OptIn);

    assert!(wait_until(Duration::from_secs(1), || queue.is_empty()).await);
    assert_eq!(ledger.last_registration_timestamp().unwrap(), -1);
}

#[tokio::test]
async fn test_shutdown_is_idempotent() {
    let transport = ok_transport();
    let (queue, _) = start(memory(), &transport);

    queue.shutdown().await;
    queue.shutdown().await;

    // Still accepts hits for the next start
    assert!(queue.enqueue(HitRecord::tracking(TRACK_A, 5)));
    assert_eq!(queue.len(), 1);
}
