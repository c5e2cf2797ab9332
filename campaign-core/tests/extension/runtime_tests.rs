// SPDX-FileCopyrightText: 2026 Mattia Egloff <mattia.egloff@pm.me>
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Shared-state handling, rule sync triggers and hit flows

use std::collections::BTreeMap;
use std::time::Duration;

use serde_json::{json, Map, Value};

use campaign_core::cache::RULES_NAMESPACE;
use campaign_core::rules::{LINKAGE_FIELDS_HEADER, RULES_FILE};
use campaign_core::{
    CampaignError, CampaignEvent, ConditionalCacheStore, HttpMethod, HttpResponse,
    IdentitySnapshot, OutboundEvent, PrivacyStatus, SyncOutcome,
};

use super::common::fixtures::{
    alert_consequence, config_with_privacy, launch_rule, opted_in_config, rules_bundle, ECID,
    REGISTRATION_URL, RULES_URL,
};
use super::common::wait_until;
use super::Harness;

fn serve_alert_rules(h: &Harness) {
    h.transport.respond(
        RULES_URL,
        HttpResponse::new(200, rules_bundle(json!([launch_rule(alert_consequence("m1"))])))
            .with_header("ETag", "\"v1\""),
    );
}

fn lifecycle(timestamp_millis: i64) -> CampaignEvent {
    CampaignEvent::LifecycleStart {
        timestamp_millis,
        extra: BTreeMap::new(),
    }
}

#[tokio::test]
async fn test_rules_download_once_configuration_and_identity_known() {
    let h = Harness::start();
    serve_alert_rules(&h);

    h.configure(opted_in_config()).await;
    assert_eq!(h.transport.requests_to(RULES_URL).len(), 0);

    h.send(CampaignEvent::IdentityUpdated(IdentitySnapshot::with_ecid(ECID)))
        .await;

    assert_eq!(h.transport.requests_to(RULES_URL).len(), 1);
    assert_eq!(h.runtime.rules_engine().len(), 1);
    assert!(h.events().iter().any(|event| matches!(
        event,
        OutboundEvent::RulesSynced { outcome: SyncOutcome::Updated { rules: 1, .. }, .. }
    )));
}

#[tokio::test]
async fn test_repeated_configuration_alternates_download() {
    let h = Harness::start();
    serve_alert_rules(&h);
    h.make_ready().await;
    assert_eq!(h.transport.requests_to(RULES_URL).len(), 1);

    // Download flag was cleared by the identity update, so this one re-arms it
    h.configure(opted_in_config()).await;
    assert_eq!(h.transport.requests_to(RULES_URL).len(), 1);

    h.configure(opted_in_config()).await;
    assert_eq!(h.transport.requests_to(RULES_URL).len(), 2);
}

#[tokio::test]
async fn test_empty_configuration_is_ignored() {
    let h = Harness::start();
    serve_alert_rules(&h);

    h.configure(campaign_core::ConfigurationSnapshot::default()).await;
    h.send(CampaignEvent::IdentityUpdated(IdentitySnapshot::with_ecid(ECID)))
        .await;

    assert_eq!(h.transport.request_count(), 0);
}

#[tokio::test]
async fn test_events_are_held_until_ready() {
    let h = Harness::start();
    serve_alert_rules(&h);

    let mut data = Map::new();
    data.insert("a.launches".to_string(), Value::from(3));
    h.send(CampaignEvent::EvaluateRules(data)).await;
    assert!(h.presenter.calls().is_empty());

    h.make_ready().await;

    assert_eq!(
        h.presenter.calls(),
        vec![super::common::fixtures::Presented::Alert("m1".to_string())]
    );
}

#[tokio::test]
async fn test_lifecycle_start_queues_registration() {
    let h = Harness::start();
    h.make_ready().await;

    let mut extra = BTreeMap::new();
    extra.insert("email".to_string(), "a@b.test".to_string());
    h.send(CampaignEvent::LifecycleStart {
        timestamp_millis: 1_700_000_000_000,
        extra,
    })
    .await;

    assert!(
        wait_until(Duration::from_secs(5), || {
            !h.transport.requests_to(REGISTRATION_URL).is_empty()
        })
        .await
    );
    let request = &h.transport.requests_to(REGISTRATION_URL)[0];
    assert_eq!(request.method, HttpMethod::Post);
    let body: Value = serde_json::from_slice(request.body.as_deref().unwrap()).unwrap();
    assert_eq!(body["marketingCloudId"], ECID);
    assert_eq!(body["pushPlatform"], "gcm");
    assert_eq!(body["email"], "a@b.test");
}

#[tokio::test]
async fn test_registration_respects_delay() {
    let h = Harness::start();
    h.make_ready().await;

    h.send(lifecycle(1_700_000_000_000)).await;
    assert!(
        wait_until(Duration::from_secs(5), || {
            h.transport.requests_to(REGISTRATION_URL).len() == 1
        })
        .await
    );

    // Registration was just confirmed; one day later is within the 7-day delay
    let tomorrow = campaign_core::state::current_time_millis() + 86_400_000;
    h.send(lifecycle(tomorrow)).await;
    tokio::time::sleep(Duration::from_millis(200)).await;

    assert_eq!(h.transport.requests_to(REGISTRATION_URL).len(), 1);
}

#[tokio::test]
async fn test_message_track_sends_hit_and_reports_interaction() {
    let h = Harness::start();
    h.make_ready().await;

    h.send(CampaignEvent::MessageTrack {
        broadlog_id: "b1".to_string(),
        delivery_id: "a1".to_string(),
        action: "1".to_string(),
    })
    .await;

    let url = "https://camp.test/r/?id=b1,a1,1&mcId=ecid-1";
    assert!(wait_until(Duration::from_secs(5), || !h.transport.requests_to(url).is_empty()).await);
    assert_eq!(h.transport.requests_to(url)[0].method, HttpMethod::Get);

    let data = &h.interaction_events()[0];
    assert_eq!(data.get("a.message.id").map(String::as_str), Some("161"));
    assert_eq!(data.get("a.message.viewed").map(String::as_str), Some("1"));
}

#[tokio::test]
async fn test_message_track_with_missing_ids_is_ignored() {
    let h = Harness::start();
    h.make_ready().await;
    let before = h.transport.request_count();

    h.send(CampaignEvent::MessageTrack {
        broadlog_id: String::new(),
        delivery_id: "a1".to_string(),
        action: "2".to_string(),
    })
    .await;
    tokio::time::sleep(Duration::from_millis(200)).await;

    assert_eq!(h.transport.request_count(), before);
    assert!(h.interaction_events().is_empty());
}

#[tokio::test]
async fn test_opt_out_clears_rules_and_linkage() {
    let h = Harness::start();
    serve_alert_rules(&h);
    h.make_ready().await;
    assert_eq!(h.runtime.rules_engine().len(), 1);

    h.configure(config_with_privacy("optedout")).await;

    assert!(h.runtime.rules_engine().is_empty());
    let cache = ConditionalCacheStore::new(&h.dir.path().join("cache")).unwrap();
    assert!(!cache.contains(RULES_NAMESPACE, RULES_FILE));
    assert!(h.events().contains(&OutboundEvent::PrivacyChanged {
        status: PrivacyStatus::OptOut
    }));

    // Nothing goes out while opted out
    let before = h.transport.request_count();
    h.send(lifecycle(1_700_000_000_000)).await;
    tokio::time::sleep(Duration::from_millis(200)).await;
    assert_eq!(h.transport.request_count(), before);
}

#[tokio::test]
async fn test_cached_rules_load_on_restart() {
    let h = Harness::start();
    serve_alert_rules(&h);
    h.make_ready().await;
    let dir = h.dir;
    h.runtime.shutdown().await;

    let transport = std::sync::Arc::new(campaign_core::MockTransport::new());
    transport.set_fallback(HttpResponse::new(304, Vec::new()));
    let runtime = campaign_core::CampaignRuntime::spawn(
        campaign_core::CampaignConfig::new(dir.path()),
        transport.clone(),
        std::sync::Arc::new(super::common::fixtures::RecordingPresenter::default()),
        campaign_core::EventDispatcher::new(),
    )
    .unwrap();
    let handle = runtime.handle();

    handle
        .send(CampaignEvent::ConfigurationUpdated(config_with_privacy("optunknown")))
        .await
        .unwrap();
    handle.flush().await.unwrap();

    assert_eq!(runtime.rules_engine().len(), 1);
    assert_eq!(transport.request_count(), 0);
    runtime.shutdown().await;
}

#[tokio::test]
async fn test_linkage_fields_trigger_personalized_download() {
    let h = Harness::start();
    serve_alert_rules(&h);
    h.make_ready().await;

    let fields = BTreeMap::from([("cusEmail".to_string(), "a@b.test".to_string())]);
    h.send(CampaignEvent::SetLinkageFields(fields)).await;

    let requests = h.transport.requests_to(RULES_URL);
    assert_eq!(requests.len(), 2);
    assert!(requests[1].header(LINKAGE_FIELDS_HEADER).is_some());
    // Cached bundle was dropped, so the download is unconditional
    assert!(requests[1].header("If-None-Match").is_none());

    h.send(CampaignEvent::ResetLinkageFields).await;

    let requests = h.transport.requests_to(RULES_URL);
    assert_eq!(requests.len(), 3);
    assert!(requests[2].header(LINKAGE_FIELDS_HEADER).is_none());
}

#[tokio::test]
async fn test_empty_linkage_fields_are_ignored() {
    let h = Harness::start();
    serve_alert_rules(&h);
    h.make_ready().await;

    h.send(CampaignEvent::SetLinkageFields(BTreeMap::new())).await;

    assert_eq!(h.transport.requests_to(RULES_URL).len(), 1);
}

#[tokio::test]
async fn test_handle_fails_after_shutdown() {
    let h = Harness::start();
    let handle = h.handle.clone();

    h.runtime.shutdown().await;

    assert!(handle.is_closed());
    assert!(matches!(
        handle.send(lifecycle(0)).await,
        Err(CampaignError::ShutDown)
    ));
    assert!(matches!(
        handle.try_send(lifecycle(0)),
        Err(CampaignError::ShutDown)
    ));
}
