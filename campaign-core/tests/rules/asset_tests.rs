// SPDX-FileCopyrightText: 2026 Mattia Egloff <mattia.egloff@pm.me>
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Message asset download and cleanup

use serde_json::json;

use campaign_core::cache::{asset_cache_key, message_namespace, RULES_NAMESPACE};
use campaign_core::rules::RULES_FILE;
use campaign_core::{HttpResponse, SyncOutcome};

use super::common::fixtures::{fullscreen_consequence, launch_rule, rules_bundle, RULES_URL};
use super::{Harness, TIMEOUT};

const BANNER: &str = "https://cdn.test/banner.png";
const MIRROR: &str = "https://mirror.test/banner.png";
const LOGO: &str = "https://cdn.test/logo.png";

fn fullscreen_bundle(id: &str, assets: serde_json::Value) -> Vec<u8> {
    rules_bundle(json!([launch_rule(fullscreen_consequence(
        id,
        "page.html",
        assets
    ))]))
}

#[tokio::test]
async fn test_downloads_first_available_alternative() {
    let h = Harness::new();
    h.transport.respond(
        RULES_URL,
        HttpResponse::new(200, fullscreen_bundle("m1", json!([[BANNER, MIRROR, "banner.png"]]))),
    );
    h.transport.respond_status(BANNER, 404);
    h.transport
        .respond(MIRROR, HttpResponse::new(200, b"png".to_vec()));

    let outcome = h.sync.sync(RULES_URL, None, TIMEOUT).await;

    let SyncOutcome::Updated { assets, .. } = outcome else {
        panic!("expected update, got {:?}", outcome);
    };
    assert_eq!(assets.downloaded, 1);
    assert!(assets.active_messages.contains("m1"));

    let namespace = message_namespace("m1");
    assert!(h.cache.contains(&namespace, &asset_cache_key(MIRROR)));
    assert!(!h.cache.contains(&namespace, &asset_cache_key(BANNER)));
}

#[tokio::test]
async fn test_cached_group_is_not_downloaded_again() {
    let h = Harness::new();
    let archive = fullscreen_bundle("m1", json!([[BANNER]]));
    h.transport
        .respond(RULES_URL, HttpResponse::new(200, archive));
    h.transport
        .respond(BANNER, HttpResponse::new(200, b"png".to_vec()));

    h.sync.sync(RULES_URL, None, TIMEOUT).await;
    let outcome = h.sync.sync(RULES_URL, None, TIMEOUT).await;

    let SyncOutcome::Updated { assets, .. } = outcome else {
        panic!("expected update, got {:?}", outcome);
    };
    assert_eq!(assets.downloaded, 0);
    assert_eq!(h.transport.requests_to(BANNER).len(), 1);
}

#[tokio::test]
async fn test_inactive_message_assets_are_removed() {
    let h = Harness::new();
    h.transport.respond(
        RULES_URL,
        HttpResponse::new(200, fullscreen_bundle("m1", json!([[BANNER]]))),
    );
    h.transport.respond(
        RULES_URL,
        HttpResponse::new(200, fullscreen_bundle("m2", json!([[LOGO]]))),
    );
    h.transport.set_fallback(HttpResponse::new(200, b"png".to_vec()));

    h.sync.sync(RULES_URL, None, TIMEOUT).await;
    assert!(h.cache.contains(&message_namespace("m1"), &asset_cache_key(BANNER)));

    let outcome = h.sync.sync(RULES_URL, None, TIMEOUT).await;

    let SyncOutcome::Updated { assets, .. } = outcome else {
        panic!("expected update, got {:?}", outcome);
    };
    assert_eq!(assets.removed_messages, vec!["m1".to_string()]);
    assert!(h.cache.keys(&message_namespace("m1")).is_empty());
    assert!(h.cache.contains(&message_namespace("m2"), &asset_cache_key(LOGO)));
    // Cleanup never reaches outside the message namespaces
    assert!(h.cache.contains(RULES_NAMESPACE, RULES_FILE));
}

#[tokio::test]
async fn test_empty_rule_set_removes_every_message() {
    let h = Harness::new();
    h.transport.respond(
        RULES_URL,
        HttpResponse::new(200, fullscreen_bundle("m1", json!([[BANNER]]))),
    );
    h.transport
        .respond(RULES_URL, HttpResponse::new(200, rules_bundle(json!([]))));
    h.transport.set_fallback(HttpResponse::new(200, b"png".to_vec()));

    h.sync.sync(RULES_URL, None, TIMEOUT).await;
    let outcome = h.sync.sync(RULES_URL, None, TIMEOUT).await;

    let SyncOutcome::Updated { rules, assets } = outcome else {
        panic!("expected update, got {:?}", outcome);
    };
    assert_eq!(rules, 0);
    assert_eq!(assets.removed_messages, vec!["m1".to_string()]);
}

#[tokio::test]
async fn test_local_only_group_downloads_nothing() {
    let h = Harness::new();
    h.transport.respond(
        RULES_URL,
        HttpResponse::new(200, fullscreen_bundle("m1", json!([["banner.png"]]))),
    );

    h.sync.sync(RULES_URL, None, TIMEOUT).await;

    assert_eq!(h.transport.request_count(), 1);
    let map = h
        .sync
        .assets()
        .cached_assets_map("m1", &[vec!["banner.png".to_string()]]);
    assert_eq!(map.get("banner.png").map(String::as_str), Some("banner.png"));
}

#[tokio::test]
async fn test_cached_assets_map_prefers_cached_file() {
    let h = Harness::new();
    h.transport.respond(
        RULES_URL,
        HttpResponse::new(200, fullscreen_bundle("m1", json!([[BANNER, "banner.png"], [LOGO, "logo.png"]]))),
    );
    h.transport
        .respond(BANNER, HttpResponse::new(200, b"png".to_vec()));
    h.transport.respond_status(LOGO, 503);

    h.sync.sync(RULES_URL, None, TIMEOUT).await;

    let groups = vec![
        vec![BANNER.to_string(), "banner.png".to_string()],
        vec![LOGO.to_string(), "logo.png".to_string()],
    ];
    let map = h.sync.assets().cached_assets_map("m1", &groups);

    let banner_path = h
        .cache
        .path_of(&message_namespace("m1"), &asset_cache_key(BANNER))
        .unwrap()
        .to_string_lossy()
        .into_owned();
    assert_eq!(map.get(BANNER), Some(&banner_path));
    assert_eq!(map.get(LOGO).map(String::as_str), Some("logo.png"));
}
