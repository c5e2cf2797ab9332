// SPDX-FileCopyrightText: 2026 Mattia Egloff <mattia.egloff@pm.me>
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Property tests for conditional request headers

use proptest::prelude::*;

use campaign_core::cache::CacheMetadata;
use campaign_core::rules::{
    build_conditional_headers, format_last_modified, parse_http_date, IF_MODIFIED_SINCE,
    IF_NONE_MATCH, IF_RANGE, RANGE,
};

use super::common::strategies::{archive_size_strategy, etag_strategy, last_modified_strategy};

fn header<'a>(headers: &'a [(String, String)], name: &str) -> Option<&'a str> {
    headers
        .iter()
        .find(|(k, _)| k == name)
        .map(|(_, v)| v.as_str())
}

proptest! {
    #[test]
    fn prop_headers_follow_metadata(
        etag in proptest::option::of(etag_strategy()),
        millis in prop_oneof![Just(0i64), last_modified_strategy()],
        size in archive_size_strategy(),
    ) {
        let metadata = CacheMetadata::new(etag.clone(), millis);
        let headers = build_conditional_headers(&metadata, Some(size));
        let date = format_last_modified(millis);

        prop_assert_eq!(header(&headers, IF_NONE_MATCH), etag.as_deref());
        prop_assert_eq!(header(&headers, IF_MODIFIED_SINCE), date.as_deref());
        prop_assert_eq!(
            header(&headers, IF_RANGE),
            etag.as_deref().or(date.as_deref())
        );
        let range = (size > 0).then(|| format!("bytes={}-", size));
        prop_assert_eq!(header(&headers, RANGE), range.as_deref());
    }

    #[test]
    fn prop_last_modified_survives_formatting(millis in last_modified_strategy()) {
        let formatted = format_last_modified(millis).unwrap();
        prop_assert_eq!(parse_http_date(&formatted), Some(millis));
    }
}
