// SPDX-FileCopyrightText: 2026 Mattia Egloff <mattia.egloff@pm.me>
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Proptest Strategies

use proptest::prelude::*;

/// Quoted or weak ETags as servers send them.
pub fn etag_strategy() -> impl Strategy<Value = String> {
    ("(W/)?", "[a-zA-Z0-9-]{1,24}").prop_map(|(weak, tag)| format!("{}\"{}\"", weak, tag))
}

/// Last-Modified epoch millis, whole seconds, between 2001 and 2100.
pub fn last_modified_strategy() -> impl Strategy<Value = i64> {
    (1_000_000_000i64..4_102_444_800i64).prop_map(|secs| secs * 1000)
}

/// Archive sizes, including empty.
pub fn archive_size_strategy() -> impl Strategy<Value = u64> {
    prop_oneof![Just(0u64), 1u64..50_000_000]
}
