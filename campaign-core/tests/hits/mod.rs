// SPDX-FileCopyrightText: 2026 Mattia Egloff <mattia.egloff@pm.me>
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Hit Delivery Tests
//!
//! Durable queue ordering, retry, privacy gating and the registration
//! eligibility rules.
//!
//! Run with: cargo test --test hits

#[path = "../common/mod.rs"]
mod common;

mod eligibility_tests;
mod queue_tests;
