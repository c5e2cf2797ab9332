// SPDX-FileCopyrightText: 2026 Mattia Egloff <mattia.egloff@pm.me>
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Rules Module
//!
//! Downloading, extracting and registering the rule bundle, plus the
//! message assets its full-screen messages reference.

mod assets;
mod bundle;
mod conditional;
mod engine;
mod model;
mod sync;

pub use assets::{is_downloadable, AssetSynchronizer, ReconcileReport};
pub use bundle::{BundleError, BundleExtractor};
pub use conditional::{
    build_conditional_headers, encode_linkage_fields, extract_metadata, format_last_modified,
    parse_http_date, IF_MODIFIED_SINCE, IF_NONE_MATCH, IF_RANGE, LINKAGE_FIELDS_HEADER, RANGE,
};
pub use engine::RulesEngine;
pub use model::{
    parse_rules, Consequence, GroupCondition, GroupLogic, LaunchRule, MatcherCondition,
    RuleCondition, RuleParseError, RulesDocument, FULLSCREEN_TEMPLATE, IN_APP_MESSAGE_TYPE,
};
pub use sync::{RuleBundleDescriptor, RuleSyncCoordinator, SyncOutcome, RULES_FILE};
