// SPDX-FileCopyrightText: 2026 Mattia Egloff <mattia.egloff@pm.me>
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Message interactions
//!
//! Turns user interactions with a message into the context data reported
//! to the host, and parses the `adbinapp://` links of full-screen HTML.

use std::collections::BTreeMap;

use tracing::{debug, warn};

pub const MESSAGE_ID_KEY: &str = "a.message.id";
pub const MESSAGE_TRIGGERED_KEY: &str = "a.message.triggered";
pub const MESSAGE_VIEWED_KEY: &str = "a.message.viewed";
pub const MESSAGE_CLICKED_KEY: &str = "a.message.clicked";

pub const INTERACTION_URL_KEY: &str = "url";
pub const INTERACTION_TYPE_KEY: &str = "type";

/// Only token expanded in click-through URLs.
pub const MESSAGE_ID_TOKEN: &str = "{messageId}";

const IN_APP_SCHEME: &str = "adbinapp";
const CONFIRM_HOST: &str = "confirm";
const CANCEL_HOST: &str = "cancel";
/// Third `id` token of a button link: 3 and 4 are buttons, 5 the close box.
const BUTTON_TAGS: [u32; 3] = [3, 4, 5];

/// Something the user did with a message
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MessageInteraction {
    Triggered,
    Viewed,
    /// Click-through, with the target URL when there is one
    Clicked(Option<String>),
    /// Click carrying arbitrary link data (full-screen buttons)
    ClickedWithData(BTreeMap<String, String>),
}

/// Context data for one interaction, plus the URL the host should open
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InteractionData {
    pub data: BTreeMap<String, String>,
    pub open_url: Option<String>,
}

impl MessageInteraction {
    /// Build the reported context data for `message_id`
    pub fn to_data(&self, message_id: &str) -> InteractionData {
        let mut data = BTreeMap::new();
        let mut open_url = None;

        let flag = match self {
            MessageInteraction::Triggered => MESSAGE_TRIGGERED_KEY,
            MessageInteraction::Viewed => MESSAGE_VIEWED_KEY,
            MessageInteraction::Clicked(None) => MESSAGE_CLICKED_KEY,
            MessageInteraction::Clicked(Some(url)) => {
                let url = expand_click_url(url, message_id);
                open_url = Some(url.clone()).filter(|u| !u.is_empty());
                data.insert(INTERACTION_URL_KEY.to_string(), url);
                MESSAGE_CLICKED_KEY
            }
            MessageInteraction::ClickedWithData(fields) => {
                for (key, value) in fields {
                    if key == INTERACTION_URL_KEY {
                        let url = expand_click_url(value, message_id);
                        open_url = Some(url.clone()).filter(|u| !u.is_empty());
                        data.insert(key.clone(), url);
                    } else {
                        data.insert(key.clone(), value.clone());
                    }
                }
                MESSAGE_CLICKED_KEY
            }
        };

        data.insert(MESSAGE_ID_KEY.to_string(), message_id.to_string());
        data.insert(flag.to_string(), "1".to_string());
        InteractionData { data, open_url }
    }
}

/// URL-decode `url` and expand `{messageId}`
pub fn expand_click_url(url: &str, message_id: &str) -> String {
    let decoded = match urlencoding::decode(url) {
        Ok(decoded) => decoded.into_owned(),
        Err(e) => {
            warn!(error = %e, "Could not decode click-through url");
            url.to_string()
        }
    };
    decoded.replace(MESSAGE_ID_TOKEN, message_id)
}

/// Interactions encoded in a link clicked inside a full-screen message.
///
/// Returns `None` when the link is not an `adbinapp://confirm` or
/// `adbinapp://cancel` link, in which case the host loads it itself.
/// A recognised link with no button tag yields no interactions.
pub fn parse_in_app_url(link: &str) -> Option<Vec<MessageInteraction>> {
    let parsed = url::Url::parse(link).ok()?;
    if parsed.scheme() != IN_APP_SCHEME {
        return None;
    }
    let host = parsed.host_str()?;
    if host != CONFIRM_HOST && host != CANCEL_HOST {
        return None;
    }

    let mut fields = query_parameters(parsed.query().unwrap_or(""));
    if fields.is_empty() {
        return Some(Vec::new());
    }
    fields.insert(INTERACTION_TYPE_KEY.to_string(), host.to_string());

    let tag = fields.get("id").and_then(|id| {
        let tokens: Vec<&str> = id.split(',').collect();
        match tokens.as_slice() {
            [_, _, tag] => tag.parse::<u32>().ok(),
            _ => None,
        }
    });

    match tag {
        Some(tag) if BUTTON_TAGS.contains(&tag) => Some(vec![
            MessageInteraction::ClickedWithData(fields),
            MessageInteraction::Viewed,
        ]),
        _ => {
            debug!(link, "In-app link without a button tag");
            Some(Vec::new())
        }
    }
}

/// Split a raw query string; values stay percent-encoded
fn query_parameters(query: &str) -> BTreeMap<String, String> {
    query
        .split('&')
        .filter_map(|pair| pair.split_once('='))
        .filter(|(key, value)| !key.is_empty() && !value.is_empty())
        .map(|(key, value)| (key.to_string(), value.to_string()))
        .collect()
}
