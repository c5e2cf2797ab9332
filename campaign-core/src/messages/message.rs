// SPDX-FileCopyrightText: 2026 Mattia Egloff <mattia.egloff@pm.me>
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! In-app message variants and their construction from rule consequences

use serde_json::{Map, Value};
use thiserror::Error;
use tracing::{debug, trace};

use crate::rules::{Consequence, FULLSCREEN_TEMPLATE, IN_APP_MESSAGE_TYPE};

pub const ALERT_TEMPLATE: &str = "alert";
pub const LOCAL_NOTIFICATION_TEMPLATE: &str = "local";

/// User-data keys linking a local notification to a delivery.
pub const BROADLOG_ID_KEY: &str = "broadlogId";
pub const DELIVERY_ID_KEY: &str = "deliveryId";

/// A message produced by a triggered rule
#[derive(Debug, Clone, PartialEq)]
pub enum CampaignMessage {
    Alert(AlertMessage),
    FullScreen(FullScreenMessage),
    LocalNotification(LocalNotificationMessage),
}

/// Native alert dialog
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AlertMessage {
    pub id: String,
    pub title: String,
    pub content: String,
    /// Cancel button text
    pub cancel: String,
    /// Confirm button text
    pub confirm: Option<String>,
    /// Click-through URL of the confirm button
    pub url: Option<String>,
}

/// HTML message covering the whole screen
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FullScreenMessage {
    pub id: String,
    /// Name of the HTML file inside the rule bundle
    pub html: String,
    pub remote_assets: Vec<Vec<String>>,
}

/// Notification scheduled with the OS
#[derive(Debug, Clone, PartialEq)]
pub struct LocalNotificationMessage {
    pub id: String,
    pub content: String,
    /// Absolute fire time in epoch seconds
    pub fire_date: Option<i64>,
    /// Delay in seconds, used when there is no fire date
    pub wait: i64,
    pub deeplink: Option<String>,
    pub user_data: Option<Map<String, Value>>,
    pub sound: Option<String>,
    pub title: Option<String>,
}

impl CampaignMessage {
    /// Validate `consequence` and build the message for its template
    pub fn from_consequence(consequence: &Consequence) -> Result<Self, MessageError> {
        if consequence.id.is_empty() {
            return Err(MessageError::InvalidConsequence("id is empty".into()));
        }
        if consequence.consequence_type != IN_APP_MESSAGE_TYPE {
            return Err(MessageError::InvalidConsequence(format!(
                "type is {:?}, expected {:?}",
                consequence.consequence_type, IN_APP_MESSAGE_TYPE
            )));
        }
        if consequence.detail.is_empty() {
            return Err(MessageError::InvalidConsequence("detail is empty".into()));
        }

        let detail = &consequence.detail;
        let id = consequence.id.clone();
        let template = required(detail, "template")?;
        trace!(message_id = %id, template, "Building campaign message");

        match template {
            ALERT_TEMPLATE => Ok(CampaignMessage::Alert(AlertMessage {
                title: required(detail, "title")?.to_string(),
                content: required(detail, "content")?.to_string(),
                cancel: required(detail, "cancel")?.to_string(),
                confirm: optional(detail, "confirm"),
                url: optional(detail, "url"),
                id,
            })),
            FULLSCREEN_TEMPLATE => Ok(CampaignMessage::FullScreen(FullScreenMessage {
                html: required(detail, "html")?.to_string(),
                remote_assets: consequence.remote_assets(),
                id,
            })),
            LOCAL_NOTIFICATION_TEMPLATE => {
                let fire_date = detail
                    .get("date")
                    .and_then(Value::as_i64)
                    .filter(|date| *date > 0);
                let wait = match fire_date {
                    Some(_) => 0,
                    None => detail.get("wait").and_then(Value::as_i64).unwrap_or(0),
                };
                let user_data = detail
                    .get("userData")
                    .and_then(Value::as_object)
                    .filter(|data| !data.is_empty())
                    .cloned();
                Ok(CampaignMessage::LocalNotification(LocalNotificationMessage {
                    content: required(detail, "content")?.to_string(),
                    fire_date,
                    wait,
                    deeplink: optional(detail, "adb_deeplink"),
                    user_data,
                    sound: optional(detail, "sound"),
                    title: optional(detail, "title"),
                    id,
                }))
            }
            other => {
                debug!(template = other, "Unsupported message template");
                Err(MessageError::UnsupportedTemplate(other.to_string()))
            }
        }
    }

    pub fn id(&self) -> &str {
        match self {
            CampaignMessage::Alert(m) => &m.id,
            CampaignMessage::FullScreen(m) => &m.id,
            CampaignMessage::LocalNotification(m) => &m.id,
        }
    }

    pub fn template(&self) -> &'static str {
        match self {
            CampaignMessage::Alert(_) => ALERT_TEMPLATE,
            CampaignMessage::FullScreen(_) => FULLSCREEN_TEMPLATE,
            CampaignMessage::LocalNotification(_) => LOCAL_NOTIFICATION_TEMPLATE,
        }
    }
}

impl LocalNotificationMessage {
    /// Broadlog and delivery ids from the user data, if either is set
    pub fn tracking_ids(&self) -> Option<(String, String)> {
        let data = self.user_data.as_ref()?;
        if !data.contains_key(BROADLOG_ID_KEY) || !data.contains_key(DELIVERY_ID_KEY) {
            return None;
        }
        let broadlog = data.get(BROADLOG_ID_KEY).and_then(Value::as_str).unwrap_or("");
        let delivery = data.get(DELIVERY_ID_KEY).and_then(Value::as_str).unwrap_or("");
        if broadlog.is_empty() && delivery.is_empty() {
            debug!("Local notification tracking ids are empty");
            return None;
        }
        Some((broadlog.to_string(), delivery.to_string()))
    }
}

fn required<'a>(detail: &'a Map<String, Value>, field: &'static str) -> Result<&'a str, MessageError> {
    detail
        .get(field)
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
        .ok_or(MessageError::MissingField(field))
}

fn optional(detail: &Map<String, Value>, field: &str) -> Option<String> {
    detail
        .get(field)
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

/// Errors building a message from a consequence
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MessageError {
    #[error("invalid consequence: {0}")]
    InvalidConsequence(String),

    #[error("required field missing: {0}")]
    MissingField(&'static str),

    #[error("unsupported message template: {0}")]
    UnsupportedTemplate(String),
}
