// SPDX-FileCopyrightText: 2026 Mattia Egloff <mattia.egloff@pm.me>
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Messages Module
//!
//! In-app messages built from triggered rule consequences, and the data
//! reported when users interact with them. Rendering belongs to the host.

mod interaction;
mod message;
mod presenter;

pub use interaction::{
    expand_click_url, parse_in_app_url, InteractionData, MessageInteraction,
    INTERACTION_TYPE_KEY, INTERACTION_URL_KEY, MESSAGE_CLICKED_KEY, MESSAGE_ID_KEY,
    MESSAGE_ID_TOKEN, MESSAGE_TRIGGERED_KEY, MESSAGE_VIEWED_KEY,
};
pub use message::{
    AlertMessage, CampaignMessage, FullScreenMessage, LocalNotificationMessage, MessageError,
    ALERT_TEMPLATE, BROADLOG_ID_KEY, DELIVERY_ID_KEY, LOCAL_NOTIFICATION_TEMPLATE,
};
pub use presenter::MessagePresenter;
