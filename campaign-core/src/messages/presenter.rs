// SPDX-FileCopyrightText: 2026 Mattia Egloff <mattia.egloff@pm.me>
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Host presentation seam

use std::collections::BTreeMap;

use super::message::{AlertMessage, FullScreenMessage, LocalNotificationMessage};

/// Implemented by the host to put messages on screen.
///
/// Calls arrive on the extension's dispatch task and should return
/// quickly. Interactions are reported back through
/// [`CampaignHandle`](crate::extension::CampaignHandle).
pub trait MessagePresenter: Send + Sync {
    fn show_alert(&self, message: &AlertMessage);

    /// `html` is the content of the bundle file named by the message;
    /// `assets` maps each asset's first URL to what should be rendered.
    fn show_fullscreen(&self, message: &FullScreenMessage, html: &str, assets: &BTreeMap<String, String>);

    fn schedule_local_notification(&self, message: &LocalNotificationMessage);

    /// Open a click-through URL. Returns false if nothing could handle it.
    fn open_url(&self, url: &str) -> bool;
}
