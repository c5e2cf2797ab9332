// SPDX-FileCopyrightText: 2026 Mattia Egloff <mattia.egloff@pm.me>
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Extension Module
//!
//! Host-facing surface: inbound and outbound events, the readiness gate,
//! the event handlers and the serial runtime that drives them.

mod campaign;
mod context;
mod events;
mod readiness;
mod runtime;

pub use campaign::{Campaign, CLICKED_ACTION, IMPRESSION_ACTION, VIEWED_ACTION};
pub use context::CampaignContext;
pub use events::{CallbackHandler, CampaignEvent, EventDispatcher, EventHandler, OutboundEvent};
pub use readiness::{ReadinessGate, MAX_HELD_EVENTS};
pub use runtime::{CampaignHandle, CampaignRuntime};
