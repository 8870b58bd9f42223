//! Shared usage quantities pushed into every engine's parameters.
//!
//! The push is one way: editing an engine's own copy afterwards never
//! changes the shared value.

use serde::{Deserialize, Serialize};

use crate::discount::Category;
use crate::engine::consumption::ConsumptionInput;
use crate::engine::seat_token::SeatTokenInput;
use crate::engine::tiered::TieredInput;
use crate::input::{non_negative, ParameterBundle};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SharedUsage {
    pub chat_channels: Option<f64>,
    pub call_channels: Option<f64>,
    pub seats: Option<f64>,
}

impl ParameterBundle for SharedUsage {
    const KEY: &'static str = "linkage";

    fn sanitized(&self) -> Self {
        Self {
            chat_channels: self.chat_channels.map(non_negative),
            call_channels: self.call_channels.map(non_negative),
            seats: self.seats.map(non_negative),
        }
    }
}

impl SharedUsage {
    pub fn is_empty(&self) -> bool {
        self.chat_channels.is_none() && self.call_channels.is_none() && self.seats.is_none()
    }

    /// Take every value that `changes` sets.
    pub fn merge(&mut self, changes: &SharedUsage) {
        if changes.chat_channels.is_some() {
            self.chat_channels = changes.chat_channels;
        }
        if changes.call_channels.is_some() {
            self.call_channels = changes.call_channels;
        }
        if changes.seats.is_some() {
            self.seats = changes.seats;
        }
    }
}

/// The parameter set of every engine.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Bundles {
    pub seat_token: SeatTokenInput,
    pub consumption: ConsumptionInput,
    pub tiered: TieredInput,
}

impl Bundles {
    /// Overwrite each engine's copy of every quantity `shared` sets.
    pub fn broadcast(&mut self, shared: &SharedUsage) {
        let shared = shared.sanitized();

        if let Some(chat) = shared.chat_channels {
            self.seat_token.chatbot_channels = chat;
            self.consumption.chat_count = chat;
            self.tiered.set_quantity(Category::Chatbot, chat);
        }
        if let Some(calls) = shared.call_channels {
            self.seat_token.callbot_channels = calls;
            self.consumption.callbot_count = calls;
            self.tiered.set_quantity(Category::Callbot, calls);
        }
        if let Some(seats) = shared.seats {
            self.seat_token.seats = seats;
            self.consumption.advisor_count = seats;
            self.tiered.set_quantity(Category::Advisor, seats);
        }

        tracing::debug!(?shared, "broadcast shared usage");
    }
}
