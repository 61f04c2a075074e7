// SPDX-License-Identifier: MPL-2.0
//! Channel-backed [`VideoConsumer`] for hosts running an event loop.
//!
//! The decode thread never blocks on the host: notifications go through an
//! unbounded Tokio channel and the host drains it at its own pace.

use crate::application::port::VideoConsumer;
use crate::domain::video::PlayerEvent;
use tokio::sync::mpsc;

/// Notification forwarded from the decode thread.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConsumerMessage {
    /// Loading finished, successfully or not.
    InitDone,
    Event(PlayerEvent),
}

/// Receiving half handed to the host.
pub type ConsumerReceiver = mpsc::UnboundedReceiver<ConsumerMessage>;

/// Forwards notifications into a Tokio channel.
#[derive(Debug, Clone)]
pub struct ChannelConsumer {
    tx: mpsc::UnboundedSender<ConsumerMessage>,
}

impl ChannelConsumer {
    #[must_use]
    pub fn new() -> (Self, ConsumerReceiver) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }

    fn send(&self, message: ConsumerMessage) {
        if self.tx.send(message).is_err() {
            tracing::trace!(?message, "video consumer receiver dropped");
        }
    }
}

impl VideoConsumer for ChannelConsumer {
    fn video_player_init_done(&self) {
        self.send(ConsumerMessage::InitDone);
    }

    fn fire_video_event(&self, event: PlayerEvent) {
        self.send(ConsumerMessage::Event(event));
    }
}
