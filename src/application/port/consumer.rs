// SPDX-License-Identifier: MPL-2.0
//! Consumer-side ports: lifecycle notifications and texture uploads.

use crate::domain::video::PlayerEvent;

/// Receives lifecycle notifications from the playback controller.
///
/// Called from the decode thread. Implementations must not block for long
/// and must not call back into the controller's `close()`.
pub trait VideoConsumer: Send + Sync {
    /// The first frame is published and the stream geometry is known
    /// (or loading failed). Called exactly once per playback attempt.
    fn video_player_init_done(&self);

    /// Delivers one lifecycle event.
    fn fire_video_event(&self, event: PlayerEvent);
}

/// GPU texture receiving RGB24 frames on the render thread.
pub trait TextureTarget {
    /// Allocates the texture and uploads the first frame (full upload).
    fn init_texture(&mut self, width: u32, height: u32, rgb: &[u8]);

    /// Replaces the texture contents with a newer frame (partial update).
    fn update_texture(&mut self, width: u32, height: u32, rgb: &[u8]);
}
