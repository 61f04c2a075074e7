// SPDX-License-Identifier: MPL-2.0
//! Double-buffered frame hand-off between the decode thread and the renderer.
//!
//! The decoder writes into a back buffer it owns exclusively, then calls
//! [`FrameBuffer::publish`], which swaps that buffer with the consumer-visible
//! one under a mutex and bumps the frame id. The render thread reads the
//! current buffer under the same mutex, so it always sees a frame id paired
//! with the bytes that were complete when that id was published.
//!
//! ```text
//! decode thread                    render thread
//! ─────────────                    ─────────────
//! decode → back buffer
//! publish(back) ──lock── swap ──▶  with_current(|frame| upload)
//!                  id += 1         skip when id unchanged
//! ```

use crate::application::port::TextureTarget;
use crate::domain::video::FrameId;
use std::sync::{Mutex, MutexGuard, PoisonError};

/// Borrowed view of the published frame.
#[derive(Debug, Clone, Copy)]
pub struct FrameView<'a> {
    pub data: &'a [u8],
    pub frame_id: FrameId,
    pub width: u32,
    pub height: u32,
}

#[derive(Debug, Default)]
struct Front {
    data: Option<Vec<u8>>,
    frame_id: FrameId,
    width: u32,
    height: u32,
}

/// Consumer-visible frame slot shared by decoder and renderer.
#[derive(Debug, Default)]
pub struct FrameBuffer {
    front: Mutex<Front>,
}

impl FrameBuffer {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Front> {
        self.front.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Publishes a fully written frame and returns its id.
    ///
    /// `back` is swapped with the previous front buffer; its contents are
    /// unspecified afterwards (possibly empty) and must be rewritten before
    /// the next publish.
    pub fn publish(&self, back: &mut Vec<u8>, width: u32, height: u32) -> FrameId {
        let mut front = self.lock();
        let current = front.data.get_or_insert_with(Vec::new);
        std::mem::swap(current, back);
        front.width = width;
        front.height = height;
        front.frame_id = front.frame_id.next();
        front.frame_id
    }

    /// Runs `f` on the current frame while holding the hand-off lock.
    ///
    /// Returns `None` if nothing was published or the buffer was released.
    pub fn with_current<R>(&self, f: impl FnOnce(FrameView<'_>) -> R) -> Option<R> {
        let front = self.lock();
        let data = front.data.as_deref()?;
        Some(f(FrameView {
            data,
            frame_id: front.frame_id,
            width: front.width,
            height: front.height,
        }))
    }

    /// Id of the last published frame, [`FrameId::NONE`] before the first publish.
    #[must_use]
    pub fn current_frame_id(&self) -> FrameId {
        self.lock().frame_id
    }

    /// Copies the current frame out, for hosts that cannot upload under the lock.
    #[must_use]
    pub fn snapshot(&self) -> Option<(Vec<u8>, FrameId)> {
        self.with_current(|frame| (frame.data.to_vec(), frame.frame_id))
    }

    #[must_use]
    pub fn has_frame(&self) -> bool {
        self.lock().data.is_some()
    }

    /// Drops the published frame. The frame id is kept so it never decreases.
    pub fn release(&self) {
        self.release_with(|| ());
    }

    /// Runs `teardown` and drops the published frame under the hand-off lock.
    ///
    /// A concurrent reader either finishes before `teardown` starts or
    /// observes an empty buffer afterwards.
    pub fn release_with<R>(&self, teardown: impl FnOnce() -> R) -> R {
        let mut front = self.lock();
        let result = teardown();
        front.data = None;
        result
    }
}

/// Result of one [`FrameUploader::upload`] call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadOutcome {
    /// First frame, texture allocated with a full upload.
    Initialized,
    /// Newer frame, texture contents replaced.
    Updated,
    /// Frame id unchanged since the last upload.
    Skipped,
    /// Nothing published yet, or the player was torn down.
    NoFrame,
}

/// Render-thread side of the hand-off.
///
/// Remembers the last uploaded frame id so unchanged frames cost nothing.
#[derive(Debug, Default)]
pub struct FrameUploader {
    last_id: FrameId,
    initialized: bool,
}

impl FrameUploader {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Uploads the current frame into `target` if it is newer than the last one.
    pub fn upload<T: TextureTarget + ?Sized>(
        &mut self,
        buffer: &FrameBuffer,
        target: &mut T,
    ) -> UploadOutcome {
        let last_id = self.last_id;
        let initialized = self.initialized;

        let outcome = buffer.with_current(|frame| {
            if initialized && frame.frame_id == last_id {
                return (UploadOutcome::Skipped, frame.frame_id);
            }
            if initialized {
                target.update_texture(frame.width, frame.height, frame.data);
                (UploadOutcome::Updated, frame.frame_id)
            } else {
                target.init_texture(frame.width, frame.height, frame.data);
                (UploadOutcome::Initialized, frame.frame_id)
            }
        });

        match outcome {
            Some((outcome, frame_id)) => {
                self.last_id = frame_id;
                self.initialized = true;
                outcome
            }
            None => UploadOutcome::NoFrame,
        }
    }

    /// Id of the last frame uploaded.
    #[must_use]
    pub fn last_frame_id(&self) -> FrameId {
        self.last_id
    }
}
