//! Stream ownership and request bookkeeping for a capture screen.
//!
//! A screen holds at most one live stream. [`StreamSlot`] owns it and
//! releases the previous occupant before a new one is bound, and again when
//! the slot itself goes away. [`RequestTracker`] hands out generation ids so
//! that only the answer to the most recent request is ever applied.

use photoalign_platform_core::VideoFrame;

use crate::pipeline::LiveStream;

/// Generation id of an asynchronous request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RequestId(u64);

impl RequestId {
    pub fn value(self) -> u64 {
        self.0
    }
}

/// Monotonic generation counter for one kind of request.
#[derive(Debug, Default)]
pub struct RequestTracker {
    current: u64,
}

impl RequestTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a new request, superseding every earlier one.
    pub fn begin(&mut self) -> RequestId {
        self.current += 1;
        RequestId(self.current)
    }

    /// Whether `id` belongs to the most recent request.
    pub fn is_current(&self, id: RequestId) -> bool {
        self.current != 0 && id.0 == self.current
    }
}

/// Single-slot owner of the bound live stream.
#[derive(Default)]
pub struct StreamSlot {
    current: Option<Box<dyn LiveStream>>,
}

impl StreamSlot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind `stream`, releasing whatever was bound before.
    pub fn bind(&mut self, stream: Box<dyn LiveStream>) {
        self.release();
        tracing::debug!(device = stream.device_id(), "Stream bound");
        self.current = Some(stream);
    }

    /// Release and drop the bound stream, if any.
    pub fn release(&mut self) {
        if let Some(mut stream) = self.current.take() {
            if let Err(e) = stream.release() {
                tracing::warn!(device = stream.device_id(), error = %e, "Stream release failed");
            }
        }
    }

    pub fn is_bound(&self) -> bool {
        self.current.is_some()
    }

    /// Device id of the bound stream.
    pub fn device_id(&self) -> Option<&str> {
        self.current.as_deref().map(|stream| stream.device_id())
    }

    /// Most recent frame of the bound stream.
    pub fn latest_frame(&self) -> Option<VideoFrame> {
        self.current.as_deref().and_then(|stream| stream.latest_frame())
    }

    /// Frames received by the bound stream, 0 when nothing is bound.
    pub fn frames_received(&self) -> u64 {
        self.current
            .as_deref()
            .map(|stream| stream.frames_received())
            .unwrap_or(0)
    }

    /// Whether a bound stream is still delivering.
    pub fn is_active(&self) -> bool {
        self.current
            .as_deref()
            .map(|stream| stream.is_active())
            .unwrap_or(false)
    }
}

impl Drop for StreamSlot {
    fn drop(&mut self) {
        self.release();
    }
}

impl std::fmt::Debug for StreamSlot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StreamSlot")
            .field("device", &self.device_id())
            .finish()
    }
}
