//! Photo Align Capture Engine
//!
//! Lists cameras and opens live video streams from them. A backend per host
//! answers the two questions a capture screen asks (which devices exist, and
//! give me a stream for this one), while [`session`] owns whatever stream is
//! currently bound.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────┐
//! │                MediaBackend                  │
//! │  ┌─────────────────┐   ┌──────────────────┐  │
//! │  │ LinuxBackend    │   │ MonitorBackend   │  │
//! │  │ (sysfs + v4l2)  │   │ (DeviceMonitor)  │  │
//! │  └────────┬────────┘   └────────┬─────────┘  │
//! │           ▼                     ▼            │
//! │  ┌────────────────────────────────────────┐  │
//! │  │  GstVideoPipeline: src ! decode ! RGBA │  │
//! │  │  ! appsink (latest frame only)         │  │
//! │  └───────────────────┬────────────────────┘  │
//! └──────────────────────┼───────────────────────┘
//!                        ▼
//!              StreamSlot (one bound stream)
//! ```

pub mod backend;
pub mod pipeline;
pub mod session;

pub use backend::{get_backend, MediaBackend, DEVICE_NOT_FOUND};
pub use pipeline::{GstVideoPipeline, LiveStream};
pub use session::*;
