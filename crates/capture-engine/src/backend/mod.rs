use std::sync::Arc;

use photoalign_common::error::{PhotoAlignError, PhotoAlignResult};
use photoalign_platform_core::{MediaDeviceInfo, MediaStreamConstraints};

use crate::pipeline::LiveStream;

/// Message reported when a requested device is not in the inventory.
pub const DEVICE_NOT_FOUND: &str = "Requested device not found";

/// Abstract interface for the host's media capabilities.
#[async_trait::async_trait]
pub trait MediaBackend: Send + Sync {
    /// Backend name for logs.
    fn name(&self) -> &str;

    /// Whether the host exposes device enumeration at all.
    fn supports_enumeration(&self) -> bool;

    /// List every media device, in host order.
    async fn enumerate_devices(&self) -> PhotoAlignResult<Vec<MediaDeviceInfo>>;

    /// Open a live stream satisfying `constraints`.
    ///
    /// Failures are [`PhotoAlignError::StreamAcquisition`] carrying the host's
    /// message.
    async fn acquire_stream(
        &self,
        constraints: &MediaStreamConstraints,
    ) -> PhotoAlignResult<Box<dyn LiveStream>>;
}

pub mod linux;
pub mod monitor;

pub use linux::LinuxBackend;
pub use monitor::MonitorBackend;

/// Get the platform-specific backend.
pub fn get_backend() -> Arc<dyn MediaBackend> {
    #[cfg(target_os = "linux")]
    {
        Arc::new(LinuxBackend::new())
    }
    #[cfg(target_os = "macos")]
    {
        Arc::new(MonitorBackend::new("avfvideosrc"))
    }
    #[cfg(target_os = "windows")]
    {
        Arc::new(MonitorBackend::new("mfvideosrc"))
    }
    #[cfg(not(any(target_os = "linux", target_os = "windows", target_os = "macos")))]
    {
        Arc::new(MonitorBackend::unsupported())
    }
}

/// Reject requests this application never makes.
pub(crate) fn ensure_video_only(constraints: &MediaStreamConstraints) -> PhotoAlignResult<()> {
    if constraints.audio {
        return Err(PhotoAlignError::stream_acquisition(
            "Audio capture is not supported",
        ));
    }
    Ok(())
}

/// Run a blocking stream start off the async executor.
pub(crate) async fn spawn_stream_start<F>(start: F) -> PhotoAlignResult<Box<dyn LiveStream>>
where
    F: FnOnce() -> PhotoAlignResult<Box<dyn LiveStream>> + Send + 'static,
{
    tokio::task::spawn_blocking(start)
        .await
        .map_err(|e| PhotoAlignError::capture(format!("Stream start task failed: {e}")))?
}
