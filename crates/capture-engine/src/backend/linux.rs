use std::path::Path;

use photoalign_common::error::{PhotoAlignError, PhotoAlignResult};
use photoalign_platform_core::{MediaDeviceInfo, MediaStreamConstraints};
use photoalign_platform_linux::{enumerate_devices, sysfs_available};

use crate::backend::{ensure_video_only, spawn_stream_start, MediaBackend, DEVICE_NOT_FOUND};
use crate::pipeline::{start_webcam_stream, v4l2_source, LiveStream};

/// V4L2 cameras found through sysfs, streamed with `v4l2src`.
pub struct LinuxBackend {
    sysfs: bool,
}

impl LinuxBackend {
    pub fn new() -> Self {
        Self {
            sysfs: sysfs_available(),
        }
    }
}

impl Default for LinuxBackend {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl MediaBackend for LinuxBackend {
    fn name(&self) -> &str {
        "linux-v4l2"
    }

    fn supports_enumeration(&self) -> bool {
        self.sysfs
    }

    async fn enumerate_devices(&self) -> PhotoAlignResult<Vec<MediaDeviceInfo>> {
        if !self.sysfs {
            return Err(PhotoAlignError::unsupported("sysfs is not mounted"));
        }

        tokio::task::spawn_blocking(enumerate_devices)
            .await
            .map_err(|e| PhotoAlignError::platform(format!("Device enumeration task failed: {e}")))?
    }

    async fn acquire_stream(
        &self,
        constraints: &MediaStreamConstraints,
    ) -> PhotoAlignResult<Box<dyn LiveStream>> {
        ensure_video_only(constraints)?;

        let device_path = constraints.video.device_id.clone();
        if !device_path.starts_with("/dev/") || !Path::new(&device_path).exists() {
            return Err(PhotoAlignError::stream_acquisition(DEVICE_NOT_FOUND));
        }

        tracing::info!(
            device = %device_path,
            min_width = constraints.video.min_width,
            min_height = constraints.video.min_height,
            "Acquiring V4L2 stream"
        );

        let video = constraints.video.clone();
        spawn_stream_start(move || {
            start_webcam_stream(&device_path, &v4l2_source(&device_path), &video)
        })
        .await
    }
}
