use gstreamer as gst;
use gstreamer::prelude::*;

use photoalign_common::error::{PhotoAlignError, PhotoAlignResult};
use photoalign_platform_core::{MediaDeviceInfo, MediaDeviceKind, MediaStreamConstraints};

use crate::backend::{ensure_video_only, spawn_stream_start, MediaBackend, DEVICE_NOT_FOUND};
use crate::pipeline::{init_gstreamer, start_webcam_stream, LiveStream};

const VIDEO_SOURCE_CLASS: &str = "Video/Source";

/// Cameras discovered through the GStreamer device monitor.
///
/// Used on hosts without a sysfs inventory. Device ids are the monitor's
/// enumeration index, which is what the native source elements accept as
/// `device-index`.
pub struct MonitorBackend {
    source_element: Option<&'static str>,
}

impl MonitorBackend {
    pub fn new(source_element: &'static str) -> Self {
        Self {
            source_element: Some(source_element),
        }
    }

    /// A backend for hosts with no known camera source element.
    pub fn unsupported() -> Self {
        Self {
            source_element: None,
        }
    }

    fn source_element(&self) -> PhotoAlignResult<&'static str> {
        self.source_element.ok_or_else(|| {
            PhotoAlignError::unsupported("no camera source element for this platform")
        })
    }
}

#[async_trait::async_trait]
impl MediaBackend for MonitorBackend {
    fn name(&self) -> &str {
        self.source_element.unwrap_or("unsupported")
    }

    fn supports_enumeration(&self) -> bool {
        self.source_element.is_some()
    }

    async fn enumerate_devices(&self) -> PhotoAlignResult<Vec<MediaDeviceInfo>> {
        self.source_element()?;

        tokio::task::spawn_blocking(monitor_video_sources)
            .await
            .map_err(|e| PhotoAlignError::platform(format!("Device monitor task failed: {e}")))?
    }

    async fn acquire_stream(
        &self,
        constraints: &MediaStreamConstraints,
    ) -> PhotoAlignResult<Box<dyn LiveStream>> {
        ensure_video_only(constraints)?;
        let element = self
            .source_element()
            .map_err(|e| PhotoAlignError::stream_acquisition(e.to_string()))?;

        let device_id = constraints.video.device_id.clone();
        let index = parse_device_index(&device_id)?;

        tracing::info!(device = %device_id, element, "Acquiring monitored camera stream");

        let video = constraints.video.clone();
        spawn_stream_start(move || {
            let source = format!("{element} device-index={index}");
            start_webcam_stream(&device_id, &source, &video)
        })
        .await
    }
}

/// Device ids from this backend are decimal indices.
fn parse_device_index(device_id: &str) -> PhotoAlignResult<u32> {
    device_id
        .parse::<u32>()
        .map_err(|_| PhotoAlignError::stream_acquisition(DEVICE_NOT_FOUND))
}

fn monitor_video_sources() -> PhotoAlignResult<Vec<MediaDeviceInfo>> {
    init_gstreamer()?;

    let monitor = gst::DeviceMonitor::new();
    monitor.add_filter(Some(VIDEO_SOURCE_CLASS), None);
    monitor
        .start()
        .map_err(|e| PhotoAlignError::platform(format!("Device monitor failed to start: {e}")))?;

    let devices: Vec<MediaDeviceInfo> = monitor
        .devices()
        .into_iter()
        .enumerate()
        .map(|(index, device)| MediaDeviceInfo {
            device_id: index.to_string(),
            group_id: String::new(),
            label: device.display_name().to_string(),
            kind: MediaDeviceKind::VideoInput,
        })
        .collect();

    monitor.stop();
    tracing::debug!(count = devices.len(), "Device monitor listed video sources");
    Ok(devices)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn indices_parse_and_paths_do_not() {
        assert_eq!(parse_device_index("2").unwrap(), 2);
        let err = parse_device_index("/dev/video0").unwrap_err();
        assert_eq!(err.to_string(), DEVICE_NOT_FOUND);
    }

    #[tokio::test]
    async fn unsupported_backend_refuses_enumeration() {
        let backend = MonitorBackend::unsupported();
        assert!(!backend.supports_enumeration());
        let err = backend.enumerate_devices().await.unwrap_err();
        assert!(matches!(err, PhotoAlignError::Unsupported { .. }));
    }
}
