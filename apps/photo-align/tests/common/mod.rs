#![allow(dead_code)]

use std::collections::HashMap;
use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use image::ImageEncoder;
use photoalign_app::{CaptureScreen, ScreenSettings};
use photoalign_capture_engine::{LiveStream, MediaBackend};
use photoalign_common::error::{PhotoAlignError, PhotoAlignResult};
use photoalign_platform_core::{
    MediaDeviceInfo, MediaDeviceKind, MediaStreamConstraints, VideoFrame,
};

/// How the fake answers a stream request for one device.
#[derive(Debug, Clone)]
pub enum Outcome {
    Stream {
        width: u32,
        height: u32,
        delay: Duration,
        with_frame: bool,
    },
    Fail(String),
}

impl Outcome {
    pub fn stream(width: u32, height: u32) -> Self {
        Self::Stream {
            width,
            height,
            delay: Duration::ZERO,
            with_frame: true,
        }
    }

    pub fn delayed(width: u32, height: u32, delay: Duration) -> Self {
        Self::Stream {
            width,
            height,
            delay,
            with_frame: true,
        }
    }

    pub fn without_frames() -> Self {
        Self::Stream {
            width: 0,
            height: 0,
            delay: Duration::ZERO,
            with_frame: false,
        }
    }
}

/// Scriptable stand-in for a host media backend.
pub struct FakeBackend {
    pub supported: bool,
    pub inventory: Result<Vec<MediaDeviceInfo>, String>,
    pub outcomes: HashMap<String, Outcome>,
    pub requests: Arc<Mutex<Vec<MediaStreamConstraints>>>,
    pub released: Arc<Mutex<Vec<String>>>,
}

impl FakeBackend {
    pub fn new(inventory: Vec<MediaDeviceInfo>) -> Self {
        Self {
            supported: true,
            inventory: Ok(inventory),
            outcomes: HashMap::new(),
            requests: Arc::new(Mutex::new(Vec::new())),
            released: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn unsupported() -> Self {
        Self {
            supported: false,
            ..Self::new(Vec::new())
        }
    }

    pub fn failing(message: &str) -> Self {
        Self {
            inventory: Err(message.to_string()),
            ..Self::new(Vec::new())
        }
    }

    pub fn with_outcome(mut self, device_id: &str, outcome: Outcome) -> Self {
        self.outcomes.insert(device_id.to_string(), outcome);
        self
    }

    pub fn request_count(&self) -> usize {
        self.requests.lock().expect("request log").len()
    }

    pub fn requested_devices(&self) -> Vec<String> {
        self.requests
            .lock()
            .expect("request log")
            .iter()
            .map(|c| c.video.device_id.clone())
            .collect()
    }

    pub fn released_devices(&self) -> Vec<String> {
        self.released.lock().expect("release log").clone()
    }
}

#[async_trait::async_trait]
impl MediaBackend for FakeBackend {
    fn name(&self) -> &str {
        "fake"
    }

    fn supports_enumeration(&self) -> bool {
        self.supported
    }

    async fn enumerate_devices(&self) -> PhotoAlignResult<Vec<MediaDeviceInfo>> {
        self.inventory.clone().map_err(PhotoAlignError::platform)
    }

    async fn acquire_stream(
        &self,
        constraints: &MediaStreamConstraints,
    ) -> PhotoAlignResult<Box<dyn LiveStream>> {
        self.requests
            .lock()
            .expect("request log")
            .push(constraints.clone());

        let device_id = constraints.video.device_id.clone();
        let outcome = self
            .outcomes
            .get(&device_id)
            .cloned()
            .unwrap_or_else(|| Outcome::stream(1280, 720));

        match outcome {
            Outcome::Fail(message) => Err(PhotoAlignError::stream_acquisition(message)),
            Outcome::Stream {
                width,
                height,
                delay,
                with_frame,
            } => {
                if !delay.is_zero() {
                    tokio::time::sleep(delay).await;
                }
                let frame = with_frame.then(|| test_frame(width, height));
                Ok(Box::new(FakeStream {
                    device_id,
                    frame,
                    released: false,
                    log: self.released.clone(),
                }))
            }
        }
    }
}

/// Live stream that records its release.
pub struct FakeStream {
    device_id: String,
    frame: Option<VideoFrame>,
    released: bool,
    log: Arc<Mutex<Vec<String>>>,
}

impl LiveStream for FakeStream {
    fn device_id(&self) -> &str {
        &self.device_id
    }

    fn latest_frame(&self) -> Option<VideoFrame> {
        if self.released {
            None
        } else {
            self.frame.clone()
        }
    }

    fn frames_received(&self) -> u64 {
        u64::from(self.frame.is_some())
    }

    fn is_active(&self) -> bool {
        !self.released
    }

    fn release(&mut self) -> PhotoAlignResult<()> {
        if !self.released {
            self.released = true;
            self.log
                .lock()
                .expect("release log")
                .push(self.device_id.clone());
        }
        Ok(())
    }
}

impl Drop for FakeStream {
    fn drop(&mut self) {
        let _ = self.release();
    }
}

pub fn camera(id: &str, label: &str) -> MediaDeviceInfo {
    MediaDeviceInfo {
        device_id: id.to_string(),
        group_id: format!("group-{id}"),
        label: label.to_string(),
        kind: MediaDeviceKind::VideoInput,
    }
}

pub fn microphone(id: &str) -> MediaDeviceInfo {
    MediaDeviceInfo {
        device_id: id.to_string(),
        group_id: format!("group-{id}"),
        label: "Microphone".to_string(),
        kind: MediaDeviceKind::AudioInput,
    }
}

pub fn test_frame(width: u32, height: u32) -> VideoFrame {
    let mut pixels = Vec::with_capacity(VideoFrame::expected_len(width, height));
    for y in 0..height {
        for x in 0..width {
            pixels.extend_from_slice(&[(x * 3) as u8, (y * 5) as u8, 90, 255]);
        }
    }
    VideoFrame::from_rgba(width, height, pixels, 1).expect("frame size should match")
}

pub fn runtime() -> tokio::runtime::Runtime {
    tokio::runtime::Builder::new_multi_thread()
        .worker_threads(2)
        .enable_all()
        .build()
        .expect("tokio runtime should initialize")
}

pub fn settings(export_dir: &Path) -> ScreenSettings {
    ScreenSettings {
        export_dir: export_dir.to_path_buf(),
        min_width: 1280,
        min_height: 720,
    }
}

pub fn open_screen(
    backend: &Arc<FakeBackend>,
    export_dir: &Path,
    runtime: &tokio::runtime::Runtime,
) -> CaptureScreen {
    CaptureScreen::new(backend.clone(), settings(export_dir), runtime.handle().clone())
}

/// Poll until `done` holds, failing the test after a few seconds.
pub fn wait_for<F>(screen: &mut CaptureScreen, mut done: F)
where
    F: FnMut(&CaptureScreen) -> bool,
{
    let deadline = Instant::now() + Duration::from_secs(5);
    while !done(screen) {
        assert!(Instant::now() < deadline, "timed out waiting: {screen:?}");
        screen.poll_blocking(Duration::from_millis(20));
    }
}

/// Keep applying results for `window`, so late arrivals are observed.
pub fn drain_for(screen: &mut CaptureScreen, window: Duration) {
    let deadline = Instant::now() + window;
    while Instant::now() < deadline {
        screen.poll_blocking(Duration::from_millis(20));
    }
}

pub fn write_png(path: &Path, width: u32, height: u32) {
    let img = image::RgbaImage::from_fn(width, height, |x, y| {
        image::Rgba([x as u8, y as u8, 30, 255])
    });
    let mut buffer = Vec::new();
    image::codecs::png::PngEncoder::new(&mut buffer)
        .write_image(img.as_raw(), width, height, image::ExtendedColorType::Rgba8)
        .expect("png should encode");
    std::fs::write(path, buffer).expect("png should be written");
}
