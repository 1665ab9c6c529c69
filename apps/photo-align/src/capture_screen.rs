//! Capture screen controller.
//!
//! Owns the selected camera, its live stream, the reference overlay and the
//! single error message. Slow work (enumeration, stream acquisition,
//! reference reads) runs on the tokio runtime and comes back as one
//! [`ScreenMessage`] each; the owner drains them with [`CaptureScreen::poll`]
//! from its own loop, so all state changes happen on one thread.

use std::path::PathBuf;
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender, TryRecvError};
use std::sync::Arc;
use std::time::Duration;

use photoalign_capture_engine::{LiveStream, MediaBackend, RequestId, RequestTracker, StreamSlot};
use photoalign_common::clock::CaptureClock;
use photoalign_common::config::AppConfig;
use photoalign_common::error::PhotoAlignResult;
use photoalign_platform_core::{MediaDeviceInfo, MediaStreamConstraints, VideoFrame};
use photoalign_render_engine::export::export_photo;
use photoalign_render_engine::reference::{read_reference, ReferenceImage};

use crate::device_select::{DeviceSelector, SelectorEvent};

/// Shown for any reference file that cannot be used.
pub const ERROR_LOADING_FILE: &str = "Error Loading File";

/// Shown when a capture is requested before the first frame arrives.
pub const VIDEO_NOT_AVAILABLE: &str = "Video stream not available.";

/// Settings a screen needs from the application config.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScreenSettings {
    /// Where photos are written.
    pub export_dir: PathBuf,
    pub min_width: u32,
    pub min_height: u32,
}

impl ScreenSettings {
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            export_dir: config.export_dir.clone(),
            min_width: config.capture.min_width,
            min_height: config.capture.min_height,
        }
    }
}

/// Results delivered from the runtime back to the screen.
pub enum ScreenMessage {
    DevicesLoaded(PhotoAlignResult<Vec<MediaDeviceInfo>>),
    StreamAcquired {
        request: RequestId,
        result: PhotoAlignResult<Box<dyn LiveStream>>,
    },
    ReferenceRead {
        request: RequestId,
        result: PhotoAlignResult<ReferenceImage>,
    },
}

impl std::fmt::Debug for ScreenMessage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::DevicesLoaded(result) => f
                .debug_tuple("DevicesLoaded")
                .field(&result.as_ref().map(Vec::len))
                .finish(),
            Self::StreamAcquired { request, result } => f
                .debug_struct("StreamAcquired")
                .field("request", request)
                .field("ok", &result.is_ok())
                .finish(),
            Self::ReferenceRead { request, result } => f
                .debug_struct("ReferenceRead")
                .field("request", request)
                .field("ok", &result.is_ok())
                .finish(),
        }
    }
}

/// The capture screen.
pub struct CaptureScreen {
    runtime: tokio::runtime::Handle,
    backend: Arc<dyn MediaBackend>,
    settings: ScreenSettings,
    selector: DeviceSelector,
    video_source: Option<MediaDeviceInfo>,
    stream: StreamSlot,
    acquisitions: RequestTracker,
    acquiring: bool,
    reference: Option<ReferenceImage>,
    reference_reads: RequestTracker,
    loading_reference: bool,
    error: Option<String>,
    last_export: Option<PathBuf>,
    clock: CaptureClock,
    tx: Sender<ScreenMessage>,
    rx: Receiver<ScreenMessage>,
}

impl CaptureScreen {
    /// Create the screen and start listing devices.
    pub fn new(
        backend: Arc<dyn MediaBackend>,
        settings: ScreenSettings,
        runtime: tokio::runtime::Handle,
    ) -> Self {
        let (tx, rx) = mpsc::channel();
        let mut screen = Self {
            runtime,
            selector: DeviceSelector::new(backend.clone()),
            backend,
            settings,
            video_source: None,
            stream: StreamSlot::new(),
            acquisitions: RequestTracker::new(),
            acquiring: false,
            reference: None,
            reference_reads: RequestTracker::new(),
            loading_reference: false,
            error: None,
            last_export: None,
            clock: CaptureClock::new(),
            tx,
            rx,
        };

        let tx = screen.tx.clone();
        let event = screen.selector.start(&screen.runtime, move |result| {
            let _ = tx.send(ScreenMessage::DevicesLoaded(result));
        });
        if let Some(event) = event {
            screen.handle_selector_event(event);
        }
        screen
    }

    /// Make `device` the video source and request a stream for it.
    ///
    /// Both the automatic first-device pick and user selection come through
    /// here. Re-selecting the current device while its stream is live or
    /// still being acquired does nothing.
    pub fn set_video_source(&mut self, device: MediaDeviceInfo) {
        if self.video_source.as_ref() == Some(&device) && (self.stream.is_bound() || self.acquiring)
        {
            tracing::debug!(device = %device.device_id, "Video source unchanged");
            return;
        }

        self.stream.release();
        self.video_source = Some(device.clone());

        let request = self.acquisitions.begin();
        self.acquiring = true;
        let constraints = MediaStreamConstraints::for_device(
            &device,
            self.settings.min_width,
            self.settings.min_height,
        );

        tracing::info!(
            device = %device.device_id,
            label = device.display_label(),
            request = request.value(),
            "Requesting live stream"
        );

        let backend = self.backend.clone();
        let tx = self.tx.clone();
        self.runtime.spawn(async move {
            let result = backend.acquire_stream(&constraints).await;
            // A closed channel drops the stream here, which releases it.
            let _ = tx.send(ScreenMessage::StreamAcquired { request, result });
        });
    }

    /// Forward a pick from the device control.
    pub fn select_device(&mut self, index: usize) {
        if let Some(event) = self.selector.select(index) {
            self.handle_selector_event(event);
        }
    }

    /// Forward focus loss from the device control.
    ///
    /// Re-reporting the current source never requests a stream, even after
    /// a failed acquisition; only an explicit pick retries.
    pub fn blur_device_control(&mut self) {
        match self.selector.blur() {
            Some(SelectorEvent::Changed(device)) if self.video_source.as_ref() == Some(&device) => {
                tracing::debug!(device = %device.device_id, "Focus left device control");
            }
            Some(event) => self.handle_selector_event(event),
            None => {}
        }
    }

    /// Export the current frame as a PNG.
    ///
    /// Does nothing without a video source. Returns the written path.
    pub fn capture_photo(&mut self) -> Option<PathBuf> {
        if !self.can_capture() {
            tracing::debug!("Capture ignored without a video source");
            return None;
        }

        let Some(frame) = self.stream.latest_frame() else {
            self.error = Some(VIDEO_NOT_AVAILABLE.to_string());
            return None;
        };

        match export_photo(&frame, &self.settings.export_dir, &self.clock) {
            Ok(path) => {
                self.last_export = Some(path.clone());
                Some(path)
            }
            Err(e) => {
                tracing::error!(error = %e, dir = %self.settings.export_dir.display(), "Photo export failed");
                self.error = Some(e.to_string());
                None
            }
        }
    }

    /// Load a reference image from the first of `paths`.
    pub fn load_reference<I>(&mut self, paths: I)
    where
        I: IntoIterator<Item = PathBuf>,
    {
        let Some(path) = paths.into_iter().next() else {
            return;
        };

        let request = self.reference_reads.begin();
        self.loading_reference = true;
        tracing::info!(path = %path.display(), request = request.value(), "Reading reference image");

        let tx = self.tx.clone();
        self.runtime.spawn(async move {
            let result = read_reference(&path).await;
            let _ = tx.send(ScreenMessage::ReferenceRead { request, result });
        });
    }

    /// Clear the error message. Never retries anything.
    pub fn dismiss_error(&mut self) {
        self.error = None;
    }

    /// Apply every result that has arrived. Returns how many were applied.
    pub fn poll(&mut self) -> usize {
        let mut handled = 0;
        loop {
            match self.rx.try_recv() {
                Ok(message) => {
                    self.handle_message(message);
                    handled += 1;
                }
                Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => break,
            }
        }
        handled
    }

    /// Wait up to `timeout` for at least one result, then drain the rest.
    pub fn poll_blocking(&mut self, timeout: Duration) -> usize {
        match self.rx.recv_timeout(timeout) {
            Ok(message) => {
                self.handle_message(message);
                1 + self.poll()
            }
            Err(RecvTimeoutError::Timeout) | Err(RecvTimeoutError::Disconnected) => 0,
        }
    }

    fn handle_message(&mut self, message: ScreenMessage) {
        match message {
            ScreenMessage::DevicesLoaded(result) => {
                if let Some(event) = self.selector.finish_load(result) {
                    self.handle_selector_event(event);
                }
            }
            ScreenMessage::StreamAcquired { request, result } => {
                self.apply_stream(request, result);
            }
            ScreenMessage::ReferenceRead { request, result } => {
                self.apply_reference(request, result);
            }
        }
    }

    fn handle_selector_event(&mut self, event: SelectorEvent) {
        match event {
            SelectorEvent::Loaded(devices) => {
                if self.video_source.is_none() {
                    if let Some(first) = devices.into_iter().next() {
                        self.set_video_source(first);
                    }
                }
            }
            SelectorEvent::Changed(device) => self.set_video_source(device),
            SelectorEvent::Error(message) => self.error = Some(message),
        }
    }

    fn apply_stream(&mut self, request: RequestId, result: PhotoAlignResult<Box<dyn LiveStream>>) {
        if !self.acquisitions.is_current(request) {
            match result {
                Ok(mut stream) => {
                    tracing::debug!(
                        device = stream.device_id(),
                        request = request.value(),
                        "Releasing superseded stream"
                    );
                    if let Err(e) = stream.release() {
                        tracing::warn!(error = %e, "Superseded stream release failed");
                    }
                }
                Err(e) => {
                    tracing::debug!(request = request.value(), error = %e, "Discarding superseded failure");
                }
            }
            return;
        }

        self.acquiring = false;
        match result {
            Ok(stream) => {
                tracing::info!(device = stream.device_id(), "Live stream playing");
                self.stream.bind(stream);
            }
            Err(e) => {
                tracing::warn!(error = %e, "Stream acquisition failed");
                self.error = Some(e.to_string());
            }
        }
    }

    fn apply_reference(&mut self, request: RequestId, result: PhotoAlignResult<ReferenceImage>) {
        if !self.reference_reads.is_current(request) {
            tracing::debug!(request = request.value(), "Discarding superseded reference read");
            return;
        }

        self.loading_reference = false;
        match result {
            Ok(reference) => self.reference = Some(reference),
            Err(e) => {
                tracing::warn!(error = %e, "Reference image could not be loaded");
                self.error = Some(ERROR_LOADING_FILE.to_string());
            }
        }
    }

    /// Capture is possible once a device is selected.
    pub fn can_capture(&self) -> bool {
        self.video_source.is_some()
    }

    pub fn video_source(&self) -> Option<&MediaDeviceInfo> {
        self.video_source.as_ref()
    }

    pub fn selector(&self) -> &DeviceSelector {
        &self.selector
    }

    /// Device of the bound stream.
    pub fn stream_device_id(&self) -> Option<&str> {
        self.stream.device_id()
    }

    pub fn is_streaming(&self) -> bool {
        self.stream.is_active()
    }

    pub fn is_acquiring(&self) -> bool {
        self.acquiring
    }

    pub fn latest_frame(&self) -> Option<VideoFrame> {
        self.stream.latest_frame()
    }

    pub fn reference(&self) -> Option<&ReferenceImage> {
        self.reference.as_ref()
    }

    pub fn is_loading_reference(&self) -> bool {
        self.loading_reference
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn last_export(&self) -> Option<&PathBuf> {
        self.last_export.as_ref()
    }

    pub fn settings(&self) -> &ScreenSettings {
        &self.settings
    }
}

impl std::fmt::Debug for CaptureScreen {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CaptureScreen")
            .field("selector", &self.selector)
            .field("video_source", &self.video_source)
            .field("stream", &self.stream)
            .field("acquiring", &self.acquiring)
            .field("reference", &self.reference.as_ref().map(|r| &r.file_name))
            .field("error", &self.error)
            .finish()
    }
}
