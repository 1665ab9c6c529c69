//! GStreamer pipelines for live camera preview.
//!
//! Every pipeline ends in an `appsink` that keeps only the most recent frame,
//! converted to packed RGBA. The UI samples that frame when it repaints and
//! photo capture copies it when the user presses the shutter.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, OnceLock};

use gst::prelude::*;
use gstreamer as gst;
use gstreamer_app as gst_app;
use photoalign_common::error::{PhotoAlignError, PhotoAlignResult};
use photoalign_platform_core::{VideoConstraints, VideoFrame};

/// Name of the appsink element every preview pipeline ends in.
pub const FRAME_SINK_NAME: &str = "framesink";

/// Upper bound used for open-ended caps ranges.
const CAPS_RANGE_MAX: i32 = i32::MAX;

/// How long acquisition waits for the camera to start delivering.
const START_TIMEOUT_SECS: u64 = 10;

/// A live video feed bound to one device.
///
/// Implementations release their hardware in `Drop` as well, so a stream
/// that is simply dropped never keeps the camera open.
pub trait LiveStream: Send {
    /// Identifier of the device this stream reads from.
    fn device_id(&self) -> &str;

    /// The most recent frame, if any has arrived yet.
    fn latest_frame(&self) -> Option<VideoFrame>;

    /// Number of frames received since the stream started.
    fn frames_received(&self) -> u64;

    /// Whether the stream is still delivering.
    fn is_active(&self) -> bool;

    /// Stop the stream and release the device. Idempotent.
    fn release(&mut self) -> PhotoAlignResult<()>;
}

pub struct GstVideoPipeline {
    device_id: String,
    pipeline: gst::Pipeline,
    latest: Arc<Mutex<Option<VideoFrame>>>,
    frames_received: Arc<AtomicU64>,
    running: Arc<AtomicBool>,
}

impl GstVideoPipeline {
    /// Build a pipeline from a launch string ending in [`FRAME_SINK_NAME`].
    pub fn from_launch(device_id: impl Into<String>, launch: &str) -> PhotoAlignResult<Self> {
        init_gstreamer()?;

        let element = gst::parse::launch(launch)
            .map_err(|e| PhotoAlignError::capture(format!("Failed to build pipeline: {e}")))?;

        let pipeline = element.dynamic_cast::<gst::Pipeline>().map_err(|_| {
            PhotoAlignError::capture("Launch string did not produce a pipeline")
        })?;

        let sink = pipeline
            .by_name(FRAME_SINK_NAME)
            .ok_or_else(|| PhotoAlignError::capture("Pipeline has no frame sink"))?
            .dynamic_cast::<gst_app::AppSink>()
            .map_err(|_| PhotoAlignError::capture("Frame sink is not an appsink"))?;

        let latest = Arc::new(Mutex::new(None));
        let frames_received = Arc::new(AtomicU64::new(0));
        install_frame_callbacks(&sink, latest.clone(), frames_received.clone());

        Ok(Self {
            device_id: device_id.into(),
            pipeline,
            latest,
            frames_received,
            running: Arc::new(AtomicBool::new(false)),
        })
    }

    /// Start streaming and wait until the source is actually playing.
    ///
    /// On failure the pipeline is torn down and the first error the pipeline
    /// posted is returned verbatim.
    pub fn start(&mut self) -> PhotoAlignResult<()> {
        if let Err(e) = self.pipeline.set_state(gst::State::Playing) {
            return Err(self.fail_start(format!("Could not start video source: {e:?}")));
        }

        // State changes of live sources are async; wait so that a device that
        // is busy or cannot satisfy the caps is reported here and not later.
        match self
            .pipeline
            .state(gst::ClockTime::from_seconds(START_TIMEOUT_SECS))
        {
            (Ok(_), gst::State::Playing, _) => {}
            (Ok(_), state, _) => {
                tracing::warn!(
                    device = %self.device_id,
                    ?state,
                    "Stream did not reach Playing state within timeout"
                );
            }
            (Err(e), _, _) => {
                return Err(self.fail_start(format!("Video source failed to start: {e:?}")));
            }
        }

        self.running.store(true, Ordering::SeqCst);
        tracing::info!(device = %self.device_id, "Live stream started");
        Ok(())
    }

    fn fail_start(&self, fallback: String) -> PhotoAlignError {
        let message = self.pop_bus_error().unwrap_or(fallback);
        if let Err(e) = self.pipeline.set_state(gst::State::Null) {
            tracing::warn!(device = %self.device_id, error = ?e, "Failed to reset pipeline");
        }
        tracing::warn!(device = %self.device_id, %message, "Stream acquisition failed");
        PhotoAlignError::stream_acquisition(message)
    }

    fn pop_bus_error(&self) -> Option<String> {
        let bus = self.pipeline.bus()?;
        let msg = bus.pop_filtered(&[gst::MessageType::Error])?;
        match msg.view() {
            gst::MessageView::Error(err) => Some(err.error().message().to_string()),
            _ => None,
        }
    }
}

impl LiveStream for GstVideoPipeline {
    fn device_id(&self) -> &str {
        &self.device_id
    }

    fn latest_frame(&self) -> Option<VideoFrame> {
        self.latest.lock().ok().and_then(|slot| slot.clone())
    }

    fn frames_received(&self) -> u64 {
        self.frames_received.load(Ordering::SeqCst)
    }

    fn is_active(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    fn release(&mut self) -> PhotoAlignResult<()> {
        if !self.running.swap(false, Ordering::SeqCst) {
            return Ok(());
        }

        self.pipeline.set_state(gst::State::Null).map_err(|e| {
            PhotoAlignError::capture(format!(
                "Failed to release stream for {}: {e:?}",
                self.device_id
            ))
        })?;
        if let Ok(mut slot) = self.latest.lock() {
            *slot = None;
        }
        tracing::info!(device = %self.device_id, "Live stream released");
        Ok(())
    }
}

impl Drop for GstVideoPipeline {
    fn drop(&mut self) {
        if let Err(e) = self.release() {
            tracing::warn!(error = %e, "Stream release on drop failed");
        }
        // Never started or already released: make sure the elements let go
        // of the device node either way.
        let _ = self.pipeline.set_state(gst::State::Null);
    }
}

fn install_frame_callbacks(
    sink: &gst_app::AppSink,
    latest: Arc<Mutex<Option<VideoFrame>>>,
    frames_received: Arc<AtomicU64>,
) {
    sink.set_callbacks(
        gst_app::AppSinkCallbacks::builder()
            .new_sample(move |appsink| {
                let sample = appsink.pull_sample().map_err(|_| gst::FlowError::Eos)?;
                let sequence = frames_received.fetch_add(1, Ordering::SeqCst) + 1;
                match frame_from_sample(&sample, sequence) {
                    Some(frame) => {
                        if let Ok(mut slot) = latest.lock() {
                            *slot = Some(frame);
                        }
                    }
                    None => tracing::debug!(sequence, "Dropped malformed sample"),
                }
                Ok(gst::FlowSuccess::Ok)
            })
            .build(),
    );
}

fn frame_from_sample(sample: &gst::Sample, sequence: u64) -> Option<VideoFrame> {
    let structure = sample.caps()?.structure(0)?;
    let width = u32::try_from(structure.get::<i32>("width").ok()?).ok()?;
    let height = u32::try_from(structure.get::<i32>("height").ok()?).ok()?;

    let buffer = sample.buffer()?;
    let map = buffer.map_readable().ok()?;
    let pixels = pack_rgba_rows(map.as_slice(), width, height)?;
    VideoFrame::from_rgba(width, height, pixels, sequence)
}

/// Strip per-row padding from an RGBA buffer.
///
/// GStreamer may pad rows to an alignment; the stride is derived from the
/// buffer length.
pub fn pack_rgba_rows(data: &[u8], width: u32, height: u32) -> Option<Vec<u8>> {
    let height = height as usize;
    let row = width as usize * VideoFrame::BYTES_PER_PIXEL;
    if height == 0 || row == 0 {
        return None;
    }

    let stride = data.len() / height;
    if stride < row {
        return None;
    }
    if stride == row {
        return Some(data[..row * height].to_vec());
    }

    let mut pixels = Vec::with_capacity(row * height);
    for line in data.chunks(stride).take(height) {
        pixels.extend_from_slice(line.get(..row)?);
    }
    Some(pixels)
}

/// Launch string for a camera preview honoring the minimum size constraints.
///
/// Both raw and MJPEG source formats are accepted; most cameras only offer
/// 720p and above as MJPEG.
pub fn build_webcam_launch(source: &str, constraints: &VideoConstraints) -> String {
    let range = format!(
        "width=[{},{CAPS_RANGE_MAX}],height=[{},{CAPS_RANGE_MAX}]",
        constraints.min_width.min(CAPS_RANGE_MAX as u32),
        constraints.min_height.min(CAPS_RANGE_MAX as u32),
    );
    format!(
        "{source} ! capsfilter caps=\"video/x-raw,{range};image/jpeg,{range}\" ! decodebin ! videoconvert ! video/x-raw,format=RGBA ! appsink name={FRAME_SINK_NAME} max-buffers=1 drop=true sync=false"
    )
}

/// `v4l2src` fragment for a device node.
pub fn v4l2_source(device_path: &str) -> String {
    format!("v4l2src device=\"{}\"", escape_property(device_path))
}

/// Build and start a preview stream.
pub fn start_webcam_stream(
    device_id: &str,
    source: &str,
    constraints: &VideoConstraints,
) -> PhotoAlignResult<Box<dyn LiveStream>> {
    let launch = build_webcam_launch(source, constraints);
    tracing::debug!(device = device_id, %launch, "Building preview pipeline");
    let mut pipeline = GstVideoPipeline::from_launch(device_id, &launch)?;
    pipeline.start()?;
    Ok(Box::new(pipeline))
}

pub(crate) fn init_gstreamer() -> PhotoAlignResult<()> {
    static GST_INIT: OnceLock<Result<(), String>> = OnceLock::new();
    let init_res = GST_INIT.get_or_init(|| gst::init().map_err(|e| e.to_string()));
    match init_res {
        Ok(()) => Ok(()),
        Err(e) => Err(PhotoAlignError::capture(format!(
            "Failed to initialize GStreamer: {e}"
        ))),
    }
}

fn escape_property(value: &str) -> String {
    value.replace('\\', "\\\\").replace('"', "\\\"")
}
