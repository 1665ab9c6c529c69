//! Take one photo without opening a window.
//!
//! Drives the same capture screen the GUI uses: the first camera is picked
//! automatically (or the one at `--device`), and the photo is written as soon
//! as the stream delivers a frame.

use std::path::PathBuf;
use std::time::{Duration, Instant};

use photoalign_app::device_select::SelectorState;
use photoalign_app::{CaptureScreen, ScreenSettings};
use photoalign_capture_engine::get_backend;
use photoalign_common::config::AppConfig;

const POLL_SLICE: Duration = Duration::from_millis(50);

pub fn run(
    config: &AppConfig,
    device: Option<usize>,
    output: Option<PathBuf>,
    timeout_secs: u64,
) -> anyhow::Result<()> {
    let mut settings = ScreenSettings::from_config(config);
    if let Some(dir) = output {
        settings.export_dir = dir;
    }

    let deadline = Instant::now() + Duration::from_secs(timeout_secs.max(1));
    let mut screen = CaptureScreen::new(
        get_backend(),
        settings,
        tokio::runtime::Handle::current(),
    );

    wait_until(&mut screen, deadline, "device list", |s| {
        matches!(
            s.selector().state(),
            SelectorState::Ready | SelectorState::Unsupported | SelectorState::Failed
        )
    })?;
    fail_on_error(&screen)?;

    let cameras = screen.selector().devices().len();
    if cameras == 0 {
        anyhow::bail!("No video input devices found");
    }
    if let Some(index) = device {
        if index >= cameras {
            anyhow::bail!("Device {index} out of range ({cameras} cameras found)");
        }
        screen.select_device(index);
    }

    wait_until(&mut screen, deadline, "first frame", |s| {
        s.error().is_some() || s.latest_frame().is_some()
    })?;
    fail_on_error(&screen)?;

    let device_label = screen
        .video_source()
        .map(|d| d.display_label().to_string())
        .unwrap_or_default();
    let path = match screen.capture_photo() {
        Some(path) => path,
        None => {
            fail_on_error(&screen)?;
            anyhow::bail!("Capture produced no photo");
        }
    };

    tracing::info!(device = %device_label, path = %path.display(), "Snapshot taken");
    println!("{}", path.display());
    Ok(())
}

fn wait_until<F>(
    screen: &mut CaptureScreen,
    deadline: Instant,
    what: &str,
    mut done: F,
) -> anyhow::Result<()>
where
    F: FnMut(&CaptureScreen) -> bool,
{
    loop {
        if done(screen) {
            return Ok(());
        }
        let now = Instant::now();
        if now >= deadline {
            anyhow::bail!("Timed out waiting for {what}");
        }
        screen.poll_blocking(POLL_SLICE.min(deadline - now));
    }
}

fn fail_on_error(screen: &CaptureScreen) -> anyhow::Result<()> {
    match screen.error() {
        Some(message) => anyhow::bail!("{message}"),
        None => Ok(()),
    }
}
