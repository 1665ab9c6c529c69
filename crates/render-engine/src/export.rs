//! Single-frame photo export.

use std::io::Write;
use std::path::{Path, PathBuf};

use image::{ExtendedColorType, ImageEncoder};
use tempfile::NamedTempFile;

use photoalign_common::clock::CaptureClock;
use photoalign_common::error::{PhotoAlignError, PhotoAlignResult};
use photoalign_platform_core::VideoFrame;

/// Prefix of every exported photo name.
pub const PHOTO_PREFIX: &str = "Image_";

/// Extension of every exported photo name.
pub const PHOTO_EXTENSION: &str = "png";

/// Upper bound on name collisions skipped in one export.
const MAX_NAME_ATTEMPTS: usize = 64;

/// File name of a photo taken at `epoch_ms`.
pub fn photo_file_name(epoch_ms: i64) -> String {
    format!("{PHOTO_PREFIX}{epoch_ms}.{PHOTO_EXTENSION}")
}

/// Encode a frame as PNG at its native resolution.
pub fn encode_png(frame: &VideoFrame) -> PhotoAlignResult<Vec<u8>> {
    if frame.is_empty() {
        return Err(PhotoAlignError::render("Cannot export an empty frame"));
    }
    if frame.pixels.len() != VideoFrame::expected_len(frame.width, frame.height) {
        return Err(PhotoAlignError::render(format!(
            "Frame buffer holds {} bytes, expected {} for {}x{}",
            frame.pixels.len(),
            VideoFrame::expected_len(frame.width, frame.height),
            frame.width,
            frame.height
        )));
    }

    let mut buffer = Vec::new();
    image::codecs::png::PngEncoder::new(&mut buffer)
        .write_image(
            &frame.pixels,
            frame.width,
            frame.height,
            ExtendedColorType::Rgba8,
        )
        .map_err(|e| PhotoAlignError::render(format!("PNG encoding failed: {e}")))?;
    Ok(buffer)
}

/// Write `frame` into `dir` as `Image_<epoch-ms>.png` and return its path.
///
/// The directory is created when missing. The PNG is staged in a temporary
/// file next to its destination and only linked under its final name once
/// fully written, so a failed write leaves nothing behind. An existing file
/// is never overwritten; the clock is advanced until a free name is found.
pub fn export_photo(frame: &VideoFrame, dir: &Path, clock: &CaptureClock) -> PhotoAlignResult<PathBuf> {
    let encoded = encode_png(frame)?;
    let path = publish_photo(dir, clock, |file| {
        file.write_all(&encoded)?;
        file.flush()
    })?;

    tracing::info!(
        path = %path.display(),
        width = frame.width,
        height = frame.height,
        bytes = encoded.len(),
        "Photo exported"
    );
    Ok(path)
}

fn publish_photo<W>(dir: &Path, clock: &CaptureClock, write: W) -> PhotoAlignResult<PathBuf>
where
    W: FnOnce(&mut NamedTempFile) -> std::io::Result<()>,
{
    std::fs::create_dir_all(dir)?;

    let mut staged = tempfile::Builder::new()
        .prefix(".photo-")
        .suffix(".part")
        .tempfile_in(dir)?;
    // Dropping `staged` on error removes the partial file.
    write(&mut staged)?;

    for _ in 0..MAX_NAME_ATTEMPTS {
        let path = dir.join(photo_file_name(clock.next_millis()));
        match staged.persist_noclobber(&path) {
            Ok(_) => return Ok(path),
            Err(e) if e.error.kind() == std::io::ErrorKind::AlreadyExists => {
                tracing::debug!(path = %path.display(), "Photo name taken, advancing clock");
                staged = e.file;
            }
            Err(e) => return Err(e.error.into()),
        }
    }

    Err(PhotoAlignError::render(format!(
        "No free photo name in {}",
        dir.display()
    )))
}
