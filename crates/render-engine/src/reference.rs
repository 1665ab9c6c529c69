//! Reference images loaded from disk for the alignment overlay.
//!
//! A reference is kept as a self-contained blob: the encoded file bytes, the
//! sniffed media type and the decoded pixels. No path is retained once
//! reading completes, so the overlay survives the file being moved or
//! deleted.

use std::path::Path;
use std::sync::Arc;

use image::ImageFormat;

use photoalign_common::error::{PhotoAlignError, PhotoAlignResult};

/// Media types accepted as reference images.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReferenceMime {
    Png,
    Jpeg,
}

impl ReferenceMime {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Png => "image/png",
            Self::Jpeg => "image/jpeg",
        }
    }

    fn image_format(self) -> ImageFormat {
        match self {
            Self::Png => ImageFormat::Png,
            Self::Jpeg => ImageFormat::Jpeg,
        }
    }

    /// Identify the type from the leading bytes of a file.
    pub fn sniff(bytes: &[u8]) -> Option<Self> {
        match image::guess_format(bytes).ok()? {
            ImageFormat::Png => Some(Self::Png),
            ImageFormat::Jpeg => Some(Self::Jpeg),
            _ => None,
        }
    }
}

impl std::fmt::Display for ReferenceMime {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A loaded reference image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReferenceImage {
    /// Name of the file it was read from, for display only.
    pub file_name: String,
    pub mime: ReferenceMime,
    /// The file's bytes, unmodified.
    pub encoded: Arc<[u8]>,
    pub width: u32,
    pub height: u32,
    /// Decoded RGBA8 pixels, `width * height * 4` bytes.
    pub rgba: Arc<[u8]>,
}

impl ReferenceImage {
    /// Build a reference from in-memory file bytes.
    pub fn from_bytes(file_name: impl Into<String>, bytes: Vec<u8>) -> PhotoAlignResult<Self> {
        let file_name = file_name.into();
        if bytes.is_empty() {
            return Err(PhotoAlignError::render(format!("{file_name} is empty")));
        }

        let mime = ReferenceMime::sniff(&bytes).ok_or_else(|| {
            PhotoAlignError::unsupported(format!("{file_name} is not a PNG or JPEG image"))
        })?;
        let (width, height, rgba) = decode_rgba(&bytes, mime)?;

        Ok(Self {
            file_name,
            mime,
            encoded: bytes.into(),
            width,
            height,
            rgba: rgba.into(),
        })
    }

    pub fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }
}

/// Decode PNG or JPEG bytes into packed RGBA8.
pub fn decode_rgba(bytes: &[u8], mime: ReferenceMime) -> PhotoAlignResult<(u32, u32, Vec<u8>)> {
    let decoded = image::load_from_memory_with_format(bytes, mime.image_format())
        .map_err(|e| PhotoAlignError::render(format!("Failed to decode {mime}: {e}")))?
        .to_rgba8();
    let (width, height) = decoded.dimensions();
    if width == 0 || height == 0 {
        return Err(PhotoAlignError::render("Image has no pixels"));
    }
    Ok((width, height, decoded.into_raw()))
}

/// Read and decode a reference image from `path`.
///
/// The read runs on the async runtime and the decode on the blocking pool,
/// so a large photo never stalls the caller's executor.
pub async fn read_reference(path: &Path) -> PhotoAlignResult<ReferenceImage> {
    let bytes = match tokio::fs::read(path).await {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(PhotoAlignError::FileNotFound {
                path: path.to_path_buf(),
            });
        }
        Err(e) => return Err(e.into()),
    };

    let file_name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());

    let reference = tokio::task::spawn_blocking(move || ReferenceImage::from_bytes(file_name, bytes))
        .await
        .map_err(|e| PhotoAlignError::render(format!("Reference decode task failed: {e}")))??;

    tracing::debug!(
        file = %reference.file_name,
        mime = %reference.mime,
        width = reference.width,
        height = reference.height,
        "Reference image loaded"
    );
    Ok(reference)
}
