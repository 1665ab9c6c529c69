//! On-screen composition of the live video and the reference overlay.
//!
//! The live frame is fitted into the view area without cropping or
//! stretching, and the reference image is fitted the same way inside the
//! video rectangle so both share one frame of reference while aligning.
//! Nothing here touches pixels; the exported photo never contains the
//! overlay.

/// Axis-aligned rectangle in view coordinates (logical points).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Rect {
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn center(&self) -> (f32, f32) {
        (self.x + self.width / 2.0, self.y + self.height / 2.0)
    }

    pub fn is_empty(&self) -> bool {
        self.width <= 0.0 || self.height <= 0.0
    }

    /// Whether `other` lies inside this rectangle, allowing rounding slack.
    pub fn contains_rect(&self, other: &Rect) -> bool {
        const EPS: f32 = 1e-3;
        other.x >= self.x - EPS
            && other.y >= self.y - EPS
            && other.x + other.width <= self.x + self.width + EPS
            && other.y + other.height <= self.y + self.height + EPS
    }

    /// Largest rectangle with the aspect of `content` that fits inside this
    /// one, centered. Empty at the center when either side has no area.
    pub fn fit_contain(&self, content_width: u32, content_height: u32) -> Rect {
        let (cx, cy) = self.center();
        if self.is_empty() || content_width == 0 || content_height == 0 {
            return Rect::new(cx, cy, 0.0, 0.0);
        }

        let scale = (self.width / content_width as f32).min(self.height / content_height as f32);
        let width = content_width as f32 * scale;
        let height = content_height as f32 * scale;
        Rect::new(cx - width / 2.0, cy - height / 2.0, width, height)
    }
}

/// Where the video and the reference overlay are drawn this frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OverlayLayout {
    /// Live video rectangle.
    pub video: Rect,

    /// Reference overlay rectangle, when a reference is loaded.
    pub reference: Option<Rect>,
}

impl OverlayLayout {
    /// Lay out one frame of `frame_size` in `area`, with an optional
    /// reference image of `reference_size` on top.
    pub fn compute(
        area: Rect,
        frame_size: (u32, u32),
        reference_size: Option<(u32, u32)>,
    ) -> Self {
        let video = area.fit_contain(frame_size.0, frame_size.1);
        let reference = reference_size.map(|(w, h)| video.fit_contain(w, h));
        Self { video, reference }
    }
}
