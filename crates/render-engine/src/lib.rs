//! Photo Align Render Engine
//!
//! Everything between a decoded frame and what the user sees or keeps:
//! the on-screen overlay layout, reference image loading, and PNG export.
//!
//! # Pipeline Architecture
//!
//! ```text
//! live frame ──┬── OverlayLayout (contain, centered) ──► view
//!              │          ▲
//! ref.png/jpg ─┼── read_reference (sniff + decode)
//!              │
//!              └── encode_png ──► <export dir>/Image_<epoch-ms>.png
//! ```

pub mod compositor;
pub mod export;
pub mod reference;

pub use compositor::{OverlayLayout, Rect};
pub use export::*;
pub use reference::*;
