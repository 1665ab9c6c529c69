//! Photo Align application
//!
//! Live camera view with a semi-transparent reference image on top, used to
//! line up a shot before taking it. The screen logic lives in
//! [`capture_screen`] and [`device_select`] so it can be driven without a
//! window; [`view`] is the eframe front end.

pub mod capture_screen;
pub mod device_select;
pub mod view;

pub use capture_screen::{CaptureScreen, ScreenMessage, ScreenSettings};
pub use device_select::{DeviceSelector, SelectOption, SelectorEvent};
pub use view::PhotoAlignApp;
