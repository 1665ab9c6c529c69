//! Camera picker state.
//!
//! The selector asks the backend for the device inventory once, keeps only
//! the video inputs in host order, and turns user picks into
//! [`SelectorEvent::Changed`]. It never re-enumerates; a camera plugged in
//! later shows up on the next launch.

use std::sync::Arc;

use photoalign_capture_engine::MediaBackend;
use photoalign_common::error::PhotoAlignResult;
use photoalign_platform_core::{video_inputs, MediaDeviceInfo};

/// Shown when the host has no way to list devices.
pub const ENUMERATION_UNSUPPORTED: &str = "Media device enumeration not supported";

/// Placeholder entry for an empty device list.
pub const NO_DEVICES_FOUND: &str = "No devices found";

/// Notifications from the selector to its owner.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SelectorEvent {
    /// The first enumeration finished; carries the filtered list.
    Loaded(Vec<MediaDeviceInfo>),
    /// The user picked a device.
    Changed(MediaDeviceInfo),
    /// Enumeration is unavailable or failed.
    Error(String),
}

/// One entry of the choice control.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectOption {
    pub label: String,
    pub enabled: bool,
    /// Position in the filtered list; `None` for the placeholder.
    pub index: Option<usize>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectorState {
    Idle,
    Loading,
    Ready,
    Unsupported,
    Failed,
}

/// Video input picker.
pub struct DeviceSelector {
    backend: Arc<dyn MediaBackend>,
    state: SelectorState,
    devices: Vec<MediaDeviceInfo>,
    selected: Option<usize>,
}

impl DeviceSelector {
    pub fn new(backend: Arc<dyn MediaBackend>) -> Self {
        Self {
            backend,
            state: SelectorState::Idle,
            devices: Vec::new(),
            selected: None,
        }
    }

    /// Begin the one and only enumeration.
    ///
    /// When the host cannot enumerate, the selector becomes inert and the
    /// returned error event is the only thing it ever reports. Otherwise the
    /// inventory is requested on `runtime` and handed to `deliver`, whose
    /// owner passes it back through [`DeviceSelector::finish_load`].
    pub fn start<F>(&mut self, runtime: &tokio::runtime::Handle, deliver: F) -> Option<SelectorEvent>
    where
        F: FnOnce(PhotoAlignResult<Vec<MediaDeviceInfo>>) + Send + 'static,
    {
        if self.state != SelectorState::Idle {
            return None;
        }

        if !self.backend.supports_enumeration() {
            tracing::warn!(backend = self.backend.name(), "Device enumeration unsupported");
            self.state = SelectorState::Unsupported;
            return Some(SelectorEvent::Error(ENUMERATION_UNSUPPORTED.to_string()));
        }

        self.state = SelectorState::Loading;
        let backend = self.backend.clone();
        runtime.spawn(async move {
            deliver(backend.enumerate_devices().await);
        });
        None
    }

    /// Apply the enumeration result. Only the first result is accepted.
    pub fn finish_load(
        &mut self,
        result: PhotoAlignResult<Vec<MediaDeviceInfo>>,
    ) -> Option<SelectorEvent> {
        if self.state != SelectorState::Loading {
            tracing::debug!(state = ?self.state, "Ignoring late enumeration result");
            return None;
        }

        match result {
            Ok(all) => {
                let total = all.len();
                self.devices = video_inputs(all);
                self.selected = if self.devices.is_empty() { None } else { Some(0) };
                self.state = SelectorState::Ready;
                tracing::info!(total, video_inputs = self.devices.len(), "Devices loaded");
                Some(SelectorEvent::Loaded(self.devices.clone()))
            }
            Err(e) => {
                tracing::warn!(error = %e, "Device enumeration failed");
                self.state = SelectorState::Failed;
                Some(SelectorEvent::Error(e.to_string()))
            }
        }
    }

    /// Entries for the choice control.
    pub fn options(&self) -> Vec<SelectOption> {
        if self.devices.is_empty() {
            return vec![SelectOption {
                label: NO_DEVICES_FOUND.to_string(),
                enabled: false,
                index: None,
            }];
        }

        self.devices
            .iter()
            .enumerate()
            .map(|(index, device)| SelectOption {
                label: device.display_label().to_string(),
                enabled: true,
                index: Some(index),
            })
            .collect()
    }

    /// Whether the control accepts input.
    pub fn is_enabled(&self) -> bool {
        !self.devices.is_empty()
    }

    /// User picked the entry at `index`.
    pub fn select(&mut self, index: usize) -> Option<SelectorEvent> {
        let device = self.devices.get(index)?.clone();
        self.selected = Some(index);
        Some(SelectorEvent::Changed(device))
    }

    /// The control lost focus; re-reports the shown value.
    pub fn blur(&mut self) -> Option<SelectorEvent> {
        let index = self.selected?;
        self.select(index)
    }

    pub fn devices(&self) -> &[MediaDeviceInfo] {
        &self.devices
    }

    pub fn selected_index(&self) -> Option<usize> {
        self.selected
    }

    pub fn state(&self) -> SelectorState {
        self.state
    }
}

impl std::fmt::Debug for DeviceSelector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DeviceSelector")
            .field("backend", &self.backend.name())
            .field("state", &self.state)
            .field("devices", &self.devices.len())
            .field("selected", &self.selected)
            .finish()
    }
}
