//! Photo Align Linux Platform Integration
//!
//! Platform-specific implementations for Linux:
//! - **Device Inventory:** V4L2 capture nodes from sysfs, ALSA endpoints from procfs
//! - **Permissions:** Capability detection and user guidance

pub mod devices;
pub mod permissions;

pub use devices::*;
