//! Permission detection and guidance for Linux.
//!
//! Photo Align needs sysfs to list cameras, read/write access to a V4L2
//! capture node, and the GStreamer V4L2 source element to stream from it.

use std::path::Path;

use crate::devices::{enumerate_video_nodes, probe_v4l2_capture_capability, SYSFS_ROOT};

/// A system capability that Photo Align may need.
#[derive(Debug, Clone)]
pub struct Capability {
    pub name: String,
    pub description: String,
    pub available: bool,
    pub required: bool,
    pub fix_instructions: Option<String>,
}

/// Check all capabilities and report status.
pub fn check_capabilities() -> Vec<Capability> {
    vec![
        check_sysfs_access(),
        check_webcam_access(),
        check_video_group(),
        check_gstreamer_v4l2(),
        check_v4l2_utils(),
    ]
}

/// Whether every required capability is available.
pub fn all_required_available(capabilities: &[Capability]) -> bool {
    capabilities
        .iter()
        .filter(|c| c.required)
        .all(|c| c.available)
}

/// Check that sysfs is mounted so devices can be enumerated.
fn check_sysfs_access() -> Capability {
    let available = crate::devices::sysfs_available();

    Capability {
        name: "Device Enumeration".to_string(),
        description: "sysfs device classes used to list cameras".to_string(),
        available,
        required: true,
        fix_instructions: if available {
            None
        } else {
            Some("Mount sysfs at /sys (mount -t sysfs sysfs /sys)".to_string())
        },
    }
}

/// Check if a webcam capture node is available.
fn check_webcam_access() -> Capability {
    let capture_nodes = enumerate_video_nodes(Path::new(SYSFS_ROOT), probe_v4l2_capture_capability)
        .map(|nodes| nodes.len())
        .unwrap_or(0);
    let available = capture_nodes > 0;

    Capability {
        name: "Webcam Device".to_string(),
        description: format!("Video4Linux capture nodes found: {capture_nodes}"),
        available,
        required: true,
        fix_instructions: if available {
            None
        } else {
            Some(
                "Connect a webcam and verify /dev/video* exists (v4l2-ctl --list-devices)"
                    .to_string(),
            )
        },
    }
}

/// Check if the user is in the 'video' group that owns /dev/video* nodes.
fn check_video_group() -> Capability {
    let in_video_group = std::process::Command::new("id")
        .arg("-Gn")
        .output()
        .map(|o| {
            String::from_utf8_lossy(&o.stdout)
                .split_whitespace()
                .any(|group| group == "video")
        })
        .unwrap_or(false);

    Capability {
        name: "Video Group".to_string(),
        description: "Membership in the group owning /dev/video* (may be granted by logind instead)"
            .to_string(),
        available: in_video_group,
        required: false,
        fix_instructions: if in_video_group {
            None
        } else {
            Some(
                "Add user to video group: sudo usermod -aG video $USER (logout required)"
                    .to_string(),
            )
        },
    }
}

/// Check that the GStreamer V4L2 source plugin is installed.
fn check_gstreamer_v4l2() -> Capability {
    let available = std::process::Command::new("gst-inspect-1.0")
        .arg("v4l2src")
        .output()
        .map(|o| o.status.success())
        .unwrap_or(false);

    Capability {
        name: "GStreamer V4L2".to_string(),
        description: "v4l2src element used to stream from the camera".to_string(),
        available,
        required: true,
        fix_instructions: if available {
            None
        } else {
            Some("Install GStreamer good plugins: sudo apt install gstreamer1.0-plugins-good".to_string())
        },
    }
}

/// Check for v4l2-ctl, used to tell capture nodes from metadata nodes.
fn check_v4l2_utils() -> Capability {
    let available = std::process::Command::new("v4l2-ctl")
        .arg("--help")
        .output()
        .is_ok();

    Capability {
        name: "v4l-utils".to_string(),
        description: "v4l2-ctl for precise capture node detection".to_string(),
        available,
        required: false,
        fix_instructions: if available {
            None
        } else {
            Some("Install v4l-utils: sudo apt install v4l-utils".to_string())
        },
    }
}

/// Print a user-friendly capability report.
pub fn print_capability_report(capabilities: &[Capability]) {
    println!("Photo Align System Capabilities:");
    println!("{}", "-".repeat(60));

    for cap in capabilities {
        let status = if cap.available {
            "[OK]"
        } else if cap.required {
            "[MISSING - REQUIRED]"
        } else {
            "[MISSING - OPTIONAL]"
        };

        println!("  {} {}: {}", status, cap.name, cap.description);

        if let Some(ref fix) = cap.fix_instructions {
            println!("    Fix: {fix}");
        }
    }
}
