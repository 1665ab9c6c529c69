//! Media device inventory on Linux.
//!
//! Video inputs come from the V4L2 class in sysfs, audio endpoints from
//! `/proc/asound/pcm`. Only nodes that actually capture video are reported;
//! UVC cameras also expose metadata nodes which are skipped.

use std::path::{Path, PathBuf};

use photoalign_common::error::PhotoAlignResult;
use photoalign_platform_core::{MediaDeviceInfo, MediaDeviceKind};

/// Root of the sysfs mount.
pub const SYSFS_ROOT: &str = "/sys";

/// ALSA PCM listing.
pub const ASOUND_PCM_PATH: &str = "/proc/asound/pcm";

/// Whether device enumeration is possible at all on this host.
pub fn sysfs_available() -> bool {
    Path::new(SYSFS_ROOT).join("class").is_dir()
}

/// Enumerate every media device on the host, in host order.
pub fn enumerate_devices() -> PhotoAlignResult<Vec<MediaDeviceInfo>> {
    let mut devices = enumerate_video_nodes(Path::new(SYSFS_ROOT), probe_v4l2_capture_capability)?;
    devices.extend(enumerate_audio_endpoints(Path::new(ASOUND_PCM_PATH))?);
    tracing::debug!(count = devices.len(), "Enumerated media devices");
    Ok(devices)
}

/// Enumerate V4L2 capture nodes under `<sysfs_root>/class/video4linux`.
///
/// `probe` is asked whether a `/dev/videoN` node reports Video Capture in
/// its device caps; `None` means the probe could not tell, in which case the
/// sysfs `index` attribute decides (index 0 is the capture node of a UVC
/// function).
pub fn enumerate_video_nodes<P>(sysfs_root: &Path, probe: P) -> PhotoAlignResult<Vec<MediaDeviceInfo>>
where
    P: Fn(&str) -> Option<bool>,
{
    let class_dir = sysfs_root.join("class").join("video4linux");
    if !class_dir.is_dir() {
        return Ok(Vec::new());
    }

    let mut nodes: Vec<(u32, String)> = std::fs::read_dir(&class_dir)?
        .flatten()
        .filter_map(|entry| {
            let name = entry.file_name().to_string_lossy().into_owned();
            let index = name.strip_prefix("video")?.parse::<u32>().ok()?;
            Some((index, name))
        })
        .collect();
    nodes.sort_by_key(|(index, _)| *index);

    let mut devices = Vec::with_capacity(nodes.len());
    for (_, name) in nodes {
        let node_dir = class_dir.join(&name);
        let dev_path = format!("/dev/{name}");

        let is_capture = probe(&dev_path)
            .unwrap_or_else(|| read_sysfs_u32(&node_dir.join("index")).unwrap_or(0) == 0);
        if !is_capture {
            tracing::debug!(device = %dev_path, "Skipping non-capture V4L2 node");
            continue;
        }

        devices.push(MediaDeviceInfo {
            label: read_sysfs_string(&node_dir.join("name")).unwrap_or_default(),
            group_id: physical_device_id(&node_dir).unwrap_or_default(),
            device_id: dev_path,
            kind: MediaDeviceKind::VideoInput,
        });
    }

    Ok(devices)
}

/// Enumerate ALSA PCM endpoints from a `/proc/asound/pcm` style listing.
pub fn enumerate_audio_endpoints(pcm_listing: &Path) -> PhotoAlignResult<Vec<MediaDeviceInfo>> {
    match std::fs::read_to_string(pcm_listing) {
        Ok(content) => Ok(parse_asound_pcm(&content)),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Vec::new()),
        Err(e) => Err(e.into()),
    }
}

/// Parse `/proc/asound/pcm` lines such as
/// `00-00: ALC3246 Analog : ALC3246 Analog : playback 1 : capture 1`.
pub fn parse_asound_pcm(content: &str) -> Vec<MediaDeviceInfo> {
    let mut devices = Vec::new();

    for line in content.lines() {
        let Some((address, rest)) = line.split_once(':') else {
            continue;
        };
        let Some((card, device)) = address.trim().split_once('-') else {
            continue;
        };
        let (Ok(card), Ok(device)) = (card.parse::<u32>(), device.parse::<u32>()) else {
            continue;
        };

        let fields: Vec<&str> = rest.split(" : ").map(str::trim).collect();
        let label = fields
            .get(1)
            .or_else(|| fields.first())
            .copied()
            .unwrap_or_default()
            .to_string();

        for field in fields.iter().skip(2) {
            let kind = if field.starts_with("playback") {
                MediaDeviceKind::AudioOutput
            } else if field.starts_with("capture") {
                MediaDeviceKind::AudioInput
            } else {
                continue;
            };
            devices.push(MediaDeviceInfo {
                device_id: format!("hw:{card},{device}"),
                group_id: format!("card{card}"),
                label: label.clone(),
                kind,
            });
        }
    }

    devices
}

/// Use `v4l2-ctl` to check if a device reports Video Capture in its device
/// caps. Returns `None` if v4l2-ctl is not available or cannot open the node.
pub fn probe_v4l2_capture_capability(dev_path: &str) -> Option<bool> {
    let output = std::process::Command::new("v4l2-ctl")
        .args(["--device", dev_path, "--info"])
        .output()
        .ok()?;

    capture_capability_from_info(output.status.success(), &String::from_utf8_lossy(&output.stdout))
}

/// Interpret one `v4l2-ctl --info` run.
///
/// A failed run (node busy, no permission) says nothing about the node, so
/// it yields `None` and the caller falls back to sysfs.
pub fn capture_capability_from_info(succeeded: bool, stdout: &str) -> Option<bool> {
    succeeded.then(|| device_caps_include_capture(stdout))
}

/// Whether `v4l2-ctl --info` output lists Video Capture for this node.
///
/// The `Capabilities` block describes the whole physical device, so only the
/// `Device Caps` block is trusted when present.
pub fn device_caps_include_capture(info: &str) -> bool {
    let mut lines = info.lines();
    let mut header_indent = None;
    for line in lines.by_ref() {
        if line.trim_start().starts_with("Device Caps") {
            header_indent = Some(indent_of(line));
            break;
        }
    }

    let Some(header_indent) = header_indent else {
        return info.to_lowercase().contains("video capture");
    };

    lines
        .take_while(|line| !line.trim().is_empty() && indent_of(line) > header_indent)
        .any(|line| line.trim().eq_ignore_ascii_case("video capture"))
}

fn indent_of(line: &str) -> usize {
    line.chars()
        .take_while(|c| c.is_whitespace())
        .map(|c| if c == '\t' { 8 } else { 1 })
        .sum()
}

/// Identifier of the physical device behind a V4L2 node.
///
/// For USB cameras sysfs links the node to an interface such as
/// `.../1-2/1-2:1.0`; the parent (`1-2`) is the camera, which every node
/// of that camera shares.
fn physical_device_id(node_dir: &Path) -> Option<String> {
    let device: PathBuf = std::fs::canonicalize(node_dir.join("device")).ok()?;
    let is_interface = device
        .file_name()
        .map(|name| name.to_string_lossy().contains(':'))
        .unwrap_or(false);
    let physical = if is_interface {
        device.parent().map(Path::to_path_buf).unwrap_or(device)
    } else {
        device
    };
    Some(physical.to_string_lossy().into_owned())
}

fn read_sysfs_string(path: &Path) -> Option<String> {
    std::fs::read_to_string(path)
        .ok()
        .map(|s| s.trim().to_string())
}

fn read_sysfs_u32(path: &Path) -> Option<u32> {
    read_sysfs_string(path)?.parse().ok()
}
