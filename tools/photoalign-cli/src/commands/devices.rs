//! List media devices.

use serde::Serialize;

use photoalign_capture_engine::get_backend;
use photoalign_platform_core::MediaDeviceInfo;

/// One printed device. `position` is the index `snap --device` accepts.
#[derive(Debug, Serialize)]
struct DeviceRow {
    position: Option<usize>,
    display_label: String,
    #[serde(flatten)]
    device: MediaDeviceInfo,
}

fn device_rows(devices: Vec<MediaDeviceInfo>, all: bool) -> Vec<DeviceRow> {
    let mut next_position = 0;
    devices
        .into_iter()
        .filter(|device| all || device.is_video_input())
        .map(|device| {
            let position = device.is_video_input().then(|| {
                next_position += 1;
                next_position - 1
            });
            DeviceRow {
                position,
                display_label: device.display_label().to_string(),
                device,
            }
        })
        .collect()
}

pub async fn run(all: bool, json: bool) -> anyhow::Result<()> {
    let backend = get_backend();
    if !backend.supports_enumeration() {
        anyhow::bail!("{} cannot enumerate media devices", backend.name());
    }

    let devices = backend
        .enumerate_devices()
        .await
        .map_err(|e| anyhow::anyhow!("Failed to list devices: {e}"))?;
    let rows = device_rows(devices, all);

    if json {
        println!("{}", serde_json::to_string_pretty(&rows)?);
        return Ok(());
    }

    if rows.is_empty() {
        println!("No devices found");
        return Ok(());
    }

    for row in &rows {
        let position = row
            .position
            .map(|p| format!("[{p}]"))
            .unwrap_or_else(|| "   ".to_string());
        println!(
            "{position} {:<11} {} ({})",
            row.device.kind.to_string(),
            row.display_label,
            row.device.device_id
        );
    }

    Ok(())
}
