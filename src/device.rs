//! Video input device enumeration.
//!
//! The device list is a snapshot taken once when the scanner is created;
//! there is no hot-plug refresh. Each device is probed for its compatible
//! stream formats so a session can open the camera with an exact format.

use std::collections::HashSet;

use nokhwa::pixel_format::RgbFormat;
use nokhwa::utils::{CameraIndex, RequestedFormat, RequestedFormatType};
use nokhwa::{native_api_backend, nokhwa_check, nokhwa_initialize, query, Camera};

use crate::error::{ScanError, ScanResult};
use crate::format::VideoFormat;

/// One enumerated video input device.
#[derive(Debug, PartialEq, Eq, Clone)]
pub struct VideoInputDevice {
    pub(crate) index: CameraIndex,
    /// Opaque identifier, unique per physical/logical device.
    pub id: String,
    /// Human-readable label for selection controls.
    pub label: String,
    pub(crate) formats: Vec<VideoFormat>,
}

/// Ask the platform for video capture authorization (no-op where the
/// platform has no permission prompt).
pub fn request_camera_permission<F: Fn(bool) + Send + Sync + 'static>(on_complete: F) {
    nokhwa_initialize(on_complete);
}

/// Whether video capture is currently authorized.
pub fn camera_permission_granted() -> bool {
    nokhwa_check()
}

/// List the available video input devices.
///
/// Devices that cannot be opened for format probing are skipped rather
/// than failing the whole enumeration.
pub fn list_video_input_devices() -> ScanResult<Vec<VideoInputDevice>> {
    let backend = native_api_backend()
        .ok_or_else(|| ScanError::Enumeration("no native camera backend".to_string()))?;

    let infos = query(backend).map_err(|e| ScanError::Enumeration(e.to_string()))?;

    let mut result = Vec::new();
    for info in infos {
        let index = info.index().clone();
        let requested = RequestedFormat::new::<RgbFormat>(RequestedFormatType::None);

        let mut camera = match Camera::with_backend(index.clone(), requested, backend.clone()) {
            Ok(cam) => cam,
            Err(e) => {
                tracing::debug!(device = %info.human_name(), error = %e, "skipping unopenable device");
                continue;
            }
        };

        let mut unique_formats: HashSet<VideoFormat> = HashSet::new();
        if let Ok(camera_formats) = camera.compatible_camera_formats() {
            for format in camera_formats {
                unique_formats.insert(VideoFormat {
                    width: format.resolution().width(),
                    height: format.resolution().height(),
                    format: format.format(),
                    frame_rate: format.frame_rate(),
                });
            }
        }

        let mut formats: Vec<VideoFormat> = unique_formats.into_iter().collect();
        formats.sort_by_key(|f| (f.width, f.height, f.frame_rate));

        let id = if info.misc().is_empty() {
            info.description().to_string()
        } else {
            info.misc().to_string()
        };

        result.push(VideoInputDevice {
            index,
            id,
            label: info.human_name(),
            formats,
        });
    }

    Ok(result)
}

#[cfg(test)]
pub(crate) fn test_device(id: &str, label: &str) -> VideoInputDevice {
    VideoInputDevice {
        index: CameraIndex::Index(0),
        id: id.to_string(),
        label: label.to_string(),
        formats: Vec::new(),
    }
}
