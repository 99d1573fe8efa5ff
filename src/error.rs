//! Error types for the scanner component.
//!
//! The taxonomy follows the component's failure surface: enumeration
//! failures degrade the device list, decode-loop errors surface as result
//! text without stopping the loop, and zoom failures are purely advisory.

use nokhwa::error::NokhwaError;
use thiserror::Error;

/// Errors produced by scanner operations.
#[derive(Error, Debug)]
pub enum ScanError {
    /// Listing video input devices failed. Non-fatal: the component keeps
    /// an empty device list and Start reports [`ScanError::NoDevice`].
    #[error("device enumeration failed: {0}")]
    Enumeration(String),

    /// A decode-loop error other than the not-found steady state.
    #[error("decode error: {0}")]
    Decode(String),

    /// No video input device is available or selected.
    #[error("no video input device available")]
    NoDevice,

    /// The given identifier is not in the enumerated device list.
    #[error("unknown video input device {id:?}")]
    DeviceNotFound { id: String },

    /// Zoom was adjusted while no session is actively scanning.
    #[error("no active decode session")]
    NoActiveSession,

    /// The active camera reports no usable zoom capability range.
    #[error("zoom capability not supported by the active camera")]
    ZoomUnsupported,

    /// Failure from the camera backend.
    #[error("camera error: {0}")]
    Camera(#[from] NokhwaError),
}

pub type ScanResult<T> = Result<T, ScanError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_includes_device_id() {
        let err = ScanError::DeviceNotFound {
            id: "cam7".to_string(),
        };
        assert!(err.to_string().contains("cam7"));
    }

    #[test]
    fn decode_error_display() {
        let err = ScanError::Decode("CameraBusy".to_string());
        assert_eq!(err.to_string(), "decode error: CameraBusy");
    }
}
