//! Continuous barcode scanning over a connected camera.
//!
//! Enumerates video input devices, runs a continuous QR decode loop
//! against a chosen device, optionally controls camera zoom within
//! hardware-reported bounds, and exposes the decoded text result. The
//! decoding itself is owned by rqrr and the camera plumbing by nokhwa;
//! this crate is the orchestration in between.
//!
//! ```no_run
//! use camscan::{ScanEvent, ScanState, Scanner};
//!
//! let mut scanner = Scanner::new();
//! scanner.on_event(|event| {
//!     if let ScanEvent::Decoded(text) = event {
//!         println!("scanned: {text}");
//!     }
//! });
//! scanner.start()?;
//! while scanner.state() == ScanState::Scanning {
//!     std::thread::sleep(std::time::Duration::from_millis(100));
//! }
//! println!("result: {}", scanner.result());
//! # Ok::<(), camscan::ScanError>(())
//! ```

mod decode;
mod device;
mod error;
mod format;
mod frame;
mod scanner;
mod session;
mod zoom;

pub use decode::{DecodeOutcome, FrameDecoder, QrDecoder};
pub use device::{
    camera_permission_granted, list_video_input_devices, request_camera_permission,
    VideoInputDevice,
};
pub use error::{ScanError, ScanResult};
pub use format::VideoFormat;
pub use frame::{FrameSink, RgbFrame};
pub use scanner::{ScanEvent, ScanState, Scanner};
pub use zoom::ZoomCapability;
