//! The barcode scanner component.
//!
//! Owns the enumerated device list, the selected device, at most one
//! active decode session and the last-result text. All decoder/session
//! handles are component-local and released on drop; nothing lives in
//! process-wide state.

use std::sync::Arc;

use parking_lot::Mutex;

use crate::decode::{DecodeOutcome, FrameDecoder, QrDecoder};
use crate::device::{self, VideoInputDevice};
use crate::error::{ScanError, ScanResult};
use crate::frame::FrameSink;
use crate::session::{DecodeSession, EventHandler, SharedSink};
use crate::zoom::ZoomCapability;

/// Per-session scan state.
///
/// A successful decode stops the session, so the component always returns
/// to `Idle` and can be restarted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanState {
    /// No decode session is running.
    Idle,
    /// A session is active and the decode loop is running.
    Scanning,
}

/// Notification delivered to the embedder's event handler.
///
/// The not-found steady state is filtered out before this point.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScanEvent {
    /// A code was read; the session has stopped.
    Decoded(String),
    /// A decode-loop error; scanning continues.
    Error(String),
}

/// What the decode worker should do after an outcome was applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum SessionCommand {
    Continue,
    Stop,
}

/// The callback-contract core: result text plus scan state, mutated once
/// per decode outcome. Kept free of camera plumbing so the contract is
/// testable on its own.
pub(crate) struct ScanModel {
    result: String,
    state: ScanState,
}

impl ScanModel {
    fn new() -> Self {
        Self {
            result: String::new(),
            state: ScanState::Idle,
        }
    }

    fn begin_scan(&mut self) {
        self.state = ScanState::Scanning;
    }

    fn reset(&mut self) {
        self.state = ScanState::Idle;
        self.result.clear();
    }

    /// Apply one decode outcome.
    ///
    /// A successful decode stores the payload and settles the session; a
    /// non-not-found error is recorded as result text but keeps the loop
    /// running. Outcomes that arrive after the session settled are
    /// dropped.
    pub(crate) fn apply_outcome(
        &mut self,
        outcome: DecodeOutcome,
    ) -> (Option<ScanEvent>, SessionCommand) {
        if self.state != ScanState::Scanning {
            return (None, SessionCommand::Stop);
        }
        match outcome {
            DecodeOutcome::NotFound => (None, SessionCommand::Continue),
            DecodeOutcome::Decoded(text) => {
                self.result = text.clone();
                self.state = ScanState::Idle;
                (Some(ScanEvent::Decoded(text)), SessionCommand::Stop)
            }
            DecodeOutcome::Error(message) => {
                tracing::error!(error = %message, "decode loop error");
                self.result = message.clone();
                (Some(ScanEvent::Error(message)), SessionCommand::Continue)
            }
        }
    }
}

type DecoderFactory = Box<dyn Fn() -> Box<dyn FrameDecoder> + Send>;

/// Camera barcode scanner.
///
/// Created with a one-time snapshot of the available video input devices;
/// the first device is selected by default. `start` runs a continuous
/// decode loop against the selected device until a code is read or
/// `reset` is called.
pub struct Scanner {
    devices: Vec<VideoInputDevice>,
    selected: String,
    model: Arc<Mutex<ScanModel>>,
    session: Option<DecodeSession>,
    zoom: Option<ZoomCapability>,
    sink: Option<SharedSink>,
    events: Option<EventHandler>,
    decoder_factory: DecoderFactory,
}

impl Scanner {
    /// Enumerate devices and build the component.
    ///
    /// Enumeration failure is logged and leaves the device list empty;
    /// the component stays usable but `start` reports
    /// [`ScanError::NoDevice`].
    pub fn new() -> Self {
        let devices = match device::list_video_input_devices() {
            Ok(devices) => devices,
            Err(e) => {
                tracing::error!(error = %e, "device enumeration failed");
                Vec::new()
            }
        };
        Self::from_devices(devices)
    }

    fn from_devices(devices: Vec<VideoInputDevice>) -> Self {
        let selected = devices.first().map(|d| d.id.clone()).unwrap_or_default();
        Self {
            devices,
            selected,
            model: Arc::new(Mutex::new(ScanModel::new())),
            session: None,
            zoom: None,
            sink: None,
            events: None,
            decoder_factory: Box::new(|| Box::new(QrDecoder::new())),
        }
    }

    /// The device snapshot taken at construction.
    pub fn devices(&self) -> &[VideoInputDevice] {
        &self.devices
    }

    /// Identifier of the selected device; empty when no device exists.
    pub fn selected_device(&self) -> &str {
        &self.selected
    }

    /// Select a device by identifier.
    ///
    /// Does not affect a running session: it keeps scanning the previous
    /// device until `start` or `reset`.
    pub fn select_device(&mut self, id: &str) -> ScanResult<()> {
        if !self.devices.iter().any(|d| d.id == id) {
            return Err(ScanError::DeviceNotFound { id: id.to_string() });
        }
        self.selected = id.to_string();
        Ok(())
    }

    /// Install the display surface the live feed is rendered into.
    pub fn set_frame_sink(&mut self, sink: impl FrameSink + 'static) {
        self.sink = Some(Arc::new(Mutex::new(Box::new(sink))));
    }

    /// Register a handler for decoded payloads and decode errors.
    pub fn on_event(&mut self, handler: impl Fn(ScanEvent) + Send + Sync + 'static) {
        self.events = Some(Arc::new(handler));
    }

    /// Replace the frame decoder used by subsequent sessions.
    pub fn set_decoder_factory(
        &mut self,
        factory: impl Fn() -> Box<dyn FrameDecoder> + Send + 'static,
    ) {
        self.decoder_factory = Box::new(factory);
    }

    /// Begin continuous decoding from the selected device.
    ///
    /// An already-active session is reset first, releasing the camera
    /// before it is reacquired.
    pub fn start(&mut self) -> ScanResult<()> {
        self.stop_session();

        if self.devices.is_empty() {
            return Err(ScanError::NoDevice);
        }
        let device = self
            .devices
            .iter()
            .find(|d| d.id == self.selected)
            .ok_or_else(|| ScanError::DeviceNotFound {
                id: self.selected.clone(),
            })?
            .clone();

        self.model.lock().begin_scan();
        let session = DecodeSession::start(
            &device,
            (self.decoder_factory)(),
            self.sink.clone(),
            Arc::clone(&self.model),
            self.events.clone(),
        );
        let session = match session {
            Ok(session) => session,
            Err(e) => {
                self.model.lock().state = ScanState::Idle;
                return Err(e);
            }
        };

        tracing::info!(device = %device.label, id = %device.id, "started continuous decode");
        self.zoom = session.zoom_capability();
        self.session = Some(session);
        Ok(())
    }

    /// Stop the active session, release the camera and clear the result.
    ///
    /// Idempotent: with no session this is a no-op apart from clearing
    /// the result text. Safe from teardown and from the decode-success
    /// path (which only performs the session-stop half).
    pub fn reset(&mut self) {
        self.stop_session();
        self.zoom = None;
        self.model.lock().reset();
        tracing::info!("scanner reset");
    }

    fn stop_session(&mut self) {
        if let Some(mut session) = self.session.take() {
            session.shutdown();
        }
        let mut model = self.model.lock();
        if model.state == ScanState::Scanning {
            model.state = ScanState::Idle;
        }
    }

    /// Current per-session scan state.
    pub fn state(&self) -> ScanState {
        self.model.lock().state
    }

    /// Last decoded payload or decode-error text; empty after reset.
    pub fn result(&self) -> String {
        self.model.lock().result.clone()
    }

    /// Zoom bounds of the active session's camera, if reported.
    ///
    /// `None` also after reset: the capability described the previous
    /// session's stream.
    pub fn zoom_capability(&self) -> Option<ZoomCapability> {
        self.zoom
    }

    /// Apply a zoom level to the active camera, clamped into the bounds
    /// recorded at session start. Returns the applied level.
    pub fn set_zoom(&mut self, requested: f64) -> ScanResult<f64> {
        if self.state() != ScanState::Scanning {
            return Err(ScanError::NoActiveSession);
        }
        let session = self.session.as_ref().ok_or(ScanError::NoActiveSession)?;
        let mut capability = self.zoom.ok_or(ScanError::ZoomUnsupported)?;

        let level = capability.clamp(requested);
        session.apply_zoom(&capability, level)?;
        capability.current = level;
        self.zoom = Some(capability);
        Ok(level)
    }
}

impl Default for Scanner {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for Scanner {
    fn drop(&mut self) {
        self.stop_session();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::device::test_device;

    fn two_camera_scanner() -> Scanner {
        Scanner::from_devices(vec![
            test_device("cam1", "Front"),
            test_device("cam2", "Back"),
        ])
    }

    #[test]
    fn first_device_is_selected_by_default() {
        let scanner = two_camera_scanner();
        assert_eq!(scanner.selected_device(), "cam1");
        assert_eq!(scanner.devices().len(), 2);
        assert_eq!(scanner.devices()[1].label, "Back");
    }

    #[test]
    fn empty_device_list_selects_nothing() {
        let scanner = Scanner::from_devices(Vec::new());
        assert_eq!(scanner.selected_device(), "");
    }

    #[test]
    fn start_without_devices_reports_no_device() {
        let mut scanner = Scanner::from_devices(Vec::new());
        assert!(matches!(scanner.start(), Err(ScanError::NoDevice)));
        assert_eq!(scanner.state(), ScanState::Idle);
    }

    #[test]
    fn selecting_a_known_device_updates_selection() {
        let mut scanner = two_camera_scanner();
        scanner.select_device("cam2").unwrap();
        assert_eq!(scanner.selected_device(), "cam2");
    }

    #[test]
    fn selecting_an_unknown_device_is_rejected() {
        let mut scanner = two_camera_scanner();
        let err = scanner.select_device("cam9").unwrap_err();
        assert!(matches!(err, ScanError::DeviceNotFound { id } if id == "cam9"));
        assert_eq!(scanner.selected_device(), "cam1");
    }

    #[test]
    fn not_found_outcomes_leave_the_model_untouched() {
        let mut model = ScanModel::new();
        model.begin_scan();
        for _ in 0..3 {
            let (event, command) = model.apply_outcome(DecodeOutcome::NotFound);
            assert!(event.is_none());
            assert_eq!(command, SessionCommand::Continue);
        }
        assert_eq!(model.state, ScanState::Scanning);
        assert_eq!(model.result, "");
    }

    #[test]
    fn successful_decode_settles_the_session() {
        let mut model = ScanModel::new();
        model.begin_scan();
        for _ in 0..3 {
            model.apply_outcome(DecodeOutcome::NotFound);
        }
        let (event, command) = model.apply_outcome(DecodeOutcome::Decoded("ABC123".to_string()));
        assert_eq!(event, Some(ScanEvent::Decoded("ABC123".to_string())));
        assert_eq!(command, SessionCommand::Stop);
        assert_eq!(model.result, "ABC123");
        assert_eq!(model.state, ScanState::Idle);
    }

    #[test]
    fn decode_error_surfaces_but_keeps_scanning() {
        let mut model = ScanModel::new();
        model.begin_scan();
        let (event, command) = model.apply_outcome(DecodeOutcome::Error("CameraBusy".to_string()));
        assert_eq!(event, Some(ScanEvent::Error("CameraBusy".to_string())));
        assert_eq!(command, SessionCommand::Continue);
        assert_eq!(model.result, "CameraBusy");
        assert_eq!(model.state, ScanState::Scanning);
    }

    #[test]
    fn late_outcomes_after_settling_are_dropped() {
        let mut model = ScanModel::new();
        model.begin_scan();
        model.apply_outcome(DecodeOutcome::Decoded("ABC123".to_string()));

        let (event, command) = model.apply_outcome(DecodeOutcome::Error("late".to_string()));
        assert!(event.is_none());
        assert_eq!(command, SessionCommand::Stop);
        assert_eq!(model.result, "ABC123");
        assert_eq!(model.state, ScanState::Idle);
    }

    #[test]
    fn reset_is_idempotent_and_clears_the_result() {
        let mut scanner = two_camera_scanner();
        {
            let mut model = scanner.model.lock();
            model.begin_scan();
            model.apply_outcome(DecodeOutcome::Decoded("ABC123".to_string()));
        }
        assert_eq!(scanner.result(), "ABC123");

        scanner.reset();
        assert_eq!(scanner.state(), ScanState::Idle);
        assert_eq!(scanner.result(), "");

        scanner.reset();
        assert_eq!(scanner.state(), ScanState::Idle);
        assert_eq!(scanner.result(), "");
    }

    #[test]
    fn zoom_without_an_active_session_is_rejected() {
        let mut scanner = two_camera_scanner();
        assert!(matches!(
            scanner.set_zoom(2.0),
            Err(ScanError::NoActiveSession)
        ));
        assert!(scanner.zoom_capability().is_none());
    }
}
