//! Decode session controller.
//!
//! A session is the active binding between a camera device, an optional
//! display sink and the running continuous-decode loop. The camera's
//! callback thread pushes frames into a bounded channel; a dedicated
//! worker converts, presents and decodes them, applying each outcome to
//! the shared scan model. The camera is an exclusive resource: shutdown
//! joins the worker and stops the stream before returning, so a
//! subsequent session can safely reacquire it.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use flume::{Receiver, RecvTimeoutError};
use nokhwa::pixel_format::RgbFormat;
use nokhwa::utils::{
    CameraFormat, KnownCameraControl, RequestedFormat, RequestedFormatType, Resolution,
};
use nokhwa::{Buffer, CallbackCamera};
use parking_lot::Mutex;

use crate::decode::FrameDecoder;
use crate::device::VideoInputDevice;
use crate::error::{ScanError, ScanResult};
use crate::format::select_stream_format;
use crate::frame::{self, FrameSink};
use crate::scanner::{ScanEvent, ScanModel, SessionCommand};
use crate::zoom::ZoomCapability;

/// Frames waiting for the decoder; newer frames are dropped while it is
/// busy.
const FRAME_CHANNEL_CAPACITY: usize = 2;

/// How often the worker re-checks the stop flag while no frame arrives.
const STOP_POLL_INTERVAL: Duration = Duration::from_millis(250);

pub(crate) type SharedSink = Arc<Mutex<Box<dyn FrameSink>>>;
pub(crate) type EventHandler = Arc<dyn Fn(ScanEvent) + Send + Sync>;

pub(crate) struct DecodeSession {
    camera: Arc<Mutex<CallbackCamera>>,
    stop: Arc<AtomicBool>,
    worker: Option<JoinHandle<()>>,
    zoom: Option<ZoomCapability>,
}

impl DecodeSession {
    /// Open the device, start the stream and spawn the decode worker.
    pub(crate) fn start(
        device: &VideoInputDevice,
        decoder: Box<dyn FrameDecoder>,
        sink: Option<SharedSink>,
        model: Arc<Mutex<ScanModel>>,
        events: Option<EventHandler>,
    ) -> ScanResult<Self> {
        let requested = match select_stream_format(&device.formats) {
            Some(f) => {
                let camera_format = CameraFormat::new(
                    Resolution::new(f.width, f.height),
                    f.format,
                    f.frame_rate,
                );
                RequestedFormat::new::<RgbFormat>(RequestedFormatType::Exact(camera_format))
            }
            // Format probing failed at enumeration time; let the backend
            // choose.
            None => RequestedFormat::new::<RgbFormat>(RequestedFormatType::None),
        };

        let (frame_tx, frame_rx) = flume::bounded::<Buffer>(FRAME_CHANNEL_CAPACITY);
        let mut camera = CallbackCamera::new(device.index.clone(), requested, move |buffer| {
            let _ = frame_tx.try_send(buffer);
        })?;
        camera.open_stream()?;

        let zoom = query_zoom(&mut camera);

        let camera = Arc::new(Mutex::new(camera));
        let stop = Arc::new(AtomicBool::new(false));
        let worker = thread::Builder::new()
            .name("decode-loop".to_string())
            .spawn({
                let camera = Arc::clone(&camera);
                let stop = Arc::clone(&stop);
                move || run_decode_loop(frame_rx, decoder, sink, model, events, camera, stop)
            })
            .map_err(|e| ScanError::Decode(format!("failed to spawn decode worker: {e}")))?;

        Ok(Self {
            camera,
            stop,
            worker: Some(worker),
            zoom,
        })
    }

    /// Zoom bounds recorded when the stream opened, if the camera
    /// reported any.
    pub(crate) fn zoom_capability(&self) -> Option<ZoomCapability> {
        self.zoom
    }

    /// Apply a zoom level (already clamped by the caller) to the live
    /// camera.
    pub(crate) fn apply_zoom(&self, capability: &ZoomCapability, level: f64) -> ScanResult<()> {
        self.camera
            .lock()
            .set_camera_control(KnownCameraControl::Zoom, capability.setter(level))?;
        Ok(())
    }

    /// Stop the decode loop and release the camera before returning.
    pub(crate) fn shutdown(&mut self) {
        self.stop.store(true, Ordering::SeqCst);
        if let Some(worker) = self.worker.take() {
            let _ = worker.join();
        }
        if let Err(e) = self.camera.lock().stop_stream() {
            // Already stopped by the worker on a successful decode.
            tracing::debug!(error = %e, "stream was already stopped");
        }
    }
}

impl Drop for DecodeSession {
    fn drop(&mut self) {
        self.shutdown();
    }
}

/// Inspect the camera's zoom control and drive it to the range minimum.
fn query_zoom(camera: &mut CallbackCamera) -> Option<ZoomCapability> {
    let control = match camera.camera_control(KnownCameraControl::Zoom) {
        Ok(control) => control,
        Err(e) => {
            tracing::debug!(error = %e, "zoom capability not supported on this device");
            return None;
        }
    };

    let mut capability = match ZoomCapability::from_control(&control) {
        Some(capability) => capability,
        None => {
            tracing::debug!("zoom control reports no usable range");
            return None;
        }
    };

    match camera.set_camera_control(KnownCameraControl::Zoom, capability.setter(capability.min)) {
        Ok(()) => capability.current = capability.min,
        Err(e) => tracing::debug!(error = %e, "could not reset zoom to its minimum"),
    }

    Some(capability)
}

fn run_decode_loop(
    frames: Receiver<Buffer>,
    mut decoder: Box<dyn FrameDecoder>,
    sink: Option<SharedSink>,
    model: Arc<Mutex<ScanModel>>,
    events: Option<EventHandler>,
    camera: Arc<Mutex<CallbackCamera>>,
    stop: Arc<AtomicBool>,
) {
    loop {
        if stop.load(Ordering::SeqCst) {
            break;
        }
        let buffer = match frames.recv_timeout(STOP_POLL_INTERVAL) {
            Ok(buffer) => buffer,
            Err(RecvTimeoutError::Timeout) => continue,
            Err(RecvTimeoutError::Disconnected) => break,
        };

        let rgb = match frame::rgb_frame(&buffer) {
            Ok(rgb) => rgb,
            Err(e) => {
                tracing::error!(error = %e, "frame conversion failed");
                continue;
            }
        };
        if let Some(sink) = &sink {
            sink.lock().present(&rgb);
        }

        let luma = frame::luma_plane(&rgb);
        let outcome = decoder.decode_frame(&luma, rgb.width, rgb.height);
        let (event, command) = model.lock().apply_outcome(outcome);
        if let (Some(event), Some(events)) = (event, &events) {
            events(event);
        }

        if command == SessionCommand::Stop {
            if let Err(e) = camera.lock().stop_stream() {
                tracing::debug!(error = %e, "stream was already stopped");
            }
            break;
        }
    }
}
