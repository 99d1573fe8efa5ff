//! Scan a barcode from the first available camera and print the payload.

use std::time::Duration;

use camscan::{ScanEvent, ScanState, Scanner};
use tracing_subscriber::EnvFilter;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    if !camscan::camera_permission_granted() {
        camscan::request_camera_permission(|granted| {
            tracing::info!(granted, "camera permission prompt answered");
        });
    }

    let mut scanner = Scanner::new();
    if scanner.devices().is_empty() {
        eprintln!("No video input devices found.");
        return Ok(());
    }

    println!("Available cameras:");
    for device in scanner.devices() {
        println!("  {} ({})", device.label, device.id);
    }

    scanner.on_event(|event| match event {
        ScanEvent::Decoded(text) => println!("Decoded: {text}"),
        ScanEvent::Error(message) => eprintln!("Decode error: {message}"),
    });

    println!("Scanning on {} (Ctrl+C to stop)...", scanner.selected_device());
    scanner.start()?;

    if let Some(zoom) = scanner.zoom_capability() {
        println!("Zoom range: [{}, {}]", zoom.min, zoom.max);
    }

    while scanner.state() == ScanState::Scanning {
        std::thread::sleep(Duration::from_millis(100));
    }

    println!("Result: {}", scanner.result());
    scanner.reset();
    Ok(())
}
