//! Fake virtual interface for testing.
//!
//! Provides an in-memory device implementation that doesn't require
//! elevated privileges or real kernel interfaces.

use std::collections::VecDeque;
use std::io;
use std::sync::{Arc, Mutex};

use tokio::sync::Notify;

use vport_core::device::PortDevice;
use vport_core::{Error, Result};

/// Fake virtual interface for testing.
///
/// Frames can be injected for reading, and written frames are queued in
/// memory for inspection. Reads block until a frame is available, like a
/// real device. Clones share state.
#[derive(Debug)]
pub struct FakePort {
    /// Interface name.
    name: String,
    /// Frames to be read from the device (as if routed onto it by the OS).
    incoming: Arc<Mutex<VecDeque<Vec<u8>>>>,
    /// Frames written to the device (as if delivered to the OS).
    written: Arc<Mutex<Vec<Vec<u8>>>>,
    /// Wakes pending reads when a frame is injected.
    notify: Arc<Notify>,
    /// Whether the device is "up".
    up: Arc<Mutex<bool>>,
}

impl FakePort {
    /// Create a new fake device.
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            incoming: Arc::new(Mutex::new(VecDeque::new())),
            written: Arc::new(Mutex::new(Vec::new())),
            notify: Arc::new(Notify::new()),
            up: Arc::new(Mutex::new(true)),
        }
    }

    /// Create with the default name.
    pub fn default_port() -> Self {
        Self::new("vport0")
    }

    /// Inject a frame as if the OS routed it onto the interface.
    pub fn inject_frame(&self, frame: Vec<u8>) {
        self.incoming.lock().unwrap().push_back(frame);
        self.notify.notify_one();
    }

    /// Get the frames written to the device so far.
    pub fn written_frames(&self) -> Vec<Vec<u8>> {
        self.written.lock().unwrap().clone()
    }

    /// Count frames written to the device.
    pub fn written_count(&self) -> usize {
        self.written.lock().unwrap().len()
    }

    /// Check if there are frames waiting to be read.
    pub fn has_incoming(&self) -> bool {
        !self.incoming.lock().unwrap().is_empty()
    }

    /// Set whether the device is "up".
    ///
    /// A device that is down fails reads and writes, which is how tests
    /// exercise the relay's fatal read-side path.
    pub fn set_up(&self, up: bool) {
        *self.up.lock().unwrap() = up;
        self.notify.notify_one();
    }

    /// Check if device is "up".
    pub fn is_up(&self) -> bool {
        *self.up.lock().unwrap()
    }

    fn down_error() -> Error {
        Error::Io(io::Error::new(io::ErrorKind::NotConnected, "device is down"))
    }
}

impl Clone for FakePort {
    fn clone(&self) -> Self {
        Self {
            name: self.name.clone(),
            incoming: Arc::clone(&self.incoming),
            written: Arc::clone(&self.written),
            notify: Arc::clone(&self.notify),
            up: Arc::clone(&self.up),
        }
    }
}

impl PortDevice for FakePort {
    async fn read_frame(&mut self) -> Result<Vec<u8>> {
        loop {
            // Register before checking the queue so an inject between the
            // check and the await is not missed.
            let notified = self.notify.notified();
            if !self.is_up() {
                return Err(Self::down_error());
            }
            if let Some(frame) = self.incoming.lock().unwrap().pop_front() {
                return Ok(frame);
            }
            notified.await;
        }
    }

    async fn write_frame(&mut self, frame: &[u8]) -> Result<()> {
        if !self.is_up() {
            return Err(Self::down_error());
        }
        self.written.lock().unwrap().push(frame.to_vec());
        Ok(())
    }

    fn name(&self) -> &str {
        &self.name
    }
}

// =============================================================================
// Tests
// =============================================================================
