//! Live telemetry acquisition
//!
//! Decoding runs on its own thread so the control thread stays free for
//! editing. The two sides talk over crossbeam channels:
//!
//! - [`AcquisitionCommand`] - control messages (pause, resume, clear, shutdown)
//! - [`AcquisitionMessage`] - decoded samples, statistics and session lifecycle
//! - [`AcquisitionHandle`] - control-side handle for sending commands and receiving messages
//! - [`AcquisitionBackend`] - entry point that owns the link session until the worker stops
//!
//! # Example
//!
//! ```ignore
//! use oscnet_rs::acquisition::{AcquisitionBackend, AcquisitionMessage};
//!
//! let (backend, handle) = AcquisitionBackend::new(session, 4, &config);
//! let worker = std::thread::spawn(move || backend.run());
//!
//! for msg in handle.drain() {
//!     if let AcquisitionMessage::Samples { time_index, values } = msg {
//!         // plot values
//!     }
//! }
//! handle.shutdown();
//! ```
//!
//! The session is handed back in [`AcquisitionMessage::Stopped`] when the
//! worker exits, so the link can be reused or closed by its next owner.

pub mod recorder;
pub mod worker;

pub use recorder::SampleRecorder;
pub use worker::{AcquisitionStats, AcquisitionWorker};

use crate::config::{AcquisitionConfig, AppConfig};
use crate::link::LinkSession;
use crossbeam_channel::{bounded, Receiver, RecvTimeoutError, Sender};
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use std::time::Duration;

/// Message sent from the control thread to the worker
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AcquisitionCommand {
    /// Stop decoding ticks until resumed
    Pause,
    Resume,
    /// Reset the decoder: time index, latest values and histories
    Clear,
    Shutdown,
}

/// Message sent from the worker to the control thread
#[derive(Debug)]
pub enum AcquisitionMessage {
    /// One decoded tick
    Samples { time_index: usize, values: Vec<f64> },
    /// Periodic statistics
    Stats(AcquisitionStats),
    /// The link failed; the worker stops after this message
    LinkLost(String),
    /// The worker exited and releases the session
    Stopped(LinkSession),
}

/// Control-side end of an acquisition
pub struct AcquisitionHandle {
    /// Receiver for worker messages
    pub receiver: Receiver<AcquisitionMessage>,
    /// Sender for commands to the worker
    pub command_sender: Sender<AcquisitionCommand>,
}

impl AcquisitionHandle {
    /// Try to receive a message without blocking
    pub fn try_recv(&self) -> Option<AcquisitionMessage> {
        self.receiver.try_recv().ok()
    }

    /// Wait up to `timeout` for the next message
    ///
    /// Returns `None` on timeout or once the worker is gone.
    pub fn recv_timeout(&self, timeout: Duration) -> Option<AcquisitionMessage> {
        match self.receiver.recv_timeout(timeout) {
            Ok(msg) => Some(msg),
            Err(RecvTimeoutError::Timeout) | Err(RecvTimeoutError::Disconnected) => None,
        }
    }

    /// Receive all pending messages
    pub fn drain(&self) -> Vec<AcquisitionMessage> {
        let mut messages = Vec::new();
        while let Ok(msg) = self.receiver.try_recv() {
            messages.push(msg);
        }
        messages
    }

    /// Send a command to the worker
    pub fn send_command(&self, cmd: AcquisitionCommand) -> bool {
        self.command_sender.send(cmd).is_ok()
    }

    pub fn pause(&self) {
        let _ = self.command_sender.send(AcquisitionCommand::Pause);
    }

    pub fn resume(&self) {
        let _ = self.command_sender.send(AcquisitionCommand::Resume);
    }

    pub fn clear(&self) {
        let _ = self.command_sender.send(AcquisitionCommand::Clear);
    }

    /// Request shutdown
    pub fn shutdown(&self) {
        let _ = self.command_sender.send(AcquisitionCommand::Shutdown);
    }

    /// Request shutdown and wait for the released session
    ///
    /// Samples still in flight are discarded.
    pub fn shutdown_and_wait(&self, timeout: Duration) -> Option<LinkSession> {
        self.shutdown();
        let deadline = std::time::Instant::now() + timeout;
        loop {
            let remaining = deadline.saturating_duration_since(std::time::Instant::now());
            if remaining.is_zero() {
                return None;
            }
            match self.recv_timeout(remaining)? {
                AcquisitionMessage::Stopped(session) => return Some(session),
                _ => continue,
            }
        }
    }
}

/// Acquisition that runs on a worker thread
pub struct AcquisitionBackend {
    session: LinkSession,
    num_channels: usize,
    config: AcquisitionConfig,
    command_receiver: Receiver<AcquisitionCommand>,
    message_sender: Sender<AcquisitionMessage>,
    running: Arc<AtomicBool>,
}

impl AcquisitionBackend {
    /// Create a backend for `num_channels` channels with its communication channels
    pub fn new(
        session: LinkSession,
        num_channels: usize,
        config: &AppConfig,
    ) -> (Self, AcquisitionHandle) {
        let (cmd_tx, cmd_rx) = bounded(64);
        // Bounded for backpressure; the worker drops samples rather than block
        let (msg_tx, msg_rx) = bounded(config.acquisition.channel_buffer_size.max(1));

        let backend = Self {
            session,
            num_channels,
            config: config.acquisition.clone(),
            command_receiver: cmd_rx,
            message_sender: msg_tx,
            running: Arc::new(AtomicBool::new(true)),
        };

        let handle = AcquisitionHandle {
            receiver: msg_rx,
            command_sender: cmd_tx,
        };

        (backend, handle)
    }

    /// Run the acquisition loop until shutdown or link loss
    pub fn run(self) {
        let decoder = self.config.decoder(self.num_channels);
        let worker = AcquisitionWorker::new(
            self.session,
            decoder,
            self.config.tick_interval(),
            self.command_receiver,
            self.message_sender,
            self.running,
        );
        worker.run();
    }

    /// Get a handle to stop the backend
    pub fn stop_handle(&self) -> Arc<AtomicBool> {
        self.running.clone()
    }
}
