//! In-memory link for testing without hardware
//!
//! [`MockLink`] behaves like an open serial port backed by byte queues. A
//! cloneable [`MockLinkHandle`] shares its state, so a test (or the replay
//! command) can feed device output and inspect what was written while the
//! link itself is owned by a session or a worker thread.
//!
//! # Features
//!
//! - **Auto-acknowledge**: answer every complete matrix frame with `ACK\n`
//! - **Fragmented reads**: expose at most N bytes per read to mimic a slow port
//! - **Fault injection**: make reads or writes fail with a link failure
//!
//! # Example
//!
//! ```ignore
//! use oscnet_rs::link::MockLink;
//!
//! let link = MockLink::new("mock").with_read_chunk(4);
//! let handle = link.handle();
//! handle.push_telemetry_tick(&[2048, 1024]);
//! ```

use super::SerialLink;
use crate::error::{OscNetError, Result};
use crate::protocol::matrix::FRAME_END;
use crate::protocol::telemetry::encode_group;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

#[derive(Debug, Default)]
struct MockLinkState {
    open: bool,
    incoming: VecDeque<u8>,
    written: Vec<u8>,
    auto_ack: bool,
    read_chunk: Option<usize>,
    fail_reads: bool,
    fail_writes: bool,
}

/// Scripted in-memory link
#[derive(Debug)]
pub struct MockLink {
    name: String,
    state: Arc<Mutex<MockLinkState>>,
}

/// Shared access to a [`MockLink`]'s queues
#[derive(Debug, Clone)]
pub struct MockLinkHandle {
    state: Arc<Mutex<MockLinkState>>,
}

fn lock(state: &Mutex<MockLinkState>) -> MutexGuard<'_, MockLinkState> {
    state.lock().unwrap_or_else(PoisonError::into_inner)
}

impl MockLink {
    /// Create an open link with nothing to read
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            state: Arc::new(Mutex::new(MockLinkState {
                open: true,
                ..MockLinkState::default()
            })),
        }
    }

    /// Reply `ACK\n` to every written frame that ends with `>`
    pub fn with_auto_ack(self) -> Self {
        lock(&self.state).auto_ack = true;
        self
    }

    /// Deliver at most `chunk` bytes per read
    pub fn with_read_chunk(self, chunk: usize) -> Self {
        lock(&self.state).read_chunk = Some(chunk.max(1));
        self
    }

    /// Preload device output
    pub fn with_incoming(self, bytes: &[u8]) -> Self {
        lock(&self.state).incoming.extend(bytes);
        self
    }

    pub fn handle(&self) -> MockLinkHandle {
        MockLinkHandle {
            state: Arc::clone(&self.state),
        }
    }

    fn check_open(state: &MockLinkState) -> Result<()> {
        if state.open {
            Ok(())
        } else {
            Err(OscNetError::LinkFailure("port is closed".to_string()))
        }
    }
}

impl SerialLink for MockLink {
    fn name(&self) -> String {
        self.name.clone()
    }

    fn is_open(&self) -> bool {
        lock(&self.state).open
    }

    fn bytes_available(&mut self) -> Result<usize> {
        let state = lock(&self.state);
        Self::check_open(&state)?;
        if state.fail_reads {
            return Err(OscNetError::LinkFailure("read failed".to_string()));
        }
        let available = state.incoming.len();
        Ok(state.read_chunk.map_or(available, |chunk| available.min(chunk)))
    }

    fn read(&mut self, buf: &mut [u8]) -> Result<usize> {
        let mut state = lock(&self.state);
        Self::check_open(&state)?;
        if state.fail_reads {
            return Err(OscNetError::LinkFailure("read failed".to_string()));
        }
        let limit = state.read_chunk.unwrap_or(usize::MAX);
        let n = buf.len().min(state.incoming.len()).min(limit);
        for (slot, byte) in buf.iter_mut().zip(state.incoming.drain(..n)) {
            *slot = byte;
        }
        Ok(n)
    }

    fn write_all(&mut self, data: &[u8]) -> Result<()> {
        let mut state = lock(&self.state);
        Self::check_open(&state)?;
        if state.fail_writes {
            return Err(OscNetError::LinkFailure("write failed".to_string()));
        }
        state.written.extend_from_slice(data);
        if state.auto_ack && data.last() == Some(&FRAME_END) {
            state.incoming.extend(b"ACK\n");
        }
        Ok(())
    }

    fn flush(&mut self) -> Result<()> {
        Self::check_open(&lock(&self.state))
    }

    fn close(&mut self) {
        lock(&self.state).open = false;
    }
}

impl MockLinkHandle {
    /// Queue bytes as if sent by the device
    pub fn push_incoming(&self, bytes: &[u8]) {
        lock(&self.state).incoming.extend(bytes);
    }

    /// Queue one telemetry group per channel, channel ids `0..values.len()`
    pub fn push_telemetry_tick(&self, adc_values: &[u16]) {
        let mut state = lock(&self.state);
        for (channel, &adc) in adc_values.iter().enumerate() {
            state.incoming.extend(encode_group(channel as u8, adc));
        }
    }

    /// Bytes not yet read
    pub fn pending(&self) -> usize {
        lock(&self.state).incoming.len()
    }

    /// Everything written since the last call
    pub fn take_written(&self) -> Vec<u8> {
        std::mem::take(&mut lock(&self.state).written)
    }

    pub fn set_read_failure(&self, fail: bool) {
        lock(&self.state).fail_reads = fail;
    }

    pub fn set_write_failure(&self, fail: bool) {
        lock(&self.state).fail_writes = fail;
    }

    pub fn is_open(&self) -> bool {
        lock(&self.state).open
    }
}
