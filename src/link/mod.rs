//! Serial link to the oscillator controller
//!
//! The device is reached over a byte-oriented duplex channel. This module
//! defines the [`SerialLink`] transport trait and [`LinkSession`], the single
//! owner of an open link that speaks the device protocol on top of it:
//!
//! - coupling matrix upload with `ACK` handshake
//! - frequency measurement mode (`0xF0` / `0xF1` and `#FRQ:<hz>$` lines)
//! - raw telemetry reads for the [`SampleStreamDecoder`]
//!
//! # Ownership
//!
//! A link belongs to exactly one session at a time. [`LinkSession::release`]
//! consumes the session and hands the link back; reopening requires the
//! previous session to be released or closed first.
//!
//! # Example
//!
//! ```ignore
//! use oscnet_rs::config::LinkConfig;
//! use oscnet_rs::link::{LinkSession, MockLink};
//!
//! let mut session = LinkSession::open(Box::new(MockLink::new("mock").with_auto_ack()), LinkConfig::default())?;
//! session.transmit_matrix(&editor.coupling_matrix())?;
//! ```

pub mod mock_link;

pub use mock_link::{MockLink, MockLinkHandle};

use crate::config::LinkConfig;
use crate::error::{OscNetError, Result, ResultExt};
use crate::protocol::frequency::{FrequencyLineParser, START_FREQUENCY_STREAM, STOP_FREQUENCY_STREAM};
use crate::protocol::matrix::CouplingMatrix;
use crate::protocol::telemetry::{SampleStreamDecoder, TickSamples};
use std::time::{Duration, Instant};

/// Acknowledgement the device sends after a matrix frame
pub const ACK: &[u8] = b"ACK";

/// Sleep between polls while waiting for the acknowledgement
const ACK_POLL_INTERVAL: Duration = Duration::from_millis(1);

/// Byte-oriented duplex transport
///
/// Reads never block: [`read`](SerialLink::read) returns at most the bytes
/// that are available right now. Implementations report transport errors as
/// [`OscNetError::LinkFailure`].
#[cfg_attr(test, mockall::automock)]
pub trait SerialLink: Send {
    /// Port name for display and logs
    fn name(&self) -> String;

    fn is_open(&self) -> bool;

    /// Number of bytes that can be read without blocking
    fn bytes_available(&mut self) -> Result<usize>;

    /// Read up to `buf.len()` available bytes, returning how many were read
    fn read(&mut self, buf: &mut [u8]) -> Result<usize>;

    fn write_all(&mut self, data: &[u8]) -> Result<()>;

    fn flush(&mut self) -> Result<()>;

    /// Close the port. Further I/O fails.
    fn close(&mut self);
}

/// Counters for one session
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LinkStats {
    pub bytes_read: u64,
    pub bytes_written: u64,
    pub frames_sent: u64,
    pub acks_received: u64,
    pub ack_timeouts: u64,
    pub frequency_readings: u64,
}

/// Exclusive session over an open link
pub struct LinkSession {
    link: Box<dyn SerialLink>,
    config: LinkConfig,
    lines: FrequencyLineParser,
    frequency_streaming: bool,
    stats: LinkStats,
}

impl LinkSession {
    /// Take ownership of an open link
    pub fn open(link: Box<dyn SerialLink>, config: LinkConfig) -> Result<Self> {
        if !link.is_open() {
            return Err(OscNetError::LinkFailure(format!(
                "port {} is not open",
                link.name()
            )));
        }
        tracing::info!("Link session opened on {}", link.name());
        Ok(Self {
            link,
            config,
            lines: FrequencyLineParser::new(),
            frequency_streaming: false,
            stats: LinkStats::default(),
        })
    }

    pub fn name(&self) -> String {
        self.link.name()
    }

    pub fn is_open(&self) -> bool {
        self.link.is_open()
    }

    pub fn config(&self) -> &LinkConfig {
        &self.config
    }

    pub fn stats(&self) -> &LinkStats {
        &self.stats
    }

    pub fn is_frequency_streaming(&self) -> bool {
        self.frequency_streaming
    }

    /// Upload a coupling matrix and wait for the device's `ACK`
    pub fn transmit_matrix(&mut self, matrix: &CouplingMatrix) -> Result<()> {
        if matrix.size() > self.config.max_nodes {
            return Err(OscNetError::TooManyNodes {
                count: matrix.size(),
                max: self.config.max_nodes,
            });
        }

        // Only a reply to this frame counts as its acknowledgement
        let stale = self.discard_input()?;
        if stale > 0 {
            tracing::debug!("Discarded {} stale bytes before matrix upload", stale);
        }

        let frame = matrix.encode();
        tracing::debug!(
            "Sending {}x{} matrix: {}",
            matrix.size(),
            matrix.size(),
            String::from_utf8_lossy(&frame)
        );
        self.write(&frame).context("Failed to send coupling matrix")?;
        self.stats.frames_sent += 1;

        self.wait_for_ack(self.config.ack_timeout())
    }

    /// Read and drop everything currently buffered on the link
    fn discard_input(&mut self) -> Result<usize> {
        let mut buf = [0u8; 64];
        let mut discarded = 0;
        while self.link.bytes_available()? > 0 {
            let n = self.link.read(&mut buf)?;
            if n == 0 {
                break;
            }
            discarded += n;
        }
        self.stats.bytes_read += discarded as u64;
        Ok(discarded)
    }

    fn wait_for_ack(&mut self, timeout: Duration) -> Result<()> {
        let deadline = Instant::now() + timeout;
        let mut response = Vec::new();
        let mut buf = [0u8; 64];

        loop {
            if self.link.bytes_available()? > 0 {
                let n = self.link.read(&mut buf)?;
                self.stats.bytes_read += n as u64;
                response.extend_from_slice(&buf[..n]);
                if response.windows(ACK.len()).any(|w| w == ACK) {
                    self.stats.acks_received += 1;
                    tracing::info!("Device acknowledged coupling matrix");
                    return Ok(());
                }
            }
            if Instant::now() >= deadline {
                self.stats.ack_timeouts += 1;
                tracing::warn!(
                    "No ACK within {:?} (received {:?})",
                    timeout,
                    String::from_utf8_lossy(&response)
                );
                return Err(OscNetError::AckTimeout(timeout));
            }
            std::thread::sleep(ACK_POLL_INTERVAL);
        }
    }

    /// Put the device into frequency measurement mode
    pub fn start_frequency_stream(&mut self) -> Result<()> {
        self.write(&[START_FREQUENCY_STREAM])?;
        self.lines.clear();
        self.frequency_streaming = true;
        tracing::info!("Frequency measurement started");
        Ok(())
    }

    /// Leave frequency measurement mode
    pub fn stop_frequency_stream(&mut self) -> Result<()> {
        self.write(&[STOP_FREQUENCY_STREAM])?;
        self.frequency_streaming = false;
        tracing::info!("Frequency measurement stopped");
        Ok(())
    }

    /// Read pending device output and return the latest measured frequency
    ///
    /// Returns `Ok(None)` when no complete `#FRQ:<hz>$` line has arrived.
    pub fn poll_frequency(&mut self) -> Result<Option<f64>> {
        let available = self.link.bytes_available()?;
        if available == 0 {
            return Ok(None);
        }
        let mut buf = vec![0u8; available];
        let n = self.link.read(&mut buf)?;
        self.stats.bytes_read += n as u64;

        let latest = self.lines.feed(&buf[..n]).into_iter().last();
        if latest.is_some() {
            self.stats.frequency_readings += 1;
        }
        Ok(latest)
    }

    /// Run one telemetry decode tick against this link
    pub fn decode_tick(&mut self, decoder: &mut SampleStreamDecoder) -> Result<TickSamples> {
        let before = decoder.stats().bytes_received;
        let samples = decoder.decode_tick(self.link.as_mut())?;
        self.stats.bytes_read += decoder.stats().bytes_received - before;
        Ok(samples)
    }

    fn write(&mut self, data: &[u8]) -> Result<()> {
        self.link.write_all(data)?;
        self.link.flush()?;
        self.stats.bytes_written += data.len() as u64;
        Ok(())
    }

    /// End the session and hand the link back to the caller
    pub fn release(self) -> Box<dyn SerialLink> {
        tracing::info!("Link session on {} released", self.link.name());
        self.link
    }

    /// End the session and close the port
    pub fn close(self) {
        let mut link = self.release();
        link.close();
    }
}

impl std::fmt::Debug for LinkSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LinkSession")
            .field("link", &self.link.name())
            .field("config", &self.config)
            .field("stats", &self.stats)
            .finish()
    }
}
