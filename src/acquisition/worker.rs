//! Acquisition worker thread
//!
//! The worker owns the link session and the decoder. Every tick it:
//!
//! - **Processes commands** from the control thread
//! - **Decodes** whatever bytes arrived since the last tick
//! - **Forwards** the sample vector, dropping it if the receiver lags behind
//!
//! # Rate Limiting
//!
//! Ticks are paced to the configured interval (default 10 ms). The decoder
//! never waits for bytes, so a slow device produces repeated values rather
//! than a stalled loop.
//!
//! # Termination
//!
//! The loop stops on [`AcquisitionCommand::Shutdown`], when the command
//! sender is dropped, when the stop flag is cleared, or after a link failure.
//! In every case the session is sent back in [`AcquisitionMessage::Stopped`].

use super::{AcquisitionCommand, AcquisitionMessage};
use crate::link::LinkSession;
use crate::protocol::telemetry::{DecoderStats, SampleStreamDecoder};
use crossbeam_channel::{Receiver, Sender, TryRecvError};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// How often statistics are reported
const STATS_INTERVAL: Duration = Duration::from_millis(500);

/// Worker counters
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AcquisitionStats {
    /// Ticks decoded
    pub ticks: u64,
    /// Sample messages delivered
    pub samples_sent: u64,
    /// Messages dropped because the receiver was full
    pub dropped_messages: u64,
    /// Decoder counters at the time of the report
    pub decoder: DecoderStats,
}

/// Tick loop state
pub struct AcquisitionWorker {
    session: LinkSession,
    decoder: SampleStreamDecoder,
    tick_interval: Duration,
    command_rx: Receiver<AcquisitionCommand>,
    message_tx: Sender<AcquisitionMessage>,
    running: Arc<AtomicBool>,
    paused: bool,
    stats: AcquisitionStats,
    last_tick_time: Instant,
    last_stats_time: Instant,
}

impl AcquisitionWorker {
    pub fn new(
        session: LinkSession,
        decoder: SampleStreamDecoder,
        tick_interval: Duration,
        command_rx: Receiver<AcquisitionCommand>,
        message_tx: Sender<AcquisitionMessage>,
        running: Arc<AtomicBool>,
    ) -> Self {
        Self {
            session,
            decoder,
            tick_interval,
            command_rx,
            message_tx,
            running,
            paused: false,
            stats: AcquisitionStats::default(),
            last_tick_time: Instant::now(),
            last_stats_time: Instant::now(),
        }
    }

    /// Run the tick loop, then release the session
    pub fn run(mut self) {
        tracing::info!(
            "Acquisition started on {} ({} channels, {:?} ticks)",
            self.session.name(),
            self.decoder.num_channels(),
            self.tick_interval
        );

        while self.running.load(Ordering::SeqCst) {
            self.process_commands();
            if !self.running.load(Ordering::SeqCst) {
                break;
            }

            if !self.paused {
                self.tick();

                if self.last_stats_time.elapsed() >= STATS_INTERVAL {
                    self.send_stats();
                    self.last_stats_time = Instant::now();
                }
            }

            self.rate_limit();
        }

        self.send_stats();
        tracing::info!(
            "Acquisition stopped after {} ticks ({} dropped messages)",
            self.stats.ticks,
            self.stats.dropped_messages
        );
        let _ = self.message_tx.send(AcquisitionMessage::Stopped(self.session));
    }

    /// Process pending commands from the control thread
    fn process_commands(&mut self) {
        loop {
            match self.command_rx.try_recv() {
                Ok(cmd) => self.handle_command(cmd),
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => {
                    self.running.store(false, Ordering::SeqCst);
                    break;
                }
            }
        }
    }

    fn handle_command(&mut self, cmd: AcquisitionCommand) {
        tracing::debug!("Acquisition command: {:?}", cmd);
        match cmd {
            AcquisitionCommand::Pause => self.paused = true,
            AcquisitionCommand::Resume => self.paused = false,
            AcquisitionCommand::Clear => self.decoder.reset(),
            AcquisitionCommand::Shutdown => self.running.store(false, Ordering::SeqCst),
        }
    }

    /// Decode one tick and forward the samples
    fn tick(&mut self) {
        match self.session.decode_tick(&mut self.decoder) {
            Ok(samples) => {
                self.stats.ticks += 1;
                tracing::trace!("Tick {}: {:?}", samples.time_index, samples.values);
                if self.try_send_message(AcquisitionMessage::Samples {
                    time_index: samples.time_index,
                    values: samples.values,
                }) {
                    self.stats.samples_sent += 1;
                }
            }
            Err(e) if e.is_link_failure() => {
                tracing::error!("Link lost during acquisition: {}", e);
                let _ = self.message_tx.send(AcquisitionMessage::LinkLost(e.to_string()));
                self.running.store(false, Ordering::SeqCst);
            }
            Err(e) => {
                tracing::warn!("Telemetry tick failed: {}", e);
            }
        }
    }

    /// Sleep out the remainder of the tick interval
    fn rate_limit(&mut self) {
        if self.tick_interval.is_zero() {
            std::thread::yield_now();
            return;
        }

        let elapsed = self.last_tick_time.elapsed();
        if elapsed < self.tick_interval {
            std::thread::sleep(self.tick_interval - elapsed);
        }

        self.last_tick_time = Instant::now();
    }

    fn send_stats(&mut self) {
        let mut stats = self.stats.clone();
        stats.decoder = self.decoder.stats().clone();
        self.try_send_message(AcquisitionMessage::Stats(stats));
    }

    /// Try to send a message, counting it as dropped if the queue is full
    fn try_send_message(&mut self, msg: AcquisitionMessage) -> bool {
        if self.message_tx.try_send(msg).is_err() {
            self.stats.dropped_messages += 1;
            false
        } else {
            true
        }
    }
}
