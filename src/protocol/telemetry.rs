//! Live telemetry decoding
//!
//! The device streams repeating 3-byte groups
//!
//! ```text
//! [channel_id: u8][adc value: 2 bytes]
//! ```
//!
//! with 12-bit ADC readings mapped to volts as `adc / 4095 * 3.3`. Serial
//! reads return arbitrary slices of that stream, so [`SampleStreamDecoder`]
//! turns whatever arrived during one tick into exactly one sample per
//! channel. Channels without a fresh group repeat their previous value (0 V
//! before the first reading), which keeps every channel's history the same
//! length and aligned on the tick index.
//!
//! A tick can end in the middle of a group. [`FramingPolicy`] decides what
//! happens to those trailing bytes.

use crate::error::Result;
use crate::link::SerialLink;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

/// Bytes per telemetry group
pub const GROUP_LEN: usize = 3;

/// Full-scale ADC reading
pub const ADC_MAX: u16 = 4095;

/// ADC reference voltage
pub const ADC_REFERENCE_VOLTS: f64 = 3.3;

/// Upper bound on bytes consumed by one tick, a whole number of groups
pub const MAX_READ_PER_TICK: usize = 1365 * GROUP_LEN;

/// Convert a raw ADC reading to volts
#[inline]
pub fn adc_to_volts(adc: u16) -> f64 {
    adc as f64 / ADC_MAX as f64 * ADC_REFERENCE_VOLTS
}

/// Handling of a trailing partial group at the end of a tick
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FramingPolicy {
    /// Discard the partial group. Simple, but a stream that keeps splitting
    /// groups stays misaligned until a tick happens to end on a boundary.
    #[default]
    Drop,
    /// Keep the partial group and prepend it to the next tick's bytes
    Carry,
}

impl std::str::FromStr for FramingPolicy {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "drop" => Ok(FramingPolicy::Drop),
            "carry" => Ok(FramingPolicy::Carry),
            other => Err(format!("unknown framing policy '{}'", other)),
        }
    }
}

/// Order of the two ADC bytes within a group
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AdcByteOrder {
    /// `[channel][high][low]`
    #[default]
    MsbFirst,
    /// `[channel][low][high]`
    LsbFirst,
}

impl AdcByteOrder {
    #[inline]
    pub fn decode(self, first: u8, second: u8) -> u16 {
        match self {
            AdcByteOrder::MsbFirst => u16::from_be_bytes([first, second]),
            AdcByteOrder::LsbFirst => u16::from_le_bytes([first, second]),
        }
    }

    pub fn encode(self, channel: u8, adc: u16) -> [u8; GROUP_LEN] {
        let [first, second] = match self {
            AdcByteOrder::MsbFirst => adc.to_be_bytes(),
            AdcByteOrder::LsbFirst => adc.to_le_bytes(),
        };
        [channel, first, second]
    }
}

/// Encode one group in the default byte order
pub fn encode_group(channel: u8, adc: u16) -> [u8; GROUP_LEN] {
    AdcByteOrder::default().encode(channel, adc)
}

/// One decoded tick
#[derive(Debug, Clone, PartialEq)]
pub struct TickSamples {
    /// Tick number, starting at 0
    pub time_index: usize,
    /// Voltage per channel
    pub values: Vec<f64>,
    /// Whether each channel received a fresh group this tick
    pub updated: Vec<bool>,
}

/// Decoder counters
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DecoderStats {
    pub ticks: u64,
    pub bytes_received: u64,
    pub groups_decoded: u64,
    /// Groups with an unknown channel id or an out-of-range ADC value
    pub groups_rejected: u64,
    /// Partial-group bytes discarded under [`FramingPolicy::Drop`]
    pub bytes_dropped: u64,
}

/// Reassembles per-channel voltage samples from raw telemetry bytes
#[derive(Debug, Clone)]
pub struct SampleStreamDecoder {
    num_channels: usize,
    framing: FramingPolicy,
    byte_order: AdcByteOrder,
    /// History cap per channel (0 = unlimited)
    max_samples: usize,
    time_index: usize,
    latest: Vec<f64>,
    history: Vec<VecDeque<f64>>,
    pending: Vec<u8>,
    stats: DecoderStats,
}

impl SampleStreamDecoder {
    pub fn new(num_channels: usize) -> Self {
        Self {
            num_channels,
            framing: FramingPolicy::default(),
            byte_order: AdcByteOrder::default(),
            max_samples: 0,
            time_index: 0,
            latest: vec![0.0; num_channels],
            history: vec![VecDeque::new(); num_channels],
            pending: Vec::with_capacity(GROUP_LEN),
            stats: DecoderStats::default(),
        }
    }

    pub fn with_framing(mut self, framing: FramingPolicy) -> Self {
        self.framing = framing;
        self
    }

    pub fn with_byte_order(mut self, byte_order: AdcByteOrder) -> Self {
        self.byte_order = byte_order;
        self
    }

    pub fn with_max_samples(mut self, max_samples: usize) -> Self {
        self.max_samples = max_samples;
        self
    }

    pub fn num_channels(&self) -> usize {
        self.num_channels
    }

    pub fn framing(&self) -> FramingPolicy {
        self.framing
    }

    /// Index the next tick will get
    pub fn time_index(&self) -> usize {
        self.time_index
    }

    /// Most recent voltage per channel
    pub fn latest(&self) -> &[f64] {
        &self.latest
    }

    pub fn history(&self, channel: usize) -> Option<&VecDeque<f64>> {
        self.history.get(channel)
    }

    /// Bytes carried over into the next tick
    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    pub fn stats(&self) -> &DecoderStats {
        &self.stats
    }

    /// Read everything currently available on `link` and decode it as one tick
    ///
    /// Never waits for more bytes. Transport errors are returned as link
    /// failures and leave the decoder state untouched.
    pub fn decode_tick(&mut self, link: &mut dyn SerialLink) -> Result<TickSamples> {
        let available = link.bytes_available()?.min(MAX_READ_PER_TICK);
        let mut buf = vec![0u8; available];
        let n = if available > 0 { link.read(&mut buf)? } else { 0 };
        buf.truncate(n);
        Ok(self.decode_bytes(&buf))
    }

    /// Decode the bytes received during one tick
    pub fn decode_bytes(&mut self, bytes: &[u8]) -> TickSamples {
        self.stats.bytes_received += bytes.len() as u64;

        let carried;
        let data: &[u8] = if self.pending.is_empty() {
            bytes
        } else {
            let mut joined = std::mem::take(&mut self.pending);
            joined.extend_from_slice(bytes);
            carried = joined;
            &carried
        };

        let mut updated = vec![false; self.num_channels];
        let mut groups = data.chunks_exact(GROUP_LEN);
        for group in groups.by_ref() {
            let channel = group[0] as usize;
            if channel >= self.num_channels {
                tracing::trace!("Skipping group for unknown channel {}", channel);
                self.stats.groups_rejected += 1;
                continue;
            }
            let adc = self.byte_order.decode(group[1], group[2]);
            if adc > ADC_MAX {
                tracing::trace!("Skipping out-of-range ADC value {} on channel {}", adc, channel);
                self.stats.groups_rejected += 1;
                continue;
            }
            self.latest[channel] = adc_to_volts(adc);
            updated[channel] = true;
            self.stats.groups_decoded += 1;
        }

        let remainder = groups.remainder();
        if !remainder.is_empty() {
            match self.framing {
                FramingPolicy::Drop => {
                    tracing::trace!("Dropping {} trailing bytes", remainder.len());
                    self.stats.bytes_dropped += remainder.len() as u64;
                }
                FramingPolicy::Carry => self.pending = remainder.to_vec(),
            }
        }

        for (history, &value) in self.history.iter_mut().zip(&self.latest) {
            history.push_back(value);
            if self.max_samples > 0 && history.len() > self.max_samples {
                history.pop_front();
            }
        }

        let samples = TickSamples {
            time_index: self.time_index,
            values: self.latest.clone(),
            updated,
        };
        self.time_index += 1;
        self.stats.ticks += 1;
        samples
    }

    /// Drop recorded history but keep the latest values and alignment state
    pub fn clear_history(&mut self) {
        for history in &mut self.history {
            history.clear();
        }
    }

    /// Return to the freshly created state
    pub fn reset(&mut self) {
        self.time_index = 0;
        self.latest.iter_mut().for_each(|v| *v = 0.0);
        self.clear_history();
        self.pending.clear();
        self.stats = DecoderStats::default();
    }
}
