//! Frequency measurement mode
//!
//! While in measurement mode the device reports the frequency it measures on
//! the selected oscillator as text lines `#FRQ:<hz>$`, interleaved with other
//! status chatter. [`FrequencyLineParser`] extracts the readings from an
//! arbitrarily chunked byte stream and [`TuningReading`] turns a reading into
//! feedback for hand-tuning an oscillator towards its target.

use serde::{Deserialize, Serialize};

/// Control byte: enter frequency measurement mode
pub const START_FREQUENCY_STREAM: u8 = 0xF0;

/// Control byte: leave frequency measurement mode
pub const STOP_FREQUENCY_STREAM: u8 = 0xF1;

const LINE_PREFIX: &str = "#FRQ:";
const LINE_SUFFIX: &str = "$";

/// Longest partial line kept between reads
const MAX_LINE_LEN: usize = 256;

/// Parse a single `#FRQ:<hz>$` line (surrounding whitespace allowed)
pub fn parse_frequency_line(line: &str) -> Option<f64> {
    let value = line
        .trim()
        .strip_prefix(LINE_PREFIX)?
        .strip_suffix(LINE_SUFFIX)?;
    value.trim().parse::<f64>().ok().filter(|f| f.is_finite())
}

/// Splits incoming bytes into lines and yields the frequency readings
#[derive(Debug, Default, Clone)]
pub struct FrequencyLineParser {
    partial: Vec<u8>,
}

impl FrequencyLineParser {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed bytes; returns every reading completed by them, in order
    pub fn feed(&mut self, bytes: &[u8]) -> Vec<f64> {
        let mut readings = Vec::new();
        for &byte in bytes {
            if byte == b'\n' {
                let line = String::from_utf8_lossy(&self.partial);
                match parse_frequency_line(&line) {
                    Some(hz) => readings.push(hz),
                    None if !line.trim().is_empty() => {
                        tracing::debug!("Device: {}", line.trim());
                    }
                    None => {}
                }
                self.partial.clear();
            } else if self.partial.len() < MAX_LINE_LEN {
                self.partial.push(byte);
            }
        }
        readings
    }

    pub fn clear(&mut self) {
        self.partial.clear();
    }
}

/// Which way the oscillator should be adjusted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TuningAdvice {
    OnTarget,
    Decrease,
    Increase,
}

impl std::fmt::Display for TuningAdvice {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TuningAdvice::OnTarget => write!(f, "Frequency on target"),
            TuningAdvice::Decrease => write!(f, "Decrease the frequency"),
            TuningAdvice::Increase => write!(f, "Increase the frequency"),
        }
    }
}

/// How far off the reading is, for coloring an indicator
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum TuningSeverity {
    Low,
    Medium,
    High,
}

/// A measured frequency compared against its target
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TuningReading {
    pub target_hz: f64,
    pub measured_hz: f64,
    /// Deviation as a percentage of the tuning range, clamped to ±100
    pub deviation_percent: f64,
    pub advice: TuningAdvice,
    pub severity: TuningSeverity,
}

impl TuningReading {
    /// Compare `measured` to `target`.
    ///
    /// `range_hz` is the deviation shown as full scale; readings within
    /// `tolerance_hz` of the target are on target.
    pub fn evaluate(target: f64, measured: f64, range_hz: f64, tolerance_hz: f64) -> Self {
        let diff = measured - target;
        let deviation_percent = if range_hz > 0.0 {
            (diff / range_hz * 100.0).clamp(-100.0, 100.0)
        } else {
            0.0
        };

        let advice = if diff.abs() < tolerance_hz {
            TuningAdvice::OnTarget
        } else if diff > 0.0 {
            TuningAdvice::Decrease
        } else {
            TuningAdvice::Increase
        };

        let magnitude = deviation_percent.abs();
        let severity = if magnitude > 80.0 {
            TuningSeverity::High
        } else if magnitude > 40.0 {
            TuningSeverity::Medium
        } else {
            TuningSeverity::Low
        };

        Self {
            target_hz: target,
            measured_hz: measured,
            deviation_percent,
            advice,
            severity,
        }
    }

    pub fn is_on_target(&self) -> bool {
        self.advice == TuningAdvice::OnTarget
    }
}
