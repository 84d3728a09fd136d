//! Spectrum analysis of decoded oscillator channels
//!
//! Provides frequency domain analysis for channel histories including:
//! - Magnitude spectrum with configurable window and size
//! - Dominant frequency estimation with sub-bin interpolation
//! - Tuning feedback from a channel instead of the device's measurement mode
//!
//! Channels are sampled once per decode tick, so with the default 10 ms tick
//! only oscillators below 50 Hz are resolved without aliasing.

use crate::config::TuningConfig;
use crate::protocol::frequency::TuningReading;
use rustfft::{num_complex::Complex, FftPlanner};
use std::f64::consts::PI;

/// Window function applied before the transform
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WindowFunction {
    /// No windowing
    Rectangular,
    /// Good general purpose
    #[default]
    Hann,
    Hamming,
    /// Lowest side lobes, widest main lobe
    Blackman,
}

impl WindowFunction {
    pub fn all() -> &'static [WindowFunction] {
        &[
            WindowFunction::Rectangular,
            WindowFunction::Hann,
            WindowFunction::Hamming,
            WindowFunction::Blackman,
        ]
    }

    /// Coefficient at position `i` out of `n` samples
    pub fn coefficient(&self, i: usize, n: usize) -> f64 {
        let phase = 2.0 * PI * i as f64 / n as f64;
        match self {
            WindowFunction::Rectangular => 1.0,
            WindowFunction::Hann => 0.5 * (1.0 - phase.cos()),
            WindowFunction::Hamming => 0.54 - 0.46 * phase.cos(),
            // exact zero at the ends can round to -ε
            WindowFunction::Blackman => (0.42 - 0.5 * phase.cos() + 0.08 * (2.0 * phase).cos()).max(0.0),
        }
    }

    pub fn generate(&self, n: usize) -> Vec<f64> {
        (0..n).map(|i| self.coefficient(i, n)).collect()
    }
}

/// Analyzer configuration
#[derive(Debug, Clone)]
pub struct FftConfig {
    pub window: WindowFunction,
    /// Minimum transform size; inputs are zero-padded to a power of two
    pub fft_size: usize,
    /// Subtract the mean before the transform
    pub remove_dc: bool,
}

impl Default for FftConfig {
    fn default() -> Self {
        Self {
            window: WindowFunction::Hann,
            fft_size: 1024,
            remove_dc: true,
        }
    }
}

impl FftConfig {
    pub fn with_size(fft_size: usize) -> Self {
        Self {
            fft_size,
            ..Default::default()
        }
    }

    pub fn window(mut self, window: WindowFunction) -> Self {
        self.window = window;
        self
    }
}

/// One-sided magnitude spectrum
#[derive(Debug, Clone, Default)]
pub struct Spectrum {
    /// Bin center frequencies (Hz)
    pub frequencies: Vec<f64>,
    /// Linear magnitudes
    pub magnitudes: Vec<f64>,
    pub sample_rate: f64,
    pub sample_count: usize,
    /// Hz per bin
    pub resolution: f64,
}

impl Spectrum {
    pub fn is_empty(&self) -> bool {
        self.magnitudes.is_empty()
    }

    /// Strongest bin above DC, as (bin index, magnitude)
    fn peak_bin(&self) -> Option<(usize, f64)> {
        self.magnitudes
            .iter()
            .copied()
            .enumerate()
            .skip(1)
            .max_by(|(_, a), (_, b)| a.total_cmp(b))
            .filter(|&(_, magnitude)| magnitude > 1e-12)
    }

    /// Strongest non-DC frequency, refined by parabolic interpolation
    /// between the neighbouring bins
    pub fn dominant_frequency(&self) -> Option<f64> {
        let (bin, peak) = self.peak_bin()?;
        let offset = match (self.magnitudes.get(bin - 1), self.magnitudes.get(bin + 1)) {
            (Some(&left), Some(&right)) => {
                let denominator = left - 2.0 * peak + right;
                if denominator.abs() > f64::EPSILON {
                    (0.5 * (left - right) / denominator).clamp(-0.5, 0.5)
                } else {
                    0.0
                }
            }
            _ => 0.0,
        };
        Some((bin as f64 + offset) * self.resolution)
    }

    /// (frequency, magnitude) pairs, e.g. for plotting or export
    pub fn points(&self) -> Vec<[f64; 2]> {
        self.frequencies
            .iter()
            .zip(&self.magnitudes)
            .map(|(&f, &m)| [f, m])
            .collect()
    }
}

/// FFT analyzer; keeps planned transforms between calls
pub struct FftAnalyzer {
    planner: FftPlanner<f64>,
    config: FftConfig,
}

impl std::fmt::Debug for FftAnalyzer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FftAnalyzer").field("config", &self.config).finish()
    }
}

impl Default for FftAnalyzer {
    fn default() -> Self {
        Self::new()
    }
}

impl FftAnalyzer {
    pub fn new() -> Self {
        Self::with_config(FftConfig::default())
    }

    pub fn with_config(config: FftConfig) -> Self {
        Self {
            planner: FftPlanner::new(),
            config,
        }
    }

    pub fn config(&self) -> &FftConfig {
        &self.config
    }

    /// Magnitude spectrum of `samples` taken at `sample_rate` Hz
    pub fn spectrum(&mut self, samples: &[f64], sample_rate: f64) -> Spectrum {
        let n = samples.len();
        if n == 0 || sample_rate <= 0.0 {
            return Spectrum {
                sample_rate,
                ..Spectrum::default()
            };
        }

        let fft_size = self.config.fft_size.max(n).next_power_of_two();
        let mean = if self.config.remove_dc {
            samples.iter().sum::<f64>() / n as f64
        } else {
            0.0
        };

        let window = self.config.window.generate(n);
        let mut buffer: Vec<Complex<f64>> = samples
            .iter()
            .zip(&window)
            .map(|(&s, &w)| Complex::new((s - mean) * w, 0.0))
            .collect();
        buffer.resize(fft_size, Complex::new(0.0, 0.0));

        self.planner.plan_fft_forward(fft_size).process(&mut buffer);

        let resolution = sample_rate / fft_size as f64;
        let bins = fft_size / 2 + 1;
        Spectrum {
            frequencies: (0..bins).map(|i| i as f64 * resolution).collect(),
            magnitudes: buffer
                .iter()
                .take(bins)
                .map(|c| 2.0 * c.norm() / n as f64)
                .collect(),
            sample_rate,
            sample_count: n,
            resolution,
        }
    }

    /// Dominant oscillation frequency of a channel, if any
    pub fn dominant_frequency(&mut self, samples: &[f64], sample_rate: f64) -> Option<f64> {
        self.spectrum(samples, sample_rate).dominant_frequency()
    }

    /// Compare a channel's dominant frequency with the oscillator's target
    pub fn tuning_reading(
        &mut self,
        samples: &[f64],
        sample_rate: f64,
        target_hz: f64,
        tuning: &TuningConfig,
    ) -> Option<TuningReading> {
        let measured = self.dominant_frequency(samples, sample_rate)?;
        Some(TuningReading::evaluate(
            target_hz,
            measured,
            tuning.range_hz,
            tuning.tolerance_hz,
        ))
    }
}
