//! Signal analysis of decoded channels
//!
//! - Magnitude spectrum of a channel history
//! - Dominant frequency estimation

pub mod fft;

pub use fft::{FftAnalyzer, FftConfig, Spectrum, WindowFunction};
