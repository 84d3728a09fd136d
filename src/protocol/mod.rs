//! Device wire protocol
//!
//! - [`matrix`] - coupling matrix frames sent to the device
//! - [`telemetry`] - binary sample stream received from the device
//! - [`frequency`] - frequency measurement mode

pub mod frequency;
pub mod matrix;
pub mod telemetry;

pub use frequency::{FrequencyLineParser, TuningAdvice, TuningReading, TuningSeverity};
pub use matrix::{build_matrix, CouplingMatrix};
pub use telemetry::{AdcByteOrder, FramingPolicy, SampleStreamDecoder, TickSamples};
