//! Timed recording of decoded samples
//!
//! A [`SampleRecorder`] captures a fixed number of ticks and exports them as
//! CSV with one row per tick:
//!
//! ```text
//! time_s,ch1_v,ch2_v
//! 0.000,0.012894,0.025788
//! 0.010,0.012894,0.025788
//! ```

use crate::error::{OscNetError, Result, ResultExt};
use crate::protocol::telemetry::TickSamples;
use chrono::{DateTime, Utc};
use std::io::Write;
use std::path::Path;
use std::time::Duration;

/// Records a fixed duration of samples
#[derive(Debug, Clone)]
pub struct SampleRecorder {
    num_channels: usize,
    tick_interval: Duration,
    /// Ticks to capture
    capacity: usize,
    rows: Vec<Vec<f64>>,
    recorded_at: DateTime<Utc>,
}

impl SampleRecorder {
    /// Recorder for `duration` worth of ticks (at least one)
    pub fn new(num_channels: usize, tick_interval: Duration, duration: Duration) -> Self {
        let capacity = if tick_interval.is_zero() {
            1
        } else {
            let interval = tick_interval.as_nanos();
            duration.as_nanos().div_ceil(interval) as usize
        };
        Self::with_ticks(num_channels, tick_interval, capacity)
    }

    pub fn with_ticks(num_channels: usize, tick_interval: Duration, ticks: usize) -> Self {
        Self {
            num_channels,
            tick_interval,
            capacity: ticks.max(1),
            rows: Vec::with_capacity(ticks.max(1)),
            recorded_at: Utc::now(),
        }
    }

    /// Append one tick. Returns `false` once the recording is complete and
    /// the sample was not taken.
    pub fn push(&mut self, values: &[f64]) -> bool {
        if self.is_complete() {
            return false;
        }
        if self.rows.is_empty() {
            self.recorded_at = Utc::now();
        }
        let mut row = values.to_vec();
        row.resize(self.num_channels, 0.0);
        self.rows.push(row);
        if self.is_complete() {
            tracing::info!("Recording complete: {} ticks", self.rows.len());
        }
        true
    }

    pub fn push_tick(&mut self, samples: &TickSamples) -> bool {
        self.push(&samples.values)
    }

    pub fn is_complete(&self) -> bool {
        self.rows.len() >= self.capacity
    }

    /// Fraction recorded, 0.0..=1.0
    pub fn progress(&self) -> f64 {
        self.rows.len() as f64 / self.capacity as f64
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn num_channels(&self) -> usize {
        self.num_channels
    }

    /// Time the first sample was taken
    pub fn recorded_at(&self) -> DateTime<Utc> {
        self.recorded_at
    }

    /// Samples of one channel in tick order
    pub fn channel(&self, channel: usize) -> Option<Vec<f64>> {
        (channel < self.num_channels).then(|| self.rows.iter().map(|row| row[channel]).collect())
    }

    pub fn clear(&mut self) {
        self.rows.clear();
    }

    /// Suggested export file name, e.g. `recording_20240101_120000.csv`
    pub fn default_file_name(&self) -> String {
        format!("recording_{}.csv", self.recorded_at.format("%Y%m%d_%H%M%S"))
    }

    pub fn write_csv<W: Write>(&self, mut writer: W) -> Result<()> {
        let header: Vec<String> = std::iter::once("time_s".to_string())
            .chain((1..=self.num_channels).map(|ch| format!("ch{}_v", ch)))
            .collect();
        writeln!(writer, "{}", header.join(","))?;

        let interval = self.tick_interval.as_secs_f64();
        for (tick, row) in self.rows.iter().enumerate() {
            write!(writer, "{:.3}", tick as f64 * interval)?;
            for value in row {
                write!(writer, ",{:.6}", value)?;
            }
            writeln!(writer)?;
        }
        writer.flush()?;
        Ok(())
    }

    pub fn to_csv(&self) -> Result<String> {
        let mut buf = Vec::new();
        self.write_csv(&mut buf)?;
        String::from_utf8(buf).map_err(|e| OscNetError::Serialization(e.to_string()))
    }

    /// Write the recording to `path`
    pub fn export_csv(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let file = std::fs::File::create(path)
            .map_err(OscNetError::from)
            .with_context(|| format!("Failed to create {}", path.display()))?;
        self.write_csv(std::io::BufWriter::new(file))?;
        tracing::info!("Exported {} ticks to {:?}", self.rows.len(), path);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_duration_to_ticks() {
        let recorder = SampleRecorder::new(2, Duration::from_millis(10), Duration::from_secs(1));
        assert_eq!(recorder.capacity(), 100);
        let recorder = SampleRecorder::new(2, Duration::from_millis(10), Duration::from_millis(25));
        assert_eq!(recorder.capacity(), 3);
    }

    #[test]
    fn test_stops_when_complete() {
        let mut recorder = SampleRecorder::with_ticks(1, Duration::from_millis(10), 2);
        assert!(recorder.push(&[1.0]));
        assert!((recorder.progress() - 0.5).abs() < 1e-12);
        assert!(recorder.push(&[2.0]));
        assert!(recorder.is_complete());
        assert!(!recorder.push(&[3.0]));
        assert_eq!(recorder.channel(0), Some(vec![1.0, 2.0]));
        assert_eq!(recorder.channel(1), None);
    }

    #[test]
    fn test_csv_layout() {
        let mut recorder = SampleRecorder::with_ticks(2, Duration::from_millis(10), 10);
        recorder.push(&[0.5, 1.25]);
        recorder.push_tick(&TickSamples {
            time_index: 7,
            values: vec![3.3, 0.0],
            updated: vec![true, false],
        });

        let csv = recorder.to_csv().unwrap();
        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(lines[0], "time_s,ch1_v,ch2_v");
        assert_eq!(lines[1], "0.000,0.500000,1.250000");
        assert_eq!(lines[2], "0.010,3.300000,0.000000");
        assert_eq!(lines.len(), 3);
    }

    #[test]
    fn test_short_rows_are_padded() {
        let mut recorder = SampleRecorder::with_ticks(3, Duration::from_millis(10), 1);
        recorder.push(&[1.0]);
        assert_eq!(recorder.channel(2), Some(vec![0.0]));
    }

    #[test]
    fn test_export_to_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("capture.csv");
        let mut recorder = SampleRecorder::with_ticks(1, Duration::from_millis(10), 3);
        recorder.push(&[1.0]);
        recorder.export_csv(&path).unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        assert!(text.starts_with("time_s,ch1_v\n"));
        assert!(recorder.default_file_name().starts_with("recording_"));
    }

    #[test]
    fn test_export_to_missing_dir_fails() {
        let dir = tempdir().unwrap();
        let recorder = SampleRecorder::with_ticks(1, Duration::from_millis(10), 1);
        let err = recorder.export_csv(dir.path().join("missing/capture.csv")).unwrap_err();
        assert!(err.to_string().contains("Failed to create"));
    }
}
