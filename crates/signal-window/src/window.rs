//! Overlapping Window Segmentation

use crate::{RawSignal, WindowError};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// Windowing configuration
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WindowConfig {
    /// Window length in seconds (default: 1.0)
    pub window_size_sec: f64,
    /// Sample rate of the incoming signal in Hz (default: 100)
    pub sample_rate_hz: f64,
    /// Fraction of each window shared with the next one, in [0, 1) (default: 0.5)
    pub overlap: f64,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            window_size_sec: 1.0,
            sample_rate_hz: 100.0,
            overlap: 0.5,
        }
    }
}

impl WindowConfig {
    /// Check ranges of every field
    pub fn validate(&self) -> Result<(), WindowError> {
        if !(self.sample_rate_hz.is_finite() && self.sample_rate_hz > 0.0) {
            return Err(WindowError::InvalidSampleRate(self.sample_rate_hz));
        }
        if !(self.window_size_sec.is_finite() && self.window_size_sec > 0.0) {
            return Err(WindowError::InvalidConfig(format!(
                "window_size_sec must be positive, got {}",
                self.window_size_sec
            )));
        }
        if !(0.0..1.0).contains(&self.overlap) {
            return Err(WindowError::InvalidConfig(format!(
                "overlap must be in [0, 1), got {}",
                self.overlap
            )));
        }
        Ok(())
    }
}

/// Slices a signal into fixed-length windows at a fixed stride
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Windower {
    window_samples: usize,
    step: usize,
}

impl Windower {
    /// Create a windower from a time-based configuration
    pub fn new(config: &WindowConfig) -> Result<Self, WindowError> {
        config.validate()?;

        let window_samples = (config.window_size_sec * config.sample_rate_hz).round() as usize;
        if window_samples == 0 {
            return Err(WindowError::InvalidConfig(format!(
                "{}s at {}Hz yields an empty window",
                config.window_size_sec, config.sample_rate_hz
            )));
        }
        let step = (window_samples as f64 * (1.0 - config.overlap)).round() as usize;

        Ok(Self::from_samples(window_samples, step))
    }

    /// Create a windower from sample counts. A stride of 0 is coerced to 1,
    /// as is a window length of 0.
    pub fn from_samples(window_samples: usize, step: usize) -> Self {
        Self {
            window_samples: window_samples.max(1),
            step: step.max(1),
        }
    }

    /// Samples per window
    pub fn window_samples(&self) -> usize {
        self.window_samples
    }

    /// Stride between window starts, in samples
    pub fn step(&self) -> usize {
        self.step
    }

    /// Segment a signal into full-length windows.
    ///
    /// A signal shorter than one window yields an empty segmentation whose
    /// `is_too_short()` reports the condition.
    pub fn segment<'a>(&self, signal: &'a RawSignal) -> Segments<'a> {
        let segments = Segments {
            samples: signal.samples(),
            sample_rate_hz: signal.sample_rate_hz(),
            window_samples: self.window_samples,
            step: self.step,
        };

        if segments.is_too_short() {
            warn!(
                "Signal of {} samples is shorter than the {}-sample analysis window",
                signal.len(),
                self.window_samples
            );
        } else {
            debug!(
                "Segmenting {} samples into {} windows of {} (step {})",
                signal.len(),
                segments.len(),
                self.window_samples,
                self.step
            );
        }

        segments
    }

    /// Like `segment`, but a too-short signal is an error
    pub fn segment_checked<'a>(&self, signal: &'a RawSignal) -> Result<Segments<'a>, WindowError> {
        if signal.len() < self.window_samples {
            return Err(WindowError::SignalTooShort {
                len: signal.len(),
                window_samples: self.window_samples,
            });
        }
        Ok(self.segment(signal))
    }
}

/// Lazy, restartable set of windows over one signal
#[derive(Debug, Clone, Copy)]
pub struct Segments<'a> {
    samples: &'a [f64],
    sample_rate_hz: f64,
    window_samples: usize,
    step: usize,
}

impl<'a> Segments<'a> {
    /// Number of full windows
    pub fn len(&self) -> usize {
        if self.samples.len() < self.window_samples {
            0
        } else {
            (self.samples.len() - self.window_samples) / self.step + 1
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// True when the signal cannot hold a single window
    pub fn is_too_short(&self) -> bool {
        self.samples.len() < self.window_samples
    }

    /// Iterate from the first window; may be called any number of times
    pub fn iter(&self) -> WindowIter<'a> {
        WindowIter {
            segments: *self,
            start: 0,
        }
    }
}

impl<'a> IntoIterator for Segments<'a> {
    type Item = Window<'a>;
    type IntoIter = WindowIter<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<'a> IntoIterator for &Segments<'a> {
    type Item = Window<'a>;
    type IntoIter = WindowIter<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// A contiguous full-length slice of a signal
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Window<'a> {
    start: usize,
    samples: &'a [f64],
    sample_rate_hz: f64,
}

impl<'a> Window<'a> {
    /// Offset of the first sample within the signal
    pub fn start(&self) -> usize {
        self.start
    }

    pub fn samples(&self) -> &'a [f64] {
        self.samples
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn sample_rate_hz(&self) -> f64 {
        self.sample_rate_hz
    }

    /// Start time relative to the signal start (seconds)
    pub fn start_time_sec(&self) -> f64 {
        self.start as f64 / self.sample_rate_hz
    }
}

/// Iterator over the windows of a `Segments`
#[derive(Debug, Clone)]
pub struct WindowIter<'a> {
    segments: Segments<'a>,
    start: usize,
}

impl<'a> Iterator for WindowIter<'a> {
    type Item = Window<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        let end = self.start.checked_add(self.segments.window_samples)?;
        if end > self.segments.samples.len() {
            return None;
        }

        let window = Window {
            start: self.start,
            samples: &self.segments.samples[self.start..end],
            sample_rate_hz: self.segments.sample_rate_hz,
        };
        self.start = self.start.saturating_add(self.segments.step);
        Some(window)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let len = self.segments.samples.len();
        let remaining = match self.start.checked_add(self.segments.window_samples) {
            Some(end) if end <= len => (len - end) / self.segments.step + 1,
            _ => 0,
        };
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for WindowIter<'_> {}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn ramp(len: usize) -> RawSignal {
        RawSignal::new((0..len).map(|i| i as f64).collect(), 100.0).unwrap()
    }

    #[test]
    fn test_default_config_sizes() {
        let windower = Windower::new(&WindowConfig::default()).unwrap();
        assert_eq!(windower.window_samples(), 100);
        assert_eq!(windower.step(), 50);
    }

    #[test]
    fn test_window_starts_and_count() {
        let windower = Windower::new(&WindowConfig::default()).unwrap();
        let signal = ramp(300);
        let segments = windower.segment(&signal);

        let starts: Vec<usize> = segments.iter().map(|w| w.start()).collect();
        assert_eq!(starts, vec![0, 50, 100, 150, 200]);
        assert_eq!(segments.len(), 5);
        assert_eq!(segments.iter().len(), 5);
    }

    #[test]
    fn test_final_window_ends_at_signal_end() {
        let windower = Windower::from_samples(100, 50);
        let signal = ramp(300);
        let last = windower.segment(&signal).iter().last().unwrap();
        assert_eq!(last.samples().last().copied(), Some(299.0));
    }

    #[test]
    fn test_partial_tail_dropped() {
        let windower = Windower::from_samples(100, 50);
        let signal = ramp(349);
        let segments = windower.segment(&signal);
        assert_eq!(segments.len(), 5);
        assert!(segments.iter().all(|w| w.len() == 100));
    }

    #[test]
    fn test_too_short_signal() {
        let windower = Windower::from_samples(100, 50);
        let signal = ramp(99);
        let segments = windower.segment(&signal);
        assert!(segments.is_empty());
        assert!(segments.is_too_short());
        assert_eq!(segments.iter().count(), 0);

        match windower.segment_checked(&signal) {
            Err(WindowError::SignalTooShort { len, window_samples }) => {
                assert_eq!(len, 99);
                assert_eq!(window_samples, 100);
            }
            other => panic!("expected SignalTooShort, got {:?}", other),
        }
    }

    #[test]
    fn test_empty_signal() {
        let windower = Windower::from_samples(10, 5);
        let signal = RawSignal::new(Vec::new(), 50.0).unwrap();
        assert!(windower.segment(&signal).is_too_short());
    }

    #[test]
    fn test_zero_stride_coerced() {
        let windower = Windower::from_samples(4, 0);
        assert_eq!(windower.step(), 1);

        // Overlap close to one rounds the stride down to zero
        let config = WindowConfig {
            window_size_sec: 0.04,
            sample_rate_hz: 100.0,
            overlap: 0.9,
        };
        assert_eq!(Windower::new(&config).unwrap().step(), 1);
    }

    #[test]
    fn test_segments_restartable() {
        let windower = Windower::from_samples(10, 3);
        let signal = ramp(40);
        let segments = windower.segment(&signal);
        let first: Vec<usize> = segments.iter().map(|w| w.start()).collect();
        let second: Vec<usize> = (&segments).into_iter().map(|w| w.start()).collect();
        assert_eq!(first, second);
    }

    #[test]
    fn test_invalid_configs() {
        let bad_overlap = WindowConfig {
            overlap: 1.0,
            ..Default::default()
        };
        assert!(Windower::new(&bad_overlap).is_err());

        let bad_rate = WindowConfig {
            sample_rate_hz: 0.0,
            ..Default::default()
        };
        assert!(matches!(
            Windower::new(&bad_rate),
            Err(WindowError::InvalidSampleRate(_))
        ));

        let empty_window = WindowConfig {
            window_size_sec: 0.001,
            sample_rate_hz: 100.0,
            overlap: 0.0,
        };
        assert!(Windower::new(&empty_window).is_err());
    }

    #[test]
    fn test_window_start_time() {
        let windower = Windower::from_samples(100, 50);
        let signal = ramp(250);
        let times: Vec<f64> = windower.segment(&signal).iter().map(|w| w.start_time_sec()).collect();
        assert_eq!(times, vec![0.0, 0.5, 1.0, 1.5]);
    }

    proptest! {
        #[test]
        fn prop_windows_are_full_length(
            len in 0usize..600,
            window_samples in 1usize..120,
            step in 0usize..80,
        ) {
            let windower = Windower::from_samples(window_samples, step);
            let signal = ramp(len);
            let segments = windower.segment(&signal);

            let mut count = 0;
            for window in &segments {
                prop_assert_eq!(window.len(), window_samples);
                prop_assert!(window.start() + window_samples <= len);
                count += 1;
            }
            prop_assert_eq!(count, segments.len());
            if len < window_samples {
                prop_assert_eq!(count, 0);
            }
        }
    }
}
