//! Frame time sampling shared by every render strategy.

use std::time::Instant;

use crate::stage::LightCount;

/// Number of frame deltas accumulated before a summary is emitted.
pub const MAX_SAMPLES: u32 = 60;

/// Aggregate over one full sample window.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameSummary {
    pub avg_ms: f32,
    pub fps: f32,
    pub min_ms: f32,
    pub max_ms: f32,
}

/// Accumulates frame times and reduces them to a [`FrameSummary`] once per
/// [`MAX_SAMPLES`] window. Min and max track the current window only and
/// reset with it.
pub struct FrameProfiler {
    label: &'static str,
    sample_count: u32,
    total_ms: f32,
    min_ms: f32,
    max_ms: f32,
    last_frame: Option<Instant>,
}

impl FrameProfiler {
    pub fn new(label: &'static str) -> Self {
        Self {
            label,
            sample_count: 0,
            total_ms: 0.0,
            min_ms: f32::INFINITY,
            max_ms: 0.0,
            last_frame: None,
        }
    }

    /// Adds one frame time in milliseconds. Returns the window summary when
    /// the window fills; the accumulators start over afterwards.
    pub fn record(&mut self, frame_time_ms: f32) -> Option<FrameSummary> {
        self.sample_count += 1;
        self.total_ms += frame_time_ms;
        self.min_ms = self.min_ms.min(frame_time_ms);
        self.max_ms = self.max_ms.max(frame_time_ms);

        if self.sample_count < MAX_SAMPLES {
            return None;
        }

        let avg_ms = self.total_ms / self.sample_count as f32;
        let summary = FrameSummary {
            avg_ms,
            fps: if avg_ms > 0.0 { 1000.0 / avg_ms } else { 0.0 },
            min_ms: self.min_ms,
            max_ms: self.max_ms,
        };
        self.sample_count = 0;
        self.total_ms = 0.0;
        self.min_ms = f32::INFINITY;
        self.max_ms = 0.0;
        Some(summary)
    }

    /// Measures the interval since the previous call and records it. The
    /// first call only arms the timer; no sample is taken.
    pub fn sample(&mut self) -> Option<FrameSummary> {
        let now = Instant::now();
        let summary = match self.last_frame {
            Some(previous) => self.record(now.duration_since(previous).as_secs_f32() * 1000.0),
            None => None,
        };
        self.last_frame = Some(now);
        summary
    }

    /// Samples the frame time and logs the summary line whenever a window
    /// completes.
    pub fn sample_and_log(&mut self, light_count: LightCount) {
        if let Some(summary) = self.sample() {
            log::info!(
                "{}: {} lights, avg {:.2} ms ({:.1} fps), min {:.2} ms, max {:.2} ms",
                self.label,
                light_count,
                summary.avg_ms,
                summary.fps,
                summary.min_ms,
                summary.max_ms,
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_summary_before_window_fills() {
        let mut profiler = FrameProfiler::new("test");
        for _ in 0..MAX_SAMPLES - 1 {
            assert_eq!(profiler.record(16.0), None);
        }
        assert!(profiler.record(16.0).is_some());
    }

    #[test]
    fn summary_aggregates_the_window() {
        let mut profiler = FrameProfiler::new("test");
        let mut summary = None;
        for i in 0..MAX_SAMPLES {
            let ms = if i % 2 == 0 { 10.0 } else { 20.0 };
            summary = profiler.record(ms);
        }
        let summary = summary.unwrap();
        assert!((summary.avg_ms - 15.0).abs() < 1e-4);
        assert_eq!(summary.min_ms, 10.0);
        assert_eq!(summary.max_ms, 20.0);
        assert!((summary.fps - 1000.0 / 15.0).abs() < 1e-2);
    }

    #[test]
    fn extremes_reset_between_windows() {
        let mut profiler = FrameProfiler::new("test");
        for _ in 0..MAX_SAMPLES - 1 {
            profiler.record(5.0);
        }
        let first = profiler.record(50.0).unwrap();
        assert_eq!(first.max_ms, 50.0);

        let mut second = None;
        for _ in 0..MAX_SAMPLES {
            second = profiler.record(8.0);
        }
        let second = second.unwrap();
        assert_eq!(second.min_ms, 8.0);
        assert_eq!(second.max_ms, 8.0);
    }

    #[test]
    fn first_sample_only_arms_the_timer() {
        let mut profiler = FrameProfiler::new("test");
        assert_eq!(profiler.sample(), None);
    }

    #[test]
    fn light_count_displays_sentinel() {
        assert_eq!(LightCount::Known(500).to_string(), "500");
        assert_eq!(LightCount::Unknown.to_string(), "unknown");
    }
}
