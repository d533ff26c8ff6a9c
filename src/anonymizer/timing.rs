use std::time::{Duration, Instant};

/// Frame intervals shorter than this are counted as this, so two frames
/// reported at the same instant cannot produce an infinite FPS
pub const MIN_FRAME_INTERVAL: Duration = Duration::from_millis(1);

/// Rolling latency/throughput counters since process start
#[derive(Debug, Clone)]
pub struct TimingAccumulator {
    frames: u64,
    sum_fps: f64,
    sum_process_ms: f64,
    sum_inference_ms: f64,
    last_frame: Instant,
}

impl TimingAccumulator {
    pub fn new(now: Instant) -> Self {
        Self {
            frames: 0,
            sum_fps: 0.0,
            sum_process_ms: 0.0,
            sum_inference_ms: 0.0,
            last_frame: now,
        }
    }

    /// Frames recorded so far
    pub fn frames(&self) -> u64 {
        self.frames
    }

    /// Record one finished cycle
    ///
    /// `started` is when the cycle began (before inference); processing time
    /// is the wall time of the cycle minus the model's own inference time.
    pub fn record(&mut self, started: Instant, now: Instant, inference_ms: f64) {
        let interval = now
            .saturating_duration_since(self.last_frame)
            .max(MIN_FRAME_INTERVAL);
        let wall_ms = now.saturating_duration_since(started).as_secs_f64() * 1000.0;

        self.frames += 1;
        self.sum_fps += 1.0 / interval.as_secs_f64();
        self.sum_process_ms += wall_ms - inference_ms;
        self.sum_inference_ms += inference_ms;
        self.last_frame = now;
    }

    pub fn mean_inference_ms(&self) -> f64 {
        self.mean(self.sum_inference_ms)
    }

    pub fn mean_process_ms(&self) -> f64 {
        self.mean(self.sum_process_ms)
    }

    pub fn mean_fps(&self) -> f64 {
        self.mean(self.sum_fps)
    }

    fn mean(&self, sum: f64) -> f64 {
        if self.frames == 0 {
            0.0
        } else {
            sum / self.frames as f64
        }
    }

    /// One-line status shown on the overlay
    pub fn summary(&self, pose_count: usize) -> String {
        format!(
            "PoseNet: {:.1}ms Frame IO: {:.2}ms TrueFPS: {:.2} Nposes {}",
            self.mean_inference_ms(),
            self.mean_process_ms(),
            self.mean_fps(),
            pose_count
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_accumulates_means() {
        let t0 = Instant::now();
        let mut timing = TimingAccumulator::new(t0);

        // 50 ms cycles of which 30 ms is inference
        timing.record(t0, t0 + Duration::from_millis(50), 30.0);
        let t1 = t0 + Duration::from_millis(50);
        timing.record(t1, t1 + Duration::from_millis(50), 30.0);

        assert_eq!(timing.frames(), 2);
        assert!((timing.mean_fps() - 20.0).abs() < 1e-6);
        assert!((timing.mean_inference_ms() - 30.0).abs() < 1e-9);
        assert!((timing.mean_process_ms() - 20.0).abs() < 1e-6);
    }

    #[test]
    fn test_zero_interval_is_finite() {
        let t0 = Instant::now();
        let mut timing = TimingAccumulator::new(t0);
        timing.record(t0, t0, 0.0);
        assert!(timing.mean_fps().is_finite());
        assert!((timing.mean_fps() - 1000.0).abs() < 1e-6);
    }

    #[test]
    fn test_summary_format() {
        let t0 = Instant::now();
        let mut timing = TimingAccumulator::new(t0);
        assert_eq!(
            timing.summary(0),
            "PoseNet: 0.0ms Frame IO: 0.00ms TrueFPS: 0.00 Nposes 0"
        );
        timing.record(t0, t0 + Duration::from_millis(40), 12.0);
        assert_eq!(
            timing.summary(3),
            "PoseNet: 12.0ms Frame IO: 28.00ms TrueFPS: 25.00 Nposes 3"
        );
    }
}
