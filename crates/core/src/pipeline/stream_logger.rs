use std::collections::HashMap;
use std::time::Instant;

/// Observes a streaming session: frame flow counters and stage timings.
///
/// Lets the render loop stay ignorant of where statistics end up
/// (log output, tests, nothing at all).
pub trait StreamLogger {
    /// A frame was read from the capture device.
    fn frame_captured(&mut self, index: usize);

    /// The worker was still busy, so the frame was not submitted.
    fn frame_dropped(&mut self, index: usize);

    /// A new result replaced the one being drawn.
    fn result_received(&mut self, detections: usize);

    /// Record how long a named render-loop stage took.
    fn timing(&mut self, stage: &str, duration_ms: f64);

    /// Emit an end-of-session summary. Default: no-op.
    fn summary(&self) {}
}

/// Discards every event.
pub struct NullStreamLogger;

impl StreamLogger for NullStreamLogger {
    fn frame_captured(&mut self, _index: usize) {}
    fn frame_dropped(&mut self, _index: usize) {}
    fn result_received(&mut self, _detections: usize) {}
    fn timing(&mut self, _stage: &str, _duration_ms: f64) {}
}

/// Accumulates counters and timings and reports them through `log`.
pub struct LogStreamLogger {
    started: Instant,
    captured: usize,
    dropped: usize,
    results: usize,
    detections: usize,
    timings: HashMap<String, Vec<f64>>,
}

impl LogStreamLogger {
    pub fn new() -> Self {
        Self {
            started: Instant::now(),
            captured: 0,
            dropped: 0,
            results: 0,
            detections: 0,
            timings: HashMap::new(),
        }
    }

    pub fn frames_captured(&self) -> usize {
        self.captured
    }

    pub fn frames_dropped(&self) -> usize {
        self.dropped
    }

    pub fn results_received(&self) -> usize {
        self.results
    }

    pub fn timings_for(&self, stage: &str) -> Option<&[f64]> {
        self.timings.get(stage).map(|v| v.as_slice())
    }

    /// Returns the formatted summary, or `None` if nothing was captured.
    pub fn summary_string(&self) -> Option<String> {
        if self.captured == 0 {
            return None;
        }
        let elapsed_s = self.started.elapsed().as_secs_f64();
        let submitted = self.captured - self.dropped.min(self.captured);
        let mut lines = vec![
            format!("Stream summary ({} frames, {elapsed_s:.1}s):", self.captured),
            format!(
                "  submitted {submitted}, dropped {} ({:.1}%)",
                self.dropped,
                self.dropped as f64 / self.captured as f64 * 100.0
            ),
            format!(
                "  results {}, detections {}",
                self.results, self.detections
            ),
        ];

        let mut stages: Vec<_> = self.timings.keys().collect();
        stages.sort();
        for stage in stages {
            let durations = &self.timings[stage];
            let avg = durations.iter().sum::<f64>() / durations.len().max(1) as f64;
            lines.push(format!("  {stage:8}: avg {avg:6.1}ms"));
        }

        if elapsed_s > 0.0 {
            lines.push(format!(
                "  Display rate: {:.1} fps",
                self.captured as f64 / elapsed_s
            ));
        }
        Some(lines.join("\n"))
    }
}

impl Default for LogStreamLogger {
    fn default() -> Self {
        Self::new()
    }
}

impl StreamLogger for LogStreamLogger {
    fn frame_captured(&mut self, index: usize) {
        self.captured += 1;
        log::trace!("Captured frame {index}");
    }

    fn frame_dropped(&mut self, index: usize) {
        self.dropped += 1;
        log::trace!("Dropped frame {index}: worker busy");
    }

    fn result_received(&mut self, detections: usize) {
        self.results += 1;
        self.detections += detections;
        log::debug!("Result received with {detections} detections");
    }

    fn timing(&mut self, stage: &str, duration_ms: f64) {
        self.timings
            .entry(stage.to_string())
            .or_default()
            .push(duration_ms);
    }

    fn summary(&self) {
        if let Some(text) = self.summary_string() {
            log::info!("\n\n{text}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_null_logger_accepts_everything() {
        let mut logger = NullStreamLogger;
        logger.frame_captured(0);
        logger.frame_dropped(0);
        logger.result_received(3);
        logger.timing("render", 1.0);
        logger.summary();
    }

    #[test]
    fn test_counts_frames_and_results() {
        let mut logger = LogStreamLogger::new();
        for i in 0..4 {
            logger.frame_captured(i);
        }
        logger.frame_dropped(1);
        logger.frame_dropped(2);
        logger.result_received(2);
        logger.result_received(1);

        assert_eq!(logger.frames_captured(), 4);
        assert_eq!(logger.frames_dropped(), 2);
        assert_eq!(logger.results_received(), 2);
        assert_eq!(logger.detections, 3);
    }

    #[test]
    fn test_timings_are_recorded_per_stage() {
        let mut logger = LogStreamLogger::new();
        logger.timing("render", 2.0);
        logger.timing("render", 4.0);
        logger.timing("display", 1.0);

        assert_eq!(logger.timings_for("render"), Some(&[2.0, 4.0][..]));
        assert_eq!(logger.timings_for("display"), Some(&[1.0][..]));
        assert!(logger.timings_for("capture").is_none());
    }

    #[test]
    fn test_summary_none_without_frames() {
        assert!(LogStreamLogger::new().summary_string().is_none());
    }

    #[test]
    fn test_summary_reports_drop_rate_and_stages() {
        let mut logger = LogStreamLogger::new();
        for i in 0..4 {
            logger.frame_captured(i);
        }
        logger.frame_dropped(3);
        logger.timing("render", 3.0);

        let summary = logger.summary_string().unwrap();
        assert!(summary.contains("Stream summary (4 frames"));
        assert!(summary.contains("submitted 3, dropped 1 (25.0%)"));
        assert!(summary.contains("render"));
    }
}
