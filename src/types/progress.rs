use std::fmt::Display;

use super::VideoId;

/// Statistics of one run.
///
/// `processed` counts every candidate handled so far, whether it was skipped,
/// downloaded, or failed. Skips are excluded from the success rate.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DownloadProgress {
    pub total: usize,
    pub processed: usize,
    pub skipped: usize,
    pub failed: usize,
    pub current: Option<VideoId>,
}

impl DownloadProgress {
    pub fn new(total: usize) -> Self {
        Self {
            total,
            ..Self::default()
        }
    }

    /// Number of download attempts that ended with a saved subtitle
    pub fn succeeded(&self) -> usize {
        self.processed - self.skipped - self.failed
    }

    /// Number of candidates that still have to be handled
    pub fn remaining(&self) -> usize {
        self.total - self.processed
    }

    /// Percentage of successful download attempts.
    ///
    /// With no attempt at all it is 100 if everything was skipped
    /// (nothing left to do) and 0 otherwise.
    pub fn success_rate(&self) -> f64 {
        let attempts = self.succeeded() + self.failed;
        if attempts == 0 {
            return if self.skipped > 0 { 100.0 } else { 0.0 };
        }
        self.succeeded() as f64 / attempts as f64 * 100.0
    }

    pub(crate) fn record_skip(&mut self) {
        self.processed += 1;
        self.skipped += 1;
    }

    pub(crate) fn record_success(&mut self) {
        self.processed += 1;
    }

    pub(crate) fn record_failure(&mut self) {
        self.processed += 1;
        self.failed += 1;
    }
}

impl Display for DownloadProgress {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}/{} processed (skipped: {}, failed: {}, success rate: {:.1}%)",
            self.processed,
            self.total,
            self.skipped,
            self.failed,
            self.success_rate()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn success_rate_excludes_skips() {
        let mut progress = DownloadProgress::new(10);
        for _ in 0..7 {
            progress.record_success();
        }
        for _ in 0..2 {
            progress.record_failure();
        }
        progress.record_skip();

        assert_eq!(progress.processed, 10);
        assert_eq!(progress.succeeded(), 7);
        assert_eq!(progress.remaining(), 0);
        assert_eq!(format!("{:.1}", progress.success_rate()), "77.8");
    }

    #[test]
    fn success_rate_without_attempts() {
        assert_eq!(DownloadProgress::new(0).success_rate(), 0.0);

        let mut progress = DownloadProgress::new(2);
        progress.record_skip();
        progress.record_skip();
        assert_eq!(progress.success_rate(), 100.0);
    }

    #[test]
    fn display_summary() {
        let mut progress = DownloadProgress::new(3);
        progress.record_success();
        progress.record_failure();
        assert_eq!(
            progress.to_string(),
            "2/3 processed (skipped: 0, failed: 1, success rate: 50.0%)"
        );
    }
}
