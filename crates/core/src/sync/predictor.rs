use crate::history::{FRAME_WINDOW, RollingSampleBuffer};

pub const DEFAULT_SAFETY_MARGIN: i64 = 1_000;

/// True when a swap took at least 10% longer than one refresh period to be
/// presented.
pub fn exceeds_deadline(issue_to_present: i64, refresh_period: i64) -> bool {
    issue_to_present.saturating_mul(10) >= refresh_period.saturating_mul(11)
}

/// Predicts how long the loop can sleep before updating without pushing the
/// swap past the presentation deadline.
///
/// The prediction is the worst (smallest) slack seen over the window, so a
/// single slow frame shrinks the wait for the whole window.
#[derive(Debug, Clone)]
pub struct SyncPredictor {
    slack: RollingSampleBuffer<i64, FRAME_WINDOW>,
    safety_margin: i64,
    missed: bool,
    refresh_period: Option<i64>,
}

impl Default for SyncPredictor {
    fn default() -> Self {
        Self::new(DEFAULT_SAFETY_MARGIN)
    }
}

impl SyncPredictor {
    pub fn new(safety_margin: i64) -> Self {
        Self {
            // Zero slack keeps the first waits non-positive until real
            // samples arrive.
            slack: RollingSampleBuffer::filled(0),
            safety_margin,
            missed: false,
            refresh_period: None,
        }
    }

    pub fn safety_margin(&self) -> i64 {
        self.safety_margin
    }

    pub fn set_safety_margin(&mut self, safety_margin: i64) {
        self.safety_margin = safety_margin;
    }

    pub fn record_slack(&mut self, remaining: i64) {
        self.slack.push(remaining);
    }

    pub fn min_slack(&self) -> i64 {
        self.slack.minimum()
    }

    pub fn predictive_wait(&self) -> i64 {
        self.slack.minimum() - self.safety_margin
    }

    /// The wait to apply this iteration, if any. Suppressed for one iteration
    /// after a miss so timing can resynchronize.
    pub fn frame_delay(&self) -> Option<i64> {
        if self.missed {
            return None;
        }
        Some(self.predictive_wait()).filter(|&wait| wait > 0)
    }

    pub fn observe_outcome(&mut self, issue_to_present: i64, refresh_period: i64) -> bool {
        self.missed = exceeds_deadline(issue_to_present, refresh_period);
        if self.missed {
            log::trace!(
                "missed sync: {}µs from swap to present, period {}µs",
                issue_to_present,
                refresh_period
            );
        }
        self.missed
    }

    pub fn missed(&self) -> bool {
        self.missed
    }

    pub fn mark_missed(&mut self) {
        self.missed = true;
    }

    pub fn clear_missed(&mut self) {
        self.missed = false;
    }

    pub fn refresh_period(&self) -> Option<i64> {
        self.refresh_period
    }

    pub fn set_refresh_period(&mut self, refresh_period: Option<i64>) {
        self.refresh_period = refresh_period;
    }

    pub fn reset(&mut self) {
        self.slack.fill(0);
        self.missed = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn outcome_threshold_is_ten_percent_over_period() {
        let mut predictor = SyncPredictor::default();

        assert!(predictor.observe_outcome(12_000, 10_000));
        assert!(predictor.missed());

        assert!(!predictor.observe_outcome(10_500, 10_000));
        assert!(!predictor.missed());

        assert!(predictor.observe_outcome(11_000, 10_000));
    }

    #[test]
    fn wait_uses_worst_slack_minus_margin() {
        let mut predictor = SyncPredictor::new(1_000);
        for slack in [9_000, 8_000, 12_000] {
            predictor.record_slack(slack);
        }
        // Unwarmed slots still hold zero.
        assert_eq!(predictor.predictive_wait(), -1_000);
        assert_eq!(predictor.frame_delay(), None);

        for _ in 0..FRAME_WINDOW {
            predictor.record_slack(9_000);
        }
        predictor.record_slack(6_500);
        assert_eq!(predictor.predictive_wait(), 5_500);
        assert_eq!(predictor.frame_delay(), Some(5_500));
    }

    #[test]
    fn miss_bypasses_one_prediction() {
        let mut predictor = SyncPredictor::new(1_000);
        for _ in 0..FRAME_WINDOW {
            predictor.record_slack(5_000);
        }

        predictor.observe_outcome(20_000, 16_667);
        assert_eq!(predictor.frame_delay(), None);

        predictor.observe_outcome(4_000, 16_667);
        assert_eq!(predictor.frame_delay(), Some(4_000));
    }

    #[test]
    fn reset_forgets_slack_and_miss() {
        let mut predictor = SyncPredictor::new(500);
        for _ in 0..FRAME_WINDOW {
            predictor.record_slack(5_000);
        }
        predictor.mark_missed();

        predictor.reset();

        assert!(!predictor.missed());
        assert_eq!(predictor.min_slack(), 0);
    }
}
