use crate::simulation::{StepReport, TimestepPolicy};

use super::config::InputLagMitigation;

/// Outcome of one pacer iteration.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct FrameReport {
    pub frame_index: u64,
    /// Iterations per second over the frame-timestamp window.
    pub frame_rate: f64,
    /// Wall time handed to the scheduler.
    pub wall_delta: i64,
    pub steps: StepReport,
    /// Time slept before updating.
    pub frame_delay: i64,
    /// Time left before the deadline when the swap was issued.
    pub slack: Option<i64>,
    pub issue_to_present: i64,
    pub missed: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PacerStats {
    pub policy: TimestepPolicy,
    pub mitigation: InputLagMitigation,
    pub update_rate: u32,
    pub refresh_period_us: Option<i64>,
    pub frame_rate: f64,
    pub average_iteration_us: i64,
    pub update_cost_avg_us: i64,
    pub update_cost_max_us: i64,
    pub draw_cost_avg_us: i64,
    pub draw_cost_max_us: i64,
    pub min_slack_us: i64,
    pub predicted_wait_us: i64,
    pub missed_frames: u64,
    pub last: FrameReport,
}
