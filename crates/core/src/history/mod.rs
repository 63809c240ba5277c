mod buffer;

pub use buffer::RollingSampleBuffer;

/// Seed for cost and duration histories before the loop has warmed up.
pub const WARMUP_SENTINEL: i64 = 1_000_000;

/// Slots in frame-timestamp, iteration-duration and slack histories.
pub const FRAME_WINDOW: usize = 16;

/// Slots in update-cost and draw-cost histories.
pub const COST_WINDOW: usize = 6;
