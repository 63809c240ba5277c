mod clock;
mod wait;

pub use clock::{Clock, ManualClock, MonotonicClock};
pub use wait::{spin_until, wait_until};

pub const MICROS_PER_SECOND: i64 = 1_000_000;
