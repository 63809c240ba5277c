pub mod error;
pub mod history;
pub mod pacer;
pub mod simulation;
pub mod sync;
pub mod time;

pub use error::ConfigError;
pub use history::RollingSampleBuffer;
pub use pacer::{FramePacer, FrameReport, InputLagMitigation, PacerConfig, PacerStats, Presenter};
pub use simulation::{InputSource, STEP_TICKS, Simulation, StepReport, TimestepPolicy, UpdateScheduler};
pub use sync::SyncPredictor;
pub use time::{Clock, ManualClock, MonotonicClock};
