mod contract;
mod policy;
mod scheduler;

pub use contract::{InputSource, Simulation};
pub use policy::TimestepPolicy;
pub use scheduler::{STEP_TICKS, StepReport, UpdateScheduler};
