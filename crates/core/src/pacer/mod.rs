mod config;
mod frame;
mod metered;
mod presenter;
mod stats;

pub use config::{InputLagMitigation, PacerConfig};
pub use frame::FramePacer;
pub use presenter::Presenter;
pub use stats::{FrameReport, PacerStats};
