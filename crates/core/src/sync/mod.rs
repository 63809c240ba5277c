mod predictor;

pub use predictor::{DEFAULT_SAFETY_MARGIN, SyncPredictor, exceeds_deadline};
