use std::fmt;

use crate::error::ConfigError;
use crate::simulation::TimestepPolicy;
use crate::sync::DEFAULT_SAFETY_MARGIN;

/// Extra synchronization traded for lower input-to-photon latency. Each level
/// includes the ones before it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub enum InputLagMitigation {
    #[default]
    None,
    /// GPU completion barrier right before and after presenting.
    GpuSync,
    /// GPU sync plus a predicted sleep before updating.
    FrameDelay,
}

impl InputLagMitigation {
    pub const ALL: [Self; 3] = [Self::None, Self::GpuSync, Self::FrameDelay];

    pub fn name(self) -> &'static str {
        match self {
            Self::None => "None",
            Self::GpuSync => "GPU sync",
            Self::FrameDelay => "Frame delay",
        }
    }

    pub fn next(self) -> Self {
        match self {
            Self::None => Self::GpuSync,
            Self::GpuSync => Self::FrameDelay,
            Self::FrameDelay => Self::None,
        }
    }

    pub fn gpu_sync(self) -> bool {
        self >= Self::GpuSync
    }

    pub fn frame_delay(self) -> bool {
        self >= Self::FrameDelay
    }
}

impl fmt::Display for InputLagMitigation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PacerConfig {
    pub update_rate: u32,
    pub policy: TimestepPolicy,
    pub mitigation: InputLagMitigation,
    /// Left unslept before every deadline and spun instead.
    pub sleep_margin_us: i64,
    /// Subtracted from the worst observed slack when predicting a frame delay.
    pub safety_margin_us: i64,
    /// Minimum time every simulation update is made to take. Load testing only.
    pub simulated_update_cost_us: i64,
    /// Minimum time every draw is made to take. Load testing only.
    pub simulated_draw_cost_us: i64,
}

impl Default for PacerConfig {
    fn default() -> Self {
        Self {
            update_rate: 120,
            policy: TimestepPolicy::Fixed,
            mitigation: InputLagMitigation::None,
            sleep_margin_us: 1_000,
            safety_margin_us: DEFAULT_SAFETY_MARGIN,
            simulated_update_cost_us: 0,
            simulated_draw_cost_us: 0,
        }
    }
}

impl PacerConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.update_rate == 0 {
            return Err(ConfigError::ZeroUpdateRate);
        }

        let durations = [
            ("sleep margin", self.sleep_margin_us),
            ("safety margin", self.safety_margin_us),
            ("simulated update cost", self.simulated_update_cost_us),
            ("simulated draw cost", self.simulated_draw_cost_us),
        ];
        for (name, value) in durations {
            if value < 0 {
                return Err(ConfigError::NegativeDuration { name, value });
            }
        }

        Ok(())
    }
}
