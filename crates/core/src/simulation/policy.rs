use std::fmt;

use super::scheduler::{STEP_TICKS, StepDriver};

/// How leftover time after the whole steps is reconciled with the display.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum TimestepPolicy {
    /// Whole steps only; the remainder waits for the next frame.
    #[default]
    Fixed,
    /// Whole steps plus a discarded preview of the remainder.
    Interpolation,
    /// Whole steps with drift carry; commits a step early when the next frame
    /// would complete it anyway.
    Loose,
    /// Loose commits, falling back to a preview when a commit is not due.
    LooseInterpolation,
}

impl TimestepPolicy {
    pub const ALL: [Self; 4] = [
        Self::Fixed,
        Self::Interpolation,
        Self::Loose,
        Self::LooseInterpolation,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Self::Fixed => "Fixed",
            Self::Interpolation => "Interpolation",
            Self::Loose => "Loose",
            Self::LooseInterpolation => "Loose interpolation",
        }
    }

    pub fn next(self) -> Self {
        let index = Self::ALL.iter().position(|&p| p == self).unwrap_or(0);
        Self::ALL[(index + 1) % Self::ALL.len()]
    }

    pub(crate) fn integrator<T: Copy>(self) -> Box<dyn Integrator<T>> {
        match self {
            Self::Fixed => Box::new(Fixed),
            Self::Interpolation => Box::new(Interpolated),
            Self::Loose => Box::new(Loose),
            Self::LooseInterpolation => Box::new(LooseInterpolated),
        }
    }
}

impl fmt::Display for TimestepPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A timestep policy's contract with the scheduler.
///
/// Every `advance` runs: optional baseline restore, the whole-step loop,
/// `save_state`, then `settle` for whatever is left in the accumulator.
pub(crate) trait Integrator<T> {
    fn restores_baseline(&self) -> bool;

    fn folds_carry(&self) -> bool {
        false
    }

    fn previews(&self) -> bool {
        false
    }

    fn settle(&self, _driver: &mut StepDriver<'_, T>) {}
}

struct Fixed;

impl<T: Copy> Integrator<T> for Fixed {
    fn restores_baseline(&self) -> bool {
        false
    }
}

struct Interpolated;

impl<T: Copy> Integrator<T> for Interpolated {
    fn restores_baseline(&self) -> bool {
        true
    }

    fn previews(&self) -> bool {
        true
    }

    fn settle(&self, driver: &mut StepDriver<'_, T>) {
        if driver.to_update() > 0 {
            driver.extrapolate();
        }
    }
}

struct Loose;

impl<T: Copy> Integrator<T> for Loose {
    fn restores_baseline(&self) -> bool {
        true
    }

    fn folds_carry(&self) -> bool {
        true
    }

    fn settle(&self, driver: &mut StepDriver<'_, T>) {
        let to_update = driver.to_update();
        let carry = driver.carry();
        if to_update > 0 && carry <= 0 && to_update + driver.projected() >= STEP_TICKS {
            driver.commit_early(to_update + carry);
        }
    }
}

struct LooseInterpolated;

impl<T: Copy> Integrator<T> for LooseInterpolated {
    fn restores_baseline(&self) -> bool {
        true
    }

    fn folds_carry(&self) -> bool {
        true
    }

    fn previews(&self) -> bool {
        true
    }

    fn settle(&self, driver: &mut StepDriver<'_, T>) {
        let to_update = driver.to_update();
        if driver.carry() > 0 || to_update + driver.projected() < STEP_TICKS {
            if to_update > 0 {
                driver.extrapolate();
            }
        } else if to_update > 0 {
            driver.commit_early(to_update);
        }
    }
}
