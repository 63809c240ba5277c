use super::contract::{InputSource, Simulation};
use super::policy::{Integrator, TimestepPolicy};
use crate::error::ConfigError;

/// Virtual ticks in one whole simulation step.
///
/// The accumulator counts `microseconds * update_rate`, so a full step is
/// always one million ticks whatever the rate.
pub const STEP_TICKS: i64 = 1_000_000;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StepReport {
    pub committed: u32,
    pub extrapolated: bool,
}

#[derive(Debug)]
struct Accumulator<T> {
    to_update: i64,
    add_to_update: i64,
    update_rate: u32,
    saved_input: Option<T>,
}

impl<T> Accumulator<T> {
    fn ticks_to_micros(&self, ticks: i64) -> i64 {
        ticks / self.update_rate as i64
    }
}

/// One `advance` call's view of the accumulator and collaborators, handed to
/// the active integrator.
pub(crate) struct StepDriver<'a, T> {
    acc: &'a mut Accumulator<T>,
    simulation: &'a mut dyn Simulation<Input = T>,
    inputs: &'a mut dyn InputSource<T>,
    projected: i64,
    report: StepReport,
}

impl<T: Copy> StepDriver<'_, T> {
    pub(crate) fn to_update(&self) -> i64 {
        self.acc.to_update
    }

    pub(crate) fn carry(&self) -> i64 {
        self.acc.add_to_update
    }

    /// Tick delta the next call is expected to add.
    pub(crate) fn projected(&self) -> i64 {
        self.projected
    }

    fn restore_baseline(&mut self) {
        self.simulation.load_state();
    }

    pub(crate) fn commit_baseline(&mut self) {
        self.simulation.save_state();
    }

    fn whole_steps(&mut self, fold_carry: bool) {
        while self.acc.to_update >= STEP_TICKS {
            let span = if fold_carry {
                STEP_TICKS + std::mem::take(&mut self.acc.add_to_update)
            } else {
                STEP_TICKS
            };
            let input = self.take_input();
            self.simulation
                .update(self.acc.ticks_to_micros(span), input);
            self.acc.to_update -= STEP_TICKS;
            self.report.committed += 1;
        }
    }

    /// Visual-only step over the leftover. Never saved; the next
    /// `restore_baseline` discards it.
    pub(crate) fn extrapolate(&mut self) {
        let input = self.frozen_input();
        let dt = self.acc.ticks_to_micros(self.acc.to_update);
        self.simulation.preview(dt, input);
        self.report.extrapolated = true;
    }

    /// Commits a full step early, simulating only `span` ticks of it and
    /// carrying the rest into the next whole step.
    pub(crate) fn commit_early(&mut self, span: i64) {
        let input = self.take_input();
        self.simulation
            .update(self.acc.ticks_to_micros(span), input);
        self.acc.add_to_update = STEP_TICKS - span;
        self.acc.to_update -= STEP_TICKS;
        self.report.committed += 1;
        self.commit_baseline();
    }

    // A committed step re-uses the sample an earlier preview was built on.
    fn take_input(&mut self) -> T {
        match self.acc.saved_input.take() {
            Some(input) => input,
            None => self.inputs.sample(),
        }
    }

    fn frozen_input(&mut self) -> T {
        match self.acc.saved_input {
            Some(input) => input,
            None => {
                let input = self.inputs.sample();
                self.acc.saved_input = Some(input);
                input
            }
        }
    }
}

pub struct UpdateScheduler<T> {
    acc: Accumulator<T>,
    policy: TimestepPolicy,
    integrator: Box<dyn Integrator<T>>,
    // Set when the simulation may still hold a preview the new policy would
    // never discard on its own.
    restore_pending: bool,
}

impl<T: Copy + 'static> UpdateScheduler<T> {
    pub fn new(update_rate: u32, policy: TimestepPolicy) -> Result<Self, ConfigError> {
        if update_rate == 0 {
            return Err(ConfigError::ZeroUpdateRate);
        }

        Ok(Self {
            acc: Accumulator {
                to_update: 0,
                add_to_update: 0,
                update_rate,
                saved_input: None,
            },
            policy,
            integrator: policy.integrator(),
            restore_pending: false,
        })
    }

    pub fn policy(&self) -> TimestepPolicy {
        self.policy
    }

    pub fn set_policy(&mut self, policy: TimestepPolicy) {
        if policy == self.policy {
            return;
        }
        log::debug!("timestep policy {} -> {}", self.policy, policy);
        let entering = policy.integrator::<T>();

        if self.integrator.restores_baseline() && !entering.restores_baseline() {
            self.restore_pending = true;
        }
        if !entering.previews() {
            self.acc.saved_input = None;
        }
        // Whole steps that ignore the carry would lose the time it still owes.
        if !entering.folds_carry() {
            self.acc.to_update += std::mem::take(&mut self.acc.add_to_update);
        }

        self.policy = policy;
        self.integrator = entering;
    }

    pub fn update_rate(&self) -> u32 {
        self.acc.update_rate
    }

    pub fn set_update_rate(&mut self, update_rate: u32) -> Result<(), ConfigError> {
        if update_rate == 0 {
            return Err(ConfigError::ZeroUpdateRate);
        }
        if update_rate != self.acc.update_rate {
            log::debug!("update rate {}Hz -> {}Hz", self.acc.update_rate, update_rate);
            self.acc.update_rate = update_rate;
        }
        Ok(())
    }

    /// Whole steps a single call may catch up after a stall.
    pub fn max_burst(&self) -> i64 {
        self.acc.update_rate as i64 / 10 + 2
    }

    pub fn to_update(&self) -> i64 {
        self.acc.to_update
    }

    pub fn carry(&self) -> i64 {
        self.acc.add_to_update
    }

    pub fn has_frozen_input(&self) -> bool {
        self.acc.saved_input.is_some()
    }

    /// Duration of one whole step, in microseconds.
    pub fn step_micros(&self) -> i64 {
        self.acc.ticks_to_micros(STEP_TICKS)
    }

    /// Ticks still missing for a whole step if `wall_delta` were added now.
    pub fn ticks_short_of_step(&self, wall_delta: i64) -> i64 {
        let pending = self.acc.to_update + wall_delta.max(0) * self.acc.update_rate as i64;
        STEP_TICKS - pending
    }

    pub fn reset(&mut self) {
        self.acc.to_update = 0;
        self.acc.add_to_update = 0;
        self.acc.saved_input = None;
    }

    pub fn advance<S, I>(&mut self, simulation: &mut S, inputs: &mut I, wall_delta: i64) -> StepReport
    where
        S: Simulation<Input = T>,
        I: InputSource<T>,
    {
        let projected = wall_delta.max(0).saturating_mul(self.acc.update_rate as i64);
        let ceiling = STEP_TICKS * self.max_burst();
        self.acc.to_update = self.acc.to_update.saturating_add(projected).min(ceiling);

        let restore = std::mem::take(&mut self.restore_pending);
        let integrator = &self.integrator;
        let mut driver = StepDriver {
            acc: &mut self.acc,
            simulation,
            inputs,
            projected,
            report: StepReport::default(),
        };

        if restore || integrator.restores_baseline() {
            driver.restore_baseline();
        }
        driver.whole_steps(integrator.folds_carry());
        driver.commit_baseline();
        integrator.settle(&mut driver);

        driver.report
    }
}
