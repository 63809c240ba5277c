use crate::history::{COST_WINDOW, RollingSampleBuffer};
use crate::simulation::Simulation;
use crate::time::{Clock, wait_until};

/// Wraps a simulation to time each committed update, padding it to `floor`.
/// Previews are padded too but stay out of the cost history.
pub(crate) struct Metered<'a, S, C> {
    pub inner: &'a mut S,
    pub clock: &'a C,
    pub floor: i64,
    pub margin: i64,
    pub costs: &'a mut RollingSampleBuffer<i64, COST_WINDOW>,
}

impl<S: Simulation, C: Clock> Simulation for Metered<'_, S, C> {
    type Input = S::Input;

    fn update(&mut self, delta_us: i64, input: Self::Input) {
        let start = self.clock.now();
        self.inner.update(delta_us, input);
        let end = wait_until(self.clock, start + self.floor, self.margin);
        self.costs.push(end - start);
    }

    fn preview(&mut self, delta_us: i64, input: Self::Input) {
        let start = self.clock.now();
        self.inner.preview(delta_us, input);
        wait_until(self.clock, start + self.floor, self.margin);
    }

    fn save_state(&mut self) {
        self.inner.save_state();
    }

    fn load_state(&mut self) {
        self.inner.load_state();
    }
}
