/// A fixed-step simulation the pacer drives.
///
/// `update` must depend only on the current state, `delta_us` and `input`.
/// `save_state` and `load_state` snapshot and restore all mutable state; the
/// scheduler decides when either happens.
pub trait Simulation {
    type Input: Copy;

    fn update(&mut self, delta_us: i64, input: Self::Input);

    /// A visual-only update that the next `load_state` throws away.
    fn preview(&mut self, delta_us: i64, input: Self::Input) {
        self.update(delta_us, input)
    }

    fn save_state(&mut self);

    fn load_state(&mut self);
}

impl<S: Simulation + ?Sized> Simulation for Box<S> {
    type Input = S::Input;

    fn update(&mut self, delta_us: i64, input: Self::Input) {
        (**self).update(delta_us, input)
    }

    fn preview(&mut self, delta_us: i64, input: Self::Input) {
        (**self).preview(delta_us, input)
    }

    fn save_state(&mut self) {
        (**self).save_state()
    }

    fn load_state(&mut self) {
        (**self).load_state()
    }
}

pub trait InputSource<T> {
    fn sample(&mut self) -> T;
}

impl<T, F> InputSource<T> for F
where
    F: FnMut() -> T,
{
    fn sample(&mut self) -> T {
        self()
    }
}
