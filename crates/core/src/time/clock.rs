use std::cell::Cell;
use std::rc::Rc;
use std::time::{Duration, Instant};

/// Monotonic microsecond time source.
///
/// `sleep` is the coarse half of a sleep-then-spin wait and may overshoot;
/// `spin` is one iteration of the fine half and must return promptly.
pub trait Clock {
    fn now(&self) -> i64;

    fn sleep(&self, micros: i64);

    fn spin(&self) {
        std::hint::spin_loop();
    }
}

impl<C: Clock + ?Sized> Clock for &C {
    fn now(&self) -> i64 {
        (**self).now()
    }

    fn sleep(&self, micros: i64) {
        (**self).sleep(micros)
    }

    fn spin(&self) {
        (**self).spin()
    }
}

#[derive(Debug, Clone, Copy)]
pub struct MonotonicClock {
    origin: Instant,
}

impl Default for MonotonicClock {
    fn default() -> Self {
        Self::new()
    }
}

impl MonotonicClock {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Clock for MonotonicClock {
    fn now(&self) -> i64 {
        self.origin.elapsed().as_micros() as i64
    }

    fn sleep(&self, micros: i64) {
        if micros > 0 {
            std::thread::sleep(Duration::from_micros(micros as u64));
        }
    }
}

/// Clock that only moves when told to.
///
/// Clones share the same timeline, so a simulated presenter and the pacer can
/// observe each other's waits. Sleeping advances time by exactly the requested
/// amount and every spin advances it by `spin_step` microseconds.
#[derive(Debug, Clone)]
pub struct ManualClock {
    now: Rc<Cell<i64>>,
    spin_step: i64,
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new()
    }
}

impl ManualClock {
    pub fn new() -> Self {
        Self::starting_at(0)
    }

    pub fn starting_at(micros: i64) -> Self {
        Self {
            now: Rc::new(Cell::new(micros)),
            spin_step: 1,
        }
    }

    pub fn with_spin_step(mut self, micros: i64) -> Self {
        self.spin_step = micros.max(1);
        self
    }

    pub fn advance(&self, micros: i64) {
        self.now.set(self.now.get() + micros);
    }

    pub fn set(&self, micros: i64) {
        self.now.set(micros);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> i64 {
        self.now.get()
    }

    fn sleep(&self, micros: i64) {
        if micros > 0 {
            self.advance(micros);
        }
    }

    fn spin(&self) {
        self.advance(self.spin_step);
    }
}
