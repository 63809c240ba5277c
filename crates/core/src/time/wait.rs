use super::Clock;

/// Sleeps until `margin` before `target`, then spins until `target`.
///
/// The margin absorbs OS wake-up jitter; the spin lands on the exact
/// microsecond. Returns the time observed when the wait ended.
pub fn wait_until<C: Clock + ?Sized>(clock: &C, target: i64, margin: i64) -> i64 {
    let remaining = target - clock.now();
    if remaining > margin {
        clock.sleep(remaining - margin);
    }
    spin_until(clock, target)
}

pub fn spin_until<C: Clock + ?Sized>(clock: &C, target: i64) -> i64 {
    let mut now = clock.now();
    while now < target {
        clock.spin();
        now = clock.now();
    }
    now
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;

    use super::*;
    use crate::time::ManualClock;

    struct RecordingClock {
        inner: ManualClock,
        sleeps: RefCell<Vec<i64>>,
        spins: RefCell<u32>,
    }

    impl Clock for RecordingClock {
        fn now(&self) -> i64 {
            self.inner.now()
        }

        fn sleep(&self, micros: i64) {
            self.sleeps.borrow_mut().push(micros);
            self.inner.sleep(micros);
        }

        fn spin(&self) {
            *self.spins.borrow_mut() += 1;
            self.inner.spin();
        }
    }

    fn recording() -> RecordingClock {
        RecordingClock {
            inner: ManualClock::new().with_spin_step(10),
            sleeps: RefCell::new(Vec::new()),
            spins: RefCell::new(0),
        }
    }

    #[test]
    fn sleeps_coarsely_then_spins_the_margin() {
        let clock = recording();

        let woke = wait_until(&clock, 5_000, 1_000);

        assert_eq!(*clock.sleeps.borrow(), vec![4_000]);
        assert_eq!(*clock.spins.borrow(), 100);
        assert_eq!(woke, 5_000);
    }

    #[test]
    fn short_waits_only_spin() {
        let clock = recording();

        wait_until(&clock, 500, 1_000);

        assert!(clock.sleeps.borrow().is_empty());
        assert_eq!(*clock.spins.borrow(), 50);
    }

    #[test]
    fn past_targets_return_immediately() {
        let clock = recording();
        clock.inner.set(10_000);

        let woke = wait_until(&clock, 5_000, 1_000);

        assert_eq!(woke, 10_000);
        assert!(clock.sleeps.borrow().is_empty());
        assert_eq!(*clock.spins.borrow(), 0);
    }
}
