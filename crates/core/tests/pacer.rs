use std::cell::Cell;
use std::rc::Rc;
use std::sync::atomic::{AtomicBool, Ordering};

use framepace::{
    Clock, FramePacer, InputLagMitigation, ManualClock, PacerConfig, Presenter, Simulation,
    TimestepPolicy,
};

#[derive(Default)]
struct Counter {
    steps: u64,
    saved: u64,
}

impl Simulation for Counter {
    type Input = ();

    fn update(&mut self, _delta_us: i64, _input: ()) {
        self.steps += 1;
    }

    fn save_state(&mut self) {
        self.saved = self.steps;
    }

    fn load_state(&mut self) {
        self.steps = self.saved;
    }
}

/// Burns `cost_us` of clock time per committed update. Previews are free.
struct Workload {
    clock: ManualClock,
    cost_us: i64,
    steps: u64,
}

impl Simulation for Workload {
    type Input = ();

    fn update(&mut self, _delta_us: i64, _input: ()) {
        self.clock.advance(self.cost_us);
        self.steps += 1;
    }

    fn preview(&mut self, _delta_us: i64, _input: ()) {}

    fn save_state(&mut self) {}

    fn load_state(&mut self) {}
}

/// Presents on the first vblank strictly after the swap is issued. Without a
/// period, presenting is free.
struct VsyncPresenter {
    clock: ManualClock,
    period: Rc<Cell<Option<i64>>>,
    presents: u64,
}

impl VsyncPresenter {
    fn new(clock: &ManualClock, period: Option<i64>) -> Self {
        Self {
            clock: clock.clone(),
            period: Rc::new(Cell::new(period)),
            presents: 0,
        }
    }
}

impl Presenter for VsyncPresenter {
    fn begin_frame(&mut self) {}

    fn end_frame(&mut self) {}

    fn present(&mut self) {
        self.presents += 1;
        if let Some(period) = self.period.get() {
            let now = self.clock.now();
            self.clock.set((now / period + 1) * period);
        }
    }

    fn force_gpu_completion(&mut self) {}

    fn refresh_period(&self) -> Option<i64> {
        self.period.get()
    }
}

fn pacer(clock: &ManualClock, config: PacerConfig) -> FramePacer<ManualClock, ()> {
    FramePacer::new(clock.clone(), config).unwrap()
}

#[test]
fn test_rejects_invalid_config() {
    let config = PacerConfig {
        update_rate: 0,
        ..Default::default()
    };
    assert!(FramePacer::<_, ()>::new(ManualClock::new(), config).is_err());
}

#[test]
fn test_uncapped_fixed_waits_for_whole_steps() {
    let clock = ManualClock::new();
    let mut pacer = pacer(
        &clock,
        PacerConfig {
            update_rate: 100,
            ..Default::default()
        },
    );
    let mut sim = Counter::default();
    let mut presenter = VsyncPresenter::new(&clock, None);

    let mut previous = clock.now();
    for _ in 0..20 {
        let report = pacer.frame(&mut sim, &mut || (), &mut presenter, |_, _| {});
        assert_eq!(report.steps.committed, 1);
        assert_eq!(report.slack, None);
        assert!(!report.missed);

        assert_eq!(clock.now() - previous, 10_000);
        previous = clock.now();
    }
    assert_eq!(sim.steps, 20);
    assert_eq!(presenter.presents, 20);
}

#[test]
fn test_frame_delay_converges_without_misses() {
    let clock = ManualClock::new();
    let mut pacer = pacer(
        &clock,
        PacerConfig {
            update_rate: 60,
            mitigation: InputLagMitigation::FrameDelay,
            simulated_update_cost_us: 2_000,
            simulated_draw_cost_us: 1_000,
            ..Default::default()
        },
    );
    let mut sim = Counter::default();
    let mut presenter = VsyncPresenter::new(&clock, Some(16_667));

    let reports: Vec<_> = (0..48)
        .map(|_| pacer.frame(&mut sim, &mut || (), &mut presenter, |_, _| {}))
        .collect();

    assert!(reports.iter().all(|r| !r.missed));
    assert_eq!(reports[0].frame_delay, 0);
    for report in &reports[32..] {
        assert!(report.frame_delay > 10_000, "{report:?}");
        assert_eq!(report.steps.committed, 1);
        assert!(report.slack.is_some_and(|slack| slack >= 0));
    }
    assert_eq!(pacer.stats().missed_frames, 0);
    assert_eq!(pacer.stats().refresh_period_us, Some(16_667));
}

#[test]
fn test_cost_spike_misses_then_skips_one_delay() {
    let clock = ManualClock::new();
    let mut pacer = pacer(
        &clock,
        PacerConfig {
            update_rate: 60,
            mitigation: InputLagMitigation::FrameDelay,
            simulated_update_cost_us: 2_000,
            simulated_draw_cost_us: 1_000,
            ..Default::default()
        },
    );
    let mut sim = Counter::default();
    let mut presenter = VsyncPresenter::new(&clock, Some(16_667));

    for _ in 0..40 {
        pacer.frame(&mut sim, &mut || (), &mut presenter, |_, _| {});
    }
    assert!(pacer.stats().last.frame_delay > 10_000);

    pacer.set_simulated_costs(8_000, 1_000).unwrap();
    let spike = pacer.frame(&mut sim, &mut || (), &mut presenter, |_, _| {});
    assert!(spike.missed);
    assert!(spike.slack.is_some_and(|slack| slack < 0));

    pacer.set_simulated_costs(2_000, 1_000).unwrap();
    let after = pacer.frame(&mut sim, &mut || (), &mut presenter, |_, _| {});
    assert_eq!(after.frame_delay, 0);
    assert!(pacer.stats().missed_frames >= 1);
}

#[test]
fn test_refresh_change_resynchronizes() {
    let clock = ManualClock::new();
    let mut pacer = pacer(
        &clock,
        PacerConfig {
            update_rate: 60,
            mitigation: InputLagMitigation::GpuSync,
            ..Default::default()
        },
    );
    let mut sim = Counter::default();
    let mut presenter = VsyncPresenter::new(&clock, Some(16_667));
    let period = presenter.period.clone();

    for _ in 0..10 {
        pacer.frame(&mut sim, &mut || (), &mut presenter, |_, _| {});
    }

    period.set(Some(8_333));
    let report = pacer.frame(&mut sim, &mut || (), &mut presenter, |_, _| {});

    assert_eq!(report.steps.committed, 0);
    assert_eq!(report.wall_delta, 0);
    assert!(!report.missed);
    assert_eq!(pacer.predictor().refresh_period(), Some(8_333));
    assert_eq!(pacer.scheduler().to_update(), 0);
}

#[test]
fn test_clock_rollback_is_reported_as_missed() {
    let clock = ManualClock::starting_at(50_000);
    let mut pacer = pacer(
        &clock,
        PacerConfig {
            update_rate: 100,
            policy: TimestepPolicy::Interpolation,
            ..Default::default()
        },
    );
    let mut sim = Counter::default();
    let mut presenter = VsyncPresenter::new(&clock, None);

    clock.advance(25_000);
    let report = pacer.frame(&mut sim, &mut || (), &mut presenter, |_, _| {});
    assert_eq!(report.steps.committed, 2);
    assert!(!report.missed);

    clock.set(20_000);
    let report = pacer.frame(&mut sim, &mut || (), &mut presenter, |_, _| {});
    assert_eq!(report.wall_delta, 0);
    assert_eq!(report.steps.committed, 0);
    assert!(report.missed);

    clock.advance(5_000);
    let report = pacer.frame(&mut sim, &mut || (), &mut presenter, |_, _| {});
    assert_eq!(report.wall_delta, 5_000);
    assert!(!report.missed);
}

#[test]
fn test_cost_histories_reflect_floors() {
    let clock = ManualClock::new();
    let mut pacer = pacer(
        &clock,
        PacerConfig {
            update_rate: 100,
            simulated_update_cost_us: 2_000,
            simulated_draw_cost_us: 500,
            ..Default::default()
        },
    );
    let mut sim = Counter::default();
    let mut presenter = VsyncPresenter::new(&clock, None);

    let before = pacer.stats();
    assert_eq!(before.update_cost_avg_us, 1_000_000);
    assert_eq!(before.missed_frames, 0);

    for _ in 0..8 {
        pacer.frame(&mut sim, &mut || (), &mut presenter, |_, _| {});
    }

    let stats = pacer.stats();
    assert_eq!(stats.update_cost_avg_us, 2_000);
    assert_eq!(stats.update_cost_max_us, 2_000);
    assert_eq!(stats.draw_cost_avg_us, 500);
    assert_eq!(stats.last.frame_index, 8);
}

#[test]
fn test_run_stops_when_flag_clears() {
    let clock = ManualClock::new();
    let mut pacer = pacer(&clock, PacerConfig::default());
    let mut sim = Counter::default();
    let mut presenter = VsyncPresenter::new(&clock, Some(16_667));
    let running = AtomicBool::new(true);

    let mut draws = 0;
    let frames = pacer.run(
        &mut sim,
        &mut || (),
        &mut presenter,
        |_, _| {
            draws += 1;
            if draws == 12 {
                running.store(false, Ordering::SeqCst);
            }
        },
        &running,
    );

    assert_eq!(frames, 12);
    assert_eq!(presenter.presents, 12);
}

#[test]
fn test_no_mitigation_never_misses() {
    let clock = ManualClock::new();
    let mut pacer = pacer(
        &clock,
        PacerConfig {
            update_rate: 60,
            simulated_update_cost_us: 30_000,
            ..Default::default()
        },
    );
    let mut sim = Counter::default();
    let mut presenter = VsyncPresenter::new(&clock, Some(16_667));

    for _ in 0..10 {
        let report = pacer.frame(&mut sim, &mut || (), &mut presenter, |_, _| {});
        assert!(!report.missed, "{report:?}");
    }

    let stats = pacer.stats();
    assert!(sim.steps > 0);
    assert_eq!(stats.update_cost_max_us, 30_000);
    assert_eq!(stats.missed_frames, 0);
    assert_eq!(stats.min_slack_us, 0);
    assert_eq!(stats.predicted_wait_us, -PacerConfig::default().safety_margin_us);
}

#[test]
fn test_previews_stay_out_of_update_costs() {
    let clock = ManualClock::new();
    let mut pacer = pacer(
        &clock,
        PacerConfig {
            update_rate: 100,
            policy: TimestepPolicy::Interpolation,
            ..Default::default()
        },
    );
    let mut sim = Workload {
        clock: clock.clone(),
        cost_us: 3_000,
        steps: 0,
    };
    let mut presenter = VsyncPresenter::new(&clock, None);

    let mut previews = 0;
    for _ in 0..30 {
        clock.advance(4_000);
        let report = pacer.frame(&mut sim, &mut || (), &mut presenter, |_, _| {});
        if report.steps.extrapolated {
            previews += 1;
        }
    }

    let stats = pacer.stats();
    assert!(previews > 0);
    assert!(sim.steps >= 6);
    assert_eq!(stats.update_cost_avg_us, 3_000);
    assert_eq!(stats.update_cost_max_us, 3_000);
}
