use std::sync::atomic::{AtomicBool, Ordering};

use crate::error::ConfigError;
use crate::history::{COST_WINDOW, FRAME_WINDOW, RollingSampleBuffer, WARMUP_SENTINEL};
use crate::simulation::{InputSource, Simulation, TimestepPolicy, UpdateScheduler};
use crate::sync::SyncPredictor;
use crate::time::{Clock, MICROS_PER_SECOND, wait_until};

use super::config::{InputLagMitigation, PacerConfig};
use super::metered::Metered;
use super::presenter::Presenter;
use super::stats::{FrameReport, PacerStats};

/// Drives one simulation and one presenter, one iteration per `frame` call.
pub struct FramePacer<C, T> {
    clock: C,
    config: PacerConfig,
    scheduler: UpdateScheduler<T>,
    predictor: SyncPredictor,
    frame_stamps: RollingSampleBuffer<i64, FRAME_WINDOW>,
    iteration_times: RollingSampleBuffer<i64, FRAME_WINDOW>,
    update_costs: RollingSampleBuffer<i64, COST_WINDOW>,
    draw_costs: RollingSampleBuffer<i64, COST_WINDOW>,
    last_update_time: i64,
    last_present: i64,
    refresh_period: Option<i64>,
    resync_pending: bool,
    frame_index: u64,
    missed_frames: u64,
    last_report: FrameReport,
}

impl<C: Clock, T: Copy + 'static> FramePacer<C, T> {
    pub fn new(clock: C, config: PacerConfig) -> Result<Self, ConfigError> {
        config.validate()?;

        let now = clock.now();
        let scheduler = UpdateScheduler::new(config.update_rate, config.policy)?;
        let predictor = SyncPredictor::new(config.safety_margin_us);

        Ok(Self {
            clock,
            scheduler,
            predictor,
            frame_stamps: RollingSampleBuffer::filled(now - WARMUP_SENTINEL),
            iteration_times: RollingSampleBuffer::filled(WARMUP_SENTINEL),
            update_costs: RollingSampleBuffer::filled(WARMUP_SENTINEL),
            draw_costs: RollingSampleBuffer::filled(WARMUP_SENTINEL),
            last_update_time: now,
            last_present: now,
            refresh_period: None,
            resync_pending: false,
            frame_index: 0,
            missed_frames: 0,
            last_report: FrameReport::default(),
            config,
        })
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    pub fn config(&self) -> &PacerConfig {
        &self.config
    }

    pub fn scheduler(&self) -> &UpdateScheduler<T> {
        &self.scheduler
    }

    pub fn predictor(&self) -> &SyncPredictor {
        &self.predictor
    }

    pub fn set_policy(&mut self, policy: TimestepPolicy) {
        self.config.policy = policy;
        self.scheduler.set_policy(policy);
    }

    pub fn set_mitigation(&mut self, mitigation: InputLagMitigation) {
        if mitigation != self.config.mitigation {
            log::debug!("input lag mitigation {} -> {}", self.config.mitigation, mitigation);
            self.config.mitigation = mitigation;
            self.predictor.clear_missed();
        }
    }

    pub fn set_update_rate(&mut self, update_rate: u32) -> Result<(), ConfigError> {
        self.scheduler.set_update_rate(update_rate)?;
        self.config.update_rate = update_rate;
        Ok(())
    }

    pub fn set_simulated_costs(&mut self, update_us: i64, draw_us: i64) -> Result<(), ConfigError> {
        let config = PacerConfig {
            simulated_update_cost_us: update_us,
            simulated_draw_cost_us: draw_us,
            ..self.config.clone()
        };
        config.validate()?;
        self.config = config;
        Ok(())
    }

    /// Drops accumulated time and slack history, e.g. after a presentation
    /// mode change. The next iteration is never reported as missed.
    pub fn resynchronize(&mut self) {
        let now = self.clock.now();
        self.scheduler.reset();
        self.predictor.reset();
        self.last_update_time = now;
        self.last_present = now;
        self.resync_pending = true;
        log::debug!("resynchronized at {}µs", now);
    }

    pub fn frame<S, I, P, D>(
        &mut self,
        simulation: &mut S,
        inputs: &mut I,
        presenter: &mut P,
        draw: D,
    ) -> FrameReport
    where
        S: Simulation<Input = T>,
        I: InputSource<T>,
        P: Presenter,
        D: FnOnce(&S, &mut P),
    {
        let refresh_period = presenter.refresh_period();
        if refresh_period != self.refresh_period {
            log::debug!(
                "presentation deadline {:?}µs -> {:?}µs",
                self.refresh_period,
                refresh_period
            );
            self.refresh_period = refresh_period;
            self.predictor.set_refresh_period(refresh_period);
            self.resynchronize();
        }

        let start = self.clock.now();
        let span = start - self.frame_stamps.oldest();
        let frame_rate = if span > 0 {
            (FRAME_WINDOW as i64 * MICROS_PER_SECOND) as f64 / span as f64
        } else {
            0.0
        };
        self.frame_stamps.push(start);

        let mut frame_delay = 0;
        if self.config.mitigation.frame_delay() && refresh_period.is_some() {
            if let Some(wait) = self.predictor.frame_delay() {
                let woke = wait_until(&self.clock, start + wait, self.config.sleep_margin_us);
                frame_delay = woke - start;
            }
        }

        let mut now = self.clock.now();
        let mut wall_delta = now - self.last_update_time;
        let clock_rollback = wall_delta < 0;
        if clock_rollback {
            log::warn!("clock went backwards by {}µs", -wall_delta);
            wall_delta = 0;
        }

        if refresh_period.is_none() && self.scheduler.policy() == TimestepPolicy::Fixed {
            (now, wall_delta) = self.hold_for_whole_step(now, wall_delta);
        }
        self.last_update_time = now;

        let steps = {
            let mut metered = Metered {
                inner: &mut *simulation,
                clock: &self.clock,
                floor: self.config.simulated_update_cost_us,
                margin: self.config.sleep_margin_us,
                costs: &mut self.update_costs,
            };
            self.scheduler.advance(&mut metered, inputs, wall_delta)
        };

        let draw_start = self.clock.now();
        presenter.begin_frame();
        draw(&*simulation, &mut *presenter);
        presenter.end_frame();
        let draw_end = wait_until(
            &self.clock,
            draw_start + self.config.simulated_draw_cost_us,
            self.config.sleep_margin_us,
        );
        self.draw_costs.push(draw_end - draw_start);

        let gpu_sync = self.config.mitigation.gpu_sync();
        if gpu_sync {
            presenter.force_gpu_completion();
        }
        let issued = self.clock.now();
        let slack = refresh_period.map(|period| self.last_present + period - issued);
        presenter.present();
        if gpu_sync {
            presenter.force_gpu_completion();
        }
        let presented = self.clock.now();
        let issue_to_present = presented - issued;
        self.last_present = presented;

        match (refresh_period, slack) {
            (Some(period), Some(slack)) if gpu_sync => {
                self.predictor.record_slack(slack + frame_delay);
                let late = self.predictor.observe_outcome(issue_to_present, period);
                if !late && slack < 0 {
                    self.predictor.mark_missed();
                }
            }
            _ => self.predictor.clear_missed(),
        }
        if clock_rollback {
            self.predictor.mark_missed();
        }
        if std::mem::take(&mut self.resync_pending) {
            self.predictor.clear_missed();
        }

        let missed = self.predictor.missed();
        if missed {
            self.missed_frames += 1;
        }

        self.iteration_times.push(self.clock.now() - start);
        self.frame_index += 1;

        self.last_report = FrameReport {
            frame_index: self.frame_index,
            frame_rate,
            wall_delta,
            steps,
            frame_delay,
            slack,
            issue_to_present,
            missed,
        };
        self.last_report
    }

    /// Runs frames until `running` is cleared. Returns the number of frames run.
    pub fn run<S, I, P, D>(
        &mut self,
        simulation: &mut S,
        inputs: &mut I,
        presenter: &mut P,
        mut draw: D,
        running: &AtomicBool,
    ) -> u64
    where
        S: Simulation<Input = T>,
        I: InputSource<T>,
        P: Presenter,
        D: FnMut(&S, &mut P),
    {
        let mut frames = 0;
        while running.load(Ordering::SeqCst) {
            self.frame(simulation, inputs, presenter, &mut draw);
            frames += 1;
        }
        frames
    }

    pub fn stats(&self) -> PacerStats {
        PacerStats {
            policy: self.config.policy,
            mitigation: self.config.mitigation,
            update_rate: self.config.update_rate,
            refresh_period_us: self.refresh_period,
            frame_rate: self.last_report.frame_rate,
            average_iteration_us: self.iteration_times.average(),
            update_cost_avg_us: self.update_costs.average(),
            update_cost_max_us: self.update_costs.maximum(),
            draw_cost_avg_us: self.draw_costs.average(),
            draw_cost_max_us: self.draw_costs.maximum(),
            min_slack_us: self.predictor.min_slack(),
            predicted_wait_us: self.predictor.predictive_wait(),
            missed_frames: self.missed_frames,
            last: self.last_report,
        }
    }

    // Without a presentation deadline nothing else blocks the loop, so wait
    // here until a whole step is due.
    fn hold_for_whole_step(&self, mut now: i64, mut wall_delta: i64) -> (i64, i64) {
        let rate = self.scheduler.update_rate() as i64;
        loop {
            let short = self.scheduler.ticks_short_of_step(wall_delta);
            if short <= 0 {
                return (now, wall_delta);
            }

            let sleep = (short + rate - 1) / rate - self.config.sleep_margin_us;
            if sleep > 0 {
                self.clock.sleep(sleep);
            } else {
                self.clock.spin();
            }

            now = self.clock.now();
            wall_delta = (now - self.last_update_time).max(0);
        }
    }
}
