use std::fmt;

use framepace::{Clock, Presenter};
use glam::IVec2;

pub const NATIVE_RESOLUTION: IVec2 = IVec2::new(1024, 768);

/// How presents line up with the display refresh.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, clap::ValueEnum)]
pub enum SyncMode {
    /// Present immediately, no deadline.
    Off,
    /// Wait for vblank unless it was already missed, then tear.
    Adaptive,
    #[default]
    On,
}

impl SyncMode {
    pub fn name(self) -> &'static str {
        match self {
            Self::Off => "Off",
            Self::Adaptive => "Adaptive",
            Self::On => "On",
        }
    }

    pub fn next(self) -> Self {
        match self {
            Self::Off => Self::Adaptive,
            Self::Adaptive => Self::On,
            Self::On => Self::Off,
        }
    }
}

impl fmt::Display for SyncMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone)]
pub struct DisplayConfig {
    pub refresh_rate: u32,
    pub sync: SyncMode,
    /// Fixed GPU time per frame.
    pub gpu_cost_us: i64,
    /// GPU time per rectangle.
    pub rect_cost_us: i64,
    /// Upper bound of random extra GPU time per frame.
    pub jitter_us: i64,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            refresh_rate: 60,
            sync: SyncMode::On,
            gpu_cost_us: 500,
            rect_cost_us: 10,
            jitter_us: 0,
        }
    }
}

/// Drawing surface the scenes render to. Corners are inclusive.
pub trait Canvas {
    fn rect(&mut self, min: IVec2, max: IVec2);
}

/// A display with a GPU queue and a vblank timeline, driven entirely by a
/// [`Clock`].
pub struct SimulatedDisplay<C> {
    clock: C,
    config: DisplayConfig,
    period: i64,
    origin: i64,
    gpu_busy_until: i64,
    last_vblank: i64,
    frame_rects: Vec<(IVec2, IVec2)>,
    rng: u64,
    presented: u64,
    torn: u64,
    rects: u64,
}

impl<C: Clock> SimulatedDisplay<C> {
    pub fn new(clock: C, config: DisplayConfig) -> Self {
        let period = refresh_period_us(config.refresh_rate);
        let origin = clock.now();
        Self {
            clock,
            period,
            origin,
            gpu_busy_until: origin,
            last_vblank: origin - period,
            frame_rects: Vec::new(),
            rng: rand_u64() | 1,
            presented: 0,
            torn: 0,
            rects: 0,
            config,
        }
    }

    pub fn sync_mode(&self) -> SyncMode {
        self.config.sync
    }

    pub fn set_sync_mode(&mut self, sync: SyncMode) {
        if sync != self.config.sync {
            log::debug!("sync mode {} -> {}", self.config.sync, sync);
            self.config.sync = sync;
        }
    }

    pub fn period(&self) -> i64 {
        self.period
    }

    pub fn presented(&self) -> u64 {
        self.presented
    }

    pub fn torn(&self) -> u64 {
        self.torn
    }

    pub fn total_rects(&self) -> u64 {
        self.rects
    }

    /// Rectangles drawn since the last `begin_frame`.
    pub fn frame_rects(&self) -> &[(IVec2, IVec2)] {
        &self.frame_rects
    }

    /// First vblank at or after `time`.
    fn vblank_at_or_after(&self, time: i64) -> i64 {
        let since = time - self.origin;
        let periods = since.div_euclid(self.period) + i64::from(since.rem_euclid(self.period) != 0);
        self.origin + periods * self.period
    }

    fn gpu_jitter(&mut self) -> i64 {
        if self.config.jitter_us <= 0 {
            return 0;
        }
        self.rng ^= self.rng << 13;
        self.rng ^= self.rng >> 7;
        self.rng ^= self.rng << 17;
        (self.rng % (self.config.jitter_us as u64 + 1)) as i64
    }
}

impl<C: Clock> Canvas for SimulatedDisplay<C> {
    fn rect(&mut self, min: IVec2, max: IVec2) {
        self.frame_rects.push((min, max));
    }
}

impl<C: Clock> Presenter for SimulatedDisplay<C> {
    fn begin_frame(&mut self) {
        self.frame_rects.clear();
    }

    fn end_frame(&mut self) {
        let count = self.frame_rects.len() as i64;
        self.rects += count as u64;

        let work = self.config.gpu_cost_us + count * self.config.rect_cost_us + self.gpu_jitter();
        self.gpu_busy_until = self.gpu_busy_until.max(self.clock.now()) + work;
    }

    fn present(&mut self) {
        self.presented += 1;

        let now = self.clock.now();
        let done = self.gpu_busy_until.max(now);
        let due = self.last_vblank + self.period;
        let vblank = self.vblank_at_or_after(done).max(due);

        match self.config.sync {
            SyncMode::Off => return,
            SyncMode::Adaptive if done > due => {
                self.torn += 1;
                self.last_vblank = self.vblank_at_or_after(done) - self.period;
                return;
            }
            SyncMode::Adaptive | SyncMode::On => {}
        }

        self.last_vblank = vblank;
        self.clock.sleep(vblank - now);
    }

    fn force_gpu_completion(&mut self) {
        self.clock.sleep(self.gpu_busy_until - self.clock.now());
    }

    fn refresh_period(&self) -> Option<i64> {
        match self.config.sync {
            SyncMode::Off => None,
            SyncMode::Adaptive | SyncMode::On => Some(self.period()),
        }
    }
}

fn refresh_period_us(refresh_rate: u32) -> i64 {
    let rate = i64::from(refresh_rate.max(1));
    (1_000_000 + rate / 2) / rate
}

fn rand_u64() -> u64 {
    use std::collections::hash_map::RandomState;
    use std::hash::{BuildHasher, Hasher};

    let mut hasher = RandomState::new().build_hasher();
    hasher.write_u64(0x9e37_79b9_7f4a_7c15);
    hasher.finish()
}
