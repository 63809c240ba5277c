use framepace::Simulation;
use glam::IVec2;

use super::Scene;
use crate::display::Canvas;
use crate::input::{Buttons, InputState};

const BEATS: usize = 20;
/// Beats either side of the median that are averaged.
const SPREAD: usize = 3;
const BEAT_US: i64 = 750_000;
/// Marker travel per beat, in pixels.
const BEAT_SPEED: i64 = 400;
const TARGET_X: i32 = 100;

#[derive(Debug, Clone, Copy, Default)]
struct Sequence {
    /// Zero while idle.
    time_left: i64,
    beat: usize,
    diffs: [i64; BEATS],
    was_pressed: bool,
    lag_us: Option<i64>,
}

impl Sequence {
    fn finish(&mut self) {
        let mut sorted = self.diffs;
        sorted.sort_unstable();
        let middle = &sorted[BEATS / 2 - SPREAD..=BEATS / 2 + SPREAD];
        let lag = middle.iter().sum::<i64>() / middle.len() as i64;
        log::info!("measured lag {}µs over {} taps", lag, self.beat);
        self.lag_us = Some(lag);
    }
}

/// Rhythm-tapping lag test.
///
/// A first tap starts a run of evenly spaced beats; each later tap records how
/// far after its beat it landed. The median-centred average of those offsets
/// is the input-to-photon lag as perceived by the player.
#[derive(Debug, Clone, Default)]
pub struct BeatLag {
    current: Sequence,
    saved: Sequence,
}

impl BeatLag {
    pub fn lag_us(&self) -> Option<i64> {
        self.current.lag_us
    }

    pub fn is_running(&self) -> bool {
        self.current.time_left > 0
    }
}

impl Simulation for BeatLag {
    type Input = InputState;

    fn update(&mut self, delta_us: i64, input: InputState) {
        if input.buttons.contains(Buttons::RESET) {
            self.current = Sequence::default();
            return;
        }

        let seq = &mut self.current;
        let pressed = input.buttons.contains(Buttons::TEST);
        let tapped = pressed && !seq.was_pressed;
        seq.was_pressed = pressed;

        if seq.time_left == 0 {
            if !tapped {
                return;
            }
            seq.time_left = BEAT_US * (BEATS as i64 + 1);
            seq.beat = 0;
            seq.diffs = [0; BEATS];
        } else if tapped && seq.beat < BEATS {
            seq.diffs[seq.beat] = BEAT_US * (BEATS - seq.beat) as i64 - seq.time_left;
            seq.beat += 1;
        }

        seq.time_left -= delta_us;
        if seq.time_left <= 0 {
            seq.time_left = 0;
            seq.finish();
        }
    }

    fn save_state(&mut self) {
        self.saved = self.current;
    }

    fn load_state(&mut self) {
        self.current = self.saved;
    }
}

impl Scene for BeatLag {
    fn name(&self) -> &'static str {
        "Beat lag"
    }

    fn draw(&self, canvas: &mut dyn Canvas) {
        canvas.rect(IVec2::new(TARGET_X, 354), IVec2::new(TARGET_X, 416));
        canvas.rect(IVec2::new(TARGET_X - 1, 322), IVec2::new(TARGET_X + 1, 353));
        canvas.rect(IVec2::new(TARGET_X - 1, 417), IVec2::new(TARGET_X + 1, 448));

        let time_left = self.current.time_left;
        if time_left == 0 {
            return;
        }
        for beat in 0..BEATS {
            let until = time_left - BEAT_US * (BEATS - beat) as i64;
            let x = TARGET_X + (until * BEAT_SPEED / BEAT_US) as i32;
            canvas.rect(IVec2::new(x, 354), IVec2::new(x, 416));
        }
    }

    fn status(&self) -> Option<String> {
        if self.is_running() {
            return Some(format!("beat {}/{}", self.current.beat, BEATS));
        }
        Some(match self.lag_us() {
            Some(lag) => format!("lag {:.1}ms", lag as f64 / 1000.0),
            None => "tap to start".to_string(),
        })
    }
}
