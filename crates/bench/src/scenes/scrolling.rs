use framepace::Simulation;
use glam::{I64Vec2, IVec2};

use super::Scene;
use crate::display::{Canvas, NATIVE_RESOLUTION};
use crate::input::{Buttons, InputState};

const SQUARE_SIZE: i32 = 128;

/// Full stick deflection times one second, the divisor that turns
/// `axis * µs * speed` into pixels.
const AXIS_SECOND: i128 = i16::MAX as i128 * 1_000_000;

/// Checkerboard scrolled by the stick. Judder shows up as uneven motion.
#[derive(Debug, Clone)]
pub struct Scrolling {
    /// Pixels per second at full deflection.
    pub speed: i64,
    /// 16.16 fixed point.
    offset: I64Vec2,
    saved: I64Vec2,
}

impl Default for Scrolling {
    fn default() -> Self {
        Self {
            speed: 8,
            offset: I64Vec2::ZERO,
            saved: I64Vec2::ZERO,
        }
    }
}

impl Scrolling {
    /// Current scroll position in whole pixels.
    pub fn position(&self) -> IVec2 {
        IVec2::new((self.offset.x >> 16) as i32, (self.offset.y >> 16) as i32)
    }

    fn travel(&self, axis: i16, delta_us: i64) -> i64 {
        let fixed = (axis as i128) << 16;
        (fixed * delta_us as i128 * self.speed as i128 / AXIS_SECOND) as i64
    }
}

impl Simulation for Scrolling {
    type Input = InputState;

    fn update(&mut self, delta_us: i64, input: InputState) {
        if input.buttons.contains(Buttons::RESET) {
            self.offset = I64Vec2::ZERO;
            return;
        }
        self.offset += I64Vec2::new(self.travel(input.x, delta_us), self.travel(input.y, delta_us));
    }

    fn save_state(&mut self) {
        self.saved = self.offset;
    }

    fn load_state(&mut self) {
        self.offset = self.saved;
    }
}

impl Scene for Scrolling {
    fn name(&self) -> &'static str {
        "Scrolling"
    }

    fn draw(&self, canvas: &mut dyn Canvas) {
        // Board wraps with a spare square on each side so edges never show.
        let board = (NATIVE_RESOLUTION + 3 * SQUARE_SIZE - 1) / SQUARE_SIZE * SQUARE_SIZE;
        let squares = board / SQUARE_SIZE;
        let scroll = self.position();

        for y in 0..squares.y {
            for x in ((y % 2)..squares.x).step_by(2) {
                let tile = IVec2::new(x, y) * SQUARE_SIZE - scroll;
                let min = tile.rem_euclid(board) - SQUARE_SIZE;
                canvas.rect(min, min + (SQUARE_SIZE - 1));
            }
        }
    }

    fn status(&self) -> Option<String> {
        let position = self.position();
        Some(format!("scroll {}, {}", position.x, position.y))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scenes::testing::RectLog;

    fn stick(x: i16, y: i16) -> InputState {
        InputState {
            x,
            y,
            buttons: Buttons::empty(),
        }
    }

    #[test]
    fn test_full_deflection_moves_speed_pixels_per_second() {
        let mut scene = Scrolling::default();
        for _ in 0..4 {
            scene.update(250_000, stick(i16::MAX, -i16::MAX));
        }
        assert_eq!(scene.position(), IVec2::new(8, -8));
    }

    #[test]
    fn test_load_discards_previews() {
        let mut scene = Scrolling {
            speed: 1_000,
            ..Default::default()
        };
        scene.update(100_000, stick(i16::MAX, 0));
        scene.save_state();
        scene.update(50_000, stick(i16::MAX, 0));
        assert_eq!(scene.position().x, 150);

        scene.load_state();
        assert_eq!(scene.position().x, 100);
    }

    #[test]
    fn test_reset_button_recenters() {
        let mut scene = Scrolling::default();
        scene.update(1_000_000, stick(i16::MAX, 0));
        scene.update(
            0,
            InputState {
                buttons: Buttons::RESET,
                ..stick(0, 0)
            },
        );
        assert_eq!(scene.position(), IVec2::ZERO);
    }

    #[test]
    fn test_checkerboard_covers_screen() {
        let scene = Scrolling::default();
        let mut canvas = RectLog::default();

        scene.draw(&mut canvas);

        // 10 x 8 board of 128px squares, every other one drawn.
        assert_eq!(canvas.0.len(), 40);
        assert!(canvas.0.iter().all(|(min, max)| *max - *min == IVec2::splat(127)));
        assert!(canvas.0.contains(&(IVec2::splat(-128), IVec2::splat(-1))));
    }
}
