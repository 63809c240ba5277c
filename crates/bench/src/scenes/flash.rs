use framepace::Simulation;
use glam::IVec2;

use super::Scene;
use crate::display::Canvas;
use crate::input::InputState;

const BARS: [(i32, i32); 3] = [(64, 92), (368, 400), (672, 704)];

/// Lights three bars while any button is held, for measuring lag with a
/// photodiode on the screen.
#[derive(Debug, Clone, Default)]
pub struct Flash {
    lit: bool,
    saved: bool,
}

impl Simulation for Flash {
    type Input = InputState;

    fn update(&mut self, _delta_us: i64, input: InputState) {
        self.lit = input.pressed();
    }

    fn save_state(&mut self) {
        self.saved = self.lit;
    }

    fn load_state(&mut self) {
        self.lit = self.saved;
    }
}

impl Scene for Flash {
    fn name(&self) -> &'static str {
        "Flash"
    }

    fn draw(&self, canvas: &mut dyn Canvas) {
        if !self.lit {
            return;
        }
        for (top, bottom) in BARS {
            canvas.rect(IVec2::new(64, top), IVec2::new(960, bottom));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::Buttons;
    use crate::scenes::testing::RectLog;

    #[test]
    fn test_bars_follow_buttons() {
        let mut scene = Flash::default();
        let held = InputState {
            buttons: Buttons::PRESSED,
            ..Default::default()
        };

        scene.update(1_000, held);
        let mut canvas = RectLog::default();
        scene.draw(&mut canvas);
        assert_eq!(canvas.0.len(), 3);

        scene.update(1_000, InputState::default());
        let mut canvas = RectLog::default();
        scene.draw(&mut canvas);
        assert!(canvas.0.is_empty());
    }
}
