use std::cell::Cell;
use std::rc::Rc;

use bitflags::bitflags;
use framepace::{Clock, InputSource};

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct Buttons: u8 {
        /// Any button is held.
        const PRESSED = 1 << 0;
        /// The tap button used by the lag scenes.
        const TEST = 1 << 1;
        const RESET = 1 << 2;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct InputState {
    pub x: i16,
    pub y: i16,
    pub buttons: Buttons,
}

impl InputState {
    pub fn pressed(&self) -> bool {
        self.buttons.contains(Buttons::PRESSED)
    }
}

#[derive(Debug, Clone)]
pub struct TapScript {
    pub period_us: i64,
    pub hold_us: i64,
    /// Delay before the first press.
    pub reaction_us: i64,
    pub axis: (i16, i16),
}

impl Default for TapScript {
    fn default() -> Self {
        Self {
            period_us: 750_000,
            hold_us: 80_000,
            reaction_us: 0,
            axis: (i16::MAX, 0),
        }
    }
}

/// Clock-driven stand-in for a player: holds the stick at a constant
/// deflection and taps the test button on a fixed rhythm.
pub struct ScriptedInput<C> {
    clock: C,
    script: TapScript,
    origin: i64,
    reset: Rc<Cell<bool>>,
}

impl<C: Clock> ScriptedInput<C> {
    pub fn new(clock: C, script: TapScript) -> Self {
        let origin = clock.now();
        Self {
            clock,
            script,
            origin,
            reset: Rc::new(Cell::new(false)),
        }
    }

    /// Handle that makes the next sample carry [`Buttons::RESET`].
    pub fn reset_handle(&self) -> Rc<Cell<bool>> {
        self.reset.clone()
    }
}

impl<C: Clock> InputSource<InputState> for ScriptedInput<C> {
    fn sample(&mut self) -> InputState {
        let mut buttons = Buttons::empty();

        let since = self.clock.now() - self.origin - self.script.reaction_us;
        if since >= 0 && since % self.script.period_us.max(1) < self.script.hold_us {
            buttons |= Buttons::PRESSED | Buttons::TEST;
        }
        if self.reset.take() {
            buttons |= Buttons::RESET;
        }

        InputState {
            x: self.script.axis.0,
            y: self.script.axis.1,
            buttons,
        }
    }
}
