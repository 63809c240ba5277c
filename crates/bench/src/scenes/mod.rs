mod beat;
mod flash;
mod scrolling;

pub use beat::BeatLag;
pub use flash::Flash;
pub use scrolling::Scrolling;

use framepace::Simulation;

use crate::display::Canvas;
use crate::input::InputState;

pub trait Scene: Simulation<Input = InputState> {
    fn name(&self) -> &'static str;

    fn draw(&self, canvas: &mut dyn Canvas);

    /// One-line readout for the dashboard and the headless summary.
    fn status(&self) -> Option<String> {
        None
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum SceneKind {
    #[default]
    Scrolling,
    BeatLag,
    Flash,
}

impl SceneKind {
    pub fn build(self) -> Box<dyn Scene> {
        match self {
            Self::Scrolling => Box::new(Scrolling::default()),
            Self::BeatLag => Box::new(BeatLag::default()),
            Self::Flash => Box::new(Flash::default()),
        }
    }
}
