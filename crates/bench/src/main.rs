mod display;
mod input;
mod scenes;
mod tui;

use std::cell::Cell;
use std::io;
use std::rc::Rc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use anyhow::Result;
use clap::{Parser, ValueEnum};
use crossterm::event::{self, Event, KeyCode, KeyEventKind};
use crossterm::terminal::{self, EnterAlternateScreen, LeaveAlternateScreen};
use crossterm::{cursor, execute};
use framepace::{
    Clock, FramePacer, InputLagMitigation, ManualClock, MonotonicClock, PacerConfig,
    TimestepPolicy,
};
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;

use display::{DisplayConfig, SimulatedDisplay, SyncMode};
use input::{InputState, ScriptedInput, TapScript};
use scenes::{Scene, SceneKind};
use tui::Dashboard;

const DASHBOARD_INTERVAL: Duration = Duration::from_millis(100);

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum PolicyArg {
    Fixed,
    Interpolation,
    Loose,
    LooseInterpolation,
}

impl From<PolicyArg> for TimestepPolicy {
    fn from(arg: PolicyArg) -> Self {
        match arg {
            PolicyArg::Fixed => Self::Fixed,
            PolicyArg::Interpolation => Self::Interpolation,
            PolicyArg::Loose => Self::Loose,
            PolicyArg::LooseInterpolation => Self::LooseInterpolation,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum MitigationArg {
    None,
    GpuSync,
    FrameDelay,
}

impl From<MitigationArg> for InputLagMitigation {
    fn from(arg: MitigationArg) -> Self {
        match arg {
            MitigationArg::None => Self::None,
            MitigationArg::GpuSync => Self::GpuSync,
            MitigationArg::FrameDelay => Self::FrameDelay,
        }
    }
}

#[derive(Parser)]
#[command(name = "framepace-bench")]
#[command(about = "Frame pacing test bench on a simulated display")]
struct Args {
    #[arg(short, long, value_enum, default_value_t = SceneKind::Scrolling)]
    scene: SceneKind,

    #[arg(short, long, value_enum, default_value_t = PolicyArg::Fixed)]
    policy: PolicyArg,

    #[arg(short, long, value_enum, default_value_t = MitigationArg::None)]
    mitigation: MitigationArg,

    #[arg(short, long, default_value_t = 120)]
    update_rate: u32,

    #[arg(long, value_enum, default_value_t = SyncMode::On)]
    sync: SyncMode,

    #[arg(short, long, default_value_t = 60)]
    refresh_rate: u32,

    #[arg(short, long, default_value_t = 600, help = "Frames to run in headless mode")]
    frames: u64,

    #[arg(long, default_value_t = 0, help = "Minimum update cost in µs")]
    update_cost: i64,

    #[arg(long, default_value_t = 0, help = "Minimum draw cost in µs")]
    draw_cost: i64,

    #[arg(long, default_value_t = 500, help = "GPU time per frame in µs")]
    gpu_cost: i64,

    #[arg(long, default_value_t = 0, help = "Random extra GPU time in µs")]
    gpu_jitter: i64,

    #[arg(long, help = "Run on a simulated clock instead of wall time")]
    simulated: bool,

    #[arg(long)]
    headless: bool,
}

struct Bench<C> {
    pacer: FramePacer<C, InputState>,
    display: SimulatedDisplay<C>,
    input: ScriptedInput<C>,
    scene: Box<dyn Scene>,
}

impl<C: Clock + Clone> Bench<C> {
    fn new(clock: C, args: &Args) -> Result<Self> {
        let config = PacerConfig {
            update_rate: args.update_rate,
            policy: args.policy.into(),
            mitigation: args.mitigation.into(),
            simulated_update_cost_us: args.update_cost,
            simulated_draw_cost_us: args.draw_cost,
            ..Default::default()
        };
        let display_config = DisplayConfig {
            refresh_rate: args.refresh_rate,
            sync: args.sync,
            gpu_cost_us: args.gpu_cost,
            jitter_us: args.gpu_jitter,
            ..Default::default()
        };

        Ok(Self {
            pacer: FramePacer::new(clock.clone(), config)?,
            display: SimulatedDisplay::new(clock.clone(), display_config),
            input: ScriptedInput::new(clock, TapScript::default()),
            scene: args.scene.build(),
        })
    }

    fn frame(&mut self) {
        self.pacer.frame(
            &mut self.scene,
            &mut self.input,
            &mut self.display,
            |scene, display| scene.draw(display),
        );
    }

    fn run_headless(&mut self, frames: u64) {
        let running = AtomicBool::new(frames > 0);
        let mut drawn = 0;
        let started = Instant::now();

        self.pacer.run(
            &mut self.scene,
            &mut self.input,
            &mut self.display,
            |scene, display| {
                scene.draw(display);
                drawn += 1;
                if drawn >= frames {
                    running.store(false, Ordering::SeqCst);
                }
            },
            &running,
        );

        let stats = self.pacer.stats();
        log::info!(
            "{} frames in {:.2}s wall, {}µs simulated",
            drawn,
            started.elapsed().as_secs_f64(),
            self.pacer.clock().now()
        );
        log::info!(
            "{:.1} fps, iteration {}µs, update {}µs (max {}µs), draw {}µs (max {}µs)",
            stats.frame_rate,
            stats.average_iteration_us,
            stats.update_cost_avg_us,
            stats.update_cost_max_us,
            stats.draw_cost_avg_us,
            stats.draw_cost_max_us
        );
        log::info!(
            "missed {} frames, min slack {}µs, predicted wait {}µs",
            stats.missed_frames,
            stats.min_slack_us,
            stats.predicted_wait_us
        );
        log::info!(
            "{} presented, {} torn, {} rectangles",
            self.display.presented(),
            self.display.torn(),
            self.display.total_rects()
        );
        if let Some(status) = self.scene.status() {
            log::info!("{}: {}", self.scene.name(), status);
        }
    }
}

fn main() -> Result<()> {
    let args = Args::parse();

    if args.simulated {
        start(ManualClock::new(), &args)
    } else {
        start(MonotonicClock::new(), &args)
    }
}

fn start<C: Clock + Clone>(clock: C, args: &Args) -> Result<()> {
    let mut bench = Bench::new(clock, args)?;

    if args.headless {
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
        log::info!(
            "{} on {} Hz {} sync, {} at {} Hz, mitigation {}",
            bench.scene.name(),
            args.refresh_rate,
            args.sync,
            bench.pacer.config().policy,
            args.update_rate,
            bench.pacer.config().mitigation
        );
        bench.run_headless(args.frames);
    } else {
        run_with_tui(&mut bench)?;
    }

    Ok(())
}

fn run_with_tui<C: Clock + Clone>(bench: &mut Bench<C>) -> Result<()> {
    terminal::enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, cursor::Hide)?;

    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let reset: Rc<Cell<bool>> = bench.input.reset_handle();
    let mut last_draw: Option<Instant> = None;

    loop {
        bench.frame();

        if event::poll(Duration::ZERO)? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press {
                    match key.code {
                        KeyCode::Char('q') | KeyCode::Esc => break,
                        KeyCode::Char('p') => {
                            let policy = bench.pacer.config().policy.next();
                            bench.pacer.set_policy(policy);
                        }
                        KeyCode::Char('m') => {
                            let mitigation = bench.pacer.config().mitigation.next();
                            bench.pacer.set_mitigation(mitigation);
                        }
                        KeyCode::Char('v') => {
                            let sync = bench.display.sync_mode().next();
                            bench.display.set_sync_mode(sync);
                            bench.pacer.resynchronize();
                        }
                        KeyCode::Char('r') => reset.set(true),
                        _ => {}
                    }
                }
            }
        }

        if last_draw.is_none_or(|at| at.elapsed() >= DASHBOARD_INTERVAL) {
            let stats = bench.pacer.stats();
            let dashboard = Dashboard {
                stats: &stats,
                scene: bench.scene.name(),
                scene_status: bench.scene.status(),
                sync: bench.display.sync_mode(),
                rects: bench.display.frame_rects().len(),
                presented: bench.display.presented(),
                torn: bench.display.torn(),
            };
            terminal.draw(|frame| tui::render(frame, &dashboard))?;
            last_draw = Some(Instant::now());
        }
    }

    terminal::disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen, cursor::Show)?;

    Ok(())
}
