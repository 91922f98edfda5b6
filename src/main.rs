//! Rolling Snow headless runner
//!
//! Runs the simulation at a fixed timestep with the autopilot steering and
//! logs a summary. Usage:
//!
//! `rolling-snow [settings.json | easy | normal | hard] [seed] [seconds]`

use std::process::ExitCode;

use rolling_snow::consts::{MAX_SUBSTEPS, SIM_DT};
use rolling_snow::settings::DifficultyPreset;
use rolling_snow::sim::{GameEvent, GamePhase, GameState, TickInput, tick};
use rolling_snow::{Settings, SimResult};

/// Simulated frame length fed to the accumulator (uneven on purpose)
const FRAME_TIMES: [f32; 3] = [1.0 / 60.0, 1.0 / 45.0, 1.0 / 90.0];

struct Runner {
    state: GameState,
    accumulator: f32,
    input: TickInput,
    recycled: u64,
}

impl Runner {
    fn new(settings: Settings, seed: u64) -> SimResult<Self> {
        Ok(Self {
            state: GameState::new(settings, seed)?,
            accumulator: 0.0,
            input: TickInput {
                autopilot: true,
                ..Default::default()
            },
            recycled: 0,
        })
    }

    /// Run simulation ticks for one frame
    fn update(&mut self, dt: f32) -> SimResult<()> {
        let dt = dt.min(0.1);
        self.accumulator += dt;

        let mut substeps = 0;
        while self.accumulator >= SIM_DT && substeps < MAX_SUBSTEPS {
            tick(&mut self.state, &self.input, SIM_DT)?;
            self.accumulator -= SIM_DT;
            substeps += 1;

            for event in &self.state.events {
                match event {
                    GameEvent::SegmentRecycled(id) => {
                        self.recycled += 1;
                        log::trace!("{} recycled", id);
                    }
                    GameEvent::GameOver { score } | GameEvent::Cleared { score } => {
                        log::info!("Run ended at tick {} with score {:.1}", self.state.time_ticks, score);
                    }
                }
            }
            if !self.state.is_playing() {
                break;
            }
        }
        Ok(())
    }
}

fn parse_settings(arg: Option<&String>) -> SimResult<Settings> {
    match arg {
        None => Ok(Settings::default()),
        Some(name) => match DifficultyPreset::from_name(name) {
            Some(preset) => {
                log::info!("Using {} preset", preset.as_str());
                Ok(Settings::from_preset(preset))
            }
            None => Settings::load(name),
        },
    }
}

fn run(args: &[String]) -> SimResult<()> {
    let settings = parse_settings(args.first())?;
    let seed = args.get(1).and_then(|s| s.parse().ok()).unwrap_or(12345);
    let seconds: f32 = args.get(2).and_then(|s| s.parse().ok()).unwrap_or(120.0);

    log::info!("Rolling Snow (headless) starting: seed {}, {}s", seed, seconds);
    let mut runner = Runner::new(settings, seed)?;

    let mut wall = 0.0;
    let mut frame = 0;
    while wall < seconds && runner.state.is_playing() {
        let dt = FRAME_TIMES[frame % FRAME_TIMES.len()];
        runner.update(dt)?;
        wall += dt;
        frame += 1;
    }

    let state = &runner.state;
    let outcome = match state.phase {
        GamePhase::Playing => "survived",
        GamePhase::GameOver => "game over",
        GamePhase::Cleared => "cleared",
    };
    log::info!(
        "Finished ({}): score {:.1}, {} ticks, {} segments recycled, pool {}/{} active",
        outcome,
        state.score,
        state.time_ticks,
        runner.recycled,
        state.track.pool().active_count(),
        state.track.pool().total_count()
    );
    println!(
        "{} score={:.1} ticks={} recycled={}",
        outcome, state.score, state.time_ticks, runner.recycled
    );
    Ok(())
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            log::error!("{}", err);
            ExitCode::FAILURE
        }
    }
}
