//! Ball Popper entry point
//!
//! Runs a headless demo session: the autoplayer taps balls until the run is
//! won or lost, then the result is recorded on the leaderboard.

use std::path::PathBuf;
use std::process::ExitCode;
use std::time::{SystemTime, UNIX_EPOCH};

use clap::Parser;

use ball_popper::consts::{SIM_DT, SIM_DT_MS};
use ball_popper::sim::{GameEvent, GamePhase, GameState, TickInput, tick};
use ball_popper::{HighScores, Settings};

/// Hard stop for a demo run (one hour of simulated time)
const MAX_RUN_MS: u64 = 60 * 60 * 1000;

#[derive(Parser)]
#[command(name = "ball-popper")]
#[command(about = "Play a headless Ball Popper demo run and record the score")]
struct Args {
    /// Run seed (overrides the settings file; defaults to the clock)
    #[arg(long)]
    seed: Option<u64>,

    /// Settings file
    #[arg(long, default_value = "settings.json")]
    settings: PathBuf,

    /// High score file
    #[arg(long, default_value = "highscores.json")]
    scores: PathBuf,
}

fn unix_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

fn log_event(event: &GameEvent) {
    match event {
        GameEvent::LevelStarted { level, boss } => {
            log::info!("Level {} started{}", level + 1, if *boss { " (boss)" } else { "" });
        }
        GameEvent::LevelCleared { level } => log::info!("Level {} cleared", level + 1),
        GameEvent::BossDefeated { boss_index, bonus } => {
            log::info!("Boss {} defeated, bonus {}", boss_index + 1, bonus);
        }
        GameEvent::PowerUpCollected { kind, .. } => log::debug!("Collected {:?}", kind),
        GameEvent::Won { score } => log::info!("Victory! Final score {}", score),
        GameEvent::Lost { score } => log::info!("Time's up. Final score {}", score),
        _ => {}
    }
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    let settings = Settings::load(&args.settings);
    let seed = args.seed.or(settings.seed).unwrap_or_else(unix_millis);
    log::info!("Ball Popper starting with seed: {}", seed);

    let mut state = GameState::new(seed);
    state.apply_settings(&settings);

    let mut input = TickInput {
        start: true,
        autoplay: true,
        ..Default::default()
    };
    let max_ticks = MAX_RUN_MS / SIM_DT_MS;
    let mut ticks = 0;
    while !matches!(state.phase, GamePhase::Won | GamePhase::Lost) && ticks < max_ticks {
        tick(&mut state, &input, SIM_DT);
        input.start = false;
        for event in state.drain_events() {
            log_event(&event);
        }
        ticks += 1;
    }

    if ticks >= max_ticks {
        log::warn!("Run stopped after {} ticks in phase {:?}", ticks, state.phase);
    }

    let mut scores = HighScores::load(&args.scores);
    if let Some(best) = scores.top_score() {
        log::info!("Best on record: {}", best);
    }
    let won = state.phase == GamePhase::Won;
    match scores.potential_rank(state.score) {
        Some(rank) => {
            log::info!("New high score #{}: {}", rank, state.score);
            scores.add_score(state.score, state.level, won, unix_millis());
            if let Err(e) = scores.save(&args.scores) {
                log::error!("{}", e);
                return ExitCode::FAILURE;
            }
        }
        None => log::info!("Score {} did not make the leaderboard", state.score),
    }

    println!(
        "{} at level {} with {} points in {}",
        if won { "Won" } else { "Lost" },
        state.level + 1,
        state.score,
        state.timer_text()
    );
    ExitCode::SUCCESS
}
