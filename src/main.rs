//! Titan's Arena headless demo
//!
//! Pits a scripted player against the boss at the fixed tick rate and logs
//! the outcome. Usage: `titan-arena [config.json]`

use std::process::ExitCode;

use titan_arena::consts::SIM_TPS;
use titan_arena::sim::{BossState, GamePhase, GameSnapshot, GameState, PlayerState, TickInput, tick};
use titan_arena::{GameConfig, ticks_to_secs};

/// Give up after five simulated minutes
const MAX_TICKS: u64 = SIM_TPS as u64 * 60 * 5;
const MELEE_RANGE: f64 = 110.0;
const SHOOT_RANGE: f64 = 350.0;

fn load_config() -> Result<GameConfig, titan_arena::ConfigError> {
    match std::env::args().nth(1) {
        Some(path) => GameConfig::load(path),
        None => Ok(GameConfig::default()),
    }
}

/// Attract-mode player: close in and swing, shoot from range, hop over
/// slams and charges. Buttons are pulsed so each press is a fresh edge.
fn autopilot(view: &GameSnapshot, t: u64) -> TickInput {
    let player = &view.player;
    let boss = &view.boss;
    let dx = boss.position.x - player.position.x;
    let distance = dx.abs();
    let toward = dx.signum();
    let pulse = t % 2 == 0;

    let danger = matches!(boss.state, BossState::Slam | BossState::Charge)
        || boss.attack_hitbox.is_some();
    let low_health = player.health < player.max_health * 0.3;

    let mut input = TickInput::default();
    if danger {
        input.horizontal = -toward;
        input.jump = pulse && distance < 250.0;
        input.dash = pulse && player.stamina > 50.0 && distance < 150.0;
        return input;
    }

    if distance > MELEE_RANGE && !(low_health && distance < SHOOT_RANGE) {
        input.horizontal = toward;
    } else if low_health {
        input.horizontal = -toward;
    }

    if distance <= MELEE_RANGE {
        input.attack = pulse && player.state != PlayerState::Attacking;
    } else if distance >= SHOOT_RANGE {
        input.shoot = pulse && player.stamina > 40.0;
        input.special = t % 240 == 0 && player.stamina > 80.0;
    }
    input
}

fn run(config: &GameConfig) -> Result<GamePhase, titan_arena::combat::EventSystemError> {
    let mut state = GameState::new(config)?;

    let mut t = 0;
    while t < MAX_TICKS && !state.phase.is_over() {
        let view = state.snapshot();
        let input = autopilot(&view, t);
        tick(&mut state, &input);

        // A real host would play these
        state.audio.drain();
        state.drain_haptics();

        if t % (SIM_TPS as u64 * 10) == 0 {
            log::debug!(
                "t={:.0}s player {:.0} hp, boss {:.0} hp ({}), {} projectiles",
                ticks_to_secs(t),
                state.player.health,
                state.boss.health,
                state.boss.phase.as_str(),
                state.projectiles.active_count(),
            );
        }
        t += 1;
    }

    state.shutdown();

    let stats = state.stats();
    let projectiles = state.projectiles.stats();
    log::info!(
        "Outcome: {:?} after {:.1}s ({} frozen ticks)",
        state.phase,
        state.elapsed_secs(),
        state.frozen_ticks
    );
    log::info!(
        "Player dealt {:.0}, took {:.0}; {} landed / {} missed ({:.0}% accuracy), best combo {}, {} crits",
        stats.player_damage_dealt,
        stats.player_damage_taken,
        stats.player_attacks_landed,
        stats.player_attacks_missed,
        stats.player_accuracy() * 100.0,
        stats.highest_combo,
        stats.critical_hits,
    );
    log::info!(
        "Boss dealt {:.0}; {} landed / {} missed; {} events, {} dropped",
        stats.boss_damage_dealt,
        stats.boss_attacks_landed,
        stats.boss_attacks_missed,
        stats.total_events,
        state.events.dropped_events(),
    );
    log::info!(
        "Projectiles: {} allocated, {} reused",
        projectiles.created,
        projectiles.reused
    );
    Ok(state.phase)
}

fn main() -> ExitCode {
    #[cfg(not(target_arch = "wasm32"))]
    env_logger::init();
    log::info!("Titan's Arena (headless) starting...");

    let config = match load_config() {
        Ok(config) => config,
        Err(err) => {
            log::error!("{err}");
            return ExitCode::FAILURE;
        }
    };

    match run(&config) {
        Ok(GamePhase::Playing) => {
            log::warn!("Time limit reached with the fight undecided");
            ExitCode::SUCCESS
        }
        Ok(_) => ExitCode::SUCCESS,
        Err(err) => {
            log::error!("{err}");
            ExitCode::FAILURE
        }
    }
}
