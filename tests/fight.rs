//! Whole-fight tests through the public tick loop

use titan_arena::GameConfig;
use titan_arena::settings::UpdateStrategy;
use titan_arena::sim::{GamePhase, GameState, PlayerState, TickInput, tick};

/// Busy but blind input: runs back and forth mashing every button
fn mash(t: u64) -> TickInput {
    TickInput {
        horizontal: if (t / 90) % 2 == 0 { 1.0 } else { -1.0 },
        vertical: if t % 61 < 6 { 1.0 } else { 0.0 },
        jump: t % 37 < 5,
        attack: t % 9 == 0,
        dash: t % 113 == 50,
        special: t % 301 == 150,
        shoot: t % 23 == 11,
        pause: false,
    }
}

#[test]
fn test_long_fight_stays_in_bounds() {
    let mut config = GameConfig::dev().with_seed(11);
    // Totals are compared below, so nothing may be dropped
    config.combat.event_buffer = 100_000;
    let mut state = GameState::new(&config).unwrap();
    let mut phase = state.boss.phase;

    for t in 0..5_000 {
        tick(&mut state, &mash(t));

        let player = &state.player;
        assert!(player.stamina >= 0.0 && player.stamina <= player.max_stamina);
        assert!(player.health >= 0.0 && player.health <= player.max_health);
        assert!(state.boss.health >= 0.0);
        assert!(state.boss.phase >= phase, "boss phase regressed");
        phase = state.boss.phase;

        if player.health == 0.0 {
            assert_eq!(player.state, PlayerState::Dead);
        }
        if state.phase.is_over() {
            break;
        }
    }

    state.shutdown();
    let stats = state.stats();
    assert_eq!(stats.player_damage_dealt, stats.boss_damage_taken);
    assert_eq!(stats.boss_damage_dealt, stats.player_damage_taken);
    assert!(stats.total_events > 0);
}

#[test]
fn test_same_seed_same_fight() {
    let config = GameConfig::default().with_seed(77);
    let run = || {
        let mut state = GameState::new(&config).unwrap();
        for t in 0..2_000 {
            tick(&mut state, &mash(t));
        }
        let snapshot = state.snapshot();
        state.shutdown();
        (snapshot.player, snapshot.boss, snapshot.projectiles, snapshot.phase)
    };
    assert_eq!(run(), run());
}

#[test]
fn test_worker_pool_matches_scoped_update() {
    let mut scoped = GameConfig::default().with_seed(5);
    scoped.projectiles.parallel_threshold = 1;
    let mut pooled = scoped.clone();
    pooled.projectiles.strategy = UpdateStrategy::WorkerPool;

    let run = |config: &GameConfig| {
        let mut state = GameState::new(config).unwrap();
        for t in 0..1_500 {
            tick(&mut state, &mash(t));
        }
        let snapshot = state.snapshot();
        state.shutdown();
        (snapshot.player, snapshot.boss, snapshot.projectiles)
    };
    assert_eq!(run(&scoped), run(&pooled));
}

#[test]
fn test_weak_boss_reaches_later_phases() {
    let mut config = GameConfig::dev().with_seed(3);
    config.boss.max_health = 60.0;
    let mut state = GameState::new(&config).unwrap();

    // Park the player beside the boss, on the arena-centre side, and swing
    let mut seen = vec![state.boss.phase];
    for t in 0..6_000 {
        let side = if state.boss.position.x > state.arena.width / 2.0 { -1.0 } else { 1.0 };
        state.player.health = state.player.max_health;
        state.player.position.x = state.boss.position.x + side * 100.0;
        state.player.facing = -side;
        let input = TickInput {
            attack: t % 4 == 0,
            ..Default::default()
        };
        tick(&mut state, &input);
        if seen.last() != Some(&state.boss.phase) {
            seen.push(state.boss.phase);
        }
        if state.phase.is_over() {
            break;
        }
    }
    state.shutdown();

    // No single swing can take 60 hp, so at least one transition happens first
    assert_eq!(state.phase, GamePhase::Victory);
    assert!(seen.len() >= 2);
    assert!(seen.windows(2).all(|w| w[0] < w[1]));
}

#[test]
fn test_pause_holds_everything() {
    let mut state = GameState::new(&GameConfig::default()).unwrap();
    for t in 0..30 {
        tick(&mut state, &mash(t));
    }
    let pause = TickInput {
        pause: true,
        ..Default::default()
    };
    tick(&mut state, &pause);
    assert_eq!(state.phase, GamePhase::Paused);

    let before = state.snapshot();
    for _ in 0..50 {
        tick(&mut state, &TickInput::default());
    }
    let after = state.snapshot();
    assert_eq!(before.player, after.player);
    assert_eq!(before.boss, after.boss);
    assert_eq!(before.tick, after.tick);
    state.shutdown();
}
