//! Game state and the render-facing snapshot
//!
//! Everything the fight needs lives in `GameState`; there is no module-level
//! mutable state. The tick thread owns it exclusively. Only the effect
//! managers and the sound queue are shared, with the combat event listeners.

use std::sync::Arc;

use glam::DVec2;
use serde::{Deserialize, Serialize};

use super::arena::Arena;
use super::boss::{Boss, BossPhase, BossState};
use super::dodge::DodgeSystem;
use super::input::{Controller, Haptic};
use super::math::Rect;
use super::player::{Player, PlayerState};
use super::projectile::{Owner, Projectile};
use super::projectile_manager::{ProjectileManager, ProjectileStats};
use crate::audio::{SoundEffect, SoundQueue};
use crate::combat::{CombatEventKind, CombatStats, DamageCalculator, EventSystem, EventSystemError};
use crate::effects::{
    BLOOD_COLOR, CRIT_COLOR, DUST_COLOR, EffectKind, Effects, Particle, SPARK_COLOR, VisualEffect,
};
use crate::settings::GameConfig;

/// Current phase of the fight
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum GamePhase {
    #[default]
    Playing,
    Paused,
    /// Boss defeated
    Victory,
    /// Player died
    GameOver,
}

impl GamePhase {
    pub fn is_over(self) -> bool {
        matches!(self, GamePhase::Victory | GamePhase::GameOver)
    }
}

pub struct GameState {
    pub config: GameConfig,
    pub phase: GamePhase,
    /// Simulated ticks (frozen and paused ticks excluded)
    pub time_ticks: u64,
    /// Ticks skipped by hit stop
    pub frozen_ticks: u64,
    pub arena: Arena,
    pub player: Player,
    pub boss: Boss,
    pub dodge: DodgeSystem,
    pub controller: Controller,
    pub projectiles: ProjectileManager,
    pub events: EventSystem,
    pub damage: DamageCalculator,
    pub effects: Arc<Effects>,
    pub audio: Arc<SoundQueue>,
}

impl GameState {
    /// Build a fight from `config` and start its event consumer
    pub fn new(config: &GameConfig) -> Result<Self, EventSystemError> {
        let arena = Arena::default();
        let screen = DVec2::new(arena.width, arena.height);

        let mut state = Self {
            config: config.clone(),
            phase: GamePhase::Playing,
            time_ticks: 0,
            frozen_ticks: 0,
            player: Player::new(&config.player),
            boss: Boss::new(&config.boss, config.seed),
            dodge: DodgeSystem::new(&config.boss.dodge),
            controller: Controller::new(&config.input),
            projectiles: ProjectileManager::new(&config.projectiles, screen),
            events: EventSystem::new(config.combat.event_buffer),
            damage: DamageCalculator::new(&config.combat, config.seed.wrapping_add(1)),
            effects: Arc::new(Effects::new(config)),
            audio: Arc::new(SoundQueue::new()),
            arena,
        };

        state.register_listeners();
        state.events.start()?;
        log::info!(
            "Fight started (seed {}, quality {})",
            config.seed,
            config.quality.as_str()
        );
        Ok(state)
    }

    /// Cosmetic reactions to combat events, run on the event consumer thread
    fn register_listeners(&self) {
        let counts = self.config.effects.clone();

        let (effects, audio) = (Arc::clone(&self.effects), Arc::clone(&self.audio));
        let hit_particles = counts.hit_particles;
        self.events.add_listener(CombatEventKind::AttackLanded, move |event| {
            effects.visuals.spawn(EffectKind::HitSpark, event.position, SPARK_COLOR);
            effects.particles.emit(event.position, hit_particles, SPARK_COLOR);
            audio.play(SoundEffect::Hit);
        });

        let effects = Arc::clone(&self.effects);
        let critical_particles = counts.critical_particles;
        self.events.add_listener(CombatEventKind::CriticalHit, move |event| {
            effects.visuals.spawn(EffectKind::Impact, event.position, CRIT_COLOR);
            effects.particles.emit(event.position, critical_particles, CRIT_COLOR);
        });

        let effects = Arc::clone(&self.effects);
        self.events.add_listener(CombatEventKind::ComboIncreased, move |event| {
            effects.visuals.spawn(EffectKind::Slash, event.position, SPARK_COLOR);
        });

        let (effects, audio) = (Arc::clone(&self.effects), Arc::clone(&self.audio));
        self.events.add_listener(CombatEventKind::DamageTaken, move |event| {
            if event.target == Owner::Player {
                effects.particles.emit(event.position, 4, BLOOD_COLOR);
                audio.play(SoundEffect::PlayerHurt);
            }
        });

        let (effects, audio) = (Arc::clone(&self.effects), Arc::clone(&self.audio));
        let kill_particles = counts.kill_particles;
        self.events.add_listener(CombatEventKind::Kill, move |event| {
            effects.visuals.spawn(EffectKind::Explosion, event.position, CRIT_COLOR);
            effects.particles.emit(event.position, kill_particles, CRIT_COLOR);
            audio.play(SoundEffect::Explosion);
            audio.play(match event.target {
                Owner::Boss => SoundEffect::Victory,
                Owner::Player => SoundEffect::GameOver,
            });
        });

        let effects = Arc::clone(&self.effects);
        let dodge_particles = counts.dodge_particles;
        self.events.add_listener(CombatEventKind::Dodge, move |event| {
            effects.particles.emit(event.position, dodge_particles, DUST_COLOR);
        });
    }

    /// Render-facing copy of everything on screen
    pub fn snapshot(&self) -> GameSnapshot {
        let player = &self.player;
        let boss = &self.boss;

        GameSnapshot {
            tick: self.time_ticks,
            phase: self.phase,
            player: PlayerView {
                position: player.position,
                size: player.size,
                state: player.state,
                facing: player.facing,
                health: player.health,
                max_health: player.max_health,
                stamina: player.stamina,
                max_stamina: player.max_stamina,
                combo: player.combo,
                invulnerable: player.is_invulnerable(),
                attack_hitbox: player.attack_hitbox(),
                down_air_hitbox: player.down_air_hitbox(),
            },
            boss: BossView {
                position: boss.position,
                size: boss.size,
                state: boss.state,
                phase: boss.phase,
                facing: boss.facing,
                health: boss.health,
                max_health: boss.max_health,
                invulnerable: boss.invulnerable,
                attack_hitbox: boss.attack_hitbox(),
                slam_hitbox: boss.slam_hitbox(),
                charge_hitbox: boss.charge_hitbox(),
            },
            projectiles: self.projectiles.active_projectiles(),
            particles: self.effects.particles.particles(),
            effects: self.effects.visuals.active_effects(),
            shake_offset: self.effects.shake.offset(),
            stats: self.events.stats(),
            projectile_stats: self.projectiles.stats(),
        }
    }

    /// Haptic requests queued since the last call, for the host to play
    pub fn drain_haptics(&mut self) -> Vec<Haptic> {
        self.controller.drain_haptics()
    }

    pub fn stats(&self) -> CombatStats {
        self.events.stats()
    }

    pub fn elapsed_secs(&self) -> f64 {
        crate::ticks_to_secs(self.time_ticks)
    }

    /// Drain the event bus and stop background workers. Safe to call twice.
    pub fn shutdown(&mut self) {
        self.events.stop();
        self.projectiles.shutdown();
        self.effects.clear();
    }
}

impl std::fmt::Debug for GameState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GameState")
            .field("phase", &self.phase)
            .field("time_ticks", &self.time_ticks)
            .field("player", &self.player.state)
            .field("boss", &self.boss.state)
            .field("boss_phase", &self.boss.phase)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerView {
    pub position: DVec2,
    pub size: DVec2,
    pub state: PlayerState,
    pub facing: f64,
    pub health: f64,
    pub max_health: f64,
    pub stamina: f64,
    pub max_stamina: f64,
    pub combo: u32,
    pub invulnerable: bool,
    pub attack_hitbox: Option<Rect>,
    pub down_air_hitbox: Option<Rect>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BossView {
    pub position: DVec2,
    pub size: DVec2,
    pub state: BossState,
    pub phase: BossPhase,
    pub facing: f64,
    pub health: f64,
    pub max_health: f64,
    pub invulnerable: bool,
    pub attack_hitbox: Option<Rect>,
    pub slam_hitbox: Option<Rect>,
    pub charge_hitbox: Option<Rect>,
}

/// Plain-data frame for the renderer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameSnapshot {
    pub tick: u64,
    pub phase: GamePhase,
    pub player: PlayerView,
    pub boss: BossView,
    pub projectiles: Vec<Projectile>,
    pub particles: Vec<Particle>,
    pub effects: Vec<VisualEffect>,
    pub shake_offset: DVec2,
    pub stats: CombatStats,
    pub projectile_stats: ProjectileStats,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_state() {
        let mut state = GameState::new(&GameConfig::default()).unwrap();
        assert_eq!(state.phase, GamePhase::Playing);
        assert!(state.events.is_running());
        assert_eq!(state.player.health, 100.0);
        assert_eq!(state.boss.health, 1000.0);
        assert_eq!(state.boss.phase, BossPhase::Phase1);
        state.shutdown();
        assert!(!state.events.is_running());
        state.shutdown();
    }

    #[test]
    fn test_snapshot_serializes() {
        let mut state = GameState::new(&GameConfig::dev()).unwrap();
        let snapshot = state.snapshot();
        assert_eq!(snapshot.boss.max_health, 200.0);
        assert!(snapshot.player.attack_hitbox.is_none());
        assert!(snapshot.projectiles.is_empty());

        let json = serde_json::to_string(&snapshot).unwrap();
        let back: GameSnapshot = serde_json::from_str(&json).unwrap();
        assert_eq!(back.player.position, snapshot.player.position);
        state.shutdown();
    }

    #[test]
    fn test_listeners_feed_effects_and_audio() {
        use crate::combat::CombatEvent;

        let mut state = GameState::new(&GameConfig::default()).unwrap();
        state.events.emit(
            CombatEvent::new(CombatEventKind::AttackLanded, Owner::Player, Owner::Boss)
                .with_damage(10.0)
                .at(DVec2::new(500.0, 500.0)),
        );
        state.events.emit(
            CombatEvent::new(CombatEventKind::Kill, Owner::Player, Owner::Boss)
                .at(DVec2::new(500.0, 500.0)),
        );
        state.events.stop();

        assert_eq!(state.effects.visuals.len(), 2);
        assert_eq!(state.effects.particles.len(), 8 + 40);
        let sounds: Vec<_> = state.audio.drain().into_iter().map(|s| s.effect).collect();
        assert_eq!(
            sounds,
            vec![SoundEffect::Hit, SoundEffect::Explosion, SoundEffect::Victory]
        );
        state.shutdown();
    }
}
