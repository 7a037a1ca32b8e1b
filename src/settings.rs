//! Game configuration
//!
//! Every tuning value the simulation reads lives here. Configs are plain
//! serde data: a JSON file only needs to name the fields it overrides.

use std::path::{Path, PathBuf};

use glam::DVec2;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Configuration loading errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid config JSON: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("invalid config value: {0}")]
    Invalid(String),
}

pub type ConfigResult<T> = Result<T, ConfigError>;

/// Quality preset levels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum QualityPreset {
    Low,
    #[default]
    Medium,
    High,
}

impl QualityPreset {
    pub fn as_str(&self) -> &'static str {
        match self {
            QualityPreset::Low => "Low",
            QualityPreset::Medium => "Medium",
            QualityPreset::High => "High",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "low" => Some(QualityPreset::Low),
            "medium" | "med" => Some(QualityPreset::Medium),
            "high" => Some(QualityPreset::High),
            _ => None,
        }
    }

    /// Maximum live particles for this preset
    pub fn max_particles(&self) -> usize {
        match self {
            QualityPreset::Low => 100,
            QualityPreset::Medium => 500,
            QualityPreset::High => 2000,
        }
    }

    /// Maximum live visual effects (sparks, slashes, impacts)
    pub fn max_effects(&self) -> usize {
        match self {
            QualityPreset::Low => 20,
            QualityPreset::Medium => 50,
            QualityPreset::High => 100,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InputConfig {
    /// Stick values below this magnitude read as zero
    pub deadzone: f64,
    pub jump_buffer_frames: u32,
    pub coyote_frames: u32,
    pub haptics: bool,
}

impl Default for InputConfig {
    fn default() -> Self {
        Self {
            deadzone: 0.2,
            jump_buffer_frames: 5,
            coyote_frames: 6,
            haptics: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlayerConfig {
    pub size: DVec2,
    pub spawn: DVec2,
    pub max_health: f64,
    pub max_stamina: f64,

    // === Movement ===
    pub move_speed: f64,
    pub max_speed: f64,
    pub acceleration: f64,
    /// Acceleration multiplier while airborne
    pub air_control: f64,
    pub ground_friction: f64,
    pub air_friction: f64,
    pub gravity: f64,
    pub max_fall_speed: f64,

    // === Jumping ===
    pub jump_force: f64,
    pub double_jump_force: f64,
    pub max_jumps: u32,
    pub wall_jump_x: f64,
    pub wall_jump_y: f64,
    /// Wall climb launches at `jump_force * wall_climb_multiplier`
    pub wall_climb_multiplier: f64,
    pub wall_climb_cooldown: u32,
    /// Cooldown after a wall jump before the wall can be used again
    pub wall_stick_frames: u32,
    pub wall_slide_speed: f64,
    pub wall_slide_gravity_scale: f64,

    // === Dash ===
    pub dash_speed: f64,
    pub dash_duration: u32,
    pub dash_cooldown: u32,

    // === Attacks ===
    pub attack_duration: u32,
    pub combo_window: u32,
    pub max_combo: u32,
    pub attack_damage_per_combo: f64,
    pub attack_push: f64,
    pub down_air_duration: u32,
    pub down_air_speed: f64,
    pub down_air_damage: f64,
    pub pogo_force: f64,
    pub pogo_stamina_refund: f64,
    pub shot_cooldown: u32,

    // === Stamina costs ===
    pub wall_jump_cost: f64,
    pub wall_climb_cost: f64,
    pub double_jump_cost: f64,
    pub dash_cost: f64,
    pub attack_base_cost: f64,
    pub attack_combo_cost: f64,
    pub down_air_cost: f64,
    pub shot_cost: f64,
    pub charged_shot_cost: f64,
    pub stamina_regen_air: f64,
    pub stamina_regen_ground: f64,

    // === Damage intake ===
    pub hurt_frames: u32,
    pub invulnerability_frames: u32,
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            size: DVec2::new(40.0, 60.0),
            spawn: DVec2::new(300.0, 570.0),
            max_health: 100.0,
            max_stamina: 100.0,

            move_speed: 6.0,
            max_speed: 8.0,
            acceleration: 0.8,
            air_control: 0.6,
            ground_friction: 0.85,
            air_friction: 0.98,
            gravity: 0.6,
            max_fall_speed: 12.0,

            jump_force: 12.0,
            double_jump_force: 10.0,
            max_jumps: 2,
            wall_jump_x: 10.0,
            wall_jump_y: 12.0,
            wall_climb_multiplier: 1.2,
            wall_climb_cooldown: 5,
            wall_stick_frames: 10,
            wall_slide_speed: 1.5,
            wall_slide_gravity_scale: 0.3,

            dash_speed: 15.0,
            dash_duration: 10,
            dash_cooldown: 30,

            attack_duration: 15,
            combo_window: 30,
            max_combo: 3,
            attack_damage_per_combo: 10.0,
            attack_push: 2.0,
            down_air_duration: 20,
            down_air_speed: 8.0,
            down_air_damage: 20.0,
            pogo_force: 10.0,
            pogo_stamina_refund: 10.0,
            shot_cooldown: 12,

            wall_jump_cost: 10.0,
            wall_climb_cost: 15.0,
            double_jump_cost: 20.0,
            dash_cost: 25.0,
            attack_base_cost: 10.0,
            attack_combo_cost: 5.0,
            down_air_cost: 15.0,
            shot_cost: 5.0,
            charged_shot_cost: 30.0,
            stamina_regen_air: 0.5,
            stamina_regen_ground: 1.0,

            hurt_frames: 20,
            invulnerability_frames: 45,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DodgeConfig {
    pub detection_range: f64,
    pub reaction_frames: u32,
    pub speed: f64,
    /// Upward impulse when the sidestep is mostly vertical
    pub hop_force: f64,
    pub cooldown: u32,
}

impl Default for DodgeConfig {
    fn default() -> Self {
        Self {
            detection_range: 200.0,
            reaction_frames: 15,
            speed: 5.0,
            hop_force: 9.0,
            cooldown: 45,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BossConfig {
    pub size: DVec2,
    pub spawn: DVec2,
    pub max_health: f64,
    pub walk_speed: f64,
    pub gravity: f64,
    pub max_fall_speed: f64,
    pub ground_friction: f64,
    /// Horizontal shove applied when hit
    pub knockback_push: f64,
    pub decision_delay: u32,
    pub transition_frames: u32,
    pub stun_duration: u32,
    /// Health fractions at or below which Phase2 / Phase3 begin
    pub phase2_threshold: f64,
    pub phase3_threshold: f64,
    /// Walk and charge speed multipliers per phase
    pub walk_multipliers: [f64; 3],
    pub charge_multipliers: [f64; 3],

    // === Basic attack ===
    pub attack_damage: f64,
    pub attack_range: f64,
    pub attack_cooldown: u32,
    pub attack_windup: u32,
    pub attack_active: u32,
    pub attack_lunge: f64,

    // === Slam ===
    pub slam_damage: f64,
    pub slam_radius: f64,
    pub slam_cooldown: u32,
    pub slam_duration: u32,
    /// Hitbox is live only for the last `slam_active` ticks of the slam
    pub slam_active: u32,
    pub pogo_slam_threshold: u32,

    // === Charge ===
    pub charge_damage: f64,
    pub charge_speed: f64,
    pub charge_cooldown: u32,
    pub charge_duration: u32,

    // === Roar ===
    pub roar_range: f64,
    pub roar_cooldown: u32,
    pub roar_duration: u32,
    pub roar_stun: u32,

    // === Shooting ===
    pub shoot_cooldown: u32,
    pub shoot_windup: u32,
    pub shoot_min_distance: f64,

    pub dodge: DodgeConfig,
}

impl Default for BossConfig {
    fn default() -> Self {
        Self {
            size: DVec2::new(100.0, 120.0),
            spawn: DVec2::new(1000.0, 540.0),
            max_health: 1000.0,
            walk_speed: 2.0,
            gravity: 0.6,
            max_fall_speed: 12.0,
            ground_friction: 0.9,
            knockback_push: 2.0,
            decision_delay: 30,
            transition_frames: 90,
            stun_duration: 60,
            phase2_threshold: 0.66,
            phase3_threshold: 0.33,
            walk_multipliers: [1.0, 1.3, 1.6],
            charge_multipliers: [1.0, 1.2, 1.5],

            attack_damage: 15.0,
            attack_range: 80.0,
            attack_cooldown: 60,
            attack_windup: 15,
            attack_active: 15,
            attack_lunge: 3.0,

            slam_damage: 25.0,
            slam_radius: 150.0,
            slam_cooldown: 180,
            slam_duration: 30,
            slam_active: 15,
            pogo_slam_threshold: 3,

            charge_damage: 30.0,
            charge_speed: 10.0,
            charge_cooldown: 240,
            charge_duration: 60,

            roar_range: 200.0,
            roar_cooldown: 300,
            roar_duration: 45,
            roar_stun: 60,

            shoot_cooldown: 120,
            shoot_windup: 20,
            shoot_min_distance: 400.0,

            dodge: DodgeConfig::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CombatConfig {
    pub critical_chance: f64,
    pub critical_multiplier: f64,
    /// Damage is scaled by a uniform draw in `1 ± damage_variance`
    pub damage_variance: f64,
    pub base_knockback: f64,
    pub hit_stop_frames: u32,
    pub critical_hit_stop_frames: u32,
    pub screen_shake_intensity: f64,
    pub screen_shake_frames: u32,
    pub event_buffer: usize,
}

impl Default for CombatConfig {
    fn default() -> Self {
        Self {
            critical_chance: 0.15,
            critical_multiplier: 1.5,
            damage_variance: 0.1,
            base_knockback: 8.0,
            hit_stop_frames: 3,
            critical_hit_stop_frames: 6,
            screen_shake_intensity: 6.0,
            screen_shake_frames: 12,
            event_buffer: 100,
        }
    }
}

/// How the projectile manager fans out once the parallel threshold is reached
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum UpdateStrategy {
    /// Scoped data-parallel update, joined before the tick continues
    #[default]
    Scoped,
    /// Persistent worker pool with a bounded job queue
    WorkerPool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProjectileConfig {
    pub parallel_threshold: usize,
    pub pool_capacity: usize,
    pub bounds_margin: f64,
    pub strategy: UpdateStrategy,
    pub workers: usize,
    pub worker_queue: usize,
}

impl Default for ProjectileConfig {
    fn default() -> Self {
        Self {
            parallel_threshold: 30,
            pool_capacity: 100,
            bounds_margin: 50.0,
            strategy: UpdateStrategy::Scoped,
            workers: 4,
            worker_queue: 100,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EffectsConfig {
    pub particle_gravity: f64,
    /// Shake intensity multiplier per elapsed tick
    pub shake_decay: f64,
    pub hit_particles: usize,
    pub critical_particles: usize,
    pub kill_particles: usize,
    pub dodge_particles: usize,
}

impl Default for EffectsConfig {
    fn default() -> Self {
        Self {
            particle_gravity: 0.2,
            shake_decay: 0.95,
            hit_particles: 8,
            critical_particles: 15,
            kill_particles: 40,
            dodge_particles: 6,
        }
    }
}

/// Top-level configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    /// Seed for every RNG in the simulation
    pub seed: u64,
    pub quality: QualityPreset,
    pub input: InputConfig,
    pub player: PlayerConfig,
    pub boss: BossConfig,
    pub combat: CombatConfig,
    pub projectiles: ProjectileConfig,
    pub effects: EffectsConfig,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            seed: 0x7174_a2e4,
            quality: QualityPreset::Medium,
            input: InputConfig::default(),
            player: PlayerConfig::default(),
            boss: BossConfig::default(),
            combat: CombatConfig::default(),
            projectiles: ProjectileConfig::default(),
            effects: EffectsConfig::default(),
        }
    }
}

impl GameConfig {
    /// Development preset: weak boss, faster iteration
    pub fn dev() -> Self {
        let mut config = Self::default();
        config.boss.max_health = 200.0;
        config
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn from_json(json: &str) -> ConfigResult<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a JSON config file
    pub fn load(path: impl AsRef<Path>) -> ConfigResult<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_json(&json)?;
        log::info!("Loaded config from {}", path.display());
        Ok(config)
    }

    pub fn to_json(&self) -> ConfigResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn validate(&self) -> ConfigResult<()> {
        fn check(ok: bool, what: &str) -> ConfigResult<()> {
            if ok {
                Ok(())
            } else {
                log::warn!("Rejected config: {what}");
                Err(ConfigError::Invalid(what.to_string()))
            }
        }

        check(
            (0.0..1.0).contains(&self.input.deadzone),
            "input.deadzone must be in [0, 1)",
        )?;
        check(self.player.max_health > 0.0, "player.max_health must be positive")?;
        check(self.player.max_stamina >= 0.0, "player.max_stamina must not be negative")?;
        check(self.player.max_combo >= 1, "player.max_combo must be at least 1")?;
        check(self.boss.max_health > 0.0, "boss.max_health must be positive")?;
        check(
            self.boss.phase3_threshold < self.boss.phase2_threshold,
            "boss.phase3_threshold must be below boss.phase2_threshold",
        )?;
        for (frames, what) in [
            (self.player.hurt_frames, "player.hurt_frames must be at least 1"),
            (self.player.dash_duration, "player.dash_duration must be at least 1"),
            (self.player.attack_duration, "player.attack_duration must be at least 1"),
            (self.player.down_air_duration, "player.down_air_duration must be at least 1"),
            (self.boss.transition_frames, "boss.transition_frames must be at least 1"),
            (self.boss.stun_duration, "boss.stun_duration must be at least 1"),
            (self.boss.attack_active, "boss.attack_active must be at least 1"),
            (self.boss.slam_duration, "boss.slam_duration must be at least 1"),
            (self.boss.charge_duration, "boss.charge_duration must be at least 1"),
            (self.boss.roar_duration, "boss.roar_duration must be at least 1"),
            (self.boss.roar_stun, "boss.roar_stun must be at least 1"),
            (self.boss.shoot_windup, "boss.shoot_windup must be at least 1"),
        ] {
            check(frames >= 1, what)?;
        }
        check(
            self.boss.slam_active <= self.boss.slam_duration,
            "boss.slam_active must not exceed boss.slam_duration",
        )?;
        check(
            (0.0..=1.0).contains(&self.combat.critical_chance),
            "combat.critical_chance must be in [0, 1]",
        )?;
        check(self.combat.event_buffer >= 1, "combat.event_buffer must be at least 1")?;
        check(
            self.projectiles.parallel_threshold >= 1,
            "projectiles.parallel_threshold must be at least 1",
        )?;
        check(
            self.effects.shake_decay > 0.0 && self.effects.shake_decay <= 1.0,
            "effects.shake_decay must be in (0, 1]",
        )?;
        check(self.projectiles.workers >= 1, "projectiles.workers must be at least 1")?;
        check(
            self.projectiles.worker_queue >= 1,
            "projectiles.worker_queue must be at least 1",
        )?;
        Ok(())
    }

    /// Effective particle cap
    pub fn max_particles(&self) -> usize {
        self.quality.max_particles()
    }

    pub fn max_effects(&self) -> usize {
        self.quality.max_effects()
    }
}
