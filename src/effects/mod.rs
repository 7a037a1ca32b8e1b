//! Cosmetic feedback: particles, sprite effects, screen shake, hit stop
//!
//! Each manager is independently locked so event listeners can feed them from
//! the consumer thread while the tick thread updates and snapshots them.

pub mod hit_stop;
pub mod particle;
pub mod shake;
pub mod visual;

pub use hit_stop::HitStop;
pub use particle::{Particle, ParticleSystem};
pub use shake::ScreenShake;
pub use visual::{EffectKind, EffectManager, VisualEffect};

use crate::settings::GameConfig;

pub const SPARK_COLOR: [u8; 4] = [255, 230, 120, 255];
pub const CRIT_COLOR: [u8; 4] = [255, 120, 40, 255];
pub const BLOOD_COLOR: [u8; 4] = [200, 30, 40, 255];
pub const DUST_COLOR: [u8; 4] = [170, 160, 150, 255];

#[derive(Debug)]
pub struct Effects {
    pub particles: ParticleSystem,
    pub visuals: EffectManager,
    pub shake: ScreenShake,
    pub hit_stop: HitStop,
}

impl Effects {
    pub fn new(config: &GameConfig) -> Self {
        Self {
            particles: ParticleSystem::new(
                config.max_particles(),
                config.effects.particle_gravity,
                config.seed ^ 0x5041_5254,
            ),
            visuals: EffectManager::new(config.max_effects()),
            shake: ScreenShake::new(config.effects.shake_decay, config.seed ^ 0x5348_414b),
            hit_stop: HitStop::new(),
        }
    }

    /// Per-tick update of the cosmetic managers. Hit stop is advanced by the tick loop.
    pub fn update(&self) {
        self.particles.update();
        self.visuals.update();
        self.shake.update();
    }

    pub fn clear(&self) {
        self.particles.clear();
        self.visuals.clear();
        self.shake.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::DVec2;

    #[test]
    fn test_capacity_follows_quality() {
        let mut config = GameConfig::default();
        config.quality = crate::QualityPreset::Low;
        let effects = Effects::new(&config);
        assert_eq!(effects.particles.capacity(), 100);
        assert_eq!(effects.particles.emit(DVec2::ZERO, 500, SPARK_COLOR), 100);
    }

    #[test]
    fn test_clear() {
        let effects = Effects::new(&GameConfig::default());
        effects.particles.emit(DVec2::ZERO, 5, DUST_COLOR);
        effects.visuals.spawn(EffectKind::Impact, DVec2::ZERO, DUST_COLOR);
        effects.shake.start(5.0, 10);
        effects.update();
        effects.clear();
        assert!(effects.particles.is_empty());
        assert!(effects.visuals.is_empty());
        assert!(!effects.shake.is_active());
    }
}
