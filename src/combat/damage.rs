//! Damage and knockback math

use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use crate::settings::CombatConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum DamageType {
    #[default]
    Physical,
    Magic,
    /// Fixed damage: no critical scaling, no variance
    True,
}

/// Seeded damage roller. One instance per fight keeps replays deterministic.
#[derive(Debug, Clone)]
pub struct DamageCalculator {
    rng: Pcg32,
    critical_multiplier: f64,
    variance: f64,
}

impl DamageCalculator {
    pub fn new(config: &CombatConfig, seed: u64) -> Self {
        Self {
            rng: Pcg32::seed_from_u64(seed),
            critical_multiplier: config.critical_multiplier,
            variance: config.damage_variance,
        }
    }

    /// `round(base * combo * crit * U(1 - variance, 1 + variance))`, never below 1
    pub fn calculate_damage(
        &mut self,
        base: f64,
        damage_type: DamageType,
        critical: bool,
        combo_multiplier: f64,
    ) -> f64 {
        let mut damage = base * combo_multiplier;

        if damage_type != DamageType::True {
            if critical {
                damage *= self.critical_multiplier;
            }
            let roll: f64 = self.rng.random();
            damage *= 1.0 - self.variance + roll * 2.0 * self.variance;
        }

        damage.round().max(1.0)
    }

    pub fn roll_critical(&mut self, chance: f64) -> bool {
        self.rng.random::<f64>() < chance
    }

    /// Knockback magnitude grows with the damage dealt
    pub fn calculate_knockback(damage: f64, base: f64) -> f64 {
        base * (1.0 + damage / 100.0)
    }
}
