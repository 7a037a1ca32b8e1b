//! Boss entity: three-phase state machine and its decision AI
//!
//! The boss never reaches into the player. It sees a `TargetInfo` snapshot
//! each tick and reports what it wants done to the rest of the world
//! (stun the target, fire a projectile) as `BossIntent`s.

use glam::DVec2;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::arena::{Axis, CollisionWorld, move_axis};
use super::math::{Rect, sign};
use super::projectile::ProjectileKind;
use crate::consts::*;
use crate::settings::BossConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum BossState {
    #[default]
    Idle,
    Walking,
    Jumping,
    Falling,
    Attacking,
    Slam,
    Charge,
    Roar,
    Shooting,
    Stunned,
    Transition,
    Dead,
}

impl BossState {
    /// Timed windows the AI and display-state resolver leave alone
    pub fn is_locked(self) -> bool {
        matches!(
            self,
            BossState::Attacking
                | BossState::Slam
                | BossState::Charge
                | BossState::Roar
                | BossState::Shooting
                | BossState::Stunned
                | BossState::Transition
                | BossState::Dead
        )
    }

    pub fn as_str(self) -> &'static str {
        match self {
            BossState::Idle => "Idle",
            BossState::Walking => "Walking",
            BossState::Jumping => "Jumping",
            BossState::Falling => "Falling",
            BossState::Attacking => "Attacking",
            BossState::Slam => "Slam",
            BossState::Charge => "Charge",
            BossState::Roar => "Roar",
            BossState::Shooting => "Shooting",
            BossState::Stunned => "Stunned",
            BossState::Transition => "Transition",
            BossState::Dead => "Dead",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default)]
pub enum BossPhase {
    #[default]
    Phase1,
    Phase2,
    Phase3,
}

impl BossPhase {
    /// Phase for a health fraction: above `phase2` is Phase1, above `phase3` is Phase2
    pub fn from_health_fraction(fraction: f64, phase2: f64, phase3: f64) -> Self {
        if fraction > phase2 {
            BossPhase::Phase1
        } else if fraction > phase3 {
            BossPhase::Phase2
        } else {
            BossPhase::Phase3
        }
    }

    pub fn index(self) -> usize {
        match self {
            BossPhase::Phase1 => 0,
            BossPhase::Phase2 => 1,
            BossPhase::Phase3 => 2,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            BossPhase::Phase1 => "Phase 1",
            BossPhase::Phase2 => "Phase 2",
            BossPhase::Phase3 => "Phase 3",
        }
    }
}

/// What the AI settled on at its last decision point
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum BossAction {
    #[default]
    Idle,
    Walk,
    Attack,
    Slam,
    Charge,
    Roar,
    Shoot,
}

/// Everything the boss is allowed to know about its target
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct TargetInfo {
    pub position: DVec2,
    pub on_ground: bool,
}

/// Side effects the orchestrator applies after the boss update
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum BossIntent {
    StunTarget {
        ticks: u32,
    },
    Shoot {
        kind: ProjectileKind,
        origin: DVec2,
        direction: DVec2,
    },
}

const ATTACK_REACH: f64 = 50.0;
const ATTACK_WIDTH: f64 = 60.0;
const ATTACK_HEIGHT: f64 = 80.0;
const HURTBOX_INSET: f64 = 10.0;
/// Charge is only legal beyond this distance
const CHARGE_MIN_DISTANCE: f64 = 150.0;
/// Charge is only legal closer than this
const CHARGE_MAX_DISTANCE: f64 = 400.0;

#[derive(Debug, Clone)]
pub struct Boss {
    config: BossConfig,
    rng: Pcg32,

    pub position: DVec2,
    pub velocity: DVec2,
    pub size: DVec2,
    pub state: BossState,
    pub phase: BossPhase,
    /// +1 facing right, -1 facing left
    pub facing: f64,
    pub on_ground: bool,

    pub health: f64,
    pub max_health: f64,
    pub invulnerable: bool,

    next_action: BossAction,
    decision_timer: u32,
    consecutive_pogos: u32,

    attack_cooldown: u32,
    slam_cooldown: u32,
    charge_cooldown: u32,
    roar_cooldown: u32,
    shoot_cooldown: u32,

    attack_time_left: u32,
    slam_time_left: u32,
    charge_time_left: u32,
    roar_time_left: u32,
    shoot_time_left: u32,
    stun_time_left: u32,
    transition_time_left: u32,

    charge_direction: DVec2,
    charge_speed: f64,

    window_connected: bool,
    missed_attacks: u32,
    phase_change: Option<BossPhase>,
    intents: Vec<BossIntent>,
}

impl Boss {
    pub fn new(config: &BossConfig, seed: u64) -> Self {
        Self {
            config: config.clone(),
            rng: Pcg32::seed_from_u64(seed),
            position: config.spawn,
            velocity: DVec2::ZERO,
            size: config.size,
            state: BossState::Idle,
            phase: BossPhase::Phase1,
            facing: -1.0,
            on_ground: false,
            health: config.max_health,
            max_health: config.max_health,
            invulnerable: false,
            next_action: BossAction::Idle,
            decision_timer: 0,
            consecutive_pogos: 0,
            attack_cooldown: 0,
            slam_cooldown: 0,
            charge_cooldown: 0,
            roar_cooldown: 0,
            shoot_cooldown: 0,
            attack_time_left: 0,
            slam_time_left: 0,
            charge_time_left: 0,
            roar_time_left: 0,
            shoot_time_left: 0,
            stun_time_left: 0,
            transition_time_left: 0,
            charge_direction: DVec2::ZERO,
            charge_speed: 0.0,
            window_connected: false,
            missed_attacks: 0,
            phase_change: None,
            intents: Vec::new(),
        }
    }

    pub fn config(&self) -> &BossConfig {
        &self.config
    }

    pub fn update(&mut self, world: &dyn CollisionWorld, target: TargetInfo) {
        if self.state == BossState::Dead {
            return;
        }

        self.update_timers(&target);
        self.update_contacts(world, &target);
        self.update_phase();
        self.update_ai(&target);
        self.apply_physics();
        self.apply_movement(world);
        self.update_display_state();
    }

    fn update_timers(&mut self, target: &TargetInfo) {
        self.attack_cooldown = self.attack_cooldown.saturating_sub(1);
        self.slam_cooldown = self.slam_cooldown.saturating_sub(1);
        self.charge_cooldown = self.charge_cooldown.saturating_sub(1);
        self.roar_cooldown = self.roar_cooldown.saturating_sub(1);
        self.shoot_cooldown = self.shoot_cooldown.saturating_sub(1);
        self.decision_timer = self.decision_timer.saturating_sub(1);

        if tick_down(&mut self.attack_time_left) {
            self.close_attack_window();
        }
        if tick_down(&mut self.slam_time_left) {
            self.close_attack_window();
        }
        if tick_down(&mut self.charge_time_left) {
            self.velocity.x = 0.0;
            self.close_attack_window();
        }
        if tick_down(&mut self.roar_time_left) {
            self.state = BossState::Idle;
        }
        if tick_down(&mut self.shoot_time_left) {
            self.fire(target.position);
            self.state = BossState::Idle;
        }
        if tick_down(&mut self.stun_time_left) {
            self.state = BossState::Idle;
        }
        if tick_down(&mut self.transition_time_left) {
            self.invulnerable = false;
            self.state = BossState::Idle;
        }
    }

    fn close_attack_window(&mut self) {
        if !self.window_connected {
            self.missed_attacks += 1;
        }
        self.window_connected = false;
        self.state = BossState::Idle;
    }

    fn update_contacts(&mut self, world: &dyn CollisionWorld, target: &TargetInfo) {
        self.on_ground = world.is_on_ground(&self.body());
        if target.on_ground {
            self.consecutive_pogos = 0;
        }
    }

    fn update_phase(&mut self) {
        let phase = BossPhase::from_health_fraction(
            self.health_fraction(),
            self.config.phase2_threshold,
            self.config.phase3_threshold,
        );
        if phase != self.phase {
            log::info!("Boss enters {} at {:.0} hp", phase.as_str(), self.health);
            self.phase = phase;
            self.phase_change = Some(phase);
            self.start_transition();
        }
    }

    fn start_transition(&mut self) {
        self.cancel_windows();
        self.state = BossState::Transition;
        self.transition_time_left = self.config.transition_frames;
        self.invulnerable = true;
        self.velocity = DVec2::ZERO;

        self.slam_cooldown = 0;
        self.charge_cooldown = 0;
        self.roar_cooldown = 0;
    }

    /// Drop every running timed window without closing it normally
    fn cancel_windows(&mut self) {
        self.attack_time_left = 0;
        self.slam_time_left = 0;
        self.charge_time_left = 0;
        self.roar_time_left = 0;
        self.shoot_time_left = 0;
        self.stun_time_left = 0;
        self.window_connected = false;
    }

    fn update_ai(&mut self, target: &TargetInfo) {
        if self.state.is_locked() {
            return;
        }

        let dx = target.position.x - self.position.x;
        if dx != 0.0 {
            self.facing = sign(dx);
        }

        if self.decision_timer == 0 {
            self.next_action = self.decide(target);
            self.decision_timer = self.config.decision_delay;
            log::debug!(
                "Boss decision: {:?} ({}, distance {:.0})",
                self.next_action,
                self.phase.as_str(),
                self.position.distance(target.position)
            );
        }

        self.execute(target);
    }

    /// Actions legal right now, in priority order
    pub fn legal_actions(&self, target: &TargetInfo) -> Vec<BossAction> {
        let distance = self.position.distance(target.position);
        let mut actions = Vec::with_capacity(4);

        if distance <= self.config.attack_range && self.attack_cooldown == 0 {
            actions.push(BossAction::Attack);
        }
        if distance <= self.config.slam_radius && self.slam_cooldown == 0 {
            actions.push(BossAction::Slam);
        }
        if distance > CHARGE_MIN_DISTANCE
            && distance < CHARGE_MAX_DISTANCE
            && self.charge_cooldown == 0
        {
            actions.push(BossAction::Charge);
        }
        if distance <= self.config.roar_range && self.roar_cooldown == 0 {
            actions.push(BossAction::Roar);
        }
        actions
    }

    fn decide(&mut self, target: &TargetInfo) -> BossAction {
        let legal = self.legal_actions(target);

        if self.phase == BossPhase::Phase3 && legal.len() > 1 {
            if let Some(special) = legal.iter().copied().find(|a| {
                matches!(a, BossAction::Slam | BossAction::Charge | BossAction::Roar)
            }) {
                return special;
            }
        }

        if !legal.is_empty() {
            let pick = self.rng.random_range(0..legal.len());
            return legal[pick];
        }

        let distance = self.position.distance(target.position);
        if self.phase != BossPhase::Phase1
            && distance >= self.config.shoot_min_distance
            && self.shoot_cooldown == 0
        {
            BossAction::Shoot
        } else if distance > self.config.attack_range {
            BossAction::Walk
        } else {
            BossAction::Idle
        }
    }

    fn execute(&mut self, target: &TargetInfo) {
        match self.next_action {
            BossAction::Idle => {}
            BossAction::Walk => self.walk_toward(target),
            BossAction::Attack => self.perform_attack(),
            BossAction::Slam => self.perform_slam(),
            BossAction::Charge => self.perform_charge(target),
            BossAction::Roar => self.perform_roar(target),
            BossAction::Shoot => self.perform_shoot(),
        }
    }

    fn walk_toward(&mut self, target: &TargetInfo) {
        if !self.on_ground {
            return;
        }
        let direction = if target.position.x < self.position.x {
            -1.0
        } else {
            1.0
        };
        self.velocity.x =
            direction * self.config.walk_speed * self.config.walk_multipliers[self.phase.index()];
    }

    fn perform_attack(&mut self) {
        if self.attack_cooldown > 0 {
            return;
        }
        self.state = BossState::Attacking;
        self.attack_cooldown = self.config.attack_cooldown;
        self.attack_time_left = self.config.attack_windup + self.config.attack_active;
        self.window_connected = false;
        self.velocity.x = self.facing * self.config.attack_lunge;
    }

    fn perform_slam(&mut self) {
        if self.slam_cooldown > 0 {
            return;
        }
        self.state = BossState::Slam;
        self.slam_time_left = self.config.slam_duration;
        self.slam_cooldown = self.config.slam_cooldown;
        self.window_connected = false;
        self.velocity = DVec2::ZERO;
    }

    fn perform_charge(&mut self, target: &TargetInfo) {
        if self.charge_cooldown > 0 {
            return;
        }
        let dx = target.position.x - self.position.x;
        let direction = if dx == 0.0 { self.facing } else { sign(dx) };

        self.state = BossState::Charge;
        self.charge_time_left = self.config.charge_duration;
        self.charge_cooldown = self.config.charge_cooldown;
        self.charge_direction = DVec2::new(direction, 0.0);
        self.charge_speed =
            self.config.charge_speed * self.config.charge_multipliers[self.phase.index()];
        self.window_connected = false;
    }

    fn perform_roar(&mut self, target: &TargetInfo) {
        if self.roar_cooldown > 0 {
            return;
        }
        self.state = BossState::Roar;
        self.roar_time_left = self.config.roar_duration;
        self.roar_cooldown = self.config.roar_cooldown;
        self.velocity = DVec2::ZERO;

        if self.position.distance(target.position) <= self.config.roar_range {
            self.intents.push(BossIntent::StunTarget {
                ticks: self.config.roar_stun,
            });
        }
    }

    fn perform_shoot(&mut self) {
        if self.shoot_cooldown > 0 {
            return;
        }
        self.state = BossState::Shooting;
        self.shoot_time_left = self.config.shoot_windup;
        self.shoot_cooldown = self.config.shoot_cooldown;
        self.velocity.x = 0.0;
    }

    /// End of the shooting windup: fireball in Phase2, homing missile after
    fn fire(&mut self, target: DVec2) {
        let kind = match self.phase {
            BossPhase::Phase3 => ProjectileKind::BossMissile,
            _ => ProjectileKind::BossFireball,
        };
        let origin = self.position + DVec2::new(self.facing * (self.size.x / 2.0 + 10.0), -20.0);
        let mut direction = (target - origin).normalize_or_zero();
        if direction == DVec2::ZERO {
            direction = DVec2::new(self.facing, 0.0);
        }
        self.intents.push(BossIntent::Shoot {
            kind,
            origin,
            direction,
        });
    }

    fn end_charge(&mut self) {
        if self.charge_time_left > 0 {
            self.charge_time_left = 0;
            self.close_attack_window();
        }
    }

    fn apply_physics(&mut self) {
        match self.state {
            BossState::Charge => self.velocity.x = self.charge_direction.x * self.charge_speed,
            BossState::Stunned => self.velocity.x = 0.0,
            _ => {}
        }

        if self.on_ground {
            if self.velocity.y > 0.0 {
                self.velocity.y = 0.0;
            }
        } else {
            self.velocity.y = (self.velocity.y + self.config.gravity)
                .clamp(-self.config.max_fall_speed, self.config.max_fall_speed);
        }

        if self.on_ground && self.state != BossState::Charge {
            self.velocity.x *= self.config.ground_friction;
            if self.velocity.x.abs() < 0.1 {
                self.velocity.x = 0.0;
            }
        }
    }

    fn apply_movement(&mut self, world: &dyn CollisionWorld) {
        let moved = move_axis(world, self.position, self.size, self.velocity.x, Axis::X);
        self.position = moved.position;
        if moved.blocked {
            self.velocity.x = 0.0;
            self.end_charge();
        }

        let moved = move_axis(world, self.position, self.size, self.velocity.y, Axis::Y);
        self.position = moved.position;
        if moved.blocked {
            self.velocity.y = 0.0;
        }

        if self.position.y > world.floor_y() + FALL_RESET_DEPTH {
            self.position.y = RESPAWN_Y;
            self.velocity = DVec2::ZERO;
        }

        let ceiling = self.size.y / 2.0;
        if self.position.y < ceiling {
            self.position.y = ceiling;
            self.velocity.y = 0.0;
        }

        let min_x = self.size.x / 2.0 + WALL_MARGIN;
        let max_x = world.width() - self.size.x / 2.0 - WALL_MARGIN;
        if self.position.x < min_x || self.position.x > max_x {
            self.position.x = self.position.x.clamp(min_x, max_x);
            self.velocity.x = 0.0;
            self.end_charge();
        }
    }

    fn update_display_state(&mut self) {
        if self.state.is_locked() {
            return;
        }
        self.state = if !self.on_ground {
            if self.velocity.y < 0.0 {
                BossState::Jumping
            } else {
                BossState::Falling
            }
        } else if self.velocity.x.abs() > 0.5 {
            BossState::Walking
        } else {
            BossState::Idle
        };
    }

    /// Apply a hit from something at `source`. Returns false when rejected.
    pub fn take_damage(&mut self, amount: f64, source: DVec2) -> bool {
        if self.invulnerable || matches!(self.state, BossState::Transition | BossState::Dead) {
            return false;
        }

        self.health -= amount;
        if self.health <= 0.0 {
            self.health = 0.0;
            self.cancel_windows();
            self.state = BossState::Dead;
            self.velocity = DVec2::ZERO;
            log::info!("Boss defeated");
            return true;
        }

        let away = (self.position - source).normalize_or_zero();
        self.velocity.x += away.x * self.config.knockback_push;
        true
    }

    /// Interrupt whatever the boss is doing for `ticks`
    pub fn stun(&mut self, ticks: u32) -> bool {
        if matches!(self.state, BossState::Transition | BossState::Dead) {
            return false;
        }
        self.cancel_windows();
        self.state = BossState::Stunned;
        self.stun_time_left = ticks;
        self.velocity.x = 0.0;
        true
    }

    /// Sidestep along `velocity`; a mostly vertical dodge becomes a hop.
    /// Only a grounded boss outside a locked window can evade.
    pub fn evade(&mut self, velocity: DVec2, hop_force: f64) -> bool {
        if self.state.is_locked() || !self.on_ground {
            return false;
        }
        if velocity.y.abs() > velocity.x.abs() {
            self.velocity.y = -hop_force;
        }
        self.velocity.x = velocity.x;
        true
    }

    /// Count a down-air hit. Returns true when it forced a slam.
    pub fn register_pogo(&mut self) -> bool {
        self.consecutive_pogos += 1;
        if self.consecutive_pogos >= self.config.pogo_slam_threshold
            && self.slam_cooldown == 0
            && !matches!(self.state, BossState::Transition | BossState::Dead)
        {
            self.cancel_windows();
            self.perform_slam();
            self.consecutive_pogos = 0;
            log::debug!("Boss punishes repeated pogo with a slam");
            return true;
        }
        false
    }

    pub fn body(&self) -> Rect {
        Rect::from_center(self.position, self.size)
    }

    pub fn hurtbox(&self) -> Rect {
        self.body().expand(-HURTBOX_INSET)
    }

    /// Basic attack hitbox, absent during the windup
    pub fn attack_hitbox(&self) -> Option<Rect> {
        if self.state != BossState::Attacking || self.attack_time_left > self.config.attack_active {
            return None;
        }
        let width = ATTACK_REACH + ATTACK_WIDTH;
        let x = if self.facing > 0.0 {
            self.position.x + self.size.x / 2.0
        } else {
            self.position.x - self.size.x / 2.0 - width
        };
        Some(Rect::new(
            x,
            self.position.y - ATTACK_HEIGHT / 2.0,
            width,
            ATTACK_HEIGHT,
        ))
    }

    /// Area hitbox, live only in the final part of the slam
    pub fn slam_hitbox(&self) -> Option<Rect> {
        if self.state != BossState::Slam || self.slam_time_left > self.config.slam_active {
            return None;
        }
        Some(Rect::from_center(
            self.position,
            DVec2::splat(self.config.slam_radius * 2.0),
        ))
    }

    /// The whole body hurts while charging
    pub fn charge_hitbox(&self) -> Option<Rect> {
        (self.state == BossState::Charge).then(|| self.body())
    }

    pub fn attack_damage(&self) -> f64 {
        self.config.attack_damage
    }

    pub fn slam_damage(&self) -> f64 {
        self.config.slam_damage
    }

    pub fn charge_damage(&self) -> f64 {
        self.config.charge_damage
    }

    pub fn mark_attack_connected(&mut self) {
        self.window_connected = true;
    }

    /// Attack windows that closed without connecting since the last call
    pub fn take_missed_attacks(&mut self) -> u32 {
        std::mem::take(&mut self.missed_attacks)
    }

    pub fn drain_intents(&mut self) -> Vec<BossIntent> {
        std::mem::take(&mut self.intents)
    }

    /// The phase entered since the last call, if any
    pub fn take_phase_change(&mut self) -> Option<BossPhase> {
        self.phase_change.take()
    }

    pub fn next_action(&self) -> BossAction {
        self.next_action
    }

    pub fn consecutive_pogos(&self) -> u32 {
        self.consecutive_pogos
    }

    pub fn is_dead(&self) -> bool {
        self.state == BossState::Dead
    }

    pub fn health_fraction(&self) -> f64 {
        if self.max_health <= 0.0 {
            0.0
        } else {
            self.health / self.max_health
        }
    }
}

/// Count a window down; true on the tick it reaches zero
fn tick_down(timer: &mut u32) -> bool {
    if *timer == 0 {
        return false;
    }
    *timer -= 1;
    *timer == 0
}
