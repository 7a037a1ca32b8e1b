//! Player character: movement, jumping, dashing, melee and ranged attacks
//!
//! One `update` per tick, in a fixed order: timers, contact detection,
//! state resolution, input, physics, axis-separated movement, stamina
//! regeneration. Gameplay feedback (haptics) goes through the controller;
//! projectile shots are queued as `PlayerAction`s for the orchestrator.

use glam::DVec2;
use serde::{Deserialize, Serialize};

use super::arena::{Axis, CollisionWorld, WallSide, move_axis};
use super::input::Controller;
use super::math::{Rect, sign};
use super::projectile::ProjectileKind;
use crate::consts::*;
use crate::settings::PlayerConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum PlayerState {
    #[default]
    Idle,
    Walking,
    Jumping,
    Falling,
    WallSliding,
    WallJumping,
    Dashing,
    Attacking,
    DownAirAttack,
    Hurt,
    Dead,
}

impl PlayerState {
    /// Transition table. States not listed are unrestricted.
    pub fn can_transition_to(self, next: PlayerState) -> bool {
        use PlayerState::*;
        match self {
            Dead => false,
            Dashing => matches!(next, Hurt | Dead),
            Attacking => matches!(next, Hurt | Dead | Idle),
            Hurt => matches!(next, Dead | Idle | Falling),
            _ => true,
        }
    }

    /// States the movement resolver never overrides; they end on their own timers
    pub fn is_locked(self) -> bool {
        matches!(
            self,
            PlayerState::Dashing
                | PlayerState::Attacking
                | PlayerState::DownAirAttack
                | PlayerState::Hurt
                | PlayerState::Dead
        )
    }

    pub fn as_str(self) -> &'static str {
        match self {
            PlayerState::Idle => "Idle",
            PlayerState::Walking => "Walking",
            PlayerState::Jumping => "Jumping",
            PlayerState::Falling => "Falling",
            PlayerState::WallSliding => "WallSliding",
            PlayerState::WallJumping => "WallJumping",
            PlayerState::Dashing => "Dashing",
            PlayerState::Attacking => "Attacking",
            PlayerState::DownAirAttack => "DownAirAttack",
            PlayerState::Hurt => "Hurt",
            PlayerState::Dead => "Dead",
        }
    }
}

/// Requests the player makes of the rest of the simulation
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PlayerAction {
    Shoot {
        kind: ProjectileKind,
        origin: DVec2,
        direction: DVec2,
    },
}

/// Melee reach past the body edge, plus the blade width
const ATTACK_REACH: f64 = 40.0;
const ATTACK_WIDTH: f64 = 50.0;
const ATTACK_HEIGHT: f64 = 60.0;
const DOWN_AIR_WIDTH: f64 = 50.0;
const DOWN_AIR_HEIGHT: f64 = 40.0;
const HURTBOX_INSET: f64 = 5.0;
/// Horizontal input magnitude that counts as pushing into a wall
const WALL_PUSH_THRESHOLD: f64 = 0.3;
/// Vertical input needed to turn an airborne attack into a down-air
const DOWN_AIR_THRESHOLD: f64 = 0.5;
/// Landing speed above which the landing rumble plays
const HARD_LANDING_SPEED: f64 = 5.0;

#[derive(Debug, Clone)]
pub struct Player {
    config: PlayerConfig,

    pub position: DVec2,
    pub velocity: DVec2,
    pub size: DVec2,
    pub state: PlayerState,
    /// +1 facing right, -1 facing left
    pub facing: f64,

    pub health: f64,
    pub max_health: f64,
    pub stamina: f64,
    pub max_stamina: f64,

    pub on_ground: bool,
    pub wall: Option<WallSide>,
    pub jump_count: u32,
    pub can_dash: bool,
    pub combo: u32,

    dash_direction: DVec2,
    dash_time_left: u32,
    dash_cooldown_left: u32,
    wall_jump_cooldown: u32,
    attack_time_left: u32,
    combo_time_left: u32,
    hurt_time_left: u32,
    invulnerable_time_left: u32,
    shot_cooldown_left: u32,
    /// Set while rising from a jump the player can cut short by releasing
    variable_jump: bool,
    landed_this_tick: bool,
    impact_speed: f64,
    attack_connected: bool,
    missed_attacks: u32,
    actions: Vec<PlayerAction>,
}

impl Player {
    pub fn new(config: &PlayerConfig) -> Self {
        Self {
            config: config.clone(),
            position: config.spawn,
            velocity: DVec2::ZERO,
            size: config.size,
            state: PlayerState::Idle,
            facing: 1.0,
            health: config.max_health,
            max_health: config.max_health,
            stamina: config.max_stamina,
            max_stamina: config.max_stamina,
            on_ground: false,
            wall: None,
            jump_count: 0,
            can_dash: true,
            combo: 0,
            dash_direction: DVec2::X,
            dash_time_left: 0,
            dash_cooldown_left: 0,
            wall_jump_cooldown: 0,
            attack_time_left: 0,
            combo_time_left: 0,
            hurt_time_left: 0,
            invulnerable_time_left: 0,
            shot_cooldown_left: 0,
            variable_jump: false,
            landed_this_tick: false,
            impact_speed: 0.0,
            attack_connected: false,
            missed_attacks: 0,
            actions: Vec::new(),
        }
    }

    pub fn config(&self) -> &PlayerConfig {
        &self.config
    }

    pub fn update(&mut self, world: &dyn CollisionWorld, input: &mut Controller) {
        if self.state == PlayerState::Dead {
            return;
        }

        self.update_timers();
        self.update_contacts(world, input);
        self.resolve_state();
        self.handle_input(input);
        self.apply_physics();
        self.apply_movement(world);
        self.regenerate_stamina();
    }

    fn update_timers(&mut self) {
        self.wall_jump_cooldown = self.wall_jump_cooldown.saturating_sub(1);
        self.invulnerable_time_left = self.invulnerable_time_left.saturating_sub(1);
        self.shot_cooldown_left = self.shot_cooldown_left.saturating_sub(1);

        if self.dash_time_left > 0 {
            self.dash_time_left -= 1;
            if self.dash_time_left == 0 && self.state == PlayerState::Dashing {
                self.state = PlayerState::Idle;
            }
        }

        if self.dash_cooldown_left > 0 {
            self.dash_cooldown_left -= 1;
            if self.dash_cooldown_left == 0 {
                self.can_dash = true;
            }
        }

        if self.attack_time_left > 0 {
            self.attack_time_left -= 1;
            if self.attack_time_left == 0
                && matches!(self.state, PlayerState::Attacking | PlayerState::DownAirAttack)
            {
                if !self.attack_connected {
                    self.missed_attacks += 1;
                }
                self.state = PlayerState::Idle;
            }
        }

        if self.combo_time_left > 0 {
            self.combo_time_left -= 1;
            if self.combo_time_left == 0 {
                self.combo = 0;
            }
        }

        if self.hurt_time_left > 0 {
            self.hurt_time_left -= 1;
            if self.hurt_time_left == 0 && self.state == PlayerState::Hurt {
                self.set_state(PlayerState::Idle);
            }
        }
    }

    fn update_contacts(&mut self, world: &dyn CollisionWorld, input: &mut Controller) {
        let body = self.body();
        let was_on_ground = self.on_ground;
        self.on_ground = world.is_on_ground(&body);
        self.wall = world.is_touching_wall(&body);
        self.landed_this_tick = self.on_ground && !was_on_ground;

        if self.landed_this_tick {
            self.jump_count = 0;
            self.can_dash = true;
            self.variable_jump = false;
            input.clear_coyote_time();
            if self.impact_speed > HARD_LANDING_SPEED {
                input.vibrate(50, 0.2);
            }
            // A down-air that reaches the floor is spent
            if self.state == PlayerState::DownAirAttack {
                self.attack_time_left = 0;
                if !self.attack_connected {
                    self.missed_attacks += 1;
                }
                self.state = PlayerState::Idle;
            }
        } else if was_on_ground && !self.on_ground && self.velocity.y >= 0.0 {
            input.start_coyote_time();
        }
        self.impact_speed = 0.0;
    }

    fn resolve_state(&mut self) {
        if self.state.is_locked() {
            return;
        }

        let next = if !self.on_ground {
            if self.wall.is_some() && self.velocity.y > 0.0 {
                PlayerState::WallSliding
            } else if self.velocity.y < 0.0 {
                PlayerState::Jumping
            } else {
                PlayerState::Falling
            }
        } else if self.velocity.x.abs() > 0.5 {
            PlayerState::Walking
        } else {
            PlayerState::Idle
        };
        self.set_state(next);
    }

    /// Change state if the transition table allows it
    fn set_state(&mut self, next: PlayerState) -> bool {
        if self.state == next {
            return true;
        }
        if !self.state.can_transition_to(next) {
            return false;
        }
        self.state = next;
        true
    }

    fn handle_input(&mut self, input: &mut Controller) {
        if matches!(
            self.state,
            PlayerState::Dashing | PlayerState::Attacking | PlayerState::Hurt | PlayerState::Dead
        ) {
            return;
        }

        self.handle_horizontal(input);
        self.handle_jump(input);
        self.handle_dash(input);
        self.handle_attack(input);
        self.handle_shots(input);
    }

    fn handle_horizontal(&mut self, input: &Controller) {
        let axis = input.horizontal();
        if axis == 0.0 {
            return;
        }

        self.facing = sign(axis);
        let mut control = self.config.acceleration;
        if !self.on_ground {
            control *= self.config.air_control;
        }
        let target = axis * self.config.move_speed;
        self.velocity.x += (target - self.velocity.x) * control;
        self.velocity.x = self
            .velocity
            .x
            .clamp(-self.config.max_speed, self.config.max_speed);
    }

    fn handle_jump(&mut self, input: &mut Controller) {
        let buffered_landing = self.landed_this_tick && input.jump_buffered();
        if input.is_jump_pressed() || buffered_landing {
            self.try_jump(input);
        }

        if !input.is_jump_held() && self.variable_jump && self.velocity.y < 0.0 {
            self.velocity.y *= 0.5;
        }
        if self.velocity.y >= 0.0 {
            self.variable_jump = false;
        }
    }

    /// Wall climb / wall jump, then ground or coyote jump, then double jump.
    fn try_jump(&mut self, input: &mut Controller) -> bool {
        if let Some(side) = self.wall {
            if !self.on_ground && self.wall_jump_cooldown == 0 {
                let axis = input.horizontal();
                let pushing_into_wall =
                    axis.abs() > WALL_PUSH_THRESHOLD && sign(axis) == side.sign();

                if pushing_into_wall {
                    if self.stamina < self.config.wall_climb_cost {
                        return self.reject_jump(input);
                    }
                    self.wall_climb(input);
                } else {
                    if self.stamina < self.config.wall_jump_cost {
                        return self.reject_jump(input);
                    }
                    self.wall_jump(side, input);
                }
                input.consume_jump_buffer();
                return true;
            }
        }

        if self.on_ground || input.has_coyote_time() {
            self.perform_jump(self.config.jump_force, input);
            self.jump_count = 1;
            input.clear_coyote_time();
            input.consume_jump_buffer();
            return true;
        }

        if self.jump_count < self.config.max_jumps && self.wall.is_none() {
            if self.stamina < self.config.double_jump_cost {
                return self.reject_jump(input);
            }
            self.stamina -= self.config.double_jump_cost;
            self.perform_jump(self.config.double_jump_force, input);
            self.jump_count += 1;
            input.consume_jump_buffer();
            return true;
        }

        self.reject_jump(input)
    }

    /// The press stays buffered, so it fires on landing if that comes soon enough
    fn reject_jump(&mut self, input: &mut Controller) -> bool {
        input.vibrate(50, 0.1);
        false
    }

    fn perform_jump(&mut self, force: f64, input: &mut Controller) {
        self.velocity.y = -force;
        self.set_state(PlayerState::Jumping);
        self.variable_jump = true;
        input.vibrate(30, 0.15);
    }

    fn wall_jump(&mut self, side: WallSide, input: &mut Controller) {
        let away = -side.sign();
        self.velocity.x = away * self.config.wall_jump_x;
        self.velocity.y = -self.config.wall_jump_y;
        self.set_state(PlayerState::WallJumping);
        self.jump_count = 1;
        self.wall_jump_cooldown = self.config.wall_stick_frames;
        self.facing = away;
        self.stamina -= self.config.wall_jump_cost;
        self.variable_jump = true;
        input.vibrate(50, 0.25);
    }

    fn wall_climb(&mut self, input: &mut Controller) {
        self.stamina -= self.config.wall_climb_cost;
        self.velocity.y = -self.config.jump_force * self.config.wall_climb_multiplier;
        self.velocity.x *= 0.3;
        self.set_state(PlayerState::Jumping);
        self.jump_count = 1;
        self.wall_jump_cooldown = self.config.wall_climb_cooldown;
        self.variable_jump = true;
        input.vibrate(40, 0.2);
    }

    fn handle_dash(&mut self, input: &mut Controller) {
        if input.is_dash_pressed() {
            self.try_dash(input);
        }
    }

    fn try_dash(&mut self, input: &mut Controller) -> bool {
        if !self.can_dash {
            return false;
        }
        if self.stamina < self.config.dash_cost {
            input.vibrate(50, 0.1);
            return false;
        }
        if !self.set_state(PlayerState::Dashing) {
            return false;
        }

        let aim = DVec2::new(input.horizontal(), input.vertical());
        self.dash_direction = if aim == DVec2::ZERO {
            DVec2::new(self.facing, 0.0)
        } else {
            aim.normalize_or_zero()
        };
        self.velocity = self.dash_direction * self.config.dash_speed;
        self.dash_time_left = self.config.dash_duration;
        self.dash_cooldown_left = self.config.dash_cooldown;
        self.can_dash = false;
        self.variable_jump = false;
        self.stamina -= self.config.dash_cost;
        input.vibrate(100, 0.3);
        true
    }

    fn handle_attack(&mut self, input: &mut Controller) {
        if !input.is_attack_pressed() {
            return;
        }

        let down_air = !self.on_ground
            && self.state != PlayerState::Dashing
            && input.vertical() > DOWN_AIR_THRESHOLD;
        if down_air {
            self.try_down_air(input);
        } else {
            self.try_attack(input);
        }
    }

    fn try_attack(&mut self, input: &mut Controller) -> bool {
        if !matches!(
            self.state,
            PlayerState::Idle | PlayerState::Walking | PlayerState::Jumping | PlayerState::Falling
        ) {
            return false;
        }

        let cost = self.config.attack_base_cost + self.config.attack_combo_cost * self.combo as f64;
        if self.stamina < cost {
            input.vibrate(50, 0.1);
            return false;
        }
        self.stamina -= cost;

        if self.combo_time_left > 0 && self.combo < self.config.max_combo {
            self.combo += 1;
        } else {
            self.combo = 1;
        }
        self.combo_time_left = self.config.combo_window;
        self.attack_time_left = self.config.attack_duration;
        self.attack_connected = false;
        self.state = PlayerState::Attacking;

        if self.on_ground {
            self.velocity.x += self.facing * self.config.attack_push;
        }
        input.vibrate(80, 0.3 + 0.1 * self.combo as f64);
        true
    }

    fn try_down_air(&mut self, input: &mut Controller) -> bool {
        if self.stamina < self.config.down_air_cost {
            input.vibrate(50, 0.1);
            return false;
        }
        self.stamina -= self.config.down_air_cost;
        self.state = PlayerState::DownAirAttack;
        self.attack_time_left = self.config.down_air_duration;
        self.attack_connected = false;
        self.variable_jump = false;
        self.velocity.y = self.config.down_air_speed;
        input.vibrate(100, 0.4);
        true
    }

    fn handle_shots(&mut self, input: &mut Controller) {
        let kind = if input.is_special_pressed() {
            ProjectileKind::PlayerCharged
        } else if input.is_shoot_pressed() {
            ProjectileKind::PlayerBasic
        } else {
            return;
        };

        if self.shot_cooldown_left > 0 {
            return;
        }
        let cost = match kind {
            ProjectileKind::PlayerCharged => self.config.charged_shot_cost,
            _ => self.config.shot_cost,
        };
        if self.stamina < cost {
            input.vibrate(50, 0.1);
            return;
        }

        self.stamina -= cost;
        self.shot_cooldown_left = self.config.shot_cooldown;
        self.actions.push(PlayerAction::Shoot {
            kind,
            origin: self.position + DVec2::new(self.facing * (self.size.x / 2.0 + 8.0), -10.0),
            direction: DVec2::new(self.facing, 0.0),
        });
        input.vibrate(40, 0.15);
    }

    fn apply_physics(&mut self) {
        if self.state == PlayerState::Dashing {
            self.velocity = self.dash_direction * self.config.dash_speed;
            return;
        }

        if self.on_ground {
            self.velocity.x *= self.config.ground_friction;
            if self.velocity.x.abs() < 0.1 {
                self.velocity.x = 0.0;
            }
        } else {
            if self.state == PlayerState::WallSliding {
                self.velocity.y = (self.velocity.y
                    + self.config.gravity * self.config.wall_slide_gravity_scale)
                    .min(self.config.wall_slide_speed);
            } else {
                self.velocity.y = (self.velocity.y + self.config.gravity).min(self.config.max_fall_speed);
            }
            self.velocity.x *= self.config.air_friction;
        }
    }

    fn apply_movement(&mut self, world: &dyn CollisionWorld) {
        let moved = move_axis(world, self.position, self.size, self.velocity.x, Axis::X);
        self.position = moved.position;
        if moved.blocked {
            self.velocity.x = 0.0;
        }

        let moved = move_axis(world, self.position, self.size, self.velocity.y, Axis::Y);
        self.position = moved.position;
        if moved.blocked {
            if self.velocity.y > 0.0 {
                self.impact_speed = self.velocity.y;
            }
            self.velocity.y = 0.0;
        }

        if self.position.y > world.floor_y() + FALL_RESET_DEPTH {
            self.position = DVec2::new(world.width() / 2.0, RESPAWN_Y);
            self.velocity = DVec2::ZERO;
        }

        let half_width = self.size.x / 2.0;
        let min_x = half_width + WALL_MARGIN;
        let max_x = world.width() - half_width - WALL_MARGIN;
        if self.position.x < min_x {
            self.position.x = min_x;
            self.velocity.x = self.velocity.x.max(0.0);
        } else if self.position.x > max_x {
            self.position.x = max_x;
            self.velocity.x = self.velocity.x.min(0.0);
        }

        let min_y = self.size.y / 2.0;
        if self.position.y < min_y {
            self.position.y = min_y;
            self.velocity.y = self.velocity.y.max(0.0);
        }
    }

    fn regenerate_stamina(&mut self) {
        let regen = if self.on_ground {
            self.config.stamina_regen_ground
        } else {
            self.config.stamina_regen_air
        };
        self.stamina = (self.stamina + regen).min(self.max_stamina);
    }

    /// Apply a hit. Returns false when the hit is ignored (dead, dashing, i-frames).
    pub fn take_damage(&mut self, amount: f64, knockback: DVec2, input: &mut Controller) -> bool {
        if matches!(self.state, PlayerState::Dead | PlayerState::Dashing)
            || self.invulnerable_time_left > 0
        {
            return false;
        }

        self.health -= amount;
        self.attack_time_left = 0;
        self.dash_time_left = 0;
        self.variable_jump = false;

        if self.health <= 0.0 {
            self.health = 0.0;
            self.state = PlayerState::Dead;
            self.velocity = DVec2::ZERO;
            return true;
        }

        self.velocity = knockback;
        self.state = PlayerState::Hurt;
        self.hurt_time_left = self.config.hurt_frames;
        self.invulnerable_time_left = self.config.invulnerability_frames;
        input.vibrate(200, 0.6);
        true
    }

    /// Hold the player in Hurt for `ticks` (boss roar)
    pub fn apply_stun(&mut self, ticks: u32, input: &mut Controller) {
        if self.state == PlayerState::Dead {
            return;
        }
        self.state = PlayerState::Hurt;
        self.hurt_time_left = self.hurt_time_left.max(ticks);
        self.attack_time_left = 0;
        self.dash_time_left = 0;
        self.velocity.x = 0.0;
        input.vibrate(300, 0.5);
    }

    /// A down-air connected: bounce off the target
    pub fn pogo_bounce(&mut self, input: &mut Controller) {
        self.velocity.y = -self.config.pogo_force;
        self.jump_count = 1;
        self.stamina = (self.stamina + self.config.pogo_stamina_refund).min(self.max_stamina);
        self.attack_time_left = 0;
        self.attack_connected = true;
        self.variable_jump = false;
        self.set_state(PlayerState::Jumping);
        input.vibrate(60, 0.35);
    }

    pub fn body(&self) -> Rect {
        Rect::from_center(self.position, self.size)
    }

    pub fn hurtbox(&self) -> Rect {
        self.body().expand(-HURTBOX_INSET)
    }

    /// Melee hitbox, only while attacking
    pub fn attack_hitbox(&self) -> Option<Rect> {
        if self.state != PlayerState::Attacking {
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

    pub fn down_air_hitbox(&self) -> Option<Rect> {
        if self.state != PlayerState::DownAirAttack {
            return None;
        }
        Some(Rect::new(
            self.position.x - DOWN_AIR_WIDTH / 2.0,
            self.position.y + self.size.y / 2.0 - 10.0,
            DOWN_AIR_WIDTH,
            DOWN_AIR_HEIGHT,
        ))
    }

    pub fn attack_damage(&self) -> f64 {
        self.config.attack_damage_per_combo * self.combo as f64
    }

    pub fn down_air_damage(&self) -> f64 {
        self.config.down_air_damage
    }

    /// Whether the current attack window has already hit something
    pub fn attack_connected(&self) -> bool {
        self.attack_connected
    }

    pub fn mark_attack_connected(&mut self) {
        self.attack_connected = true;
    }

    /// Attack windows that closed without connecting since the last call
    pub fn take_missed_attacks(&mut self) -> u32 {
        std::mem::take(&mut self.missed_attacks)
    }

    pub fn drain_actions(&mut self) -> Vec<PlayerAction> {
        std::mem::take(&mut self.actions)
    }

    pub fn is_invulnerable(&self) -> bool {
        self.invulnerable_time_left > 0
    }

    pub fn is_dead(&self) -> bool {
        self.state == PlayerState::Dead
    }

    pub fn health_fraction(&self) -> f64 {
        if self.max_health <= 0.0 {
            0.0
        } else {
            self.health / self.max_health
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::arena::Arena;
    use crate::sim::input::TickInput;
    use proptest::prelude::*;

    fn grounded() -> (Player, Arena, Controller) {
        let arena = Arena::default();
        let mut player = Player::new(&PlayerConfig::default());
        let mut input = Controller::default();
        step(&mut player, &arena, &mut input, TickInput::default());
        assert!(player.on_ground);
        input.drain_haptics();
        (player, arena, input)
    }

    fn step(player: &mut Player, arena: &Arena, input: &mut Controller, raw: TickInput) {
        input.update(raw);
        player.update(arena, input);
    }

    fn press_jump() -> TickInput {
        TickInput {
            jump: true,
            ..Default::default()
        }
    }

    #[test]
    fn test_transition_table() {
        use PlayerState::*;
        assert!(Dashing.can_transition_to(Hurt));
        assert!(!Dashing.can_transition_to(Idle));
        assert!(Attacking.can_transition_to(Idle));
        assert!(!Attacking.can_transition_to(Jumping));
        assert!(Hurt.can_transition_to(Falling));
        assert!(!Hurt.can_transition_to(Walking));
        for next in [Idle, Walking, Jumping, Hurt, Dead] {
            assert!(!Dead.can_transition_to(next));
        }
        assert!(Falling.can_transition_to(Dashing));
    }

    #[test]
    fn test_dash_rejected_without_stamina() {
        let (mut player, _arena, mut input) = grounded();
        player.stamina = 5.0;
        input.update(TickInput {
            dash: true,
            ..Default::default()
        });

        assert!(!player.try_dash(&mut input));
        assert!(player.can_dash);
        assert_eq!(player.stamina, 5.0);
        assert_ne!(player.state, PlayerState::Dashing);
        let haptics = input.drain_haptics();
        assert_eq!(haptics.len(), 1);
        assert_eq!(haptics[0].strength, 0.1);
    }

    #[test]
    fn test_dash_uses_facing_without_aim() {
        let (mut player, arena, mut input) = grounded();
        player.facing = -1.0;
        step(
            &mut player,
            &arena,
            &mut input,
            TickInput {
                dash: true,
                ..Default::default()
            },
        );
        assert_eq!(player.state, PlayerState::Dashing);
        assert_eq!(player.velocity, DVec2::new(-15.0, 0.0));
        assert!(!player.can_dash);

        for _ in 0..10 {
            step(&mut player, &arena, &mut input, TickInput::default());
        }
        assert_ne!(player.state, PlayerState::Dashing);
    }

    #[test]
    fn test_ground_jump() {
        let (mut player, arena, mut input) = grounded();
        step(&mut player, &arena, &mut input, press_jump());
        assert_eq!(player.state, PlayerState::Jumping);
        assert_eq!(player.jump_count, 1);
        assert!(player.velocity.y < 0.0);
        assert!(!input.jump_buffered());
        assert_eq!(player.stamina, 100.0);
    }

    #[test]
    fn test_released_jump_is_cut_short() {
        let (mut player, arena, mut input) = grounded();
        step(&mut player, &arena, &mut input, press_jump());
        let rising = player.velocity.y;
        step(&mut player, &arena, &mut input, TickInput::default());
        assert!(player.velocity.y > rising * 0.5 - 1.0);
        assert!(player.velocity.y < 0.0);
    }

    #[test]
    fn test_double_jump_costs_stamina() {
        let (mut player, arena, mut input) = grounded();
        step(&mut player, &arena, &mut input, press_jump());
        step(&mut player, &arena, &mut input, TickInput::default());
        step(&mut player, &arena, &mut input, press_jump());
        assert_eq!(player.jump_count, 2);
        assert_eq!(player.state, PlayerState::Jumping);
        // Full before the 20 cost, then one airborne regen tick
        assert!((player.stamina - 80.5).abs() < 1e-9);
    }

    #[test]
    fn test_rejected_jump_fires_on_landing() {
        let arena = Arena::default();
        let mut player = Player::new(&PlayerConfig::default());
        let mut input = Controller::default();
        player.position = DVec2::new(400.0, 565.0);
        player.velocity = DVec2::new(0.0, 3.0);
        player.jump_count = 2;

        step(&mut player, &arena, &mut input, press_jump());
        assert!(!player.on_ground);
        assert!(player.velocity.y > 0.0);
        assert!(input.jump_buffered());
        assert_eq!(input.drain_haptics()[0].strength, 0.1);

        // Still holding jump, no new press edge: the buffered press fires on touchdown
        step(&mut player, &arena, &mut input, press_jump());
        assert!(player.on_ground);
        assert_eq!(player.state, PlayerState::Jumping);
        assert_eq!(player.jump_count, 1);
        assert_eq!(player.velocity.y, -12.0);
        assert!(!input.jump_buffered());
    }

    #[test]
    fn test_wall_jump_and_climb() {
        let arena = Arena::default();
        let mut input = Controller::default();

        let mut player = Player::new(&PlayerConfig::default());
        player.position = DVec2::new(80.0, 300.0);
        player.velocity = DVec2::new(0.0, 2.0);
        step(&mut player, &arena, &mut input, press_jump());
        assert_eq!(player.state, PlayerState::WallJumping);
        assert!(player.velocity.x > 0.0);
        assert!(player.velocity.y < 0.0);
        assert_eq!(player.facing, 1.0);
        assert!((player.stamina - 90.5).abs() < 1e-9);

        let mut player = Player::new(&PlayerConfig::default());
        player.position = DVec2::new(80.0, 300.0);
        player.velocity = DVec2::new(0.0, 2.0);
        step(
            &mut player,
            &arena,
            &mut input,
            TickInput {
                jump: false,
                horizontal: -1.0,
                ..Default::default()
            },
        );
        step(
            &mut player,
            &arena,
            &mut input,
            TickInput {
                jump: true,
                horizontal: -1.0,
                ..Default::default()
            },
        );
        assert_eq!(player.state, PlayerState::Jumping);
        assert!(player.velocity.y < -12.0);
        // 15 for the climb, then one airborne regen tick
        assert!((player.stamina - 85.5).abs() < 1e-9);
    }

    #[test]
    fn test_attack_combo_and_hitbox() {
        let (mut player, _arena, mut input) = grounded();
        assert!(player.try_attack(&mut input));
        assert_eq!(player.combo, 1);
        assert_eq!(player.stamina, 90.0);
        assert_eq!(player.attack_damage(), 10.0);

        let hitbox = player.attack_hitbox().unwrap();
        assert_eq!(hitbox.left(), player.position.x + 20.0);
        assert_eq!(hitbox.width, 90.0);

        // Window closes, combo window still open
        player.state = PlayerState::Idle;
        player.facing = -1.0;
        assert!(player.try_attack(&mut input));
        assert_eq!(player.combo, 2);
        assert_eq!(player.stamina, 75.0);
        let hitbox = player.attack_hitbox().unwrap();
        assert_eq!(hitbox.right(), player.position.x - 20.0);
    }

    #[test]
    fn test_attack_window_expires_as_miss() {
        let (mut player, arena, mut input) = grounded();
        step(
            &mut player,
            &arena,
            &mut input,
            TickInput {
                attack: true,
                ..Default::default()
            },
        );
        assert_eq!(player.state, PlayerState::Attacking);
        for _ in 0..15 {
            step(&mut player, &arena, &mut input, TickInput::default());
        }
        assert_ne!(player.state, PlayerState::Attacking);
        assert_eq!(player.take_missed_attacks(), 1);
        assert_eq!(player.take_missed_attacks(), 0);
    }

    #[test]
    fn test_down_air_and_pogo() {
        let arena = Arena::default();
        let mut player = Player::new(&PlayerConfig::default());
        let mut input = Controller::default();
        player.position = DVec2::new(400.0, 300.0);
        player.stamina = 95.0;

        step(
            &mut player,
            &arena,
            &mut input,
            TickInput {
                attack: true,
                vertical: 1.0,
                ..Default::default()
            },
        );
        assert_eq!(player.state, PlayerState::DownAirAttack);
        assert!(player.down_air_hitbox().is_some());
        assert!(player.attack_hitbox().is_none());

        player.pogo_bounce(&mut input);
        assert_eq!(player.state, PlayerState::Jumping);
        assert_eq!(player.velocity.y, -10.0);
        assert_eq!(player.jump_count, 1);
        assert_eq!(player.stamina, 90.5);
        assert!(player.attack_connected());
    }

    #[test]
    fn test_damage_intake() {
        let (mut player, arena, mut input) = grounded();
        assert!(player.take_damage(15.0, DVec2::new(-6.0, -4.0), &mut input));
        assert_eq!(player.state, PlayerState::Hurt);
        assert_eq!(player.health, 85.0);
        assert!(!player.take_damage(15.0, DVec2::ZERO, &mut input));

        for _ in 0..20 {
            step(&mut player, &arena, &mut input, TickInput::default());
        }
        assert_ne!(player.state, PlayerState::Hurt);

        player.invulnerable_time_left = 0;
        player.state = PlayerState::Dashing;
        assert!(!player.take_damage(50.0, DVec2::ZERO, &mut input));

        player.state = PlayerState::Idle;
        assert!(player.take_damage(500.0, DVec2::new(3.0, 3.0), &mut input));
        assert_eq!(player.state, PlayerState::Dead);
        assert_eq!(player.health, 0.0);
        assert_eq!(player.velocity, DVec2::ZERO);
    }

    #[test]
    fn test_lands_flush_on_floor() {
        let arena = Arena::default();
        let mut player = Player::new(&PlayerConfig::default());
        let mut input = Controller::default();
        player.position = DVec2::new(500.0, 200.0);
        for _ in 0..120 {
            step(&mut player, &arena, &mut input, TickInput::default());
        }
        assert!(player.on_ground);
        assert!((player.body().bottom() - 600.0).abs() < 1e-6);
        assert!(arena.check_collision(&player.body()).is_none());
    }

    #[test]
    fn test_roar_stun_holds_player() {
        let (mut player, arena, mut input) = grounded();
        player.apply_stun(60, &mut input);
        for _ in 0..59 {
            step(
                &mut player,
                &arena,
                &mut input,
                TickInput {
                    horizontal: 1.0,
                    ..Default::default()
                },
            );
            assert_eq!(player.state, PlayerState::Hurt);
        }
        step(&mut player, &arena, &mut input, TickInput::default());
        assert_eq!(player.state, PlayerState::Idle);
    }

    fn arb_input() -> impl Strategy<Value = TickInput> {
        (
            -1.0f64..=1.0,
            -1.0f64..=1.0,
            any::<bool>(),
            any::<bool>(),
            any::<bool>(),
            any::<bool>(),
            any::<bool>(),
        )
            .prop_map(|(horizontal, vertical, jump, attack, dash, special, shoot)| TickInput {
                horizontal,
                vertical,
                jump,
                attack,
                dash,
                special,
                shoot,
                pause: false,
            })
    }

    /// A state change is either allowed outright or follows the end of the
    /// locked window it left, after which anything may start
    fn legal_change(player: &Player, from: PlayerState) -> bool {
        let to = player.state;
        if from == to || from.can_transition_to(to) {
            return true;
        }
        match from {
            PlayerState::Dashing => player.dash_time_left == 0,
            PlayerState::Attacking | PlayerState::DownAirAttack => {
                player.attack_time_left == 0
                    || matches!(to, PlayerState::Attacking | PlayerState::DownAirAttack)
            }
            PlayerState::Hurt => player.hurt_time_left == 0,
            _ => false,
        }
    }

    proptest! {
        #[test]
        fn prop_resources_stay_in_range(
            inputs in prop::collection::vec(arb_input(), 1..240),
            hits in prop::collection::vec(0u32..240, 0..6),
        ) {
            let arena = Arena::default();
            let mut player = Player::new(&PlayerConfig::default());
            let mut input = Controller::default();
            let mut was_dead = false;

            for (tick, raw) in inputs.into_iter().enumerate() {
                let before = player.state;
                step(&mut player, &arena, &mut input, raw);
                prop_assert!(
                    legal_change(&player, before),
                    "{:?} -> {:?}", before, player.state
                );
                if hits.contains(&(tick as u32)) {
                    let before = player.state;
                    player.take_damage(30.0, DVec2::new(-4.0, -6.0), &mut input);
                    prop_assert!(
                        legal_change(&player, before),
                        "{:?} -> {:?} on hit", before, player.state
                    );
                }
                prop_assert!(player.stamina >= 0.0);
                prop_assert!(player.stamina <= player.max_stamina);
                prop_assert!(player.health >= 0.0);
                prop_assert!(arena.check_collision(&player.body()).is_none());
                if was_dead {
                    prop_assert_eq!(player.state, PlayerState::Dead);
                }
                was_dead = player.is_dead();
            }
        }
    }
}
