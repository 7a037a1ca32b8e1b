//! Fixed timestep simulation tick
//!
//! Advances the fight by one tick. Entity updates, intent application and
//! combat resolution all happen here in a fixed order, so two states built
//! from the same config and fed the same inputs stay identical.

use glam::DVec2;

use super::boss::{BossIntent, BossPhase, BossState, TargetInfo};
use super::input::TickInput;
use super::math::{Rect, sign};
use super::player::{PlayerAction, PlayerState};
use super::projectile::{Owner, ProjectileKind};
use super::projectile_manager::HomingTargets;
use super::state::{GamePhase, GameState};
use crate::audio::SoundEffect;
use crate::combat::{CombatEvent, CombatEventKind, DamageCalculator, DamageType};

/// Observations taken before the entity updates, for edge detection
#[derive(Debug, Clone, Copy)]
struct Before {
    player_state: PlayerState,
    jump_count: u32,
    combo: u32,
    boss_state: BossState,
}

/// Advance the game state by one fixed timestep
pub fn tick(state: &mut GameState, input: &TickInput) {
    state.controller.update(*input);

    if state.controller.is_pause_pressed() {
        match state.phase {
            GamePhase::Playing => {
                state.phase = GamePhase::Paused;
                log::info!("Paused");
            }
            GamePhase::Paused => {
                state.phase = GamePhase::Playing;
                log::info!("Resumed");
            }
            GamePhase::Victory | GamePhase::GameOver => {}
        }
    }

    if state.phase != GamePhase::Playing {
        return;
    }

    // Freeze frame: the countdown still runs or it would never end
    let frozen = state.effects.hit_stop.should_freeze();
    state.effects.hit_stop.update();
    if frozen {
        state.frozen_ticks += 1;
        return;
    }

    state.time_ticks += 1;
    state.arena.update();

    let before = Before {
        player_state: state.player.state,
        jump_count: state.player.jump_count,
        combo: state.player.combo,
        boss_state: state.boss.state,
    };

    state.player.update(&state.arena, &mut state.controller);
    let target = TargetInfo {
        position: state.player.position,
        on_ground: state.player.on_ground,
    };
    state.boss.update(&state.arena, target);

    react_to_transitions(state, before);
    apply_player_actions(state);
    apply_boss_intents(state);

    if state.boss.phase >= BossPhase::Phase2 && !state.boss.is_dead() {
        run_dodge(state);
    }

    resolve_player_melee(state);
    resolve_boss_melee(state);
    resolve_projectiles(state);
    report_missed_attacks(state);

    state.effects.update();
    check_outcome(state);
}

fn react_to_transitions(state: &mut GameState, before: Before) {
    let player = &state.player;

    if player.state == PlayerState::Dashing && before.player_state != PlayerState::Dashing {
        state.audio.play(SoundEffect::Dash);
    }
    if player.state == PlayerState::Attacking && before.player_state != PlayerState::Attacking {
        state.audio.play(SoundEffect::Slash);
    }
    if player.jump_count > before.jump_count {
        state.audio.play(SoundEffect::Jump);
    }
    if player.combo > before.combo && player.combo > 1 {
        state.events.emit(
            CombatEvent::new(CombatEventKind::ComboIncreased, Owner::Player, Owner::Boss)
                .at(player.position)
                .with_combo(player.combo),
        );
    }

    if state.boss.state == BossState::Roar && before.boss_state != BossState::Roar {
        state.audio.play(SoundEffect::BossRoar);
        state
            .effects
            .shake
            .start(state.config.combat.screen_shake_intensity, 30);
    }

    if state.boss.take_phase_change().is_some() {
        state
            .effects
            .shake
            .start(state.config.combat.screen_shake_intensity * 2.0, 45);
        state.audio.play(SoundEffect::BossRoar);
    }
}

fn apply_player_actions(state: &mut GameState) {
    for action in state.player.drain_actions() {
        match action {
            PlayerAction::Shoot {
                kind,
                origin,
                direction,
            } => {
                state.projectiles.spawn(kind, origin, direction);
            }
        }
    }
}

fn apply_boss_intents(state: &mut GameState) {
    for intent in state.boss.drain_intents() {
        match intent {
            BossIntent::StunTarget { ticks } => {
                state.player.apply_stun(ticks, &mut state.controller);
            }
            BossIntent::Shoot {
                kind,
                origin,
                direction,
            } => {
                state.projectiles.spawn(kind, origin, direction);
            }
        }
    }
}

fn run_dodge(state: &mut GameState) {
    let threats = state.projectiles.projectiles_by_owner(Owner::Player);
    let Some(velocity) = state
        .dodge
        .update(state.boss.position, state.arena.width, &threats)
    else {
        return;
    };

    if state.boss.evade(velocity, state.dodge.config().hop_force) {
        state.dodge.commit();
        log::debug!("Boss dodges ({:.1}, {:.1})", velocity.x, velocity.y);
        state.events.emit(
            CombatEvent::new(CombatEventKind::Dodge, Owner::Player, Owner::Boss)
                .at(state.boss.position),
        );
    }
}

fn contact_point(hitbox: &Rect, hurtbox: &Rect) -> DVec2 {
    (hitbox.center() + hurtbox.center()) / 2.0
}

/// Hit stop and shake for a landed hit. Must stay on the tick thread: the
/// freeze decides which ticks simulate.
fn impact_feedback(state: &GameState, critical: bool) {
    let combat = &state.config.combat;
    if critical {
        state.effects.hit_stop.start(combat.critical_hit_stop_frames);
        state
            .effects
            .shake
            .start(combat.screen_shake_intensity * 1.5, combat.screen_shake_frames);
    } else {
        state.effects.hit_stop.start(combat.hit_stop_frames);
        state
            .effects
            .shake
            .start(combat.screen_shake_intensity * 0.5, combat.screen_shake_frames);
    }
}

/// The DamageDealt / DamageTaken / AttackLanded trio, plus CriticalHit
fn emit_hit(state: &GameState, attacker: Owner, damage: f64, position: DVec2, critical: bool) {
    let target = attacker.opponent();
    let combo = match attacker {
        Owner::Player => state.player.combo,
        Owner::Boss => 0,
    };

    for kind in [
        CombatEventKind::AttackLanded,
        CombatEventKind::DamageDealt,
        CombatEventKind::DamageTaken,
    ] {
        state.events.emit(
            CombatEvent::new(kind, attacker, target)
                .with_damage(damage)
                .at(position)
                .with_critical(critical)
                .with_combo(combo),
        );
    }
    if critical {
        state.events.emit(
            CombatEvent::new(CombatEventKind::CriticalHit, attacker, target)
                .with_damage(damage)
                .at(position)
                .with_critical(true),
        );
    }
}

fn emit_kill(state: &GameState, attacker: Owner, position: DVec2) {
    state.events.emit(
        CombatEvent::new(CombatEventKind::Kill, attacker, attacker.opponent()).at(position),
    );
}

/// A boss hit landed; emits its events and reports a kill
fn boss_hit(state: &GameState, damage: f64, position: DVec2, critical: bool) {
    emit_hit(state, Owner::Player, damage, position, critical);
    impact_feedback(state, critical);
    if state.boss.is_dead() {
        emit_kill(state, Owner::Player, state.boss.position);
    }
}

fn resolve_player_melee(state: &mut GameState) {
    let hurtbox = state.boss.hurtbox();

    if let Some(hitbox) = state.player.attack_hitbox()
        && !state.player.attack_connected()
        && hitbox.intersects(&hurtbox)
    {
        state.player.mark_attack_connected();
        let critical = state.damage.roll_critical(state.config.combat.critical_chance);
        let damage = state.damage.calculate_damage(
            state.player.attack_damage(),
            DamageType::Physical,
            critical,
            1.0,
        );
        if state.boss.take_damage(damage, state.player.position) {
            boss_hit(state, damage, contact_point(&hitbox, &hurtbox), critical);
        }
    }

    if let Some(hitbox) = state.player.down_air_hitbox()
        && hitbox.intersects(&hurtbox)
    {
        let damage = state.damage.calculate_damage(
            state.player.down_air_damage(),
            DamageType::True,
            false,
            1.0,
        );
        state.player.pogo_bounce(&mut state.controller);
        if state.boss.take_damage(damage, state.player.position) {
            boss_hit(state, damage, contact_point(&hitbox, &hurtbox), false);
            state.boss.register_pogo();
        }
    }
}

fn resolve_boss_melee(state: &mut GameState) {
    if state.player.is_dead() {
        return;
    }
    let hurtbox = state.player.hurtbox();

    let windows = [
        (state.boss.attack_hitbox(), state.boss.attack_damage()),
        (state.boss.slam_hitbox(), state.boss.slam_damage()),
        (state.boss.charge_hitbox(), state.boss.charge_damage()),
    ];
    let Some((hitbox, base)) = windows
        .into_iter()
        .find_map(|(hitbox, base)| hitbox.filter(|h| h.intersects(&hurtbox)).map(|h| (h, base)))
    else {
        return;
    };
    if state.player.is_invulnerable() {
        return;
    }

    let damage = state
        .damage
        .calculate_damage(base, DamageType::Physical, false, 1.0);
    let away = sign(state.player.position.x - state.boss.position.x);
    let away = if away == 0.0 { state.boss.facing } else { away };
    let force =
        DamageCalculator::calculate_knockback(damage, state.config.combat.base_knockback);
    let knockback = DVec2::new(away * force, -force * 0.5);

    if state
        .player
        .take_damage(damage, knockback, &mut state.controller)
    {
        state.boss.mark_attack_connected();
        player_hit(state, damage, contact_point(&hitbox, &hurtbox));
    }
}

/// A player hit landed; emits its events and reports a kill
fn player_hit(state: &GameState, damage: f64, position: DVec2) {
    emit_hit(state, Owner::Boss, damage, position, false);
    impact_feedback(state, false);
    if state.player.is_dead() {
        emit_kill(state, Owner::Boss, state.player.position);
    }
}

fn resolve_projectiles(state: &mut GameState) {
    state.projectiles.update(HomingTargets {
        player: (!state.player.is_dead()).then_some(state.player.position),
        boss: (!state.boss.is_dead()).then_some(state.boss.position),
    });

    if !state.boss.is_dead() {
        for projectile in state
            .projectiles
            .take_hits(Owner::Player, &state.boss.hurtbox())
        {
            let critical = state.damage.roll_critical(state.config.combat.critical_chance);
            let damage = state.damage.calculate_damage(
                projectile.damage,
                DamageType::Magic,
                critical,
                1.0,
            );
            if state.boss.take_damage(damage, projectile.position) {
                boss_hit(state, damage, projectile.position, critical);
                if projectile.kind == ProjectileKind::PlayerCharged
                    && state.boss.stun(state.config.boss.stun_duration)
                {
                    log::debug!("Charged shot stuns the boss");
                }
            }
        }
    }

    if !state.player.is_dead() {
        for projectile in state
            .projectiles
            .take_hits(Owner::Boss, &state.player.hurtbox())
        {
            let damage = state.damage.calculate_damage(
                projectile.damage,
                DamageType::Magic,
                false,
                1.0,
            );
            let force =
                DamageCalculator::calculate_knockback(damage, state.config.combat.base_knockback);
            let push = projectile.velocity.normalize_or_zero();
            let knockback = DVec2::new(push.x * force, -force * 0.5);
            if state
                .player
                .take_damage(damage, knockback, &mut state.controller)
            {
                player_hit(state, damage, projectile.position);
            }
        }
    }
}

fn report_missed_attacks(state: &mut GameState) {
    for _ in 0..state.player.take_missed_attacks() {
        state.events.emit(
            CombatEvent::new(CombatEventKind::AttackMissed, Owner::Player, Owner::Boss)
                .at(state.player.position),
        );
    }
    for _ in 0..state.boss.take_missed_attacks() {
        state.events.emit(
            CombatEvent::new(CombatEventKind::AttackMissed, Owner::Boss, Owner::Player)
                .at(state.boss.position),
        );
    }
}

fn check_outcome(state: &mut GameState) {
    if state.boss.is_dead() {
        state.phase = GamePhase::Victory;
        log::info!("Victory after {:.1}s", state.elapsed_secs());
    } else if state.player.is_dead() {
        state.phase = GamePhase::GameOver;
        log::info!("Defeat after {:.1}s", state.elapsed_secs());
    }
}
