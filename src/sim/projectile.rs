//! Projectiles and the bounded pool they are recycled through

use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::mpsc::{self, Receiver, SyncSender};

use glam::DVec2;
use serde::{Deserialize, Serialize};

use super::math::Rect;
use crate::lock;

/// Which side fired a projectile
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum Owner {
    #[default]
    Player,
    Boss,
}

impl Owner {
    pub fn opponent(self) -> Owner {
        match self {
            Owner::Player => Owner::Boss,
            Owner::Boss => Owner::Player,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Owner::Player => "player",
            Owner::Boss => "boss",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum ProjectileKind {
    #[default]
    PlayerBasic,
    PlayerCharged,
    BossFireball,
    BossMissile,
}

/// Per-kind constants
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct KindProfile {
    pub speed: f64,
    pub damage: f64,
    pub lifetime: u32,
    pub size: f64,
    /// Steering strength toward the target, zero for straight shots
    pub homing_force: f64,
    pub color: [u8; 4],
}

impl ProjectileKind {
    pub fn owner(self) -> Owner {
        match self {
            ProjectileKind::PlayerBasic | ProjectileKind::PlayerCharged => Owner::Player,
            ProjectileKind::BossFireball | ProjectileKind::BossMissile => Owner::Boss,
        }
    }

    pub fn profile(self) -> KindProfile {
        match self {
            ProjectileKind::PlayerBasic => KindProfile {
                speed: 12.0,
                damage: 15.0,
                lifetime: 180,
                size: 8.0,
                homing_force: 0.0,
                color: [100, 200, 255, 255],
            },
            ProjectileKind::PlayerCharged => KindProfile {
                speed: 10.0,
                damage: 30.0,
                lifetime: 240,
                size: 12.0,
                homing_force: 0.0,
                color: [150, 100, 255, 255],
            },
            ProjectileKind::BossFireball => KindProfile {
                speed: 8.0,
                damage: 20.0,
                lifetime: 300,
                size: 16.0,
                homing_force: 0.0,
                color: [255, 100, 50, 255],
            },
            ProjectileKind::BossMissile => KindProfile {
                speed: 6.0,
                damage: 25.0,
                lifetime: 360,
                size: 10.0,
                homing_force: 0.3,
                color: [255, 50, 50, 255],
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct Projectile {
    pub id: u32,
    pub kind: ProjectileKind,
    pub owner: Owner,
    pub position: DVec2,
    pub velocity: DVec2,
    pub size: DVec2,
    pub damage: f64,
    pub speed: f64,
    pub lifetime: u32,
    pub age: u32,
    pub active: bool,
    pub homing: bool,
    pub homing_force: f64,
    /// Homing target, refreshed by the manager every tick
    pub target: Option<DVec2>,
    pub color: [u8; 4],
}

impl Projectile {
    /// Set up a fresh (or recycled) instance for `kind`, travelling along `direction`
    pub fn configure(&mut self, id: u32, kind: ProjectileKind, position: DVec2, direction: DVec2) {
        let profile = kind.profile();
        *self = Projectile {
            id,
            kind,
            owner: kind.owner(),
            position,
            velocity: direction.normalize_or_zero() * profile.speed,
            size: DVec2::splat(profile.size),
            damage: profile.damage,
            speed: profile.speed,
            lifetime: profile.lifetime,
            age: 0,
            active: true,
            homing: profile.homing_force > 0.0,
            homing_force: profile.homing_force,
            target: None,
            color: profile.color,
        };
    }

    pub fn reset(&mut self) {
        *self = Projectile::default();
    }

    /// Advance one tick. Returns whether the projectile is still live.
    ///
    /// `bounds` is the screen rectangle grown by the out-of-bounds margin.
    pub fn update(&mut self, bounds: &Rect) -> bool {
        if !self.active {
            return false;
        }

        self.age += 1;
        if self.age >= self.lifetime {
            self.active = false;
            return false;
        }

        if self.homing {
            if let Some(target) = self.target {
                self.velocity += (target - self.position).normalize_or_zero() * self.homing_force;
                self.velocity = self.velocity.clamp_length_max(self.speed);
            }
        }

        self.position += self.velocity;

        if !bounds.contains(self.position) {
            self.active = false;
        }
        self.active
    }

    /// Centered hitbox
    pub fn hitbox(&self) -> Rect {
        Rect::from_center(self.position, self.size)
    }
}

/// Allocation counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoolStats {
    pub created: usize,
    pub reused: usize,
}

/// Free list backed by a bounded channel.
///
/// `get` never blocks: an empty pool allocates. `put` never blocks either:
/// a full pool drops the instance.
pub struct ProjectilePool {
    sender: SyncSender<Projectile>,
    receiver: Mutex<Receiver<Projectile>>,
    created: AtomicUsize,
    reused: AtomicUsize,
}

impl ProjectilePool {
    pub fn new(capacity: usize) -> Self {
        let (sender, receiver) = mpsc::sync_channel(capacity);
        Self {
            sender,
            receiver: Mutex::new(receiver),
            created: AtomicUsize::new(0),
            reused: AtomicUsize::new(0),
        }
    }

    pub fn get(&self, id: u32, kind: ProjectileKind, position: DVec2, direction: DVec2) -> Projectile {
        let recycled = lock(&self.receiver).try_recv().ok();
        let mut projectile = match recycled {
            Some(projectile) => {
                self.reused.fetch_add(1, Ordering::Relaxed);
                projectile
            }
            None => {
                self.created.fetch_add(1, Ordering::Relaxed);
                log::debug!("projectile pool empty, allocating");
                Projectile::default()
            }
        };
        projectile.configure(id, kind, position, direction);
        projectile
    }

    pub fn put(&self, mut projectile: Projectile) {
        projectile.reset();
        // Full pool: let it drop
        let _ = self.sender.try_send(projectile);
    }

    pub fn stats(&self) -> PoolStats {
        PoolStats {
            created: self.created.load(Ordering::Relaxed),
            reused: self.reused.load(Ordering::Relaxed),
        }
    }
}
