//! Deterministic simulation module
//!
//! All gameplay logic lives here:
//! - Fixed timestep only, every duration counted in ticks
//! - Seeded RNG only
//! - Entities query geometry through `CollisionWorld`, never the arena directly
//! - No rendering or platform dependencies

pub mod arena;
pub mod boss;
pub mod dodge;
pub mod input;
pub mod math;
pub mod player;
pub mod projectile;
pub mod projectile_manager;
pub mod state;
pub mod tick;
pub mod worker_pool;

pub use arena::{Arena, Axis, AxisMove, CollisionWorld, WallSide, move_axis};
pub use boss::{Boss, BossAction, BossIntent, BossPhase, BossState, TargetInfo};
pub use dodge::DodgeSystem;
pub use input::{Controller, FrameWindow, Haptic, TickInput};
pub use math::Rect;
pub use player::{Player, PlayerAction, PlayerState};
pub use projectile::{Owner, Projectile, ProjectileKind, ProjectilePool};
pub use projectile_manager::{HomingTargets, ProjectileManager, ProjectileStats};
pub use state::{BossView, GamePhase, GameSnapshot, GameState, PlayerView};
pub use tick::tick;
pub use worker_pool::WorkerPool;
