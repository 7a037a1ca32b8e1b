//! Active projectile set
//!
//! Below the fan-out threshold projectiles update sequentially on the tick
//! thread. At or above it the update is spread across threads (rayon by
//! default, or the persistent worker pool) and joined before compaction, so
//! the tick never observes a half-updated set.

use std::sync::Mutex;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::mpsc;

use glam::DVec2;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use super::math::Rect;
use super::projectile::{Owner, Projectile, ProjectileKind, ProjectilePool};
use super::worker_pool::WorkerPool;
use crate::lock;
use crate::settings::{ProjectileConfig, UpdateStrategy};

/// Positions homing projectiles steer toward, keyed by who they are hunting
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct HomingTargets {
    pub player: Option<DVec2>,
    pub boss: Option<DVec2>,
}

impl HomingTargets {
    fn for_shooter(&self, owner: Owner) -> Option<DVec2> {
        match owner {
            Owner::Player => self.boss,
            Owner::Boss => self.player,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectileStats {
    pub active: usize,
    pub created: usize,
    pub reused: usize,
}

pub struct ProjectileManager {
    projectiles: Mutex<Vec<Projectile>>,
    pool: ProjectilePool,
    next_id: AtomicU32,
    bounds: Rect,
    parallel_threshold: usize,
    workers: Option<WorkerPool>,
}

impl ProjectileManager {
    pub fn new(config: &ProjectileConfig, screen: DVec2) -> Self {
        let workers = match config.strategy {
            UpdateStrategy::Scoped => None,
            UpdateStrategy::WorkerPool => match WorkerPool::new(config.workers, config.worker_queue) {
                Ok(pool) => Some(pool),
                Err(err) => {
                    log::warn!("failed to start projectile workers ({err}), using scoped update");
                    None
                }
            },
        };

        Self {
            projectiles: Mutex::new(Vec::new()),
            pool: ProjectilePool::new(config.pool_capacity),
            next_id: AtomicU32::new(1),
            bounds: Rect::new(0.0, 0.0, screen.x, screen.y).expand(config.bounds_margin),
            parallel_threshold: config.parallel_threshold,
            workers,
        }
    }

    /// Fire a projectile; returns its id
    pub fn spawn(&self, kind: ProjectileKind, position: DVec2, direction: DVec2) -> u32 {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let projectile = self.pool.get(id, kind, position, direction);
        lock(&self.projectiles).push(projectile);
        id
    }

    pub fn update(&self, targets: HomingTargets) {
        let mut projectiles = lock(&self.projectiles);

        for projectile in projectiles.iter_mut().filter(|p| p.homing) {
            projectile.target = targets.for_shooter(projectile.owner);
        }

        let bounds = self.bounds;
        if projectiles.len() < self.parallel_threshold {
            for projectile in projectiles.iter_mut() {
                projectile.update(&bounds);
            }
        } else if let Some(workers) = &self.workers {
            let taken = std::mem::take(&mut *projectiles);
            *projectiles = update_on_workers(workers, taken, bounds);
        } else {
            projectiles.par_iter_mut().for_each(|projectile| {
                projectile.update(&bounds);
            });
        }

        let (live, expired): (Vec<_>, Vec<_>) =
            std::mem::take(&mut *projectiles).into_iter().partition(|p| p.active);
        *projectiles = live;
        drop(projectiles);

        for projectile in expired {
            self.pool.put(projectile);
        }
    }

    /// Deactivate every projectile fired by `shooter` that overlaps `hurtbox`
    /// and return them (already recycled) to the caller for damage resolution.
    pub fn take_hits(&self, shooter: Owner, hurtbox: &Rect) -> Vec<Projectile> {
        let mut projectiles = lock(&self.projectiles);
        let (hits, rest): (Vec<_>, Vec<_>) = std::mem::take(&mut *projectiles)
            .into_iter()
            .partition(|p| p.active && p.owner == shooter && p.hitbox().intersects(hurtbox));
        *projectiles = rest;
        drop(projectiles);

        for projectile in &hits {
            self.pool.put(projectile.clone());
        }
        hits
    }

    /// Copy of the live set
    pub fn active_projectiles(&self) -> Vec<Projectile> {
        lock(&self.projectiles).clone()
    }

    pub fn projectiles_by_owner(&self, owner: Owner) -> Vec<Projectile> {
        lock(&self.projectiles)
            .iter()
            .filter(|p| p.owner == owner)
            .cloned()
            .collect()
    }

    pub fn active_count(&self) -> usize {
        lock(&self.projectiles).len()
    }

    pub fn stats(&self) -> ProjectileStats {
        let pool = self.pool.stats();
        ProjectileStats {
            active: self.active_count(),
            created: pool.created,
            reused: pool.reused,
        }
    }

    /// Return every projectile to the pool
    pub fn clear(&self) {
        let drained = std::mem::take(&mut *lock(&self.projectiles));
        for projectile in drained {
            self.pool.put(projectile);
        }
    }

    /// Clear and stop the worker pool, if any
    pub fn shutdown(&mut self) {
        self.clear();
        if let Some(workers) = self.workers.as_mut() {
            workers.stop();
        }
    }
}

fn update_on_workers(workers: &WorkerPool, projectiles: Vec<Projectile>, bounds: Rect) -> Vec<Projectile> {
    let (tx, rx) = mpsc::channel();
    for mut projectile in projectiles {
        let tx = tx.clone();
        workers.submit(Box::new(move || {
            projectile.update(&bounds);
            let _ = tx.send(projectile);
        }));
    }
    drop(tx);

    // Every job owns a sender, so this returns once all of them have finished
    let mut updated: Vec<Projectile> = rx.iter().collect();
    updated.sort_by_key(|p| p.id);
    updated
}

#[cfg(test)]
mod tests {
    use super::*;

    fn manager(strategy: UpdateStrategy) -> ProjectileManager {
        let config = ProjectileConfig {
            strategy,
            ..Default::default()
        };
        ProjectileManager::new(&config, DVec2::new(1280.0, 720.0))
    }

    #[test]
    fn test_spawn_and_owner_filter() {
        let m = manager(UpdateStrategy::Scoped);
        m.spawn(ProjectileKind::PlayerBasic, DVec2::new(100.0, 100.0), DVec2::X);
        m.spawn(ProjectileKind::BossFireball, DVec2::new(900.0, 100.0), -DVec2::X);
        m.spawn(ProjectileKind::BossMissile, DVec2::new(900.0, 200.0), -DVec2::X);
        assert_eq!(m.active_count(), 3);
        assert_eq!(m.projectiles_by_owner(Owner::Boss).len(), 2);
        assert_eq!(m.projectiles_by_owner(Owner::Player).len(), 1);
    }

    #[test]
    fn test_expired_return_to_pool() {
        let m = manager(UpdateStrategy::Scoped);
        m.spawn(ProjectileKind::PlayerBasic, DVec2::new(1325.0, 100.0), DVec2::X);
        m.update(HomingTargets::default());
        assert_eq!(m.active_count(), 0);

        m.spawn(ProjectileKind::PlayerBasic, DVec2::new(100.0, 100.0), DVec2::X);
        let stats = m.stats();
        assert_eq!(stats.created, 1);
        assert_eq!(stats.reused, 1);
        assert_eq!(stats.active, 1);
    }

    #[test]
    fn test_missile_homes_on_player() {
        let m = manager(UpdateStrategy::Scoped);
        m.spawn(ProjectileKind::BossMissile, DVec2::new(640.0, 100.0), DVec2::X);
        let targets = HomingTargets {
            player: Some(DVec2::new(640.0, 600.0)),
            boss: None,
        };
        for _ in 0..20 {
            m.update(targets);
        }
        let missiles = m.active_projectiles();
        assert!(missiles[0].velocity.y > 0.0);
        assert_eq!(missiles[0].target, targets.player);
    }

    fn spawn_many(m: &ProjectileManager, count: usize) {
        for i in 0..count {
            let y = 50.0 + i as f64 * 10.0;
            m.spawn(ProjectileKind::PlayerBasic, DVec2::new(100.0, y), DVec2::X);
        }
    }

    #[test]
    fn test_parallel_matches_sequential() {
        let small = manager(UpdateStrategy::Scoped);
        spawn_many(&small, 10);
        small.update(HomingTargets::default());

        for strategy in [UpdateStrategy::Scoped, UpdateStrategy::WorkerPool] {
            let mut large = manager(strategy);
            spawn_many(&large, 40);
            large.update(HomingTargets::default());
            let updated = large.active_projectiles();
            assert_eq!(updated.len(), 40);
            assert!(updated.iter().all(|p| p.age == 1 && p.position.x == 112.0));
            assert!(updated.windows(2).all(|w| w[0].id < w[1].id));
            large.shutdown();
        }

        assert!(small.active_projectiles().iter().all(|p| p.position.x == 112.0));
    }

    #[test]
    fn test_take_hits_only_matches_shooter() {
        let m = manager(UpdateStrategy::Scoped);
        m.spawn(ProjectileKind::PlayerBasic, DVec2::new(500.0, 300.0), DVec2::X);
        m.spawn(ProjectileKind::BossFireball, DVec2::new(500.0, 300.0), DVec2::X);
        let hurtbox = Rect::new(480.0, 280.0, 40.0, 40.0);

        let hits = m.take_hits(Owner::Boss, &hurtbox);
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].kind, ProjectileKind::BossFireball);
        assert_eq!(m.active_count(), 1);
    }

    #[test]
    fn test_clear() {
        let m = manager(UpdateStrategy::Scoped);
        spawn_many(&m, 5);
        m.clear();
        assert_eq!(m.active_count(), 0);
    }
}
