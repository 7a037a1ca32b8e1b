//! Static arena geometry and the collision queries entities run against it
//!
//! Entities never hold the arena. Each update receives a `&dyn CollisionWorld`,
//! so tests can substitute any geometry.

use glam::DVec2;
use serde::{Deserialize, Serialize};

use super::math::{Rect, sign};
use crate::consts::*;

/// Which lateral wall a body is in contact with
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum WallSide {
    Left,
    Right,
}

impl WallSide {
    /// -1 for the left wall, +1 for the right wall
    #[inline]
    pub fn sign(self) -> f64 {
        match self {
            WallSide::Left => -1.0,
            WallSide::Right => 1.0,
        }
    }
}

/// Read-only collision queries against static geometry
pub trait CollisionWorld {
    /// First obstacle hit by `rect` (floor, then left walls, then right walls)
    /// and the vector that, added to `rect`, separates it from that obstacle.
    fn check_collision(&self, rect: &Rect) -> Option<DVec2>;

    /// Whether `rect` rests on any geometry (2 unit tolerance below its bottom edge)
    fn is_on_ground(&self, rect: &Rect) -> bool;

    /// Lateral wall contact, with an absolute-position fallback near the arena edges
    fn is_touching_wall(&self, rect: &Rect) -> Option<WallSide>;

    /// Horizontal extent of the playfield
    fn width(&self) -> f64;

    /// Y coordinate used as the "fell out of the world" reference
    fn floor_y(&self) -> f64;
}

/// Axis selector for separated movement
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    X,
    Y,
}

impl Axis {
    #[inline]
    fn unit(self, amount: f64) -> DVec2 {
        match self {
            Axis::X => DVec2::new(amount, 0.0),
            Axis::Y => DVec2::new(0.0, amount),
        }
    }

    #[inline]
    fn component(self, v: DVec2) -> f64 {
        match self {
            Axis::X => v.x,
            Axis::Y => v.y,
        }
    }
}

/// Outcome of moving a body along one axis
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AxisMove {
    pub position: DVec2,
    pub blocked: bool,
}

/// Gap left between a body and an obstacle when floating-point rounding
/// makes an exact edge contact register as overlap.
const CONTACT_EPSILON: f64 = 1e-7;

/// Move a body (center `position`, extent `size`) by `delta` along `axis`.
///
/// A blocked move snaps the body flush against the obstacle instead of
/// stopping short. If the snapped position still overlaps (corner grazes,
/// bodies already embedded) the body keeps its previous position.
pub fn move_axis(
    world: &dyn CollisionWorld,
    position: DVec2,
    size: DVec2,
    delta: f64,
    axis: Axis,
) -> AxisMove {
    if delta == 0.0 {
        return AxisMove {
            position,
            blocked: false,
        };
    }

    let candidate = position + axis.unit(delta);
    let Some(penetration) = world.check_collision(&Rect::from_center(candidate, size)) else {
        return AxisMove {
            position: candidate,
            blocked: false,
        };
    };

    let blocked = AxisMove {
        position,
        blocked: true,
    };

    let along = axis.component(penetration);
    if along == 0.0 || sign(along) == sign(delta) || along.abs() > delta.abs() {
        return blocked;
    }

    let snapped = candidate + axis.unit(along);
    if world
        .check_collision(&Rect::from_center(snapped, size))
        .is_none()
    {
        return AxisMove {
            position: snapped,
            blocked: true,
        };
    }

    let backed_off = snapped - axis.unit(sign(delta) * CONTACT_EPSILON);
    if world
        .check_collision(&Rect::from_center(backed_off, size))
        .is_none()
    {
        return AxisMove {
            position: backed_off,
            blocked: true,
        };
    }

    blocked
}

/// The fight arena: one floor slab and a wall segment on each side
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Arena {
    pub width: f64,
    pub height: f64,
    pub floor: Rect,
    pub left_walls: Vec<Rect>,
    pub right_walls: Vec<Rect>,
    pub floor_y: f64,
    /// Ticks since the fight started (drives ambient animation on the render side)
    pub elapsed_ticks: u64,
}

impl Default for Arena {
    fn default() -> Self {
        Self::new(SCREEN_WIDTH, SCREEN_HEIGHT)
    }
}

impl Arena {
    pub fn new(width: f64, height: f64) -> Self {
        Self {
            width,
            height,
            floor: Rect::new(0.0, FLOOR_TOP, width, height - FLOOR_TOP),
            left_walls: vec![Rect::new(0.0, WALL_TOP, WALL_THICKNESS, FLOOR_TOP - WALL_TOP)],
            right_walls: vec![Rect::new(
                width - WALL_THICKNESS,
                WALL_TOP,
                WALL_THICKNESS,
                FLOOR_TOP - WALL_TOP,
            )],
            floor_y: FLOOR_Y,
            elapsed_ticks: 0,
        }
    }

    pub fn update(&mut self) {
        self.elapsed_ticks += 1;
    }

    /// Region entities are expected to stay inside
    pub fn bounds(&self) -> Rect {
        Rect::new(
            BOUNDS_INSET,
            0.0,
            self.width - BOUNDS_INSET * 2.0,
            self.floor_y,
        )
    }

    /// All static rectangles, in collision priority order
    pub fn segments(&self) -> impl Iterator<Item = &Rect> {
        std::iter::once(&self.floor)
            .chain(self.left_walls.iter())
            .chain(self.right_walls.iter())
    }
}

impl CollisionWorld for Arena {
    fn check_collision(&self, rect: &Rect) -> Option<DVec2> {
        self.segments()
            .find(|segment| segment.intersects(rect))
            .map(|segment| segment.penetration(rect))
    }

    fn is_on_ground(&self, rect: &Rect) -> bool {
        let probe = Rect::new(rect.x, rect.y, rect.width, rect.height + 2.0);
        self.segments().any(|segment| segment.intersects(&probe))
    }

    fn is_touching_wall(&self, rect: &Rect) -> Option<WallSide> {
        let left_probe = Rect::new(
            rect.x - WALL_PROBE,
            rect.y + 5.0,
            rect.width + WALL_PROBE,
            rect.height - 10.0,
        );
        if self.left_walls.iter().any(|w| w.intersects(&left_probe)) {
            return Some(WallSide::Left);
        }

        let right_probe = Rect::new(
            rect.x,
            rect.y + 5.0,
            rect.width + WALL_PROBE,
            rect.height - 10.0,
        );
        if self.right_walls.iter().any(|w| w.intersects(&right_probe)) {
            return Some(WallSide::Right);
        }

        // The lateral clamps keep bodies just off the wall slabs, so the
        // absolute edge check is what usually reports contact
        if rect.left() <= WALL_MARGIN {
            Some(WallSide::Left)
        } else if rect.right() >= self.width - WALL_MARGIN {
            Some(WallSide::Right)
        } else {
            None
        }
    }

    fn width(&self) -> f64 {
        self.width
    }

    fn floor_y(&self) -> f64 {
        self.floor_y
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_floor_has_priority() {
        let arena = Arena::default();
        // Overlaps both the floor and the left wall
        let rect = Rect::new(40.0, 590.0, 20.0, 20.0);
        let pen = arena.check_collision(&rect);
        assert_eq!(pen, Some(DVec2::new(0.0, -10.0)));
    }

    #[test]
    fn test_ground_tolerance() {
        let arena = Arena::default();
        assert!(arena.is_on_ground(&Rect::new(300.0, 540.0, 40.0, 60.0)));
        assert!(arena.is_on_ground(&Rect::new(300.0, 539.0, 40.0, 60.0)));
        assert!(!arena.is_on_ground(&Rect::new(300.0, 530.0, 40.0, 60.0)));
    }

    #[test]
    fn test_wall_contact() {
        let arena = Arena::default();
        // Probe reaches the left slab
        assert_eq!(
            arena.is_touching_wall(&Rect::new(55.0, 300.0, 40.0, 60.0)),
            Some(WallSide::Left)
        );
        // Absolute fallback at the clamp position
        assert_eq!(
            arena.is_touching_wall(&Rect::new(60.0, 50.0, 40.0, 60.0)),
            Some(WallSide::Left)
        );
        assert_eq!(
            arena.is_touching_wall(&Rect::new(1180.0, 50.0, 40.0, 60.0)),
            Some(WallSide::Right)
        );
        assert_eq!(
            arena.is_touching_wall(&Rect::new(600.0, 300.0, 40.0, 60.0)),
            None
        );
    }

    #[test]
    fn test_bounds() {
        let arena = Arena::default();
        assert_eq!(arena.bounds(), Rect::new(110.0, 0.0, 1060.0, 650.0));
    }

    #[test]
    fn test_move_axis_lands_flush_on_floor() {
        let arena = Arena::default();
        let size = DVec2::new(40.0, 60.0);
        let moved = move_axis(&arena, DVec2::new(400.0, 565.0), size, 12.0, Axis::Y);
        assert!(moved.blocked);
        let rect = Rect::from_center(moved.position, size);
        assert!((rect.bottom() - 600.0).abs() < 1e-6);
        assert!(arena.check_collision(&rect).is_none());
    }

    #[test]
    fn test_move_axis_free() {
        let arena = Arena::default();
        let size = DVec2::new(40.0, 60.0);
        let moved = move_axis(&arena, DVec2::new(400.0, 300.0), size, 6.0, Axis::X);
        assert!(!moved.blocked);
        assert_eq!(moved.position, DVec2::new(406.0, 300.0));
    }

    proptest! {
        #[test]
        fn prop_falling_never_tunnels(
            x in 120.0f64..1100.0,
            y in 300.0f64..569.0,
            speed in 0.1f64..40.0,
        ) {
            let arena = Arena::default();
            let size = DVec2::new(40.0, 60.0);
            let moved = move_axis(&arena, DVec2::new(x, y), size, speed, Axis::Y);
            let rect = Rect::from_center(moved.position, size);
            prop_assert!(arena.check_collision(&rect).is_none());
            if moved.blocked {
                prop_assert!((rect.bottom() - 600.0).abs() < 1e-6);
            }
        }

        #[test]
        fn prop_sideways_never_tunnels(
            x in 71.0f64..80.0,
            delta in -40.0f64..-0.1,
        ) {
            let arena = Arena::default();
            let size = DVec2::new(40.0, 60.0);
            let moved = move_axis(&arena, DVec2::new(x, 300.0), size, delta, Axis::X);
            let rect = Rect::from_center(moved.position, size);
            prop_assert!(arena.check_collision(&rect).is_none());
            if moved.blocked {
                prop_assert!((rect.left() - 50.0).abs() < 1e-6);
            } else {
                prop_assert!((moved.position.x - (x + delta)).abs() < 1e-9);
            }
        }
    }
}
