//! Movement & physics integration
//!
//! Three motion models cover every game built on this core:
//! free 2D motion with friction and a speed cap, lane-based motion with
//! smooth interpolation toward a target x, and ballistic vertical motion
//! for jumps. Each touches only the fields passed in; invalid deltas are
//! clamped upstream by the frame driver.

use glam::Vec2;

use super::aabb::Aabb;
use crate::{clamp_length, smoothing_weight};

/// Free 2D motion: apply friction, cap speed, advance position
pub fn integrate_free(
    pos: &mut Vec2,
    vel: &mut Vec2,
    friction_residual: f32,
    max_speed: f32,
    dt: f32,
) {
    *vel *= 1.0 - smoothing_weight(friction_residual, dt);
    *vel = clamp_length(*vel, max_speed);
    *pos += *vel * dt;
}

/// Lane motion: interpolate x smoothly toward the target lane center
pub fn step_lane(x: f32, target_x: f32, smoothing_residual: f32, dt: f32) -> f32 {
    x + (target_x - x) * smoothing_weight(smoothing_residual, dt)
}

/// Ballistic vertical motion with a ground clamp.
///
/// Returns true on the step the entity lands (vertical velocity zeroed,
/// y snapped to ground).
pub fn integrate_ballistic(
    y: &mut f32,
    vy: &mut f32,
    gravity: f32,
    ground_y: f32,
    dt: f32,
) -> bool {
    *vy += gravity * dt;
    *y += *vy * dt;
    if *y >= ground_y {
        *y = ground_y;
        *vy = 0.0;
        return true;
    }
    false
}

/// Keep an entity's hitbox inside the arena, zeroing velocity on the
/// clamped axis so it doesn't grind against the wall
pub fn clamp_to_bounds(pos: &mut Vec2, vel: &mut Vec2, size: Vec2, bounds: &Aabb) {
    let half = size * 0.5;
    let min_x = bounds.min.x + half.x;
    let max_x = bounds.max.x - half.x;
    let min_y = bounds.min.y + half.y;
    let max_y = bounds.max.y - half.y;

    if pos.x < min_x {
        pos.x = min_x;
        vel.x = 0.0;
    } else if pos.x > max_x {
        pos.x = max_x;
        vel.x = 0.0;
    }
    if pos.y < min_y {
        pos.y = min_y;
        vel.y = 0.0;
    } else if pos.y > max_y {
        pos.y = max_y;
        vel.y = 0.0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consts::SIM_DT;

    #[test]
    fn test_free_motion_advances_position() {
        let mut pos = Vec2::ZERO;
        let mut vel = Vec2::new(100.0, 0.0);
        integrate_free(&mut pos, &mut vel, 0.5, 400.0, SIM_DT);
        assert!(pos.x > 0.0);
        // Friction slows the velocity
        assert!(vel.x < 100.0);
    }

    #[test]
    fn test_free_motion_speed_cap() {
        let mut pos = Vec2::ZERO;
        let mut vel = Vec2::new(1e5, 0.0);
        integrate_free(&mut pos, &mut vel, 0.99, 400.0, SIM_DT);
        assert!(vel.length() <= 400.0 + 0.001);
    }

    #[test]
    fn test_lane_converges() {
        let mut x = 0.0;
        for _ in 0..600 {
            x = step_lane(x, 160.0, 0.0001, SIM_DT);
        }
        assert!((x - 160.0).abs() < 1.0);
    }

    #[test]
    fn test_ballistic_lands_exactly_on_ground() {
        let ground = 400.0;
        let mut y = ground;
        let mut vy = -600.0;
        let mut landed = false;
        for _ in 0..10_000 {
            if integrate_ballistic(&mut y, &mut vy, 1500.0, ground, SIM_DT) {
                landed = true;
                break;
            }
            // While airborne the entity stays above ground
            assert!(y <= ground);
        }
        assert!(landed);
        assert_eq!(y, ground);
        assert_eq!(vy, 0.0);
    }

    #[test]
    fn test_clamp_to_bounds() {
        let bounds = Aabb::new(Vec2::ZERO, Vec2::new(800.0, 450.0));
        let mut pos = Vec2::new(-50.0, 200.0);
        let mut vel = Vec2::new(-300.0, 10.0);
        clamp_to_bounds(&mut pos, &mut vel, Vec2::new(40.0, 40.0), &bounds);
        assert_eq!(pos.x, 20.0);
        assert_eq!(vel.x, 0.0);
        // Unclamped axis untouched
        assert_eq!(vel.y, 10.0);
    }

    proptest::proptest! {
        #[test]
        fn prop_speed_never_exceeds_cap(
            vx in -1e4f32..1e4,
            vy in -1e4f32..1e4,
        ) {
            let mut pos = Vec2::ZERO;
            let mut vel = Vec2::new(vx, vy);
            integrate_free(&mut pos, &mut vel, 0.5, 320.0, SIM_DT);
            proptest::prop_assert!(vel.length() <= 320.0 * 1.0001);
        }
    }
}
