//! Path intersection record and obstacle-avoidance steering.

use glam::Vec3;

use crate::Obstacle;

/// Result of intersecting a path with an obstacle surface.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct PathIntersection {
    pub intersect: bool,
    /// Distance along the path to the surface; zero when already inside.
    pub distance: f32,
    pub surface_point: Vec3,
    pub surface_normal: Vec3,
    /// Direction a vehicle should turn toward to clear the obstacle.
    pub steer_hint: Vec3,
    pub vehicle_outside: bool,
}

impl PathIntersection {
    pub fn miss() -> Self {
        Self {
            vehicle_outside: true,
            ..Self::default()
        }
    }

    pub fn hit(distance: f32, surface_point: Vec3, surface_normal: Vec3, vehicle_outside: bool) -> Self {
        Self {
            intersect: true,
            distance,
            surface_point,
            surface_normal,
            steer_hint: surface_normal,
            vehicle_outside,
        }
    }
}

/// Steering away from the nearest obstacle the vehicle would reach within
/// `min_time` seconds. Zero when the path is clear.
///
/// The returned force is the component of the steer hint perpendicular to
/// `forward`, scaled to `max_force`.
pub fn avoidance_force(
    obstacles: &[Obstacle],
    position: Vec3,
    forward: Vec3,
    speed: f32,
    max_force: f32,
    min_time: f32,
) -> Vec3 {
    let horizon = min_time * speed;
    let nearest = obstacles
        .iter()
        .map(|obstacle| obstacle.find_intersection(position, forward))
        .filter(|hit| hit.intersect && hit.distance <= horizon)
        .min_by(|a, b| a.distance.total_cmp(&b.distance));

    let Some(hit) = nearest else {
        return Vec3::ZERO;
    };

    let lateral = hit.steer_hint - forward * hit.steer_hint.dot(forward);
    let lateral = match lateral.try_normalize() {
        Some(lateral) => lateral,
        // head-on: any sideways direction clears it
        None => forward.any_orthonormal_vector(),
    };
    lateral * max_force
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::SphereObstacle;

    #[test]
    fn test_no_obstacles_no_force() {
        let force = avoidance_force(&[], Vec3::ZERO, Vec3::X, 10.0, 5.0, 6.0);
        assert_eq!(force, Vec3::ZERO);
    }

    #[test]
    fn test_obstacle_beyond_horizon_ignored() {
        let sphere = Obstacle::Sphere(SphereObstacle::new(Vec3::new(100.0, 0.0, 0.0), 5.0));
        let force = avoidance_force(&[sphere], Vec3::ZERO, Vec3::X, 1.0, 5.0, 6.0);
        assert_eq!(force, Vec3::ZERO);
    }

    #[test]
    fn test_obstacle_ahead_produces_lateral_force() {
        let sphere = Obstacle::Sphere(SphereObstacle::new(Vec3::new(20.0, 1.0, 0.0), 5.0));
        let force = avoidance_force(&[sphere], Vec3::ZERO, Vec3::X, 10.0, 5.0, 6.0);
        assert!((force.length() - 5.0).abs() < 1e-4, "force {force:?}");
        assert!(force.dot(Vec3::X).abs() < 1e-4, "force should be lateral");
        assert!(force.y < 0.0, "should steer away from the off-center sphere");
    }
}
