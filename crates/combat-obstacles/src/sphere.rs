//! Spherical obstacle (planet, station hulk).

use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::intersection::PathIntersection;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SphereObstacle {
    pub center: Vec3,
    pub radius: f32,
}

impl SphereObstacle {
    pub fn new(center: Vec3, radius: f32) -> Self {
        Self { center, radius }
    }

    pub fn find_intersection(&self, origin: Vec3, direction: Vec3) -> PathIntersection {
        let offset = origin - self.center;
        let c = offset.length_squared() - self.radius * self.radius;
        if c <= 0.0 {
            let normal = offset.try_normalize().unwrap_or(Vec3::Z);
            return PathIntersection::hit(0.0, origin, normal, false);
        }

        let b = offset.dot(direction);
        let discriminant = b * b - c;
        if discriminant < 0.0 {
            return PathIntersection::miss();
        }
        let t = -b - discriminant.sqrt();
        if t < 0.0 {
            // sphere is behind the path
            return PathIntersection::miss();
        }
        let point = origin + direction * t;
        let normal = (point - self.center) / self.radius;
        PathIntersection::hit(t, point, normal, true)
    }
}
