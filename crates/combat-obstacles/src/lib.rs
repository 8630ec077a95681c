//! Static obstacles of the battle space.
//!
//! Analytic shapes answering a single query: where does a path starting at
//! `origin` heading along unit `direction` first meet the surface.

pub mod belt;
pub mod intersection;
pub mod sphere;

use glam::Vec3;
use serde::{Deserialize, Serialize};

pub use belt::BeltObstacle;
pub use intersection::{avoidance_force, PathIntersection};
pub use sphere::SphereObstacle;

/// Any static obstacle.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "shape")]
pub enum Obstacle {
    Belt(BeltObstacle),
    Sphere(SphereObstacle),
}

impl Obstacle {
    pub fn find_intersection(&self, origin: Vec3, direction: Vec3) -> PathIntersection {
        match self {
            Obstacle::Belt(belt) => belt.find_intersection(origin, direction),
            Obstacle::Sphere(sphere) => sphere.find_intersection(origin, direction),
        }
    }
}
