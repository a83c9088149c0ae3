use log::warn;
use nalgebra::Point2;
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Circular obstacle.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Circle {
    pub x: f64,
    pub y: f64,
    pub radius: f64,
}

impl Circle {
    pub fn new(x: f64, y: f64, radius: f64) -> Circle {
        Circle { x, y, radius }
    }
    pub fn center(&self) -> Point2<f64> {
        Point2::new(self.x, self.y)
    }
    /// Points on the boundary are outside.
    pub fn contains(&self, point: &Point2<f64>) -> bool {
        nalgebra::distance(&self.center(), point) < self.radius
    }
}

/// Set of circular obstacles over a continuous workspace.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct CollisionWorld {
    circles: Vec<Circle>,
}

impl CollisionWorld {
    pub fn new() -> CollisionWorld {
        CollisionWorld::default()
    }
    /// Adds a circle. Circles with a negative or non-finite radius, or a non-finite center,
    /// are ignored.
    pub fn add_circle(&mut self, circle: Circle) {
        if !(circle.x.is_finite() && circle.y.is_finite() && circle.radius.is_finite())
            || circle.radius < 0.0
        {
            warn!("Ignoring malformed obstacle {:?}", circle);
            return;
        }
        self.circles.push(circle);
    }
    pub fn circles(&self) -> &[Circle] {
        &self.circles
    }
    pub fn is_point_free(&self, point: &Point2<f64>) -> bool {
        !self.circles.iter().any(|c| c.contains(point))
    }
    /// Samples the segment at `max(2, round(length))` equal intervals, both ends included.
    /// Obstacles thinner than the sample spacing can slip through.
    pub fn is_segment_free(&self, start: &Point2<f64>, end: &Point2<f64>) -> bool {
        let steps = nalgebra::distance(start, end).round().max(2.0) as usize;
        (0..=steps).all(|i| {
            let t = i as f64 / steps as f64;
            self.is_point_free(&Point2::from(start.coords.lerp(&end.coords, t)))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn point_collision() {
        let mut world = CollisionWorld::new();
        world.add_circle(Circle::new(25.0, 25.0, 5.0));
        assert!(!world.is_point_free(&Point2::new(25.0, 25.0)));
        assert!(!world.is_point_free(&Point2::new(29.0, 25.0)));
        assert!(world.is_point_free(&Point2::new(0.0, 0.0)));
        // The boundary itself is free.
        assert!(world.is_point_free(&Point2::new(30.0, 25.0)));
    }

    #[test]
    fn empty_world_is_free() {
        let world = CollisionWorld::new();
        assert!(world.is_point_free(&Point2::new(50.0, 50.0)));
        assert!(world.is_segment_free(&Point2::new(0.0, 0.0), &Point2::new(100.0, 100.0)));
    }

    #[test]
    fn segment_through_obstacle() {
        let mut world = CollisionWorld::new();
        world.add_circle(Circle::new(10.0, 0.0, 1.5));
        assert!(!world.is_segment_free(&Point2::new(0.0, 0.0), &Point2::new(20.0, 0.0)));
        assert!(world.is_segment_free(&Point2::new(0.0, 3.0), &Point2::new(20.0, 3.0)));
        // Endpoints are sampled too, even for very short segments.
        assert!(!world.is_segment_free(&Point2::new(10.0, 0.0), &Point2::new(10.1, 0.0)));
    }

    #[test]
    fn malformed_circles_are_ignored() {
        let mut world = CollisionWorld::new();
        world.add_circle(Circle::new(1.0, 1.0, -2.0));
        world.add_circle(Circle::new(f64::NAN, 1.0, 2.0));
        world.add_circle(Circle::new(1.0, 1.0, f64::INFINITY));
        assert!(world.circles().is_empty());
        world.add_circle(Circle::new(1.0, 1.0, 0.0));
        assert_eq!(world.circles().len(), 1);
        // A zero radius circle blocks nothing.
        assert!(world.is_point_free(&Point2::new(1.0, 1.0)));
    }
}
