use nalgebra::{Isometry3, Point3, Vector3};
use parry3d_f64::{
    query,
    shape::{Shape, SharedShape},
};
use std::fmt;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum ProximityErrors {
    #[error("could not build a convex hull from {0} points")]
    DegenerateHull(usize),
    #[error("side {0} does not exist, a pair only has sides 0 and 1")]
    InvalidSide(usize),
    #[error("hulls are further apart than the prediction distance {0}")]
    OutOfRange(f64),
    #[error("proximity query is not supported between {0} and {1}")]
    Unsupported(String, String),
}

/// Convex shape in its own local frame.
/// Cloning is cheap, the geometry is reference counted and shared between pairs.
#[derive(Clone)]
pub struct Hull {
    shape: SharedShape,
}

impl Hull {
    pub fn convex_hull(points: &[Point3<f64>]) -> Result<Self, ProximityErrors> {
        if points.len() < 4 {
            return Err(ProximityErrors::DegenerateHull(points.len()));
        }
        let shape = SharedShape::convex_hull(points)
            .ok_or(ProximityErrors::DegenerateHull(points.len()))?;
        Ok(Self { shape })
    }

    pub fn cuboid(half_extents: Vector3<f64>) -> Self {
        Self {
            shape: SharedShape::cuboid(half_extents.x, half_extents.y, half_extents.z),
        }
    }

    pub fn ball(radius: f64) -> Self {
        Self {
            shape: SharedShape::ball(radius),
        }
    }

    /// Capsule along the local z axis
    pub fn capsule(half_height: f64, radius: f64) -> Self {
        Self {
            shape: SharedShape::capsule_z(half_height, radius),
        }
    }

    pub fn shape(&self) -> &dyn Shape {
        &*self.shape
    }
}

impl fmt::Debug for Hull {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Hull")
            .field("shape", &self.shape.shape_type())
            .finish()
    }
}

/// Closest features of a pair, all in the world frame
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Witness {
    /// Negative when the hulls overlap
    pub distance: f64,
    pub point1: Point3<f64>,
    pub point2: Point3<f64>,
    /// Outward normal of side 0, pointing towards side 1
    pub normal1: Vector3<f64>,
}

/// Proximity query between two hulls whose world poses are updated in place
#[derive(Debug, Clone)]
pub struct ProximityPair {
    hulls: [Hull; 2],
    world_from_hull: [Isometry3<f64>; 2],
    prediction: f64,
}

impl ProximityPair {
    pub const DEFAULT_PREDICTION: f64 = 1000.0;

    pub fn new(hull1: &Hull, hull2: &Hull) -> Self {
        Self {
            hulls: [hull1.clone(), hull2.clone()],
            world_from_hull: [Isometry3::identity(); 2],
            prediction: Self::DEFAULT_PREDICTION,
        }
    }

    /// Largest separation the pair reports; queries beyond it fail with `OutOfRange`
    pub fn with_prediction(mut self, prediction: f64) -> Self {
        self.prediction = prediction;
        self
    }

    pub fn prediction(&self) -> f64 {
        self.prediction
    }

    pub fn set_transform(
        &mut self,
        side: usize,
        world_from_hull: Isometry3<f64>,
    ) -> Result<(), ProximityErrors> {
        let slot = self
            .world_from_hull
            .get_mut(side)
            .ok_or(ProximityErrors::InvalidSide(side))?;
        *slot = world_from_hull;
        Ok(())
    }

    pub fn transform(&self, side: usize) -> Result<&Isometry3<f64>, ProximityErrors> {
        self.world_from_hull
            .get(side)
            .ok_or(ProximityErrors::InvalidSide(side))
    }

    pub fn hull(&self, side: usize) -> Result<&Hull, ProximityErrors> {
        self.hulls.get(side).ok_or(ProximityErrors::InvalidSide(side))
    }

    /// Signed distance, negative when the hulls overlap
    pub fn distance(&self) -> Result<f64, ProximityErrors> {
        Ok(self.closest_points()?.distance)
    }

    pub fn closest_points(&self) -> Result<Witness, ProximityErrors> {
        let [hull1, hull2] = &self.hulls;
        let contact = query::contact(
            &self.world_from_hull[0],
            hull1.shape(),
            &self.world_from_hull[1],
            hull2.shape(),
            self.prediction,
        )
        .map_err(|_| {
            ProximityErrors::Unsupported(
                format!("{:?}", hull1.shape.shape_type()),
                format!("{:?}", hull2.shape.shape_type()),
            )
        })?
        .ok_or(ProximityErrors::OutOfRange(self.prediction))?;

        Ok(Witness {
            distance: contact.dist,
            point1: contact.point1,
            point2: contact.point2,
            normal1: contact.normal1.into_inner(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    const TOL: f64 = 1e-9;

    fn cubes(separation: f64) -> ProximityPair {
        let cube = Hull::cuboid(Vector3::new(0.5, 0.5, 0.5));
        let mut pair = ProximityPair::new(&cube, &cube);
        pair.set_transform(1, Isometry3::translation(separation, 0.0, 0.0))
            .unwrap();
        pair
    }

    #[test]
    fn test_gap_is_positive() {
        let pair = cubes(1.1);
        assert_abs_diff_eq!(pair.distance().unwrap(), 0.1, epsilon = TOL);

        let witness = pair.closest_points().unwrap();
        assert_abs_diff_eq!(witness.point1.x, 0.5, epsilon = TOL);
        assert_abs_diff_eq!(witness.point2.x, 0.6, epsilon = TOL);
        assert_abs_diff_eq!(witness.normal1, Vector3::x(), epsilon = TOL);
    }

    #[test]
    fn test_overlap_is_negative() {
        let pair = cubes(0.8);
        assert_abs_diff_eq!(pair.distance().unwrap(), -0.2, epsilon = TOL);

        let ball = Hull::ball(0.5);
        let mut balls = ProximityPair::new(&ball, &ball);
        balls
            .set_transform(1, Isometry3::translation(0.0, 0.6, 0.0))
            .unwrap();
        let witness = balls.closest_points().unwrap();
        assert_abs_diff_eq!(witness.distance, -0.4, epsilon = TOL);
        // witness points swap sides when overlapping
        let d = witness.point1 - witness.point2;
        assert_abs_diff_eq!(d.normalize(), witness.normal1, epsilon = TOL);
        assert_abs_diff_eq!(witness.normal1, Vector3::y(), epsilon = TOL);
    }

    #[test]
    fn test_out_of_range_and_sides() {
        let mut pair = cubes(5.0).with_prediction(1.0);
        assert_eq!(pair.distance().unwrap_err(), ProximityErrors::OutOfRange(1.0));
        assert_eq!(
            pair.set_transform(2, Isometry3::identity()).unwrap_err(),
            ProximityErrors::InvalidSide(2)
        );
        assert!(pair.transform(1).is_ok());
        assert!(pair.hull(3).is_err());
    }

    #[test]
    fn test_convex_hull_against_ball() {
        let corners: Vec<Point3<f64>> = (0..8)
            .map(|i| {
                Point3::new(
                    if i & 1 == 0 { -0.5 } else { 0.5 },
                    if i & 2 == 0 { -0.5 } else { 0.5 },
                    if i & 4 == 0 { -0.5 } else { 0.5 },
                )
            })
            .collect();
        let hull = Hull::convex_hull(&corners).unwrap();
        let ball = Hull::ball(0.25);
        let mut pair = ProximityPair::new(&hull, &ball);
        pair.set_transform(1, Isometry3::translation(0.0, 0.0, 1.0))
            .unwrap();
        assert_abs_diff_eq!(pair.distance().unwrap(), 0.25, epsilon = 1e-6);

        assert_eq!(
            Hull::convex_hull(&corners[0..3]).unwrap_err(),
            ProximityErrors::DegenerateHull(3)
        );
    }
}
