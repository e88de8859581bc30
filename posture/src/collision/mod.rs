pub mod env;
pub mod self_collision;

use crate::config::CollisionSettings;
use multibody::body::BodyId;
use nalgebra::{DMatrix, Isometry3, RowDVector, Vector3};
use proximity::{Hull, Witness};
use tracing::{debug, warn};

/// A body hull against a hull fixed in the world
#[derive(Debug, Clone)]
pub struct EnvCollision {
    pub body: BodyId,
    pub body_from_hull: Isometry3<f64>,
    pub body_hull: Hull,
    pub world_from_env: Isometry3<f64>,
    pub env_hull: Hull,
}

/// Two hulls of the same mechanism
#[derive(Debug, Clone)]
pub struct SelfCollision {
    pub body1: BodyId,
    pub body1_from_hull: Isometry3<f64>,
    pub body1_hull: Hull,
    pub body2: BodyId,
    pub body2_from_hull: Isometry3<f64>,
    pub body2_hull: Hull,
}

/// Gradient of the signed distance with respect to a displacement of the side 0 witness point.
///
/// The witness points give `d = p1 - p2`, whose orientation flips once the hulls overlap; the
/// distance sign flips with it, so `sign(distance) * d / |d|` points the same way in both
/// regimes and must agree with `-normal1`. Degenerate or disagreeing witnesses use the normal.
pub(crate) fn distance_direction(witness: &Witness, settings: &CollisionSettings) -> Vector3<f64> {
    let normal = -witness.normal1;
    let d = witness.point1 - witness.point2;
    let norm = d.norm();
    if norm < settings.degenerate_tolerance {
        return normal;
    }

    let sign = if witness.distance < 0.0 { -1.0 } else { 1.0 };
    let direction = d * (sign / norm);
    let alignment = direction.dot(&normal);
    if alignment < 0.0 {
        warn!(
            distance = witness.distance,
            alignment, "witness points disagree with the distance sign, using the contact normal"
        );
        return normal;
    }
    if alignment < 1.0 - settings.alignment_tolerance {
        debug!(alignment, "witness points are not along the contact normal");
        return normal;
    }
    direction
}

/// `direction^T` times the linear velocity rows of a point Jacobian
pub(crate) fn project_linear(direction: &Vector3<f64>, jac: &DMatrix<f64>, row: &mut RowDVector<f64>) {
    direction.tr_mul_to(&jac.fixed_rows::<3>(3), row);
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use nalgebra::Point3;

    fn witness(distance: f64, point1: [f64; 3], point2: [f64; 3]) -> Witness {
        Witness {
            distance,
            point1: Point3::from(point1),
            point2: Point3::from(point2),
            normal1: Vector3::x(),
        }
    }

    #[test]
    fn test_direction_is_stable_across_overlap() {
        let settings = CollisionSettings::default();
        let apart = witness(0.1, [0.5, 0.0, 0.0], [0.6, 0.0, 0.0]);
        let overlap = witness(-0.1, [0.6, 0.0, 0.0], [0.5, 0.0, 0.0]);
        assert_abs_diff_eq!(distance_direction(&apart, &settings), -Vector3::x(), epsilon = 1e-12);
        assert_abs_diff_eq!(distance_direction(&overlap, &settings), -Vector3::x(), epsilon = 1e-12);
    }

    #[test]
    fn test_direction_falls_back_to_normal() {
        let settings = CollisionSettings::default();
        let touching = witness(0.0, [0.5, 0.0, 0.0], [0.5, 0.0, 0.0]);
        assert_eq!(distance_direction(&touching, &settings), -Vector3::x());

        // separated but the points claim the opposite side
        let flipped = witness(0.1, [0.6, 0.0, 0.0], [0.5, 0.0, 0.0]);
        assert_eq!(distance_direction(&flipped, &settings), -Vector3::x());

        let skewed = witness(0.1, [0.5, 0.3, 0.0], [0.6, 0.0, 0.0]);
        assert_eq!(distance_direction(&skewed, &settings), -Vector3::x());
    }

    #[test]
    fn test_project_linear() {
        let mut jac = DMatrix::zeros(6, 2);
        jac[(3, 0)] = 1.0;
        jac[(4, 1)] = 2.0;
        jac[(0, 0)] = 5.0;
        let mut row = RowDVector::zeros(2);
        project_linear(&Vector3::new(3.0, 4.0, 0.0), &jac, &mut row);
        assert_eq!(row, RowDVector::from_vec(vec![3.0, 8.0]));
    }
}
