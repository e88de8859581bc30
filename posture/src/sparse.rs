use multibody::{Jacobian, JointModel, MultiBody};
use nalgebra::RowDVector;
use sprs::{CsMat, TriMat};

/// Where a per-pair block lands in the full matrix
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockOffset {
    pub row: usize,
    /// Start of the joint parameter region
    pub col: usize,
}

/// Scatters a row defined over the body path columns of `jac` into the full parameter columns
pub fn full_jacobian_sparse(
    mb: &MultiBody,
    jac: &Jacobian,
    row: &RowDVector<f64>,
    out: &mut TriMat<f64>,
    offset: BlockOffset,
) {
    for (&joint, &local) in jac.joints_path().iter().zip(jac.local_offsets()) {
        let global = offset.col + mb.param_pos(joint);
        for k in 0..mb.joint(joint).model.nparams() {
            out.add_triplet(offset.row, global + k, row[local + k]);
        }
    }
}

/// Same as `full_jacobian_sparse` into a fresh `shape` matrix holding that single row
pub fn update_full_jacobian_sparse(
    mb: &MultiBody,
    jac: &Jacobian,
    row: &RowDVector<f64>,
    shape: (usize, usize),
    offset: BlockOffset,
) -> CsMat<f64> {
    let mut tri = TriMat::with_capacity(shape, jac.dof());
    full_jacobian_sparse(mb, jac, row, &mut tri, offset);
    tri.to_csr()
}

#[cfg(test)]
mod tests {
    use super::*;
    use mass_properties::MassProperties;
    use multibody::{
        body::{Body, BodyId},
        joint::{prismatic::Prismatic, revolute::Revolute, spherical::Spherical},
        Joint, MultiBodyBuilder,
    };
    use nalgebra::{Isometry3, Vector3};

    /// spherical root with two branches, so the second branch skips the first one's columns
    fn tree() -> MultiBody {
        let mut root = Joint::new("root", Spherical).unwrap();
        root.connect_outer_body(BodyId(0)).unwrap();
        let mut left = Joint::new("left", Revolute::new(Vector3::x()).unwrap()).unwrap();
        left.connect_inner_body(BodyId(0), Isometry3::identity()).unwrap();
        left.connect_outer_body(BodyId(1)).unwrap();
        let mut right = Joint::new("right", Prismatic::new(Vector3::z()).unwrap()).unwrap();
        right.connect_inner_body(BodyId(0), Isometry3::identity()).unwrap();
        right.connect_outer_body(BodyId(2)).unwrap();

        let mut builder = MultiBodyBuilder::new();
        for (id, name) in [(0, "root"), (1, "left"), (2, "right")] {
            builder
                .add_body(Body::new(BodyId(id), name, MassProperties::default()).unwrap())
                .unwrap();
        }
        builder.add_joint(root);
        builder.add_joint(left);
        builder.add_joint(right);
        builder.build().unwrap()
    }

    #[test]
    fn test_row_lands_on_path_columns() {
        let mb = tree();
        let jac = Jacobian::new(&mb, BodyId(2)).unwrap();
        let row = RowDVector::from_vec(vec![1.0, 2.0, 3.0, 4.0, 5.0]);

        // three force slots come first in this layout
        let full = update_full_jacobian_sparse(
            &mb,
            &jac,
            &row,
            (2, 3 + mb.nr_params()),
            BlockOffset { row: 1, col: 3 },
        );
        assert_eq!(full.nnz(), 5);
        let dense = full.to_dense();
        assert_eq!(dense.row(0).sum(), 0.0);
        let expected = [0.0, 0.0, 0.0, 1.0, 2.0, 3.0, 4.0, 0.0, 5.0];
        for (c, value) in expected.iter().enumerate() {
            assert_eq!(dense[[1, c]], *value);
        }
    }
}
