use super::{distance_direction, project_linear, SelfCollision};
use crate::{
    cache::CacheRef,
    config::CollisionSettings,
    function::{check_output, DifferentiableSparseFunction},
    sparse::{update_full_jacobian_sparse, BlockOffset},
    PostureErrors,
};
use multibody::{body::BodyId, Jacobian, MultiBody};
use nalgebra::{DVector, Isometry3, RowDVector};
use proximity::ProximityPair;
use sprs::{CsMat, TriMat};
use tracing::{debug, trace};

#[derive(Debug)]
struct BodySide {
    body_index: usize,
    body_from_hull: Isometry3<f64>,
    jac: Jacobian,
    row: RowDVector<f64>,
}

impl BodySide {
    fn new(mb: &MultiBody, body: BodyId, body_from_hull: Isometry3<f64>) -> Result<Self, PostureErrors> {
        let jac = Jacobian::new(mb, body).map_err(|_| PostureErrors::UnknownBody(body))?;
        Ok(Self {
            body_index: jac.body_index(),
            body_from_hull,
            row: RowDVector::zeros(jac.dof()),
            jac,
        })
    }
}

#[derive(Debug)]
struct SelfPair {
    sides: [BodySide; 2],
    pair: ProximityPair,
}

/// Signed distance between hull pairs of the same mechanism, one row per pair
#[derive(Debug)]
pub struct SelfCollisionConstraint {
    cache: CacheRef,
    pairs: Vec<SelfPair>,
    settings: CollisionSettings,
    nr_nonzero: usize,
}

impl SelfCollisionConstraint {
    pub fn new(cache: CacheRef, cols: &[SelfCollision]) -> Result<Self, PostureErrors> {
        Self::with_settings(cache, cols, CollisionSettings::default())
    }

    pub fn with_settings(
        cache: CacheRef,
        cols: &[SelfCollision],
        settings: CollisionSettings,
    ) -> Result<Self, PostureErrors> {
        let mut pairs = Vec::with_capacity(cols.len());
        let mut nr_nonzero = 0;
        {
            let data = cache.try_borrow().map_err(|_| PostureErrors::CacheInUse)?;
            let mb = data.multibody();
            for col in cols {
                let side1 = BodySide::new(mb, col.body1, col.body1_from_hull)?;
                let side2 = BodySide::new(mb, col.body2, col.body2_from_hull)?;
                // overlapping paths make this an overestimate
                nr_nonzero += side1.jac.dof() + side2.jac.dof();
                pairs.push(SelfPair {
                    sides: [side1, side2],
                    pair: ProximityPair::new(&col.body1_hull, &col.body2_hull)
                        .with_prediction(settings.prediction),
                });
            }
        }
        debug!(pairs = pairs.len(), nr_nonzero, "self collision constraint created");
        Ok(Self {
            cache,
            pairs,
            settings,
            nr_nonzero,
        })
    }

    pub fn settings(&self) -> &CollisionSettings {
        &self.settings
    }
}

impl DifferentiableSparseFunction for SelfCollisionConstraint {
    fn name(&self) -> &str {
        "SelfCollision"
    }

    fn input_size(&self) -> usize {
        self.cache.borrow().pb_size()
    }

    fn output_size(&self) -> usize {
        self.pairs.len()
    }

    fn nonzero_upper_bound(&self) -> usize {
        self.nr_nonzero
    }

    fn compute(
        &mut self,
        x: &DVector<f64>,
        result: &mut DVector<f64>,
    ) -> Result<(), PostureErrors> {
        check_output(result, self.pairs.len())?;
        let mut data = self.cache.try_borrow_mut().map_err(|_| PostureErrors::CacheInUse)?;
        data.set_parameters(x)?;

        for (i, cd) in self.pairs.iter_mut().enumerate() {
            for (k, side) in cd.sides.iter().enumerate() {
                let world_from_body = data.fk().world_from_body(side.body_index);
                cd.pair.set_transform(k, world_from_body * side.body_from_hull)?;
            }
            result[i] = cd.pair.distance()?;
            trace!(pair = i, distance = result[i], "self distance");
        }
        Ok(())
    }

    fn jacobian(&mut self, x: &DVector<f64>, jac: &mut CsMat<f64>) -> Result<(), PostureErrors> {
        let mut data = self.cache.try_borrow_mut().map_err(|_| PostureErrors::CacheInUse)?;
        data.set_parameters(x)?;
        let shape = (self.pairs.len(), data.pb_size());
        let offset_col = data.q_params_begin();
        let mb = data.multibody();
        let fk = data.fk();

        let mut tri = TriMat::with_capacity(shape, self.nr_nonzero);
        for (i, cd) in self.pairs.iter_mut().enumerate() {
            for (k, side) in cd.sides.iter().enumerate() {
                let world_from_body = fk.world_from_body(side.body_index);
                cd.pair.set_transform(k, world_from_body * side.body_from_hull)?;
            }
            let witness = cd.pair.closest_points()?;
            let direction = distance_direction(&witness, &self.settings);

            let offset = BlockOffset {
                row: i,
                col: offset_col,
            };
            let mut full = Vec::with_capacity(2);
            for (side, point) in cd.sides.iter_mut().zip([witness.point1, witness.point2]) {
                let body_point = fk
                    .world_from_body(side.body_index)
                    .inverse_transform_point(&point);
                side.jac.set_point(body_point.coords);
                project_linear(&direction, side.jac.jacobian(mb, fk), &mut side.row);
                full.push(update_full_jacobian_sparse(mb, &side.jac, &side.row, shape, offset));
            }

            // shared ancestors show up in both rows and partly cancel
            let merged = &full[0] - &full[1];
            for (value, (r, c)) in merged.iter() {
                tri.add_triplet(r, c, *value);
            }
            trace!(pair = i, distance = witness.distance, "self gradient");
        }
        *jac = tri.to_csr();
        Ok(())
    }
}
