use super::{distance_direction, project_linear, EnvCollision};
use crate::{
    cache::CacheRef,
    config::CollisionSettings,
    function::{check_output, DifferentiableSparseFunction},
    sparse::{full_jacobian_sparse, BlockOffset},
    PostureErrors,
};
use multibody::Jacobian;
use nalgebra::{DVector, Isometry3, Point3, RowDVector};
use proximity::ProximityPair;
use sprs::{CsMat, TriMat};
use tracing::{debug, trace};

#[derive(Debug)]
struct EnvPair {
    body_index: usize,
    body_from_hull: Isometry3<f64>,
    jac: Jacobian,
    row: RowDVector<f64>,
    pair: ProximityPair,
}

/// Signed distance between body hulls and static environment hulls, one row per pair
#[derive(Debug)]
pub struct EnvCollisionConstraint {
    cache: CacheRef,
    pairs: Vec<EnvPair>,
    settings: CollisionSettings,
    nr_nonzero: usize,
}

impl EnvCollisionConstraint {
    pub fn new(cache: CacheRef, cols: &[EnvCollision]) -> Result<Self, PostureErrors> {
        Self::with_settings(cache, cols, CollisionSettings::default())
    }

    pub fn with_settings(
        cache: CacheRef,
        cols: &[EnvCollision],
        settings: CollisionSettings,
    ) -> Result<Self, PostureErrors> {
        let mut pairs = Vec::with_capacity(cols.len());
        let mut nr_nonzero = 0;
        {
            let data = cache.try_borrow().map_err(|_| PostureErrors::CacheInUse)?;
            let mb = data.multibody();
            for col in cols {
                let jac =
                    Jacobian::new(mb, col.body).map_err(|_| PostureErrors::UnknownBody(col.body))?;
                nr_nonzero += jac.dof();
                // only the body side moves
                let mut pair = ProximityPair::new(&col.body_hull, &col.env_hull)
                    .with_prediction(settings.prediction);
                pair.set_transform(1, col.world_from_env)?;
                pairs.push(EnvPair {
                    body_index: jac.body_index(),
                    body_from_hull: col.body_from_hull,
                    row: RowDVector::zeros(jac.dof()),
                    jac,
                    pair,
                });
            }
        }
        debug!(pairs = pairs.len(), nr_nonzero, "environment collision constraint created");
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

impl DifferentiableSparseFunction for EnvCollisionConstraint {
    fn name(&self) -> &str {
        "EnvCollision"
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
            let world_from_body = data.fk().world_from_body(cd.body_index);
            cd.pair.set_transform(0, world_from_body * cd.body_from_hull)?;
            result[i] = cd.pair.distance()?;
            trace!(pair = i, distance = result[i], "environment distance");
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
            let world_from_body = fk.world_from_body(cd.body_index);
            cd.pair.set_transform(0, world_from_body * cd.body_from_hull)?;
            let witness = cd.pair.closest_points()?;
            let direction = distance_direction(&witness, &self.settings);

            let body_point: Point3<f64> = world_from_body.inverse_transform_point(&witness.point1);
            cd.jac.set_point(body_point.coords);
            project_linear(&direction, cd.jac.jacobian(mb, fk), &mut cd.row);
            full_jacobian_sparse(
                mb,
                &cd.jac,
                &cd.row,
                &mut tri,
                BlockOffset {
                    row: i,
                    col: offset_col,
                },
            );
            trace!(pair = i, distance = witness.distance, "environment gradient");
        }
        *jac = tri.to_csr();
        Ok(())
    }
}
