use crate::PostureErrors;
use multibody::{
    body::BodyId, ForwardKinematics, InverseDynamics, JointModel, MultiBody,
};
use nalgebra::{convert, DVector, Isometry3, RealField, Vector3};
use spatial_algebra::{lift_isometry, ForceVector, SpatialTransform};
use std::{
    cell::RefCell,
    fmt::{self, Display, Formatter},
    rc::Rc,
};
use tracing::debug;

#[cfg(feature = "autodiff")]
use num_dual::Dual64;

/// Maps one slot of the parameter vector to the scalar the kinematics run on
pub trait Construct {
    type Scalar: RealField + Copy;
    /// `size` is the full parameter vector length, `index` the slot holding `value`
    fn construct(&self, size: usize, index: usize, value: f64) -> Self::Scalar;
}

/// Plain numeric evaluation
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Plain;

impl Construct for Plain {
    type Scalar = f64;
    fn construct(&self, _size: usize, _index: usize, value: f64) -> f64 {
        value
    }
}

/// Forward mode differentiation along a fixed direction of the parameter vector.
/// Every derived quantity carries its directional derivative in the dual part.
///
/// One pass yields one directional derivative. A full gradient takes one cache per
/// parameter, each built with `Tangent::unit`.
#[cfg(feature = "autodiff")]
#[derive(Debug, Clone, PartialEq)]
pub struct Tangent {
    direction: DVector<f64>,
}

#[cfg(feature = "autodiff")]
impl Tangent {
    pub fn new(direction: DVector<f64>) -> Self {
        Self { direction }
    }

    /// Seeds the derivative with respect to a single slot
    pub fn unit(size: usize, index: usize) -> Self {
        let mut direction = DVector::zeros(size);
        direction[index] = 1.0;
        Self { direction }
    }

    pub fn direction(&self) -> &DVector<f64> {
        &self.direction
    }
}

#[cfg(feature = "autodiff")]
impl Construct for Tangent {
    type Scalar = Dual64;
    fn construct(&self, size: usize, index: usize, value: f64) -> Dual64 {
        // a direction sized for another layout seeds nothing
        let eps = if self.direction.len() == size {
            self.direction[index]
        } else {
            0.0
        };
        Dual64::new(value, eps)
    }
}

/// Contact force application points on one body.
/// Each point owns three slots of the force region of the parameter vector.
#[derive(Debug, Clone, PartialEq)]
pub struct ForceDescriptor<T: RealField + Copy = f64> {
    pub body: BodyId,
    /// Point frames in the body frame
    pub body_from_points: Vec<Isometry3<f64>>,
    /// Force at each point in the point frame, rewritten on every update
    pub forces: Vec<ForceVector<T>>,
    /// Friction coefficient
    pub mu: f64,
    body_index: usize,
}

impl<T: RealField + Copy> ForceDescriptor<T> {
    pub fn new(body: BodyId, body_from_points: Vec<Isometry3<f64>>, mu: f64) -> Self {
        Self {
            body,
            forces: vec![ForceVector::zeros(); body_from_points.len()],
            body_from_points,
            mu,
            body_index: 0,
        }
    }

    pub fn body_index(&self) -> usize {
        self.body_index
    }
}

/// Ellipse drawn on a body surface, five slots of the shape region
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EllipseDescriptor<T: RealField + Copy = f64> {
    pub body: BodyId,
    pub x: T,
    pub y: T,
    /// Angle between the surface x axis and the first ellipse axis
    pub theta: T,
    pub r1: T,
    pub r2: T,
    body_index: usize,
}

impl<T: RealField + Copy> EllipseDescriptor<T> {
    pub fn new(body: BodyId) -> Self {
        Self {
            body,
            x: T::zero(),
            y: T::zero(),
            theta: T::zero(),
            r1: T::zero(),
            r2: T::zero(),
            body_index: 0,
        }
    }

    pub fn body_index(&self) -> usize {
        self.body_index
    }
}

/// matplotlib patch syntax, handy to plot optimized ellipses
impl<T: RealField + Copy + Display> Display for EllipseDescriptor<T> {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        let two: T = convert(2.0);
        let degrees = self.theta * convert(180.0) / T::pi();
        write!(
            f,
            "Ellipse(({}, {}), {}, {}, {})",
            self.x,
            self.y,
            self.r1 * two,
            self.r2 * two,
            degrees
        )
    }
}

/// Shared handle, one per optimization problem
pub type CacheRef<C = Plain> = Rc<RefCell<KinematicCache<C>>>;

/// Kinematic state derived from the current parameter vector.
///
/// The parameter vector holds, in order, the joint parameters, three force components per
/// force point and five shape values per ellipse. Forward kinematics is refreshed on every
/// accepted write; inverse dynamics only when asked for and stale.
#[derive(Debug, Clone)]
pub struct KinematicCache<C: Construct = Plain> {
    mb: MultiBody,
    gravity: Vector3<f64>,
    construct: C,
    x: DVector<f64>,
    q: Vec<Vec<C::Scalar>>,
    nr_force_points: usize,
    force_descriptors: Vec<ForceDescriptor<C::Scalar>>,
    ellipse_descriptors: Vec<EllipseDescriptor<C::Scalar>>,
    body_forces: Vec<ForceVector<C::Scalar>>,
    fk: ForwardKinematics<C::Scalar>,
    id: InverseDynamics<C::Scalar>,
    x_stamp: usize,
    id_stamp: usize,
}

impl KinematicCache<Plain> {
    pub fn new(mb: MultiBody, gravity: Vector3<f64>) -> Result<Self, PostureErrors> {
        Self::with_construct(mb, gravity, Plain)
    }

    pub fn into_shared(self) -> CacheRef {
        Rc::new(RefCell::new(self))
    }
}

impl<C: Construct> KinematicCache<C> {
    pub fn with_construct(
        mb: MultiBody,
        gravity: Vector3<f64>,
        construct: C,
    ) -> Result<Self, PostureErrors> {
        let q = mb
            .joints()
            .iter()
            .map(|j| vec![nalgebra::zero::<C::Scalar>(); j.model.nparams()])
            .collect();
        let mut cache = Self {
            gravity,
            construct,
            x: DVector::zeros(mb.nr_params()),
            q,
            nr_force_points: 0,
            force_descriptors: Vec::new(),
            ellipse_descriptors: Vec::new(),
            body_forces: vec![ForceVector::zeros(); mb.nr_bodies()],
            fk: ForwardKinematics::new(&mb),
            id: InverseDynamics::new(&mb),
            x_stamp: 1,
            id_stamp: 1,
            mb,
        };
        cache.update()?;
        Ok(cache)
    }

    /// Stores `x` and refreshes the kinematics, unless `x` is the vector already held.
    /// A floating base quaternion is normalized first.
    pub fn set_parameters(&mut self, x: &DVector<f64>) -> Result<(), PostureErrors> {
        if x.len() != self.x.len() {
            return Err(PostureErrors::SizeMismatch {
                expected: self.x.len(),
                got: x.len(),
            });
        }

        let mut normalized = x.clone();
        if self.mb.nr_joints() > 0 && self.mb.joint(0).model.is_floating() {
            let mut head = normalized.rows_mut(0, 4);
            let norm = head.norm();
            if norm <= f64::EPSILON {
                return Err(PostureErrors::DegenerateQuaternion);
            }
            head /= norm;
        }

        if self.x == normalized {
            return Ok(());
        }
        self.x = normalized;
        self.x_stamp += 1;
        self.update()
    }

    /// Replaces the force descriptors and resets the parameter vector to zeros of the new size
    pub fn set_force_descriptors(
        &mut self,
        mut descriptors: Vec<ForceDescriptor<C::Scalar>>,
    ) -> Result<(), PostureErrors> {
        for fd in descriptors.iter_mut() {
            fd.body_index = self
                .mb
                .body_index(fd.body)
                .map_err(|_| PostureErrors::UnknownBody(fd.body))?;
            fd.forces = vec![ForceVector::zeros(); fd.body_from_points.len()];
        }
        self.nr_force_points = descriptors.iter().map(|fd| fd.body_from_points.len()).sum();
        self.force_descriptors = descriptors;
        self.reset()
    }

    /// Replaces the ellipse descriptors and resets the parameter vector to zeros of the new size
    pub fn set_ellipse_descriptors(
        &mut self,
        mut descriptors: Vec<EllipseDescriptor<C::Scalar>>,
    ) -> Result<(), PostureErrors> {
        for ed in descriptors.iter_mut() {
            ed.body_index = self
                .mb
                .body_index(ed.body)
                .map_err(|_| PostureErrors::UnknownBody(ed.body))?;
        }
        self.ellipse_descriptors = descriptors;
        self.reset()
    }

    fn reset(&mut self) -> Result<(), PostureErrors> {
        self.x = DVector::zeros(self.pb_size());
        self.x_stamp += 1;
        self.update()
    }

    /// Static inverse dynamics of the current configuration, recomputed only when stale
    pub fn inverse_dynamics(&mut self) -> Result<&InverseDynamics<C::Scalar>, PostureErrors> {
        if self.id_stamp != self.x_stamp {
            self.id
                .run(&self.mb, &self.fk, &self.gravity, &self.body_forces)?;
            self.id_stamp = self.x_stamp;
            debug!(stamp = self.x_stamp, "inverse dynamics recomputed");
        }
        Ok(&self.id)
    }

    fn update(&mut self) -> Result<(), PostureErrors> {
        let size = self.x.len();
        let construct = &self.construct;
        let x = &self.x;
        let value = |index: usize| construct.construct(size, index, x[index]);

        let mut pos = 0;
        for q in self.q.iter_mut() {
            for slot in q.iter_mut() {
                *slot = value(pos);
                pos += 1;
            }
        }
        self.fk.run(&self.mb, &self.q)?;

        // several descriptors may share a body
        self.body_forces.fill(ForceVector::zeros());
        for fd in self.force_descriptors.iter_mut() {
            for (body_from_point, force) in fd.body_from_points.iter().zip(fd.forces.iter_mut()) {
                *force = ForceVector::new(
                    Vector3::zeros(),
                    Vector3::new(value(pos), value(pos + 1), value(pos + 2)),
                );
                let body_from_point = SpatialTransform(lift_isometry(body_from_point));
                self.body_forces[fd.body_index] += body_from_point * *force;
                pos += 3;
            }
        }

        for ed in self.ellipse_descriptors.iter_mut() {
            ed.x = value(pos);
            ed.y = value(pos + 1);
            ed.theta = value(pos + 2);
            ed.r1 = value(pos + 3);
            ed.r2 = value(pos + 4);
            pos += 5;
        }

        debug!(stamp = self.x_stamp, size, "kinematic cache updated");
        Ok(())
    }

    /// Total parameter vector length
    pub fn pb_size(&self) -> usize {
        self.mb.nr_params() + 3 * self.nr_force_points + 5 * self.ellipse_descriptors.len()
    }

    pub fn q_params_begin(&self) -> usize {
        0
    }

    pub fn force_params_begin(&self) -> usize {
        self.mb.nr_params()
    }

    pub fn ellipse_params_begin(&self) -> usize {
        self.force_params_begin() + 3 * self.nr_force_points
    }

    pub fn nr_force_points(&self) -> usize {
        self.nr_force_points
    }

    pub fn multibody(&self) -> &MultiBody {
        &self.mb
    }

    pub fn gravity(&self) -> &Vector3<f64> {
        &self.gravity
    }

    /// Bumped on every accepted parameter write
    pub fn x_stamp(&self) -> usize {
        self.x_stamp
    }

    /// Write stamp the inverse dynamics result corresponds to
    pub fn id_stamp(&self) -> usize {
        self.id_stamp
    }

    pub fn parameters(&self) -> &DVector<f64> {
        &self.x
    }

    pub fn q(&self) -> &[Vec<C::Scalar>] {
        &self.q
    }

    pub fn fk(&self) -> &ForwardKinematics<C::Scalar> {
        &self.fk
    }

    /// Net external wrench on each body, body frame
    pub fn body_forces(&self) -> &[ForceVector<C::Scalar>] {
        &self.body_forces
    }

    pub fn force_descriptors(&self) -> &[ForceDescriptor<C::Scalar>] {
        &self.force_descriptors
    }

    pub fn ellipse_descriptors(&self) -> &[EllipseDescriptor<C::Scalar>] {
        &self.ellipse_descriptors
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use mass_properties::MassProperties;
    use multibody::{
        body::Body,
        joint::{floating::Floating, revolute::Revolute},
        Joint, MultiBodyBuilder,
    };
    use nalgebra::Point3;

    const TOL: f64 = 1e-12;

    /// floating torso with one revolute arm
    fn robot() -> MultiBody {
        let mut base = Joint::new("base", Floating).unwrap();
        base.connect_outer_body(BodyId(0)).unwrap();
        let mut shoulder = Joint::new("shoulder", Revolute::new(Vector3::y()).unwrap()).unwrap();
        shoulder
            .connect_inner_body(BodyId(0), Isometry3::translation(0.0, 0.2, 0.5))
            .unwrap();
        shoulder.connect_outer_body(BodyId(1)).unwrap();

        MultiBodyBuilder::new()
            .with_body(Body::new(BodyId(0), "torso", MassProperties::default()).unwrap())
            .unwrap()
            .with_body(Body::new(BodyId(1), "arm", MassProperties::default()).unwrap())
            .unwrap()
            .with_joint(base)
            .with_joint(shoulder)
            .build()
            .unwrap()
    }

    fn cache() -> KinematicCache {
        KinematicCache::new(robot(), Vector3::new(0.0, 0.0, -9.81)).unwrap()
    }

    fn configuration() -> DVector<f64> {
        DVector::from_vec(vec![1.0, 0.0, 0.0, 0.0, 0.1, 0.2, 0.3, 0.4])
    }

    #[test]
    fn test_set_parameters_is_idempotent() {
        let mut cache = cache();
        assert_eq!(cache.x_stamp(), 1);
        cache.set_parameters(&configuration()).unwrap();
        assert_eq!(cache.x_stamp(), 2);
        let poses = cache.fk().world_from_bodies().to_vec();

        cache.set_parameters(&configuration()).unwrap();
        assert_eq!(cache.x_stamp(), 2);
        assert_eq!(cache.fk().world_from_bodies(), poses.as_slice());
    }

    #[test]
    fn test_floating_quaternion_is_normalized() {
        let mut cache = cache();
        let mut x = configuration();
        x.rows_mut(0, 4).copy_from_slice(&[2.0, 0.0, 2.0, 0.0]);
        cache.set_parameters(&x).unwrap();
        assert_abs_diff_eq!(cache.parameters().rows(0, 4).norm(), 1.0, epsilon = TOL);
        assert_abs_diff_eq!(cache.q()[0][0], 0.5f64.sqrt(), epsilon = TOL);

        // the stored vector is already normalized, so writing it back changes nothing
        let stamp = cache.x_stamp();
        let stored = cache.parameters().clone();
        cache.set_parameters(&stored).unwrap();
        assert_eq!(cache.x_stamp(), stamp);
        assert_eq!(cache.parameters(), &stored);

        x.rows_mut(0, 4).fill(0.0);
        assert!(matches!(
            cache.set_parameters(&x),
            Err(PostureErrors::DegenerateQuaternion)
        ));
    }

    #[test]
    fn test_size_mismatch() {
        let mut cache = cache();
        assert!(matches!(
            cache.set_parameters(&DVector::zeros(3)),
            Err(PostureErrors::SizeMismatch { expected: 8, got: 3 })
        ));
    }

    #[test]
    fn test_inverse_dynamics_is_lazy() {
        let mut cache = cache();
        cache.set_parameters(&configuration()).unwrap();
        assert_eq!(cache.id_stamp(), 1);
        assert_eq!(cache.x_stamp(), 2);

        let torques = cache.inverse_dynamics().unwrap().torques().to_vec();
        assert_eq!(cache.id_stamp(), 2);
        // torso holds itself and the arm against gravity
        assert_abs_diff_eq!(torques[0][5], 2.0 * 9.81, epsilon = 1e-9);

        // reading again does not recompute
        cache.inverse_dynamics().unwrap();
        assert_eq!(cache.id_stamp(), 2);

        let mut x = configuration();
        x[7] = -0.4;
        cache.set_parameters(&x).unwrap();
        assert_eq!(cache.id_stamp(), 2);
        assert_eq!(cache.x_stamp(), 3);
    }

    #[test]
    fn test_force_descriptors_resize() {
        let mut cache = cache();
        cache.set_parameters(&configuration()).unwrap();
        let before = cache.pb_size();
        let stamp = cache.x_stamp();

        let feet = vec![
            ForceDescriptor::new(
                BodyId(1),
                vec![Isometry3::translation(0.0, 0.0, -0.5); 2],
                0.7,
            ),
            ForceDescriptor::new(BodyId(0), vec![Isometry3::identity()], 0.7),
        ];
        cache.set_force_descriptors(feet).unwrap();
        assert_eq!(cache.nr_force_points(), 3);
        assert_eq!(cache.pb_size(), before + 9);
        assert_eq!(cache.force_params_begin(), 8);
        assert_eq!(cache.ellipse_params_begin(), 17);
        assert_eq!(cache.x_stamp(), stamp + 1);
        assert!(cache.parameters().iter().all(|&v| v == 0.0));

        let unknown = vec![ForceDescriptor::new(BodyId(9), vec![Isometry3::identity()], 0.5)];
        assert!(matches!(
            cache.set_force_descriptors(unknown),
            Err(PostureErrors::UnknownBody(BodyId(9)))
        ));
    }

    #[test]
    fn test_body_forces_follow_parameters() {
        let mut cache = cache();
        let point = Isometry3::translation(0.0, 0.0, -0.5);
        cache
            .set_force_descriptors(vec![ForceDescriptor::new(BodyId(1), vec![point], 0.5)])
            .unwrap();

        let mut x = DVector::zeros(cache.pb_size());
        x.rows_mut(0, 8).copy_from(&configuration());
        x.rows_mut(8, 3).copy_from_slice(&[1.0, 0.0, 2.0]);
        cache.set_parameters(&x).unwrap();

        let arm = cache.multibody().body_index(BodyId(1)).unwrap();
        let f = cache.body_forces()[arm];
        assert_abs_diff_eq!(*f.force(), Vector3::new(1.0, 0.0, 2.0), epsilon = TOL);
        // lever of the point about the arm origin
        let lever = Vector3::new(0.0, 0.0, -0.5).cross(&Vector3::new(1.0, 0.0, 2.0));
        assert_abs_diff_eq!(*f.couple(), lever, epsilon = TOL);
        assert_abs_diff_eq!(
            *cache.force_descriptors()[0].forces[0].force(),
            Vector3::new(1.0, 0.0, 2.0),
            epsilon = TOL
        );
        let torso = cache.multibody().body_index(BodyId(0)).unwrap();
        assert_abs_diff_eq!(cache.body_forces()[torso].vector().norm(), 0.0, epsilon = TOL);
    }

    #[test]
    fn test_ellipses() {
        let mut cache = cache();
        cache
            .set_ellipse_descriptors(vec![EllipseDescriptor::new(BodyId(1))])
            .unwrap();
        assert_eq!(cache.pb_size(), 13);
        assert_eq!(cache.ellipse_params_begin(), 8);

        let mut x = DVector::zeros(13);
        x.rows_mut(0, 8).copy_from(&configuration());
        x.rows_mut(8, 5)
            .copy_from_slice(&[0.1, -0.2, 0.0, 0.3, 0.05]);
        cache.set_parameters(&x).unwrap();

        let ellipse = cache.ellipse_descriptors()[0];
        assert_eq!(ellipse.body_index(), 1);
        assert_eq!(format!("{}", ellipse), "Ellipse((0.1, -0.2), 0.6, 0.1, 0)");
    }

    #[test]
    fn test_arm_pose() {
        let mut cache = cache();
        cache.set_parameters(&configuration()).unwrap();
        let arm = cache.fk().world_from_body(1) * Point3::origin();
        assert_abs_diff_eq!(arm.coords, Vector3::new(0.1, 0.4, 0.8), epsilon = TOL);
    }

    #[cfg(feature = "autodiff")]
    #[test]
    fn test_tangent_matches_finite_difference() {
        // unit head, so normalization does not rescale the direction
        let mut x = configuration();
        x.rows_mut(0, 4).copy_from_slice(&[0.8, 0.0, 0.6, 0.0]);
        let direction = DVector::from_vec(vec![0.1, -0.2, 0.3, 0.0, 1.0, 0.5, -0.3, 0.7]);

        let mut dual = KinematicCache::with_construct(
            robot(),
            Vector3::zeros(),
            Tangent::new(direction.clone()),
        )
        .unwrap();
        dual.set_parameters(&x).unwrap();
        let arm = dual.fk().world_from_body(1) * Point3::new(0.3, 0.0, -0.2).map(Dual64::from);

        let h = 1e-6;
        let local = Point3::new(0.3, 0.0, -0.2);
        let mut plain = cache();
        plain.set_parameters(&x).unwrap();
        let center = plain.fk().world_from_body(1) * local;
        plain.set_parameters(&(&x + &direction * h)).unwrap();
        let plus = plain.fk().world_from_body(1) * local;
        plain.set_parameters(&(&x - &direction * h)).unwrap();
        let minus = plain.fk().world_from_body(1) * local;

        for k in 0..3 {
            assert_abs_diff_eq!(arm[k].re, center[k], epsilon = 1e-9);
            assert_abs_diff_eq!(arm[k].eps, (plus[k] - minus[k]) / (2.0 * h), epsilon = 1e-5);
        }
    }
}
