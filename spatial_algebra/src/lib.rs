use mass_properties::MassProperties;
use nalgebra::{
    convert, Isometry3, Matrix3, Matrix6, Quaternion, RealField, Translation3, UnitQuaternion,
    Vector3, Vector6,
};
use std::ops::{Add, AddAssign, Mul, Neg, Sub};

/// Six component vector, rotational part first.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SpatialVector<T: RealField + Copy> {
    pub rotation: Vector3<T>,
    pub translation: Vector3<T>,
}

impl<T: RealField + Copy> SpatialVector<T> {
    pub fn new(rotation: Vector3<T>, translation: Vector3<T>) -> Self {
        Self {
            rotation,
            translation,
        }
    }

    pub fn zeros() -> Self {
        Self::new(Vector3::zeros(), Vector3::zeros())
    }

    pub fn vector(&self) -> Vector6<T> {
        let r = &self.rotation;
        let t = &self.translation;
        Vector6::new(r[0], r[1], r[2], t[0], t[1], t[2])
    }
}

impl<T: RealField + Copy> From<Vector6<T>> for SpatialVector<T> {
    fn from(v: Vector6<T>) -> SpatialVector<T> {
        let rotation = Vector3::new(v[0], v[1], v[2]);
        let translation = Vector3::new(v[3], v[4], v[5]);
        SpatialVector::new(rotation, translation)
    }
}

impl<T: RealField + Copy> Add<SpatialVector<T>> for SpatialVector<T> {
    type Output = Self;
    #[inline]
    fn add(self, rhs: Self) -> Self {
        Self::new(
            self.rotation + rhs.rotation,
            self.translation + rhs.translation,
        )
    }
}

impl<T: RealField + Copy> Sub<SpatialVector<T>> for SpatialVector<T> {
    type Output = Self;
    #[inline]
    fn sub(self, rhs: Self) -> Self {
        Self::new(
            self.rotation - rhs.rotation,
            self.translation - rhs.translation,
        )
    }
}

impl<T: RealField + Copy> Neg for SpatialVector<T> {
    type Output = Self;
    #[inline]
    fn neg(self) -> Self {
        Self::new(-self.rotation, -self.translation)
    }
}

/// Spatial motion (angular velocity, linear velocity of the frame origin)
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MotionVector<T: RealField + Copy>(pub SpatialVector<T>);

impl<T: RealField + Copy> MotionVector<T> {
    pub fn new(angular: Vector3<T>, linear: Vector3<T>) -> Self {
        Self(SpatialVector::new(angular, linear))
    }

    pub fn zeros() -> Self {
        Self(SpatialVector::zeros())
    }

    pub fn angular(&self) -> &Vector3<T> {
        &self.0.rotation
    }

    pub fn linear(&self) -> &Vector3<T> {
        &self.0.translation
    }

    pub fn vector(&self) -> Vector6<T> {
        self.0.vector()
    }
}

impl<T: RealField + Copy> Add<MotionVector<T>> for MotionVector<T> {
    type Output = MotionVector<T>;
    #[inline]
    fn add(self, rhs: MotionVector<T>) -> MotionVector<T> {
        MotionVector(self.0 + rhs.0)
    }
}

impl<T: RealField + Copy> Sub<MotionVector<T>> for MotionVector<T> {
    type Output = MotionVector<T>;
    #[inline]
    fn sub(self, rhs: MotionVector<T>) -> MotionVector<T> {
        MotionVector(self.0 - rhs.0)
    }
}

/// Spatial force (couple about the frame origin, linear force)
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ForceVector<T: RealField + Copy>(pub SpatialVector<T>);

impl<T: RealField + Copy> ForceVector<T> {
    pub fn new(couple: Vector3<T>, force: Vector3<T>) -> Self {
        Self(SpatialVector::new(couple, force))
    }

    pub fn zeros() -> Self {
        Self(SpatialVector::zeros())
    }

    pub fn couple(&self) -> &Vector3<T> {
        &self.0.rotation
    }

    pub fn force(&self) -> &Vector3<T> {
        &self.0.translation
    }

    pub fn vector(&self) -> Vector6<T> {
        self.0.vector()
    }
}

impl<T: RealField + Copy> Default for ForceVector<T> {
    fn default() -> Self {
        Self::zeros()
    }
}

impl<T: RealField + Copy> Add<ForceVector<T>> for ForceVector<T> {
    type Output = ForceVector<T>;
    #[inline]
    fn add(self, rhs: ForceVector<T>) -> ForceVector<T> {
        ForceVector(self.0 + rhs.0)
    }
}

impl<T: RealField + Copy> AddAssign<ForceVector<T>> for ForceVector<T> {
    #[inline]
    fn add_assign(&mut self, rhs: ForceVector<T>) {
        *self = *self + rhs;
    }
}

impl<T: RealField + Copy> Sub<ForceVector<T>> for ForceVector<T> {
    type Output = ForceVector<T>;
    #[inline]
    fn sub(self, rhs: ForceVector<T>) -> ForceVector<T> {
        ForceVector(self.0 - rhs.0)
    }
}

/// We use the terminology B_from_A rather than A_to_B so that notation matches matrix multiplication,
/// i.e. v_C = C_from_B * B_from_A * v_A.
/// The wrapped isometry maps points of frame A into frame B, so its translation is
/// the origin of A expressed in B.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SpatialTransform<T: RealField + Copy>(pub Isometry3<T>);

impl<T: RealField + Copy> SpatialTransform<T> {
    pub fn identity() -> Self {
        Self(Isometry3::identity())
    }

    #[inline]
    pub fn inv(&self) -> SpatialTransform<T> {
        SpatialTransform(self.0.inverse())
    }

    /// Applies the inverse transform to a force, i.e. B_from_A^T * f_B.
    /// Equivalent to `self.inv() * force` without building the inverse.
    pub fn inv_mul_force(&self, force: ForceVector<T>) -> ForceVector<T> {
        let rotation = self.0.rotation;
        let r = self.0.translation.vector;
        let couple = rotation.inverse_transform_vector(&(force.couple() - r.cross(force.force())));
        let linear = rotation.inverse_transform_vector(force.force());
        ForceVector::new(couple, linear)
    }
}

impl<T: RealField + Copy> From<Isometry3<T>> for SpatialTransform<T> {
    #[inline]
    fn from(value: Isometry3<T>) -> Self {
        Self(value)
    }
}

impl<T: RealField + Copy> Mul<MotionVector<T>> for SpatialTransform<T> {
    type Output = MotionVector<T>;
    fn mul(self, motion: MotionVector<T>) -> MotionVector<T> {
        let rotation = self.0.rotation;
        let r = self.0.translation.vector;
        let angular = rotation * motion.angular();
        let linear = rotation * motion.linear() + r.cross(&angular);
        MotionVector::new(angular, linear)
    }
}

impl<T: RealField + Copy> Mul<ForceVector<T>> for SpatialTransform<T> {
    type Output = ForceVector<T>;
    fn mul(self, force: ForceVector<T>) -> ForceVector<T> {
        let rotation = self.0.rotation;
        let r = self.0.translation.vector;
        let linear = rotation * force.force();
        let couple = rotation * force.couple() + r.cross(&linear);
        ForceVector::new(couple, linear)
    }
}

impl<T: RealField + Copy> Mul<SpatialTransform<T>> for SpatialTransform<T> {
    type Output = SpatialTransform<T>;
    #[inline]
    fn mul(self, rhs: SpatialTransform<T>) -> SpatialTransform<T> {
        SpatialTransform(self.0 * rhs.0)
    }
}

/// Rigid body inertia about the body frame origin
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SpatialInertia(pub MassProperties);

impl SpatialInertia {
    pub fn matrix(&self) -> Matrix6<f64> {
        let mp = self.0;
        let mass = mp.mass;
        let cx = mp.center_of_mass.vector().cross_matrix();
        let cxt = cx.transpose();

        let quad11 = mp.inertia.matrix() + cx * cxt * mass;
        let quad12 = cx * mass;
        let quad21 = cxt * mass;
        let quad22 = Matrix3::identity() * mass;

        let mut m = Matrix6::zeros();
        m.fixed_view_mut::<3, 3>(0, 0).copy_from(&quad11);
        m.fixed_view_mut::<3, 3>(0, 3).copy_from(&quad12);
        m.fixed_view_mut::<3, 3>(3, 0).copy_from(&quad21);
        m.fixed_view_mut::<3, 3>(3, 3).copy_from(&quad22);
        m
    }
}

impl From<MassProperties> for SpatialInertia {
    fn from(value: MassProperties) -> SpatialInertia {
        SpatialInertia(value)
    }
}

impl<T: RealField + Copy> Mul<MotionVector<T>> for SpatialInertia {
    type Output = ForceVector<T>;
    fn mul(self, motion: MotionVector<T>) -> ForceVector<T> {
        let m = self.matrix().map(|e| convert::<f64, T>(e));
        ForceVector(SpatialVector::from(m * motion.vector()))
    }
}

/// Lifts an f64 isometry into any real scalar field.
pub fn lift_isometry<T: RealField + Copy>(iso: &Isometry3<f64>) -> Isometry3<T> {
    let q = iso.rotation.quaternion();
    let rotation = UnitQuaternion::new_unchecked(Quaternion::new(
        convert(q.w),
        convert(q.i),
        convert(q.j),
        convert(q.k),
    ));
    Isometry3::from_parts(Translation3::from(lift_vector(&iso.translation.vector)), rotation)
}

/// Lifts an f64 vector into any real scalar field.
pub fn lift_vector<T: RealField + Copy>(v: &Vector3<f64>) -> Vector3<T> {
    v.map(|e| convert::<f64, T>(e))
}
