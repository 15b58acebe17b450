//! Defines the shared kinematic types and the trait connecting chain models
//! to generic consumers (numerical Jacobians, solvers, tests).

use nalgebra::{Isometry3, Vector3};

/// Pose of the end effector. Contains both the Cartesian position and the
/// rotation quaternion.
/// ```
/// extern crate nalgebra as na;
/// use na::{Isometry3, Translation3, UnitQuaternion};
///
/// type Pose = Isometry3<f64>;
///
/// let translation = Translation3::new(1.0, 0.0, 0.0);
/// // The quaternion should be normalized to represent a valid rotation.
/// let rotation = UnitQuaternion::from_quaternion(
///     na::Quaternion::new(1.0, 0.0, 0.0, 1.0).normalize());
/// let pose = Pose::from_parts(translation, rotation);
/// ```
pub type Pose = Isometry3<f64>;

/// Joint coordinates of a chain, one scalar per degree of freedom:
/// an angle in radians for revolute joints, a displacement in meters for
/// prismatic joints. Variable length as chains are built per request.
pub type JointValues = Vec<f64>;

/// Highest degree-of-freedom count a chain may declare. Requests above this
/// are rejected at decode time.
pub const MAX_DOF: usize = 64;

/// Hard ceiling on the iteration budget a caller may request from the
/// iterative solver.
pub const MAX_ITERATIONS_CEILING: u32 = 10_000;

/// Smallest tolerance the solver accepts; below this the position error is
/// dominated by floating point noise of the forward map.
pub const MIN_TOLERANCE: f64 = 1e-12;

/// Largest motion sample window the intent compressor accepts.
pub const MAX_SAMPLES: usize = 1_000_000;

/// Largest waypoint list the trajectory optimizer accepts.
pub const MAX_WAYPOINTS: usize = 100_000;

/// Agreed functionality of forward kinematics over a joint-coordinate
/// vector. Implemented by chain models; consumed generically by the
/// numerical Jacobian and by tests that cross-check analytic derivatives.
pub trait Kinematics {
    /// Compute the end-effector pose for the given joint coordinates.
    /// The slice length must equal [`Kinematics::dof`].
    fn forward(&self, q: &[f64]) -> Pose;

    /// World-space positions after each joint, base first. The returned
    /// vector has `dof() + 1` entries; the last one is the end effector.
    fn joint_positions(&self, q: &[f64]) -> Vec<Vector3<f64>>;

    /// Number of joint coordinates this model expects.
    fn dof(&self) -> usize;
}
