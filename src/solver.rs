//! Iterative inverse kinematics.
//!
//! The primary loop is damped least-squares (Levenberg-Marquardt) over the
//! analytic Jacobian: solve `(JᵀJ + λ²I) Δq = Jᵀe`, accept the step when it
//! reduces the residual, and adapt the damping in both directions. When the
//! damping saturates and five consecutive iterations stall below 1%
//! improvement, the solver falls back to cyclic coordinate descent, which
//! updates one joint at a time in closed form and is robust near
//! ill-conditioned configurations. Non-convergence is a reportable outcome,
//! never an error: callers always receive the best coordinates found.

use crate::chain::{JointKind, SerialChain};
use crate::engine_error::EngineError;
use crate::jacobian;
use crate::kinematic_traits::{MAX_ITERATIONS_CEILING, MIN_TOLERANCE};
use crate::utils::wrap_angle;
use nalgebra::{DVector, UnitQuaternion, Vector3};
use std::time::Instant;

/// Iteration budget when the request leaves it unspecified.
pub const DEFAULT_MAX_ITERATIONS: u32 = 100;

/// Position tolerance in meters when the request leaves it unspecified.
pub const DEFAULT_TOLERANCE: f64 = 1e-6;

const LAMBDA_INITIAL: f64 = 0.01;
const LAMBDA_MIN: f64 = 1e-6;
const LAMBDA_MAX: f64 = 1.0;
const LAMBDA_GROWTH: f64 = 10.0;
const LAMBDA_DECAY: f64 = 0.5;

/// Consecutive sub-1% iterations before the CCD fallback kicks in.
const STALL_WINDOW: u32 = 5;
const STALL_IMPROVEMENT: f64 = 0.01;

/// Small bend applied to revolute joints in the start configuration so a
/// fully collinear chain does not begin at a rank-deficient Jacobian.
const SEED_BEND: f64 = 1e-3;

/// Target of a solve: a position, optionally an orientation. With an
/// orientation present the residual is 6-D and convergence requires both
/// parts within tolerance; without it, position alone decides.
pub struct IkTarget {
    pub position: Vector3<f64>,
    pub orientation: Option<UnitQuaternion<f64>>,
}

/// Termination controls for one solve.
pub struct SolveOptions {
    pub max_iterations: u32,
    pub tolerance: f64,
    /// Cooperative wall-clock cap, checked once per iteration.
    pub deadline: Option<Instant>,
}

impl Default for SolveOptions {
    fn default() -> Self {
        SolveOptions {
            max_iterations: DEFAULT_MAX_ITERATIONS,
            tolerance: DEFAULT_TOLERANCE,
            deadline: None,
        }
    }
}

impl SolveOptions {
    /// Reject budgets outside the engine ceilings. Called at decode time so
    /// oversized requests never reach the numeric loop.
    pub fn validate(&self) -> Result<(), EngineError> {
        if self.max_iterations > MAX_ITERATIONS_CEILING {
            return Err(EngineError::ResourceLimit {
                what: "max_iterations",
                limit: MAX_ITERATIONS_CEILING as usize,
                found: self.max_iterations as usize,
            });
        }
        if !self.tolerance.is_finite() || self.tolerance < MIN_TOLERANCE {
            return Err(EngineError::Validation(format!(
                "tolerance must be finite and >= {:e}",
                MIN_TOLERANCE
            )));
        }
        Ok(())
    }
}

/// Outcome of one solve. `joint_values` are the raw (unwrapped) coordinates
/// of the best configuration found, by minimum residual.
pub struct IkSolution {
    pub joint_values: Vec<f64>,
    pub iterations: u32,
    pub converged: bool,
    /// Cartesian distance between the end effector and the target position.
    pub error_distance: f64,
}

/// Solve `target` on `chain`. Infallible by design: validation happens at
/// the boundary, and every numerical dead end degrades to best-so-far with
/// `converged = false`.
pub fn solve(chain: &SerialChain, target: &IkTarget, options: &SolveOptions) -> IkSolution {
    let n = chain.joints().len();

    let mut q = seed(chain);
    let (mut residual, mut position_error) = residual(chain, &q, target);
    let mut residual_norm = residual.norm();

    let mut best_q = q.clone();
    let mut best_norm = residual_norm;
    let mut best_position_error = position_error;

    let mut lambda = LAMBDA_INITIAL;
    let mut stall = 0u32;
    let mut ccd_mode = false;
    let mut iterations = 0u32;

    loop {
        if residual_norm <= options.tolerance {
            return IkSolution {
                joint_values: q,
                iterations,
                converged: true,
                error_distance: position_error,
            };
        }
        if iterations >= options.max_iterations {
            break;
        }
        if let Some(deadline) = options.deadline {
            if Instant::now() >= deadline {
                tracing::debug!(iterations, "ik solve deadline exceeded");
                break;
            }
        }
        iterations += 1;

        if ccd_mode {
            ccd_sweep(chain, &mut q, &target.position);
            let (next_residual, next_position_error) = self::residual(chain, &q, target);
            residual = next_residual;
            position_error = next_position_error;
            residual_norm = residual.norm();
        } else {
            let jac = match target.orientation {
                Some(_) => jacobian::analytic_full(chain, &q),
                None => jacobian::analytic_position(chain, &q),
            };
            let jt = jac.transpose();
            let mut normal = &jt * &jac;
            for i in 0..n {
                normal[(i, i)] += lambda * lambda;
            }
            let rhs = &jt * &residual;

            let step = normal
                .clone()
                .cholesky()
                .map(|factorization| factorization.solve(&rhs))
                .or_else(|| normal.lu().solve(&rhs));

            match step {
                None => {
                    // Singular even with damping: bump lambda and retry
                    lambda = (lambda * LAMBDA_GROWTH).min(LAMBDA_MAX);
                    stall += 1;
                }
                Some(delta) => {
                    let mut candidate = q.clone();
                    for (value, d) in candidate.iter_mut().zip(delta.iter()) {
                        *value += d;
                    }
                    chain.clamp_coordinates(&mut candidate);

                    let (candidate_residual, candidate_position_error) =
                        self::residual(chain, &candidate, target);
                    let candidate_norm = candidate_residual.norm();

                    if candidate_norm < residual_norm {
                        let improvement = (residual_norm - candidate_norm) / residual_norm;
                        q = candidate;
                        residual = candidate_residual;
                        position_error = candidate_position_error;
                        residual_norm = candidate_norm;
                        lambda = (lambda * LAMBDA_DECAY).max(LAMBDA_MIN);
                        if improvement < STALL_IMPROVEMENT {
                            stall += 1;
                        } else {
                            stall = 0;
                        }
                    } else {
                        lambda = (lambda * LAMBDA_GROWTH).min(LAMBDA_MAX);
                        stall += 1;
                    }
                }
            }

            if stall >= STALL_WINDOW && lambda >= LAMBDA_MAX {
                tracing::debug!(iterations, "damped least-squares stalled, switching to ccd");
                ccd_mode = true;
                stall = 0;
            }
        }

        if residual_norm < best_norm {
            best_norm = residual_norm;
            best_position_error = position_error;
            best_q.clone_from(&q);
        }
    }

    IkSolution {
        joint_values: best_q,
        iterations,
        converged: best_norm <= options.tolerance,
        error_distance: best_position_error,
    }
}

/// Joint values prepared for reporting: revolute angles wrapped into
/// `(-PI, PI]`, prismatic displacements untouched.
pub fn report_values(chain: &SerialChain, q: &[f64]) -> Vec<f64> {
    chain
        .joints()
        .iter()
        .zip(q.iter())
        .map(|(joint, &value)| match joint.kind {
            JointKind::Revolute => wrap_angle(value),
            JointKind::Prismatic => value,
        })
        .collect()
}

fn seed(chain: &SerialChain) -> Vec<f64> {
    let mut q: Vec<f64> = chain
        .joints()
        .iter()
        .map(|joint| match joint.kind {
            JointKind::Revolute => SEED_BEND,
            JointKind::Prismatic => 0.0,
        })
        .collect();
    chain.clamp_coordinates(&mut q);
    q
}

/// Residual vector (3-D or 6-D) and the plain Cartesian position error.
/// The angular part uses the small-angle form `2 · vec(q_target · q⁻¹)`.
fn residual(chain: &SerialChain, q: &[f64], target: &IkTarget) -> (DVector<f64>, f64) {
    let pose = chain.fk(q).pose;
    let position_error_vec = target.position - pose.translation.vector;
    let position_error = position_error_vec.norm();

    match target.orientation {
        None => (
            DVector::from_column_slice(position_error_vec.as_slice()),
            position_error,
        ),
        Some(target_orientation) => {
            let mut error_quat = (target_orientation * pose.rotation.inverse()).into_inner();
            if error_quat.w < 0.0 {
                error_quat = -error_quat;
            }
            let mut full = DVector::zeros(6);
            full[0] = position_error_vec.x;
            full[1] = position_error_vec.y;
            full[2] = position_error_vec.z;
            full[3] = 2.0 * error_quat.i;
            full[4] = 2.0 * error_quat.j;
            full[5] = 2.0 * error_quat.k;
            (full, position_error)
        }
    }
}

/// One cyclic-coordinate-descent sweep, tip to base. For a revolute joint
/// the optimal rotation about the fixed axis has the closed form
/// `atan2(a · (u × v), u · v)` with `u`, `v` the tip/target offsets
/// projected off the axis; for a prismatic joint it is the axis projection
/// of the remaining error.
fn ccd_sweep(chain: &SerialChain, q: &mut [f64], target: &Vector3<f64>) {
    for i in (0..chain.joints().len()).rev() {
        let frames = chain.joint_frames(q);
        let tip = chain.fk(q).pose.translation.vector;
        let frame = &frames[i];

        match frame.kind {
            JointKind::Revolute => {
                let axis = frame.world_axis;
                let to_tip = tip - frame.origin;
                let to_target = target - frame.origin;
                let u = to_tip - axis * axis.dot(&to_tip);
                let v = to_target - axis * axis.dot(&to_target);
                if u.norm() < 1e-12 || v.norm() < 1e-12 {
                    continue;
                }
                let angle = axis.dot(&u.cross(&v)).atan2(u.dot(&v));
                q[i] = chain.joints()[i].clamp(q[i] + angle);
            }
            JointKind::Prismatic => {
                let slide = frame.world_axis.dot(&(target - tip));
                q[i] = chain.joints()[i].clamp(q[i] + slide);
            }
        }
    }
}
