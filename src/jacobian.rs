//! Jacobians of the forward map.
//!
//! The analytic form is what the solver iterates on: for a revolute joint
//! the position column is `a × (p_tip − p_joint)` and the angular column is
//! the world axis `a`; for a prismatic joint the position column is the
//! world axis and the angular column is zero. The numerical form
//! differentiates any [`Kinematics`] implementor with central differences
//! and exists to cross-check the analytic one.

use crate::chain::{JointKind, SerialChain};
use crate::kinematic_traits::Kinematics;
use nalgebra::DMatrix;
use rayon::prelude::*;

/// 3×N position Jacobian at `q`, from the closed-form per-joint columns.
pub fn analytic_position(chain: &SerialChain, q: &[f64]) -> DMatrix<f64> {
    let frames = chain.joint_frames(q);
    let tip = chain.fk(q).pose.translation.vector;
    let n = frames.len();

    let mut jacobian = DMatrix::zeros(3, n);
    for (i, frame) in frames.iter().enumerate() {
        let column = match frame.kind {
            JointKind::Revolute => frame.world_axis.cross(&(tip - frame.origin)),
            JointKind::Prismatic => frame.world_axis,
        };
        jacobian.fixed_view_mut::<3, 1>(0, i).copy_from(&column);
    }
    jacobian
}

/// 6×N Jacobian at `q`: position rows 0..3, angular rows 3..6. Used when an
/// IK request carries an orientation target.
pub fn analytic_full(chain: &SerialChain, q: &[f64]) -> DMatrix<f64> {
    let frames = chain.joint_frames(q);
    let tip = chain.fk(q).pose.translation.vector;
    let n = frames.len();

    let mut jacobian = DMatrix::zeros(6, n);
    for (i, frame) in frames.iter().enumerate() {
        match frame.kind {
            JointKind::Revolute => {
                let linear = frame.world_axis.cross(&(tip - frame.origin));
                jacobian.fixed_view_mut::<3, 1>(0, i).copy_from(&linear);
                jacobian
                    .fixed_view_mut::<3, 1>(3, i)
                    .copy_from(&frame.world_axis);
            }
            JointKind::Prismatic => {
                jacobian
                    .fixed_view_mut::<3, 1>(0, i)
                    .copy_from(&frame.world_axis);
                // Angular rows stay zero: sliding does not rotate the tip
            }
        }
    }
    jacobian
}

/// 3×N position Jacobian by central differences with step `epsilon`,
/// computed column-per-joint in parallel. Generic over any forward map.
pub fn numerical_position<K>(model: &K, q: &[f64], epsilon: f64) -> DMatrix<f64>
where
    K: Kinematics + Sync,
{
    let n = model.dof();
    let columns: Vec<_> = (0..n)
        .into_par_iter()
        .map(|i| {
            let mut forward_q = q.to_vec();
            let mut backward_q = q.to_vec();
            forward_q[i] += epsilon;
            backward_q[i] -= epsilon;
            let forward = model.forward(&forward_q).translation.vector;
            let backward = model.forward(&backward_q).translation.vector;
            (forward - backward) / (2.0 * epsilon)
        })
        .collect();

    let mut jacobian = DMatrix::zeros(3, n);
    for (i, column) in columns.into_iter().enumerate() {
        jacobian.fixed_view_mut::<3, 1>(0, i).copy_from(&column);
    }
    jacobian
}
