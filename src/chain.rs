//! Serial chain model and the forward kinematics evaluator.
//!
//! A chain is an ordered list of joints walked base to tip with an
//! accumulated transform `(p, R)`. Revolute joints rotate the accumulated
//! frame about their axis and advance the position along the local `+X`
//! link direction; prismatic joints slide the position along their axis
//! without touching the rotation. The base frame is the world frame.

use crate::engine_error::EngineError;
use crate::kinematic_traits::{Kinematics, Pose, MAX_DOF};
use crate::utils::all_finite;
use nalgebra::{Translation3, Unit, UnitQuaternion, Vector3};
use serde::{Deserialize, Serialize};

/// Joint kind. FK and the Jacobian switch on this tag; there is no open
/// polymorphism over joint types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JointKind {
    Revolute,
    Prismatic,
}

/// Single joint: kind, rotation/translation axis in the parent frame,
/// length of the link that follows it, and optional travel limits
/// (radians for revolute, meters for prismatic).
#[derive(Debug, Clone)]
pub struct Joint {
    pub kind: JointKind,
    pub axis: Unit<Vector3<f64>>,
    pub link_length: f64,
    pub limits: Option<(f64, f64)>,
}

impl Joint {
    /// Revolute joint about `axis` followed by a link of `link_length`.
    pub fn revolute(axis: Vector3<f64>, link_length: f64) -> Self {
        Joint {
            kind: JointKind::Revolute,
            axis: Unit::new_normalize(axis),
            link_length,
            limits: None,
        }
    }

    /// Prismatic joint sliding along `axis` with rest offset `link_length`.
    pub fn prismatic(axis: Vector3<f64>, link_length: f64) -> Self {
        Joint {
            kind: JointKind::Prismatic,
            axis: Unit::new_normalize(axis),
            link_length,
            limits: None,
        }
    }

    /// Attach travel limits, `(lo, hi)` with `lo <= hi`.
    pub fn with_limits(mut self, lo: f64, hi: f64) -> Self {
        self.limits = Some((lo, hi));
        self
    }

    /// Clamp a joint coordinate into the travel limits, if any.
    pub fn clamp(&self, value: f64) -> f64 {
        match self.limits {
            Some((lo, hi)) => value.clamp(lo, hi),
            None => value,
        }
    }
}

/// Per-joint frame snapshot produced while walking the chain: the world
/// position where the joint acts, its world-mapped axis, and the joint kind.
/// This is what the analytic Jacobian and the CCD sweep consume.
pub struct JointFrame {
    pub origin: Vector3<f64>,
    pub world_axis: Vector3<f64>,
    pub kind: JointKind,
}

/// Result of one forward kinematics evaluation.
pub struct FkSolution {
    pub pose: Pose,
    /// Base first, end effector last; `dof + 1` entries.
    pub joint_positions: Vec<Vector3<f64>>,
}

/// Ordered sequence of joints rooted at the world frame.
#[derive(Debug, Clone)]
pub struct SerialChain {
    joints: Vec<Joint>,
}

impl SerialChain {
    /// Build a chain from explicit joints. Rejects empty chains, chains
    /// above [`MAX_DOF`], degenerate axes and negative link lengths.
    pub fn new(joints: Vec<Joint>) -> Result<Self, EngineError> {
        if joints.is_empty() || joints.len() > MAX_DOF {
            return Err(EngineError::DofOutOfRange(joints.len()));
        }
        for joint in &joints {
            let axis = joint.axis.into_inner();
            if !all_finite(&[axis.x, axis.y, axis.z, joint.link_length]) {
                return Err(EngineError::NonFinite("joint axis or link length"));
            }
            if joint.link_length < 0.0 {
                return Err(EngineError::Validation(
                    "link length must be non-negative".into(),
                ));
            }
            if let Some((lo, hi)) = joint.limits {
                if !(lo.is_finite() && hi.is_finite()) || lo > hi {
                    return Err(EngineError::Validation("invalid joint limits".into()));
                }
            }
        }
        Ok(SerialChain { joints })
    }

    /// Implicit chain used when a request supplies only joint angles and
    /// link lengths: all joints revolute, axis `Z` for the first joint and
    /// `Y` thereafter, links along local `+X`. With all angles at zero the
    /// chain lies along the world `+X` axis.
    pub fn implicit(link_lengths: &[f64]) -> Result<Self, EngineError> {
        if !all_finite(link_lengths) {
            return Err(EngineError::NonFinite("link_lengths"));
        }
        let joints = link_lengths
            .iter()
            .enumerate()
            .map(|(i, &len)| {
                let axis = if i == 0 { Vector3::z() } else { Vector3::y() };
                Joint::revolute(axis, len)
            })
            .collect();
        SerialChain::new(joints)
    }

    /// Implicit chain of `dof` joints with a total reach of one meter,
    /// the default when an IK request names only a joint count.
    pub fn implicit_unit_reach(dof: usize) -> Result<Self, EngineError> {
        if dof == 0 || dof > MAX_DOF {
            return Err(EngineError::DofOutOfRange(dof));
        }
        let lengths = vec![1.0 / dof as f64; dof];
        SerialChain::implicit(&lengths)
    }

    pub fn joints(&self) -> &[Joint] {
        &self.joints
    }

    /// Validate a joint-coordinate vector against this chain.
    pub fn check_coordinates(&self, q: &[f64]) -> Result<(), EngineError> {
        if q.len() != self.joints.len() {
            return Err(EngineError::InvalidLength {
                expected: self.joints.len(),
                found: q.len(),
            });
        }
        if !all_finite(q) {
            return Err(EngineError::NonFinite("joint coordinates"));
        }
        Ok(())
    }

    /// Clamp every coordinate into its joint's travel limits.
    pub fn clamp_coordinates(&self, q: &mut [f64]) {
        for (joint, value) in self.joints.iter().zip(q.iter_mut()) {
            *value = joint.clamp(*value);
        }
    }

    /// Sum of all link lengths, the radius of the reachable sphere for a
    /// purely revolute chain.
    pub fn reach(&self) -> f64 {
        self.joints.iter().map(|j| j.link_length).sum()
    }

    /// Walk the chain, producing the end-effector pose and every
    /// intermediate joint position. `q.len()` must equal `dof()`.
    pub fn fk(&self, q: &[f64]) -> FkSolution {
        debug_assert_eq!(q.len(), self.joints.len());
        let mut p = Vector3::zeros();
        let mut r = UnitQuaternion::identity();
        let mut joint_positions = Vec::with_capacity(self.joints.len() + 1);
        joint_positions.push(p);

        for (joint, &qi) in self.joints.iter().zip(q.iter()) {
            match joint.kind {
                JointKind::Revolute => {
                    r = r * UnitQuaternion::from_axis_angle(&joint.axis, qi);
                    p += r * Vector3::new(joint.link_length, 0.0, 0.0);
                }
                JointKind::Prismatic => {
                    p += (r * joint.axis.into_inner()) * (joint.link_length + qi);
                }
            }
            joint_positions.push(p);
        }

        FkSolution {
            pose: Pose::from_parts(Translation3::from(p), r),
            joint_positions,
        }
    }

    /// Per-joint world origins and axes for the given coordinates, as
    /// needed by the analytic Jacobian and the CCD fallback. The origin of
    /// joint `i` is the accumulated position before its link is applied;
    /// its world axis is the joint axis mapped through the rotation
    /// accumulated before the joint acts.
    pub fn joint_frames(&self, q: &[f64]) -> Vec<JointFrame> {
        debug_assert_eq!(q.len(), self.joints.len());
        let mut p = Vector3::zeros();
        let mut r = UnitQuaternion::identity();
        let mut frames = Vec::with_capacity(self.joints.len());

        for (joint, &qi) in self.joints.iter().zip(q.iter()) {
            frames.push(JointFrame {
                origin: p,
                world_axis: r * joint.axis.into_inner(),
                kind: joint.kind,
            });
            match joint.kind {
                JointKind::Revolute => {
                    r = r * UnitQuaternion::from_axis_angle(&joint.axis, qi);
                    p += r * Vector3::new(joint.link_length, 0.0, 0.0);
                }
                JointKind::Prismatic => {
                    p += (r * joint.axis.into_inner()) * (joint.link_length + qi);
                }
            }
        }
        frames
    }
}

impl Kinematics for SerialChain {
    fn forward(&self, q: &[f64]) -> Pose {
        self.fk(q).pose
    }

    fn joint_positions(&self, q: &[f64]) -> Vec<Vector3<f64>> {
        self.fk(q).joint_positions
    }

    fn dof(&self) -> usize {
        self.joints.len()
    }
}
