//! Built-in chain presets exposed through the catalog endpoint.
//!
//! The registry is initialized once at first use and never mutated, so
//! concurrent readers need no synchronization. See presets list in the
//! catalog for ids; limits on the human chains follow anatomical ranges.

use crate::chain::{Joint, JointKind, SerialChain};
use crate::engine_error::EngineError;
use nalgebra::Vector3;
use once_cell::sync::Lazy;
use serde::Serialize;

/// One catalog entry: identity, human-readable description and the joint
/// list the chain is built from.
pub struct ChainPreset {
    pub id: &'static str,
    pub name: &'static str,
    pub description: &'static str,
    pub joints: Vec<Joint>,
}

impl ChainPreset {
    pub fn dof(&self) -> usize {
        self.joints.len()
    }

    /// Short classification string: "revolute", "prismatic" or
    /// "revolute+prismatic" for mixed chains.
    pub fn joint_type_summary(&self) -> &'static str {
        let revolute = self.joints.iter().any(|j| j.kind == JointKind::Revolute);
        let prismatic = self.joints.iter().any(|j| j.kind == JointKind::Prismatic);
        match (revolute, prismatic) {
            (true, true) => "revolute+prismatic",
            (false, true) => "prismatic",
            _ => "revolute",
        }
    }

    /// Instantiate the preset as a solvable chain.
    pub fn chain(&self) -> SerialChain {
        SerialChain::new(self.joints.clone()).expect("preset chains are statically valid")
    }
}

/// Wire form of a catalog entry.
#[derive(Serialize)]
pub struct ChainInfo {
    pub id: String,
    pub name: String,
    pub description: String,
    pub dof: u32,
    pub joint_type: String,
}

impl From<&ChainPreset> for ChainInfo {
    fn from(preset: &ChainPreset) -> Self {
        ChainInfo {
            id: preset.id.into(),
            name: preset.name.into(),
            description: preset.description.into(),
            dof: preset.dof() as u32,
            joint_type: preset.joint_type_summary().into(),
        }
    }
}

fn deg(d: f64) -> f64 {
    d.to_radians()
}

/// The five built-in chains, in catalog declaration order.
pub static PRESETS: Lazy<Vec<ChainPreset>> = Lazy::new(|| {
    vec![
        ChainPreset {
            id: "human_arm",
            name: "Human Arm",
            description: "7-DOF human arm: shoulder(3) + elbow(1) + wrist(3)",
            joints: vec![
                // Shoulder flexion/extension, abduction/adduction, rotation
                Joint::revolute(Vector3::x(), 0.0).with_limits(deg(-60.0), deg(180.0)),
                Joint::revolute(Vector3::z(), 0.0).with_limits(deg(-50.0), deg(180.0)),
                Joint::revolute(-Vector3::y(), 0.30).with_limits(deg(-90.0), deg(90.0)),
                // Elbow flexion
                Joint::revolute(Vector3::x(), 0.28).with_limits(deg(0.0), deg(145.0)),
                // Wrist flexion/extension, deviation, pronation/supination
                Joint::revolute(Vector3::x(), 0.0).with_limits(deg(-80.0), deg(80.0)),
                Joint::revolute(Vector3::z(), 0.0).with_limits(deg(-20.0), deg(30.0)),
                Joint::revolute(-Vector3::y(), 0.20).with_limits(deg(-80.0), deg(80.0)),
            ],
        },
        ChainPreset {
            id: "human_leg",
            name: "Human Leg",
            description: "6-DOF human leg: hip(3) + knee(1) + ankle(2)",
            joints: vec![
                Joint::revolute(Vector3::x(), 0.0).with_limits(deg(-30.0), deg(120.0)),
                Joint::revolute(Vector3::z(), 0.0).with_limits(deg(-45.0), deg(45.0)),
                Joint::revolute(Vector3::y(), 0.45).with_limits(deg(-40.0), deg(40.0)),
                Joint::revolute(Vector3::x(), 0.42).with_limits(deg(0.0), deg(150.0)),
                Joint::revolute(Vector3::x(), 0.0).with_limits(deg(-50.0), deg(20.0)),
                Joint::revolute(Vector3::z(), 0.07).with_limits(deg(-35.0), deg(20.0)),
            ],
        },
        ChainPreset {
            id: "robotic_arm_6dof",
            name: "Robotic Arm (6-DOF)",
            description: "Standard industrial 6-DOF manipulator",
            joints: vec![
                Joint::revolute(Vector3::z(), 0.15),
                Joint::revolute(Vector3::y(), 0.30),
                Joint::revolute(Vector3::y(), 0.25),
                Joint::revolute(Vector3::x(), 0.10),
                Joint::revolute(Vector3::y(), 0.10),
                Joint::revolute(Vector3::x(), 0.08),
            ],
        },
        ChainPreset {
            id: "delta_robot",
            name: "Delta Robot",
            description: "3-DOF parallel kinematic delta robot for high-speed pick-and-place",
            joints: vec![
                Joint::prismatic(Vector3::x(), 0.0).with_limits(-0.4, 0.4),
                Joint::prismatic(Vector3::y(), 0.0).with_limits(-0.4, 0.4),
                Joint::prismatic(-Vector3::z(), 0.2).with_limits(-0.2, 0.35),
            ],
        },
        ChainPreset {
            id: "scara",
            name: "SCARA",
            description: "4-DOF selective compliance assembly robot arm",
            joints: vec![
                Joint::revolute(Vector3::z(), 0.25).with_limits(deg(-130.0), deg(130.0)),
                Joint::revolute(Vector3::z(), 0.20).with_limits(deg(-145.0), deg(145.0)),
                Joint::revolute(Vector3::z(), 0.05),
                Joint::prismatic(-Vector3::z(), 0.0).with_limits(0.0, 0.20),
            ],
        },
    ]
});

/// Look up a preset by id.
pub fn preset(id: &str) -> Option<&'static ChainPreset> {
    PRESETS.iter().find(|p| p.id == id)
}

/// Look up a preset by id, surfacing the capability error for the boundary.
pub fn preset_chain(id: &str) -> Result<SerialChain, EngineError> {
    preset(id)
        .map(|p| p.chain())
        .ok_or_else(|| EngineError::UnknownChain(id.to_string()))
}

/// Catalog in declaration order, as served by the chains endpoint.
pub fn catalog() -> Vec<ChainInfo> {
    PRESETS.iter().map(ChainInfo::from).collect()
}
