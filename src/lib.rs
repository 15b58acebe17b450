//! Stateless cloud kinematics engine.
//!
//! Solves robotics motion problems over a small HTTP surface: forward and
//! inverse kinematics on parameterized serial chains, compression of dense
//! motion sample streams into fixed 8-byte intent records, and time
//! parameterization of waypoint polylines under a velocity ceiling.
//!
//! The numerical core is synchronous and request-scoped; the only shared
//! state is the immutable chain preset registry and a set of atomic
//! counters. Typical solves complete in tens to low hundreds of
//! microseconds for 3-7 degree-of-freedom chains.
//!
//! # Components
//!
//! - [`chain`]: joint/chain model and the forward kinematics evaluator
//! - [`presets`]: the built-in chain catalog
//! - [`jacobian`]: analytic and numerical Jacobians of the forward map
//! - [`solver`]: damped least-squares inverse kinematics with CCD fallback
//! - [`intent`]: motion intent classification and the 8-byte wire codec
//! - [`trajectory`]: trapezoidal waypoint time parameterization
//! - [`server`]: the axum dispatcher binding everything to HTTP

pub mod kinematic_traits;

pub mod chain;
pub mod presets;

pub mod jacobian;
pub mod solver;

pub mod intent;
pub mod trajectory;

pub mod engine_error;
pub mod stats;

pub mod server;

pub mod utils;
