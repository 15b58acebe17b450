//! Helper functions

use nalgebra::Vector3;
use std::f64::consts::PI;

/// Checks if all elements of the slice are finite.
pub fn all_finite(values: &[f64]) -> bool {
    values.iter().all(|v| v.is_finite())
}

/// Checks a wire-format 3-vector for validity.
pub fn finite_vec3(v: &[f64; 3]) -> bool {
    v.iter().all(|c| c.is_finite())
}

/// Converts a wire-format 3-vector to nalgebra.
pub fn vec3(v: &[f64; 3]) -> Vector3<f64> {
    Vector3::new(v[0], v[1], v[2])
}

/// Converts a nalgebra vector to the wire format.
pub fn to_array(v: &Vector3<f64>) -> [f64; 3] {
    [v.x, v.y, v.z]
}

/// Wraps an angle into `(-PI, PI]`. Used only when reporting revolute joint
/// angles; the solver itself works on the unwrapped values.
pub fn wrap_angle(angle: f64) -> f64 {
    let two_pi = 2.0 * PI;
    let mut a = angle % two_pi;
    if a <= -PI {
        a += two_pi;
    } else if a > PI {
        a -= two_pi;
    }
    a
}

/// Format joint values for diagnostics, radians as degrees.
#[allow(dead_code)]
pub fn dump_joints(joints: &[f64]) -> String {
    let mut row_str = String::new();
    for q in joints {
        row_str.push_str(&format!("{:5.2} ", q.to_degrees()));
    }
    format!("[{}]", row_str.trim_end())
}
