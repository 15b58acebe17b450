//! Motion intent compression.
//!
//! A dense motion sample window is summarized into a class, a direction and
//! a magnitude, and packed into a fixed 8-byte record:
//!
//! - byte 0: class tag (0=idle, 1=grasp, 2=release, 3=traverse, 4=reach)
//! - bytes 1-3: direction as signed 8-bit fixed-point, scale 127
//! - bytes 4-7: magnitude as little-endian IEEE-754 f32, meters
//!
//! Decoding is the exact inverse; direction components round-trip within
//! ±1/127. The compression ratio is measured against 32 bytes per raw
//! sample (8-byte timestamp + 24-byte position), i.e. `ratio = 4·n`.

use crate::engine_error::EngineError;
use crate::kinematic_traits::MAX_SAMPLES;
use crate::utils::{finite_vec3, vec3};
use nalgebra::Vector3;
use serde::Deserialize;

/// Serialized size of one intent record.
pub const INTENT_PACKET_SIZE: usize = 8;

/// Reference wire size of one raw motion sample, for the compression ratio.
pub const SAMPLE_WIRE_BYTES: usize = 32;

/// Fixed-point scale of the packed direction components.
const DIRECTION_SCALE: f64 = 127.0;

/// One sample of a motion stream. Velocity is optional; when any sample
/// lacks it, speeds are finite-differenced from positions instead.
#[derive(Debug, Clone, Deserialize)]
pub struct MotionSample {
    pub timestamp_ms: u64,
    pub position: [f64; 3],
    pub velocity: Option<[f64; 3]>,
}

/// The five intent classes, in wire-tag order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum IntentClass {
    Idle = 0,
    Grasp = 1,
    Release = 2,
    Traverse = 3,
    Reach = 4,
}

impl IntentClass {
    pub fn as_str(&self) -> &'static str {
        match self {
            IntentClass::Idle => "idle",
            IntentClass::Grasp => "grasp",
            IntentClass::Release => "release",
            IntentClass::Traverse => "traverse",
            IntentClass::Reach => "reach",
        }
    }

    pub fn from_tag(tag: u8) -> Result<Self, EngineError> {
        match tag {
            0 => Ok(IntentClass::Idle),
            1 => Ok(IntentClass::Grasp),
            2 => Ok(IntentClass::Release),
            3 => Ok(IntentClass::Traverse),
            4 => Ok(IntentClass::Reach),
            other => Err(EngineError::Validation(format!(
                "invalid intent class tag {}",
                other
            ))),
        }
    }
}

/// Classified summary of a motion window.
#[derive(Debug, Clone, PartialEq)]
pub struct IntentSummary {
    pub class: IntentClass,
    /// Unit vector of the net displacement, or zero when the window barely
    /// moved.
    pub direction: Vector3<f64>,
    /// Net displacement in meters.
    pub magnitude: f64,
}

/// Statistics computed over the window before classification.
#[derive(Debug, Clone)]
pub struct WindowStats {
    /// Net displacement, last position minus first.
    pub displacement: Vector3<f64>,
    /// Sum of inter-sample distances.
    pub path_length: f64,
    pub mean_speed: f64,
    pub speed_stddev: f64,
    pub peak_speed: f64,
    pub terminal_speed: f64,
}

impl WindowStats {
    /// Compute window statistics. Speeds come from the supplied velocities
    /// when every sample carries one, otherwise from finite-differenced
    /// positions over the timestamp deltas (with `1/sample_rate_hz` standing
    /// in for a zero delta).
    pub fn compute(samples: &[MotionSample], sample_rate_hz: f64) -> Self {
        let first = vec3(&samples[0].position);
        let last = vec3(&samples[samples.len() - 1].position);

        let mut path_length = 0.0;
        for pair in samples.windows(2) {
            path_length += (vec3(&pair[1].position) - vec3(&pair[0].position)).norm();
        }

        let speeds = sample_speeds(samples, sample_rate_hz);
        let mean_speed = if speeds.is_empty() {
            0.0
        } else {
            speeds.iter().sum::<f64>() / speeds.len() as f64
        };
        let speed_stddev = if speeds.len() < 2 {
            0.0
        } else {
            let variance = speeds
                .iter()
                .map(|s| (s - mean_speed) * (s - mean_speed))
                .sum::<f64>()
                / speeds.len() as f64;
            variance.sqrt()
        };
        let peak_speed = speeds.iter().fold(0.0f64, |a, &b| a.max(b));
        let terminal_speed = speeds.last().copied().unwrap_or(0.0);

        WindowStats {
            displacement: last - first,
            path_length,
            mean_speed,
            speed_stddev,
            peak_speed,
            terminal_speed,
        }
    }
}

fn sample_speeds(samples: &[MotionSample], sample_rate_hz: f64) -> Vec<f64> {
    let supplied: Option<Vec<f64>> = samples
        .iter()
        .map(|s| s.velocity.map(|v| vec3(&v).norm()))
        .collect();
    if let Some(speeds) = supplied {
        return speeds;
    }
    let fallback_dt = 1.0 / sample_rate_hz;
    samples
        .windows(2)
        .map(|pair| {
            let dt_ms = pair[1].timestamp_ms.saturating_sub(pair[0].timestamp_ms);
            let dt = if dt_ms == 0 {
                fallback_dt
            } else {
                dt_ms as f64 / 1000.0
            };
            (vec3(&pair[1].position) - vec3(&pair[0].position)).norm() / dt
        })
        .collect()
}

/// Validate a sample window against the decode-time rules.
pub fn validate_window(samples: &[MotionSample], sample_rate_hz: f64) -> Result<(), EngineError> {
    if samples.is_empty() {
        return Err(EngineError::Validation("samples must not be empty".into()));
    }
    if samples.len() > MAX_SAMPLES {
        return Err(EngineError::ResourceLimit {
            what: "samples",
            limit: MAX_SAMPLES,
            found: samples.len(),
        });
    }
    if !(sample_rate_hz.is_finite() && sample_rate_hz > 0.0) {
        return Err(EngineError::Validation(
            "sample_rate_hz must be positive".into(),
        ));
    }
    let mut previous = 0u64;
    for sample in samples {
        if !finite_vec3(&sample.position) {
            return Err(EngineError::NonFinite("sample position"));
        }
        if let Some(velocity) = &sample.velocity {
            if !finite_vec3(velocity) {
                return Err(EngineError::NonFinite("sample velocity"));
            }
        }
        if sample.timestamp_ms < previous {
            return Err(EngineError::Validation(
                "sample timestamps must be non-decreasing".into(),
            ));
        }
        previous = sample.timestamp_ms;
    }
    Ok(())
}

/// Classify a validated window. The decision table is evaluated top-down;
/// the first matching row wins.
pub fn classify(samples: &[MotionSample], sample_rate_hz: f64) -> IntentSummary {
    let stats = WindowStats::compute(samples, sample_rate_hz);
    let magnitude = stats.displacement.norm();
    let direction = if magnitude < 1e-9 {
        Vector3::zeros()
    } else {
        stats.displacement / magnitude
    };

    let straightness = if stats.path_length > 1e-12 {
        magnitude / stats.path_length
    } else {
        0.0
    };
    let terminal_slow = stats.terminal_speed < 0.1 * stats.peak_speed;

    let class = if stats.mean_speed < 0.01 && stats.path_length < 0.005 {
        IntentClass::Idle
    } else if straightness < 0.3 && terminal_slow {
        IntentClass::Grasp
    } else if straightness < 0.3 {
        IntentClass::Release
    } else if straightness >= 0.7 {
        IntentClass::Reach
    } else {
        IntentClass::Traverse
    };

    IntentSummary {
        class,
        direction,
        magnitude,
    }
}

/// Compression ratio of the documented formula: 32 bytes per raw sample
/// against the fixed 8-byte record.
pub fn compression_ratio(sample_count: usize) -> f64 {
    (sample_count * SAMPLE_WIRE_BYTES) as f64 / INTENT_PACKET_SIZE as f64
}

/// Pack a summary into the 8-byte wire record.
pub fn encode(summary: &IntentSummary) -> [u8; INTENT_PACKET_SIZE] {
    let mut packet = [0u8; INTENT_PACKET_SIZE];
    packet[0] = summary.class as u8;
    packet[1] = pack_component(summary.direction.x);
    packet[2] = pack_component(summary.direction.y);
    packet[3] = pack_component(summary.direction.z);
    packet[4..8].copy_from_slice(&(summary.magnitude as f32).to_le_bytes());
    packet
}

/// Unpack an 8-byte wire record. Exact inverse of [`encode`] up to the
/// documented quantization.
pub fn decode(packet: &[u8; INTENT_PACKET_SIZE]) -> Result<IntentSummary, EngineError> {
    let class = IntentClass::from_tag(packet[0])?;
    let direction = Vector3::new(
        unpack_component(packet[1]),
        unpack_component(packet[2]),
        unpack_component(packet[3]),
    );
    let magnitude = f32::from_le_bytes([packet[4], packet[5], packet[6], packet[7]]) as f64;
    if !magnitude.is_finite() || magnitude < 0.0 {
        return Err(EngineError::Validation("invalid intent magnitude".into()));
    }
    Ok(IntentSummary {
        class,
        direction,
        magnitude,
    })
}

fn pack_component(v: f64) -> u8 {
    let scaled = (v * DIRECTION_SCALE).round();
    scaled.clamp(-DIRECTION_SCALE, DIRECTION_SCALE) as i8 as u8
}

fn unpack_component(byte: u8) -> f64 {
    (byte as i8) as f64 / DIRECTION_SCALE
}
