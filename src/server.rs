//! HTTP dispatcher binding the solvers to the public JSON contract.
//!
//! Authentication and TLS live in the outer gateway; this layer only
//! decodes, validates, dispatches and counts. Every handler records into
//! the shared stats regardless of outcome, and every validation failure
//! surfaces as 400 with an `{"error": ...}` body.

use crate::chain::{Joint, JointKind, SerialChain};
use crate::engine_error::EngineError;
use crate::intent::{self, MotionSample, INTENT_PACKET_SIZE};
use crate::kinematic_traits::Pose;
use crate::presets;
use crate::solver::{self, IkTarget, SolveOptions};
use crate::stats::{EngineStats, Route};
use crate::trajectory::{self, TimedWaypoint, DEFAULT_MAX_ACCELERATION, DEFAULT_MAX_VELOCITY};
use crate::utils::{finite_vec3, to_array, vec3};
use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use axum::routing::{get, post};
use axum::Router;
use nalgebra::{Quaternion, UnitQuaternion};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use uuid::Uuid;

/// Process-lifetime state shared by all workers.
pub struct AppState {
    pub start_time: Instant,
    pub stats: EngineStats,
    pub solve_timeout: Duration,
}

impl AppState {
    pub fn new(solve_timeout: Duration) -> Self {
        AppState {
            start_time: Instant::now(),
            stats: EngineStats::new(),
            solve_timeout,
        }
    }
}

pub type SharedState = Arc<AppState>;

/// Server configuration drawn from the environment.
pub struct ServerConfig {
    pub addr: String,
    pub solve_timeout: Duration,
}

impl ServerConfig {
    /// `KINEMATICS_ADDR` (default `0.0.0.0:8081`) and
    /// `KINEMATICS_SOLVE_TIMEOUT_MS` (default 5000).
    pub fn from_env() -> Self {
        let addr = std::env::var("KINEMATICS_ADDR").unwrap_or_else(|_| "0.0.0.0:8081".into());
        let timeout_ms = std::env::var("KINEMATICS_SOLVE_TIMEOUT_MS")
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
            .unwrap_or(5_000);
        ServerConfig {
            addr,
            solve_timeout: Duration::from_millis(timeout_ms),
        }
    }
}

impl IntoResponse for EngineError {
    fn into_response(self) -> Response {
        let status = if self.is_internal() {
            tracing::error!(error = %self, "request failed");
            StatusCode::INTERNAL_SERVER_ERROR
        } else {
            StatusCode::BAD_REQUEST
        };
        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}

// ── Wire types ──────────────────────────────────────────────────────────

/// Wire description of one joint in an explicit chain.
#[derive(Deserialize)]
pub struct JointSpec {
    #[serde(rename = "type")]
    pub kind: JointKind,
    pub axis: [f64; 3],
    pub link_length: f64,
    pub limits: Option<[f64; 2]>,
}

#[derive(Deserialize)]
pub struct IkConstraints {
    pub max_iterations: Option<u32>,
    pub tolerance: Option<f64>,
}

#[derive(Deserialize)]
pub struct IkRequest {
    pub chain_id: Option<String>,
    pub chain: Option<Vec<JointSpec>>,
    pub target_position: [f64; 3],
    pub target_orientation: Option<[f64; 4]>,
    pub joint_count: Option<u32>,
    pub constraints: Option<IkConstraints>,
}

#[derive(Serialize)]
pub struct IkResponse {
    pub solution_id: String,
    pub joint_angles: Vec<f64>,
    pub iterations: u32,
    pub converged: bool,
    pub error_distance: f64,
    pub elapsed_us: u128,
}

#[derive(Deserialize)]
pub struct FkRequest {
    pub chain_id: Option<String>,
    pub chain: Option<Vec<JointSpec>>,
    pub joint_angles: Vec<f64>,
    pub link_lengths: Option<Vec<f64>>,
}

#[derive(Serialize)]
pub struct FkResponse {
    pub end_effector_position: [f64; 3],
    pub end_effector_orientation: [f64; 4],
    pub joint_positions: Vec<[f64; 3]>,
    pub elapsed_us: u128,
}

#[derive(Deserialize)]
pub struct IntentRequest {
    pub samples: Vec<MotionSample>,
    pub sample_rate_hz: Option<f64>,
}

#[derive(Serialize)]
pub struct IntentResponse {
    pub intent_id: String,
    pub intent_type: String,
    pub direction: [f64; 3],
    pub magnitude: f64,
    pub compressed_bytes: u64,
    pub original_samples: usize,
    pub compression_ratio: f64,
    pub elapsed_us: u128,
}

#[derive(Deserialize)]
pub struct TrajectoryRequest {
    pub waypoints: Vec<Vec<f64>>,
    pub max_velocity: Option<f64>,
    pub max_acceleration: Option<f64>,
}

#[derive(Serialize)]
pub struct TrajectoryResponse {
    pub trajectory_id: String,
    pub optimized_waypoints: Vec<TimedWaypoint>,
    pub segment_times: Vec<f64>,
    pub total_distance: f64,
    pub total_time: f64,
    pub max_velocity_reached: f64,
    pub elapsed_us: u128,
}

#[derive(Serialize)]
struct Health {
    status: String,
    version: String,
    uptime_secs: u64,
    total_solves: u64,
}

// ── Router ──────────────────────────────────────────────────────────────

/// Assemble the engine router over shared state.
pub fn router(state: SharedState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);
    Router::new()
        .route("/health", get(health))
        .route("/api/v1/kinematics/solve-ik", post(solve_ik))
        .route("/api/v1/kinematics/solve-fk", post(solve_fk))
        .route("/api/v1/kinematics/compress-intent", post(compress_intent))
        .route(
            "/api/v1/kinematics/optimize-trajectory",
            post(optimize_trajectory),
        )
        .route("/api/v1/kinematics/chains", get(chains))
        .route("/api/v1/kinematics/stats", get(stats))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

// ── Handlers ────────────────────────────────────────────────────────────

async fn health(State(state): State<SharedState>) -> Json<Health> {
    Json(Health {
        status: "ok".into(),
        version: env!("CARGO_PKG_VERSION").into(),
        uptime_secs: state.start_time.elapsed().as_secs(),
        total_solves: state.stats.total_solves(),
    })
}

async fn solve_ik(
    State(state): State<SharedState>,
    payload: Result<Json<IkRequest>, JsonRejection>,
) -> Response {
    let started = Instant::now();
    let result = decoded(payload).and_then(|req| handle_solve_ik(&state, req));
    let elapsed = started.elapsed().as_micros();
    state.stats.record(Route::SolveIk, Some(elapsed as u64));
    match result {
        Ok(mut response) => {
            response.elapsed_us = elapsed;
            Json(response).into_response()
        }
        Err(error) => error.into_response(),
    }
}

async fn solve_fk(
    State(state): State<SharedState>,
    payload: Result<Json<FkRequest>, JsonRejection>,
) -> Response {
    let started = Instant::now();
    let result = decoded(payload).and_then(handle_solve_fk);
    let elapsed = started.elapsed().as_micros();
    state.stats.record(Route::SolveFk, Some(elapsed as u64));
    match result {
        Ok(mut response) => {
            response.elapsed_us = elapsed;
            Json(response).into_response()
        }
        Err(error) => error.into_response(),
    }
}

async fn compress_intent(
    State(state): State<SharedState>,
    payload: Result<Json<IntentRequest>, JsonRejection>,
) -> Response {
    let started = Instant::now();
    let result = decoded(payload).and_then(handle_compress_intent);
    let elapsed = started.elapsed().as_micros();
    state.stats.record(Route::CompressIntent, Some(elapsed as u64));
    match result {
        Ok(mut response) => {
            response.elapsed_us = elapsed;
            Json(response).into_response()
        }
        Err(error) => error.into_response(),
    }
}

async fn optimize_trajectory(
    State(state): State<SharedState>,
    payload: Result<Json<TrajectoryRequest>, JsonRejection>,
) -> Response {
    let started = Instant::now();
    let result = decoded(payload).and_then(handle_optimize_trajectory);
    let elapsed = started.elapsed().as_micros();
    state
        .stats
        .record(Route::OptimizeTrajectory, Some(elapsed as u64));
    match result {
        Ok(mut response) => {
            response.elapsed_us = elapsed;
            Json(response).into_response()
        }
        Err(error) => error.into_response(),
    }
}

async fn chains(State(state): State<SharedState>) -> Response {
    state.stats.record(Route::Chains, None);
    Json(presets::catalog()).into_response()
}

async fn stats(State(state): State<SharedState>) -> Response {
    state.stats.record(Route::Stats, None);
    let uptime = state.start_time.elapsed().as_secs();
    Json(state.stats.snapshot(uptime)).into_response()
}

// ── Request handling ────────────────────────────────────────────────────

fn decoded<T>(payload: Result<Json<T>, JsonRejection>) -> Result<T, EngineError> {
    payload
        .map(|Json(inner)| inner)
        .map_err(|rejection| EngineError::Validation(rejection.body_text()))
}

fn handle_solve_ik(state: &AppState, req: IkRequest) -> Result<IkResponse, EngineError> {
    if !finite_vec3(&req.target_position) {
        return Err(EngineError::NonFinite("target_position"));
    }
    let chain = resolve_ik_chain(&req)?;
    let orientation = req
        .target_orientation
        .map(decode_orientation)
        .transpose()?;

    let options = SolveOptions {
        max_iterations: req
            .constraints
            .as_ref()
            .and_then(|c| c.max_iterations)
            .unwrap_or(solver::DEFAULT_MAX_ITERATIONS),
        tolerance: req
            .constraints
            .as_ref()
            .and_then(|c| c.tolerance)
            .unwrap_or(solver::DEFAULT_TOLERANCE),
        deadline: Some(Instant::now() + state.solve_timeout),
    };
    options.validate()?;

    let target = IkTarget {
        position: vec3(&req.target_position),
        orientation,
    };
    let solution = solver::solve(&chain, &target, &options);

    Ok(IkResponse {
        solution_id: Uuid::new_v4().to_string(),
        joint_angles: solver::report_values(&chain, &solution.joint_values),
        iterations: solution.iterations,
        converged: solution.converged,
        error_distance: solution.error_distance,
        elapsed_us: 0,
    })
}

fn handle_solve_fk(req: FkRequest) -> Result<FkResponse, EngineError> {
    let chain = resolve_fk_chain(&req)?;
    chain.check_coordinates(&req.joint_angles)?;

    let fk = chain.fk(&req.joint_angles);
    Ok(FkResponse {
        end_effector_position: to_array(&fk.pose.translation.vector),
        end_effector_orientation: quaternion_wire(&fk.pose),
        joint_positions: fk.joint_positions.iter().map(to_array).collect(),
        elapsed_us: 0,
    })
}

fn handle_compress_intent(req: IntentRequest) -> Result<IntentResponse, EngineError> {
    let sample_rate_hz = req.sample_rate_hz.unwrap_or(1000.0);
    intent::validate_window(&req.samples, sample_rate_hz)?;

    let summary = intent::classify(&req.samples, sample_rate_hz);
    // Serialize through the wire codec so the response reflects exactly
    // what a consumer would decode from the 8-byte record
    let decoded = intent::decode(&intent::encode(&summary))?;

    Ok(IntentResponse {
        intent_id: Uuid::new_v4().to_string(),
        intent_type: decoded.class.as_str().into(),
        direction: to_array(&decoded.direction),
        magnitude: decoded.magnitude,
        compressed_bytes: INTENT_PACKET_SIZE as u64,
        original_samples: req.samples.len(),
        compression_ratio: intent::compression_ratio(req.samples.len()),
        elapsed_us: 0,
    })
}

fn handle_optimize_trajectory(req: TrajectoryRequest) -> Result<TrajectoryResponse, EngineError> {
    let waypoints = trajectory::waypoints_from_wire(&req.waypoints)?;
    let profile = trajectory::parameterize(
        &waypoints,
        req.max_velocity.unwrap_or(DEFAULT_MAX_VELOCITY),
        req.max_acceleration.unwrap_or(DEFAULT_MAX_ACCELERATION),
    )?;

    Ok(TrajectoryResponse {
        trajectory_id: Uuid::new_v4().to_string(),
        optimized_waypoints: profile.waypoints,
        segment_times: profile.segment_times,
        total_distance: profile.total_distance,
        total_time: profile.total_time,
        max_velocity_reached: profile.max_velocity_reached,
        elapsed_us: 0,
    })
}

// ── Decoding helpers ────────────────────────────────────────────────────

fn resolve_ik_chain(req: &IkRequest) -> Result<SerialChain, EngineError> {
    if let Some(spec) = &req.chain {
        build_chain(spec)
    } else if let Some(id) = &req.chain_id {
        presets::preset_chain(id)
    } else {
        SerialChain::implicit_unit_reach(req.joint_count.unwrap_or(7) as usize)
    }
}

fn resolve_fk_chain(req: &FkRequest) -> Result<SerialChain, EngineError> {
    if let Some(spec) = &req.chain {
        return build_chain(spec);
    }
    if let Some(id) = &req.chain_id {
        return presets::preset_chain(id);
    }
    match &req.link_lengths {
        Some(lengths) => {
            if lengths.len() != req.joint_angles.len() {
                return Err(EngineError::InvalidLength {
                    expected: req.joint_angles.len(),
                    found: lengths.len(),
                });
            }
            SerialChain::implicit(lengths)
        }
        None => SerialChain::implicit(&vec![0.2; req.joint_angles.len()]),
    }
}

fn build_chain(specs: &[JointSpec]) -> Result<SerialChain, EngineError> {
    let joints = specs
        .iter()
        .map(|spec| {
            if !finite_vec3(&spec.axis) {
                return Err(EngineError::NonFinite("joint axis"));
            }
            let axis = vec3(&spec.axis);
            if axis.norm() < 1e-9 {
                return Err(EngineError::Validation("joint axis must be non-zero".into()));
            }
            let joint = match spec.kind {
                JointKind::Revolute => Joint::revolute(axis, spec.link_length),
                JointKind::Prismatic => Joint::prismatic(axis, spec.link_length),
            };
            Ok(match spec.limits {
                Some([lo, hi]) => joint.with_limits(lo, hi),
                None => joint,
            })
        })
        .collect::<Result<Vec<_>, _>>()?;
    SerialChain::new(joints)
}

fn decode_orientation(wire: [f64; 4]) -> Result<UnitQuaternion<f64>, EngineError> {
    if !wire.iter().all(|c| c.is_finite()) {
        return Err(EngineError::NonFinite("target_orientation"));
    }
    let quat = Quaternion::new(wire[3], wire[0], wire[1], wire[2]);
    if quat.norm() < 1e-9 {
        return Err(EngineError::Validation(
            "target_orientation must be non-zero".into(),
        ));
    }
    Ok(UnitQuaternion::from_quaternion(quat))
}

fn quaternion_wire(pose: &Pose) -> [f64; 4] {
    let q = pose.rotation.quaternion();
    [q.i, q.j, q.k, q.w]
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::Request;
    use http_body_util::BodyExt;
    use serde_json::Value;
    use tower::ServiceExt;

    fn test_app() -> Router {
        router(Arc::new(AppState::new(Duration::from_secs(5))))
    }

    async fn post_json(app: Router, uri: &str, body: Value) -> (StatusCode, Value) {
        let response = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri(uri)
                    .header("content-type", "application/json")
                    .body(Body::from(body.to_string()))
                    .unwrap(),
            )
            .await
            .unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    async fn get_json(app: Router, uri: &str) -> (StatusCode, Value) {
        let response = app
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    fn assert_uuid_format(value: &Value) {
        let s = value.as_str().expect("id must be a string");
        assert_eq!(s.len(), 36);
        for (i, c) in s.chars().enumerate() {
            if [8, 13, 18, 23].contains(&i) {
                assert_eq!(c, '-');
            } else {
                assert!(c.is_ascii_hexdigit(), "unexpected char {c} in {s}");
            }
        }
    }

    #[tokio::test]
    async fn test_solve_ik_reachable_seven_dof() {
        let (status, body) = post_json(
            test_app(),
            "/api/v1/kinematics/solve-ik",
            json!({ "target_position": [0.5, 0.3, 0.2], "joint_count": 7 }),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["converged"], true);
        assert!(body["error_distance"].as_f64().unwrap() <= 1e-6);
        assert!(body["iterations"].as_u64().unwrap() <= 100);
        assert_eq!(body["joint_angles"].as_array().unwrap().len(), 7);
        assert_uuid_format(&body["solution_id"]);
    }

    #[tokio::test]
    async fn test_solve_ik_unreachable_still_200() {
        let (status, body) = post_json(
            test_app(),
            "/api/v1/kinematics/solve-ik",
            json!({ "target_position": [100.0, 0.0, 0.0], "joint_count": 3 }),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["converged"], false);
        assert_eq!(body["iterations"], 100);
        assert!(body["error_distance"].as_f64().unwrap() > 0.1);
    }

    #[tokio::test]
    async fn test_solve_ik_with_preset_chain() {
        let (status, body) = post_json(
            test_app(),
            "/api/v1/kinematics/solve-ik",
            json!({ "chain_id": "robotic_arm_6dof", "target_position": [0.3, 0.2, 0.4] }),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["joint_angles"].as_array().unwrap().len(), 6);
    }

    #[tokio::test]
    async fn test_solve_ik_rejects_bad_requests() {
        let (status, body) = post_json(
            test_app(),
            "/api/v1/kinematics/solve-ik",
            json!({ "target_position": [0.5, 0.3, 0.2], "joint_count": 65 }),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].is_string());

        let (status, _) = post_json(
            test_app(),
            "/api/v1/kinematics/solve-ik",
            json!({ "target_position": [0.5, 0.3, 0.2], "chain_id": "hexapod" }),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, _) = post_json(
            test_app(),
            "/api/v1/kinematics/solve-ik",
            json!({
                "target_position": [0.5, 0.3, 0.2],
                "constraints": { "max_iterations": 20000 }
            }),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_solve_fk_straight_chain() {
        let (status, body) = post_json(
            test_app(),
            "/api/v1/kinematics/solve-fk",
            json!({
                "joint_angles": [0.0, 0.0, 0.0, 0.0, 0.0],
                "link_lengths": [0.2, 0.2, 0.2, 0.2, 0.2]
            }),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        let position = body["end_effector_position"].as_array().unwrap();
        assert!((position[0].as_f64().unwrap() - 1.0).abs() < 1e-9);
        assert!(position[1].as_f64().unwrap().abs() < 1e-9);
        assert!(position[2].as_f64().unwrap().abs() < 1e-9);

        let joints = body["joint_positions"].as_array().unwrap();
        assert_eq!(joints.len(), 6);
        assert_eq!(joints[0][0], 0.0);
        assert!((joints[5][0].as_f64().unwrap() - 1.0).abs() < 1e-9);
    }

    #[tokio::test]
    async fn test_solve_fk_explicit_chain_and_mismatch() {
        let (status, body) = post_json(
            test_app(),
            "/api/v1/kinematics/solve-fk",
            json!({
                "chain": [
                    { "type": "revolute", "axis": [0.0, 0.0, 1.0], "link_length": 0.5 },
                    { "type": "prismatic", "axis": [1.0, 0.0, 0.0], "link_length": 0.0 }
                ],
                "joint_angles": [0.0, 0.25]
            }),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        let position = body["end_effector_position"].as_array().unwrap();
        assert!((position[0].as_f64().unwrap() - 0.75).abs() < 1e-9);

        let (status, _) = post_json(
            test_app(),
            "/api/v1/kinematics/solve-fk",
            json!({
                "joint_angles": [0.0, 0.0],
                "link_lengths": [0.2]
            }),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_compress_intent_idle() {
        let samples: Vec<Value> = (0..100)
            .map(|i| {
                json!({
                    "timestamp_ms": i,
                    "position": [0.0, 0.0, 0.0],
                    "velocity": [0.0, 0.0, 0.0]
                })
            })
            .collect();
        let (status, body) = post_json(
            test_app(),
            "/api/v1/kinematics/compress-intent",
            json!({ "samples": samples, "sample_rate_hz": 1000.0 }),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["intent_type"], "idle");
        assert_eq!(body["compressed_bytes"], 8);
        assert_eq!(body["magnitude"], 0.0);
        assert_eq!(body["original_samples"], 100);
        assert_eq!(body["compression_ratio"], 400.0);
        assert_uuid_format(&body["intent_id"]);
    }

    #[tokio::test]
    async fn test_compress_intent_reach() {
        let samples: Vec<Value> = (0..100)
            .map(|i| {
                json!({
                    "timestamp_ms": i,
                    "position": [0.01 * i as f64, 0.0, 0.0]
                })
            })
            .collect();
        let (status, body) = post_json(
            test_app(),
            "/api/v1/kinematics/compress-intent",
            json!({ "samples": samples, "sample_rate_hz": 1000.0 }),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["intent_type"], "reach");
        let direction = body["direction"].as_array().unwrap();
        assert!((direction[0].as_f64().unwrap() - 1.0).abs() <= 1.0 / 127.0);
        assert!((body["magnitude"].as_f64().unwrap() - 0.99).abs() < 1e-6);
    }

    #[tokio::test]
    async fn test_compress_intent_rejects_non_monotonic() {
        let (status, body) = post_json(
            test_app(),
            "/api/v1/kinematics/compress-intent",
            json!({
                "samples": [
                    { "timestamp_ms": 10, "position": [0.0, 0.0, 0.0] },
                    { "timestamp_ms": 5, "position": [0.0, 0.0, 0.0] }
                ]
            }),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].is_string());
    }

    #[tokio::test]
    async fn test_optimize_trajectory_triangular() {
        let (status, body) = post_json(
            test_app(),
            "/api/v1/kinematics/optimize-trajectory",
            json!({
                "waypoints": [[0.0, 0.0, 0.0], [0.1, 0.0, 0.0]],
                "max_velocity": 1.0
            }),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        let expected_peak = 0.2f64.sqrt();
        assert!(
            (body["max_velocity_reached"].as_f64().unwrap() - expected_peak).abs() < 1e-9
        );
        assert!((body["total_time"].as_f64().unwrap() - expected_peak).abs() < 1e-9);
        assert_eq!(body["segment_times"].as_array().unwrap().len(), 1);
        assert_eq!(body["optimized_waypoints"].as_array().unwrap().len(), 2);
        assert_uuid_format(&body["trajectory_id"]);
    }

    #[tokio::test]
    async fn test_optimize_trajectory_rejects_single_waypoint() {
        let (status, _) = post_json(
            test_app(),
            "/api/v1/kinematics/optimize-trajectory",
            json!({ "waypoints": [[0.0, 0.0, 0.0]] }),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_chains_catalog() {
        let (status, body) = get_json(test_app(), "/api/v1/kinematics/chains").await;
        assert_eq!(status, StatusCode::OK);
        let catalog = body.as_array().unwrap();
        assert_eq!(catalog.len(), 5);
        assert_eq!(catalog[0]["id"], "human_arm");
        assert_eq!(catalog[0]["dof"], 7);
        assert_eq!(catalog[3]["joint_type"], "prismatic");
        assert_eq!(catalog[4]["joint_type"], "revolute+prismatic");
    }

    #[tokio::test]
    async fn test_health_and_stats_counters() {
        let state = Arc::new(AppState::new(Duration::from_secs(5)));

        let (status, body) = get_json(router(Arc::clone(&state)), "/health").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
        assert_eq!(body["version"], env!("CARGO_PKG_VERSION"));

        // A failing request still counts
        let (status, _) = post_json(
            router(Arc::clone(&state)),
            "/api/v1/kinematics/solve-fk",
            json!({ "joint_angles": [0.0], "link_lengths": [0.1, 0.2] }),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (_, before) = get_json(router(Arc::clone(&state)), "/api/v1/kinematics/stats").await;
        let (_, after) = get_json(router(Arc::clone(&state)), "/api/v1/kinematics/stats").await;
        assert_eq!(before["fk_solves"], 1);
        assert!(
            after["requests_total"].as_u64().unwrap()
                > before["requests_total"].as_u64().unwrap()
        );
        assert_eq!(after["stats_queries"], 2);
    }

    #[tokio::test]
    async fn test_malformed_json_yields_error_body() {
        let response = test_app()
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/api/v1/kinematics/solve-ik")
                    .header("content-type", "application/json")
                    .body(Body::from("{not json"))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let body: Value = serde_json::from_slice(&bytes).unwrap();
        assert!(body["error"].is_string());
    }
}
