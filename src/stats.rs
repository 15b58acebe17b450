//! In-process request counters.
//!
//! All counters are monotonic `AtomicU64`s updated with relaxed fetch-adds
//! on every response, including rejected requests. Nothing here persists;
//! the counters live exactly as long as the process.

use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};

/// The dispatchable routes, used to attribute per-route counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    SolveIk,
    SolveFk,
    CompressIntent,
    OptimizeTrajectory,
    Chains,
    Stats,
}

#[derive(Default)]
pub struct EngineStats {
    requests_total: AtomicU64,
    ik_solves: AtomicU64,
    fk_solves: AtomicU64,
    intent_compressions: AtomicU64,
    trajectory_optimizations: AtomicU64,
    chain_queries: AtomicU64,
    stats_queries: AtomicU64,
    solve_time_us_sum: AtomicU64,
    solve_time_us_count: AtomicU64,
}

/// Snapshot served by the stats endpoint.
#[derive(Serialize)]
pub struct StatsSnapshot {
    pub requests_total: u64,
    pub ik_solves: u64,
    pub fk_solves: u64,
    pub intent_compressions: u64,
    pub trajectory_optimizations: u64,
    pub chain_queries: u64,
    pub stats_queries: u64,
    pub solve_time_us_sum: u64,
    pub solve_time_us_count: u64,
    pub uptime_seconds: u64,
}

impl EngineStats {
    pub fn new() -> Self {
        EngineStats::default()
    }

    /// Record one completed response. `elapsed_us` is supplied by the four
    /// compute routes and feeds the solve-time aggregate.
    pub fn record(&self, route: Route, elapsed_us: Option<u64>) {
        self.requests_total.fetch_add(1, Ordering::Relaxed);
        let per_route = match route {
            Route::SolveIk => &self.ik_solves,
            Route::SolveFk => &self.fk_solves,
            Route::CompressIntent => &self.intent_compressions,
            Route::OptimizeTrajectory => &self.trajectory_optimizations,
            Route::Chains => &self.chain_queries,
            Route::Stats => &self.stats_queries,
        };
        per_route.fetch_add(1, Ordering::Relaxed);
        if let Some(us) = elapsed_us {
            self.solve_time_us_sum.fetch_add(us, Ordering::Relaxed);
            self.solve_time_us_count.fetch_add(1, Ordering::Relaxed);
        }
    }

    /// Combined IK and FK solve count, reported by the health endpoint.
    pub fn total_solves(&self) -> u64 {
        self.ik_solves.load(Ordering::Relaxed) + self.fk_solves.load(Ordering::Relaxed)
    }

    pub fn snapshot(&self, uptime_seconds: u64) -> StatsSnapshot {
        StatsSnapshot {
            requests_total: self.requests_total.load(Ordering::Relaxed),
            ik_solves: self.ik_solves.load(Ordering::Relaxed),
            fk_solves: self.fk_solves.load(Ordering::Relaxed),
            intent_compressions: self.intent_compressions.load(Ordering::Relaxed),
            trajectory_optimizations: self.trajectory_optimizations.load(Ordering::Relaxed),
            chain_queries: self.chain_queries.load(Ordering::Relaxed),
            stats_queries: self.stats_queries.load(Ordering::Relaxed),
            solve_time_us_sum: self.solve_time_us_sum.load(Ordering::Relaxed),
            solve_time_us_count: self.solve_time_us_count.load(Ordering::Relaxed),
            uptime_seconds,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_increments_total_and_route() {
        let stats = EngineStats::new();
        stats.record(Route::SolveIk, Some(120));
        stats.record(Route::SolveIk, Some(80));
        stats.record(Route::Chains, None);

        let snapshot = stats.snapshot(5);
        assert_eq!(snapshot.requests_total, 3);
        assert_eq!(snapshot.ik_solves, 2);
        assert_eq!(snapshot.chain_queries, 1);
        assert_eq!(snapshot.solve_time_us_sum, 200);
        assert_eq!(snapshot.solve_time_us_count, 2);
        assert_eq!(snapshot.uptime_seconds, 5);
    }

    #[test]
    fn test_total_solves_combines_ik_and_fk() {
        let stats = EngineStats::new();
        stats.record(Route::SolveIk, Some(10));
        stats.record(Route::SolveFk, Some(10));
        stats.record(Route::CompressIntent, Some(10));
        assert_eq!(stats.total_solves(), 2);
    }

    #[test]
    fn test_counters_are_monotonic_across_threads() {
        use std::sync::Arc;
        let stats = Arc::new(EngineStats::new());
        let mut handles = Vec::new();
        for _ in 0..4 {
            let stats = Arc::clone(&stats);
            handles.push(std::thread::spawn(move || {
                for _ in 0..1000 {
                    stats.record(Route::SolveFk, Some(1));
                }
            }));
        }
        for handle in handles {
            handle.join().expect("worker panicked");
        }
        let snapshot = stats.snapshot(0);
        assert_eq!(snapshot.requests_total, 4000);
        assert_eq!(snapshot.fk_solves, 4000);
        assert_eq!(snapshot.solve_time_us_sum, 4000);
    }
}
