//! Schedule dispatch
//!
//! Consumes the generated [`InvocationData`] and fires one remote call per
//! scheduled invocation. The wall-clock offset of invocation `i` in minute `m`
//! is `m * 60 s` plus the cumulative sum of that minute's gaps up to and
//! including `i`; the driver sleeps to each offset on the tokio clock and
//! spawns an invoker task under a global concurrency cap.
//!
//! Failure policy lives entirely here: per-invocation timeout, connection
//! errors and protocol errors are counted in [`DispatchStats`] and never stop
//! the replay. The generator core has no retryable errors to handle.
//!
//! Schedules are shared as `Arc<InvocationData>`: the snapshot is immutable,
//! so invoker tasks read it without synchronization.

pub mod payload;
pub mod pool;

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tokio::time::{sleep_until, timeout, Instant};

use crate::config::DispatchConfig;
use crate::generator::iat::MINUTE_IN_MICROSECONDS;
use crate::generator::InvocationData;
use crate::stats::{DispatchStats, InvocationOutcome};
use crate::trace::Function;
use crate::util::time::Timestamp;
use payload::{read_frame, write_frame, InvocationRequest, InvocationResponse};
use pool::ConnectionPool;

/// Dispatch outcome for one function
pub struct FunctionReport {
    pub name: String,
    pub stats: Arc<DispatchStats>,
}

/// Fires generated schedules against workload-function endpoints
///
/// Owns the connection pool and the global concurrency cap; both are passed
/// explicitly to the invoker tasks.
pub struct Dispatcher {
    config: DispatchConfig,
    pool: Arc<ConnectionPool>,
    permits: Arc<Semaphore>,
}

impl Dispatcher {
    pub fn new(config: DispatchConfig) -> Self {
        let pool = Arc::new(ConnectionPool::new(
            &config.endpoints,
            config.pool_capacity,
            Duration::from_millis(config.connect_timeout_ms),
        ));
        let permits = Arc::new(Semaphore::new(config.max_concurrency));
        Self {
            config,
            pool,
            permits,
        }
    }

    /// Replay every function's schedule; returns per-function statistics
    ///
    /// All functions share one time origin, so their schedules interleave the
    /// way the trace prescribes.
    pub async fn run(&self, runs: Vec<(Function, Arc<InvocationData>)>) -> Vec<FunctionReport> {
        let origin = Instant::now();
        let deadline = Duration::from_millis(self.config.timeout_ms);

        let mut drivers = JoinSet::new();
        let mut reports = Vec::with_capacity(runs.len());
        for (function, data) in runs {
            let stats = Arc::new(DispatchStats::new());
            reports.push(FunctionReport {
                name: function.name.clone(),
                stats: Arc::clone(&stats),
            });

            let pool = Arc::clone(&self.pool);
            let permits = Arc::clone(&self.permits);
            let endpoint = function.endpoint.clone();
            drivers.spawn(async move {
                drive_function(origin, endpoint, data, pool, permits, stats, deadline).await;
            });
        }
        while drivers.join_next().await.is_some() {}

        reports
    }
}

/// Flattened schedule: (minute, invocation index, absolute offset in µs)
///
/// Offsets are cumulative within each minute and non-decreasing across the
/// whole schedule; empty minutes contribute nothing.
fn schedule_offsets(data: &InvocationData) -> Vec<(usize, usize, f64)> {
    let mut offsets = Vec::with_capacity(data.total_invocations());
    for (minute, gaps) in data.iat.iter().enumerate() {
        let mut offset_us = minute as f64 * MINUTE_IN_MICROSECONDS;
        for (index, gap) in gaps.iter().enumerate() {
            offset_us += gap;
            offsets.push((minute, index, offset_us));
        }
    }
    offsets
}

async fn drive_function(
    origin: Instant,
    endpoint: String,
    data: Arc<InvocationData>,
    pool: Arc<ConnectionPool>,
    permits: Arc<Semaphore>,
    stats: Arc<DispatchStats>,
    deadline: Duration,
) {
    let mut invokers = JoinSet::new();
    for (minute, index, offset_us) in schedule_offsets(&data) {
        sleep_until(origin + Duration::from_secs_f64(offset_us / 1e6)).await;

        let Ok(permit) = Arc::clone(&permits).acquire_owned().await else {
            // The semaphore is never closed while drivers run.
            break;
        };

        let request = InvocationRequest::from(data.spec[minute][index]);
        stats.record_issued();

        let endpoint = endpoint.clone();
        let pool = Arc::clone(&pool);
        let stats = Arc::clone(&stats);
        invokers.spawn(async move {
            let _permit = permit;
            invoke_once(&endpoint, request, &pool, &stats, deadline).await;
        });
    }
    while invokers.join_next().await.is_some() {}
}

/// One remote call: checkout, request/response frame exchange, checkin
///
/// Only connections that completed the exchange go back to the pool; anything
/// that errored or timed out is dropped with its connection.
async fn invoke_once(
    endpoint: &str,
    request: InvocationRequest,
    pool: &ConnectionPool,
    stats: &DispatchStats,
    deadline: Duration,
) {
    let started = Timestamp::now();
    let exchange = async {
        let mut conn = pool.checkout(endpoint).await?;
        write_frame(&mut conn, &request).await?;
        let response: InvocationResponse = read_frame(&mut conn).await?;
        Ok::<_, anyhow::Error>((conn, response))
    };

    match timeout(deadline, exchange).await {
        Ok(Ok((conn, _response))) => {
            stats.record_outcome(InvocationOutcome::Success, Some(started.elapsed()));
            pool.checkin(endpoint, conn).await;
        }
        Ok(Err(_)) => stats.record_outcome(InvocationOutcome::Failed, None),
        Err(_) => stats.record_outcome(InvocationOutcome::TimedOut, None),
    }
}
