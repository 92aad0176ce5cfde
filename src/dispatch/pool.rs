//! Connection pooling for the dispatch layer
//!
//! The pool is an explicit object owned by the [`Dispatcher`](super::Dispatcher)
//! and passed to call sites — there is no process-global registry. Each
//! endpoint keeps a small stack of idle TCP connections; a checkout pops one
//! or dials a fresh connection under a connect timeout, and a checkin returns
//! it up to the configured capacity. Connections that saw an error are simply
//! dropped instead of checked in.

use std::collections::HashMap;
use std::time::Duration;

use anyhow::Context;
use tokio::net::TcpStream;
use tokio::sync::Mutex;
use tokio::time::timeout;

use crate::Result;

/// Per-endpoint reusable TCP connections
#[derive(Debug)]
pub struct ConnectionPool {
    capacity: usize,
    connect_timeout: Duration,
    idle: HashMap<String, Mutex<Vec<TcpStream>>>,
}

impl ConnectionPool {
    /// Create a pool for the given endpoints
    ///
    /// Connections are dialed lazily on first checkout, so construction cannot
    /// fail even if an endpoint is not reachable yet.
    pub fn new(endpoints: &[String], capacity: usize, connect_timeout: Duration) -> Self {
        let idle = endpoints
            .iter()
            .map(|endpoint| (endpoint.clone(), Mutex::new(Vec::with_capacity(capacity))))
            .collect();
        Self {
            capacity,
            connect_timeout,
            idle,
        }
    }

    /// Take a connection to `endpoint`, dialing one if none is idle
    pub async fn checkout(&self, endpoint: &str) -> Result<TcpStream> {
        let slot = self
            .idle
            .get(endpoint)
            .with_context(|| format!("endpoint '{}' is not in the pool", endpoint))?;

        if let Some(conn) = slot.lock().await.pop() {
            return Ok(conn);
        }

        let conn = timeout(self.connect_timeout, TcpStream::connect(endpoint))
            .await
            .with_context(|| format!("Timed out connecting to {}", endpoint))?
            .with_context(|| format!("Failed to connect to {}", endpoint))?;
        Ok(conn)
    }

    /// Return a healthy connection; dropped if the endpoint stack is full
    pub async fn checkin(&self, endpoint: &str, conn: TcpStream) {
        if let Some(slot) = self.idle.get(endpoint) {
            let mut idle = slot.lock().await;
            if idle.len() < self.capacity {
                idle.push(conn);
            }
        }
    }

    /// Idle connections currently held for `endpoint`
    pub async fn idle_count(&self, endpoint: &str) -> usize {
        match self.idle.get(endpoint) {
            Some(slot) => slot.lock().await.len(),
            None => 0,
        }
    }
}
