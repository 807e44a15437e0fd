// Connection handling module
// Accepts a single TCP connection and serves it on its own task

use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper_util::rt::{TokioIo, TokioTimer};
use std::net::SocketAddr;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::config::AppState;
use crate::handler;
use crate::logger;

/// How often an open connection is checked for idleness
const IDLE_CHECK_INTERVAL: Duration = Duration::from_millis(250);

/// Accept a connection, enforcing the connection limit.
///
/// # Arguments
///
/// * `stream` - The TCP stream to handle
/// * `peer_addr` - The peer's socket address
/// * `state` - Shared application state
/// * `conn_counter` - Active connection counter
pub fn accept_connection(
    stream: tokio::net::TcpStream,
    peer_addr: SocketAddr,
    state: &Arc<AppState>,
    conn_counter: &Arc<AtomicUsize>,
) {
    // Increment counter first, then check limit
    let prev_count = conn_counter.fetch_add(1, Ordering::SeqCst);

    if let Some(max_conn) = state.config.performance.max_connections {
        if prev_count >= usize::try_from(max_conn).unwrap_or(usize::MAX) {
            conn_counter.fetch_sub(1, Ordering::SeqCst);
            logger::log_warning(&format!(
                "Max connections reached: {prev_count}/{max_conn}. Connection from {peer_addr} rejected."
            ));
            drop(stream);
            return;
        }
    }

    logger::log_connection_accepted(&peer_addr);

    handle_connection(stream, peer_addr, Arc::clone(state), Arc::clone(conn_counter));
}

/// Request activity on one connection
///
/// A connection counts as idle only while no request is being handled, so a
/// slow upload or download is never cut off while it is in progress.
#[derive(Debug)]
struct Activity {
    opened: Instant,
    in_flight: AtomicUsize,
    /// Milliseconds after `opened` when the last request finished
    last_done_ms: AtomicU64,
}

impl Activity {
    fn new() -> Self {
        Self {
            opened: Instant::now(),
            in_flight: AtomicUsize::new(0),
            last_done_ms: AtomicU64::new(0),
        }
    }

    fn begin(&self) {
        self.in_flight.fetch_add(1, Ordering::SeqCst);
    }

    fn end(&self) {
        self.last_done_ms.store(self.elapsed_ms(), Ordering::SeqCst);
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
    }

    /// Time since the last request finished, `None` while one is running
    fn idle_for(&self) -> Option<Duration> {
        if self.in_flight.load(Ordering::SeqCst) > 0 {
            return None;
        }
        let since = self
            .elapsed_ms()
            .saturating_sub(self.last_done_ms.load(Ordering::SeqCst));
        Some(Duration::from_millis(since))
    }

    fn elapsed_ms(&self) -> u64 {
        u64::try_from(self.opened.elapsed().as_millis()).unwrap_or(u64::MAX)
    }
}

/// How long a connection may sit without a request before it is closed
const fn idle_limit(keep_alive_timeout: u64, read_timeout: u64) -> Option<Duration> {
    let secs = if keep_alive_timeout > 0 {
        keep_alive_timeout
    } else {
        read_timeout
    };
    if secs == 0 {
        None
    } else {
        Some(Duration::from_secs(secs))
    }
}

/// Serve one connection on a spawned task.
///
/// Request headers must arrive within `read_timeout`. Between requests the
/// connection is closed gracefully once it has been idle for
/// `keep_alive_timeout` (or `read_timeout` with keep-alive off). Request and
/// response bodies are not time-limited. The counter is decremented when the
/// connection ends either way.
fn handle_connection(
    stream: tokio::net::TcpStream,
    peer_addr: SocketAddr,
    state: Arc<AppState>,
    conn_counter: Arc<AtomicUsize>,
) {
    tokio::spawn(async move {
        let io = TokioIo::new(stream);

        let performance = &state.config.performance;
        let idle_limit = idle_limit(performance.keep_alive_timeout, performance.read_timeout);

        let mut builder = http1::Builder::new();
        builder.timer(TokioTimer::new());
        builder.keep_alive(performance.keep_alive_timeout > 0);
        if performance.read_timeout > 0 {
            builder.header_read_timeout(Duration::from_secs(performance.read_timeout));
        }

        let activity = Arc::new(Activity::new());
        let service_state = Arc::clone(&state);
        let service_activity = Arc::clone(&activity);
        let conn = builder.serve_connection(
            io,
            service_fn(move |req| {
                let state = Arc::clone(&service_state);
                let activity = Arc::clone(&service_activity);
                async move {
                    activity.begin();
                    let response = handler::handle_request(req, state, peer_addr).await;
                    activity.end();
                    response
                }
            }),
        );
        let mut conn = std::pin::pin!(conn);

        let mut ticker = tokio::time::interval(IDLE_CHECK_INTERVAL);
        let mut closing = false;
        loop {
            tokio::select! {
                result = conn.as_mut() => {
                    if let Err(err) = result {
                        logger::log_connection_error(&err);
                    }
                    break;
                }

                _ = ticker.tick(), if !closing && idle_limit.is_some() => {
                    let expired = activity
                        .idle_for()
                        .zip(idle_limit)
                        .is_some_and(|(idle, limit)| idle >= limit);
                    if expired {
                        logger::log_debug(&format!("Closing idle connection from {peer_addr}"));
                        conn.as_mut().graceful_shutdown();
                        closing = true;
                    }
                }
            }
        }

        conn_counter.fetch_sub(1, Ordering::SeqCst);
    });
}
