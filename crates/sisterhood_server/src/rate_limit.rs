//! Fixed-window request limiting per client IP.

use axum::extract::{ConnectInfo, Request, State};
use axum::http::{HeaderValue, StatusCode};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::warn;

/// Body of a rejected request.
pub const RATE_LIMIT_MESSAGE: &str = "Too many requests from this IP, please try again later.";

const RATE_LIMIT_LIMIT: &str = "x-ratelimit-limit";
const RATE_LIMIT_REMAINING: &str = "x-ratelimit-remaining";

/// Expired windows are swept once this many clients are tracked.
const SWEEP_THRESHOLD: usize = 4096;

/// Counts requests per client IP in fixed windows.
///
/// Requests without a known peer address share one bucket.
pub struct RateLimiter {
    window: Duration,
    max_requests: u32,
    clients: Mutex<HashMap<Option<IpAddr>, Window>>,
}

/// Outcome of [`RateLimiter::check`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    /// Limiting is disabled.
    Unlimited,
    /// The request counts against the window.
    Allowed {
        /// Requests left in the current window.
        remaining: u32,
    },
    /// The window is exhausted.
    Limited {
        /// Time until the window resets.
        retry_after: Duration,
    },
}

impl Decision {
    /// Returns `true` unless the request was limited.
    pub fn is_allowed(&self) -> bool {
        !matches!(self, Decision::Limited { .. })
    }
}

#[derive(Debug, Clone, Copy)]
struct Window {
    started: Instant,
    count: u32,
}

impl RateLimiter {
    /// Creates a limiter allowing `max_requests` per `window`.
    ///
    /// A limit of zero allows everything.
    pub fn new(max_requests: u32, window: Duration) -> Self {
        Self {
            window,
            max_requests,
            clients: Mutex::new(HashMap::new()),
        }
    }

    /// Records a request from `client` and decides whether it may proceed.
    pub fn check(&self, client: Option<IpAddr>) -> Decision {
        self.check_at(client, Instant::now())
    }

    /// Like [`check`](Self::check) with an explicit clock reading.
    pub fn check_at(&self, client: Option<IpAddr>, now: Instant) -> Decision {
        if self.max_requests == 0 {
            return Decision::Unlimited;
        }

        let mut clients = self.clients.lock();
        if clients.len() >= SWEEP_THRESHOLD {
            let window = self.window;
            clients.retain(|_, w| now.duration_since(w.started) < window);
        }

        let entry = clients.entry(client).or_insert(Window {
            started: now,
            count: 0,
        });
        if now.duration_since(entry.started) >= self.window {
            *entry = Window {
                started: now,
                count: 0,
            };
        }

        if entry.count >= self.max_requests {
            let elapsed = now.duration_since(entry.started);
            return Decision::Limited {
                retry_after: self.window.saturating_sub(elapsed),
            };
        }
        entry.count += 1;
        Decision::Allowed {
            remaining: self.max_requests - entry.count,
        }
    }

    /// Requests allowed per window; zero when limiting is disabled.
    pub fn max_requests(&self) -> u32 {
        self.max_requests
    }

    /// Returns the number of clients currently tracked.
    pub fn tracked_clients(&self) -> usize {
        self.clients.lock().len()
    }
}

/// Middleware rejecting requests over the limit with 429.
///
/// Limited responses carry `Retry-After`; every counted response carries
/// `X-RateLimit-Limit` and `X-RateLimit-Remaining`.
pub async fn enforce(
    State(limiter): State<Arc<RateLimiter>>,
    request: Request,
    next: Next,
) -> Response {
    let client = request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip());

    let limit = HeaderValue::from(limiter.max_requests());
    match limiter.check(client) {
        Decision::Unlimited => next.run(request).await,
        Decision::Allowed { remaining } => {
            let mut response = next.run(request).await;
            let headers = response.headers_mut();
            headers.insert(RATE_LIMIT_LIMIT, limit);
            headers.insert(RATE_LIMIT_REMAINING, HeaderValue::from(remaining));
            response
        }
        Decision::Limited { retry_after } => {
            warn!(client = ?client, "rate limit exceeded");
            let mut retry_secs = retry_after.as_secs();
            if retry_after.subsec_nanos() > 0 {
                retry_secs += 1;
            }
            (
                StatusCode::TOO_MANY_REQUESTS,
                [
                    ("retry-after", HeaderValue::from(retry_secs)),
                    (RATE_LIMIT_LIMIT, limit),
                    (RATE_LIMIT_REMAINING, HeaderValue::from(0u32)),
                ],
                RATE_LIMIT_MESSAGE,
            )
                .into_response()
        }
    }
}
