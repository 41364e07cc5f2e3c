//! Rate limiting middleware for protected routes.

use axum::extract::{ConnectInfo, Request, State};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::{debug, instrument, warn};

use crate::error::{Result, TollgateError};
use crate::ratelimit::{ClientKey, Clock, SlidingWindowLimiter};

/// Per-route middleware state: the route's limiter and the shared clock.
#[derive(Clone)]
pub struct RateLimitGuard {
    limiter: Arc<SlidingWindowLimiter>,
    clock: Arc<dyn Clock>,
}

impl RateLimitGuard {
    pub fn new(limiter: Arc<SlidingWindowLimiter>, clock: Arc<dyn Clock>) -> Self {
        Self { limiter, clock }
    }

    pub fn limiter(&self) -> &Arc<SlidingWindowLimiter> {
        &self.limiter
    }

    /// Derive the client key for `request` and run the admission check.
    pub fn admit(&self, request: &Request) -> Result<()> {
        let addr = request
            .extensions()
            .get::<ConnectInfo<SocketAddr>>()
            .map(|ConnectInfo(addr)| *addr)
            .ok_or(TollgateError::MissingIdentity)?;

        let key = ClientKey::from_ip(addr.ip());
        self.limiter.check(&key, self.clock.now()).into_result()
    }
}

/// Reject the request before it reaches the handler if the client has no
/// identity or is over its quota.
#[instrument(skip_all, fields(path = %request.uri().path()))]
pub async fn enforce_rate_limit(
    State(guard): State<RateLimitGuard>,
    request: Request,
    next: Next,
) -> Response {
    match guard.admit(&request) {
        Ok(()) => next.run(request).await,
        Err(err) => {
            match &err {
                TollgateError::MissingIdentity => {
                    warn!("Received request without client address");
                }
                TollgateError::RateLimited { wait } => {
                    debug!(wait = ?wait, "Request rejected by rate limiter");
                }
                _ => {}
            }
            err.into_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ratelimit::ManualClock;
    use axum::body::Body;
    use std::time::Duration;

    fn guard(max_calls: u32, period_secs: u64, clock: Arc<ManualClock>) -> RateLimitGuard {
        let limiter =
            SlidingWindowLimiter::new(max_calls, Duration::from_secs(period_secs)).unwrap();
        RateLimitGuard::new(Arc::new(limiter), clock)
    }

    fn request_from(addr: &str) -> Request {
        let mut request = Request::new(Body::empty());
        let addr: SocketAddr = addr.parse().unwrap();
        request.extensions_mut().insert(ConnectInfo(addr));
        request
    }

    #[test]
    fn test_missing_identity() {
        let guard = guard(5, 60, Arc::new(ManualClock::new(0.0)));
        let request = Request::new(Body::empty());

        let result = guard.admit(&request);
        assert!(matches!(result, Err(TollgateError::MissingIdentity)));
        assert_eq!(guard.limiter().key_count(), 0);
    }

    #[test]
    fn test_rejects_after_quota() {
        let clock = Arc::new(ManualClock::new(0.0));
        let guard = guard(2, 10, clock.clone());

        assert!(guard.admit(&request_from("10.0.0.1:5000")).is_ok());
        clock.set(1.0);
        assert!(guard.admit(&request_from("10.0.0.1:5001")).is_ok());
        clock.set(2.0);

        match guard.admit(&request_from("10.0.0.1:5002")) {
            Err(TollgateError::RateLimited { wait }) => {
                assert!((wait.as_secs_f64() - 8.0).abs() < 1e-6);
            }
            other => panic!("expected rate limit, got {:?}", other),
        }
    }

    #[test]
    fn test_port_does_not_change_identity() {
        let guard = guard(1, 60, Arc::new(ManualClock::new(0.0)));

        assert!(guard.admit(&request_from("10.0.0.1:1111")).is_ok());
        assert!(guard.admit(&request_from("10.0.0.1:2222")).is_err());
        assert!(guard.admit(&request_from("10.0.0.2:1111")).is_ok());
        assert_eq!(guard.limiter().key_count(), 2);
    }
}
