//! Route table and application assembly.

use axum::middleware;
use axum::routing::{get, MethodRouter};
use axum::{Json, Router};
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::{info, warn};

use super::middleware::{enforce_rate_limit, RateLimitGuard};
use crate::config::RateLimitingConfig;
use crate::error::{Result, TollgateError};
use crate::ratelimit::{Clock, SlidingWindowLimiter};

/// Greeting endpoint.
pub async fn root() -> Json<Value> {
    Json(json!({ "message": "Hello, World!" }))
}

/// Liveness endpoint. Never rate limited.
pub async fn health() -> Json<Value> {
    Json(json!({
        "status": "healthy",
        "timestamp": chrono::Utc::now().to_rfc3339()
    }))
}

/// Routes that may carry a rate limit.
fn limitable_routes() -> Vec<(&'static str, MethodRouter)> {
    vec![("/", get(root))]
}

/// The assembled router together with the limiters it owns.
pub struct App {
    router: Router,
    limiters: Vec<Arc<SlidingWindowLimiter>>,
}

impl App {
    /// Build the router, giving every configured endpoint its own limiter.
    ///
    /// Fails if a limit names a path with no registered route.
    pub fn build(config: &RateLimitingConfig, clock: Arc<dyn Clock>) -> Result<Self> {
        let routes = limitable_routes();

        for endpoint in &config.endpoints {
            if !routes.iter().any(|(path, _)| *path == endpoint.path) {
                return Err(TollgateError::Config(format!(
                    "no route registered for rate limited endpoint {}",
                    endpoint.path
                )));
            }
        }

        let mut router = Router::new().route("/health", get(health));
        let mut limiters = Vec::new();

        for (path, route) in routes {
            let route = match config.endpoint(path) {
                Some(endpoint) => {
                    let limiter_config = endpoint.limiter_config()?;
                    info!(
                        path = path,
                        max_calls = limiter_config.max_calls(),
                        period = ?limiter_config.period(),
                        "Rate limiting endpoint"
                    );

                    let limiter = Arc::new(SlidingWindowLimiter::with_config(limiter_config));
                    limiters.push(limiter.clone());
                    route.route_layer(middleware::from_fn_with_state(
                        RateLimitGuard::new(limiter, clock.clone()),
                        enforce_rate_limit,
                    ))
                }
                None => {
                    warn!(path = path, "Endpoint has no rate limit configured");
                    route
                }
            };
            router = router.route(path, route);
        }

        Ok(Self { router, limiters })
    }

    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Limiters backing the protected routes, for sweeping.
    pub fn limiters(&self) -> &[Arc<SlidingWindowLimiter>] {
        &self.limiters
    }

    pub fn into_parts(self) -> (Router, Vec<Arc<SlidingWindowLimiter>>) {
        (self.router, self.limiters)
    }
}
