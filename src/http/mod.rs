//! HTTP surface: rate limited routes and the server that hosts them.

mod middleware;
mod response;
mod routes;
mod server;

pub use middleware::{enforce_rate_limit, RateLimitGuard};
pub use response::retry_after_secs;
pub use routes::{health, root, App};
pub use server::HttpServer;
