//! Rate limiting logic and state management.

mod clock;
mod decision;
mod key;
mod limiter;
mod sweeper;
mod window;

pub use clock::{Clock, ManualClock, MonotonicClock};
pub use decision::Decision;
pub use key::ClientKey;
pub use limiter::{LimiterConfig, SlidingWindowLimiter};
pub use sweeper::{spawn_sweeper, sweep_all};
pub use window::Window;
