//! beacon-sweeper: background liveness enforcement for the registry.
//!
//! The sweeper is a single long-lived task with one resting state:
//!
//! ```text
//!        tick (every interval)
//!   waiting ──────────────────▶ sweeping
//!      ▲                           │
//!      └───────────────────────────┘
//!        sweep_expired(now, liveness_timeout)
//!        [evict_unhealthy(now, evict_after)]
//! ```
//!
//! It talks to the store only through its public operations. A sweep
//! cannot fail for the in-process store; if a tick is missed (the task
//! was descheduled), the next tick catches up, since expiry depends only
//! on `now` and each record's `last_seen`.

pub mod sweeper;

pub use sweeper::{HeartbeatSweeper, SweepReport, SweeperConfig};
