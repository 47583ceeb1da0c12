//! Periodic reclaim of expired state.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::debug;

/// Anything holding entries that can go stale.
pub trait Sweepable: Send + Sync + 'static {
    /// Removes every expired entry and returns how many were removed.
    fn sweep_expired(&self) -> usize;
}

/// Spawns a task that calls [`Sweepable::sweep_expired`] every `every`,
/// independent of request traffic. The first sweep runs one full interval after start.
///
/// Abort the returned handle to stop sweeping.
pub fn spawn_sweeper(target: Arc<dyn Sweepable>, every: Duration, label: &'static str) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = interval_at(Instant::now() + every, every);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            ticker.tick().await;
            let removed = target.sweep_expired();
            debug!(target_name = label, removed, "Sweep finished");
        }
    })
}
