use crate::battle::tracker::BattleTracker;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tokio::time::{interval, Duration, MissedTickBehavior};
use tracing::debug;

pub const DEFAULT_SWEEP_PERIOD: Duration = Duration::from_secs(1);

/// Run [`BattleTracker::sweep`] on a fixed period until the task is aborted.
/// Must be called from within a tokio runtime.
pub fn spawn_sweeper(tracker: Arc<BattleTracker>, period: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = interval(period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            ticker.tick().await;
            let removed = tracker.sweep();
            if removed > 0 {
                debug!("Sweeper tick removed {} battle(s), {} active", removed, tracker.len());
            }
        }
    })
}
