// src/ingest/scheduler.rs
use std::future::Future;

use chrono::{Duration as ChronoDuration, NaiveDateTime, NaiveTime, Utc};
use tokio::task::JoinHandle;
use tracing::info;

/// Seconds from `now` until the next wall-clock occurrence of `at`.
fn secs_until(now: NaiveDateTime, at: NaiveTime) -> u64 {
    let mut next = now.date().and_time(at);
    if next <= now {
        next += ChronoDuration::days(1);
    }
    (next - now).num_seconds().max(1) as u64
}

/// Spawn the daily trigger: sleep until `at` in the target timezone (UTC
/// shifted by `offset_hours`), run the job, repeat. The job closure is the
/// same pipeline entry point the on-demand command uses.
pub fn spawn_daily<F, Fut>(at: NaiveTime, offset_hours: i64, job: F) -> JoinHandle<()>
where
    F: Fn() -> Fut + Send + 'static,
    Fut: Future<Output = ()> + Send,
{
    tokio::spawn(async move {
        loop {
            let now = (Utc::now() + ChronoDuration::hours(offset_hours)).naive_utc();
            let wait = secs_until(now, at);
            info!(seconds = wait, "next daily digest scheduled");
            tokio::time::sleep(std::time::Duration::from_secs(wait)).await;
            job().await;
        }
    })
}
