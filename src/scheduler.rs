use std::future::Future;
use std::time::Duration;

use chrono::{Local, NaiveDateTime, NaiveTime, TimeDelta};
use tokio::time::sleep;

/// Daily local-time trigger hours, matching the original 7 AM / 3 PM /
/// 11 PM schedule.
pub const TRIGGER_HOURS: [u32; 3] = [7, 15, 23];

/// The next trigger instant strictly after `now`: the earliest of today's
/// remaining trigger hours, or the first hour tomorrow.
pub fn next_trigger(now: NaiveDateTime) -> NaiveDateTime {
    for hour in TRIGGER_HOURS {
        let candidate = now
            .date()
            .and_time(NaiveTime::from_hms_opt(hour, 0, 0).unwrap_or_default());
        if candidate > now {
            return candidate;
        }
    }
    let tomorrow = now.date() + TimeDelta::days(1);
    tomorrow.and_time(NaiveTime::from_hms_opt(TRIGGER_HOURS[0], 0, 0).unwrap_or_default())
}

/// Run `job` at each daily trigger, forever. The job's own error handling
/// is internal; the loop only sleeps and invokes.
pub async fn run_daily<F, Fut>(mut job: F)
where
    F: FnMut() -> Fut,
    Fut: Future<Output = ()>,
{
    loop {
        let now = Local::now().naive_local();
        let next = next_trigger(now);
        let wait = (next - now).to_std().unwrap_or(Duration::ZERO);
        tracing::info!(next = %next, "sleeping until next trigger");
        sleep(wait).await;
        job().await;
    }
}
