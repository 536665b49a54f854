//! Timer loop for scheduled reminders.

use chrono::{Local, NaiveDateTime};
use std::time::Duration;
use tracing::{debug, info};

use crate::core::error::Result;
use crate::core::reminders::{deliver, Notifier, ReminderBook};
use crate::core::storage::KeyValueStore;

#[derive(Debug, Clone)]
pub struct WatchOptions {
    /// Return once no reminders are left instead of polling.
    pub stop_when_idle: bool,
    pub max_deliveries: Option<usize>,
    /// Upper bound on a single sleep, so reminders added by another
    /// process are picked up.
    pub poll_interval: Duration,
}

impl Default for WatchOptions {
    fn default() -> Self {
        Self {
            stop_when_idle: false,
            max_deliveries: None,
            poll_interval: Duration::from_secs(60),
        }
    }
}

/// Fires every reminder due at `now`. Returns how many were shown.
pub fn run_due<S, N>(store: &mut S, notifier: &N, now: NaiveDateTime) -> Result<usize>
where
    S: KeyValueStore,
    N: Notifier + ?Sized,
{
    let due = ReminderBook::new(store).take_due(now)?;
    let mut shown = 0;
    for reminder in &due {
        if deliver(notifier, &reminder.notification())? {
            shown += 1;
        }
        info!(id = %reminder.id, kind = %reminder.kind, daily = reminder.daily, "reminder fired");
    }
    Ok(shown)
}

/// Runs until stopped by `options`, using the local wall clock.
pub async fn watch<S, N>(store: &mut S, notifier: &N, options: WatchOptions) -> Result<usize>
where
    S: KeyValueStore,
    N: Notifier + ?Sized,
{
    watch_with(store, notifier, options, || Local::now().naive_local()).await
}

pub async fn watch_with<S, N, C>(store: &mut S, notifier: &N, options: WatchOptions, clock: C) -> Result<usize>
where
    S: KeyValueStore,
    N: Notifier + ?Sized,
    C: Fn() -> NaiveDateTime,
{
    let mut delivered = 0;

    loop {
        let now = clock();
        store.reload()?;
        delivered += run_due(store, notifier, now)?;

        if options.max_deliveries.is_some_and(|max| delivered >= max) {
            break;
        }

        let wait = match ReminderBook::new(store).next_pending() {
            Some(next) => (next.scheduled_for - now)
                .to_std()
                .unwrap_or(Duration::ZERO)
                .min(options.poll_interval),
            None if options.stop_when_idle => break,
            None => options.poll_interval,
        };

        debug!(wait_secs = wait.as_secs(), "waiting for next reminder");
        tokio::time::sleep(wait).await;
    }

    Ok(delivered)
}
