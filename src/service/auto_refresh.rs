//! Background refresh of the live event list.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{broadcast, watch};
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};

use super::{EventService, SettingsService};
use crate::domain::SessionEvent;

/// Spawns the auto-refresh loop.
///
/// - Every `period`, refetches the live list if the `auto_refresh` setting
///   is on.
/// - Refetches immediately on any notification that invalidates the live
///   list, regardless of the setting.
/// - Exits when `shutdown` flips to `true` (or its sender is dropped) or
///   the bus closes.
///
/// Overlapping refreshes are skipped by [`EventService::refresh`].
#[must_use]
pub fn spawn_auto_refresh(
    events: Arc<EventService>,
    settings: Arc<SettingsService>,
    mut bus_rx: broadcast::Receiver<SessionEvent>,
    period: Duration,
    mut shutdown: watch::Receiver<bool>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval_at(Instant::now() + period, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    if settings.get().await.auto_refresh {
                        refresh(&events, "interval").await;
                    }
                }
                event = bus_rx.recv() => {
                    match event {
                        Ok(event) if event.invalidates_live() => {
                            refresh(&events, event.kind_str()).await;
                        }
                        Ok(_) => {}
                        Err(broadcast::error::RecvError::Lagged(n)) => {
                            tracing::warn!(lagged = n, "auto-refresh lagged behind event bus");
                            refresh(&events, "lagged").await;
                        }
                        Err(broadcast::error::RecvError::Closed) => break,
                    }
                }
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        break;
                    }
                }
            }
        }

        tracing::debug!("auto-refresh stopped");
    })
}

async fn refresh(events: &EventService, trigger: &str) {
    match events.refresh().await {
        Ok(Some(count)) => tracing::debug!(trigger, count, "auto-refresh"),
        Ok(None) => {}
        Err(err) => tracing::warn!(trigger, error = %err, "auto-refresh failed"),
    }
}
