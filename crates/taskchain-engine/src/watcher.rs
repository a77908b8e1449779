/*
[INPUT]:  Live event batches and historical logs from the event source
[OUTPUT]: Notice/log transitions plus debounced task reloads
[POS]:    Event watcher - subscription lifecycle and reload coalescing
[UPDATE]: When event templates, debounce policy, or teardown rules change
*/

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use taskchain_adapter::{
    Address,
    EventSource,
    EventSubscription,
    RawEvent,
    Result,
    TaskEvent,
    TxHash,
};

use crate::store::{Action, Store};
use crate::sync::ReadSynchronizer;

/// Quiet period after the last event batch before a single reload fires
pub const RELOAD_DEBOUNCE: Duration = Duration::from_millis(300);

struct WatchGuard {
    token: CancellationToken,
    handle: JoinHandle<()>,
}

/// Maintains the live contract event subscription.
///
/// Each decoded event produces one notice and one log entry; every batch
/// (re)arms the debounce timer so a burst coalesces into one reload.
pub struct EventWatcher {
    store: Store,
    sync: Arc<ReadSynchronizer>,
    events: Arc<dyn EventSource>,
    active: Mutex<Option<WatchGuard>>,
}

impl EventWatcher {
    pub fn new(store: Store, sync: Arc<ReadSynchronizer>, events: Arc<dyn EventSource>) -> Self {
        Self {
            store,
            sync,
            events,
            active: Mutex::new(None),
        }
    }

    /// Subscribe to task lifecycle events for `contract`.
    ///
    /// Any previous subscription and its pending debounce timer are torn
    /// down before the new one is established, so a stale subscription can
    /// never emit notices or fire a dangling reload. The timer re-arms only
    /// for batches that decode at least one event; an all-malformed batch
    /// schedules no reload.
    pub async fn watch(&self, contract: &Address) -> Result<()> {
        self.unwatch().await;

        let (subscription, rx) = self.events.subscribe(contract).await?;
        let token = CancellationToken::new();
        let handle = tokio::spawn(run_subscription(
            self.store.clone(),
            self.sync.clone(),
            subscription,
            rx,
            token.clone(),
        ));

        *self.active.lock().await = Some(WatchGuard { token, handle });
        debug!(contract = %contract, "event subscription established");
        Ok(())
    }

    /// Cancel the active subscription; returns after teardown completes.
    pub async fn unwatch(&self) {
        let guard = self.active.lock().await.take();
        if let Some(guard) = guard {
            guard.token.cancel();
            let _ = guard.handle.await;
            debug!("event subscription torn down");
        }
    }

    /// Replay historical contract events into the activity log.
    ///
    /// Backfill is best-effort: fetch or per-entry decode failures are
    /// warned and skipped, and no notices or reloads are produced.
    pub async fn backfill(&self, contract: &Address) {
        let history = match self.events.fetch_past(contract).await {
            Ok(history) => history,
            Err(err) => {
                warn!(error = %err, "failed to fetch historical events");
                return;
            }
        };
        for raw in &history {
            match TaskEvent::decode(raw) {
                Ok(event) => {
                    self.store
                        .dispatch(Action::Log {
                            text: event_text(&event),
                            hash: raw.transaction_hash,
                        })
                        .await;
                }
                Err(err) => {
                    warn!(event_name = %raw.event_name, error = %err, "skipping undecodable historical event");
                }
            }
        }
    }
}

async fn run_subscription(
    store: Store,
    sync: Arc<ReadSynchronizer>,
    subscription: EventSubscription,
    mut rx: mpsc::Receiver<Vec<RawEvent>>,
    token: CancellationToken,
) {
    // Held for the task's lifetime; dropping it unsubscribes.
    let _subscription = subscription;
    let mut debounce: Option<ReloadTimer> = None;

    loop {
        tokio::select! {
            _ = token.cancelled() => break,
            batch = rx.recv() => {
                let Some(batch) = batch else { break };
                let mut decoded_any = false;
                for raw in &batch {
                    match TaskEvent::decode(raw) {
                        Ok(event) => {
                            apply_event(&store, &event, raw.transaction_hash).await;
                            decoded_any = true;
                        }
                        Err(err) => {
                            warn!(event_name = %raw.event_name, error = %err, "skipping undecodable event");
                        }
                    }
                }
                if decoded_any {
                    rearm_debounce(&mut debounce, sync.clone());
                }
            }
        }
    }

    if let Some(pending) = debounce.take() {
        pending.token.cancel();
        // If the timer already fired, the reload settles its loading flag
        // before teardown completes.
        let _ = pending.handle.await;
    }
}

struct ReloadTimer {
    token: CancellationToken,
    handle: JoinHandle<()>,
}

/// Cancel-then-reschedule. Cancellation only reaches the sleeping phase:
/// once the quiet period elapses the reload runs to completion and clears
/// the loading flag itself. A superseded reload already past its sleep is
/// resolved by the synchronizer's sequence stamp, never by aborting it.
fn rearm_debounce(debounce: &mut Option<ReloadTimer>, sync: Arc<ReadSynchronizer>) {
    if let Some(pending) = debounce.take() {
        pending.token.cancel();
    }
    let token = CancellationToken::new();
    let timer_token = token.clone();
    let handle = tokio::spawn(async move {
        tokio::select! {
            _ = timer_token.cancelled() => {}
            _ = tokio::time::sleep(RELOAD_DEBOUNCE) => sync.load_tasks().await,
        }
    });
    *debounce = Some(ReloadTimer { token, handle });
}

async fn apply_event(store: &Store, event: &TaskEvent, hash: Option<TxHash>) {
    let text = event_text(event);
    store.dispatch(Action::Notice(text.clone())).await;
    store.dispatch(Action::Log { text, hash }).await;
}

fn event_text(event: &TaskEvent) -> String {
    match event {
        TaskEvent::Created { id, description } => {
            format!("Task #{id} created: {description}")
        }
        TaskEvent::Updated {
            id,
            description: Some(description),
        } => format!("Task #{id} updated -> {description}"),
        TaskEvent::Updated {
            id,
            description: None,
        } => format!("Task #{id} updated"),
        TaskEvent::Completed { id } => format!("Task #{id} completed"),
    }
}
