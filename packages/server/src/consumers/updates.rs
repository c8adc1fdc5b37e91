use std::sync::Arc;
use std::time::Duration;

use common::retry::FailureBackoff;
use tokio::sync::Semaphore;
use tracing::{error, info, warn};
use transport::{Transport, UpdatePoller};

use super::EventDispatcher;

const POLL_BACKOFF_BASE_MS: u64 = 1_000;
const POLL_BACKOFF_MAX_MS: u64 = 60_000;

/// Long-poll the transport and dispatch each event to a worker task.
///
/// At most `concurrency` events are in flight; polling pauses while all
/// permits are taken. Runs until the task is dropped.
pub async fn consume_updates(
    transport: Arc<dyn Transport>,
    dispatcher: EventDispatcher,
    poll_timeout: Duration,
    concurrency: usize,
) {
    info!(concurrency, "Starting update consumer");

    // A registered webhook makes getUpdates fail with 409.
    if let Err(e) = transport.delete_webhook().await {
        warn!(error = %e, "Failed to delete webhook before polling");
    }

    let permits = Arc::new(Semaphore::new(concurrency.max(1)));
    let mut poller = UpdatePoller::new(transport, poll_timeout);
    let mut backoff = FailureBackoff::new(POLL_BACKOFF_BASE_MS, POLL_BACKOFF_MAX_MS);

    loop {
        let events = match poller.next_batch().await {
            Ok(events) => {
                backoff.reset();
                events
            }
            Err(e) => {
                let delay = backoff.record_failure();
                warn!(
                    error = %e,
                    failures = backoff.consecutive_failures(),
                    delay_ms = delay.as_millis() as u64,
                    "Polling failed, backing off"
                );
                tokio::time::sleep(delay).await;
                continue;
            }
        };

        for event in events {
            let permit = match permits.clone().acquire_owned().await {
                Ok(permit) => permit,
                Err(_) => {
                    error!("Worker semaphore closed, stopping update consumer");
                    return;
                }
            };
            let dispatcher = dispatcher.clone();
            tokio::spawn(async move {
                let _ = dispatcher.dispatch_guarded(event).await;
                drop(permit);
            });
        }
    }
}
