use std::sync::Arc;
use std::time::Duration;

use crate::error::TransportError;
use crate::models::{InboundEvent, Transport};

/// Infinite, non-restartable sequence of inbound events.
///
/// Each successful batch acknowledges everything it returned, so a restarted
/// process never sees the same event twice from the same poller.
pub struct UpdatePoller {
    transport: Arc<dyn Transport>,
    offset: Option<i64>,
    timeout: Duration,
}

impl UpdatePoller {
    pub fn new(transport: Arc<dyn Transport>, timeout: Duration) -> Self {
        Self {
            transport,
            offset: None,
            timeout,
        }
    }

    /// Wait for the next batch of events. An empty batch means the long poll
    /// timed out with nothing new.
    pub async fn next_batch(&mut self) -> Result<Vec<InboundEvent>, TransportError> {
        let batch = self.transport.poll_events(self.offset, self.timeout).await?;
        if let Some(next) = batch.next_offset {
            self.offset = Some(self.offset.map_or(next, |current| current.max(next)));
        }
        Ok(batch.events)
    }

    pub fn offset(&self) -> Option<i64> {
        self.offset
    }
}
