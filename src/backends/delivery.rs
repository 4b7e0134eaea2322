// Delivery of canonical messages to the host bridge
// Messages arriving while the bridge is away are buffered and flushed in arrival order.

use std::collections::VecDeque;
use std::sync::Arc;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

use crate::components::{CanonicalMessage, HostBridge, keys};

/// What happened to one message handed to the queue
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DeliveryOutcome {
    Delivered,
    Buffered,
    /// Flagged `no-cache` and the host could not take it
    Dropped,
}

#[derive(Debug, Default)]
struct QueueState {
    attached: bool,
    buffer: VecDeque<CanonicalMessage>,
}

/// FIFO hand-off to the host bridge.
///
/// Every bridge call happens under the queue lock, so a flush never interleaves with a
/// concurrent `deliver` and no message is skipped or sent twice. The bridge's own
/// `is_attached` decides each delivery. The buffer is unbounded. A bridge that re-enters
/// the queue from `deliver` deadlocks.
pub struct DeliveryQueue {
    state: Mutex<QueueState>,
    bridge: Arc<dyn HostBridge>,
}

impl DeliveryQueue {
    pub fn new(bridge: Arc<dyn HostBridge>) -> Self {
        let attached = bridge.is_attached();
        Self {
            state: Mutex::new(QueueState {
                attached,
                buffer: VecDeque::new(),
            }),
            bridge,
        }
    }

    /// Deliver now if the bridge reports attached, otherwise buffer. A refused delivery
    /// buffers only this message; the next call tries the bridge again.
    pub fn deliver(&self, message: CanonicalMessage) -> DeliveryOutcome {
        let mut state = self.state.lock();

        if self.bridge.is_attached() {
            if !state.attached {
                tracing::info!("Host bridge reports attached, resuming delivery");
                state.attached = true;
            }
            // Anything still buffered arrived first
            self.flush_locked(&mut state);
            if state.buffer.is_empty() {
                match self.bridge.deliver(&message.to_host_json()) {
                    Ok(()) => {
                        tracing::debug!(not_id = %message.not_id(), "Delivered to host");
                        return DeliveryOutcome::Delivered;
                    },
                    Err(e) => tracing::warn!(error = %e, "Host refused delivery, buffering"),
                }
            }
        } else {
            state.attached = false;
        }

        if message.flag(keys::NO_CACHE) {
            tracing::info!(not_id = %message.not_id(), "Host unavailable, discarding no-cache message");
            return DeliveryOutcome::Dropped;
        }

        state.buffer.push_back(message);
        tracing::debug!(buffered = state.buffer.len(), "Message buffered");
        DeliveryOutcome::Buffered
    }

    /// Mark the bridge attached and flush everything buffered. Returns the number of
    /// messages delivered.
    pub fn on_bridge_attached(&self) -> usize {
        let mut state = self.state.lock();
        state.attached = true;
        self.flush_locked(&mut state)
    }

    pub fn on_bridge_detached(&self) {
        self.state.lock().attached = false;
    }

    fn flush_locked(&self, state: &mut QueueState) -> usize {
        let mut flushed = 0;
        while let Some(message) = state.buffer.pop_front() {
            if let Err(e) = self.bridge.deliver(&message.to_host_json()) {
                tracing::warn!(error = %e, remaining = state.buffer.len() + 1, "Flush interrupted");
                state.buffer.push_front(message);
                break;
            }
            flushed += 1;
        }
        if flushed > 0 {
            tracing::info!(flushed, "Flushed buffered messages to host");
        }
        flushed
    }

    pub fn len(&self) -> usize {
        self.state.lock().buffer.len()
    }

    pub fn is_empty(&self) -> bool {
        self.state.lock().buffer.is_empty()
    }

    pub fn is_attached(&self) -> bool {
        self.state.lock().attached
    }

    /// Snapshot of buffered messages, oldest first
    pub fn pending(&self) -> Vec<CanonicalMessage> {
        self.state.lock().buffer.iter().cloned().collect()
    }
}
