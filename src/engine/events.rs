use crossbeam_channel::{unbounded, Receiver, Sender};
use log::warn;
use serde::{Deserialize, Serialize};
use std::sync::Mutex;

/// Notifications raised by the frame processor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PipelineEvent {
    /// Visualization buffer and clipped depth are current for this frame
    FrameDone { sequence_id: u64 },
    /// Background mask finished learning
    MaskReady,
}

/// Fan-out of pipeline events to any number of subscribers
pub struct EventBus {
    subscribers: Mutex<Vec<Sender<PipelineEvent>>>,
}

impl EventBus {
    pub fn new() -> Self {
        Self {
            subscribers: Mutex::new(Vec::new()),
        }
    }

    pub fn subscribe(&self) -> Receiver<PipelineEvent> {
        let (tx, rx) = unbounded();
        self.subscribers
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(tx);
        rx
    }

    /// Deliver to every live subscriber, dropping the ones whose receiver is gone
    pub fn publish(&self, event: PipelineEvent) {
        let mut subscribers = self
            .subscribers
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());

        let before = subscribers.len();
        subscribers.retain(|tx| tx.send(event).is_ok());
        if subscribers.len() < before {
            warn!(
                "Dropped {} disconnected event subscriber(s)",
                before - subscribers.len()
            );
        }
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .len()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_subscriber_receives() {
        let bus = EventBus::new();
        let a = bus.subscribe();
        let b = bus.subscribe();

        bus.publish(PipelineEvent::MaskReady);

        assert_eq!(a.try_recv(), Ok(PipelineEvent::MaskReady));
        assert_eq!(b.try_recv(), Ok(PipelineEvent::MaskReady));
    }

    #[test]
    fn test_disconnected_subscriber_removed() {
        let bus = EventBus::new();
        let kept = bus.subscribe();
        drop(bus.subscribe());
        assert_eq!(bus.subscriber_count(), 2);

        bus.publish(PipelineEvent::FrameDone { sequence_id: 1 });

        assert_eq!(bus.subscriber_count(), 1);
        assert_eq!(kept.try_recv(), Ok(PipelineEvent::FrameDone { sequence_id: 1 }));
    }
}
