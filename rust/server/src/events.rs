use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, PoisonError, RwLock};
use tokio::sync::mpsc;
use twentyone_engine::session::SessionId;

// Bounded channels: a subscriber that falls this far behind is dropped
pub const DEFAULT_EVENT_BUFFER: usize = 1000;

pub type EventSender = mpsc::Sender<GameEvent>;
pub type EventReceiver = mpsc::Receiver<GameEvent>;

/// Channel an event is published on.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "topic", content = "session_id", rename_all = "snake_case")]
pub enum Topic {
    /// Everyone browsing the session list.
    Lobby,
    /// Participants of one session.
    Session(SessionId),
}

/// Opaque change signals. Subscribers re-fetch whatever view they need.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum GameEvent {
    SessionChanged { session_id: SessionId },
    SessionListChanged,
}

impl GameEvent {
    pub fn topic(&self) -> Topic {
        match self {
            GameEvent::SessionChanged { session_id } => Topic::Session(session_id.clone()),
            GameEvent::SessionListChanged => Topic::Lobby,
        }
    }
}

pub struct EventSubscription {
    bus: EventBus,
    topic: Topic,
    subscriber_id: usize,
    pub receiver: EventReceiver,
}

impl EventSubscription {
    pub fn receiver(&mut self) -> &mut EventReceiver {
        &mut self.receiver
    }

    pub fn topic(&self) -> &Topic {
        &self.topic
    }
}

impl Drop for EventSubscription {
    fn drop(&mut self) {
        self.bus.unsubscribe(&self.topic, self.subscriber_id);
    }
}

#[derive(Debug, Clone)]
pub struct EventBus {
    inner: Arc<EventBusInner>,
}

#[derive(Debug)]
struct EventBusInner {
    subscribers: RwLock<HashMap<Topic, Vec<(usize, EventSender)>>>,
    next_id: AtomicUsize,
    buffer: usize,
}

impl Default for EventBus {
    fn default() -> Self {
        Self::with_buffer(DEFAULT_EVENT_BUFFER)
    }
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_buffer(buffer: usize) -> Self {
        Self {
            inner: Arc::new(EventBusInner {
                subscribers: RwLock::new(HashMap::new()),
                next_id: AtomicUsize::new(0),
                buffer: buffer.max(1),
            }),
        }
    }

    pub fn subscribe(&self, topic: Topic) -> EventSubscription {
        let (subscriber_id, receiver) = self.subscribe_raw(topic.clone());
        EventSubscription {
            bus: self.clone(),
            topic,
            subscriber_id,
            receiver,
        }
    }

    fn subscribe_raw(&self, topic: Topic) -> (usize, EventReceiver) {
        let (tx, rx) = mpsc::channel(self.inner.buffer);
        let id = self.inner.next_id.fetch_add(1, Ordering::AcqRel);
        let mut guard = self
            .inner
            .subscribers
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        guard.entry(topic.clone()).or_default().push((id, tx));

        tracing::info!(topic = ?topic, subscriber_id = id, "client subscribed to events");

        (id, rx)
    }

    /// Deliver an event to every subscriber of its topic without blocking.
    pub fn publish(&self, event: GameEvent) {
        let topic = event.topic();
        tracing::debug!(topic = ?topic, event_type = ?event, "broadcasting event");

        let subscribers = {
            let guard = self
                .inner
                .subscribers
                .read()
                .unwrap_or_else(PoisonError::into_inner);
            guard.get(&topic).cloned()
        };

        let Some(list) = subscribers else {
            tracing::trace!(topic = ?topic, "no subscribers for topic");
            return;
        };

        let mut failed = Vec::new();
        for (id, sender) in list {
            if let Err(e) = sender.try_send(event.clone()) {
                tracing::warn!(
                    topic = ?topic,
                    subscriber_id = id,
                    error = ?e,
                    "failed to send event to subscriber"
                );
                failed.push(id);
            }
        }
        if !failed.is_empty() {
            self.remove_subscribers(&topic, &failed);
        }
    }

    pub fn unsubscribe(&self, topic: &Topic, subscriber_id: usize) {
        self.remove_subscribers(topic, &[subscriber_id]);
    }

    /// Forget every subscriber of a topic, closing their channels.
    pub fn drop_topic(&self, topic: &Topic) {
        let mut guard = self
            .inner
            .subscribers
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        guard.remove(topic);
    }

    pub fn subscriber_count(&self) -> usize {
        let guard = self
            .inner
            .subscribers
            .read()
            .unwrap_or_else(PoisonError::into_inner);
        guard.values().map(|list| list.len()).sum()
    }

    fn remove_subscribers(&self, topic: &Topic, ids: &[usize]) {
        let mut guard = self
            .inner
            .subscribers
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        if let Some(list) = guard.get_mut(topic) {
            list.retain(|(id, _)| !ids.contains(id));
            if list.is_empty() {
                guard.remove(topic);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn changed(id: &str) -> GameEvent {
        GameEvent::SessionChanged {
            session_id: id.to_string(),
        }
    }

    #[test]
    fn subscription_drop_unsubscribes() {
        let bus = EventBus::new();
        {
            let _sub = bus.subscribe(Topic::Session("s".into()));
            assert_eq!(bus.subscriber_count(), 1);
        }
        assert_eq!(bus.subscriber_count(), 0);
    }

    #[test]
    fn publish_reaches_all_subscribers_of_the_topic() {
        let bus = EventBus::new();
        let mut sub1 = bus.subscribe(Topic::Session("s".into()));
        let mut sub2 = bus.subscribe(Topic::Session("s".into()));
        let mut other = bus.subscribe(Topic::Session("t".into()));
        let mut lobby = bus.subscribe(Topic::Lobby);

        bus.publish(changed("s"));

        assert_eq!(sub1.receiver.try_recv().expect("sub1 event"), changed("s"));
        assert_eq!(sub2.receiver.try_recv().expect("sub2 event"), changed("s"));
        assert!(other.receiver.try_recv().is_err());
        assert!(lobby.receiver.try_recv().is_err());

        bus.publish(GameEvent::SessionListChanged);
        assert_eq!(
            lobby.receiver.try_recv().expect("lobby event"),
            GameEvent::SessionListChanged
        );
    }

    #[test]
    fn stale_receiver_is_pruned() {
        let bus = EventBus::new();
        let topic = Topic::Session("s".into());
        let (id, rx) = bus.subscribe_raw(topic.clone());
        drop(rx);
        bus.publish(changed("s"));
        assert_eq!(bus.subscriber_count(), 0);
        bus.unsubscribe(&topic, id);
    }

    #[test]
    fn full_channel_drops_the_slow_subscriber() {
        let bus = EventBus::with_buffer(2);
        let mut slow = bus.subscribe(Topic::Lobby);
        for _ in 0..3 {
            bus.publish(GameEvent::SessionListChanged);
        }
        assert_eq!(bus.subscriber_count(), 0);
        assert!(slow.receiver.try_recv().is_ok());
    }

    #[test]
    fn events_serialize_as_tagged_json() {
        let json = serde_json::to_value(changed("abc")).expect("serialize");
        assert_eq!(json["type"], "session_changed");
        assert_eq!(json["session_id"], "abc");

        let json = serde_json::to_value(GameEvent::SessionListChanged).expect("serialize");
        assert_eq!(json["type"], "session_list_changed");
    }
}
