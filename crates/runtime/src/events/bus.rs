//! Topic-based event bus implementation.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::broadcast;

use super::types::{AttributeChanged, CastNotice, TargetingEvent, TaskFinished};

/// Topics for event routing
#[derive(Debug, Clone, Copy, Hash, Eq, PartialEq, Serialize, Deserialize, strum::EnumIter)]
pub enum Topic {
    /// Spell slot lifecycle and effects on the caster
    Cast,
    /// Target data and targeting cancellation
    Targeting,
    /// Ability task completion
    Task,
    /// Attribute writes (health, mana, ...)
    Attributes,
}

/// Event wrapper that carries the topic and typed event
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Event {
    Cast(CastNotice),
    Targeting(TargetingEvent),
    Task(TaskFinished),
    Attributes(AttributeChanged),
}

impl Event {
    pub fn topic(&self) -> Topic {
        match self {
            Event::Cast(_) => Topic::Cast,
            Event::Targeting(_) => Topic::Targeting,
            Event::Task(_) => Topic::Task,
            Event::Attributes(_) => Topic::Attributes,
        }
    }
}

struct Channels {
    cast: broadcast::Sender<Event>,
    targeting: broadcast::Sender<Event>,
    task: broadcast::Sender<Event>,
    attributes: broadcast::Sender<Event>,
}

impl Channels {
    fn sender(&self, topic: Topic) -> &broadcast::Sender<Event> {
        match topic {
            Topic::Cast => &self.cast,
            Topic::Targeting => &self.targeting,
            Topic::Task => &self.task,
            Topic::Attributes => &self.attributes,
        }
    }
}

/// Topic-based event bus
///
/// Allows consumers to subscribe to specific topics and only receive
/// events they care about. Every topic has its channel from construction
/// on, so publishing and subscribing never contend on a lock.
pub struct EventBus {
    channels: Arc<Channels>,
}

impl EventBus {
    /// Creates a new event bus with default capacity for each topic
    pub fn new() -> Self {
        Self::with_capacity(100)
    }

    /// Creates a new event bus with specified capacity per topic
    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            channels: Arc::new(Channels {
                cast: broadcast::channel(capacity).0,
                targeting: broadcast::channel(capacity).0,
                task: broadcast::channel(capacity).0,
                attributes: broadcast::channel(capacity).0,
            }),
        }
    }

    /// Publish an event to its corresponding topic
    ///
    /// Best-effort: events published while nobody listens are dropped.
    pub fn publish(&self, event: Event) {
        let topic = event.topic();
        if self.channels.sender(topic).send(event).is_err() {
            // No subscribers for this topic - this is normal, not an error
            tracing::trace!("No subscribers for topic {:?}", topic);
        }
    }

    /// Subscribe to a specific topic
    ///
    /// Returns a receiver that will only receive events for that topic.
    pub fn subscribe(&self, topic: Topic) -> broadcast::Receiver<Event> {
        self.channels.sender(topic).subscribe()
    }

    /// Subscribe to multiple topics
    ///
    /// Returns receivers for each requested topic.
    pub fn subscribe_multiple(
        &self,
        topics: &[Topic],
    ) -> HashMap<Topic, broadcast::Receiver<Event>> {
        topics
            .iter()
            .map(|&topic| (topic, self.subscribe(topic)))
            .collect()
    }

    pub fn subscriber_count(&self, topic: Topic) -> usize {
        self.channels.sender(topic).receiver_count()
    }
}

impl Clone for EventBus {
    fn clone(&self) -> Self {
        Self {
            channels: Arc::clone(&self.channels),
        }
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for EventBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventBus").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use cast_core::{ActorId, Attribute, CastEvent};

    use super::*;

    fn cast_event(slot: usize) -> Event {
        Event::Cast(CastNotice {
            actor: ActorId(1),
            event: CastEvent::SpellCast { slot },
        })
    }

    #[test]
    fn subscribers_only_see_their_topic() {
        let bus = EventBus::new();
        let mut cast_rx = bus.subscribe(Topic::Cast);
        let mut attr_rx = bus.subscribe(Topic::Attributes);

        bus.publish(cast_event(0));

        assert_eq!(cast_rx.try_recv().unwrap(), cast_event(0));
        assert!(attr_rx.try_recv().is_err());
    }

    #[test]
    fn publishing_without_subscribers_is_silent() {
        let bus = EventBus::with_capacity(4);
        bus.publish(Event::Attributes(AttributeChanged {
            actor: ActorId(2),
            attribute: Attribute::Mana,
            value: 10.0,
        }));
        assert_eq!(bus.subscriber_count(Topic::Attributes), 0);
    }

    #[tokio::test]
    async fn clones_share_channels() {
        let bus = EventBus::new();
        let mut receivers = bus.subscribe_multiple(&[Topic::Cast, Topic::Task]);
        bus.clone().publish(cast_event(3));

        let rx = receivers.get_mut(&Topic::Cast).unwrap();
        assert_eq!(rx.recv().await.unwrap(), cast_event(3));
    }
}
