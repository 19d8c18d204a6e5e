//! Cast lifecycle events and the synchronous observer list that fans them out.
//!
//! Observers only receive a shared reference to the event. Anything that wants
//! to act on the controller in response queues a command with the frame
//! scheduler instead of calling back in.
use std::collections::BTreeMap;

use crate::env::EffectSpec;
use crate::state::{ActorId, EffectHandle, SlotIndex, SubscriptionToken};

/// Events emitted by [`crate::AbilityCastController`].
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum CastEvent {
    /// The slot's ability was accepted for activation.
    SpellCast { slot: SlotIndex },
    /// The slot's cooldown effect was found and is now being watched.
    SpellGoneCooldown { slot: SlotIndex },
    /// The slot's cooldown finished and it is Ready again.
    SpellOffCooldown { slot: SlotIndex },
    EffectAppliedToSelf {
        source: Option<ActorId>,
        spec: EffectSpec,
        handle: EffectHandle,
    },
    EffectRemovedFromSelf { handle: EffectHandle },
}

impl CastEvent {
    /// Slot the event refers to, if it is a per-slot event.
    pub fn slot(&self) -> Option<SlotIndex> {
        match self {
            CastEvent::SpellCast { slot }
            | CastEvent::SpellGoneCooldown { slot }
            | CastEvent::SpellOffCooldown { slot } => Some(*slot),
            CastEvent::EffectAppliedToSelf { .. } | CastEvent::EffectRemovedFromSelf { .. } => None,
        }
    }
}

pub type Observer<E> = Box<dyn FnMut(&E) + Send>;

/// Ordered observer list. Observers run in subscription order.
pub struct Observers<E> {
    next_token: u64,
    entries: BTreeMap<SubscriptionToken, Observer<E>>,
}

impl<E> Observers<E> {
    pub fn new() -> Self {
        Self {
            next_token: 1,
            entries: BTreeMap::new(),
        }
    }

    pub fn subscribe(&mut self, observer: impl FnMut(&E) + Send + 'static) -> SubscriptionToken {
        let token = SubscriptionToken(self.next_token);
        self.next_token += 1;
        self.entries.insert(token, Box::new(observer));
        token
    }

    /// Removes an observer. Unknown tokens are ignored.
    pub fn unsubscribe(&mut self, token: SubscriptionToken) -> bool {
        self.entries.remove(&token).is_some()
    }

    pub fn broadcast(&mut self, event: &E) {
        for observer in self.entries.values_mut() {
            observer(event);
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

impl<E> Default for Observers<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E> std::fmt::Debug for Observers<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Observers")
            .field("count", &self.entries.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use super::*;

    #[test]
    fn observers_run_in_subscription_order() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let mut observers = Observers::<u32>::new();

        let first = Arc::clone(&seen);
        observers.subscribe(move |value| first.lock().unwrap().push(("first", *value)));
        let second = Arc::clone(&seen);
        observers.subscribe(move |value| second.lock().unwrap().push(("second", *value)));

        observers.broadcast(&7);

        assert_eq!(*seen.lock().unwrap(), vec![("first", 7), ("second", 7)]);
    }

    #[test]
    fn unsubscribe_is_idempotent() {
        let mut observers = Observers::<u32>::new();
        let token = observers.subscribe(|_| {});

        assert!(observers.unsubscribe(token));
        assert!(!observers.unsubscribe(token));
        assert!(observers.is_empty());
    }
}
