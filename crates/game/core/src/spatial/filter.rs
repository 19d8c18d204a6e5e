use std::fmt;
use std::sync::Arc;

use crate::state::ActorId;

type Predicate = Arc<dyn Fn(ActorId) -> bool + Send + Sync>;

/// Caller-side filter applied after deduplication.
#[derive(Clone, Default)]
pub struct TargetFilter {
    excluded: Vec<ActorId>,
    predicate: Option<Predicate>,
}

impl TargetFilter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rejects `actor`, typically the requester itself.
    pub fn excluding(mut self, actor: ActorId) -> Self {
        if !self.excluded.contains(&actor) {
            self.excluded.push(actor);
        }
        self
    }

    pub fn with_predicate(mut self, predicate: impl Fn(ActorId) -> bool + Send + Sync + 'static) -> Self {
        self.predicate = Some(Arc::new(predicate));
        self
    }

    pub fn accepts(&self, actor: ActorId) -> bool {
        if self.excluded.contains(&actor) {
            return false;
        }
        self.predicate.as_ref().is_none_or(|predicate| predicate(actor))
    }
}

impl fmt::Debug for TargetFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TargetFilter")
            .field("excluded", &self.excluded)
            .field("predicate", &self.predicate.is_some())
            .finish()
    }
}
