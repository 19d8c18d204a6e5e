//! Cloneable façade for issuing commands to the runtime.
//!
//! [`RuntimeHandle`] hides channel plumbing and offers async helpers for
//! driving heroes, stepping frames, or streaming events from specific topics.
use std::collections::HashMap;

use cast_content::HeroTemplate;
use cast_core::{
    AbilityHandle, AbilityTask, ActorId, AsyncTaskHandle, EffectHandle, EffectSpec, SlotIndex,
    TargetResult, TargetingStrategy, TaskStatus,
};
use glam::Vec3;
use tokio::sync::{broadcast, mpsc, oneshot};

use super::errors::{Result, RuntimeError};
use crate::backend::SimActor;
use crate::events::{Event, EventBus, Topic};
use crate::scheduler::{HeroSnapshot, RequestSender};
use crate::workers::Command;

/// Client-facing handle to interact with the runtime
#[derive(Clone)]
pub struct RuntimeHandle {
    command_tx: mpsc::Sender<Command>,
    event_bus: EventBus,
    requests: RequestSender,
}

impl RuntimeHandle {
    pub(crate) fn new(
        command_tx: mpsc::Sender<Command>,
        event_bus: EventBus,
        requests: RequestSender,
    ) -> Self {
        Self {
            command_tx,
            event_bus,
            requests,
        }
    }

    async fn request<T>(&self, command: impl FnOnce(oneshot::Sender<T>) -> Command) -> Result<T> {
        let (reply_tx, reply_rx) = oneshot::channel();

        self.command_tx
            .send(command(reply_tx))
            .await
            .map_err(|_| RuntimeError::CommandChannelClosed)?;

        reply_rx.await.map_err(RuntimeError::ReplyChannelClosed)
    }

    /// Spawns an authoritative hero at `location`.
    pub async fn spawn_hero(&self, template: HeroTemplate, location: Vec3) -> Result<ActorId> {
        self.request(|reply| Command::SpawnHero {
            template,
            location,
            reply,
        })
        .await?
    }

    /// Spawns a plain actor (target dummy, obstacle).
    pub async fn spawn_actor(&self, actor: SimActor) -> Result<ActorId> {
        self.request(|reply| Command::SpawnActor { actor, reply })
            .await
    }

    pub async fn destroy_actor(&self, actor: ActorId) -> Result<bool> {
        self.request(|reply| Command::DestroyActor { actor, reply })
            .await
    }

    pub async fn select_hero(&self, actor: ActorId) -> Result<bool> {
        self.request(|reply| Command::SelectHero { actor, reply })
            .await
    }

    pub async fn set_character_level(&self, actor: ActorId, level: u32) -> Result<bool> {
        self.request(|reply| Command::SetCharacterLevel {
            actor,
            level,
            reply,
        })
        .await?
    }

    /// Points the actor's aim ray. `None` aims along its facing.
    pub async fn set_aim(&self, actor: ActorId, direction: Option<Vec3>) -> Result<bool> {
        self.request(|reply| Command::SetAim {
            actor,
            direction,
            reply,
        })
        .await
    }

    /// Activates the ability in `slot`.
    pub async fn activate(&self, actor: ActorId, slot: SlotIndex) -> Result<()> {
        self.request(|reply| Command::Activate { actor, slot, reply })
            .await?
    }

    pub async fn activate_weapon(&self, actor: ActorId) -> Result<bool> {
        self.request(|reply| Command::ActivateWeapon { actor, reply })
            .await?
    }

    pub async fn apply_effect(
        &self,
        target: ActorId,
        source: Option<ActorId>,
        spec: EffectSpec,
    ) -> Result<EffectHandle> {
        self.request(|reply| Command::ApplyEffect {
            target,
            source,
            spec,
            reply,
        })
        .await?
    }

    /// Starts a targeting strategy for `actor`. `ability`, when given, ties
    /// the targeting to that ability's lifetime.
    pub async fn start_targeting(
        &self,
        actor: ActorId,
        strategy: Box<dyn TargetingStrategy>,
        ability: Option<AbilityHandle>,
    ) -> Result<TaskStatus> {
        self.request(|reply| Command::StartTargeting {
            actor,
            strategy,
            ability,
            reply,
        })
        .await?
    }

    pub async fn confirm_targeting(&self, actor: ActorId) -> Result<Option<TargetResult>> {
        self.request(|reply| Command::ConfirmTargeting { actor, reply })
            .await?
    }

    pub async fn cancel_targeting(&self, actor: ActorId) -> Result<bool> {
        self.request(|reply| Command::CancelTargeting { actor, reply })
            .await
    }

    pub async fn spawn_task(
        &self,
        owner: AbilityHandle,
        task: Box<dyn AbilityTask>,
    ) -> Result<AsyncTaskHandle> {
        self.request(|reply| Command::SpawnTask { owner, task, reply })
            .await
    }

    pub async fn cancel_task(&self, handle: AsyncTaskHandle) -> Result<bool> {
        self.request(|reply| Command::CancelTask { handle, reply })
            .await
    }

    /// Runs `frames` frames right away.
    pub async fn step(&self, frames: u32) -> Result<()> {
        self.request(|reply| Command::Step { frames, reply })
            .await?
    }

    pub async fn query_hero(&self, actor: ActorId) -> Result<Option<HeroSnapshot>> {
        self.request(|reply| Command::QueryHero { actor, reply })
            .await
    }

    pub async fn query_heroes(&self) -> Result<Vec<HeroSnapshot>> {
        self.request(|reply| Command::QueryHeroes { reply }).await
    }

    /// Returns the frame counter and the simulated seconds.
    pub async fn query_clock(&self) -> Result<(u64, f32)> {
        self.request(|reply| Command::QueryClock { reply }).await
    }

    /// Asks the frame worker to stop after the current command.
    pub(crate) async fn request_shutdown(&self) -> Result<()> {
        self.command_tx
            .send(Command::Shutdown)
            .await
            .map_err(|_| RuntimeError::CommandChannelClosed)
    }

    /// Subscribe to events from a specific topic
    ///
    /// # Topics
    ///
    /// - `Topic::Cast` - Slot lifecycle events of every hero
    /// - `Topic::Targeting` - Target data and cancelled targeting
    /// - `Topic::Task` - Ability task outcomes
    /// - `Topic::Attributes` - Attribute changes
    ///
    /// # Example
    ///
    /// ```rust,ignore
    /// use cast_runtime::Topic;
    ///
    /// let mut cast_rx = handle.subscribe(Topic::Cast);
    /// while let Ok(event) = cast_rx.recv().await {
    ///     // Update the HUD
    /// }
    /// ```
    pub fn subscribe(&self, topic: Topic) -> broadcast::Receiver<Event> {
        self.event_bus.subscribe(topic)
    }

    /// Subscribe to multiple topics at once
    pub fn subscribe_multiple(&self, topics: &[Topic]) -> HashMap<Topic, broadcast::Receiver<Event>> {
        self.event_bus.subscribe_multiple(topics)
    }

    /// Sender for requests applied inside the frame, between scheduler
    /// phases. Observers use it to react to cast events without re-entering
    /// the controller.
    pub fn requests(&self) -> RequestSender {
        self.requests.clone()
    }

    /// Get a reference to the event bus for advanced usage
    pub fn event_bus(&self) -> &EventBus {
        &self.event_bus
    }
}
