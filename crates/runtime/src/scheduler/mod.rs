//! Frame scheduler.
//!
//! The scheduler owns every piece of per-frame state: the simulated world,
//! the spawned heroes with their controllers and ability systems, the task
//! runner and the targeting strategy each hero has in progress. One call to
//! [`Scheduler::step`] is one frame; nothing in here runs concurrently.
//!
//! Observers registered on a controller only see `&CastEvent`. Work they want
//! to trigger in response (activating another slot, cancelling targeting) is
//! queued through a [`RequestSender`] and applied by the scheduler at the next
//! drain point of the frame.

mod hero;

use std::collections::BTreeMap;
use std::sync::Arc;

use cast_content::{AbilityCatalog, HeroTemplate};
use cast_core::{
    AbilityHandle, AbilityTask, ActorId, AsyncTaskHandle, Attribute, CastConfig, CastEvent,
    EffectHandle, EffectSpec, EnvError, NetRole, SlotIndex, SubscriptionToken, TargetResult,
    TargetingContext, TargetingStrategy, TaskContext, TaskRunner, TaskStatus,
};
use glam::Vec3;
use tokio::sync::mpsc;
use tracing::{debug, info, trace, warn};

pub use hero::{Hero, HeroSnapshot, SlotSnapshot};

use self::hero::ActiveTargeting;
use crate::api::{Result, RuntimeError};
use crate::backend::{SimAbilitySystem, SimActor, SimWorld};
use crate::events::{
    AttributeChanged, CastNotice, Event, EventBus, TargetingEvent, TaskFinished,
};

/// Collision radius of a spawned hero.
pub const HERO_RADIUS: f32 = 40.0;

/// Aim origin above the hero's location. Stays inside the hero's collider so
/// traces never hit the caster.
pub const HERO_EYE_HEIGHT: f32 = 30.0;

/// Upper bound on queued requests applied per drain point.
const MAX_REQUESTS_PER_DRAIN: usize = 64;

/// Work queued from inside an observer, applied by the scheduler.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Request {
    Activate { actor: ActorId, slot: SlotIndex },
    ActivateWeapon { actor: ActorId },
    CancelTargeting { actor: ActorId },
    CancelAbility { actor: ActorId, ability: AbilityHandle },
}

/// Cloneable sender for [`Request`]s.
#[derive(Clone, Debug)]
pub struct RequestSender(mpsc::UnboundedSender<Request>);

impl RequestSender {
    /// Queues `request`. Returns `false` once the scheduler is gone.
    pub fn send(&self, request: Request) -> bool {
        self.0.send(request).is_ok()
    }
}

pub struct Scheduler {
    config: CastConfig,
    catalog: Arc<AbilityCatalog>,
    world: SimWorld,
    heroes: BTreeMap<ActorId, Hero>,
    tasks: TaskRunner,
    task_actors: BTreeMap<AsyncTaskHandle, ActorId>,
    bus: EventBus,
    requests_tx: mpsc::UnboundedSender<Request>,
    requests_rx: mpsc::UnboundedReceiver<Request>,
    selected: Option<ActorId>,
    frame: u64,
    clock: f32,
}

impl Scheduler {
    pub fn new(
        config: CastConfig,
        catalog: Arc<AbilityCatalog>,
        world: SimWorld,
        bus: EventBus,
    ) -> Self {
        let (requests_tx, requests_rx) = mpsc::unbounded_channel();
        Self {
            config,
            catalog,
            world,
            heroes: BTreeMap::new(),
            tasks: TaskRunner::new(),
            task_actors: BTreeMap::new(),
            bus,
            requests_tx,
            requests_rx,
            selected: None,
            frame: 0,
            clock: 0.0,
        }
    }

    // ========================================================================
    // Accessors
    // ========================================================================

    pub fn config(&self) -> &CastConfig {
        &self.config
    }

    pub fn catalog(&self) -> &AbilityCatalog {
        &self.catalog
    }

    pub fn bus(&self) -> &EventBus {
        &self.bus
    }

    pub fn world(&self) -> &SimWorld {
        &self.world
    }

    pub fn world_mut(&mut self) -> &mut SimWorld {
        &mut self.world
    }

    pub fn tasks(&self) -> &TaskRunner {
        &self.tasks
    }

    pub fn hero(&self, actor: ActorId) -> Option<&Hero> {
        self.heroes.get(&actor)
    }

    pub fn hero_mut(&mut self, actor: ActorId) -> Option<&mut Hero> {
        self.heroes.get_mut(&actor)
    }

    pub fn heroes(&self) -> impl Iterator<Item = &Hero> {
        self.heroes.values()
    }

    pub fn snapshot(&self, actor: ActorId) -> Option<HeroSnapshot> {
        self.heroes.get(&actor).map(Hero::snapshot)
    }

    pub fn frame(&self) -> u64 {
        self.frame
    }

    /// Seconds simulated so far.
    pub fn clock(&self) -> f32 {
        self.clock
    }

    pub fn requests(&self) -> RequestSender {
        RequestSender(self.requests_tx.clone())
    }

    // ========================================================================
    // Spawning
    // ========================================================================

    /// Spawns an authoritative hero from `template`.
    ///
    /// # Errors
    ///
    /// [`RuntimeError::UnknownAbility`] when the template names an ability
    /// missing from the catalog. Nothing is spawned in that case.
    pub fn spawn_hero(&mut self, template: &HeroTemplate, location: Vec3) -> Result<ActorId> {
        self.spawn_hero_with_role(template, location, NetRole::Authority)
    }

    /// Spawns a hero with an explicit network role.
    ///
    /// Non-authoritative heroes get no ability system and therefore no slots.
    pub fn spawn_hero_with_role(
        &mut self,
        template: &HeroTemplate,
        location: Vec3,
        role: NetRole,
    ) -> Result<ActorId> {
        if let Some(ability) = template
            .spells
            .iter()
            .chain(template.weapon.iter())
            .find(|ability| !self.catalog.contains(**ability))
        {
            return Err(RuntimeError::UnknownAbility {
                hero: template.name.clone(),
                ability: *ability,
            });
        }

        let actor = self.world.spawn(
            SimActor::pawn(location, HERO_RADIUS)
                .with_mover(template.attributes.move_speed)
                .with_eye_height(HERO_EYE_HEIGHT),
        );
        let system = (role == NetRole::Authority).then(|| {
            SimAbilitySystem::new(actor, Arc::clone(&self.catalog), template.attributes)
        });
        let mut hero = Hero::new(actor, template.name.clone(), template.level, role, system);

        let bus = self.bus.clone();
        hero.controller.subscribe(move |event: &CastEvent| {
            bus.publish(Event::Cast(CastNotice {
                actor,
                event: event.clone(),
            }));
        });

        {
            let (controller, mut env) = hero.parts();
            for ability in &template.spells {
                if controller
                    .grant_ability(&mut env, *ability, template.level)
                    .is_none()
                {
                    debug!(
                        target: "runtime::scheduler",
                        %actor,
                        %ability,
                        "ability not granted"
                    );
                }
            }
            if let Some(weapon) = template.weapon {
                controller.grant_weapon_ability(&mut env, weapon, template.level);
            }
            controller.seal_initialization();
        }

        info!(
            target: "runtime::scheduler",
            %actor,
            hero = %template.name,
            spells = hero.spell_count(),
            %role,
            "hero spawned"
        );
        self.heroes.insert(actor, hero);
        Ok(actor)
    }

    /// Spawns a plain actor (target dummy, obstacle).
    pub fn spawn_actor(&mut self, actor: SimActor) -> ActorId {
        self.world.spawn(actor)
    }

    /// Tears an actor down: cancels its tasks and targeting, shuts the
    /// controller down and removes it from the world.
    pub fn destroy_actor(&mut self, actor: ActorId) -> bool {
        let mut ctx = TaskContext::new(&self.config, &mut self.world);
        let cancelled = self.tasks.cancel_for_actor(&mut ctx, actor);

        if let Some(mut hero) = self.heroes.remove(&actor) {
            if let Some(active) = hero.targeting.take() {
                abort_targeting(&self.config, &mut self.world, &self.bus, actor, active);
            }
            let (controller, mut env) = hero.parts();
            controller.shutdown(&mut env);
        }
        if self.selected == Some(actor) {
            self.selected = None;
        }

        let existed = self.world.despawn(actor);
        self.flush_task_events();
        if existed {
            info!(target: "runtime::scheduler", %actor, tasks_cancelled = cancelled, "actor destroyed");
        }
        existed
    }

    // ========================================================================
    // Selection and level
    // ========================================================================

    pub fn select_hero(&mut self, actor: ActorId) -> bool {
        if !self.heroes.contains_key(&actor) {
            return false;
        }
        self.selected = Some(actor);
        true
    }

    pub fn selected_hero(&self) -> Option<ActorId> {
        self.selected
    }

    pub fn set_character_level(&mut self, actor: ActorId, level: u32) -> Result<bool> {
        let Some(hero) = self.heroes.get_mut(&actor) else {
            return Err(self.missing(actor));
        };
        Ok(hero.set_character_level(level))
    }

    /// Registers an extra observer on a hero's controller.
    pub fn subscribe_cast<F>(&mut self, actor: ActorId, observer: F) -> Result<SubscriptionToken>
    where
        F: FnMut(&CastEvent) + Send + 'static,
    {
        let Some(hero) = self.heroes.get_mut(&actor) else {
            return Err(self.missing(actor));
        };
        Ok(hero.controller.subscribe(observer))
    }

    pub fn unsubscribe_cast(&mut self, actor: ActorId, token: SubscriptionToken) -> bool {
        self.heroes
            .get_mut(&actor)
            .is_some_and(|hero| hero.controller.unsubscribe(token))
    }

    // ========================================================================
    // Abilities
    // ========================================================================

    /// Activates the ability in `slot`.
    ///
    /// Abilities with no cast time commit and end before this returns.
    ///
    /// # Errors
    ///
    /// Lookup failures, or the controller's [`cast_core::ActivateError`].
    pub fn activate(&mut self, actor: ActorId, slot: SlotIndex) -> Result<()> {
        let Some(hero) = self.heroes.get_mut(&actor) else {
            return Err(self.missing(actor));
        };
        let (controller, mut env) = hero.parts();
        let result = controller.try_activate(&mut env, slot, false);
        self.settle(actor);
        result.map_err(RuntimeError::from)
    }

    pub fn activate_weapon(&mut self, actor: ActorId) -> Result<bool> {
        let Some(hero) = self.heroes.get_mut(&actor) else {
            return Err(self.missing(actor));
        };
        let (controller, mut env) = hero.parts();
        let activated = controller.activate_weapon(&mut env);
        self.settle(actor);
        Ok(activated)
    }

    /// Ends a running ability before it commits.
    pub fn cancel_ability(&mut self, actor: ActorId, ability: AbilityHandle) -> Result<bool> {
        let system = self.system_mut(actor)?;
        let cancelled = system.cancel_ability(ability);
        self.settle(actor);
        Ok(cancelled)
    }

    /// Applies a gameplay effect to `target`.
    pub fn apply_effect(
        &mut self,
        target: ActorId,
        source: Option<ActorId>,
        spec: EffectSpec,
    ) -> Result<EffectHandle> {
        let system = self.system_mut(target)?;
        let handle = system.apply_effect(source, spec);
        self.settle(target);
        Ok(handle)
    }

    pub fn remove_effect(&mut self, target: ActorId, effect: EffectHandle) -> Result<bool> {
        let system = self.system_mut(target)?;
        let removed = system.remove_effect(effect);
        self.settle(target);
        Ok(removed)
    }

    fn system_mut(&mut self, actor: ActorId) -> Result<&mut SimAbilitySystem> {
        if !self.heroes.contains_key(&actor) {
            return Err(self.missing(actor));
        }
        self.heroes
            .get_mut(&actor)
            .and_then(Hero::system_mut)
            .ok_or(RuntimeError::Env {
                actor,
                source: EnvError::AbilitySystemUnavailable,
            })
    }

    // ========================================================================
    // Targeting
    // ========================================================================

    /// Starts `strategy` for `actor`, replacing (and cancelling) any
    /// targeting already in progress.
    ///
    /// `ability` ties the targeting to a running ability: when that ability
    /// ends the targeting is cancelled with it.
    pub fn start_targeting(
        &mut self,
        actor: ActorId,
        mut strategy: Box<dyn TargetingStrategy>,
        ability: Option<AbilityHandle>,
    ) -> Result<TaskStatus> {
        let Some(hero) = self.heroes.get_mut(&actor) else {
            return Err(self.missing(actor));
        };
        if let Some(previous) = hero.targeting.take() {
            abort_targeting(&self.config, &mut self.world, &self.bus, actor, previous);
        }

        let mut ctx = TargetingContext::new(actor, &self.config, &mut self.world);
        let status = strategy.start_targeting(&mut ctx);
        debug!(
            target: "runtime::scheduler",
            %actor,
            strategy = strategy.name(),
            %status,
            "targeting started"
        );

        if status.is_finished() {
            publish_outcome(&self.bus, actor, strategy.as_mut());
            strategy.on_destroy(&mut ctx);
        } else {
            hero.targeting = Some(ActiveTargeting { ability, strategy });
        }
        Ok(status)
    }

    /// Confirms the targeting in progress and returns its result.
    ///
    /// # Errors
    ///
    /// [`RuntimeError::NoActiveTargeting`] when nothing is running.
    pub fn confirm_targeting(&mut self, actor: ActorId) -> Result<Option<TargetResult>> {
        let Some(hero) = self.heroes.get_mut(&actor) else {
            return Err(self.missing(actor));
        };
        let Some(active) = hero
            .targeting
            .as_mut()
            .filter(|active| active.strategy.status().is_running())
        else {
            return Err(RuntimeError::NoActiveTargeting(actor));
        };

        let mut ctx = TargetingContext::new(actor, &self.config, &mut self.world);
        active.strategy.confirm_targeting(&mut ctx);
        let result = publish_outcome(&self.bus, actor, active.strategy.as_mut());

        if active.strategy.destroy_on_confirmation() {
            active.strategy.on_destroy(&mut ctx);
            hero.targeting = None;
        }
        Ok(result)
    }

    /// Cancels the targeting in progress. Returns `false` when there was
    /// none.
    pub fn cancel_targeting(&mut self, actor: ActorId) -> bool {
        let Some(active) = self
            .heroes
            .get_mut(&actor)
            .and_then(|hero| hero.targeting.take())
        else {
            return false;
        };
        let was_running = active.strategy.status().is_running();
        abort_targeting(&self.config, &mut self.world, &self.bus, actor, active);
        was_running
    }

    // ========================================================================
    // Tasks
    // ========================================================================

    /// Activates `task` on behalf of the ability `owner`.
    pub fn spawn_task(&mut self, owner: AbilityHandle, task: Box<dyn AbilityTask>) -> AsyncTaskHandle {
        let actor = task.actor();
        let mut ctx = TaskContext::new(&self.config, &mut self.world);
        let handle = self.tasks.spawn(&mut ctx, owner, task);
        self.task_actors.insert(handle, actor);
        self.flush_task_events();
        handle
    }

    /// Cancels one task. Unknown and finished handles are ignored.
    pub fn cancel_task(&mut self, handle: AsyncTaskHandle) -> bool {
        let mut ctx = TaskContext::new(&self.config, &mut self.world);
        let cancelled = self.tasks.cancel(&mut ctx, handle);
        self.flush_task_events();
        cancelled
    }

    // ========================================================================
    // Frame
    // ========================================================================

    /// Runs one frame of `dt` seconds.
    ///
    /// Order: queued requests, ability systems, movement, tasks, targeting,
    /// then requests queued during the frame.
    ///
    /// # Errors
    ///
    /// [`RuntimeError::InvalidFrameDelta`] unless `dt` is positive and
    /// finite. The frame does not run in that case.
    pub fn step(&mut self, dt: f32) -> Result<()> {
        if !(dt.is_finite() && dt > 0.0) {
            return Err(RuntimeError::InvalidFrameDelta(dt));
        }
        self.frame += 1;
        self.clock += dt;

        self.drain_requests();

        let actors: Vec<ActorId> = self.heroes.keys().copied().collect();
        for actor in &actors {
            if let Some(system) = self.heroes.get_mut(actor).and_then(Hero::system_mut) {
                system.advance(dt);
            }
            self.settle(*actor);
        }

        let completions = self.world.advance(dt);
        {
            let mut ctx = TaskContext::new(&self.config, &mut self.world);
            for (actor, result) in completions {
                self.tasks.deliver_move_completed(&mut ctx, actor, result);
            }
            self.tasks.tick_all(&mut ctx, dt);
        }

        for actor in &actors {
            self.tick_targeting(*actor, dt);
        }

        self.drain_requests();
        self.flush_task_events();

        trace!(
            target: "runtime::scheduler",
            frame = self.frame,
            clock = self.clock,
            tasks = self.tasks.len(),
            "frame complete"
        );
        Ok(())
    }

    /// Runs `frames` frames of `dt` seconds each.
    pub fn run_for(&mut self, frames: u32, dt: f32) -> Result<()> {
        for _ in 0..frames {
            self.step(dt)?;
        }
        Ok(())
    }

    fn tick_targeting(&mut self, actor: ActorId, dt: f32) {
        let Some(hero) = self.heroes.get_mut(&actor) else {
            return;
        };
        let Some(active) = hero.targeting.as_mut() else {
            return;
        };
        if active.strategy.status().is_finished() {
            return;
        }
        let mut ctx = TargetingContext::new(actor, &self.config, &mut self.world);
        if active.strategy.tick(&mut ctx, dt).is_finished() {
            publish_outcome(&self.bus, actor, active.strategy.as_mut());
            active.strategy.on_destroy(&mut ctx);
            hero.targeting = None;
        }
    }

    /// Drains the hero's ability notifications and reacts to abilities that
    /// ended.
    fn settle(&mut self, actor: ActorId) {
        let Some(hero) = self.heroes.get_mut(&actor) else {
            return;
        };
        let ended = hero.pump_notifications();
        let changes = hero
            .system
            .as_mut()
            .map(SimAbilitySystem::drain_attribute_changes)
            .unwrap_or_default();

        for (attribute, value) in changes {
            if attribute == Attribute::MoveSpeed {
                self.world.set_move_speed(actor, value);
            }
            self.bus.publish(Event::Attributes(AttributeChanged {
                actor,
                attribute,
                value,
            }));
        }
        for ability in ended {
            self.on_ability_ended(actor, ability);
        }
    }

    fn on_ability_ended(&mut self, actor: ActorId, ability: AbilityHandle) {
        let mut ctx = TaskContext::new(&self.config, &mut self.world);
        let cancelled = self.tasks.cancel_owned_by(&mut ctx, ability);
        if cancelled > 0 {
            debug!(
                target: "runtime::scheduler",
                %actor,
                %ability,
                cancelled,
                "tasks cancelled with their ability"
            );
        }

        let Some(hero) = self.heroes.get_mut(&actor) else {
            return;
        };
        if hero
            .targeting
            .as_ref()
            .is_some_and(|active| active.ability == Some(ability))
            && let Some(active) = hero.targeting.take()
        {
            abort_targeting(&self.config, &mut self.world, &self.bus, actor, active);
        }
    }

    fn drain_requests(&mut self) {
        for _ in 0..MAX_REQUESTS_PER_DRAIN {
            let Ok(request) = self.requests_rx.try_recv() else {
                return;
            };
            self.apply_request(request);
        }
        if self.requests_rx.is_empty() {
            return;
        }
        warn!(
            target: "runtime::scheduler",
            frame = self.frame,
            limit = MAX_REQUESTS_PER_DRAIN,
            "request limit reached; remaining requests deferred"
        );
    }

    fn apply_request(&mut self, request: Request) {
        let outcome = match request {
            Request::Activate { actor, slot } => self.activate(actor, slot),
            Request::ActivateWeapon { actor } => self.activate_weapon(actor).map(|_| ()),
            Request::CancelTargeting { actor } => {
                self.cancel_targeting(actor);
                Ok(())
            }
            Request::CancelAbility { actor, ability } => {
                self.cancel_ability(actor, ability).map(|_| ())
            }
        };
        if let Err(err) = outcome {
            debug!(target: "runtime::scheduler", ?request, "queued request failed: {}", err);
        }
    }

    fn flush_task_events(&mut self) {
        for event in self.tasks.drain_events() {
            let Some(actor) = self.task_actors.remove(&event.handle()) else {
                continue;
            };
            self.bus.publish(Event::Task(TaskFinished { actor, event }));
        }
    }

    fn missing(&self, actor: ActorId) -> RuntimeError {
        if self.world.actor(actor).is_some() {
            RuntimeError::NotAHero(actor)
        } else {
            RuntimeError::UnknownActor(actor)
        }
    }
}

impl std::fmt::Debug for Scheduler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Scheduler")
            .field("frame", &self.frame)
            .field("clock", &self.clock)
            .field("heroes", &self.heroes.len())
            .field("tasks", &self.tasks.len())
            .field("selected", &self.selected)
            .finish()
    }
}

/// Takes the strategy's result and publishes it. Results produced remotely
/// are left to the remote side.
fn publish_outcome(
    bus: &EventBus,
    actor: ActorId,
    strategy: &mut dyn TargetingStrategy,
) -> Option<TargetResult> {
    let result = strategy.take_result()?;
    if !strategy.should_produce_target_data_locally() {
        debug!(
            target: "runtime::scheduler",
            %actor,
            strategy = strategy.name(),
            "target data produced remotely"
        );
        return Some(result);
    }

    let event = if result.is_confirmed() {
        TargetingEvent::TargetDataReady {
            actor,
            strategy: strategy.name().to_string(),
            result: result.clone(),
        }
    } else {
        TargetingEvent::TargetingCancelled {
            actor,
            strategy: strategy.name().to_string(),
        }
    };
    bus.publish(Event::Targeting(event));
    Some(result)
}

fn abort_targeting(
    config: &CastConfig,
    world: &mut SimWorld,
    bus: &EventBus,
    actor: ActorId,
    mut active: ActiveTargeting,
) {
    let mut ctx = TargetingContext::new(actor, config, world);
    active.strategy.cancel_targeting(&mut ctx);
    publish_outcome(bus, actor, active.strategy.as_mut());
    active.strategy.on_destroy(&mut ctx);
}

