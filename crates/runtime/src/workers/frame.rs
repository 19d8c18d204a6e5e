//! Frame worker that owns the authoritative [`Scheduler`].
//!
//! Receives commands from [`RuntimeHandle`](crate::RuntimeHandle), applies
//! them to the scheduler between frames, and steps the scheduler either on a
//! fixed interval or on explicit [`Command::Step`] requests. Events reach
//! clients through the scheduler's [`EventBus`](crate::EventBus).

use std::time::Duration;

use cast_content::HeroTemplate;
use cast_core::{
    AbilityHandle, AbilityTask, ActorId, AsyncTaskHandle, EffectHandle, EffectSpec, SlotIndex,
    TargetResult, TargetingStrategy, TaskStatus,
};
use glam::Vec3;
use tokio::sync::{mpsc, oneshot};
use tokio::time::{Interval, MissedTickBehavior};
use tracing::{debug, info, warn};

use crate::api::Result;
use crate::backend::SimActor;
use crate::scheduler::{HeroSnapshot, Scheduler};

/// Commands that can be sent to the frame worker.
pub enum Command {
    SpawnHero {
        template: HeroTemplate,
        location: Vec3,
        reply: oneshot::Sender<Result<ActorId>>,
    },
    SpawnActor {
        actor: SimActor,
        reply: oneshot::Sender<ActorId>,
    },
    DestroyActor {
        actor: ActorId,
        reply: oneshot::Sender<bool>,
    },
    SelectHero {
        actor: ActorId,
        reply: oneshot::Sender<bool>,
    },
    SetCharacterLevel {
        actor: ActorId,
        level: u32,
        reply: oneshot::Sender<Result<bool>>,
    },
    /// Points an actor's aim ray; `None` falls back to its facing.
    SetAim {
        actor: ActorId,
        direction: Option<Vec3>,
        reply: oneshot::Sender<bool>,
    },
    Activate {
        actor: ActorId,
        slot: SlotIndex,
        reply: oneshot::Sender<Result<()>>,
    },
    ActivateWeapon {
        actor: ActorId,
        reply: oneshot::Sender<Result<bool>>,
    },
    ApplyEffect {
        target: ActorId,
        source: Option<ActorId>,
        spec: EffectSpec,
        reply: oneshot::Sender<Result<EffectHandle>>,
    },
    StartTargeting {
        actor: ActorId,
        strategy: Box<dyn TargetingStrategy>,
        ability: Option<AbilityHandle>,
        reply: oneshot::Sender<Result<TaskStatus>>,
    },
    ConfirmTargeting {
        actor: ActorId,
        reply: oneshot::Sender<Result<Option<TargetResult>>>,
    },
    CancelTargeting {
        actor: ActorId,
        reply: oneshot::Sender<bool>,
    },
    SpawnTask {
        owner: AbilityHandle,
        task: Box<dyn AbilityTask>,
        reply: oneshot::Sender<AsyncTaskHandle>,
    },
    CancelTask {
        handle: AsyncTaskHandle,
        reply: oneshot::Sender<bool>,
    },
    /// Runs `frames` frames immediately, regardless of auto-stepping.
    Step {
        frames: u32,
        reply: oneshot::Sender<Result<()>>,
    },
    QueryHero {
        actor: ActorId,
        reply: oneshot::Sender<Option<HeroSnapshot>>,
    },
    QueryHeroes {
        reply: oneshot::Sender<Vec<HeroSnapshot>>,
    },
    /// Frame counter and simulated seconds.
    QueryClock {
        reply: oneshot::Sender<(u64, f32)>,
    },
    Shutdown,
}

/// Background task that drives the scheduler.
pub struct FrameWorker {
    scheduler: Scheduler,
    command_rx: mpsc::Receiver<Command>,
    frame_dt: f32,
    auto_step: bool,
}

impl FrameWorker {
    pub fn new(
        scheduler: Scheduler,
        command_rx: mpsc::Receiver<Command>,
        frame_dt: f32,
        auto_step: bool,
    ) -> Self {
        info!(
            target: "runtime::worker",
            frame_dt,
            auto_step,
            heroes = scheduler.heroes().count(),
            "frame worker initialized"
        );
        Self {
            scheduler,
            command_rx,
            frame_dt,
            auto_step,
        }
    }

    /// Main worker loop. Returns when every handle is gone or on
    /// [`Command::Shutdown`].
    pub async fn run(mut self) {
        let mut interval = self.auto_step.then(|| {
            let mut interval = tokio::time::interval(Duration::from_secs_f32(self.frame_dt));
            interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
            interval
        });

        loop {
            tokio::select! {
                cmd = self.command_rx.recv() => match cmd {
                    Some(Command::Shutdown) | None => break,
                    Some(cmd) => self.handle_command(cmd),
                },
                _ = next_tick(&mut interval), if interval.is_some() => {
                    if let Err(err) = self.scheduler.step(self.frame_dt) {
                        warn!(target: "runtime::worker", "frame step failed: {}", err);
                    }
                }
            }
        }

        info!(
            target: "runtime::worker",
            frames = self.scheduler.frame(),
            clock = self.scheduler.clock(),
            "frame worker stopped"
        );
    }

    fn handle_command(&mut self, cmd: Command) {
        let scheduler = &mut self.scheduler;
        match cmd {
            Command::SpawnHero {
                template,
                location,
                reply,
            } => respond(reply, scheduler.spawn_hero(&template, location), "SpawnHero"),
            Command::SpawnActor { actor, reply } => {
                respond(reply, scheduler.spawn_actor(actor), "SpawnActor")
            }
            Command::DestroyActor { actor, reply } => {
                respond(reply, scheduler.destroy_actor(actor), "DestroyActor")
            }
            Command::SelectHero { actor, reply } => {
                respond(reply, scheduler.select_hero(actor), "SelectHero")
            }
            Command::SetCharacterLevel {
                actor,
                level,
                reply,
            } => respond(
                reply,
                scheduler.set_character_level(actor, level),
                "SetCharacterLevel",
            ),
            Command::SetAim {
                actor,
                direction,
                reply,
            } => respond(
                reply,
                scheduler.world_mut().set_aim(actor, direction),
                "SetAim",
            ),
            Command::Activate { actor, slot, reply } => {
                respond(reply, scheduler.activate(actor, slot), "Activate")
            }
            Command::ActivateWeapon { actor, reply } => {
                respond(reply, scheduler.activate_weapon(actor), "ActivateWeapon")
            }
            Command::ApplyEffect {
                target,
                source,
                spec,
                reply,
            } => respond(
                reply,
                scheduler.apply_effect(target, source, spec),
                "ApplyEffect",
            ),
            Command::StartTargeting {
                actor,
                strategy,
                ability,
                reply,
            } => respond(
                reply,
                scheduler.start_targeting(actor, strategy, ability),
                "StartTargeting",
            ),
            Command::ConfirmTargeting { actor, reply } => respond(
                reply,
                scheduler.confirm_targeting(actor),
                "ConfirmTargeting",
            ),
            Command::CancelTargeting { actor, reply } => {
                respond(reply, scheduler.cancel_targeting(actor), "CancelTargeting")
            }
            Command::SpawnTask { owner, task, reply } => {
                respond(reply, scheduler.spawn_task(owner, task), "SpawnTask")
            }
            Command::CancelTask { handle, reply } => {
                respond(reply, scheduler.cancel_task(handle), "CancelTask")
            }
            Command::Step { frames, reply } => {
                let dt = self.frame_dt;
                respond(reply, scheduler.run_for(frames, dt), "Step")
            }
            Command::QueryHero { actor, reply } => {
                respond(reply, scheduler.snapshot(actor), "QueryHero")
            }
            Command::QueryHeroes { reply } => respond(
                reply,
                scheduler.heroes().map(|hero| hero.snapshot()).collect(),
                "QueryHeroes",
            ),
            Command::QueryClock { reply } => respond(
                reply,
                (scheduler.frame(), scheduler.clock()),
                "QueryClock",
            ),
            Command::Shutdown => {}
        }
    }
}

fn respond<T>(reply: oneshot::Sender<T>, value: T, command: &'static str) {
    if reply.send(value).is_err() {
        debug!(target: "runtime::worker", command, "reply channel closed (caller dropped)");
    }
}

/// Completes on the next interval tick; never completes without an interval.
async fn next_tick(interval: &mut Option<Interval>) {
    match interval {
        Some(interval) => {
            interval.tick().await;
        }
        None => std::future::pending::<()>().await,
    }
}
