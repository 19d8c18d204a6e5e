//! Scripted cast sequence for one hero.
//!
//! The hero spawns next to two training dummies, casts every slot and the
//! weapon, picks a ground point in front of itself, sweeps a sphere around
//! that point, walks there while turning to face the first dummy, and then
//! the runtime is stepped for the planned number of frames. Finally every
//! slot is tried again so the report shows which cooldowns have run out.

use anyhow::{Context, Result, anyhow};
use cast_content::HeroTemplate;
use cast_core::{
    ActorId, AoeTargeting, GroundPoint, LookAtLocation, MoveNearLocation, TargetFilter,
};
use cast_runtime::scheduler::HERO_EYE_HEIGHT;
use cast_runtime::{
    Event, HeroSnapshot, RuntimeHandle, SimActor, TargetingEvent, Topic,
};
use glam::Vec3;
use serde::Serialize;
use tokio::sync::broadcast::{self, error::TryRecvError};
use tracing::{info, warn};

const TOPICS: [Topic; 4] = [Topic::Cast, Topic::Targeting, Topic::Task, Topic::Attributes];
const DUMMY_DISTANCE: f32 = 400.0;
const DUMMY_SPREAD: f32 = 60.0;
const DUMMY_RADIUS: f32 = 40.0;
const SWEEP_RADIUS: f32 = 250.0;

#[derive(Clone, Debug, PartialEq)]
pub struct ScenarioPlan {
    /// Frames stepped after the opening casts.
    pub frames: u32,
    pub location: Vec3,
}

impl ScenarioPlan {
    /// Enough frames of `frame_dt` to cover `seconds`.
    pub fn for_duration(seconds: f32, frame_dt: f32) -> Self {
        let frames = if seconds > 0.0 && frame_dt > 0.0 {
            (seconds / frame_dt).ceil() as u32
        } else {
            0
        };
        Self {
            frames,
            location: Vec3::ZERO,
        }
    }
}

/// What the scenario observed.
#[derive(Clone, Debug, Serialize)]
pub struct ScenarioReport {
    pub hero: HeroSnapshot,
    pub frames: u64,
    pub clock: f32,
    pub ground_point: Option<Vec3>,
    pub swept: Vec<ActorId>,
    /// Slots accepted on the second round of casts.
    pub recast: Vec<usize>,
    /// Events grouped by topic in [`Topic`] order.
    pub events: Vec<Event>,
}

pub async fn run_scenario(
    handle: &RuntimeHandle,
    template: &HeroTemplate,
    plan: &ScenarioPlan,
) -> Result<ScenarioReport> {
    let mut receivers: Vec<broadcast::Receiver<Event>> =
        TOPICS.iter().map(|topic| handle.subscribe(*topic)).collect();

    let hero = handle
        .spawn_hero(template.clone(), plan.location)
        .await
        .with_context(|| format!("spawning {}", template.name))?;
    handle.select_hero(hero).await?;

    let ahead = plan.location + Vec3::X * DUMMY_DISTANCE;
    let mut dummies = Vec::new();
    for offset in [Vec3::Z * DUMMY_SPREAD, Vec3::Z * -DUMMY_SPREAD] {
        let dummy = handle
            .spawn_actor(SimActor::pawn(ahead + offset, DUMMY_RADIUS))
            .await?;
        dummies.push((dummy, ahead + offset));
    }

    let opening = snapshot(handle, hero).await?;
    for slot in &opening.slots {
        match handle.activate(hero, slot.slot).await {
            Ok(()) => info!(%hero, slot = slot.slot, "slot cast"),
            Err(err) => warn!(%hero, slot = slot.slot, "slot refused: {}", err),
        }
    }
    if handle.activate_weapon(hero).await? {
        info!(%hero, "weapon swung");
    }

    // Aim at the ground where the dummies stand.
    handle
        .set_aim(hero, Some(Vec3::new(DUMMY_DISTANCE, -HERO_EYE_HEIGHT, 0.0)))
        .await?;
    handle
        .start_targeting(hero, Box::new(GroundPoint::new()), None)
        .await?;
    let ground_point = handle
        .confirm_targeting(hero)
        .await?
        .and_then(|result| result.location);

    let center = ground_point.unwrap_or(ahead);
    handle
        .start_targeting(
            hero,
            Box::new(AoeTargeting::sphere(
                center,
                SWEEP_RADIUS,
                TargetFilter::new().excluding(hero),
            )),
            None,
        )
        .await?;

    if let Some(owner) = opening.slots.first().map(|slot| slot.ability) {
        handle
            .spawn_task(owner, Box::new(MoveNearLocation::new(hero, center)))
            .await?;
        if let Some((_, facing)) = dummies.first() {
            handle
                .spawn_task(owner, Box::new(LookAtLocation::new(hero, *facing)))
                .await?;
        }
    }

    handle.step(plan.frames).await?;

    let mut recast = Vec::new();
    for slot in &opening.slots {
        if handle.activate(hero, slot.slot).await.is_ok() {
            recast.push(slot.slot);
        }
    }

    let (frames, clock) = handle.query_clock().await?;
    let final_snapshot = snapshot(handle, hero).await?;
    let events: Vec<Event> = receivers.iter_mut().flat_map(drain).collect();
    let swept = swept_actors(&events);

    info!(
        %hero,
        frames,
        clock,
        events = events.len(),
        swept = swept.len(),
        "scenario finished"
    );
    Ok(ScenarioReport {
        hero: final_snapshot,
        frames,
        clock,
        ground_point,
        swept,
        recast,
        events,
    })
}

async fn snapshot(handle: &RuntimeHandle, hero: ActorId) -> Result<HeroSnapshot> {
    handle
        .query_hero(hero)
        .await?
        .ok_or_else(|| anyhow!("hero {} disappeared", hero))
}

fn drain(receiver: &mut broadcast::Receiver<Event>) -> Vec<Event> {
    let mut events = Vec::new();
    loop {
        match receiver.try_recv() {
            Ok(event) => events.push(event),
            Err(TryRecvError::Lagged(skipped)) => {
                warn!(skipped, "event buffer overflowed; raise CAST_EVENT_BUFFER");
            }
            Err(TryRecvError::Empty | TryRecvError::Closed) => return events,
        }
    }
}

fn swept_actors(events: &[Event]) -> Vec<ActorId> {
    events
        .iter()
        .filter_map(|event| match event {
            Event::Targeting(TargetingEvent::TargetDataReady {
                strategy, result, ..
            }) if strategy == "sphere_aoe" => Some(result.actors.clone()),
            _ => None,
        })
        .next_back()
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use cast_content::{AbilityLoader, HeroAttributes};
    use cast_core::{AbilityId, CastConfig, CastEvent, SpellState};
    use cast_runtime::Runtime;

    use super::*;
    use crate::SimConfig;

    fn arcanist() -> HeroTemplate {
        HeroTemplate::new("Arcanist", vec![AbilityId(1), AbilityId(2), AbilityId(3)])
            .with_weapon(AbilityId(10))
            .with_attributes(HeroAttributes {
                mana: 300.0,
                max_mana: 300.0,
                ..HeroAttributes::default()
            })
    }

    #[test]
    fn plan_covers_the_requested_duration() {
        assert_eq!(ScenarioPlan::for_duration(1.0, 0.25).frames, 4);
        assert_eq!(ScenarioPlan::for_duration(1.1, 0.25).frames, 5);
        assert_eq!(ScenarioPlan::for_duration(0.0, 0.25).frames, 0);
    }

    #[tokio::test]
    async fn scripted_run_reports_casts_targets_and_cooldowns() {
        let config = SimConfig {
            frame_dt: 0.125,
            ..SimConfig::default()
        };
        let runtime = Runtime::builder()
            .config(config.runtime_config(CastConfig::default()))
            .catalog(AbilityLoader::embedded().unwrap())
            .build()
            .await
            .unwrap();

        let plan = ScenarioPlan::for_duration(3.0, config.frame_dt);
        let report = run_scenario(&runtime.handle(), &arcanist(), &plan)
            .await
            .unwrap();

        assert_eq!(report.frames, 24);
        assert_eq!(report.swept.len(), 2);
        let point = report.ground_point.unwrap();
        assert!(point.distance(Vec3::new(DUMMY_DISTANCE, 0.0, 0.0)) < 1.0);

        // Jab has no cooldown, Fire Bolt (2s) ran out, Meteor (5s) did not.
        assert_eq!(report.recast, vec![0, 1]);
        assert_eq!(report.hero.slots[2].state, SpellState::OnCooldown);
        assert!(report.events.iter().any(|event| matches!(
            event,
            Event::Cast(notice) if notice.event == CastEvent::SpellOffCooldown { slot: 1 }
        )));

        runtime.shutdown().await.unwrap();
    }
}
