//! End-to-end checks through the worker and its handle.

use std::time::Duration;

use cast_content::{AbilityCatalog, AbilityDefinition, HeroTemplate};
use cast_core::{AbilityId, CastEvent, SpellState, TaskStatus};
use cast_runtime::{Event, Runtime, RuntimeConfig, RuntimeError, SimActor, Topic};
use glam::Vec3;

fn catalog() -> AbilityCatalog {
    [
        AbilityDefinition::new(AbilityId(1), "Jab", 0.0),
        AbilityDefinition::new(AbilityId(2), "Bolt", 1.0),
    ]
    .into_iter()
    .collect()
}

fn manual_config() -> RuntimeConfig {
    RuntimeConfig {
        frame_dt: 0.25,
        auto_step: false,
        ..RuntimeConfig::default()
    }
}

#[tokio::test]
async fn handle_drives_a_hero_through_a_cooldown() {
    let runtime = Runtime::builder()
        .config(manual_config())
        .catalog(catalog())
        .build()
        .await
        .expect("runtime should build");
    let handle = runtime.handle();
    let mut cast_rx = handle.subscribe(Topic::Cast);

    let hero = handle
        .spawn_hero(
            HeroTemplate::new("Duelist", vec![AbilityId(1), AbilityId(2)]),
            Vec3::ZERO,
        )
        .await
        .unwrap();
    assert!(handle.select_hero(hero).await.unwrap());

    handle.activate(hero, 1).await.unwrap();
    let event = tokio::time::timeout(Duration::from_secs(1), cast_rx.recv())
        .await
        .expect("cast event in time")
        .unwrap();
    assert!(matches!(
        event,
        Event::Cast(notice) if notice.actor == hero && notice.event == CastEvent::SpellCast { slot: 1 }
    ));

    let snapshot = handle.query_hero(hero).await.unwrap().unwrap();
    assert_eq!(snapshot.slots[1].state, SpellState::OnCooldown);

    handle.step(4).await.unwrap();
    let snapshot = handle.query_hero(hero).await.unwrap().unwrap();
    assert_eq!(snapshot.slots[1].state, SpellState::Ready);
    assert_eq!(handle.query_clock().await.unwrap(), (4, 1.0));

    runtime.shutdown().await.unwrap();
}

#[tokio::test]
async fn handle_reports_lookup_failures() {
    let runtime = Runtime::builder()
        .config(manual_config())
        .catalog(catalog())
        .build()
        .await
        .unwrap();
    let handle = runtime.handle();

    let dummy = handle
        .spawn_actor(SimActor::pawn(Vec3::ZERO, 30.0))
        .await
        .unwrap();
    assert!(matches!(
        handle.activate(dummy, 0).await,
        Err(RuntimeError::NotAHero(_))
    ));

    let status = handle
        .start_targeting(
            dummy,
            Box::new(cast_core::GroundPoint::new()),
            None,
        )
        .await;
    assert!(matches!(status, Err(RuntimeError::NotAHero(_))));
    assert!(handle.query_hero(dummy).await.unwrap().is_none());

    runtime.shutdown().await.unwrap();
}

#[tokio::test]
async fn targeting_round_trip_through_the_worker() {
    let runtime = Runtime::builder()
        .config(manual_config())
        .catalog(catalog())
        .build()
        .await
        .unwrap();
    let handle = runtime.handle();
    let mut targeting_rx = handle.subscribe(Topic::Targeting);

    let hero = handle
        .spawn_hero(HeroTemplate::new("Scout", vec![AbilityId(1)]), Vec3::ZERO)
        .await
        .unwrap();
    // Aim down at the ground in front of the hero.
    assert!(
        handle
            .set_aim(hero, Some(Vec3::new(1.0, -1.0, 0.0)))
            .await
            .unwrap()
    );

    let status = handle
        .start_targeting(hero, Box::new(cast_core::GroundPoint::new()), None)
        .await
        .unwrap();
    assert_eq!(status, TaskStatus::Running);

    let result = handle.confirm_targeting(hero).await.unwrap().unwrap();
    let point = result.location.unwrap();
    // Eye height 30, 45 degrees down: lands 30 units ahead.
    assert!(point.distance(Vec3::new(30.0, 0.0, 0.0)) < 1e-2, "point was {point}");
    assert!(matches!(targeting_rx.recv().await.unwrap(), Event::Targeting(_)));

    runtime.shutdown().await.unwrap();
}

#[tokio::test]
async fn building_without_a_catalog_fails() {
    let result = Runtime::builder().build().await;
    assert!(matches!(result, Err(RuntimeError::MissingCatalog)));

    let result = Runtime::builder()
        .catalog(catalog())
        .config(RuntimeConfig {
            frame_dt: 0.0,
            ..RuntimeConfig::default()
        })
        .build()
        .await;
    assert!(matches!(result, Err(RuntimeError::InvalidFrameDelta(_))));
}

#[tokio::test]
async fn building_rejects_degenerate_timing_and_buffers() {
    // Positive, but either rounds to a zero-length period or overflows one.
    for frame_dt in [1e-12, f32::MAX] {
        let result = Runtime::builder()
            .catalog(catalog())
            .config(RuntimeConfig {
                frame_dt,
                auto_step: false,
                ..RuntimeConfig::default()
            })
            .build()
            .await;
        assert!(matches!(result, Err(RuntimeError::InvalidFrameDelta(_))));
    }

    for config in [
        RuntimeConfig {
            event_buffer_size: 0,
            ..manual_config()
        },
        RuntimeConfig {
            command_buffer_size: 0,
            ..manual_config()
        },
    ] {
        let result = Runtime::builder()
            .catalog(catalog())
            .config(config)
            .build()
            .await;
        assert!(matches!(result, Err(RuntimeError::ZeroBufferSize(_))));
    }
}

#[tokio::test]
async fn manual_worker_answers_without_an_interval() {
    let runtime = Runtime::builder()
        .config(RuntimeConfig {
            frame_dt: 1e-6,
            auto_step: false,
            ..RuntimeConfig::default()
        })
        .catalog(catalog())
        .build()
        .await
        .unwrap();
    let handle = runtime.handle();

    assert_eq!(handle.query_clock().await.unwrap(), (0, 0.0));
    handle.step(2).await.unwrap();
    assert_eq!(handle.query_clock().await.unwrap().0, 2);

    runtime.shutdown().await.unwrap();
}

#[tokio::test]
async fn auto_step_advances_frames_on_its_own() {
    let runtime = Runtime::builder()
        .config(RuntimeConfig {
            frame_dt: 0.01,
            ..RuntimeConfig::default()
        })
        .catalog(catalog())
        .build()
        .await
        .unwrap();
    let handle = runtime.handle();

    tokio::time::sleep(Duration::from_millis(200)).await;
    let (frames, _) = handle.query_clock().await.unwrap();
    assert!(frames >= 2, "only {frames} frames ran");

    runtime.shutdown().await.unwrap();
}
