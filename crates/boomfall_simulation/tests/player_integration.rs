//! Player simulation integration test (headless)
//!
//! Проверяем на живом App:
//! - Fuel/time-scale инварианты
//! - Water events → Swimming и обратно
//! - Hazard contact → disable + рестарт
//! - PresentationFrame публикуется каждый тик

use bevy::prelude::*;
use boomfall_simulation::*;

/// Helper: headless app + игрок на плоском полу (y=0)
fn create_player_app(spawn_y: f32) -> (App, Entity) {
    let mut app = create_headless_app(42);

    let player = {
        let mut commands = app.world_mut().commands();
        spawn_player(
            &mut commands,
            PlayerConfig::default(),
            Vec3::new(0.0, spawn_y, 0.0),
        )
        .expect("default config is valid")
    };
    app.update(); // применяем spawn

    (app, player)
}

#[test]
fn test_player_spawns_grounded_on_floor() {
    let (mut app, player) = create_player_app(0.0);

    for _ in 0..10 {
        app.update();
    }

    // Ровно один активный state у игрока
    let mut states = app.world_mut().query::<(&MoveState, &PlayerController)>();
    let state_count = states.iter(app.world()).count();
    assert_eq!(state_count, 1);

    let sensors = app.world().get::<SensorReadings>(player).unwrap();
    assert!(sensors.grounded, "flat world floor must be detected");
    assert_eq!(
        app.world().get::<MoveState>(player).unwrap(),
        &MoveState::Grounded
    );
}

#[test]
fn test_fuel_invariants_while_ability_held() {
    let (mut app, player) = create_player_app(0.0);

    app.world_mut()
        .get_mut::<InputSnapshot>(player)
        .unwrap()
        .ability_held = true;

    let max = app.world().get::<TimeFuel>(player).unwrap().max;
    let mut previous = app.world().get::<TimeFuel>(player).unwrap().remaining;

    for _ in 0..100 {
        app.update();

        let fuel = app.world().get::<TimeFuel>(player).unwrap();
        assert!(fuel.remaining >= 0.0);
        assert!(fuel.remaining <= max);
        assert!(
            fuel.remaining <= previous,
            "fuel must be monotonically non-increasing"
        );
        previous = fuel.remaining;

        let scale = app.world().resource::<TimeDilation>().current_scale;
        assert!(scale > 0.0 && scale <= 1.0, "time scale out of range: {}", scale);
    }

    // Ability реально жгла fuel
    assert!(previous < max);
}

#[test]
fn test_water_events_toggle_swimming() {
    let (mut app, player) = create_player_app(0.0);
    app.update();

    app.world_mut()
        .resource_mut::<Events<WaterContactEvent>>()
        .write(WaterContactEvent::Entered { player });
    app.update();
    app.update();

    assert_eq!(
        app.world().get::<MoveState>(player).unwrap(),
        &MoveState::Swimming
    );

    app.world_mut()
        .resource_mut::<Events<WaterContactEvent>>()
        .write(WaterContactEvent::Exited { player });
    app.update();
    app.update();

    // Выход из воды на земле → Grounded (приоритет земли)
    assert_eq!(
        app.world().get::<MoveState>(player).unwrap(),
        &MoveState::Grounded
    );
}

#[test]
fn test_hazard_contact_disables_and_requests_restart() {
    let (mut app, player) = create_player_app(0.0);

    app.world_mut()
        .resource_mut::<Events<HazardContactEvent>>()
        .write(HazardContactEvent {
            player,
            kind: HazardKind::Lethal,
        });
    app.update();

    assert!(app.world().get::<PlayerController>(player).is_none());
    assert!(app.world().get::<Dead>(player).is_some());

    // Lethal = рестарт без задержки
    let restarts = app.world().resource::<Events<RestartRequested>>();
    assert!(!restarts.is_empty(), "restart must be requested immediately");
}

#[test]
fn test_double_hazard_contact_counts_once() {
    let (mut app, player) = create_player_app(0.0);

    {
        let mut events = app
            .world_mut()
            .resource_mut::<Events<HazardContactEvent>>();
        events.write(HazardContactEvent {
            player,
            kind: HazardKind::Lethal,
        });
        events.write(HazardContactEvent {
            player,
            kind: HazardKind::Finish,
        });
    }
    app.update();

    let died = app.world().resource::<Events<PlayerDied>>();
    assert_eq!(died.len(), 1, "player must die exactly once");
}

#[test]
fn test_presentation_frames_published() {
    let (mut app, player) = create_player_app(0.0);
    app.update();

    let frames = app.world().resource::<Events<PresentationFrame>>();
    assert!(!frames.is_empty(), "presentation sink must receive frames");

    // Без движения и падения FOV у normal, vignette нулевая
    let feel = app.world().get::<CameraFeel>(player).unwrap();
    assert!((feel.fov - 60.0).abs() < 1.0);
}
