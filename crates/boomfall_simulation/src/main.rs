//! Headless симуляция BOOMFALL
//!
//! Запускает Bevy App без рендера: спавнит игрока над плоским миром,
//! держит ability и печатает прогресс state machine + fuel.

use bevy::prelude::*;
use boomfall_simulation::{
    create_headless_app, spawn_player, InputSnapshot, MoveState, PlayerConfig, TimeDilation,
    TimeFuel,
};

fn main() {
    let seed = 42;
    println!("Starting BOOMFALL headless simulation (seed: {})", seed);

    let mut app = create_headless_app(seed);

    let player = {
        let mut commands = app.world_mut().commands();
        match spawn_player(&mut commands, PlayerConfig::default(), Vec3::new(0.0, 5.0, 0.0)) {
            Ok(entity) => entity,
            Err(error) => {
                eprintln!("Player config rejected: {}", error);
                std::process::exit(1);
            }
        }
    };
    app.update(); // применяем spawn

    // Держим ability: в падении это slow fall + slow time
    if let Some(mut input) = app.world_mut().get_mut::<InputSnapshot>(player) {
        input.ability_held = true;
    }

    // Прогоняем 600 тиков симуляции
    for tick in 0..600 {
        app.update();

        if tick % 100 == 0 {
            let world = app.world();
            let state = world
                .get::<MoveState>(player)
                .map(|s| s.name())
                .unwrap_or("despawned");
            let fuel = world
                .get::<TimeFuel>(player)
                .map(|f| f.remaining)
                .unwrap_or(0.0);
            let scale = world.resource::<TimeDilation>().current_scale;
            println!(
                "Tick {}: state={} fuel={:.1}s time_scale={:.3}",
                tick, state, fuel, scale
            );
        }
    }

    println!("Simulation complete!");
}
