//! BOOMFALL Simulation Core
//!
//! ECS-симуляция gameplay-ядра (first-person platforming + demolition)
//! на Bevy 0.16: movement state machine, slow-time resource controller,
//! environment sensors, presentation targets.
//!
//! HYBRID ARCHITECTURE:
//! - ECS = gameplay layer (states, fuel бюджет, time dilation, предикаты)
//! - Engine host = tactical layer (rendering, raycasts, trigger volumes,
//!   mesh demolition, scene reload)
//!
//! Precondition: хост гоняет schedule с одного потока; shared state
//! (context, fuel, blended scalars) мутируется только simulation chain'ом.

use bevy::prelude::*;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use std::time::Duration;

// Публичные модули
pub mod components;
pub mod hazard;
pub mod launcher;
pub mod logger;
pub mod movement;
pub mod presentation;
pub mod sensors;
pub mod timeflow;

// Re-export базовых типов для удобства
pub use components::{
    spawn_player, CameraFeel, ConfigError, HeadOrientation, InputSnapshot, MovementContext,
    PlayerConfig, PlayerController, VisualTargets,
};
pub use hazard::{Dead, HazardContactEvent, HazardKind, PlayerDied, RestartRequested};
pub use launcher::{ChargeFireIntent, ChargeLauncher, ChargeSpawned};
pub use movement::MoveState;
pub use presentation::PresentationFrame;
pub use sensors::{
    FlatWorldProbe, ProbeLayer, SensorReadings, SurfaceHit, SurfaceQuery, WaterContactEvent,
    WorldProbe,
};
pub use timeflow::{GravityBlend, SimulationClock, TimeDilation, TimeFuel};

/// Частота simulation tick (легче считать интервалы)
pub const SIMULATION_HZ: f64 = 60.0;

/// Главный plugin симуляции (объединяет все подсистемы)
///
/// Порядок тика зафиксирован одним chain'ом — это единственная точка
/// входа, подсистемы нельзя дёргать напрямую:
/// 1. update_time_dilation — fuel + global time scale (unscaled время)
/// 2. update_gravity_blend — эффективная гравитация
/// 3. refresh_sensors — ground/ceiling/ledge/water снимок
/// 4. drive_state_machine — update активного state + переходы
/// 5. apply_rotation — yaw/pitch/tilt
/// 6. publish_frame — сглаживание камеры + кадр хосту
/// 7. launcher + hazard — intents, смерть, рестарт
pub struct SimulationPlugin;

impl Plugin for SimulationPlugin {
    fn build(&self, app: &mut App) {
        app.insert_resource(Time::<Fixed>::from_hz(SIMULATION_HZ))
            .insert_resource(timeflow::SimulationClock::new(Duration::from_secs_f64(
                1.0 / SIMULATION_HZ,
            )))
            .init_resource::<timeflow::TimeDilation>()
            .init_resource::<sensors::WorldProbe>()
            .init_resource::<DeterministicRng>();

        // Регистрация событий
        app.add_event::<sensors::WaterContactEvent>()
            .add_event::<presentation::PresentationFrame>()
            .add_event::<hazard::HazardContactEvent>()
            .add_event::<hazard::PlayerDied>()
            .add_event::<hazard::RestartRequested>()
            .add_event::<launcher::ChargeFireIntent>()
            .add_event::<launcher::ChargeSpawned>();

        // Главный simulation chain
        app.add_systems(
            Update,
            (
                // Фаза 1: resource controller (до сенсоров и states)
                timeflow::update_time_dilation,
                timeflow::update_gravity_blend,

                // Фаза 2: снимок мира
                sensors::refresh_sensors,

                // Фаза 3: state machine
                movement::drive_state_machine,

                // Фаза 4: presentation (one-way sink)
                presentation::apply_rotation,
                presentation::publish_frame,

                // Фаза 5: launcher intents
                launcher::player_fire_intent,
                launcher::process_fire_intents,

                // Фаза 6: смерть/рестарт
                hazard::handle_hazard_contacts,
                hazard::tick_restart_timers,
            )
                .chain(), // Последовательное выполнение
        );

        // Сброс clock на любом пути деактивации контроллера —
        // PostUpdate видит removals этого же кадра
        app.add_systems(PostUpdate, timeflow::reset_clock_on_disable);

        // Rapier sync: velocity только для collision resolution
        app.add_systems(FixedUpdate, movement::sync_velocity_to_rapier);
    }
}

/// Детерминистичный RNG resource (seeded)
#[derive(Resource)]
pub struct DeterministicRng {
    pub rng: ChaCha8Rng,
    pub seed: u64,
}

impl DeterministicRng {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: ChaCha8Rng::seed_from_u64(seed),
            seed,
        }
    }
}

impl Default for DeterministicRng {
    fn default() -> Self {
        Self::new(42)
    }
}

/// Создаёт minimal Bevy App для headless симуляции
///
/// Seed вставляется до SimulationPlugin (plugin использует init_resource
/// и не перетирает его).
pub fn create_headless_app(seed: u64) -> App {
    let mut app = App::new();
    logger::init_logger();
    app.add_plugins(MinimalPlugins)
        .insert_resource(DeterministicRng::new(seed))
        .add_plugins(SimulationPlugin);

    app
}
