//! Player controller marker + spawn helper
//!
//! PlayerController через Required Components гарантирует полный набор
//! компонентов тика — отсутствие required reference ловится на спавне,
//! а не null-check'ами в каждой системе.

use bevy::prelude::*;
use bevy_rapier3d::prelude::*;

use super::config::{ConfigError, PlayerConfig};
use super::context::{CameraFeel, HeadOrientation, InputSnapshot, MovementContext, VisualTargets};
use crate::movement::MoveState;
use crate::sensors::SensorReadings;
use crate::timeflow::{GravityBlend, TimeFuel};

/// Marker component для player-controlled entity
///
/// Simulation chain тикает только entities с этим компонентом.
/// Снятие компонента = disable контроллера: движение останавливается,
/// а timeflow обязан сбросить глобальный clock (см. reset_clock_on_disable).
#[derive(Component, Debug, Clone, Copy, Default, Reflect)]
#[reflect(Component)]
#[require(
    PlayerConfig,
    InputSnapshot,
    MovementContext,
    SensorReadings,
    MoveState,
    VisualTargets,
    HeadOrientation,
    CameraFeel,
    TimeFuel,
    GravityBlend
)]
pub struct PlayerController;

/// Spawn helper: полный player entity с физикой
///
/// Создаёт:
/// - Transform (ноги в position)
/// - PlayerController + все required компоненты
/// - TimeFuel/GravityBlend, выведенные из конфига
/// - Rapier: KinematicPositionBased + capsule + Velocity
///
/// Ошибка конфига — это ошибка уровня: возвращаем её сразу, не спавним
/// полурабочего игрока.
pub fn spawn_player(
    commands: &mut Commands,
    config: PlayerConfig,
    position: Vec3,
) -> Result<Entity, ConfigError> {
    config.validate()?;

    let fuel = TimeFuel::new(config.max_slow_time_seconds);
    let gravity = GravityBlend::from_config(&config);
    let context = MovementContext {
        controller_height: config.standing_controller_height,
        ..default()
    };
    let visuals = VisualTargets {
        target_fov: config.normal_fov,
        target_camera_y: config.standing_camera_height,
        bob_speed: config.bob_speed,
        ..default()
    };
    let feel = CameraFeel {
        fov: config.normal_fov,
        camera_y: config.standing_camera_height,
        bob_timer: 0.0,
    };

    // Capsule: ноги на y=0, половина цилиндра = (height - 2*radius) / 2
    let half_height = (config.standing_controller_height - 2.0 * config.controller_radius) / 2.0;
    let radius = config.controller_radius;

    let entity = commands
        .spawn((
            Transform::from_translation(position),
            PlayerController,
            config,
            fuel,
            gravity,
            context,
            visuals,
            feel,
            // Rapier physics
            RigidBody::KinematicPositionBased,
            Collider::capsule_y(half_height, radius),
            Velocity::default(),
        ))
        .id();

    crate::logger::log_info(&format!("Player spawned: {:?} at {:?}", entity, position));
    Ok(entity)
}
