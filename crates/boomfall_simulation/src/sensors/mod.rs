//! Environment sensors (ground / ceiling / ledge / water)
//!
//! Архитектура:
//! - ECS система пишет SensorReadings (чистый снимок мира за тик)
//! - Хост владеет геометрией и отдаёт ray/sphere casts через SurfaceQuery
//! - Water membership приходит событиями от trigger volumes хоста
//!
//! "Нет попадания" — валидный результат запроса, не ошибка.

use bevy::prelude::*;
use std::collections::HashMap;

use crate::components::{HeadOrientation, MovementContext, PlayerConfig, PlayerController};

pub mod ledge;

pub use ledge::{ceiling_probe, ledge_probe};

/// Слой геометрии для probe запросов (аналог physics layer mask хоста)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProbeLayer {
    /// Walkable геометрия (ground mask)
    Ground,
    /// Climbable геометрия (ledge mask)
    Ledge,
}

/// Попадание probe-запроса
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SurfaceHit {
    pub point: Vec3,
    /// Поверхность помечена как hazard (взрывчатка) — за неё нельзя цепляться
    pub hazard: bool,
}

/// Контракт хоста: чистые синхронные запросы к static-геометрии
///
/// Реализация — на стороне engine layer (raycast по списку коллайдеров).
/// Для headless прогонов есть FlatWorldProbe.
pub trait SurfaceQuery: Send + Sync {
    fn raycast(&self, origin: Vec3, dir: Vec3, max_dist: f32, layer: ProbeLayer)
        -> Option<SurfaceHit>;

    fn sphere_check(&self, center: Vec3, radius: f32, layer: ProbeLayer) -> bool;

    fn sphere_cast(&self, origin: Vec3, radius: f32, dir: Vec3, max_dist: f32, layer: ProbeLayer)
        -> bool;
}

/// Resource-обёртка над probe реализацией хоста
#[derive(Resource)]
pub struct WorldProbe(pub Box<dyn SurfaceQuery>);

impl Default for WorldProbe {
    fn default() -> Self {
        Self(Box::new(FlatWorldProbe::default()))
    }
}

/// Плоский мир для headless симуляции: пол на floor_y, стен нет
///
/// TODO: заменить на rapier query pipeline когда headless прогоны получат
/// реальную level геометрию
#[derive(Debug, Clone, Copy)]
pub struct FlatWorldProbe {
    pub floor_y: f32,
}

impl Default for FlatWorldProbe {
    fn default() -> Self {
        Self { floor_y: 0.0 }
    }
}

impl SurfaceQuery for FlatWorldProbe {
    fn raycast(
        &self,
        origin: Vec3,
        dir: Vec3,
        max_dist: f32,
        layer: ProbeLayer,
    ) -> Option<SurfaceHit> {
        if layer == ProbeLayer::Ledge {
            // Стен в плоском мире нет
            return None;
        }
        // Только лучи вниз могут попасть в пол
        if dir.y >= 0.0 || origin.y < self.floor_y {
            return None;
        }
        let t = (origin.y - self.floor_y) / -dir.y;
        if t > max_dist {
            return None;
        }
        Some(SurfaceHit {
            point: origin + dir * t,
            hazard: false,
        })
    }

    fn sphere_check(&self, center: Vec3, radius: f32, layer: ProbeLayer) -> bool {
        layer == ProbeLayer::Ground && center.y - radius <= self.floor_y
    }

    fn sphere_cast(
        &self,
        _origin: Vec3,
        _radius: f32,
        _dir: Vec3,
        _max_dist: f32,
        _layer: ProbeLayer,
    ) -> bool {
        // Потолка над плоским полом нет
        false
    }
}

/// Снимок сенсоров за тик (читается state machine)
#[derive(Component, Debug, Clone, Copy, Default)]
pub struct SensorReadings {
    pub grounded: bool,
    pub ceiling: bool,
    /// Точка, куда можно закончить climb (None = ledge не найден)
    pub ledge: Option<Vec3>,
    pub in_water: bool,
}

/// Event от trigger volumes хоста: игрок вошёл/вышел из воды
#[derive(Event, Debug, Clone)]
pub enum WaterContactEvent {
    Entered { player: Entity },
    Exited { player: Entity },
}

// Радиус ground check сферы у ног (как у оригинального ground probe)
const GROUND_CHECK_RADIUS: f32 = 0.2;
// Небольшой подъём центра сферы над ногами
const GROUND_CHECK_LIFT: f32 = 0.1;

/// Система: refresh всех сенсоров (строго после timeflow, до state update)
pub fn refresh_sensors(
    probe: Res<WorldProbe>,
    mut water_events: EventReader<WaterContactEvent>,
    mut players: Query<
        (
            Entity,
            &Transform,
            &HeadOrientation,
            &PlayerConfig,
            &MovementContext,
            &mut SensorReadings,
        ),
        With<PlayerController>,
    >,
) {
    // Water membership: последний event за тик выигрывает
    let mut water_changes: HashMap<Entity, bool> = HashMap::new();
    for event in water_events.read() {
        match event {
            WaterContactEvent::Entered { player } => {
                water_changes.insert(*player, true);
            }
            WaterContactEvent::Exited { player } => {
                water_changes.insert(*player, false);
            }
        }
    }

    for (entity, transform, head, config, context, mut readings) in players.iter_mut() {
        let feet = transform.translation;

        readings.grounded = probe.0.sphere_check(
            feet + Vec3::Y * GROUND_CHECK_LIFT,
            GROUND_CHECK_RADIUS,
            ProbeLayer::Ground,
        );

        readings.ceiling = ceiling_probe(
            probe.0.as_ref(),
            feet,
            context.controller_height,
            config.standing_controller_height,
            config.controller_radius,
        );

        readings.ledge = ledge_probe(
            probe.0.as_ref(),
            feet,
            head.forward(),
            config.ledge_detection_distance,
        );

        if let Some(&entered) = water_changes.get(&entity) {
            if readings.in_water != entered {
                crate::logger::log(&format!(
                    "Sensors: {:?} water membership → {}",
                    entity, entered
                ));
            }
            readings.in_water = entered;
        }
    }
}
