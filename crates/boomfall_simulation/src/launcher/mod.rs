//! Demolition charge launcher (intent pipeline)
//!
//! ECS принимает strategic решение (cooldown готов, кнопка нажата) и
//! отдаёт хосту ChargeSpawned с готовой скоростью; spawn визуала,
//! полёт и взрыв — целиком на стороне engine layer.

use bevy::prelude::*;
use rand::Rng;

use crate::components::{HeadOrientation, InputSnapshot, MovementContext, PlayerController};
use crate::DeterministicRng;

/// Launcher component на player entity
#[derive(Component, Debug, Clone, Reflect)]
#[reflect(Component)]
pub struct ChargeLauncher {
    /// Начальная скорость заряда (m/s)
    pub projectile_speed: f32,
    /// Lifetime заряда до self-destruct (секунды)
    pub projectile_lifetime: f32,
    /// Минимальный интервал между выстрелами (секунды)
    pub fire_interval: f32,
    /// Offset точки спавна от камеры (right, up, forward)
    pub spawn_offset: Vec3,
    /// Множитель отталкивания от скорости падения
    pub fall_repulsion_multiplier: f32,
    /// Порог скорости падения для отталкивания (m/s)
    pub min_fall_speed_for_repulsion: f32,
    /// Случайность направления отталкивания [0, 1]
    pub repulsion_randomness: f32,
    /// Можно ли держать кнопку для автоогня
    pub auto_fire: bool,

    // Runtime
    cooldown: f32,
    trigger_was_held: bool,
}

impl Default for ChargeLauncher {
    fn default() -> Self {
        Self {
            projectile_speed: 20.0,
            projectile_lifetime: 5.0,
            fire_interval: 0.5,
            spawn_offset: Vec3::new(0.0, -0.2, 0.5),
            fall_repulsion_multiplier: 0.5,
            min_fall_speed_for_repulsion: 5.0,
            repulsion_randomness: 0.3,
            auto_fire: false,
            cooldown: 0.0,
            trigger_was_held: false,
        }
    }
}

impl ChargeLauncher {
    pub fn can_fire(&self) -> bool {
        self.cooldown <= 0.0
    }

    pub fn tick(&mut self, dt: f32) {
        if self.cooldown > 0.0 {
            self.cooldown = (self.cooldown - dt).max(0.0);
        }
    }

    /// Решение по кнопке: edge-detect для одиночного огня, held для авто
    pub fn wants_fire(&mut self, trigger_held: bool) -> bool {
        let pressed_now = trigger_held && !self.trigger_was_held;
        self.trigger_was_held = trigger_held;
        if self.auto_fire {
            trigger_held
        } else {
            pressed_now
        }
    }

    pub fn mark_fired(&mut self) {
        self.cooldown = self.fire_interval;
    }
}

/// Event: игрок хочет выстрелить (strategic intent)
#[derive(Event, Debug, Clone)]
pub struct ChargeFireIntent {
    pub shooter: Entity,
}

/// Event: заряд выпущен (ECS → хост, хост спавнит визуал и физику)
#[derive(Event, Debug, Clone)]
pub struct ChargeSpawned {
    pub shooter: Entity,
    /// Точка спавна (world space)
    pub origin: Vec3,
    /// Готовая начальная скорость (aim + fall repulsion)
    pub velocity: Vec3,
    pub lifetime: f32,
}

/// Система: cooldown + fire intent от input
pub fn player_fire_intent(
    mut players: Query<(Entity, &InputSnapshot, &mut ChargeLauncher), With<PlayerController>>,
    mut intents: EventWriter<ChargeFireIntent>,
    time: Res<Time>,
) {
    let dt = time.delta_secs();
    for (entity, input, mut launcher) in players.iter_mut() {
        launcher.tick(dt);
        if launcher.wants_fire(input.fire) && launcher.can_fire() {
            launcher.mark_fired();
            intents.write(ChargeFireIntent { shooter: entity });
        }
    }
}

/// Система: intent → ChargeSpawned с посчитанной скоростью
///
/// При быстром падении заряд дополнительно отталкивается вверх от игрока
/// (чтобы не влететь в собственный взрыв), с seeded jitter по горизонтали.
pub fn process_fire_intents(
    mut intents: EventReader<ChargeFireIntent>,
    mut spawned: EventWriter<ChargeSpawned>,
    mut rng: ResMut<DeterministicRng>,
    players: Query<(&Transform, &HeadOrientation, &MovementContext, &ChargeLauncher)>,
) {
    for intent in intents.read() {
        let Ok((transform, head, context, launcher)) = players.get(intent.shooter) else {
            crate::logger::log_warning(&format!(
                "ChargeFireIntent from {:?} without launcher components",
                intent.shooter
            ));
            continue;
        };

        let aim = head.look_direction();
        let origin = transform.translation
            + Vec3::Y * 1.5
            + head.right() * launcher.spawn_offset.x
            + Vec3::Y * launcher.spawn_offset.y
            + aim * launcher.spawn_offset.z;

        let mut velocity = aim * launcher.projectile_speed;

        let fall_speed = context.fall_speed();
        if fall_speed > launcher.min_fall_speed_for_repulsion {
            let jitter = Vec3::new(
                rng.rng.gen_range(-1.0..1.0),
                0.0,
                rng.rng.gen_range(-1.0..1.0),
            ) * launcher.repulsion_randomness;
            let repulsion =
                (Vec3::Y + jitter).normalize() * fall_speed * launcher.fall_repulsion_multiplier;
            velocity += repulsion;
        }

        spawned.write(ChargeSpawned {
            shooter: intent.shooter,
            origin,
            velocity,
            lifetime: launcher.projectile_lifetime,
        });
    }
}
