//! Shared movement context + visual targets
//!
//! MovementContext — единственное место где живёт velocity игрока.
//! Мутирует его ровно один активный state за тик (вертикальную компоненту —
//! тоже только один, без двойной интеграции).

use bevy::prelude::*;

/// Контекст движения, shared между states
#[derive(Component, Debug, Clone, Copy, Reflect)]
#[reflect(Component)]
pub struct MovementContext {
    /// Текущая скорость (m/s, world space)
    pub velocity: Vec3,
    /// Текущая высота capsule контроллера (меняется при crouch/slide)
    pub controller_height: f32,
}

impl Default for MovementContext {
    fn default() -> Self {
        Self {
            velocity: Vec3::ZERO,
            controller_height: 1.8, // standing height
        }
    }
}

impl MovementContext {
    pub fn horizontal_speed(&self) -> f32 {
        Vec2::new(self.velocity.x, self.velocity.z).length()
    }

    /// Скорость падения (положительная, 0 если движемся вверх)
    pub fn fall_speed(&self) -> f32 {
        (-self.velocity.y).max(0.0)
    }
}

/// Визуальные targets, которые выставляют states
///
/// Presentation layer сглаживает их и публикует хосту; обратной связи
/// в state-логику нет.
#[derive(Component, Debug, Clone, Copy, Reflect)]
#[reflect(Component)]
pub struct VisualTargets {
    /// Целевой field of view (градусы)
    pub target_fov: f32,
    /// Целевой roll камеры от state (градусы, strafe tilt добавляется отдельно)
    pub target_tilt: f32,
    /// Амплитуда head bob (метры)
    pub bob_intensity: f32,
    /// Частота head bob (rad/sec)
    pub bob_speed: f32,
    /// Целевая высота камеры над ногами (метры)
    pub target_camera_y: f32,
}

impl Default for VisualTargets {
    fn default() -> Self {
        Self {
            target_fov: 60.0,
            target_tilt: 0.0,
            bob_intensity: 0.0,
            bob_speed: 10.0,
            target_camera_y: 1.75,
        }
    }
}

/// Ориентация головы/камеры (градусы)
///
/// yaw крутит корпус (горизонтальный basis движения), pitch только камеру.
#[derive(Component, Debug, Clone, Copy, Default, Reflect)]
#[reflect(Component)]
pub struct HeadOrientation {
    pub yaw: f32,
    /// Положительный pitch — взгляд вверх; clamp ±90°
    pub pitch: f32,
    /// Текущий сглаженный roll (state tilt + strafe tilt)
    pub tilt: f32,
}

impl HeadOrientation {
    fn yaw_rotation(&self) -> Quat {
        // Положительный yaw = поворот вправо (по часовой сверху)
        Quat::from_rotation_y(-self.yaw.to_radians())
    }

    /// Горизонтальный forward (для движения и ledge probe)
    pub fn forward(&self) -> Vec3 {
        self.yaw_rotation() * Vec3::NEG_Z
    }

    pub fn right(&self) -> Vec3 {
        self.yaw_rotation() * Vec3::X
    }

    /// Полное направление взгляда с учётом pitch (для launcher aim)
    pub fn look_direction(&self) -> Vec3 {
        Quat::from_euler(
            EulerRot::YXZ,
            -self.yaw.to_radians(),
            self.pitch.to_radians(),
            0.0,
        ) * Vec3::NEG_Z
    }
}

/// Сглаженное текущее состояние камеры (presentation-owned)
#[derive(Component, Debug, Clone, Copy, Reflect)]
#[reflect(Component)]
pub struct CameraFeel {
    pub fov: f32,
    pub camera_y: f32,
    pub bob_timer: f32,
}

impl Default for CameraFeel {
    fn default() -> Self {
        Self {
            fov: 60.0,
            camera_y: 1.75,
            bob_timer: 0.0,
        }
    }
}

/// Immutable снимок input за тик
///
/// Хост обновляет его до запуска simulation chain; headless тесты
/// пишут его напрямую (mock input).
#[derive(Component, Debug, Clone, Copy, Default, Reflect)]
#[reflect(Component)]
pub struct InputSnapshot {
    /// (strafe, forward) в [-1, 1]
    pub move_axes: Vec2,
    /// Смещение мыши за тик
    pub look_delta: Vec2,
    /// Jump/ability кнопка (Space): прыжок на земле, slow time/fall в воздухе
    pub ability_held: bool,
    pub sprint: bool,
    pub crouch: bool,
    pub fire: bool,
}

impl InputSnapshot {
    pub fn has_move_input(&self) -> bool {
        self.move_axes.length_squared() > 0.01
    }
}
