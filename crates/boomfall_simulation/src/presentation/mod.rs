//! Presentation layer: rotation + публикация визуальных targets
//!
//! One-way sink: states пишут targets, мы сглаживаем и отдаём хосту
//! событием PresentationFrame. Обратной связи в state-логику нет.

use bevy::prelude::*;

use crate::components::{
    CameraFeel, HeadOrientation, InputSnapshot, MovementContext, PlayerConfig, PlayerController,
    VisualTargets,
};
use crate::sensors::SensorReadings;
use crate::timeflow::exp_blend;

// Сглаживание tilt (1/sec, аналог SmoothDamp 0.1s)
const TILT_SMOOTH_RATE: f32 = 10.0;
// Сглаживание высоты камеры при crouch/stand (1/sec)
const CAMERA_HEIGHT_RATE: f32 = 8.0;

// Fall vignette ramp
const VIGNETTE_MIN_FALL_SPEED: f32 = 5.0;
const VIGNETTE_MAX_FALL_SPEED: f32 = 30.0;
const VIGNETTE_MAX_INTENSITY: f32 = 0.7;

/// Кадр для хоста: всё что нужно чтобы поставить камеру и overlay
#[derive(Event, Debug, Clone)]
pub struct PresentationFrame {
    pub player: Entity,
    /// Сглаженный field of view (градусы)
    pub fov: f32,
    pub yaw: f32,
    pub pitch: f32,
    /// Сглаженный roll камеры (state tilt + strafe tilt)
    pub tilt: f32,
    /// Высота камеры над ногами, с bob offset
    pub camera_y: f32,
    /// Интенсивность fall vignette [0, 0.7]
    pub vignette: f32,
}

/// Vignette от скорости падения: [min..max] → [0..max_intensity]
pub fn fall_vignette(fall_speed: f32) -> f32 {
    if fall_speed <= VIGNETTE_MIN_FALL_SPEED {
        return 0.0;
    }
    let normalized = ((fall_speed - VIGNETTE_MIN_FALL_SPEED)
        / (VIGNETTE_MAX_FALL_SPEED - VIGNETTE_MIN_FALL_SPEED))
        .clamp(0.0, 1.0);
    VIGNETTE_MAX_INTENSITY * normalized
}

/// Система: rotation (после state update)
///
/// Yaw крутит basis движения (применится со следующего тика, как и в
/// оригинальном порядке update'а), pitch clamp ±90°, tilt сглаживается
/// к state tilt + strafe tilt.
pub fn apply_rotation(
    mut players: Query<
        (&PlayerConfig, &InputSnapshot, &VisualTargets, &mut HeadOrientation),
        With<PlayerController>,
    >,
    time: Res<Time>,
) {
    let dt = time.delta_secs();
    for (config, input, visuals, mut head) in players.iter_mut() {
        head.yaw += input.look_delta.x * config.mouse_sensitivity;
        head.pitch =
            (head.pitch + input.look_delta.y * config.mouse_sensitivity).clamp(-90.0, 90.0);

        let strafe_tilt = -input.move_axes.x * config.strafe_tilt_amount;
        let combined_target = visuals.target_tilt + strafe_tilt;
        head.tilt += (combined_target - head.tilt) * exp_blend(TILT_SMOOTH_RATE, dt);
    }
}

/// Система: сглаживание камеры + публикация кадра (последняя в chain)
pub fn publish_frame(
    mut players: Query<
        (
            Entity,
            &PlayerConfig,
            &SensorReadings,
            &MovementContext,
            &VisualTargets,
            &HeadOrientation,
            &mut CameraFeel,
        ),
        With<PlayerController>,
    >,
    mut frames: EventWriter<PresentationFrame>,
    time: Res<Time>,
) {
    let dt = time.delta_secs();
    for (entity, config, sensors, context, visuals, head, mut feel) in players.iter_mut() {
        feel.fov += (visuals.target_fov - feel.fov) * exp_blend(config.fov_change_speed, dt);
        feel.camera_y +=
            (visuals.target_camera_y - feel.camera_y) * exp_blend(CAMERA_HEIGHT_RATE, dt);

        // Bob только на земле и в движении
        let bob_offset = if sensors.grounded && context.horizontal_speed() > 0.1 {
            feel.bob_timer += dt * visuals.bob_speed;
            feel.bob_timer.sin() * visuals.bob_intensity
        } else {
            feel.bob_timer = 0.0;
            0.0
        };

        frames.write(PresentationFrame {
            player: entity,
            fov: feel.fov,
            yaw: head.yaw,
            pitch: head.pitch,
            tilt: head.tilt,
            camera_y: feel.camera_y + bob_offset,
            vignette: fall_vignette(context.fall_speed()),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vignette_ramp() {
        assert_eq!(fall_vignette(0.0), 0.0);
        assert_eq!(fall_vignette(5.0), 0.0);
        // Середина диапазона: (17.5-5)/25 = 0.5 → 0.35
        assert!((fall_vignette(17.5) - 0.35).abs() < 1e-5);
        // Clamp сверху
        assert_eq!(fall_vignette(100.0), VIGNETTE_MAX_INTENSITY);
    }
}
