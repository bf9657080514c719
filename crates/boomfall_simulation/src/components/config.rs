//! Tuning-конфиг игрока + fail-fast валидация
//!
//! Все значения — из оригинального level design (platforming + demolition).
//! Хост может загрузить конфиг из данных (serde) вместо Default.

use bevy::prelude::*;
use serde::{Deserialize, Serialize};

/// Полный tuning контроллера игрока
///
/// Один компонент на player entity; states читают его каждый тик.
/// Менять на лету можно, но валидация выполняется только при спавне.
#[derive(Component, Debug, Clone, Reflect, Serialize, Deserialize)]
#[reflect(Component)]
pub struct PlayerConfig {
    // Locomotion
    pub walk_speed: f32,
    pub sprint_speed: f32,
    pub crouch_speed: f32,
    pub jump_speed: f32,
    /// Базовая гравитация (m/s²), положительная
    pub gravity: f32,
    pub slide_duration: f32,
    pub slide_speed: f32,
    pub mouse_sensitivity: f32,
    /// Наклон камеры при стрейфе (градусы)
    pub strafe_tilt_amount: f32,

    // Slow fall
    /// Сниженная гравитация при удержании ability во время падения
    pub slow_fall_gravity: f32,
    /// Скорость перехода между normal и slow гравитацией (1/sec)
    pub gravity_transition_speed: f32,
    /// Минимальная вертикальная скорость (отрицательная) для активации slow fall
    pub min_fall_speed_for_slow_fall: f32,

    // Time slow
    /// Глобальный time scale пока ability активна, (0, 1]
    pub time_slow_scale: f32,
    /// Запас slow-time в секундах реального времени (300 = 5 минут)
    pub max_slow_time_seconds: f32,

    // Visuals
    pub normal_fov: f32,
    pub sprint_fov: f32,
    pub slide_fov_boost: f32,
    /// Скорость сглаживания FOV (1/sec)
    pub fov_change_speed: f32,
    pub bob_amount: f32,
    pub bob_speed: f32,

    // Heights
    pub standing_camera_height: f32,
    pub crouching_camera_height: f32,
    pub standing_controller_height: f32,
    pub crouching_controller_height: f32,
    pub controller_radius: f32,

    // Ledge
    pub ledge_detection_distance: f32,

    // Swimming
    pub swim_speed: f32,
    pub swim_sprint_speed: f32,
    /// Демпфирование скорости в воде (1/sec)
    pub water_drag: f32,
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            walk_speed: 3.0,
            sprint_speed: 5.0,
            crouch_speed: 1.5,
            jump_speed: 4.0,
            gravity: 9.81,
            slide_duration: 0.7,
            slide_speed: 6.0,
            mouse_sensitivity: 2.0,
            strafe_tilt_amount: 2.0,

            slow_fall_gravity: 3.0,
            gravity_transition_speed: 5.0,
            min_fall_speed_for_slow_fall: -2.0,

            time_slow_scale: 0.5,
            max_slow_time_seconds: 300.0, // 5 минут real time

            normal_fov: 60.0,
            sprint_fov: 75.0,
            slide_fov_boost: 5.0,
            fov_change_speed: 8.0,
            bob_amount: 0.001,
            bob_speed: 10.0,

            standing_camera_height: 1.75,
            crouching_camera_height: 1.0,
            standing_controller_height: 1.8,
            crouching_controller_height: 1.0,
            controller_radius: 0.4,

            ledge_detection_distance: 1.0,

            swim_speed: 4.0,
            swim_sprint_speed: 6.0,
            water_drag: 2.0,
        }
    }
}

impl PlayerConfig {
    /// Fail-fast проверка конфига при спавне игрока
    ///
    /// Ошибка здесь — ошибка конфигурации уровня, дальше тикать нельзя:
    /// downstream системы считают значения валидными и не перепроверяют.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let positive = [
            ("walk_speed", self.walk_speed),
            ("sprint_speed", self.sprint_speed),
            ("crouch_speed", self.crouch_speed),
            ("jump_speed", self.jump_speed),
            ("gravity", self.gravity),
            ("slide_duration", self.slide_duration),
            ("slide_speed", self.slide_speed),
            ("gravity_transition_speed", self.gravity_transition_speed),
            ("max_slow_time_seconds", self.max_slow_time_seconds),
            ("normal_fov", self.normal_fov),
            ("fov_change_speed", self.fov_change_speed),
            ("standing_camera_height", self.standing_camera_height),
            ("crouching_camera_height", self.crouching_camera_height),
            ("standing_controller_height", self.standing_controller_height),
            ("crouching_controller_height", self.crouching_controller_height),
            ("controller_radius", self.controller_radius),
            ("ledge_detection_distance", self.ledge_detection_distance),
            ("swim_speed", self.swim_speed),
            ("water_drag", self.water_drag),
        ];
        for (field, value) in positive {
            if value <= 0.0 {
                return Err(ConfigError::NonPositive { field, value });
            }
        }

        if self.time_slow_scale <= 0.0 || self.time_slow_scale > 1.0 {
            return Err(ConfigError::TimeSlowScaleOutOfRange(self.time_slow_scale));
        }
        if self.slow_fall_gravity <= 0.0 || self.slow_fall_gravity > self.gravity {
            return Err(ConfigError::SlowFallAboveNormal {
                slow_fall: self.slow_fall_gravity,
                normal: self.gravity,
            });
        }
        if self.crouching_controller_height >= self.standing_controller_height {
            return Err(ConfigError::CrouchAboveStanding {
                crouching: self.crouching_controller_height,
                standing: self.standing_controller_height,
            });
        }

        Ok(())
    }
}

/// Ошибка конфигурации игрока (surface-ится громко при спавне)
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigError {
    NonPositive { field: &'static str, value: f32 },
    TimeSlowScaleOutOfRange(f32),
    SlowFallAboveNormal { slow_fall: f32, normal: f32 },
    CrouchAboveStanding { crouching: f32, standing: f32 },
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::NonPositive { field, value } => {
                write!(f, "PlayerConfig.{} must be positive, got {}", field, value)
            }
            ConfigError::TimeSlowScaleOutOfRange(value) => {
                write!(f, "PlayerConfig.time_slow_scale must be in (0, 1], got {}", value)
            }
            ConfigError::SlowFallAboveNormal { slow_fall, normal } => {
                write!(
                    f,
                    "PlayerConfig.slow_fall_gravity ({}) must be in (0, gravity = {}]",
                    slow_fall, normal
                )
            }
            ConfigError::CrouchAboveStanding { crouching, standing } => {
                write!(
                    f,
                    "PlayerConfig.crouching_controller_height ({}) must be below standing ({})",
                    crouching, standing
                )
            }
        }
    }
}

impl std::error::Error for ConfigError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(PlayerConfig::default().validate().is_ok());
    }

    #[test]
    fn test_rejects_zero_speed() {
        let cfg = PlayerConfig {
            walk_speed: 0.0,
            ..default()
        };
        assert_eq!(
            cfg.validate(),
            Err(ConfigError::NonPositive {
                field: "walk_speed",
                value: 0.0
            })
        );
    }

    #[test]
    fn test_rejects_bad_time_slow_scale() {
        let cfg = PlayerConfig {
            time_slow_scale: 1.5,
            ..default()
        };
        assert_eq!(cfg.validate(), Err(ConfigError::TimeSlowScaleOutOfRange(1.5)));

        let cfg = PlayerConfig {
            time_slow_scale: 0.0,
            ..default()
        };
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn test_rejects_slow_fall_above_gravity() {
        let cfg = PlayerConfig {
            slow_fall_gravity: 12.0,
            ..default()
        };
        assert!(matches!(
            cfg.validate(),
            Err(ConfigError::SlowFallAboveNormal { .. })
        ));
    }

    #[test]
    fn test_rejects_crouch_height_above_standing() {
        let cfg = PlayerConfig {
            crouching_controller_height: 2.0,
            ..default()
        };
        assert!(matches!(
            cfg.validate(),
            Err(ConfigError::CrouchAboveStanding { .. })
        ));
    }
}
