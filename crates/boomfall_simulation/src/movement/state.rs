//! Movement состояния игрока

use bevy::prelude::*;

/// Состояния движения (ровно одно активно на игрока)
///
/// Варианты с данными несут state-local контекст: slide хранит
/// направление и остаток таймера, ledge grab — точку climb'а.
#[derive(Component, Debug, Clone, PartialEq, Reflect)]
#[reflect(Component)]
pub enum MoveState {
    /// На земле: walk/sprint, bob, прыжок
    Grounded,

    /// Присели: crouch speed, низкая камера, встать мешает потолок
    Crouching,

    /// Подкат из спринта: фиксированное направление, таймер
    Sliding {
        /// Остаток подката (секунды)
        remaining: f32,
        /// Направление, захваченное на входе (normalized, горизонтальное)
        direction: Vec3,
    },

    /// В воздухе: эффективная гравитация, air control, FOV от скорости падения
    Falling,

    /// Зацепились за уступ: движемся к climb target
    LedgeGrab {
        /// Куда закончить climb (от ledge probe)
        climb_target: Vec3,
    },

    /// В воде: swim скорости, drag
    Swimming,
}

impl Default for MoveState {
    fn default() -> Self {
        Self::Grounded
    }
}

impl MoveState {
    /// Имя для логов/отладки
    pub fn name(&self) -> &'static str {
        match self {
            MoveState::Grounded => "Grounded",
            MoveState::Crouching => "Crouching",
            MoveState::Sliding { .. } => "Sliding",
            MoveState::Falling => "Falling",
            MoveState::LedgeGrab { .. } => "LedgeGrab",
            MoveState::Swimming => "Swimming",
        }
    }

    /// Смена варианта (а не обновление данных внутри того же варианта)?
    /// Только смена варианта прогоняет exit/enter эффекты.
    pub fn is_transition_to(&self, next: &MoveState) -> bool {
        std::mem::discriminant(self) != std::mem::discriminant(next)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_data_refresh_is_not_a_transition() {
        let sliding = MoveState::Sliding {
            remaining: 0.7,
            direction: Vec3::NEG_Z,
        };
        let ticked = MoveState::Sliding {
            remaining: 0.5,
            direction: Vec3::NEG_Z,
        };
        assert!(!sliding.is_transition_to(&ticked));
        assert!(sliding.is_transition_to(&MoveState::Grounded));
    }
}
