//! Movement state machine домен
//!
//! - state: MoveState enum (один активный вариант на игрока)
//! - fsm: чистый step() + drive_state_machine система + enter/exit эффекты

use bevy::prelude::*;
use bevy_rapier3d::prelude::Velocity;

use crate::components::{MovementContext, PlayerController};

pub mod fsm;
pub mod state;

pub use fsm::{apply_enter, apply_exit, drive_state_machine, falling_fov, step};
pub use state::MoveState;

/// Система: синхронизация velocity в Rapier
///
/// Позицию интегрируют сами states; Rapier у kinematic тела получает
/// velocity только для collision resolution.
pub fn sync_velocity_to_rapier(
    mut query: Query<(&MovementContext, &mut Velocity), With<PlayerController>>,
) {
    for (context, mut rapier_velocity) in query.iter_mut() {
        rapier_velocity.linvel = context.velocity;
    }
}
