//! Simulation clock — единственный владелец глобального pacing
//!
//! Инвариант: весь мир замедляет ровно один компонент. Никто кроме
//! timeflow систем не трогает relative speed и fixed timestep.

use bevy::prelude::*;
use std::time::Duration;

use crate::components::PlayerController;

/// Владеет virtual time scale + fixed timestep
///
/// Fixed step масштабируется вместе со scale, чтобы физика оставалась
/// численно стабильной при замедлении.
#[derive(Resource, Debug)]
pub struct SimulationClock {
    original_step: Duration,
    current_rate: f32,
}

impl SimulationClock {
    pub fn new(original_step: Duration) -> Self {
        Self {
            original_step,
            current_rate: 1.0,
        }
    }

    pub fn rate(&self) -> f32 {
        self.current_rate
    }

    pub fn original_step(&self) -> Duration {
        self.original_step
    }

    /// Применяет rate к virtual time и fixed step
    ///
    /// При rate == 1.0 возвращается ровно original_step (mul_f32 дал бы
    /// набег округления через f32-секунды).
    pub fn set_rate(&mut self, rate: f32, virt: &mut Time<Virtual>, fixed: &mut Time<Fixed>) {
        self.current_rate = rate;
        virt.set_relative_speed(rate);
        let step = if rate == 1.0 {
            self.original_step
        } else {
            self.original_step.mul_f32(rate)
        };
        fixed.set_timestep(step);
    }

    /// Безусловный возврат к 1× и оригинальному fixed step
    pub fn reset(&mut self, virt: &mut Time<Virtual>, fixed: &mut Time<Fixed>) {
        self.set_rate(1.0, virt, fixed);
    }
}

/// Система: сброс clock при disable/despawn контроллера
///
/// Обязана сработать на любом пути деактивации (включая смерть посреди
/// активной ability) — иначе мир останется замедленным навсегда.
pub fn reset_clock_on_disable(
    mut removed: RemovedComponents<PlayerController>,
    mut clock: ResMut<SimulationClock>,
    mut dilation: ResMut<super::TimeDilation>,
    mut virt: ResMut<Time<Virtual>>,
    mut fixed: ResMut<Time<Fixed>>,
) {
    if removed.read().count() > 0 {
        dilation.force_reset();
        clock.reset(&mut virt, &mut fixed);
        crate::logger::log_info("SimulationClock reset (player controller disabled)");
    }
}
