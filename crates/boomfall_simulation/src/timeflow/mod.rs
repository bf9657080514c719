//! Gravity/Time resource controller
//!
//! Владеет расходуемым slow-time бюджетом (TimeFuel), сглаженным global
//! time scale (TimeDilation) и сглаженной эффективной гравитацией
//! (GravityBlend). Обновляется строго первым в simulation chain — states
//! в этом же тике читают уже свежие значения.
//!
//! Расход fuel и сглаживание scale идут в unscaled (real) времени, чтобы
//! текущий time scale не влиял на скорость расхода.

use bevy::prelude::*;

use crate::components::{InputSnapshot, MovementContext, PlayerConfig, PlayerController};
use crate::sensors::SensorReadings;

pub mod clock;

pub use clock::{reset_clock_on_disable, SimulationClock};

/// Frame-rate-independent экспоненциальное сглаживание.
/// Возвращает долю пути к target за dt при заданном rate (1/sec).
pub fn exp_blend(rate: f32, dt: f32) -> f32 {
    1.0 - (-rate * dt).exp()
}

/// Расходуемый slow-time бюджет (секунды реального времени)
///
/// Инвариант: 0.0 ≤ remaining ≤ max, монотонно не растёт.
/// Регенерации нет — бюджет восстанавливается только спавном нового игрока.
#[derive(Component, Debug, Clone, Copy, Reflect)]
#[reflect(Component)]
pub struct TimeFuel {
    pub remaining: f32,
    pub max: f32,
}

impl Default for TimeFuel {
    fn default() -> Self {
        Self::new(300.0) // 5 минут real time
    }
}

impl TimeFuel {
    pub fn new(max: f32) -> Self {
        Self { remaining: max, max }
    }

    pub fn has_fuel(&self) -> bool {
        self.remaining > 0.0
    }

    pub fn fraction(&self) -> f32 {
        if self.max > 0.0 {
            self.remaining / self.max
        } else {
            0.0
        }
    }

    /// Списывает dt секунд, clamp до нуля.
    /// Возвращает true если после списания fuel ещё остался.
    pub fn deplete(&mut self, dt: f32) -> bool {
        self.remaining = (self.remaining - dt).max(0.0);
        self.remaining > 0.0
    }
}

/// Сглаженный global time scale
///
/// Target = slow_scale пока ability активна, иначе 1.0.
/// Сглаживание экспоненциальное с rate 8/sec в unscaled времени
/// (frame-rate-independent форма, не покадровый lerp).
#[derive(Resource, Debug, Clone, Copy)]
pub struct TimeDilation {
    pub current_scale: f32,
    pub slow_scale: f32,
    /// Скорость сглаживания scale (1/sec, unscaled)
    pub blend_rate: f32,
    /// Активна ли ability в этом тике (held + fuel остался)
    pub ability_active: bool,
}

impl Default for TimeDilation {
    fn default() -> Self {
        Self {
            current_scale: 1.0,
            slow_scale: 0.5,
            blend_rate: 8.0,
            ability_active: false,
        }
    }
}

impl TimeDilation {
    /// Один тик контроллера: расход fuel + blend scale.
    /// Возвращает новый current_scale.
    ///
    /// Fuel, дошедший до нуля, гасит ability в этом же тике —
    /// остаток на следующий тик не переносится.
    pub fn update(&mut self, ability_held: bool, fuel: &mut TimeFuel, dt_unscaled: f32) -> f32 {
        self.ability_active = ability_held && fuel.has_fuel();

        if self.ability_active && !fuel.deplete(dt_unscaled) {
            self.ability_active = false;
        }

        let target = if self.ability_active { self.slow_scale } else { 1.0 };
        self.current_scale += (target - self.current_scale) * exp_blend(self.blend_rate, dt_unscaled);
        self.current_scale
    }

    /// Мгновенный сброс (единственный разрешённый разрыв непрерывности —
    /// disable/reset контроллера)
    pub fn force_reset(&mut self) {
        self.current_scale = 1.0;
        self.ability_active = false;
    }
}

/// Сглаженная эффективная гравитация
///
/// Target = slow_fall пока игрок падает быстрее порога и держит ability,
/// иначе normal. Blend независим от time scale.
#[derive(Component, Debug, Clone, Copy, Reflect)]
#[reflect(Component)]
pub struct GravityBlend {
    /// Текущая применяемая гравитация (m/s², положительная)
    pub current: f32,
    pub normal: f32,
    pub slow_fall: f32,
    /// Скорость blend'а (1/sec)
    pub transition_rate: f32,
    /// Порог вертикальной скорости для slow fall (отрицательный)
    pub min_fall_speed: f32,
}

impl Default for GravityBlend {
    fn default() -> Self {
        Self {
            current: 9.81,
            normal: 9.81,
            slow_fall: 3.0,
            transition_rate: 5.0,
            min_fall_speed: -2.0,
        }
    }
}

impl GravityBlend {
    pub fn from_config(config: &PlayerConfig) -> Self {
        Self {
            current: config.gravity,
            normal: config.gravity,
            slow_fall: config.slow_fall_gravity,
            transition_rate: config.gravity_transition_speed,
            min_fall_speed: config.min_fall_speed_for_slow_fall,
        }
    }

    /// Один blend-шаг. `falling` = не на земле и опускаемся быстрее порога.
    pub fn update(&mut self, falling: bool, ability_held: bool, dt: f32) -> f32 {
        let target = if falling && ability_held {
            self.slow_fall
        } else {
            self.normal
        };
        self.current += (target - self.current) * exp_blend(self.transition_rate, dt);
        self.current
    }
}

/// Система: тик time dilation (строго первая в chain)
///
/// Читает unscaled delta, списывает fuel, двигает scale и толкает его
/// в SimulationClock (virtual speed + fixed step).
pub fn update_time_dilation(
    mut players: Query<(&InputSnapshot, &mut TimeFuel), With<PlayerController>>,
    mut dilation: ResMut<TimeDilation>,
    mut clock: ResMut<SimulationClock>,
    real: Res<Time<Real>>,
    mut virt: ResMut<Time<Virtual>>,
    mut fixed: ResMut<Time<Fixed>>,
) {
    let Ok((input, mut fuel)) = players.single_mut() else {
        return;
    };

    let had_fuel = fuel.has_fuel();
    let scale = dilation.update(input.ability_held, &mut fuel, real.delta_secs());
    clock.set_rate(scale, &mut virt, &mut fixed);

    if had_fuel && !fuel.has_fuel() {
        crate::logger::log_info("TimeFuel exhausted: slow time disabled until respawn");
    }
}

/// Система: blend эффективной гравитации (после dilation, до сенсоров)
///
/// Grounded flag — из сенсоров прошлого тика; для косметического blend'а
/// этого достаточно.
pub fn update_gravity_blend(
    mut players: Query<
        (&InputSnapshot, &SensorReadings, &MovementContext, &mut GravityBlend),
        With<PlayerController>,
    >,
    time: Res<Time>,
) {
    let dt = time.delta_secs();
    for (input, sensors, context, mut blend) in players.iter_mut() {
        let falling = !sensors.grounded && context.velocity.y < blend.min_fall_speed;
        blend.update(falling, input.ability_held, dt);
    }
}
