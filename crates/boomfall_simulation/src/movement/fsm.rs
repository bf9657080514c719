//! Движок state machine: per-state update + transition предикаты
//!
//! Чистая функция step() делает один тик активного состояния и решает,
//! куда переходить; система drive_state_machine применяет exit/enter
//! эффекты при смене варианта.
//!
//! Порядок предикатов фиксирован: земля → ledge → вода. Возврат на землю
//! всегда выигрывает у одновременно сработавших ledge/воды. Ни один
//! предикат не сработал — состояние остаётся (перехода по умолчанию нет).

use bevy::prelude::*;

use super::state::MoveState;
use crate::components::{
    HeadOrientation, InputSnapshot, MovementContext, PlayerConfig, PlayerController, VisualTargets,
};
use crate::sensors::SensorReadings;
use crate::timeflow::{exp_blend, GravityBlend};

// Падение: FOV ramp
const FALL_FOV_MIN_SPEED: f32 = 5.0;
const FALL_FOV_MAX_SPEED: f32 = 30.0;
const FALL_FOV_BOOST: f32 = 20.0;

// Air control в падении (доля walk speed)
const AIR_CONTROL_FACTOR: f32 = 0.8;

// Sprint bob
const SPRINT_BOB_SPEED_FACTOR: f32 = 1.4;

// Slide camera roll (градусы)
const SLIDE_CAMERA_TILT: f32 = 5.0;

// Ledge climb
const LEDGE_CLIMB_SPEED: f32 = 5.0;
const LEDGE_ARRIVE_EPSILON: f32 = 0.05;

// Вход в воду гасит вертикальную скорость
const WATER_ENTRY_DAMPING: f32 = 0.3;
// Вертикальная компонента плавания (доля swim speed)
const SWIM_ASCEND_FACTOR: f32 = 0.8;
// Пассивное погружение без input (m/s)
const SWIM_SINK_SPEED: f32 = 0.5;

/// FOV в падении: линейный ramp от скорости падения,
/// [min..max] → [normal..normal+boost], clamp
pub fn falling_fov(normal_fov: f32, fall_speed: f32) -> f32 {
    if fall_speed > FALL_FOV_MIN_SPEED {
        let normalized = ((fall_speed - FALL_FOV_MIN_SPEED)
            / (FALL_FOV_MAX_SPEED - FALL_FOV_MIN_SPEED))
            .clamp(0.0, 1.0);
        normal_fov + FALL_FOV_BOOST * normalized
    } else {
        normal_fov
    }
}

/// Горизонтальное направление движения из input + yaw basis.
/// Диагональ не даёт буста (clamp длины до 1).
fn move_direction(input: &InputSnapshot, head: &HeadOrientation) -> Vec3 {
    let dir = head.right() * input.move_axes.x + head.forward() * input.move_axes.y;
    if dir.length_squared() > 1.0 {
        dir.normalize()
    } else {
        dir
    }
}

/// Один тик активного состояния.
///
/// Мутирует context/position/visuals и возвращает:
/// - None — состояние и его данные не меняются
/// - Some(тот же вариант) — refresh данных (таймер slide), без exit/enter
/// - Some(другой вариант) — переход
#[allow(clippy::too_many_arguments)]
pub fn step(
    state: &MoveState,
    ctx: &mut MovementContext,
    position: &mut Vec3,
    visuals: &mut VisualTargets,
    cfg: &PlayerConfig,
    input: &InputSnapshot,
    head: &HeadOrientation,
    sensors: &SensorReadings,
    effective_gravity: f32,
    dt: f32,
) -> Option<MoveState> {
    match state {
        MoveState::Grounded => update_grounded(ctx, position, visuals, cfg, input, head, sensors, dt),
        MoveState::Crouching => update_crouching(ctx, position, cfg, input, head, sensors, dt),
        MoveState::Sliding { remaining, direction } => {
            update_sliding(*remaining, *direction, ctx, position, cfg, input, sensors, dt)
        }
        MoveState::Falling => update_falling(
            ctx,
            position,
            visuals,
            cfg,
            input,
            head,
            sensors,
            effective_gravity,
            dt,
        ),
        MoveState::LedgeGrab { climb_target } => {
            update_ledge_grab(*climb_target, ctx, position, input, dt)
        }
        MoveState::Swimming => update_swimming(ctx, position, visuals, cfg, input, head, sensors, dt),
    }
}

#[allow(clippy::too_many_arguments)]
fn update_grounded(
    ctx: &mut MovementContext,
    position: &mut Vec3,
    visuals: &mut VisualTargets,
    cfg: &PlayerConfig,
    input: &InputSnapshot,
    head: &HeadOrientation,
    sensors: &SensorReadings,
    dt: f32,
) -> Option<MoveState> {
    let speed = if input.sprint {
        cfg.sprint_speed
    } else {
        cfg.walk_speed
    };
    let dir = move_direction(input, head);
    ctx.velocity = Vec3::new(dir.x * speed, 0.0, dir.z * speed);
    *position += ctx.velocity * dt;

    let moving = input.has_move_input();
    visuals.target_fov = if input.sprint && moving {
        cfg.sprint_fov
    } else {
        cfg.normal_fov
    };
    visuals.bob_intensity = if moving { cfg.bob_amount } else { 0.0 };
    visuals.bob_speed = cfg.bob_speed
        * if input.sprint {
            SPRINT_BOB_SPEED_FACTOR
        } else {
            1.0
        };

    // Ability на земле = прыжок; slow time в воздухе обслуживает timeflow
    if input.ability_held {
        ctx.velocity.y = cfg.jump_speed;
        return Some(MoveState::Falling);
    }
    if !sensors.grounded {
        return Some(MoveState::Falling);
    }
    if input.crouch && input.sprint && moving {
        let slide_dir = if dir.length_squared() > 0.01 {
            dir.normalize()
        } else {
            head.forward()
        };
        return Some(MoveState::Sliding {
            remaining: cfg.slide_duration,
            direction: slide_dir,
        });
    }
    if input.crouch {
        return Some(MoveState::Crouching);
    }
    // Ledge vault только при движении вперёд на стену
    if input.move_axes.y > 0.0 {
        if let Some(climb_target) = sensors.ledge {
            return Some(MoveState::LedgeGrab { climb_target });
        }
    }
    if sensors.in_water {
        return Some(MoveState::Swimming);
    }
    None
}

#[allow(clippy::too_many_arguments)]
fn update_falling(
    ctx: &mut MovementContext,
    position: &mut Vec3,
    visuals: &mut VisualTargets,
    cfg: &PlayerConfig,
    input: &InputSnapshot,
    head: &HeadOrientation,
    sensors: &SensorReadings,
    effective_gravity: f32,
    dt: f32,
) -> Option<MoveState> {
    // Вертикаль интегрирует ТОЛЬКО это состояние, и только через
    // эффективную гравитацию (slow fall уже вblend'ен)
    ctx.velocity.y -= effective_gravity * dt;

    let dir = move_direction(input, head);
    let air_speed = cfg.walk_speed * AIR_CONTROL_FACTOR;
    ctx.velocity.x = dir.x * air_speed;
    ctx.velocity.z = dir.z * air_speed;

    *position += ctx.velocity * dt;

    visuals.target_fov = falling_fov(cfg.normal_fov, ctx.velocity.y.abs());

    // Земля → ledge → вода; первый сработавший выигрывает
    if sensors.grounded && ctx.velocity.y <= 0.0 {
        return Some(MoveState::Grounded);
    }
    if let Some(climb_target) = sensors.ledge {
        return Some(MoveState::LedgeGrab { climb_target });
    }
    if sensors.in_water {
        return Some(MoveState::Swimming);
    }
    None
}

fn update_crouching(
    ctx: &mut MovementContext,
    position: &mut Vec3,
    cfg: &PlayerConfig,
    input: &InputSnapshot,
    head: &HeadOrientation,
    sensors: &SensorReadings,
    dt: f32,
) -> Option<MoveState> {
    let dir = move_direction(input, head);
    ctx.velocity = Vec3::new(dir.x * cfg.crouch_speed, 0.0, dir.z * cfg.crouch_speed);
    *position += ctx.velocity * dt;

    if !sensors.grounded {
        return Some(MoveState::Falling);
    }
    // Встаём только если над головой пусто
    if !input.crouch && !sensors.ceiling {
        return Some(MoveState::Grounded);
    }
    if sensors.in_water {
        return Some(MoveState::Swimming);
    }
    None
}

#[allow(clippy::too_many_arguments)]
fn update_sliding(
    remaining: f32,
    direction: Vec3,
    ctx: &mut MovementContext,
    position: &mut Vec3,
    cfg: &PlayerConfig,
    input: &InputSnapshot,
    sensors: &SensorReadings,
    dt: f32,
) -> Option<MoveState> {
    ctx.velocity = Vec3::new(
        direction.x * cfg.slide_speed,
        0.0,
        direction.z * cfg.slide_speed,
    );
    *position += ctx.velocity * dt;

    if !sensors.grounded {
        return Some(MoveState::Falling);
    }

    let next_remaining = remaining - dt;
    if next_remaining <= 0.0 {
        // Подкат кончился: остаёмся низко если crouch держат или мешает потолок
        if input.crouch || sensors.ceiling {
            return Some(MoveState::Crouching);
        }
        return Some(MoveState::Grounded);
    }

    // Data refresh того же варианта — без exit/enter
    Some(MoveState::Sliding {
        remaining: next_remaining,
        direction,
    })
}

fn update_ledge_grab(
    climb_target: Vec3,
    ctx: &mut MovementContext,
    position: &mut Vec3,
    input: &InputSnapshot,
    dt: f32,
) -> Option<MoveState> {
    // Во время climb'а гравитация и input движения не действуют
    ctx.velocity = Vec3::ZERO;

    // Crouch = отпустить уступ
    if input.crouch {
        return Some(MoveState::Falling);
    }

    let to_target = climb_target - *position;
    let distance = to_target.length();
    if distance <= LEDGE_ARRIVE_EPSILON {
        return Some(MoveState::Grounded);
    }

    let step_len = (LEDGE_CLIMB_SPEED * dt).min(distance);
    *position += to_target / distance * step_len;
    None
}

#[allow(clippy::too_many_arguments)]
fn update_swimming(
    ctx: &mut MovementContext,
    position: &mut Vec3,
    visuals: &mut VisualTargets,
    cfg: &PlayerConfig,
    input: &InputSnapshot,
    head: &HeadOrientation,
    sensors: &SensorReadings,
    dt: f32,
) -> Option<MoveState> {
    let speed = if input.sprint {
        cfg.swim_sprint_speed
    } else {
        cfg.swim_speed
    };
    let dir = move_direction(input, head);
    let mut target = Vec3::new(dir.x * speed, 0.0, dir.z * speed);
    if input.ability_held {
        target.y = speed * SWIM_ASCEND_FACTOR;
    } else if input.crouch {
        target.y = -speed * SWIM_ASCEND_FACTOR;
    } else {
        target.y = -SWIM_SINK_SPEED;
    }

    // Water drag: velocity ползёт к target, резких рывков нет
    let blend = exp_blend(cfg.water_drag, dt);
    ctx.velocity += (target - ctx.velocity) * blend;
    *position += ctx.velocity * dt;

    visuals.target_fov = cfg.normal_fov;

    if !sensors.in_water {
        // Выход из воды: земля приоритетнее воздуха
        if sensors.grounded {
            return Some(MoveState::Grounded);
        }
        return Some(MoveState::Falling);
    }
    None
}

/// Exit эффекты старого состояния (ровно один раз на деактивацию)
pub fn apply_exit(state: &MoveState, cfg: &PlayerConfig, ctx: &mut MovementContext, visuals: &mut VisualTargets) {
    match state {
        MoveState::Falling => {
            visuals.target_fov = cfg.normal_fov;
        }
        MoveState::Crouching | MoveState::Sliding { .. } => {
            visuals.target_camera_y = cfg.standing_camera_height;
            ctx.controller_height = cfg.standing_controller_height;
            visuals.target_tilt = 0.0;
            visuals.target_fov = cfg.normal_fov;
        }
        MoveState::Grounded | MoveState::LedgeGrab { .. } | MoveState::Swimming => {}
    }
}

/// Enter эффекты нового состояния (ровно один раз на активацию)
pub fn apply_enter(state: &MoveState, cfg: &PlayerConfig, ctx: &mut MovementContext, visuals: &mut VisualTargets) {
    match state {
        MoveState::Grounded => {
            ctx.velocity.y = 0.0;
            visuals.target_fov = cfg.normal_fov;
            visuals.target_camera_y = cfg.standing_camera_height;
            visuals.target_tilt = 0.0;
            visuals.bob_speed = cfg.bob_speed;
        }
        MoveState::Crouching => {
            visuals.target_camera_y = cfg.crouching_camera_height;
            ctx.controller_height = cfg.crouching_controller_height;
            visuals.target_fov = cfg.normal_fov;
            visuals.bob_intensity = 0.0;
        }
        MoveState::Sliding { .. } => {
            visuals.target_camera_y = cfg.crouching_camera_height;
            ctx.controller_height = cfg.crouching_controller_height;
            visuals.target_fov = cfg.sprint_fov + cfg.slide_fov_boost;
            visuals.target_tilt = SLIDE_CAMERA_TILT;
            visuals.bob_intensity = 0.0;
        }
        MoveState::Falling => {
            visuals.target_fov = cfg.normal_fov;
            visuals.bob_intensity = 0.0;
            visuals.target_tilt = 0.0;
        }
        MoveState::LedgeGrab { .. } => {
            ctx.velocity = Vec3::ZERO;
            visuals.target_fov = cfg.normal_fov;
            visuals.target_tilt = 0.0;
            visuals.bob_intensity = 0.0;
        }
        MoveState::Swimming => {
            ctx.velocity.y *= WATER_ENTRY_DAMPING;
            visuals.target_fov = cfg.normal_fov;
            visuals.target_tilt = 0.0;
            visuals.bob_intensity = 0.0;
        }
    }
}

/// Система: тик state machine (после сенсоров, до presentation)
pub fn drive_state_machine(
    mut players: Query<
        (
            Entity,
            &PlayerConfig,
            &InputSnapshot,
            &HeadOrientation,
            &SensorReadings,
            &GravityBlend,
            &mut MoveState,
            &mut MovementContext,
            &mut VisualTargets,
            &mut Transform,
        ),
        With<PlayerController>,
    >,
    time: Res<Time>,
) {
    let dt = time.delta_secs();
    for (entity, cfg, input, head, sensors, gravity, mut state, mut ctx, mut visuals, mut transform) in
        players.iter_mut()
    {
        let next = step(
            &state,
            &mut ctx,
            &mut transform.translation,
            &mut visuals,
            cfg,
            input,
            head,
            sensors,
            gravity.current,
            dt,
        );

        let Some(next) = next else {
            continue;
        };

        if state.is_transition_to(&next) {
            apply_exit(&state, cfg, &mut ctx, &mut visuals);
            crate::logger::log(&format!(
                "FSM: {:?} {} → {}",
                entity,
                state.name(),
                next.name()
            ));
            apply_enter(&next, cfg, &mut ctx, &mut visuals);
        }
        *state = next;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Harness {
        state: MoveState,
        ctx: MovementContext,
        position: Vec3,
        visuals: VisualTargets,
        cfg: PlayerConfig,
        input: InputSnapshot,
        head: HeadOrientation,
        sensors: SensorReadings,
        gravity: f32,
        enters: usize,
        exits: usize,
    }

    impl Harness {
        fn new(state: MoveState) -> Self {
            Self {
                state,
                ctx: MovementContext::default(),
                position: Vec3::ZERO,
                visuals: VisualTargets::default(),
                cfg: PlayerConfig::default(),
                input: InputSnapshot::default(),
                head: HeadOrientation::default(),
                sensors: SensorReadings::default(),
                gravity: 9.81,
                enters: 0,
                exits: 0,
            }
        }

        /// Один тик как в drive_state_machine, со счётчиками enter/exit
        fn tick(&mut self, dt: f32) {
            let next = step(
                &self.state,
                &mut self.ctx,
                &mut self.position,
                &mut self.visuals,
                &self.cfg,
                &self.input,
                &self.head,
                &self.sensors,
                self.gravity,
                dt,
            );
            if let Some(next) = next {
                if self.state.is_transition_to(&next) {
                    apply_exit(&self.state, &self.cfg, &mut self.ctx, &mut self.visuals);
                    self.exits += 1;
                    apply_enter(&next, &self.cfg, &mut self.ctx, &mut self.visuals);
                    self.enters += 1;
                }
                self.state = next;
            }
        }
    }

    #[test]
    fn test_falling_fov_mapping() {
        // fall speed 10 (min 5, max 30, normal 60) → 60 + 20*(5/25) = 64
        assert_eq!(falling_fov(60.0, 10.0), 64.0);
        // Ниже порога — normal
        assert_eq!(falling_fov(60.0, 3.0), 60.0);
        // Clamp сверху
        assert_eq!(falling_fov(60.0, 100.0), 80.0);
    }

    #[test]
    fn test_ground_priority_over_ledge() {
        let mut h = Harness::new(MoveState::Falling);
        h.ctx.velocity.y = -3.0;
        // Оба предиката истинны одновременно
        h.sensors.grounded = true;
        h.sensors.ledge = Some(Vec3::new(0.0, 2.0, -1.0));

        h.tick(1.0 / 60.0);
        assert_eq!(h.state, MoveState::Grounded, "ground return must win over ledge");
    }

    #[test]
    fn test_no_predicate_keeps_state() {
        let mut h = Harness::new(MoveState::Falling);
        h.ctx.velocity.y = -1.0;
        // В воздухе, без ledge и воды
        for _ in 0..30 {
            h.tick(1.0 / 60.0);
        }
        assert_eq!(h.state, MoveState::Falling);
        assert_eq!(h.enters, 0);
        assert_eq!(h.exits, 0);
    }

    #[test]
    fn test_jump_from_grounded() {
        let mut h = Harness::new(MoveState::Grounded);
        h.sensors.grounded = true;
        h.input.ability_held = true;

        h.tick(1.0 / 60.0);
        assert_eq!(h.state, MoveState::Falling);
        // Прыжок задал вертикальную скорость (enter Falling её не трогает)
        assert!(h.ctx.velocity.y > 0.0);
        assert!((h.ctx.velocity.y - h.cfg.jump_speed).abs() < h.cfg.gravity * 0.1);
    }

    #[test]
    fn test_falling_integrates_effective_gravity() {
        let mut h = Harness::new(MoveState::Falling);
        h.gravity = 3.0; // slow fall уже вblend'ен
        let dt = 1.0 / 60.0;

        h.tick(dt);
        assert!((h.ctx.velocity.y + 3.0 * dt).abs() < 1e-5);
    }

    #[test]
    fn test_slide_runs_out_into_grounded() {
        let mut h = Harness::new(MoveState::Grounded);
        h.sensors.grounded = true;
        h.input.sprint = true;
        h.input.crouch = true;
        h.input.move_axes = Vec2::new(0.0, 1.0);

        h.tick(1.0 / 60.0);
        assert!(matches!(h.state, MoveState::Sliding { .. }));
        assert_eq!(h.ctx.controller_height, h.cfg.crouching_controller_height);

        // Отпускаем crouch, докатываем подкат
        h.input.crouch = false;
        h.input.sprint = false;
        for _ in 0..60 {
            h.tick(1.0 / 60.0);
        }
        assert_eq!(h.state, MoveState::Grounded);
        assert_eq!(h.ctx.controller_height, h.cfg.standing_controller_height);
        // Один переход туда, один обратно
        assert_eq!(h.enters, 2);
        assert_eq!(h.exits, 2);
    }

    #[test]
    fn test_crouch_blocked_by_ceiling() {
        let mut h = Harness::new(MoveState::Crouching);
        h.sensors.grounded = true;
        h.sensors.ceiling = true;
        h.input.crouch = false;

        h.tick(1.0 / 60.0);
        // Потолок над головой — встать нельзя
        assert_eq!(h.state, MoveState::Crouching);

        h.sensors.ceiling = false;
        h.tick(1.0 / 60.0);
        assert_eq!(h.state, MoveState::Grounded);
    }

    #[test]
    fn test_ledge_climb_completes_into_grounded() {
        let target = Vec3::new(0.0, 2.8, -1.0);
        let mut h = Harness::new(MoveState::LedgeGrab {
            climb_target: target,
        });

        for _ in 0..120 {
            h.tick(1.0 / 60.0);
            if h.state == MoveState::Grounded {
                break;
            }
        }
        assert_eq!(h.state, MoveState::Grounded);
        assert!((h.position - target).length() < 0.1);
    }

    #[test]
    fn test_ledge_abort_falls() {
        let mut h = Harness::new(MoveState::LedgeGrab {
            climb_target: Vec3::new(0.0, 2.8, -1.0),
        });
        h.input.crouch = true;

        h.tick(1.0 / 60.0);
        assert_eq!(h.state, MoveState::Falling);
    }

    #[test]
    fn test_water_exit_prefers_grounded() {
        let mut h = Harness::new(MoveState::Swimming);
        h.sensors.in_water = false;
        h.sensors.grounded = true;

        h.tick(1.0 / 60.0);
        assert_eq!(h.state, MoveState::Grounded);

        let mut h = Harness::new(MoveState::Swimming);
        h.sensors.in_water = false;
        h.sensors.grounded = false;

        h.tick(1.0 / 60.0);
        assert_eq!(h.state, MoveState::Falling);
    }

    #[test]
    fn test_enter_exit_strictly_alternate() {
        let mut h = Harness::new(MoveState::Grounded);
        h.sensors.grounded = true;

        // Земля уходит → Falling
        h.sensors.grounded = false;
        h.tick(1.0 / 60.0);
        assert_eq!(h.state, MoveState::Falling);

        // Приземлились → Grounded
        h.ctx.velocity.y = -1.0;
        h.sensors.grounded = true;
        h.tick(1.0 / 60.0);
        assert_eq!(h.state, MoveState::Grounded);

        // Каждый переход = ровно один exit + один enter
        assert_eq!(h.enters, 2);
        assert_eq!(h.exits, 2);
    }

    #[test]
    fn test_falling_fov_written_during_fall() {
        let mut h = Harness::new(MoveState::Falling);
        h.ctx.velocity.y = -10.0;

        h.tick(1e-6); // почти нулевой dt, скорость не успевает измениться
        assert!((h.visuals.target_fov - 64.0).abs() < 0.01);
    }
}
