//! Смерть и рестарт уровня
//!
//! Хост (collision layer) присылает HazardContactEvent; мы помечаем
//! игрока Dead, снимаем PlayerController (что синхронно тянет сброс
//! SimulationClock через reset_clock_on_disable) и взводим рестарт-таймер.
//! Сам перезапуск сцены — забота хоста, мы отдаём RestartRequested.

use bevy::prelude::*;

use crate::components::PlayerController;

/// Тип контакта, завершающего забег
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HazardKind {
    /// Смертельное препятствие: мгновенный рестарт
    Lethal,
    /// Финиш уровня: рестарт с паузой на celebration
    Finish,
}

impl HazardKind {
    /// Задержка до рестарта (секунды)
    pub fn restart_delay(&self) -> f32 {
        match self {
            HazardKind::Lethal => 0.0,
            HazardKind::Finish => 2.0,
        }
    }
}

/// Event от хоста: игрок коснулся hazard/finish геометрии
#[derive(Event, Debug, Clone)]
pub struct HazardContactEvent {
    pub player: Entity,
    pub kind: HazardKind,
}

/// Event: игрок выбыл (для UI fade, звука)
#[derive(Event, Debug, Clone)]
pub struct PlayerDied {
    pub player: Entity,
    pub kind: HazardKind,
}

/// Event: пора перезапускать уровень (хост делает scene reload)
#[derive(Event, Debug, Clone)]
pub struct RestartRequested;

/// Маркер: игрок выбыл, simulation chain его больше не тикает
#[derive(Component, Debug)]
pub struct Dead;

/// Отсчёт до рестарта
#[derive(Component, Debug)]
pub struct RestartTimer {
    pub remaining: f32,
}

/// Система: обработка hazard контактов
///
/// Повторные контакты после первого игнорируются (игрок уже Dead).
pub fn handle_hazard_contacts(
    mut commands: Commands,
    mut contacts: EventReader<HazardContactEvent>,
    mut died: EventWriter<PlayerDied>,
    alive: Query<(), (With<PlayerController>, Without<Dead>)>,
) {
    // Removal уходит через commands (deferred), поэтому второй контакт
    // в том же тике отфильтровываем локально
    let mut handled: Vec<Entity> = Vec::new();
    for contact in contacts.read() {
        if handled.contains(&contact.player) || alive.get(contact.player).is_err() {
            continue;
        }
        handled.push(contact.player);

        commands
            .entity(contact.player)
            .insert(Dead)
            .insert(RestartTimer {
                remaining: contact.kind.restart_delay(),
            })
            // Disable контроллера: FSM/timeflow перестают тикать,
            // reset_clock_on_disable вернёт time scale к 1×
            .remove::<PlayerController>();

        died.write(PlayerDied {
            player: contact.player,
            kind: contact.kind,
        });

        match contact.kind {
            HazardKind::Lethal => {
                crate::logger::log_info(&format!("Player {:?} died (lethal obstacle)", contact.player))
            }
            HazardKind::Finish => {
                crate::logger::log_info(&format!("Player {:?} reached finish", contact.player))
            }
        }
    }
}

/// Система: тик рестарт-таймеров
///
/// Real time: clock к этому моменту уже сброшен, но завязываться на
/// virtual scale всё равно не хотим.
pub fn tick_restart_timers(
    mut commands: Commands,
    mut timers: Query<(Entity, &mut RestartTimer)>,
    mut restart: EventWriter<RestartRequested>,
    real: Res<Time<Real>>,
) {
    let dt = real.delta_secs();
    for (entity, mut timer) in timers.iter_mut() {
        timer.remaining -= dt;
        if timer.remaining <= 0.0 {
            commands.entity(entity).remove::<RestartTimer>();
            restart.write(RestartRequested);
            crate::logger::log_info("Level restart requested");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_restart_delays() {
        assert_eq!(HazardKind::Lethal.restart_delay(), 0.0);
        assert_eq!(HazardKind::Finish.restart_delay(), 2.0);
    }
}
