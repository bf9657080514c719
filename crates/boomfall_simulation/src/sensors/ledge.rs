//! Ledge / ceiling probes (multi-ray геометрические тесты)

use bevy::prelude::*;

use super::{ProbeLayer, SurfaceQuery};

// Геометрия ledge probe (метры, от ног игрока)
const CHEST_HEIGHT: f32 = 1.5;
const CLEARANCE_RISE: f32 = 0.6;
const CLEARANCE_FORWARD: f32 = 0.2;
const CLEARANCE_RAY_LENGTH: f32 = 0.5;
const LANDING_FORWARD: f32 = 0.4;
const LANDING_RAY_LENGTH: f32 = 1.0;
const STANDING_CLEARANCE: f32 = 1.0;

/// Ledge probe: можно ли зацепиться за уступ перед игроком
///
/// Три каста:
/// 1. forward ray с высоты груди → стена в пределах detection distance.
///    Hazard-поверхность (взрывчатка) сразу отклоняется.
/// 2. clearance ray чуть выше и вперёд → над уступом должно быть пусто.
/// 3. downward ray ещё дальше вперёд → поверхность приземления.
///    Hazard и здесь отклоняется.
///
/// Любой отсутствующий hit = нет ledge (не ошибка).
/// Climb target = точка приземления + standing clearance вверх.
pub fn ledge_probe(
    probe: &dyn SurfaceQuery,
    feet: Vec3,
    forward: Vec3,
    detection_distance: f32,
) -> Option<Vec3> {
    let wall_origin = feet + Vec3::Y * CHEST_HEIGHT;

    let wall = probe.raycast(wall_origin, forward, detection_distance, ProbeLayer::Ledge)?;
    if wall.hazard {
        return None;
    }

    let clearance_origin = wall_origin + Vec3::Y * CLEARANCE_RISE + forward * CLEARANCE_FORWARD;
    if probe
        .raycast(clearance_origin, forward, CLEARANCE_RAY_LENGTH, ProbeLayer::Ground)
        .is_some()
    {
        // Прямо над уступом стоит геометрия — не пролезем
        return None;
    }

    let landing = probe.raycast(
        clearance_origin + forward * LANDING_FORWARD,
        Vec3::NEG_Y,
        LANDING_RAY_LENGTH,
        ProbeLayer::Ground,
    )?;
    if landing.hazard {
        return None;
    }

    Some(landing.point + Vec3::Y * STANDING_CLEARANCE)
}

/// Ceiling probe: есть ли геометрия над головой (блокирует вставание)
///
/// Sphere cast вверх от макушки текущего (возможно присевшего) capsule
/// на расстояние до полной standing высоты.
pub fn ceiling_probe(
    probe: &dyn SurfaceQuery,
    feet: Vec3,
    current_height: f32,
    standing_height: f32,
    controller_radius: f32,
) -> bool {
    let radius = controller_radius * 0.9;
    let origin = feet + Vec3::Y * (current_height - radius);
    let check_distance = standing_height - current_height + 0.1;

    probe.sphere_cast(origin, radius, Vec3::Y, check_distance, ProbeLayer::Ground)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sensors::SurfaceHit;

    /// Mock мир: одна стена с уступом перед игроком
    struct LedgeWorld {
        /// Hazard tag на стене (первый ray)
        wall_hazard: bool,
        /// Hazard tag на поверхности приземления (третий ray)
        landing_hazard: bool,
        /// Геометрия в clearance зоне (второй ray)
        blocked_above: bool,
        /// Высота уступа
        ledge_top_y: f32,
    }

    impl Default for LedgeWorld {
        fn default() -> Self {
            Self {
                wall_hazard: false,
                landing_hazard: false,
                blocked_above: false,
                ledge_top_y: 1.8,
            }
        }
    }

    impl SurfaceQuery for LedgeWorld {
        fn raycast(
            &self,
            origin: Vec3,
            dir: Vec3,
            max_dist: f32,
            layer: ProbeLayer,
        ) -> Option<SurfaceHit> {
            if layer == ProbeLayer::Ledge {
                // Стена в 0.5м перед игроком
                if max_dist >= 0.5 {
                    return Some(SurfaceHit {
                        point: origin + dir * 0.5,
                        hazard: self.wall_hazard,
                    });
                }
                return None;
            }
            if dir == Vec3::NEG_Y {
                // Landing ray: попадаем в верх уступа
                if origin.y >= self.ledge_top_y && origin.y - self.ledge_top_y <= max_dist {
                    return Some(SurfaceHit {
                        point: Vec3::new(origin.x, self.ledge_top_y, origin.z),
                        hazard: self.landing_hazard,
                    });
                }
                return None;
            }
            // Clearance ray (горизонтальный, Ground layer)
            if self.blocked_above {
                return Some(SurfaceHit {
                    point: origin + dir * 0.1,
                    hazard: false,
                });
            }
            None
        }

        fn sphere_check(&self, _center: Vec3, _radius: f32, _layer: ProbeLayer) -> bool {
            false
        }

        fn sphere_cast(
            &self,
            _origin: Vec3,
            _radius: f32,
            _dir: Vec3,
            _max_dist: f32,
            _layer: ProbeLayer,
        ) -> bool {
            false
        }
    }

    #[test]
    fn test_ledge_found_on_clean_geometry() {
        let world = LedgeWorld::default();
        let result = ledge_probe(&world, Vec3::ZERO, Vec3::NEG_Z, 1.0);

        let target = result.expect("clean ledge must be climbable");
        // Climb target = верх уступа + standing clearance
        assert!((target.y - (1.8 + STANDING_CLEARANCE)).abs() < 1e-5);
    }

    #[test]
    fn test_hazard_wall_rejected() {
        let world = LedgeWorld {
            wall_hazard: true,
            ..default()
        };
        // Геометрия подходит, но первая поверхность — hazard
        assert_eq!(ledge_probe(&world, Vec3::ZERO, Vec3::NEG_Z, 1.0), None);
    }

    #[test]
    fn test_hazard_landing_rejected() {
        let world = LedgeWorld {
            landing_hazard: true,
            ..default()
        };
        assert_eq!(ledge_probe(&world, Vec3::ZERO, Vec3::NEG_Z, 1.0), None);
    }

    #[test]
    fn test_blocked_clearance_rejected() {
        let world = LedgeWorld {
            blocked_above: true,
            ..default()
        };
        assert_eq!(ledge_probe(&world, Vec3::ZERO, Vec3::NEG_Z, 1.0), None);
    }

    #[test]
    fn test_no_wall_means_no_ledge() {
        let world = LedgeWorld::default();
        // Стена в 0.5м, а detection distance короче
        assert_eq!(ledge_probe(&world, Vec3::ZERO, Vec3::NEG_Z, 0.3), None);
    }
}
