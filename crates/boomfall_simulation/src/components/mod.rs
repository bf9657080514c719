//! ECS Components для player simulation
//!
//! Организация по доменам:
//! - config: PlayerConfig tuning + валидация (ConfigError)
//! - context: MovementContext, VisualTargets, HeadOrientation, InputSnapshot
//! - player: PlayerController marker + spawn helper

pub mod config;
pub mod context;
pub mod player;

// Re-exports для удобного импорта
pub use config::*;
pub use context::*;
pub use player::*;
