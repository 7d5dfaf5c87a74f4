pub mod config_manager;

use serde::{Deserialize, Serialize};

use crate::config::config_manager::Config;
use crate::limits::DEFAULT_VIEW_DISTANCE;

/// Runtime-tunable world settings, persisted via [`config_manager::ConfigManager`]
/// the same way the engine persists window placement.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct WorldConfig {
    pub view_distance: i32,
    pub terrain_seed: u32,
}

impl Default for WorldConfig {
    fn default() -> Self {
        WorldConfig {
            view_distance: DEFAULT_VIEW_DISTANCE,
            terrain_seed: 0,
        }
    }
}

impl Config for WorldConfig {
    fn get_path() -> &'static str {
        "world.ron"
    }

    fn is_valid(&self) -> bool {
        self.view_distance > 0
    }
}
