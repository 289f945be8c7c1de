use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::constants::{
    DAMPING_REFERENCE_FPS, FOOTPRINT_INFLATION, GROUND_SNAP_MARGIN, HORIZONTAL_DAMPING,
    MAX_FALL_SPEED, MAX_WALKABLE_SLOPE, SLOPE_PROBE_DISTANCE,
};

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Config read error: {0}")]
    Io(#[from] std::io::Error),
    #[error("RON parse error: {0}")]
    Ron(#[from] ron::error::SpannedError),
    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Invalid {field}: {reason}")]
    Invalid { field: &'static str, reason: String },
}

/// How horizontal damping scales with the frame time
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DampingMode {
    /// Multiply by `horizontal_damping` once per frame, whatever the frame time
    PerFrame,
    /// Multiply by `horizontal_damping^(dt * 60)`
    TimeScaled,
}

/// Collision tuning
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CollisionConfig {
    pub max_walkable_slope: f32,
    pub slope_probe_distance: f32,
    pub ground_snap_margin: f32,
    pub horizontal_damping: f32,
    pub damping_mode: DampingMode,
    pub footprint_inflation: f32,
    pub max_fall_speed: f32,
}

impl Default for CollisionConfig {
    fn default() -> Self {
        Self {
            max_walkable_slope: MAX_WALKABLE_SLOPE,
            slope_probe_distance: SLOPE_PROBE_DISTANCE,
            ground_snap_margin: GROUND_SNAP_MARGIN,
            horizontal_damping: HORIZONTAL_DAMPING,
            damping_mode: DampingMode::PerFrame,
            footprint_inflation: FOOTPRINT_INFLATION,
            max_fall_speed: MAX_FALL_SPEED,
        }
    }
}

impl CollisionConfig {
    pub fn from_ron_str(source: &str) -> Result<Self, ConfigError> {
        let config: Self = ron::from_str(source)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_json_str(source: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(source)?;
        config.validate()?;
        Ok(config)
    }

    /// Load from disk; `.json` files are parsed as JSON, everything else as RON
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)?;
        if path.extension().is_some_and(|ext| ext == "json") {
            Self::from_json_str(&content)
        } else {
            Self::from_ron_str(&content)
        }
    }

    pub fn to_ron_string(&self) -> String {
        ron::ser::to_string_pretty(self, ron::ser::PrettyConfig::default()).unwrap_or_default()
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        positive("max_walkable_slope", self.max_walkable_slope)?;
        positive("slope_probe_distance", self.slope_probe_distance)?;
        non_negative("ground_snap_margin", self.ground_snap_margin)?;
        non_negative("footprint_inflation", self.footprint_inflation)?;
        positive("max_fall_speed", self.max_fall_speed)?;
        if !(self.horizontal_damping > 0.0 && self.horizontal_damping <= 1.0) {
            return Err(ConfigError::Invalid {
                field: "horizontal_damping",
                reason: format!("{} is outside (0, 1]", self.horizontal_damping),
            });
        }
        Ok(())
    }

    /// Horizontal velocity multiplier for a frame lasting `dt` seconds
    pub fn damping_factor(&self, dt: f32) -> f32 {
        match self.damping_mode {
            DampingMode::PerFrame => self.horizontal_damping,
            DampingMode::TimeScaled => self.horizontal_damping.powf(dt * DAMPING_REFERENCE_FPS),
        }
    }
}

fn positive(field: &'static str, value: f32) -> Result<(), ConfigError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(ConfigError::Invalid {
            field,
            reason: format!("{value} must be finite and > 0"),
        })
    }
}

fn non_negative(field: &'static str, value: f32) -> Result<(), ConfigError> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(ConfigError::Invalid {
            field,
            reason: format!("{value} must be finite and >= 0"),
        })
    }
}
