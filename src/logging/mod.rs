//! Structured Logging
//!
//! One `tracing` subscriber for the collision core and the game embedding it.
//! Each collision subsystem gets its own level so per-frame regime decisions
//! can be turned up without drowning in everything else. `RUST_LOG` wins over
//! the configured levels, and only the first initialisation takes effect.

use bevy::prelude::*;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Once;
use tracing_subscriber::EnvFilter;

const CRATE_TARGET: &str = "hybrid_collision";

/// Serializable mirror of `tracing::Level`
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            LogLevel::Trace => "trace",
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
        };
        f.write_str(name)
    }
}

/// Subscriber settings. Levels apply to `hybrid_collision::<subsystem>`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TracingConfig {
    /// Everything outside the collision crate
    pub level: LogLevel,
    /// Dispatcher and resolvers (regime choice, probe hits, fallbacks)
    pub collision: LogLevel,
    /// Chunk publishing and rejected chunk data
    pub heightfield: LogLevel,
    /// Config file watching and reloads
    pub hotreload: LogLevel,
    /// Raw `EnvFilter` directives appended last, e.g. `"bevy_ecs=warn"`
    pub extra_directives: Vec<String>,
    pub show_targets: bool,
    pub show_source_location: bool,
}

impl Default for TracingConfig {
    fn default() -> Self {
        Self {
            level: LogLevel::Info,
            collision: LogLevel::Info,
            heightfield: LogLevel::Info,
            hotreload: LogLevel::Info,
            extra_directives: Vec::new(),
            show_targets: true,
            show_source_location: false,
        }
    }
}

impl TracingConfig {
    /// Follow every per-entity regime decision
    pub fn trace_collisions() -> Self {
        Self {
            collision: LogLevel::Trace,
            show_source_location: true,
            ..Default::default()
        }
    }

    pub fn to_env_filter_string(&self) -> String {
        let subsystems = [
            ("collision", self.collision),
            ("heightfield", self.heightfield),
            ("hotreload", self.hotreload),
        ];
        std::iter::once(self.level.to_string())
            .chain(
                subsystems
                    .into_iter()
                    .filter(|(_, level)| *level != self.level)
                    .map(|(module, level)| format!("{CRATE_TARGET}::{module}={level}")),
            )
            .chain(self.extra_directives.iter().cloned())
            .collect::<Vec<_>>()
            .join(",")
    }
}

static SUBSCRIBER: Once = Once::new();

pub fn init_tracing_default() {
    init_tracing(&TracingConfig::default());
}

/// Install the global subscriber; later calls are no-ops
pub fn init_tracing(config: &TracingConfig) {
    let directives = config.to_env_filter_string();
    let show_targets = config.show_targets;
    let show_source = config.show_source_location;

    SUBSCRIBER.call_once(move || {
        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(directives));
        let installed = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(show_targets)
            .with_file(show_source)
            .with_line_number(show_source)
            .compact()
            .try_init();
        // bevy's LogPlugin or a test harness may own the global subscriber
        if installed.is_err() {
            tracing::debug!("global subscriber already set");
        }
    });
}

/// Installs the subscriber while the app is being built
#[derive(Default)]
pub struct LoggingPlugin {
    pub config: TracingConfig,
}

impl Plugin for LoggingPlugin {
    fn build(&self, _app: &mut App) {
        init_tracing(&self.config);
    }
}

/// Guard for a span covering a batch of simulated frames
pub struct SimulationSpan {
    _entered: tracing::span::EnteredSpan,
}

impl SimulationSpan {
    pub fn enter(label: &'static str, frames: u32) -> Self {
        Self {
            _entered: tracing::info_span!("simulation", label, frames).entered(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_filter_is_just_the_base_level() {
        assert_eq!(TracingConfig::default().to_env_filter_string(), "info");
    }

    #[test]
    fn test_subsystem_overrides_and_extras() {
        let config = TracingConfig {
            level: LogLevel::Warn,
            hotreload: LogLevel::Debug,
            extra_directives: vec!["bevy_ecs=error".to_string()],
            ..TracingConfig::trace_collisions()
        };
        assert_eq!(
            config.to_env_filter_string(),
            "warn,hybrid_collision::collision=trace,hybrid_collision::heightfield=info,\
             hybrid_collision::hotreload=debug,bevy_ecs=error"
        );
    }

    #[test]
    fn test_config_from_ron_uses_defaults() {
        let config: TracingConfig = ron::from_str("(collision: trace, show_targets: false)").unwrap();
        assert_eq!(config.collision, LogLevel::Trace);
        assert_eq!(config.level, LogLevel::Info);
        assert!(!config.show_targets);
    }

    #[test]
    fn test_init_tracing_idempotent() {
        init_tracing_default();
        init_tracing(&TracingConfig::trace_collisions());
        let _span = SimulationSpan::enter("test", 1);
        tracing::debug!("inside span");
    }
}
