//! Collision Config Hot-reload
//!
//! Watches the collision config file and re-applies it while the game runs.
//! Filesystem events are drained once per frame. A file is parsed and
//! validated before anything is applied, so a bad edit leaves the running
//! config untouched. Every attempt is reported as a `CollisionConfigReloaded`
//! event.

use bevy::prelude::*;
use notify::{Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use std::path::{Path, PathBuf};
use std::sync::mpsc::{channel, Receiver};
use std::sync::Mutex;

use crate::collision::CollisionSystem;
use crate::config::{CollisionConfig, ConfigError};

/// Re-applies `path` to the [`CollisionSystem`] whenever it changes on disk
pub struct CollisionConfigReloadPlugin {
    pub path: PathBuf,
}

impl CollisionConfigReloadPlugin {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl Plugin for CollisionConfigReloadPlugin {
    fn build(&self, app: &mut App) {
        app.insert_resource(ConfigReloadState::watching(self.path.clone()))
            .add_event::<CollisionConfigReloaded>()
            .add_systems(Startup, start_config_watcher)
            .add_systems(Update, reload_changed_config);
    }
}

/// Bookkeeping for the watched config file
#[derive(Resource, Debug, Default)]
pub struct ConfigReloadState {
    pub path: Option<PathBuf>,
    /// False until the watcher is running, and after it fails to start
    pub active: bool,
    pub applied: u32,
    pub rejected: u32,
    /// App time (seconds) of the last attempt
    pub last_attempt_secs: f64,
    pub last_rejection: Option<String>,
}

impl ConfigReloadState {
    fn watching(path: PathBuf) -> Self {
        Self {
            path: Some(path),
            ..Default::default()
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ReloadOutcome {
    Applied,
    /// Parse or validation failure; the previous config is still in use
    Rejected(String),
}

/// Sent after every reload attempt
#[derive(Event, Debug, Clone)]
pub struct CollisionConfigReloaded {
    pub path: PathBuf,
    pub outcome: ReloadOutcome,
}

impl CollisionConfigReloaded {
    pub fn applied(&self) -> bool {
        self.outcome == ReloadOutcome::Applied
    }
}

#[derive(Resource)]
struct ConfigWatcher {
    _watcher: RecommendedWatcher,
    events: Mutex<Receiver<notify::Result<Event>>>,
}

fn start_config_watcher(mut commands: Commands, mut state: ResMut<ConfigReloadState>) {
    let Some(path) = state.path.clone() else {
        return;
    };
    if !path.is_file() {
        warn!(path = %path.display(), "collision config missing, hot-reload disabled");
        return;
    }

    let (tx, rx) = channel();
    let mut watcher = match notify::recommended_watcher(tx) {
        Ok(watcher) => watcher,
        Err(e) => {
            error!("could not create config watcher: {}", e);
            return;
        }
    };

    // Editors often swap the file instead of writing it, so watch its directory
    let dir = path
        .parent()
        .filter(|dir| !dir.as_os_str().is_empty())
        .unwrap_or(Path::new("."));
    if let Err(e) = watcher.watch(dir, RecursiveMode::NonRecursive) {
        error!(dir = %dir.display(), "could not watch config directory: {}", e);
        return;
    }

    state.active = true;
    commands.insert_resource(ConfigWatcher {
        _watcher: watcher,
        events: Mutex::new(rx),
    });
    info!(path = %path.display(), "collision config hot-reload active");
}

fn reload_changed_config(
    watcher: Option<Res<ConfigWatcher>>,
    collision: Option<ResMut<CollisionSystem>>,
    mut state: ResMut<ConfigReloadState>,
    mut reloaded: EventWriter<CollisionConfigReloaded>,
    time: Res<Time>,
) {
    let (Some(watcher), Some(mut collision)) = (watcher, collision) else {
        return;
    };
    let Some(path) = state.path.clone() else {
        return;
    };

    // A single save tends to arrive as a burst of events
    let changed = match watcher.events.lock() {
        Ok(events) => events.try_iter().fold(false, |changed, result| match result {
            Ok(event) => changed | is_config_modify_event(&event, &path),
            Err(e) => {
                warn!("config watcher error: {}", e);
                changed
            }
        }),
        Err(_) => return,
    };

    if changed {
        reloaded.send(reload_into(&path, &mut collision, &mut state, time.elapsed_secs_f64()));
    }
}

/// Is `event` a write or (re)creation of the watched file?
pub fn is_config_modify_event(event: &Event, watched_file: &Path) -> bool {
    let Some(name) = watched_file.file_name() else {
        return false;
    };
    let relevant_kind = event.kind.is_modify() || matches!(event.kind, EventKind::Create(_));
    relevant_kind && event.paths.iter().any(|p| p.file_name() == Some(name))
}

/// Load and validate `path`, then apply it. On error nothing is applied.
pub fn apply_reload(path: &Path, collision: &mut CollisionSystem) -> Result<CollisionConfig, ConfigError> {
    let config = CollisionConfig::load(path)?;
    collision.set_config(config.clone());
    Ok(config)
}

/// Reload `path` into `collision` and record the attempt in `state`
pub fn reload_into(
    path: &Path,
    collision: &mut CollisionSystem,
    state: &mut ConfigReloadState,
    now_secs: f64,
) -> CollisionConfigReloaded {
    state.last_attempt_secs = now_secs;
    let outcome = match apply_reload(path, collision) {
        Ok(_) => {
            state.applied += 1;
            state.last_rejection = None;
            info!(applied = state.applied, "collision config reloaded");
            ReloadOutcome::Applied
        }
        Err(e) => {
            let reason = e.to_string();
            state.rejected += 1;
            state.last_rejection = Some(reason.clone());
            warn!("collision config rejected, keeping the running one: {}", reason);
            ReloadOutcome::Rejected(reason)
        }
    };
    CollisionConfigReloaded {
        path: path.to_path_buf(),
        outcome,
    }
}
