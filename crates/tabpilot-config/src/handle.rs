//! Live configuration handle and file watcher.
//!
//! Consumers hold a [`ConfigHandle`] and read `current()` when they start a
//! unit of work. Updates are published through a `watch` channel so long-lived
//! tasks can also `subscribe()` to changes.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use notify::{Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::{mpsc, watch};
use tracing::{debug, error, info, warn};

use crate::error::ConfigError;
use crate::loader::ConfigLoader;
use crate::schema::Config;
use crate::validator::ConfigValidator;

struct HandleInner {
    tx: watch::Sender<Arc<Config>>,
    source: Option<PathBuf>,
}

/// Shared, injectable view of the current configuration.
#[derive(Clone)]
pub struct ConfigHandle {
    inner: Arc<HandleInner>,
}

impl ConfigHandle {
    /// Create a handle with no backing file.
    pub fn new(config: Config) -> Self {
        let (tx, _rx) = watch::channel(Arc::new(config));
        Self {
            inner: Arc::new(HandleInner { tx, source: None }),
        }
    }

    /// Load from `path` (defaults when the file is absent) and remember it for `reload()`.
    pub fn from_path(path: impl Into<PathBuf>) -> Result<Self, ConfigError> {
        let path = path.into();
        let config = ConfigLoader::load_or_default(&path)?;
        let (tx, _rx) = watch::channel(Arc::new(config));
        Ok(Self {
            inner: Arc::new(HandleInner {
                tx,
                source: Some(path),
            }),
        })
    }

    /// Snapshot of the current configuration.
    pub fn current(&self) -> Arc<Config> {
        self.inner.tx.borrow().clone()
    }

    /// Receive every future update.
    pub fn subscribe(&self) -> watch::Receiver<Arc<Config>> {
        self.inner.tx.subscribe()
    }

    /// Backing file, if any.
    pub fn source(&self) -> Option<&Path> {
        self.inner.source.as_deref()
    }

    /// Replace the configuration after validating it.
    pub fn update(&self, config: Config) -> Result<(), ConfigError> {
        let result = ConfigValidator::validate(&config)?;
        if let Some(first) = result.errors.first() {
            return Err(ConfigError::InvalidValue {
                field: first.path.clone(),
                message: first.message.clone(),
            });
        }
        for warning in &result.warnings {
            debug!("Config warning at {}: {}", warning.path, warning.message);
        }
        self.inner.tx.send_replace(Arc::new(config));
        Ok(())
    }

    /// Re-read the backing file. Without one this is a no-op.
    pub fn reload(&self) -> Result<(), ConfigError> {
        let Some(path) = self.inner.source.as_deref() else {
            return Ok(());
        };
        let config = ConfigLoader::load_or_default(path)?;
        self.update(config)?;
        info!("Configuration reloaded from {}", path.display());
        Ok(())
    }
}

/// Watches a config file and reloads the handle after changes settle.
pub struct ConfigWatcher {
    _watcher: RecommendedWatcher,
    shutdown_tx: mpsc::Sender<()>,
}

impl ConfigWatcher {
    /// Start watching the handle's backing file.
    pub fn start(handle: ConfigHandle) -> Result<Self, ConfigError> {
        let path = handle
            .source()
            .map(Path::to_path_buf)
            .ok_or_else(|| ConfigError::Watch("config handle has no backing file".to_string()))?;
        let file_name = path
            .file_name()
            .map(|n| n.to_os_string())
            .ok_or_else(|| ConfigError::Watch(format!("not a file path: {}", path.display())))?;
        // Editors often replace the file, so watch its directory.
        let dir = match path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
            _ => PathBuf::from("."),
        };

        let (event_tx, mut event_rx) = mpsc::channel::<Event>(100);
        let (shutdown_tx, mut shutdown_rx) = mpsc::channel::<()>(1);

        let mut watcher = RecommendedWatcher::new(
            move |result: Result<Event, notify::Error>| {
                if let Ok(event) = result {
                    let _ = event_tx.blocking_send(event);
                }
            },
            notify::Config::default().with_poll_interval(Duration::from_secs(1)),
        )?;
        watcher.watch(&dir, RecursiveMode::NonRecursive)?;
        info!("Watching config file: {}", path.display());

        tokio::spawn(async move {
            let mut debounce_timer: Option<tokio::time::Instant> = None;
            let debounce_duration = Duration::from_millis(500);

            loop {
                tokio::select! {
                    Some(event) = event_rx.recv() => {
                        let relevant = matches!(
                            event.kind,
                            EventKind::Create(_) | EventKind::Modify(_)
                        ) && event
                            .paths
                            .iter()
                            .any(|p| p.file_name() == Some(file_name.as_os_str()));
                        if relevant {
                            debug!("Config change detected: {:?}", event.paths);
                            debounce_timer = Some(tokio::time::Instant::now());
                        }
                    }
                    _ = shutdown_rx.recv() => {
                        info!("Config watcher shutting down");
                        break;
                    }
                    _ = tokio::time::sleep(Duration::from_millis(100)) => {
                        if let Some(timer) = debounce_timer {
                            if timer.elapsed() >= debounce_duration {
                                debounce_timer = None;
                                match handle.reload() {
                                    Ok(()) => {}
                                    Err(ConfigError::InvalidValue { field, message }) => {
                                        warn!("Ignoring invalid config ({}: {}), keeping previous", field, message);
                                    }
                                    Err(e) => error!("Failed to reload config: {}", e),
                                }
                            }
                        }
                    }
                }
            }
        });

        Ok(Self {
            _watcher: watcher,
            shutdown_tx,
        })
    }

    /// Stop the background reload task.
    pub async fn stop(&self) {
        let _ = self.shutdown_tx.send(()).await;
    }
}
