// ABOUTME: Watches the profile directory and reloads the service after debounced changes
// ABOUTME: Only create/modify/remove events on profile documents trigger a reload

use notify::{Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc::{unbounded_channel, UnboundedReceiver, UnboundedSender};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::error::Result;
use crate::service::PromptRouteService;

/// Debounced hot reload of a profile directory
pub struct ProfileWatcher {
    service: Arc<PromptRouteService>,
    dir: PathBuf,
    extension: String,
    debounce: Duration,
}

/// Running watcher. Dropping it stops the underlying OS watch.
pub struct WatchHandle {
    _watcher: RecommendedWatcher,
    task: JoinHandle<()>,
}

impl WatchHandle {
    pub fn stop(self) {
        self.task.abort();
    }

    pub async fn join(self) {
        let WatchHandle { _watcher, task } = self;
        if let Err(e) = task.await {
            if !e.is_cancelled() {
                error!("Profile watcher task failed: {}", e);
            }
        }
    }
}

impl ProfileWatcher {
    /// Watcher over the service's configured profile directory
    pub fn new(service: Arc<PromptRouteService>) -> Self {
        let config = service.config();
        let dir = config.loader.profiles_dir.clone();
        let extension = config.loader.extension.clone();
        let debounce = Duration::from_millis(config.watch.debounce_ms);
        Self {
            service,
            dir,
            extension,
            debounce,
        }
    }

    pub fn with_debounce(mut self, debounce: Duration) -> Self {
        self.debounce = debounce;
        self
    }

    /// Start the OS watcher and the reload task
    pub fn spawn(self) -> Result<WatchHandle> {
        let (tx, rx) = unbounded_channel();
        let watcher = self.os_watcher(tx)?;
        info!(
            "Watching {} for profile changes (debounce {}ms)",
            self.dir.display(),
            self.debounce.as_millis()
        );
        let task = tokio::spawn(self.run(rx));
        Ok(WatchHandle {
            _watcher: watcher,
            task,
        })
    }

    fn os_watcher(&self, tx: UnboundedSender<notify::Result<Event>>) -> Result<RecommendedWatcher> {
        let mut watcher = RecommendedWatcher::new(
            move |event| {
                let _ = tx.send(event);
            },
            notify::Config::default(),
        )?;
        watcher.watch(&self.dir, RecursiveMode::NonRecursive)?;
        Ok(watcher)
    }

    /// Reload loop over raw events; returns when the sender side closes
    pub async fn run(self, mut rx: UnboundedReceiver<notify::Result<Event>>) {
        while let Some(event) = rx.recv().await {
            if !self.is_relevant(event) {
                continue;
            }

            // Coalesce everything arriving within the debounce window
            loop {
                match tokio::time::timeout(self.debounce, rx.recv()).await {
                    Ok(Some(_)) => continue,
                    Ok(None) => break,
                    Err(_) => break,
                }
            }

            let response = self.service.reload().await;
            if response.success {
                info!(
                    "Hot reload loaded {} profiles (generation {})",
                    response.profiles_loaded, response.generation
                );
            } else {
                warn!(
                    "Hot reload reported a failure: {}",
                    response
                        .errors
                        .last()
                        .map(|issue| issue.message.as_str())
                        .unwrap_or("unknown error")
                );
            }
        }
        debug!("Profile watcher for {} stopped", self.dir.display());
    }

    fn is_relevant(&self, event: notify::Result<Event>) -> bool {
        match event {
            Ok(event) => is_profile_event(&event, &self.extension),
            Err(e) => {
                error!("Watcher error: {:?}", e);
                false
            }
        }
    }
}

/// Whether `event` creates, modifies or removes a profile document
pub fn is_profile_event(event: &Event, extension: &str) -> bool {
    let kind_matches = matches!(
        event.kind,
        EventKind::Create(_) | EventKind::Modify(_) | EventKind::Remove(_)
    );
    kind_matches && event.paths.iter().any(|p| has_extension(p, extension))
}

fn has_extension(path: &Path, extension: &str) -> bool {
    path.extension()
        .map(|ext| ext.to_string_lossy().eq_ignore_ascii_case(extension))
        .unwrap_or(false)
}
