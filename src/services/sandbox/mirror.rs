//! One-way mirror from the session's template tree into a sandbox filesystem
//!
//! The mirror owns the sandbox lifecycle for one session: at most one live
//! runtime, concurrent boot requests coalesced onto the in-flight boot, and
//! writes queued while the boot is pending. Mirroring is best-effort; a
//! failed write is recorded and surfaced but never retried, and it never
//! touches the session's own tree or buffers.

use std::fmt;
use std::sync::Arc;
use std::sync::Mutex as StdMutex;

use once_cell::sync::Lazy;
use tokio::sync::{oneshot, Mutex};

use super::{SandboxError, SandboxLauncher, SandboxRuntime};
use crate::model::template::path_segments;
use crate::model::TemplateFolder;

/// Directories never pushed into the sandbox; the runtime regenerates them.
static DEFAULT_IGNORED_DIRS: Lazy<Vec<String>> = Lazy::new(|| {
    ["node_modules", ".git", "target"]
        .iter()
        .map(|s| s.to_string())
        .collect()
});

/// Errors surfaced by mirror operations
#[derive(Debug, Clone)]
pub enum MirrorError {
    /// No boot has been requested for this session
    NotBooted,
    /// The mirror was torn down; the sandbox no longer exists
    TornDown,
    /// The last boot attempt failed
    BootFailed(String),
    /// The runtime rejected an operation
    Sandbox(SandboxError),
}

impl fmt::Display for MirrorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MirrorError::NotBooted => write!(f, "sandbox has not been booted"),
            MirrorError::TornDown => write!(f, "sandbox mirror is torn down"),
            MirrorError::BootFailed(message) => write!(f, "sandbox boot failed: {}", message),
            MirrorError::Sandbox(e) => write!(f, "{}", e),
        }
    }
}

impl std::error::Error for MirrorError {}

impl From<SandboxError> for MirrorError {
    fn from(e: SandboxError) -> Self {
        MirrorError::Sandbox(e)
    }
}

/// Observable lifecycle state of the mirror
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MirrorStatus {
    Idle,
    Booting,
    Ready,
    Failed(String),
    TornDown,
}

/// A filesystem operation deferred until boot completes
enum Pending {
    Write { path: String, content: String },
    EnsureDir { path: String },
}

enum MirrorState {
    Idle,
    Booting {
        waiters: Vec<oneshot::Sender<Result<(), MirrorError>>>,
        queued: Vec<Pending>,
    },
    Ready {
        runtime: Arc<dyn SandboxRuntime>,
    },
    Failed {
        message: String,
    },
    TornDown,
}

/// Per-session sandbox mirror
pub struct SandboxMirror {
    launcher: Arc<dyn SandboxLauncher>,
    state: Mutex<MirrorState>,
    ignored_dirs: Vec<String>,
    /// Message of the most recent failed mirror write, if any
    last_error: StdMutex<Option<String>>,
}

impl SandboxMirror {
    pub fn new(launcher: Arc<dyn SandboxLauncher>) -> Self {
        Self {
            launcher,
            state: Mutex::new(MirrorState::Idle),
            ignored_dirs: DEFAULT_IGNORED_DIRS.clone(),
            last_error: StdMutex::new(None),
        }
    }

    /// Override the ignored-directory list (see `PlaygroundConfig`).
    pub fn with_ignored_dirs(mut self, dirs: Vec<String>) -> Self {
        self.ignored_dirs = dirs;
        self
    }

    /// Boot the sandbox, reusing the live instance when one exists.
    ///
    /// Concurrent callers coalesce: only the first starts a boot, the rest
    /// wait for its outcome. A boot that completes after `teardown` discards
    /// the fresh instance instead of resurrecting the session.
    pub async fn boot(&self) -> Result<(), MirrorError> {
        let waiter = {
            let mut state = self.state.lock().await;
            match &mut *state {
                MirrorState::Ready { .. } => return Ok(()),
                MirrorState::Booting { waiters, .. } => {
                    let (tx, rx) = oneshot::channel();
                    waiters.push(tx);
                    Some(rx)
                }
                MirrorState::Idle | MirrorState::Failed { .. } | MirrorState::TornDown => {
                    *state = MirrorState::Booting {
                        waiters: Vec::new(),
                        queued: Vec::new(),
                    };
                    None
                }
            }
        };

        if let Some(rx) = waiter {
            // Another caller owns the boot; wait for its result.
            return rx.await.unwrap_or(Err(MirrorError::TornDown));
        }

        tracing::debug!("booting sandbox");
        let boot_result = self.launcher.boot().await;

        let mut state = self.state.lock().await;
        // The session may have been torn down while the boot was in flight;
        // in that case the new instance is irrelevant and must be released.
        if matches!(*state, MirrorState::TornDown) {
            if let Ok(runtime) = boot_result {
                tracing::debug!("boot finished after teardown, discarding instance");
                runtime.teardown().await;
            }
            return Err(MirrorError::TornDown);
        }

        let (waiters, queued) = match std::mem::replace(&mut *state, MirrorState::Idle) {
            MirrorState::Booting { waiters, queued } => (waiters, queued),
            other => {
                // Nothing else transitions out of Booting, so this is our own
                // state; restore whatever was found and bail.
                *state = other;
                return Err(MirrorError::TornDown);
            }
        };

        match boot_result {
            Ok(runtime) => {
                tracing::info!(queued = queued.len(), "sandbox ready, flushing queued writes");
                for pending in queued {
                    if let Err(e) = self.apply(&runtime, &pending).await {
                        self.record_error(&e);
                        tracing::warn!(error = %e, "queued mirror write failed");
                    }
                }
                *state = MirrorState::Ready { runtime };
                drop(state);
                for tx in waiters {
                    let _ = tx.send(Ok(()));
                }
                Ok(())
            }
            Err(e) => {
                let message = e.to_string();
                tracing::warn!(error = %message, "sandbox boot failed");
                *state = MirrorState::Failed {
                    message: message.clone(),
                };
                drop(state);
                for tx in waiters {
                    let _ = tx.send(Err(MirrorError::BootFailed(message.clone())));
                }
                Err(MirrorError::BootFailed(message))
            }
        }
    }

    /// Push one file into the sandbox, creating parent directories first.
    ///
    /// While a boot is pending the write is queued and flushed (in order) on
    /// readiness. Without a boot, or after teardown, the call fails instead
    /// of silently dropping bytes.
    pub async fn write_file(&self, path: &str, content: &str) -> Result<(), MirrorError> {
        let runtime = {
            let mut state = self.state.lock().await;
            match &mut *state {
                MirrorState::Ready { runtime } => Arc::clone(runtime),
                MirrorState::Booting { queued, .. } => {
                    queued.push(Pending::Write {
                        path: path.to_string(),
                        content: content.to_string(),
                    });
                    tracing::trace!(path, "mirror write queued until boot completes");
                    return Ok(());
                }
                MirrorState::Idle => return Err(MirrorError::NotBooted),
                MirrorState::Failed { message } => {
                    return Err(MirrorError::BootFailed(message.clone()))
                }
                MirrorState::TornDown => return Err(MirrorError::TornDown),
            }
        };

        let result = self
            .apply(
                &runtime,
                &Pending::Write {
                    path: path.to_string(),
                    content: content.to_string(),
                },
            )
            .await;
        if let Err(e) = &result {
            self.record_error(e);
        }
        result
    }

    /// Ensure a directory exists in the sandbox (used for empty folders;
    /// file writes create their own ancestors).
    pub async fn ensure_dir(&self, path: &str) -> Result<(), MirrorError> {
        let runtime = {
            let mut state = self.state.lock().await;
            match &mut *state {
                MirrorState::Ready { runtime } => Arc::clone(runtime),
                MirrorState::Booting { queued, .. } => {
                    queued.push(Pending::EnsureDir {
                        path: path.to_string(),
                    });
                    return Ok(());
                }
                MirrorState::Idle => return Err(MirrorError::NotBooted),
                MirrorState::Failed { message } => {
                    return Err(MirrorError::BootFailed(message.clone()))
                }
                MirrorState::TornDown => return Err(MirrorError::TornDown),
            }
        };

        let result = self
            .apply(
                &runtime,
                &Pending::EnsureDir {
                    path: path.to_string(),
                },
            )
            .await;
        if let Err(e) = &result {
            self.record_error(e);
        }
        result
    }

    /// Push every file of a template tree (the initial mount). Ignored
    /// directories are skipped. Stops at the first failure; files already
    /// written stay written, mirror consistency is best-effort.
    pub async fn mirror_tree(&self, root: &TemplateFolder) -> Result<(), MirrorError> {
        for (path, file) in root.files() {
            if self.is_ignored(&path) {
                continue;
            }
            self.write_file(&path, &file.content).await?;
        }
        Ok(())
    }

    /// Preview URL of the live runtime, if booted and exposing one.
    pub async fn preview_url(&self) -> Option<String> {
        match &*self.state.lock().await {
            MirrorState::Ready { runtime } => runtime.preview_url(),
            _ => None,
        }
    }

    pub async fn status(&self) -> MirrorStatus {
        match &*self.state.lock().await {
            MirrorState::Idle => MirrorStatus::Idle,
            MirrorState::Booting { .. } => MirrorStatus::Booting,
            MirrorState::Ready { .. } => MirrorStatus::Ready,
            MirrorState::Failed { message } => MirrorStatus::Failed(message.clone()),
            MirrorState::TornDown => MirrorStatus::TornDown,
        }
    }

    /// Message of the most recent failed mirror write, if any.
    pub fn last_error(&self) -> Option<String> {
        self.last_error.lock().expect("mirror error lock").clone()
    }

    /// Release the sandbox. Queued writes are dropped, pending boot waiters
    /// are failed, and an in-flight boot will discard its instance.
    pub async fn teardown(&self) {
        let previous = {
            let mut state = self.state.lock().await;
            std::mem::replace(&mut *state, MirrorState::TornDown)
        };
        match previous {
            MirrorState::Ready { runtime } => {
                runtime.teardown().await;
                tracing::info!("sandbox mirror torn down");
            }
            MirrorState::Booting { waiters, queued } => {
                if !queued.is_empty() {
                    tracing::warn!(dropped = queued.len(), "teardown dropped queued writes");
                }
                for tx in waiters {
                    let _ = tx.send(Err(MirrorError::TornDown));
                }
            }
            _ => {}
        }
    }

    fn is_ignored(&self, path: &str) -> bool {
        path_segments(path)
            .iter()
            .any(|segment| self.ignored_dirs.iter().any(|dir| dir == segment))
    }

    fn record_error(&self, e: &MirrorError) {
        *self.last_error.lock().expect("mirror error lock") = Some(e.to_string());
    }

    async fn apply(
        &self,
        runtime: &Arc<dyn SandboxRuntime>,
        pending: &Pending,
    ) -> Result<(), MirrorError> {
        match pending {
            Pending::Write { path, content } => {
                // Parent directories must exist before the file write.
                let mut segments = path_segments(path);
                segments.pop();
                if !segments.is_empty() {
                    runtime.mkdir_recursive(&segments.join("/")).await?;
                }
                runtime.write_file(path, content).await?;
                tracing::trace!(path, "mirrored file");
                Ok(())
            }
            Pending::EnsureDir { path } => {
                runtime.mkdir_recursive(path).await?;
                Ok(())
            }
        }
    }
}
