//! Local on-disk sandbox runtime
//!
//! Backs the sandbox filesystem with a plain directory via `tokio::fs`.
//! Useful for tests and for embedders that point a dev server at the mirror
//! root instead of running an isolated runtime.

use std::path::{Component, Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;

use super::{SandboxError, SandboxLauncher, SandboxRuntime};

/// Map a slash-separated sandbox path onto the root directory, rejecting
/// absolute paths and `..` segments so writes cannot escape the root.
fn resolve(root: &Path, path: &str) -> Result<PathBuf, SandboxError> {
    let relative = Path::new(path);
    let escapes = relative.components().any(|component| {
        matches!(
            component,
            Component::ParentDir | Component::RootDir | Component::Prefix(_)
        )
    });
    if escapes || path.is_empty() {
        return Err(SandboxError::Write {
            path: path.to_string(),
            message: "path escapes the sandbox root".to_string(),
        });
    }
    Ok(root.join(relative))
}

/// A sandbox instance rooted at a local directory
pub struct LocalSandbox {
    root: PathBuf,
    preview_url: Option<String>,
    /// Shared with the launcher; cleared on teardown so a new boot is allowed
    live: Arc<AtomicBool>,
}

impl LocalSandbox {
    fn check_live(&self) -> Result<(), SandboxError> {
        if self.live.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(SandboxError::Unavailable)
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

#[async_trait]
impl SandboxRuntime for LocalSandbox {
    async fn mkdir_recursive(&self, path: &str) -> Result<(), SandboxError> {
        self.check_live()?;
        let target = resolve(&self.root, path)?;
        tokio::fs::create_dir_all(&target)
            .await
            .map_err(|e| SandboxError::Mkdir {
                path: path.to_string(),
                message: e.to_string(),
            })
    }

    async fn write_file(&self, path: &str, content: &str) -> Result<(), SandboxError> {
        self.check_live()?;
        let target = resolve(&self.root, path)?;
        tokio::fs::write(&target, content)
            .await
            .map_err(|e| SandboxError::Write {
                path: path.to_string(),
                message: e.to_string(),
            })
    }

    fn preview_url(&self) -> Option<String> {
        if self.live.load(Ordering::SeqCst) {
            self.preview_url.clone()
        } else {
            None
        }
    }

    async fn teardown(&self) {
        self.live.store(false, Ordering::SeqCst);
        tracing::debug!(root = %self.root.display(), "local sandbox torn down");
    }
}

/// Boots `LocalSandbox` instances over a fixed root directory
///
/// Enforces the singleton contract: while an instance is live, another boot
/// fails instead of producing a second instance over the same root.
pub struct LocalSandboxLauncher {
    root: PathBuf,
    preview_url: Option<String>,
    live: Arc<AtomicBool>,
}

impl LocalSandboxLauncher {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            preview_url: None,
            live: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Advertise a preview URL on booted instances.
    pub fn with_preview_url(mut self, url: impl Into<String>) -> Self {
        self.preview_url = Some(url.into());
        self
    }
}

#[async_trait]
impl SandboxLauncher for LocalSandboxLauncher {
    async fn boot(&self) -> Result<Arc<dyn SandboxRuntime>, SandboxError> {
        if self.live.swap(true, Ordering::SeqCst) {
            return Err(SandboxError::Boot(
                "only a single sandbox instance can be booted per session".to_string(),
            ));
        }
        if let Err(e) = tokio::fs::create_dir_all(&self.root).await {
            self.live.store(false, Ordering::SeqCst);
            return Err(SandboxError::Boot(e.to_string()));
        }
        tracing::info!(root = %self.root.display(), "local sandbox booted");
        Ok(Arc::new(LocalSandbox {
            root: self.root.clone(),
            preview_url: self.preview_url.clone(),
            live: Arc::clone(&self.live),
        }))
    }
}
