//! Sandboxed preview runtime
//!
//! The live preview runs the project inside an isolated runtime with its own
//! filesystem. This module defines the narrow capability surface the core
//! depends on (`SandboxLauncher`, `SandboxRuntime`), the one-way mirror that
//! pushes editor bytes into that filesystem (`SandboxMirror`), and a local
//! on-disk runtime used by tests and embedders without a real sandbox.

pub mod local;
pub mod mirror;

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;

pub use local::{LocalSandbox, LocalSandboxLauncher};
pub use mirror::{MirrorError, MirrorStatus, SandboxMirror};

/// Errors reported by a sandbox runtime or launcher
#[derive(Debug, Clone)]
pub enum SandboxError {
    /// The runtime could not be booted
    Boot(String),
    /// The runtime has been torn down and accepts no further operations
    Unavailable,
    /// A directory could not be created; `path` names the failing directory
    Mkdir { path: String, message: String },
    /// A file could not be written
    Write { path: String, message: String },
}

impl fmt::Display for SandboxError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SandboxError::Boot(message) => write!(f, "sandbox boot failed: {}", message),
            SandboxError::Unavailable => write!(f, "sandbox is not available"),
            SandboxError::Mkdir { path, message } => {
                write!(f, "failed to create directory {}: {}", path, message)
            }
            SandboxError::Write { path, message } => {
                write!(f, "failed to write file {}: {}", path, message)
            }
        }
    }
}

impl std::error::Error for SandboxError {}

/// Filesystem and lifecycle surface of a booted sandbox instance
///
/// Paths are slash-separated and relative to the sandbox root, matching the
/// template tree's file ids. Implementations must make `write_file` replace
/// existing content, so repeated writes with the same bytes are idempotent.
#[async_trait]
pub trait SandboxRuntime: Send + Sync {
    /// Create a directory, including missing ancestors.
    async fn mkdir_recursive(&self, path: &str) -> Result<(), SandboxError>;

    /// Write a file, replacing any previous content at that path. Parent
    /// directories must already exist.
    async fn write_file(&self, path: &str, content: &str) -> Result<(), SandboxError>;

    /// URL of the preview server, once the runtime exposes one.
    fn preview_url(&self) -> Option<String>;

    /// Release the instance. Further filesystem calls fail with
    /// `SandboxError::Unavailable`.
    async fn teardown(&self);
}

/// Boots sandbox instances
///
/// Runtimes are a scarce singleton resource: launchers must refuse to boot a
/// second instance while one is live rather than hand out two.
#[async_trait]
pub trait SandboxLauncher: Send + Sync {
    /// Boot a fresh runtime instance.
    ///
    /// # Errors
    ///
    /// Returns `SandboxError::Boot` when the environment refuses the boot,
    /// including the case where an instance is already live.
    async fn boot(&self) -> Result<Arc<dyn SandboxRuntime>, SandboxError>;
}
