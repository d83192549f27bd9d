// Playground library - exposes all core modules for testing

pub mod config;
pub mod model;
pub mod services;
pub mod session;

pub use config::PlaygroundConfig;
pub use model::{FileId, TemplateFile, TemplateFolder, TemplateItem, TreeError};
pub use services::{
    InMemoryGateway, LocalSandboxLauncher, MirrorError, MirrorStatus, PersistError,
    PersistenceGateway, SandboxError, SandboxLauncher, SandboxMirror, SandboxRuntime,
};
pub use session::{OpenFile, PlaygroundSession, SessionError};
