// Service layer - everything with I/O or external effects
//
// The session core stays pure; durable storage, the sandbox runtime and
// logging setup all live behind the seams defined here.

pub mod persistence;
pub mod sandbox;
pub mod tracing_setup;

pub use persistence::{InMemoryGateway, PersistError, PersistenceGateway};
pub use sandbox::{
    LocalSandbox, LocalSandboxLauncher, MirrorError, MirrorStatus, SandboxError, SandboxLauncher,
    SandboxMirror, SandboxRuntime,
};
