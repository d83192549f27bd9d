// Integration tests - sandbox mirror over a real directory

mod common;

use std::sync::Arc;

use tempfile::TempDir;

use playbench::{
    InMemoryGateway, LocalSandboxLauncher, MirrorStatus, PersistenceGateway, PlaygroundSession,
    SandboxLauncher, SandboxMirror,
};

fn mirror_over(dir: &TempDir) -> Arc<SandboxMirror> {
    common::init_tracing_from_env();
    let launcher = LocalSandboxLauncher::new(dir.path().join("sandbox"))
        .with_preview_url("http://localhost:5173");
    Arc::new(SandboxMirror::new(
        Arc::new(launcher) as Arc<dyn SandboxLauncher>
    ))
}

fn read(dir: &TempDir, path: &str) -> String {
    std::fs::read_to_string(dir.path().join("sandbox").join(path)).unwrap()
}

/// The initial mount materializes the whole template tree on disk.
#[tokio::test]
async fn test_initial_mount_writes_tree() {
    let dir = TempDir::new().unwrap();
    let mirror = mirror_over(&dir);
    mirror.boot().await.unwrap();

    mirror.mirror_tree(&common::sample_template()).await.unwrap();

    assert_eq!(read(&dir, "src/main.tsx"), "render(<App/>)");
    assert_eq!(
        read(&dir, "src/components/Button.tsx"),
        "export const Button = () => null"
    );
    assert_eq!(read(&dir, "package.json"), "{\"name\":\"demo\"}");
    assert_eq!(
        mirror.preview_url().await.as_deref(),
        Some("http://localhost:5173")
    );
}

/// Saving through a session pushes the saved bytes into the sandbox.
#[tokio::test]
async fn test_session_save_reaches_sandbox() {
    let dir = TempDir::new().unwrap();
    let mirror = mirror_over(&dir);
    mirror.boot().await.unwrap();

    let gateway = Arc::new(InMemoryGateway::new());
    let mut session = PlaygroundSession::new(
        "p1",
        common::sample_template(),
        gateway as Arc<dyn PersistenceGateway>,
    );
    session.attach_mirror(Arc::clone(&mirror));

    let file = session.template().find_file("src/main.tsx").unwrap().clone();
    let id = session.open_file(&file).unwrap();
    session.update_buffer_content(&id, "render(<Updated/>)");
    session.save_buffer(&id).await.unwrap();

    assert_eq!(read(&dir, "src/main.tsx"), "render(<Updated/>)");
}

/// Structural session operations land on disk as files and directories.
#[tokio::test]
async fn test_session_create_reaches_sandbox() {
    let dir = TempDir::new().unwrap();
    let mirror = mirror_over(&dir);
    mirror.boot().await.unwrap();

    let gateway = Arc::new(InMemoryGateway::new());
    let mut session = PlaygroundSession::new(
        "p1",
        common::sample_template(),
        gateway as Arc<dyn PersistenceGateway>,
    );
    session.attach_mirror(Arc::clone(&mirror));

    session
        .add_folder("src", playbench::TemplateFolder::new("lib"))
        .await
        .unwrap();
    session
        .add_file("src/lib", playbench::TemplateFile::new("math", "ts", "1 + 1"))
        .await
        .unwrap();

    assert!(dir.path().join("sandbox/src/lib").is_dir());
    assert_eq!(read(&dir, "src/lib/math.ts"), "1 + 1");
}

/// A mirror failure never blocks the save itself; the session commits and
/// the error is recorded on the mirror.
#[tokio::test]
async fn test_mirror_failure_does_not_block_save() {
    let dir = TempDir::new().unwrap();
    let mirror = mirror_over(&dir);
    // No boot: mirror writes fail with NotBooted.

    let gateway = Arc::new(InMemoryGateway::new());
    let mut session = PlaygroundSession::new(
        "p1",
        common::sample_template(),
        Arc::clone(&gateway) as Arc<dyn PersistenceGateway>,
    );
    session.attach_mirror(Arc::clone(&mirror));

    let file = session.template().find_file("src/main.tsx").unwrap().clone();
    let id = session.open_file(&file).unwrap();
    session.update_buffer_content(&id, "saved anyway");
    session.save_buffer(&id).await.unwrap();

    assert!(!session.buffer(&id).unwrap().has_unsaved_changes);
    let stored = gateway.stored("p1").await.unwrap();
    assert_eq!(stored.find_file("src/main.tsx").unwrap().content, "saved anyway");
}

/// Teardown releases the runtime; a later boot starts a fresh instance.
#[tokio::test]
async fn test_teardown_then_reboot() {
    let dir = TempDir::new().unwrap();
    let mirror = mirror_over(&dir);

    mirror.boot().await.unwrap();
    mirror.write_file("a.txt", "first").await.unwrap();

    mirror.teardown().await;
    assert_eq!(mirror.status().await, MirrorStatus::TornDown);
    assert!(mirror.preview_url().await.is_none());
    assert!(mirror.write_file("a.txt", "late").await.is_err());

    // The local launcher allows a new boot once the old instance is gone.
    mirror.boot().await.unwrap();
    mirror.write_file("a.txt", "second").await.unwrap();
    assert_eq!(read(&dir, "a.txt"), "second");
}

/// Two mirrors over the same launcher cannot both hold a live instance.
#[tokio::test]
async fn test_launcher_singleton_across_mirrors() {
    let dir = TempDir::new().unwrap();
    let launcher: Arc<dyn SandboxLauncher> =
        Arc::new(LocalSandboxLauncher::new(dir.path().join("sandbox")));

    let first = SandboxMirror::new(Arc::clone(&launcher));
    let second = SandboxMirror::new(launcher);

    first.boot().await.unwrap();
    assert!(second.boot().await.is_err());
    assert!(matches!(second.status().await, MirrorStatus::Failed(_)));
}
