use std::sync::Once;

use playbench::{TemplateFile, TemplateFolder, TemplateItem};

/// Initialize the global tracing subscriber once (used by tests that run with `RUST_LOG`).
pub fn init_tracing_from_env() {
    static INIT: Once = Once::new();
    INIT.call_once(|| {
        let subscriber = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_writer(std::io::stdout);
        let _ = subscriber.try_init();
    });
}

/// A small Vite-style project tree shared across integration tests.
pub fn sample_template() -> TemplateFolder {
    let mut root = TemplateFolder::new("root");

    let mut src = TemplateFolder::new("src");
    src.items.push(TemplateItem::File(TemplateFile::new(
        "main",
        "tsx",
        "render(<App/>)",
    )));
    src.items.push(TemplateItem::File(TemplateFile::new(
        "App",
        "tsx",
        "export const App = () => null",
    )));

    let mut components = TemplateFolder::new("components");
    components.items.push(TemplateItem::File(TemplateFile::new(
        "Button",
        "tsx",
        "export const Button = () => null",
    )));
    src.items.push(TemplateItem::Folder(components));

    root.items.push(TemplateItem::Folder(src));
    root.items.push(TemplateItem::File(TemplateFile::new(
        "package",
        "json",
        "{\"name\":\"demo\"}",
    )));
    root.items.push(TemplateItem::File(TemplateFile::new(
        "index",
        "html",
        "<div id=\"root\"></div>",
    )));
    root
}
