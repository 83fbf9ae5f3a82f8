//! Live Python extraction through the embedded analyzer script. Skipped
//! when no Python runtime is on PATH.

use std::path::Path;
use std::process::Command;

use tokio_util::sync::CancellationToken;

use apidex::extract::{Extractor, PythonExtractor};
use apidex::format;
use apidex::usage;

fn python_available() -> bool {
    ["python3", "python"].iter().any(|candidate| {
        Command::new(candidate)
            .arg("--version")
            .output()
            .map(|o| o.status.success())
            .unwrap_or(false)
    })
}

fn write_package(root: &Path) {
    std::fs::write(
        root.join("pyproject.toml"),
        "[project]\nname = \"acme-widgets\"\nversion = \"0.4.2\"\n",
    )
    .unwrap();
    let pkg = root.join("acme_widgets");
    std::fs::create_dir_all(&pkg).unwrap();
    std::fs::write(
        pkg.join("__init__.py"),
        "from .client import WidgetClient\n\n__all__ = [\"WidgetClient\"]\n",
    )
    .unwrap();
    std::fs::write(
        pkg.join("client.py"),
        r#"from dataclasses import dataclass


@dataclass
class Widget:
    name: str


class WidgetError(Exception):
    """Raised when the widget service rejects a request."""


class WidgetClient:
    """Client for the widget service."""

    def __init__(self, endpoint: str):
        self.endpoint = endpoint

    def get_widget(self, widget_id: str) -> Widget:
        ...

    async def watch(self) -> None:
        ...

    def _internal(self):
        ...


def connect(endpoint: str) -> WidgetClient:
    ...
"#,
    )
    .unwrap();
}

#[tokio::test]
async fn embedded_analyzer_extracts_a_real_package() {
    if !python_available() {
        eprintln!("skipping: no python runtime on PATH");
        return;
    }
    apidex::availability::clear_cache();

    let sdk = tempfile::TempDir::new().unwrap();
    write_package(sdk.path());

    let result = PythonExtractor::new()
        .extract(sdk.path(), &CancellationToken::new())
        .await
        .unwrap();
    let index = result.index.expect("extraction succeeds");

    assert_eq!(index.package, "acme-widgets");
    assert_eq!(index.version.as_deref(), Some("0.4.2"));

    let client = index.find_class("WidgetClient").expect("client extracted");
    assert!(client.entry_point);
    assert!(client.methods.iter().any(|m| m.name == "get_widget"));
    assert!(client.methods.iter().any(|m| m.name == "watch" && m.is_async));
    assert!(client.methods.iter().all(|m| m.name != "_internal"));

    let error = index.find_class("WidgetError").expect("error extracted");
    assert!(error.is_error);

    // Stubs carry the docstring inside the class body.
    let stubs = format::python::format(&index, None);
    let class_pos = stubs.find("class WidgetClient:").unwrap();
    let doc_pos = stubs.find("\"\"\"Client for the widget service.\"\"\"").unwrap();
    assert!(class_pos < doc_pos);
    assert!(stubs.contains("def connect(endpoint: str) -> WidgetClient: ..."));

    // A user script covering one operation plus the factory function.
    let samples = tempfile::TempDir::new().unwrap();
    std::fs::write(
        samples.path().join("app.py"),
        "client = connect(\"endpoint\")\nclient.get_widget(\"w\")\n",
    )
    .unwrap();
    let coverage = usage::python::analyze(samples.path(), &index);
    assert!(coverage
        .covered_operations
        .iter()
        .any(|c| c.client_type == "WidgetClient" && c.operation == "get_widget"));
    assert!(coverage
        .uncovered_operations
        .iter()
        .any(|u| u.operation == "watch"));
}
