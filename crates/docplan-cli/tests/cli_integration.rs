//! Integration tests for the dplan CLI.
//!
//! Every run gets its own working directory and config home so no user
//! `.env` or `backend.toml` leaks in.
//!
//! Run with: `cargo test --package docplan-cli --test cli_integration`

use std::collections::HashMap;
use std::fs;
use std::net::SocketAddr;
use std::process::{Command, Output};
use std::sync::mpsc;
use std::thread;

use axum::{routing::post, Form, Json, Router};
use serde_json::json;
use tempfile::TempDir;

/// Run dplan inside `dir` with an isolated config home and extra env vars.
fn run_dplan(dir: &TempDir, args: &[&str], env: &[(&str, &str)]) -> Output {
    let mut command = Command::new(env!("CARGO_BIN_EXE_dplan"));
    command
        .current_dir(dir.path())
        .env("XDG_CONFIG_HOME", dir.path().join("config"))
        .env("HOME", dir.path())
        .env_remove("DOCPLAN_MODE")
        .env_remove("DOCPLAN_MODEL")
        .env_remove("DOCPLAN_URL")
        .env_remove("DOCPLAN_API_KEY")
        .env_remove("DOCPLAN_TIMEOUT_SECS")
        .args(args);
    for (key, value) in env {
        command.env(key, value);
    }
    command.output().expect("Failed to execute dplan command")
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).into_owned()
}

/// Serve `router` on an ephemeral port from a background thread.
fn spawn_stub(router: Router) -> SocketAddr {
    let (tx, rx) = mpsc::channel();
    thread::spawn(move || {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap();
        runtime.block_on(async move {
            let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
            tx.send(listener.local_addr().unwrap()).unwrap();
            axum::serve(listener, router).await.unwrap();
        });
    });
    rx.recv().unwrap()
}

const MANIFEST: &str = r#"{
    "name": "pkg",
    "members": [
        {"kind": "function", "name": "load", "source": "def load(path: str) -> Frame:\n    ..."},
        {"kind": "function", "name": "_hidden", "source": "def _hidden(): ..."},
        {"kind": "class", "name": "Frame", "members": [
            {"kind": "function", "name": "head", "source": "def head(self, n: int = 5):\n    ..."}
        ]},
        {"kind": "alias", "name": "np", "target": "numpy"}
    ]
}"#;

// =============================================================================
// Help and argument validation
// =============================================================================

#[test]
fn help_lists_commands() {
    let dir = TempDir::new().unwrap();
    let output = run_dplan(&dir, &["--help"], &[]);
    assert!(output.status.success());
    let text = stdout(&output);
    for command in ["doc", "docs", "symbols", "sql", "plan", "call", "config"] {
        assert!(text.contains(command), "help is missing {command}");
    }
}

#[test]
fn call_requires_docs_or_code() {
    let dir = TempDir::new().unwrap();
    let output = run_dplan(&dir, &["call", "--question", "load a.csv"], &[]);
    assert!(!output.status.success());
}

#[test]
fn plan_rejects_both_function_sources() {
    let dir = TempDir::new().unwrap();
    let output = run_dplan(
        &dir,
        &["plan", "--functions", "f.json", "--manifest", "m.json", "--question", "q"],
        &[],
    );
    assert!(!output.status.success());
}

#[test]
fn missing_input_file_is_reported() {
    let dir = TempDir::new().unwrap();
    let output = run_dplan(&dir, &["doc", "does_not_exist.py"], &[]);
    assert!(!output.status.success());
    assert!(stderr(&output).contains("does_not_exist.py"));
}

// =============================================================================
// Offline commands
// =============================================================================

#[test]
fn symbols_lists_public_callables_with_signatures() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("pkg.json"), MANIFEST).unwrap();

    let output = run_dplan(&dir, &["symbols", "pkg.json"], &[]);
    assert!(output.status.success(), "stderr: {}", stderr(&output));

    let text = stdout(&output);
    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(
        lines,
        vec!["pkg.Frame.head(self, n: int = 5)", "pkg.load(path: str) -> Frame"]
    );
}

#[test]
fn config_reflects_environment_and_flags() {
    let dir = TempDir::new().unwrap();

    let output = run_dplan(&dir, &["config", "get", "mode"], &[("DOCPLAN_MODE", "local")]);
    assert_eq!(stdout(&output).trim(), "local");

    let output = run_dplan(&dir, &["--local", "config", "get", "url"], &[]);
    assert_eq!(stdout(&output).trim(), "http://localhost:11434/v1");

    let output = run_dplan(&dir, &["config", "get", "colour"], &[]);
    assert!(!output.status.success());
}

#[test]
fn config_set_persists_to_config_home() {
    let dir = TempDir::new().unwrap();

    let output = run_dplan(&dir, &["config", "set", "model_name", "phi3"], &[]);
    assert!(output.status.success(), "stderr: {}", stderr(&output));

    let output = run_dplan(&dir, &["config", "get", "model_name"], &[]);
    assert_eq!(stdout(&output).trim(), "phi3");
}

// =============================================================================
// Against a stub inference service
// =============================================================================

#[test]
fn doc_prints_generated_documentation() {
    let router = Router::new().route(
        "/infer",
        post(|Form(fields): Form<HashMap<String, String>>| async move {
            let prompt = fields.get("prompt").cloned().unwrap_or_default();
            let doc = if prompt.contains("def add(a, b)") {
                "Adds two numbers."
            } else {
                "unexpected prompt"
            };
            Json(json!({ "response": format!("{prompt}<p>{doc}</p></doc>") }))
        }),
    );
    let addr = spawn_stub(router);
    let url = format!("http://{addr}/infer");

    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("add.py"), "def add(a, b):\n    return a + b\n").unwrap();

    let output = run_dplan(&dir, &["doc", "add.py"], &[("DOCPLAN_URL", url.as_str())]);
    assert!(output.status.success(), "stderr: {}", stderr(&output));
    assert_eq!(stdout(&output).trim(), "Adds two numbers.");
}

#[test]
fn plan_from_manifest_prints_plan_json() {
    let router = Router::new().route(
        "/infer",
        post(|| async {
            Json(json!({
                "response": r#"<json>{"tasks":[{"task_id":1,"function_name":"pkg.load","parameters":[{"name":"path","value":"a.csv","dtype":"str","description":"file"}],"outputs":["variable_1"],"description":"load"}]}</json>"#
            }))
        }),
    );
    let addr = spawn_stub(router);
    let url = format!("http://{addr}/infer");

    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("pkg.json"), MANIFEST).unwrap();

    let output = run_dplan(
        &dir,
        &["plan", "--manifest", "pkg.json", "--question", "load a.csv"],
        &[("DOCPLAN_URL", url.as_str())],
    );
    assert!(output.status.success(), "stderr: {}", stderr(&output));

    let plan: serde_json::Value = serde_json::from_str(&stdout(&output)).unwrap();
    assert_eq!(plan["tasks"][0]["function_name"], "pkg.load");
    assert!(stderr(&output).contains("Registered 2 of 2 functions"));
}

#[test]
fn backend_failure_exits_with_error() {
    let router = Router::new().route(
        "/infer",
        post(|| async { (axum::http::StatusCode::INTERNAL_SERVER_ERROR, "down") }),
    );
    let addr = spawn_stub(router);
    let url = format!("http://{addr}/infer");

    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("add.py"), "def add(a, b): ...").unwrap();

    let output = run_dplan(&dir, &["doc", "add.py"], &[("DOCPLAN_URL", url.as_str())]);
    assert!(!output.status.success());
    assert!(stderr(&output).contains("500"));
}
