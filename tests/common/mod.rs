//! Common test utilities and fixtures
//!
//! Every fixture lives in its own temporary directory and runs the binary
//! with the offline `mock` provider.

#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};

use assert_cmd::Command;
use serde_json::{json, Value};
use tempfile::TempDir;

/// Get a command for the persona-digest binary, isolated from the
/// environment of the developer running the tests
pub fn digest_cmd() -> Command {
    let mut cmd = Command::cargo_bin("persona-digest").unwrap();
    for var in [
        "PERSONA_DIGEST_CONFIG",
        "PERSONA_DIGEST_API_KEY",
        "PERSONA_DIGEST_PROVIDER",
        "PERSONA_DIGEST_SUMMARY_DIRS",
        "PERSONA_DIGEST_LOG_FILE",
        "RUST_LOG",
    ] {
        cmd.env_remove(var);
    }
    cmd
}

/// A scratch workspace with an article tree, a summary directory and a
/// configuration file pointing at both
pub struct Workspace {
    pub dir: TempDir,
}

impl Workspace {
    pub fn new() -> Self {
        let ws = Self {
            dir: TempDir::new().unwrap(),
        };
        fs::create_dir_all(ws.articles()).unwrap();
        fs::create_dir_all(ws.summaries()).unwrap();
        ws.write_config("");
        ws
    }

    pub fn root(&self) -> &Path {
        self.dir.path()
    }

    pub fn articles(&self) -> PathBuf {
        self.root().join("articles")
    }

    pub fn summaries(&self) -> PathBuf {
        self.root().join("summaries")
    }

    pub fn config_path(&self) -> PathBuf {
        self.root().join("persona-digest.toml")
    }

    pub fn config_arg(&self) -> String {
        self.config_path().display().to_string()
    }

    /// Write the base mock configuration followed by `extra` TOML lines
    pub fn write_config(&self, extra: &str) {
        let root = self.root().display().to_string().replace('\\', "/");
        let content = format!(
            r#"[generation]
input_dir = "{root}/articles"
output_dir = "{root}/summaries"
mode = "fixed"
persona_count = 3
workers = 2
limit = 0
exclude = ["index.md"]

[llm]
provider = "mock"

[aggregate]
summary_dirs = ["{root}/summaries"]

[publish]
index_path = "{root}/articles/index.md"
gallery_path = "{root}/site/gallery.html"
api_dir = "{root}/site/api"

[logging]
level = "warn"
{extra}"#
        );
        fs::write(self.config_path(), content).unwrap();
    }

    /// Write a markdown article under `articles/<rel>`
    pub fn article(&self, rel: &str, title: &str, body: &str) -> PathBuf {
        let path = self.articles().join(rel);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(&path, format!("# {}\n\n{}\n", title, body)).unwrap();
        path
    }

    /// Write a summary record straight into the summary directory
    pub fn record(&self, file_name: &str, title: &str, file_path: &str, summaries: &[(&str, &str)]) {
        let mut sums = serde_json::Map::new();
        let mut personas = serde_json::Map::new();
        for (name, text) in summaries {
            sums.insert(name.to_string(), json!(text));
            personas.insert(
                name.to_string(),
                json!({"description": format!("{} persona", name), "example": ""}),
            );
        }
        let record = json!({
            "file_path": file_path,
            "title": title,
            "summaries": sums,
            "stats": {},
            "personas": personas,
        });
        fs::write(
            self.summaries().join(file_name),
            serde_json::to_string_pretty(&record).unwrap(),
        )
        .unwrap();
    }

    pub fn read_json(&self, path: impl AsRef<Path>) -> Value {
        let text = fs::read_to_string(self.root().join(path)).unwrap();
        serde_json::from_str(&text).unwrap()
    }

    /// Command preconfigured with `--config` after the subcommand
    pub fn run(&self, subcommand: &[&str]) -> Command {
        let mut cmd = digest_cmd();
        cmd.current_dir(self.root());
        cmd.args(subcommand);
        cmd.arg("--config").arg(self.config_arg());
        cmd
    }
}
