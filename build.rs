//! Build script for persona-digest
//!
//! Embeds the git commit, build timestamp and target triple into the binary.

use std::env;
use std::process::Command;

fn main() {
    println!("cargo:rerun-if-changed=.git/HEAD");

    let git_hash = run_git(&["rev-parse", "--short=8", "HEAD"]).unwrap_or_else(|| "unknown".to_string());
    let git_dirty = match run_git(&["status", "--porcelain"]) {
        Some(out) if !out.is_empty() => "true",
        Some(_) => "false",
        None => "unknown",
    };

    let build_timestamp = chrono::Utc::now().format("%Y-%m-%d %H:%M:%S UTC").to_string();
    let target = env::var("TARGET").unwrap_or_else(|_| "unknown".to_string());
    let profile = env::var("PROFILE").unwrap_or_else(|_| "unknown".to_string());

    println!("cargo:rustc-env=PD_GIT_HASH={}", git_hash);
    println!("cargo:rustc-env=PD_GIT_DIRTY={}", git_dirty);
    println!("cargo:rustc-env=PD_BUILD_TIMESTAMP={}", build_timestamp);
    println!("cargo:rustc-env=PD_TARGET={}", target);
    println!("cargo:rustc-env=PD_PROFILE={}", profile);
}

/// Run a git command and return its trimmed stdout on success
fn run_git(args: &[&str]) -> Option<String> {
    Command::new("git")
        .args(args)
        .output()
        .ok()
        .filter(|output| output.status.success())
        .and_then(|output| String::from_utf8(output.stdout).ok())
        .map(|s| s.trim().to_string())
}
