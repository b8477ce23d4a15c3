// SPDX-License-Identifier: MPL-2.0

use std::process::Command;

fn main() {
    println!("cargo::rerun-if-changed=.git/HEAD");
    println!("cargo::rerun-if-changed=.git/refs/tags");
    println!("cargo::rerun-if-env-changed=WEBM_RECORDER_VERSION");

    // Packagers can pin the version string when building outside a git checkout
    let version = std::env::var("WEBM_RECORDER_VERSION")
        .ok()
        .or_else(git_describe)
        .unwrap_or_else(env_version);

    println!("cargo::rustc-env=GIT_VERSION={}", version);
}

/// `git describe` output with the leading `v` removed, e.g. `0.1.0-3-gabcdef1`
fn git_describe() -> Option<String> {
    let output = Command::new("git")
        .args(["describe", "--tags", "--always", "--dirty", "--match", "v*"])
        .output()
        .ok()?;

    if !output.status.success() {
        return None;
    }

    let described = String::from_utf8_lossy(&output.stdout).trim().to_string();
    if described.is_empty() {
        return None;
    }

    let described = described.strip_prefix('v').unwrap_or(&described);

    // A bare commit hash means there is no release tag yet
    if !described.contains('.') {
        return Some(format!("{}-{}", env_version(), described));
    }

    Some(described.to_string())
}

fn env_version() -> String {
    std::env::var("CARGO_PKG_VERSION").unwrap_or_else(|_| "unknown".to_string())
}
