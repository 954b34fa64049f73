use chrono::Local;
use std::process::{Command, Output};

/// Expose `BUILD_HASH` (short git hash, plus a timestamp for dirty trees) to
/// the binary's `--version` string.
fn main() {
    let hash = git(&["rev-parse", "--short", "HEAD"])
        .filter(|out| out.status.success())
        .map(|out| String::from_utf8_lossy(&out.stdout).trim().to_string())
        .unwrap_or_else(|| "unknown".to_string());

    // Only tracked files count; untracked files don't make a build dirty.
    let dirty = git(&["diff", "--quiet", "HEAD"])
        .map(|out| !out.status.success())
        .unwrap_or(false);

    let build_hash = if dirty {
        format!("{hash}-dirty-{}", Local::now().format("%Y%m%d-%H%M%S"))
    } else {
        hash
    };
    println!("cargo:rustc-env=BUILD_HASH={build_hash}");

    // .git lives at the workspace root, two levels up
    println!("cargo:rerun-if-changed=../../.git/HEAD");
    println!("cargo:rerun-if-changed=../../.git/index");
}

fn git(args: &[&str]) -> Option<Output> {
    Command::new("git").args(args).output().ok()
}
