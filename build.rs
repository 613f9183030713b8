//! Build script for waat.
//!
//! Embeds the git commit and build date for version reporting.

use std::process::Command;

fn main() {
    println!("cargo:rerun-if-changed=build.rs");
    println!("cargo:rerun-if-changed=.git/HEAD");

    if let Some(hash) = get_git_hash() {
        println!("cargo:rustc-env=WAAT_GIT_HASH={}", hash);
    }

    if let Some(date) = get_build_date() {
        println!("cargo:rustc-env=WAAT_BUILD_DATE={}", date);
    }
}

/// Get the current git commit hash (short form)
fn get_git_hash() -> Option<String> {
    run(&["git", "rev-parse", "--short", "HEAD"])
}

/// Get the current build date in ISO 8601 format
fn get_build_date() -> Option<String> {
    run(&["date", "-u", "+%Y-%m-%dT%H:%M:%SZ"])
}

fn run(cmd: &[&str]) -> Option<String> {
    let (program, args) = cmd.split_first()?;
    Command::new(program)
        .args(args)
        .output()
        .ok()
        .and_then(|output| {
            if output.status.success() {
                String::from_utf8(output.stdout)
                    .ok()
                    .map(|s| s.trim().to_string())
            } else {
                None
            }
        })
}
