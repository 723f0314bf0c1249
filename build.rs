//! Stamps the binaries with the commit they were built from
//!
//! `PUTT_ARCADE_GIT_HASH` wins when set, for cabinet images built from a
//! source tarball without `.git`.

use std::env;
use std::process::Command;

const HASH_OVERRIDE: &str = "PUTT_ARCADE_GIT_HASH";

fn short_head() -> Option<String> {
    let output = Command::new("git").args(["rev-parse", "--short", "HEAD"]).output().ok()?;
    if !output.status.success() {
        return None;
    }
    let hash = String::from_utf8(output.stdout).ok()?;
    let hash = hash.trim();
    (!hash.is_empty()).then(|| hash.to_string())
}

fn main() {
    let hash = env::var(HASH_OVERRIDE)
        .ok()
        .filter(|h| !h.is_empty())
        .or_else(short_head)
        .unwrap_or_else(|| "unknown".to_string());

    println!("cargo:rustc-env=GIT_HASH={hash}");
    println!("cargo:rerun-if-env-changed={HASH_OVERRIDE}");
    println!("cargo:rerun-if-changed=.git/HEAD");
    println!("cargo:rerun-if-changed=.git/refs/heads");
}
