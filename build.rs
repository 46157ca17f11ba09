use std::process::Command;
use std::time::{SystemTime, UNIX_EPOCH};

fn main() {
    let version = std::env::var("CARGO_PKG_VERSION").unwrap_or_else(|_| "0.0.0".to_string());

    let profile = std::env::var("PROFILE").unwrap_or_else(|_| "debug".to_string());
    let profile = if profile == "release" { "release" } else { "development" };

    // Short commit hash, "unknown" outside a git checkout
    let git_hash = Command::new("git")
        .args(["rev-parse", "--short", "HEAD"])
        .output()
        .ok()
        .filter(|o| o.status.success())
        .and_then(|o| String::from_utf8(o.stdout).ok())
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| "unknown".to_string());

    // Reproducible builds pin the timestamp through SOURCE_DATE_EPOCH
    let build_stamp = std::env::var("SOURCE_DATE_EPOCH")
        .ok()
        .and_then(|v| v.trim().parse::<u64>().ok())
        .unwrap_or_else(|| {
            SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .map(|d| d.as_secs())
                .unwrap_or(0)
        });

    println!("cargo:rustc-env=CHRONOSEAL_VERSION={}", version);
    println!("cargo:rustc-env=CHRONOSEAL_BUILD={}", build_stamp);
    println!("cargo:rustc-env=CHRONOSEAL_PROFILE={}", profile);
    println!("cargo:rustc-env=CHRONOSEAL_GIT_HASH={}", git_hash);

    println!("cargo:rerun-if-env-changed=SOURCE_DATE_EPOCH");
    println!("cargo:rerun-if-env-changed=PROFILE");
    println!("cargo:rerun-if-changed=.git/HEAD");
}
