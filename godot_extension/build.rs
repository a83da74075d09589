// build.rs - 빌드 정보 주입 (git hash, build time)
use std::fs;
use std::path::Path;
use std::process::Command;

fn main() {
    // Auto-cleanup for release builds to ensure fresh library load
    if std::env::var("PROFILE").map(|p| p == "release").unwrap_or(false) {
        if let Some(workspace_root) = Path::new(env!("CARGO_MANIFEST_DIR")).parent() {
            let godot_cache = workspace_root.join(".godot");
            if godot_cache.exists() {
                let _ = fs::remove_dir_all(&godot_cache);
                println!("cargo:warning=Cleaned .godot cache for fresh library load");
            }
        }
    }

    println!("cargo:rerun-if-changed=.git/HEAD");
    println!("cargo:rerun-if-changed=src/");

    // git short hash
    let git_hash = Command::new("git")
        .args(["rev-parse", "--short", "HEAD"])
        .output()
        .ok()
        .and_then(|o| {
            if o.status.success() {
                Some(String::from_utf8_lossy(&o.stdout).trim().to_string())
            } else {
                None
            }
        })
        .unwrap_or_else(|| "unknown".into());

    // 빌드 타임(UTC)
    let build_time = chrono::Utc::now().to_rfc3339();

    println!("cargo:rustc-env=GIT_HASH={}", git_hash);
    println!("cargo:rustc-env=BUILD_TIME_UTC={}", build_time);

    let target_os = std::env::var("CARGO_CFG_TARGET_OS").unwrap_or_default();
    match target_os.as_str() {
        "macos" | "ios" => {
            println!("cargo:rustc-link-arg=-undefined");
            println!("cargo:rustc-link-arg=dynamic_lookup");
        }
        "android" => {
            println!("cargo:rustc-link-lib=log");
        }
        _ => {}
    }
}
