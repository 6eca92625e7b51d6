use std::process::Command;

fn git_commit() -> String {
    Command::new("git")
        .args(["rev-parse", "--short", "HEAD"])
        .output()
        .ok()
        .filter(|o| o.status.success())
        .and_then(|o| String::from_utf8(o.stdout).ok())
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| "unknown".into())
}

fn main() {
    println!("cargo:rerun-if-changed=build.rs");
    println!("cargo:rerun-if-changed=.git/HEAD");

    println!("cargo:rustc-env=REPODUMP_GIT_COMMIT={}", git_commit());

    let build_time = chrono::Utc::now().format("%Y-%m-%d").to_string();
    println!("cargo:rustc-env=REPODUMP_BUILD_TIME={build_time}");
}
