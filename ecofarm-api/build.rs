use std::process::Command;

/// Overrides the git lookup, for builds from a source archive
const REVISION_OVERRIDE_ENV: &str = "ECOFARM_BUILD_REVISION";

fn git_revision() -> Option<String> {
    let output = Command::new("git")
        .args(["rev-parse", "--short=8", "HEAD"])
        .output()
        .ok()?;
    if !output.status.success() {
        return None;
    }
    let revision = String::from_utf8(output.stdout).ok()?;
    Some(revision.trim().to_owned()).filter(|r| !r.is_empty())
}

fn main() {
    let revision = std::env::var(REVISION_OVERRIDE_ENV)
        .ok()
        .filter(|r| !r.trim().is_empty())
        .or_else(git_revision)
        .unwrap_or_else(|| "unknown".to_owned());

    // UTC, same form as the stored record timestamps
    let built_at = chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Secs, true);

    let profile = std::env::var("PROFILE").unwrap_or_else(|_| "unknown".to_owned());

    for (key, value) in [
        ("GIT_HASH", revision),
        ("BUILD_TIMESTAMP", built_at),
        ("BUILD_PROFILE", profile),
    ] {
        println!("cargo:rustc-env={}={}", key, value);
    }
}
