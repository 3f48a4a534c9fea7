use std::env;
use std::process::Command;

/// Revision shown by `commrecon --version`.
///
/// Release tarballs have no `.git`, so packagers set `COMMRECON_REVISION`.
fn revision() -> String {
    if let Ok(rev) = env::var("COMMRECON_REVISION") {
        if !rev.trim().is_empty() {
            return rev.trim().to_string();
        }
    }
    let out = match Command::new("git").args(["describe", "--always", "--dirty", "--abbrev=7"]).output() {
        Ok(out) if out.status.success() => out,
        _ => return "unknown".into(),
    };
    String::from_utf8_lossy(&out.stdout).trim().to_string()
}

fn main() {
    println!("cargo:rerun-if-env-changed=COMMRECON_REVISION");
    for path in ["../../.git/HEAD", "../../.git/index"] {
        println!("cargo:rerun-if-changed={path}");
    }

    println!("cargo:rustc-env=COMMRECON_REVISION={}", revision());
    println!(
        "cargo:rustc-env=COMMRECON_BUILD_TARGET={}",
        env::var("TARGET").unwrap_or_else(|_| "unknown".into())
    );
}
