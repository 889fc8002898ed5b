//! Location of the Gecko object directory for the host platform.

use anyhow::{anyhow, bail, Context, Result};
use std::path::{Path, PathBuf};
use std::process::Command;

/// Object directory name for the given OS (as in `std::env::consts::OS`)
/// and OS release. The release only matters on macOS.
pub fn obj_dir_name(os: &str, release: &str) -> Result<String> {
    match os {
        "macos" => Ok(format!("obj-x86_64-apple-darwin{}", release)),
        "linux" => Ok("obj-x86_64-pc-linux-gnu".to_string()),
        other => bail!("Unsupported platform: {}", other),
    }
}

/// Object directory name for the running host
pub fn host_obj_dir_name() -> Result<String> {
    let os = std::env::consts::OS;
    let release = if os == "macos" {
        os_release()?
    } else {
        String::new()
    };
    obj_dir_name(os, &release)
}

/// Directory holding the generated headers: `<src>/<objdir>/dist/include`
pub fn obj_dir_include_path(src_dir: &Path, obj_dir: &str) -> PathBuf {
    src_dir.join(obj_dir).join("dist").join("include")
}

fn os_release() -> Result<String> {
    let output = Command::new("uname")
        .arg("-r")
        .output()
        .context("Failed to run uname")?;

    if !output.status.success() {
        return Err(anyhow!("uname -r exited with {}", output.status));
    }

    Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
}
