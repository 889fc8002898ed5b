//! Generation of the unified translation unit.

use anyhow::{Context, Result};
use std::path::Path;
use tracing::info;

use crate::config::UnifiedConfig;

impl UnifiedConfig {
    /// Whether a file name in the unified directory belongs in the unified file
    pub fn includes(&self, file_name: &str) -> bool {
        file_name.ends_with(&self.extension)
            && file_name != self.file_name
            && !self
                .exclude_prefixes
                .iter()
                .any(|prefix| file_name.starts_with(prefix.as_str()))
            && !self
                .exclude_substrings
                .iter()
                .any(|needle| file_name.contains(needle.as_str()))
    }
}

/// Write `<dir>/<file_name>` with one `#include` per matching file in `dir`,
/// sorted by name. Returns the included names.
pub fn write_unified_file(dir: &Path, rules: &UnifiedConfig) -> Result<Vec<String>> {
    let mut names = Vec::new();
    for entry in
        std::fs::read_dir(dir).with_context(|| format!("Failed to read directory: {:?}", dir))?
    {
        let entry = entry.with_context(|| format!("Failed to read entry in {:?}", dir))?;
        if !entry.file_type()?.is_file() {
            continue;
        }
        let name = entry.file_name().to_string_lossy().into_owned();
        if rules.includes(&name) {
            names.push(name);
        }
    }
    names.sort();

    let content: String = names
        .iter()
        .map(|name| format!("#include \"{}\"\n", name))
        .collect();

    let output = dir.join(&rules.file_name);
    std::fs::write(&output, content)
        .with_context(|| format!("Failed to write unified file: {:?}", output))?;

    info!("Wrote {} with {} includes", output.display(), names.len());
    Ok(names)
}
