use anyhow::{Context, Result};
use dirs::config_dir;
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Main configuration structure for the importer
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    /// Directory holding the JSON file manifests
    #[serde(default = "default_data_dir")]
    pub data_dir: String,

    /// File recording the upstream revision of the last import
    #[serde(default = "default_revision_file")]
    pub revision_file: String,

    /// Root directory for per-revision glue diffs
    #[serde(default = "default_diffs_dir")]
    pub diffs_dir: String,

    /// Glue tree, relative to the destination root
    #[serde(default = "default_glue_dir")]
    pub glue_dir: String,

    /// Object directory name; detected from the host platform if unset
    #[serde(default)]
    pub objdir: Option<String>,

    /// Preference file filtering
    #[serde(default)]
    pub prefs: PrefsConfig,

    /// Unified translation unit generation
    #[serde(default)]
    pub unified: UnifiedConfig,

    /// Glue duplicate detection passes
    #[serde(default = "default_duplicate_checks")]
    pub duplicates: Vec<DuplicateCheck>,
}

/// Preference filtering configuration
#[derive(Debug, Deserialize, Clone)]
pub struct PrefsConfig {
    /// Regex a preference line must match at its start
    #[serde(default = "default_pref_pattern")]
    pub pattern: String,

    /// Preference files to filter
    #[serde(default = "default_pref_files")]
    pub files: Vec<PrefFile>,
}

/// One preference file, source relative to the upstream root and
/// destination relative to the destination root
#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
pub struct PrefFile {
    pub source: String,
    pub destination: String,
    #[serde(default)]
    pub label: String,
}

/// Unified file configuration
#[derive(Debug, Deserialize, Clone)]
pub struct UnifiedConfig {
    /// Directory, relative to the destination root
    #[serde(default = "default_unified_directory")]
    pub directory: String,

    #[serde(default = "default_unified_file_name")]
    pub file_name: String,

    #[serde(default = "default_unified_extension")]
    pub extension: String,

    /// File names starting with any of these are left out
    #[serde(default = "default_exclude_prefixes")]
    pub exclude_prefixes: Vec<String>,

    /// File names containing any of these are left out
    #[serde(default = "default_exclude_substrings")]
    pub exclude_substrings: Vec<String>,
}

/// A subtree of the destination compared against the glue tree
#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
pub struct DuplicateCheck {
    pub sub_dir: String,
    pub extensions: Vec<String>,
}

// Default value functions
fn default_data_dir() -> String {
    "data".to_string()
}
fn default_revision_file() -> String {
    "GECKO_REVISION".to_string()
}
fn default_diffs_dir() -> String {
    "glue_diffs".to_string()
}
fn default_glue_dir() -> String {
    "glue".to_string()
}
fn default_pref_pattern() -> String {
    r#"pref\("media."#.to_string()
}

fn default_pref_files() -> Vec<PrefFile> {
    [
        ("modules/libpref/init/all.js", "glue/prefs_common.cpp", "Common"),
        ("browser/app/profile/firefox.js", "glue/prefs_desktop.cpp", "Desktop"),
        ("mobile/android/app/mobile.js", "glue/prefs_android.cpp", "Android"),
    ]
    .into_iter()
    .map(|(source, destination, label)| PrefFile {
        source: source.to_string(),
        destination: destination.to_string(),
        label: label.to_string(),
    })
    .collect()
}

fn default_unified_directory() -> String {
    "src/xpcom/string".to_string()
}
fn default_unified_file_name() -> String {
    "unified.cpp".to_string()
}
fn default_unified_extension() -> String {
    ".cpp".to_string()
}
fn default_exclude_prefixes() -> Vec<String> {
    vec!["nsT".to_string()]
}
fn default_exclude_substrings() -> Vec<String> {
    vec!["SSE".to_string()]
}

fn default_duplicate_checks() -> Vec<DuplicateCheck> {
    vec![
        DuplicateCheck {
            sub_dir: "include".to_string(),
            extensions: vec![".h".to_string()],
        },
        DuplicateCheck {
            sub_dir: "src".to_string(),
            extensions: vec![".c".to_string(), ".cpp".to_string()],
        },
    ]
}

// Default implementations
impl Default for PrefsConfig {
    fn default() -> Self {
        Self {
            pattern: default_pref_pattern(),
            files: default_pref_files(),
        }
    }
}

impl Default for UnifiedConfig {
    fn default() -> Self {
        Self {
            directory: default_unified_directory(),
            file_name: default_unified_file_name(),
            extension: default_unified_extension(),
            exclude_prefixes: default_exclude_prefixes(),
            exclude_substrings: default_exclude_substrings(),
        }
    }
}

impl Config {
    /// Load configuration from the default location, falling back to
    /// built-in defaults when no file exists there
    pub fn load_or_default() -> Result<Self> {
        let config_path = Self::default_config_path()?;

        if config_path.exists() {
            Self::load(&config_path)
        } else {
            tracing::debug!("No configuration at {:?}, using defaults", config_path);
            Ok(Self::default())
        }
    }

    /// Load configuration from a specific file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {:?}", path))?;

        let mut config: Config = serde_yaml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {:?}", path))?;

        // Expand environment variables in paths
        config.expand_paths()?;

        Ok(config)
    }

    /// Get the default configuration file path (XDG compliant)
    pub fn default_config_path() -> Result<PathBuf> {
        let config_dir = config_dir().context("Failed to get user config directory")?;

        Ok(config_dir.join("gecko-import").join("config.yml"))
    }

    /// Expand environment variables in configuration paths
    pub fn expand_paths(&mut self) -> Result<()> {
        self.data_dir = shellexpand::full(&self.data_dir)
            .context("Failed to expand data_dir path")?
            .into_owned();

        self.revision_file = shellexpand::full(&self.revision_file)
            .context("Failed to expand revision_file path")?
            .into_owned();

        self.diffs_dir = shellexpand::full(&self.diffs_dir)
            .context("Failed to expand diffs_dir path")?
            .into_owned();

        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            revision_file: default_revision_file(),
            diffs_dir: default_diffs_dir(),
            glue_dir: default_glue_dir(),
            objdir: None,
            prefs: PrefsConfig::default(),
            unified: UnifiedConfig::default(),
            duplicates: default_duplicate_checks(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::env;
    use tempfile::TempDir;

    #[test]
    fn test_config_default_values() {
        let config = Config::default();

        assert_eq!(config.data_dir, "data");
        assert_eq!(config.revision_file, "GECKO_REVISION");
        assert_eq!(config.diffs_dir, "glue_diffs");
        assert_eq!(config.glue_dir, "glue");
        assert!(config.objdir.is_none());
        assert_eq!(config.prefs.files.len(), 3);
        assert_eq!(config.prefs.files[0].destination, "glue/prefs_common.cpp");
        assert_eq!(config.unified.directory, "src/xpcom/string");
        assert_eq!(config.unified.exclude_prefixes, vec!["nsT"]);
        assert_eq!(config.unified.exclude_substrings, vec!["SSE"]);
        assert_eq!(config.duplicates.len(), 2);
    }

    #[test]
    #[serial]
    fn test_expand_paths() {
        env::set_var("TEST_GECKO_IMPORT_HOME", "/test/home");

        let mut config = Config::default();
        config.data_dir = "${TEST_GECKO_IMPORT_HOME}/data".to_string();
        config.revision_file = "~/GECKO_REVISION".to_string();

        config.expand_paths().expect("Failed to expand paths");

        assert_eq!(config.data_dir, "/test/home/data");
        assert!(!config.revision_file.starts_with('~'));

        env::remove_var("TEST_GECKO_IMPORT_HOME");
    }

    #[test]
    fn test_config_load_nonexistent_file() {
        let nonexistent_path = Path::new("/nonexistent/path/config.yml");
        let result = Config::load(nonexistent_path);
        assert!(result.is_err());
    }

    #[test]
    fn test_config_default_path_xdg() {
        let default_path = Config::default_config_path().expect("Failed to get default path");
        assert!(default_path.to_string_lossy().contains("gecko-import"));
        assert!(default_path.to_string_lossy().ends_with("config.yml"));
    }

    #[test]
    fn test_partial_yaml_keeps_defaults() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let path = temp_dir.path().join("config.yml");
        std::fs::write(&path, "objdir: obj-custom\nglue_dir: shim\n").unwrap();

        let config = Config::load(&path).expect("Failed to load config");

        assert_eq!(config.objdir.as_deref(), Some("obj-custom"));
        assert_eq!(config.glue_dir, "shim");
        assert_eq!(config.data_dir, "data");
        assert_eq!(config.prefs.pattern, r#"pref\("media."#);
    }

    #[test]
    fn test_yaml_parsing() {
        let yaml_content = r#"
data_dir: "manifests"
revision_file: "REV"
diffs_dir: "out/diffs"
prefs:
  pattern: 'pref\("dom.'
  files:
    - source: "modules/libpref/init/all.js"
      destination: "glue/prefs_dom.cpp"
      label: "Dom"
unified:
  directory: "src/foo"
  exclude_prefixes: []
  exclude_substrings: ["NEON", "SSE"]
duplicates:
  - sub_dir: "include"
    extensions: [".h", ".hpp"]
"#;

        let config: Config = serde_yaml::from_str(yaml_content).expect("Failed to parse YAML");

        assert_eq!(config.data_dir, "manifests");
        assert_eq!(config.revision_file, "REV");
        assert_eq!(config.diffs_dir, "out/diffs");
        assert_eq!(config.prefs.pattern, r#"pref\("dom."#);
        assert_eq!(config.prefs.files.len(), 1);
        assert_eq!(config.prefs.files[0].label, "Dom");
        assert_eq!(config.unified.directory, "src/foo");
        assert_eq!(config.unified.file_name, "unified.cpp");
        assert!(config.unified.exclude_prefixes.is_empty());
        assert_eq!(config.unified.exclude_substrings, vec!["NEON", "SSE"]);
        assert_eq!(config.duplicates[0].extensions, vec![".h", ".hpp"]);
    }
}
