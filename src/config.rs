use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use directories::BaseDirs;
use serde::Deserialize;

const CONFIG_FILE_NAME: &str = "config.toml";
const APP_NAME: &str = "cardfile";

#[derive(Debug, Clone, Default)]
pub struct Config {
    /// Where this configuration was loaded from, if a file existed.
    pub config_path: Option<PathBuf>,
    /// Contact snapshot to load when the CLI is given none.
    pub contacts_path: Option<PathBuf>,
    /// Print sections alphabetically instead of first-encounter order.
    pub sort_sections: bool,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ConfigFile {
    contacts_path: Option<PathBuf>,
    sort_sections: Option<bool>,
}

fn config_root() -> Option<PathBuf> {
    BaseDirs::new().map(|base| base.config_dir().join(APP_NAME))
}

/// Load configuration from the default location, falling back to
/// defaults when no file exists.
pub fn load() -> Result<Config> {
    let Some(root) = config_root() else {
        return Ok(Config::default());
    };
    let path = root.join(CONFIG_FILE_NAME);
    if !path.exists() {
        return Ok(Config::default());
    }
    load_from(&path)
}

/// Load configuration from an explicit path.
pub fn load_from(path: &Path) -> Result<Config> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("failed to read configuration file at {}", path.display()))?;

    let value: toml::Value = toml::from_str(&raw)
        .with_context(|| format!("failed to parse {} as TOML", path.display()))?;

    warn_unknown_keys(&value);

    let cfg_file: ConfigFile = value
        .try_into()
        .with_context(|| format!("failed to deserialize config from {}", path.display()))?;

    Ok(Config {
        config_path: Some(path.to_path_buf()),
        contacts_path: cfg_file.contacts_path.as_deref().map(expand_tilde),
        sort_sections: cfg_file.sort_sections.unwrap_or(false),
    })
}

/// Expand ~ to home directory in paths
fn expand_tilde(path: &Path) -> PathBuf {
    if let Ok(stripped) = path.strip_prefix("~") {
        if let Some(home) = home::home_dir() {
            return home.join(stripped);
        }
    }
    path.to_path_buf()
}

fn warn_unknown_keys(value: &toml::Value) {
    let Some(table) = value.as_table() else {
        return;
    };

    let known = HashSet::from(["contacts_path".to_string(), "sort_sections".to_string()]);

    for key in table.keys() {
        if !known.contains(key) {
            eprintln!("warning: unknown configuration key `{}`", key);
        }
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    #[test]
    fn test_load_from_reads_all_keys() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "contacts_path = \"/tmp/contacts.json\"").unwrap();
        writeln!(file, "sort_sections = true").unwrap();

        let config = load_from(file.path()).unwrap();
        assert_eq!(
            config.contacts_path.as_deref(),
            Some(Path::new("/tmp/contacts.json"))
        );
        assert!(config.sort_sections);
        assert_eq!(config.config_path.as_deref(), Some(file.path()));
    }

    #[test]
    fn test_missing_keys_use_defaults() {
        let file = tempfile::NamedTempFile::new().unwrap();
        let config = load_from(file.path()).unwrap();
        assert_eq!(config.contacts_path, None);
        assert!(!config.sort_sections);
    }

    #[test]
    fn test_invalid_toml_is_an_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "contacts_path = [").unwrap();
        assert!(load_from(file.path()).is_err());
    }

    #[test]
    fn test_tilde_expansion() {
        let expanded = expand_tilde(Path::new("~/contacts.json"));
        if let Some(home) = home::home_dir() {
            assert_eq!(expanded, home.join("contacts.json"));
        }
        // Paths without a leading ~ pass through untouched.
        assert_eq!(
            expand_tilde(Path::new("/srv/contacts.json")),
            PathBuf::from("/srv/contacts.json")
        );
    }
}
