use crate::store::SortOrder;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use tracing::info;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub url_file: PathBuf,
    pub sort: SortOrder,
    pub listing_name: String,
    pub accent: String,
    pub listing_height: u16,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            url_file: default_url_file(),
            sort: SortOrder::Name,
            listing_name: "*URLs*".to_string(),
            accent: "cyan".to_string(),
            listing_height: 40,
        }
    }
}

fn default_url_file() -> PathBuf {
    dirs::home_dir()
        .map(|home| home.join(".urls"))
        .unwrap_or_else(|| PathBuf::from(".urls"))
}

#[derive(Debug, Clone, Deserialize)]
struct PartialConfig {
    url_file: Option<PathBuf>,
    sort: Option<SortOrder>,
    listing_name: Option<String>,
    accent: Option<String>,
    listing_height: Option<u16>,
}

impl PartialConfig {
    /// Fills missing keys from defaults; the flag is set when anything was
    /// missing so the file can be rewritten in full.
    fn apply_defaults(self) -> (Config, bool) {
        let defaults = Config::default();
        let mut changed = false;

        let mut fill = |present: bool| {
            if !present {
                changed = true;
            }
        };
        fill(self.url_file.is_some());
        fill(self.sort.is_some());
        fill(self.listing_name.is_some());
        fill(self.accent.is_some());
        fill(self.listing_height.is_some());

        (
            Config {
                url_file: self.url_file.unwrap_or(defaults.url_file),
                sort: self.sort.unwrap_or(defaults.sort),
                listing_name: self.listing_name.unwrap_or(defaults.listing_name),
                accent: self.accent.unwrap_or(defaults.accent),
                listing_height: self
                    .listing_height
                    .map(|h| h.clamp(10, 90))
                    .unwrap_or(defaults.listing_height),
            },
            changed,
        )
    }
}

impl Config {
    /// `url_file` with a leading `~` expanded.
    pub fn resolved_url_file(&self) -> PathBuf {
        expand_home(&self.url_file)
    }
}

pub fn expand_home(path: &Path) -> PathBuf {
    let raw = path.to_string_lossy();
    PathBuf::from(shellexpand::tilde(raw.as_ref()).as_ref())
}

pub fn config_path() -> Result<PathBuf> {
    let base = dirs::config_dir().context("Could not determine config directory")?;
    Ok(base.join("urlpick").join("config.toml"))
}

pub fn ensure_config_dir(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).with_context(|| format!("Failed to create {}", parent.display()))?;
    }
    Ok(())
}

pub fn load_config() -> Result<Config> {
    load_config_from(&config_path()?)
}

pub fn load_config_from(path: &Path) -> Result<Config> {
    if !path.exists() {
        let cfg = Config::default();
        write_config_to(path, &cfg)?;
        return Ok(cfg);
    }

    let raw = fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let partial: PartialConfig = toml::from_str(&raw)
        .with_context(|| format!("Failed to parse {}", path.display()))?;
    let (cfg, changed) = partial.apply_defaults();
    if changed {
        info!(path = %path.display(), "filled missing config keys");
        write_config_to(path, &cfg)?;
    }
    Ok(cfg)
}

pub fn write_config_to(path: &Path, cfg: &Config) -> Result<()> {
    ensure_config_dir(path)?;
    let text = toml::to_string_pretty(cfg).context("Failed to serialize config")?;
    fs::write(path, text).with_context(|| format!("Failed to write {}", path.display()))?;
    Ok(())
}

pub fn open_config_in_editor() -> Result<()> {
    let path = config_path()?;
    if !path.exists() {
        write_config_to(&path, &Config::default())?;
    }

    let editor = env::var("EDITOR").unwrap_or_else(|_| "nvim".to_string());
    let mut parts = match shell_words::split(&editor) {
        Ok(p) if !p.is_empty() => p,
        _ => vec![editor],
    };
    let cmd = parts.remove(0);
    let status = Command::new(cmd)
        .args(parts)
        .arg(&path)
        .status()
        .with_context(|| format!("Failed to launch editor for {}", path.display()))?;
    if !status.success() {
        anyhow::bail!("Editor exited with status {}", status);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::{expand_home, load_config_from, Config};
    use crate::store::SortOrder;
    use std::fs;
    use std::path::{Path, PathBuf};

    #[test]
    fn missing_config_is_created_with_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("urlpick").join("config.toml");
        let cfg = load_config_from(&path).unwrap();
        assert_eq!(cfg, Config::default());
        assert!(path.exists());
    }

    #[test]
    fn partial_config_keeps_given_keys_and_rewrites_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "sort = \"none\"\nlisting_name = \"links\"\n").unwrap();

        let cfg = load_config_from(&path).unwrap();
        assert_eq!(cfg.sort, SortOrder::None);
        assert_eq!(cfg.listing_name, "links");
        assert_eq!(cfg.accent, "cyan");

        let rewritten = fs::read_to_string(&path).unwrap();
        assert!(rewritten.contains("accent"));
        assert!(rewritten.contains("sort = \"none\""));
    }

    #[test]
    fn listing_height_is_clamped() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "listing_height = 100\n").unwrap();
        assert_eq!(load_config_from(&path).unwrap().listing_height, 90);
    }

    #[test]
    fn bad_sort_value_is_a_parse_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "sort = \"shuffle\"\n").unwrap();
        let err = load_config_from(&path).unwrap_err();
        assert!(err.to_string().contains("Failed to parse"));
    }

    #[test]
    fn tilde_expands_to_home() {
        let expanded = expand_home(Path::new("~/.urls"));
        if let Some(home) = dirs::home_dir() {
            assert_eq!(expanded, home.join(".urls"));
        }
        assert_eq!(expand_home(Path::new("/etc/urls")), PathBuf::from("/etc/urls"));
    }
}
