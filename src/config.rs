use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::theme::Preference;

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ConfigFlags {
    pub theme: Option<Preference>,
    pub store_dir: Option<PathBuf>,
    pub sync_url: Option<String>,
    pub no_sync: bool,
    pub watch: bool,
}

impl ConfigFlags {
    pub fn union(&self, other: &Self) -> Self {
        Self {
            theme: other.theme.or(self.theme),
            store_dir: other.store_dir.clone().or_else(|| self.store_dir.clone()),
            sync_url: other.sync_url.clone().or_else(|| self.sync_url.clone()),
            no_sync: self.no_sync || other.no_sync,
            watch: self.watch || other.watch,
        }
    }
}

/// Where the key-value store and the cookie jar live.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorePaths {
    pub local: PathBuf,
    pub cookies: PathBuf,
}

impl StorePaths {
    pub fn in_dir(dir: &Path) -> Self {
        Self {
            local: dir.join("store.json"),
            cookies: dir.join("cookies.txt"),
        }
    }
}

pub fn global_config_path() -> PathBuf {
    #[cfg(target_os = "windows")]
    {
        if let Some(appdata) = std::env::var_os("APPDATA") {
            return PathBuf::from(appdata).join("inkshade").join("config");
        }
    }

    #[cfg(target_os = "macos")]
    {
        if let Some(home) = std::env::var_os("HOME") {
            return PathBuf::from(home)
                .join("Library")
                .join("Application Support")
                .join("inkshade")
                .join("config");
        }
    }

    #[cfg(not(any(target_os = "windows", target_os = "macos")))]
    {
        if let Some(xdg) = std::env::var_os("XDG_CONFIG_HOME") {
            return PathBuf::from(xdg).join("inkshade").join("config");
        }
        if let Some(home) = std::env::var_os("HOME") {
            return PathBuf::from(home)
                .join(".config")
                .join("inkshade")
                .join("config");
        }
    }

    PathBuf::from(".inkshaderc")
}

pub fn local_override_path() -> PathBuf {
    PathBuf::from(".inkshaderc")
}

/// Default directory for the preference stores.
pub fn default_store_dir() -> PathBuf {
    #[cfg(target_os = "windows")]
    {
        if let Some(appdata) = std::env::var_os("LOCALAPPDATA") {
            return PathBuf::from(appdata).join("inkshade");
        }
    }

    #[cfg(target_os = "macos")]
    {
        if let Some(home) = std::env::var_os("HOME") {
            return PathBuf::from(home)
                .join("Library")
                .join("Application Support")
                .join("inkshade");
        }
    }

    #[cfg(not(any(target_os = "windows", target_os = "macos")))]
    {
        if let Some(xdg) = std::env::var_os("XDG_DATA_HOME") {
            return PathBuf::from(xdg).join("inkshade");
        }
        if let Some(home) = std::env::var_os("HOME") {
            return PathBuf::from(home)
                .join(".local")
                .join("share")
                .join("inkshade");
        }
    }

    PathBuf::from(".inkshade")
}

pub fn load_config_flags(path: &Path) -> Result<ConfigFlags> {
    if !path.exists() {
        return Ok(ConfigFlags::default());
    }
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config {}", path.display()))?;
    let tokens = content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .flat_map(|line| line.split_whitespace().map(ToOwned::to_owned))
        .collect::<Vec<_>>();
    Ok(parse_flag_tokens(&tokens))
}

pub fn save_config_flags(path: &Path, flags: &ConfigFlags) -> Result<()> {
    let mut lines = Vec::new();
    lines.push("# inkshade defaults (saved with --save)".to_string());
    if let Some(theme) = flags.theme {
        lines.push(format!("--theme {theme}"));
    }
    if let Some(dir) = &flags.store_dir {
        lines.push(format!("--store-dir {}", dir.display()));
    }
    if let Some(url) = &flags.sync_url {
        lines.push(format!("--sync-url {url}"));
    }
    if flags.no_sync {
        lines.push("--no-sync".to_string());
    }
    if flags.watch {
        lines.push("--watch".to_string());
    }
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create config dir {}", parent.display()))?;
    }
    fs::write(path, format!("{}\n", lines.join("\n")))
        .with_context(|| format!("Failed to write config {}", path.display()))
}

pub fn clear_config_flags(path: &Path) -> Result<()> {
    if path.exists() {
        fs::remove_file(path).with_context(|| format!("Failed to remove {}", path.display()))?;
    }
    Ok(())
}

pub fn parse_flag_tokens(tokens: &[String]) -> ConfigFlags {
    let mut flags = ConfigFlags::default();
    let mut i = 0;
    while i < tokens.len() {
        let token = &tokens[i];
        if token == "--no-sync" {
            flags.no_sync = true;
        } else if token == "--watch" {
            flags.watch = true;
        } else if token == "--theme" {
            if let Some(next) = tokens.get(i + 1) {
                flags.theme = Preference::parse(next);
                i += 1;
            }
        } else if let Some(value) = token.strip_prefix("--theme=") {
            flags.theme = Preference::parse(value);
        } else if token == "--store-dir" {
            if let Some(next) = tokens.get(i + 1) {
                flags.store_dir = Some(PathBuf::from(next));
                i += 1;
            }
        } else if let Some(value) = token.strip_prefix("--store-dir=") {
            flags.store_dir = Some(PathBuf::from(value));
        } else if token == "--sync-url" {
            if let Some(next) = tokens.get(i + 1) {
                flags.sync_url = Some(next.clone());
                i += 1;
            }
        } else if let Some(value) = token.strip_prefix("--sync-url=") {
            flags.sync_url = Some(value.to_string());
        }
        i += 1;
    }
    flags
}
